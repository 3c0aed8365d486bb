//! Parameter matrix: the test dimensions, their legal values, and the
//! per-value side tables (fault parameters, tier selectors, timing).
//!
//! A [`ParameterMatrix`] is built once from a [`MatrixConfig`], validated in
//! full at construction, and never mutated afterwards. Every accessor is a
//! read-only lookup, so one matrix can be shared freely across threads.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::path::{Component, Path};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::catalog::{self, FaultConfig, FaultLevel, MatrixConfig, TierConfig};
use crate::naming;

/// Dimension name for the fault axis.
pub const FAULT_TYPE: &str = "fault_type";
/// Dimension name for the target tier axis.
pub const TARGET_TIER: &str = "target_tier";
/// Dimension name for the severity axis.
pub const SEVERITY: &str = "severity";

/// One concrete fault parameter. Values keep their JSON/YAML scalar kind.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ParamValue {
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
}

impl From<bool> for ParamValue {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

impl From<i64> for ParamValue {
    fn from(v: i64) -> Self {
        Self::Int(v)
    }
}

impl From<f64> for ParamValue {
    fn from(v: f64) -> Self {
        Self::Float(v)
    }
}

impl From<&str> for ParamValue {
    fn from(v: &str) -> Self {
        Self::Text(v.to_string())
    }
}

/// Flat key/value parameter record for one fault at one severity.
pub type ParamSet = BTreeMap<String, ParamValue>;

/// Fleet-matching pattern plus the alias a scenario uses to refer to it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Selector {
    pub pattern: String,
    pub alias: String,
}

impl Selector {
    #[must_use]
    pub fn new(pattern: impl Into<String>, alias: impl Into<String>) -> Self {
        Self {
            pattern: pattern.into(),
            alias: alias.into(),
        }
    }
}

/// Timing profile attached to a severity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Timing {
    pub duration: String,
    pub warmup: String,
    pub cooldown: String,
}

/// Severity-independent success criterion. The evaluation window is stamped
/// on at assembly time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CriterionTemplate {
    pub name: String,
    pub description: String,
    #[serde(rename = "type", default = "default_criterion_kind")]
    pub kind: String,
    pub query: String,
    pub threshold: String,
    pub critical: bool,
}

fn default_criterion_kind() -> String {
    "prometheus".to_string()
}

/// Construction-time configuration failure. Nothing is generated when one
/// of these is returned.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("dimension `{dimension}` has no values")]
    EmptyDimension { dimension: String },
    #[error("dimension `{dimension}` declares `{value}` more than once")]
    DuplicateValue { dimension: String, value: String },
    #[error("fault `{fault}` has no parameter set for severity `{severity}`")]
    MissingSeverity { fault: String, severity: String },
    #[error("fault `{fault}` defines undeclared severity `{severity}`")]
    UnknownSeverity { fault: String, severity: String },
    #[error("fault `{fault}` has an empty name slug for severity `{severity}`")]
    EmptySlug { fault: String, severity: String },
    #[error("fault `{fault}` has category `{category}`, which is not a single directory name")]
    InvalidCategory { fault: String, category: String },
    #[error("target tier `{tier}` has no selectors")]
    EmptySelectors { tier: String },
    #[error("target tier `{tier}` uses alias `{alias}` more than once")]
    DuplicateAlias { tier: String, alias: String },
    #[error("no success criteria configured")]
    NoCriteria,
    #[error("scenario name `{name}` is produced by both {first} and {second}")]
    NameCollision {
        name: String,
        first: Combination,
        second: Combination,
    },
    #[error(transparent)]
    Lookup(#[from] LookupError),
    #[error("malformed matrix configuration: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("io: {0}")]
    Io(#[from] std::io::Error),
}

/// A value that is not part of the matrix was looked up.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("no {dimension} named `{value}` in the parameter matrix")]
pub struct LookupError {
    pub dimension: &'static str,
    pub value: String,
}

impl LookupError {
    fn new(dimension: &'static str, value: &str) -> Self {
        Self {
            dimension,
            value: value.to_string(),
        }
    }
}

/// A named axis with an ordered, non-empty set of distinct values.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Dimension {
    name: String,
    values: Vec<String>,
}

impl Dimension {
    /// Build a dimension, rejecting empty and duplicated value lists.
    pub fn new(name: impl Into<String>, values: Vec<String>) -> Result<Self, ConfigError> {
        let name = name.into();
        if values.is_empty() {
            return Err(ConfigError::EmptyDimension { dimension: name });
        }
        let mut seen = BTreeSet::new();
        for value in &values {
            if !seen.insert(value.as_str()) {
                return Err(ConfigError::DuplicateValue {
                    dimension: name,
                    value: value.clone(),
                });
            }
        }
        Ok(Self { name, values })
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn values(&self) -> &[String] {
        &self.values
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Always false for a constructed dimension; present for API symmetry.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Position of `value` in declaration order.
    #[must_use]
    pub fn position(&self, value: &str) -> Option<usize> {
        self.values.iter().position(|v| v == value)
    }
}

/// Exactly one value per dimension, in dimension order.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Combination {
    values: Vec<String>,
}

impl Combination {
    #[must_use]
    pub fn new(values: Vec<String>) -> Self {
        Self { values }
    }

    /// Resolve per-dimension value indices against `dimensions`.
    pub(crate) fn from_indices(dimensions: &[Dimension], indices: &[usize]) -> Self {
        Self {
            values: dimensions
                .iter()
                .zip(indices)
                .map(|(dim, &idx)| dim.values[idx].clone())
                .collect(),
        }
    }

    #[must_use]
    pub fn values(&self) -> &[String] {
        &self.values
    }

    #[must_use]
    pub fn get(&self, position: usize) -> Option<&str> {
        self.values.get(position).map(String::as_str)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// `(fault_type, target_tier, severity)` for a three-dimension combination.
    #[must_use]
    pub fn as_triple(&self) -> Option<(&str, &str, &str)> {
        match self.values.as_slice() {
            [fault, tier, severity] => Some((fault.as_str(), tier.as_str(), severity.as_str())),
            _ => None,
        }
    }
}

impl fmt::Display for Combination {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({})", self.values.join(", "))
    }
}

/// Validated, immutable model of the fault x tier x severity space.
#[derive(Debug, Clone)]
pub struct ParameterMatrix {
    config: MatrixConfig,
    dimensions: Vec<Dimension>,
    faults: BTreeMap<String, usize>,
    tiers: BTreeMap<String, usize>,
    timings: BTreeMap<String, usize>,
}

impl ParameterMatrix {
    /// Validate `config` and build the matrix.
    ///
    /// Fails when a dimension is empty or repeats a value, a fault lacks (or
    /// over-specifies) a severity level, a slug is blank, a tier has no
    /// selectors or repeats an alias, no criteria are configured, or two
    /// combinations would share a scenario name.
    pub fn from_config(config: MatrixConfig) -> Result<Self, ConfigError> {
        let dimensions = vec![
            Dimension::new(
                FAULT_TYPE,
                config.faults.iter().map(|f| f.name.clone()).collect(),
            )?,
            Dimension::new(
                TARGET_TIER,
                config.tiers.iter().map(|t| t.name.clone()).collect(),
            )?,
            Dimension::new(
                SEVERITY,
                config.severities.iter().map(|s| s.name.clone()).collect(),
            )?,
        ];

        let severities = &dimensions[2];
        for fault in &config.faults {
            validate_fault(fault, severities)?;
        }
        for tier in &config.tiers {
            validate_tier(tier)?;
        }
        if config.criteria.is_empty() {
            return Err(ConfigError::NoCriteria);
        }

        let matrix = Self {
            faults: index_by_name(config.faults.iter().map(|f| f.name.as_str())),
            tiers: index_by_name(config.tiers.iter().map(|t| t.name.as_str())),
            timings: index_by_name(config.severities.iter().map(|s| s.name.as_str())),
            dimensions,
            config,
        };
        matrix.check_name_injectivity()?;
        Ok(matrix)
    }

    /// Parse a JSON matrix configuration and validate it.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: MatrixConfig = serde_json::from_str(json)?;
        Self::from_config(config)
    }

    /// Load a JSON matrix configuration from disk.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json(&content)
    }

    /// The built-in Polygon PoS matrix.
    pub fn builtin() -> Result<Self, ConfigError> {
        Self::from_config(catalog::polygon_pos())
    }

    /// Dimensions in canonical order: fault type, target tier, severity.
    #[must_use]
    pub fn dimensions(&self) -> &[Dimension] {
        &self.dimensions
    }

    #[must_use]
    pub fn dimension(&self, name: &str) -> Option<&Dimension> {
        self.dimensions.iter().find(|d| d.name == name)
    }

    #[must_use]
    pub fn values(&self, dimension: &str) -> Option<&[String]> {
        self.dimension(dimension).map(Dimension::values)
    }

    /// Size of the full Cartesian product.
    #[must_use]
    pub fn combination_count(&self) -> usize {
        self.dimensions.iter().map(Dimension::len).product()
    }

    /// The configuration this matrix was built from.
    #[must_use]
    pub fn config(&self) -> &MatrixConfig {
        &self.config
    }

    #[must_use]
    pub fn identity(&self) -> &catalog::Identity {
        &self.config.identity
    }

    #[must_use]
    pub fn criteria(&self) -> &[CriterionTemplate] {
        &self.config.criteria
    }

    #[must_use]
    pub fn metrics(&self) -> &[String] {
        &self.config.metrics
    }

    pub fn fault(&self, fault_type: &str) -> Result<&FaultConfig, LookupError> {
        self.faults
            .get(fault_type)
            .map(|&idx| &self.config.faults[idx])
            .ok_or_else(|| LookupError::new(FAULT_TYPE, fault_type))
    }

    /// Slug, label, and parameters for one fault at one severity.
    pub fn level(&self, fault_type: &str, severity: &str) -> Result<&FaultLevel, LookupError> {
        let fault = self.fault(fault_type)?;
        if !self.timings.contains_key(severity) {
            return Err(LookupError::new(SEVERITY, severity));
        }
        fault
            .levels
            .get(severity)
            .ok_or_else(|| LookupError::new(SEVERITY, severity))
    }

    pub fn fault_params(&self, fault_type: &str, severity: &str) -> Result<&ParamSet, LookupError> {
        self.level(fault_type, severity).map(|level| &level.params)
    }

    pub fn slug(&self, fault_type: &str, severity: &str) -> Result<&str, LookupError> {
        self.level(fault_type, severity)
            .map(|level| level.slug.as_str())
    }

    pub fn tier(&self, target_tier: &str) -> Result<&TierConfig, LookupError> {
        self.tiers
            .get(target_tier)
            .map(|&idx| &self.config.tiers[idx])
            .ok_or_else(|| LookupError::new(TARGET_TIER, target_tier))
    }

    pub fn tier_selectors(&self, target_tier: &str) -> Result<&[Selector], LookupError> {
        self.tier(target_tier).map(|tier| tier.selectors.as_slice())
    }

    pub fn timing(&self, severity: &str) -> Result<&Timing, LookupError> {
        self.timings
            .get(severity)
            .map(|&idx| &self.config.severities[idx].timing)
            .ok_or_else(|| LookupError::new(SEVERITY, severity))
    }

    /// Scenario name for one combination.
    pub fn scenario_name(
        &self,
        fault_type: &str,
        target_tier: &str,
        severity: &str,
    ) -> Result<String, LookupError> {
        let slug = self.slug(fault_type, severity)?;
        self.tier(target_tier)?;
        Ok(naming::scenario_name(
            &self.config.identity.name_prefix,
            fault_type,
            slug,
            target_tier,
        ))
    }

    fn check_name_injectivity(&self) -> Result<(), ConfigError> {
        let mut seen: BTreeMap<String, Combination> = BTreeMap::new();
        for fault in &self.dimensions[0].values {
            for tier in &self.dimensions[1].values {
                for severity in &self.dimensions[2].values {
                    let combo = Combination::new(vec![
                        fault.clone(),
                        tier.clone(),
                        severity.clone(),
                    ]);
                    let name = self.scenario_name(fault, tier, severity)?;
                    if let Some(first) = seen.get(&name) {
                        return Err(ConfigError::NameCollision {
                            name,
                            first: first.clone(),
                            second: combo,
                        });
                    }
                    seen.insert(name, combo);
                }
            }
        }
        Ok(())
    }
}

/// True when `category` names exactly one plain directory under the output root.
fn is_single_component(category: &str) -> bool {
    let mut components = Path::new(category).components();
    matches!(
        (components.next(), components.next()),
        (Some(Component::Normal(_)), None)
    )
}

fn validate_fault(fault: &FaultConfig, severities: &Dimension) -> Result<(), ConfigError> {
    if !is_single_component(&fault.category) {
        return Err(ConfigError::InvalidCategory {
            fault: fault.name.clone(),
            category: fault.category.clone(),
        });
    }
    for severity in severities.values() {
        let Some(level) = fault.levels.get(severity) else {
            return Err(ConfigError::MissingSeverity {
                fault: fault.name.clone(),
                severity: severity.clone(),
            });
        };
        if naming::normalize_segment(&level.slug).is_empty() {
            return Err(ConfigError::EmptySlug {
                fault: fault.name.clone(),
                severity: severity.clone(),
            });
        }
    }
    if let Some(extra) = fault
        .levels
        .keys()
        .find(|key| severities.position(key).is_none())
    {
        return Err(ConfigError::UnknownSeverity {
            fault: fault.name.clone(),
            severity: extra.clone(),
        });
    }
    Ok(())
}

fn validate_tier(tier: &TierConfig) -> Result<(), ConfigError> {
    if tier.selectors.is_empty() {
        return Err(ConfigError::EmptySelectors {
            tier: tier.name.clone(),
        });
    }
    let mut aliases = BTreeSet::new();
    for selector in &tier.selectors {
        if !aliases.insert(selector.alias.as_str()) {
            return Err(ConfigError::DuplicateAlias {
                tier: tier.name.clone(),
                alias: selector.alias.clone(),
            });
        }
    }
    Ok(())
}

fn index_by_name<'a>(names: impl Iterator<Item = &'a str>) -> BTreeMap<String, usize> {
    names
        .enumerate()
        .map(|(idx, name)| (name.to_string(), idx))
        .collect()
}
