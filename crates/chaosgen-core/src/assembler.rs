//! Scenario assembly: one combination in, one fully populated record out.
//!
//! [`assemble`] is pure and deterministic. Every fault entry gets its own
//! clone of the severity's parameter set, so no two entries (and no two
//! records) share a parameter map with each other or with the matrix.

use serde::{Deserialize, Serialize};

use crate::matrix::{Combination, LookupError, ParamSet, ParameterMatrix};
use crate::naming;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScenarioRecord {
    #[serde(rename = "apiVersion")]
    pub api_version: String,
    pub kind: String,
    pub metadata: ScenarioMetadata,
    pub spec: ScenarioSpec,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScenarioMetadata {
    pub name: String,
    pub description: String,
    pub tags: Vec<String>,
    pub author: String,
    pub version: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScenarioSpec {
    pub targets: Vec<TargetEntry>,
    pub duration: String,
    pub warmup: String,
    pub cooldown: String,
    pub faults: Vec<FaultEntry>,
    pub success_criteria: Vec<SuccessCriterion>,
    pub metrics: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TargetEntry {
    pub selector: TargetSelector,
    pub alias: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TargetSelector {
    #[serde(rename = "type")]
    pub kind: String,
    pub enclave: String,
    pub pattern: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FaultEntry {
    pub phase: String,
    pub description: String,
    pub target: String,
    #[serde(rename = "type")]
    pub fault_type: String,
    pub params: ParamSet,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SuccessCriterion {
    pub name: String,
    pub description: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub query: String,
    pub threshold: String,
    pub critical: bool,
    pub window: String,
}

impl ScenarioRecord {
    #[must_use]
    pub fn name(&self) -> &str {
        &self.metadata.name
    }
}

/// Build the record for `(fault_type, target_tier, severity)`.
///
/// Fails only when a value is not part of `matrix`.
pub fn assemble(
    fault_type: &str,
    target_tier: &str,
    severity: &str,
    matrix: &ParameterMatrix,
) -> Result<ScenarioRecord, LookupError> {
    let fault = matrix.fault(fault_type)?;
    let level = matrix.level(fault_type, severity)?;
    let tier = matrix.tier(target_tier)?;
    let timing = matrix.timing(severity)?;
    let identity = matrix.identity();

    let fault_segment = naming::normalize_segment(fault_type);

    let targets = tier
        .selectors
        .iter()
        .map(|s| TargetEntry {
            selector: TargetSelector {
                kind: identity.selector_kind.clone(),
                enclave: identity.enclave_placeholder.clone(),
                pattern: s.pattern.clone(),
            },
            alias: s.alias.clone(),
        })
        .collect();

    let faults = tier
        .selectors
        .iter()
        .map(|s| FaultEntry {
            phase: format!("{fault_segment}-{}", s.alias),
            description: format!("{} applied to {}", level.label, s.alias),
            target: s.alias.clone(),
            fault_type: fault.runner_type.clone(),
            params: level.params.clone(),
        })
        .collect();

    let success_criteria = matrix
        .criteria()
        .iter()
        .map(|c| SuccessCriterion {
            name: c.name.clone(),
            description: c.description.clone(),
            kind: c.kind.clone(),
            query: c.query.clone(),
            threshold: c.threshold.clone(),
            critical: c.critical,
            window: timing.duration.clone(),
        })
        .collect();

    let name = naming::scenario_name(&identity.name_prefix, fault_type, &level.slug, target_tier);

    Ok(ScenarioRecord {
        api_version: identity.api_version.clone(),
        kind: identity.kind.clone(),
        metadata: ScenarioMetadata {
            name,
            description: format!("{} on {}. {}.", level.label, tier.label, fault.label),
            tags: vec![
                "generated".to_string(),
                fault_segment,
                level.slug.clone(),
                target_tier.to_string(),
            ],
            author: identity.author.clone(),
            version: identity.version.clone(),
        },
        spec: ScenarioSpec {
            targets,
            duration: timing.duration.clone(),
            warmup: timing.warmup.clone(),
            cooldown: timing.cooldown.clone(),
            faults,
            success_criteria,
            metrics: matrix.metrics().to_vec(),
        },
    })
}

/// [`assemble`] for a three-value combination in matrix dimension order.
pub fn assemble_combination(
    combination: &Combination,
    matrix: &ParameterMatrix,
) -> Result<ScenarioRecord, LookupError> {
    let (fault_type, target_tier, severity) =
        combination.as_triple().ok_or_else(|| LookupError {
            dimension: "combination",
            value: combination.to_string(),
        })?;
    assemble(fault_type, target_tier, severity, matrix)
}

/// A record tagged with the position of its combination in the input.
#[derive(Debug, Clone, PartialEq)]
pub struct IndexedRecord {
    pub index: usize,
    pub combination: Combination,
    pub record: ScenarioRecord,
}

/// Assemble every combination, fanned out over up to `workers` threads.
///
/// Output is always in input order regardless of worker count. The first
/// lookup failure (by input position) is returned.
pub fn assemble_batch(
    matrix: &ParameterMatrix,
    combinations: &[Combination],
    workers: usize,
) -> Result<Vec<IndexedRecord>, LookupError> {
    if workers <= 1 || combinations.len() <= 1 {
        return combinations
            .iter()
            .enumerate()
            .map(|(index, combination)| assemble_indexed(matrix, index, combination))
            .collect();
    }

    let chunk_len = combinations.len().div_ceil(workers);
    let mut tagged: Vec<(usize, Result<IndexedRecord, LookupError>)> =
        std::thread::scope(|scope| {
            let handles: Vec<_> = combinations
                .chunks(chunk_len)
                .enumerate()
                .map(|(chunk_idx, chunk)| {
                    let base = chunk_idx * chunk_len;
                    scope.spawn(move || {
                        chunk
                            .iter()
                            .enumerate()
                            .map(|(offset, combination)| {
                                let index = base + offset;
                                (index, assemble_indexed(matrix, index, combination))
                            })
                            .collect::<Vec<_>>()
                    })
                })
                .collect();
            handles
                .into_iter()
                .flat_map(|handle| match handle.join() {
                    Ok(results) => results,
                    Err(panic) => std::panic::resume_unwind(panic),
                })
                .collect()
        });

    tagged.sort_by_key(|(index, _)| *index);
    tagged.into_iter().map(|(_, result)| result).collect()
}

fn assemble_indexed(
    matrix: &ParameterMatrix,
    index: usize,
    combination: &Combination,
) -> Result<IndexedRecord, LookupError> {
    let record = assemble_combination(combination, matrix)?;
    Ok(IndexedRecord {
        index,
        combination: combination.clone(),
        record,
    })
}
