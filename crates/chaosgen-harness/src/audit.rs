//! Structural audit of assembled records before anything is written.
//!
//! Every check reports a finding instead of stopping, so one pass lists all
//! problems. Findings are errors; there is no warning tier.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use chaosgen_core::{ParamValue, ScenarioRecord};

/// One failed check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuditFinding {
    pub scenario: String,
    /// Dotted path of the offending field.
    pub field: String,
    pub message: String,
}

impl fmt::Display for AuditFinding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}: {}", self.scenario, self.field, self.message)
    }
}

struct Findings<'a> {
    scenario: &'a str,
    out: Vec<AuditFinding>,
}

impl Findings<'_> {
    fn push(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.out.push(AuditFinding {
            scenario: self.scenario.to_string(),
            field: field.into(),
            message: message.into(),
        });
    }
}

/// DNS-label shape: `^[a-z0-9]([-a-z0-9]*[a-z0-9])?$`.
#[must_use]
pub fn is_valid_name(name: &str) -> bool {
    let bytes = name.as_bytes();
    let edge_ok = |b: u8| b.is_ascii_lowercase() || b.is_ascii_digit();
    match (bytes.first(), bytes.last()) {
        (Some(&first), Some(&last)) => {
            edge_ok(first) && edge_ok(last) && bytes.iter().all(|&b| edge_ok(b) || b == b'-')
        }
        _ => false,
    }
}

/// Seconds in a `<n>s|m|h` duration; `None` if it does not parse.
#[must_use]
pub fn parse_duration_secs(raw: &str) -> Option<u64> {
    let split = raw.find(|c: char| !c.is_ascii_digit())?;
    let (digits, unit) = raw.split_at(split);
    let n: u64 = digits.parse().ok()?;
    let scale = match unit {
        "s" => 1,
        "m" => 60,
        "h" => 3600,
        _ => return None,
    };
    n.checked_mul(scale)
}

fn as_number(value: &ParamValue) -> Option<f64> {
    match value {
        ParamValue::Int(n) => Some(*n as f64),
        ParamValue::Float(f) => Some(*f),
        ParamValue::Bool(_) | ParamValue::Text(_) => None,
    }
}

/// Check one record.
#[must_use]
pub fn audit_record(record: &ScenarioRecord) -> Vec<AuditFinding> {
    let mut f = Findings {
        scenario: record.name(),
        out: Vec::new(),
    };

    if record.api_version.is_empty() {
        f.push("apiVersion", "required");
    }
    if record.kind.is_empty() {
        f.push("kind", "required");
    }
    if !is_valid_name(record.name()) {
        f.push(
            "metadata.name",
            "must be lowercase alphanumeric with hyphens",
        );
    }

    let spec = &record.spec;
    match parse_duration_secs(&spec.duration) {
        Some(0) | None => f.push("spec.duration", format!("`{}` is not a positive duration", spec.duration)),
        Some(_) => {}
    }
    for (field, value) in [("spec.warmup", &spec.warmup), ("spec.cooldown", &spec.cooldown)] {
        if parse_duration_secs(value).is_none() {
            f.push(field, format!("`{value}` is not a duration"));
        }
    }

    if spec.targets.is_empty() {
        f.push("spec.targets", "at least one target is required");
    }
    let mut aliases = BTreeSet::new();
    for (i, target) in spec.targets.iter().enumerate() {
        if target.alias.is_empty() {
            f.push(format!("spec.targets[{i}].alias"), "required");
        } else if !aliases.insert(target.alias.as_str()) {
            f.push(
                format!("spec.targets[{i}].alias"),
                format!("`{}` is duplicated", target.alias),
            );
        }
        if target.selector.kind.is_empty() {
            f.push(format!("spec.targets[{i}].selector.type"), "required");
        }
        if target.selector.pattern.is_empty() {
            f.push(format!("spec.targets[{i}].selector.pattern"), "required");
        }
    }

    if spec.faults.is_empty() {
        f.push("spec.faults", "at least one fault is required");
    }
    let mut phases = BTreeSet::new();
    for (i, fault) in spec.faults.iter().enumerate() {
        if !aliases.contains(fault.target.as_str()) {
            f.push(
                format!("spec.faults[{i}].target"),
                format!("`{}` references no declared target alias", fault.target),
            );
        }
        if !phases.insert(fault.phase.as_str()) {
            f.push(
                format!("spec.faults[{i}].phase"),
                format!("`{}` is duplicated", fault.phase),
            );
        }
        if fault.fault_type.is_empty() {
            f.push(format!("spec.faults[{i}].type"), "required");
        }
        if fault.params.is_empty() {
            f.push(format!("spec.faults[{i}].params"), "required");
        }
        if fault.fault_type == "network" {
            if let Some(loss) = fault.params.get("packet_loss").and_then(as_number)
                && !(0.0..=100.0).contains(&loss)
            {
                f.push(
                    format!("spec.faults[{i}].params.packet_loss"),
                    "must be between 0 and 100",
                );
            }
            for key in ["latency", "bandwidth"] {
                if fault.params.get(key).and_then(as_number).is_some_and(|v| v < 0.0) {
                    f.push(
                        format!("spec.faults[{i}].params.{key}"),
                        "cannot be negative",
                    );
                }
            }
        }
    }

    for (i, criterion) in spec.success_criteria.iter().enumerate() {
        if criterion.name.is_empty() {
            f.push(format!("spec.success_criteria[{i}].name"), "required");
        }
        if criterion.kind == "prometheus" {
            if criterion.query.is_empty() {
                f.push(format!("spec.success_criteria[{i}].query"), "required");
            }
            if criterion.threshold.is_empty() {
                f.push(format!("spec.success_criteria[{i}].threshold"), "required");
            }
        }
        if criterion.window != spec.duration {
            f.push(
                format!("spec.success_criteria[{i}].window"),
                format!(
                    "`{}` differs from duration `{}`",
                    criterion.window, spec.duration
                ),
            );
        }
    }

    f.out
}

/// Check every record plus name uniqueness across the batch.
#[must_use]
pub fn audit_batch<'a>(records: impl IntoIterator<Item = &'a ScenarioRecord>) -> Vec<AuditFinding> {
    let mut findings = Vec::new();
    let mut seen: BTreeMap<&str, usize> = BTreeMap::new();
    for (i, record) in records.into_iter().enumerate() {
        findings.extend(audit_record(record));
        if let Some(first) = seen.insert(record.name(), i) {
            findings.push(AuditFinding {
                scenario: record.name().to_string(),
                field: "metadata.name".to_string(),
                message: format!("also produced by record #{first}"),
            });
        }
    }
    findings
}
