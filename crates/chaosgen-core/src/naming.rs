//! Scenario naming.
//!
//! Names are `<prefix>-<fault>-<slug>-<tier>`, with every segment's word
//! separators (`_`, `-`, whitespace) collapsed to a single `-`. The matrix
//! proves at load time that this is injective over its full domain.

/// Delimiter placed between words and between segments.
pub const DELIMITER: char = '-';

/// Collapse runs of `_`, `-`, and whitespace into one delimiter and trim
/// leading/trailing separators.
#[must_use]
pub fn normalize_segment(raw: &str) -> String {
    raw.split(|c: char| c == '_' || c == DELIMITER || c.is_whitespace())
        .filter(|word| !word.is_empty())
        .collect::<Vec<_>>()
        .join("-")
}

/// Compose a scenario name from its four segments.
#[must_use]
pub fn scenario_name(prefix: &str, fault_type: &str, slug: &str, target_tier: &str) -> String {
    [prefix, fault_type, slug, target_tier]
        .iter()
        .map(|segment| normalize_segment(segment))
        .filter(|segment| !segment.is_empty())
        .collect::<Vec<_>>()
        .join("-")
}
