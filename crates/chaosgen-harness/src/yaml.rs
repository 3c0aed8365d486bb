//! YAML rendering of scenario records.
//!
//! `serde_yaml` keeps struct field order and quotes any string a reader
//! would retype. Strings starting with `>`, `<`, `=`, or `!` come out
//! single-quoted, so thresholds such as `>= 0.67` stay literal text. The
//! enclave placeholder is emitted plain so it can be substituted on the text.

use serde::Serialize;

use chaosgen_core::ScenarioRecord;

/// Emit any serializable value as a YAML document.
pub fn to_yaml<T: Serialize + ?Sized>(value: &T) -> Result<String, serde_yaml::Error> {
    serde_yaml::to_string(value)
}

/// Emit one scenario record.
pub fn render_record(record: &ScenarioRecord) -> Result<String, serde_yaml::Error> {
    to_yaml(record)
}
