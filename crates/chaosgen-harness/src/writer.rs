//! One YAML file per scenario, plus an optional artifact manifest.
//!
//! Layout: `<root>/<category>/<scenario-name>.yaml`. The enclave placeholder
//! is substituted on the serialized text, never on the record. Writing
//! stops at the first failure; files already written are left in place and
//! listed in the manifest only if the run completes.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use chaosgen_core::ScenarioRecord;

use crate::error::HarnessError;
use crate::structured_log::now_utc;
use crate::yaml;

/// Replace every occurrence of `placeholder` in `text`.
#[must_use]
pub fn substitute_placeholder(text: &str, placeholder: &str, value: &str) -> String {
    if placeholder.is_empty() {
        return text.to_string();
    }
    text.replace(placeholder, value)
}

pub(crate) fn hex_lower(bytes: &[u8]) -> String {
    use std::fmt::Write;
    let mut out = String::with_capacity(bytes.len() * 2);
    for b in bytes {
        let _ = write!(&mut out, "{b:02x}");
    }
    out
}

#[must_use]
pub fn sha256_hex(bytes: &[u8]) -> String {
    hex_lower(&Sha256::digest(bytes))
}

/// Result of writing one scenario.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WrittenScenario {
    pub name: String,
    pub category: String,
    pub path: PathBuf,
    /// Path relative to the output root, `/`-separated.
    pub relative: String,
    pub sha256: String,
    pub size_bytes: u64,
}

/// Writes rendered scenarios under an output root.
#[derive(Debug, Clone)]
pub struct ScenarioWriter {
    root: PathBuf,
    placeholder: String,
    enclave: Option<String>,
}

impl ScenarioWriter {
    #[must_use]
    pub fn new(root: impl Into<PathBuf>, placeholder: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            placeholder: placeholder.into(),
            enclave: None,
        }
    }

    /// Substitute `enclave` for the placeholder in every written file.
    #[must_use]
    pub fn with_enclave(mut self, enclave: Option<String>) -> Self {
        self.enclave = enclave.filter(|e| !e.is_empty());
        self
    }

    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Final file text for `record`.
    pub fn render(&self, record: &ScenarioRecord) -> Result<String, HarnessError> {
        let text = yaml::render_record(record)?;
        Ok(match &self.enclave {
            Some(enclave) => substitute_placeholder(&text, &self.placeholder, enclave),
            None => text,
        })
    }

    /// Render and write one record into `category`.
    pub fn write(
        &self,
        record: &ScenarioRecord,
        category: &str,
    ) -> Result<WrittenScenario, HarnessError> {
        let text = self.render(record)?;
        let dir = self.root.join(category);
        std::fs::create_dir_all(&dir).map_err(|e| HarnessError::io(&dir, e))?;
        let file_name = format!("{}.yaml", record.name());
        let path = dir.join(&file_name);
        std::fs::write(&path, text.as_bytes()).map_err(|e| HarnessError::io(&path, e))?;
        Ok(WrittenScenario {
            name: record.name().to_string(),
            category: category.to_string(),
            relative: format!("{category}/{file_name}"),
            sha256: sha256_hex(text.as_bytes()),
            size_bytes: text.len() as u64,
            path,
        })
    }
}

/// A single artifact entry in the manifest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArtifactEntry {
    pub path: String,
    pub kind: String,
    pub sha256: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size_bytes: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// Manifest of every file a run wrote.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArtifactIndex {
    pub index_version: u32,
    pub run_id: String,
    pub strategy: String,
    pub generated_utc: String,
    pub artifacts: Vec<ArtifactEntry>,
}

impl ArtifactIndex {
    #[must_use]
    pub fn new(run_id: impl Into<String>, strategy: impl Into<String>) -> Self {
        Self {
            index_version: 1,
            run_id: run_id.into(),
            strategy: strategy.into(),
            generated_utc: now_utc(),
            artifacts: Vec::new(),
        }
    }

    pub fn add(&mut self, written: &WrittenScenario) -> &mut Self {
        self.artifacts.push(ArtifactEntry {
            path: written.relative.clone(),
            kind: "scenario".to_string(),
            sha256: written.sha256.clone(),
            size_bytes: Some(written.size_bytes),
            description: Some(written.name.clone()),
        });
        self
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    pub fn write_to(&self, path: &Path) -> Result<(), HarnessError> {
        let json = self.to_json()?;
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| HarnessError::io(parent, e))?;
        }
        std::fs::write(path, json).map_err(|e| HarnessError::io(path, e))
    }

    /// Re-hash every listed file under `root`; returns paths whose digest
    /// no longer matches (or that are gone).
    #[must_use]
    pub fn verify(&self, root: &Path) -> Vec<String> {
        self.artifacts
            .iter()
            .filter(|entry| {
                std::fs::read(root.join(&entry.path))
                    .map_or(true, |bytes| sha256_hex(&bytes) != entry.sha256)
            })
            .map(|entry| entry.path.clone())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chaosgen_core::{ParameterMatrix, assemble};

    fn record() -> ScenarioRecord {
        let matrix = ParameterMatrix::builtin().unwrap();
        assemble("latency", "rabbitmq", "mild", &matrix).unwrap()
    }

    #[test]
    fn sha256_of_empty_input() {
        assert_eq!(
            sha256_hex(b""),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
    }

    #[test]
    fn substitution_is_textual() {
        assert_eq!(
            substitute_placeholder("a ${ENCLAVE_NAME} b ${ENCLAVE_NAME}", "${ENCLAVE_NAME}", "e1"),
            "a e1 b e1"
        );
        assert_eq!(substitute_placeholder("x", "", "y"), "x");
    }

    #[test]
    fn render_keeps_placeholder_without_enclave() {
        let writer = ScenarioWriter::new("unused", "${ENCLAVE_NAME}");
        let text = writer.render(&record()).unwrap();
        assert!(text.contains("enclave: ${ENCLAVE_NAME}"));

        let writer = writer.with_enclave(Some("pos-devnet".into()));
        let text = writer.render(&record()).unwrap();
        assert!(text.contains("enclave: pos-devnet"));
        assert!(!text.contains("${ENCLAVE_NAME}"));
    }

    #[test]
    fn empty_enclave_means_no_substitution() {
        let writer =
            ScenarioWriter::new("unused", "${ENCLAVE_NAME}").with_enclave(Some(String::new()));
        assert!(writer.render(&record()).unwrap().contains("${ENCLAVE_NAME}"));
    }

    #[test]
    fn manifest_entries_follow_written_files() {
        let written = WrittenScenario {
            name: "gen-x".into(),
            category: "network".into(),
            path: PathBuf::from("/tmp/network/gen-x.yaml"),
            relative: "network/gen-x.yaml".into(),
            sha256: "ab".into(),
            size_bytes: 2,
        };
        let mut index = ArtifactIndex::new("run-1", "full");
        index.add(&written);
        let parsed: serde_json::Value = serde_json::from_str(&index.to_json().unwrap()).unwrap();
        assert_eq!(parsed["index_version"], 1);
        assert_eq!(parsed["strategy"], "full");
        assert_eq!(parsed["artifacts"][0]["path"], "network/gen-x.yaml");
        assert_eq!(parsed["artifacts"][0]["size_bytes"], 2);
    }
}
