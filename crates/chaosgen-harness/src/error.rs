//! Error type for batch generation.

use std::path::PathBuf;

use chaosgen_core::{ConfigError, LookupError, StrategyError};
use thiserror::Error;

use crate::audit::AuditFinding;

#[derive(Debug, Error)]
pub enum HarnessError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Lookup(#[from] LookupError),
    #[error(transparent)]
    Strategy(#[from] StrategyError),
    #[error("{}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("json: {0}")]
    Json(#[from] serde_json::Error),
    #[error("yaml: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("audit rejected the batch with {} finding(s)", .0.len())]
    Audit(Vec<AuditFinding>),
    #[error("invalid setting `{key}`: {message}")]
    Setting { key: &'static str, message: String },
}

impl HarnessError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}
