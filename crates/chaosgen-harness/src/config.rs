//! Run configuration.
//!
//! Each setting resolves from, in order: an explicit override (CLI flag),
//! a `CHAOSGEN_*` environment variable, then the built-in default.
//!
//! | setting  | variable            | default                  |
//! |----------|---------------------|--------------------------|
//! | strategy | `CHAOSGEN_STRATEGY` | `full`                   |
//! | output   | `CHAOSGEN_OUTPUT`   | `generated/polygon-chain`|
//! | enclave  | `CHAOSGEN_ENCLAVE`  | none (placeholder kept)  |
//! | workers  | `CHAOSGEN_WORKERS`  | available cores, max 8   |
//! | matrix   | `CHAOSGEN_MATRIX`   | built-in catalog         |
//! | log      | `CHAOSGEN_LOG`      | none                     |
//! | manifest | `CHAOSGEN_MANIFEST` | none                     |

use std::path::PathBuf;

use chaosgen_core::{ParameterMatrix, StrategyKind};

use crate::error::HarnessError;

pub const ENV_STRATEGY: &str = "CHAOSGEN_STRATEGY";
pub const ENV_OUTPUT: &str = "CHAOSGEN_OUTPUT";
pub const ENV_ENCLAVE: &str = "CHAOSGEN_ENCLAVE";
pub const ENV_WORKERS: &str = "CHAOSGEN_WORKERS";
pub const ENV_MATRIX: &str = "CHAOSGEN_MATRIX";
pub const ENV_LOG: &str = "CHAOSGEN_LOG";
pub const ENV_MANIFEST: &str = "CHAOSGEN_MANIFEST";

pub const DEFAULT_OUTPUT: &str = "generated/polygon-chain";
const MAX_DEFAULT_WORKERS: usize = 8;

/// Values supplied on the command line; `None` defers to env/defaults.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub strategy: Option<String>,
    pub output: Option<PathBuf>,
    pub enclave: Option<String>,
    pub workers: Option<usize>,
    pub matrix: Option<PathBuf>,
    pub log: Option<PathBuf>,
    pub manifest: Option<PathBuf>,
}

/// Fully resolved settings for one run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratorConfig {
    pub strategy: StrategyKind,
    pub output_root: PathBuf,
    pub enclave: Option<String>,
    pub workers: usize,
    pub matrix_path: Option<PathBuf>,
    pub log_path: Option<PathBuf>,
    pub manifest_path: Option<PathBuf>,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            strategy: StrategyKind::default(),
            output_root: PathBuf::from(DEFAULT_OUTPUT),
            enclave: None,
            workers: default_workers(),
            matrix_path: None,
            log_path: None,
            manifest_path: None,
        }
    }
}

fn default_workers() -> usize {
    std::thread::available_parallelism()
        .map_or(1, usize::from)
        .min(MAX_DEFAULT_WORKERS)
}

/// Parse a strategy name, rejecting unknown values.
pub fn parse_strategy(raw: &str) -> Result<StrategyKind, HarnessError> {
    StrategyKind::from_str_loose(raw).ok_or_else(|| HarnessError::Setting {
        key: "strategy",
        message: format!("unknown strategy `{raw}` (expected full, pairwise, or pairwise-ipo)"),
    })
}

fn parse_workers(raw: &str) -> Result<usize, HarnessError> {
    match raw.trim().parse::<usize>() {
        Ok(0) | Err(_) => Err(HarnessError::Setting {
            key: "workers",
            message: format!("`{raw}` is not a positive integer"),
        }),
        Ok(n) => Ok(n),
    }
}

impl GeneratorConfig {
    /// Resolve against the process environment.
    pub fn resolve(overrides: Overrides) -> Result<Self, HarnessError> {
        Self::resolve_with(overrides, |key| std::env::var(key).ok())
    }

    /// Resolve against an arbitrary variable lookup.
    pub fn resolve_with(
        overrides: Overrides,
        env: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, HarnessError> {
        let env = |key: &str| env(key).filter(|v| !v.trim().is_empty());
        let defaults = Self::default();

        let strategy = match overrides.strategy.or_else(|| env(ENV_STRATEGY)) {
            Some(raw) => parse_strategy(&raw)?,
            None => defaults.strategy,
        };
        let workers = match overrides
            .workers
            .map(|n| n.to_string())
            .or_else(|| env(ENV_WORKERS))
        {
            Some(raw) => parse_workers(&raw)?,
            None => defaults.workers,
        };

        Ok(Self {
            strategy,
            output_root: overrides
                .output
                .or_else(|| env(ENV_OUTPUT).map(PathBuf::from))
                .unwrap_or(defaults.output_root),
            enclave: overrides.enclave.or_else(|| env(ENV_ENCLAVE)),
            workers,
            matrix_path: overrides.matrix.or_else(|| env(ENV_MATRIX).map(PathBuf::from)),
            log_path: overrides.log.or_else(|| env(ENV_LOG).map(PathBuf::from)),
            manifest_path: overrides
                .manifest
                .or_else(|| env(ENV_MANIFEST).map(PathBuf::from)),
        })
    }

    /// Load the configured matrix, or the built-in one.
    pub fn load_matrix(&self) -> Result<ParameterMatrix, HarnessError> {
        let matrix = match &self.matrix_path {
            Some(path) => ParameterMatrix::from_file(path)?,
            None => ParameterMatrix::builtin()?,
        };
        Ok(matrix)
    }
}
