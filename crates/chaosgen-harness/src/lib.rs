//! Batch generation surface for chaosgen.
//!
//! This crate provides:
//! - YAML rendering of scenario records with literal-safe quoting
//! - One-file-per-scenario writing with placeholder substitution and SHA-256 manifests
//! - Preview listing, record audit, and JSONL run logs
//! - The `chaosgen` command-line entrypoint

#![forbid(unsafe_code)]

pub mod audit;
pub mod config;
pub mod error;
pub mod listing;
pub mod pipeline;
pub mod structured_log;
pub mod writer;
pub mod yaml;

pub use config::{GeneratorConfig, Overrides};
pub use error::HarnessError;
pub use pipeline::RunSummary;
pub use writer::{ArtifactIndex, ScenarioWriter};
