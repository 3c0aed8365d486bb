//! # chaosgen-core
//!
//! Combinatorial chaos-scenario generation.
//!
//! This crate provides:
//! - [`ParameterMatrix`]: the validated fault x tier x severity model
//! - Combination strategies: full enumeration and two pairwise reducers
//! - [`assemble`]: pure mapping from one combination to a scenario record
//!
//! Nothing here touches the filesystem except [`ParameterMatrix::from_file`].

#![deny(unsafe_code)]

pub mod assembler;
pub mod catalog;
pub mod matrix;
pub mod naming;
pub mod strategy;

pub use assembler::{
    IndexedRecord, ScenarioRecord, assemble, assemble_batch, assemble_combination,
};
pub use catalog::{Identity, MatrixConfig};
pub use matrix::{
    Combination, ConfigError, Dimension, LookupError, ParamSet, ParamValue, ParameterMatrix,
};
pub use strategy::{
    CombinationStrategy, CoverageReport, FullEnumeration, PairwiseGreedy, PairwiseIpo,
    StrategyError, StrategyKind, check_pairwise,
};
