//! Combination strategies.
//!
//! Every strategy implements [`CombinationStrategy`]: a finite, ordered,
//! deterministic sequence of [`Combination`]s recomputed on each call.
//!
//! - [`FullEnumeration`]: Cartesian product, last dimension varying fastest.
//! - [`PairwiseGreedy`]: greedy covering set over the full domain with
//!   tie-break on canonical enumeration order.
//! - [`PairwiseIpo`]: in-parameter-order construction; an alternate pairwise
//!   implementation behind the same contract.
//!
//! Both pairwise strategies check full 2-way coverage before returning and
//! report a [`StrategyError::CoverageShortfall`] otherwise.

mod coverage;
mod greedy;
mod ipo;

use thiserror::Error;

use crate::matrix::{Combination, Dimension, ParameterMatrix};

pub use coverage::{CoverageReport, PairRequirement, check_pairwise};
pub(crate) use coverage::PairTable;
pub use greedy::PairwiseGreedy;
pub use ipo::PairwiseIpo;

/// A pairwise strategy finished without covering every required pair.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StrategyError {
    #[error("{strategy} left {missing} of {required} pair requirements uncovered")]
    CoverageShortfall {
        strategy: &'static str,
        missing: usize,
        required: usize,
    },
}

/// Produces an ordered sequence of combinations over a matrix.
pub trait CombinationStrategy: Send + Sync {
    /// Stable strategy label used in listings and logs.
    fn name(&self) -> &'static str;

    /// Generate over an explicit dimension list.
    fn generate_over(&self, dimensions: &[Dimension]) -> Result<Vec<Combination>, StrategyError>;

    /// Generate over the matrix's own dimensions.
    fn generate(&self, matrix: &ParameterMatrix) -> Result<Vec<Combination>, StrategyError> {
        self.generate_over(matrix.dimensions())
    }
}

/// Every combination, in canonical order.
#[derive(Debug, Clone, Copy, Default)]
pub struct FullEnumeration;

impl CombinationStrategy for FullEnumeration {
    fn name(&self) -> &'static str {
        "full"
    }

    fn generate_over(&self, dimensions: &[Dimension]) -> Result<Vec<Combination>, StrategyError> {
        let sizes: Vec<usize> = dimensions.iter().map(Dimension::len).collect();
        Ok(CartesianIndices::new(&sizes)
            .map(|indices| Combination::from_indices(dimensions, &indices))
            .collect())
    }
}

/// Strategy selection, resolved from configuration.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StrategyKind {
    #[default]
    Full,
    Pairwise,
    PairwiseIpo,
}

impl StrategyKind {
    /// Parse with loose casing and a few aliases.
    #[must_use]
    pub fn from_str_loose(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "full" | "all" | "cartesian" | "full-combinatorial" => Some(Self::Full),
            "pairwise" | "greedy" | "allpairs" | "all-pairs" | "t2" => Some(Self::Pairwise),
            "ipo" | "pairwise-ipo" | "ipog" => Some(Self::PairwiseIpo),
            _ => None,
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Full => "full",
            Self::Pairwise => "pairwise",
            Self::PairwiseIpo => "pairwise-ipo",
        }
    }

    /// Human label printed in the run header.
    #[must_use]
    pub const fn describe(self) -> &'static str {
        match self {
            Self::Full => "full combinatorial",
            Self::Pairwise => "pairwise (greedy)",
            Self::PairwiseIpo => "pairwise (in-parameter-order)",
        }
    }

    #[must_use]
    pub const fn is_pairwise(self) -> bool {
        !matches!(self, Self::Full)
    }

    #[must_use]
    pub fn strategy(self) -> Box<dyn CombinationStrategy> {
        match self {
            Self::Full => Box::new(FullEnumeration),
            Self::Pairwise => Box::new(PairwiseGreedy),
            Self::PairwiseIpo => Box::new(PairwiseIpo),
        }
    }
}

/// Odometer over per-dimension value indices; the last position turns fastest.
///
/// Yields nothing when there are no dimensions or any dimension is empty.
#[derive(Debug, Clone)]
pub(crate) struct CartesianIndices {
    sizes: Vec<usize>,
    next: Option<Vec<usize>>,
}

impl CartesianIndices {
    pub(crate) fn new(sizes: &[usize]) -> Self {
        let next = if sizes.is_empty() || sizes.contains(&0) {
            None
        } else {
            Some(vec![0; sizes.len()])
        };
        Self {
            sizes: sizes.to_vec(),
            next,
        }
    }
}

impl Iterator for CartesianIndices {
    type Item = Vec<usize>;

    fn next(&mut self) -> Option<Vec<usize>> {
        let current = self.next.take()?;
        let mut advanced = current.clone();
        for pos in (0..advanced.len()).rev() {
            advanced[pos] += 1;
            if advanced[pos] < self.sizes[pos] {
                self.next = Some(advanced);
                return Some(current);
            }
            advanced[pos] = 0;
        }
        // Every position wrapped: `current` was the last tuple.
        Some(current)
    }
}

/// Turn index rows into combinations and enforce the coverage postcondition.
fn finish_pairwise(
    strategy: &'static str,
    dimensions: &[Dimension],
    rows: &[Vec<usize>],
) -> Result<Vec<Combination>, StrategyError> {
    let combinations: Vec<Combination> = rows
        .iter()
        .map(|row| Combination::from_indices(dimensions, row))
        .collect();
    let report = check_pairwise(dimensions, &combinations);
    if !report.is_complete() {
        return Err(StrategyError::CoverageShortfall {
            strategy,
            missing: report.missing.len(),
            required: report.required,
        });
    }
    Ok(combinations)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dims(sizes: &[usize]) -> Vec<Dimension> {
        sizes
            .iter()
            .enumerate()
            .map(|(d, &n)| {
                Dimension::new(format!("d{d}"), (0..n).map(|v| format!("v{d}_{v}")).collect())
                    .unwrap()
            })
            .collect()
    }

    #[test]
    fn odometer_turns_last_position_fastest() {
        let rows: Vec<Vec<usize>> = CartesianIndices::new(&[2, 1, 3]).collect();
        assert_eq!(
            rows,
            vec![
                vec![0, 0, 0],
                vec![0, 0, 1],
                vec![0, 0, 2],
                vec![1, 0, 0],
                vec![1, 0, 1],
                vec![1, 0, 2],
            ]
        );
    }

    #[test]
    fn odometer_handles_degenerate_shapes() {
        assert_eq!(CartesianIndices::new(&[]).count(), 0);
        assert_eq!(CartesianIndices::new(&[3, 0]).count(), 0);
        assert_eq!(CartesianIndices::new(&[1]).collect::<Vec<_>>(), vec![vec![0]]);
    }

    #[test]
    fn full_enumeration_counts_product() {
        let d = dims(&[4, 3, 2]);
        let combos = FullEnumeration.generate_over(&d).unwrap();
        assert_eq!(combos.len(), 24);
        assert_eq!(combos[0].values(), &["v0_0", "v1_0", "v2_0"]);
        assert_eq!(combos[1].values(), &["v0_0", "v1_0", "v2_1"]);
        assert_eq!(combos[2].values(), &["v0_0", "v1_1", "v2_0"]);
        assert_eq!(combos[23].values(), &["v0_3", "v1_2", "v2_1"]);
    }

    #[test]
    fn incomplete_rows_are_a_coverage_shortfall() {
        let d = dims(&[2, 2]);
        let err = finish_pairwise("pairwise", &d, &[vec![0, 0]]).unwrap_err();
        assert_eq!(
            err,
            StrategyError::CoverageShortfall {
                strategy: "pairwise",
                missing: 3,
                required: 4,
            }
        );
        assert_eq!(
            err.to_string(),
            "pairwise left 3 of 4 pair requirements uncovered"
        );
        let all = vec![vec![0, 0], vec![0, 1], vec![1, 0], vec![1, 1]];
        assert_eq!(finish_pairwise("pairwise", &d, &all).unwrap().len(), 4);
    }

    #[test]
    fn strategy_kind_parses_loosely() {
        assert_eq!(StrategyKind::from_str_loose(" Pairwise "), Some(StrategyKind::Pairwise));
        assert_eq!(StrategyKind::from_str_loose("ALL"), Some(StrategyKind::Full));
        assert_eq!(StrategyKind::from_str_loose("ipo"), Some(StrategyKind::PairwiseIpo));
        assert_eq!(StrategyKind::from_str_loose("random"), None);
        assert_eq!(StrategyKind::default(), StrategyKind::Full);
        for kind in [StrategyKind::Full, StrategyKind::Pairwise, StrategyKind::PairwiseIpo] {
            assert_eq!(StrategyKind::from_str_loose(kind.as_str()), Some(kind));
            assert_eq!(kind.strategy().name(), kind.as_str());
        }
    }
}
