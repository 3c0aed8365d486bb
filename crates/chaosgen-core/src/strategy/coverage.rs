//! Pairwise coverage bookkeeping.
//!
//! The requirement set is every `(i, v, j, w)` with `i < j`, `v` in
//! dimension `i`, `w` in dimension `j`. [`PairTable`] stores it as one flat
//! bit vector: each dimension pair owns a contiguous block of
//! `|Di| * |Dj|` slots.

use serde::Serialize;

use crate::matrix::{Combination, Dimension};

/// Flat coverage table over all dimension-pair/value-pair requirements.
#[derive(Debug, Clone)]
pub(crate) struct PairTable {
    sizes: Vec<usize>,
    /// `offsets[i * n + j]` is the first slot of pair `(i, j)`, `i < j`.
    offsets: Vec<usize>,
    covered: Vec<bool>,
    covered_count: usize,
}

impl PairTable {
    pub(crate) fn new(sizes: &[usize]) -> Self {
        let n = sizes.len();
        let mut offsets = vec![0; n * n];
        let mut total = 0;
        for i in 0..n {
            for j in (i + 1)..n {
                offsets[i * n + j] = total;
                total += sizes[i] * sizes[j];
            }
        }
        Self {
            sizes: sizes.to_vec(),
            offsets,
            covered: vec![false; total],
            covered_count: 0,
        }
    }

    /// Size of the requirement set.
    pub(crate) fn required(&self) -> usize {
        self.covered.len()
    }

    pub(crate) fn covered(&self) -> usize {
        self.covered_count
    }

    pub(crate) fn is_complete(&self) -> bool {
        self.covered_count == self.covered.len()
    }

    /// Number of dimension pairs, i.e. the most a single row can cover.
    pub(crate) fn pair_count(&self) -> usize {
        let n = self.sizes.len();
        n * n.saturating_sub(1) / 2
    }

    fn slot(&self, i: usize, vi: usize, j: usize, vj: usize) -> usize {
        debug_assert!(i < j);
        self.offsets[i * self.sizes.len() + j] + vi * self.sizes[j] + vj
    }

    /// Requirements `row` would newly cover.
    pub(crate) fn gain(&self, row: &[usize]) -> usize {
        let n = row.len();
        let mut gain = 0;
        for i in 0..n {
            for j in (i + 1)..n {
                if !self.covered[self.slot(i, row[i], j, row[j])] {
                    gain += 1;
                }
            }
        }
        gain
    }

    /// Mark every pair projection of `row` covered; returns the gain.
    pub(crate) fn cover(&mut self, row: &[usize]) -> usize {
        let n = row.len();
        let mut gained = 0;
        for i in 0..n {
            for j in (i + 1)..n {
                let slot = self.slot(i, row[i], j, row[j]);
                if !self.covered[slot] {
                    self.covered[slot] = true;
                    gained += 1;
                }
            }
        }
        self.covered_count += gained;
        gained
    }

    /// Uncovered requirements as `(i, vi, j, vj)`, in canonical order.
    pub(crate) fn missing(&self) -> Vec<(usize, usize, usize, usize)> {
        let n = self.sizes.len();
        let mut out = Vec::new();
        for i in 0..n {
            for j in (i + 1)..n {
                for vi in 0..self.sizes[i] {
                    for vj in 0..self.sizes[j] {
                        if !self.covered[self.slot(i, vi, j, vj)] {
                            out.push((i, vi, j, vj));
                        }
                    }
                }
            }
        }
        out
    }
}

/// One uncovered value pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PairRequirement {
    pub left_dimension: String,
    pub left_value: String,
    pub right_dimension: String,
    pub right_value: String,
}

/// Outcome of checking a selection against the 2-way requirement set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CoverageReport {
    pub dimensions: usize,
    pub selected: usize,
    pub required: usize,
    pub covered: usize,
    /// Largest `|Di| * |Dj|`; no complete selection can be smaller.
    pub lower_bound: usize,
    /// Selected combinations whose arity or values fall outside the domain.
    pub out_of_domain: usize,
    pub missing: Vec<PairRequirement>,
}

impl CoverageReport {
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.missing.is_empty() && self.covered == self.required
    }

    #[must_use]
    pub fn coverage_percent(&self) -> f64 {
        if self.required == 0 {
            return 100.0;
        }
        (self.covered as f64 * 100.0) / self.required as f64
    }
}

/// Brute-force check of 2-way coverage for `combinations` over `dimensions`.
#[must_use]
pub fn check_pairwise(dimensions: &[Dimension], combinations: &[Combination]) -> CoverageReport {
    let sizes: Vec<usize> = dimensions.iter().map(Dimension::len).collect();
    let mut table = PairTable::new(&sizes);
    let mut out_of_domain = 0;

    for combo in combinations {
        let row: Option<Vec<usize>> = if combo.len() == dimensions.len() {
            dimensions
                .iter()
                .zip(combo.values())
                .map(|(dim, value)| dim.position(value))
                .collect()
        } else {
            None
        };
        match row {
            Some(row) => {
                table.cover(&row);
            }
            None => out_of_domain += 1,
        }
    }

    let missing = table
        .missing()
        .into_iter()
        .map(|(i, vi, j, vj)| PairRequirement {
            left_dimension: dimensions[i].name().to_string(),
            left_value: dimensions[i].values()[vi].clone(),
            right_dimension: dimensions[j].name().to_string(),
            right_value: dimensions[j].values()[vj].clone(),
        })
        .collect();

    let mut lower_bound = 0;
    for i in 0..sizes.len() {
        for j in (i + 1)..sizes.len() {
            lower_bound = lower_bound.max(sizes[i] * sizes[j]);
        }
    }

    CoverageReport {
        dimensions: dimensions.len(),
        selected: combinations.len(),
        required: table.required(),
        covered: table.covered(),
        lower_bound,
        out_of_domain,
        missing,
    }
}
