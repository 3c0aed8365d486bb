//! In-parameter-order (IPO) pairwise construction.
//!
//! Starts from the product of the first two dimensions, then adds one
//! dimension at a time: horizontal growth assigns each existing row the
//! value covering the most new pairs, vertical growth patches leftover pairs
//! into don't-care slots or appends new rows. Remaining don't-care slots are
//! filled with each dimension's first value.
//!
//! The selection usually differs from [`PairwiseGreedy`](super::PairwiseGreedy)
//! in both size and order; only the coverage postcondition is shared.

use super::{CombinationStrategy, FullEnumeration, StrategyError};
use crate::matrix::{Combination, Dimension};

/// In-parameter-order 2-way covering strategy.
#[derive(Debug, Clone, Copy, Default)]
pub struct PairwiseIpo;

impl CombinationStrategy for PairwiseIpo {
    fn name(&self) -> &'static str {
        "pairwise-ipo"
    }

    fn generate_over(&self, dimensions: &[Dimension]) -> Result<Vec<Combination>, StrategyError> {
        if dimensions.len() < 2 {
            return FullEnumeration.generate_over(dimensions);
        }
        let sizes: Vec<usize> = dimensions.iter().map(Dimension::len).collect();
        let rows = if sizes.contains(&0) {
            Vec::new()
        } else {
            ipo_rows(&sizes)
        };
        super::finish_pairwise(self.name(), dimensions, &rows)
    }
}

pub(crate) fn ipo_rows(sizes: &[usize]) -> Vec<Vec<usize>> {
    let n = sizes.len();
    let mut rows: Vec<Vec<Option<usize>>> = Vec::new();
    for a in 0..sizes[0] {
        for b in 0..sizes[1] {
            let mut row = vec![None; n];
            row[0] = Some(a);
            row[1] = Some(b);
            rows.push(row);
        }
    }

    for k in 2..n {
        let width = sizes[k];
        // uncovered[i][vi * width + vk] for every earlier dimension i.
        let mut uncovered: Vec<Vec<bool>> = (0..k).map(|i| vec![true; sizes[i] * width]).collect();

        for row in &mut rows {
            let mut best_value = 0;
            let mut best_gain = 0;
            for v in 0..width {
                let gain = (0..k)
                    .filter(|&i| row[i].is_some_and(|vi| uncovered[i][vi * width + v]))
                    .count();
                if gain > best_gain {
                    best_gain = gain;
                    best_value = v;
                }
            }
            row[k] = Some(best_value);
            for (i, slot) in row.iter().take(k).enumerate() {
                if let Some(vi) = *slot {
                    uncovered[i][vi * width + best_value] = false;
                }
            }
        }

        for i in 0..k {
            for vi in 0..sizes[i] {
                for vk in 0..width {
                    if !uncovered[i][vi * width + vk] {
                        continue;
                    }
                    let reusable = rows
                        .iter()
                        .position(|row| row[i].is_none() && row[k] == Some(vk));
                    if let Some(pos) = reusable {
                        rows[pos][i] = Some(vi);
                    } else {
                        let mut row = vec![None; n];
                        row[i] = Some(vi);
                        row[k] = Some(vk);
                        rows.push(row);
                    }
                    uncovered[i][vi * width + vk] = false;
                }
            }
        }
    }

    rows.into_iter()
        .map(|row| row.into_iter().map(|v| v.unwrap_or(0)).collect())
        .collect()
}
