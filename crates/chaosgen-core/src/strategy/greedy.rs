//! Greedy pairwise covering set.
//!
//! Each round scans the whole full-enumeration domain (already selected
//! combinations included) and picks the candidate that covers the most
//! still-uncovered pairs. Ties go to the candidate earliest in canonical
//! enumeration order, so the selection is reproducible byte for byte.

use super::{CartesianIndices, CombinationStrategy, FullEnumeration, PairTable, StrategyError};
use crate::matrix::{Combination, Dimension};

/// Greedy 2-way covering strategy.
#[derive(Debug, Clone, Copy, Default)]
pub struct PairwiseGreedy;

impl CombinationStrategy for PairwiseGreedy {
    fn name(&self) -> &'static str {
        "pairwise"
    }

    fn generate_over(&self, dimensions: &[Dimension]) -> Result<Vec<Combination>, StrategyError> {
        // No pairs to cover; every value once is the natural minimum.
        if dimensions.len() < 2 {
            return FullEnumeration.generate_over(dimensions);
        }
        let sizes: Vec<usize> = dimensions.iter().map(Dimension::len).collect();
        let rows = greedy_rows(&sizes);
        super::finish_pairwise(self.name(), dimensions, &rows)
    }
}

/// Index rows chosen by the greedy rounds, in selection order.
pub(crate) fn greedy_rows(sizes: &[usize]) -> Vec<Vec<usize>> {
    let domain: Vec<Vec<usize>> = CartesianIndices::new(sizes).collect();
    let mut table = PairTable::new(sizes);
    let ceiling = table.pair_count();
    let mut selected = Vec::new();

    while !table.is_complete() {
        let mut best: Option<(usize, usize)> = None;
        for (idx, row) in domain.iter().enumerate() {
            let gain = table.gain(row);
            if gain > best.map_or(0, |(_, g)| g) {
                best = Some((idx, gain));
                if gain == ceiling {
                    break;
                }
            }
        }
        // Zero gain everywhere: stop rather than spin; the caller flags it.
        let Some((idx, _)) = best else {
            break;
        };
        table.cover(&domain[idx]);
        selected.push(domain[idx].clone());
    }

    selected
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_pick_is_first_in_canonical_order() {
        let rows = greedy_rows(&[3, 3, 3]);
        assert_eq!(rows[0], vec![0, 0, 0]);
        // (0,1,1) is the first row sharing no pair with (0,0,0).
        assert_eq!(rows[1], vec![0, 1, 1]);
    }

    #[test]
    fn three_binary_dimensions_need_four_rows() {
        let rows = greedy_rows(&[2, 2, 2]);
        assert_eq!(rows.len(), 4);
        let mut table = PairTable::new(&[2, 2, 2]);
        for row in &rows {
            table.cover(row);
        }
        assert!(table.is_complete());
    }

    #[test]
    fn two_dimensions_degenerate_to_full_product() {
        let rows = greedy_rows(&[3, 4]);
        assert_eq!(rows.len(), 12);
    }

    #[test]
    fn empty_dimension_stops_without_looping() {
        assert!(greedy_rows(&[2, 0, 3]).is_empty());
    }
}
