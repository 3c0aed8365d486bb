//! Integration test: combination strategies over built-in and synthetic matrices.
//!
//! Validates that:
//! 1. Full enumeration has the product count, canonical order, and no duplicates.
//! 2. Both pairwise strategies cover every value pair (brute-force cross-check).
//! 3. Pairwise selections sit between the pair-product lower bound and the
//!    full product.
//! 4. Re-running a strategy yields an identical selection.
//!
//! Run: cargo test -p chaosgen-core --test strategy_test

use std::collections::HashSet;

use chaosgen_core::matrix::{FAULT_TYPE, SEVERITY, TARGET_TIER};
use chaosgen_core::{
    Combination, CombinationStrategy, Dimension, FullEnumeration, PairwiseGreedy, PairwiseIpo,
    ParameterMatrix, StrategyKind, check_pairwise,
};

fn builtin() -> ParameterMatrix {
    ParameterMatrix::builtin().expect("builtin matrix should validate")
}

fn synthetic(sizes: &[usize]) -> Vec<Dimension> {
    sizes
        .iter()
        .enumerate()
        .map(|(d, &n)| {
            Dimension::new(
                format!("dim{d}"),
                (0..n).map(|v| format!("d{d}v{v}")).collect(),
            )
            .expect("synthetic dimension should be valid")
        })
        .collect()
}

/// Every (i, v, j, w) checked directly against the selection.
fn brute_force_covers(dims: &[Dimension], combos: &[Combination]) -> bool {
    for i in 0..dims.len() {
        for j in (i + 1)..dims.len() {
            for v in dims[i].values() {
                for w in dims[j].values() {
                    let hit = combos
                        .iter()
                        .any(|c| c.get(i) == Some(v.as_str()) && c.get(j) == Some(w.as_str()));
                    if !hit {
                        return false;
                    }
                }
            }
        }
    }
    true
}

fn pair_lower_bound(dims: &[Dimension]) -> usize {
    let mut bound = 0;
    for i in 0..dims.len() {
        for j in (i + 1)..dims.len() {
            bound = bound.max(dims[i].len() * dims[j].len());
        }
    }
    bound
}

#[test]
fn full_enumeration_matches_product_and_order() {
    let matrix = builtin();
    let combos = FullEnumeration.generate(&matrix).expect("full enumeration");
    assert_eq!(combos.len(), 264);
    assert_eq!(combos.len(), matrix.combination_count());

    let unique: HashSet<&Combination> = combos.iter().collect();
    assert_eq!(unique.len(), combos.len(), "duplicate combinations");

    let faults = matrix.values(FAULT_TYPE).unwrap();
    let tiers = matrix.values(TARGET_TIER).unwrap();
    let severities = matrix.values(SEVERITY).unwrap();

    // Severity turns every step, tier every 3, fault every 24.
    for (n, combo) in combos.iter().enumerate() {
        assert_eq!(combo.get(2), Some(severities[n % 3].as_str()));
        assert_eq!(combo.get(1), Some(tiers[(n / 3) % 8].as_str()));
        assert_eq!(combo.get(0), Some(faults[n / 24].as_str()));
    }

    for (pos, dim) in matrix.dimensions().iter().enumerate() {
        for value in dim.values() {
            assert!(
                combos.iter().any(|c| c.get(pos) == Some(value.as_str())),
                "{value} never appears"
            );
        }
    }
}

#[test]
fn full_enumeration_is_recomputed_identically() {
    let matrix = builtin();
    let a = FullEnumeration.generate(&matrix).unwrap();
    let b = FullEnumeration.generate(&matrix).unwrap();
    assert_eq!(a, b);
}

#[test]
fn greedy_covers_builtin_matrix_within_bounds() {
    let matrix = builtin();
    let combos = PairwiseGreedy.generate(&matrix).expect("greedy pairwise");
    let dims = matrix.dimensions();

    assert!(brute_force_covers(dims, &combos));
    assert!(combos.len() >= pair_lower_bound(dims), "below 11x8 lower bound");
    assert!(combos.len() < matrix.combination_count());

    let unique: HashSet<&Combination> = combos.iter().collect();
    assert_eq!(unique.len(), combos.len(), "greedy re-selected a combination");

    let report = check_pairwise(dims, &combos);
    assert!(report.is_complete());
    assert_eq!(report.required, 11 * 8 + 11 * 3 + 8 * 3);
    assert_eq!(report.lower_bound, 88);
    assert_eq!(report.out_of_domain, 0);
}

#[test]
fn greedy_is_deterministic() {
    let matrix = builtin();
    let first = PairwiseGreedy.generate(&matrix).unwrap();
    for _ in 0..3 {
        assert_eq!(PairwiseGreedy.generate(&matrix).unwrap(), first);
    }
}

#[test]
fn greedy_first_selection_is_first_canonical_combination() {
    let matrix = builtin();
    let greedy = PairwiseGreedy.generate(&matrix).unwrap();
    let full = FullEnumeration.generate(&matrix).unwrap();
    assert_eq!(greedy[0], full[0]);
}

#[test]
fn pairwise_strategies_cover_assorted_shapes() {
    let shapes: &[&[usize]] = &[
        &[2, 2],
        &[3, 3, 3],
        &[2, 2, 2, 2],
        &[5, 1, 4],
        &[4, 3, 2, 3],
        &[6, 2, 2, 2, 2],
        &[1, 1, 1],
    ];
    for sizes in shapes {
        let dims = synthetic(sizes);
        let full = FullEnumeration.generate_over(&dims).unwrap();
        for strategy in [
            &PairwiseGreedy as &dyn CombinationStrategy,
            &PairwiseIpo as &dyn CombinationStrategy,
        ] {
            let combos = strategy
                .generate_over(&dims)
                .unwrap_or_else(|e| panic!("{} on {sizes:?}: {e}", strategy.name()));
            assert!(
                brute_force_covers(&dims, &combos),
                "{} misses a pair on {sizes:?}",
                strategy.name()
            );
            assert!(combos.len() >= pair_lower_bound(&dims), "{sizes:?}");
            assert!(combos.len() <= full.len(), "{sizes:?}");
            for combo in &combos {
                assert!(full.contains(combo), "{combo} outside the domain");
            }
        }
    }
}

#[test]
fn three_binary_dimensions_reduce_to_four() {
    let dims = synthetic(&[2, 2, 2]);
    let combos = PairwiseGreedy.generate_over(&dims).unwrap();
    assert_eq!(combos.len(), 4);
}

#[test]
fn fewer_than_two_dimensions_falls_back_to_full() {
    let single = synthetic(&[4]);
    for kind in [StrategyKind::Full, StrategyKind::Pairwise, StrategyKind::PairwiseIpo] {
        let combos = kind.strategy().generate_over(&single).unwrap();
        assert_eq!(combos.len(), 4, "{}", kind.as_str());
        assert!(kind.strategy().generate_over(&[]).unwrap().is_empty());
    }
}

#[test]
fn ipo_covers_builtin_matrix() {
    let matrix = builtin();
    let combos = PairwiseIpo.generate(&matrix).expect("ipo pairwise");
    assert!(brute_force_covers(matrix.dimensions(), &combos));
    assert!(combos.len() >= 88);
    assert!(combos.len() <= 264);
    assert_eq!(PairwiseIpo.generate(&matrix).unwrap(), combos);
}

#[test]
fn coverage_report_flags_a_truncated_selection() {
    let matrix = builtin();
    let mut combos = PairwiseGreedy.generate(&matrix).unwrap();
    combos.truncate(10);
    let report = check_pairwise(matrix.dimensions(), &combos);
    assert!(!report.is_complete());
    assert_eq!(report.selected, 10);
    assert!(report.covered <= 30);
    assert_eq!(report.missing.len(), report.required - report.covered);
}
