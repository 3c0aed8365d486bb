//! Preview table of the scenarios a run would generate. Writes nothing.

use std::fmt::Write;

use chaosgen_core::{Combination, LookupError, ParameterMatrix, StrategyKind};

/// One line of the preview.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListingRow {
    /// 1-based position in generation order.
    pub index: usize,
    pub name: String,
    pub tests: String,
    pub category: String,
    pub duration: String,
}

/// Build rows for `combinations` in their given order.
pub fn rows(
    matrix: &ParameterMatrix,
    combinations: &[Combination],
) -> Result<Vec<ListingRow>, LookupError> {
    combinations
        .iter()
        .enumerate()
        .map(|(i, combination)| {
            let (fault_type, target_tier, severity) =
                combination.as_triple().ok_or_else(|| LookupError {
                    dimension: "combination",
                    value: combination.to_string(),
                })?;
            let level = matrix.level(fault_type, severity)?;
            let tier = matrix.tier(target_tier)?;
            Ok(ListingRow {
                index: i + 1,
                name: matrix.scenario_name(fault_type, target_tier, severity)?,
                tests: format!("{} on {}", level.label, tier.label),
                category: matrix.fault(fault_type)?.category.clone(),
                duration: matrix.timing(severity)?.duration.clone(),
            })
        })
        .collect()
}

fn width(header: &str, cells: impl Iterator<Item = usize>) -> usize {
    cells.fold(header.chars().count(), usize::max)
}

/// Render rows as a fixed-width table with a rule under the header.
#[must_use]
pub fn render_table(rows: &[ListingRow]) -> String {
    let w_name = width("scenario name", rows.iter().map(|r| r.name.chars().count()));
    let w_tests = width("what it tests", rows.iter().map(|r| r.tests.chars().count()));
    let w_cat = width("category", rows.iter().map(|r| r.category.chars().count()));

    let header = format!(
        "{:<5}  {:<w_name$}  {:<w_tests$}  {:<w_cat$}  dur",
        "#", "scenario name", "what it tests", "category"
    );
    let mut out = String::new();
    let _ = writeln!(out, "{header}");
    let _ = writeln!(out, "{}", "─".repeat(header.chars().count()));
    for row in rows {
        let _ = writeln!(
            out,
            "{:<5}  {:<w_name$}  {:<w_tests$}  {:<w_cat$}  {}",
            row.index, row.name, row.tests, row.category, row.duration
        );
    }
    out
}

/// Header block printed before the table or a generation run.
#[must_use]
pub fn summary(strategy: StrategyKind, count: usize) -> String {
    format!("Strategy    : {}\nCombinations: {count}\n", strategy.describe())
}
