//! End-to-end generation run.
//!
//! select combinations -> verify pairwise coverage -> assemble (parallel)
//! -> audit the whole batch -> write files -> write manifest.
//!
//! Nothing is written unless the entire batch assembles and audits clean.
//! Once writing starts, the first I/O failure aborts the run.

use std::time::Instant;

use serde_json::json;

use chaosgen_core::{
    Combination, CoverageReport, ParameterMatrix, StrategyKind, assemble_batch, check_pairwise,
};

use crate::audit::audit_batch;
use crate::config::GeneratorConfig;
use crate::error::HarnessError;
use crate::listing::{self, ListingRow};
use crate::structured_log::{LogEmitter, LogEntry, LogLevel, Outcome, events};
use crate::writer::{ArtifactIndex, ScenarioWriter, WrittenScenario};

/// What a completed run produced.
#[derive(Debug, Clone)]
pub struct RunSummary {
    pub strategy: StrategyKind,
    pub combinations: usize,
    pub coverage: Option<CoverageReport>,
    pub written: Vec<WrittenScenario>,
    pub duration_ms: u64,
}

/// Combinations the strategy selects over `matrix`.
pub fn select(
    matrix: &ParameterMatrix,
    strategy: StrategyKind,
) -> Result<Vec<Combination>, HarnessError> {
    Ok(strategy.strategy().generate(matrix)?)
}

/// Preview rows for a run, in generation order.
pub fn plan(
    matrix: &ParameterMatrix,
    strategy: StrategyKind,
) -> Result<Vec<ListingRow>, HarnessError> {
    let combinations = select(matrix, strategy)?;
    Ok(listing::rows(matrix, &combinations)?)
}

/// 2-way coverage of the strategy's selection.
pub fn coverage(
    matrix: &ParameterMatrix,
    strategy: StrategyKind,
) -> Result<CoverageReport, HarnessError> {
    let combinations = select(matrix, strategy)?;
    Ok(check_pairwise(matrix.dimensions(), &combinations))
}

fn emit(log: &mut LogEmitter, entry: LogEntry) -> Result<(), HarnessError> {
    log.emit_entry(entry)
        .map_err(|e| HarnessError::io("structured log", e))
}

/// Run a full generation and write every scenario under the output root.
pub fn generate(
    config: &GeneratorConfig,
    matrix: &ParameterMatrix,
    log: &mut LogEmitter,
) -> Result<RunSummary, HarnessError> {
    let started = Instant::now();
    let start = log
        .entry(LogLevel::Info, events::GENERATION_START)
        .with_strategy(config.strategy)
        .with_details(json!({
            "output_root": config.output_root.display().to_string(),
            "workers": config.workers,
            "domain_size": matrix.combination_count(),
            "enclave_substituted": config.enclave.is_some(),
        }));
    emit(log, start)?;

    match run(config, matrix, log, started) {
        Ok(summary) => {
            let done = log
                .entry(LogLevel::Info, events::GENERATION_COMPLETE)
                .with_strategy(config.strategy)
                .with_outcome(Outcome::Pass)
                .with_duration_ms(summary.duration_ms)
                .with_details(json!({
                    "combinations": summary.combinations,
                    "written": summary.written.len(),
                }));
            emit(log, done)?;
            log.flush()
                .map_err(|e| HarnessError::io("structured log", e))?;
            Ok(summary)
        }
        Err(err) => {
            let failed = log
                .entry(LogLevel::Error, events::GENERATION_FAILED)
                .with_strategy(config.strategy)
                .with_outcome(Outcome::Fail)
                .with_duration_ms(elapsed_ms(started))
                .with_details(json!({ "error": err.to_string() }));
            // Report the run error, not a logging failure.
            let _ = emit(log, failed);
            let _ = log.flush();
            Err(err)
        }
    }
}

fn elapsed_ms(started: Instant) -> u64 {
    u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX)
}

fn run(
    config: &GeneratorConfig,
    matrix: &ParameterMatrix,
    log: &mut LogEmitter,
    started: Instant,
) -> Result<RunSummary, HarnessError> {
    let combinations = select(matrix, config.strategy)?;

    let coverage = if config.strategy.is_pairwise() {
        let report = check_pairwise(matrix.dimensions(), &combinations);
        let verified = log
            .entry(LogLevel::Info, events::COVERAGE_VERIFIED)
            .with_strategy(config.strategy)
            .with_outcome(if report.is_complete() {
                Outcome::Pass
            } else {
                Outcome::Fail
            })
            .with_details(json!({
                "selected": report.selected,
                "required_pairs": report.required,
                "covered_pairs": report.covered,
                "lower_bound": report.lower_bound,
            }));
        emit(log, verified)?;
        Some(report)
    } else {
        None
    };

    let records = assemble_batch(matrix, &combinations, config.workers)?;

    let findings = audit_batch(records.iter().map(|r| &r.record));
    if !findings.is_empty() {
        return Err(HarnessError::Audit(findings));
    }

    let writer = ScenarioWriter::new(
        &config.output_root,
        matrix.identity().enclave_placeholder.clone(),
    )
    .with_enclave(config.enclave.clone());

    let mut written = Vec::with_capacity(records.len());
    for indexed in &records {
        let fault_type = indexed.combination.get(0).unwrap_or_default();
        let category = &matrix.fault(fault_type)?.category;
        let file = writer.write(&indexed.record, category)?;
        let entry = log
            .entry(LogLevel::Debug, events::SCENARIO_WRITTEN)
            .with_scenario(&file.name, category)
            .with_outcome(Outcome::Pass)
            .with_artifacts(vec![file.relative.clone()])
            .with_details(json!({ "sha256": file.sha256, "index": indexed.index }));
        emit(log, entry)?;
        written.push(file);
    }

    if let Some(path) = &config.manifest_path {
        let mut index = ArtifactIndex::new(log.run_id(), config.strategy.as_str());
        for file in &written {
            index.add(file);
        }
        index.write_to(path)?;
    }

    Ok(RunSummary {
        strategy: config.strategy,
        combinations: combinations.len(),
        coverage,
        written,
        duration_ms: elapsed_ms(started),
    })
}
