//! Integration test: end-to-end generation into a temporary directory.
//!
//! Validates that:
//! 1. A full run writes one file per combination under its category.
//! 2. Written YAML parses back into the assembled record.
//! 3. Comparison thresholds stay quoted literals and the enclave is substituted.
//! 4. The manifest digests match the files on disk.
//! 5. The JSONL log passes schema validation and has the expected event sequence.
//! 6. Audit failures and I/O failures abort the run and are logged.
//!
//! Run: cargo test -p chaosgen-harness --test generate_test

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use chaosgen_core::catalog::polygon_pos;
use chaosgen_core::{ParameterMatrix, ScenarioRecord, StrategyKind, assemble};
use chaosgen_harness::structured_log::{LogEmitter, validate_log_file, validate_log_line};
use chaosgen_harness::{ArtifactIndex, GeneratorConfig, HarnessError, pipeline};

fn config(root: &Path, strategy: StrategyKind) -> GeneratorConfig {
    GeneratorConfig {
        strategy,
        output_root: root.to_path_buf(),
        enclave: None,
        workers: 4,
        matrix_path: None,
        log_path: None,
        manifest_path: None,
    }
}

fn yaml_files(root: &Path) -> Vec<PathBuf> {
    let mut files = Vec::new();
    for category in std::fs::read_dir(root).expect("output root should exist") {
        let category = category.expect("dir entry").path();
        for file in std::fs::read_dir(&category).expect("category dir") {
            files.push(file.expect("dir entry").path());
        }
    }
    files.sort();
    files
}

fn event_names(lines: &[String]) -> Vec<String> {
    lines
        .iter()
        .map(|line| {
            let v: serde_json::Value = serde_json::from_str(line).expect("log line is JSON");
            v["event"].as_str().unwrap_or_default().to_string()
        })
        .collect()
}

#[test]
fn full_run_writes_every_scenario_by_category() {
    let dir = tempfile::tempdir().expect("tempdir");
    let matrix = ParameterMatrix::builtin().unwrap();
    let mut log = LogEmitter::to_buffer("full-run");

    let summary = pipeline::generate(&config(dir.path(), StrategyKind::Full), &matrix, &mut log)
        .expect("full generation should succeed");
    assert_eq!(summary.combinations, 264);
    assert_eq!(summary.written.len(), 264);
    assert!(summary.coverage.is_none());

    let files = yaml_files(dir.path());
    assert_eq!(files.len(), 264);

    let categories: BTreeSet<String> = files
        .iter()
        .map(|p| {
            p.parent()
                .and_then(Path::file_name)
                .and_then(|n| n.to_str())
                .unwrap()
                .to_string()
        })
        .collect();
    let expected: BTreeSet<String> = ["applications", "cpu-memory", "filesystem", "network"]
        .iter()
        .map(|s| (*s).to_string())
        .collect();
    assert_eq!(categories, expected);

    let path = dir
        .path()
        .join("network/gen-packet-loss-40pct-validator1-heimdall.yaml");
    assert!(path.is_file(), "{} missing", path.display());
    let path = dir
        .path()
        .join("applications/gen-container-pause-120s-rabbitmq.yaml");
    assert!(path.is_file(), "{} missing", path.display());
}

#[test]
fn written_yaml_parses_back_to_the_record() {
    let dir = tempfile::tempdir().expect("tempdir");
    let matrix = ParameterMatrix::builtin().unwrap();
    let mut log = LogEmitter::discard("roundtrip");
    pipeline::generate(&config(dir.path(), StrategyKind::Full), &matrix, &mut log).unwrap();

    for (fault, tier, severity, category) in [
        ("packet_loss", "validator1_heimdall", "moderate", "network"),
        ("connection_drop", "all_both", "mild", "network"),
        ("dns_latency", "rpc_nodes", "severe", "network"),
        ("container_pause", "rabbitmq", "severe", "applications"),
        ("memory_pressure", "validator1_both", "severe", "cpu-memory"),
    ] {
        let expected = assemble(fault, tier, severity, &matrix).unwrap();
        let path = dir
            .path()
            .join(category)
            .join(format!("{}.yaml", expected.name()));
        let text = std::fs::read_to_string(&path).expect("scenario file should exist");
        let parsed: ScenarioRecord =
            serde_yaml::from_str(&text).expect("scenario YAML should parse");
        assert_eq!(parsed, expected, "{}", path.display());
    }
}

#[test]
fn thresholds_are_literal_and_enclave_is_substituted() {
    let dir = tempfile::tempdir().expect("tempdir");
    let matrix = ParameterMatrix::builtin().unwrap();
    let mut cfg = config(dir.path(), StrategyKind::Pairwise);
    cfg.enclave = Some("pos-devnet".to_string());
    let mut log = LogEmitter::discard("enclave");
    let summary = pipeline::generate(&cfg, &matrix, &mut log).unwrap();

    for file in &summary.written {
        let text = std::fs::read_to_string(&file.path).unwrap();
        assert!(text.contains("threshold: '>= 0.67'"), "{}", file.relative);
        assert!(text.contains("threshold: '> 0'"), "{}", file.relative);
        assert!(text.contains("enclave: pos-devnet"), "{}", file.relative);
        assert!(!text.contains("${ENCLAVE_NAME}"), "{}", file.relative);

        let doc: serde_yaml::Value = serde_yaml::from_str(&text).unwrap();
        let criteria = doc["spec"]["success_criteria"]
            .as_sequence()
            .expect("criteria list");
        assert_eq!(criteria.len(), 3);
        assert_eq!(criteria[2]["threshold"].as_str(), Some(">= 0.67"));
        assert_eq!(
            criteria[0]["window"].as_str(),
            doc["spec"]["duration"].as_str()
        );
    }
}

#[test]
fn pairwise_run_logs_coverage_and_manifest_verifies() {
    let dir = tempfile::tempdir().expect("tempdir");
    let out = dir.path().join("out");
    let log_path = dir.path().join("logs/run.jsonl");
    let manifest_path = dir.path().join("manifest.json");

    let matrix = ParameterMatrix::builtin().unwrap();
    let mut cfg = config(&out, StrategyKind::Pairwise);
    cfg.manifest_path = Some(manifest_path.clone());
    let mut log = LogEmitter::to_file(&log_path, "pairwise-run").expect("log file");
    let summary = pipeline::generate(&cfg, &matrix, &mut log).unwrap();
    drop(log);

    let planned = pipeline::plan(&matrix, StrategyKind::Pairwise).unwrap();
    assert_eq!(summary.written.len(), planned.len());
    let coverage = summary.coverage.as_ref().expect("pairwise runs report coverage");
    assert!(coverage.is_complete());
    for (row, file) in planned.iter().zip(&summary.written) {
        assert_eq!(row.name, file.name);
    }

    let (lines, errors) = validate_log_file(&log_path).expect("log readable");
    assert!(errors.is_empty(), "{errors:?}");
    assert_eq!(lines, summary.written.len() + 3);

    let text = std::fs::read_to_string(&log_path).unwrap();
    let events = event_names(&text.lines().map(str::to_string).collect::<Vec<_>>());
    assert_eq!(events[0], "generation_start");
    assert_eq!(events[1], "coverage_verified");
    assert_eq!(events.last().map(String::as_str), Some("generation_complete"));

    let manifest: ArtifactIndex =
        serde_json::from_str(&std::fs::read_to_string(&manifest_path).unwrap())
            .expect("manifest JSON");
    assert_eq!(manifest.run_id, "pairwise-run");
    assert_eq!(manifest.strategy, "pairwise");
    assert_eq!(manifest.artifacts.len(), summary.written.len());
    assert!(manifest.verify(&out).is_empty());

    std::fs::write(out.join(&manifest.artifacts[0].path), "tampered").unwrap();
    assert_eq!(manifest.verify(&out), vec![manifest.artifacts[0].path.clone()]);
}

#[test]
fn audit_failure_writes_nothing() {
    let dir = tempfile::tempdir().expect("tempdir");
    let out = dir.path().join("out");
    let mut matrix_config = polygon_pos();
    matrix_config.identity.name_prefix = "GEN".to_string();
    let matrix = ParameterMatrix::from_config(matrix_config).unwrap();
    let mut log = LogEmitter::to_buffer("audit");

    let err = pipeline::generate(&config(&out, StrategyKind::Full), &matrix, &mut log)
        .expect_err("uppercase names should fail the audit");
    match err {
        HarnessError::Audit(findings) => {
            assert_eq!(findings.len(), 264);
            assert!(findings.iter().all(|f| f.field == "metadata.name"));
        }
        other => panic!("unexpected error: {other}"),
    }
    assert!(!out.exists());

    let lines = log.buffered_lines();
    assert_eq!(event_names(&lines), vec!["generation_start", "generation_failed"]);
    for (i, line) in lines.iter().enumerate() {
        assert!(validate_log_line(line, i + 1).is_ok(), "{line}");
    }
}

#[test]
fn unwritable_output_root_aborts_with_io_error() {
    let dir = tempfile::tempdir().expect("tempdir");
    let blocker = dir.path().join("not-a-dir");
    std::fs::write(&blocker, "file").unwrap();

    let matrix = ParameterMatrix::builtin().unwrap();
    let mut log = LogEmitter::to_buffer("io");
    let err = pipeline::generate(&config(&blocker, StrategyKind::Full), &matrix, &mut log)
        .expect_err("writing under a file should fail");
    assert!(matches!(err, HarnessError::Io { .. }), "{err}");
    let events = event_names(&log.buffered_lines());
    assert_eq!(events.last().map(String::as_str), Some("generation_failed"));
}

#[test]
fn matrix_file_with_escaping_category_is_rejected_before_writing() {
    let dir = tempfile::tempdir().expect("tempdir");
    let out = dir.path().join("out");
    let matrix_path = dir.path().join("matrix.json");

    let mut matrix_config = polygon_pos();
    matrix_config.faults[0].category = "../escaped".to_string();
    std::fs::write(&matrix_path, serde_json::to_string(&matrix_config).unwrap()).unwrap();

    let mut cfg = config(&out, StrategyKind::Full);
    cfg.matrix_path = Some(matrix_path);
    let err = cfg.load_matrix().expect_err("escaping category should not load");
    assert!(
        matches!(
            err,
            HarnessError::Config(chaosgen_core::ConfigError::InvalidCategory { .. })
        ),
        "{err}"
    );
    assert!(!out.exists());
    assert!(!dir.path().join("escaped").exists());
}
