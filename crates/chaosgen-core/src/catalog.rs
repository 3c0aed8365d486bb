//! Matrix configuration schema and the built-in Polygon PoS catalog.
//!
//! The schema is plain serde data so a matrix can also be supplied as JSON
//! (`chaosgen --matrix <file>`). Validation lives in
//! [`ParameterMatrix::from_config`](crate::ParameterMatrix::from_config).

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::matrix::{CriterionTemplate, ParamSet, ParamValue, Selector, Timing};

/// Identity fields stamped on every generated record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Identity {
    /// First segment of every scenario name.
    pub name_prefix: String,
    pub api_version: String,
    pub kind: String,
    pub author: String,
    pub version: String,
    /// Selector `type` written into each target.
    pub selector_kind: String,
    /// Token standing in for the deployment identifier; replaced textually
    /// after serialization.
    pub enclave_placeholder: String,
}

impl Default for Identity {
    fn default() -> Self {
        Self {
            name_prefix: "gen".to_string(),
            api_version: "chaos.polygon.io/v1".to_string(),
            kind: "ChaosScenario".to_string(),
            author: "chaosgen".to_string(),
            version: "0.0.1".to_string(),
            selector_kind: "kurtosis_service".to_string(),
            enclave_placeholder: "${ENCLAVE_NAME}".to_string(),
        }
    }
}

/// One fault at one severity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FaultLevel {
    /// Name segment describing the concrete test value (`40pct`, `immediate`).
    pub slug: String,
    /// Human label used in descriptions and the preview listing.
    pub label: String,
    pub params: ParamSet,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FaultConfig {
    pub name: String,
    /// Fault type understood by the runner (several faults share `network`).
    #[serde(rename = "type")]
    pub runner_type: String,
    /// Output subdirectory.
    pub category: String,
    pub label: String,
    /// Keyed by severity name.
    pub levels: BTreeMap<String, FaultLevel>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TierConfig {
    pub name: String,
    pub label: String,
    pub selectors: Vec<Selector>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeverityConfig {
    pub name: String,
    pub timing: Timing,
}

/// Complete, unvalidated matrix definition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatrixConfig {
    #[serde(default)]
    pub identity: Identity,
    pub faults: Vec<FaultConfig>,
    pub tiers: Vec<TierConfig>,
    pub severities: Vec<SeverityConfig>,
    pub criteria: Vec<CriterionTemplate>,
    #[serde(default)]
    pub metrics: Vec<String>,
}

const SEVERITIES: [&str; 3] = ["mild", "moderate", "severe"];

type LevelSpec<'a> = (&'a str, &'a str, Vec<(&'a str, ParamValue)>);

fn fault(
    name: &str,
    runner_type: &str,
    category: &str,
    label: &str,
    levels: [LevelSpec<'_>; 3],
) -> FaultConfig {
    let levels = SEVERITIES
        .iter()
        .zip(levels)
        .map(|(severity, (slug, label, params))| {
            let params = params
                .into_iter()
                .map(|(k, v)| (k.to_string(), v))
                .collect();
            (
                (*severity).to_string(),
                FaultLevel {
                    slug: slug.to_string(),
                    label: label.to_string(),
                    params,
                },
            )
        })
        .collect();
    FaultConfig {
        name: name.to_string(),
        runner_type: runner_type.to_string(),
        category: category.to_string(),
        label: label.to_string(),
        levels,
    }
}

fn tier(name: &str, label: &str, selectors: &[(&str, &str)]) -> TierConfig {
    TierConfig {
        name: name.to_string(),
        label: label.to_string(),
        selectors: selectors
            .iter()
            .map(|(pattern, alias)| Selector::new(*pattern, *alias))
            .collect(),
    }
}

fn severity(name: &str, duration: &str, warmup: &str, cooldown: &str) -> SeverityConfig {
    SeverityConfig {
        name: name.to_string(),
        timing: Timing {
            duration: duration.to_string(),
            warmup: warmup.to_string(),
            cooldown: cooldown.to_string(),
        },
    }
}

fn net(key: &'static str, value: i64) -> Vec<(&'static str, ParamValue)> {
    vec![
        (key, value.into()),
        ("target_proto", "tcp,udp".into()),
        ("device", "eth0".into()),
    ]
}

fn reorder(pct: i64) -> Vec<(&'static str, ParamValue)> {
    // tc reorder needs a base latency to have anything to reorder.
    vec![
        ("reorder", pct.into()),
        ("latency", 10_i64.into()),
        ("target_proto", "tcp,udp".into()),
        ("device", "eth0".into()),
    ]
}

fn drop_prob(p: f64) -> Vec<(&'static str, ParamValue)> {
    vec![
        ("probability", p.into()),
        ("target_proto", "tcp".into()),
        ("rule_type", "drop".into()),
    ]
}

const HEIMDALL_V1: &str = "l2-cl-1-heimdall-v2-bor-validator";
const BOR_V1: &str = "l2-el-1-bor-heimdall-v2-validator";
const HEIMDALL_ALL: &str = "l2-cl-.*-heimdall-v2-bor-validator";
const BOR_ALL: &str = "l2-el-.*-bor-heimdall-v2-validator";

/// Fault, tier, severity, and criteria tables for a Polygon PoS devnet.
///
/// Tier selectors with explicit indices pin validator 1; wildcard selectors
/// match every validator so the same scenario works for any fleet size.
#[must_use]
pub fn polygon_pos() -> MatrixConfig {
    let faults = vec![
        fault(
            "packet_loss",
            "network",
            "network",
            "Packet loss - simulates congested / lossy network links",
            [
                ("10pct", "10% packet loss", net("packet_loss", 10)),
                ("40pct", "40% packet loss", net("packet_loss", 40)),
                ("80pct", "80% packet loss", net("packet_loss", 80)),
            ],
        ),
        fault(
            "latency",
            "network",
            "network",
            "Added network latency - simulates slow / geographically distant peers",
            [
                ("100ms", "100 ms added latency", net("latency", 100)),
                ("500ms", "500 ms added latency", net("latency", 500)),
                ("2s", "2 s added latency", net("latency", 2000)),
            ],
        ),
        fault(
            "bandwidth_throttle",
            "network",
            "network",
            "Bandwidth throttle - simulates underpowered or constrained uplinks",
            [
                ("10mbps", "10 Mbps cap", net("bandwidth", 10_000)),
                ("1mbps", "1 Mbps cap", net("bandwidth", 1_000)),
                ("100kbps", "100 kbps cap", net("bandwidth", 100)),
            ],
        ),
        fault(
            "packet_reorder",
            "network",
            "network",
            "Packet reordering - simulates out-of-order delivery disrupting protocol sequencing",
            [
                ("25pct", "25% reorder", reorder(25)),
                ("50pct", "50% reorder", reorder(50)),
                ("75pct", "75% reorder", reorder(75)),
            ],
        ),
        fault(
            "connection_drop",
            "connection_drop",
            "network",
            "Connection drop (iptables) - simulates intermittent TCP session resets",
            [
                ("10pct", "10% TCP drop prob.", drop_prob(0.1)),
                ("40pct", "40% TCP drop prob.", drop_prob(0.4)),
                ("80pct", "80% TCP drop prob.", drop_prob(0.8)),
            ],
        ),
        fault(
            "dns_latency",
            "dns",
            "network",
            "DNS latency / failure - simulates slow or flaky service discovery",
            [
                (
                    "250ms",
                    "250 ms DNS delay",
                    vec![("delay_ms", 250_i64.into()), ("failure_rate", 0.0_f64.into())],
                ),
                (
                    "1s",
                    "1 s DNS delay",
                    vec![("delay_ms", 1000_i64.into()), ("failure_rate", 0.1_f64.into())],
                ),
                (
                    "5s",
                    "5 s DNS delay / 30% fail",
                    vec![("delay_ms", 5000_i64.into()), ("failure_rate", 0.3_f64.into())],
                ),
            ],
        ),
        fault(
            "container_restart",
            "container_restart",
            "applications",
            "Container restart - simulates process crash and recovery",
            [
                (
                    "graceful",
                    "graceful (30 s grace)",
                    vec![("grace_period", 30_i64.into())],
                ),
                ("quick", "fast (5 s grace)", vec![("grace_period", 5_i64.into())]),
                (
                    "immediate",
                    "immediate (0 s grace)",
                    vec![("grace_period", 0_i64.into())],
                ),
            ],
        ),
        fault(
            "container_pause",
            "container_pause",
            "applications",
            // `duration` is the pause window, not the scenario duration.
            "Container pause (SIGSTOP) - simulates frozen process / GC pause / OOM stall",
            [
                (
                    "30s",
                    "30 s pause",
                    vec![("duration", "30s".into()), ("unpause", true.into())],
                ),
                (
                    "60s",
                    "60 s pause",
                    vec![("duration", "60s".into()), ("unpause", true.into())],
                ),
                (
                    "120s",
                    "120 s pause",
                    vec![("duration", "120s".into()), ("unpause", true.into())],
                ),
            ],
        ),
        fault(
            "cpu_stress",
            "cpu_stress",
            "cpu-memory",
            "CPU stress - simulates CPU-bound workload competing with validator logic",
            [
                ("50pct", "50% CPU load", vec![("cpu_percent", 50_i64.into())]),
                ("75pct", "75% CPU load", vec![("cpu_percent", 75_i64.into())]),
                ("95pct", "95% CPU load", vec![("cpu_percent", 95_i64.into())]),
            ],
        ),
        fault(
            "memory_pressure",
            "memory_stress",
            "cpu-memory",
            "Memory pressure - simulates memory-constrained environment / memory leak",
            [
                ("256mb", "256 MB pressure", vec![("memory_mb", 256_i64.into())]),
                ("512mb", "512 MB pressure", vec![("memory_mb", 512_i64.into())]),
                ("1gb", "1 GB pressure", vec![("memory_mb", 1024_i64.into())]),
            ],
        ),
        fault(
            "disk_io",
            "disk_io",
            "filesystem",
            "Disk I/O delay - simulates slow storage (HDD / NFS / overloaded SSD)",
            [
                (
                    "100ms",
                    "100 ms I/O delay",
                    vec![("io_latency_ms", 100_i64.into()), ("operation", "all".into())],
                ),
                (
                    "500ms",
                    "500 ms I/O delay",
                    vec![("io_latency_ms", 500_i64.into()), ("operation", "all".into())],
                ),
                (
                    "2s",
                    "2 s I/O delay",
                    vec![("io_latency_ms", 2000_i64.into()), ("operation", "all".into())],
                ),
            ],
        ),
    ];

    let tiers = vec![
        tier(
            "validator1_heimdall",
            "validator 1 - Heimdall consensus layer only",
            &[(HEIMDALL_V1, "target_heimdall")],
        ),
        tier(
            "validator1_bor",
            "validator 1 - Bor execution layer only",
            &[(BOR_V1, "target_bor")],
        ),
        tier(
            "validator1_both",
            "validator 1 - Heimdall + Bor (both layers of one validator)",
            &[(HEIMDALL_V1, "target_heimdall"), (BOR_V1, "target_bor")],
        ),
        tier(
            "all_heimdall",
            "all validators - Heimdall consensus layer (wildcard)",
            &[(HEIMDALL_ALL, "target_heimdall")],
        ),
        tier(
            "all_bor",
            "all validators - Bor execution layer (wildcard)",
            &[(BOR_ALL, "target_bor")],
        ),
        tier(
            "all_both",
            "all validators - Heimdall + Bor both layers (wildcard)",
            &[(HEIMDALL_ALL, "target_heimdall"), (BOR_ALL, "target_bor")],
        ),
        tier(
            "rabbitmq",
            "RabbitMQ message broker (Heimdall event bus)",
            &[("l2-cl-.*-rabbitmq", "target_rabbitmq")],
        ),
        tier(
            "rpc_nodes",
            "Bor RPC-only nodes (non-validator full nodes)",
            &[("l2-el-.*-bor-heimdall-v2-rpc", "target_rpc")],
        ),
    ];

    // More disruptive severities get longer observation windows.
    let severities = vec![
        severity("mild", "3m", "30s", "30s"),
        severity("moderate", "5m", "60s", "60s"),
        severity("severe", "8m", "2m", "2m"),
    ];

    MatrixConfig {
        identity: Identity::default(),
        faults,
        tiers,
        severities,
        criteria: invariant_criteria(),
        metrics: [
            "chain_head_block",
            "cometbft_consensus_height",
            "cometbft_consensus_validators",
            "up",
        ]
        .iter()
        .map(|m| (*m).to_string())
        .collect(),
    }
}

/// Ratio/existence criteria that hold for any number of validators.
fn invariant_criteria() -> Vec<CriterionTemplate> {
    let criterion = |name: &str, description: &str, query: String, threshold: &str| {
        CriterionTemplate {
            name: name.to_string(),
            description: description.to_string(),
            kind: "prometheus".to_string(),
            query,
            threshold: threshold.to_string(),
            critical: true,
        }
    };
    vec![
        criterion(
            "block_production_continues",
            "Network continues producing Bor blocks during the fault",
            format!("increase(chain_head_block{{job=~\"{BOR_ALL}\"}}[1m])"),
            "> 0",
        ),
        criterion(
            "consensus_height_advances",
            "Heimdall consensus height continues to increase",
            format!("increase(cometbft_consensus_height{{job=~\"{HEIMDALL_ALL}\"}}[1m])"),
            "> 0",
        ),
        criterion(
            "bft_quorum_maintained",
            "At least 2/3 of validators remain online (topology-safe BFT quorum ratio)",
            format!(
                "count(up{{job=~\"{HEIMDALL_ALL}\"}} == 1) / scalar(count(up{{job=~\"{HEIMDALL_ALL}\"}}))"
            ),
            ">= 0.67",
        ),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_fault_defines_all_three_levels() {
        let config = polygon_pos();
        assert_eq!(config.faults.len(), 11);
        for fault in &config.faults {
            let keys: Vec<&str> = fault.levels.keys().map(String::as_str).collect();
            assert_eq!(keys, vec!["mild", "moderate", "severe"], "{}", fault.name);
        }
    }

    #[test]
    fn criteria_are_ratio_or_existence_checks() {
        let criteria = invariant_criteria();
        assert_eq!(criteria.len(), 3);
        assert!(criteria.iter().all(|c| c.critical));
        assert_eq!(criteria[2].threshold, ">= 0.67");
        assert!(criteria[2].query.contains(" / scalar("));
    }

    #[test]
    fn identity_defaults_fill_missing_json_fields() {
        let id: Identity = serde_json::from_str(r#"{"author":"ci"}"#).unwrap();
        assert_eq!(id.author, "ci");
        assert_eq!(id.name_prefix, "gen");
        assert_eq!(id.enclave_placeholder, "${ENCLAVE_NAME}");
    }
}
