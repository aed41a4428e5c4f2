//! CLI contract tests
//!
//! Drives the built binary against temporary data directories and checks
//! exit codes, report contents and byte-level determinism.

use serde_json::Value;
use std::path::Path;
use std::process::Command;

fn geolink_bin() -> String {
    env!("CARGO_BIN_EXE_geolink").to_string()
}

/// Write a data directory with the given adjacency and optional clusters
fn setup_data(adjacency: &str, clusters: Option<&str>) -> tempfile::TempDir {
    let dir = tempfile::tempdir().expect("tempdir");
    std::fs::write(dir.path().join("areas.adj.json"), adjacency).expect("write adjacency");
    if let Some(clusters) = clusters {
        std::fs::write(dir.path().join("areas.clusters.json"), clusters)
            .expect("write clusters");
    }
    dir
}

fn run(dir: &Path, args: &[&str]) -> (i32, String, String) {
    let output = Command::new(geolink_bin())
        .current_dir(dir)
        .env_remove("RUST_LOG")
        .env_remove("GEOLINK_DATA")
        .arg("--data")
        .arg(dir)
        .args(args)
        .output()
        .expect("Failed to run geolink");
    (
        output.status.code().unwrap_or(-1),
        String::from_utf8_lossy(&output.stdout).to_string(),
        String::from_utf8_lossy(&output.stderr).to_string(),
    )
}

fn read_json(path: &Path) -> Value {
    let content = std::fs::read_to_string(path)
        .unwrap_or_else(|e| panic!("reading {}: {e}", path.display()));
    serde_json::from_str(&content).expect("valid JSON")
}

const SCENARIO: &str = r#"{"a": ["b", "c"], "b": ["a"], "c": []}"#;
const SYMMETRIC: &str = r#"{"a": ["b"], "b": ["a", "c"], "c": ["b"]}"#;

// ============================================================================
// doctor
// ============================================================================

#[test]
fn test_doctor_reports_scenario_graph() {
    let dir = setup_data(SCENARIO, Some(r#"{"east": ["a", "b", "c"]}"#));
    let (code, stdout, stderr) = run(dir.path(), &["doctor"]);
    assert_eq!(code, 0, "stdout: {stdout}\nstderr: {stderr}");

    let report = read_json(&dir.path().join("reports/doctor.json"));
    assert_eq!(report["schemaVersion"], 1);
    assert_eq!(report["nodes"], 3);
    assert_eq!(report["components"], 1);
    assert_eq!(report["largest_component_ratio"], 1.0);
    assert_eq!(report["asym_pairs"], serde_json::json!([["a", "c"]]));
    assert_eq!(report["self_loops"], 0);
    assert_eq!(report["islands"], serde_json::json!(["c"]));
    assert_eq!(report["gate"]["passed"], true);
    assert_eq!(report["meta"]["inputHashes"]["adjacency"].as_str().map(str::len), Some(64));
}

#[test]
fn test_doctor_records_diagnostic_timings() {
    let dir = setup_data(SCENARIO, None);
    let (code, _, _) = run(dir.path(), &["doctor"]);
    assert_eq!(code, 0);
    let report = read_json(&dir.path().join("reports/doctor.json"));
    let timings = report["meta"]["timings"].as_object().expect("timings");
    for key in ["load", "diagnose", "diagnose.components", "diagnose.degrees", "diagnose.hash"] {
        assert!(timings.contains_key(key), "missing timing {key}");
    }
}

#[test]
fn test_doctor_is_deterministic() {
    let dir = setup_data(SCENARIO, Some(r#"{"east": ["a", "b"], "west": ["a"]}"#));
    for n in ["1", "2"] {
        let out = format!("doctor-{n}.json");
        let (code, _, _) = run(dir.path(), &["doctor", "--out", &out]);
        assert_eq!(code, 0);
    }
    let (_, hash1, _) = run(dir.path(), &["hash", "doctor-1.json"]);
    let (_, hash2, _) = run(dir.path(), &["hash", "doctor-2.json"]);
    assert_eq!(hash1.trim().len(), 64);
    assert_eq!(hash1, hash2);
}

#[test]
fn test_doctor_counts_raw_self_loops() {
    let dir = setup_data(r#"{"A": ["a", "B"], "b": ["a"]}"#, None);
    let (code, _, _) = run(dir.path(), &["doctor", "--out", "doctor.json"]);
    assert_eq!(code, 0);
    let report = read_json(&dir.path().join("doctor.json"));
    assert_eq!(report["self_loops"], 1);
    assert_eq!(report["nodes"], 2);
}

#[test]
fn test_doctor_reciprocity_gate_exit_code() {
    let dir = setup_data(SCENARIO, None);
    let (code, _, _) = run(dir.path(), &["doctor", "--fail-on-asymmetry"]);
    assert_eq!(code, 4);

    // The report is persisted even when the gate fails
    let report = read_json(&dir.path().join("reports/doctor.json"));
    assert_eq!(report["gate"]["passed"], false);
    assert_eq!(report["gate"]["exitCode"], 4);
}

#[test]
fn test_doctor_orphan_threshold_exit_code() {
    let dir = setup_data(SCENARIO, None);
    let (code, _, _) = run(dir.path(), &["doctor", "--max-orphans", "1"]);
    assert_eq!(code, 0);
    let (code, _, _) = run(dir.path(), &["doctor", "--max-orphans", "0"]);
    assert_eq!(code, 5);
}

#[test]
fn test_doctor_lowest_gate_code_wins() {
    let dir = setup_data(SCENARIO, None);
    let (code, _, _) = run(
        dir.path(),
        &["doctor", "--max-orphans", "0", "--fail-on-asymmetry"],
    );
    assert_eq!(code, 4);
}

#[test]
fn test_doctor_strict_duplicate_cluster_exit_code() {
    let dir = setup_data(SYMMETRIC, Some(r#"{"east": ["a", "b", "c"], "west": ["c"]}"#));
    let (code, _, _) = run(dir.path(), &["doctor", "--strict"]);
    assert_eq!(code, 6);

    let report = read_json(&dir.path().join("reports/doctor.json"));
    let codes: Vec<&str> = report["findings"]
        .as_array()
        .expect("findings")
        .iter()
        .filter_map(|f| f["code"].as_str())
        .collect();
    assert!(codes.contains(&"duplicate-cluster-assignment"));
}

#[test]
fn test_doctor_strict_missing_coverage_exit_code() {
    let dir = setup_data(
        SYMMETRIC,
        Some(r#"{"clusters": [{"slug": "east", "suburbs": ["a", "b"]}]}"#),
    );
    let (code, _, _) = run(dir.path(), &["doctor", "--strict"]);
    assert_eq!(code, 7);

    // Without strict mode the finding is reported but does not fail
    let (code, _, _) = run(dir.path(), &["doctor"]);
    assert_eq!(code, 0);
}

#[test]
fn test_missing_adjacency_exit_code() {
    let dir = tempfile::tempdir().expect("tempdir");
    let (code, _, stderr) = run(dir.path(), &["doctor"]);
    assert_eq!(code, 2, "stderr: {stderr}");
    assert!(stderr.contains("adjacency"));
    assert!(!dir.path().join("reports/doctor.json").exists());
}

#[test]
fn test_unparsable_adjacency_is_generic_error() {
    let dir = setup_data("not json", None);
    let (code, _, _) = run(dir.path(), &["doctor"]);
    assert_eq!(code, 1);
}

// ============================================================================
// metrics
// ============================================================================

#[test]
fn test_metrics_report() {
    let dir = setup_data(SCENARIO, Some(r#"{"east": ["a", "b"], "west": ["c"]}"#));
    let (code, _, _) = run(dir.path(), &["metrics"]);
    assert_eq!(code, 0);

    let report = read_json(&dir.path().join("reports/metrics.json"));
    assert_eq!(report["clusters"], 2);
    assert_eq!(report["suburbs"], 3);
    assert_eq!(report["edges"]["directed"], 3);
    assert_eq!(report["edges"]["undirected"], 2);
    // a -> c is the only cross-cluster edge
    let ratio = report["edges"]["cross_cluster_ratio"].as_f64().expect("ratio");
    assert!((ratio - 1.0 / 3.0).abs() < 1e-9);
}

// ============================================================================
// plan
// ============================================================================

/// Five suburbs that all link to `x`, plus a ring between them
const CROWDED: &str = r#"{
    "n1": ["x", "n2"], "n2": ["x", "n3"], "n3": ["x", "n4"],
    "n4": ["x", "n5"], "n5": ["x", "n1"], "x": ["n1"]
}"#;

fn inbound(links: &Value, target: &str) -> usize {
    links["links"]
        .as_array()
        .expect("links")
        .iter()
        .filter(|l| {
            l["neighbors"]
                .as_array()
                .is_some_and(|n| n.iter().any(|t| t == target))
        })
        .count()
}

#[test]
fn test_plan_respects_cap_and_max() {
    let dir = setup_data(CROWDED, None);
    let (code, stdout, stderr) = run(dir.path(), &["plan", "--max", "2", "--min", "1", "--cap", "2"]);
    assert_eq!(code, 0, "stdout: {stdout}\nstderr: {stderr}");

    let links = read_json(&dir.path().join("out/links.json"));
    assert!(inbound(&links, "x") <= 2);
    for entry in links["links"].as_array().expect("links") {
        assert!(entry["neighbors"].as_array().expect("neighbors").len() <= 2);
    }

    let report = read_json(&dir.path().join("reports/link-optimization.json"));
    assert_eq!(report["policyCapUsed"], 2);
    assert!(report["metrics"]["after"]["gini"].as_f64().expect("gini") <= 1.0);
}

#[test]
fn test_plan_unbounded_cap_is_null() {
    let dir = setup_data(CROWDED, None);
    let (code, _, _) = run(dir.path(), &["plan", "--cap", "none"]);
    assert_eq!(code, 0);
    let report = read_json(&dir.path().join("reports/link-optimization.json"));
    assert!(report["policyCapUsed"].is_null());
    assert_eq!(report["substitutionsCount"], 0);
}

#[test]
fn test_plan_is_deterministic() {
    let dir = setup_data(CROWDED, Some(r#"{"ring": ["n1", "n2", "n3", "n4", "n5", "x"]}"#));
    let args = |n: &str| {
        vec![
            "plan".to_string(),
            "--cap".to_string(),
            "dynamic".to_string(),
            "--links".to_string(),
            format!("links-{n}.json"),
            "--out".to_string(),
            format!("report-{n}.json"),
        ]
    };
    for n in ["1", "2"] {
        let a = args(n);
        let refs: Vec<&str> = a.iter().map(String::as_str).collect();
        let (code, _, _) = run(dir.path(), &refs);
        assert_eq!(code, 0);
    }

    let first = std::fs::read(dir.path().join("links-1.json")).expect("read");
    let second = std::fs::read(dir.path().join("links-2.json")).expect("read");
    assert_eq!(first, second, "links artifact must be byte-identical");

    let (_, hash1, _) = run(dir.path(), &["hash", "report-1.json"]);
    let (_, hash2, _) = run(dir.path(), &["hash", "report-2.json"]);
    assert_eq!(hash1.trim().len(), 64);
    assert_eq!(hash1, hash2, "reports differ beyond generatedAt/timings");
}

#[test]
fn test_plan_expands_services() {
    let dir = setup_data(SYMMETRIC, None);
    std::fs::write(
        dir.path().join("geolink.toml"),
        "services = [\"plumbing\", \"electrical\"]\n",
    )
    .expect("write config");
    let (code, _, _) = run(dir.path(), &["plan"]);
    assert_eq!(code, 0);

    let links = read_json(&dir.path().join("out/links.json"));
    let keys: Vec<&str> = links["links"]
        .as_array()
        .expect("links")
        .iter()
        .filter_map(|l| l["key"].as_str())
        .collect();
    assert_eq!(
        keys,
        vec![
            "electrical/a",
            "electrical/b",
            "electrical/c",
            "plumbing/a",
            "plumbing/b",
            "plumbing/c"
        ]
    );
}

#[test]
fn test_plan_no_audit_reports_plan_unchanged() {
    let dir = setup_data(CROWDED, None);
    let (code, _, _) = run(
        dir.path(),
        &["plan", "--max", "2", "--min", "1", "--cap", "2", "--no-audit"],
    );
    assert_eq!(code, 0);

    let report = read_json(&dir.path().join("reports/link-optimization.json"));
    assert_eq!(report["policyCapUsed"], 2);
    assert_eq!(report["substitutionsCount"], 0);
    assert_eq!(report["removalsCount"], 0);
    assert_eq!(report["metrics"]["before"], report["metrics"]["after"]);
    assert!(report["meta"]["timings"].get("audit").is_none());

    let links = read_json(&dir.path().join("out/links.json"));
    assert!(inbound(&links, "x") <= 2);
}

#[test]
fn test_plan_strict_keeps_explicit_no_cap() {
    let dir = setup_data(CROWDED, None);
    let (code, _, _) = run(dir.path(), &["plan", "--strict", "--cap", "none"]);
    assert_eq!(code, 0);
    let report = read_json(&dir.path().join("reports/link-optimization.json"));
    assert!(report["policyCapUsed"].is_null());
    assert_eq!(report["params"]["capPolicy"], "none");

    let (code, _, _) = run(dir.path(), &["plan", "--strict"]);
    assert_eq!(code, 0);
    let report = read_json(&dir.path().join("reports/link-optimization.json"));
    assert_eq!(report["params"]["capPolicy"], "dynamic");
    assert!(report["policyCapUsed"].is_u64());
}

// ============================================================================
// fix
// ============================================================================

#[test]
fn test_fix_closes_reciprocity() {
    let dir = setup_data(r#"{"a": ["b", "c"], "b": [], "c": ["a"], "d": []}"#, None);
    let (code, _, _) = run(dir.path(), &["fix"]);
    assert_eq!(code, 0);

    let adj = read_json(&dir.path().join("out/areas.adj.json"));
    let map = adj.as_object().expect("object");
    for (node, targets) in map {
        for target in targets.as_array().expect("list") {
            let back = map[target.as_str().expect("slug")].as_array().expect("list");
            assert!(
                back.iter().any(|t| t == node.as_str()),
                "{target} does not link back to {node}"
            );
        }
    }

    let report = read_json(&dir.path().join("reports/auto-fix.json"));
    assert_eq!(report["summary"]["reciprocityAdded"], 1);
    assert_eq!(report["summary"]["alreadyLinked"], 1);
    assert_eq!(report["summary"]["islandsLinked"], 1);
    assert_eq!(report["summary"]["unfixable"], 0);
}

#[test]
fn test_fix_output_feeds_next_run() {
    let dir = setup_data(SCENARIO, None);
    let (code, _, _) = run(dir.path(), &["fix", "--in-place"]);
    assert_eq!(code, 0);

    let (code, _, _) = run(dir.path(), &["doctor", "--strict"]);
    assert_eq!(code, 7, "only the missing cluster coverage should remain");
    let report = read_json(&dir.path().join("reports/doctor.json"));
    assert_eq!(report["asym_pairs"], serde_json::json!([]));
    assert_eq!(report["islands"], serde_json::json!([]));
}

#[test]
fn test_fix_is_deterministic() {
    let dir = setup_data(r#"{"a": ["b", "c"], "b": [], "c": ["a"], "d": [], "e": []}"#, None);
    for n in ["1", "2"] {
        let adj = format!("adj-{n}.json");
        let out = format!("fix-{n}.json");
        let (code, _, _) = run(dir.path(), &["fix", "--write-adjacency", &adj, "--out", &out]);
        assert_eq!(code, 0);
    }

    let first = std::fs::read(dir.path().join("adj-1.json")).expect("read");
    let second = std::fs::read(dir.path().join("adj-2.json")).expect("read");
    assert_eq!(first, second, "repaired adjacency must be byte-identical");

    let (_, hash1, _) = run(dir.path(), &["hash", "fix-1.json"]);
    let (_, hash2, _) = run(dir.path(), &["hash", "fix-2.json"]);
    assert_eq!(hash1.trim().len(), 64);
    assert_eq!(hash1, hash2);
}

#[test]
fn test_fix_edgeless_graph_is_unfixable() {
    let dir = setup_data(r#"{"a": [], "b": []}"#, None);
    let (code, _, _) = run(dir.path(), &["fix"]);
    assert_eq!(code, 0);
    let report = read_json(&dir.path().join("reports/auto-fix.json"));
    assert_eq!(report["summary"]["unfixable"], 2);
}

// ============================================================================
// drift
// ============================================================================

#[test]
fn test_drift_detection_exit_codes() {
    let dir = setup_data(SYMMETRIC, None);
    let (code, _, _) = run(dir.path(), &["plan"]);
    assert_eq!(code, 0);

    let (_, hash, _) = run(dir.path(), &["hash", "out/links.json"]);
    let hash = hash.trim().to_string();
    let (code, _, _) = run(dir.path(), &["drift", "out/links.json", "--baseline", &hash]);
    assert_eq!(code, 0);

    std::fs::write(
        dir.path().join("areas.adj.json"),
        r#"{"a": ["b", "c"], "b": ["a", "c"], "c": ["a", "b"]}"#,
    )
    .expect("rewrite adjacency");
    let (code, _, _) = run(dir.path(), &["plan"]);
    assert_eq!(code, 0);
    let (code, _, stderr) = run(dir.path(), &["drift", "out/links.json", "--baseline", &hash]);
    assert_eq!(code, 8, "stderr: {stderr}");
}
