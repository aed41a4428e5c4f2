//! CI gate
//!
//! Turns diagnostics and findings into an exit code according to the
//! resolved [`GatePolicy`]. Findings never fail a run on their own.

use super::exit::GeoExit;
use crate::config::GatePolicy;
use crate::graph::DiagnosticReport;
use crate::models::{Finding, FindingCode};
use crate::reporters::GateStatus;

/// Evaluate every enabled gate. The lowest failing code wins.
pub fn evaluate(
    diag: &DiagnosticReport,
    findings: &[Finding],
    policy: &GatePolicy,
) -> (GeoExit, GateStatus) {
    let mut failed: Vec<(GeoExit, String)> = Vec::new();
    let has = |code: FindingCode| findings.iter().any(|f| f.code == code);

    if policy.fail_on_asymmetry && !diag.asym_pairs.is_empty() {
        failed.push((
            GeoExit::Reciprocity,
            format!("reciprocity: {} asymmetric pairs", diag.asym_pairs.len()),
        ));
    }

    // strict mode without an explicit threshold tolerates no islands
    let orphan_limit = policy.max_orphans.or(policy.strict.then_some(0));
    if let Some(limit) = orphan_limit {
        if diag.islands.len() > limit {
            failed.push((
                GeoExit::Orphans,
                format!("orphans: {} islands (limit {})", diag.islands.len(), limit),
            ));
        }
    }

    if policy.promote_schema_findings {
        if has(FindingCode::DuplicateClusterAssignment) {
            failed.push((
                GeoExit::DuplicateCluster,
                "clusters: duplicate cluster assignment".to_string(),
            ));
        }
        if has(FindingCode::MissingClusterCoverage) {
            failed.push((
                GeoExit::MissingCoverage,
                "clusters: suburbs without a cluster".to_string(),
            ));
        }
        if has(FindingCode::UnknownClusterMember) {
            failed.push((
                GeoExit::MissingCoverage,
                "clusters: members that are not known suburbs".to_string(),
            ));
        }
    }

    let exit = failed
        .iter()
        .map(|(code, _)| *code)
        .min()
        .unwrap_or(GeoExit::Success);

    let status = GateStatus {
        passed: failed.is_empty(),
        exit_code: exit.code(),
        failures: failed.into_iter().map(|(_, reason)| reason).collect(),
    };
    (exit, status)
}
