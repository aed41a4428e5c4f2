//! Doctor command - graph health report and CI gate

use super::exit::GeoExit;
use super::gate;
use super::{Cli, Workspace};
use crate::graph::{diagnose, DiagnosticReport};
use crate::models::{Finding, FindingCode, Severity};
use crate::reporters::{write_report, DoctorReport, Meta, ReportKind};
use anyhow::{Context, Result};
use console::style;
use std::path::Path;

pub fn run(cli: &Cli, out: &Path) -> Result<GeoExit> {
    let mut ws = Workspace::load(cli)?;

    let diag = {
        let adj = &ws.graph.adjacency;
        let cluster_of = &ws.clusters.cluster_of;
        let self_loops = ws.graph.stats.self_loops;
        ws.phases
            .run("diagnose", || diagnose(adj, cluster_of, self_loops))
    };
    ws.phases.extend("diagnose", &diag.timings_ms);

    let mut findings = ws.clusters.findings.clone();
    findings.extend(graph_findings(&diag));

    let (exit, status) = gate::evaluate(&diag, &findings, &ws.config.gate);
    let meta = Meta::now(ws.inputs.hashes.clone(), ws.phases.timings());
    let failures = status.failures.clone();
    let report = DoctorReport::new(&diag, findings, status, meta);

    write_report(ReportKind::Doctor, &report, out)
        .with_context(|| format!("writing doctor report to {}", out.display()))?;

    print_summary(&diag, &report.findings, &failures);
    println!("  report: {}", out.display());

    Ok(exit)
}

/// Asymmetry and island findings from the diagnostic snapshot
fn graph_findings(diag: &DiagnosticReport) -> Vec<Finding> {
    let mut findings = Vec::new();
    if !diag.asym_pairs.is_empty() {
        findings.push(
            Finding::new(
                FindingCode::AsymmetricEdge,
                Severity::Warning,
                format!("{} edges have no reverse edge", diag.asym_pairs.len()),
            )
            .with_subjects(diag.asym_pairs.iter().map(|(a, b)| format!("{a} -> {b}"))),
        );
    }
    if !diag.islands.is_empty() {
        findings.push(
            Finding::new(
                FindingCode::Island,
                Severity::Warning,
                format!("{} suburbs have no outbound links", diag.islands.len()),
            )
            .with_subjects(diag.islands.iter().cloned()),
        );
    }
    findings
}

fn print_summary(diag: &DiagnosticReport, findings: &[Finding], failures: &[String]) {
    println!("{}", style("geolink doctor").bold());
    println!(
        "  nodes: {}  edges: {}  components: {}  largest: {:.1}%",
        diag.nodes,
        diag.edges,
        diag.components.len(),
        diag.largest_component_ratio * 100.0
    );
    println!(
        "  asymmetric pairs: {}  islands: {}  self-loops: {}  cross-cluster: {:.1}%",
        diag.asym_pairs.len(),
        diag.islands.len(),
        diag.self_loops,
        diag.cross_cluster_ratio * 100.0
    );
    for finding in findings {
        let label = match finding.severity {
            Severity::Error => style("error").red(),
            Severity::Warning => style("warn").yellow(),
            Severity::Info => style("info").dim(),
        };
        println!("  {} {}", label, finding.message);
    }
    if failures.is_empty() {
        println!("  {}", style("gate passed").green());
    } else {
        for failure in failures {
            println!("  {} {}", style("gate failed:").red().bold(), failure);
        }
    }
}
