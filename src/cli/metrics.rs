//! Metrics command - graph size and degree summary

use super::exit::GeoExit;
use super::{Cli, Workspace};
use crate::reporters::{write_report, Meta, MetricsReport, ReportKind};
use anyhow::{Context, Result};
use console::style;
use std::path::Path;

pub fn run(cli: &Cli, out: &Path) -> Result<GeoExit> {
    let mut ws = Workspace::load(cli)?;

    let report = {
        let adj = &ws.graph.adjacency;
        let clusters = &ws.clusters;
        let hashes = ws.inputs.hashes.clone();
        let mut report = ws
            .phases
            .run("metrics", || MetricsReport::new(adj, clusters, Meta::default()));
        report.meta = Meta::now(hashes, ws.phases.timings());
        report
    };

    write_report(ReportKind::Metrics, &report, out)
        .with_context(|| format!("writing metrics report to {}", out.display()))?;

    println!("{}", style("geolink metrics").bold());
    println!(
        "  suburbs: {}  clusters: {}  edges: {} directed / {} undirected",
        report.suburbs, report.clusters, report.edges.directed, report.edges.undirected
    );
    println!(
        "  degree min/median/max: {}/{}/{}  mean: {:.2}",
        report.degree.min, report.degree.median, report.degree.max, report.degree.mean
    );
    println!("  report: {}", out.display());

    Ok(GeoExit::Success)
}
