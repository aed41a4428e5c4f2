//! Fix command - repair reciprocity and islands

use super::exit::GeoExit;
use super::{Cli, Workspace};
use crate::graph::{diagnose, stable_graph_hash};
use crate::repair::repair;
use crate::reporters::{prepare_report, write_artifact, AutoFixReport, Meta, ReportKind};
use anyhow::{Context, Result};
use console::style;
use std::path::Path;

pub fn run(cli: &Cli, write_adjacency: &Path, in_place: bool, out: &Path) -> Result<GeoExit> {
    let mut ws = Workspace::load(cli)?;

    let outcome = {
        let adj = &ws.graph.adjacency;
        let cluster_of = &ws.clusters.cluster_of;
        let coords = &ws.coords;
        let self_loops = ws.graph.stats.self_loops;
        let diag = ws
            .phases
            .run("diagnose", || diagnose(adj, cluster_of, self_loops));
        ws.phases.extend("diagnose", &diag.timings_ms);
        ws.phases
            .run("repair", || repair(adj, &diag, cluster_of, coords))
    };

    let target = if in_place {
        ws.config.inputs.adjacency.clone()
    } else {
        write_adjacency.to_path_buf()
    };
    let artifact = serde_json::to_value(&outcome.adjacency)
        .context("serializing repaired adjacency")?;

    let content_hash = stable_graph_hash(&outcome.adjacency);
    let meta = Meta::now(ws.inputs.hashes.clone(), ws.phases.timings());
    let report = AutoFixReport::new(&outcome, content_hash, meta);

    // validate the report before the adjacency (possibly the input) is replaced
    let report_doc = prepare_report(ReportKind::AutoFix, &report)?;
    write_artifact(&artifact, &target)
        .with_context(|| format!("writing repaired adjacency to {}", target.display()))?;
    report_doc
        .write(out)
        .with_context(|| format!("writing auto-fix report to {}", out.display()))?;

    let s = &outcome.summary;
    println!("{}", style("geolink fix").bold());
    println!(
        "  reciprocity added: {}  islands linked: {}  already linked: {}  unfixable: {}",
        s.reciprocity_added, s.islands_linked, s.already_linked, s.unfixable
    );
    if s.unfixable > 0 {
        println!(
            "  {} {} islands have no viable link target",
            style("warn").yellow(),
            s.unfixable
        );
    }
    println!("  adjacency: {}", target.display());
    println!("  report: {}", out.display());

    Ok(GeoExit::Success)
}
