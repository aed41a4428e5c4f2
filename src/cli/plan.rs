//! Plan command - score, plan, rebalance, write links

use super::exit::GeoExit;
use super::{Cli, Workspace};
use crate::fairness::{rebalance, AuditOutcome};
use crate::planner::plan_links;
use crate::reporters::{
    prepare_report, LinkOptimizationReport, LinksArtifact, Meta, PlanParams, ReportKind,
};
use crate::scoring::CandidateScorer;
use anyhow::{Context, Result};
use console::style;
use std::path::Path;
use tracing::warn;

pub fn run(cli: &Cli, links_path: &Path, out: &Path, no_audit: bool) -> Result<GeoExit> {
    let mut ws = Workspace::load(cli)?;
    let policy = ws.config.neighbors.clone();

    let candidates = {
        let scorer = CandidateScorer::new(
            &ws.graph.adjacency,
            &ws.clusters,
            &ws.coords,
            &ws.config.weights,
        );
        ws.phases
            .run("score", || scorer.score_all(policy.enforce_reciprocity))
    };

    let plan = ws.phases.run("plan", || plan_links(&candidates, &policy));
    for finding in plan.findings() {
        warn!("{}", finding.message);
    }

    let audit = if no_audit {
        AuditOutcome::unchanged(&plan.picks, plan.cap_used)
    } else {
        ws.phases.run("audit", || {
            rebalance(&plan.picks, &candidates, plan.cap_used, policy.min)
        })
    };

    let links = LinksArtifact::from_plan(&audit.plan, &ws.config.services);

    let params = PlanParams {
        max: policy.max,
        min: policy.min,
        cap_policy: policy.cap.to_string(),
        enforce_reciprocity: policy.enforce_reciprocity,
        services: ws.config.services.clone(),
    };
    let meta = Meta::now(ws.inputs.hashes.clone(), ws.phases.timings());
    let report = LinkOptimizationReport::new(&plan, &audit, params, plan.findings(), meta);

    // both documents must pass their schemas before either is written
    let links_doc = prepare_report(ReportKind::Links, &links)?;
    let report_doc = prepare_report(ReportKind::LinkOptimization, &report)?;
    links_doc
        .write(links_path)
        .with_context(|| format!("writing links to {}", links_path.display()))?;
    report_doc
        .write(out)
        .with_context(|| format!("writing link optimization report to {}", out.display()))?;

    println!("{}", style("geolink plan").bold());
    println!(
        "  pages: {}  links: {}  cap: {}",
        links.links.len(),
        audit.after.total_links,
        audit
            .cap_used
            .map_or_else(|| "none".to_string(), |c| c.to_string())
    );
    println!(
        "  gini: {:.4} -> {:.4}  substitutions: {}  removals: {}  relaxations: {}",
        audit.before.gini,
        audit.after.gini,
        audit.substitutions.len(),
        audit.removals.len(),
        plan.relaxations.len()
    );
    println!("  links: {}", links_path.display());
    println!("  report: {}", out.display());

    Ok(GeoExit::Success)
}
