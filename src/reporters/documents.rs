//! Report and artifact documents
//!
//! Field names follow the published report contracts, which mix
//! `snake_case` (graph reports) and `camelCase` (plan and repair reports).

use crate::fairness::{AuditOutcome, PlanMetrics, Removal, Substitution};
use crate::graph::{ClusterIndex, DegreeStats, DiagnosticReport};
use crate::graph::{cross_cluster_ratio, degree_stats, edge_count, undirected_edge_count};
use crate::models::{Adjacency, Finding};
use crate::planner::{LinkPlan, Relaxation, Shortfall};
use crate::repair::{RepairChange, RepairOutcome, RepairSummary};
use serde::Serialize;
use std::collections::BTreeMap;

pub const SCHEMA_VERSION: u32 = 1;

/// Run metadata shared by every report
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Meta {
    pub generated_at: String,
    /// dataset name -> SHA-256 of the raw file
    pub input_hashes: BTreeMap<String, String>,
    /// phase -> elapsed milliseconds
    pub timings: BTreeMap<String, u64>,
}

impl Meta {
    pub fn now(input_hashes: BTreeMap<String, String>, timings: BTreeMap<String, u64>) -> Self {
        Self {
            generated_at: chrono::Utc::now().to_rfc3339(),
            input_hashes,
            timings,
        }
    }
}

/// Outcome of the CI gate, embedded in the doctor report
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GateStatus {
    pub passed: bool,
    pub exit_code: u8,
    pub failures: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct DegreeSection {
    #[serde(flatten)]
    pub stats: DegreeStats,
    pub histogram: BTreeMap<usize, usize>,
}

#[derive(Debug, Clone, Serialize)]
pub struct DoctorReport {
    #[serde(rename = "schemaVersion")]
    pub schema_version: u32,
    pub nodes: usize,
    pub edges: usize,
    pub components: usize,
    pub component_sizes: Vec<usize>,
    pub largest_component_ratio: f64,
    pub degrees: DegreeSection,
    pub cross_cluster_ratio: f64,
    pub asym_pairs: Vec<(String, String)>,
    pub self_loops: usize,
    pub islands: Vec<String>,
    pub content_hash: String,
    pub findings: Vec<Finding>,
    pub gate: GateStatus,
    pub meta: Meta,
}

impl DoctorReport {
    pub fn new(
        diag: &DiagnosticReport,
        findings: Vec<Finding>,
        gate: GateStatus,
        meta: Meta,
    ) -> Self {
        Self {
            schema_version: SCHEMA_VERSION,
            nodes: diag.nodes,
            edges: diag.edges,
            components: diag.components.len(),
            component_sizes: diag.components.iter().map(Vec::len).collect(),
            largest_component_ratio: diag.largest_component_ratio,
            degrees: DegreeSection {
                stats: diag.degree_stats,
                histogram: diag.degree_histogram.clone(),
            },
            cross_cluster_ratio: diag.cross_cluster_ratio,
            asym_pairs: diag.asym_pairs.clone(),
            self_loops: diag.self_loops,
            islands: diag.islands.clone(),
            content_hash: diag.content_hash.clone(),
            findings,
            gate,
            meta,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct EdgeSection {
    pub directed: usize,
    pub undirected: usize,
    pub cross_cluster_ratio: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct MetricsReport {
    #[serde(rename = "schemaVersion")]
    pub schema_version: u32,
    pub clusters: usize,
    pub suburbs: usize,
    pub cluster_sizes: BTreeMap<String, usize>,
    pub edges: EdgeSection,
    pub degree: DegreeStats,
    pub meta: Meta,
}

impl MetricsReport {
    pub fn new(adj: &Adjacency, clusters: &ClusterIndex, meta: Meta) -> Self {
        Self {
            schema_version: SCHEMA_VERSION,
            clusters: clusters.members.len(),
            suburbs: adj.len(),
            cluster_sizes: clusters
                .members
                .iter()
                .map(|(c, m)| (c.clone(), m.len()))
                .collect(),
            edges: EdgeSection {
                directed: edge_count(adj),
                undirected: undirected_edge_count(adj),
                cross_cluster_ratio: cross_cluster_ratio(adj, &clusters.cluster_of),
            },
            degree: degree_stats(adj),
            meta,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct MetricsPair {
    pub before: PlanMetrics,
    pub after: PlanMetrics,
}

/// Planner parameters echoed into the report
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlanParams {
    pub max: usize,
    pub min: usize,
    pub cap_policy: String,
    pub enforce_reciprocity: bool,
    pub services: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LinkOptimizationReport {
    pub schema_version: u32,
    pub generated_at: String,
    pub policy_cap_used: Option<usize>,
    pub substitutions_count: usize,
    pub removals_count: usize,
    pub metrics: MetricsPair,
    pub substitutions: Vec<Substitution>,
    pub removals: Vec<Removal>,
    pub relaxations: Vec<Relaxation>,
    pub shortfalls: Vec<Shortfall>,
    pub findings: Vec<Finding>,
    pub params: PlanParams,
    pub meta: Meta,
}

impl LinkOptimizationReport {
    pub fn new(
        plan: &LinkPlan,
        audit: &AuditOutcome,
        params: PlanParams,
        findings: Vec<Finding>,
        meta: Meta,
    ) -> Self {
        Self {
            schema_version: SCHEMA_VERSION,
            generated_at: meta.generated_at.clone(),
            policy_cap_used: audit.cap_used,
            substitutions_count: audit.substitutions.len(),
            removals_count: audit.removals.len(),
            metrics: MetricsPair {
                before: audit.before.clone(),
                after: audit.after.clone(),
            },
            substitutions: audit.substitutions.clone(),
            removals: audit.removals.clone(),
            relaxations: plan.relaxations.clone(),
            shortfalls: plan.shortfalls.clone(),
            findings,
            params,
            meta,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AutoFixReport {
    pub schema_version: u32,
    pub generated_at: String,
    pub summary: RepairSummary,
    pub changes: Vec<RepairChange>,
    /// Content hash of the repaired adjacency
    pub content_hash: String,
    pub meta: Meta,
}

impl AutoFixReport {
    pub fn new(outcome: &RepairOutcome, content_hash: String, meta: Meta) -> Self {
        Self {
            schema_version: SCHEMA_VERSION,
            generated_at: meta.generated_at.clone(),
            summary: outcome.summary.clone(),
            changes: outcome.changes.clone(),
            content_hash,
            meta,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LinkEntry {
    /// `service/suburb`, or the bare suburb slug when no services are set
    pub key: String,
    pub service: Option<String>,
    pub suburb: String,
    pub neighbors: Vec<String>,
}

/// Selected neighbours per page, consumed by the page generator
#[derive(Debug, Clone, Serialize)]
pub struct LinksArtifact {
    #[serde(rename = "schemaVersion")]
    pub schema_version: u32,
    pub links: Vec<LinkEntry>,
}

impl LinksArtifact {
    /// Expand a suburb plan into one entry per `(service, suburb)` page.
    ///
    /// Every service gets the same neighbour list, so inbound counts per
    /// `(service, target)` page equal the suburb plan's counts.
    pub fn from_plan(picks: &BTreeMap<String, Vec<String>>, services: &[String]) -> Self {
        let links = if services.is_empty() {
            picks
                .iter()
                .map(|(suburb, neighbors)| LinkEntry {
                    key: suburb.clone(),
                    service: None,
                    suburb: suburb.clone(),
                    neighbors: neighbors.clone(),
                })
                .collect()
        } else {
            services
                .iter()
                .flat_map(|service| {
                    picks.iter().map(move |(suburb, neighbors)| LinkEntry {
                        key: format!("{service}/{suburb}"),
                        service: Some(service.clone()),
                        suburb: suburb.clone(),
                        neighbors: neighbors.clone(),
                    })
                })
                .collect()
        };
        Self {
            schema_version: SCHEMA_VERSION,
            links,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_links_without_services_use_bare_slugs() {
        let picks: BTreeMap<String, Vec<String>> =
            [("a".to_string(), vec!["b".to_string()]), ("b".to_string(), vec![])]
                .into_iter()
                .collect();
        let artifact = LinksArtifact::from_plan(&picks, &[]);
        assert_eq!(artifact.links.len(), 2);
        assert_eq!(artifact.links[0].key, "a");
        assert_eq!(artifact.links[0].service, None);
    }

    #[test]
    fn test_links_expand_per_service() {
        let picks: BTreeMap<String, Vec<String>> =
            [("a".to_string(), vec!["b".to_string()]), ("b".to_string(), vec!["a".to_string()])]
                .into_iter()
                .collect();
        let services = vec!["electrical".to_string(), "plumbing".to_string()];
        let artifact = LinksArtifact::from_plan(&picks, &services);
        let keys: Vec<&str> = artifact.links.iter().map(|l| l.key.as_str()).collect();
        assert_eq!(keys, vec!["electrical/a", "electrical/b", "plumbing/a", "plumbing/b"]);
        assert_eq!(artifact.links[3].neighbors, vec!["a"]);
    }

    #[test]
    fn test_degree_section_flattens_stats() {
        let section = DegreeSection {
            stats: DegreeStats {
                min: 0,
                median: 1,
                max: 2,
                mean: 1.0,
                p90: 2,
            },
            histogram: [(0, 1), (2, 1)].into_iter().collect(),
        };
        let value = serde_json::to_value(&section).expect("serialize");
        assert_eq!(value["median"], 1);
        assert_eq!(value["histogram"]["2"], 1);
    }
}
