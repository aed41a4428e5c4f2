//! Auto-repair of structural graph defects
//!
//! Closes one-way edges and links island nodes to their nearest neighbour.
//! The result is a new canonical adjacency that feeds the next run.

use crate::graph::{haversine_km, DiagnosticReport};
use crate::models::{Adjacency, Coordinates};
use serde::Serialize;
use std::collections::BTreeMap;
use tracing::{debug, info, warn};

/// One logged repair action
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum RepairChange {
    /// `from -> to` added to close the one-way edge `to -> from`
    ReciprocityAdded { from: String, to: String },
    LinkedIsland {
        island: String,
        target: String,
        #[serde(rename = "distanceKm")]
        distance_km: Option<f64>,
    },
    /// The island already gained an edge earlier in the pass
    IslandAlreadyLinked { island: String },
    IslandUnfixable { island: String },
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RepairSummary {
    pub reciprocity_added: usize,
    pub islands_linked: usize,
    pub already_linked: usize,
    pub unfixable: usize,
}

#[derive(Debug, Clone)]
pub struct RepairOutcome {
    /// Repaired adjacency, every list deduped and sorted
    pub adjacency: Adjacency,
    pub summary: RepairSummary,
    pub changes: Vec<RepairChange>,
}

/// Repair the defects found by diagnostics.
///
/// Reciprocity is fixed first, so an island that received a back-link is
/// reported as already linked.
pub fn repair(
    adj: &Adjacency,
    diagnostics: &DiagnosticReport,
    cluster_of: &BTreeMap<String, String>,
    coords: &BTreeMap<String, Coordinates>,
) -> RepairOutcome {
    let mut repaired = adj.clone();
    let mut summary = RepairSummary::default();
    let mut changes = Vec::new();

    for (a, b) in &diagnostics.asym_pairs {
        let back = repaired.entry(b.clone()).or_default();
        if !back.contains(a) {
            back.push(a.clone());
        }
        summary.reciprocity_added += 1;
        changes.push(RepairChange::ReciprocityAdded {
            from: b.clone(),
            to: a.clone(),
        });
    }
    debug!("Added {} reciprocal edges", summary.reciprocity_added);

    for island in &diagnostics.islands {
        if repaired.get(island).is_some_and(|l| !l.is_empty()) {
            summary.already_linked += 1;
            changes.push(RepairChange::IslandAlreadyLinked {
                island: island.clone(),
            });
            continue;
        }

        match pick_island_target(island, &repaired, cluster_of, coords) {
            Some((target, distance_km)) => {
                repaired.entry(island.clone()).or_default().push(target.clone());
                let back = repaired.entry(target.clone()).or_default();
                if !back.contains(island) {
                    back.push(island.clone());
                }
                summary.islands_linked += 1;
                changes.push(RepairChange::LinkedIsland {
                    island: island.clone(),
                    target,
                    distance_km,
                });
            }
            None => {
                warn!("No viable link target for island '{}'", island);
                summary.unfixable += 1;
                changes.push(RepairChange::IslandUnfixable {
                    island: island.clone(),
                });
            }
        }
    }

    for (node, targets) in repaired.iter_mut() {
        targets.retain(|t| t != node);
        targets.sort();
        targets.dedup();
    }

    info!(
        "Repair: {} reciprocal edges, {} islands linked, {} already linked, {} unfixable",
        summary.reciprocity_added, summary.islands_linked, summary.already_linked, summary.unfixable
    );

    RepairOutcome {
        adjacency: repaired,
        summary,
        changes,
    }
}

/// Nearest same-cluster node, then nearest node anywhere, then the first
/// node (in slug order) that has any edges.
fn pick_island_target(
    island: &str,
    adj: &Adjacency,
    cluster_of: &BTreeMap<String, String>,
    coords: &BTreeMap<String, Coordinates>,
) -> Option<(String, Option<f64>)> {
    if let Some(&origin) = coords.get(island) {
        let cluster = cluster_of.get(island).filter(|c| !c.is_empty());
        let same_cluster = cluster.and_then(|c| {
            nearest(island, origin, adj, coords, |n| cluster_of.get(n) == Some(c))
        });
        if let Some((slug, km)) = same_cluster.or_else(|| nearest(island, origin, adj, coords, |_| true)) {
            return Some((slug, Some(km)));
        }
    }

    adj.iter()
        .find(|(node, targets)| node.as_str() != island && !targets.is_empty())
        .map(|(node, _)| (node.clone(), None))
}

/// Closest node with coordinates that passes `accept`; ties by slug
fn nearest(
    island: &str,
    origin: Coordinates,
    adj: &Adjacency,
    coords: &BTreeMap<String, Coordinates>,
    accept: impl Fn(&str) -> bool,
) -> Option<(String, f64)> {
    adj.keys()
        .filter(|n| n.as_str() != island && accept(n))
        .filter_map(|n| coords.get(n).map(|&c| (n, haversine_km(origin, c))))
        .min_by(|a, b| a.1.total_cmp(&b.1).then_with(|| a.0.cmp(b.0)))
        .map(|(n, km)| (n.clone(), km))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::diagnose;

    fn graph(entries: &[(&str, &[&str])]) -> Adjacency {
        entries
            .iter()
            .map(|(k, vs)| (k.to_string(), vs.iter().map(|v| v.to_string()).collect()))
            .collect()
    }

    fn is_closed(adj: &Adjacency) -> bool {
        adj.iter()
            .all(|(a, targets)| targets.iter().all(|b| adj.get(b).is_some_and(|l| l.contains(a))))
    }

    #[test]
    fn test_reciprocity_closure() {
        let adj = graph(&[("a", &["b", "c"]), ("b", &["a"]), ("c", &[])]);
        let report = diagnose(&adj, &BTreeMap::new(), 0);
        let outcome = repair(&adj, &report, &BTreeMap::new(), &BTreeMap::new());

        assert!(is_closed(&outcome.adjacency));
        assert_eq!(outcome.adjacency["c"], vec!["a"]);
        assert_eq!(outcome.summary.reciprocity_added, 1);
        // c was an island but the reciprocity pass already linked it
        assert_eq!(outcome.summary.already_linked, 1);
        assert_eq!(
            outcome.changes[1],
            RepairChange::IslandAlreadyLinked { island: "c".into() }
        );
    }

    #[test]
    fn test_island_linked_to_nearest_same_cluster() {
        let adj = graph(&[("a", &["b"]), ("b", &["a"]), ("c", &["d"]), ("d", &["c"]), ("z", &[])]);
        let cluster_of: BTreeMap<String, String> =
            [("a", "north"), ("b", "north"), ("c", "south"), ("d", "south"), ("z", "south")]
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect();
        let coords: BTreeMap<String, Coordinates> = [
            ("a", Coordinates { lat: 0.0, lng: 0.01 }),
            ("b", Coordinates { lat: 0.0, lng: 0.02 }),
            ("c", Coordinates { lat: 0.0, lng: 0.5 }),
            ("d", Coordinates { lat: 0.0, lng: 0.3 }),
            ("z", Coordinates { lat: 0.0, lng: 0.0 }),
        ]
        .iter()
        .map(|(k, v)| (k.to_string(), *v))
        .collect();

        let report = diagnose(&adj, &cluster_of, 0);
        let outcome = repair(&adj, &report, &cluster_of, &coords);

        // a is closer but in another cluster
        assert_eq!(outcome.adjacency["z"], vec!["d"]);
        assert_eq!(outcome.adjacency["d"], vec!["c", "z"]);
        assert_eq!(outcome.summary.islands_linked, 1);
        assert!(is_closed(&outcome.adjacency));
    }

    #[test]
    fn test_island_without_coordinates_uses_first_linked_node() {
        let adj = graph(&[("a", &[]), ("b", &["c"]), ("c", &["b"])]);
        let report = diagnose(&adj, &BTreeMap::new(), 0);
        let outcome = repair(&adj, &report, &BTreeMap::new(), &BTreeMap::new());

        assert_eq!(outcome.adjacency["a"], vec!["b"]);
        assert_eq!(outcome.adjacency["b"], vec!["a", "c"]);
        assert!(matches!(
            &outcome.changes[0],
            RepairChange::LinkedIsland { distance_km: None, .. }
        ));
    }

    #[test]
    fn test_edgeless_graph_is_unfixable() {
        let adj = graph(&[("a", &[]), ("b", &[])]);
        let report = diagnose(&adj, &BTreeMap::new(), 0);
        let outcome = repair(&adj, &report, &BTreeMap::new(), &BTreeMap::new());

        assert_eq!(outcome.summary.unfixable, 2);
        assert_eq!(outcome.summary.islands_linked, 0);
        assert!(outcome.adjacency.values().all(Vec::is_empty));
    }

    #[test]
    fn test_output_lists_sorted_and_deduped() {
        let adj = graph(&[("a", &["c", "b"]), ("b", &[]), ("c", &["a"])]);
        let report = diagnose(&adj, &BTreeMap::new(), 0);
        let outcome = repair(&adj, &report, &BTreeMap::new(), &BTreeMap::new());
        for targets in outcome.adjacency.values() {
            let mut sorted = targets.clone();
            sorted.sort();
            sorted.dedup();
            assert_eq!(&sorted, targets);
        }
        assert_eq!(outcome.adjacency["b"], vec!["a"]);
    }
}
