//! Graph health diagnostics
//!
//! Pure functions over a normalized adjacency: connectivity, degree
//! distribution, asymmetry, cross-cluster ratio and a permutation-invariant
//! content hash. Nothing here mutates its input or touches the filesystem.

use crate::hashing::canonical_hash;
use crate::models::Adjacency;
use petgraph::graph::{NodeIndex, UnGraph};
use petgraph::visit::Bfs;
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};
use std::time::Instant;
use tracing::debug;

/// Summary statistics over the ascending out-degree sequence
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct DegreeStats {
    pub min: usize,
    pub median: usize,
    pub max: usize,
    pub mean: f64,
    pub p90: usize,
}

/// Immutable snapshot of graph health, regenerated on every run
#[derive(Debug, Clone, Serialize)]
pub struct DiagnosticReport {
    pub nodes: usize,
    pub edges: usize,
    /// Connected components, largest first, members sorted
    pub components: Vec<Vec<String>>,
    pub largest_component_ratio: f64,
    pub degree_stats: DegreeStats,
    /// out-degree -> number of nodes with that degree
    pub degree_histogram: BTreeMap<usize, usize>,
    pub cross_cluster_ratio: f64,
    pub asym_pairs: Vec<(String, String)>,
    pub self_loops: usize,
    pub islands: Vec<String>,
    pub content_hash: String,
    /// Observability only; excluded from drift comparisons
    pub timings_ms: BTreeMap<String, u64>,
}

/// Connected components treating edges as undirected.
///
/// Uses an iterative breadth-first walk so deep chains cannot overflow the
/// stack. Components are sorted by size desc (ties by first member), and
/// each component's members are sorted asc.
pub fn connected_components(adj: &Adjacency) -> Vec<Vec<String>> {
    let mut graph: UnGraph<&str, ()> = UnGraph::with_capacity(adj.len(), 0);
    let mut index: HashMap<&str, NodeIndex> = HashMap::with_capacity(adj.len());

    for node in adj.keys() {
        index.insert(node.as_str(), graph.add_node(node.as_str()));
    }
    for (source, targets) in adj {
        let Some(&from) = index.get(source.as_str()) else {
            continue;
        };
        for target in targets {
            let to = match index.get(target.as_str()) {
                Some(&i) => i,
                None => {
                    let i = graph.add_node(target.as_str());
                    index.insert(target.as_str(), i);
                    i
                }
            };
            graph.add_edge(from, to, ());
        }
    }

    let mut visited = vec![false; graph.node_count()];
    let mut components: Vec<Vec<String>> = Vec::new();

    for start in graph.node_indices() {
        if visited[start.index()] {
            continue;
        }
        let mut members = Vec::new();
        let mut bfs = Bfs::new(&graph, start);
        while let Some(nx) = bfs.next(&graph) {
            visited[nx.index()] = true;
            members.push(graph[nx].to_string());
        }
        members.sort();
        components.push(members);
    }

    components.sort_by(|a, b| b.len().cmp(&a.len()).then_with(|| a.first().cmp(&b.first())));
    components
}

/// Percentile over an ascending sequence using `floor(p * (n - 1))`
fn percentile(sorted: &[usize], p: f64) -> usize {
    let n = sorted.len().max(1);
    let idx = (p * (n - 1) as f64).floor() as usize;
    sorted.get(idx).copied().unwrap_or(0)
}

/// Degree statistics over out-degrees. An empty graph yields all zeros.
pub fn degree_stats(adj: &Adjacency) -> DegreeStats {
    let mut degrees: Vec<usize> = adj.values().map(Vec::len).collect();
    degrees.sort_unstable();

    let n = degrees.len().max(1);
    let total: usize = degrees.iter().sum();

    DegreeStats {
        min: degrees.first().copied().unwrap_or(0),
        median: percentile(&degrees, 0.5),
        max: degrees.last().copied().unwrap_or(0),
        mean: total as f64 / n as f64,
        p90: percentile(&degrees, 0.9),
    }
}

/// Out-degree histogram: degree -> node count
pub fn degree_histogram(adj: &Adjacency) -> BTreeMap<usize, usize> {
    let mut histogram = BTreeMap::new();
    for targets in adj.values() {
        *histogram.entry(targets.len()).or_insert(0) += 1;
    }
    histogram
}

/// All `(a, b)` with `a -> b` but no `b -> a`, sorted
pub fn asym_pairs(adj: &Adjacency) -> Vec<(String, String)> {
    let mut pairs = Vec::new();
    for (a, targets) in adj {
        for b in targets {
            if a == b {
                continue;
            }
            let reciprocated = adj.get(b).is_some_and(|back| back.contains(a));
            if !reciprocated {
                pairs.push((a.clone(), b.clone()));
            }
        }
    }
    pairs.sort();
    pairs
}

/// Fraction of directed edges whose endpoints sit in different, non-empty
/// clusters. Edges with an unclustered endpoint count in the denominator
/// only.
pub fn cross_cluster_ratio(adj: &Adjacency, cluster_of: &BTreeMap<String, String>) -> f64 {
    let mut total = 0usize;
    let mut cross = 0usize;
    for (a, targets) in adj {
        for b in targets {
            total += 1;
            let ca = cluster_of.get(a).filter(|c| !c.is_empty());
            let cb = cluster_of.get(b).filter(|c| !c.is_empty());
            if let (Some(x), Some(y)) = (ca, cb) {
                if x != y {
                    cross += 1;
                }
            }
        }
    }
    if total == 0 {
        0.0
    } else {
        cross as f64 / total as f64
    }
}

/// Nodes with no outbound edges, sorted
pub fn islands(adj: &Adjacency) -> Vec<String> {
    adj.iter()
        .filter(|(_, targets)| targets.is_empty())
        .map(|(node, _)| node.clone())
        .collect()
}

/// Total number of directed edges
pub fn edge_count(adj: &Adjacency) -> usize {
    adj.values().map(Vec::len).sum()
}

/// Number of distinct unordered node pairs joined by at least one edge
pub fn undirected_edge_count(adj: &Adjacency) -> usize {
    let mut pairs = std::collections::BTreeSet::new();
    for (a, targets) in adj {
        for b in targets {
            if a == b {
                continue;
            }
            let pair = if a < b { (a, b) } else { (b, a) };
            pairs.insert(pair);
        }
    }
    pairs.len()
}

/// Content hash of the adjacency, independent of key and value order
pub fn stable_graph_hash(adj: &Adjacency) -> String {
    let canonical: serde_json::Map<String, serde_json::Value> = adj
        .iter()
        .map(|(k, v)| {
            let mut targets = v.clone();
            targets.sort();
            (
                k.clone(),
                serde_json::Value::Array(targets.into_iter().map(serde_json::Value::String).collect()),
            )
        })
        .collect();
    canonical_hash(&serde_json::Value::Object(canonical))
}

/// Run every diagnostic and assemble the report.
///
/// `self_loops` comes from normalization since a normalized adjacency
/// never contains any.
pub fn diagnose(
    adj: &Adjacency,
    cluster_of: &BTreeMap<String, String>,
    self_loops: usize,
) -> DiagnosticReport {
    let mut timings_ms = BTreeMap::new();

    let t = Instant::now();
    let components = connected_components(adj);
    timings_ms.insert("components".to_string(), t.elapsed().as_millis() as u64);

    let t = Instant::now();
    let degree_stats = degree_stats(adj);
    let degree_histogram = degree_histogram(adj);
    timings_ms.insert("degrees".to_string(), t.elapsed().as_millis() as u64);

    let t = Instant::now();
    let asym_pairs = asym_pairs(adj);
    let cross_cluster_ratio = cross_cluster_ratio(adj, cluster_of);
    timings_ms.insert("edges".to_string(), t.elapsed().as_millis() as u64);

    let t = Instant::now();
    let content_hash = stable_graph_hash(adj);
    timings_ms.insert("hash".to_string(), t.elapsed().as_millis() as u64);

    let nodes = adj.len();
    let largest = components.first().map(Vec::len).unwrap_or(0);
    let largest_component_ratio = if nodes == 0 {
        0.0
    } else {
        (largest as f64 / nodes as f64).min(1.0)
    };

    debug!(
        "Diagnostics: {} nodes, {} components, {} asymmetric pairs",
        nodes,
        components.len(),
        asym_pairs.len()
    );

    DiagnosticReport {
        nodes,
        edges: edge_count(adj),
        components,
        largest_component_ratio,
        degree_stats,
        degree_histogram,
        cross_cluster_ratio,
        asym_pairs,
        self_loops,
        islands: islands(adj),
        content_hash,
        timings_ms,
    }
}
