//! Adjacency normalization
//!
//! Canonicalizes raw `slug -> [slug]` input: lowercase ids, every id seen as
//! a key or a value becomes a node, self-references are dropped, neighbor
//! lists are deduped and sorted. Malformed entries are coerced, not
//! rejected; what was coerced is counted in [`NormalizeStats`].

use crate::models::Adjacency;
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};
use tracing::debug;

/// Counts of silently coerced input
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct NormalizeStats {
    /// Edges whose source and target were the same node
    pub self_loops: usize,
    /// Edges dropped because the same target appeared twice for a source
    pub duplicate_edges: usize,
    /// Ids that only appeared as targets and were added as nodes
    pub implicit_nodes: usize,
}

/// A normalized adjacency plus what normalization changed
#[derive(Debug, Clone, Default)]
pub struct Normalized {
    pub adjacency: Adjacency,
    pub stats: NormalizeStats,
}

fn canonical_id(raw: &str) -> Option<String> {
    let id = raw.trim().to_lowercase();
    if id.is_empty() {
        None
    } else {
        Some(id)
    }
}

/// Normalize a raw adjacency mapping.
///
/// Two passes: collect every referenced id first, then build the lists, so
/// the node set is never grown while it is being iterated.
pub fn normalize<K, V>(raw: &BTreeMap<K, Vec<V>>) -> Normalized
where
    K: AsRef<str>,
    V: AsRef<str>,
{
    let mut keys: BTreeSet<String> = BTreeSet::new();
    let mut nodes: BTreeSet<String> = BTreeSet::new();
    for (source, targets) in raw {
        if let Some(id) = canonical_id(source.as_ref()) {
            keys.insert(id.clone());
            nodes.insert(id);
        }
        nodes.extend(targets.iter().filter_map(|t| canonical_id(t.as_ref())));
    }

    let mut stats = NormalizeStats {
        implicit_nodes: nodes.difference(&keys).count(),
        ..Default::default()
    };

    let mut merged: BTreeMap<String, Vec<String>> =
        nodes.iter().map(|n| (n.clone(), Vec::new())).collect();
    for (source, targets) in raw {
        let Some(source) = canonical_id(source.as_ref()) else {
            continue;
        };
        if let Some(list) = merged.get_mut(&source) {
            list.extend(targets.iter().filter_map(|t| canonical_id(t.as_ref())));
        }
    }

    let mut adjacency = Adjacency::new();
    for (source, targets) in merged {
        let before = targets.len();
        let self_refs = targets.iter().filter(|t| **t == source).count();
        let unique: BTreeSet<String> = targets.into_iter().filter(|t| *t != source).collect();

        stats.self_loops += self_refs;
        stats.duplicate_edges += before - self_refs - unique.len();
        adjacency.insert(source, unique.into_iter().collect());
    }

    debug!(
        "Normalized {} nodes (self_loops={}, duplicates={}, implicit={})",
        adjacency.len(),
        stats.self_loops,
        stats.duplicate_edges,
        stats.implicit_nodes
    );

    Normalized { adjacency, stats }
}
