//! Per-edge candidate scorer
//!
//! Scores every existing edge `A -> B` as a link candidate for page `A`.
//! Scoring reads shared immutable data only, so nodes are scored in
//! parallel and collected into a sorted map.

use crate::graph::{distance_between, ClusterIndex};
use crate::models::{Adjacency, CandidateMap, Coordinates, ScoredCandidate};
use rayon::prelude::*;
use std::cmp::Ordering;
use std::collections::BTreeMap;
use tracing::{debug, info};

/// Weights of the candidate score
///
/// ```text
/// score = cluster    * same_cluster
///       + reciprocal * is_reciprocal
///       + distance   * max(0, 1 - km / max(1, distance_scale_km))
///       + hub        * -(degree(B) / max(1, max_degree))
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct ScoringWeights {
    pub cluster: f64,
    pub reciprocal: f64,
    pub distance: f64,
    pub hub: f64,
    pub distance_scale_km: f64,
}

impl Default for ScoringWeights {
    fn default() -> Self {
        Self {
            cluster: 1.0,
            reciprocal: 0.5,
            distance: 1.0,
            hub: 0.5,
            distance_scale_km: 10.0,
        }
    }
}

/// Candidate order: score desc, then slug asc
pub fn candidate_order(a: &ScoredCandidate, b: &ScoredCandidate) -> Ordering {
    b.score
        .total_cmp(&a.score)
        .then_with(|| a.target_slug.cmp(&b.target_slug))
}

/// Graph-aware candidate scorer
pub struct CandidateScorer<'a> {
    adj: &'a Adjacency,
    clusters: &'a ClusterIndex,
    coords: &'a BTreeMap<String, Coordinates>,
    weights: &'a ScoringWeights,
    max_degree: usize,
}

impl<'a> CandidateScorer<'a> {
    pub fn new(
        adj: &'a Adjacency,
        clusters: &'a ClusterIndex,
        coords: &'a BTreeMap<String, Coordinates>,
        weights: &'a ScoringWeights,
    ) -> Self {
        let max_degree = adj.values().map(Vec::len).max().unwrap_or(0);
        Self {
            adj,
            clusters,
            coords,
            weights,
            max_degree,
        }
    }

    fn degree(&self, node: &str) -> usize {
        self.adj.get(node).map(Vec::len).unwrap_or(0)
    }

    /// Score a single candidate edge `from -> to`
    pub fn score_pair(&self, from: &str, to: &str) -> ScoredCandidate {
        let same_cluster = self.clusters.same_cluster(from, to);
        let is_reciprocal = self
            .adj
            .get(to)
            .is_some_and(|back| back.iter().any(|t| t == from));
        let distance_km = distance_between(
            self.coords.get(from).copied(),
            self.coords.get(to).copied(),
        );

        let distance_score = match distance_km {
            Some(km) => (1.0 - km / self.weights.distance_scale_km.max(1.0)).max(0.0),
            None => 0.0,
        };
        // Always <= 0: candidates that are themselves hubs are pushed down
        let hub_score = -(self.degree(to) as f64 / self.max_degree.max(1) as f64);

        let score = self.weights.cluster * bool_weight(same_cluster)
            + self.weights.reciprocal * bool_weight(is_reciprocal)
            + self.weights.distance * distance_score
            + self.weights.hub * hub_score;

        ScoredCandidate {
            target_slug: to.to_string(),
            score,
            is_reciprocal,
            same_cluster,
            distance_km,
        }
    }

    /// Scored, sorted candidates for one node.
    ///
    /// With `enforce_reciprocity`, one-way candidates are dropped before
    /// sorting.
    pub fn score_node(&self, node: &str, enforce_reciprocity: bool) -> Vec<ScoredCandidate> {
        let Some(targets) = self.adj.get(node) else {
            return Vec::new();
        };
        let mut candidates: Vec<ScoredCandidate> = targets
            .iter()
            .filter(|t| t.as_str() != node)
            .map(|t| self.score_pair(node, t))
            .filter(|c| !enforce_reciprocity || c.is_reciprocal)
            .collect();
        candidates.sort_by(candidate_order);
        candidates
    }

    /// Score every node of the graph
    pub fn score_all(&self, enforce_reciprocity: bool) -> CandidateMap {
        let nodes: Vec<&String> = self.adj.keys().collect();
        let scored: Vec<(String, Vec<ScoredCandidate>)> = nodes
            .par_iter()
            .map(|node| ((*node).clone(), self.score_node(node, enforce_reciprocity)))
            .collect();

        let total: usize = scored.iter().map(|(_, c)| c.len()).sum();
        debug!("Max out-degree used for hub damping: {}", self.max_degree);
        info!(
            "Scored {} candidates across {} nodes (reciprocity enforced: {})",
            total,
            scored.len(),
            enforce_reciprocity
        );

        scored.into_iter().collect()
    }
}

fn bool_weight(flag: bool) -> f64 {
    if flag {
        1.0
    } else {
        0.0
    }
}
