//! Core data models for geolink
//!
//! These models are shared by the graph diagnostics, the scoring engine,
//! the neighbor planner and the report writers.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Directed adjacency: source slug -> target slugs.
///
/// A `BTreeMap` keeps keys sorted, which every phase relies on for a
/// platform-independent traversal order.
pub type Adjacency = BTreeMap<String, Vec<String>>;

/// Geographic position in decimal degrees
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub lat: f64,
    pub lng: f64,
}

/// A suburb (graph node) as loaded from the suburb metadata dataset
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Suburb {
    #[serde(default)]
    pub slug: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub coordinates: Option<Coordinates>,
    #[serde(default)]
    pub cluster: Option<String>,
    #[serde(default)]
    pub tier: Option<String>,
    #[serde(default)]
    pub region: Option<String>,
    #[serde(default)]
    pub postcode: Option<String>,
}

/// Severity levels for findings
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    #[default]
    Info,
    Warning,
    Error,
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Severity::Info => write!(f, "info"),
            Severity::Warning => write!(f, "warning"),
            Severity::Error => write!(f, "error"),
        }
    }
}

/// Machine-readable category of a data-quality finding
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FindingCode {
    /// A cluster lists a suburb that is not in the node set
    UnknownClusterMember,
    /// A suburb is assigned to more than one cluster
    DuplicateClusterAssignment,
    /// A node has no cluster assignment
    MissingClusterCoverage,
    /// An edge has no reverse edge
    AsymmetricEdge,
    /// A node has no outbound edges
    Island,
    /// The planner relaxed the inbound cap to satisfy `min`
    CapRelaxed,
    /// The planner could not reach `min` even with the cap relaxed
    MinUnreachable,
}

/// A data-quality finding. Never an error by itself; the CLI gate decides.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Finding {
    pub code: FindingCode,
    pub severity: Severity,
    pub message: String,
    #[serde(default)]
    pub subjects: Vec<String>,
}

impl Finding {
    pub fn new(code: FindingCode, severity: Severity, message: impl Into<String>) -> Self {
        Self {
            code,
            severity,
            message: message.into(),
            subjects: Vec::new(),
        }
    }

    pub fn with_subjects<I, S>(mut self, subjects: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.subjects = subjects.into_iter().map(Into::into).collect();
        self
    }
}

/// A candidate link from one node to another, with its score breakdown.
///
/// Ephemeral: recomputed on every planning pass.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoredCandidate {
    pub target_slug: String,
    pub score: f64,
    pub is_reciprocal: bool,
    pub same_cluster: bool,
    pub distance_km: Option<f64>,
}

/// Per-node candidate lists, sorted by score desc then slug asc
pub type CandidateMap = BTreeMap<String, Vec<ScoredCandidate>>;

/// Count how many nodes point at each target
pub fn inbound_counts(adj: &Adjacency) -> BTreeMap<String, usize> {
    let mut counts: BTreeMap<String, usize> = adj.keys().map(|k| (k.clone(), 0)).collect();
    for targets in adj.values() {
        for t in targets {
            *counts.entry(t.clone()).or_insert(0) += 1;
        }
    }
    counts
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_inbound_counts_include_zero_nodes() {
        let mut adj = Adjacency::new();
        adj.insert("a".into(), vec!["b".into(), "c".into()]);
        adj.insert("b".into(), vec!["c".into()]);
        adj.insert("c".into(), vec![]);

        let counts = inbound_counts(&adj);
        assert_eq!(counts["a"], 0);
        assert_eq!(counts["b"], 1);
        assert_eq!(counts["c"], 2);
    }

    #[test]
    fn test_finding_serializes_kebab_code() {
        let f = Finding::new(FindingCode::DuplicateClusterAssignment, Severity::Error, "dup")
            .with_subjects(["bondi"]);
        let json = serde_json::to_value(&f).expect("serialize finding");
        assert_eq!(json["code"], "duplicate-cluster-assignment");
        assert_eq!(json["severity"], "error");
        assert_eq!(json["subjects"][0], "bondi");
    }
}
