//! Cluster assignment index
//!
//! Accepts both cluster source shapes:
//!
//! ```json
//! { "eastern-suburbs": ["bondi", "coogee"] }
//! { "clusters": [ { "slug": "eastern-suburbs", "suburbs": ["bondi", "coogee"] } ] }
//! ```
//!
//! and resolves them into `slug -> cluster`. Structural problems are
//! returned as findings, never as errors.

use crate::models::{Adjacency, Finding, FindingCode, Severity, Suburb};
use serde::Deserialize;
use std::collections::{BTreeMap, BTreeSet};
use tracing::debug;

/// Raw cluster dataset
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum ClusterSource {
    Listed { clusters: Vec<ClusterEntry> },
    Mapped(BTreeMap<String, Vec<String>>),
}

#[derive(Debug, Clone, Deserialize)]
pub struct ClusterEntry {
    pub slug: String,
    #[serde(default)]
    pub suburbs: Vec<String>,
}

impl Default for ClusterSource {
    fn default() -> Self {
        ClusterSource::Mapped(BTreeMap::new())
    }
}

impl ClusterSource {
    /// `(cluster, members)` pairs sorted by cluster slug
    fn entries(&self) -> Vec<(String, Vec<String>)> {
        let mut out: Vec<(String, Vec<String>)> = match self {
            ClusterSource::Listed { clusters } => clusters
                .iter()
                .map(|c| (c.slug.clone(), c.suburbs.clone()))
                .collect(),
            ClusterSource::Mapped(map) => map
                .iter()
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect(),
        };
        for (slug, members) in &mut out {
            *slug = slug.trim().to_lowercase();
            *members = members
                .iter()
                .map(|m| m.trim().to_lowercase())
                .filter(|m| !m.is_empty())
                .collect();
        }
        out.retain(|(slug, _)| !slug.is_empty());
        out.sort_by(|a, b| a.0.cmp(&b.0));
        out
    }
}

/// Resolved cluster membership plus the findings raised while resolving it
#[derive(Debug, Clone, Default)]
pub struct ClusterIndex {
    /// suburb slug -> cluster slug
    pub cluster_of: BTreeMap<String, String>,
    /// cluster slug -> sorted member slugs
    pub members: BTreeMap<String, Vec<String>>,
    pub findings: Vec<Finding>,
}

impl ClusterIndex {
    /// Build the index against the node set of `adj`.
    ///
    /// A suburb listed by several clusters keeps the first cluster in slug
    /// order. Suburbs missing from the cluster source fall back to the
    /// `cluster` field of their metadata, if any.
    pub fn build(
        source: &ClusterSource,
        adj: &Adjacency,
        suburbs: &BTreeMap<String, Suburb>,
    ) -> Self {
        let mut cluster_of: BTreeMap<String, String> = BTreeMap::new();
        let mut assignments: BTreeMap<String, BTreeSet<String>> = BTreeMap::new();
        let mut unknown: BTreeSet<String> = BTreeSet::new();

        for (cluster, members) in source.entries() {
            for member in members {
                if !adj.contains_key(&member) {
                    unknown.insert(member.clone());
                }
                assignments
                    .entry(member.clone())
                    .or_default()
                    .insert(cluster.clone());
                cluster_of.entry(member).or_insert_with(|| cluster.clone());
            }
        }

        for (slug, meta) in suburbs {
            if !adj.contains_key(slug) || cluster_of.contains_key(slug) {
                continue;
            }
            if let Some(cluster) = meta.cluster.as_deref().map(str::trim).filter(|c| !c.is_empty())
            {
                cluster_of.insert(slug.clone(), cluster.to_lowercase());
            }
        }

        let mut findings = Vec::new();

        let duplicates: Vec<String> = assignments
            .iter()
            .filter(|(_, clusters)| clusters.len() > 1)
            .map(|(slug, clusters)| {
                let list: Vec<&str> = clusters.iter().map(String::as_str).collect();
                format!("{} ({})", slug, list.join(", "))
            })
            .collect();
        if !duplicates.is_empty() {
            findings.push(
                Finding::new(
                    FindingCode::DuplicateClusterAssignment,
                    Severity::Error,
                    format!("{} suburbs are assigned to more than one cluster", duplicates.len()),
                )
                .with_subjects(duplicates),
            );
        }

        if !unknown.is_empty() {
            findings.push(
                Finding::new(
                    FindingCode::UnknownClusterMember,
                    Severity::Warning,
                    format!("{} cluster members are not known suburbs", unknown.len()),
                )
                .with_subjects(unknown),
            );
        }

        let uncovered: Vec<&String> = adj.keys().filter(|n| !cluster_of.contains_key(*n)).collect();
        if !uncovered.is_empty() {
            findings.push(
                Finding::new(
                    FindingCode::MissingClusterCoverage,
                    Severity::Error,
                    format!("{} suburbs have no cluster", uncovered.len()),
                )
                .with_subjects(uncovered.iter().map(|s| s.as_str())),
            );
        }

        let mut members: BTreeMap<String, Vec<String>> = BTreeMap::new();
        for (slug, cluster) in &cluster_of {
            members.entry(cluster.clone()).or_default().push(slug.clone());
        }

        debug!(
            "Cluster index: {} clusters, {} assigned suburbs, {} findings",
            members.len(),
            cluster_of.len(),
            findings.len()
        );

        Self {
            cluster_of,
            members,
            findings,
        }
    }

    pub fn cluster(&self, slug: &str) -> Option<&str> {
        self.cluster_of.get(slug).map(String::as_str)
    }

    /// True when both nodes have a (non-empty) cluster and it is the same one
    pub fn same_cluster(&self, a: &str, b: &str) -> bool {
        match (self.cluster(a), self.cluster(b)) {
            (Some(x), Some(y)) => !x.is_empty() && x == y,
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn adj(nodes: &[&str]) -> Adjacency {
        nodes.iter().map(|n| (n.to_string(), Vec::new())).collect()
    }

    #[test]
    fn test_parses_mapped_shape() {
        let src: ClusterSource =
            serde_json::from_str(r#"{"East": ["Bondi", "coogee"], "north": ["manly"]}"#)
                .expect("parse clusters");
        let idx = ClusterIndex::build(&src, &adj(&["bondi", "coogee", "manly"]), &BTreeMap::new());

        assert_eq!(idx.cluster("bondi"), Some("east"));
        assert_eq!(idx.cluster("manly"), Some("north"));
        assert!(idx.same_cluster("bondi", "coogee"));
        assert!(!idx.same_cluster("bondi", "manly"));
        assert!(idx.findings.is_empty());
    }

    #[test]
    fn test_parses_listed_shape() {
        let src: ClusterSource = serde_json::from_str(
            r#"{"clusters": [{"slug": "east", "suburbs": ["bondi"]}, {"slug": "west", "suburbs": []}]}"#,
        )
        .expect("parse clusters");
        let idx = ClusterIndex::build(&src, &adj(&["bondi"]), &BTreeMap::new());
        assert_eq!(idx.cluster("bondi"), Some("east"));
    }

    #[test]
    fn test_duplicate_assignment_keeps_first_cluster() {
        let src: ClusterSource =
            serde_json::from_str(r#"{"west": ["bondi"], "east": ["bondi"]}"#).expect("parse");
        let idx = ClusterIndex::build(&src, &adj(&["bondi"]), &BTreeMap::new());

        assert_eq!(idx.cluster("bondi"), Some("east"));
        assert!(idx
            .findings
            .iter()
            .any(|f| f.code == FindingCode::DuplicateClusterAssignment));
    }

    #[test]
    fn test_unknown_members_and_missing_coverage() {
        let src: ClusterSource =
            serde_json::from_str(r#"{"east": ["bondi", "atlantis"]}"#).expect("parse");
        let idx = ClusterIndex::build(&src, &adj(&["bondi", "manly"]), &BTreeMap::new());

        let unknown = idx
            .findings
            .iter()
            .find(|f| f.code == FindingCode::UnknownClusterMember)
            .expect("unknown finding");
        assert_eq!(unknown.subjects, vec!["atlantis"]);

        let missing = idx
            .findings
            .iter()
            .find(|f| f.code == FindingCode::MissingClusterCoverage)
            .expect("coverage finding");
        assert_eq!(missing.subjects, vec!["manly"]);
    }

    #[test]
    fn test_metadata_cluster_fills_gaps() {
        let mut suburbs = BTreeMap::new();
        suburbs.insert(
            "manly".to_string(),
            Suburb {
                slug: "manly".into(),
                cluster: Some("North".into()),
                ..Default::default()
            },
        );
        let idx = ClusterIndex::build(&ClusterSource::default(), &adj(&["manly"]), &suburbs);
        assert_eq!(idx.cluster("manly"), Some("north"));
        assert!(idx.findings.is_empty());
    }
}
