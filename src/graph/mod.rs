//! Suburb link graph: normalization, cluster index and diagnostics

pub mod clusters;
pub mod diagnostics;
pub mod geo;
pub mod normalize;

pub use clusters::{ClusterIndex, ClusterSource};
pub use diagnostics::{
    asym_pairs, connected_components, cross_cluster_ratio, degree_histogram, degree_stats,
    diagnose, edge_count, islands, stable_graph_hash, undirected_edge_count, DegreeStats,
    DiagnosticReport,
};
pub use geo::{distance_between, haversine_km};
pub use normalize::{normalize, NormalizeStats, Normalized};
