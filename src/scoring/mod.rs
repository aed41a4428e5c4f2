//! Link candidate scoring
//!
//! Every existing edge `A -> B` is a candidate link for page `A`. Its score
//! combines four signals:
//!
//! - **Cluster affinity**: both suburbs belong to the same cluster
//! - **Reciprocity**: `B` already links back to `A`
//! - **Proximity**: `1 - km / distance_scale_km`, floored at 0
//! - **Hub damping**: `-(degree(B) / max_degree)`, never positive
//!
//! # Example
//!
//! With the default weights (cluster 1.0, reciprocal 0.5, distance 1.0,
//! hub 0.5, scale 10 km), a same-cluster reciprocal neighbour 2 km away
//! whose degree is half the graph maximum scores
//! `1.0 + 0.5 + 0.8 - 0.25 = 2.05`.
//!
//! Candidates are ordered by score desc, then slug asc.

mod candidate_scorer;

pub use candidate_scorer::{candidate_order, CandidateScorer, ScoringWeights};
