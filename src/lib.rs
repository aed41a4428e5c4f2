//! geolink - geo link-graph diagnostics and internal-link planning
//!
//! A single-pass, deterministic engine over a suburb adjacency graph:
//!
//! 1. [`graph::normalize`] canonicalizes the raw adjacency
//! 2. [`graph::diagnose`] reports connectivity, degrees and asymmetry
//! 3. [`scoring::CandidateScorer`] scores every existing edge as a link candidate
//! 4. [`planner::plan_links`] picks bounded, fair neighbour lists
//! 5. [`fairness::rebalance`] moves links off over-subscribed targets
//! 6. [`repair::repair`] closes one-way edges and links islands
//! 7. [`reporters`] validates and writes the JSON reports

pub mod cli;
pub mod config;
pub mod error;
pub mod fairness;
pub mod graph;
pub mod hashing;
pub mod inputs;
pub mod models;
pub mod planner;
pub mod repair;
pub mod reporters;
pub mod scoring;

pub use error::{GeoError, GeoResult};
