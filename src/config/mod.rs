//! Configuration module for geolink
//!
//! This module handles:
//! - Project-level configuration (geolink.toml / .geolinkrc.json)
//! - Scoring weights and neighbor policy
//! - CI gate thresholds
//! - Precedence resolution with CLI overrides

mod project_config;

pub use project_config::{
    CapSetting,
    CliOverrides,
    DoctorConfig,
    EngineConfig,
    GatePolicy,
    InputPaths,
    InputsConfig,
    NeighborPolicy,
    NeighborsConfig,
    ProjectConfig,
    ScoringConfig,
    load_project_config,
    CONFIG_JSON,
    CONFIG_TOML,
};
