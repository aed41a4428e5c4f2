//! Project-level configuration support
//!
//! Loads per-project configuration from `geolink.toml` or `.geolinkrc.json`
//! in the data directory, then resolves it together with CLI overrides into
//! one immutable [`EngineConfig`].
//!
//! # Configuration Format
//!
//! ```toml
//! # geolink.toml
//! services = ["plumbing", "electrical"]
//!
//! [scoring]
//! cluster = 1.0
//! reciprocal = 0.5
//! distance = 1.0
//! hub = 0.5
//! distance_scale_km = 10.0
//!
//! [neighbors]
//! max = 6
//! min = 3
//! inbound_cap = "dynamic"   # integer, "dynamic" or "none"
//! enforce_reciprocity = false
//!
//! [doctor]
//! strict = false
//! max_orphans = 0
//! fail_on_asymmetry = false
//!
//! [inputs]
//! adjacency = "areas.adj.json"
//! clusters = "areas.clusters.json"
//! suburbs = "suburbs.json"
//! ```
//!
//! Precedence is CLI override > file > built-in default.

use crate::planner::CapPolicy;
use crate::scoring::ScoringWeights;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

pub const CONFIG_TOML: &str = "geolink.toml";
pub const CONFIG_JSON: &str = ".geolinkrc.json";

pub const DEFAULT_MAX_NEIGHBORS: usize = 6;
pub const DEFAULT_ADJACENCY_FILE: &str = "areas.adj.json";
pub const DEFAULT_CLUSTERS_FILE: &str = "areas.clusters.json";
pub const DEFAULT_SUBURBS_FILE: &str = "suburbs.json";

/// Project configuration as written in the config file
#[derive(Debug, Clone, Deserialize, Default)]
pub struct ProjectConfig {
    /// Services each suburb page exists for; keys become `service/suburb`
    #[serde(default)]
    pub services: Vec<String>,

    #[serde(default)]
    pub scoring: ScoringConfig,

    #[serde(default)]
    pub neighbors: NeighborsConfig,

    #[serde(default)]
    pub doctor: DoctorConfig,

    #[serde(default)]
    pub inputs: InputsConfig,
}

/// Scoring weights (see [`ScoringWeights`] for the formula)
#[derive(Debug, Clone, Deserialize)]
pub struct ScoringConfig {
    #[serde(default = "default_cluster_weight")]
    pub cluster: f64,
    #[serde(default = "default_reciprocal_weight")]
    pub reciprocal: f64,
    #[serde(default = "default_distance_weight")]
    pub distance: f64,
    #[serde(default = "default_hub_weight")]
    pub hub: f64,
    #[serde(default = "default_distance_scale_km")]
    pub distance_scale_km: f64,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            cluster: default_cluster_weight(),
            reciprocal: default_reciprocal_weight(),
            distance: default_distance_weight(),
            hub: default_hub_weight(),
            distance_scale_km: default_distance_scale_km(),
        }
    }
}

fn default_cluster_weight() -> f64 {
    1.0
}
fn default_reciprocal_weight() -> f64 {
    0.5
}
fn default_distance_weight() -> f64 {
    1.0
}
fn default_hub_weight() -> f64 {
    0.5
}
fn default_distance_scale_km() -> f64 {
    10.0
}

impl From<&ScoringConfig> for ScoringWeights {
    fn from(c: &ScoringConfig) -> Self {
        ScoringWeights {
            cluster: c.cluster,
            reciprocal: c.reciprocal,
            distance: c.distance,
            hub: c.hub,
            distance_scale_km: c.distance_scale_km,
        }
    }
}

/// Inbound cap as written in config: a number or a keyword
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum CapSetting {
    Count(usize),
    Keyword(String),
}

impl CapSetting {
    /// Interpret the setting. Unknown keywords fall back to unbounded.
    pub fn to_policy(&self) -> CapPolicy {
        match self {
            CapSetting::Count(n) => CapPolicy::Fixed(*n),
            CapSetting::Keyword(k) => k.parse().unwrap_or_else(|_| {
                warn!("Unknown inbound_cap '{}', using no cap", k);
                CapPolicy::Unbounded
            }),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct NeighborsConfig {
    #[serde(default)]
    pub max: Option<usize>,
    #[serde(default)]
    pub min: Option<usize>,
    #[serde(default)]
    pub inbound_cap: Option<CapSetting>,
    #[serde(default)]
    pub enforce_reciprocity: Option<bool>,
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct DoctorConfig {
    #[serde(default)]
    pub strict: Option<bool>,
    #[serde(default)]
    pub max_orphans: Option<usize>,
    #[serde(default)]
    pub fail_on_asymmetry: Option<bool>,
    /// Turn schema findings (unknown cluster members etc.) into a failing exit
    #[serde(default)]
    pub promote_schema_findings: Option<bool>,
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct InputsConfig {
    #[serde(default)]
    pub adjacency: Option<String>,
    #[serde(default)]
    pub clusters: Option<String>,
    #[serde(default)]
    pub suburbs: Option<String>,
}

/// Values given on the command line. `None`/`false` means "not given".
#[derive(Debug, Clone, Default)]
pub struct CliOverrides {
    pub max: Option<usize>,
    pub min: Option<usize>,
    pub cap: Option<CapPolicy>,
    pub enforce_reciprocity: bool,
    pub strict: bool,
    pub max_orphans: Option<usize>,
    pub fail_on_asymmetry: bool,
}

/// Neighbor selection parameters
#[derive(Debug, Clone, PartialEq)]
pub struct NeighborPolicy {
    pub max: usize,
    pub min: usize,
    pub cap: CapPolicy,
    pub enforce_reciprocity: bool,
}

/// CI gate thresholds
#[derive(Debug, Clone, PartialEq)]
pub struct GatePolicy {
    pub strict: bool,
    pub max_orphans: Option<usize>,
    pub fail_on_asymmetry: bool,
    pub promote_schema_findings: bool,
}

/// Dataset locations, already joined onto the data directory
#[derive(Debug, Clone, PartialEq)]
pub struct InputPaths {
    pub adjacency: PathBuf,
    pub clusters: PathBuf,
    pub suburbs: PathBuf,
}

/// Fully resolved configuration, computed once at startup
#[derive(Debug, Clone)]
pub struct EngineConfig {
    pub services: Vec<String>,
    pub weights: ScoringWeights,
    pub neighbors: NeighborPolicy,
    pub gate: GatePolicy,
    pub inputs: InputPaths,
}

impl EngineConfig {
    /// Resolve file config and CLI overrides into the effective configuration
    pub fn resolve(file: &ProjectConfig, cli: &CliOverrides, data_dir: &Path) -> Self {
        let max = cli
            .max
            .or(file.neighbors.max)
            .unwrap_or(DEFAULT_MAX_NEIGHBORS);
        let min = cli
            .min
            .or(file.neighbors.min)
            .unwrap_or_else(|| max.min(3))
            .min(max);

        let strict = cli.strict || file.doctor.strict.unwrap_or(false);

        // strict only changes the default; an explicit cap (even `none`) wins
        let cap = match cli
            .cap
            .clone()
            .or_else(|| file.neighbors.inbound_cap.as_ref().map(CapSetting::to_policy))
        {
            Some(cap) => cap,
            None if strict => {
                debug!("Strict mode: using dynamic inbound cap");
                CapPolicy::Dynamic
            }
            None => CapPolicy::Unbounded,
        };

        let enforce_reciprocity =
            cli.enforce_reciprocity || file.neighbors.enforce_reciprocity.unwrap_or(false);

        let gate = GatePolicy {
            strict,
            max_orphans: cli.max_orphans.or(file.doctor.max_orphans),
            fail_on_asymmetry: strict
                || cli.fail_on_asymmetry
                || file.doctor.fail_on_asymmetry.unwrap_or(false),
            promote_schema_findings: strict
                || file.doctor.promote_schema_findings.unwrap_or(false),
        };

        let join = |name: &Option<String>, default: &str| {
            data_dir.join(name.as_deref().unwrap_or(default))
        };
        let inputs = InputPaths {
            adjacency: join(&file.inputs.adjacency, DEFAULT_ADJACENCY_FILE),
            clusters: join(&file.inputs.clusters, DEFAULT_CLUSTERS_FILE),
            suburbs: join(&file.inputs.suburbs, DEFAULT_SUBURBS_FILE),
        };

        let mut services = file.services.clone();
        services.sort();
        services.dedup();

        Self {
            services,
            weights: ScoringWeights::from(&file.scoring),
            neighbors: NeighborPolicy {
                max,
                min,
                cap,
                enforce_reciprocity,
            },
            gate,
            inputs,
        }
    }
}

/// Load project configuration.
///
/// With an explicit path, that file is used. Otherwise searches the data
/// directory for:
/// 1. `geolink.toml`
/// 2. `.geolinkrc.json`
///
/// Returns default configuration if no config file is found or parsing fails.
pub fn load_project_config(data_dir: &Path, explicit: Option<&Path>) -> ProjectConfig {
    if let Some(path) = explicit {
        let loaded = if path.extension().is_some_and(|e| e == "json") {
            load_json_config(path)
        } else {
            load_toml_config(path)
        };
        return match loaded {
            Ok(config) => {
                debug!("Loaded config from {}", path.display());
                config
            }
            Err(e) => {
                warn!("Failed to load {}: {}", path.display(), e);
                ProjectConfig::default()
            }
        };
    }

    let toml_path = data_dir.join(CONFIG_TOML);
    if toml_path.exists() {
        match load_toml_config(&toml_path) {
            Ok(config) => {
                debug!("Loaded project config from {}", toml_path.display());
                return config;
            }
            Err(e) => {
                warn!("Failed to load {}: {}", toml_path.display(), e);
            }
        }
    }

    let json_path = data_dir.join(CONFIG_JSON);
    if json_path.exists() {
        match load_json_config(&json_path) {
            Ok(config) => {
                debug!("Loaded project config from {}", json_path.display());
                return config;
            }
            Err(e) => {
                warn!("Failed to load {}: {}", json_path.display(), e);
            }
        }
    }

    debug!("No project config found, using defaults");
    ProjectConfig::default()
}

fn load_toml_config(path: &Path) -> anyhow::Result<ProjectConfig> {
    let content = std::fs::read_to_string(path)?;
    let config: ProjectConfig = toml::from_str(&content)?;
    Ok(config)
}

fn load_json_config(path: &Path) -> anyhow::Result<ProjectConfig> {
    let content = std::fs::read_to_string(path)?;
    let config: ProjectConfig = serde_json::from_str(&content)?;
    Ok(config)
}
