//! CLI command definitions and handlers

mod doctor;
mod drift;
pub mod exit;
mod fix;
mod gate;
mod metrics;
mod plan;

use crate::config::{load_project_config, CliOverrides, EngineConfig};
use crate::graph::{normalize, ClusterIndex, Normalized};
use crate::inputs::{load_inputs, Inputs};
use crate::models::Coordinates;
use crate::planner::CapPolicy;
use anyhow::Result;
use clap::{Parser, Subcommand};
use exit::GeoExit;
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::time::Instant;
use tracing::info;

/// Parse an inbound cap: a number, `dynamic` or `none`
fn parse_cap(s: &str) -> Result<CapPolicy, String> {
    s.parse()
}

/// geolink - geo link-graph diagnostics and internal-link planning
#[derive(Parser, Debug)]
#[command(name = "geolink")]
#[command(
    version,
    about = "Diagnose, repair and plan the internal link graph of a local-services site",
    long_about = "geolink reads a suburb adjacency graph, diagnoses its health, repairs \
missing reciprocity and isolated suburbs, and selects a bounded, fair set of \
neighbour links per page. Every report is schema-validated and deterministic, \
so CI can gate on exit codes and drift hashes.",
    after_help = "\
Examples:
  geolink doctor --data src/data              Graph health report + CI gate
  geolink doctor --strict                     Dynamic cap, fail on asymmetry/orphans
  geolink plan --max 6 --cap dynamic          Plan links under a fairness cap
  geolink fix --write-adjacency out/adj.json  Repair reciprocity and islands
  geolink drift out/links.json --baseline links.sha256

Exit codes:
  0 ok, 1 error, 2 input missing, 3 schema violation, 4 reciprocity,
  5 orphans, 6 duplicate cluster, 7 missing coverage, 8 drift"
)]
pub struct Cli {
    /// Directory holding the datasets and geolink.toml
    #[arg(long, global = true, default_value = ".", env = "GEOLINK_DATA")]
    pub data: PathBuf,

    /// Explicit config file (default: geolink.toml or .geolinkrc.json in --data)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Log level (error, warn, info, debug, trace); RUST_LOG takes precedence
    #[arg(long, global = true, default_value = "warn", value_parser = ["error", "warn", "info", "debug", "trace"])]
    pub log_level: String,

    /// Maximum links per page
    #[arg(long, global = true)]
    pub max: Option<usize>,

    /// Minimum links per page (default: min(3, max))
    #[arg(long, global = true)]
    pub min: Option<usize>,

    /// Global inbound cap: a number, `dynamic` or `none`
    #[arg(long, global = true, value_parser = parse_cap)]
    pub cap: Option<CapPolicy>,

    /// Only consider candidates that already link back
    #[arg(long, global = true)]
    pub enforce_reciprocity: bool,

    /// Strict CI mode: dynamic cap, fail on asymmetry, orphans and cluster findings
    #[arg(long, global = true)]
    pub strict: bool,

    /// Fail when more than this many islands exist
    #[arg(long, global = true)]
    pub max_orphans: Option<usize>,

    /// Fail when any asymmetric pair exists
    #[arg(long, global = true)]
    pub fail_on_asymmetry: bool,

    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    fn overrides(&self) -> CliOverrides {
        CliOverrides {
            max: self.max,
            min: self.min,
            cap: self.cap.clone(),
            enforce_reciprocity: self.enforce_reciprocity,
            strict: self.strict,
            max_orphans: self.max_orphans,
            fail_on_asymmetry: self.fail_on_asymmetry,
        }
    }
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Diagnose graph health and apply the CI gate
    Doctor {
        /// Report path
        #[arg(long, default_value = "reports/doctor.json")]
        out: PathBuf,
    },

    /// Summarize graph size, clusters and degrees
    Metrics {
        /// Report path
        #[arg(long, default_value = "reports/metrics.json")]
        out: PathBuf,
    },

    /// Score candidates, plan links and rebalance over-subscribed targets
    Plan {
        /// Selected links artifact
        #[arg(long, default_value = "out/links.json")]
        links: PathBuf,

        /// Report path
        #[arg(long, default_value = "reports/link-optimization.json")]
        out: PathBuf,

        /// Skip the fairness rebalancing pass
        #[arg(long)]
        no_audit: bool,
    },

    /// Repair one-way edges and island suburbs
    Fix {
        /// Where to write the repaired adjacency
        #[arg(long, default_value = "out/areas.adj.json", conflicts_with = "in_place")]
        write_adjacency: PathBuf,

        /// Overwrite the input adjacency dataset instead
        #[arg(long)]
        in_place: bool,

        /// Report path
        #[arg(long, default_value = "reports/auto-fix.json")]
        out: PathBuf,
    },

    /// Compare a file's fingerprint with a baseline hash (exit 8 on mismatch)
    Drift {
        /// Report or artifact to check
        file: PathBuf,

        /// Expected fingerprint, or a file holding it (or the baseline artifact)
        #[arg(long)]
        baseline: String,
    },

    /// Print the fingerprint of a report or artifact
    Hash {
        /// Report or artifact to hash
        file: PathBuf,
    },
}

/// Run a parsed command
pub fn run(cli: Cli) -> Result<GeoExit> {
    match &cli.command {
        Commands::Doctor { out } => doctor::run(&cli, out),
        Commands::Metrics { out } => metrics::run(&cli, out),
        Commands::Plan {
            links,
            out,
            no_audit,
        } => plan::run(&cli, links, out, *no_audit),
        Commands::Fix {
            write_adjacency,
            in_place,
            out,
        } => fix::run(&cli, write_adjacency, *in_place, out),
        Commands::Drift { file, baseline } => drift::run(file, baseline),
        Commands::Hash { file } => drift::hash(file),
    }
}

/// Elapsed time per phase, logged as each phase finishes
#[derive(Debug, Default)]
pub(crate) struct Phases {
    timings: BTreeMap<String, u64>,
}

impl Phases {
    pub fn run<T>(&mut self, name: &str, f: impl FnOnce() -> T) -> T {
        let start = Instant::now();
        let out = f();
        let ms = start.elapsed().as_millis() as u64;
        info!("{} done in {}ms", name, ms);
        self.timings.insert(name.to_string(), ms);
        out
    }

    /// Record sub-step timings measured inside a phase as `phase.step`
    pub fn extend(&mut self, phase: &str, steps: &BTreeMap<String, u64>) {
        for (step, ms) in steps {
            self.timings.insert(format!("{phase}.{step}"), *ms);
        }
    }

    pub fn timings(&self) -> BTreeMap<String, u64> {
        self.timings.clone()
    }
}

/// Everything a command needs: resolved config, datasets, the normalized
/// graph and its cluster index
pub(crate) struct Workspace {
    pub config: EngineConfig,
    pub inputs: Inputs,
    pub graph: Normalized,
    pub clusters: ClusterIndex,
    pub coords: BTreeMap<String, Coordinates>,
    pub phases: Phases,
}

impl Workspace {
    pub fn load(cli: &Cli) -> Result<Self> {
        let file_config = load_project_config(&cli.data, cli.config.as_deref());
        let config = EngineConfig::resolve(&file_config, &cli.overrides(), &cli.data);

        let mut phases = Phases::default();
        let inputs = phases.run("load", || load_inputs(&config.inputs))?;
        let graph = phases.run("normalize", || normalize(&inputs.raw_adjacency));
        let clusters = ClusterIndex::build(&inputs.clusters, &graph.adjacency, &inputs.suburbs);
        let coords = inputs.coordinates();

        Ok(Self {
            config,
            inputs,
            graph,
            clusters,
            coords,
            phases,
        })
    }
}
