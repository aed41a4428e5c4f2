//! Report writers
//!
//! Every report is validated against its schema before it is written:
//! - `doctor` - graph health and CI gate outcome
//! - `metrics` - graph size and degree summary
//! - `link-optimization` - planner and fairness audit log
//! - `auto-fix` - repair summary and change log
//! - `links` - selected neighbours per page
//!
//! Writes go through a temp file and a rename.

mod documents;
mod json;
mod schema;

pub use documents::{
    AutoFixReport, DoctorReport, GateStatus, LinkEntry, LinkOptimizationReport, LinksArtifact,
    Meta, MetricsReport, PlanParams, SCHEMA_VERSION,
};
pub use json::{render, report_fingerprint, strip_volatile, write_atomic};
pub use schema::validate;

use crate::error::{GeoError, GeoResult};
use serde::Serialize;
use serde_json::Value;
use std::path::Path;
use std::str::FromStr;
use tracing::{debug, info};

/// Report kinds with an embedded schema
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportKind {
    Doctor,
    Metrics,
    LinkOptimization,
    AutoFix,
    Links,
}

impl ReportKind {
    pub const ALL: [ReportKind; 5] = [
        ReportKind::Doctor,
        ReportKind::Metrics,
        ReportKind::LinkOptimization,
        ReportKind::AutoFix,
        ReportKind::Links,
    ];
}

impl FromStr for ReportKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "doctor" => Ok(ReportKind::Doctor),
            "metrics" => Ok(ReportKind::Metrics),
            "link-optimization" | "optimization" => Ok(ReportKind::LinkOptimization),
            "auto-fix" | "autofix" => Ok(ReportKind::AutoFix),
            "links" => Ok(ReportKind::Links),
            _ => Err(format!(
                "Unknown report '{}'. Valid reports: doctor, metrics, link-optimization, auto-fix, links",
                s
            )),
        }
    }
}

impl std::fmt::Display for ReportKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ReportKind::Doctor => write!(f, "doctor"),
            ReportKind::Metrics => write!(f, "metrics"),
            ReportKind::LinkOptimization => write!(f, "link-optimization"),
            ReportKind::AutoFix => write!(f, "auto-fix"),
            ReportKind::Links => write!(f, "links"),
        }
    }
}

/// A serialized report that passed its schema and is ready to write
#[derive(Debug, Clone)]
pub struct ValidatedReport {
    kind: ReportKind,
    value: Value,
}

impl ValidatedReport {
    pub fn kind(&self) -> ReportKind {
        self.kind
    }

    pub fn value(&self) -> &Value {
        &self.value
    }

    /// Atomically write the report and return its fingerprint
    pub fn write(&self, path: &Path) -> GeoResult<String> {
        write_atomic(path, render(&self.value).as_bytes())?;
        let fingerprint = report_fingerprint(&self.value);
        info!("Wrote {} report to {}", self.kind, path.display());
        debug!("{} fingerprint {}", self.kind, fingerprint);
        Ok(fingerprint)
    }
}

/// Serialize a report and validate it against its schema, without writing.
///
/// Commands that emit several files prepare all of them first, so a
/// rejected document leaves nothing new on disk.
pub fn prepare_report<T: Serialize>(kind: ReportKind, doc: &T) -> GeoResult<ValidatedReport> {
    let value = serde_json::to_value(doc).map_err(|e| GeoError::SchemaViolation {
        report: kind.to_string(),
        errors: vec![format!("cannot serialize report: {e}")],
    })?;
    validate(kind, &value)?;
    Ok(ValidatedReport { kind, value })
}

/// Serialize, validate and atomically write a report.
///
/// Returns the document's fingerprint. Nothing is written when validation
/// fails.
pub fn write_report<T: Serialize>(kind: ReportKind, doc: &T, path: &Path) -> GeoResult<String> {
    prepare_report(kind, doc)?.write(path)
}

/// Write a plain JSON artifact (no schema) such as the repaired adjacency
pub fn write_artifact(value: &Value, path: &Path) -> GeoResult<()> {
    write_atomic(path, render(value).as_bytes())?;
    info!("Wrote artifact {}", path.display());
    Ok(())
}
