//! Error taxonomy for geolink
//!
//! Only I/O and contract failures are errors. Data-quality problems travel
//! as [`crate::models::Finding`] values and never abort a computation.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that abort a run
#[derive(Error, Debug)]
pub enum GeoError {
    #[error("Required {dataset} dataset not found at {}", path.display())]
    InputMissing { dataset: String, path: PathBuf },

    #[error("Failed to parse {}: {reason}", path.display())]
    InputParse { path: PathBuf, reason: String },

    #[error("IO error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{report} report failed schema validation: {}", errors.join("; "))]
    SchemaViolation { report: String, errors: Vec<String> },

    #[error("Drift detected in {artifact}: expected {expected}, got {actual}")]
    DriftDetected {
        artifact: String,
        expected: String,
        actual: String,
    },
}

pub type GeoResult<T> = Result<T, GeoError>;

impl GeoError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        GeoError::Io {
            path: path.into(),
            source,
        }
    }
}
