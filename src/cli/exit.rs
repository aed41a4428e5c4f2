//! Process exit codes
//!
//! A stable contract for CI scripts. Gate failures use 4-7; when several
//! gates fail the lowest code wins.

use crate::error::GeoError;
use std::process::{ExitCode, Termination};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
#[repr(u8)]
pub enum GeoExit {
    /// Completed; every enabled gate passed.
    Success = 0,
    /// Generic error (I/O, unparsable input).
    Error = 1,
    /// A required dataset is missing.
    InputMissing = 2,
    /// A report failed schema validation and was not written.
    SchemaViolation = 3,
    /// Asymmetric pairs present while the reciprocity gate is on.
    Reciprocity = 4,
    /// More islands than the orphan threshold allows.
    Orphans = 5,
    /// A suburb is assigned to more than one cluster.
    DuplicateCluster = 6,
    /// Suburbs without a cluster, or clusters naming unknown suburbs.
    MissingCoverage = 7,
    /// A regenerated artifact differs from its baseline.
    Drift = 8,
}

impl GeoExit {
    #[must_use]
    pub fn code(self) -> u8 {
        self as u8
    }

    /// Map an error from the command layer to its exit code
    pub fn from_error(err: &anyhow::Error) -> Self {
        match err.downcast_ref::<GeoError>() {
            Some(GeoError::InputMissing { .. }) => GeoExit::InputMissing,
            Some(GeoError::SchemaViolation { .. }) => GeoExit::SchemaViolation,
            Some(GeoError::DriftDetected { .. }) => GeoExit::Drift,
            _ => GeoExit::Error,
        }
    }
}

impl Termination for GeoExit {
    fn report(self) -> ExitCode {
        ExitCode::from(self.code())
    }
}
