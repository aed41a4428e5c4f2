//! Report schema validation
//!
//! Each report kind has a JSON Schema (draft 2020-12) compiled into the
//! binary. A report that fails its schema is never written.

use super::ReportKind;
use crate::error::{GeoError, GeoResult};
use jsonschema::Draft;
use serde_json::Value;

fn schema_source(kind: ReportKind) -> &'static str {
    match kind {
        ReportKind::Doctor => include_str!("../../schemas/doctor.schema.json"),
        ReportKind::Metrics => include_str!("../../schemas/metrics.schema.json"),
        ReportKind::LinkOptimization => {
            include_str!("../../schemas/link-optimization.schema.json")
        }
        ReportKind::AutoFix => include_str!("../../schemas/auto-fix.schema.json"),
        ReportKind::Links => include_str!("../../schemas/links.schema.json"),
    }
}

/// Validate `doc` against the schema of `kind`
pub fn validate(kind: ReportKind, doc: &Value) -> GeoResult<()> {
    let violation = |errors: Vec<String>| GeoError::SchemaViolation {
        report: kind.to_string(),
        errors,
    };

    let schema: Value = serde_json::from_str(schema_source(kind))
        .map_err(|e| violation(vec![format!("embedded schema is not JSON: {e}")]))?;
    let validator = jsonschema::options()
        .with_draft(Draft::Draft202012)
        .build(&schema)
        .map_err(|e| violation(vec![format!("embedded schema is invalid: {e}")]))?;

    let errors: Vec<String> = validator.iter_errors(doc).map(|e| e.to_string()).collect();
    if errors.is_empty() {
        Ok(())
    } else {
        Err(violation(errors))
    }
}
