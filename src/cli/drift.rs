//! Drift and hash commands - freshness guards for committed artifacts

use super::exit::GeoExit;
use crate::error::GeoError;
use crate::reporters::report_fingerprint;
use anyhow::{Context, Result};
use serde_json::Value;
use std::fs;
use std::path::Path;
use tracing::debug;

/// Fingerprint of a JSON file, ignoring `generatedAt` and `timings`
pub fn fingerprint_file(path: &Path) -> Result<String> {
    let content =
        fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    let value: Value = serde_json::from_str(&content).map_err(|e| GeoError::InputParse {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })?;
    Ok(report_fingerprint(&value))
}

/// Resolve `--baseline`: a hex fingerprint, a file holding one, or a
/// baseline JSON artifact to fingerprint
fn resolve_baseline(baseline: &str) -> Result<String> {
    let path = Path::new(baseline);
    if !path.is_file() {
        return Ok(baseline.trim().to_lowercase());
    }
    let content =
        fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    match serde_json::from_str::<Value>(&content) {
        Ok(Value::String(hash)) => Ok(hash.trim().to_lowercase()),
        Ok(value) => Ok(report_fingerprint(&value)),
        // plain text, e.g. `sha256  links.json` or just the hash
        Err(_) => Ok(content
            .split_whitespace()
            .next()
            .unwrap_or_default()
            .to_lowercase()),
    }
}

pub fn run(file: &Path, baseline: &str) -> Result<GeoExit> {
    let actual = fingerprint_file(file)?;
    let expected = resolve_baseline(baseline)?;
    debug!("drift check {}: expected {}, actual {}", file.display(), expected, actual);

    if actual != expected {
        return Err(GeoError::DriftDetected {
            artifact: file.display().to_string(),
            expected,
            actual,
        }
        .into());
    }
    println!("{} {}", actual, file.display());
    Ok(GeoExit::Success)
}

pub fn hash(file: &Path) -> Result<GeoExit> {
    println!("{}", fingerprint_file(file)?);
    Ok(GeoExit::Success)
}
