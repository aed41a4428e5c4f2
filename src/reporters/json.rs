//! JSON rendering and persistence
//!
//! Reports are rendered as pretty JSON with sorted object keys and a
//! trailing newline, so identical content is byte-identical on disk.

use crate::error::{GeoError, GeoResult};
use crate::hashing::canonical_hash;
use serde_json::Value;
use std::fs;
use std::io::Write;
use std::path::Path;

/// Keys that carry observability data only and never take part in drift checks
pub const VOLATILE_KEYS: &[&str] = &["generatedAt", "timings"];

/// Render as pretty JSON with sorted keys
pub fn render(value: &Value) -> String {
    // key order comes from `serde_json::Map`, as in `hashing::canonical_json`
    let mut out = serde_json::to_string_pretty(value).unwrap_or_else(|_| "null".to_string());
    out.push('\n');
    out
}

/// Write `contents` to `path` through a sibling temp file and a rename, so a
/// reader never sees a partially written file.
pub fn write_atomic(path: &Path, contents: &[u8]) -> GeoResult<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|e| GeoError::io(parent, e))?;
    }

    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "report.json".to_string());
    let tmp = path.with_file_name(format!(".{}.{}.tmp", file_name, std::process::id()));

    let mut file = fs::File::create(&tmp).map_err(|e| GeoError::io(&tmp, e))?;
    file.write_all(contents).map_err(|e| GeoError::io(&tmp, e))?;
    file.sync_all().map_err(|e| GeoError::io(&tmp, e))?;
    drop(file);

    fs::rename(&tmp, path).map_err(|e| {
        let _ = fs::remove_file(&tmp);
        GeoError::io(path, e)
    })
}

/// Copy of `value` with every volatile key removed at any depth
pub fn strip_volatile(value: &Value) -> Value {
    match value {
        Value::Object(map) => Value::Object(
            map.iter()
                .filter(|(k, _)| !VOLATILE_KEYS.contains(&k.as_str()))
                .map(|(k, v)| (k.clone(), strip_volatile(v)))
                .collect(),
        ),
        Value::Array(items) => Value::Array(items.iter().map(strip_volatile).collect()),
        other => other.clone(),
    }
}

/// Stable hash of a report or artifact, ignoring timestamps and timings
pub fn report_fingerprint(value: &Value) -> String {
    canonical_hash(&strip_volatile(value))
}
