//! Dataset loading
//!
//! Reads the adjacency, cluster and suburb datasets named by the resolved
//! [`InputPaths`]. The adjacency dataset is required; a missing cluster or
//! suburb file is treated as empty. Malformed adjacency entries are coerced,
//! not rejected.

use crate::config::InputPaths;
use crate::error::{GeoError, GeoResult};
use crate::graph::ClusterSource;
use crate::hashing::sha256_hex;
use crate::models::{Coordinates, Suburb};
use serde::Deserialize;
use serde_json::Value;
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use tracing::{debug, info};

/// Raw datasets plus the hash of every file that was read
#[derive(Debug, Clone, Default)]
pub struct Inputs {
    /// Un-normalized adjacency, as read
    pub raw_adjacency: BTreeMap<String, Vec<String>>,
    pub clusters: ClusterSource,
    /// Suburb metadata keyed by normalized slug
    pub suburbs: BTreeMap<String, Suburb>,
    /// dataset name -> SHA-256 of the raw bytes
    pub hashes: BTreeMap<String, String>,
}

impl Inputs {
    /// Coordinates of every suburb that has them
    pub fn coordinates(&self) -> BTreeMap<String, Coordinates> {
        self.suburbs
            .iter()
            .filter_map(|(slug, s)| s.coordinates.map(|c| (slug.clone(), c)))
            .collect()
    }
}

/// Suburb metadata as either a slug-keyed map or a list of records
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum SuburbSource {
    Mapped(BTreeMap<String, Suburb>),
    Listed(Vec<Suburb>),
}

/// Load every dataset. Fails before any computation when the adjacency
/// dataset is absent.
pub fn load_inputs(paths: &InputPaths) -> GeoResult<Inputs> {
    if !paths.adjacency.exists() {
        return Err(GeoError::InputMissing {
            dataset: "adjacency".to_string(),
            path: paths.adjacency.clone(),
        });
    }

    let mut hashes = BTreeMap::new();

    let bytes = read(&paths.adjacency)?;
    hashes.insert("adjacency".to_string(), sha256_hex(&bytes));
    let raw_adjacency = parse_adjacency(&paths.adjacency, &bytes)?;

    let clusters = match read_optional(&paths.clusters)? {
        Some(bytes) => {
            hashes.insert("clusters".to_string(), sha256_hex(&bytes));
            serde_json::from_slice(&bytes).map_err(|e| GeoError::InputParse {
                path: paths.clusters.clone(),
                reason: e.to_string(),
            })?
        }
        None => ClusterSource::default(),
    };

    let suburbs = match read_optional(&paths.suburbs)? {
        Some(bytes) => {
            hashes.insert("suburbs".to_string(), sha256_hex(&bytes));
            parse_suburbs(&paths.suburbs, &bytes)?
        }
        None => BTreeMap::new(),
    };

    info!(
        "Loaded {} adjacency entries, {} suburb records",
        raw_adjacency.len(),
        suburbs.len()
    );

    Ok(Inputs {
        raw_adjacency,
        clusters,
        suburbs,
        hashes,
    })
}

fn read(path: &Path) -> GeoResult<Vec<u8>> {
    fs::read(path).map_err(|e| GeoError::io(path, e))
}

fn read_optional(path: &Path) -> GeoResult<Option<Vec<u8>>> {
    if !path.exists() {
        debug!("Optional dataset {} not found", path.display());
        return Ok(None);
    }
    read(path).map(Some)
}

/// Parse `slug -> [slug, ...]`. Non-array values become empty lists and
/// non-string members are skipped.
pub fn parse_adjacency(path: &Path, bytes: &[u8]) -> GeoResult<BTreeMap<String, Vec<String>>> {
    let value: Value = serde_json::from_slice(bytes).map_err(|e| GeoError::InputParse {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })?;
    let Value::Object(map) = value else {
        return Err(GeoError::InputParse {
            path: path.to_path_buf(),
            reason: "expected an object of slug -> [slug]".to_string(),
        });
    };

    let mut coerced = 0usize;
    let adjacency = map
        .into_iter()
        .map(|(source, targets)| {
            let list: Vec<String> = match targets {
                Value::Array(items) => items
                    .into_iter()
                    .filter_map(|v| match v {
                        Value::String(s) => Some(s),
                        _ => {
                            coerced += 1;
                            None
                        }
                    })
                    .collect(),
                _ => {
                    coerced += 1;
                    Vec::new()
                }
            };
            (source, list)
        })
        .collect();
    if coerced > 0 {
        debug!("Coerced {} malformed adjacency values", coerced);
    }
    Ok(adjacency)
}

fn parse_suburbs(path: &Path, bytes: &[u8]) -> GeoResult<BTreeMap<String, Suburb>> {
    let source: SuburbSource = serde_json::from_slice(bytes).map_err(|e| GeoError::InputParse {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })?;

    let records: Vec<(String, Suburb)> = match source {
        SuburbSource::Mapped(map) => map.into_iter().collect(),
        SuburbSource::Listed(list) => list.into_iter().map(|s| (s.slug.clone(), s)).collect(),
    };

    Ok(records
        .into_iter()
        .filter_map(|(key, mut suburb)| {
            let slug = key.trim().to_lowercase();
            if slug.is_empty() {
                return None;
            }
            suburb.slug = slug.clone();
            Some((slug, suburb))
        })
        .collect())
}
