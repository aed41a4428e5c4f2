//! Inbound cap policies

use crate::models::CandidateMap;
use std::collections::BTreeMap;
use std::str::FromStr;

/// How the global inbound cap is chosen
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CapPolicy {
    /// No cap
    Unbounded,
    /// A fixed maximum inbound count per target
    Fixed(usize),
    /// `ceil(mean + stddev)` of the inbound distribution, at least 1
    Dynamic,
}

impl FromStr for CapPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "none" | "unbounded" | "inf" | "infinity" => Ok(CapPolicy::Unbounded),
            "dynamic" | "auto" => Ok(CapPolicy::Dynamic),
            other => other
                .parse::<usize>()
                .map(CapPolicy::Fixed)
                .map_err(|_| format!("'{}' is not a number, 'dynamic' or 'none'", s)),
        }
    }
}

impl std::fmt::Display for CapPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CapPolicy::Unbounded => write!(f, "none"),
            CapPolicy::Fixed(n) => write!(f, "{}", n),
            CapPolicy::Dynamic => write!(f, "dynamic"),
        }
    }
}

impl CapPolicy {
    /// Numeric cap for a planning pass over `candidates`; `None` = unbounded
    pub fn resolve(&self, candidates: &CandidateMap, max: usize) -> Option<usize> {
        match self {
            CapPolicy::Unbounded => None,
            CapPolicy::Fixed(n) => Some(*n),
            CapPolicy::Dynamic => Some(dynamic_cap(&naive_inbound(candidates, max))),
        }
    }
}

/// Inbound counts of the uncapped plan where every node takes its top `max`
/// candidates. Every node appears, zero counts included.
fn naive_inbound(candidates: &CandidateMap, max: usize) -> Vec<usize> {
    let mut counts: BTreeMap<&str, usize> =
        candidates.keys().map(|k| (k.as_str(), 0)).collect();
    for list in candidates.values() {
        for c in list.iter().take(max) {
            *counts.entry(c.target_slug.as_str()).or_insert(0) += 1;
        }
    }
    counts.into_values().collect()
}

/// `ceil(mean + population stddev)`, floored at 1
pub fn dynamic_cap(counts: &[usize]) -> usize {
    if counts.is_empty() {
        return 1;
    }
    let n = counts.len() as f64;
    let mean = counts.iter().sum::<usize>() as f64 / n;
    let variance = counts
        .iter()
        .map(|&c| {
            let d = c as f64 - mean;
            d * d
        })
        .sum::<f64>()
        / n;
    ((mean + variance.sqrt()).ceil() as usize).max(1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_policy() {
        assert_eq!("dynamic".parse::<CapPolicy>(), Ok(CapPolicy::Dynamic));
        assert_eq!("NONE".parse::<CapPolicy>(), Ok(CapPolicy::Unbounded));
        assert_eq!("4".parse::<CapPolicy>(), Ok(CapPolicy::Fixed(4)));
        assert!("lots".parse::<CapPolicy>().is_err());
    }

    #[test]
    fn test_dynamic_cap_uniform() {
        // mean 2, stddev 0
        assert_eq!(dynamic_cap(&[2, 2, 2, 2]), 2);
    }

    #[test]
    fn test_dynamic_cap_skewed() {
        // mean 1.25, variance 19.5 / 8 = 2.4375, stddev ~1.561
        assert_eq!(dynamic_cap(&[1, 1, 1, 2, 0, 0, 0, 5]), 3);
        assert_eq!(dynamic_cap(&[0, 0, 0, 5]), 4);
    }

    #[test]
    fn test_dynamic_cap_floor() {
        assert_eq!(dynamic_cap(&[]), 1);
        assert_eq!(dynamic_cap(&[0, 0]), 1);
    }
}
