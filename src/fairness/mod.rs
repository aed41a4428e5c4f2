//! Fairness auditor
//!
//! Measures how evenly inbound links are spread over an existing plan and
//! rebalances targets above the inbound cap by substituting or removing
//! the edges that point at them.

use crate::models::{inbound_counts, CandidateMap};
use crate::planner::InboundLedger;
use serde::Serialize;
use std::collections::BTreeMap;
use tracing::{debug, info};

pub const REASON_NO_REPLACEMENT: &str = "over-cap-no-replacement";

/// Summary metrics for one state of a plan
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlanMetrics {
    pub gini: f64,
    pub total_links: usize,
    pub max_inbound: usize,
    pub over_cap_targets: usize,
}

/// An over-cap edge swapped for another candidate
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Substitution {
    pub source: String,
    pub from: String,
    pub to: String,
    pub from_inbound_before: usize,
}

/// An over-cap edge dropped without replacement
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Removal {
    pub source: String,
    pub target: String,
    pub reason: String,
}

/// Result of an audit pass
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditOutcome {
    pub plan: BTreeMap<String, Vec<String>>,
    pub cap_used: Option<usize>,
    pub before: PlanMetrics,
    pub after: PlanMetrics,
    pub substitutions: Vec<Substitution>,
    pub removals: Vec<Removal>,
}

impl AuditOutcome {
    /// Metrics for a plan that is left as it is
    pub fn unchanged(plan: &BTreeMap<String, Vec<String>>, cap: Option<usize>) -> Self {
        let metrics = plan_metrics(plan, cap);
        Self {
            plan: plan.clone(),
            cap_used: cap,
            before: metrics.clone(),
            after: metrics,
            substitutions: Vec::new(),
            removals: Vec::new(),
        }
    }
}

/// Gini coefficient of a non-negative distribution.
///
/// `0` for an empty or all-zero input, otherwise in `[0, 1)`.
pub fn gini(values: &[usize]) -> f64 {
    let total: usize = values.iter().sum();
    if values.is_empty() || total == 0 {
        return 0.0;
    }
    let mut sorted = values.to_vec();
    sorted.sort_unstable();

    let n = sorted.len() as f64;
    let mut running = 0usize;
    let mut cumulative_sum = 0f64;
    for v in &sorted {
        running += v;
        cumulative_sum += running as f64;
    }
    let g = (n + 1.0 - 2.0 * cumulative_sum / total as f64) / n;
    g.clamp(0.0, 1.0)
}

/// Inbound count for every plan key and every target, zeros included
pub fn inbound_histogram(plan: &BTreeMap<String, Vec<String>>) -> BTreeMap<String, usize> {
    inbound_counts(plan)
}

pub fn plan_metrics(plan: &BTreeMap<String, Vec<String>>, cap: Option<usize>) -> PlanMetrics {
    let inbound = inbound_histogram(plan);
    let counts: Vec<usize> = inbound.values().copied().collect();
    PlanMetrics {
        gini: gini(&counts),
        total_links: plan.values().map(Vec::len).sum(),
        max_inbound: counts.iter().copied().max().unwrap_or(0),
        over_cap_targets: cap.map_or(0, |c| counts.iter().filter(|&&n| n > c).count()),
    }
}

/// Rebalance targets whose inbound count exceeds `cap`.
///
/// Targets are handled by inbound count desc. Their sources are visited by
/// out-degree desc (then slug), each one either swapping to its best unused
/// candidate that is under the cap, dropping the edge when it has more than
/// `min` links, or keeping it. A target is left alone once it reaches the
/// cap.
pub fn rebalance(
    plan: &BTreeMap<String, Vec<String>>,
    candidates: &CandidateMap,
    cap: Option<usize>,
    min: usize,
) -> AuditOutcome {
    let before = plan_metrics(plan, cap);
    let mut picks = plan.clone();
    let mut substitutions = Vec::new();
    let mut removals = Vec::new();

    if let Some(cap) = cap {
        let mut ledger = InboundLedger::from_plan(&picks, Some(cap));

        let mut over: Vec<(String, usize)> = ledger
            .counts()
            .iter()
            .filter(|&(_, &n)| n > cap)
            .map(|(t, &n)| (t.clone(), n))
            .collect();
        over.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        debug!("{} targets above inbound cap {}", over.len(), cap);

        for (target, _) in over {
            let mut sources: Vec<(String, usize)> = picks
                .iter()
                .filter(|(_, targets)| targets.contains(&target))
                .map(|(s, targets)| (s.clone(), targets.len()))
                .collect();
            sources.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));

            for (source, _) in sources {
                if !ledger.is_over_cap(&target) {
                    break;
                }
                let Some(list) = picks.get_mut(&source) else {
                    continue;
                };
                let Some(pos) = list.iter().position(|t| *t == target) else {
                    continue;
                };

                let replacement = candidates.get(&source).and_then(|cands| {
                    cands.iter().find(|c| {
                        c.target_slug != target
                            && c.target_slug != source
                            && !list.contains(&c.target_slug)
                            && ledger.has_room(&c.target_slug)
                    })
                });

                if let Some(c) = replacement {
                    let from_inbound_before = ledger.count(&target);
                    list[pos] = c.target_slug.clone();
                    ledger.release(&target);
                    ledger.record(&c.target_slug);
                    substitutions.push(Substitution {
                        source: source.clone(),
                        from: target.clone(),
                        to: c.target_slug.clone(),
                        from_inbound_before,
                    });
                } else if list.len() > min {
                    list.remove(pos);
                    ledger.release(&target);
                    removals.push(Removal {
                        source: source.clone(),
                        target: target.clone(),
                        reason: REASON_NO_REPLACEMENT.to_string(),
                    });
                }
            }
        }
    }

    let after = plan_metrics(&picks, cap);
    info!(
        "Audit: gini {:.4} -> {:.4}, {} substitutions, {} removals",
        before.gini,
        after.gini,
        substitutions.len(),
        removals.len()
    );

    AuditOutcome {
        plan: picks,
        cap_used: cap,
        before,
        after,
        substitutions,
        removals,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ScoredCandidate;

    fn cand(target: &str) -> ScoredCandidate {
        ScoredCandidate {
            target_slug: target.to_string(),
            score: 1.0,
            is_reciprocal: false,
            same_cluster: false,
            distance_km: None,
        }
    }

    /// Five sources all pointing at `x`
    fn crowded(with_alternatives: bool) -> (BTreeMap<String, Vec<String>>, CandidateMap) {
        let mut plan = BTreeMap::new();
        let mut candidates = CandidateMap::new();
        for i in 1..=5 {
            let source = format!("n{i}");
            let mut list = vec![cand("x")];
            if with_alternatives {
                list.push(cand(&format!("alt{i}")));
            }
            candidates.insert(source.clone(), list);
            plan.insert(source, vec!["x".to_string()]);
        }
        plan.insert("x".to_string(), Vec::new());
        (plan, candidates)
    }

    #[test]
    fn test_gini_bounds() {
        assert_eq!(gini(&[]), 0.0);
        assert_eq!(gini(&[0, 0, 0]), 0.0);
        assert!(gini(&[3, 3, 3, 3]).abs() < 1e-12);
        let g = gini(&[0, 0, 0, 1]);
        assert!((g - 0.75).abs() < 1e-12, "gini={g}");
        for v in [vec![1, 2, 3], vec![0, 10], vec![5, 0, 0, 0, 0, 0, 9]] {
            let g = gini(&v);
            assert!((0.0..=1.0).contains(&g), "gini({v:?})={g}");
        }
    }

    #[test]
    fn test_gini_ignores_order() {
        assert_eq!(gini(&[5, 1, 3]), gini(&[1, 3, 5]));
    }

    #[test]
    fn test_histogram_includes_zero_keys() {
        let (plan, _) = crowded(false);
        let hist = inbound_histogram(&plan);
        assert_eq!(hist["x"], 5);
        assert_eq!(hist["n1"], 0);
        assert_eq!(hist.len(), 6);
    }

    #[test]
    fn test_crowded_target_brought_under_cap() {
        let (plan, candidates) = crowded(true);
        let outcome = rebalance(&plan, &candidates, Some(2), 1);

        assert!(inbound_histogram(&outcome.plan)["x"] <= 2);
        assert_eq!(outcome.substitutions.len() + outcome.removals.len(), 3);
        assert_eq!(outcome.substitutions[0].source, "n1");
        assert_eq!(outcome.substitutions[0].to, "alt1");
        assert_eq!(outcome.substitutions[0].from_inbound_before, 5);
        assert_eq!(outcome.substitutions[2].from_inbound_before, 3);
        assert_eq!(outcome.before.max_inbound, 5);
        assert_eq!(outcome.after.max_inbound, 2);
        assert_eq!(outcome.after.over_cap_targets, 0);
        assert!(outcome.after.gini < outcome.before.gini);
        assert_eq!(outcome.before.total_links, outcome.after.total_links);
    }

    #[test]
    fn test_removal_when_no_replacement() {
        let (plan, candidates) = crowded(false);
        let outcome = rebalance(&plan, &candidates, Some(2), 0);

        assert!(outcome.substitutions.is_empty());
        assert_eq!(outcome.removals.len(), 3);
        assert_eq!(outcome.removals[0].reason, REASON_NO_REPLACEMENT);
        assert_eq!(outcome.after.total_links, 2);
        assert_eq!(inbound_histogram(&outcome.plan)["x"], 2);
    }

    #[test]
    fn test_min_protects_edges() {
        let (plan, candidates) = crowded(false);
        let outcome = rebalance(&plan, &candidates, Some(2), 1);

        assert!(outcome.substitutions.is_empty());
        assert!(outcome.removals.is_empty());
        assert_eq!(outcome.plan, plan);
        assert_eq!(outcome.after.over_cap_targets, 1);
    }

    #[test]
    fn test_sources_with_more_links_go_first() {
        let (mut plan, mut candidates) = crowded(true);
        plan.insert("n5".into(), vec!["x".into(), "n1".into()]);
        candidates.insert("n5".into(), vec![cand("x"), cand("n1"), cand("alt5")]);

        let outcome = rebalance(&plan, &candidates, Some(4), 0);
        assert_eq!(outcome.substitutions.len(), 1);
        assert_eq!(outcome.substitutions[0].source, "n5");
        assert_eq!(outcome.plan["n5"], vec!["alt5", "n1"]);
    }

    #[test]
    fn test_unchanged_keeps_cap_and_counts_over_cap() {
        let (plan, _) = crowded(false);
        let outcome = AuditOutcome::unchanged(&plan, Some(2));
        assert_eq!(outcome.cap_used, Some(2));
        assert_eq!(outcome.after.over_cap_targets, 1);
        assert!(outcome.substitutions.is_empty());
    }

    #[test]
    fn test_unbounded_cap_is_a_no_op() {
        let (plan, candidates) = crowded(true);
        let outcome = rebalance(&plan, &candidates, None, 0);
        assert_eq!(outcome.plan, plan);
        assert_eq!(outcome.before, outcome.after);
        assert_eq!(outcome.after.over_cap_targets, 0);
    }
}
