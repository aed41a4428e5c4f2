//! Neighbor planner
//!
//! Selects at most `max` outbound links per page under a global inbound cap.
//!
//! # Algorithm
//!
//! 1. **Bounded round-robin.** For up to `max` rounds, visit every node in
//!    key order and give it at most one pick: its best candidate not yet
//!    picked that is still below the cap. Stops early at a fixed point.
//! 2. **Minimum backfill.** Nodes still below `min` take further candidates
//!    with the cap lifted. Every such pick is recorded as a [`Relaxation`].
//!    Nodes that run out of candidates are recorded as a [`Shortfall`].
//! 3. **Reciprocity backfill** (only with `enforce_reciprocity`). For each
//!    selected `u -> v` without `v -> u`, add `v -> u` if `v` is below `max`
//!    and `u` is below the cap; otherwise skip.
//!
//! Every phase walks keys in sorted order, so identical input always gives
//! byte-identical output.

mod cap;
mod ledger;

pub use cap::{dynamic_cap, CapPolicy};
pub use ledger::InboundLedger;

use crate::config::NeighborPolicy;
use crate::models::{inbound_counts, CandidateMap, Finding, FindingCode, Severity};
use serde::Serialize;
use std::collections::BTreeMap;
use tracing::{debug, info, warn};

/// Inbound cap lifted to satisfy a node's `min`
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Relaxation {
    pub source: String,
    pub target: String,
    /// Target inbound count after this pick
    pub inbound_after: usize,
    pub cap: Option<usize>,
}

/// A node that could not reach `min` even with the cap lifted
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Shortfall {
    pub node: String,
    pub picks: usize,
    pub min: usize,
}

/// The selected links for every node
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LinkPlan {
    /// node -> ordered target slugs
    pub picks: BTreeMap<String, Vec<String>>,
    /// Cap the plan was built against; `None` = unbounded
    pub cap_used: Option<usize>,
    pub relaxations: Vec<Relaxation>,
    pub shortfalls: Vec<Shortfall>,
    /// `(from, to)` links added by the reciprocity phase
    pub reciprocal_added: Vec<(String, String)>,
    /// Round-robin rounds that added at least one pick
    pub rounds: usize,
}

impl LinkPlan {
    pub fn inbound(&self) -> BTreeMap<String, usize> {
        inbound_counts(&self.picks)
    }

    pub fn total_links(&self) -> usize {
        self.picks.values().map(Vec::len).sum()
    }

    /// Cap relaxations and unmet minimums as findings
    pub fn findings(&self) -> Vec<Finding> {
        let mut findings = Vec::new();
        if !self.relaxations.is_empty() {
            findings.push(
                Finding::new(
                    FindingCode::CapRelaxed,
                    Severity::Info,
                    format!(
                        "Inbound cap relaxed {} times to reach the minimum link count",
                        self.relaxations.len()
                    ),
                )
                .with_subjects(
                    self.relaxations
                        .iter()
                        .map(|r| format!("{} -> {}", r.source, r.target)),
                ),
            );
        }
        if !self.shortfalls.is_empty() {
            findings.push(
                Finding::new(
                    FindingCode::MinUnreachable,
                    Severity::Warning,
                    format!(
                        "{} nodes have fewer links than the minimum",
                        self.shortfalls.len()
                    ),
                )
                .with_subjects(self.shortfalls.iter().map(|s| s.node.clone())),
            );
        }
        findings
    }
}

/// Build a link plan from scored candidates
pub fn plan_links(candidates: &CandidateMap, policy: &NeighborPolicy) -> LinkPlan {
    let cap = policy.cap.resolve(candidates, policy.max);
    let mut ledger = InboundLedger::new(cap);
    let mut plan = LinkPlan {
        picks: candidates.keys().map(|k| (k.clone(), Vec::new())).collect(),
        cap_used: cap,
        ..Default::default()
    };

    plan.rounds = round_robin(candidates, policy.max, &mut ledger, &mut plan.picks);
    debug!(
        "Round-robin settled after {} rounds with {} links",
        plan.rounds,
        plan.total_links()
    );

    let min = policy.min.min(policy.max);
    backfill_minimum(candidates, min, &mut ledger, &mut plan);

    if policy.enforce_reciprocity {
        backfill_reciprocity(policy.max, &mut ledger, &mut plan);
    }

    if !plan.relaxations.is_empty() {
        warn!(
            "Inbound cap {:?} relaxed {} times to satisfy min={}",
            cap,
            plan.relaxations.len(),
            min
        );
    }
    info!(
        "Planned {} links for {} nodes (cap={}, relaxations={}, shortfalls={})",
        plan.total_links(),
        plan.picks.len(),
        cap.map_or_else(|| "none".to_string(), |c| c.to_string()),
        plan.relaxations.len(),
        plan.shortfalls.len()
    );

    plan
}

/// Phase 1. Returns the number of rounds that added at least one pick.
fn round_robin(
    candidates: &CandidateMap,
    max: usize,
    ledger: &mut InboundLedger,
    picks: &mut BTreeMap<String, Vec<String>>,
) -> usize {
    let mut productive_rounds = 0;
    for _round in 1..=max {
        let mut added = 0;
        for (node, list) in candidates {
            let Some(chosen) = picks.get_mut(node) else {
                continue;
            };
            if chosen.len() >= max {
                continue;
            }
            let next = list.iter().find(|c| {
                c.target_slug != *node
                    && !chosen.contains(&c.target_slug)
                    && ledger.has_room(&c.target_slug)
            });
            if let Some(c) = next {
                ledger.record(&c.target_slug);
                chosen.push(c.target_slug.clone());
                added += 1;
            }
        }
        if added == 0 {
            break;
        }
        productive_rounds += 1;
    }
    productive_rounds
}

/// Phase 2: lift the cap for nodes below `min`, recording every pick
fn backfill_minimum(
    candidates: &CandidateMap,
    min: usize,
    ledger: &mut InboundLedger,
    plan: &mut LinkPlan,
) {
    for (node, list) in candidates {
        let Some(chosen) = plan.picks.get_mut(node) else {
            continue;
        };
        for c in list {
            if chosen.len() >= min {
                break;
            }
            if c.target_slug == *node || chosen.contains(&c.target_slug) {
                continue;
            }
            let inbound_after = ledger.record(&c.target_slug);
            chosen.push(c.target_slug.clone());
            plan.relaxations.push(Relaxation {
                source: node.clone(),
                target: c.target_slug.clone(),
                inbound_after,
                cap: ledger.cap(),
            });
        }
        if chosen.len() < min {
            plan.shortfalls.push(Shortfall {
                node: node.clone(),
                picks: chosen.len(),
                min,
            });
        }
    }
}

/// Phase 3: add missing back-links where `max` and the cap allow
fn backfill_reciprocity(max: usize, ledger: &mut InboundLedger, plan: &mut LinkPlan) {
    let edges: Vec<(String, String)> = plan
        .picks
        .iter()
        .flat_map(|(u, targets)| targets.iter().map(move |v| (u.clone(), v.clone())))
        .collect();

    for (u, v) in edges {
        if u == v {
            continue;
        }
        let Some(back) = plan.picks.get_mut(&v) else {
            continue;
        };
        if back.contains(&u) || back.len() >= max || !ledger.has_room(&u) {
            continue;
        }
        ledger.record(&u);
        back.push(u.clone());
        plan.reciprocal_added.push((v, u));
    }
}
