//! Inbound link counters shared by the planning phases

use std::collections::BTreeMap;

/// Inbound count per target plus the cap they are checked against.
///
/// Owned by a single planning or auditing call and passed by `&mut`
/// through its phases; never global.
#[derive(Debug, Clone, Default)]
pub struct InboundLedger {
    counts: BTreeMap<String, usize>,
    cap: Option<usize>,
}

impl InboundLedger {
    pub fn new(cap: Option<usize>) -> Self {
        Self {
            counts: BTreeMap::new(),
            cap,
        }
    }

    /// Seed the ledger from an existing plan
    pub fn from_plan(plan: &BTreeMap<String, Vec<String>>, cap: Option<usize>) -> Self {
        let mut ledger = Self::new(cap);
        for targets in plan.values() {
            for t in targets {
                ledger.record(t);
            }
        }
        ledger
    }

    pub fn cap(&self) -> Option<usize> {
        self.cap
    }

    pub fn count(&self, target: &str) -> usize {
        self.counts.get(target).copied().unwrap_or(0)
    }

    /// True while the target is strictly below the cap
    pub fn has_room(&self, target: &str) -> bool {
        match self.cap {
            Some(cap) => self.count(target) < cap,
            None => true,
        }
    }

    pub fn is_over_cap(&self, target: &str) -> bool {
        self.cap.is_some_and(|cap| self.count(target) > cap)
    }

    pub fn record(&mut self, target: &str) -> usize {
        let count = self.counts.entry(target.to_string()).or_insert(0);
        *count += 1;
        *count
    }

    pub fn release(&mut self, target: &str) {
        if let Some(count) = self.counts.get_mut(target) {
            *count = count.saturating_sub(1);
        }
    }

    pub fn counts(&self) -> &BTreeMap<String, usize> {
        &self.counts
    }
}
