//! # Statistics Aggregator
//! Process-wide counters for decisions and deliveries.
//!
//! The aggregator is the only shared mutable state in the core. Every
//! completed request records exactly one atomic unit: `total`, the
//! per-outcome counter, and exactly one of delivered/blocked/failed, all
//! under a single mutex acquisition so a snapshot can never observe a torn
//! update.

use std::collections::HashMap;
use std::sync::Mutex;

use serde::Serialize;

use crate::decision::Outcome;
use crate::delivery::DeliveryStatus;

/// Thread-safe counters. Constructed once at process start and handed to
/// request handlers as an `Arc`; never persisted.
#[derive(Debug, Default)]
pub struct StatsAggregator {
    inner: Mutex<Counters>,
}

#[derive(Debug, Default, Clone)]
struct Counters {
    total: u64,
    delivered: u64,
    blocked: u64,
    failed: u64,
    // Indexed by Outcome::ALL order.
    by_outcome: [u64; 4],
}

/// Consistent point-in-time copy of the counters.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct StatsSnapshot {
    pub total: u64,
    pub delivered: u64,
    pub blocked: u64,
    pub failed: u64,
    pub by_outcome: HashMap<&'static str, u64>,
}

impl StatsSnapshot {
    /// Delivered share of all attempts, as a percentage.
    pub fn success_rate(&self) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            self.delivered as f64 / self.total as f64 * 100.0
        }
    }
}

fn outcome_index(outcome: Outcome) -> usize {
    Outcome::ALL
        .iter()
        .position(|&o| o == outcome)
        .expect("outcome present in ALL")
}

impl StatsAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one completed request: increments `total`, the outcome counter,
    /// and the counter matching `status`, as one atomic unit.
    pub fn record(&self, outcome: Outcome, status: DeliveryStatus) {
        let mut c = self.inner.lock().expect("stats mutex poisoned");
        c.total += 1;
        c.by_outcome[outcome_index(outcome)] += 1;
        match status {
            DeliveryStatus::Delivered => c.delivered += 1,
            DeliveryStatus::Blocked => c.blocked += 1,
            DeliveryStatus::Failed => c.failed += 1,
        }
    }

    /// Consistent read of all counters.
    pub fn snapshot(&self) -> StatsSnapshot {
        let c = self.inner.lock().expect("stats mutex poisoned").clone();
        let by_outcome = Outcome::ALL
            .iter()
            .map(|&o| (o.as_str(), c.by_outcome[outcome_index(o)]))
            .collect();
        StatsSnapshot {
            total: c.total,
            delivered: c.delivered,
            blocked: c.blocked,
            failed: c.failed,
            by_outcome,
        }
    }

    /// Zero all counters (admin reset).
    pub fn reset(&self) {
        let mut c = self.inner.lock().expect("stats mutex poisoned");
        *c = Counters::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn record_keeps_invariants() {
        let stats = StatsAggregator::new();
        stats.record(Outcome::Clean, DeliveryStatus::Delivered);
        stats.record(Outcome::Blocked, DeliveryStatus::Blocked);
        stats.record(Outcome::ContentWarning, DeliveryStatus::Failed);

        let s = stats.snapshot();
        assert_eq!(s.total, 3);
        assert_eq!(s.delivered + s.blocked + s.failed, s.total);
        assert_eq!(s.by_outcome.values().sum::<u64>(), s.total);
        assert_eq!(s.by_outcome["CLEAN"], 1);
        assert_eq!(s.by_outcome["BLOCKED"], 1);
        assert_eq!(s.by_outcome["CONTENT_WARNING"], 1);
        assert_eq!(s.by_outcome["SENDER_WARNING"], 0);
    }

    #[test]
    fn reset_zeroes_everything() {
        let stats = StatsAggregator::new();
        stats.record(Outcome::Clean, DeliveryStatus::Delivered);
        stats.reset();
        let s = stats.snapshot();
        assert_eq!(s.total, 0);
        assert_eq!(s.by_outcome.values().sum::<u64>(), 0);
    }

    #[test]
    fn success_rate_handles_empty_and_nonempty() {
        let stats = StatsAggregator::new();
        assert_eq!(stats.snapshot().success_rate(), 0.0);
        stats.record(Outcome::Clean, DeliveryStatus::Delivered);
        stats.record(Outcome::Blocked, DeliveryStatus::Blocked);
        assert!((stats.snapshot().success_rate() - 50.0).abs() < 1e-9);
    }

    #[test]
    fn concurrent_records_conserve_totals() {
        let stats = Arc::new(StatsAggregator::new());
        let mut handles = Vec::new();
        for i in 0..8 {
            let stats = Arc::clone(&stats);
            handles.push(std::thread::spawn(move || {
                for j in 0..250 {
                    let outcome = Outcome::ALL[(i + j) % 4];
                    let status = match outcome {
                        Outcome::Blocked => DeliveryStatus::Blocked,
                        _ if j % 50 == 0 => DeliveryStatus::Failed,
                        _ => DeliveryStatus::Delivered,
                    };
                    stats.record(outcome, status);
                }
            }));
        }
        for h in handles {
            h.join().unwrap();
        }

        let s = stats.snapshot();
        assert_eq!(s.total, 2000);
        assert_eq!(s.delivered + s.blocked + s.failed, 2000);
        assert_eq!(s.by_outcome.values().sum::<u64>(), 2000);
    }
}
