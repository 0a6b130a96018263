// src/lib.rs
// Public library surface for integration tests (and potential reuse).

pub mod analysis;
pub mod api;
pub mod classify;
pub mod config;
pub mod decision;
pub mod delivery;
pub mod engine;
pub mod labeler;
pub mod metrics;
pub mod reputation;
pub mod stats;

// ---- Re-exports for stable public API ----
pub use crate::api::{create_router, router, AppState};
pub use crate::classify::{Classification, LexiconClassifier, TextClassifier, TextLabel};
pub use crate::decision::{Outcome, Thresholds, Verdict};
pub use crate::delivery::{DeliveryResult, DeliveryStatus};
pub use crate::engine::decide;
pub use crate::reputation::{PhoneDirectory, PhoneReputation, PhoneStatus, ReputationSource};
pub use crate::stats::{StatsAggregator, StatsSnapshot};
