//! Analysis orchestration: classify, look up reputation, decide, label,
//! deliver, and assemble the full per-message record.
//!
//! Adapter failures never fail a request. The fallbacks are constructed
//! here, at the composition point, so the "always decide, bias conservative"
//! policy stays visible: an unavailable classifier is treated as `spam @ 0.5`
//! and an unreachable reputation store as `unknown @ 0.5`.

use std::sync::{Arc, RwLock};
use std::time::Instant;

use chrono::{DateTime, Utc};
use metrics::counter;
use tracing::{info, warn};

use crate::classify::{Classification, LexiconClassifier, TextClassifier};
use crate::decision::{clamp01, Outcome, Thresholds, Verdict};
use crate::delivery::{fresh_id, DeliveryResult, DeliveryService};
use crate::engine::decide;
use crate::labeler::label_message;
use crate::reputation::{PhoneDirectory, PhoneReputation, ReputationSource};
use crate::stats::StatsAggregator;

/// Validated analysis input. Immutable once constructed.
#[derive(Debug, Clone)]
pub struct AnalysisRequest {
    pub text: String,
    pub sender_phone: String,
    pub receiver_phone: String,
}

/// Complete per-message analysis record: inputs, both adapter signals, the
/// verdict, labeling, delivery, and timing. Created once, never mutated, and
/// not persisted beyond the statistics it already fed.
#[derive(Debug, Clone)]
pub struct AnalysisRecord {
    pub message_id: String,
    pub sender_phone: String,
    pub receiver_phone: String,
    pub classification: Classification,
    pub reputation: PhoneReputation,
    pub verdict: Verdict,
    /// Combined confidence in the final decision (distinct from the raw
    /// classifier confidence).
    pub confidence: f32,
    pub original_message: String,
    pub labeled_message: String,
    pub delivery: DeliveryResult,
    pub processing_time_ms: f64,
    pub timestamp: DateTime<Utc>,
}

/// Per-component health, surfaced by `/health` and the stats endpoint.
#[derive(Debug, Clone, Copy, serde::Serialize)]
pub struct ComponentsHealth {
    pub text_classification: bool,
    pub phone_validation: bool,
    pub decision_engine: bool,
    pub message_delivery: bool,
}

impl ComponentsHealth {
    pub fn all_healthy(&self) -> bool {
        self.text_classification
            && self.phone_validation
            && self.decision_engine
            && self.message_delivery
    }
}

/// Main service wiring the adapters, engine, labeler, and delivery together.
/// Both adapters sit behind trait seams so an outage can be simulated.
pub struct AnalysisService {
    classifier: Arc<dyn TextClassifier>,
    directory: Arc<dyn ReputationSource>,
    delivery: DeliveryService,
    thresholds: Arc<RwLock<Thresholds>>,
}

impl AnalysisService {
    pub fn new(
        classifier: Arc<dyn TextClassifier>,
        directory: Arc<dyn ReputationSource>,
        delivery: DeliveryService,
        thresholds: Arc<RwLock<Thresholds>>,
    ) -> Self {
        Self {
            classifier,
            directory,
            delivery,
            thresholds,
        }
    }

    /// Run the full pipeline for one message.
    pub async fn analyze(&self, request: AnalysisRequest) -> AnalysisRecord {
        let started = Instant::now();
        let message_id = fresh_id("msg");
        let text_id = anon_hash(&request.text);

        let classification = match self.classifier.classify(&request.text) {
            Ok(c) => c,
            Err(e) => {
                warn!(%message_id, error = %e, "classifier unavailable, using conservative fallback");
                counter!("sentinel_adapter_fallbacks_total", "adapter" => "classifier").increment(1);
                Classification::conservative_fallback()
            }
        };

        let reputation = match self.directory.lookup(&request.sender_phone) {
            Ok(r) => r,
            Err(e) => {
                warn!(%message_id, error = %e, "reputation lookup failed, using conservative fallback");
                counter!("sentinel_adapter_fallbacks_total", "adapter" => "reputation").increment(1);
                PhoneReputation::conservative_fallback()
            }
        };

        let thresholds = *self.thresholds.read().expect("thresholds rwlock poisoned");
        let verdict = decide(&classification, &reputation, &thresholds);
        let confidence = combined_confidence(
            classification.confidence,
            reputation.risk_score,
            verdict.outcome,
        );

        let labeled_message = label_message(&request.text, verdict.outcome);

        // Delivery records the statistics for this request, exactly once.
        let delivery = self
            .delivery
            .deliver(&request.receiver_phone, &labeled_message, verdict.outcome)
            .await;

        counter!("sentinel_decisions_total", "outcome" => verdict.outcome.as_str()).increment(1);

        let processing_time_ms = started.elapsed().as_secs_f64() * 1000.0;
        info!(
            %message_id,
            text = %text_id,
            outcome = verdict.outcome.as_str(),
            confidence,
            delivery = ?delivery.status,
            elapsed_ms = processing_time_ms,
            "analysis complete"
        );

        AnalysisRecord {
            message_id,
            sender_phone: request.sender_phone,
            receiver_phone: request.receiver_phone,
            classification,
            reputation,
            verdict,
            confidence,
            original_message: request.text.clone(),
            labeled_message,
            delivery,
            processing_time_ms,
            timestamp: Utc::now(),
        }
    }

    pub fn health(&self) -> ComponentsHealth {
        ComponentsHealth {
            text_classification: self.classifier.is_ready(),
            phone_validation: self.directory.is_connected(),
            decision_engine: true,
            message_delivery: true,
        }
    }

    pub fn thresholds(&self) -> Thresholds {
        *self.thresholds.read().expect("thresholds rwlock poisoned")
    }

    pub fn directory(&self) -> &dyn ReputationSource {
        self.directory.as_ref()
    }
}

/// Overall decision confidence, blending the classifier confidence with the
/// sender risk per outcome class.
pub fn combined_confidence(text_confidence: f32, risk_score: f32, outcome: Outcome) -> f32 {
    let c = match outcome {
        Outcome::Blocked => text_confidence.max(1.0 - risk_score).min(0.95),
        Outcome::Clean => (text_confidence * (1.0 - risk_score)).min(0.9),
        Outcome::ContentWarning | Outcome::SenderWarning => 0.6 + text_confidence * 0.3,
    };
    clamp01(c)
}

/// Short stable hash so logs can reference a message without its text.
pub(crate) fn anon_hash(text: &str) -> String {
    use sha2::{Digest, Sha256};
    let digest = Sha256::digest(text.as_bytes());
    let mut out = String::with_capacity(12);
    for b in digest.iter().take(6) {
        use std::fmt::Write as _;
        let _ = write!(&mut out, "{b:02x}");
    }
    out
}

/// Build a fully wired service with the given config knobs. Used by the
/// router constructor and tests.
pub fn build_service(
    thresholds: Arc<RwLock<Thresholds>>,
    stats: Arc<StatsAggregator>,
    transport: Arc<dyn crate::delivery::SmsTransport>,
) -> AnalysisService {
    AnalysisService::new(
        Arc::new(LexiconClassifier::new()),
        Arc::new(PhoneDirectory::new()),
        DeliveryService::new(transport, stats),
        thresholds,
    )
}
