//! Delivery service: simulated transmission to the receiver.
//!
//! A stand-in for a real SMS gateway. Per message the state machine is
//! terminal with a single attempt: BLOCKED short-circuits with no
//! transmission; otherwise one send through the [`SmsTransport`] seam yields
//! `delivered` or `failed`. Every call records statistics exactly once,
//! including the failure path.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rand::Rng;
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::decision::Outcome;
use crate::stats::StatsAggregator;

/// Terminal delivery state. Wire values are lowercase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DeliveryStatus {
    Delivered,
    Blocked,
    Failed,
}

/// Outcome of one delivery attempt. Created once per analyzed message,
/// immutable after creation.
#[derive(Debug, Clone, Serialize)]
pub struct DeliveryResult {
    pub delivery_id: String,
    pub status: DeliveryStatus,
    pub delivered_message: Option<String>,
    pub delivery_time: DateTime<Utc>,
    pub error_message: Option<String>,
}

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("sms gateway rejected the message: {0}")]
    Rejected(&'static str),
}

/// Transmission channel seam. The production implementation would talk to a
/// real SMS gateway; here it is simulated.
#[async_trait]
pub trait SmsTransport: Send + Sync {
    async fn send(&self, receiver_phone: &str, body: &str) -> Result<(), TransportError>;
}

/// Simulated gateway with a configurable failure rate (chaos knob for
/// testing; 0.0 makes delivery fully deterministic).
#[derive(Debug, Clone)]
pub struct SimulatedGateway {
    failure_rate: f32,
}

impl SimulatedGateway {
    pub fn new(failure_rate: f32) -> Self {
        Self {
            failure_rate: failure_rate.clamp(0.0, 1.0),
        }
    }
}

#[async_trait]
impl SmsTransport for SimulatedGateway {
    async fn send(&self, receiver_phone: &str, _body: &str) -> Result<(), TransportError> {
        if self.failure_rate > 0.0 && rand::rng().random::<f32>() < self.failure_rate {
            return Err(TransportError::Rejected("simulated transmission failure"));
        }
        debug!(receiver = %receiver_phone, "sms transmitted (simulated)");
        Ok(())
    }
}

/// Generate a fresh unique id like `del_3fa2b4c19e07`.
pub(crate) fn fresh_id(prefix: &str) -> String {
    let n: u64 = rand::rng().random();
    format!("{prefix}_{:012x}", n & 0xffff_ffff_ffff)
}

/// Delivers (or blocks) labeled messages and feeds the statistics aggregator.
pub struct DeliveryService {
    transport: Arc<dyn SmsTransport>,
    stats: Arc<StatsAggregator>,
}

impl DeliveryService {
    pub fn new(transport: Arc<dyn SmsTransport>, stats: Arc<StatsAggregator>) -> Self {
        Self { transport, stats }
    }

    /// Deliver `labeled_message` to `receiver_phone` under `outcome`.
    ///
    /// BLOCKED outcomes never reach the transport. Statistics are recorded
    /// exactly once per call, on every path.
    pub async fn deliver(
        &self,
        receiver_phone: &str,
        labeled_message: &str,
        outcome: Outcome,
    ) -> DeliveryResult {
        let delivery_id = fresh_id("del");
        let delivery_time = Utc::now();

        let result = if outcome == Outcome::Blocked {
            warn!(%delivery_id, "message blocked from delivery");
            DeliveryResult {
                delivery_id,
                status: DeliveryStatus::Blocked,
                delivered_message: None,
                delivery_time,
                error_message: Some("Message blocked due to spam detection".to_string()),
            }
        } else {
            match self.transport.send(receiver_phone, labeled_message).await {
                Ok(()) => {
                    info!(%delivery_id, receiver = %receiver_phone, "message delivered");
                    DeliveryResult {
                        delivery_id,
                        status: DeliveryStatus::Delivered,
                        delivered_message: Some(labeled_message.to_string()),
                        delivery_time,
                        error_message: None,
                    }
                }
                Err(e) => {
                    warn!(%delivery_id, error = %e, "delivery failed");
                    DeliveryResult {
                        delivery_id,
                        status: DeliveryStatus::Failed,
                        delivered_message: None,
                        delivery_time,
                        error_message: Some(e.to_string()),
                    }
                }
            }
        };

        self.stats.record(outcome, result.status);
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct AlwaysFails;

    #[async_trait]
    impl SmsTransport for AlwaysFails {
        async fn send(&self, _receiver: &str, _body: &str) -> Result<(), TransportError> {
            Err(TransportError::Rejected("wired to fail"))
        }
    }

    fn service(transport: Arc<dyn SmsTransport>) -> (DeliveryService, Arc<StatsAggregator>) {
        let stats = Arc::new(StatsAggregator::new());
        (DeliveryService::new(transport, Arc::clone(&stats)), stats)
    }

    #[tokio::test]
    async fn blocked_outcome_never_transmits() {
        // A transport that fails loudly proves it was never called.
        let (svc, stats) = service(Arc::new(AlwaysFails));
        let r = svc.deliver("0755123456", "body", Outcome::Blocked).await;
        assert_eq!(r.status, DeliveryStatus::Blocked);
        assert!(r.delivered_message.is_none());
        assert!(r.error_message.is_some());

        let s = stats.snapshot();
        assert_eq!(s.total, 1);
        assert_eq!(s.blocked, 1);
    }

    #[tokio::test]
    async fn successful_delivery_carries_labeled_body() {
        let (svc, stats) = service(Arc::new(SimulatedGateway::new(0.0)));
        let r = svc
            .deliver("0755123456", "labeled body", Outcome::ContentWarning)
            .await;
        assert_eq!(r.status, DeliveryStatus::Delivered);
        assert_eq!(r.delivered_message.as_deref(), Some("labeled body"));
        assert!(r.error_message.is_none());

        let s = stats.snapshot();
        assert_eq!(s.total, 1);
        assert_eq!(s.delivered, 1);
        assert_eq!(s.by_outcome["CONTENT_WARNING"], 1);
    }

    #[tokio::test]
    async fn transport_failure_is_reported_not_thrown() {
        let (svc, stats) = service(Arc::new(AlwaysFails));
        let r = svc.deliver("0755123456", "body", Outcome::Clean).await;
        assert_eq!(r.status, DeliveryStatus::Failed);
        assert!(r.delivered_message.is_none());
        assert!(r.error_message.as_deref().unwrap().contains("wired to fail"));

        // Stats recorded exactly once, on the failure path too.
        let s = stats.snapshot();
        assert_eq!(s.total, 1);
        assert_eq!(s.failed, 1);
    }

    #[tokio::test]
    async fn every_call_gets_a_fresh_delivery_id() {
        let (svc, _stats) = service(Arc::new(SimulatedGateway::new(0.0)));
        let a = svc.deliver("0755123456", "x", Outcome::Clean).await;
        let b = svc.deliver("0755123456", "x", Outcome::Clean).await;
        assert_ne!(a.delivery_id, b.delivery_id);
        assert!(a.delivery_id.starts_with("del_"));
    }
}
