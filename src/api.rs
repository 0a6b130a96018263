use std::sync::{Arc, RwLock};

use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    routing::{get, post, put},
    Json, Router,
};
use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use tower_http::cors::CorsLayer;
use tracing::warn;

use crate::analysis::{build_service, AnalysisRequest, AnalysisService, ComponentsHealth};
use crate::classify::MAX_TEXT_LEN;
use crate::config::Settings;
use crate::decision::{Outcome, Thresholds};
use crate::delivery::{DeliveryResult, SimulatedGateway};
use crate::labeler::{label_catalog, LabelInfo};
use crate::stats::StatsAggregator;

#[derive(Clone)]
pub struct AppState {
    service: Arc<AnalysisService>,
    stats: Arc<StatsAggregator>,
    thresholds: Arc<RwLock<Thresholds>>,
}

impl AppState {
    pub fn from_settings(settings: &Settings) -> Self {
        let thresholds = Arc::new(RwLock::new(settings.thresholds()));
        let stats = Arc::new(StatsAggregator::new());
        let transport = Arc::new(SimulatedGateway::new(settings.delivery_failure_rate));
        let service = Arc::new(build_service(
            Arc::clone(&thresholds),
            Arc::clone(&stats),
            transport,
        ));
        Self {
            service,
            stats,
            thresholds,
        }
    }
}

pub fn create_router(settings: &Settings) -> Router {
    router(AppState::from_settings(settings))
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/analyze", post(analyze))
        .route("/analyze/test", get(analyze_test))
        .route("/analyze/labels", get(labels))
        .route("/analyze/stats/delivery", get(delivery_stats))
        .route("/admin/config", get(admin_config))
        .route("/admin/thresholds", put(admin_update_thresholds))
        .route("/admin/reset-stats", post(admin_reset_stats))
        .layer(CorsLayer::very_permissive())
        .with_state(state)
}

// ---- request/response shapes ----

/// Raw analyze body. Fields are optional so missing keys surface as
/// field-level validation errors instead of a bare deserializer rejection.
#[derive(serde::Deserialize)]
struct AnalyzeBody {
    #[serde(default)]
    text: Option<String>,
    #[serde(default)]
    sender_phone: Option<String>,
    #[serde(default)]
    receiver_phone: Option<String>,
}

#[derive(serde::Serialize)]
struct AnalyzeResponse {
    message_id: String,
    decision: Outcome,
    confidence: f32,
    sender_phone: String,
    receiver_phone: String,
    text_classification: &'static str,
    text_confidence: f32,
    phone_status: &'static str,
    phone_risk_score: f32,
    original_message: String,
    labeled_message: String,
    delivery_result: DeliveryResult,
    reasoning: String,
    processing_time_ms: f64,
    timestamp: DateTime<Utc>,
}

#[derive(serde::Serialize)]
struct FieldError {
    field: &'static str,
    message: String,
}

#[derive(serde::Serialize)]
struct ErrorBody {
    error: &'static str,
    message: &'static str,
    details: Vec<FieldError>,
    timestamp: DateTime<Utc>,
}

type ValidationRejection = (StatusCode, Json<ErrorBody>);

/// Map axum's own body rejection (malformed JSON, wrong content type) into
/// the same structured error shape as field-level validation.
fn body_rejection(rejection: JsonRejection) -> ValidationRejection {
    warn!(error = %rejection, "rejected malformed request body");
    validation_rejection(vec![FieldError {
        field: "body",
        message: rejection.body_text(),
    }])
}

fn validation_rejection(details: Vec<FieldError>) -> ValidationRejection {
    (
        StatusCode::UNPROCESSABLE_ENTITY,
        Json(ErrorBody {
            error: "ValidationError",
            message: "Invalid request data",
            details,
            timestamp: Utc::now(),
        }),
    )
}

// Accepts digits with common separators; digit count is checked separately.
static PHONE_SHAPE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[\d\+\-\s\(\)]{7,20}$").expect("phone shape regex"));

fn validate_phone(field: &'static str, value: Option<String>) -> Result<String, FieldError> {
    let value = value.ok_or(FieldError {
        field,
        message: "field is required".to_string(),
    })?;
    if !PHONE_SHAPE.is_match(&value) {
        return Err(FieldError {
            field,
            message: "invalid phone number format".to_string(),
        });
    }
    let digits = value.chars().filter(|c| c.is_ascii_digit()).count();
    if !(7..=15).contains(&digits) {
        return Err(FieldError {
            field,
            message: "phone number must contain 7-15 digits".to_string(),
        });
    }
    Ok(value)
}

fn validate(body: AnalyzeBody) -> Result<AnalysisRequest, Vec<FieldError>> {
    let mut errors = Vec::new();

    let text = match body.text {
        None => {
            errors.push(FieldError {
                field: "text",
                message: "field is required".to_string(),
            });
            None
        }
        Some(t) => {
            let trimmed = t.trim().to_string();
            if trimmed.is_empty() {
                errors.push(FieldError {
                    field: "text",
                    message: "text cannot be empty or only whitespace".to_string(),
                });
                None
            } else if trimmed.chars().count() > MAX_TEXT_LEN {
                errors.push(FieldError {
                    field: "text",
                    message: format!("text exceeds {MAX_TEXT_LEN} characters"),
                });
                None
            } else {
                Some(trimmed)
            }
        }
    };

    let sender_phone = match validate_phone("sender_phone", body.sender_phone) {
        Ok(p) => Some(p),
        Err(e) => {
            errors.push(e);
            None
        }
    };
    let receiver_phone = match validate_phone("receiver_phone", body.receiver_phone) {
        Ok(p) => Some(p),
        Err(e) => {
            errors.push(e);
            None
        }
    };

    match (text, sender_phone, receiver_phone) {
        (Some(text), Some(sender_phone), Some(receiver_phone)) if errors.is_empty() => {
            Ok(AnalysisRequest {
                text,
                sender_phone,
                receiver_phone,
            })
        }
        _ => Err(errors),
    }
}

fn to_response(record: crate::analysis::AnalysisRecord) -> AnalyzeResponse {
    AnalyzeResponse {
        message_id: record.message_id,
        decision: record.verdict.outcome,
        confidence: record.confidence,
        sender_phone: record.sender_phone,
        receiver_phone: record.receiver_phone,
        text_classification: record.classification.label.as_str(),
        text_confidence: record.classification.confidence,
        phone_status: record.reputation.status.as_str(),
        phone_risk_score: record.reputation.risk_score,
        original_message: record.original_message,
        labeled_message: record.labeled_message,
        delivery_result: record.delivery,
        reasoning: record.verdict.reasoning,
        processing_time_ms: record.processing_time_ms,
        timestamp: record.timestamp,
    }
}

// ---- handlers ----

async fn analyze(
    State(state): State<AppState>,
    body: Result<Json<AnalyzeBody>, JsonRejection>,
) -> Result<Json<AnalyzeResponse>, ValidationRejection> {
    let Json(body) = body.map_err(body_rejection)?;
    let request = validate(body).map_err(|details| {
        warn!(fields = details.len(), "rejected invalid analyze request");
        validation_rejection(details)
    })?;

    let record = state.service.analyze(request).await;
    Ok(Json(to_response(record)))
}

/// Canned Swahili lottery-spam message through the full pipeline, for quick
/// integration checks.
async fn analyze_test(State(state): State<AppState>) -> Json<AnalyzeResponse> {
    let record = state
        .service
        .analyze(AnalysisRequest {
            text: "Umeshinda milioni 50, piga simu kwa maelezo zaidi".to_string(),
            sender_phone: "+255787123456".to_string(),
            receiver_phone: "0755000111".to_string(),
        })
        .await;
    Json(to_response(record))
}

async fn labels() -> Json<Vec<LabelInfo>> {
    Json(label_catalog())
}

#[derive(serde::Serialize)]
struct HealthResponse {
    status: &'static str,
    components_healthy: ComponentsHealth,
}

async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    let components = state.service.health();
    Json(HealthResponse {
        status: if components.all_healthy() {
            "healthy"
        } else {
            "degraded"
        },
        components_healthy: components,
    })
}

#[derive(serde::Serialize)]
struct SystemHealth {
    status: &'static str,
    components: ComponentsHealth,
}

#[derive(serde::Serialize)]
struct DeliveryStatsResponse {
    total: u64,
    delivered: u64,
    blocked: u64,
    failed: u64,
    success_rate: f64,
    decision_counts: std::collections::HashMap<&'static str, u64>,
    system_health: SystemHealth,
}

async fn delivery_stats(State(state): State<AppState>) -> Json<DeliveryStatsResponse> {
    let snapshot = state.stats.snapshot();
    let components = state.service.health();
    Json(DeliveryStatsResponse {
        total: snapshot.total,
        delivered: snapshot.delivered,
        blocked: snapshot.blocked,
        failed: snapshot.failed,
        success_rate: snapshot.success_rate(),
        decision_counts: snapshot.by_outcome,
        system_health: SystemHealth {
            status: if components.all_healthy() {
                "healthy"
            } else {
                "degraded"
            },
            components,
        },
    })
}

#[derive(serde::Serialize)]
struct AdminConfigResponse {
    decision_thresholds: Thresholds,
    limits: AdminLimits,
    phone_directory: DirectoryCounts,
    version: &'static str,
}

#[derive(serde::Serialize)]
struct AdminLimits {
    max_text_length: usize,
}

#[derive(serde::Serialize)]
struct DirectoryCounts {
    total: usize,
    validated: usize,
    flagged: usize,
}

async fn admin_config(State(state): State<AppState>) -> Json<AdminConfigResponse> {
    let (total, validated, flagged) = state.service.directory().counts();
    Json(AdminConfigResponse {
        decision_thresholds: state.service.thresholds(),
        limits: AdminLimits {
            max_text_length: MAX_TEXT_LEN,
        },
        phone_directory: DirectoryCounts {
            total,
            validated,
            flagged,
        },
        version: env!("CARGO_PKG_VERSION"),
    })
}

#[derive(serde::Deserialize)]
struct ThresholdUpdate {
    #[serde(default)]
    spam_confidence_threshold: Option<f32>,
    #[serde(default)]
    high_risk_threshold: Option<f32>,
    #[serde(default)]
    strict_mode: Option<bool>,
}

async fn admin_update_thresholds(
    State(state): State<AppState>,
    update: Result<Json<ThresholdUpdate>, JsonRejection>,
) -> Result<Json<Thresholds>, ValidationRejection> {
    let Json(update) = update.map_err(body_rejection)?;
    let mut guard = state.thresholds.write().expect("thresholds rwlock poisoned");
    let mut candidate = *guard;
    if !candidate.update(update.spam_confidence_threshold, update.high_risk_threshold) {
        return Err(validation_rejection(vec![FieldError {
            field: "thresholds",
            message: "thresholds must lie in [0.0, 1.0]".to_string(),
        }]));
    }
    if let Some(strict) = update.strict_mode {
        candidate.strict_mode = strict;
    }
    *guard = candidate;
    Ok(Json(candidate))
}

async fn admin_reset_stats(State(state): State<AppState>) -> Json<serde_json::Value> {
    state.stats.reset();
    Json(serde_json::json!({ "status": "reset" }))
}
