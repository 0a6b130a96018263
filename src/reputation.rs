//! Phone reputation adapter.
//!
//! Wraps the (mocked) phone reputation store and normalizes its answer into
//! `(status ∈ {validated, unknown, flagged}, risk_score ∈ [0, 1])`. Lookup is
//! a pure read; nothing in this path learns or updates.
//!
//! Numbers absent from the store yield `unknown @ 0.3`: neither trusted nor
//! maximally distrusted. A store failure surfaces as `Err(AdapterError)`; the
//! caller substitutes its own conservative fallback (`unknown @ 0.5`).

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::classify::AdapterError;

/// Default risk for numbers the store has never seen.
pub const UNKNOWN_RISK: f32 = 0.3;

/// Validation status of a sender number. Wire values are lowercase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PhoneStatus {
    Validated,
    Unknown,
    Flagged,
}

impl PhoneStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            PhoneStatus::Validated => "validated",
            PhoneStatus::Unknown => "unknown",
            PhoneStatus::Flagged => "flagged",
        }
    }
}

/// Normalized reputation answer. Produced once per request, never mutated.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PhoneReputation {
    pub status: PhoneStatus,
    pub risk_score: f32,
}

impl PhoneReputation {
    /// Caller-side fallback when the store itself errors (distinct from a
    /// clean "not found", which is `unknown @ 0.3`).
    pub fn conservative_fallback() -> Self {
        Self {
            status: PhoneStatus::Unknown,
            risk_score: 0.5,
        }
    }
}

/// One entry in the reputation store.
#[derive(Debug, Clone)]
pub struct PhoneRecord {
    pub phone: &'static str,
    pub status: PhoneStatus,
    pub reason: &'static str,
    pub risk_score: f32,
    pub last_updated: &'static str,
}

const fn rec(
    phone: &'static str,
    status: PhoneStatus,
    reason: &'static str,
    risk_score: f32,
    last_updated: &'static str,
) -> PhoneRecord {
    PhoneRecord {
        phone,
        status,
        reason,
        risk_score,
        last_updated,
    }
}

/// Seed data simulating an external reputation system (Tanzanian numbers in
/// local `07XXXXXXXX` / `06XXXXXXXX` form).
const SEED_RECORDS: &[PhoneRecord] = &[
    // Validated / safe senders
    rec("0712345678", PhoneStatus::Validated, "verified_business", 0.1, "2024-01-01"),
    rec("0723456789", PhoneStatus::Validated, "registered_user", 0.2, "2024-01-02"),
    rec("0734567890", PhoneStatus::Validated, "government_agency", 0.0, "2024-01-03"),
    rec("0745678901", PhoneStatus::Validated, "verified_contact", 0.1, "2024-01-04"),
    rec("0756789012", PhoneStatus::Validated, "trusted_sender", 0.1, "2024-01-05"),
    // Flagged / suspicious senders
    rec("0789123456", PhoneStatus::Flagged, "reported_spam", 0.9, "2024-01-10"),
    rec("0765432198", PhoneStatus::Flagged, "high_frequency_sender", 0.7, "2024-01-11"),
    rec("0723456780", PhoneStatus::Flagged, "suspicious_pattern", 0.8, "2024-01-12"),
    rec("0712345698", PhoneStatus::Flagged, "blacklisted", 1.0, "2024-01-13"),
    rec("0690123456", PhoneStatus::Flagged, "fraud_reported", 0.95, "2024-01-14"),
    rec("0677841672", PhoneStatus::Flagged, "spam_campaign", 0.85, "2024-01-15"),
    rec("0683146464", PhoneStatus::Flagged, "mass_sender", 0.75, "2024-01-16"),
    rec("0683817701", PhoneStatus::Flagged, "spiritual_services_spam", 0.8, "2024-01-20"),
    rec("0629808228", PhoneStatus::Flagged, "traditional_healer_spam", 0.9, "2024-01-21"),
    rec("0788901234", PhoneStatus::Validated, "legitimate_traditional_healer", 0.3, "2024-01-22"),
    // Test fixtures
    rec("0700000001", PhoneStatus::Flagged, "test_spam", 0.9, "2024-01-25"),
    rec("0700000002", PhoneStatus::Validated, "test_legitimate", 0.1, "2024-01-25"),
];

static NON_PHONE_CHARS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[^\d+]").expect("phone cleanup regex"));

/// Normalize a phone number to the store's local format (`0XXXXXXXXX`).
///
/// Accepts `+255XXXXXXXXX`, `255XXXXXXXXX`, bare `7XXXXXXXX`, and numbers
/// with separators (spaces, dashes, parentheses).
pub fn normalize_phone(raw: &str) -> String {
    let mut cleaned = NON_PHONE_CHARS.replace_all(raw, "").into_owned();
    if let Some(stripped) = cleaned.strip_prefix('+') {
        cleaned = stripped.to_string();
    }
    if cleaned.len() == 12 && cleaned.starts_with("255") {
        format!("0{}", &cleaned[3..])
    } else if cleaned.len() == 9 && (cleaned.starts_with('7') || cleaned.starts_with('6')) {
        format!("0{cleaned}")
    } else {
        cleaned
    }
}

/// Reputation store seam, mirroring the transport seam in delivery: the
/// pipeline depends on this trait so tests can wire in a failing store and
/// exercise the conservative-fallback path.
pub trait ReputationSource: Send + Sync {
    fn lookup(&self, phone: &str) -> Result<PhoneReputation, AdapterError>;
    fn is_connected(&self) -> bool;
    /// `(total, validated, flagged)` record counts.
    fn counts(&self) -> (usize, usize, usize);
}

/// In-memory stand-in for the external reputation database.
#[derive(Debug)]
pub struct PhoneDirectory {
    records: HashMap<&'static str, &'static PhoneRecord>,
}

impl Default for PhoneDirectory {
    fn default() -> Self {
        Self::new()
    }
}

impl PhoneDirectory {
    pub fn new() -> Self {
        let mut records = HashMap::with_capacity(SEED_RECORDS.len());
        for r in SEED_RECORDS {
            records.insert(r.phone, r);
        }
        Self { records }
    }

    /// Look up the reputation of `phone`. Unknown numbers get the fixed
    /// moderate default rather than an error.
    pub fn lookup(&self, phone: &str) -> Result<PhoneReputation, AdapterError> {
        let normalized = normalize_phone(phone);
        match self.records.get(normalized.as_str()) {
            Some(r) => Ok(PhoneReputation {
                status: r.status,
                risk_score: r.risk_score,
            }),
            None => Ok(PhoneReputation {
                status: PhoneStatus::Unknown,
                risk_score: UNKNOWN_RISK,
            }),
        }
    }

    /// Full record access for diagnostics (reason / last update).
    pub fn record(&self, phone: &str) -> Option<&PhoneRecord> {
        let normalized = normalize_phone(phone);
        self.records.get(normalized.as_str()).copied()
    }

    pub fn is_connected(&self) -> bool {
        !self.records.is_empty()
    }

    /// `(total, validated, flagged)` record counts.
    pub fn counts(&self) -> (usize, usize, usize) {
        let validated = self
            .records
            .values()
            .filter(|r| r.status == PhoneStatus::Validated)
            .count();
        let flagged = self
            .records
            .values()
            .filter(|r| r.status == PhoneStatus::Flagged)
            .count();
        (self.records.len(), validated, flagged)
    }
}

impl ReputationSource for PhoneDirectory {
    fn lookup(&self, phone: &str) -> Result<PhoneReputation, AdapterError> {
        PhoneDirectory::lookup(self, phone)
    }

    fn is_connected(&self) -> bool {
        PhoneDirectory::is_connected(self)
    }

    fn counts(&self) -> (usize, usize, usize) {
        PhoneDirectory::counts(self)
    }
}
