//! decision.rs: Outcome, verdict, and threshold types for the fusion engine.
//!
//! The goal is a standardized output for CLEAN / CONTENT_WARNING /
//! SENDER_WARNING / BLOCKED plus a human-readable reasoning string, so the
//! labeler, delivery service, and statistics all key off one closed enum.

use serde::{Deserialize, Serialize};

/// Final disposition for an analyzed message.
///
/// Severity is totally ordered between classes: CLEAN < warnings < BLOCKED.
/// The two warning variants are not ordered relative to each other; both mean
/// "deliver with a label".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Outcome {
    Clean,
    ContentWarning,
    SenderWarning,
    Blocked,
}

impl Outcome {
    /// Severity class: 0 = clean, 1 = warning, 2 = blocked.
    pub fn severity(self) -> u8 {
        match self {
            Outcome::Clean => 0,
            Outcome::ContentWarning | Outcome::SenderWarning => 1,
            Outcome::Blocked => 2,
        }
    }

    /// Wire name, e.g. `"CONTENT_WARNING"`. Matches the serde rename.
    pub fn as_str(self) -> &'static str {
        match self {
            Outcome::Clean => "CLEAN",
            Outcome::ContentWarning => "CONTENT_WARNING",
            Outcome::SenderWarning => "SENDER_WARNING",
            Outcome::Blocked => "BLOCKED",
        }
    }

    pub const ALL: [Outcome; 4] = [
        Outcome::Clean,
        Outcome::ContentWarning,
        Outcome::SenderWarning,
        Outcome::Blocked,
    ];
}

/// Result of the decision engine: the outcome plus the reasoning sentence
/// shown to operators. The reasoning is advisory free text, stable enough
/// for logs, never parsed by any consumer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Verdict {
    pub outcome: Outcome,
    pub reasoning: String,
}

impl Verdict {
    pub fn new(outcome: Outcome, reasoning: impl Into<String>) -> Self {
        Self {
            outcome,
            reasoning: reasoning.into(),
        }
    }
}

/// Tunable thresholds for the decision matrix.
///
/// `spam_confidence` gates the content-warning rule, `high_risk` gates both
/// block rules. Comparisons are inclusive (`>=`): a value exactly at a
/// threshold meets it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Thresholds {
    // Wire names match the admin update payload.
    #[serde(rename = "spam_confidence_threshold")]
    pub spam_confidence: f32,
    #[serde(rename = "high_risk_threshold")]
    pub high_risk: f32,
    /// Strict mode lowers both effective thresholds by 0.2 (floored at
    /// 0.3 / 0.5), making the filter more aggressive.
    #[serde(default)]
    pub strict_mode: bool,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            spam_confidence: 0.5,
            high_risk: 0.7,
            strict_mode: false,
        }
    }
}

impl Thresholds {
    /// Effective `(spam_confidence, high_risk)` pair after strict-mode
    /// adjustment and clamping to [0, 1].
    pub fn effective(&self) -> (f32, f32) {
        let spam = clamp01(self.spam_confidence);
        let risk = clamp01(self.high_risk);
        if self.strict_mode {
            ((spam - 0.2).max(0.3), (risk - 0.2).max(0.5))
        } else {
            (spam, risk)
        }
    }

    /// Validated update; out-of-range values are rejected rather than clamped
    /// so an admin typo does not silently change policy.
    pub fn update(&mut self, spam_confidence: Option<f32>, high_risk: Option<f32>) -> bool {
        if let Some(s) = spam_confidence {
            if !(0.0..=1.0).contains(&s) {
                return false;
            }
            self.spam_confidence = s;
        }
        if let Some(r) = high_risk {
            if !(0.0..=1.0).contains(&r) {
                return false;
            }
            self.high_risk = r;
        }
        true
    }
}

pub(crate) fn clamp01(x: f32) -> f32 {
    if x < 0.0 {
        0.0
    } else if x > 1.0 {
        1.0
    } else {
        x
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn outcome_serializes_to_wire_names() {
        for o in Outcome::ALL {
            let v = serde_json::to_value(o).unwrap();
            assert_eq!(v, serde_json::json!(o.as_str()));
        }
        assert_eq!(
            serde_json::to_value(Outcome::ContentWarning).unwrap(),
            serde_json::json!("CONTENT_WARNING")
        );
    }

    #[test]
    fn thresholds_use_admin_wire_field_names() {
        let v = serde_json::to_value(Thresholds::default()).unwrap();
        assert!(v.get("spam_confidence_threshold").is_some());
        assert!(v.get("high_risk_threshold").is_some());
        assert!(v.get("spam_confidence").is_none());
    }

    #[test]
    fn severity_is_ordered() {
        assert!(Outcome::Clean.severity() < Outcome::ContentWarning.severity());
        assert_eq!(
            Outcome::ContentWarning.severity(),
            Outcome::SenderWarning.severity()
        );
        assert!(Outcome::SenderWarning.severity() < Outcome::Blocked.severity());
    }

    #[test]
    fn strict_mode_lowers_effective_thresholds_with_floors() {
        let t = Thresholds {
            spam_confidence: 0.5,
            high_risk: 0.7,
            strict_mode: true,
        };
        assert_eq!(t.effective(), (0.3, 0.5));

        let t2 = Thresholds {
            spam_confidence: 0.4,
            high_risk: 0.55,
            strict_mode: true,
        };
        // Floors win over subtraction.
        assert_eq!(t2.effective(), (0.3, 0.5));
    }

    #[test]
    fn update_rejects_out_of_range() {
        let mut t = Thresholds::default();
        assert!(!t.update(Some(1.5), None));
        assert_eq!(t.spam_confidence, 0.5);
        assert!(t.update(Some(0.6), Some(0.8)));
        assert_eq!(t.spam_confidence, 0.6);
        assert_eq!(t.high_risk, 0.8);
    }
}
