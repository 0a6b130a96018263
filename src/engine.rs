//! # Decision Engine
//! Pure, testable fusion of the classifier and reputation signals into one
//! of four outcomes. No I/O, suitable for unit tests and offline evaluation.
//!
//! Policy (first match wins): the single strongest signal on either axis
//! drives a block; warnings are only reachable once both block rules are
//! exhausted, so an outcome can never be less severe than what either axis
//! alone would justify at block severity. Content blocking is checked before
//! sender blocking; that ordering is policy, not necessity, and lives in the
//! two leading arms below.

use crate::classify::{Classification, TextLabel};
use crate::decision::{Outcome, Thresholds, Verdict};
use crate::reputation::{PhoneReputation, PhoneStatus};

/// Combine classification and reputation under the configured thresholds.
///
/// Threshold comparisons are inclusive: a value exactly at a threshold meets
/// it. With both inputs at their neutral defaults (`ham`, `unknown @ 0.3`)
/// the result is CLEAN.
pub fn decide(
    classification: &Classification,
    reputation: &PhoneReputation,
    thresholds: &Thresholds,
) -> Verdict {
    let (spam_threshold, high_risk) = thresholds.effective();

    let is_spam = classification.label == TextLabel::Spam;
    let confidence = classification.confidence;
    let risk = reputation.risk_score;
    let flagged = reputation.status == PhoneStatus::Flagged;

    // Rule 1: high-confidence content spam blocks, regardless of sender.
    if is_spam && confidence >= high_risk {
        return Verdict::new(
            Outcome::Blocked,
            format!(
                "High spam confidence ({confidence:.2} >= {high_risk:.2}) - blocking regardless of sender reputation"
            ),
        );
    }

    // Rule 2: flagged sender with high risk blocks even clean-looking content.
    if flagged && risk >= high_risk {
        return Verdict::new(
            Outcome::Blocked,
            format!(
                "Flagged sender with high risk score ({risk:.2} >= {high_risk:.2}) - blocking despite content"
            ),
        );
    }

    // Rule 3: moderate content-spam signal.
    if is_spam && confidence >= spam_threshold {
        return Verdict::new(
            Outcome::ContentWarning,
            format!(
                "Moderate spam confidence ({confidence:.2}) and {} phone reputation - labeling with content warning",
                reputation.status.as_str()
            ),
        );
    }

    // Rule 4: moderate sender-risk signal, content itself not clearly spam.
    if flagged || risk >= spam_threshold {
        return Verdict::new(
            Outcome::SenderWarning,
            format!(
                "Suspicious sender ({} status, risk {risk:.2}) with non-spam content - labeling with sender warning",
                reputation.status.as_str()
            ),
        );
    }

    Verdict::new(
        Outcome::Clean,
        format!(
            "Low spam signal and {} sender (risk {risk:.2}) - delivering unchanged",
            reputation.status.as_str()
        ),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spam(confidence: f32) -> Classification {
        Classification {
            label: TextLabel::Spam,
            confidence,
        }
    }
    fn ham(confidence: f32) -> Classification {
        Classification {
            label: TextLabel::Ham,
            confidence,
        }
    }
    fn rep(status: PhoneStatus, risk_score: f32) -> PhoneReputation {
        PhoneReputation { status, risk_score }
    }
    fn defaults() -> Thresholds {
        Thresholds::default()
    }

    #[test]
    fn neutral_inputs_are_clean() {
        let v = decide(&ham(0.9), &rep(PhoneStatus::Unknown, 0.3), &defaults());
        assert_eq!(v.outcome, Outcome::Clean);
    }

    #[test]
    fn validated_low_risk_ham_is_clean() {
        let v = decide(&ham(0.95), &rep(PhoneStatus::Validated, 0.1), &defaults());
        assert_eq!(v.outcome, Outcome::Clean);
    }

    #[test]
    fn high_confidence_spam_blocks_even_trusted_sender() {
        let v = decide(&spam(0.86), &rep(PhoneStatus::Validated, 0.0), &defaults());
        assert_eq!(v.outcome, Outcome::Blocked);
    }

    #[test]
    fn flagged_high_risk_sender_blocks_clean_content() {
        let v = decide(&ham(0.9), &rep(PhoneStatus::Flagged, 0.75), &defaults());
        assert_eq!(v.outcome, Outcome::Blocked);
    }

    #[test]
    fn mid_band_spam_gets_content_warning() {
        let v = decide(&spam(0.6), &rep(PhoneStatus::Unknown, 0.3), &defaults());
        assert_eq!(v.outcome, Outcome::ContentWarning);
    }

    #[test]
    fn flagged_moderate_risk_sender_gets_sender_warning() {
        let v = decide(&ham(0.8), &rep(PhoneStatus::Flagged, 0.5), &defaults());
        assert_eq!(v.outcome, Outcome::SenderWarning);
    }

    #[test]
    fn unflagged_but_risky_sender_gets_sender_warning() {
        let v = decide(&ham(0.8), &rep(PhoneStatus::Unknown, 0.55), &defaults());
        assert_eq!(v.outcome, Outcome::SenderWarning);
    }

    #[test]
    fn confidence_exactly_at_high_risk_threshold_blocks() {
        let v = decide(&spam(0.7), &rep(PhoneStatus::Unknown, 0.3), &defaults());
        assert_eq!(v.outcome, Outcome::Blocked, "boundary is inclusive");
    }

    #[test]
    fn confidence_exactly_at_spam_threshold_warns() {
        let v = decide(&spam(0.5), &rep(PhoneStatus::Unknown, 0.3), &defaults());
        assert_eq!(v.outcome, Outcome::ContentWarning, "boundary is inclusive");
    }

    #[test]
    fn risk_exactly_at_high_risk_threshold_blocks_when_flagged() {
        let v = decide(&ham(0.9), &rep(PhoneStatus::Flagged, 0.7), &defaults());
        assert_eq!(v.outcome, Outcome::Blocked);
    }

    #[test]
    fn escalation_is_monotonic_in_spam_confidence() {
        // Increasing spam confidence never moves the outcome to a strictly
        // less severe class.
        let reputation = rep(PhoneStatus::Unknown, 0.3);
        let mut last_severity = 0u8;
        for step in 0..=100 {
            let confidence = step as f32 / 100.0;
            let v = decide(&spam(confidence), &reputation, &defaults());
            assert!(
                v.outcome.severity() >= last_severity,
                "severity dropped at confidence {confidence}"
            );
            last_severity = v.outcome.severity();
        }
    }

    #[test]
    fn determinism_for_fixed_inputs() {
        let c = spam(0.6);
        let r = rep(PhoneStatus::Flagged, 0.65);
        let a = decide(&c, &r, &defaults());
        let b = decide(&c, &r, &defaults());
        assert_eq!(a, b);
    }

    #[test]
    fn strict_mode_blocks_earlier() {
        let t = Thresholds {
            strict_mode: true,
            ..Thresholds::default()
        };
        // 0.55 is below the normal 0.7 block threshold but meets the strict
        // effective threshold of 0.5.
        let v = decide(&spam(0.55), &rep(PhoneStatus::Unknown, 0.3), &t);
        assert_eq!(v.outcome, Outcome::Blocked);
    }

    #[test]
    fn reasoning_mentions_the_numbers_involved() {
        let v = decide(&spam(0.86), &rep(PhoneStatus::Unknown, 0.3), &defaults());
        assert!(v.reasoning.contains("0.86"), "{}", v.reasoning);
    }
}
