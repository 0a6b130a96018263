//! Text classifier adapter.
//!
//! Wraps the bundled bag-of-words spam model and normalizes its output into
//! `(label ∈ {spam, ham}, confidence ∈ [0, 1])`. The model itself is a black
//! box to the rest of the system; only this module knows it is a weighted
//! keyword lexicon.
//!
//! Failure policy: if the model cannot be loaded, `classify` returns
//! `Err(AdapterError)` and the *caller* substitutes the conservative fallback
//! (`spam @ 0.5`); the fallback is never hidden inside the adapter.

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use thiserror::Error;
use tracing::warn;

/// Maximum text length the model accepts; longer inputs are truncated.
pub const MAX_TEXT_LEN: usize = 1000;

static LEXICON: Lazy<Option<HashMap<String, f32>>> = Lazy::new(|| {
    let raw = include_str!("../spam_lexicon.json");
    match serde_json::from_str::<HashMap<String, f32>>(raw) {
        Ok(map) => Some(map),
        Err(e) => {
            warn!(error = %e, "spam lexicon failed to parse; classifier unavailable");
            None
        }
    }
});

/// Adapter-boundary failure: the underlying model or store is unreachable.
#[derive(Debug, Error)]
pub enum AdapterError {
    #[error("adapter unavailable: {0}")]
    Unavailable(&'static str),
}

/// Text classification label. Wire values are lowercase (`"spam"` / `"ham"`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TextLabel {
    Spam,
    Ham,
}

impl TextLabel {
    pub fn as_str(self) -> &'static str {
        match self {
            TextLabel::Spam => "spam",
            TextLabel::Ham => "ham",
        }
    }
}

/// Normalized classifier output. Produced once per request, never mutated.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Classification {
    pub label: TextLabel,
    pub confidence: f32,
}

impl Classification {
    /// Conservative fallback used by callers when the model is unavailable:
    /// prefer a false positive over undetected spam.
    pub fn conservative_fallback() -> Self {
        Self {
            label: TextLabel::Spam,
            confidence: 0.5,
        }
    }
}

/// Classifier seam, mirroring the transport seam in delivery: the pipeline
/// only sees this trait, so tests can wire in a failing classifier and
/// exercise the conservative-fallback path.
pub trait TextClassifier: Send + Sync {
    fn classify(&self, text: &str) -> Result<Classification, AdapterError>;
    fn is_ready(&self) -> bool;
}

/// Spam/ham classifier backed by the bundled lexicon.
#[derive(Debug, Clone, Default)]
pub struct LexiconClassifier;

impl LexiconClassifier {
    pub fn new() -> Self {
        Self
    }

    /// Whether the underlying model loaded successfully.
    pub fn is_ready(&self) -> bool {
        LEXICON.is_some()
    }

    /// Classify `text` as spam or ham with a confidence in [0, 1].
    ///
    /// Pure read, no side effects. Texts longer than [`MAX_TEXT_LEN`]
    /// characters are truncated before scoring (the HTTP boundary rejects
    /// them earlier; this guard covers library callers).
    pub fn classify(&self, text: &str) -> Result<Classification, AdapterError> {
        let lexicon = LEXICON
            .as_ref()
            .ok_or(AdapterError::Unavailable("spam lexicon not loaded"))?;

        let text: String = text.chars().take(MAX_TEXT_LEN).collect();

        let mut score: f32 = 0.0;
        for tok in tokenize(&text) {
            if let Some(w) = lexicon.get(&tok) {
                score += w;
            }
        }

        // Saturating squash: 0 spam weight -> p = 0, weight 2 -> ~0.63,
        // weight 4.8 -> ~0.91. p_spam stays strictly below 1.0; ham
        // confidence is exactly 1.0 for a zero-weight text.
        let p_spam = 1.0 - (-score / 2.0).exp();

        let (label, confidence) = if p_spam >= 0.5 {
            (TextLabel::Spam, p_spam)
        } else {
            (TextLabel::Ham, 1.0 - p_spam)
        };

        Ok(Classification {
            label,
            confidence: crate::decision::clamp01(confidence),
        })
    }
}

impl TextClassifier for LexiconClassifier {
    fn classify(&self, text: &str) -> Result<Classification, AdapterError> {
        LexiconClassifier::classify(self, text)
    }

    fn is_ready(&self) -> bool {
        LexiconClassifier::is_ready(self)
    }
}

/// Alphanumeric tokens, lower-cased. Unicode-friendly enough for Swahili,
/// which is ASCII-alphabetic.
fn tokenize(s: &str) -> impl Iterator<Item = String> + '_ {
    s.split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
        .map(|t| t.to_lowercase())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_greeting_is_ham() {
        let c = LexiconClassifier::new();
        let r = c.classify("Habari za mchana, je hali gani?").unwrap();
        assert_eq!(r.label, TextLabel::Ham);
        // Zero spam weight gives p_spam = 0 exactly, so ham confidence is 1.0.
        assert_eq!(r.confidence, 1.0);
    }

    #[test]
    fn lottery_prize_text_is_high_confidence_spam() {
        let c = LexiconClassifier::new();
        let r = c
            .classify("Umeshinda milioni 50, piga simu kwa maelezo zaidi")
            .unwrap();
        assert_eq!(r.label, TextLabel::Spam);
        assert!(
            r.confidence >= 0.7,
            "lottery text should clear the high-risk threshold, got {}",
            r.confidence
        );
    }

    #[test]
    fn single_weak_term_lands_between_thresholds() {
        let c = LexiconClassifier::new();
        // "zawadi" alone carries weight 2.0 -> p_spam ~ 0.63.
        let r = c.classify("kuna zawadi kwako").unwrap();
        assert_eq!(r.label, TextLabel::Spam);
        assert!(r.confidence >= 0.5 && r.confidence < 0.7, "{}", r.confidence);
    }

    #[test]
    fn classification_is_deterministic() {
        let c = LexiconClassifier::new();
        let a = c.classify("free cash prize now").unwrap();
        let b = c.classify("free cash prize now").unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn truncates_overlong_text_instead_of_failing() {
        let c = LexiconClassifier::new();
        let long = "habari ".repeat(500);
        assert!(c.classify(&long).is_ok());
    }

    #[test]
    fn fallback_is_spam_at_half_confidence() {
        let f = Classification::conservative_fallback();
        assert_eq!(f.label, TextLabel::Spam);
        assert!((f.confidence - 0.5).abs() < f32::EPSILON);
    }
}
