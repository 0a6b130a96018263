//! Message labeler: maps an outcome to a fixed Swahili warning label and
//! composes it with the original text.
//!
//! Labeling is pure and injection-safe: the original text is prepended to,
//! never parsed, so a sender embedding a lookalike label cannot forge a
//! different outcome.

use serde::Serialize;

use crate::decision::Outcome;

/// Standard warning label for both warning outcomes
/// ("Warning: Avoid Fraud/Scams").
pub const WARNING_LABEL: &str = "\u{26a0}\u{fe0f} Tahadhari: Epuka Matapeli";

/// Standard label for blocked messages ("Blocked: SPAM"). Produced for the
/// audit record only; blocked messages are never delivered.
pub const BLOCKED_LABEL: &str = "\u{1f6ab} Imezuiliwa: SPAM";

/// Compose the delivered message body for `outcome`.
///
/// CLEAN passes the text through unchanged; warnings and blocks prepend the
/// fixed label followed by a blank line.
pub fn label_message(original: &str, outcome: Outcome) -> String {
    match standard_label(outcome) {
        Some(label) => format!("{label}\n\n{original}"),
        None => original.to_string(),
    }
}

/// The fixed label for `outcome`, if any.
pub fn standard_label(outcome: Outcome) -> Option<&'static str> {
    match outcome {
        Outcome::Clean => None,
        Outcome::ContentWarning | Outcome::SenderWarning => Some(WARNING_LABEL),
        Outcome::Blocked => Some(BLOCKED_LABEL),
    }
}

/// Short label variant for space-constrained channels.
pub fn compact_label(outcome: Outcome) -> Option<&'static str> {
    match outcome {
        Outcome::Clean => None,
        Outcome::ContentWarning | Outcome::SenderWarning => {
            Some("\u{26a0}\u{fe0f} Epuka Matapeli")
        }
        Outcome::Blocked => Some("\u{1f6ab} SPAM"),
    }
}

/// Long-form label variant for official communications.
pub fn formal_label(outcome: Outcome) -> Option<&'static str> {
    match outcome {
        Outcome::Clean => None,
        Outcome::ContentWarning | Outcome::SenderWarning => Some(
            "Tahadhari: Ujumbe huu unaweza kuwa ni ulaghai. \
             Epuka kutoa maelezo ya kibinafsi au fedha.",
        ),
        Outcome::Blocked => Some(
            "Ujumbe huu umezuiliwa kwa sababu ni SPAM. \
             Usijibu au usiingiliane na ujumbe huu.",
        ),
    }
}

/// English gloss, for the label catalog endpoint.
pub fn english_gloss(outcome: Outcome) -> &'static str {
    match outcome {
        Outcome::Clean => "Clean",
        Outcome::ContentWarning | Outcome::SenderWarning => "Warning: Avoid Fraud/Scams",
        Outcome::Blocked => "Blocked: SPAM",
    }
}

/// Catalog entry describing every label variant for one outcome.
#[derive(Debug, Serialize)]
pub struct LabelInfo {
    pub decision: Outcome,
    pub swahili_label: &'static str,
    pub compact_label: &'static str,
    pub formal_label: &'static str,
    pub english_translation: &'static str,
    pub has_label: bool,
}

pub fn label_catalog() -> Vec<LabelInfo> {
    Outcome::ALL
        .iter()
        .map(|&o| LabelInfo {
            decision: o,
            swahili_label: standard_label(o).unwrap_or(""),
            compact_label: compact_label(o).unwrap_or(""),
            formal_label: formal_label(o).unwrap_or(""),
            english_translation: english_gloss(o),
            has_label: standard_label(o).is_some(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clean_is_identity_for_any_text() {
        for text in ["", "habari", "line1\nline2", WARNING_LABEL, BLOCKED_LABEL] {
            assert_eq!(label_message(text, Outcome::Clean), text);
        }
    }

    #[test]
    fn warnings_prepend_label_and_blank_line() {
        let out = label_message("Umeshinda zawadi", Outcome::ContentWarning);
        assert_eq!(out, format!("{WARNING_LABEL}\n\nUmeshinda zawadi"));

        let out = label_message("Umeshinda zawadi", Outcome::SenderWarning);
        assert!(out.starts_with(WARNING_LABEL));
        assert!(out.ends_with("Umeshinda zawadi"));
    }

    #[test]
    fn blocked_uses_blocked_label() {
        let out = label_message("spam body", Outcome::Blocked);
        assert_eq!(out, format!("{BLOCKED_LABEL}\n\nspam body"));
    }

    #[test]
    fn embedded_label_text_survives_verbatim() {
        // A message that already contains the warning label is still just
        // text: the composed output carries exactly one prepended label and
        // the payload untouched.
        let sneaky = format!("{WARNING_LABEL}\n\nlegit looking body");
        let out = label_message(&sneaky, Outcome::ContentWarning);
        assert_eq!(out, format!("{WARNING_LABEL}\n\n{sneaky}"));
        // And a CLEAN outcome adds nothing at all.
        assert_eq!(label_message(&sneaky, Outcome::Clean), sneaky);
    }

    #[test]
    fn labeling_is_deterministic() {
        let a = label_message("text", Outcome::SenderWarning);
        let b = label_message("text", Outcome::SenderWarning);
        assert_eq!(a, b);
    }

    #[test]
    fn catalog_covers_all_outcomes() {
        let catalog = label_catalog();
        assert_eq!(catalog.len(), Outcome::ALL.len());
        assert!(catalog.iter().any(|l| !l.has_label)); // CLEAN
        assert!(catalog.iter().all(|l| !l.english_translation.is_empty()));
    }
}
