//! Result of one refinement call

use crate::document::EmailDocument;
use serde::{Deserialize, Serialize};

/// Which tier of the edit router produced an outcome
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EditStrategy {
    Deterministic,
    ScopedAi,
    FullAi,
    Advisory,
    None,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutcomeKind {
    Edited,
    Unchanged,
    Clarification,
    Advice,
    Failed,
}

/// Produced once per refinement call.
///
/// `document` is always renderable: either the accepted new document or
/// the untouched prior one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EditOutcome {
    pub success: bool,
    pub changed: bool,
    pub kind: OutcomeKind,
    pub strategy: EditStrategy,
    /// Set when a best-effort fallback path produced the result
    pub degraded: bool,
    pub message: String,
    pub document: EmailDocument,
    pub change_descriptions: Vec<String>,
    pub valid: bool,
    pub validation_errors: Vec<String>,
    pub validation_warnings: Vec<String>,
}

impl EditOutcome {
    fn base(kind: OutcomeKind, document: EmailDocument, message: impl Into<String>) -> Self {
        Self {
            success: false,
            changed: false,
            kind,
            strategy: EditStrategy::None,
            degraded: false,
            message: message.into(),
            document,
            change_descriptions: Vec::new(),
            valid: true,
            validation_errors: Vec::new(),
            validation_warnings: Vec::new(),
        }
    }

    /// A successful edit
    pub fn edited(
        document: EmailDocument,
        strategy: EditStrategy,
        change_descriptions: Vec<String>,
    ) -> Self {
        let message = change_descriptions
            .first()
            .cloned()
            .unwrap_or_else(|| "Email updated".to_string());
        Self {
            success: true,
            changed: true,
            strategy,
            change_descriptions,
            ..Self::base(OutcomeKind::Edited, document, message)
        }
    }

    /// A failure carrying the prior, unmodified document
    pub fn failed(document: EmailDocument, message: impl Into<String>) -> Self {
        Self::base(OutcomeKind::Failed, document, message)
    }

    /// Request ran but nothing changed
    pub fn unchanged(document: EmailDocument, message: impl Into<String>) -> Self {
        Self {
            success: true,
            ..Self::base(OutcomeKind::Unchanged, document, message)
        }
    }

    pub fn clarification(document: EmailDocument, message: impl Into<String>) -> Self {
        Self {
            success: true,
            ..Self::base(OutcomeKind::Clarification, document, message)
        }
    }

    pub fn advice(document: EmailDocument, answer: impl Into<String>) -> Self {
        Self {
            success: true,
            strategy: EditStrategy::Advisory,
            ..Self::base(OutcomeKind::Advice, document, answer)
        }
    }

    pub fn with_strategy(mut self, strategy: EditStrategy) -> Self {
        self.strategy = strategy;
        self
    }

    pub fn with_degraded(mut self, degraded: bool) -> Self {
        self.degraded = degraded;
        self
    }

    pub fn with_validation(mut self, errors: Vec<String>, warnings: Vec<String>) -> Self {
        self.valid = errors.is_empty();
        self.validation_errors = errors;
        self.validation_warnings = warnings;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_edited_uses_first_change_as_message() {
        let outcome = EditOutcome::edited(
            EmailDocument::default(),
            EditStrategy::FullAi,
            vec!["Changed headline".to_string()],
        );
        assert!(outcome.success && outcome.changed);
        assert_eq!(outcome.message, "Changed headline");
        assert_eq!(outcome.kind, OutcomeKind::Edited);
    }

    #[test]
    fn test_failed_is_unchanged() {
        let outcome = EditOutcome::failed(EmailDocument::default(), "nope")
            .with_validation(vec!["bad".to_string()], vec![]);
        assert!(!outcome.success);
        assert!(!outcome.changed);
        assert!(!outcome.valid);
    }
}
