//! Instruction classification
//!
//! Pure `(text) -> classification` functions driven by ordered rule tables.
//! The first matching rule wins. Swapping in a model-based classifier only
//! requires replacing these functions; the router never inspects patterns.

use crate::patterns::{contains_keyword, EDIT_VERBS, IMAGE_CHANGE_KEYWORDS, STRUCTURAL_KEYWORDS};
use email_model::SourceChannel;
use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};

/// Question vs. command axis
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Intent {
    Command,
    Question,
    Unclear,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IntentClassification {
    pub intent: Intent,
    pub confidence: f32,
    /// Name of the rule that matched
    pub rule: &'static str,
}

/// Deterministic edit family of an instruction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EditKind {
    Delete,
    Duplicate,
    Modify,
}

/// One row of a rule table
pub struct IntentRule {
    pub name: &'static str,
    pub pattern: Regex,
    pub intent: Intent,
    pub confidence: f32,
}

const TARGET_PHRASE: &str = r"(\s+(this|that|it|selected(\s+\w+)?|the\s+selected(\s+\w+)?|this\s+\w+|that\s+\w+|the\s+\w+))?";

lazy_static! {
    static ref VERB_ALTERNATION: String = EDIT_VERBS.join("|");

    /// Ordered question/command rules
    pub static ref INTENT_RULES: Vec<IntentRule> = vec![
        IntentRule {
            name: "polite_command",
            pattern: Regex::new(&format!(
                r"(?i)^\s*(please\s+)?(can|could|would|will)\s+you\s+(please\s+)?({})\b",
                *VERB_ALTERNATION
            ))
            .unwrap(),
            intent: Intent::Command,
            confidence: 0.85,
        },
        IntentRule {
            name: "imperative",
            pattern: Regex::new(&format!(r"(?i)^\s*(please\s+)?({})\b", *VERB_ALTERNATION)).unwrap(),
            intent: Intent::Command,
            confidence: 0.9,
        },
        IntentRule {
            name: "stated_desire",
            pattern: Regex::new(r"(?i)^\s*(i\s+(want|need|would\s+like)|i'd\s+like|let'?s)\b").unwrap(),
            intent: Intent::Command,
            confidence: 0.7,
        },
        IntentRule {
            name: "question_word",
            pattern: Regex::new(r"(?i)^\s*(what|why|how|which|who|when|where|should|is|are|does|do|would|could|can)\b").unwrap(),
            intent: Intent::Question,
            confidence: 0.8,
        },
        IntentRule {
            name: "question_mark",
            pattern: Regex::new(r"\?\s*$").unwrap(),
            intent: Intent::Question,
            confidence: 0.75,
        },
        IntentRule {
            name: "advice_request",
            pattern: Regex::new(r"(?i)\b(suggest|suggestions?|recommend|recommendations?|advice|ideas?|feedback|opinion|thoughts)\b").unwrap(),
            intent: Intent::Question,
            confidence: 0.7,
        },
        IntentRule {
            name: "embedded_edit_verb",
            pattern: Regex::new(&format!(
                r"(?i)\b({}|bigger|smaller|bolder|shorter|longer|color|colour|font)\b",
                *VERB_ALTERNATION
            ))
            .unwrap(),
            intent: Intent::Command,
            confidence: 0.6,
        },
    ];

    static ref DELETE_PATTERN: Regex = Regex::new(&format!(
        r"(?i)^\s*(please\s+)?(delete|remove|drop){}\s*[.!]*\s*$",
        TARGET_PHRASE
    ))
    .unwrap();

    static ref DUPLICATE_PATTERN: Regex = Regex::new(&format!(
        r"(?i)^\s*(please\s+)?((duplicate|clone|copy){}|make\s+a\s+copy(\s+of{})?)\s*[.!]*\s*$",
        TARGET_PHRASE, TARGET_PHRASE
    ))
    .unwrap();
}

const UNCLEAR: IntentClassification = IntentClassification {
    intent: Intent::Unclear,
    confidence: 0.2,
    rule: "no_match",
};

/// Classify an instruction along the question/command axis
pub fn classify_intent(text: &str) -> IntentClassification {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return IntentClassification {
            confidence: 0.0,
            ..UNCLEAR
        };
    }
    INTENT_RULES
        .iter()
        .find(|rule| rule.pattern.is_match(trimmed))
        .map(|rule| IntentClassification {
            intent: rule.intent,
            confidence: rule.confidence,
            rule: rule.name,
        })
        .unwrap_or(UNCLEAR)
}

/// Classify with source-channel metadata. Toolbar actions are always commands.
pub fn classify_for_channel(text: &str, channel: SourceChannel) -> IntentClassification {
    if channel.forces_command() {
        return IntentClassification {
            intent: Intent::Command,
            confidence: 1.0,
            rule: "channel_forced",
        };
    }
    classify_intent(text)
}

/// Which deterministic edit, if any, an instruction asks for
pub fn classify_edit(text: &str) -> EditKind {
    if DELETE_PATTERN.is_match(text) {
        EditKind::Delete
    } else if DUPLICATE_PATTERN.is_match(text) {
        EditKind::Duplicate
    } else {
        EditKind::Modify
    }
}

/// Structural instructions need the whole document
pub fn is_complex(text: &str) -> bool {
    contains_keyword(text, STRUCTURAL_KEYWORDS)
}

/// The instruction asks for different image content
pub fn wants_image_change(text: &str) -> bool {
    contains_keyword(text, IMAGE_CHANGE_KEYWORDS)
}
