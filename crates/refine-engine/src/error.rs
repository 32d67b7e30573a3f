//! Error types for the refinement pipeline

use email_model::ModelError;
use thiserror::Error;

/// Failures reported by external collaborators (AI completion, image search)
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ServiceError {
    #[error("Request failed: {0}")]
    RequestFailed(String),

    #[error("Rate limited by provider")]
    RateLimited,

    #[error("Timed out after {0}ms")]
    Timeout(u64),

    #[error("Service not configured: {0}")]
    NotConfigured(String),

    #[error("No result for '{0}'")]
    NoResult(String),
}

/// Errors while parsing or editing component source
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SourceError {
    #[error("No markup found in source")]
    NoMarkup,

    #[error("Unexpected end of source at byte {0}")]
    UnexpectedEof(usize),

    #[error("Unexpected '{found}' at byte {pos}, expected {expected}")]
    Unexpected {
        pos: usize,
        found: char,
        expected: &'static str,
    },

    #[error("Closing tag </{found}> at byte {pos} does not match <{expected}>")]
    MismatchedTag {
        expected: String,
        found: String,
        pos: usize,
    },

    #[error("Identity '{0}' appears on more than one element")]
    DuplicateId(String),

    #[error("The root element cannot be deleted or duplicated")]
    RootElement,

    #[error("Unknown target: {0}")]
    UnknownTarget(String),

    #[error("Unknown component: {0}")]
    UnknownComponent(String),

    #[error("Cannot clone element: {0}")]
    CloneFailed(String),
}

/// Pipeline-internal errors. Never surfaced raw to callers of the router.
#[derive(Error, Debug)]
pub enum RefineError {
    #[error("AI service error: {0}")]
    Service(#[from] ServiceError),

    #[error("Could not parse AI response: {0}")]
    ResponseParse(String),

    #[error("Source error: {0}")]
    Source(#[from] SourceError),

    #[error("Schema validation failed: {}", .0.join("; "))]
    Validation(Vec<String>),

    #[error("Model error: {0}")]
    Model(#[from] ModelError),

    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),
}
