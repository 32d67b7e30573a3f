//! Iterative refinement pipeline for email documents
//!
//! An instruction plus the current document goes through the
//! [`EditRouter`], which picks the cheapest sufficient strategy:
//! deterministic structural edit, component-scoped AI edit, or full-document
//! AI edit. AI candidates are reconciled against the prior document by
//! [`merge`] and checked by [`validate`] before acceptance.

pub mod config;
pub mod error;
pub mod images;
pub mod intent;
pub mod merge;
pub mod patterns;
pub mod prompts;
pub mod response;
pub mod router;
pub mod services;
pub mod source;
pub mod validate;

pub use config::{RefineConfig, ValidationLimits};
pub use error::{RefineError, ServiceError, SourceError};
pub use intent::{classify_edit, classify_for_channel, classify_intent, EditKind, Intent, IntentClassification};
pub use merge::{merge_blocks, merge_values, MergeReport};
pub use router::{EditRouter, RefineRequest};
pub use services::{
    Completion, CompletionOptions, CompletionService, ImageQuery, ImageSearch, Message,
    Orientation, ResolvedImage, Role, Usage,
};
pub use source::{Boundary, SourceTree};
pub use validate::{check_completeness, lint_blocks, validate_blocks};
