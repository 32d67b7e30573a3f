//! External collaborators: AI text completion and image search
//!
//! Both are black boxes to the pipeline. Implementations live outside this
//! crate; tests use recording doubles.

use crate::error::ServiceError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: String,
}

impl Message {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompletionOptions {
    pub temperature: f32,
    pub max_tokens: u32,
    #[serde(default)]
    pub json_mode: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Usage {
    pub input_tokens: u32,
    pub output_tokens: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Completion {
    pub text: String,
    #[serde(default)]
    pub usage: Usage,
}

/// AI text completion
#[async_trait]
pub trait CompletionService: Send + Sync {
    async fn complete(
        &self,
        messages: &[Message],
        options: &CompletionOptions,
    ) -> Result<Completion, ServiceError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Orientation {
    #[default]
    Landscape,
    Portrait,
    Squarish,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageQuery {
    pub keyword: String,
    pub orientation: Orientation,
    pub width: u32,
    pub height: u32,
}

impl ImageQuery {
    /// Default email hero dimensions
    pub fn landscape(keyword: impl Into<String>) -> Self {
        Self {
            keyword: keyword.into(),
            orientation: Orientation::Landscape,
            width: 600,
            height: 400,
        }
    }
}

/// An opaque asset URL and where it came from
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResolvedImage {
    pub url: String,
    pub source: String,
}

/// Keyword to image URL resolution
#[async_trait]
pub trait ImageSearch: Send + Sync {
    async fn resolve(&self, query: &ImageQuery) -> Result<ResolvedImage, ServiceError>;
}
