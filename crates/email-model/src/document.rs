//! The two alternative representations of an email

use crate::blocks::SemanticBlock;
use crate::settings::StyleSettings;
use serde::{Deserialize, Serialize};

/// Email as an ordered list of semantic blocks
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlockDocument {
    #[serde(default)]
    pub blocks: Vec<SemanticBlock>,
    #[serde(default)]
    pub settings: StyleSettings,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub preview_text: Option<String>,
}

impl BlockDocument {
    pub fn new(blocks: Vec<SemanticBlock>) -> Self {
        Self {
            blocks,
            ..Default::default()
        }
    }

    /// Resolve a target selector to a block index.
    ///
    /// Accepts a block `id` or a positional selector of the form `block:<index>`.
    pub fn resolve_target(&self, selector: &str) -> Option<usize> {
        if let Some(index) = selector
            .strip_prefix("block:")
            .and_then(|raw| raw.trim().parse::<usize>().ok())
        {
            return (index < self.blocks.len()).then_some(index);
        }
        self.blocks.iter().position(|b| b.id() == Some(selector))
    }
}

/// Email as templated component source text
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SourceDocument {
    pub source: String,
    #[serde(default)]
    pub settings: StyleSettings,
}

impl SourceDocument {
    pub fn new(source: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            settings: StyleSettings::default(),
        }
    }
}

/// Current document state handed to the refinement pipeline
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum EmailDocument {
    Blocks(BlockDocument),
    Source(SourceDocument),
}

impl EmailDocument {
    /// True when there is nothing to refine yet
    pub fn is_empty(&self) -> bool {
        match self {
            Self::Blocks(doc) => doc.blocks.is_empty(),
            Self::Source(doc) => doc.source.trim().is_empty(),
        }
    }

    pub fn settings(&self) -> &StyleSettings {
        match self {
            Self::Blocks(doc) => &doc.settings,
            Self::Source(doc) => &doc.settings,
        }
    }
}

impl Default for EmailDocument {
    fn default() -> Self {
        Self::Blocks(BlockDocument::default())
    }
}
