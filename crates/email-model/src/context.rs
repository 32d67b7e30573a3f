//! Ancillary data passed along with an AI edit call.
//!
//! Recomputed for every refinement request and never persisted.

use crate::settings::StyleSettings;
use serde::{Deserialize, Serialize};

/// Where an instruction came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceChannel {
    #[default]
    Chat,
    /// Toolbar actions are always commands
    Toolbar,
    VisualEditor,
}

impl SourceChannel {
    pub fn forces_command(&self) -> bool {
        matches!(self, Self::Toolbar)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SiblingSummary {
    pub id: String,
    pub kind: String,
    pub excerpt: String,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RefinementContext {
    pub subject: Option<String>,
    pub preview_text: Option<String>,
    pub campaign_name: Option<String>,
    pub original_prompt: Option<String>,
    /// Email type used for CTA limits (promotional, newsletter, ...)
    pub email_type: Option<String>,
    /// e.g. "Heading #2 of 3"
    pub target_descriptor: Option<String>,
    pub siblings: Vec<SiblingSummary>,
    pub settings: StyleSettings,
    /// Thematic keywords of the active design system, used to bias image search
    pub design_keywords: Vec<String>,
}

impl RefinementContext {
    /// Brand identity lines included in AI prompts
    pub fn brand_lines(&self) -> Vec<String> {
        let mut lines = vec![
            format!("Primary color: {}", self.settings.primary_color),
            format!("Font family: {}", self.settings.font_family),
        ];
        if let Some(secondary) = &self.settings.secondary_color {
            lines.push(format!("Secondary color: {}", secondary));
        }
        if let Some(name) = &self.campaign_name {
            lines.push(format!("Campaign: {}", name));
        }
        if let Some(subject) = &self.subject {
            lines.push(format!("Subject: {}", subject));
        }
        if let Some(preview) = &self.preview_text {
            lines.push(format!("Preview text: {}", preview));
        }
        if let Some(prompt) = &self.original_prompt {
            lines.push(format!("Original request: {}", prompt));
        }
        lines
    }
}
