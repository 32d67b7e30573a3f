//! Pipeline configuration

use std::collections::HashMap;

/// Tunable CTA limits per email type.
///
/// Exceeding a limit produces a validation warning, never a blocking error.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidationLimits {
    pub max_ctas: HashMap<String, usize>,
    /// Used when the email type is unknown or unset
    pub default_max_ctas: usize,
}

impl Default for ValidationLimits {
    fn default() -> Self {
        let max_ctas = [
            ("promotional", 3),
            ("newsletter", 4),
            ("transactional", 1),
            ("announcement", 2),
        ]
        .into_iter()
        .map(|(kind, max)| (kind.to_string(), max))
        .collect();
        Self {
            max_ctas,
            default_max_ctas: 3,
        }
    }
}

impl ValidationLimits {
    pub fn max_ctas_for(&self, email_type: Option<&str>) -> usize {
        email_type
            .and_then(|t| self.max_ctas.get(&t.to_ascii_lowercase()))
            .copied()
            .unwrap_or(self.default_max_ctas)
    }
}

/// Configuration for the edit router
#[derive(Debug, Clone, PartialEq)]
pub struct RefineConfig {
    /// Below this intent confidence the router asks for clarification
    pub intent_threshold: f32,

    pub temperature: f32,

    /// Token budget for full-document edits
    pub max_tokens: u32,

    /// Token budget for component-scoped edits
    pub scoped_max_tokens: u32,

    /// Attribute carrying a component's stable identity in source documents
    pub id_attribute: String,

    /// Longest instruction accepted
    pub max_instruction_chars: usize,

    pub limits: ValidationLimits,
}

impl Default for RefineConfig {
    fn default() -> Self {
        Self {
            intent_threshold: 0.5,
            temperature: 0.4,
            max_tokens: 4096,
            scoped_max_tokens: 1500,
            id_attribute: "data-id".to_string(),
            max_instruction_chars: 2000,
            limits: ValidationLimits::default(),
        }
    }
}

impl RefineConfig {
    /// Load from environment variables, falling back to defaults
    pub fn from_env() -> Self {
        let defaults = Self::default();
        let mut limits = defaults.limits.clone();
        if let Some(max) = env_parse::<usize>("REFINE_MAX_CTAS") {
            limits.default_max_ctas = max;
        }
        Self {
            intent_threshold: env_parse("REFINE_INTENT_THRESHOLD")
                .unwrap_or(defaults.intent_threshold),
            temperature: env_parse("REFINE_TEMPERATURE").unwrap_or(defaults.temperature),
            max_tokens: env_parse("REFINE_MAX_TOKENS").unwrap_or(defaults.max_tokens),
            scoped_max_tokens: env_parse("REFINE_SCOPED_MAX_TOKENS")
                .unwrap_or(defaults.scoped_max_tokens),
            id_attribute: std::env::var("REFINE_ID_ATTRIBUTE")
                .ok()
                .filter(|v| !v.trim().is_empty())
                .unwrap_or(defaults.id_attribute),
            max_instruction_chars: env_parse("REFINE_MAX_INSTRUCTION_CHARS")
                .unwrap_or(defaults.max_instruction_chars),
            limits,
        }
    }
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    std::env::var(key).ok().and_then(|v| v.trim().parse().ok())
}
