//! Global style settings threaded through every block renderer

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct StyleSettings {
    pub primary_color: String,
    /// `None` when explicitly cleared
    pub secondary_color: Option<String>,
    pub font_family: String,
    /// Maximum content width in pixels
    pub max_width: u32,
    pub background_color: String,
    pub text_color: String,
}

impl Default for StyleSettings {
    fn default() -> Self {
        Self {
            primary_color: "#2563eb".to_string(),
            secondary_color: Some("#64748b".to_string()),
            font_family: "Helvetica, Arial, sans-serif".to_string(),
            max_width: 600,
            background_color: "#f4f4f5".to_string(),
            text_color: "#18181b".to_string(),
        }
    }
}

impl StyleSettings {
    /// Secondary color, falling back to the text color when cleared
    pub fn secondary_or_text(&self) -> &str {
        self.secondary_color.as_deref().unwrap_or(&self.text_color)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_settings_fill_defaults() {
        let settings: StyleSettings =
            serde_json::from_str(r##"{"primaryColor":"#ff0000","secondaryColor":null}"##).unwrap();
        assert_eq!(settings.primary_color, "#ff0000");
        assert_eq!(settings.secondary_color, None);
        assert_eq!(settings.max_width, 600);
        assert_eq!(settings.secondary_or_text(), settings.text_color);
    }
}
