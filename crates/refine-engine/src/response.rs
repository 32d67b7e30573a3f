//! Parsing of AI edit responses
//!
//! Models are asked for a JSON object but routinely wrap it in code fences or
//! prose. The object is taken from the first `{` to the last `}`.

use crate::error::RefineError;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;

/// Full block-document edit
#[derive(Debug, Clone, Deserialize)]
pub struct BlocksResponse {
    pub blocks: Vec<Value>,
    #[serde(default)]
    pub changes: Vec<String>,
}

/// Single-block scoped edit
#[derive(Debug, Clone, Deserialize)]
pub struct BlockResponse {
    pub block: Value,
    #[serde(default)]
    pub changes: Vec<String>,
}

/// Full source edit
#[derive(Debug, Clone, Deserialize)]
pub struct SourceResponse {
    pub code: String,
    #[serde(default)]
    pub changes: Vec<String>,
}

/// Scoped source edit
#[derive(Debug, Clone, Deserialize)]
pub struct ReplacementResponse {
    pub replacement: String,
    #[serde(default)]
    pub changes: Vec<String>,
}

/// Locate the JSON object inside a model response
pub fn extract_json(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    (end > start).then(|| &text[start..=end])
}

/// Parse a model response into `T`
pub fn parse_response<T: DeserializeOwned>(text: &str) -> Result<T, RefineError> {
    let json = extract_json(text)
        .ok_or_else(|| RefineError::ResponseParse("no JSON object in response".to_string()))?;
    serde_json::from_str(json).map_err(|e| RefineError::ResponseParse(e.to_string()))
}

/// Strip a surrounding markdown code fence, if any
pub fn strip_code_fence(text: &str) -> &str {
    let trimmed = text.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let body = rest.split_once('\n').map_or("", |(_, body)| body);
    body.trim_end().strip_suffix("```").unwrap_or(body).trim()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_parses_fenced_response() {
        let text = "Here you go:\n```json\n{\"blocks\": [{\"blockType\": \"heading\", \"text\": \"Hi\"}], \"changes\": [\"Shortened heading\"]}\n```";
        let parsed: BlocksResponse = parse_response(text).unwrap();
        assert_eq!(parsed.blocks.len(), 1);
        assert_eq!(parsed.changes, vec!["Shortened heading"]);
    }

    #[test]
    fn test_changes_default_to_empty() {
        let parsed: ReplacementResponse = parse_response(r#"{"replacement": "<Text>x</Text>"}"#).unwrap();
        assert!(parsed.changes.is_empty());
    }

    #[test]
    fn test_invalid_json_is_parse_error() {
        assert!(matches!(
            parse_response::<BlockResponse>("no json here"),
            Err(RefineError::ResponseParse(_))
        ));
        assert!(matches!(
            parse_response::<BlockResponse>("{\"block\": [1, 2}"),
            Err(RefineError::ResponseParse(_))
        ));
        assert!(matches!(
            parse_response::<SourceResponse>("{\"changes\": []}"),
            Err(RefineError::ResponseParse(_))
        ));
    }

    #[test]
    fn test_strip_code_fence() {
        assert_eq!(strip_code_fence("```tsx\n<Text />\n```"), "<Text />");
        assert_eq!(strip_code_fence("  <Text />  "), "<Text />");
    }
}
