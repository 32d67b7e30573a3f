//! Email rendering engine
//!
//! Side-effect-free transformation of an accepted [`BlockDocument`] into:
//! - an HTML email body ([`render_html`])
//! - a plain-text alternative ([`render_plain_text`])
//! - a subject line when the caller did not supply one ([`derive_subject`])

pub mod html;
pub mod text;

pub use html::{escape_attr, escape_html, render_block, render_html};
pub use text::{derive_subject, render_plain_text, truncate_chars, MAX_PLAIN_TEXT_CHARS, MAX_SUBJECT_CHARS};

use email_model::BlockDocument;
use serde::{Deserialize, Serialize};

/// Everything persistence needs to store a rendered email
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RenderedEmail {
    pub subject: String,
    pub html: String,
    pub text: String,
}

/// Render a block document into subject, HTML and plain text
pub fn render_email(document: &BlockDocument, default_subject: &str) -> RenderedEmail {
    let rendered = RenderedEmail {
        subject: derive_subject(&document.blocks, default_subject),
        html: render_html(document),
        text: render_plain_text(&document.blocks),
    };
    tracing::debug!(
        blocks = document.blocks.len(),
        html_bytes = rendered.html.len(),
        "Rendered email"
    );
    rendered
}

#[cfg(test)]
mod tests {
    use super::*;
    use email_model::SemanticBlock;
    use serde_json::json;

    #[test]
    fn test_render_email_combines_outputs() {
        let blocks: Vec<SemanticBlock> = serde_json::from_value(json!([
            { "blockType": "hero", "headline": "Big News", "ctaText": "Read", "ctaUrl": "https://x.example" },
            { "blockType": "footer", "companyName": "Acme", "unsubscribeUrl": "https://x.example/u" }
        ]))
        .unwrap();
        let rendered = render_email(&BlockDocument::new(blocks), "Fallback");
        assert_eq!(rendered.subject, "Big News");
        assert!(rendered.html.contains("Big News"));
        assert_eq!(rendered.text, "Big News");
    }
}
