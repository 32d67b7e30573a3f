//! Plain-text extraction and subject derivation

use email_model::SemanticBlock;

/// Plain-text output is cut hard at this many characters
pub const MAX_PLAIN_TEXT_CHARS: usize = 500;

/// Derived subjects are cut hard at this many characters
pub const MAX_SUBJECT_CHARS: usize = 80;

const FRAGMENT_SEPARATOR: &str = "\n\n";

/// First `max` characters of `text`. No word-boundary adjustment.
pub fn truncate_chars(text: &str, max: usize) -> String {
    match text.char_indices().nth(max) {
        Some((byte_index, _)) => text[..byte_index].to_string(),
        None => text.to_string(),
    }
}

/// Narrative fragments of one block
fn narrative_fragments(block: &SemanticBlock) -> Vec<String> {
    let mut out = Vec::new();
    match block {
        SemanticBlock::Hero(b) => {
            out.push(b.headline.clone());
            out.extend(b.subheadline.clone());
        }
        SemanticBlock::Features(b) => {
            out.push(b.title.clone());
            out.extend(
                b.features
                    .iter()
                    .map(|f| format!("{}: {}", f.title, f.description)),
            );
        }
        SemanticBlock::Cta(b) => {
            out.push(b.headline.clone());
            out.extend(b.description.clone());
        }
        SemanticBlock::Footer(_) => {}
        SemanticBlock::Testimonial(b) => {
            out.push(format!("\"{}\" - {}", b.quote, b.author));
        }
        SemanticBlock::Stats(b) => {
            out.extend(b.title.clone());
            out.extend(b.stats.iter().map(|s| format!("{} {}", s.value, s.label)));
        }
        SemanticBlock::Pricing(b) => {
            out.extend(b.title.clone());
            out.extend(b.plans.iter().map(|p| format!("{}: {}", p.name, p.price)));
        }
        SemanticBlock::Article(b) => {
            out.push(b.title.clone());
            out.push(b.excerpt.clone());
        }
        SemanticBlock::List(b) => {
            out.push(b.title.clone());
            out.extend(b.items.iter().map(|i| format!("- {}", i)));
        }
        SemanticBlock::Gallery(b) => {
            out.extend(b.title.clone());
        }
        SemanticBlock::Ecommerce(b) => {
            out.extend(b.title.clone());
            out.extend(b.products.iter().map(|p| format!("{} - {}", p.name, p.price)));
        }
        SemanticBlock::Content(b) => {
            out.extend(b.heading.clone());
            out.extend(b.paragraphs.iter().cloned());
        }
        SemanticBlock::Heading(b) => {
            out.push(b.text.clone());
        }
    }
    out.retain(|fragment| !fragment.trim().is_empty());
    out
}

/// Concatenate narrative text across blocks, separated by blank lines,
/// truncated to [`MAX_PLAIN_TEXT_CHARS`]
pub fn render_plain_text(blocks: &[SemanticBlock]) -> String {
    let full = blocks
        .iter()
        .flat_map(narrative_fragments)
        .collect::<Vec<_>>()
        .join(FRAGMENT_SEPARATOR);
    truncate_chars(&full, MAX_PLAIN_TEXT_CHARS)
}

/// Subject line: first non-blank hero headline, else first non-blank heading
/// text, else `default`. Always cut to [`MAX_SUBJECT_CHARS`].
pub fn derive_subject(blocks: &[SemanticBlock], default: &str) -> String {
    let filled = |text: &&str| !text.trim().is_empty();
    let hero = blocks
        .iter()
        .filter_map(|b| match b {
            SemanticBlock::Hero(h) => Some(h.headline.as_str()),
            _ => None,
        })
        .find(filled);
    let heading = || {
        blocks
            .iter()
            .filter_map(|b| match b {
                SemanticBlock::Heading(h) => Some(h.text.as_str()),
                _ => None,
            })
            .find(filled)
    };
    let subject = hero.or_else(heading).unwrap_or(default);
    truncate_chars(subject, MAX_SUBJECT_CHARS)
}

#[cfg(test)]
mod tests {
    use super::*;
    use email_model::{ContentBlock, HeadingBlock, HeroBlock};
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;
    use serde_json::json;

    fn content(paragraphs: Vec<String>) -> SemanticBlock {
        SemanticBlock::Content(ContentBlock {
            id: None,
            heading: None,
            paragraphs,
        })
    }

    fn heading(text: &str) -> SemanticBlock {
        SemanticBlock::Heading(HeadingBlock {
            id: None,
            text: text.to_string(),
            level: None,
        })
    }

    fn hero(headline: &str) -> SemanticBlock {
        SemanticBlock::Hero(HeroBlock {
            id: None,
            headline: headline.to_string(),
            subheadline: None,
            cta_text: "Go".to_string(),
            cta_url: "https://go.example".to_string(),
            image_url: None,
            background_color: None,
        })
    }

    #[test]
    fn test_narrative_fields_joined_with_blank_lines() {
        let blocks: Vec<SemanticBlock> = serde_json::from_value(json!([
            { "blockType": "hero", "headline": "Welcome", "subheadline": "Glad you're here", "ctaText": "Start", "ctaUrl": "https://a.example" },
            { "blockType": "testimonial", "quote": "Great", "author": "Ana" },
            { "blockType": "footer", "companyName": "Acme", "unsubscribeUrl": "https://a.example/u" }
        ]))
        .unwrap();
        assert_eq!(
            render_plain_text(&blocks),
            "Welcome\n\nGlad you're here\n\n\"Great\" - Ana"
        );
    }

    #[test]
    fn test_plain_text_cut_is_exact() {
        let long = "word ".repeat(200);
        let text = render_plain_text(&[content(vec![long.clone()])]);
        assert_eq!(text.chars().count(), 500);
        assert_eq!(text, &long[..500]);
    }

    #[test]
    fn test_subject_prefers_hero_then_heading_then_default() {
        assert_eq!(derive_subject(&[heading("Heading"), hero("Hero")], "d"), "Hero");
        assert_eq!(derive_subject(&[content(vec![]), heading("Heading")], "d"), "Heading");
        assert_eq!(derive_subject(&[], "Default subject"), "Default subject");
    }

    #[test]
    fn test_subject_skips_blank_candidates() {
        assert_eq!(derive_subject(&[hero(""), heading("Heading")], "d"), "Heading");
        assert_eq!(derive_subject(&[hero("  "), hero("Second hero")], "d"), "Second hero");
        assert_eq!(derive_subject(&[hero(" "), heading("\n")], "Default"), "Default");
    }

    #[test]
    fn test_subject_cut_to_80() {
        let long = "A".repeat(81) + " tail";
        assert_eq!(derive_subject(&[hero(&long)], "d"), "A".repeat(80));
        assert_eq!(derive_subject(&[], &"x".repeat(100)).len(), 80);
    }

    #[test]
    fn test_truncate_counts_chars_not_bytes() {
        assert_eq!(truncate_chars("héllo", 2), "hé");
        assert_eq!(truncate_chars("hi", 5), "hi");
    }

    proptest! {
        /// Property: output is exactly the first 500 chars of the untruncated text
        #[test]
        fn plain_text_is_prefix_of_full_text(
            paragraphs in prop::collection::vec("[a-zA-Z ]{1,120}", 1..20)
        ) {
            let blocks = vec![content(paragraphs.clone())];
            let full: Vec<String> = paragraphs.into_iter().filter(|p| !p.trim().is_empty()).collect();
            let full = full.join("\n\n");
            let text = render_plain_text(&blocks);
            let expected: String = full.chars().take(MAX_PLAIN_TEXT_CHARS).collect();
            prop_assert_eq!(text.chars().count(), full.chars().count().min(MAX_PLAIN_TEXT_CHARS));
            prop_assert_eq!(text, expected);
        }
    }
}
