//! Prompt construction for the AI edit and advisory calls

use crate::services::{Message, ResolvedImage};
use email_model::{BlockType, FieldShape, RefinementContext};
use serde_json::Value;

const BLOCK_RULES: &str = "Return ONLY a JSON object. Keep every field of every block, \
including fields you did not change. Never invent new block types. Keep block ids unchanged.";

const SOURCE_RULES: &str = "Return ONLY a JSON object. Use only components from \
@react-email/components. Keep every data-id attribute unchanged. Inline all styles.";

/// One line per block type listing its required fields
pub fn block_schema() -> String {
    BlockType::ALL
        .iter()
        .map(|block_type| {
            let fields: Vec<String> = block_type
                .required_fields()
                .iter()
                .map(|field| match field.shape {
                    FieldShape::Text => field.name.to_string(),
                    FieldShape::TextList => format!("{}[]", field.name),
                    FieldShape::ItemList(items) => format!("{}[{}]", field.name, items.join(", ")),
                })
                .collect();
            format!("- {}: {}", block_type, fields.join(", "))
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn context_section(context: &RefinementContext) -> String {
    let mut lines = vec!["Brand:".to_string()];
    lines.extend(context.brand_lines().into_iter().map(|l| format!("- {}", l)));
    lines.join("\n")
}

fn images_section(images: &[ResolvedImage]) -> Option<String> {
    if images.is_empty() {
        return None;
    }
    let urls: Vec<String> = images.iter().map(|i| format!("- {}", i.url)).collect();
    Some(format!("Available images (use these URLs for new images):\n{}", urls.join("\n")))
}

fn siblings_section(context: &RefinementContext) -> Option<String> {
    if context.siblings.is_empty() {
        return None;
    }
    let lines: Vec<String> = context
        .siblings
        .iter()
        .map(|s| format!("- {} ({}): {}", s.kind, s.id, s.excerpt))
        .collect();
    Some(format!("Neighbouring elements, for reference only:\n{}", lines.join("\n")))
}

fn user_message(sections: Vec<Option<String>>) -> Message {
    Message::user(sections.into_iter().flatten().collect::<Vec<_>>().join("\n\n"))
}

/// Full block-document edit
pub fn full_blocks(
    instruction: &str,
    blocks: &[Value],
    context: &RefinementContext,
    target_excerpt: Option<&str>,
    images: &[ResolvedImage],
) -> Vec<Message> {
    let system = format!(
        "You edit marketing emails made of typed content blocks.\n\nBlock schema:\n{}\n\n{}\n\
         Respond as {{\"blocks\": [...], \"changes\": [\"short description\", ...]}}.",
        block_schema(),
        BLOCK_RULES
    );
    let document = serde_json::to_string_pretty(blocks).unwrap_or_default();
    vec![
        Message::system(system),
        user_message(vec![
            Some(context_section(context)),
            target_excerpt.map(|t| format!("Selected element:\n{}", t)),
            images_section(images),
            Some(format!("Current blocks:\n{}", document)),
            Some(format!("Instruction: {}", instruction)),
        ]),
    ]
}

/// Edit of a single block
pub fn scoped_block(
    instruction: &str,
    block: &Value,
    context: &RefinementContext,
    images: &[ResolvedImage],
) -> Vec<Message> {
    let system = format!(
        "You edit ONE content block of a marketing email.\n\nBlock schema:\n{}\n\n{}\n\
         Respond as {{\"block\": {{...}}, \"changes\": [\"short description\", ...]}}.",
        block_schema(),
        BLOCK_RULES
    );
    let block = serde_json::to_string_pretty(block).unwrap_or_default();
    vec![
        Message::system(system),
        user_message(vec![
            Some(context_section(context)),
            context
                .target_descriptor
                .as_ref()
                .map(|d| format!("Position: {}", d)),
            siblings_section(context),
            images_section(images),
            Some(format!("Block:\n{}", block)),
            Some(format!("Instruction: {}", instruction)),
        ]),
    ]
}

/// Full source edit
pub fn full_source(
    instruction: &str,
    source: &str,
    context: &RefinementContext,
    target_excerpt: Option<&str>,
    images: &[ResolvedImage],
) -> Vec<Message> {
    let system = format!(
        "You edit React Email templates.\n\n{}\n\
         Respond as {{\"code\": \"<complete file>\", \"changes\": [\"short description\", ...]}}.",
        SOURCE_RULES
    );
    vec![
        Message::system(system),
        user_message(vec![
            Some(context_section(context)),
            target_excerpt.map(|t| format!("Selected element:\n{}", t)),
            images_section(images),
            Some(format!("Current template:\n{}", source)),
            Some(format!("Instruction: {}", instruction)),
        ]),
    ]
}

/// Edit of a single element of a template
pub fn scoped_source(
    instruction: &str,
    element: &str,
    context: &RefinementContext,
    images: &[ResolvedImage],
) -> Vec<Message> {
    let system = format!(
        "You edit ONE element of a React Email template. Return the complete \
         replacement for that element only.\n\n{}\n\
         Respond as {{\"replacement\": \"<element markup>\", \"changes\": [\"short description\", ...]}}.",
        SOURCE_RULES
    );
    vec![
        Message::system(system),
        user_message(vec![
            Some(context_section(context)),
            context
                .target_descriptor
                .as_ref()
                .map(|d| format!("Position: {}", d)),
            siblings_section(context),
            images_section(images),
            Some(format!("Element:\n{}", element)),
            Some(format!("Instruction: {}", instruction)),
        ]),
    ]
}

/// Consultation: answer in prose, never edit
pub fn advisory(question: &str, summary: &str, context: &RefinementContext) -> Vec<Message> {
    vec![
        Message::system(
            "You are an email marketing consultant. Answer the question in a few short \
             sentences of plain prose. Do not rewrite the email and do not return code or JSON.",
        ),
        user_message(vec![
            Some(context_section(context)),
            Some(format!("Email outline:\n{}", summary)),
            Some(format!("Question: {}", question)),
        ]),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::Role;
    use serde_json::json;

    #[test]
    fn test_schema_lists_required_fields() {
        let schema = block_schema();
        assert!(schema.contains("- hero: headline, ctaText, ctaUrl"));
        assert!(schema.contains("- stats: stats[value, label]"));
        assert!(schema.contains("- content: paragraphs[]"));
    }

    #[test]
    fn test_scoped_block_carries_position_and_instruction() {
        let context = RefinementContext {
            target_descriptor: Some("Heading #2 of 3".to_string()),
            ..Default::default()
        };
        let block = json!({ "blockType": "heading", "text": "Hi" });
        let messages = scoped_block("make it shorter", &block, &context, &[]);
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].role, Role::System);
        assert!(messages[1].content.contains("Position: Heading #2 of 3"));
        assert!(messages[1].content.ends_with("Instruction: make it shorter"));
    }

    #[test]
    fn test_images_listed_when_available() {
        let images = vec![ResolvedImage {
            url: "https://img.test/a.jpg".to_string(),
            source: "test".to_string(),
        }];
        let messages = full_source("swap the photo", "<Html />", &RefinementContext::default(), None, &images);
        assert!(messages[1].content.contains("- https://img.test/a.jpg"));
    }
}
