//! Consultation path: answers questions in prose, never edits

use super::EditRouter;
use crate::patterns::FALLBACK_SUGGESTIONS;
use crate::prompts;
use crate::source::SourceTree;
use email_model::{EditOutcome, EmailDocument, RefinementContext};
use tracing::warn;

const MAX_OUTLINE_CHARS: usize = 2000;

/// Short outline of a document for the advisory prompt
fn outline(document: &EmailDocument, id_attr: &str) -> String {
    match document {
        EmailDocument::Blocks(doc) => doc
            .blocks
            .iter()
            .enumerate()
            .map(|(i, block)| format!("{}. {}", i + 1, block.summary()))
            .collect::<Vec<_>>()
            .join("\n"),
        EmailDocument::Source(doc) => match SourceTree::parse(&doc.source, id_attr) {
            Ok(tree) => tree
                .to_component_tree()
                .walk()
                .into_iter()
                .filter_map(|node| {
                    node.content
                        .as_ref()
                        .map(|text| format!("- {}: {}", node.component, text))
                })
                .collect::<Vec<_>>()
                .join("\n"),
            Err(_) => doc.source.chars().take(MAX_OUTLINE_CHARS).collect(),
        },
    }
}

fn fallback_advice() -> String {
    let tips: Vec<String> = FALLBACK_SUGGESTIONS
        .iter()
        .map(|tip| format!("- {}", tip))
        .collect();
    format!(
        "I couldn't review the email just now. A few things that usually help:\n{}",
        tips.join("\n")
    )
}

impl EditRouter {
    pub(super) async fn advise(
        &self,
        question: &str,
        document: EmailDocument,
        context: &RefinementContext,
    ) -> EditOutcome {
        let summary = outline(&document, &self.config.id_attribute);
        let messages = prompts::advisory(question, &summary, context);
        let options = self.options(self.config.scoped_max_tokens, false);

        match self.completion.complete(&messages, &options).await {
            Ok(completion) if !completion.text.trim().is_empty() => {
                EditOutcome::advice(document, completion.text.trim())
            }
            Ok(_) => EditOutcome::advice(document, fallback_advice()).with_degraded(true),
            Err(error) => {
                warn!(%error, "Advisory call failed, using canned suggestions");
                EditOutcome::advice(document, fallback_advice()).with_degraded(true)
            }
        }
    }
}
