//! Tiers for block documents

use super::{failure, EditRouter};
use crate::error::RefineError;
use crate::images::{
    block_image_slots, extract_image_keyword, new_placeholders, resolve_placeholders,
    substitute_blocks,
};
use crate::intent::{classify_edit, is_complex, EditKind};
use crate::merge::merge_blocks;
use crate::prompts;
use crate::response::{BlockResponse, BlocksResponse};
use crate::source::fresh_id;
use crate::validate::{check_completeness, lint_blocks, validate_block, validate_blocks};
use email_model::{
    BlockDocument, EditOutcome, EditStrategy, EmailDocument, RefinementContext, SemanticBlock,
    SiblingSummary,
};
use serde_json::Value;
use std::collections::HashSet;
use tracing::{debug, info, warn};

fn as_values(blocks: &[SemanticBlock]) -> Result<Vec<Value>, RefineError> {
    blocks
        .iter()
        .map(|b| b.to_value().map_err(RefineError::from))
        .collect()
}

fn original_image_urls(blocks: &[SemanticBlock]) -> HashSet<String> {
    blocks
        .iter()
        .flat_map(|b| b.image_urls())
        .map(str::to_string)
        .collect()
}

/// e.g. "Hero #1 of 2"
fn block_descriptor(blocks: &[SemanticBlock], index: usize) -> String {
    let block_type = blocks[index].block_type();
    let same: Vec<usize> = (0..blocks.len())
        .filter(|&i| blocks[i].block_type() == block_type)
        .collect();
    let position = same.iter().position(|&i| i == index).unwrap_or(0) + 1;
    let mut label = block_type.as_str().to_string();
    if let Some(first) = label.get_mut(0..1) {
        first.make_ascii_uppercase();
    }
    format!("{} #{} of {}", label, position, same.len())
}

fn block_siblings(blocks: &[SemanticBlock], index: usize) -> Vec<SiblingSummary> {
    blocks
        .iter()
        .enumerate()
        .filter(|(i, _)| *i != index)
        .map(|(i, block)| SiblingSummary {
            id: block
                .id()
                .map(str::to_string)
                .unwrap_or_else(|| format!("block:{}", i)),
            kind: block.block_type().to_string(),
            excerpt: block.summary(),
        })
        .collect()
}

fn log_completeness(blocks: &[Value]) {
    let violations = check_completeness(blocks);
    if !violations.is_empty() {
        info!(count = violations.len(), violations = ?violations, "Merged blocks incomplete");
    }
}

fn accepted(
    doc: BlockDocument,
    strategy: EditStrategy,
    changes: Vec<String>,
    warnings: Vec<String>,
) -> EditOutcome {
    EditOutcome::edited(EmailDocument::Blocks(doc), strategy, changes)
        .with_validation(Vec::new(), warnings)
}

impl EditRouter {
    pub(super) async fn refine_blocks(
        &self,
        instruction: &str,
        doc: BlockDocument,
        target: Option<&str>,
        context: RefinementContext,
    ) -> EditOutcome {
        let target_index = target.and_then(|t| doc.resolve_target(t));
        if let (Some(selector), None) = (target, target_index) {
            debug!(selector, "Target did not resolve to a block");
        }

        if let Some(index) = target_index {
            match classify_edit(instruction) {
                EditKind::Delete => return self.delete_block(doc, index, &context),
                EditKind::Duplicate => return self.duplicate_block(doc, index, &context),
                EditKind::Modify => {}
            }
            if !is_complex(instruction) {
                match self.scoped_block_edit(instruction, &doc, index, &context).await {
                    Ok(Some(outcome)) => return outcome,
                    Ok(None) => debug!("Scoped edit changed nothing, trying full edit"),
                    Err(error) => warn!(%error, "Scoped edit rejected, trying full edit"),
                }
            }
        }

        match self.full_block_edit(instruction, &doc, target_index, &context).await {
            Ok(outcome) => outcome,
            Err(error) => {
                warn!(%error, "Full edit rejected");
                failure(EmailDocument::Blocks(doc), error)
            }
        }
    }

    fn delete_block(
        &self,
        mut doc: BlockDocument,
        index: usize,
        context: &RefinementContext,
    ) -> EditOutcome {
        let removed = doc.blocks.remove(index);
        info!(index, block_type = %removed.block_type(), "Deleted block");
        let warnings = lint_blocks(&doc.blocks, &self.config.limits, context.email_type.as_deref());
        accepted(
            doc,
            EditStrategy::Deterministic,
            vec![format!("Removed the {} block", removed.block_type())],
            warnings,
        )
    }

    fn duplicate_block(
        &self,
        mut doc: BlockDocument,
        index: usize,
        context: &RefinementContext,
    ) -> EditOutcome {
        let mut copy = doc.blocks[index].clone();
        let block_type = copy.block_type();
        if copy.id().is_some() {
            copy.set_id(Some(fresh_id(block_type.as_str())));
        }
        doc.blocks.insert(index + 1, copy);
        info!(index, %block_type, "Duplicated block");
        let warnings = lint_blocks(&doc.blocks, &self.config.limits, context.email_type.as_deref());
        accepted(
            doc,
            EditStrategy::Deterministic,
            vec![format!("Duplicated the {} block", block_type)],
            warnings,
        )
    }

    /// Resolve every placeholder image the candidate introduced
    async fn fill_placeholders(
        &self,
        blocks: &mut [Value],
        original: &[SemanticBlock],
        instruction: &str,
        context: &RefinementContext,
    ) {
        let Some(search) = &self.images else {
            return;
        };
        let slots = new_placeholders(block_image_slots(blocks), &original_image_urls(original));
        if slots.is_empty() {
            return;
        }
        let keyword = extract_image_keyword(instruction, &context.design_keywords);
        let resolved =
            resolve_placeholders(search.as_ref(), &slots, keyword.as_deref(), &context.design_keywords)
                .await;
        substitute_blocks(blocks, &resolved);
    }

    /// Edit one block. `Ok(None)` when the model changed nothing.
    async fn scoped_block_edit(
        &self,
        instruction: &str,
        doc: &BlockDocument,
        index: usize,
        context: &RefinementContext,
    ) -> Result<Option<EditOutcome>, RefineError> {
        let original = doc.blocks[index].to_value()?;
        let context = RefinementContext {
            target_descriptor: Some(block_descriptor(&doc.blocks, index)),
            siblings: block_siblings(&doc.blocks, index),
            settings: doc.settings.clone(),
            ..context.clone()
        };
        let images = self
            .prefetch_images(instruction, &context, doc.blocks[index].has_images())
            .await;

        let messages = prompts::scoped_block(instruction, &original, &context, &images);
        let response: BlockResponse = self
            .complete_json(&messages, self.config.scoped_max_tokens)
            .await?;

        let mut merged = merge_blocks(std::slice::from_ref(&original), &[response.block]).blocks;
        self.fill_placeholders(&mut merged, &doc.blocks, instruction, &context)
            .await;
        log_completeness(&merged);

        let Some(candidate) = merged.into_iter().next() else {
            return Ok(None);
        };
        let block = validate_block(candidate)
            .map_err(|e| RefineError::Validation(vec![format!("blocks[{}]: {}", index, e)]))?;
        if block == doc.blocks[index] {
            return Ok(None);
        }

        let mut updated = doc.clone();
        updated.blocks[index] = block;
        let warnings = lint_blocks(&updated.blocks, &self.config.limits, context.email_type.as_deref());
        let changes = if response.changes.is_empty() {
            vec![format!("Updated the {} block", updated.blocks[index].block_type())]
        } else {
            response.changes
        };
        Ok(Some(accepted(updated, EditStrategy::ScopedAi, changes, warnings)))
    }

    /// Edit the whole block list
    async fn full_block_edit(
        &self,
        instruction: &str,
        doc: &BlockDocument,
        target_index: Option<usize>,
        context: &RefinementContext,
    ) -> Result<EditOutcome, RefineError> {
        let originals = as_values(&doc.blocks)?;
        let context = RefinementContext {
            settings: doc.settings.clone(),
            ..context.clone()
        };
        let touches_image = target_index.map_or(true, |i| doc.blocks[i].has_images());
        let images = self.prefetch_images(instruction, &context, touches_image).await;
        let excerpt = target_index.map(|i| doc.blocks[i].summary());

        let messages =
            prompts::full_blocks(instruction, &originals, &context, excerpt.as_deref(), &images);
        let response: BlocksResponse = self
            .complete_json(&messages, self.config.max_tokens)
            .await?;

        let report = merge_blocks(&originals, &response.blocks);
        let mut merged = report.blocks;
        self.fill_placeholders(&mut merged, &doc.blocks, instruction, &context)
            .await;
        log_completeness(&merged);

        let blocks = validate_blocks(merged).map_err(RefineError::Validation)?;
        if blocks == doc.blocks {
            return Ok(EditOutcome::unchanged(
                EmailDocument::Blocks(doc.clone()),
                "The edit didn't change anything. Try describing it differently.",
            )
            .with_strategy(EditStrategy::FullAi));
        }

        let mut warnings: Vec<String> = report
            .shape_changes
            .iter()
            .map(|i| format!("blocks[{}] changed type", i))
            .collect();
        warnings.extend(lint_blocks(&blocks, &self.config.limits, context.email_type.as_deref()));

        let updated = BlockDocument {
            blocks,
            ..doc.clone()
        };
        let changes = if response.changes.is_empty() {
            vec!["Updated the email".to_string()]
        } else {
            response.changes
        };
        Ok(accepted(updated, EditStrategy::FullAi, changes, warnings))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use email_model::HeadingBlock;

    fn heading(text: &str) -> SemanticBlock {
        SemanticBlock::Heading(HeadingBlock {
            id: None,
            text: text.to_string(),
            level: None,
        })
    }

    #[test]
    fn test_block_descriptor() {
        let blocks = vec![heading("a"), heading("b"), heading("c")];
        assert_eq!(block_descriptor(&blocks, 1), "Heading #2 of 3");
    }

    #[test]
    fn test_siblings_use_positional_selectors() {
        let blocks = vec![heading("a"), heading("b")];
        let siblings = block_siblings(&blocks, 0);
        assert_eq!(siblings.len(), 1);
        assert_eq!(siblings[0].id, "block:1");
        assert_eq!(siblings[0].excerpt, "heading: b");
    }
}
