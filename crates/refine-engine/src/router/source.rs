//! Tiers for template source documents

use super::{failure, EditRouter};
use crate::error::{RefineError, SourceError};
use crate::images::{
    extract_image_keyword, new_placeholders, resolve_placeholders, source_image_slots,
    substitute_source,
};
use crate::intent::{classify_edit, is_complex, EditKind};
use crate::prompts;
use crate::response::{strip_code_fence, ReplacementResponse, SourceResponse};
use crate::source::{NodeId, SourceTree};
use email_model::{EditOutcome, EditStrategy, EmailDocument, RefinementContext, SourceDocument};
use std::collections::HashSet;
use tracing::{debug, info, warn};

fn subtree_has_image(tree: &SourceTree, node: NodeId) -> bool {
    tree.subtree(node)
        .into_iter()
        .any(|n| tree.node(n).tag.eq_ignore_ascii_case("img"))
}

fn with_source(doc: &SourceDocument, source: String) -> EmailDocument {
    EmailDocument::Source(SourceDocument {
        source,
        settings: doc.settings.clone(),
    })
}

impl EditRouter {
    pub(super) async fn refine_source(
        &self,
        instruction: &str,
        doc: SourceDocument,
        target: Option<&str>,
        context: RefinementContext,
    ) -> EditOutcome {
        let tree = match SourceTree::parse(&doc.source, &self.config.id_attribute) {
            Ok(tree) => Some(tree),
            Err(error) => {
                warn!(%error, "Source did not parse, structural edits unavailable");
                None
            }
        };
        let target_id = match (&tree, target) {
            (Some(tree), Some(id)) if tree.find(id).is_some() => Some(id),
            (_, Some(id)) => {
                debug!(id, "Target did not resolve to an element");
                None
            }
            _ => None,
        };

        if let (Some(tree), Some(id)) = (&tree, target_id) {
            let edit_kind = classify_edit(instruction);
            let deterministic = match edit_kind {
                EditKind::Delete => Some(self.delete_element(tree.clone(), id, &doc)),
                EditKind::Duplicate => Some(self.duplicate_element(tree.clone(), id, &doc)),
                EditKind::Modify => None,
            };
            match deterministic {
                Some(Ok(outcome)) => return outcome,
                Some(Err(error)) => warn!(%error, "Structural edit failed, trying AI edit"),
                None => {}
            }

            // a failed delete leaves nothing to scope the edit to
            if edit_kind != EditKind::Delete && !is_complex(instruction) {
                match self.scoped_source_edit(instruction, &doc, tree, id, &context).await {
                    Ok(Some(outcome)) => return outcome,
                    Ok(None) => debug!("Scoped edit changed nothing, trying full edit"),
                    Err(error) => warn!(%error, "Scoped edit rejected, trying full edit"),
                }
            }
        }

        match self
            .full_source_edit(instruction, &doc, tree.as_ref(), target_id, &context)
            .await
        {
            Ok(outcome) => outcome,
            Err(error) => {
                warn!(%error, "Full edit rejected");
                failure(EmailDocument::Source(doc), error)
            }
        }
    }

    fn delete_element(
        &self,
        mut tree: SourceTree,
        id: &str,
        doc: &SourceDocument,
    ) -> Result<EditOutcome, RefineError> {
        let kind = tree.find(id).map(|n| tree.node(n).tag.clone()).unwrap_or_default();
        tree.delete(id)?;
        info!(id, %kind, "Deleted element");
        Ok(EditOutcome::edited(
            with_source(doc, tree.into_source()),
            EditStrategy::Deterministic,
            vec![format!("Removed the {} element", kind)],
        ))
    }

    fn duplicate_element(
        &self,
        mut tree: SourceTree,
        id: &str,
        doc: &SourceDocument,
    ) -> Result<EditOutcome, RefineError> {
        let kind = tree.find(id).map(|n| tree.node(n).tag.clone()).unwrap_or_default();
        let duplicated = tree.duplicate(id)?;
        info!(id, new_id = ?duplicated.new_id, degraded = duplicated.degraded, "Duplicated element");

        let warnings = if duplicated.degraded {
            vec!["The copy keeps the original's ids; they may repeat".to_string()]
        } else {
            Vec::new()
        };
        Ok(EditOutcome::edited(
            with_source(doc, tree.into_source()),
            EditStrategy::Deterministic,
            vec![format!("Duplicated the {} element", kind)],
        )
        .with_degraded(duplicated.degraded)
        .with_validation(Vec::new(), warnings))
    }

    /// Resolve placeholder images the candidate introduced
    async fn fill_source_placeholders(
        &self,
        candidate: &str,
        original: &str,
        instruction: &str,
        context: &RefinementContext,
    ) -> String {
        let Some(search) = &self.images else {
            return candidate.to_string();
        };
        let original_urls: HashSet<String> =
            source_image_slots(original).into_iter().map(|s| s.url).collect();
        let slots = new_placeholders(source_image_slots(candidate), &original_urls);
        if slots.is_empty() {
            return candidate.to_string();
        }
        let keyword = extract_image_keyword(instruction, &context.design_keywords);
        let resolved =
            resolve_placeholders(search.as_ref(), &slots, keyword.as_deref(), &context.design_keywords)
                .await;
        substitute_source(candidate, &resolved)
    }

    /// Edit one element. `Ok(None)` when the model changed nothing.
    async fn scoped_source_edit(
        &self,
        instruction: &str,
        doc: &SourceDocument,
        tree: &SourceTree,
        id: &str,
        context: &RefinementContext,
    ) -> Result<Option<EditOutcome>, RefineError> {
        let node = tree
            .find(id)
            .ok_or_else(|| SourceError::UnknownTarget(id.to_string()))?;
        let element = tree.text_of(node);
        let context = RefinementContext {
            target_descriptor: tree.position_descriptor(id),
            siblings: tree.sibling_summaries(node),
            settings: doc.settings.clone(),
            ..context.clone()
        };
        let images = self
            .prefetch_images(instruction, &context, subtree_has_image(tree, node))
            .await;

        let messages = prompts::scoped_source(instruction, element, &context, &images);
        let response: ReplacementResponse = self
            .complete_json(&messages, self.config.scoped_max_tokens)
            .await?;

        let replacement = strip_code_fence(&response.replacement);
        let replacement = self
            .fill_source_placeholders(replacement, &doc.source, instruction, &context)
            .await;

        let mut edited = tree.clone();
        let replaced = edited.replace(id, &replacement)?;
        if !replaced.changed {
            return Ok(None);
        }

        let mut changes = if response.changes.is_empty() {
            vec![format!("Updated the {} element", tree.node(node).tag)]
        } else {
            response.changes
        };
        if !replaced.added_imports.is_empty() {
            changes.push(format!("Imported {}", replaced.added_imports.join(", ")));
        }
        Ok(Some(
            EditOutcome::edited(
                with_source(doc, edited.into_source()),
                EditStrategy::ScopedAi,
                changes,
            ),
        ))
    }

    /// Edit the whole template
    async fn full_source_edit(
        &self,
        instruction: &str,
        doc: &SourceDocument,
        tree: Option<&SourceTree>,
        target_id: Option<&str>,
        context: &RefinementContext,
    ) -> Result<EditOutcome, RefineError> {
        let target = tree.zip(target_id).and_then(|(tree, id)| Some((tree, tree.find(id)?)));
        let excerpt = target.map(|(tree, node)| tree.text_of(node));
        let touches_image = target.map_or(true, |(tree, node)| subtree_has_image(tree, node));
        let context = RefinementContext {
            settings: doc.settings.clone(),
            ..context.clone()
        };
        let images = self.prefetch_images(instruction, &context, touches_image).await;

        let messages = prompts::full_source(instruction, &doc.source, &context, excerpt, &images);
        let response: SourceResponse = self
            .complete_json(&messages, self.config.max_tokens)
            .await?;

        let code = strip_code_fence(&response.code);
        let code = self
            .fill_source_placeholders(code, &doc.source, instruction, &context)
            .await;

        let mut candidate = SourceTree::parse(&code, &self.config.id_attribute)
            .map_err(|e| RefineError::Validation(vec![format!("template: {}", e)]))?;
        let added = candidate
            .complete_imports()
            .map_err(|e| RefineError::Validation(vec![format!("template: {}", e)]))?;
        let code = candidate.into_source();

        if code.trim() == doc.source.trim() {
            return Ok(EditOutcome::unchanged(
                EmailDocument::Source(doc.clone()),
                "The edit didn't change anything. Try describing it differently.",
            )
            .with_strategy(EditStrategy::FullAi));
        }

        let mut changes = if response.changes.is_empty() {
            vec!["Updated the email".to_string()]
        } else {
            response.changes
        };
        if !added.is_empty() {
            changes.push(format!("Imported {}", added.join(", ")));
        }
        Ok(EditOutcome::edited(with_source(doc, code), EditStrategy::FullAi, changes))
    }
}
