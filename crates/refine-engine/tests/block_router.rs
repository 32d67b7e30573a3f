//! Edit router behaviour on block documents

mod common;

use common::{RecordingImages, ScriptedCompletion};
use email_model::{
    BlockDocument, EditStrategy, EmailDocument, OutcomeKind, SemanticBlock, SourceChannel,
};
use pretty_assertions::assert_eq;
use refine_engine::{EditRouter, RefineConfig, RefineRequest, ServiceError};
use serde_json::{json, Value};
use std::sync::Arc;

// ============================================================
// Fixtures
// ============================================================

fn hero() -> Value {
    json!({
        "blockType": "hero",
        "headline": "Spring collection is here",
        "ctaText": "Shop now",
        "ctaUrl": "https://acme.test/spring",
        "imageUrl": "https://placehold.co/logo"
    })
}

fn footer() -> Value {
    json!({
        "blockType": "footer",
        "companyName": "Acme",
        "unsubscribeUrl": "https://acme.test/unsubscribe"
    })
}

fn document() -> EmailDocument {
    let blocks: Vec<SemanticBlock> = serde_json::from_value(json!([hero(), footer()])).unwrap();
    EmailDocument::Blocks(BlockDocument::new(blocks))
}

fn blocks_of(document: &EmailDocument) -> &[SemanticBlock] {
    match document {
        EmailDocument::Blocks(doc) => &doc.blocks,
        EmailDocument::Source(_) => panic!("expected a block document"),
    }
}

fn router(completion: Arc<ScriptedCompletion>) -> EditRouter {
    EditRouter::new(completion, RefineConfig::default())
}

// ============================================================
// Short circuits: no AI call
// ============================================================

#[tokio::test]
async fn low_confidence_instruction_never_calls_the_ai() {
    let ai = ScriptedCompletion::silent();
    let outcome = router(ai.clone())
        .refine(RefineRequest::new("hmm", document()))
        .await;

    assert_eq!(outcome.kind, OutcomeKind::Clarification);
    assert!(!outcome.changed);
    assert_eq!(outcome.document, document());
    assert_eq!(ai.call_count(), 0);
}

#[tokio::test]
async fn invalid_input_and_empty_documents_fail_without_ai() {
    let ai = ScriptedCompletion::silent();
    let router = router(ai.clone());

    let blank = router.refine(RefineRequest::new("   ", document())).await;
    assert_eq!(blank.kind, OutcomeKind::Failed);

    let long = router
        .refine(RefineRequest::new("make ".repeat(500), document()))
        .await;
    assert_eq!(long.kind, OutcomeKind::Failed);
    assert!(long.message.contains("too long"));

    let empty = router
        .refine(RefineRequest::new("make it pop", EmailDocument::default()))
        .await;
    assert_eq!(empty.kind, OutcomeKind::Failed);
    assert!(empty.message.contains("nothing to refine"));

    assert_eq!(ai.call_count(), 0);
}

#[tokio::test]
async fn delete_with_target_is_deterministic() {
    let ai = ScriptedCompletion::silent();
    let outcome = router(ai.clone())
        .refine(RefineRequest::new("delete this", document()).with_target("block:0"))
        .await;

    assert_eq!(outcome.strategy, EditStrategy::Deterministic);
    assert_eq!(blocks_of(&outcome.document).len(), 1);
    assert_eq!(outcome.message, "Removed the hero block");
    assert_eq!(ai.call_count(), 0);
}

#[tokio::test]
async fn duplicate_with_target_inserts_after_original() {
    let ai = ScriptedCompletion::silent();
    let outcome = router(ai.clone())
        .refine(RefineRequest::new("duplicate this", document()).with_target("block:0"))
        .await;

    let blocks = blocks_of(&outcome.document);
    assert_eq!(blocks.len(), 3);
    assert_eq!(blocks[0], blocks[1]);
    assert_eq!(ai.call_count(), 0);
}

// ============================================================
// Tier fallthrough
// ============================================================

#[tokio::test]
async fn scoped_edit_with_no_changes_falls_through_to_full_edit() {
    let ai = ScriptedCompletion::replying(vec![
        json!({ "block": {}, "changes": [] }),
        json!({
            "blocks": [{ "blockType": "hero", "headline": "Spring is on" }, { "blockType": "footer" }],
            "changes": ["Punchier headline"]
        }),
    ]);
    let outcome = router(ai.clone())
        .refine(RefineRequest::new("make the headline punchier", document()).with_target("block:0"))
        .await;

    let calls = ai.calls();
    assert_eq!(calls.len(), 2);
    assert!(calls[0].is_scoped());
    assert_eq!(calls[0].options.max_tokens, 1500);
    assert!(!calls[1].is_scoped());
    assert_eq!(calls[1].options.max_tokens, 4096);
    assert!(calls.iter().all(|c| c.options.json_mode));

    assert_eq!(outcome.strategy, EditStrategy::FullAi);
    assert_eq!(outcome.message, "Punchier headline");
    let hero = serde_json::to_value(&blocks_of(&outcome.document)[0]).unwrap();
    assert_eq!(hero["headline"], "Spring is on");
    assert_eq!(hero["ctaUrl"], "https://acme.test/spring");
    assert_eq!(blocks_of(&outcome.document)[1], blocks_of(&document())[1]);
}

#[tokio::test]
async fn scoped_edit_failing_validation_falls_through() {
    let ai = ScriptedCompletion::replying(vec![
        json!({ "block": { "headline": null } }),
        json!({ "blocks": [{ "headline": "Fresh picks" }, {}] }),
    ]);
    let outcome = router(ai.clone())
        .refine(RefineRequest::new("change the headline", document()).with_target("block:0"))
        .await;

    assert_eq!(ai.call_count(), 2);
    assert_eq!(outcome.strategy, EditStrategy::FullAi);
    assert!(outcome.valid);
}

#[tokio::test]
async fn scoped_edit_merges_partial_block() {
    let ai = ScriptedCompletion::replying(vec![json!({
        "block": { "ctaText": "Shop the sale" },
        "changes": ["Updated the button text"]
    })]);
    let outcome = router(ai.clone())
        .refine(RefineRequest::new("change the button text", document()).with_target("block:0"))
        .await;

    assert_eq!(ai.call_count(), 1);
    assert_eq!(outcome.strategy, EditStrategy::ScopedAi);
    let hero = serde_json::to_value(&blocks_of(&outcome.document)[0]).unwrap();
    assert_eq!(hero["ctaText"], "Shop the sale");
    assert_eq!(hero["headline"], "Spring collection is here");
    let prompt = &ai.calls()[0].messages[1].content;
    assert!(prompt.contains("Position: Hero #1 of 1"));
}

#[tokio::test]
async fn structural_instruction_skips_scoped_edit() {
    let ai = ScriptedCompletion::replying(vec![json!({ "blocks": [{}, {}], "changes": [] })]);
    let outcome = router(ai.clone())
        .refine(RefineRequest::new("move this below the footer", document()).with_target("block:0"))
        .await;

    assert_eq!(ai.call_count(), 1);
    assert!(!ai.calls()[0].is_scoped());
    assert_eq!(outcome.kind, OutcomeKind::Unchanged);
}

// ============================================================
// Recoverable failures keep the prior document
// ============================================================

#[tokio::test]
async fn ai_failure_returns_prior_document() {
    let ai = ScriptedCompletion::new(vec![Err(ServiceError::Timeout(30_000))]);
    let outcome = router(ai)
        .refine(RefineRequest::new("make it more playful", document()))
        .await;

    assert!(!outcome.success);
    assert_eq!(outcome.kind, OutcomeKind::Failed);
    assert_eq!(outcome.document, document());
}

#[tokio::test]
async fn unparseable_response_returns_prior_document() {
    let ai = ScriptedCompletion::new(vec![Ok("Sure! I made it more playful.".to_string())]);
    let outcome = router(ai)
        .refine(RefineRequest::new("make it more playful", document()))
        .await;

    assert_eq!(outcome.kind, OutcomeKind::Failed);
    assert_eq!(outcome.document, document());
}

#[tokio::test]
async fn incomplete_full_edit_is_rejected_with_errors() {
    let ai = ScriptedCompletion::replying(vec![json!({
        "blocks": [{}, {}, { "blockType": "cta", "headline": "Extra" }]
    })]);
    let outcome = router(ai)
        .refine(RefineRequest::new("add a call to action", document()))
        .await;

    assert_eq!(outcome.kind, OutcomeKind::Failed);
    assert!(!outcome.valid);
    assert_eq!(outcome.validation_errors.len(), 1);
    assert!(outcome.validation_errors[0].starts_with("blocks[2]"));
    assert_eq!(outcome.document, document());
}

#[tokio::test]
async fn toolbar_command_fails_gracefully() {
    let ai = ScriptedCompletion::silent();
    let outcome = router(ai.clone())
        .refine(RefineRequest::new("what?", document()).with_channel(SourceChannel::Toolbar))
        .await;

    assert_eq!(ai.call_count(), 1);
    assert_eq!(outcome.kind, OutcomeKind::Failed);
    assert_eq!(outcome.document, document());
}

// ============================================================
// Advisory path
// ============================================================

#[tokio::test]
async fn questions_get_prose_answers_without_edits() {
    let ai = ScriptedCompletion::new(vec![Ok("Lead with the discount.".to_string())]);
    let outcome = router(ai.clone())
        .refine(RefineRequest::new("What subject line works best?", document()))
        .await;

    assert_eq!(outcome.kind, OutcomeKind::Advice);
    assert_eq!(outcome.message, "Lead with the discount.");
    assert!(!outcome.changed);
    assert_eq!(outcome.document, document());
    assert!(!ai.calls()[0].options.json_mode);
}

#[tokio::test]
async fn advisory_failure_degrades_to_canned_suggestions() {
    let ai = ScriptedCompletion::new(vec![Err(ServiceError::RateLimited)]);
    let outcome = router(ai)
        .refine(RefineRequest::new("How can I improve this email?", document()))
        .await;

    assert_eq!(outcome.kind, OutcomeKind::Advice);
    assert!(outcome.success);
    assert!(outcome.degraded);
    assert!(outcome.message.contains("usually help"));
}

// ============================================================
// Image resolution
// ============================================================

#[tokio::test]
async fn new_placeholder_images_are_resolved_and_originals_kept() {
    let ai = ScriptedCompletion::replying(vec![json!({
        "blocks": [
            { "blockType": "hero" },
            { "blockType": "gallery", "images": [
                { "url": "https://placehold.co/600x400", "alt": "Mountain lake" },
                { "url": "https://placehold.co/600x401", "alt": "Forest trail" }
            ]},
            footer()
        ],
        "changes": ["Added a gallery"]
    })]);
    let images = Arc::new(RecordingImages::default());
    let router = router(ai).with_image_search(images.clone());
    let outcome = router
        .refine(RefineRequest::new("add a gallery section", document()))
        .await;

    let mut keywords = images.keywords();
    keywords.sort();
    assert_eq!(keywords, vec!["forest trail", "mountain lake"]);

    let blocks = serde_json::to_value(blocks_of(&outcome.document)).unwrap();
    assert_eq!(blocks[0]["imageUrl"], "https://placehold.co/logo");
    assert_eq!(blocks[1]["images"][0]["url"], "https://images.test/mountain-lake.jpg");
    assert_eq!(blocks[1]["images"][1]["url"], "https://images.test/forest-trail.jpg");
    assert!(outcome
        .validation_warnings
        .contains(&"blocks[1] changed type".to_string()));
}
