//! Edit router behaviour on template source documents

mod common;

use common::{RecordingImages, ScriptedCompletion};
use email_model::{EditOutcome, EditStrategy, EmailDocument, OutcomeKind, SourceDocument};
use pretty_assertions::assert_eq;
use refine_engine::{EditRouter, RefineConfig, RefineRequest, SourceTree};
use serde_json::json;
use std::sync::Arc;

const TEMPLATE: &str = r#"import { Html, Section, Text } from "@react-email/components";

export default function Email() {
  return (
    <Html data-id="root">
      <Section data-id="offer">
        <Section data-id="promo">
          <Text data-id="promo-text">20% off everything</Text>
        </Section>
        <Section data-id="details">
          <Text data-id="details-text">Ends Friday</Text>
        </Section>
      </Section>
      <Text data-id="signoff">Thanks for reading</Text>
    </Html>
  );
}
"#;

fn document() -> EmailDocument {
    EmailDocument::Source(SourceDocument::new(TEMPLATE))
}

fn source_of(outcome: &EditOutcome) -> &str {
    match &outcome.document {
        EmailDocument::Source(doc) => &doc.source,
        EmailDocument::Blocks(_) => panic!("expected a source document"),
    }
}

fn reparse(outcome: &EditOutcome) -> SourceTree {
    SourceTree::parse(source_of(outcome), "data-id").expect("edited source should reparse")
}

fn children_of(tree: &SourceTree, id: &str) -> usize {
    let node = tree.find(id).expect("element should exist");
    tree.node(node).children.len()
}

fn router(completion: Arc<ScriptedCompletion>) -> EditRouter {
    EditRouter::new(completion, RefineConfig::default())
}

// ============================================================
// Deterministic structural edits
// ============================================================

#[tokio::test]
async fn delete_this_removes_exactly_one_child() {
    let ai = ScriptedCompletion::silent();
    let outcome = router(ai.clone())
        .refine(RefineRequest::new("delete this", document()).with_target("promo"))
        .await;

    assert_eq!(outcome.kind, OutcomeKind::Edited);
    assert_eq!(outcome.strategy, EditStrategy::Deterministic);
    assert_eq!(outcome.message, "Removed the Section element");
    assert_eq!(ai.call_count(), 0);

    let before = SourceTree::parse(TEMPLATE, "data-id").unwrap();
    let after = reparse(&outcome);
    assert_eq!(children_of(&before, "offer"), 2);
    assert_eq!(children_of(&after, "offer"), 1);
    assert!(after.find("promo").is_none());
    assert!(after.find("details").is_some());
    assert!(!source_of(&outcome).contains("20% off"));
}

#[tokio::test]
async fn deleting_a_nested_section_keeps_the_outer_one_paired() {
    let ai = ScriptedCompletion::silent();
    let outcome = router(ai)
        .refine(RefineRequest::new("remove this section", document()).with_target("details"))
        .await;

    let source = source_of(&outcome);
    assert_eq!(source.matches("<Section").count(), 2);
    assert_eq!(source.matches("</Section>").count(), 2);
    let after = reparse(&outcome);
    let offer = after.find("offer").unwrap();
    assert!(after.text_of(offer).ends_with("</Section>"));
    assert_eq!(children_of(&after, "offer"), 1);
}

#[tokio::test]
async fn duplicate_gets_fresh_identities() {
    let ai = ScriptedCompletion::silent();
    let outcome = router(ai.clone())
        .refine(RefineRequest::new("duplicate this", document()).with_target("details"))
        .await;

    assert_eq!(outcome.strategy, EditStrategy::Deterministic);
    assert!(!outcome.degraded);
    assert_eq!(ai.call_count(), 0);

    let after = reparse(&outcome);
    assert_eq!(after.boundaries().len(), 7 + 2);
    assert_eq!(children_of(&after, "offer"), 3);
    assert_eq!(source_of(&outcome).matches("Ends Friday").count(), 2);
}

#[tokio::test]
async fn deleting_the_root_falls_back_to_the_ai() {
    let ai = ScriptedCompletion::replying(vec![json!({ "code": TEMPLATE })]);
    let outcome = router(ai.clone())
        .refine(RefineRequest::new("delete this", document()).with_target("root"))
        .await;

    let calls = ai.calls();
    assert_eq!(calls.len(), 1);
    assert!(!calls[0].is_scoped());
    assert_eq!(outcome.kind, OutcomeKind::Unchanged);
    assert_eq!(outcome.strategy, EditStrategy::FullAi);
    assert_eq!(outcome.document, document());
}

// ============================================================
// Scoped and full AI edits
// ============================================================

#[tokio::test]
async fn scoped_replace_completes_imports() {
    let ai = ScriptedCompletion::replying(vec![json!({
        "replacement": "<Link data-id=\"signoff\" href=\"https://acme.test\">Thanks for reading</Link>",
        "changes": ["Linked the sign-off"]
    })]);
    let outcome = router(ai.clone())
        .refine(RefineRequest::new("turn the sign-off into a link", document()).with_target("signoff"))
        .await;

    let calls = ai.calls();
    assert_eq!(calls.len(), 1);
    assert!(calls[0].is_scoped());
    assert!(calls[0].messages[1].content.contains("Position: Text #3 of 3"));

    assert_eq!(outcome.strategy, EditStrategy::ScopedAi);
    assert_eq!(
        outcome.change_descriptions,
        vec!["Linked the sign-off", "Imported Link"]
    );
    let source = source_of(&outcome);
    assert!(source.starts_with(r#"import { Html, Section, Text, Link } from "@react-email/components";"#));
    let after = reparse(&outcome);
    let signoff = after.find("signoff").unwrap();
    assert_eq!(after.node(signoff).tag, "Link");
}

#[tokio::test]
async fn scoped_replace_keeps_identity_when_omitted() {
    let ai = ScriptedCompletion::replying(vec![json!({
        "replacement": "<Text>Thanks, see you soon</Text>"
    })]);
    let outcome = router(ai)
        .refine(RefineRequest::new("make the sign-off warmer", document()).with_target("signoff"))
        .await;

    assert_eq!(outcome.strategy, EditStrategy::ScopedAi);
    let after = reparse(&outcome);
    let signoff = after.find("signoff").unwrap();
    assert_eq!(after.text_content(signoff), "Thanks, see you soon");
}

#[tokio::test]
async fn rejected_scoped_replace_falls_through_to_full_edit() {
    let ai = ScriptedCompletion::replying(vec![
        json!({ "replacement": "<Carousel data-id=\"signoff\" />" }),
        json!({ "code": TEMPLATE, "changes": [] }),
    ]);
    let outcome = router(ai.clone())
        .refine(RefineRequest::new("make the sign-off fancier", document()).with_target("signoff"))
        .await;

    let calls = ai.calls();
    assert_eq!(calls.len(), 2);
    assert!(calls[0].is_scoped());
    assert!(!calls[1].is_scoped());
    assert_eq!(outcome.kind, OutcomeKind::Unchanged);
    assert_eq!(outcome.strategy, EditStrategy::FullAi);
}

#[tokio::test]
async fn scoped_replace_repeating_an_identity_falls_through() {
    let ai = ScriptedCompletion::replying(vec![
        json!({
            "replacement": "<Section data-id=\"signoff\"><Text data-id=\"x\">a</Text><Text data-id=\"x\">b</Text></Section>"
        }),
        json!({ "code": TEMPLATE }),
    ]);
    let outcome = router(ai.clone())
        .refine(RefineRequest::new("rewrite the sign-off as two lines", document()).with_target("signoff"))
        .await;

    let calls = ai.calls();
    assert_eq!(calls.len(), 2);
    assert!(calls[0].is_scoped());
    assert!(!calls[1].is_scoped());
    assert_eq!(outcome.kind, OutcomeKind::Unchanged);
    assert_eq!(outcome.strategy, EditStrategy::FullAi);
    assert_eq!(outcome.document, document());
}

#[tokio::test]
async fn malformed_full_edit_keeps_prior_source() {
    let ai = ScriptedCompletion::replying(vec![json!({
        "code": "<Html><Section></Html>",
        "changes": ["Rewrote everything"]
    })]);
    let outcome = router(ai)
        .refine(RefineRequest::new("rewrite the whole email", document()))
        .await;

    assert_eq!(outcome.kind, OutcomeKind::Failed);
    assert!(!outcome.valid);
    assert!(outcome.validation_errors[0].starts_with("template:"));
    assert_eq!(outcome.document, document());
}

#[tokio::test]
async fn full_edit_resolves_new_images_and_imports() {
    let code = TEMPLATE.replace(
        r#"      <Text data-id="signoff">"#,
        "      <Img data-id=\"lake\" src=\"https://placehold.co/600x400\" alt=\"Mountain lake\" />\n      <Text data-id=\"signoff\">",
    );
    let ai = ScriptedCompletion::replying(vec![json!({
        "code": code,
        "changes": ["Added a hero image"]
    })]);
    let images = Arc::new(RecordingImages::default());
    let outcome = router(ai.clone())
        .with_image_search(images.clone())
        .refine(RefineRequest::new("add a hero image of a mountain lake", document()))
        .await;

    let mut keywords = images.keywords();
    keywords.sort();
    assert_eq!(keywords, vec!["add hero mountain lake", "mountain lake"]);
    assert!(ai.calls()[0].messages[1]
        .content
        .contains("- https://images.test/add-hero-mountain-lake.jpg"));

    assert_eq!(outcome.strategy, EditStrategy::FullAi);
    assert!(outcome.change_descriptions.contains(&"Imported Img".to_string()));
    let source = source_of(&outcome);
    assert!(source.contains(r#"src="https://images.test/mountain-lake.jpg""#));
    assert!(source.contains("import { Html, Section, Text, Img }"));
    reparse(&outcome);
}
