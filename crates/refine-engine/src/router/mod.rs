//! Multi-tier edit router
//!
//! Tiers run strictly in order, each only after the previous one is
//! inapplicable or rejected:
//! 1. deterministic delete / duplicate (no AI call)
//! 2. component-scoped AI edit (target only, non-structural instructions)
//! 3. full-document AI edit
//!
//! [`EditRouter::refine`] never fails: every error becomes an [`EditOutcome`]
//! carrying the prior document and a plain-language message.

mod advisory;
mod blocks;
mod source;

use crate::config::RefineConfig;
use crate::error::{RefineError, ServiceError};
use crate::images::{extract_image_keyword, resolve_all};
use crate::intent::{classify_for_channel, wants_image_change, Intent};
use crate::response::parse_response;
use crate::services::{CompletionOptions, CompletionService, ImageQuery, ImageSearch, Message, ResolvedImage};
use email_model::{EditOutcome, EmailDocument, RefinementContext, SourceChannel};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, info, instrument};

const CLARIFY_MESSAGE: &str = "I'm not sure what you'd like to change. Could you describe the edit, \
for example \"make the headline shorter\" or \"change the button color to green\"?";

const EMPTY_DOCUMENT_MESSAGE: &str = "There is nothing to refine yet. Generate an email first.";

/// One refinement request
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RefineRequest {
    pub instruction: String,
    pub document: EmailDocument,
    /// Block selector (`block:<index>` or block id) or element identity
    #[serde(default)]
    pub target: Option<String>,
    #[serde(default)]
    pub channel: SourceChannel,
    #[serde(default)]
    pub context: RefinementContext,
}

impl RefineRequest {
    pub fn new(instruction: impl Into<String>, document: EmailDocument) -> Self {
        Self {
            instruction: instruction.into(),
            document,
            target: None,
            channel: SourceChannel::default(),
            context: RefinementContext::default(),
        }
    }

    pub fn with_target(mut self, target: impl Into<String>) -> Self {
        self.target = Some(target.into());
        self
    }

    pub fn with_channel(mut self, channel: SourceChannel) -> Self {
        self.channel = channel;
        self
    }

    pub fn with_context(mut self, context: RefinementContext) -> Self {
        self.context = context;
        self
    }
}

pub struct EditRouter {
    completion: Arc<dyn CompletionService>,
    images: Option<Arc<dyn ImageSearch>>,
    config: RefineConfig,
}

impl EditRouter {
    pub fn new(completion: Arc<dyn CompletionService>, config: RefineConfig) -> Self {
        Self {
            completion,
            images: None,
            config,
        }
    }

    pub fn with_image_search(mut self, images: Arc<dyn ImageSearch>) -> Self {
        self.images = Some(images);
        self
    }

    pub fn config(&self) -> &RefineConfig {
        &self.config
    }

    /// Apply a natural-language instruction to a document
    #[instrument(skip_all, fields(channel = ?request.channel, target = ?request.target))]
    pub async fn refine(&self, request: RefineRequest) -> EditOutcome {
        let RefineRequest {
            instruction,
            document,
            target,
            channel,
            context,
        } = request;

        if let Err(message) = self.check_instruction(&instruction) {
            return EditOutcome::failed(document, message);
        }
        if document.is_empty() {
            return EditOutcome::failed(document, EMPTY_DOCUMENT_MESSAGE);
        }

        let intent = classify_for_channel(&instruction, channel);
        info!(
            intent = ?intent.intent,
            confidence = intent.confidence,
            rule = intent.rule,
            "Classified instruction"
        );
        if intent.confidence < self.config.intent_threshold {
            return EditOutcome::clarification(document, CLARIFY_MESSAGE);
        }
        if intent.intent == Intent::Question {
            return self.advise(&instruction, document, &context).await;
        }

        let instruction = instruction.trim();
        match document {
            EmailDocument::Blocks(doc) => {
                self.refine_blocks(instruction, doc, target.as_deref(), context)
                    .await
            }
            EmailDocument::Source(doc) => {
                self.refine_source(instruction, doc, target.as_deref(), context)
                    .await
            }
        }
    }

    fn check_instruction(&self, instruction: &str) -> Result<(), String> {
        if instruction.trim().is_empty() {
            return Err("Please describe the change you'd like to make.".to_string());
        }
        let length = instruction.chars().count();
        if length > self.config.max_instruction_chars {
            return Err(format!(
                "That request is too long ({} characters). Please keep it under {}.",
                length, self.config.max_instruction_chars
            ));
        }
        Ok(())
    }

    fn options(&self, max_tokens: u32, json_mode: bool) -> CompletionOptions {
        CompletionOptions {
            temperature: self.config.temperature,
            max_tokens,
            json_mode,
        }
    }

    /// Call the completion service in JSON mode and parse the response
    async fn complete_json<T: DeserializeOwned>(
        &self,
        messages: &[Message],
        max_tokens: u32,
    ) -> Result<T, RefineError> {
        let completion = self
            .completion
            .complete(messages, &self.options(max_tokens, true))
            .await?;
        debug!(
            input_tokens = completion.usage.input_tokens,
            output_tokens = completion.usage.output_tokens,
            "Completion received"
        );
        parse_response(&completion.text)
    }

    /// Resolve an image for the instruction before the AI call, when the
    /// edit touches an image and asks for different content
    async fn prefetch_images(
        &self,
        instruction: &str,
        context: &RefinementContext,
        touches_image: bool,
    ) -> Vec<ResolvedImage> {
        let Some(search) = &self.images else {
            return Vec::new();
        };
        if !touches_image || !wants_image_change(instruction) {
            return Vec::new();
        }
        let Some(keyword) = extract_image_keyword(instruction, &context.design_keywords) else {
            return Vec::new();
        };
        debug!(%keyword, "Prefetching image");
        resolve_all(search.as_ref(), vec![ImageQuery::landscape(keyword)])
            .await
            .into_iter()
            .flatten()
            .collect()
    }
}

/// Plain-language message for a rejected AI edit
fn failure_message(error: &RefineError) -> &'static str {
    match error {
        RefineError::Service(ServiceError::RateLimited) => {
            "The AI service is busy right now, so your email was left unchanged. Please try again in a moment."
        }
        RefineError::Service(_) => {
            "The AI service could not be reached, so your email was left unchanged."
        }
        RefineError::ResponseParse(_) | RefineError::JsonError(_) => {
            "The AI returned a response I couldn't read, so your email was left unchanged."
        }
        RefineError::Validation(_) => {
            "The AI's edit was incomplete, so your email was left unchanged."
        }
        RefineError::Source(_) | RefineError::Model(_) => {
            "That edit could not be applied, so your email was left unchanged."
        }
    }
}

/// Failed outcome carrying the prior document
fn failure(document: EmailDocument, error: RefineError) -> EditOutcome {
    let outcome = EditOutcome::failed(document, failure_message(&error));
    match error {
        RefineError::Validation(errors) => outcome.with_validation(errors, Vec::new()),
        _ => outcome,
    }
}
