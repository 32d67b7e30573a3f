//! Completion service used when no AI provider is wired in

use async_trait::async_trait;
use refine_engine::{Completion, CompletionOptions, CompletionService, Message, ServiceError};

/// Refuses every completion. Deterministic edits, clarifications and the
/// canned advisory fallback still work through the router.
pub struct OfflineCompletion;

#[async_trait]
impl CompletionService for OfflineCompletion {
    async fn complete(
        &self,
        messages: &[Message],
        _options: &CompletionOptions,
    ) -> Result<Completion, ServiceError> {
        tracing::debug!(messages = messages.len(), "Completion requested while offline");
        Err(ServiceError::NotConfigured(
            "no completion provider configured".to_string(),
        ))
    }
}
