//! Recording test doubles for the AI completion and image search collaborators

#![allow(dead_code)]

use async_trait::async_trait;
use refine_engine::{
    Completion, CompletionOptions, CompletionService, ImageQuery, ImageSearch, Message,
    ResolvedImage, ServiceError, Usage,
};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

/// One recorded completion call
#[derive(Debug, Clone)]
pub struct RecordedCall {
    pub messages: Vec<Message>,
    pub options: CompletionOptions,
}

impl RecordedCall {
    pub fn system(&self) -> &str {
        self.messages
            .first()
            .map(|m| m.content.as_str())
            .unwrap_or_default()
    }

    pub fn is_scoped(&self) -> bool {
        self.system().contains("ONE")
    }
}

/// Replays scripted responses in order and records every call
pub struct ScriptedCompletion {
    responses: Mutex<VecDeque<Result<String, ServiceError>>>,
    calls: Mutex<Vec<RecordedCall>>,
}

impl ScriptedCompletion {
    pub fn new(responses: Vec<Result<String, ServiceError>>) -> Arc<Self> {
        Arc::new(Self {
            responses: Mutex::new(responses.into()),
            calls: Mutex::new(Vec::new()),
        })
    }

    pub fn replying(responses: Vec<serde_json::Value>) -> Arc<Self> {
        Self::new(responses.into_iter().map(|v| Ok(v.to_string())).collect())
    }

    pub fn silent() -> Arc<Self> {
        Self::new(Vec::new())
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

#[async_trait]
impl CompletionService for ScriptedCompletion {
    async fn complete(
        &self,
        messages: &[Message],
        options: &CompletionOptions,
    ) -> Result<Completion, ServiceError> {
        self.calls.lock().unwrap().push(RecordedCall {
            messages: messages.to_vec(),
            options: options.clone(),
        });
        let next = self
            .responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(ServiceError::RequestFailed("no scripted response".to_string())));
        next.map(|text| Completion {
            text,
            usage: Usage {
                input_tokens: 100,
                output_tokens: 50,
            },
        })
    }
}

/// Resolves every keyword to a deterministic URL and records the keywords
#[derive(Default)]
pub struct RecordingImages {
    keywords: Mutex<Vec<String>>,
}

impl RecordingImages {
    pub fn keywords(&self) -> Vec<String> {
        self.keywords.lock().unwrap().clone()
    }
}

#[async_trait]
impl ImageSearch for RecordingImages {
    async fn resolve(&self, query: &ImageQuery) -> Result<ResolvedImage, ServiceError> {
        self.keywords.lock().unwrap().push(query.keyword.clone());
        Ok(ResolvedImage {
            url: format!("https://images.test/{}.jpg", query.keyword.replace(' ', "-")),
            source: "recording".to_string(),
        })
    }
}
