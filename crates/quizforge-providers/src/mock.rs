//! Mock provider for testing.

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Mutex, PoisonError};

use async_trait::async_trait;

use quizforge_core::error::ProviderError;
use quizforge_core::traits::{
    GenerateRequest, GenerateResponse, LlmProvider, ModelInfo, TokenUsage,
};

enum Reply {
    Content(String),
    Fail { status: u16, message: String },
}

/// A mock content generator for exercising the engine without real API calls.
///
/// Replies are picked by prompt substring, first match wins.
pub struct MockProvider {
    /// Prompt substring → reply, checked in insertion order.
    responses: Vec<(String, String)>,
    default_reply: Reply,
    call_count: AtomicU32,
    last_request: Mutex<Option<GenerateRequest>>,
}

impl MockProvider {
    /// Create a mock with prompt-substring → reply mappings.
    pub fn new<K, V>(responses: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        Self::build(
            responses
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
            Reply::Content("[]".into()),
        )
    }

    /// Create a mock that always returns the same reply.
    pub fn with_fixed_response(response: &str) -> Self {
        Self::build(Vec::new(), Reply::Content(response.to_string()))
    }

    /// Create a mock whose unmatched prompts fail with an API error.
    pub fn failing(status: u16, message: &str) -> Self {
        Self::build(
            Vec::new(),
            Reply::Fail {
                status,
                message: message.to_string(),
            },
        )
    }

    /// Add a prompt-substring mapping in front of the default reply.
    pub fn with_response(mut self, prompt_contains: &str, response: &str) -> Self {
        self.responses
            .push((prompt_contains.to_string(), response.to_string()));
        self
    }

    fn build(responses: Vec<(String, String)>, default_reply: Reply) -> Self {
        Self {
            responses,
            default_reply,
            call_count: AtomicU32::new(0),
            last_request: Mutex::new(None),
        }
    }

    /// Number of calls made to this provider.
    pub fn call_count(&self) -> u32 {
        self.call_count.load(Ordering::Relaxed)
    }

    /// The last request made to this provider.
    pub fn last_request(&self) -> Option<GenerateRequest> {
        self.last_request
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

#[async_trait]
impl LlmProvider for MockProvider {
    fn name(&self) -> &str {
        "mock"
    }

    async fn generate(&self, request: &GenerateRequest) -> anyhow::Result<GenerateResponse> {
        self.call_count.fetch_add(1, Ordering::Relaxed);
        *self
            .last_request
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = Some(request.clone());

        let matched = self
            .responses
            .iter()
            .find(|(key, _)| request.prompt.contains(key.as_str()))
            .map(|(_, v)| v.clone());

        let content = match (matched, &self.default_reply) {
            (Some(content), _) => content,
            (None, Reply::Content(content)) => content.clone(),
            (None, Reply::Fail { status, message }) => {
                return Err(ProviderError::ApiError {
                    status: *status,
                    message: message.clone(),
                }
                .into())
            }
        };

        // Rough estimate: four characters per token.
        let prompt_tokens = (request.prompt.len() / 4) as u32;
        let completion_tokens = (content.len() / 4) as u32;

        Ok(GenerateResponse {
            content,
            model: request.model.clone(),
            token_usage: TokenUsage {
                prompt_tokens,
                completion_tokens,
                total_tokens: prompt_tokens + completion_tokens,
                estimated_cost_usd: 0.0,
            },
            latency_ms: 1,
        })
    }

    fn available_models(&self) -> Vec<ModelInfo> {
        vec![ModelInfo {
            id: "mock-model".into(),
            name: "Mock Model".into(),
            provider: "mock".into(),
            max_context: 100_000,
            cost_per_1k_input: 0.0,
            cost_per_1k_output: 0.0,
        }]
    }
}
