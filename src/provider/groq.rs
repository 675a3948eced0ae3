//! Groq provider (OpenAI-compatible).

use async_trait::async_trait;

use crate::error::AgentError;

use super::openai::OpenAiProvider;
use super::{ModelProvider, ProviderRequest, ProviderResponse};

pub const GROQ_BASE_URL: &str = "https://api.groq.com/openai/v1";

pub struct GroqProvider {
    inner: OpenAiProvider,
}

impl GroqProvider {
    pub fn new(model_id: impl Into<String>, api_key: String, base_url: Option<String>) -> Self {
        Self {
            inner: OpenAiProvider::new(
                model_id,
                api_key,
                Some(base_url.unwrap_or_else(|| GROQ_BASE_URL.to_string())),
            )
            .with_provider_name("groq"),
        }
    }
}

#[async_trait]
impl ModelProvider for GroqProvider {
    fn provider_name(&self) -> &str { self.inner.provider_name() }
    fn model_id(&self) -> &str { self.inner.model_id() }
    async fn complete(&self, request: &ProviderRequest) -> Result<ProviderResponse, AgentError> {
        self.inner.complete(request).await
    }
}
