//! Model provider trait and implementations.

pub mod groq;
pub mod http;
pub mod openai;

use std::sync::Arc;

use async_trait::async_trait;

use crate::config::AgentConfig;
use crate::error::AgentError;
use crate::models::LanguageModel;
use crate::types::{FinishReason, GenerationSettings, Message, ToolRequest, Usage};

/// A request sent to a model provider.
#[derive(Debug, Clone)]
pub struct ProviderRequest {
    /// Instruction placed before the conversation; never stored in a session.
    pub system: Option<String>,
    pub messages: Vec<Message>,
    pub settings: GenerationSettings,
    pub tools: Vec<ToolDefinition>,
}

/// Tool definition sent to the provider API.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct ToolDefinition {
    pub name: String,
    pub description: String,
    pub parameters: serde_json::Value,
}

/// Response from a provider.
#[derive(Debug, Clone, Default)]
pub struct ProviderResponse {
    pub text: String,
    pub tool_requests: Vec<ToolRequest>,
    pub usage: Usage,
    pub finish_reason: Option<FinishReason>,
}

impl ProviderResponse {
    /// Convert into the assistant message appended to the conversation.
    pub fn into_message(self) -> Message {
        Message::assistant_with_requests(self.text, self.tool_requests)
    }
}

/// Core trait implemented by all model providers.
#[async_trait]
pub trait ModelProvider: Send + Sync {
    /// Provider name (e.g., "groq", "openai").
    fn provider_name(&self) -> &str;

    /// The model ID this provider instance serves.
    fn model_id(&self) -> &str;

    /// Run one completion over the full conversation with tools advertised.
    async fn complete(&self, request: &ProviderRequest) -> Result<ProviderResponse, AgentError>;
}

/// Create a provider for the given model, using the provided config.
///
/// Missing credentials are a configuration error, reported before any
/// conversation starts.
pub fn create_provider(
    model: &LanguageModel,
    config: &AgentConfig,
) -> Result<Arc<dyn ModelProvider>, AgentError> {
    match model {
        LanguageModel::Groq(model_id) => {
            let api_key = config
                .api_key("groq")
                .ok_or_else(|| AgentError::Configuration("Missing GROQ_API_KEY".into()))?;
            Ok(Arc::new(groq::GroqProvider::new(
                model_id.clone(),
                api_key,
                config.base_url("groq"),
            )))
        }
        LanguageModel::OpenAi(model_id) => {
            let api_key = config
                .api_key("openai")
                .ok_or_else(|| AgentError::Configuration("Missing OPENAI_API_KEY".into()))?;
            Ok(Arc::new(openai::OpenAiProvider::new(
                model_id.clone(),
                api_key,
                config.base_url("openai"),
            )))
        }
        LanguageModel::OpenAiCompatible { model_id, base_url } => {
            let api_key = config.api_key("openai-compatible").unwrap_or_default();
            let base_url = base_url
                .clone()
                .or_else(|| config.base_url("openai-compatible"))
                .ok_or_else(|| {
                    AgentError::Configuration("Missing OPENAI_COMPAT_BASE_URL".into())
                })?;
            Ok(Arc::new(
                openai::OpenAiProvider::new(model_id.clone(), api_key, Some(base_url))
                    .with_provider_name("openai-compatible"),
            ))
        }
    }
}
