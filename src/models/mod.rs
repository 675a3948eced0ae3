//! Model definitions and selection.

pub mod selector;

pub use selector::ModelSelector;

use serde::{Deserialize, Serialize};
use std::fmt;

/// Default model, served by Groq.
pub const DEFAULT_MODEL: &str = "groq:qwen-qwq-32b";

/// A language model addressed by provider and model id.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(tag = "provider", content = "model")]
pub enum LanguageModel {
    Groq(String),
    OpenAi(String),
    /// Any server speaking the Chat Completions wire format.
    OpenAiCompatible {
        model_id: String,
        base_url: Option<String>,
    },
}

impl LanguageModel {
    /// Get the model's API identifier string.
    pub fn model_id(&self) -> &str {
        match self {
            Self::Groq(m) | Self::OpenAi(m) => m,
            Self::OpenAiCompatible { model_id, .. } => model_id,
        }
    }

    /// Get the provider name.
    pub fn provider_name(&self) -> &str {
        match self {
            Self::Groq(_) => "groq",
            Self::OpenAi(_) => "openai",
            Self::OpenAiCompatible { .. } => "openai-compatible",
        }
    }
}

impl Default for LanguageModel {
    fn default() -> Self {
        Self::Groq("qwen-qwq-32b".to_string())
    }
}

impl fmt::Display for LanguageModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.provider_name(), self.model_id())
    }
}
