//! Model selection and parsing.

use std::str::FromStr;

use super::LanguageModel;
use crate::error::AgentError;

/// Parse a "provider:model" string into a LanguageModel.
pub struct ModelSelector;

impl ModelSelector {
    /// Parse "provider:model_id" into a LanguageModel.
    ///
    /// Examples: "groq:qwen-qwq-32b", "openai:gpt-4o-mini", "openai-compatible:llama3.1"
    pub fn parse(s: &str) -> Result<LanguageModel, AgentError> {
        let (provider, model_id) = s.split_once(':').ok_or_else(|| {
            AgentError::Configuration(format!(
                "Invalid model selector '{s}': expected 'provider:model_id'"
            ))
        })?;
        if model_id.is_empty() {
            return Err(AgentError::Configuration(format!(
                "Invalid model selector '{s}': empty model id"
            )));
        }

        match provider {
            "groq" => Ok(LanguageModel::Groq(model_id.to_string())),
            "openai" => Ok(LanguageModel::OpenAi(model_id.to_string())),
            "openai-compatible" | "openai_compatible" => Ok(LanguageModel::OpenAiCompatible {
                model_id: model_id.to_string(),
                base_url: None,
            }),
            other => Err(AgentError::Configuration(format!(
                "Unknown provider '{other}' in model selector '{s}'"
            ))),
        }
    }
}

impl FromStr for LanguageModel {
    type Err = AgentError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ModelSelector::parse(s)
    }
}
