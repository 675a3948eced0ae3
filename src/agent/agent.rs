//! The assembled agent: provider, tools, loop settings, and session memory.

use std::sync::Arc;

use serde::Serialize;
use tracing::info;

use crate::config::AgentConfig;
use crate::error::{AgentError, Result};
use crate::provider::{self, ModelProvider};
use crate::tools::search::{ArxivSearch, DuckDuckGoSearch, SearchTool, TavilySearch, WikipediaSearch};
use crate::tools::{arithmetic, ToolRegistry};
use crate::types::{Message, Usage};

use super::dispatch::{DispatchLoop, DispatchSettings, DispatchStatus};
use super::session::{Session, SessionStore};

/// Answer to one query, together with the session it was recorded in.
#[derive(Debug, Clone, Serialize)]
pub struct Interaction {
    pub session_id: String,
    pub answer: String,
    pub status: DispatchStatus,
    pub usage: Usage,
    /// Full session history after this interaction.
    pub messages: Vec<Message>,
}

/// An immutable agent shared by every session.
///
/// The provider and registry are read-only after construction; the only
/// mutable state is the session table.
pub struct Agent {
    provider: Arc<dyn ModelProvider>,
    registry: Arc<ToolRegistry>,
    settings: DispatchSettings,
    sessions: SessionStore,
}

impl Agent {
    pub fn new(
        provider: Arc<dyn ModelProvider>,
        registry: Arc<ToolRegistry>,
        settings: DispatchSettings,
    ) -> Self {
        Self {
            provider,
            registry,
            settings,
            sessions: SessionStore::new(),
        }
    }

    /// Build the provider and the default tool set from configuration.
    ///
    /// Fails on a bad model selector or missing credentials.
    pub fn from_config(config: &AgentConfig) -> Result<Self> {
        let model = config.language_model()?;
        let provider = provider::create_provider(&model, config)?;
        let registry = build_registry(config)?;
        info!(%model, tools = registry.len(), "agent ready");
        Ok(Self::new(provider, Arc::new(registry), dispatch_settings(config)))
    }

    /// Run one interaction on `session_id` and commit its messages.
    ///
    /// The caller must not run two interactions on the same session at once.
    pub async fn respond(&self, session_id: &str, query: &str) -> Result<Interaction> {
        let query = query.trim();
        if query.is_empty() {
            return Err(AgentError::InvalidArgument("query must not be empty".into()));
        }

        let session = self.sessions.get_or_create(session_id);
        let outcome = DispatchLoop::new(self.provider.as_ref(), &self.registry, &self.settings)
            .run(&session.messages, query)
            .await;

        let mut messages = session.messages;
        messages.extend(outcome.messages.iter().cloned());
        self.sessions.append(session_id, outcome.messages)?;

        Ok(Interaction {
            session_id: session_id.to_string(),
            answer: outcome.answer,
            status: outcome.status,
            usage: outcome.usage,
            messages,
        })
    }

    pub fn session(&self, session_id: &str) -> Option<Session> {
        self.sessions.get(session_id)
    }

    pub fn sessions(&self) -> &SessionStore {
        &self.sessions
    }
}

/// Loop settings derived from configuration.
pub fn dispatch_settings(config: &AgentConfig) -> DispatchSettings {
    DispatchSettings::builder()
        .maybe_system_prompt(config.system_prompt().map(str::to_string))
        .generation(config.generation_settings())
        .max_iterations(config.max_iterations)
        .run_deadline(config.run_deadline())
        .retry(config.retry_policy())
        .build()
}

/// Arithmetic tools plus the three knowledge lookups.
///
/// Web search goes through Tavily when a key is configured and falls back
/// to the keyless DuckDuckGo Instant Answer API otherwise.
pub fn build_registry(config: &AgentConfig) -> Result<ToolRegistry> {
    let mut registry = ToolRegistry::new().with_timeout(config.tool_timeout());
    registry.register_all(arithmetic::all_tools())?;
    registry.register(SearchTool::shared(WikipediaSearch::new(
        config.search.wikipedia.clone(),
    )))?;
    registry.register(SearchTool::shared(ArxivSearch::new(config.search.arxiv.clone())))?;
    let web = match config.api_key("tavily") {
        Some(key) => SearchTool::shared(TavilySearch::new(config.search.web.clone(), key)),
        None => SearchTool::shared(DuckDuckGoSearch::new(config.search.web.clone())),
    };
    registry.register(web)?;
    Ok(registry)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_registry_lists_every_tool_in_order() {
        let registry = build_registry(&AgentConfig::default()).unwrap();
        assert_eq!(
            registry.names(),
            ["multiply", "add", "subtract", "divide", "modulus", "wikipedia", "arxiv", "web_search"]
        );
    }

    #[test]
    fn settings_follow_config() {
        let mut config = AgentConfig::default();
        config.max_iterations = 4;
        config.system_prompt.clear();
        let settings = dispatch_settings(&config);
        assert_eq!(settings.max_iterations, 4);
        assert_eq!(settings.system_prompt, None);
        assert_eq!(settings.retry.max_attempts, 3);
    }

    #[test]
    fn missing_groq_key_is_a_configuration_error() {
        let config = AgentConfig::default();
        assert!(matches!(
            Agent::from_config(&config),
            Err(AgentError::Configuration(_))
        ));
    }
}
