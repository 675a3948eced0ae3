//! Configuration system (layered: defaults < TOML file < env).

use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{AgentError, Result};
use crate::models::{LanguageModel, DEFAULT_MODEL};
use crate::tools::search::SearchSettings;
use crate::types::GenerationSettings;
use crate::util::retry::RetryPolicy;

/// Instruction sent ahead of every conversation unless overridden.
pub const DEFAULT_SYSTEM_PROMPT: &str =
    "Always provide only the final answer, without any reasoning or additional text.";

/// Environment variables carrying provider API keys.
const API_KEY_VARS: &[(&str, &str)] = &[
    ("GROQ_API_KEY", "groq"),
    ("OPENAI_API_KEY", "openai"),
    ("OPENAI_COMPAT_API_KEY", "openai-compatible"),
    ("TAVILY_API_KEY", "tavily"),
];

/// Environment variables carrying provider base URL overrides.
const BASE_URL_VARS: &[(&str, &str)] = &[
    ("GROQ_BASE_URL", "groq"),
    ("OPENAI_BASE_URL", "openai"),
    ("OPENAI_COMPAT_BASE_URL", "openai-compatible"),
];

/// Layered configuration for askdesk.
///
/// Resolution order, later wins:
/// 1. Built-in defaults
/// 2. TOML file (`--config`, else `<config dir>/askdesk/config.toml`)
/// 3. Environment variables (a `.env` file is loaded first if present)
///
/// Credentials only come from the environment or `set_api_key`; they are
/// never read from the TOML file.
#[derive(Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AgentConfig {
    /// `provider:model_id` selector.
    pub model: String,
    /// Empty disables the system instruction.
    pub system_prompt: String,
    pub max_iterations: usize,
    pub tool_timeout_secs: u64,
    pub run_deadline_secs: u64,
    pub retry: RetryConfig,
    pub generation: GenerationConfig,
    pub search: SearchConfig,
    pub server: ServerConfig,
    #[serde(skip)]
    api_keys: HashMap<String, String>,
    #[serde(skip)]
    base_urls: HashMap<String, String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RetryConfig {
    pub max_attempts: u32,
    pub initial_backoff_ms: u64,
    pub max_backoff_ms: u64,
    pub multiplier: f64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_backoff_ms: 500,
            max_backoff_ms: 30_000,
            multiplier: 2.0,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GenerationConfig {
    pub temperature: Option<f64>,
    pub max_tokens: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SearchConfig {
    pub wikipedia: SearchSettings,
    pub arxiv: SearchSettings,
    pub web: SearchSettings,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            wikipedia: SearchSettings::new(1, 500),
            arxiv: SearchSettings::new(2, 500),
            web: SearchSettings::new(5, 500),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ServerConfig {
    pub bind: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: "127.0.0.1:8000".to_string(),
        }
    }
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            model: DEFAULT_MODEL.to_string(),
            system_prompt: DEFAULT_SYSTEM_PROMPT.to_string(),
            max_iterations: 10,
            tool_timeout_secs: 30,
            run_deadline_secs: 120,
            retry: RetryConfig::default(),
            generation: GenerationConfig::default(),
            search: SearchConfig::default(),
            server: ServerConfig::default(),
            api_keys: HashMap::new(),
            base_urls: HashMap::new(),
        }
    }
}

impl fmt::Debug for AgentConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut key_names: Vec<&String> = self.api_keys.keys().collect();
        key_names.sort();
        f.debug_struct("AgentConfig")
            .field("model", &self.model)
            .field("system_prompt", &self.system_prompt)
            .field("max_iterations", &self.max_iterations)
            .field("tool_timeout_secs", &self.tool_timeout_secs)
            .field("run_deadline_secs", &self.run_deadline_secs)
            .field("retry", &self.retry)
            .field("generation", &self.generation)
            .field("search", &self.search)
            .field("server", &self.server)
            .field("api_keys", &key_names)
            .field("base_urls", &self.base_urls)
            .finish()
    }
}

impl AgentConfig {
    /// Load the full layered configuration.
    ///
    /// An explicit `path` must exist; the default location is optional.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let _ = dotenvy::dotenv(); // load .env if present, ignore error

        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => match default_config_path().filter(|p| p.is_file()) {
                Some(path) => Self::from_file(&path)?,
                None => Self::default(),
            },
        };
        config.apply_env(|name| std::env::var(name).ok());
        config.validate()?;
        Ok(config)
    }

    /// Parse a TOML config file on top of the defaults.
    pub fn from_file(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path).map_err(|e| {
            AgentError::Configuration(format!("cannot read {}: {e}", path.display()))
        })?;
        Self::from_toml_str(&raw).map_err(|e| match e {
            AgentError::Configuration(msg) => {
                AgentError::Configuration(format!("{}: {msg}", path.display()))
            }
            other => other,
        })
    }

    pub fn from_toml_str(raw: &str) -> Result<Self> {
        toml::from_str(raw).map_err(|e| AgentError::Configuration(e.to_string()))
    }

    /// Overlay environment variables read through `lookup`. Empty values are ignored.
    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let get = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        for (var, provider) in API_KEY_VARS {
            if let Some(key) = get(*var) {
                self.set_api_key(provider, key);
            }
        }
        for (var, provider) in BASE_URL_VARS {
            if let Some(url) = get(*var) {
                self.set_base_url(provider, url);
            }
        }

        if let Some(model) = get("ASKDESK_MODEL") {
            self.model = model;
        }
        if let Some(bind) = get("ASKDESK_BIND") {
            self.server.bind = bind;
        }
        if let Some(prompt) = lookup("ASKDESK_SYSTEM_PROMPT") {
            self.system_prompt = prompt;
        }
        if let Some(raw) = get("ASKDESK_MAX_ITERATIONS") {
            match raw.trim().parse() {
                Ok(n) => self.max_iterations = n,
                Err(_) => tracing::warn!(value = %raw, "ignoring invalid ASKDESK_MAX_ITERATIONS"),
            }
        }
    }

    /// Reject values the dispatch loop cannot run with.
    pub fn validate(&self) -> Result<()> {
        if self.max_iterations == 0 {
            return Err(AgentError::Configuration(
                "max_iterations must be at least 1".into(),
            ));
        }
        if self.retry.max_attempts == 0 {
            return Err(AgentError::Configuration(
                "retry.max_attempts must be at least 1".into(),
            ));
        }
        if self.tool_timeout_secs == 0 || self.run_deadline_secs == 0 {
            return Err(AgentError::Configuration(
                "timeouts must be greater than zero".into(),
            ));
        }
        self.language_model()?;
        Ok(())
    }

    pub fn language_model(&self) -> Result<LanguageModel> {
        self.model.parse()
    }

    pub fn system_prompt(&self) -> Option<&str> {
        let prompt = self.system_prompt.trim();
        (!prompt.is_empty()).then_some(prompt)
    }

    pub fn tool_timeout(&self) -> Duration {
        Duration::from_secs(self.tool_timeout_secs)
    }

    pub fn run_deadline(&self) -> Duration {
        Duration::from_secs(self.run_deadline_secs)
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_attempts: self.retry.max_attempts,
            initial_backoff: Duration::from_millis(self.retry.initial_backoff_ms),
            max_backoff: Duration::from_millis(self.retry.max_backoff_ms),
            multiplier: self.retry.multiplier,
        }
    }

    pub fn generation_settings(&self) -> GenerationSettings {
        GenerationSettings {
            max_tokens: self.generation.max_tokens,
            temperature: self.generation.temperature,
            ..Default::default()
        }
    }

    pub fn set_api_key(&mut self, provider: &str, key: String) {
        self.api_keys.insert(provider.to_string(), key);
    }

    pub fn api_key(&self, provider: &str) -> Option<String> {
        self.api_keys.get(provider).cloned()
    }

    pub fn set_base_url(&mut self, provider: &str, url: String) {
        self.base_urls.insert(provider.to_string(), url);
    }

    pub fn base_url(&self, provider: &str) -> Option<String> {
        self.base_urls.get(provider).cloned()
    }

    /// Check if a provider has credentials configured.
    pub fn has_credentials(&self, provider: &str) -> bool {
        self.api_keys.contains_key(provider)
    }
}

/// `<config dir>/askdesk/config.toml` for the current user.
pub fn default_config_path() -> Option<PathBuf> {
    directories::BaseDirs::new().map(|dirs| dirs.config_dir().join("askdesk").join("config.toml"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name: &str| map.get(name).cloned()
    }

    #[test]
    fn defaults_match_documented_values() {
        let config = AgentConfig::default();
        assert_eq!(config.model, "groq:qwen-qwq-32b");
        assert_eq!(config.max_iterations, 10);
        assert_eq!(config.tool_timeout(), Duration::from_secs(30));
        assert_eq!(config.run_deadline(), Duration::from_secs(120));
        assert_eq!(config.search.arxiv, SearchSettings::new(2, 500));
        assert_eq!(config.system_prompt(), Some(DEFAULT_SYSTEM_PROMPT));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn toml_overrides_only_given_keys() {
        let config = AgentConfig::from_toml_str(
            r#"
            max_iterations = 4

            [search.web]
            top_k = 3
            "#,
        )
        .unwrap();
        assert_eq!(config.max_iterations, 4);
        assert_eq!(config.search.web.top_k, 3);
        assert_eq!(config.search.web.max_chars, 500);
        assert_eq!(config.search.wikipedia, SearchSettings::new(1, 500));
    }

    #[test]
    fn unknown_toml_keys_are_rejected() {
        let err = AgentConfig::from_toml_str("max_iteration = 4").unwrap_err();
        assert!(matches!(err, AgentError::Configuration(_)));
    }

    #[test]
    fn env_wins_over_file_values() {
        let mut config = AgentConfig::from_toml_str(r#"model = "openai:gpt-4o-mini""#).unwrap();
        config.apply_env(env(&[
            ("ASKDESK_MODEL", "groq:llama-3.3-70b-versatile"),
            ("ASKDESK_MAX_ITERATIONS", "3"),
            ("GROQ_API_KEY", "gsk-test"),
            ("OPENAI_API_KEY", ""),
        ]));
        assert_eq!(config.model, "groq:llama-3.3-70b-versatile");
        assert_eq!(config.max_iterations, 3);
        assert_eq!(config.api_key("groq").as_deref(), Some("gsk-test"));
        assert!(!config.has_credentials("openai"));
    }

    #[test]
    fn empty_system_prompt_disables_instruction() {
        let mut config = AgentConfig::default();
        config.apply_env(env(&[("ASKDESK_SYSTEM_PROMPT", "")]));
        assert_eq!(config.system_prompt(), None);
    }

    #[test]
    fn zero_iterations_fail_validation() {
        let mut config = AgentConfig::default();
        config.max_iterations = 0;
        assert!(matches!(config.validate(), Err(AgentError::Configuration(_))));
    }

    #[test]
    fn debug_output_hides_key_values() {
        let mut config = AgentConfig::default();
        config.set_api_key("groq", "gsk-secret".into());
        let rendered = format!("{config:?}");
        assert!(rendered.contains("groq"));
        assert!(!rendered.contains("gsk-secret"));
    }
}
