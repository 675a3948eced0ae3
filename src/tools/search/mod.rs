//! External knowledge lookups exposed as tools.
//!
//! Each backend fetches up to `top_k` documents for a query; [`SearchTool`]
//! joins them and truncates the result to `max_chars` characters so a single
//! lookup cannot flood the conversation.

pub mod arxiv;
pub mod web;
pub mod wikipedia;

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::ToolError;
use crate::tools::arguments::ToolArguments;
use crate::tools::tool::Tool;
use crate::tools::types::{ToolSchema, ValueType};

pub use arxiv::ArxivSearch;
pub use web::{DuckDuckGoSearch, TavilySearch};
pub use wikipedia::WikipediaSearch;

/// Result-count and truncation knobs for one search backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchSettings {
    pub top_k: usize,
    pub max_chars: usize,
    /// Override the provider endpoint (tests, proxies).
    pub base_url: Option<String>,
}

impl SearchSettings {
    pub fn new(top_k: usize, max_chars: usize) -> Self {
        Self {
            top_k,
            max_chars,
            base_url: None,
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }
}

impl Default for SearchSettings {
    fn default() -> Self {
        Self::new(1, 500)
    }
}

/// A document source queried by free text.
#[async_trait]
pub trait SearchBackend: Send + Sync {
    /// Tool name advertised to the model.
    fn name(&self) -> &str;

    fn description(&self) -> &str;

    fn settings(&self) -> &SearchSettings;

    /// Fetch up to `settings().top_k` formatted documents.
    async fn search(&self, query: &str) -> Result<Vec<String>, ToolError>;
}

/// Adapter exposing a [`SearchBackend`] as a `query: string -> string` tool.
pub struct SearchTool {
    backend: Box<dyn SearchBackend>,
    schema: ToolSchema,
}

impl SearchTool {
    pub fn new(backend: impl SearchBackend + 'static) -> Self {
        Self {
            backend: Box::new(backend),
            schema: ToolSchema::builder()
                .string("query", "Free-text search query")
                .returns(ValueType::String)
                .build(),
        }
    }

    pub fn shared(backend: impl SearchBackend + 'static) -> Arc<dyn Tool> {
        Arc::new(Self::new(backend))
    }
}

#[async_trait]
impl Tool for SearchTool {
    fn name(&self) -> &str {
        self.backend.name()
    }

    fn description(&self) -> &str {
        self.backend.description()
    }

    fn schema(&self) -> &ToolSchema {
        &self.schema
    }

    async fn invoke(&self, args: &ToolArguments) -> Result<serde_json::Value, ToolError> {
        let query = args.get_str("query")?.trim();
        if query.is_empty() {
            return Err(ToolError::invalid(self.name(), "query must be non-empty"));
        }
        let docs = self.backend.search(query).await?;
        if docs.is_empty() {
            return Ok(serde_json::json!(format!(
                "No good {} result was found",
                self.backend.name()
            )));
        }
        let joined = docs.join("\n\n");
        Ok(serde_json::json!(truncate_chars(&joined, self.backend.settings().max_chars)))
    }
}

/// Keep at most `max_chars` characters (not bytes).
pub fn truncate_chars(s: &str, max_chars: usize) -> String {
    match s.char_indices().nth(max_chars) {
        Some((cutoff, _)) => s[..cutoff].to_string(),
        None => s.to_string(),
    }
}

/// Collapse runs of whitespace (including newlines) into single spaces.
pub(crate) fn squash_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

pub(crate) fn http_error(tool: &str, err: reqwest::Error) -> ToolError {
    ToolError::execution(tool, format!("request failed: {err}"))
}

/// Read a JSON body, mapping non-2xx statuses to tool failures.
pub(crate) async fn read_json<T: serde::de::DeserializeOwned>(
    tool: &str,
    resp: reqwest::Response,
) -> Result<T, ToolError> {
    let resp = check_status(tool, resp).await?;
    resp.json::<T>()
        .await
        .map_err(|e| ToolError::execution(tool, format!("unexpected response: {e}")))
}

pub(crate) async fn check_status(
    tool: &str,
    resp: reqwest::Response,
) -> Result<reqwest::Response, ToolError> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }
    let body = resp.text().await.unwrap_or_default();
    Err(ToolError::execution(
        tool,
        format!("HTTP {}: {}", status.as_u16(), truncate_chars(&body, 200)),
    ))
}
