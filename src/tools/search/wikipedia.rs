//! Wikipedia lookup via the MediaWiki action API.

use std::collections::HashMap;

use async_trait::async_trait;
use serde::Deserialize;
use tracing::debug;

use super::{http_error, read_json, SearchBackend, SearchSettings};
use crate::error::ToolError;
use crate::provider::http::shared_client;

const DEFAULT_BASE_URL: &str = "https://en.wikipedia.org/w/api.php";
const TOOL_NAME: &str = "wikipedia";

/// Searches page titles, then fetches the plain-text intro of each hit.
pub struct WikipediaSearch {
    settings: SearchSettings,
    base_url: String,
}

impl WikipediaSearch {
    pub fn new(settings: SearchSettings) -> Self {
        let base_url = settings
            .base_url
            .clone()
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());
        Self { settings, base_url }
    }

    async fn titles(&self, query: &str) -> Result<Vec<String>, ToolError> {
        let limit = self.settings.top_k.to_string();
        let resp = shared_client()
            .get(&self.base_url)
            .query(&[
                ("action", "query"),
                ("list", "search"),
                ("srsearch", query),
                ("srlimit", limit.as_str()),
                ("format", "json"),
            ])
            .send()
            .await
            .map_err(|e| http_error(TOOL_NAME, e))?;
        let data: SearchResponse = read_json(TOOL_NAME, resp).await?;
        Ok(data
            .query
            .map(|q| q.search.into_iter().map(|hit| hit.title).collect())
            .unwrap_or_default())
    }

    async fn summary(&self, title: &str) -> Result<Option<String>, ToolError> {
        let resp = shared_client()
            .get(&self.base_url)
            .query(&[
                ("action", "query"),
                ("prop", "extracts"),
                ("exintro", "1"),
                ("explaintext", "1"),
                ("redirects", "1"),
                ("titles", title),
                ("format", "json"),
            ])
            .send()
            .await
            .map_err(|e| http_error(TOOL_NAME, e))?;
        let data: ExtractResponse = read_json(TOOL_NAME, resp).await?;
        Ok(data
            .query
            .and_then(|q| q.pages.into_values().find_map(|page| page.extract))
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty()))
    }
}

#[async_trait]
impl SearchBackend for WikipediaSearch {
    fn name(&self) -> &str {
        TOOL_NAME
    }

    fn description(&self) -> &str {
        "Look up general knowledge on Wikipedia. Input is a search query; returns page summaries."
    }

    fn settings(&self) -> &SearchSettings {
        &self.settings
    }

    async fn search(&self, query: &str) -> Result<Vec<String>, ToolError> {
        let titles = self.titles(query).await?;
        debug!(query, hits = titles.len(), "wikipedia search");

        let mut docs = Vec::new();
        for title in titles.into_iter().take(self.settings.top_k) {
            if let Some(summary) = self.summary(&title).await? {
                docs.push(format!("Page: {title}\nSummary: {summary}"));
            }
        }
        Ok(docs)
    }
}

#[derive(Deserialize)]
struct SearchResponse {
    query: Option<SearchQuery>,
}

#[derive(Deserialize)]
struct SearchQuery {
    #[serde(default)]
    search: Vec<SearchHit>,
}

#[derive(Deserialize)]
struct SearchHit {
    title: String,
}

#[derive(Deserialize)]
struct ExtractResponse {
    query: Option<ExtractQuery>,
}

#[derive(Deserialize)]
struct ExtractQuery {
    #[serde(default)]
    pages: HashMap<String, ExtractPage>,
}

#[derive(Deserialize)]
struct ExtractPage {
    extract: Option<String>,
}
