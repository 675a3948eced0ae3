//! Web search: Tavily when an API key is configured, DuckDuckGo otherwise.

use async_trait::async_trait;
use serde::Deserialize;
use tracing::debug;

use super::{http_error, read_json, squash_whitespace, SearchBackend, SearchSettings};
use crate::error::ToolError;
use crate::provider::http::{bearer_headers, shared_client};

const TOOL_NAME: &str = "web_search";
const DESCRIPTION: &str =
    "Search the web for current events and facts. Input is a search query; returns result snippets.";

const TAVILY_BASE_URL: &str = "https://api.tavily.com";
const DUCKDUCKGO_BASE_URL: &str = "https://api.duckduckgo.com";

/// Tavily search API.
pub struct TavilySearch {
    settings: SearchSettings,
    base_url: String,
    api_key: String,
}

impl TavilySearch {
    pub fn new(settings: SearchSettings, api_key: impl Into<String>) -> Self {
        let base_url = settings
            .base_url
            .clone()
            .unwrap_or_else(|| TAVILY_BASE_URL.to_string());
        Self {
            settings,
            base_url,
            api_key: api_key.into(),
        }
    }
}

#[async_trait]
impl SearchBackend for TavilySearch {
    fn name(&self) -> &str {
        TOOL_NAME
    }

    fn description(&self) -> &str {
        DESCRIPTION
    }

    fn settings(&self) -> &SearchSettings {
        &self.settings
    }

    async fn search(&self, query: &str) -> Result<Vec<String>, ToolError> {
        let url = format!("{}/search", self.base_url.trim_end_matches('/'));
        let resp = shared_client()
            .post(&url)
            .headers(bearer_headers(&self.api_key))
            .json(&serde_json::json!({
                "query": query,
                "max_results": self.settings.top_k,
            }))
            .send()
            .await
            .map_err(|e| http_error(TOOL_NAME, e))?;
        let data: TavilyResponse = read_json(TOOL_NAME, resp).await?;
        debug!(query, hits = data.results.len(), "tavily search");

        Ok(data
            .results
            .into_iter()
            .take(self.settings.top_k)
            .map(|r| format!("{}\n{}\n{}", r.title, r.url, squash_whitespace(&r.content)))
            .collect())
    }
}

#[derive(Deserialize)]
struct TavilyResponse {
    #[serde(default)]
    results: Vec<TavilyResult>,
}

#[derive(Deserialize)]
struct TavilyResult {
    #[serde(default)]
    title: String,
    #[serde(default)]
    url: String,
    #[serde(default)]
    content: String,
}

/// DuckDuckGo Instant Answer API (no key required).
pub struct DuckDuckGoSearch {
    settings: SearchSettings,
    base_url: String,
}

impl DuckDuckGoSearch {
    pub fn new(settings: SearchSettings) -> Self {
        let base_url = settings
            .base_url
            .clone()
            .unwrap_or_else(|| DUCKDUCKGO_BASE_URL.to_string());
        Self { settings, base_url }
    }
}

#[async_trait]
impl SearchBackend for DuckDuckGoSearch {
    fn name(&self) -> &str {
        TOOL_NAME
    }

    fn description(&self) -> &str {
        DESCRIPTION
    }

    fn settings(&self) -> &SearchSettings {
        &self.settings
    }

    async fn search(&self, query: &str) -> Result<Vec<String>, ToolError> {
        let url = format!("{}/", self.base_url.trim_end_matches('/'));
        let resp = shared_client()
            .get(&url)
            .query(&[
                ("q", query),
                ("format", "json"),
                ("no_html", "1"),
                ("skip_disambig", "1"),
            ])
            .send()
            .await
            .map_err(|e| http_error(TOOL_NAME, e))?;
        let data: InstantAnswer = read_json(TOOL_NAME, resp).await?;

        let mut docs = Vec::new();
        if !data.abstract_text.is_empty() {
            docs.push(format!(
                "{}\n{}\n{}",
                data.heading, data.abstract_url, data.abstract_text
            ));
        }
        let mut topics = Vec::new();
        flatten_topics(data.related_topics, &mut topics);
        docs.extend(
            topics
                .into_iter()
                .filter(|t| !t.text.is_empty())
                .map(|t| format!("{}\n{}", t.text, t.first_url)),
        );
        docs.truncate(self.settings.top_k);
        debug!(query, hits = docs.len(), "duckduckgo search");
        Ok(docs)
    }
}

fn flatten_topics(topics: Vec<RelatedTopic>, out: &mut Vec<TopicEntry>) {
    for topic in topics {
        match topic {
            RelatedTopic::Entry(entry) => out.push(entry),
            RelatedTopic::Group { topics } => flatten_topics(topics, out),
        }
    }
}

#[derive(Deserialize)]
struct InstantAnswer {
    #[serde(rename = "Heading", default)]
    heading: String,
    #[serde(rename = "AbstractText", default)]
    abstract_text: String,
    #[serde(rename = "AbstractURL", default)]
    abstract_url: String,
    #[serde(rename = "RelatedTopics", default)]
    related_topics: Vec<RelatedTopic>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RelatedTopic {
    Group {
        #[serde(rename = "Topics")]
        topics: Vec<RelatedTopic>,
    },
    Entry(TopicEntry),
}

#[derive(Deserialize)]
struct TopicEntry {
    #[serde(rename = "Text", default)]
    text: String,
    #[serde(rename = "FirstURL", default)]
    first_url: String,
}
