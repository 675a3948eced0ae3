//! arXiv lookup via the public Atom export API.

use std::sync::OnceLock;

use async_trait::async_trait;
use regex::Regex;
use tracing::debug;

use super::{check_status, http_error, squash_whitespace, SearchBackend, SearchSettings};
use crate::error::ToolError;
use crate::provider::http::shared_client;

const DEFAULT_BASE_URL: &str = "https://export.arxiv.org/api/query";
const TOOL_NAME: &str = "arxiv";

/// Queries arXiv and formats each entry as date, title, authors, and abstract.
pub struct ArxivSearch {
    settings: SearchSettings,
    base_url: String,
}

impl ArxivSearch {
    pub fn new(settings: SearchSettings) -> Self {
        let base_url = settings
            .base_url
            .clone()
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());
        Self { settings, base_url }
    }
}

#[async_trait]
impl SearchBackend for ArxivSearch {
    fn name(&self) -> &str {
        TOOL_NAME
    }

    fn description(&self) -> &str {
        "Search scientific papers on arXiv. Input is a search query; returns titles, authors and abstracts."
    }

    fn settings(&self) -> &SearchSettings {
        &self.settings
    }

    async fn search(&self, query: &str) -> Result<Vec<String>, ToolError> {
        let search_query = format!("all:{query}");
        let max_results = self.settings.top_k.to_string();
        let resp = shared_client()
            .get(&self.base_url)
            .query(&[
                ("search_query", search_query.as_str()),
                ("start", "0"),
                ("max_results", max_results.as_str()),
            ])
            .send()
            .await
            .map_err(|e| http_error(TOOL_NAME, e))?;
        let body = check_status(TOOL_NAME, resp)
            .await?
            .text()
            .await
            .map_err(|e| http_error(TOOL_NAME, e))?;

        let docs: Vec<String> = parse_feed(&body)
            .into_iter()
            .take(self.settings.top_k)
            .map(|entry| entry.render())
            .collect();
        debug!(query, hits = docs.len(), "arxiv search");
        Ok(docs)
    }
}

/// One paper from the Atom feed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArxivEntry {
    pub published: String,
    pub title: String,
    pub authors: Vec<String>,
    pub summary: String,
}

impl ArxivEntry {
    fn render(&self) -> String {
        format!(
            "Published: {}\nTitle: {}\nAuthors: {}\nSummary: {}",
            self.published,
            self.title,
            self.authors.join(", "),
            self.summary
        )
    }
}

fn entry_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?s)<entry>(.*?)</entry>").expect("valid regex"))
}

fn field_re(tag: &'static str) -> Regex {
    Regex::new(&format!(r"(?s)<{tag}[^>]*>(.*?)</{tag}>")).expect("valid regex")
}

/// Extract entries from an arXiv Atom feed.
pub fn parse_feed(xml: &str) -> Vec<ArxivEntry> {
    static FIELDS: OnceLock<(Regex, Regex, Regex, Regex)> = OnceLock::new();
    let (title_re, summary_re, published_re, name_re) = FIELDS.get_or_init(|| {
        (
            field_re("title"),
            field_re("summary"),
            field_re("published"),
            field_re("name"),
        )
    });

    let first = |re: &Regex, text: &str| -> String {
        re.captures(text)
            .and_then(|c| c.get(1))
            .map(|m| squash_whitespace(&unescape_xml(m.as_str())))
            .unwrap_or_default()
    };

    entry_re()
        .captures_iter(xml)
        .filter_map(|c| c.get(1))
        .map(|m| {
            let entry = m.as_str();
            let published = first(published_re, entry);
            ArxivEntry {
                published: published.get(..10).unwrap_or(published.as_str()).to_string(),
                title: first(title_re, entry),
                authors: name_re
                    .captures_iter(entry)
                    .filter_map(|c| c.get(1))
                    .map(|n| squash_whitespace(&unescape_xml(n.as_str())))
                    .collect(),
                summary: first(summary_re, entry),
            }
        })
        .collect()
}

fn unescape_xml(s: &str) -> String {
    s.replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&apos;", "'")
        .replace("&amp;", "&")
}
