//! Encyclopedia content fetching.
//!
//! Provides a trait-based interface over an encyclopedia service and the
//! first-hit fetch policy used by the pipeline.

mod wikipedia;

pub use wikipedia::WikipediaClient;

use crate::error::{Gener8Error, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{error, info, instrument};

/// Article text fetched from the encyclopedia.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArticleContent {
    pub title: String,
    pub url: String,
    /// Lead section of the article.
    pub summary: String,
    /// Full plain-text article.
    pub full_content: String,
}

impl ArticleContent {
    /// The first `max_chars` characters of the full text.
    pub fn excerpt(&self, max_chars: usize) -> &str {
        match self.full_content.char_indices().nth(max_chars) {
            Some((idx, _)) => &self.full_content[..idx],
            None => &self.full_content,
        }
    }
}

/// Trait for encyclopedia backends.
#[async_trait]
pub trait Encyclopedia: Send + Sync {
    /// Backend name for logging.
    fn name(&self) -> &'static str;

    /// Search for page titles matching a query, best match first.
    async fn search(&self, query: &str, limit: u32) -> Result<Vec<String>>;

    /// Fetch a page by exact title. Returns `None` when no such page exists.
    async fn page(&self, title: &str) -> Result<Option<ArticleContent>>;
}

/// Fetches article content for a topic using the top search result.
pub struct ContentFetcher {
    source: Arc<dyn Encyclopedia>,
    search_limit: u32,
}

impl ContentFetcher {
    pub fn new(source: Arc<dyn Encyclopedia>, search_limit: u32) -> Self {
        Self {
            source,
            search_limit,
        }
    }

    /// Search for `topic` and return the first hit's article.
    ///
    /// There is no fallback to later hits: if the first title has no backing
    /// page the fetch fails with `NotFound`.
    #[instrument(skip(self), fields(source = self.source.name()))]
    pub async fn fetch(&self, topic: &str) -> Result<ArticleContent> {
        let topic = topic.trim();
        if topic.is_empty() {
            return Err(Gener8Error::InvalidInput("Topic is empty".to_string()));
        }

        info!("Searching for '{}'", topic);
        let results = self
            .source
            .search(topic, self.search_limit)
            .await
            .inspect_err(|e| error!("Search failed: {}", e))?;

        let Some(page_name) = results.into_iter().next() else {
            return Err(Gener8Error::NotFound(format!(
                "No results found for '{}'. Please try another subject.",
                topic
            )));
        };

        info!("Fetching page '{}'", page_name);
        let page = self
            .source
            .page(&page_name)
            .await
            .inspect_err(|e| error!("Page fetch failed: {}", e))?;

        page.ok_or_else(|| {
            Gener8Error::NotFound(format!("The page '{}' does not exist.", page_name))
        })
    }
}

/// The lead section of a plain-text article: everything before the first
/// `== Heading ==` line.
pub fn lead_section(text: &str) -> String {
    let mut lead = String::new();
    for line in text.lines() {
        let trimmed = line.trim();
        if trimmed.starts_with("==") && trimmed.ends_with("==") && trimmed.len() > 4 {
            break;
        }
        lead.push_str(line);
        lead.push('\n');
    }
    lead.trim().to_string()
}
