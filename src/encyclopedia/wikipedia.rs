//! Wikipedia backend using the MediaWiki Action API.

use super::{lead_section, ArticleContent, Encyclopedia};
use crate::config::EncyclopediaSettings;
use crate::error::{Gener8Error, Result};
use async_trait::async_trait;
use serde::Deserialize;
use tracing::{debug, instrument};

/// Wikipedia client for one language edition.
pub struct WikipediaClient {
    client: reqwest::Client,
    endpoint: url::Url,
}

impl WikipediaClient {
    pub fn new(client: reqwest::Client, settings: &EncyclopediaSettings) -> Result<Self> {
        let endpoint = url::Url::parse(&settings.endpoint()).map_err(|e| {
            Gener8Error::Config(format!(
                "Invalid encyclopedia endpoint '{}': {}",
                settings.endpoint(),
                e
            ))
        })?;

        Ok(Self { client, endpoint })
    }

    async fn query(&self, params: &[(&str, &str)]) -> Result<String> {
        debug!("GET {} {:?}", self.endpoint, params);

        let response = self
            .client
            .get(self.endpoint.clone())
            .query(&[("action", "query"), ("format", "json"), ("formatversion", "2")])
            .query(params)
            .send()
            .await
            .map_err(|e| Gener8Error::Fetch(format!("Request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(Gener8Error::Fetch(format!(
                "Encyclopedia returned HTTP {}",
                status
            )));
        }

        response
            .text()
            .await
            .map_err(|e| Gener8Error::Fetch(format!("Failed to read response body: {}", e)))
    }
}

#[async_trait]
impl Encyclopedia for WikipediaClient {
    fn name(&self) -> &'static str {
        "wikipedia"
    }

    #[instrument(skip(self))]
    async fn search(&self, query: &str, limit: u32) -> Result<Vec<String>> {
        let limit = limit.to_string();
        let body = self
            .query(&[
                ("list", "search"),
                ("srsearch", query),
                ("srlimit", &limit),
                ("srprop", ""),
            ])
            .await?;
        parse_search_response(&body)
    }

    #[instrument(skip(self))]
    async fn page(&self, title: &str) -> Result<Option<ArticleContent>> {
        let body = self
            .query(&[
                ("prop", "extracts|info"),
                ("titles", title),
                ("explaintext", "1"),
                ("exsectionformat", "wiki"),
                ("exlimit", "1"),
                ("inprop", "url"),
                ("redirects", "1"),
            ])
            .await?;
        parse_page_response(&body)
    }
}

/// Parse a `list=search` response into titles, best match first.
fn parse_search_response(body: &str) -> Result<Vec<String>> {
    let response: ApiResponse<SearchQuery> = serde_json::from_str(body)
        .map_err(|e| Gener8Error::Fetch(format!("Invalid search response: {}", e)))?;

    if let Some(err) = response.error {
        return Err(Gener8Error::Fetch(format!("{}: {}", err.code, err.info)));
    }

    Ok(response
        .query
        .map(|q| q.search.into_iter().map(|hit| hit.title).collect())
        .unwrap_or_default())
}

/// Parse a `prop=extracts|info` response into an article.
fn parse_page_response(body: &str) -> Result<Option<ArticleContent>> {
    let response: ApiResponse<PageQuery> = serde_json::from_str(body)
        .map_err(|e| Gener8Error::Fetch(format!("Invalid page response: {}", e)))?;

    if let Some(err) = response.error {
        return Err(Gener8Error::Fetch(format!("{}: {}", err.code, err.info)));
    }

    let Some(page) = response.query.and_then(|q| q.pages.into_iter().next()) else {
        return Ok(None);
    };

    if page.missing || page.invalid {
        return Ok(None);
    }

    let full_content = page.extract.unwrap_or_default();
    let url = page.fullurl.unwrap_or_else(|| {
        format!("https://en.wikipedia.org/wiki/{}", page.title.replace(' ', "_"))
    });

    Ok(Some(ArticleContent {
        summary: lead_section(&full_content),
        title: page.title,
        url,
        full_content,
    }))
}

// MediaWiki response types (formatversion=2)

#[derive(Debug, Deserialize)]
struct ApiResponse<Q> {
    query: Option<Q>,
    error: Option<ApiError>,
}

#[derive(Debug, Deserialize)]
struct ApiError {
    code: String,
    info: String,
}

#[derive(Debug, Deserialize)]
struct SearchQuery {
    #[serde(default)]
    search: Vec<SearchHit>,
}

#[derive(Debug, Deserialize)]
struct SearchHit {
    title: String,
}

#[derive(Debug, Deserialize)]
struct PageQuery {
    #[serde(default)]
    pages: Vec<Page>,
}

#[derive(Debug, Deserialize)]
struct Page {
    title: String,
    #[serde(default)]
    missing: bool,
    #[serde(default)]
    invalid: bool,
    extract: Option<String>,
    fullurl: Option<String>,
}
