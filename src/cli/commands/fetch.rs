//! Fetch command implementation.

use crate::cli::output::content_preview;
use crate::cli::Output;
use crate::config::Settings;
use crate::encyclopedia::{ContentFetcher, WikipediaClient};
use crate::http::create_http_client;
use anyhow::Result;
use std::sync::Arc;

/// Build a fetcher for the configured encyclopedia.
pub(super) fn build_fetcher(settings: &Settings) -> Result<ContentFetcher> {
    let http = create_http_client(&settings.http)?;
    let client = WikipediaClient::new(http, &settings.encyclopedia)?;
    Ok(ContentFetcher::new(
        Arc::new(client),
        settings.encyclopedia.search_limit,
    ))
}

/// Run the fetch command.
pub async fn run_fetch(topic: &str, full: bool, settings: Settings) -> Result<()> {
    let fetcher = build_fetcher(&settings)?;

    let spinner = Output::spinner(&format!("Looking up '{}'...", topic));
    let result = fetcher.fetch(topic).await;
    spinner.finish_and_clear();

    let article = match result {
        Ok(article) => article,
        Err(e) => {
            Output::error(&format!("{}", e));
            return Err(e.into());
        }
    };

    Output::header(&article.title);
    Output::kv("URL", &article.url);
    Output::kv("Length", &format!("{} chars", article.full_content.chars().count()));
    println!();

    if full {
        println!("{}", article.full_content);
    } else {
        println!("{}", content_preview(&article.summary, 1000));
    }

    Ok(())
}
