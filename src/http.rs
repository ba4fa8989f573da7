//! Shared HTTP client for the encyclopedia and speech services.

use crate::config::HttpSettings;
use crate::error::{Gener8Error, Result};
use std::time::Duration;

/// Create a reqwest client with the configured timeout and User-Agent.
pub fn create_http_client(settings: &HttpSettings) -> Result<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(Duration::from_secs(settings.timeout_seconds))
        .user_agent(&settings.user_agent)
        .build()
        .map_err(|e| Gener8Error::Config(format!("Failed to create HTTP client: {}", e)))
}
