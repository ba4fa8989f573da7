//! Error types for gener8.

use thiserror::Error;

/// Library-level error type shared by every pipeline stage.
#[derive(Error, Debug)]
pub enum Gener8Error {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Encyclopedia fetch failed: {0}")]
    Fetch(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Language model error: {0}")]
    Model(String),

    #[error("Could not parse script: {0}")]
    Parse(String),

    #[error("Speech synthesis failed: {0}")]
    Synthesis(String),

    #[error("Video rendering failed: {0}")]
    Render(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("External tool not found: {0}. Please install it and ensure it's in your PATH.")]
    ToolNotFound(String),

    #[error("External tool failed: {0}")]
    ToolFailed(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

/// Result type alias for gener8 operations.
pub type Result<T> = std::result::Result<T, Gener8Error>;
