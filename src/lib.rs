//! gener8 - narrated trivia videos from encyclopedia topics
//!
//! Turns a topic into a short-form video: the topic is looked up on
//! Wikipedia, a chat model writes Taglish trivia segments from the start of
//! the article, the segments are narrated with a Filipino voice, and the
//! narration is rendered over a set of images.
//!
//! # Architecture
//!
//! - `config` - Configuration and prompt management
//! - `encyclopedia` - Topic search and article retrieval
//! - `script` - Trivia script generation and response parsing
//! - `speech` - Text-to-speech backends
//! - `media` - Timeline planning and ffmpeg rendering
//! - `orchestrator` - Pipeline coordination
//!
//! # Example
//!
//! ```rust,no_run
//! use gener8::config::Settings;
//! use gener8::orchestrator::Orchestrator;
//! use std::path::PathBuf;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let settings = Settings::load()?;
//!     let orchestrator = Orchestrator::new(settings)?;
//!
//!     let article = orchestrator.fetch("Philippine eagle").await?;
//!     let report = orchestrator
//!         .produce(&article, &[PathBuf::from("eagle.jpg")])
//!         .await?;
//!     println!("Narration saved to {}", report.audio_path.display());
//!
//!     Ok(())
//! }
//! ```

pub mod cli;
pub mod config;
pub mod encyclopedia;
pub mod error;
pub mod http;
pub mod media;
pub mod openai;
pub mod orchestrator;
pub mod script;
pub mod speech;

pub use error::{Gener8Error, Result};
