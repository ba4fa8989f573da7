//! Pre-flight checks before expensive operations.
//!
//! Validates that required tools and credentials are available
//! before starting operations that would otherwise fail midway.

use crate::config::SpeechEngine;
use crate::error::{Gener8Error, Result};
use crate::speech::CloudCredentials;
use std::process::Command;

/// Requirements for different operations.
#[derive(Debug, Clone, Copy)]
pub enum Operation {
    /// Full run: model key, voice credentials, and ffprobe/ffmpeg when rendering.
    Run { engine: SpeechEngine, render: bool },
    /// Script writing needs the model key.
    Script,
    /// Speech needs credentials for the cloud engine only.
    Speak(SpeechEngine),
    /// Rendering needs ffmpeg and ffprobe.
    Assemble,
}

/// Run pre-flight checks for the given operation.
///
/// Returns Ok(()) if all checks pass, or an error describing what's missing.
pub fn check(operation: Operation) -> Result<()> {
    match operation {
        Operation::Run { engine, render } => {
            check_api_key()?;
            check_speech(engine)?;
            if render {
                check_tool("ffmpeg")?;
                check_tool("ffprobe")?;
            }
        }
        Operation::Script => {
            check_api_key()?;
        }
        Operation::Speak(engine) => {
            check_speech(engine)?;
        }
        Operation::Assemble => {
            check_tool("ffmpeg")?;
            check_tool("ffprobe")?;
        }
    }
    Ok(())
}

/// Check if OpenAI API key is configured.
fn check_api_key() -> Result<()> {
    match std::env::var("OPENAI_API_KEY") {
        Ok(key) if !key.is_empty() => Ok(()),
        Ok(_) => Err(Gener8Error::Config(
            "OPENAI_API_KEY is empty. Set it with: export OPENAI_API_KEY='sk-...'".to_string(),
        )),
        Err(_) => Err(Gener8Error::Config(
            "OPENAI_API_KEY not set. Set it with: export OPENAI_API_KEY='sk-...'".to_string(),
        )),
    }
}

fn check_speech(engine: SpeechEngine) -> Result<()> {
    match engine {
        SpeechEngine::Free => Ok(()),
        SpeechEngine::Cloud => CloudCredentials::from_env().map(|_| ()),
    }
}

/// Check if an external tool is available.
fn check_tool(name: &str) -> Result<()> {
    match Command::new(name).arg("-version").output() {
        Ok(output) if output.status.success() => Ok(()),
        Ok(_) => Err(Gener8Error::ToolNotFound(format!(
            "{} is installed but not working correctly",
            name
        ))),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            Err(Gener8Error::ToolNotFound(name.to_string()))
        }
        Err(e) => Err(Gener8Error::ToolNotFound(format!("{}: {}", name, e))),
    }
}
