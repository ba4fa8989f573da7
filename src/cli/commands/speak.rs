//! Speak command implementation.

use crate::cli::preflight::{self, Operation};
use crate::cli::Output;
use crate::config::{Settings, SpeechEngine};
use crate::http::create_http_client;
use crate::script::{narration_text, ScriptSegment};
use crate::speech::{create_synthesizer, synthesize_to_file, SynthesisOptions};
use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

/// Run the speak command.
pub async fn run_speak(
    text: Option<&str>,
    file: Option<&Path>,
    output: Option<PathBuf>,
    engine: Option<SpeechEngine>,
    mut settings: Settings,
) -> Result<()> {
    if let Some(engine) = engine {
        settings.speech.engine = engine;
    }

    if let Err(e) = preflight::check(Operation::Speak(settings.speech.engine)) {
        Output::error(&format!("{}", e));
        Output::info("Run 'gener8 doctor' for detailed diagnostics.");
        return Err(e.into());
    }

    let text = match (text, file) {
        (Some(text), _) => text.to_string(),
        (None, Some(path)) => read_text(path).await?,
        (None, None) => anyhow::bail!("Provide --text or --file"),
    };

    let output = output.unwrap_or_else(|| settings.narration_path());
    let synthesizer = create_synthesizer(&settings, create_http_client(&settings.http)?)?;
    let options = SynthesisOptions::from_settings(&settings.speech);

    let spinner = Output::spinner(&format!("Synthesizing with the {} voice...", options.engine));
    let result = synthesize_to_file(synthesizer.as_ref(), &text, &options, &output).await;
    spinner.finish_and_clear();

    match result {
        Ok(bytes) => {
            Output::success(&format!(
                "Audio content written to file \"{}\" ({} bytes)",
                output.display(),
                bytes
            ));
            Ok(())
        }
        Err(e) => {
            Output::error(&format!("{}", e));
            Err(e.into())
        }
    }
}

/// Read narration text from a plain text file or a saved script.
async fn read_text(path: &Path) -> Result<String> {
    let content = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("Failed to read {}", path.display()))?;

    if path.extension().is_some_and(|ext| ext == "json") {
        let segments: Vec<ScriptSegment> = serde_json::from_str(&content)
            .with_context(|| format!("{} is not a script file", path.display()))?;
        return Ok(narration_text(&segments));
    }
    Ok(content)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_read_text_from_script_json() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("script.json");
        std::fs::write(
            &path,
            r#"[{"title":"Alam mo ba?","content":"Endemic ito sa Pilipinas."}]"#,
        )
        .unwrap();

        let text = read_text(&path).await.unwrap();
        assert_eq!(text, "Alam mo ba? Endemic ito sa Pilipinas.");
    }

    #[tokio::test]
    async fn test_read_plain_text() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("narration.txt");
        std::fs::write(&path, "Kumusta, mga kaibigan!").unwrap();

        assert_eq!(read_text(&path).await.unwrap(), "Kumusta, mga kaibigan!");
    }
}
