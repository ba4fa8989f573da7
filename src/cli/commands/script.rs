//! Script command implementation.

use super::fetch::build_fetcher;
use crate::cli::preflight::{self, Operation};
use crate::cli::Output;
use crate::config::{Prompts, Settings};
use crate::script::{OpenAIChatModel, ScriptGenerator, ScriptSegment};
use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Run the script command.
pub async fn run_script(
    topic: Option<&str>,
    file: Option<&Path>,
    output: Option<PathBuf>,
    settings: Settings,
) -> Result<()> {
    if let Err(e) = preflight::check(Operation::Script) {
        Output::error(&format!("{}", e));
        Output::info("Run 'gener8 doctor' for detailed diagnostics.");
        return Err(e.into());
    }

    let text = match (file, topic) {
        (Some(path), _) => tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read {}", path.display()))?,
        (None, Some(topic)) => {
            let spinner = Output::spinner(&format!("Looking up '{}'...", topic));
            let article = build_fetcher(&settings)?.fetch(topic).await;
            spinner.finish_and_clear();
            let article = article?;
            Output::info(&format!("Using '{}' ({})", article.title, article.url));
            article.full_content
        }
        (None, None) => anyhow::bail!("Provide a topic or --file"),
    };

    let excerpt: String = text.chars().take(settings.script.excerpt_chars).collect();

    let prompts = Prompts::load(
        settings.prompts.custom_dir.as_deref(),
        Some(&settings.prompts.variables),
    )?;
    let model = Arc::new(OpenAIChatModel::with_model(
        &settings.script.model,
        settings.script.temperature,
    )?);
    let generator =
        ScriptGenerator::new(model, prompts).with_max_retries(settings.script.max_retries);

    let spinner = Output::spinner(&format!("Writing script with {}...", settings.script.model));
    let segments = generator.generate(&excerpt).await;
    spinner.finish_and_clear();

    let segments = match segments {
        Ok(segments) => segments,
        Err(e) => {
            Output::error(&format!("Failed to write script: {}", e));
            return Err(e.into());
        }
    };

    print_segments(&segments);

    if let Some(path) = output {
        tokio::fs::write(&path, serde_json::to_string_pretty(&segments)?).await?;
        Output::success(&format!("Script written to {}", path.display()));
    }

    Ok(())
}

/// Print numbered segments.
pub(super) fn print_segments(segments: &[ScriptSegment]) {
    for (i, segment) in segments.iter().enumerate() {
        Output::segment(i + 1, &segment.title, &segment.content);
    }
    println!();
}
