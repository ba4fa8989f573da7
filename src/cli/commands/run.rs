//! Run command: the whole pipeline from topic to video.

use super::script::print_segments;
use crate::cli::output::content_preview;
use crate::cli::preflight::{self, Operation};
use crate::cli::Output;
use crate::config::{Settings, SpeechEngine};
use crate::media::collect_images;
use crate::orchestrator::Orchestrator;
use anyhow::Result;
use console::style;
use std::io::{self, BufRead, Write};
use std::path::PathBuf;

/// Run the full pipeline.
pub async fn run_pipeline(
    topic: Option<String>,
    yes: bool,
    images: &[PathBuf],
    engine: Option<SpeechEngine>,
    output_dir: Option<String>,
    mut settings: Settings,
) -> Result<()> {
    if let Some(engine) = engine {
        settings.speech.engine = engine;
    }
    if let Some(dir) = output_dir {
        settings.general.output_dir = dir;
    }

    let images = collect_images(images)?;
    if !images.is_empty() {
        Output::info(&format!("{} image(s) will be used for the video", images.len()));
    }

    if let Err(e) = preflight::check(Operation::Run {
        engine: settings.speech.engine,
        render: !images.is_empty(),
    }) {
        Output::error(&format!("{}", e));
        Output::info("Run 'gener8 doctor' for detailed diagnostics.");
        return Err(e.into());
    }

    let topic = match topic {
        Some(topic) => topic,
        None => prompt_line("Enter a topic to search for:")?,
    };

    let orchestrator = Orchestrator::new(settings)?;

    let spinner = Output::spinner(&format!("Looking up '{}'...", topic.trim()));
    let article = orchestrator.fetch(&topic).await;
    spinner.finish_and_clear();

    let article = match article {
        Ok(article) => article,
        Err(e) => {
            Output::error(&format!("{}", e));
            return Err(e.into());
        }
    };

    Output::header(&article.title);
    Output::kv("URL", &article.url);
    Output::kv("Summary", &content_preview(&article.summary, 300));
    println!();

    if !yes {
        prompt_line("Press Enter to continue to LLM call...")?;
    }

    let report = match orchestrator.produce(&article, &images).await {
        Ok(report) => report,
        Err(e) => {
            Output::error(&format!("Pipeline failed: {}", e));
            return Err(e.into());
        }
    };

    print_segments(&report.segments);
    Output::success(&format!(
        "Audio content written to file \"{}\"",
        report.audio_path.display()
    ));
    if let Some(video) = &report.video {
        Output::success("Video created");
        Output::media_file(&video.output_path.display().to_string(), video.duration_seconds);
    }

    Ok(())
}

/// Print a prompt and read one line from stdin.
fn prompt_line(message: &str) -> io::Result<String> {
    print!("{} {} ", style("?").cyan(), message);
    io::stdout().flush()?;

    let mut input = String::new();
    io::stdin().lock().read_line(&mut input)?;
    Ok(input.trim().to_string())
}
