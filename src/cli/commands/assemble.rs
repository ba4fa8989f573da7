//! Assemble command implementation.

use crate::cli::preflight::{self, Operation};
use crate::cli::Output;
use crate::config::Settings;
use crate::media::{TimedImage, VideoAssembler};
use anyhow::Result;
use std::path::{Path, PathBuf};

/// Run the assemble command.
pub async fn run_assemble(
    audio: &Path,
    images: &[TimedImage],
    output: Option<PathBuf>,
    settings: Settings,
) -> Result<()> {
    if let Err(e) = preflight::check(Operation::Assemble) {
        Output::error(&format!("{}", e));
        Output::info("Run 'gener8 doctor' for detailed diagnostics.");
        return Err(e.into());
    }

    if images.is_empty() {
        Output::warning("No images given; the video will be black.");
    }

    let output = output.unwrap_or_else(|| settings.video_path());
    let assembler = VideoAssembler::new(settings.video.clone());

    let spinner = Output::spinner(&format!("Rendering {} image(s)...", images.len()));
    let result = assembler.assemble(audio, images, &output).await;
    spinner.finish_and_clear();

    match result {
        Ok(rendered) => {
            Output::success("Video created");
            Output::media_file(
                &rendered.output_path.display().to_string(),
                rendered.duration_seconds,
            );
            Ok(())
        }
        Err(e) => {
            Output::error(&format!("{}", e));
            Err(e.into())
        }
    }
}
