//! Pipeline orchestrator for gener8.
//!
//! Coordinates the stages from topic lookup to the rendered video. Every
//! stage returns the crate's `Result`, so callers compose them with `?` and
//! can tell failure from success at each step.

use crate::config::{Prompts, Settings};
use crate::encyclopedia::{ArticleContent, ContentFetcher, Encyclopedia, WikipediaClient};
use crate::error::Result;
use crate::http::create_http_client;
use crate::media::{
    ffmpeg::probe_duration, plan_timeline, render_error, RenderOutput, VideoAssembler,
};
use crate::script::{narration_text, LanguageModel, OpenAIChatModel, ScriptGenerator, ScriptSegment};
use crate::speech::{create_synthesizer, synthesize_to_file, SpeechSynthesizer, SynthesisOptions};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{info, instrument};

/// The main orchestrator for the gener8 pipeline.
pub struct Orchestrator {
    settings: Settings,
    fetcher: ContentFetcher,
    generator: ScriptGenerator,
    synthesizer: Arc<dyn SpeechSynthesizer>,
    assembler: VideoAssembler,
}

impl Orchestrator {
    /// Create an orchestrator backed by Wikipedia, OpenAI and the configured TTS engine.
    pub fn new(settings: Settings) -> Result<Self> {
        let http = create_http_client(&settings.http)?;

        let encyclopedia = Arc::new(WikipediaClient::new(http.clone(), &settings.encyclopedia)?);
        let model = Arc::new(OpenAIChatModel::with_model(
            &settings.script.model,
            settings.script.temperature,
        )?);
        let synthesizer = create_synthesizer(&settings, http)?;

        Self::with_components(settings, encyclopedia, model, synthesizer)
    }

    /// Create an orchestrator with custom components.
    pub fn with_components(
        settings: Settings,
        encyclopedia: Arc<dyn Encyclopedia>,
        model: Arc<dyn LanguageModel>,
        synthesizer: Arc<dyn SpeechSynthesizer>,
    ) -> Result<Self> {
        let prompts = Prompts::load(
            settings.prompts.custom_dir.as_deref(),
            Some(&settings.prompts.variables),
        )?;

        let fetcher = ContentFetcher::new(encyclopedia, settings.encyclopedia.search_limit);
        let generator =
            ScriptGenerator::new(model, prompts).with_max_retries(settings.script.max_retries);
        let assembler = VideoAssembler::new(settings.video.clone());

        Ok(Self {
            settings,
            fetcher,
            generator,
            synthesizer,
            assembler,
        })
    }

    /// Get the settings.
    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Look up a topic and return the first hit's article.
    pub async fn fetch(&self, topic: &str) -> Result<ArticleContent> {
        self.fetcher.fetch(topic).await
    }

    /// Write trivia segments from the start of an article.
    pub async fn write_script(&self, article: &ArticleContent) -> Result<Vec<ScriptSegment>> {
        let excerpt = article.excerpt(self.settings.script.excerpt_chars);
        self.generator.generate(excerpt).await
    }

    /// Synthesize text with the configured voice into `output`.
    pub async fn speak(&self, text: &str, output: &Path) -> Result<u64> {
        let options = SynthesisOptions::from_settings(&self.settings.speech);
        synthesize_to_file(self.synthesizer.as_ref(), text, &options, output).await
    }

    /// Synthesize the narration for a script into `output`.
    pub async fn narrate(&self, segments: &[ScriptSegment], output: &Path) -> Result<u64> {
        self.speak(&narration_text(segments), output).await
    }

    /// Render one image per segment over the narration at `audio`.
    pub async fn render(
        &self,
        segments: &[ScriptSegment],
        audio: &Path,
        images: &[PathBuf],
        output: &Path,
    ) -> Result<RenderOutput> {
        let duration = probe_duration(audio).await.map_err(render_error)?;
        let timeline = plan_timeline(segments, images, duration);
        self.assembler.assemble(audio, &timeline, output).await
    }

    /// Run every stage after the fetch: script, narration, and (when images
    /// are given) the video. Writes `script.json` into the output directory.
    #[instrument(skip(self, article, images), fields(title = %article.title))]
    pub async fn produce(&self, article: &ArticleContent, images: &[PathBuf]) -> Result<RunReport> {
        let output_dir = self.settings.output_dir();
        tokio::fs::create_dir_all(&output_dir).await?;

        info!("Writing script");
        eprintln!("  Writing script...");
        let segments = self.write_script(article).await?;
        eprintln!("  Script ready ({} segments)", segments.len());

        let audio_path = self.settings.narration_path();
        info!("Synthesizing narration");
        eprintln!("  Synthesizing narration...");
        let audio_bytes = self.narrate(&segments, &audio_path).await?;
        eprintln!("  Audio content written to {}", audio_path.display());

        let video = if images.is_empty() {
            None
        } else {
            info!("Rendering video with {} images", images.len());
            eprintln!("  Rendering video...");
            let rendered = self
                .render(&segments, &audio_path, images, &self.settings.video_path())
                .await?;
            eprintln!("  Video created: {}", rendered.output_path.display());
            Some(rendered)
        };

        let report = RunReport {
            article_title: article.title.clone(),
            article_url: article.url.clone(),
            segments,
            audio_path,
            audio_bytes,
            video,
        };

        let report_path = output_dir.join("script.json");
        tokio::fs::write(&report_path, serde_json::to_string_pretty(&report)?).await?;
        info!("Run report written to {}", report_path.display());

        Ok(report)
    }
}

/// Result of a pipeline run.
#[derive(Debug, Serialize)]
pub struct RunReport {
    pub article_title: String,
    pub article_url: String,
    /// Generated segments.
    pub segments: Vec<ScriptSegment>,
    /// Narration file.
    pub audio_path: PathBuf,
    /// Size of the narration file.
    pub audio_bytes: u64,
    /// Rendered video, if images were supplied.
    pub video: Option<RenderOutput>,
}
