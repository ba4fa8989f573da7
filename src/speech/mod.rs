//! Speech synthesis for narration audio.
//!
//! Two interchangeable backends sit behind [`SpeechSynthesizer`]:
//!
//! - **free**: the Google Translate voice, selected only by language code.
//! - **cloud**: Google Cloud Text-to-Speech with a named neural voice.
//!
//! Both split long text into request-sized pieces and concatenate the MP3
//! bytes they get back.

mod base64;
mod cloud;
mod translate;

pub use cloud::{CloudCredentials, CloudTts};
pub use translate::TranslateTts;

use crate::config::{Settings, SpeechEngine, SpeechSettings};
use crate::error::{Gener8Error, Result};
use async_trait::async_trait;
use regex::Regex;
use std::path::Path;
use std::sync::{Arc, LazyLock};
use tracing::{info, instrument};

/// Voice parameters for one synthesis call.
#[derive(Debug, Clone, PartialEq)]
pub struct SynthesisOptions {
    pub engine: SpeechEngine,
    pub language: String,
    /// Voice name (cloud only).
    pub voice_name: Option<String>,
    /// Voice gender (cloud only).
    pub gender: Option<String>,
    pub speaking_rate: f32,
}

impl SynthesisOptions {
    pub fn from_settings(settings: &SpeechSettings) -> Self {
        match settings.engine {
            SpeechEngine::Free => Self {
                engine: SpeechEngine::Free,
                language: settings.free_language.clone(),
                voice_name: None,
                gender: None,
                speaking_rate: 1.0,
            },
            SpeechEngine::Cloud => Self {
                engine: SpeechEngine::Cloud,
                language: settings.cloud_language.clone(),
                voice_name: Some(settings.voice_name.clone()),
                gender: Some(settings.gender.clone()),
                speaking_rate: settings.speaking_rate,
            },
        }
    }
}

/// Trait for text-to-speech backends.
#[async_trait]
pub trait SpeechSynthesizer: Send + Sync {
    fn engine(&self) -> SpeechEngine;

    /// Synthesize `text` and return MP3 bytes.
    async fn synthesize(&self, text: &str, options: &SynthesisOptions) -> Result<Vec<u8>>;
}

/// Create the synthesizer selected by `settings.speech.engine`.
pub fn create_synthesizer(
    settings: &Settings,
    client: reqwest::Client,
) -> Result<Arc<dyn SpeechSynthesizer>> {
    match settings.speech.engine {
        SpeechEngine::Free => Ok(Arc::new(TranslateTts::new(client))),
        SpeechEngine::Cloud => {
            let credentials = CloudCredentials::from_env()?;
            Ok(Arc::new(CloudTts::new(
                client,
                &settings.speech.cloud_endpoint,
                credentials,
                settings.speech.max_request_bytes,
            )))
        }
    }
}

/// Synthesize `text` and write the audio to `output`.
///
/// Empty or whitespace-only text is rejected before any request is made.
#[instrument(
    skip(synthesizer, text, options),
    fields(engine = %options.engine, chars = text.chars().count())
)]
pub async fn synthesize_to_file(
    synthesizer: &dyn SpeechSynthesizer,
    text: &str,
    options: &SynthesisOptions,
    output: &Path,
) -> Result<u64> {
    ensure_text(text)?;

    let audio = synthesizer.synthesize(text, options).await?;
    if audio.is_empty() {
        return Err(Gener8Error::Synthesis(format!(
            "{} engine returned no audio",
            synthesizer.engine()
        )));
    }

    if let Some(parent) = output.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent).await?;
    }
    tokio::fs::write(output, &audio).await?;

    info!("Audio saved as {} ({} bytes)", output.display(), audio.len());
    Ok(audio.len() as u64)
}

pub(crate) fn ensure_text(text: &str) -> Result<()> {
    if text.trim().is_empty() {
        return Err(Gener8Error::InvalidInput(
            "Cannot synthesize empty text".to_string(),
        ));
    }
    Ok(())
}

static BOUNDARY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[.!?;:]+(?:\s+|$)|\n+").expect("Invalid regex"));

/// Split text into pieces no longer than `max_len`, as counted by `measure`.
///
/// Text that already fits comes back as a single piece. Otherwise sentences
/// are kept whole where possible, then words, and only words that are
/// themselves too long are cut mid-word. Punctuation only ends a sentence
/// when whitespace or the end of the text follows it, so `1.02` and `10:30`
/// stay whole.
pub fn split_text(text: &str, max_len: usize, measure: fn(&str) -> usize) -> Vec<String> {
    let max_len = max_len.max(1);
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Vec::new();
    }
    if measure(trimmed) <= max_len {
        return vec![trimmed.to_string()];
    }

    let mut chunks = Vec::new();
    let mut current = String::new();

    for piece in pieces(trimmed, max_len, measure) {
        if current.is_empty() {
            current = piece;
        } else if measure(&current) + 1 + measure(&piece) <= max_len {
            current.push(' ');
            current.push_str(&piece);
        } else {
            chunks.push(std::mem::replace(&mut current, piece));
        }
    }
    if !current.is_empty() {
        chunks.push(current);
    }

    chunks
}

fn sentences(text: &str) -> Vec<&str> {
    let mut out = Vec::new();
    let mut start = 0;
    for boundary in BOUNDARY.find_iter(text) {
        out.push(&text[start..boundary.end()]);
        start = boundary.end();
    }
    if start < text.len() {
        out.push(&text[start..]);
    }
    out
}

fn pieces(text: &str, max_len: usize, measure: fn(&str) -> usize) -> Vec<String> {
    let mut out = Vec::new();

    for sentence in sentences(text) {
        let sentence = sentence.trim();
        if sentence.is_empty() {
            continue;
        }
        if measure(sentence) <= max_len {
            out.push(sentence.to_string());
            continue;
        }

        for word in sentence.split_whitespace() {
            if measure(word) <= max_len {
                out.push(word.to_string());
                continue;
            }
            let mut buf = String::new();
            for ch in word.chars() {
                let mut candidate = buf.clone();
                candidate.push(ch);
                if !buf.is_empty() && measure(&candidate) > max_len {
                    out.push(std::mem::take(&mut buf));
                }
                buf.push(ch);
            }
            if !buf.is_empty() {
                out.push(buf);
            }
        }
    }

    out
}

/// Measure text in characters.
pub fn char_len(text: &str) -> usize {
    text.chars().count()
}

/// Measure text in UTF-8 bytes.
pub fn byte_len(text: &str) -> usize {
    text.len()
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::sync::Mutex;

    /// Returns a fixed MP3-looking payload and records every request.
    pub(crate) struct FakeSynthesizer {
        pub requests: Mutex<Vec<String>>,
    }

    impl FakeSynthesizer {
        pub fn new() -> Self {
            Self {
                requests: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl SpeechSynthesizer for FakeSynthesizer {
        fn engine(&self) -> SpeechEngine {
            SpeechEngine::Free
        }

        async fn synthesize(&self, text: &str, _options: &SynthesisOptions) -> Result<Vec<u8>> {
            self.requests.lock().unwrap().push(text.to_string());
            Ok(b"ID3\x04\x00fake-mp3".to_vec())
        }
    }

    fn options() -> SynthesisOptions {
        SynthesisOptions::from_settings(&SpeechSettings::default())
    }

    #[tokio::test]
    async fn test_synthesize_to_file_writes_audio() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("narration").join("output.mp3");
        let synth = FakeSynthesizer::new();

        let written = synthesize_to_file(&synth, "Kumusta!", &options(), &path)
            .await
            .unwrap();

        assert!(written > 0);
        assert_eq!(std::fs::metadata(&path).unwrap().len(), written);
    }

    #[test]
    fn test_empty_text_rejected_without_request() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("output.mp3");
        let synth = FakeSynthesizer::new();

        let err = tokio_test::block_on(synthesize_to_file(&synth, "  \n ", &options(), &path))
            .unwrap_err();

        assert!(matches!(err, Gener8Error::InvalidInput(_)));
        assert!(synth.requests.lock().unwrap().is_empty());
        assert!(!path.exists());
    }

    #[test]
    fn test_options_follow_engine() {
        let mut settings = SpeechSettings::default();
        let free = SynthesisOptions::from_settings(&settings);
        assert_eq!(free.language, "tl");
        assert!(free.voice_name.is_none());

        settings.engine = SpeechEngine::Cloud;
        let cloud = SynthesisOptions::from_settings(&settings);
        assert_eq!(cloud.language, "fil-PH");
        assert_eq!(cloud.voice_name.as_deref(), Some("fil-ph-Neural2-D"));
        assert_eq!(cloud.gender.as_deref(), Some("MALE"));
    }

    #[test]
    fn test_split_keeps_sentences_together() {
        let text = "Ang Philippine eagle ay malaki. Kumakain siya ng unggoy! Wow?";
        let chunks = split_text(text, 100, char_len);
        assert_eq!(chunks, vec![text.to_string()]);

        let chunks = split_text(text, 35, char_len);
        assert_eq!(
            chunks,
            vec![
                "Ang Philippine eagle ay malaki.",
                "Kumakain siya ng unggoy! Wow?",
            ]
        );
    }

    #[test]
    fn test_split_keeps_decimals_and_times() {
        let text = "Ang Philippine eagle ay 1.02 m ang haba. Kumakain siya sa 10:30 ng umaga.";
        assert_eq!(split_text(text, 5000, byte_len), vec![text.to_string()]);

        let chunks = split_text(text, 45, char_len);
        assert_eq!(
            chunks,
            vec![
                "Ang Philippine eagle ay 1.02 m ang haba.",
                "Kumakain siya sa 10:30 ng umaga.",
            ]
        );
    }

    #[test]
    fn test_split_respects_limit() {
        let text =
            "Supercalifragilisticexpialidocious is a long word, and this sentence has no early stop";
        for chunk in split_text(text, 10, char_len) {
            assert!(char_len(&chunk) <= 10, "chunk too long: {:?}", chunk);
            assert!(!chunk.trim().is_empty());
        }
    }

    #[test]
    fn test_split_by_bytes() {
        let text = "ñññññ ñññññ";
        for chunk in split_text(text, 10, byte_len) {
            assert!(chunk.len() <= 10);
        }
    }

    #[test]
    fn test_split_empty() {
        assert!(split_text("", 100, char_len).is_empty());
        assert!(split_text(" \n\n ", 100, char_len).is_empty());
    }
}
