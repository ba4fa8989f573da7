//! Free speech engine backed by the Google Translate voice.
//!
//! Speaks the same protocol as the community gTTS library: each piece of
//! up to 100 characters is posted to the Translate web RPC endpoint, and the
//! base64 MP3 in the reply is decoded and appended.

use super::{base64, char_len, ensure_text, split_text, SpeechSynthesizer, SynthesisOptions};
use crate::config::SpeechEngine;
use crate::error::{Gener8Error, Result};
use async_trait::async_trait;
use regex::Regex;
use std::sync::LazyLock;
use tracing::{debug, instrument};

const ENDPOINT: &str = "https://translate.google.com/_/TranslateWebserverUi/data/batchexecute";
const RPC_ID: &str = "jQ1olc";
const MAX_CHARS: usize = 100;

static AUDIO_PAYLOAD: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"jQ1olc","\[\\"(.*?)\\"\]"#).expect("Invalid regex"));

/// Google Translate text-to-speech.
pub struct TranslateTts {
    client: reqwest::Client,
    endpoint: String,
}

impl TranslateTts {
    pub fn new(client: reqwest::Client) -> Self {
        Self::with_endpoint(client, ENDPOINT)
    }

    pub fn with_endpoint(client: reqwest::Client, endpoint: &str) -> Self {
        Self {
            client,
            endpoint: endpoint.to_string(),
        }
    }

    async fn synthesize_piece(&self, piece: &str, language: &str) -> Result<Vec<u8>> {
        let body = self
            .client
            .post(&self.endpoint)
            .header(reqwest::header::REFERER, "https://translate.google.com/")
            .form(&[("f.req", rpc_payload(piece, language))])
            .send()
            .await
            .map_err(|e| Gener8Error::Synthesis(format!("Translate TTS request failed: {}", e)))?
            .error_for_status()
            .map_err(|e| Gener8Error::Synthesis(format!("Translate TTS rejected request: {}", e)))?
            .text()
            .await
            .map_err(|e| {
                Gener8Error::Synthesis(format!("Failed to read Translate TTS reply: {}", e))
            })?;

        decode_reply(&body)
    }
}

#[async_trait]
impl SpeechSynthesizer for TranslateTts {
    fn engine(&self) -> SpeechEngine {
        SpeechEngine::Free
    }

    #[instrument(skip(self, text, options), fields(language = %options.language))]
    async fn synthesize(&self, text: &str, options: &SynthesisOptions) -> Result<Vec<u8>> {
        ensure_text(text)?;

        let pieces = split_text(text, MAX_CHARS, char_len);
        debug!("Synthesizing {} pieces", pieces.len());

        let mut audio = Vec::new();
        for piece in &pieces {
            audio.extend(self.synthesize_piece(piece, &options.language).await?);
        }
        Ok(audio)
    }
}

/// Build the `f.req` form value for one piece of text.
fn rpc_payload(text: &str, language: &str) -> String {
    let parameter = serde_json::json!([text, language, null, "null"]).to_string();
    serde_json::json!([[[RPC_ID, parameter, null, "generic"]]]).to_string()
}

/// Extract and decode the audio from an RPC reply.
fn decode_reply(body: &str) -> Result<Vec<u8>> {
    let encoded = body
        .lines()
        .filter(|line| line.contains(RPC_ID))
        .find_map(|line| AUDIO_PAYLOAD.captures(line))
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
        .ok_or_else(|| {
            Gener8Error::Synthesis(
                "Translate TTS reply did not contain audio; the language may be unsupported"
                    .to_string(),
            )
        })?;

    base64::decode(encoded)
        .map_err(|e| Gener8Error::Synthesis(format!("Invalid audio payload: {}", e)))
}
