//! Google Cloud Text-to-Speech backend.

use super::{base64, byte_len, ensure_text, split_text, SpeechSynthesizer, SynthesisOptions};
use crate::config::SpeechEngine;
use crate::error::{Gener8Error, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

/// Environment variable holding a Cloud API key.
pub const API_KEY_ENV: &str = "GOOGLE_TTS_API_KEY";
/// Environment variable holding an OAuth access token.
pub const ACCESS_TOKEN_ENV: &str = "GOOGLE_TTS_ACCESS_TOKEN";

/// How requests to the Cloud API are authenticated.
#[derive(Clone)]
pub enum CloudCredentials {
    ApiKey(String),
    AccessToken(String),
}

impl std::fmt::Debug for CloudCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CloudCredentials::ApiKey(_) => write!(f, "ApiKey(***)"),
            CloudCredentials::AccessToken(_) => write!(f, "AccessToken(***)"),
        }
    }
}

impl CloudCredentials {
    /// Read credentials from the environment, preferring an API key.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let non_empty = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        if let Some(key) = non_empty(API_KEY_ENV) {
            return Ok(CloudCredentials::ApiKey(key));
        }
        if let Some(token) = non_empty(ACCESS_TOKEN_ENV) {
            return Ok(CloudCredentials::AccessToken(token));
        }
        Err(Gener8Error::Config(format!(
            "Cloud TTS needs {} or {} (e.g. from `gcloud auth print-access-token`)",
            API_KEY_ENV, ACCESS_TOKEN_ENV
        )))
    }
}

/// Google Cloud Text-to-Speech client.
pub struct CloudTts {
    client: reqwest::Client,
    endpoint: String,
    credentials: CloudCredentials,
    max_request_bytes: usize,
}

impl CloudTts {
    pub fn new(
        client: reqwest::Client,
        endpoint: &str,
        credentials: CloudCredentials,
        max_request_bytes: usize,
    ) -> Self {
        Self {
            client,
            endpoint: endpoint.to_string(),
            credentials,
            max_request_bytes,
        }
    }

    async fn synthesize_piece(&self, piece: &str, options: &SynthesisOptions) -> Result<Vec<u8>> {
        let request = SynthesizeRequest::new(piece, options);

        let mut builder = self.client.post(&self.endpoint).json(&request);
        builder = match &self.credentials {
            CloudCredentials::ApiKey(key) => builder.query(&[("key", key)]),
            CloudCredentials::AccessToken(token) => builder.bearer_auth(token),
        };

        let response = builder
            .send()
            .await
            .map_err(|e| Gener8Error::Synthesis(format!("Cloud TTS request failed: {}", e)))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| Gener8Error::Synthesis(format!("Failed to read Cloud TTS reply: {}", e)))?;

        if !status.is_success() {
            let message = serde_json::from_str::<ErrorResponse>(&body)
                .map(|e| e.error.message)
                .unwrap_or(body);
            return Err(Gener8Error::Synthesis(format!(
                "Cloud TTS returned HTTP {}: {}",
                status, message
            )));
        }

        let reply: SynthesizeResponse = serde_json::from_str(&body)
            .map_err(|e| Gener8Error::Synthesis(format!("Invalid Cloud TTS reply: {}", e)))?;

        base64::decode(&reply.audio_content)
            .map_err(|e| Gener8Error::Synthesis(format!("Invalid audio payload: {}", e)))
    }
}

#[async_trait]
impl SpeechSynthesizer for CloudTts {
    fn engine(&self) -> SpeechEngine {
        SpeechEngine::Cloud
    }

    #[instrument(skip(self, text, options), fields(voice = ?options.voice_name))]
    async fn synthesize(&self, text: &str, options: &SynthesisOptions) -> Result<Vec<u8>> {
        ensure_text(text)?;

        let pieces = split_text(text, self.max_request_bytes, byte_len);
        debug!("Synthesizing {} pieces", pieces.len());

        let mut audio = Vec::new();
        for piece in &pieces {
            audio.extend(self.synthesize_piece(piece, options).await?);
        }
        Ok(audio)
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SynthesizeRequest<'a> {
    input: TextInput<'a>,
    voice: VoiceSelection<'a>,
    audio_config: AudioConfig,
}

impl<'a> SynthesizeRequest<'a> {
    fn new(text: &'a str, options: &'a SynthesisOptions) -> Self {
        Self {
            input: TextInput { text },
            voice: VoiceSelection {
                language_code: &options.language,
                name: options.voice_name.as_deref(),
                ssml_gender: options.gender.as_deref(),
            },
            audio_config: AudioConfig {
                audio_encoding: "MP3",
                speaking_rate: options.speaking_rate,
            },
        }
    }
}

#[derive(Debug, Serialize)]
struct TextInput<'a> {
    text: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct VoiceSelection<'a> {
    language_code: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    name: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    ssml_gender: Option<&'a str>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct AudioConfig {
    audio_encoding: &'static str,
    speaking_rate: f32,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SynthesizeResponse {
    audio_content: String,
}

#[derive(Debug, Deserialize)]
struct ErrorResponse {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: String,
}
