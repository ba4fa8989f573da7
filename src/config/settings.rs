//! Configuration settings for gener8.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Root configuration structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
#[derive(Default)]
pub struct Settings {
    pub general: GeneralSettings,
    pub http: HttpSettings,
    pub encyclopedia: EncyclopediaSettings,
    pub script: ScriptSettings,
    pub speech: SpeechSettings,
    pub video: VideoSettings,
    pub prompts: PromptSettings,
}

/// General application settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralSettings {
    /// Directory where narration, scripts and videos are written.
    pub output_dir: String,
}

impl Default for GeneralSettings {
    fn default() -> Self {
        Self {
            output_dir: "./gener8-output".to_string(),
        }
    }
}

/// Shared HTTP client settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpSettings {
    /// Request timeout in seconds.
    pub timeout_seconds: u64,
    /// User-Agent sent to the encyclopedia and TTS services.
    pub user_agent: String,
}

impl Default for HttpSettings {
    fn default() -> Self {
        Self {
            timeout_seconds: 60,
            user_agent: format!("gener8/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

/// Encyclopedia (Wikipedia) settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EncyclopediaSettings {
    /// Language edition (en, tl, de, ...).
    pub language: String,
    /// API endpoint override. `{lang}` is replaced with the language code.
    pub api_url: String,
    /// Number of search candidates to request.
    pub search_limit: u32,
}

impl Default for EncyclopediaSettings {
    fn default() -> Self {
        Self {
            language: "en".to_string(),
            api_url: "https://{lang}.wikipedia.org/w/api.php".to_string(),
            search_limit: 5,
        }
    }
}

impl EncyclopediaSettings {
    /// API endpoint with the language substituted.
    pub fn endpoint(&self) -> String {
        self.api_url.replace("{lang}", &self.language)
    }
}

/// Script generation settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScriptSettings {
    /// Chat model used to write the segments.
    pub model: String,
    /// Number of characters of article text sent to the model.
    pub excerpt_chars: usize,
    /// Sampling temperature.
    pub temperature: f32,
    /// Corrective retries after an unparseable response.
    pub max_retries: u32,
}

impl Default for ScriptSettings {
    fn default() -> Self {
        Self {
            model: "gpt-4o-mini".to_string(),
            excerpt_chars: 2000,
            temperature: 0.8,
            max_retries: 1,
        }
    }
}

/// Speech synthesis engine.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum SpeechEngine {
    /// Free Google Translate voice, language code only.
    #[default]
    Free,
    /// Google Cloud Text-to-Speech with a named neural voice.
    Cloud,
}

impl std::str::FromStr for SpeechEngine {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "free" | "gtts" | "translate" => Ok(SpeechEngine::Free),
            "cloud" | "google" => Ok(SpeechEngine::Cloud),
            _ => Err(format!("Unknown speech engine: {}", s)),
        }
    }
}

impl std::fmt::Display for SpeechEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SpeechEngine::Free => write!(f, "free"),
            SpeechEngine::Cloud => write!(f, "cloud"),
        }
    }
}

/// Speech synthesis settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SpeechSettings {
    /// Engine used for narration.
    pub engine: SpeechEngine,
    /// Language code for the free engine.
    pub free_language: String,
    /// Language code for the cloud engine.
    pub cloud_language: String,
    /// Cloud voice name.
    pub voice_name: String,
    /// Cloud voice gender (MALE, FEMALE, NEUTRAL).
    pub gender: String,
    /// Cloud speaking rate (1.0 is normal).
    pub speaking_rate: f32,
    /// Cloud TTS endpoint.
    pub cloud_endpoint: String,
    /// Maximum input bytes per cloud request.
    pub max_request_bytes: usize,
    /// Narration file name inside the output directory.
    pub output_file: String,
}

impl Default for SpeechSettings {
    fn default() -> Self {
        Self {
            engine: SpeechEngine::Free,
            free_language: "tl".to_string(),
            cloud_language: "fil-PH".to_string(),
            voice_name: "fil-ph-Neural2-D".to_string(),
            gender: "MALE".to_string(),
            speaking_rate: 1.0,
            cloud_endpoint: "https://texttospeech.googleapis.com/v1/text:synthesize".to_string(),
            max_request_bytes: 5000,
            output_file: "output.mp3".to_string(),
        }
    }
}

/// Video rendering settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct VideoSettings {
    /// Canvas width in pixels.
    pub width: u32,
    /// Canvas height in pixels.
    pub height: u32,
    /// Height every image is scaled to.
    pub image_height: u32,
    /// Output frame rate.
    pub fps: u32,
    pub video_codec: String,
    pub audio_codec: String,
    /// Video file name inside the output directory.
    pub output_file: String,
    /// Maximum concurrent image probes.
    pub max_concurrent_probes: usize,
}

impl Default for VideoSettings {
    fn default() -> Self {
        Self {
            width: 1280,
            height: 720,
            image_height: 720,
            fps: 24,
            video_codec: "libx264".to_string(),
            audio_codec: "aac".to_string(),
            output_file: "output_video.mp4".to_string(),
            max_concurrent_probes: 4,
        }
    }
}

/// Prompt customization settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
#[derive(Default)]
pub struct PromptSettings {
    /// Directory for custom prompts (overrides defaults).
    pub custom_dir: Option<String>,
    /// Custom variables available in all prompts as {{variable_name}}.
    pub variables: std::collections::HashMap<String, String>,
}

impl Settings {
    /// Load settings from the default configuration file.
    pub fn load() -> crate::error::Result<Self> {
        Self::load_from(None)
    }

    /// Load settings from a specific path, or default location if None.
    pub fn load_from(path: Option<&PathBuf>) -> crate::error::Result<Self> {
        let config_path = match path {
            Some(p) => p.clone(),
            None => Self::default_config_path(),
        };

        if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)?;
            let settings: Settings = toml::from_str(&content)?;
            Ok(settings)
        } else {
            Ok(Settings::default())
        }
    }

    /// Save settings to a specific path.
    pub fn save_to(&self, path: &PathBuf) -> crate::error::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)
            .map_err(|e| crate::error::Gener8Error::Config(e.to_string()))?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Get the default configuration file path.
    pub fn default_config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("gener8")
            .join("config.toml")
    }

    /// Expand shell variables in paths (e.g., ~).
    pub fn expand_path(path: &str) -> PathBuf {
        PathBuf::from(shellexpand::tilde(path).to_string())
    }

    /// Get the expanded output directory path.
    pub fn output_dir(&self) -> PathBuf {
        Self::expand_path(&self.general.output_dir)
    }

    /// Default narration path.
    pub fn narration_path(&self) -> PathBuf {
        self.output_dir().join(&self.speech.output_file)
    }

    /// Default video path.
    pub fn video_path(&self) -> PathBuf {
        self.output_dir().join(&self.video.output_file)
    }

    /// Set a dotted key such as `speech.engine` from its string form.
    ///
    /// The new value takes the type of the current one; keys that are not
    /// part of the config are rejected.
    pub fn set_value(&mut self, key: &str, value: &str) -> crate::error::Result<()> {
        use crate::error::Gener8Error;

        let (section, field) = key
            .split_once('.')
            .ok_or_else(|| Gener8Error::Config(format!("Expected section.key, got '{}'", key)))?;

        let mut root = toml::Value::try_from(&*self)
            .map_err(|e| Gener8Error::Config(e.to_string()))?;
        let table = root
            .get_mut(section)
            .and_then(|v| v.as_table_mut())
            .ok_or_else(|| Gener8Error::Config(format!("Unknown config section '{}'", section)))?;

        let parsed = match table.get(field) {
            Some(toml::Value::Integer(_)) => value
                .parse::<i64>()
                .map(toml::Value::Integer)
                .map_err(|_| Gener8Error::Config(format!("{} expects an integer", key)))?,
            Some(toml::Value::Float(_)) => value
                .parse::<f64>()
                .map(toml::Value::Float)
                .map_err(|_| Gener8Error::Config(format!("{} expects a number", key)))?,
            Some(toml::Value::Boolean(_)) => value
                .parse::<bool>()
                .map(toml::Value::Boolean)
                .map_err(|_| Gener8Error::Config(format!("{} expects true or false", key)))?,
            Some(toml::Value::String(_)) => toml::Value::String(value.to_string()),
            Some(_) => {
                return Err(Gener8Error::Config(format!(
                    "{} cannot be set from the command line",
                    key
                )))
            }
            // Optional keys are omitted when unset.
            None if section == "prompts" && field == "custom_dir" => {
                toml::Value::String(value.to_string())
            }
            None => return Err(Gener8Error::Config(format!("Unknown config key '{}'", key))),
        };
        table.insert(field.to_string(), parsed);

        *self = root.try_into()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_narration_voice() {
        let settings = Settings::default();
        assert_eq!(settings.speech.engine, SpeechEngine::Free);
        assert_eq!(settings.speech.free_language, "tl");
        assert_eq!(settings.speech.cloud_language, "fil-PH");
        assert_eq!(settings.script.excerpt_chars, 2000);
        assert_eq!(settings.video.fps, 24);
        assert_eq!(settings.video.image_height, 720);
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let settings: Settings = toml::from_str(
            r#"
            [speech]
            engine = "cloud"

            [encyclopedia]
            language = "tl"
            "#,
        )
        .unwrap();

        assert_eq!(settings.speech.engine, SpeechEngine::Cloud);
        assert_eq!(settings.speech.voice_name, "fil-ph-Neural2-D");
        assert_eq!(settings.encyclopedia.endpoint(), "https://tl.wikipedia.org/w/api.php");
        assert_eq!(settings.script.model, "gpt-4o-mini");
    }

    #[test]
    fn test_old_temp_dir_key_is_ignored() {
        let settings: Settings = toml::from_str(
            r#"
            [general]
            output_dir = "~/videos"
            temp_dir = "/tmp/gener8"
            "#,
        )
        .unwrap();
        assert_eq!(settings.general.output_dir, "~/videos");

        let written = toml::to_string_pretty(&settings).unwrap();
        assert!(!written.contains("temp_dir"));

        let mut settings = Settings::default();
        assert!(settings.set_value("general.temp_dir", "/tmp/x").is_err());
    }

    #[test]
    fn test_engine_from_str() {
        assert_eq!("gtts".parse::<SpeechEngine>().unwrap(), SpeechEngine::Free);
        assert_eq!("Cloud".parse::<SpeechEngine>().unwrap(), SpeechEngine::Cloud);
        assert!("piper".parse::<SpeechEngine>().is_err());
    }

    #[test]
    fn test_save_and_load_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        let mut settings = Settings::default();
        settings.video.width = 720;
        settings.video.height = 1280;
        settings.save_to(&path).unwrap();

        let loaded = Settings::load_from(Some(&path)).unwrap();
        assert_eq!(loaded.video.width, 720);
        assert_eq!(loaded.video.height, 1280);
    }

    #[test]
    fn test_set_value_keeps_types() {
        let mut settings = Settings::default();
        settings.set_value("speech.engine", "cloud").unwrap();
        settings.set_value("video.fps", "30").unwrap();
        settings.set_value("script.temperature", "0.5").unwrap();
        settings.set_value("prompts.custom_dir", "~/prompts").unwrap();

        assert_eq!(settings.speech.engine, SpeechEngine::Cloud);
        assert_eq!(settings.video.fps, 30);
        assert!((settings.script.temperature - 0.5).abs() < 1e-6);
        assert_eq!(settings.prompts.custom_dir.as_deref(), Some("~/prompts"));
    }

    #[test]
    fn test_set_value_rejects_bad_input() {
        let mut settings = Settings::default();
        assert!(settings.set_value("video.fps", "fast").is_err());
        assert!(settings.set_value("video.nope", "1").is_err());
        assert!(settings.set_value("nope.fps", "1").is_err());
        assert!(settings.set_value("fps", "1").is_err());
        assert!(settings.set_value("speech.engine", "piper").is_err());
        assert_eq!(settings.video.fps, 24);
    }
}
