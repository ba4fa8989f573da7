//! Trivia script generation.
//!
//! Sends an article excerpt to a chat model and turns the answer into
//! validated `{title, content}` segments. Unparseable answers get one
//! corrective follow-up before the stage gives up.

mod chat;
mod parse;

pub use chat::OpenAIChatModel;
pub use parse::parse_segments;

use crate::config::Prompts;
use crate::error::{Gener8Error, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{info, instrument, warn};

/// One short-form script unit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScriptSegment {
    pub title: String,
    pub content: String,
}

impl ScriptSegment {
    pub fn new(title: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            content: content.into(),
        }
    }

    /// Text read aloud for this segment.
    pub fn narration(&self) -> String {
        let title = self.title.trim_end();
        if title.ends_with(['.', '!', '?']) {
            format!("{} {}", title, self.content)
        } else {
            format!("{}. {}", title, self.content)
        }
    }
}

/// Narration for a whole script, one paragraph per segment.
pub fn narration_text(segments: &[ScriptSegment]) -> String {
    segments
        .iter()
        .map(ScriptSegment::narration)
        .collect::<Vec<_>>()
        .join("\n\n")
}

/// A message in a chat conversation.
#[derive(Debug, Clone, PartialEq)]
pub enum ChatMessage {
    System(String),
    User(String),
    Assistant(String),
}

/// Trait for chat-completion backends.
#[async_trait]
pub trait LanguageModel: Send + Sync {
    fn model_name(&self) -> &str;

    /// Return the assistant's reply to `messages`.
    async fn complete(&self, messages: &[ChatMessage]) -> Result<String>;
}

/// Turns article excerpts into trivia segments.
pub struct ScriptGenerator {
    model: Arc<dyn LanguageModel>,
    prompts: Prompts,
    max_retries: u32,
}

impl ScriptGenerator {
    pub fn new(model: Arc<dyn LanguageModel>, prompts: Prompts) -> Self {
        Self {
            model,
            prompts,
            max_retries: 1,
        }
    }

    /// Set the number of corrective retries after a parse failure.
    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    /// Generate segments for an excerpt. The caller truncates the excerpt.
    #[instrument(
        skip(self, excerpt),
        fields(model = self.model.model_name(), chars = excerpt.chars().count())
    )]
    pub async fn generate(&self, excerpt: &str) -> Result<Vec<ScriptSegment>> {
        if excerpt.trim().is_empty() {
            return Err(Gener8Error::InvalidInput("Article excerpt is empty".to_string()));
        }

        let system = self
            .prompts
            .render_with_custom(&self.prompts.script.system, &HashMap::new());

        let mut messages = vec![
            ChatMessage::System(system),
            ChatMessage::User(excerpt.to_string()),
        ];

        let mut attempt = 0;
        loop {
            let response = self.model.complete(&messages).await?;

            match parse_segments(&response) {
                Ok(segments) => {
                    info!("Generated {} segments", segments.len());
                    return Ok(segments);
                }
                Err(e) if attempt < self.max_retries => {
                    attempt += 1;
                    warn!(
                        "Unparseable script (attempt {}), asking for a correction: {}",
                        attempt, e
                    );

                    let mut vars = HashMap::new();
                    vars.insert("error".to_string(), e.to_string());
                    let correction = self
                        .prompts
                        .render_with_custom(&self.prompts.script.correction, &vars);

                    messages.push(ChatMessage::Assistant(response));
                    messages.push(ChatMessage::User(correction));
                }
                Err(e) => return Err(e),
            }
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::sync::Mutex;

    /// Replays canned responses and records every conversation it receives.
    pub(crate) struct ScriptedModel {
        responses: Mutex<Vec<String>>,
        pub calls: Mutex<Vec<Vec<ChatMessage>>>,
    }

    impl ScriptedModel {
        pub fn new(responses: &[&str]) -> Self {
            Self {
                responses: Mutex::new(responses.iter().rev().map(|s| s.to_string()).collect()),
                calls: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl LanguageModel for ScriptedModel {
        fn model_name(&self) -> &str {
            "scripted"
        }

        async fn complete(&self, messages: &[ChatMessage]) -> Result<String> {
            self.calls.lock().unwrap().push(messages.to_vec());
            self.responses
                .lock()
                .unwrap()
                .pop()
                .ok_or_else(|| Gener8Error::Model("no more responses".to_string()))
        }
    }

    const VALID: &str = r#"[{"title":"Did you know?","content":"Ang Philippine eagle ang pambansang ibon."}]"#;

    #[tokio::test]
    async fn test_generate_valid_response() {
        let model = Arc::new(ScriptedModel::new(&[VALID]));
        let generator = ScriptGenerator::new(model.clone(), Prompts::default());

        let segments = generator.generate("The Philippine eagle...").await.unwrap();
        assert!(segments
            .iter()
            .all(|s| !s.title.is_empty() && !s.content.is_empty()));

        let calls = model.calls.lock().unwrap();
        assert_eq!(calls.len(), 1);
        assert!(matches!(&calls[0][0], ChatMessage::System(s) if s.contains("Taglish")));
        assert_eq!(calls[0][1], ChatMessage::User("The Philippine eagle...".to_string()));
    }

    #[tokio::test]
    async fn test_corrective_retry() {
        let model = Arc::new(ScriptedModel::new(&["Here are some facts!", VALID]));
        let generator = ScriptGenerator::new(model.clone(), Prompts::default());

        let segments = generator.generate("excerpt").await.unwrap();
        assert_eq!(segments.len(), 1);

        let calls = model.calls.lock().unwrap();
        assert_eq!(calls.len(), 2);
        let retry = &calls[1];
        assert_eq!(retry.len(), 4);
        assert_eq!(retry[2], ChatMessage::Assistant("Here are some facts!".to_string()));
        assert!(matches!(&retry[3], ChatMessage::User(s) if s.contains("could not be parsed")));
    }

    #[tokio::test]
    async fn test_gives_up_after_retries() {
        let model = Arc::new(ScriptedModel::new(&["nope", "still nope"]));
        let generator = ScriptGenerator::new(model.clone(), Prompts::default());

        let err = generator.generate("excerpt").await.unwrap_err();
        assert!(matches!(err, Gener8Error::Parse(_)));
        assert_eq!(model.calls.lock().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_no_retry_when_disabled() {
        let model = Arc::new(ScriptedModel::new(&["nope", VALID]));
        let generator = ScriptGenerator::new(model.clone(), Prompts::default()).with_max_retries(0);

        assert!(generator.generate("excerpt").await.is_err());
        assert_eq!(model.calls.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_model_error_is_not_retried() {
        let model = Arc::new(ScriptedModel::new(&[]));
        let generator = ScriptGenerator::new(model, Prompts::default());

        assert!(matches!(
            generator.generate("excerpt").await,
            Err(Gener8Error::Model(_))
        ));
    }

    #[test]
    fn test_narration_text() {
        let segments = vec![
            ScriptSegment::new("Did you know?", "Malaki siya."),
            ScriptSegment::new("Haribon", "Hari ng ibon."),
        ];
        assert_eq!(
            narration_text(&segments),
            "Did you know? Malaki siya.\n\nHaribon. Hari ng ibon."
        );
    }
}
