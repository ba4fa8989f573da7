//! Configuration module for gener8.
//!
//! Handles loading and managing application settings and prompt templates.

mod prompts;
mod settings;

pub use prompts::{Prompts, ScriptPrompts};
pub use settings::{
    EncyclopediaSettings, GeneralSettings, HttpSettings, PromptSettings, ScriptSettings,
    Settings, SpeechEngine, SpeechSettings, VideoSettings,
};
