//! CLI module for gener8.

pub mod commands;
mod output;
pub mod preflight;

pub use output::Output;

use crate::config::SpeechEngine;
use crate::media::TimedImage;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// gener8 - narrated trivia videos from encyclopedia topics
///
/// Looks up a topic, has a language model write short Taglish trivia
/// segments about it, narrates them, and renders the narration over images.
#[derive(Parser, Debug)]
#[command(name = "gener8")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Increase verbosity (-v for info, -vv for debug, -vvv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Path to configuration file
    #[arg(short, long, global = true)]
    pub config: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the full pipeline: fetch, write script, narrate, and optionally render
    Run {
        /// Topic to look up (prompted for when omitted)
        topic: Option<String>,

        /// Skip the confirmation before the language model is called
        #[arg(short, long)]
        yes: bool,

        /// Image file or directory to render over the narration (repeatable)
        #[arg(short, long, action = clap::ArgAction::Append)]
        images: Vec<PathBuf>,

        /// Speech engine (free or cloud)
        #[arg(short, long)]
        engine: Option<SpeechEngine>,

        /// Output directory
        #[arg(short, long)]
        output_dir: Option<String>,
    },

    /// Look up a topic and print the article
    Fetch {
        /// Topic to look up
        topic: String,

        /// Print the full article text instead of the summary
        #[arg(long)]
        full: bool,
    },

    /// Write trivia segments for a topic or a text file
    Script {
        /// Topic to look up
        #[arg(required_unless_present = "file")]
        topic: Option<String>,

        /// Use this text file as the excerpt instead of a lookup
        #[arg(short, long, conflicts_with = "topic")]
        file: Option<PathBuf>,

        /// Write the segments as JSON to this file
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Synthesize speech from text
    Speak {
        /// Text to speak
        #[arg(short, long, required_unless_present = "file")]
        text: Option<String>,

        /// Read the text from a file (.txt, or script JSON from `gener8 script`)
        #[arg(short, long, conflicts_with = "text")]
        file: Option<PathBuf>,

        /// Output audio file (defaults to the configured narration path)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Speech engine (free or cloud)
        #[arg(short, long)]
        engine: Option<SpeechEngine>,
    },

    /// Render images over an audio track
    Assemble {
        /// Narration audio file
        #[arg(short, long)]
        audio: PathBuf,

        /// Timed image as PATH:START:DURATION (repeatable)
        #[arg(short, long = "image", value_name = "PATH:START:DURATION")]
        images: Vec<TimedImage>,

        /// Output video file (defaults to the configured video path)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Check system requirements and configuration
    Doctor,

    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Show current configuration
    Show,

    /// Set a configuration value
    Set {
        /// Configuration key (e.g., "speech.engine")
        key: String,
        /// Configuration value
        value: String,
    },

    /// Open configuration file in editor
    Edit,

    /// Show configuration file path
    Path,

    /// Write the default configuration file
    Init {
        /// Overwrite an existing file
        #[arg(short, long)]
        force: bool,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_is_well_formed() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_run() {
        let cli = Cli::parse_from([
            "gener8", "run", "Philippine eagle", "--yes", "--engine", "cloud", "--images", "a.png",
            "--images", "b.png",
        ]);
        match cli.command {
            Commands::Run {
                topic,
                yes,
                images,
                engine,
                ..
            } => {
                assert_eq!(topic.as_deref(), Some("Philippine eagle"));
                assert!(yes);
                assert_eq!(images.len(), 2);
                assert_eq!(engine, Some(SpeechEngine::Cloud));
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_run_topic_after_image() {
        let cli = Cli::parse_from(["gener8", "run", "-i", "a.png", "Philippine eagle"]);
        let Commands::Run { topic, images, .. } = cli.command else {
            panic!("expected run");
        };
        assert_eq!(topic.as_deref(), Some("Philippine eagle"));
        assert_eq!(images, vec![PathBuf::from("a.png")]);
    }

    #[test]
    fn test_parse_assemble_images() {
        let cli = Cli::parse_from([
            "gener8", "assemble", "--audio", "output.mp3", "--image", "eagle.png:0:4.5", "-i",
            "C:/pics/map.png:4.5:3",
        ]);
        let Commands::Assemble { images, .. } = cli.command else {
            panic!("expected assemble");
        };
        assert_eq!(images[0], TimedImage::new("eagle.png", 0.0, 4.5));
        assert_eq!(images[1].image_path, PathBuf::from("C:/pics/map.png"));
    }

    #[test]
    fn test_speak_needs_text_or_file() {
        assert!(Cli::try_parse_from(["gener8", "speak"]).is_err());
        assert!(Cli::try_parse_from(["gener8", "speak", "--text", "Kumusta"]).is_ok());
    }
}
