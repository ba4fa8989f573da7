//! gener8 CLI entry point.

use anyhow::Result;
use clap::Parser;
use gener8::cli::{commands, Cli, Commands};
use gener8::config::Settings;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let log_level = match cli.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::registry()
        .with(EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| format!("gener8={}", log_level)),
        ))
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();

    // Load configuration
    let config_path = cli
        .config
        .as_deref()
        .map(Settings::expand_path)
        .unwrap_or_else(Settings::default_config_path);
    let settings = Settings::load_from(Some(&config_path))?;

    match cli.command {
        Commands::Run {
            topic,
            yes,
            images,
            engine,
            output_dir,
        } => {
            commands::run_pipeline(topic, yes, &images, engine, output_dir, settings).await?;
        }

        Commands::Fetch { topic, full } => {
            commands::run_fetch(&topic, full, settings).await?;
        }

        Commands::Script {
            topic,
            file,
            output,
        } => {
            commands::run_script(topic.as_deref(), file.as_deref(), output, settings).await?;
        }

        Commands::Speak {
            text,
            file,
            output,
            engine,
        } => {
            commands::run_speak(text.as_deref(), file.as_deref(), output, engine, settings).await?;
        }

        Commands::Assemble {
            audio,
            images,
            output,
        } => {
            commands::run_assemble(&audio, &images, output, settings).await?;
        }

        Commands::Doctor => {
            commands::run_doctor(&settings).await?;
        }

        Commands::Config { action } => {
            commands::run_config(&action, config_path, settings)?;
        }
    }

    Ok(())
}
