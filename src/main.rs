use anyhow::Result;
use clap::Parser;
use console::style;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use tubescribe::{Cli, Commands, Config, TranscriptPipeline};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_filter = if cli.verbose {
        "tubescribe=debug"
    } else {
        "tubescribe=info"
    };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let mut config = Config::load()?;

    match cli.command {
        Commands::Transcribe {
            input,
            audio_fallback,
            output_root,
        } => {
            if let Some(root) = output_root {
                config.app.output_root = root;
            }

            let pipeline = TranscriptPipeline::new(config)?;
            let outcome = pipeline.run(&input, audio_fallback).await?;

            println!(
                "{} Transcript saved to: {}",
                style("✓").green(),
                outcome.transcript_path.display()
            );
            if let Some(metadata_path) = outcome.metadata_path {
                println!("  Metadata: {}", metadata_path.display());
            }
        }
        Commands::Audio { input, keep_audio } => {
            let keep = keep_audio || config.app.keep_audio;
            let pipeline = TranscriptPipeline::new(config)?;
            let outcome = pipeline.run_speech(&input, keep).await?;

            println!(
                "{} Speech transcript saved to: {}",
                style("✓").green(),
                outcome.transcript_path.display()
            );
        }
        Commands::Config { show } => {
            if show {
                config.display();
            } else {
                config.save()?;
                println!("Configuration written; edit it and rerun with --show to check.");
            }
        }
    }

    Ok(())
}
