//! Casewise CLI entry point.
//!
//! Commands:
//! - `onboard`: Write a default config and create storage directories
//! - `chat`: Talk to the assistant, one message or interactively
//! - `knowledge`: List or add learned rules
//! - `transcript`: Show a stored conversation, operator notes included

use clap::{Parser, Subcommand};
use std::path::PathBuf;

mod commands;

#[derive(Parser)]
#[command(
    name = "casewise",
    about = "Casewise — intake and triage assistant for social security law offices",
    version,
    author
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize configuration and storage
    Onboard,

    /// Chat with the assistant as a client would
    Chat {
        /// Send a single message instead of entering interactive mode
        #[arg(short, long)]
        message: Option<String>,

        /// Continue an existing conversation
        #[arg(short, long)]
        conversation: Option<String>,

        /// Treat the client as returning
        #[arg(long)]
        returning: bool,

        /// The client's name, if already known
        #[arg(long)]
        name: Option<String>,

        /// Attach a file (image, PDF, audio) to the first message
        #[arg(long)]
        media: Option<PathBuf>,

        /// Use this API key ahead of any configured one
        #[arg(long, env = "CASEWISE_API_KEY", hide_env_values = true)]
        api_key: Option<String>,
    },

    /// Inspect or extend learned knowledge
    Knowledge {
        #[command(subcommand)]
        action: commands::knowledge::KnowledgeAction,
    },

    /// Inspect stored conversations
    Transcript {
        #[command(subcommand)]
        action: commands::transcript::TranscriptAction,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Initialize tracing
    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(filter)),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Onboard => commands::onboard::run().await?,
        Commands::Chat {
            message,
            conversation,
            returning,
            name,
            media,
            api_key,
        } => {
            commands::chat::run(commands::chat::ChatArgs {
                message,
                conversation,
                returning,
                name,
                media,
                api_key,
            })
            .await?
        }
        Commands::Knowledge { action } => commands::knowledge::run(action).await?,
        Commands::Transcript { action } => commands::transcript::run(action).await?,
    }

    Ok(())
}
