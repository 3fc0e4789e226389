//! Loopsmith CLI — the main entry point.
//!
//! Commands:
//! - `chat`   — Interactive chat or single-message mode
//! - `tools`  — List registered tools
//! - `skills` — List loaded skills

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(
    name = "loopsmith",
    about = "Loopsmith — LLM Agent Orchestration Runtime",
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
    /// Chat with the agent
    Chat {
        /// Send a single message instead of entering interactive mode
        #[arg(short, long)]
        message: Option<String>,

        /// Disable response streaming
        #[arg(long)]
        no_stream: bool,
    },

    /// List registered tools
    Tools,

    /// List loaded skills
    Skills,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize tracing
    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(filter)),
        )
        .with_target(false)
        .init();

    match cli.command {
        Commands::Chat { message, no_stream } => commands::chat::run(message, no_stream).await?,
        Commands::Tools => commands::tools::run().await?,
        Commands::Skills => commands::skills::run().await?,
    }

    Ok(())
}
