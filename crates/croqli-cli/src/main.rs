//! Light CroqLI: a terminal assistant for chat, web search and shell
//! commands.
//!
//! Reads `GROQ_API_KEY` (and optionally `TAVILY_API_KEY`) from the
//! environment. Log verbosity follows `CROQLI_LOG` (default `warn`).

use clap::Parser;
use croqli::logging::LogCaptureLayer;
use croqli::prompts::{JsonFileStore, PromptEngine};
use croqli_cli::{App, Cli};
use tracing::Level;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let filter = EnvFilter::try_from_env("CROQLI_LOG").unwrap_or_else(|_| EnvFilter::new("warn"));
    let (capture, logs) = LogCaptureLayer::new(Level::WARN);
    tracing_subscriber::registry()
        .with(filter)
        .with(capture)
        .init();

    let mode = cli.mode;
    let settings = match cli.into_settings() {
        Ok(s) => s,
        Err(e) => {
            eprintln!("Error: {e}");
            std::process::exit(1);
        }
    };
    if settings.groq_api_key.is_none() {
        eprintln!("Warning: GROQ_API_KEY is not set; chat and CLI-assistant modes are unavailable.");
    }

    let store = JsonFileStore::new(&settings.prompts_file);
    let engine = match PromptEngine::open(store) {
        Ok(engine) => engine,
        Err(e) => {
            eprintln!("Error: {e}");
            std::process::exit(1);
        }
    };

    let mut app = App::new(settings, engine, logs);
    if let Err(e) = app.run(mode).await {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}
