//! Command-line arguments.

use std::path::PathBuf;

use clap::{Parser, ValueEnum};
use croqli::{DEFAULT_MAX_TOKENS, DEFAULT_MODEL, DEFAULT_TEMPERATURE, DEFAULT_TOP_P, GROQ_URL};
use croqli::prompts::DEFAULT_PROMPTS_FILE;
use croqli::search::TAVILY_URL;

use crate::config::Settings;

/// Which screen to open first.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum)]
pub enum Mode {
    /// Main menu.
    #[default]
    Menu,
    Chat,
    Search,
    /// Natural language to shell command.
    Assist,
}

/// Terminal assistant for chat, web search and shell commands.
#[derive(Parser, Debug)]
#[command(name = "croqli", version)]
pub struct Cli {
    /// Model to use for completions.
    #[arg(long, default_value = DEFAULT_MODEL)]
    pub model: String,

    /// Maximum tokens per response.
    #[arg(long, default_value_t = DEFAULT_MAX_TOKENS)]
    pub max_tokens: u32,

    /// Sampling temperature (0.0 to 1.0).
    #[arg(long, default_value_t = DEFAULT_TEMPERATURE)]
    pub temperature: f32,

    /// Nucleus sampling (0.0 to 1.0).
    #[arg(long, default_value_t = DEFAULT_TOP_P)]
    pub top_p: f32,

    /// File holding the saved system prompts.
    #[arg(long, env = "CROQLI_PROMPTS", default_value = DEFAULT_PROMPTS_FILE)]
    pub prompts_file: PathBuf,

    /// Screen to start in.
    #[arg(long, value_enum, default_value_t = Mode::Menu)]
    pub mode: Mode,

    #[arg(long, env = "GROQ_API_KEY", hide_env_values = true)]
    pub groq_api_key: Option<String>,

    /// Chat completions endpoint.
    #[arg(long, env = "GROQ_API_URL", default_value = GROQ_URL)]
    pub groq_url: String,

    #[arg(long, env = "TAVILY_API_KEY", hide_env_values = true)]
    pub tavily_api_key: Option<String>,

    /// Web search API base URL.
    #[arg(long, env = "TAVILY_API_URL", default_value = TAVILY_URL)]
    pub tavily_url: String,
}

impl Cli {
    /// Validate the flags into session [`Settings`].
    pub fn into_settings(self) -> Result<Settings, String> {
        let mut settings = Settings {
            groq_url: self.groq_url,
            groq_api_key: self.groq_api_key.filter(|k| !k.trim().is_empty()),
            tavily_url: self.tavily_url,
            tavily_api_key: self.tavily_api_key.filter(|k| !k.trim().is_empty()),
            prompts_file: self.prompts_file,
            ..Settings::default()
        };
        settings.set_model(&self.model)?;
        settings.set_max_tokens(self.max_tokens)?;
        settings.set_temperature(self.temperature)?;
        settings.set_top_p(self.top_p)?;
        Ok(settings)
    }
}
