//! Session settings with defaults, built from CLI flags and environment.
//!
//! [`Settings`] holds everything a session needs: generation parameters,
//! endpoints and keys, and the prompts file location. Setters validate
//! against the known-model table so the settings menu cannot put the session
//! into a state the provider would reject.

use std::path::PathBuf;

use croqli::api::models::{max_tokens_for, model_info};
use croqli::prompts::DEFAULT_PROMPTS_FILE;
use croqli::search::TAVILY_URL;
use croqli::{GROQ_URL, GenerationParams};

/// Configuration for one assistant session.
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    /// Model, max tokens, temperature and top-p for every request.
    pub generation: GenerationParams,
    /// Chat completions endpoint. Default: Groq.
    pub groq_url: String,
    pub groq_api_key: Option<String>,
    /// Tavily base URL. Default: `https://api.tavily.com`.
    pub tavily_url: String,
    pub tavily_api_key: Option<String>,
    /// Where system prompts are stored. Default: `system_prompts.json`.
    pub prompts_file: PathBuf,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            generation: GenerationParams::default(),
            groq_url: GROQ_URL.to_string(),
            groq_api_key: None,
            tavily_url: TAVILY_URL.to_string(),
            tavily_api_key: None,
            prompts_file: PathBuf::from(DEFAULT_PROMPTS_FILE),
        }
    }
}

impl Settings {
    /// Switch model. Max tokens are lowered to the new model's limit if needed.
    pub fn set_model(&mut self, name: &str) -> Result<(), String> {
        let info = model_info(name).ok_or_else(|| format!("unknown model '{name}'"))?;
        self.generation.model = info.name.to_string();
        self.generation.max_tokens = self.generation.max_tokens.min(info.max_tokens);
        Ok(())
    }

    pub fn set_max_tokens(&mut self, max_tokens: u32) -> Result<(), String> {
        let limit = self.max_tokens_limit();
        if max_tokens == 0 || max_tokens > limit {
            return Err(format!(
                "max tokens must be between 1 and {limit} for {}",
                self.generation.model
            ));
        }
        self.generation.max_tokens = max_tokens;
        Ok(())
    }

    pub fn set_temperature(&mut self, temperature: f32) -> Result<(), String> {
        self.generation.temperature = unit_interval("temperature", temperature)?;
        Ok(())
    }

    pub fn set_top_p(&mut self, top_p: f32) -> Result<(), String> {
        self.generation.top_p = unit_interval("top-p", top_p)?;
        Ok(())
    }

    pub fn max_tokens_limit(&self) -> u32 {
        max_tokens_for(&self.generation.model)
    }

    /// One line per API key saying whether it is configured.
    pub fn key_status(&self) -> Vec<String> {
        let status = |key: &Option<String>| {
            if key.as_deref().is_some_and(|k| !k.trim().is_empty()) {
                "set"
            } else {
                "not set"
            }
        };
        vec![
            format!("GROQ_API_KEY: {}", status(&self.groq_api_key)),
            format!("TAVILY_API_KEY: {}", status(&self.tavily_api_key)),
        ]
    }

    /// Human-readable summary for the settings menu.
    pub fn summary(&self) -> String {
        let g = &self.generation;
        format!(
            "Model: {}\nMax tokens: {} (limit {})\nTemperature: {:.2}\nTop-p: {:.2}\nPrompts file: {}",
            g.model,
            g.max_tokens,
            self.max_tokens_limit(),
            g.temperature,
            g.top_p,
            self.prompts_file.display()
        )
    }
}

fn unit_interval(name: &str, value: f32) -> Result<f32, String> {
    if (0.0..=1.0).contains(&value) {
        Ok(value)
    } else {
        Err(format!("{name} must be between 0.0 and 1.0, got {value}"))
    }
}
