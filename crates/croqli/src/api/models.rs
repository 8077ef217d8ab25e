//! Known chat models and their output token limits.

/// A model the provider is known to serve.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ModelInfo {
    pub name: &'static str,
    /// Largest `max_tokens` the model accepts.
    pub max_tokens: u32,
}

pub const KNOWN_MODELS: [ModelInfo; 4] = [
    ModelInfo {
        name: "llama3-8b-8192",
        max_tokens: 8192,
    },
    ModelInfo {
        name: "llama3-70b-8192",
        max_tokens: 8192,
    },
    ModelInfo {
        name: "mixtral-8x7b-32768",
        max_tokens: 32768,
    },
    ModelInfo {
        name: "gemma-7b-it",
        max_tokens: 8192,
    },
];

/// Limit used for models missing from [`KNOWN_MODELS`].
pub const FALLBACK_MAX_TOKENS: u32 = 8192;

pub fn model_info(name: &str) -> Option<ModelInfo> {
    KNOWN_MODELS.iter().copied().find(|m| m.name == name)
}

/// Output token limit for `name`, falling back to [`FALLBACK_MAX_TOKENS`].
pub fn max_tokens_for(name: &str) -> u32 {
    model_info(name).map_or(FALLBACK_MAX_TOKENS, |m| m.max_tokens)
}
