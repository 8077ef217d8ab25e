//! Support for the chat client: model limits and retry with backoff.
//!
//! - [`models`]: the known-model table with per-model `max_tokens` limits.
//! - [`retry`]: transient error detection (429, 5xx, network failures) and an
//!   async retry loop with exponential backoff. 4xx errors are never retried.

pub mod models;
pub mod retry;

pub use models::{KNOWN_MODELS, ModelInfo, max_tokens_for, model_info};
pub use retry::RetryConfig;
