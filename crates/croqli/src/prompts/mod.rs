//! System prompt storage and ordering.
//!
//! Prompts live in two ordered groups: up to [`PIN_QUOTA`] pinned prompts,
//! followed by every other prompt in a user-controlled list order. At most
//! one prompt is active; its content becomes the system message for chat.

pub mod collection;
pub mod defaults;
pub mod engine;
pub mod error;
pub mod record;
pub mod store;

pub use collection::PromptCollection;
pub use engine::{Direction, PinChange, PromptEngine, PromptEntry};
pub use error::{PromptError, StoreError};
pub use record::{PIN_QUOTA, PromptId, PromptRecord, Slot};
pub use store::{
    DEFAULT_PROMPTS_FILE, JsonFileStore, MemoryStore, PromptStore, parse_prompts_json,
    parse_prompts_slice,
};
