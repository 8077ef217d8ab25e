//! Built-in prompts used to seed an empty collection.

use super::collection::PromptCollection;
use super::record::{PromptId, PromptRecord, Slot};

/// `(title, content)` of the built-in prompts, in seeding order.
pub const DEFAULT_PROMPTS: [(&str, &str); 5] = [
    (
        "General Assistant",
        "You are a helpful, knowledgeable assistant. Answer clearly and accurately, \
         and say so when you are not sure about something.",
    ),
    (
        "Shell Expert",
        "You are an expert in Unix shells and command-line tools. Prefer short, safe \
         commands, explain any non-obvious flags, and warn before anything destructive.",
    ),
    (
        "Code Reviewer",
        "You are a meticulous code reviewer. Point out bugs, unclear naming, and missing \
         error handling. Suggest concrete fixes with small code snippets.",
    ),
    (
        "Concise",
        "Answer in as few words as possible. No preamble, no closing remarks. Use lists \
         only when they are shorter than prose.",
    ),
    (
        "Research Helper",
        "You help with research. Summarise what is known, separate facts from opinion, \
         and list the sources or search terms worth following up.",
    ),
];

/// The bootstrap collection: the first built-in prompt pinned and active,
/// the rest listed in seeding order.
pub fn default_collection() -> PromptCollection {
    let mut collection = PromptCollection::default();
    for (i, (title, content)) in DEFAULT_PROMPTS.iter().enumerate() {
        let slot = match i {
            0 => Slot::Pinned(0),
            n => Slot::Listed(n - 1),
        };
        let mut record = PromptRecord::new(PromptId::generate(), *title, *content, slot);
        if i == 0 {
            record.is_active = true;
            collection.active_prompt_id = Some(record.id.clone());
        }
        collection.prompts.insert(record.id.clone(), record);
    }
    collection
}
