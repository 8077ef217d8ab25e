//! Loading and saving the prompt collection.
//!
//! The engine only sees the [`PromptStore`] trait. [`JsonFileStore`] is the
//! production implementation; [`MemoryStore`] keeps everything in memory and
//! counts saves, which is what tests and throwaway sessions want.
//!
//! The file store understands the older prompt-file format written by
//! earlier releases (records with `name` / `prompt_text` / `priority`) and
//! translates it on load; the next save writes the current format.

use serde_json::Value;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use super::collection::PromptCollection;
use super::error::StoreError;
use super::record::{PromptId, PromptRecord, Slot};

/// Default file name of the prompts file, relative to the working directory.
pub const DEFAULT_PROMPTS_FILE: &str = "system_prompts.json";

/// Persistence boundary used by the engine.
pub trait PromptStore {
    /// Load the full collection. A missing store yields an empty collection.
    ///
    /// [`JsonFileStore`] also yields an empty collection for a corrupt file
    /// (after moving it aside), but returns [`StoreError::Read`] when the
    /// file exists and cannot be read, so it is never overwritten unseen.
    fn load(&self) -> Result<PromptCollection, StoreError>;

    /// Write the full collection as one unit.
    fn save(&mut self, collection: &PromptCollection) -> Result<(), StoreError>;
}

// ── JsonFileStore ──────────────────────────────────────────────────

/// Prompt store backed by a single pretty-printed JSON file.
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Move an unparseable file aside so the next save cannot clobber it.
    fn quarantine(&self) {
        let backup = self.path.with_extension("json.corrupt");
        match std::fs::rename(&self.path, &backup) {
            Ok(()) => warn!("Moved corrupt prompts file to {}", backup.display()),
            Err(e) => warn!(
                "Could not move corrupt prompts file {}: {e}",
                self.path.display()
            ),
        }
    }
}

impl PromptStore for JsonFileStore {
    fn load(&self) -> Result<PromptCollection, StoreError> {
        // Invalid UTF-8 is treated as corruption below, not as a read error.
        let bytes = match std::fs::read(&self.path) {
            Ok(b) => b,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!("No prompts file at {}", self.path.display());
                return Ok(PromptCollection::default());
            }
            Err(source) => {
                return Err(StoreError::Read {
                    path: self.path.display().to_string(),
                    source,
                });
            }
        };

        match parse_prompts_slice(&bytes) {
            Ok(collection) => {
                debug!(
                    "Loaded {} prompts from {}",
                    collection.len(),
                    self.path.display()
                );
                Ok(collection)
            }
            Err(e) => {
                warn!("Ignoring corrupt prompts file {}: {e}", self.path.display());
                self.quarantine();
                Ok(PromptCollection::default())
            }
        }
    }

    /// Atomic write: serialize to a temp file, then rename into place.
    fn save(&mut self, collection: &PromptCollection) -> Result<(), StoreError> {
        let path_str = self.path.display().to_string();
        if let Some(dir) = self.path.parent().filter(|d| !d.as_os_str().is_empty()) {
            std::fs::create_dir_all(dir).map_err(|source| StoreError::Write {
                path: path_str.clone(),
                source,
            })?;
        }

        let json = serde_json::to_string_pretty(collection)?;
        let tmp_path = self.path.with_extension("json.tmp");
        std::fs::write(&tmp_path, json).map_err(|source| StoreError::Write {
            path: tmp_path.display().to_string(),
            source,
        })?;
        std::fs::rename(&tmp_path, &self.path).map_err(|source| StoreError::Write {
            path: path_str,
            source,
        })?;

        debug!("Saved {} prompts to {}", collection.len(), self.path.display());
        Ok(())
    }
}

// ── MemoryStore ────────────────────────────────────────────────────

/// In-memory store that records how often it was saved.
#[derive(Debug, Default)]
pub struct MemoryStore {
    saved: Option<PromptCollection>,
    save_count: usize,
    fail_saves: bool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// A store whose `load` returns `collection`.
    pub fn with_collection(collection: PromptCollection) -> Self {
        Self {
            saved: Some(collection),
            ..Default::default()
        }
    }

    /// Make subsequent saves fail (or succeed again).
    pub fn set_fail_saves(&mut self, fail: bool) {
        self.fail_saves = fail;
    }

    /// Number of successful saves.
    pub fn save_count(&self) -> usize {
        self.save_count
    }

    /// The last successfully saved collection.
    pub fn saved(&self) -> Option<&PromptCollection> {
        self.saved.as_ref()
    }
}

impl PromptStore for MemoryStore {
    fn load(&self) -> Result<PromptCollection, StoreError> {
        Ok(self.saved.clone().unwrap_or_default())
    }

    fn save(&mut self, collection: &PromptCollection) -> Result<(), StoreError> {
        if self.fail_saves {
            return Err(StoreError::Other("memory store is set to fail".into()));
        }
        self.saved = Some(collection.clone());
        self.save_count += 1;
        Ok(())
    }
}

// ── Format detection ───────────────────────────────────────────────

/// Parse prompts-file text in either the current or the legacy format.
pub fn parse_prompts_json(text: &str) -> Result<PromptCollection, serde_json::Error> {
    parse_prompts_slice(text.as_bytes())
}

/// [`parse_prompts_json`] over raw file bytes.
pub fn parse_prompts_slice(bytes: &[u8]) -> Result<PromptCollection, serde_json::Error> {
    let value: Value = serde_json::from_slice(bytes)?;
    if is_legacy(&value) {
        info!("Translating legacy prompts file format");
        Ok(translate_legacy(&value))
    } else {
        serde_json::from_value(value)
    }
}

/// Legacy files keep `prompts` as a list (possibly empty) or carry a
/// `priority` on their records. The current format is always a map.
fn is_legacy(value: &Value) -> bool {
    matches!(value.get("prompts"), Some(Value::Array(_)))
        || legacy_entries(value)
            .iter()
            .any(|(_, entry)| entry.get("priority").is_some())
}

/// `(map key, record)` pairs from a `prompts` list or map, in file order.
fn legacy_entries(value: &Value) -> Vec<(Option<&str>, &Value)> {
    match value.get("prompts") {
        Some(Value::Array(items)) => items.iter().map(|v| (None, v)).collect(),
        Some(Value::Object(map)) => map.iter().map(|(k, v)| (Some(k.as_str()), v)).collect(),
        _ => Vec::new(),
    }
}

fn first_str<'a>(entry: &'a Value, keys: &[&str]) -> &'a str {
    keys.iter()
        .find_map(|k| entry.get(*k).and_then(Value::as_str))
        .unwrap_or("")
}

fn is_priority(entry: &Value) -> bool {
    match entry.get("priority") {
        Some(Value::Number(n)) => n.as_u64().is_some_and(|p| p >= 1),
        Some(Value::Bool(b)) => *b,
        _ => false,
    }
}

/// Translate legacy records, preserving their relative order.
///
/// Priority-1 records become pinned in order of appearance, the rest become
/// listed in order of appearance. Quota overflow and active-flag conflicts
/// are resolved by [`PromptCollection::normalize`].
fn translate_legacy(value: &Value) -> PromptCollection {
    let mut prompts = BTreeMap::new();
    let mut next_pin = 0;
    let mut next_list = 0;

    for (key, entry) in legacy_entries(value) {
        let mut id = entry
            .get("id")
            .and_then(Value::as_str)
            .or(key)
            .filter(|s| !s.is_empty())
            .map(PromptId::from)
            .unwrap_or_else(PromptId::generate);
        if prompts.contains_key(&id) {
            id = PromptId::generate();
        }

        let slot = if is_priority(entry) {
            next_pin += 1;
            Slot::Pinned(next_pin - 1)
        } else {
            next_list += 1;
            Slot::Listed(next_list - 1)
        };

        let mut record = PromptRecord::new(
            id.clone(),
            first_str(entry, &["name", "title"]),
            first_str(entry, &["prompt_text", "prompt", "content"]),
            slot,
        );
        record.is_active = entry
            .get("is_active")
            .and_then(Value::as_bool)
            .unwrap_or(false);
        prompts.insert(id, record);
    }

    let mut collection = PromptCollection {
        prompts,
        active_prompt_id: value
            .get("active_prompt_id")
            .and_then(Value::as_str)
            .map(PromptId::from),
    };
    collection.normalize();
    collection
}
