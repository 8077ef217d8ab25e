//! The prompt record entity and its rank slot.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Maximum number of records that may be pinned at once.
pub const PIN_QUOTA: usize = 6;

/// Opaque, immutable identifier of a prompt record.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PromptId(String);

impl PromptId {
    /// Generate a fresh random identifier.
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<String> for PromptId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<&str> for PromptId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl fmt::Display for PromptId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Where a record sits: in the pinned rank space or the list rank space.
///
/// Holding the partition and the rank in one value keeps "`pin_order` is
/// present iff pinned" true by construction.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Slot {
    Pinned(usize),
    Listed(usize),
}

impl Slot {
    pub fn is_pinned(self) -> bool {
        matches!(self, Slot::Pinned(_))
    }

    pub fn rank(self) -> usize {
        match self {
            Slot::Pinned(r) | Slot::Listed(r) => r,
        }
    }

    /// Display-order key: every pinned slot sorts before every listed slot.
    pub fn sort_key(self) -> (u8, usize) {
        match self {
            Slot::Pinned(r) => (0, r),
            Slot::Listed(r) => (1, r),
        }
    }
}

/// A named system prompt.
///
/// Fields are read through accessors; only the engine in this crate mutates
/// records.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(into = "RecordRepr", from = "RecordRepr")]
pub struct PromptRecord {
    pub(crate) id: PromptId,
    pub(crate) title: String,
    pub(crate) content: String,
    pub(crate) is_active: bool,
    pub(crate) slot: Slot,
}

impl PromptRecord {
    /// Build an inactive record in the given slot.
    pub fn new(
        id: impl Into<PromptId>,
        title: impl Into<String>,
        content: impl Into<String>,
        slot: Slot,
    ) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            content: content.into(),
            is_active: false,
            slot,
        }
    }

    pub fn id(&self) -> &PromptId {
        &self.id
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn is_active(&self) -> bool {
        self.is_active
    }

    pub fn is_pinned(&self) -> bool {
        self.slot.is_pinned()
    }

    pub fn slot(&self) -> Slot {
        self.slot
    }

    pub fn pin_order(&self) -> Option<usize> {
        match self.slot {
            Slot::Pinned(r) => Some(r),
            Slot::Listed(_) => None,
        }
    }

    pub fn list_order(&self) -> Option<usize> {
        match self.slot {
            Slot::Listed(r) => Some(r),
            Slot::Pinned(_) => None,
        }
    }
}

/// Flat on-disk shape of a record.
#[derive(Clone, Debug, Serialize, Deserialize)]
struct RecordRepr {
    #[serde(default)]
    id: String,
    #[serde(default)]
    title: String,
    #[serde(default)]
    content: String,
    #[serde(default)]
    is_active: bool,
    #[serde(default)]
    pinned: bool,
    #[serde(default)]
    pin_order: Option<usize>,
    #[serde(default)]
    list_order: Option<usize>,
}

impl From<PromptRecord> for RecordRepr {
    fn from(r: PromptRecord) -> Self {
        Self {
            pinned: r.is_pinned(),
            pin_order: r.pin_order(),
            list_order: r.list_order(),
            id: r.id.0,
            title: r.title,
            content: r.content,
            is_active: r.is_active,
        }
    }
}

impl From<RecordRepr> for PromptRecord {
    // Missing ranks sort last; the collection renumbers them on load.
    fn from(r: RecordRepr) -> Self {
        let slot = if r.pinned {
            Slot::Pinned(r.pin_order.unwrap_or(usize::MAX))
        } else {
            Slot::Listed(r.list_order.unwrap_or(usize::MAX))
        };
        Self {
            id: PromptId(r.id),
            title: r.title,
            content: r.content,
            is_active: r.is_active,
            slot,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pinned_record_serializes_flat_fields() {
        let rec = PromptRecord::new("a", "Alpha", "be brief", Slot::Pinned(2));
        let json = serde_json::to_value(&rec).unwrap();
        assert_eq!(json["id"], "a");
        assert_eq!(json["pinned"], true);
        assert_eq!(json["pin_order"], 2);
        assert!(json["list_order"].is_null());
    }

    #[test]
    fn listed_record_omits_pin_order() {
        let rec = PromptRecord::new("b", "Beta", "x", Slot::Listed(0));
        let json = serde_json::to_value(&rec).unwrap();
        assert_eq!(json["pinned"], false);
        assert!(json["pin_order"].is_null());
        assert_eq!(json["list_order"], 0);
    }

    #[test]
    fn pinned_flag_wins_over_stray_list_order() {
        let rec: PromptRecord = serde_json::from_str(
            r#"{"id":"c","title":"C","content":"c","pinned":true,"pin_order":null,"list_order":4}"#,
        )
        .unwrap();
        assert!(rec.is_pinned());
        assert_eq!(rec.pin_order(), Some(usize::MAX));
        assert_eq!(rec.list_order(), None);
    }

    #[test]
    fn slot_sort_key_puts_pins_first() {
        assert!(Slot::Pinned(5).sort_key() < Slot::Listed(0).sort_key());
        assert!(Slot::Listed(0).sort_key() < Slot::Listed(1).sort_key());
    }

    #[test]
    fn generated_ids_are_unique() {
        assert_ne!(PromptId::generate(), PromptId::generate());
    }
}
