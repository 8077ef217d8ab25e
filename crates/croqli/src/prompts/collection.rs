//! The persisted unit: every prompt record plus the active id.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};

use super::record::{PIN_QUOTA, PromptId, PromptRecord, Slot};

/// Title given to loaded records whose title is blank.
pub const UNTITLED: &str = "Untitled";

/// All prompt records keyed by id, plus the active record's id.
///
/// This is both the engine's state and the shape written to disk:
///
/// ```text
/// { "prompts": { "<id>": { ...record... } }, "active_prompt_id": "<id>" | null }
/// ```
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PromptCollection {
    #[serde(default)]
    pub prompts: BTreeMap<PromptId, PromptRecord>,
    #[serde(default)]
    pub active_prompt_id: Option<PromptId>,
}

impl PromptCollection {
    pub fn is_empty(&self) -> bool {
        self.prompts.is_empty()
    }

    pub fn len(&self) -> usize {
        self.prompts.len()
    }

    /// Records in display order: pinned by pin order, then listed by list order.
    pub fn ordered(&self) -> Vec<&PromptRecord> {
        let mut records: Vec<&PromptRecord> = self.prompts.values().collect();
        records.sort_by(|a, b| a.slot.sort_key().cmp(&b.slot.sort_key()).then(a.id.cmp(&b.id)));
        records
    }

    /// Check the five collection invariants, describing the first violation.
    pub fn check_invariants(&self) -> Result<(), String> {
        let active: Vec<&PromptId> = self
            .prompts
            .values()
            .filter(|r| r.is_active)
            .map(|r| &r.id)
            .collect();
        if active.len() > 1 {
            return Err(format!("{} records are active", active.len()));
        }
        if active.first().copied() != self.active_prompt_id.as_ref() {
            return Err(format!(
                "active flag ({:?}) disagrees with active_prompt_id ({:?})",
                active.first(),
                self.active_prompt_id
            ));
        }

        for (key, record) in &self.prompts {
            if *key != record.id {
                return Err(format!("record {} is stored under key {key}", record.id));
            }
        }

        let pinned = dense_ranks(self.prompts.values().filter(|r| r.is_pinned()));
        let listed = dense_ranks(self.prompts.values().filter(|r| !r.is_pinned()));
        if !pinned {
            return Err("pin_order values are not 0..k".to_string());
        }
        if !listed {
            return Err("list_order values are not 0..m".to_string());
        }

        let pins = self.prompts.values().filter(|r| r.is_pinned()).count();
        if pins > PIN_QUOTA {
            return Err(format!("{pins} records pinned, quota is {PIN_QUOTA}"));
        }
        Ok(())
    }

    /// Repair a loaded collection so every invariant holds.
    ///
    /// Relative order inside each rank space is preserved (ties broken by
    /// id). Pins past the quota are demoted to the end of the list order.
    /// Returns `true` when anything changed.
    pub fn normalize(&mut self) -> bool {
        let before = self.clone();

        let records = std::mem::take(&mut self.prompts);
        for (key, mut record) in records {
            record.id = key.clone();
            if record.title.trim().is_empty() {
                record.title = UNTITLED.to_string();
            }
            self.prompts.insert(key, record);
        }

        let mut pinned = self.ids_in(true);
        let mut listed = self.ids_in(false);
        if pinned.len() > PIN_QUOTA {
            listed.extend(pinned.split_off(PIN_QUOTA));
        }
        for (rank, id) in pinned.iter().enumerate() {
            if let Some(r) = self.prompts.get_mut(id) {
                r.slot = Slot::Pinned(rank);
            }
        }
        for (rank, id) in listed.iter().enumerate() {
            if let Some(r) = self.prompts.get_mut(id) {
                r.slot = Slot::Listed(rank);
            }
        }

        let active = match &self.active_prompt_id {
            Some(id) if self.prompts.contains_key(id) => Some(id.clone()),
            _ => self
                .ordered()
                .into_iter()
                .find(|r| r.is_active)
                .map(|r| r.id.clone()),
        };
        for record in self.prompts.values_mut() {
            record.is_active = Some(&record.id) == active.as_ref();
        }
        self.active_prompt_id = active;

        *self != before
    }

    /// Ids in one rank space, sorted by their current rank.
    fn ids_in(&self, pinned: bool) -> Vec<PromptId> {
        let mut ranked: Vec<(usize, &PromptId)> = self
            .prompts
            .values()
            .filter(|r| r.is_pinned() == pinned)
            .map(|r| (r.slot.rank(), &r.id))
            .collect();
        ranked.sort();
        ranked.into_iter().map(|(_, id)| id.clone()).collect()
    }
}

fn dense_ranks<'a>(records: impl Iterator<Item = &'a PromptRecord>) -> bool {
    let ranks: Vec<usize> = records.map(|r| r.slot.rank()).collect();
    let unique: HashSet<usize> = ranks.iter().copied().collect();
    unique.len() == ranks.len() && ranks.iter().all(|&r| r < ranks.len())
}
