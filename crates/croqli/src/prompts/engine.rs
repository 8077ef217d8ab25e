//! The system prompt ordering engine.
//!
//! [`PromptEngine`] is the only thing that mutates the prompt collection. It
//! keeps two dense rank spaces over one `id → record` map:
//!
//! ```text
//! pinned:  pin_order  0..k   (k ≤ 6, append/remove only)
//! listed:  list_order 0..m   (insert, move, reposition)
//! ```
//!
//! Every public mutation validates before touching state, so a rejected call
//! leaves the collection untouched and writes nothing. A successful mutation
//! is written through to the [`PromptStore`] before returning; if that write
//! fails the change stays in memory and [`PromptError::Persistence`] is
//! returned so the caller can warn the user.

use tracing::{debug, info, warn};

use super::collection::PromptCollection;
use super::defaults::default_collection;
use super::error::{PromptError, Result, StoreError};
use super::record::{PIN_QUOTA, PromptId, PromptRecord, Slot};
use super::store::PromptStore;

/// Direction for [`PromptEngine::move_by`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Direction {
    /// Towards list order 0.
    Up,
    /// Away from list order 0.
    Down,
}

/// Outcome of [`PromptEngine::toggle_pin`], carrying the new rank.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PinChange {
    Pinned(usize),
    Unpinned(usize),
}

/// Read-only presentation row for one prompt.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PromptEntry {
    pub id: PromptId,
    /// 1-based position in display order.
    pub position: usize,
    pub title: String,
    pub is_active: bool,
    pub pinned: bool,
}

/// Owner of the prompt collection.
pub struct PromptEngine<S: PromptStore> {
    collection: PromptCollection,
    store: S,
}

impl<S: PromptStore> PromptEngine<S> {
    /// Load the collection from `store`, repairing it if needed and seeding
    /// the built-in prompts when it is empty.
    ///
    /// A failed write of the repaired or seeded collection is logged, not
    /// returned: the session is still usable.
    pub fn open(store: S) -> std::result::Result<Self, StoreError> {
        let mut collection = store.load()?;
        let repaired = collection.normalize();
        let mut engine = Self { collection, store };

        let reason = if engine.collection.is_empty() {
            engine.collection = default_collection();
            info!("Seeded {} built-in prompts", engine.collection.len());
            Some("seed")
        } else if repaired {
            info!("Repaired inconsistent prompt ordering on load");
            Some("repair")
        } else {
            None
        };

        if let Some(operation) = reason {
            // commit() already logs the failure.
            engine.commit(operation).ok();
        }
        Ok(engine)
    }

    /// Build an engine over an existing collection without loading or saving.
    pub fn with_collection(store: S, mut collection: PromptCollection) -> Self {
        collection.normalize();
        Self { collection, store }
    }

    // ── Queries ────────────────────────────────────────────────────

    pub fn get(&self, id: &PromptId) -> Option<&PromptRecord> {
        self.collection.prompts.get(id)
    }

    pub fn active(&self) -> Option<&PromptRecord> {
        self.collection
            .active_prompt_id
            .as_ref()
            .and_then(|id| self.get(id))
    }

    pub fn active_id(&self) -> Option<&PromptId> {
        self.collection.active_prompt_id.as_ref()
    }

    /// Content of the active prompt, if there is one and it is not blank.
    pub fn active_content(&self) -> Option<&str> {
        self.active()
            .map(|r| r.content())
            .filter(|c| !c.trim().is_empty())
    }

    pub fn len(&self) -> usize {
        self.collection.len()
    }

    pub fn is_empty(&self) -> bool {
        self.collection.is_empty()
    }

    pub fn pinned_count(&self) -> usize {
        self.collection.prompts.values().filter(|r| r.is_pinned()).count()
    }

    pub fn unpinned_count(&self) -> usize {
        self.len() - self.pinned_count()
    }

    /// Records in display order: pinned by pin order, then listed by list order.
    pub fn ordered(&self) -> Vec<&PromptRecord> {
        self.collection.ordered()
    }

    /// Presentation snapshot of the ordered collection.
    pub fn view(&self) -> Vec<PromptEntry> {
        self.ordered()
            .into_iter()
            .enumerate()
            .map(|(i, r)| PromptEntry {
                id: r.id.clone(),
                position: i + 1,
                title: r.title.clone(),
                is_active: r.is_active,
                pinned: r.is_pinned(),
            })
            .collect()
    }

    /// Resolve a 1-based display position against the current ordering.
    pub fn id_at(&self, position: usize) -> Option<PromptId> {
        position
            .checked_sub(1)
            .and_then(|i| self.ordered().get(i).map(|r| r.id.clone()))
    }

    pub fn collection(&self) -> &PromptCollection {
        &self.collection
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut S {
        &mut self.store
    }

    // ── Mutations ──────────────────────────────────────────────────

    /// Append a new unpinned prompt at the end of the list order.
    pub fn add(&mut self, title: &str, content: &str, make_active: bool) -> Result<PromptId> {
        const OP: &str = "add";
        if title.trim().is_empty() {
            return Err(PromptError::Validation {
                operation: OP,
                field: "title",
            });
        }
        if content.trim().is_empty() {
            return Err(PromptError::Validation {
                operation: OP,
                field: "content",
            });
        }

        let mut id = PromptId::generate();
        while self.collection.prompts.contains_key(&id) {
            id = PromptId::generate();
        }
        let record = PromptRecord::new(
            id.clone(),
            title,
            content,
            Slot::Listed(self.unpinned_count()),
        );
        self.collection.prompts.insert(id.clone(), record);
        info!(%id, title, "Added prompt");

        if make_active {
            self.apply_active(Some(&id));
        }
        self.commit(OP)?;
        Ok(id)
    }

    /// Remove a prompt, closing the gap it leaves in its rank space.
    ///
    /// If it was active, the first remaining prompt in display order becomes
    /// active.
    pub fn delete(&mut self, id: &PromptId) -> Result<()> {
        const OP: &str = "delete";
        let removed = self
            .collection
            .prompts
            .remove(id)
            .ok_or_else(|| not_found(OP, id))?;
        self.close_gap(removed.slot);
        info!(%id, title = removed.title(), "Deleted prompt");

        if removed.is_active {
            self.collection.active_prompt_id = None;
            let next = self.ordered().first().map(|r| r.id.clone());
            if let Some(next) = next {
                debug!(%next, "Promoting replacement active prompt");
                self.apply_active(Some(&next));
            }
        }
        self.commit(OP)
    }

    /// Make `id` the only active prompt, or clear the active prompt with `None`.
    pub fn set_active(&mut self, id: Option<&PromptId>) -> Result<()> {
        const OP: &str = "activate";
        if let Some(id) = id
            && !self.collection.prompts.contains_key(id)
        {
            return Err(not_found(OP, id));
        }
        self.apply_active(id);
        info!(id = ?id.map(PromptId::as_str), "Active prompt changed");
        self.commit(OP)
    }

    /// Pin an unpinned prompt (appending to the pin order) or unpin a pinned
    /// one.
    ///
    /// When unpinning, `unpin_target` chooses the list position to insert at;
    /// positions past the end append. `None` appends.
    pub fn toggle_pin(&mut self, id: &PromptId, unpin_target: Option<usize>) -> Result<PinChange> {
        const OP: &str = "pin";
        let slot = self.slot_of(OP, id)?;

        let change = match slot {
            Slot::Listed(_) => {
                let pinned = self.pinned_count();
                if pinned >= PIN_QUOTA {
                    return Err(PromptError::PinQuotaExceeded {
                        id: id.clone(),
                        limit: PIN_QUOTA,
                    });
                }
                self.close_gap(slot);
                self.set_slot(id, Slot::Pinned(pinned));
                PinChange::Pinned(pinned)
            }
            Slot::Pinned(_) => {
                self.close_gap(slot);
                let len = self.unpinned_count();
                let target = unpin_target.map_or(len, |t| t.min(len));
                for record in self.collection.prompts.values_mut() {
                    if let Slot::Listed(rank) = record.slot
                        && rank >= target
                    {
                        record.slot = Slot::Listed(rank + 1);
                    }
                }
                self.set_slot(id, Slot::Listed(target));
                PinChange::Unpinned(target)
            }
        };

        info!(%id, ?change, "Toggled pin");
        self.commit(OP)?;
        Ok(change)
    }

    /// Swap an unpinned prompt with its neighbour in the list order.
    ///
    /// Returns `Ok(false)` without saving when the prompt is already at that
    /// end of the list.
    pub fn move_by(&mut self, id: &PromptId, direction: Direction) -> Result<bool> {
        const OP: &str = "move";
        let rank = self.listed_rank(OP, id)?;
        let neighbour_rank = match direction {
            Direction::Up => rank.checked_sub(1),
            Direction::Down => Some(rank + 1),
        };
        let neighbour = neighbour_rank.and_then(|r| self.listed_at(r).map(|id| (r, id)));
        let Some((neighbour_rank, neighbour_id)) = neighbour else {
            debug!(%id, ?direction, "Move at list boundary, nothing to do");
            return Ok(false);
        };

        self.set_slot(&neighbour_id, Slot::Listed(rank));
        self.set_slot(id, Slot::Listed(neighbour_rank));
        info!(%id, from = rank, to = neighbour_rank, "Moved prompt");
        self.commit(OP)?;
        Ok(true)
    }

    /// Move an unpinned prompt to `new_list_order`, shifting the prompts in
    /// between by one.
    pub fn reposition(&mut self, id: &PromptId, new_list_order: usize) -> Result<()> {
        const OP: &str = "reposition";
        let old = self.listed_rank(OP, id)?;
        let len = self.unpinned_count();
        if new_list_order >= len {
            return Err(PromptError::OutOfRange {
                operation: OP,
                id: id.clone(),
                requested: new_list_order,
                len,
            });
        }
        if new_list_order == old {
            debug!(%id, "Reposition to current position, nothing to do");
            return Ok(());
        }

        for record in self.collection.prompts.values_mut() {
            if let Slot::Listed(rank) = record.slot {
                if old < new_list_order && rank > old && rank <= new_list_order {
                    record.slot = Slot::Listed(rank - 1);
                } else if new_list_order < old && rank >= new_list_order && rank < old {
                    record.slot = Slot::Listed(rank + 1);
                }
            }
        }
        self.set_slot(id, Slot::Listed(new_list_order));
        info!(%id, from = old, to = new_list_order, "Repositioned prompt");
        self.commit(OP)
    }

    pub fn rename(&mut self, id: &PromptId, title: &str) -> Result<()> {
        const OP: &str = "rename";
        self.slot_of(OP, id)?;
        if title.trim().is_empty() {
            return Err(PromptError::Validation {
                operation: OP,
                field: "title",
            });
        }
        if let Some(record) = self.collection.prompts.get_mut(id) {
            record.title = title.to_string();
        }
        info!(%id, title, "Renamed prompt");
        self.commit(OP)
    }

    /// Replace a prompt's content. Empty content is allowed.
    pub fn edit_content(&mut self, id: &PromptId, content: &str) -> Result<()> {
        const OP: &str = "edit";
        self.slot_of(OP, id)?;
        if let Some(record) = self.collection.prompts.get_mut(id) {
            record.content = content.to_string();
        }
        info!(%id, chars = content.len(), "Edited prompt content");
        self.commit(OP)
    }

    // ── Internals ──────────────────────────────────────────────────

    fn slot_of(&self, operation: &'static str, id: &PromptId) -> Result<Slot> {
        self.get(id)
            .map(PromptRecord::slot)
            .ok_or_else(|| not_found(operation, id))
    }

    fn listed_rank(&self, operation: &'static str, id: &PromptId) -> Result<usize> {
        match self.slot_of(operation, id)? {
            Slot::Listed(rank) => Ok(rank),
            Slot::Pinned(_) => Err(PromptError::InvalidOperation {
                operation,
                id: id.clone(),
                reason: "is pinned; pinned prompts keep their pin order",
            }),
        }
    }

    fn listed_at(&self, rank: usize) -> Option<PromptId> {
        self.collection
            .prompts
            .values()
            .find(|r| r.slot == Slot::Listed(rank))
            .map(|r| r.id.clone())
    }

    fn set_slot(&mut self, id: &PromptId, slot: Slot) {
        if let Some(record) = self.collection.prompts.get_mut(id) {
            record.slot = slot;
        }
    }

    /// Shift every rank after `vacated` down by one within the same space.
    fn close_gap(&mut self, vacated: Slot) {
        for record in self.collection.prompts.values_mut() {
            record.slot = match (vacated, record.slot) {
                (Slot::Pinned(gap), Slot::Pinned(rank)) if rank > gap => Slot::Pinned(rank - 1),
                (Slot::Listed(gap), Slot::Listed(rank)) if rank > gap => Slot::Listed(rank - 1),
                (_, unchanged) => unchanged,
            };
        }
    }

    fn apply_active(&mut self, id: Option<&PromptId>) {
        for record in self.collection.prompts.values_mut() {
            record.is_active = Some(&record.id) == id;
        }
        self.collection.active_prompt_id = id.cloned();
    }

    /// Write the collection through to the store.
    fn commit(&mut self, operation: &'static str) -> Result<()> {
        debug_assert_eq!(self.collection.check_invariants(), Ok(()));
        self.store.save(&self.collection).map_err(|source| {
            warn!("Failed to save prompts after {operation}: {source}");
            PromptError::Persistence { operation, source }
        })
    }
}

fn not_found(operation: &'static str, id: &PromptId) -> PromptError {
    PromptError::NotFound {
        operation,
        id: id.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::prompts::store::MemoryStore;

    fn empty_engine() -> PromptEngine<MemoryStore> {
        PromptEngine::with_collection(MemoryStore::new(), PromptCollection::default())
    }

    /// A(pinned, 0), B(listed, 0), C(listed, 1).
    fn abc() -> (PromptEngine<MemoryStore>, PromptId, PromptId, PromptId) {
        let mut engine = empty_engine();
        let a = engine.add("A", "a", false).unwrap();
        let b = engine.add("B", "b", false).unwrap();
        let c = engine.add("C", "c", false).unwrap();
        engine.toggle_pin(&a, None).unwrap();
        (engine, a, b, c)
    }

    fn titles(engine: &PromptEngine<MemoryStore>) -> Vec<String> {
        engine.view().into_iter().map(|e| e.title).collect()
    }

    #[test]
    fn open_seeds_defaults_and_persists() {
        let engine = PromptEngine::open(MemoryStore::new()).unwrap();
        assert_eq!(engine.len(), 5);
        assert_eq!(engine.store().save_count(), 1);

        let first = engine.ordered()[0];
        assert!(first.is_pinned());
        assert_eq!(first.pin_order(), Some(0));
        assert!(first.is_active());
        assert_eq!(engine.active_id(), Some(first.id()));
    }

    #[test]
    fn open_keeps_existing_collection_without_saving() {
        let mut seeded = PromptEngine::open(MemoryStore::new()).unwrap();
        seeded.add("Mine", "custom", false).unwrap();
        let stored = seeded.collection().clone();

        let engine = PromptEngine::open(MemoryStore::with_collection(stored.clone())).unwrap();
        assert_eq!(engine.collection(), &stored);
        assert_eq!(engine.store().save_count(), 0);
    }

    #[test]
    fn open_saves_repaired_collection() {
        let mut broken = PromptCollection::default();
        let r = PromptRecord::new("x", "X", "x", Slot::Listed(4));
        broken.prompts.insert(r.id.clone(), r);

        let engine = PromptEngine::open(MemoryStore::with_collection(broken)).unwrap();
        assert_eq!(engine.get(&"x".into()).unwrap().list_order(), Some(0));
        assert_eq!(engine.store().save_count(), 1);
    }

    #[test]
    fn add_appends_to_list_order() {
        let (mut engine, _, b, c) = abc();
        let d = engine.add("D", "d", false).unwrap();
        assert_eq!(engine.get(&b).unwrap().list_order(), Some(0));
        assert_eq!(engine.get(&c).unwrap().list_order(), Some(1));
        assert_eq!(engine.get(&d).unwrap().list_order(), Some(2));
        assert!(!engine.get(&d).unwrap().is_active());
    }

    #[test]
    fn add_rejects_empty_fields_without_saving() {
        let mut engine = empty_engine();
        let err = engine.add("", "content", false).unwrap_err();
        assert!(matches!(err, PromptError::Validation { field: "title", .. }));
        let err = engine.add("Title", "   ", false).unwrap_err();
        assert!(matches!(err, PromptError::Validation { field: "content", .. }));
        assert!(engine.is_empty());
        assert_eq!(engine.store().save_count(), 0);
    }

    #[test]
    fn add_active_saves_once() {
        let mut engine = empty_engine();
        let id = engine.add("A", "a", true).unwrap();
        assert_eq!(engine.active_id(), Some(&id));
        assert_eq!(engine.store().save_count(), 1);
    }

    #[test]
    fn add_then_delete_restores_ordering() {
        let (mut engine, ..) = abc();
        let before = engine.collection().clone();
        let id = engine.add("Temp", "t", false).unwrap();
        engine.delete(&id).unwrap();
        assert_eq!(engine.collection(), &before);
    }

    #[test]
    fn delete_closes_list_gap() {
        let (mut engine, _, b, c) = abc();
        let d = engine.add("D", "d", false).unwrap();
        engine.delete(&b).unwrap();
        assert_eq!(engine.get(&c).unwrap().list_order(), Some(0));
        assert_eq!(engine.get(&d).unwrap().list_order(), Some(1));
    }

    #[test]
    fn delete_closes_pin_gap() {
        let (mut engine, a, b, c) = abc();
        engine.toggle_pin(&b, None).unwrap();
        engine.toggle_pin(&c, None).unwrap();
        engine.delete(&a).unwrap();
        assert_eq!(engine.get(&b).unwrap().pin_order(), Some(0));
        assert_eq!(engine.get(&c).unwrap().pin_order(), Some(1));
    }

    #[test]
    fn deleting_active_promotes_pinned_first() {
        let (mut engine, a, b, c) = abc();
        engine.set_active(Some(&c)).unwrap();
        engine.delete(&c).unwrap();
        assert_eq!(engine.active_id(), Some(&a));
        assert!(engine.get(&a).unwrap().is_active());
        assert!(!engine.get(&b).unwrap().is_active());
    }

    #[test]
    fn deleting_last_active_leaves_no_active() {
        let mut engine = empty_engine();
        let id = engine.add("Only", "x", true).unwrap();
        engine.delete(&id).unwrap();
        assert!(engine.is_empty());
        assert_eq!(engine.active_id(), None);
        assert_eq!(engine.store().saved().unwrap().active_prompt_id, None);
    }

    #[test]
    fn delete_unknown_is_not_found() {
        let (mut engine, ..) = abc();
        let saves = engine.store().save_count();
        let err = engine.delete(&"missing".into()).unwrap_err();
        assert!(matches!(err, PromptError::NotFound { operation: "delete", .. }));
        assert_eq!(engine.store().save_count(), saves);
    }

    #[test]
    fn set_active_is_exclusive_and_clearable() {
        let (mut engine, a, b, _) = abc();
        engine.set_active(Some(&a)).unwrap();
        engine.set_active(Some(&b)).unwrap();
        assert!(!engine.get(&a).unwrap().is_active());
        assert!(engine.get(&b).unwrap().is_active());

        engine.set_active(None).unwrap();
        assert!(engine.ordered().iter().all(|r| !r.is_active()));
        assert_eq!(engine.active_content(), None);
    }

    #[test]
    fn set_active_unknown_keeps_current() {
        let (mut engine, a, ..) = abc();
        engine.set_active(Some(&a)).unwrap();
        assert!(engine.set_active(Some(&"nope".into())).is_err());
        assert_eq!(engine.active_id(), Some(&a));
    }

    #[test]
    fn pin_appends_to_pin_order_and_closes_list_gap() {
        let (mut engine, _, b, c) = abc();
        let change = engine.toggle_pin(&b, None).unwrap();
        assert_eq!(change, PinChange::Pinned(1));
        assert_eq!(engine.get(&c).unwrap().list_order(), Some(0));
        assert_eq!(titles(&engine), ["A", "B", "C"]);
    }

    #[test]
    fn unpin_without_target_appends() {
        let (mut engine, a, b, c) = abc();
        let change = engine.toggle_pin(&a, None).unwrap();
        assert_eq!(change, PinChange::Unpinned(2));
        assert_eq!(engine.get(&b).unwrap().list_order(), Some(0));
        assert_eq!(engine.get(&c).unwrap().list_order(), Some(1));
        assert_eq!(engine.pinned_count(), 0);
    }

    #[test]
    fn pin_unpin_round_trip_lands_at_end() {
        let (mut engine, _, b, c) = abc();
        engine.toggle_pin(&b, None).unwrap();
        engine.toggle_pin(&b, None).unwrap();
        assert_eq!(engine.get(&c).unwrap().list_order(), Some(0));
        assert_eq!(engine.get(&b).unwrap().list_order(), Some(1));
    }

    #[test]
    fn unpin_with_target_inserts_and_shifts() {
        let (mut engine, a, b, c) = abc();
        let change = engine.toggle_pin(&a, Some(0)).unwrap();
        assert_eq!(change, PinChange::Unpinned(0));
        assert_eq!(engine.get(&a).unwrap().list_order(), Some(0));
        assert_eq!(engine.get(&b).unwrap().list_order(), Some(1));
        assert_eq!(engine.get(&c).unwrap().list_order(), Some(2));
    }

    #[test]
    fn unpin_target_past_end_is_clamped() {
        let (mut engine, a, ..) = abc();
        let change = engine.toggle_pin(&a, Some(40)).unwrap();
        assert_eq!(change, PinChange::Unpinned(2));
        engine.collection().check_invariants().unwrap();
    }

    #[test]
    fn unpin_closes_pin_gap() {
        let (mut engine, a, b, c) = abc();
        engine.toggle_pin(&b, None).unwrap();
        engine.toggle_pin(&c, None).unwrap();
        engine.toggle_pin(&b, None).unwrap();
        assert_eq!(engine.get(&a).unwrap().pin_order(), Some(0));
        assert_eq!(engine.get(&c).unwrap().pin_order(), Some(1));
    }

    #[test]
    fn sixth_pin_succeeds_seventh_fails() {
        let mut engine = empty_engine();
        let ids: Vec<PromptId> = (0..7)
            .map(|i| engine.add(&format!("P{i}"), "p", false).unwrap())
            .collect();
        for id in &ids[..6] {
            engine.toggle_pin(id, None).unwrap();
        }
        assert_eq!(engine.pinned_count(), 6);

        let before = engine.collection().clone();
        let saves = engine.store().save_count();
        let err = engine.toggle_pin(&ids[6], None).unwrap_err();
        assert!(matches!(err, PromptError::PinQuotaExceeded { limit: 6, .. }));
        assert_eq!(engine.collection(), &before);
        assert_eq!(engine.store().save_count(), saves);
    }

    #[test]
    fn move_swaps_with_neighbour() {
        let (mut engine, _, b, c) = abc();
        assert!(engine.move_by(&c, Direction::Up).unwrap());
        assert_eq!(engine.get(&c).unwrap().list_order(), Some(0));
        assert_eq!(engine.get(&b).unwrap().list_order(), Some(1));
    }

    #[test]
    fn move_at_boundary_is_a_silent_no_op() {
        let (mut engine, _, b, c) = abc();
        let before = engine.collection().clone();
        let saves = engine.store().save_count();

        assert!(!engine.move_by(&b, Direction::Up).unwrap());
        assert!(!engine.move_by(&c, Direction::Down).unwrap());
        assert_eq!(engine.collection(), &before);
        assert_eq!(engine.store().save_count(), saves);
    }

    #[test]
    fn move_pinned_is_invalid() {
        let (mut engine, a, ..) = abc();
        let err = engine.move_by(&a, Direction::Down).unwrap_err();
        assert!(matches!(err, PromptError::InvalidOperation { operation: "move", .. }));
    }

    #[test]
    fn reposition_to_front() {
        let (mut engine, a, b, c) = abc();
        engine.reposition(&c, 0).unwrap();
        assert_eq!(engine.get(&b).unwrap().list_order(), Some(1));
        assert_eq!(engine.get(&c).unwrap().list_order(), Some(0));
        assert_eq!(engine.get(&a).unwrap().pin_order(), Some(0));
    }

    #[test]
    fn reposition_to_current_position_does_not_save() {
        let (mut engine, _, b, c) = abc();
        let before = engine.collection().clone();
        let saves = engine.store().save_count();

        engine.reposition(&b, 0).unwrap();
        engine.reposition(&c, 1).unwrap();
        assert_eq!(engine.collection(), &before);
        assert_eq!(engine.store().save_count(), saves);
    }

    #[test]
    fn reposition_downwards_shifts_block_up() {
        let mut engine = empty_engine();
        let ids: Vec<PromptId> = ["W", "X", "Y", "Z"]
            .iter()
            .map(|t| engine.add(t, "x", false).unwrap())
            .collect();
        engine.reposition(&ids[0], 2).unwrap();
        assert_eq!(titles(&engine), ["X", "Y", "W", "Z"]);
        engine.reposition(&ids[3], 1).unwrap();
        assert_eq!(titles(&engine), ["X", "Z", "Y", "W"]);
    }

    #[test]
    fn reposition_rejects_out_of_range_and_pinned() {
        let (mut engine, a, b, _) = abc();
        let err = engine.reposition(&b, 2).unwrap_err();
        assert!(matches!(
            err,
            PromptError::OutOfRange {
                requested: 2,
                len: 2,
                ..
            }
        ));
        let err = engine.reposition(&a, 0).unwrap_err();
        assert!(matches!(err, PromptError::InvalidOperation { .. }));
    }

    #[test]
    fn rename_and_edit() {
        let (mut engine, a, ..) = abc();
        engine.rename(&a, "Renamed").unwrap();
        engine.edit_content(&a, "").unwrap();
        let record = engine.get(&a).unwrap();
        assert_eq!(record.title(), "Renamed");
        assert_eq!(record.content(), "");

        let err = engine.rename(&a, " ").unwrap_err();
        assert!(matches!(err, PromptError::Validation { operation: "rename", .. }));
        assert_eq!(engine.get(&a).unwrap().title(), "Renamed");
    }

    #[test]
    fn persistence_failure_keeps_change() {
        let (mut engine, a, ..) = abc();
        engine.store_mut().set_fail_saves(true);
        let err = engine.rename(&a, "Unsaved").unwrap_err();
        assert!(err.is_applied());
        assert_eq!(engine.get(&a).unwrap().title(), "Unsaved");
    }

    #[test]
    fn view_and_position_lookup_follow_display_order() {
        let (mut engine, a, b, c) = abc();
        engine.set_active(Some(&b)).unwrap();
        let view = engine.view();
        assert_eq!(view.len(), 3);
        assert_eq!(view[0].id, a);
        assert!(view[0].pinned);
        assert!(view[1].is_active);
        assert_eq!(view[2].position, 3);

        assert_eq!(engine.id_at(1), Some(a));
        assert_eq!(engine.id_at(3), Some(c));
        assert_eq!(engine.id_at(0), None);
        assert_eq!(engine.id_at(4), None);
    }
}
