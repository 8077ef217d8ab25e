use croqli::prompts::{
    Direction, JsonFileStore, MemoryStore, PIN_QUOTA, PromptCollection, PromptEngine, PromptError,
    PromptId, PromptStore, StoreError,
};
use proptest::prelude::*;

#[derive(Debug, Clone)]
enum Op {
    Add { active: bool },
    Delete(usize),
    Activate(Option<usize>),
    TogglePin(usize, Option<usize>),
    Move(usize, bool),
    Reposition(usize, usize),
    Rename(usize),
    Edit(usize),
    DeleteMissing,
}

fn op() -> impl Strategy<Value = Op> {
    prop_oneof![
        3 => any::<bool>().prop_map(|active| Op::Add { active }),
        1 => any::<usize>().prop_map(Op::Delete),
        1 => proptest::option::of(any::<usize>()).prop_map(Op::Activate),
        2 => (any::<usize>(), proptest::option::of(0usize..12)).prop_map(|(i, t)| Op::TogglePin(i, t)),
        2 => (any::<usize>(), any::<bool>()).prop_map(|(i, up)| Op::Move(i, up)),
        2 => (any::<usize>(), 0usize..12).prop_map(|(i, p)| Op::Reposition(i, p)),
        1 => any::<usize>().prop_map(Op::Rename),
        1 => any::<usize>().prop_map(Op::Edit),
        1 => Just(Op::DeleteMissing),
    ]
}

fn pick(engine: &PromptEngine<MemoryStore>, i: usize) -> Option<PromptId> {
    let ids: Vec<PromptId> = engine.ordered().iter().map(|r| r.id().clone()).collect();
    (!ids.is_empty()).then(|| ids[i % ids.len()].clone())
}

/// Apply one op. `Ok(true)` means the op changed state and should have saved.
fn apply(engine: &mut PromptEngine<MemoryStore>, op: &Op) -> Result<bool, PromptError> {
    let missing = PromptId::from("no-such-prompt");
    let target = |i: usize| pick(engine, i).unwrap_or_else(|| missing.clone());
    match *op {
        Op::Add { active } => engine.add("Prompt", "content", active).map(|_| true),
        Op::Delete(i) => {
            let id = target(i);
            engine.delete(&id).map(|_| true)
        }
        Op::Activate(i) => {
            let id = i.map(target);
            engine.set_active(id.as_ref()).map(|_| true)
        }
        Op::TogglePin(i, t) => {
            let id = target(i);
            engine.toggle_pin(&id, t).map(|_| true)
        }
        Op::Move(i, up) => {
            let id = target(i);
            let dir = if up { Direction::Up } else { Direction::Down };
            engine.move_by(&id, dir)
        }
        Op::Reposition(i, p) => {
            let id = target(i);
            let current = engine.get(&id).and_then(|r| r.list_order());
            engine.reposition(&id, p).map(|_| current != Some(p))
        }
        Op::Rename(i) => {
            let id = target(i);
            engine.rename(&id, "Renamed").map(|_| true)
        }
        Op::Edit(i) => {
            let id = target(i);
            engine.edit_content(&id, "").map(|_| true)
        }
        Op::DeleteMissing => engine.delete(&missing).map(|_| true),
    }
}

proptest! {
    #[test]
    fn invariants_hold_across_random_operations(ops in proptest::collection::vec(op(), 1..60)) {
        let mut engine = PromptEngine::open(MemoryStore::new()).unwrap();

        for op in &ops {
            let before = engine.collection().clone();
            let saves = engine.store().save_count();

            match apply(&mut engine, op) {
                Ok(changed) => {
                    let expected = saves + usize::from(changed);
                    prop_assert_eq!(engine.store().save_count(), expected, "{:?}", op);
                    prop_assert_eq!(engine.store().saved(), Some(engine.collection()));
                }
                Err(e) => {
                    prop_assert!(!e.is_applied());
                    prop_assert_eq!(engine.collection(), &before, "{:?} changed state: {}", op, e);
                    prop_assert_eq!(engine.store().save_count(), saves);
                }
            }

            let c = engine.collection();
            prop_assert_eq!(c.check_invariants(), Ok(()), "after {:?}", op);
            prop_assert!(engine.pinned_count() <= PIN_QUOTA);
            let positions: Vec<usize> = engine.view().iter().map(|e| e.position).collect();
            prop_assert_eq!(positions, (1..=engine.len()).collect::<Vec<_>>());
        }
    }

    #[test]
    fn add_then_delete_is_identity(ops in proptest::collection::vec(op(), 0..30)) {
        let mut engine = PromptEngine::open(MemoryStore::new()).unwrap();
        for op in &ops {
            apply(&mut engine, op).ok();
        }
        let before = engine.collection().clone();
        let id = engine.add("Temporary", "x", false).unwrap();
        engine.delete(&id).unwrap();
        prop_assert_eq!(engine.collection(), &before);
    }
}

#[test]
fn file_store_survives_restart() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("system_prompts.json");

    let (custom, listed_order) = {
        let mut engine = PromptEngine::open(JsonFileStore::new(&path)).unwrap();
        assert_eq!(engine.len(), 5);
        let custom = engine.add("Pirate", "Talk like a pirate.", true).unwrap();
        engine.reposition(&custom, 0).unwrap();
        engine.toggle_pin(&custom, None).unwrap();
        let order: Vec<String> = engine.view().into_iter().map(|e| e.title).collect();
        (custom, order)
    };

    let reopened = PromptEngine::open(JsonFileStore::new(&path)).unwrap();
    let order: Vec<String> = reopened.view().into_iter().map(|e| e.title).collect();
    assert_eq!(order, listed_order);
    assert_eq!(reopened.active_id(), Some(&custom));
    assert_eq!(reopened.active_content(), Some("Talk like a pirate."));
    assert_eq!(reopened.get(&custom).unwrap().pin_order(), Some(1));
}

#[test]
fn legacy_file_is_migrated_on_first_change() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("system_prompts.json");
    std::fs::write(
        &path,
        r#"{
            "prompts": [
                {"name": "Old default", "prompt_text": "Be nice.", "priority": 0, "is_active": true},
                {"name": "Favourite", "prompt_text": "Be brief.", "priority": 1}
            ]
        }"#,
    )
    .unwrap();

    let mut engine = PromptEngine::open(JsonFileStore::new(&path)).unwrap();
    let titles: Vec<String> = engine.view().into_iter().map(|e| e.title).collect();
    assert_eq!(titles, ["Favourite", "Old default"]);
    assert_eq!(engine.active().unwrap().title(), "Old default");

    let favourite = engine.id_at(1).unwrap();
    engine.set_active(Some(&favourite)).unwrap();

    let on_disk: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
    assert!(on_disk["prompts"].is_object(), "legacy file rewritten in current format");
}

#[test]
fn non_utf8_file_is_replaced_by_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("system_prompts.json");
    std::fs::write(&path, [0xff, 0xfe, b'{', 0x80]).unwrap();

    let engine = PromptEngine::open(JsonFileStore::new(&path)).unwrap();
    assert_eq!(engine.len(), 5);
    assert!(path.with_extension("json.corrupt").exists());
    let reopened = PromptEngine::open(JsonFileStore::new(&path)).unwrap();
    assert_eq!(reopened.collection(), engine.collection());
}

#[test]
fn unreadable_file_stops_open() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("system_prompts.json");
    std::fs::create_dir(&path).unwrap();

    let err = PromptEngine::open(JsonFileStore::new(&path)).err().unwrap();
    assert!(matches!(err, StoreError::Read { .. }));
    assert!(err.to_string().contains("failed to read prompts file"));
}

#[test]
fn failing_store_reports_but_keeps_change() {
    let mut engine = PromptEngine::with_collection(MemoryStore::new(), PromptCollection::default());
    engine.store_mut().set_fail_saves(true);

    let err = engine.add("Draft", "text", false).unwrap_err();
    assert!(err.is_applied());
    assert!(err.to_string().contains("not saved"));
    assert_eq!(engine.len(), 1);
    assert!(engine.store().load().unwrap().is_empty());
}
