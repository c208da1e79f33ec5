//! Integration tests: flow store history, edge alerts and template
//! references across the workspace (mf-editor).

use mf_core::*;
use mf_editor::{FlowStore, Modifiers, ShortcutAction, Workspace};
use pretty_assertions::assert_eq;

const SAVED_FLOW: &str = include_str!("fixtures/saved_flow.json");

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn empty_store(clock: &ManualClock) -> FlowStore {
    FlowStore::new(FlowDocument::new(), EditorConfig::default(), Box::new(clock.clone()))
}

fn workspace(clock: &ManualClock) -> Workspace<MemoryStorage> {
    let store = FlowStore::demo(EditorConfig::default(), Box::new(clock.clone()));
    Workspace::new(store, MemoryStorage::new(), EditorConfig::default(), 1)
}

fn saved_template(ws: &mut Workspace<MemoryStorage>, name: &str) -> Id {
    let mut editor = ws.new_editor();
    editor.set_name(name);
    editor.add_shape(ShapeKind::Rectangle);
    ws.save_editor(&mut editor).unwrap();
    editor.template().id
}

// ─── Edge alerts ─────────────────────────────────────────────────────────

#[test]
fn status_down_alerts_edge_and_undo_reverts() {
    init_logging();
    let clock = ManualClock::new(1_716_206_400_000);
    let mut store = empty_store(&clock);

    let a = store.add_node("Mill", Position::new(0.0, 0.0));
    let b = store.add_node("Lathe", Position::new(300.0, 0.0));
    let edge = store.connect(&Connection::new(a, b)).expect("connected");
    assert!(!store.document().edge(edge).unwrap().animated);

    store
        .update_node_data(a, &MachineDataUpdate::status(MachineStatus::Down))
        .unwrap();
    let e = store.document().edge(edge).unwrap();
    assert!(e.animated);
    assert_eq!(e.stroke_color(), "#ef4444");

    assert!(store.undo());
    assert!(!store.document().edge(edge).unwrap().animated);
    assert_eq!(store.node(a).unwrap().data.status, MachineStatus::Idle);
}

#[test]
fn only_edges_leaving_the_node_change() {
    let clock = ManualClock::new(0);
    let mut store = empty_store(&clock);
    let a = store.add_node("A", Position::default());
    let b = store.add_node("B", Position::default());
    let c = store.add_node("C", Position::default());
    let ab = store.connect(&Connection::new(a, b)).unwrap();
    let cb = store.connect(&Connection::new(c, b)).unwrap();
    let ba = store.connect(&Connection::new(b, a)).unwrap();

    store
        .update_node_data(a, &MachineDataUpdate::status(MachineStatus::Down))
        .unwrap();
    let doc = store.document();
    assert!(doc.edge(ab).unwrap().animated);
    assert!(!doc.edge(cb).unwrap().animated);
    assert!(!doc.edge(ba).unwrap().animated);

    store
        .update_node_data(a, &MachineDataUpdate::status(MachineStatus::Warning))
        .unwrap();
    assert!(!store.document().edge(ab).unwrap().animated);
}

// ─── History ─────────────────────────────────────────────────────────────

#[test]
fn history_is_bounded() {
    let clock = ManualClock::new(0);
    let config = EditorConfig {
        history_limit: 50,
        ..Default::default()
    };
    let mut store = FlowStore::new(FlowDocument::new(), config, Box::new(clock.clone()));
    for i in 0..60 {
        store.add_node(&format!("Unit {i}"), Position::default());
    }
    assert_eq!(store.history().len(), 50);
    assert_eq!(store.history().index(), 49);
    // The initial state and the first ten additions were evicted.
    let oldest = &store.history().entries()[0];
    assert_eq!(oldest.state.nodes.len(), 11);
    let mut undos = 0;
    while store.undo() {
        undos += 1;
    }
    assert_eq!(undos, 49);
    assert_eq!(store.document().nodes.len(), 11);
}

#[test]
fn snapshots_are_timestamped_by_the_clock() {
    let clock = ManualClock::new(1_716_206_400_000);
    let mut store = empty_store(&clock);
    clock.advance(60_000);
    store.add_node("Robot", Position::default());
    let snap = store.history().current().unwrap();
    assert_eq!(snap.timestamp.timestamp_millis(), 1_716_206_460_000);
    assert_eq!(snap.description, "Added Robot");
}

#[test]
fn drag_then_edit_records_both_steps() {
    let clock = ManualClock::new(0);
    let mut store = FlowStore::demo(EditorConfig::default(), Box::new(clock.clone()));
    let m1 = Id::intern("m-1");
    store.apply_node_changes(&[NodeChange::Position {
        id: m1,
        position: Position::new(150.0, 150.0),
    }]);
    // An edit before the drag settles flushes the drag first.
    store
        .update_node_data(m1, &MachineDataUpdate {
            label: Some("Mill 2".into()),
            ..Default::default()
        })
        .unwrap();
    let descriptions: Vec<&str> = store
        .history()
        .entries()
        .iter()
        .map(|s| s.description.as_str())
        .collect();
    assert_eq!(
        descriptions,
        vec!["Initial state", "Node position changed", "Updated Mill 2"]
    );
    store.undo();
    assert_eq!(store.node(m1).unwrap().data.label, "CNC Milling");
    assert_eq!(store.node(m1).unwrap().position, Position::new(150.0, 150.0));
}

// ─── Template references ─────────────────────────────────────────────────

#[test]
fn deleting_template_clears_node_reference() {
    init_logging();
    let clock = ManualClock::new(0);
    let mut ws = workspace(&clock);
    let t = saved_template(&mut ws, "Press");
    let node = Id::intern("m-1");
    ws.assign_template(node, Some(t)).unwrap();
    assert_eq!(ws.store().document().template_of(node), Some(t));

    let affected = ws.delete_template(t).unwrap();
    assert_eq!(affected, vec![node]);
    assert_eq!(ws.store().document().template_of(node), None);
    assert!(ws.library().get(t).is_none());

    // Undoing past the deletion must not bring the dangling reference back.
    assert!(ws.undo());
    assert_eq!(ws.store().document().template_of(node), None);
    assert!(matches!(ws.delete_template(t), Err(Error::TemplateNotFound(_))));
}

#[test]
fn keyboard_undo_in_workspace_prunes_refs() {
    let clock = ManualClock::new(0);
    let mut ws = workspace(&clock);
    let t = saved_template(&mut ws, "Oven");
    let node = Id::intern("m-2");
    ws.assign_template(node, Some(t)).unwrap();
    ws.delete_template(t).unwrap();
    ws.store_mut().add_node("Fan", Position::default());

    assert_eq!(ws.handle_flow_key("z", Modifiers::command()), Some(ShortcutAction::Undo));
    assert_eq!(ws.handle_flow_key("z", Modifiers::command()), Some(ShortcutAction::Undo));
    assert_eq!(ws.store().document().template_of(node), None);
}

#[test]
fn loading_fixture_normalises_edges_and_prunes_unknown_templates() {
    init_logging();
    let clock = ManualClock::new(0);
    let mut storage = MemoryStorage::new();
    let press = Template::new(Id::intern("template-press"), 0);
    storage
        .write(
            TEMPLATES_KEY,
            &TemplateLibrary::from_templates(vec![press]).to_json().unwrap(),
        )
        .unwrap();
    storage.write(FLOW_KEY, SAVED_FLOW).unwrap();

    let store = FlowStore::new(FlowDocument::new(), EditorConfig::default(), Box::new(clock));
    let mut ws = Workspace::new(store, storage, EditorConfig::default(), 3);
    assert!(ws.load_flow().unwrap());

    let doc = ws.store().document();
    assert_eq!(doc.nodes.len(), 2);
    assert!(doc.edges[0].animated, "source is down");
    let press_node = Id::intern("m-1716206400001");
    let packer = Id::intern("m-1716206400002");
    assert_eq!(doc.template_of(press_node), Some(Id::intern("template-press")));
    assert_eq!(doc.template_of(packer), None);
    assert_eq!(doc.node(press_node).unwrap().data.frame_rotation, Some(15.0));
    assert_eq!(doc.node(packer).unwrap().data.capacity, 100.0);
}

#[test]
fn failed_import_keeps_current_flow() {
    let clock = ManualClock::new(0);
    let mut ws = workspace(&clock);
    let before = ws.store().document().clone();
    for bad in [
        "",
        "[]",
        r#"{ "nodes": [] }"#,
        r#"{ "nodes": [], "edges": "none" }"#,
        r#"{ "nodes": [{ "id": 7 }], "edges": [] }"#,
    ] {
        let err = ws.import_flow(bad).unwrap_err();
        assert!(matches!(err, Error::InvalidFormat(_)), "{bad:?} gave {err}");
    }
    assert_eq!(ws.store().document(), &before);
    assert_eq!(ws.store().history().len(), 1);

    ws.import_flow(SAVED_FLOW).unwrap();
    assert_eq!(ws.store().history_description(), "Imported flow");
    assert!(ws.undo());
    assert_eq!(ws.store().document(), &before);
}

#[test]
fn export_then_import_roundtrip() {
    let clock = ManualClock::new(1_716_206_400_000);
    let mut ws = workspace(&clock);
    let added = ws.store_mut().add_node("Cutter", Position::new(1.0, 2.0));
    let json = ws.export_flow().unwrap();

    let mut other = workspace(&clock);
    other.import_flow(&json).unwrap();
    assert_eq!(other.store().document(), ws.store().document());
    assert_eq!(other.store().node(added).unwrap().data.label, "New Cutter");
}
