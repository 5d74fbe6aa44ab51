//! Integration tests: snapshot history on a real directory.

use cg_core::{Document, NodeId};
use cg_editor::history::snapshot_name;
use cg_editor::{DirSnapshotStore, History, HistoryError, LayoutMutator};
use pretty_assertions::assert_eq;
use serde_json::json;

fn fixture() -> Document {
    Document::from_json_str(include_str!("fixtures/layout.json")).expect("fixture failed to load")
}

fn opacity_of(doc: &Document, id: &str) -> Option<f64> {
    doc.graph.get_by_id(NodeId::intern(id)).and_then(|n| n.opacity)
}

#[test]
fn undo_restores_earlier_snapshot() {
    let dir = tempfile::tempdir().unwrap();
    let mut history = History::open(DirSnapshotStore::new(dir.path())).unwrap();
    let mutator = LayoutMutator::default();
    let mut doc = fixture();

    assert_eq!(history.save_snapshot(&doc).unwrap(), 1);
    mutator.apply_call(
        &mut doc,
        "update_element_opacity",
        json!({"elementId": "r2000001", "opacity": 0.25}),
    );
    assert_eq!(history.save_snapshot(&doc).unwrap(), 2);

    let restored = history.undo().unwrap();
    assert_eq!(restored.index, 1);
    assert!(!restored.can_undo);
    assert!(restored.can_redo);
    assert_eq!(opacity_of(&restored.document().unwrap(), "r2000001-button"), None);

    let redone = history.redo().unwrap().document().unwrap();
    assert_eq!(opacity_of(&redone, "r2000001-button"), Some(0.25));
}

#[test]
fn status_lists_snapshots_in_numeric_order() {
    let dir = tempfile::tempdir().unwrap();
    let mut history = History::open(DirSnapshotStore::new(dir.path())).unwrap();
    let doc = fixture();
    for _ in 0..10 {
        history.save_snapshot(&doc).unwrap();
    }
    std::fs::write(dir.path().join("canvas-data.json"), "{}").unwrap();

    let status = history.status().unwrap();
    assert_eq!(status.history_index, 10);
    assert_eq!(status.history_length, 10);
    assert!(status.can_undo);
    assert!(!status.can_redo);
    assert_eq!(status.snapshots.first().map(String::as_str), Some("canvas-data-undo-1.json"));
    assert_eq!(status.snapshots.last().map(String::as_str), Some("canvas-data-undo-10.json"));

    let wire = serde_json::to_value(&status).unwrap();
    assert_eq!(wire["historyIndex"], json!(10));
    assert_eq!(wire["canRedo"], json!(false));
}

#[test]
fn reopened_history_starts_at_latest() {
    let dir = tempfile::tempdir().unwrap();
    {
        let mut history = History::open(DirSnapshotStore::new(dir.path())).unwrap();
        history.save_snapshot(&fixture()).unwrap();
        history.save_snapshot(&fixture()).unwrap();
    }
    let mut history = History::open(DirSnapshotStore::new(dir.path())).unwrap();
    assert_eq!(history.index(), 2);
    assert!(matches!(history.redo(), Err(HistoryError::AlreadyLatest)));
    assert_eq!(history.undo().unwrap().index, 1);
}

#[test]
fn missing_snapshot_is_reported() {
    let dir = tempfile::tempdir().unwrap();
    let mut history = History::open(DirSnapshotStore::new(dir.path())).unwrap();
    history.save_snapshot(&fixture()).unwrap();
    history.save_snapshot(&fixture()).unwrap();
    std::fs::remove_file(dir.path().join(snapshot_name(1))).unwrap();

    let err = history.undo().unwrap_err();
    assert_eq!(err.to_string(), "Snapshot canvas-data-undo-1.json not found");
    // A failed undo does not move the index.
    assert_eq!(history.index(), 2);
}

#[test]
fn missing_directory_is_empty_history() {
    let dir = tempfile::tempdir().unwrap();
    let history = History::open(DirSnapshotStore::new(dir.path().join("nope"))).unwrap();
    assert_eq!(history.index(), 0);
    assert_eq!(history.status().unwrap().history_length, 0);
}
