//! Snapshot-based undo/redo.
//!
//! Every snapshot is a full copy of the document text, numbered from 1.
//! Undo and redo move an explicit index over the numbered snapshots; nothing
//! is ever discarded, so redo after undo replays the same copies.

use crate::error::HistoryError;
use cg_core::Document;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// File name of snapshot `n`.
pub fn snapshot_name(n: u32) -> String {
    format!("canvas-data-undo-{n}.json")
}

/// Inverse of [`snapshot_name`].
fn parse_snapshot_name(name: &str) -> Option<u32> {
    name.strip_prefix("canvas-data-undo-")?
        .strip_suffix(".json")?
        .parse()
        .ok()
}

// ─── Storage ─────────────────────────────────────────────────────────────

/// Where numbered snapshots live.
pub trait SnapshotStore {
    /// Snapshot numbers, ascending.
    fn numbers(&self) -> io::Result<Vec<u32>>;
    fn read(&self, n: u32) -> io::Result<Option<String>>;
    fn write(&mut self, n: u32, text: &str) -> io::Result<()>;
}

/// Snapshots as `canvas-data-undo-<N>.json` files in one directory.
#[derive(Debug, Clone)]
pub struct DirSnapshotStore {
    dir: PathBuf,
}

impl DirSnapshotStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

impl SnapshotStore for DirSnapshotStore {
    fn numbers(&self) -> io::Result<Vec<u32>> {
        let entries = match fs::read_dir(&self.dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e),
        };
        let mut numbers = Vec::new();
        for entry in entries {
            let entry = entry?;
            if let Some(n) = entry.file_name().to_str().and_then(parse_snapshot_name) {
                numbers.push(n);
            }
        }
        numbers.sort_unstable();
        Ok(numbers)
    }

    fn read(&self, n: u32) -> io::Result<Option<String>> {
        match fs::read_to_string(self.dir.join(snapshot_name(n))) {
            Ok(text) => Ok(Some(text)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e),
        }
    }

    fn write(&mut self, n: u32, text: &str) -> io::Result<()> {
        fs::create_dir_all(&self.dir)?;
        fs::write(self.dir.join(snapshot_name(n)), text)
    }
}

/// In-memory store, for sessions without a history directory.
#[derive(Debug, Clone, Default)]
pub struct MemorySnapshotStore {
    snapshots: BTreeMap<u32, String>,
}

impl SnapshotStore for MemorySnapshotStore {
    fn numbers(&self) -> io::Result<Vec<u32>> {
        Ok(self.snapshots.keys().copied().collect())
    }

    fn read(&self, n: u32) -> io::Result<Option<String>> {
        Ok(self.snapshots.get(&n).cloned())
    }

    fn write(&mut self, n: u32, text: &str) -> io::Result<()> {
        self.snapshots.insert(n, text.to_string());
        Ok(())
    }
}

// ─── History ─────────────────────────────────────────────────────────────

/// A snapshot brought back by undo or redo.
#[derive(Debug, Clone)]
pub struct Restored {
    pub index: u32,
    pub can_undo: bool,
    pub can_redo: bool,
    /// The snapshot's document text.
    pub text: String,
}

impl Restored {
    pub fn document(&self) -> Result<Document, HistoryError> {
        Ok(Document::from_json_str(&self.text)?)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryStatus {
    pub history_index: u32,
    pub history_length: usize,
    pub can_undo: bool,
    pub can_redo: bool,
    pub snapshots: Vec<String>,
}

/// Undo/redo position over a [`SnapshotStore`].
pub struct History<S: SnapshotStore> {
    store: S,
    index: u32,
}

impl<S: SnapshotStore> History<S> {
    /// Open a history positioned at the latest existing snapshot.
    pub fn open(store: S) -> Result<Self, HistoryError> {
        let index = store.numbers()?.last().copied().unwrap_or(0);
        Ok(Self { store, index })
    }

    pub fn index(&self) -> u32 {
        self.index
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    fn latest(&self) -> Result<Option<u32>, HistoryError> {
        Ok(self.store.numbers()?.last().copied())
    }

    /// Record `doc` as the next snapshot and move the index onto it.
    pub fn save_snapshot(&mut self, doc: &Document) -> Result<u32, HistoryError> {
        let n = self.latest()?.map_or(1, |max| max + 1);
        self.store.write(n, &doc.to_json_string()?)?;
        self.index = n;
        log::info!("Saved undo snapshot {n}");
        Ok(n)
    }

    pub fn undo(&mut self) -> Result<Restored, HistoryError> {
        if self.latest()?.is_none() {
            return Err(HistoryError::NoUndoHistory);
        }
        let target = self.index.saturating_sub(1).max(1);
        let text = self
            .store
            .read(target)?
            .ok_or(HistoryError::MissingSnapshot(target))?;
        self.index = target;
        log::debug!("undo -> snapshot {target}");
        Ok(Restored {
            index: target,
            can_undo: target > 1,
            can_redo: true,
            text,
        })
    }

    pub fn redo(&mut self) -> Result<Restored, HistoryError> {
        let Some(max) = self.latest()? else {
            return Err(HistoryError::NoRedoHistory);
        };
        if self.index >= max {
            return Err(HistoryError::AlreadyLatest);
        }
        let target = self.index + 1;
        let text = self
            .store
            .read(target)?
            .ok_or(HistoryError::MissingSnapshot(target))?;
        self.index = target;
        log::debug!("redo -> snapshot {target}");
        // A redo always has the snapshot it came from behind it.
        Ok(Restored {
            index: target,
            can_undo: true,
            can_redo: target < max,
            text,
        })
    }

    pub fn status(&self) -> Result<HistoryStatus, HistoryError> {
        let numbers = self.store.numbers()?;
        let max = numbers.last().copied().unwrap_or(0);
        Ok(HistoryStatus {
            history_index: self.index,
            history_length: numbers.len(),
            can_undo: self.index > 1,
            can_redo: self.index < max,
            snapshots: numbers.into_iter().map(snapshot_name).collect(),
        })
    }
}
