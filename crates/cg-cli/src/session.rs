//! An editing session: one document, its snapshot history, and the command
//! loop's side effects. Edits stay in memory until `save`.

use crate::command::Command;
use anyhow::{Context, Result};
use cg_core::grid::{GRID_COLS, GRID_ROWS};
use cg_core::model::{KindClass, Positioned};
use cg_core::{Document, NodeIndex, find_by_grid_cell, find_by_id};
use cg_editor::{
    DirSnapshotStore, History, LayoutDefaults, LayoutMutator, MutationResult, Operation,
};
use serde_json::Value;
use std::fmt::Write as _;
use std::path::{Path, PathBuf};

/// Whether the command loop keeps going.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Exit,
}

pub struct Session {
    path: PathBuf,
    doc: Document,
    mutator: LayoutMutator,
    history: History<DirSnapshotStore>,
}

impl Session {
    /// Load `path` and open the snapshot history in `history_dir` (default:
    /// the document's directory).
    pub fn open(path: &Path, history_dir: Option<&Path>, defaults: LayoutDefaults) -> Result<Self> {
        let doc = Document::load(path)
            .with_context(|| format!("could not load {}; make sure the file exists", path.display()))?;
        let dir = match history_dir {
            Some(dir) => dir.to_path_buf(),
            None => path
                .parent()
                .map(Path::to_path_buf)
                .unwrap_or_else(|| PathBuf::from(".")),
        };
        let history = History::open(DirSnapshotStore::new(dir))?;
        log::info!("loaded {} with {} elements", path.display(), doc.graph.len());
        Ok(Self {
            path: path.to_path_buf(),
            doc,
            mutator: LayoutMutator::new(defaults),
            history,
        })
    }

    pub fn document(&self) -> &Document {
        &self.doc
    }

    /// Parse and run one input line, returning the text to show.
    pub fn run_line(&mut self, line: &str) -> Result<(Flow, String)> {
        match line.parse::<Command>() {
            Ok(cmd) => self.execute(cmd),
            Err(e) => Ok((Flow::Continue, e.to_string())),
        }
    }

    pub fn execute(&mut self, cmd: Command) -> Result<(Flow, String)> {
        let out = match cmd {
            Command::Empty => String::new(),
            Command::Help => HELP.to_string(),
            Command::Grid => self.grid_reference(),
            Command::List => self.list(),
            Command::Find(cell) => self.find(&cell),
            Command::Info(id) => self.info(&id)?,
            Command::Edit(op) => {
                let result = self.mutator.apply(&mut self.doc, &op);
                report(&result)
            }
            Command::Apply(json) => self.apply_json(&json)?,
            Command::Snapshot => {
                let n = self.history.save_snapshot(&self.doc)?;
                format!("Saved undo snapshot {n}")
            }
            Command::Undo => {
                let restored = self.history.undo()?;
                self.doc = restored.document()?;
                format!(
                    "Restored snapshot {} (canUndo: {}, canRedo: {})",
                    restored.index, restored.can_undo, restored.can_redo
                )
            }
            Command::Redo => {
                let restored = self.history.redo()?;
                self.doc = restored.document()?;
                format!(
                    "Restored snapshot {} (canUndo: {}, canRedo: {})",
                    restored.index, restored.can_undo, restored.can_redo
                )
            }
            Command::History => serde_json::to_string_pretty(&self.history.status()?)?,
            Command::Save => {
                self.doc.save(&self.path)?;
                format!("Saved {} elements to {}", self.doc.graph.len(), self.path.display())
            }
            Command::Reload => {
                self.doc = Document::load(&self.path)?;
                "Reloaded canvas data from file".to_string()
            }
            Command::Exit => return Ok((Flow::Exit, "Goodbye!".to_string())),
        };
        Ok((Flow::Continue, out))
    }

    // ─── Views ───────────────────────────────────────────────────────────

    fn list(&self) -> String {
        let graph = &self.doc.graph;
        let canvas = graph.canvas();
        let mut out = String::new();
        let _ = writeln!(
            out,
            " #  {:<18} {:<6} {:<14} {:<12} ID",
            "Type", "Grid", "Position", "Size"
        );

        let mut count = 0;
        for idx in listed(graph) {
            let node = graph.node(idx);
            count += 1;
            let pos = node.screen_position();
            let (w, h) = node.visual_size();
            let center = node.center();
            let cell = canvas.cell_at(center.x, center.y);
            let tag: String = node.tag.chars().take(18).collect();
            let _ = writeln!(
                out,
                "{count:>2}  {tag:<18} {:<6} {:<14} {:<12} {}{}",
                cell.to_string(),
                format!("{},{}", pos.x.round(), pos.y.round()),
                format!("{}x{}", w.round(), h.round()),
                node.id.short(15),
                if node.deleted { " (deleted)" } else { "" },
            );
            if let Some(text) = node.text() {
                let preview: String = text.chars().take(20).collect();
                let more = if text.chars().count() > 20 { "..." } else { "" };
                let _ = writeln!(out, "    \"{preview}{more}\"");
            }
        }

        let _ = write!(
            out,
            "Total: {count} elements | Canvas: {}x{}px | Grid: {GRID_COLS}x{GRID_ROWS}",
            canvas.width, canvas.height
        );
        out
    }

    fn grid_reference(&self) -> String {
        let canvas = self.doc.graph.canvas();
        format!(
            "{GRID}\nCanvas {}x{}px, cells {}x{}px",
            canvas.width,
            canvas.height,
            canvas.cell_width(),
            canvas.cell_height()
        )
    }

    fn find(&self, cell: &str) -> String {
        let graph = &self.doc.graph;
        let hits = find_by_grid_cell(graph, cell, graph.canvas());
        if hits.is_empty() {
            return format!("No elements found at grid position {cell}");
        }
        let mut out = format!("Found {} element(s) at {cell}:", hits.len());
        for idx in hits {
            let node = graph.node(idx);
            let _ = write!(out, "\n  - {}: {}", node.tag, node.id);
            if let Some(text) = node.text() {
                let preview: String = text.chars().take(40).collect();
                let _ = write!(out, "\n    Text: \"{preview}\"");
            }
        }
        out
    }

    fn info(&self, query: &str) -> Result<String> {
        let Some(idx) = find_by_id(&self.doc.graph, query) else {
            return Ok(format!("Element not found: {query}"));
        };
        let graph = &self.doc.graph;
        let node = graph.node(idx);
        let center = node.center();
        let cell = graph.canvas().cell_at(center.x, center.y);

        let emitted = self.doc.to_value();
        let entry = emitted["allElements"]
            .as_array()
            .and_then(|all| {
                all.iter()
                    .find(|e| e["id"].as_str() == Some(node.id.as_str()))
            })
            .cloned()
            .unwrap_or(Value::Null);

        let (w, h) = node.visual_size();
        let pos = node.screen_position();
        Ok(format!(
            "{} ({})\nGrid: {cell}  Position: {},{}  Size: {}x{}  Center: {},{}\n{}",
            node.id,
            node.tag,
            pos.x,
            pos.y,
            w,
            h,
            center.x,
            center.y,
            serde_json::to_string_pretty(&entry)?
        ))
    }

    // ─── Wire operations ─────────────────────────────────────────────────

    fn apply_json(&mut self, json: &str) -> Result<String> {
        let value: Value = serde_json::from_str(json).context("apply expects JSON")?;
        let calls = match value {
            Value::Array(items) => items,
            single => vec![single],
        };

        let mut lines = Vec::with_capacity(calls.len());
        for call in calls {
            let result = match Operation::from_wire(call) {
                Ok(op) => self.mutator.apply(&mut self.doc, &op),
                Err(e) => MutationResult::failure(None, e),
            };
            lines.push(serde_json::to_string(&result)?);
        }
        Ok(lines.join("\n"))
    }
}

/// Nodes shown by `list`: positioned, non-container, in document order.
fn listed(graph: &cg_core::SceneGraph) -> impl Iterator<Item = NodeIndex> + '_ {
    graph.preorder().into_iter().filter(move |&idx| {
        let node = graph.node(idx);
        node.geometry.translation.is_some()
            && !matches!(
                KindClass::of_tag(&node.tag),
                KindClass::Page | KindClass::Artboard
            )
    })
}

fn report(result: &MutationResult) -> String {
    if result.success {
        format!("{}\n  Use \"save\" to persist changes", result.message)
    } else {
        format!("Failed: {}", result.message)
    }
}

const HELP: &str = "\
Commands:
  list | ls                  List elements with grid positions
  grid                       Show the grid reference
  find <grid-id>             Find elements at a grid cell (e.g. C-5)
  info <element-id>          Show details for an element
  move <id> <grid-id> [alignment] [--lock-h|--lock-v]
                             Center an element on a grid cell
  movepx <id> <x> <y>        Move an element to pixel coordinates
  resize <id> <w> <h>        Resize an element
  opacity <id> <0-1>         Set element opacity
  fill <id> <r> <g> <b> [a]  Set fill color (channels 0-1)
  text <id> <text>           Replace a text element's content
  delete <id> [reason]       Mark an element for deletion
  apply <json>               Apply wire operations ({\"function\", \"args\"})
  snapshot                   Save an undo snapshot
  undo | redo                Step through snapshots
  history                    Show snapshot status
  save                       Write changes to the document
  reload                     Discard changes and reload
  help | ?                   Show this help
  exit | quit | q            Leave";

const GRID: &str = "\
Grid: 20x20
  Columns: A B C D E F G H I J K L M N O P Q R S T  (left to right)
  Rows:    1 to 20  (top to bottom)
  A-1 is the top-left cell; a bare id means the cell center.
  Sub-positions: -TL -TR -BL -BR (corners), -TC -BC -LC -RC (edge centers), -C
  Axis lock: --lock-h keeps x (vertical move), --lock-v keeps y (horizontal move)";

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const CANVAS: &str = r#"{
      "pages": [{
        "id": "p1", "type": "Page",
        "artboards": [{
          "id": "ab1", "type": "ab:Artboard", "width": 2000, "height": 2000,
          "children": [
            {"id": "b6658a97-title", "type": "StandaloneTextNode",
             "translation": {"x": 205, "y": 415},
             "boundsLocal": {"x": -5, "y": -5, "width": 50, "height": 20},
             "textContent": {"text": "Summer Sale"}},
            {"id": "c0ffee01-rect", "type": "Rectangle",
             "translation": {"x": 1000, "y": 1000}, "width": 200, "height": 100}
          ]
        }]
      }],
      "allElements": []
    }"#;

    fn session() -> (tempfile::TempDir, Session) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("canvas-data.json");
        std::fs::write(&path, CANVAS).unwrap();
        let session = Session::open(&path, None, LayoutDefaults::default()).unwrap();
        (dir, session)
    }

    fn run(s: &mut Session, line: &str) -> String {
        s.run_line(line).unwrap().1
    }

    #[test]
    fn list_shows_visible_cells() {
        let (_dir, mut s) = session();
        let out = run(&mut s, "ls");
        assert!(out.contains("C-5"), "{out}");
        assert!(out.contains("L-11"), "{out}");
        assert!(out.contains("\"Summer Sale\""), "{out}");
        assert!(out.ends_with("Total: 2 elements | Canvas: 2000x2000px | Grid: 20x20"), "{out}");
    }

    #[test]
    fn move_then_find() {
        let (_dir, mut s) = session();
        let out = run(&mut s, "move c0ffee01 b-2");
        assert!(out.starts_with("Moved element c0ffee01-rect center to grid cell B-2"), "{out}");
        assert_eq!(
            run(&mut s, "find B-2"),
            "Found 1 element(s) at B-2:\n  - Rectangle: c0ffee01-rect"
        );
        assert_eq!(run(&mut s, "find L-11"), "No elements found at grid position L-11");
    }

    #[test]
    fn failures_are_reported_not_raised() {
        let (_dir, mut s) = session();
        assert_eq!(run(&mut s, "opacity nope 0.5"), "Failed: Element with ID nope not found");
        assert_eq!(run(&mut s, "info nope"), "Element not found: nope");
        assert!(run(&mut s, "move c0ffee01 Z-9").starts_with("Failed: Error converting grid cell"));
    }

    #[test]
    fn apply_accepts_batches() {
        let (_dir, mut s) = session();
        let out = run(
            &mut s,
            r#"apply [{"function": "update_element_opacity", "args": {"elementId": "c0ffee01", "opacity": 0.5}}, {"function": "spin", "args": {}}]"#,
        );
        let lines: Vec<Value> = out.lines().map(|l| serde_json::from_str(l).unwrap()).collect();
        assert_eq!(lines[0]["success"], Value::Bool(true));
        assert_eq!(lines[1]["message"], Value::from("Unknown function: spin"));
    }

    #[test]
    fn snapshot_undo_redo_and_save() {
        let (dir, mut s) = session();
        assert_eq!(run(&mut s, "snapshot"), "Saved undo snapshot 1");
        run(&mut s, "movepx c0ffee01 10 20");
        assert_eq!(run(&mut s, "snapshot"), "Saved undo snapshot 2");

        assert_eq!(run(&mut s, "undo"), "Restored snapshot 1 (canUndo: false, canRedo: true)");
        let rect = find_by_id(&s.document().graph, "c0ffee01").unwrap();
        assert_eq!(s.document().graph.node(rect).translation().x, 1000.0);

        assert_eq!(run(&mut s, "redo"), "Restored snapshot 2 (canUndo: true, canRedo: false)");
        assert!(s.run_line("redo").is_err());

        run(&mut s, "save");
        let saved = Document::load(&dir.path().join("canvas-data.json")).unwrap();
        let rect = find_by_id(&saved.graph, "c0ffee01").unwrap();
        assert_eq!(saved.graph.node(rect).translation().x, 10.0);
    }

    #[test]
    fn exit_ends_the_loop() {
        let (_dir, mut s) = session();
        assert_eq!(s.run_line("quit").unwrap().0, Flow::Exit);
    }
}
