//! Layout mutator: applies the operation catalog to a document.
//!
//! Every operation resolves and validates first (lookup, grid parse, kind
//! check) and writes last, so a failed operation leaves the document as it
//! was. Because each node is stored once, every write shows up in both
//! emitted views.

use crate::config::LayoutDefaults;
use crate::error::EditError;
use crate::ops::{
    Delete, MoveToGrid, MoveToPixel, Operation, Resize, SetColor, SetFontSize, SetOpacity,
    SetText, SetTextStyle,
};
use crate::replace::{ImageRequest, Placement, plan_image};
use cg_core::grid::round_half_up;
use cg_core::model::{Color, Fill, NodeKind, Point, Positioned, SceneNode, TextStyles, unit};
use cg_core::{
    Alignment, AxisLock, DeletionRecord, Document, GridCell, LockAxis, NodeId, NodeIndex,
    find_by_id,
};
use chrono::{DateTime, SecondsFormat, Utc};
use serde::Serialize;
use serde_json::Value;
use smallvec::SmallVec;

// ─── Results ─────────────────────────────────────────────────────────────

/// Values computed by a grid move, reported back to the caller.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GridMove {
    pub grid_cell: String,
    /// Where the visual center landed.
    pub pixel_position: Point,
    /// The anchor translation written to the node.
    pub translation: Point,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lock_axis: Option<LockAxis>,
}

/// Operation-specific fields flattened into a [`MutationResult`].
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Derived {
    Move(GridMove),
    Image(ImageRequest),
    Placement(Placement),
}

/// Outcome of one operation.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MutationResult {
    pub success: bool,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub element_id: Option<String>,
    /// Nodes whose stored attributes changed.
    #[serde(skip_serializing_if = "SmallVec::is_empty")]
    pub touched_ids: SmallVec<[NodeId; 2]>,
    #[serde(flatten)]
    pub derived: Option<Derived>,
    #[serde(skip)]
    pub error: Option<EditError>,
}

impl MutationResult {
    pub fn ok(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
            element_id: None,
            touched_ids: SmallVec::new(),
            derived: None,
            error: None,
        }
    }

    pub fn failure(element_id: Option<&str>, error: EditError) -> Self {
        Self {
            success: false,
            message: error.to_string(),
            element_id: element_id.map(str::to_string),
            touched_ids: SmallVec::new(),
            derived: None,
            error: Some(error),
        }
    }

    #[must_use]
    fn touching(mut self, id: NodeId) -> Self {
        self.element_id = Some(id.as_str().to_string());
        self.touched_ids.push(id);
        self
    }

    #[must_use]
    fn with(mut self, derived: Derived) -> Self {
        self.derived = Some(derived);
        self
    }
}

// ─── Mutator ─────────────────────────────────────────────────────────────

/// Applies layout operations to a [`Document`].
#[derive(Debug, Clone, Default)]
pub struct LayoutMutator {
    pub defaults: LayoutDefaults,
}

impl LayoutMutator {
    pub fn new(defaults: LayoutDefaults) -> Self {
        Self { defaults }
    }

    /// Apply one operation. Never fails: errors become `success: false`.
    pub fn apply(&self, doc: &mut Document, op: &Operation) -> MutationResult {
        self.apply_at(doc, op, Utc::now())
    }

    /// Apply one operation with an explicit clock (deletion timestamps).
    pub fn apply_at(&self, doc: &mut Document, op: &Operation, now: DateTime<Utc>) -> MutationResult {
        let outcome = match op {
            Operation::MoveToGrid(a) => self.move_to_grid(doc, a),
            Operation::MoveToPixel(a) => self.move_to_pixel(doc, a),
            Operation::Resize(a) => self.resize(doc, a),
            Operation::SetOpacity(a) => self.set_opacity(doc, a),
            Operation::SetFill(a) => self.set_fill(doc, a),
            Operation::SetText(a) => self.set_text(doc, a),
            Operation::SetTextColor(a) => self.set_text_color(doc, a),
            Operation::SetTextFontSize(a) => self.set_font_size(doc, a),
            Operation::SetTextStyle(a) => self.set_text_style(doc, a),
            Operation::Delete(a) => self.delete(doc, a, now),
            Operation::GenerateImage(a) => {
                plan_image(doc, a, &self.defaults)
                    .map(|request| MutationResult::ok(request.describe()).with(Derived::Image(request)))
            }
        };

        match outcome {
            Ok(result) => {
                log::debug!("{}: {}", op.wire_name(), result.message);
                result
            }
            Err(e) => {
                log::warn!("{} failed: {e}", op.wire_name());
                MutationResult::failure(op.element_id(), e)
            }
        }
    }

    /// Apply a sequence of operations in order, continuing past failures.
    pub fn apply_batch(&self, doc: &mut Document, ops: &[Operation]) -> Vec<MutationResult> {
        let now = Utc::now();
        let results: Vec<MutationResult> = ops.iter().map(|op| self.apply_at(doc, op, now)).collect();
        let failed = results.iter().filter(|r| !r.success).count();
        log::info!("applied {} operations, {failed} failed", results.len());
        results
    }

    /// Decode and apply a tool call. Decoding errors become failed results.
    pub fn apply_call(&self, doc: &mut Document, function: &str, args: Value) -> MutationResult {
        let element_id = args
            .get("elementId")
            .and_then(Value::as_str)
            .map(str::to_string);
        match Operation::from_call(function, args) {
            Ok(op) => self.apply(doc, &op),
            Err(e) => MutationResult::failure(element_id.as_deref(), e),
        }
    }

    // ─── Positional ──────────────────────────────────────────────────────

    fn move_to_grid(&self, doc: &mut Document, a: &MoveToGrid) -> Result<MutationResult, EditError> {
        let idx = resolve(doc, &a.element_id)?;
        let cell: GridCell = a.grid_cell.parse()?;
        let alignment = a
            .alignment
            .as_deref()
            .map(Alignment::from_name)
            .unwrap_or_default();

        let node = doc.graph.node(idx);
        let before = node.translation();
        let lock = a.lock_axis.map(|axis| AxisLock::new(axis, node.center()));
        let target = doc.graph.canvas().locate(cell, alignment, lock);

        let offset = node.bounds_offset();
        let (w, h) = node.visual_size();
        let mut translation = Point::new(
            round_half_up(target.x - offset.x - w / 2.0),
            round_half_up(target.y - offset.y - h / 2.0),
        );
        // The locked axis keeps its pre-edit value exactly.
        match a.lock_axis {
            Some(LockAxis::Horizontal) => translation.x = before.x,
            Some(LockAxis::Vertical) => translation.y = before.y,
            None => {}
        }

        let node = doc.graph.node_mut(idx);
        node.geometry.set_translation(translation);

        let lock_info = a
            .lock_axis
            .map(|axis| format!(" ({axis} locked)"))
            .unwrap_or_default();
        let message = format!(
            "Moved element {} center to grid cell {} ({alignment}){lock_info} -> center at ({}, {})",
            node.id, a.grid_cell, target.x, target.y
        );
        let id = node.id;
        Ok(MutationResult::ok(message).touching(id).with(Derived::Move(GridMove {
            grid_cell: a.grid_cell.clone(),
            pixel_position: target,
            translation,
            lock_axis: a.lock_axis,
        })))
    }

    fn move_to_pixel(&self, doc: &mut Document, a: &MoveToPixel) -> Result<MutationResult, EditError> {
        let idx = resolve(doc, &a.element_id)?;
        let node = doc.graph.node_mut(idx);
        node.geometry.set_translation(Point::new(a.x, a.y));
        let message = format!("Updated position of element {} to ({}, {})", node.id, a.x, a.y);
        Ok(MutationResult::ok(message).touching(node.id))
    }

    fn resize(&self, doc: &mut Document, a: &Resize) -> Result<MutationResult, EditError> {
        let idx = resolve(doc, &a.element_id)?;
        let node = doc.graph.node_mut(idx);
        let g = &mut node.geometry;

        let has_bounds = g.bounds_local.is_some();
        if let Some(b) = &mut g.bounds_local {
            b.width = a.width;
            b.height = a.height;
        }
        // Explicit width/height are updated where declared, or created when
        // the node has no size at all.
        if g.width.is_some() || !has_bounds {
            g.width = Some(a.width);
        }
        if g.height.is_some() || !has_bounds {
            g.height = Some(a.height);
        }

        let message = format!(
            "Updated size of element {} to {}x{}",
            node.id, a.width, a.height
        );
        Ok(MutationResult::ok(message).touching(node.id))
    }

    // ─── Visual ──────────────────────────────────────────────────────────

    fn set_opacity(&self, doc: &mut Document, a: &SetOpacity) -> Result<MutationResult, EditError> {
        let idx = resolve(doc, &a.element_id)?;
        let node = doc.graph.node_mut(idx);
        node.opacity = Some(unit(a.opacity));
        let message = format!("Updated opacity of element {} to {}", node.id, a.opacity);
        Ok(MutationResult::ok(message).touching(node.id))
    }

    fn set_fill(&self, doc: &mut Document, a: &SetColor) -> Result<MutationResult, EditError> {
        let idx = resolve(doc, &a.element_id)?;
        let node = doc.graph.node_mut(idx);
        let color = Color::clamped(a.red, a.green, a.blue, a.alpha);
        node.fill
            .get_or_insert_with(|| Fill::solid(color))
            .color = Some(color);
        let message = format!("Updated fill color of element {}", node.id);
        Ok(MutationResult::ok(message).touching(node.id))
    }

    // ─── Text ────────────────────────────────────────────────────────────

    fn set_text(&self, doc: &mut Document, a: &SetText) -> Result<MutationResult, EditError> {
        let idx = resolve_text(doc, &a.element_id)?;
        let node = doc.graph.node_mut(idx);
        if let NodeKind::Text { content, .. } = &mut node.kind {
            let content = content.get_or_insert_with(Default::default);
            content.text = a.new_text.clone();
            // Hosts that report a length expect it to track the text.
            if content.extra.contains_key("length") {
                content
                    .extra
                    .insert("length".into(), Value::from(a.new_text.chars().count()));
            }
        }

        let head: String = a.new_text.chars().take(50).collect();
        let ellipsis = if a.new_text.chars().count() > 50 { "..." } else { "" };
        let message = format!(
            "Updated text content of element {} to \"{head}{ellipsis}\"",
            node.id
        );
        Ok(MutationResult::ok(message).touching(node.id))
    }

    fn set_text_color(&self, doc: &mut Document, a: &SetColor) -> Result<MutationResult, EditError> {
        let idx = resolve_text(doc, &a.element_id)?;
        let color = Color::clamped(a.red, a.green, a.blue, a.alpha);
        let node = doc.graph.node_mut(idx);
        if let Some(styles) = text_styles(node) {
            styles.color = Some(color);
        }

        let (r, g, b) = color.to_rgb8();
        let message = format!(
            "Updated text color of element {} to rgb({r}, {g}, {b})",
            node.id
        );
        Ok(MutationResult::ok(message).touching(node.id))
    }

    fn set_font_size(&self, doc: &mut Document, a: &SetFontSize) -> Result<MutationResult, EditError> {
        let idx = resolve_text(doc, &a.element_id)?;
        let node = doc.graph.node_mut(idx);
        if let Some(styles) = text_styles(node) {
            styles.font_size = Some(a.font_size);
        }
        let message = format!(
            "Updated font size of element {} to {}pt",
            node.id, a.font_size
        );
        Ok(MutationResult::ok(message).touching(node.id))
    }

    fn set_text_style(&self, doc: &mut Document, a: &SetTextStyle) -> Result<MutationResult, EditError> {
        let idx = resolve_text(doc, &a.element_id)?;
        if a.letter_spacing.is_none() && a.underline.is_none() && a.baseline_shift.is_none() {
            let id = doc.graph.node(idx).id;
            return Err(EditError::NothingToApply(id.as_str().to_string()));
        }

        let node = doc.graph.node_mut(idx);
        let mut changes: Vec<String> = Vec::with_capacity(3);
        if let Some(styles) = text_styles(node) {
            if let Some(v) = a.letter_spacing {
                styles.letter_spacing = Some(v);
                changes.push(format!("letterSpacing: {v}"));
            }
            if let Some(v) = a.underline {
                styles.underline = Some(v);
                changes.push(format!("underline: {v}"));
            }
            if let Some(v) = a.baseline_shift {
                styles.baseline_shift = Some(v);
                changes.push(format!("baselineShift: {}", v.as_str()));
            }
        }

        let message = format!(
            "Updated text style of element {}: {}",
            node.id,
            changes.join(", ")
        );
        Ok(MutationResult::ok(message).touching(node.id))
    }

    // ─── Lifecycle ───────────────────────────────────────────────────────

    fn delete(&self, doc: &mut Document, a: &Delete, now: DateTime<Utc>) -> Result<MutationResult, EditError> {
        let idx = resolve(doc, &a.element_id)?;
        let node = doc.graph.node_mut(idx);
        node.deleted = true;
        if let Some(reason) = &a.reason {
            node.delete_reason = Some(reason.clone());
        }
        let id = node.id;

        doc.deleted.push(DeletionRecord {
            id: id.as_str().to_string(),
            reason: a
                .reason
                .clone()
                .unwrap_or_else(|| self.defaults.delete_reason.clone()),
            deleted_at: now.to_rfc3339_opts(SecondsFormat::Millis, true),
        });

        let reason_info = a
            .reason
            .as_deref()
            .map(|r| format!(" (reason: {r})"))
            .unwrap_or_default();
        Ok(MutationResult::ok(format!("Marked element {id} for deletion{reason_info}")).touching(id))
    }
}

// ─── Helpers ─────────────────────────────────────────────────────────────

fn resolve(doc: &Document, query: &str) -> Result<NodeIndex, EditError> {
    find_by_id(&doc.graph, query).ok_or_else(|| EditError::NotFound(query.to_string()))
}

fn resolve_text(doc: &Document, query: &str) -> Result<NodeIndex, EditError> {
    let idx = resolve(doc, query)?;
    let node = doc.graph.node(idx);
    if node.kind.is_text() {
        Ok(idx)
    } else {
        Err(EditError::TypeMismatch {
            id: node.id.as_str().to_string(),
            tag: node.tag.clone(),
        })
    }
}

/// Text styles of a text node, created on first write.
fn text_styles(node: &mut SceneNode) -> Option<&mut TextStyles> {
    match &mut node.kind {
        NodeKind::Text { styles, .. } => Some(styles.get_or_insert_with(Default::default)),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ops::GenerateImage;
    use cg_core::model::{BaselineShift, SceneGraph};
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn doc() -> Document {
        let mut sg = SceneGraph::new();
        let page = sg.add_node(sg.root, SceneNode::new(NodeId::intern("mu-page"), "Page"));
        let board = sg.add_node(
            page,
            SceneNode::new(NodeId::intern("mu-board"), "ab:Artboard").with_size(4000.0, 4000.0),
        );
        sg.add_node(
            board,
            SceneNode::new(NodeId::intern("mu-text"), "StandaloneTextNode")
                .at(10.0, 10.0)
                .with_bounds(-5.0, -5.0, 50.0, 20.0),
        );
        sg.add_node(
            board,
            SceneNode::new(NodeId::intern("mu-rect"), "Rectangle")
                .at(0.0, 0.0)
                .with_size(100.0, 50.0),
        );
        Document::new(sg)
    }

    fn node<'a>(doc: &'a Document, id: &str) -> &'a SceneNode {
        doc.graph.get_by_id(NodeId::intern(id)).unwrap()
    }

    #[test]
    fn move_to_grid_centers_visual_box() {
        let mut d = doc();
        // 4000 / 20 = 200 → B-2 center is (300, 300).
        let r = LayoutMutator::default().apply(
            &mut d,
            &Operation::MoveToGrid(MoveToGrid {
                element_id: "mu-text".into(),
                grid_cell: "B-2".into(),
                alignment: None,
                lock_axis: None,
            }),
        );
        assert!(r.success, "{}", r.message);
        let t = node(&d, "mu-text").translation();
        assert_eq!(t, Point::new(280.0, 290.0));
        assert_eq!(t.x + -5.0 + 50.0 / 2.0, 300.0);
        assert_eq!(t.y + -5.0 + 20.0 / 2.0, 300.0);
        assert!(matches!(r.derived, Some(Derived::Move(GridMove { pixel_position, .. })) if pixel_position == Point::new(300.0, 300.0)));
    }

    #[test]
    fn bad_grid_cell_writes_nothing() {
        let mut d = doc();
        let before = node(&d, "mu-rect").clone();
        let r = LayoutMutator::default().apply(
            &mut d,
            &Operation::MoveToGrid(MoveToGrid {
                element_id: "mu-rect".into(),
                grid_cell: "Z-5".into(),
                alignment: None,
                lock_axis: None,
            }),
        );
        assert!(!r.success);
        assert!(r.message.starts_with("Error converting grid cell: Invalid grid ID format"));
        assert_eq!(node(&d, "mu-rect"), &before);
    }

    #[test]
    fn opacity_clamps_and_is_idempotent() {
        let mut d = doc();
        let m = LayoutMutator::default();
        let op = Operation::SetOpacity(SetOpacity {
            element_id: "mu-rect".into(),
            opacity: 1.7,
        });
        m.apply(&mut d, &op);
        let once = d.to_value();
        m.apply(&mut d, &op);
        assert_eq!(d.to_value(), once);
        assert_eq!(node(&d, "mu-rect").opacity, Some(1.0));
    }

    #[test]
    fn fill_created_when_missing() {
        let mut d = doc();
        LayoutMutator::default().apply(
            &mut d,
            &Operation::SetFill(SetColor {
                element_id: "mu-rect".into(),
                red: 2.0,
                green: 0.5,
                blue: -1.0,
                alpha: None,
            }),
        );
        let fill = node(&d, "mu-rect").fill.clone().unwrap();
        assert_eq!(fill.kind.as_deref(), Some("Color"));
        assert_eq!(fill.color, Some(Color::rgba(1.0, 0.5, 0.0, 1.0)));
    }

    #[test]
    fn resize_touches_declared_fields() {
        let mut d = doc();
        let m = LayoutMutator::default();
        m.apply(
            &mut d,
            &Operation::Resize(Resize {
                element_id: "mu-text".into(),
                width: 80.0,
                height: 30.0,
            }),
        );
        let g = &node(&d, "mu-text").geometry;
        assert_eq!(g.bounds_local.map(|b| (b.width, b.height)), Some((80.0, 30.0)));
        assert_eq!((g.width, g.height), (None, None));
    }

    #[test]
    fn text_ops_reject_non_text() {
        let mut d = doc();
        let r = LayoutMutator::default().apply(
            &mut d,
            &Operation::SetText(SetText {
                element_id: "mu-rect".into(),
                new_text: "nope".into(),
            }),
        );
        assert!(!r.success);
        assert_eq!(r.message, "Element mu-rect is not a Text element (type: Rectangle)");
        assert!(matches!(r.error, Some(EditError::TypeMismatch { .. })));
    }

    #[test]
    fn text_style_needs_a_field() {
        let mut d = doc();
        let m = LayoutMutator::default();
        let r = m.apply(
            &mut d,
            &Operation::SetTextStyle(SetTextStyle {
                element_id: "mu-text".into(),
                letter_spacing: None,
                underline: None,
                baseline_shift: None,
            }),
        );
        assert!(!r.success);
        assert_eq!(r.error, Some(EditError::NothingToApply("mu-text".into())));
        assert!(matches!(
            node(&d, "mu-text").kind,
            NodeKind::Text { styles: None, .. }
        ));

        let r = m.apply(
            &mut d,
            &Operation::SetTextStyle(SetTextStyle {
                element_id: "mu-text".into(),
                letter_spacing: Some(2.0),
                underline: None,
                baseline_shift: Some(BaselineShift::Superscript),
            }),
        );
        assert_eq!(
            r.message,
            "Updated text style of element mu-text: letterSpacing: 2, baselineShift: superscript"
        );
    }

    #[test]
    fn delete_is_soft_and_audited() {
        let mut d = doc();
        let now = DateTime::from_timestamp_millis(1_735_689_600_000).unwrap();
        let r = LayoutMutator::default().apply_at(
            &mut d,
            &Operation::Delete(Delete {
                element_id: "mu-rect".into(),
                reason: None,
            }),
            now,
        );
        assert_eq!(r.message, "Marked element mu-rect for deletion");
        assert!(node(&d, "mu-rect").deleted);
        assert_eq!(
            d.deleted,
            vec![DeletionRecord {
                id: "mu-rect".into(),
                reason: "No reason provided".into(),
                deleted_at: "2025-01-01T00:00:00.000Z".into(),
            }]
        );
    }

    #[test]
    fn result_wire_shape() {
        let mut d = doc();
        let r = LayoutMutator::default().apply(
            &mut d,
            &Operation::GenerateImage(GenerateImage {
                prompt: "a red balloon".into(),
                ..Default::default()
            }),
        );
        let v = serde_json::to_value(&r).unwrap();
        assert_eq!(v["success"], json!(true));
        assert_eq!(v["isAsyncImageGeneration"], json!(true));
        assert_eq!(v["isReplacement"], json!(false));
        assert_eq!(v["gridCell"], json!("J-10"));
        assert_eq!(v["width"], json!(300.0));
        assert_eq!(v["removeBackground"], json!(true));
        assert!(v.get("touchedIds").is_none());
        assert!(v.get("error").is_none());
    }

    #[test]
    fn unknown_call_is_a_failed_result() {
        let mut d = doc();
        let r = LayoutMutator::default().apply_call(&mut d, "spin_element", json!({"elementId": "mu-rect"}));
        assert!(!r.success);
        assert_eq!(r.message, "Unknown function: spin_element");
        assert_eq!(r.element_id.as_deref(), Some("mu-rect"));
    }
}
