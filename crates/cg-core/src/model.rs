//! Core scene-graph data model for canvas documents.
//!
//! The host document is a tree: document root → pages → artboards → nodes
//! (groups nest further). Persisted documents store it twice, as a flat list
//! and as a nested tree. Here it is stored once, in an arena keyed by
//! [`NodeId`]; both persisted shapes are views produced on demand by
//! [`crate::document`].

use crate::grid::GridSpec;
use crate::id::NodeId;
use petgraph::graph::NodeIndex;
use petgraph::stable_graph::StableDiGraph;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::HashMap;

/// Canvas size used when the first artboard does not declare one.
pub const DEFAULT_CANVAS_WIDTH: f64 = 2550.0;
pub const DEFAULT_CANVAS_HEIGHT: f64 = 3300.0;

/// Size assumed for nodes that carry neither bounds nor width/height.
pub const DEFAULT_NODE_WIDTH: f64 = 100.0;
pub const DEFAULT_NODE_HEIGHT: f64 = 50.0;

/// Id of the synthetic arena root. Never emitted.
pub const ROOT_ID: &str = "__document_root__";

// ─── Geometry primitives ─────────────────────────────────────────────────

/// A 2D point in canvas pixels.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    #[serde(default)]
    pub x: f64,
    #[serde(default)]
    pub y: f64,
}

impl Point {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn distance(&self, other: Point) -> f64 {
        (self.x - other.x).hypot(self.y - other.y)
    }
}

/// Local bounding box. `x`/`y` are the offset of the visible box from the
/// node's anchor and may be negative (text glyph boxes).
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Bounds {
    #[serde(default)]
    pub x: f64,
    #[serde(default)]
    pub y: f64,
    #[serde(default)]
    pub width: f64,
    #[serde(default)]
    pub height: f64,
}

/// JS-style truthiness for optional numbers: absent, zero and NaN are all
/// treated as "not provided".
pub fn provided(v: Option<f64>) -> Option<f64> {
    v.filter(|v| *v != 0.0 && !v.is_nan())
}

// ─── Colors & paint ──────────────────────────────────────────────────────

fn one() -> f64 {
    1.0
}

/// RGBA color, each channel in [0, 1].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Color {
    #[serde(default)]
    pub red: f64,
    #[serde(default)]
    pub green: f64,
    #[serde(default)]
    pub blue: f64,
    #[serde(default = "one")]
    pub alpha: f64,
}

impl Color {
    pub const fn rgba(red: f64, green: f64, blue: f64, alpha: f64) -> Self {
        Self {
            red,
            green,
            blue,
            alpha,
        }
    }

    /// Build a color with every channel clamped to [0, 1]. Alpha defaults to 1.
    pub fn clamped(red: f64, green: f64, blue: f64, alpha: Option<f64>) -> Self {
        Self::rgba(
            unit(red),
            unit(green),
            unit(blue),
            alpha.map_or(1.0, unit),
        )
    }

    /// 0–255 components, for messages.
    pub fn to_rgb8(&self) -> (u8, u8, u8) {
        let c = |v: f64| (unit(v) * 255.0).round() as u8;
        (c(self.red), c(self.green), c(self.blue))
    }
}

/// Clamp to [0, 1]. NaN collapses to 0.
pub fn unit(v: f64) -> f64 {
    if v.is_nan() { 0.0 } else { v.clamp(0.0, 1.0) }
}

/// Node fill. Only the solid color is interpreted; the rest is carried.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Fill {
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<Color>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Fill {
    pub fn solid(color: Color) -> Self {
        Self {
            kind: Some("Color".into()),
            color: Some(color),
            extra: Map::new(),
        }
    }
}

// ─── Text ────────────────────────────────────────────────────────────────

/// Text content of a text node.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct TextContent {
    #[serde(default)]
    pub text: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Baseline shift for super/subscript.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BaselineShift {
    Superscript,
    Subscript,
    Normal,
}

impl BaselineShift {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Superscript => "superscript",
            Self::Subscript => "subscript",
            Self::Normal => "normal",
        }
    }
}

/// Whole-node character styling applied by text operations.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TextStyles {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<Color>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub font_size: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub letter_spacing: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub underline: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub baseline_shift: Option<BaselineShift>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

// ─── Pending images ──────────────────────────────────────────────────────

/// Marker carried by a generated image that the host has not inserted yet.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PendingImage {
    /// `data:image/png;base64,...`
    pub data_url: Option<String>,
    pub path: Option<String>,
    pub prompt: Option<String>,
    pub is_replacement: Option<bool>,
    pub replaced_element_id: Option<String>,
}

// ─── Node kinds ──────────────────────────────────────────────────────────

/// The node kinds of a canvas document.
///
/// The host's `type` string is kept verbatim on [`SceneNode::tag`]; the kind
/// is the interpreted variant and carries the data only that variant has.
#[derive(Debug, Clone, PartialEq)]
pub enum NodeKind {
    /// Synthetic arena root (the host document root).
    Root,
    Page,
    Artboard,
    Text {
        content: Option<TextContent>,
        styles: Option<TextStyles>,
    },
    /// Rectangle, ellipse, line, path, polygon.
    Shape,
    /// Media container / image rectangle.
    Media { pending: Option<PendingImage> },
    Group,
    /// Any other host type.
    Other,
}

/// Broad classification of a host `type` tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KindClass {
    Page,
    Artboard,
    Text,
    Shape,
    Media,
    Group,
    Other,
}

impl KindClass {
    pub fn of_tag(tag: &str) -> Self {
        match tag {
            "Page" => Self::Page,
            "ab:Artboard" | "Artboard" => Self::Artboard,
            "Text" | "TextNode" | "StandaloneTextNode" | "ThreadedTextNode" => Self::Text,
            "Rectangle" | "Ellipse" | "Line" | "Path" | "Polygon" => Self::Shape,
            "MediaContainer" | "ImageRectangle" | "Image" => Self::Media,
            "Group" => Self::Group,
            _ => Self::Other,
        }
    }
}

impl NodeKind {
    /// Empty kind value for a host tag.
    pub fn for_tag(tag: &str) -> Self {
        match KindClass::of_tag(tag) {
            KindClass::Page => Self::Page,
            KindClass::Artboard => Self::Artboard,
            KindClass::Text => Self::Text {
                content: None,
                styles: None,
            },
            KindClass::Shape => Self::Shape,
            KindClass::Media => Self::Media { pending: None },
            KindClass::Group => Self::Group,
            KindClass::Other => Self::Other,
        }
    }

    pub fn is_text(&self) -> bool {
        matches!(self, Self::Text { .. })
    }

    /// Pages, artboards and the root: structure, not content.
    pub fn is_container(&self) -> bool {
        matches!(self, Self::Root | Self::Page | Self::Artboard)
    }
}

// ─── Positional interface ────────────────────────────────────────────────

/// Placement fields shared by every node kind.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Geometry {
    /// Anchor offset in parent space.
    pub translation: Option<Point>,
    pub bounds_local: Option<Bounds>,
    /// Fallback size for nodes without local bounds.
    pub width: Option<f64>,
    pub height: Option<f64>,
    pub rotation: Option<f64>,
    /// Host affine matrix; entries 4 and 5 mirror the translation.
    pub transform_matrix: Option<Value>,
}

impl Geometry {
    /// Set the translation and keep the transform matrix in step.
    pub fn set_translation(&mut self, p: Point) {
        self.translation = Some(p);
        match &mut self.transform_matrix {
            Some(Value::Object(m)) => {
                m.insert("4".into(), number(p.x));
                m.insert("5".into(), number(p.y));
            }
            Some(Value::Array(a)) if a.len() >= 6 => {
                a[4] = number(p.x);
                a[5] = number(p.y);
            }
            _ => {}
        }
    }
}

/// Encode an f64 as a JSON number, preferring integers for whole values.
pub fn number(v: f64) -> Value {
    if v.fract() == 0.0 && v.abs() < 9.0e15 {
        Value::from(v as i64)
    } else {
        serde_json::Number::from_f64(v).map_or(Value::Null, Value::Number)
    }
}

/// Shared positional interface implemented by everything that has geometry.
pub trait Positioned {
    fn geometry(&self) -> &Geometry;

    /// Anchor translation (origin when absent).
    fn translation(&self) -> Point {
        self.geometry().translation.unwrap_or_default()
    }

    /// Offset of the visible box from the anchor.
    fn bounds_offset(&self) -> Point {
        self.geometry()
            .bounds_local
            .map(|b| Point::new(b.x, b.y))
            .unwrap_or_default()
    }

    /// Visible size: local bounds, then width/height, then `fallback`.
    fn size_or(&self, fallback: (f64, f64)) -> (f64, f64) {
        let g = self.geometry();
        let w = provided(g.bounds_local.map(|b| b.width))
            .or(provided(g.width))
            .unwrap_or(fallback.0);
        let h = provided(g.bounds_local.map(|b| b.height))
            .or(provided(g.height))
            .unwrap_or(fallback.1);
        (w, h)
    }

    /// Visible size with the 100×50 default.
    fn visual_size(&self) -> (f64, f64) {
        self.size_or((DEFAULT_NODE_WIDTH, DEFAULT_NODE_HEIGHT))
    }

    /// Visible top-left corner in parent space.
    fn screen_position(&self) -> Point {
        let t = self.translation();
        let o = self.bounds_offset();
        Point::new(t.x + o.x, t.y + o.y)
    }

    /// Visual center in parent space.
    fn center(&self) -> Point {
        let p = self.screen_position();
        let (w, h) = self.visual_size();
        Point::new(p.x + w / 2.0, p.y + h / 2.0)
    }
}

impl Positioned for Geometry {
    fn geometry(&self) -> &Geometry {
        self
    }
}

// ─── Scene nodes ─────────────────────────────────────────────────────────

/// A single element of the canvas document.
#[derive(Debug, Clone, PartialEq)]
pub struct SceneNode {
    pub id: NodeId,
    /// Host `type` tag, kept verbatim.
    pub tag: String,
    pub kind: NodeKind,
    pub name: Option<String>,
    pub geometry: Geometry,
    pub opacity: Option<f64>,
    pub fill: Option<Fill>,
    pub locked: Option<bool>,

    /// Soft-delete marker; the host sync step removes the node later.
    pub deleted: bool,
    pub delete_reason: Option<String>,
    pub replaced_by: Option<NodeId>,

    /// `parentId` as it arrived, used when the parent is outside the arena
    /// (pages point at the host document root).
    pub parent_hint: Option<String>,

    /// Host properties this crate does not interpret, carried verbatim.
    pub extra: Map<String, Value>,
}

impl SceneNode {
    pub fn new(id: NodeId, tag: &str) -> Self {
        Self {
            id,
            tag: tag.to_string(),
            kind: NodeKind::for_tag(tag),
            name: None,
            geometry: Geometry::default(),
            opacity: None,
            fill: None,
            locked: None,
            deleted: false,
            delete_reason: None,
            replaced_by: None,
            parent_hint: None,
            extra: Map::new(),
        }
    }

    /// Builder-style translation setter.
    #[must_use]
    pub fn at(mut self, x: f64, y: f64) -> Self {
        self.geometry.translation = Some(Point::new(x, y));
        self
    }

    /// Builder-style local bounds setter.
    #[must_use]
    pub fn with_bounds(mut self, x: f64, y: f64, width: f64, height: f64) -> Self {
        self.geometry.bounds_local = Some(Bounds {
            x,
            y,
            width,
            height,
        });
        self
    }

    /// Builder-style width/height setter.
    #[must_use]
    pub fn with_size(mut self, width: f64, height: f64) -> Self {
        self.geometry.width = Some(width);
        self.geometry.height = Some(height);
        self
    }

    /// Text of a text node.
    pub fn text(&self) -> Option<&str> {
        match &self.kind {
            NodeKind::Text {
                content: Some(c), ..
            } => Some(c.text.as_str()),
            _ => None,
        }
    }

    /// True for generated images the host has not inserted yet.
    pub fn is_pending_image(&self) -> bool {
        matches!(
            self.kind,
            NodeKind::Media {
                pending: Some(_)
            }
        ) || self.extra.get("_newImage") == Some(&Value::Bool(true))
    }
}

impl Positioned for SceneNode {
    fn geometry(&self) -> &Geometry {
        &self.geometry
    }
}

// ─── Scene graph arena ───────────────────────────────────────────────────

/// The single node store of a canvas document.
///
/// Edges go parent → child. Children keep insertion order. Every node is
/// reachable through `id_index`, so an edit addressed by id touches the one
/// and only copy of the node.
#[derive(Debug, Clone)]
pub struct SceneGraph {
    pub graph: StableDiGraph<SceneNode, ()>,
    pub root: NodeIndex,
    pub id_index: HashMap<NodeId, NodeIndex>,
    /// Children of each parent in insertion order. `StableDiGraph` reuses
    /// vacated slots, so `NodeIndex` order is not insertion order.
    child_order: HashMap<NodeIndex, Vec<NodeIndex>>,
}

impl SceneGraph {
    #[must_use]
    pub fn new() -> Self {
        let mut graph = StableDiGraph::new();
        let mut root_node = SceneNode::new(NodeId::intern(ROOT_ID), "DocumentRoot");
        root_node.kind = NodeKind::Root;
        let root = graph.add_node(root_node);

        let mut id_index = HashMap::new();
        id_index.insert(NodeId::intern(ROOT_ID), root);

        Self {
            graph,
            root,
            id_index,
            child_order: HashMap::new(),
        }
    }

    /// Add a node as the last child of `parent`.
    pub fn add_node(&mut self, parent: NodeIndex, node: SceneNode) -> NodeIndex {
        let id = node.id;
        let idx = self.graph.add_node(node);
        self.graph.add_edge(parent, idx, ());
        self.child_order.entry(parent).or_default().push(idx);
        if self.id_index.insert(id, idx).is_some() {
            log::warn!("duplicate element id {id}; later occurrence wins lookups");
        }
        idx
    }

    /// Remove a node and its whole subtree, keeping `id_index` in sync.
    pub fn remove_subtree(&mut self, idx: NodeIndex) -> Option<SceneNode> {
        for child in self.children(idx) {
            self.remove_subtree(child);
        }
        if let Some(parent) = self.parent(idx)
            && let Some(siblings) = self.child_order.get_mut(&parent)
        {
            siblings.retain(|&s| s != idx);
        }
        self.child_order.remove(&idx);
        let removed = self.graph.remove_node(idx);
        if let Some(node) = &removed
            && self.id_index.get(&node.id) == Some(&idx)
        {
            self.id_index.remove(&node.id);
        }
        removed
    }

    pub fn get_by_id(&self, id: NodeId) -> Option<&SceneNode> {
        self.id_index.get(&id).map(|idx| &self.graph[*idx])
    }

    pub fn get_by_id_mut(&mut self, id: NodeId) -> Option<&mut SceneNode> {
        self.id_index
            .get(&id)
            .copied()
            .map(|idx| &mut self.graph[idx])
    }

    pub fn index_of(&self, id: NodeId) -> Option<NodeIndex> {
        self.id_index.get(&id).copied()
    }

    pub fn node(&self, idx: NodeIndex) -> &SceneNode {
        &self.graph[idx]
    }

    pub fn node_mut(&mut self, idx: NodeIndex) -> &mut SceneNode {
        &mut self.graph[idx]
    }

    pub fn parent(&self, idx: NodeIndex) -> Option<NodeIndex> {
        self.graph
            .neighbors_directed(idx, petgraph::Direction::Incoming)
            .next()
    }

    /// Children in insertion order.
    pub fn children(&self, idx: NodeIndex) -> Vec<NodeIndex> {
        self.child_order.get(&idx).cloned().unwrap_or_default()
    }

    /// Every node except the root, pre-order. This is the flat-list view.
    pub fn preorder(&self) -> Vec<NodeIndex> {
        let mut out = Vec::with_capacity(self.graph.node_count());
        let mut stack: Vec<NodeIndex> = self.children(self.root).into_iter().rev().collect();
        while let Some(idx) = stack.pop() {
            out.push(idx);
            stack.extend(self.children(idx).into_iter().rev());
        }
        out
    }

    /// Number of nodes, root excluded.
    pub fn len(&self) -> usize {
        self.graph.node_count().saturating_sub(1)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn pages(&self) -> Vec<NodeIndex> {
        self.children(self.root)
            .into_iter()
            .filter(|&i| matches!(self.graph[i].kind, NodeKind::Page))
            .collect()
    }

    pub fn artboards(&self, page: NodeIndex) -> Vec<NodeIndex> {
        self.children(page)
            .into_iter()
            .filter(|&i| matches!(self.graph[i].kind, NodeKind::Artboard))
            .collect()
    }

    /// First artboard of the first page that has one.
    pub fn first_artboard(&self) -> Option<NodeIndex> {
        self.pages()
            .into_iter()
            .find_map(|p| self.artboards(p).into_iter().next())
    }

    /// Canvas dimensions from the first page's first artboard.
    pub fn canvas(&self) -> GridSpec {
        let artboard = self
            .pages()
            .first()
            .and_then(|&p| self.artboards(p).first().copied())
            .map(|a| &self.graph[a].geometry);
        GridSpec::new(
            provided(artboard.and_then(|g| g.width)).unwrap_or(DEFAULT_CANVAS_WIDTH),
            provided(artboard.and_then(|g| g.height)).unwrap_or(DEFAULT_CANVAS_HEIGHT),
        )
    }

    /// Id of the parent as seen by the host: the arena parent, unless that
    /// is the synthetic root, in which case the original `parentId`.
    pub fn host_parent_id(&self, idx: NodeIndex) -> Option<String> {
        match self.parent(idx) {
            Some(p) if p != self.root => Some(self.graph[p].id.as_str().to_string()),
            _ => self.graph[idx].parent_hint.clone(),
        }
    }
}

impl Default for SceneGraph {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn sample() -> SceneGraph {
        let mut sg = SceneGraph::new();
        let page = sg.add_node(sg.root, SceneNode::new(NodeId::intern("m-page"), "Page"));
        let board = sg.add_node(
            page,
            SceneNode::new(NodeId::intern("m-board"), "ab:Artboard").with_size(2000.0, 1000.0),
        );
        let group = sg.add_node(
            board,
            SceneNode::new(NodeId::intern("m-group"), "Group").at(10.0, 10.0),
        );
        sg.add_node(group, SceneNode::new(NodeId::intern("m-rect"), "Rectangle"));
        sg.add_node(board, SceneNode::new(NodeId::intern("m-text"), "StandaloneTextNode"));
        sg
    }

    #[test]
    fn tags_classify_into_kinds() {
        assert!(NodeKind::for_tag("ThreadedTextNode").is_text());
        assert!(NodeKind::for_tag("ab:Artboard").is_container());
        assert_eq!(NodeKind::for_tag("ImageRectangle"), NodeKind::Media { pending: None });
        assert_eq!(NodeKind::for_tag("ComplexShape"), NodeKind::Other);
    }

    #[test]
    fn preorder_is_document_order() {
        let sg = sample();
        let ids: Vec<&str> = sg.preorder().iter().map(|&i| sg.node(i).id.as_str()).collect();
        assert_eq!(ids, ["m-page", "m-board", "m-group", "m-rect", "m-text"]);
        assert_eq!(sg.len(), 5);
    }

    #[test]
    fn canvas_from_first_artboard() {
        let sg = sample();
        assert_eq!(sg.canvas(), GridSpec::new(2000.0, 1000.0));
        assert_eq!(
            SceneGraph::new().canvas(),
            GridSpec::new(DEFAULT_CANVAS_WIDTH, DEFAULT_CANVAS_HEIGHT)
        );
    }

    #[test]
    fn remove_subtree_clears_index() {
        let mut sg = sample();
        let group = sg.index_of(NodeId::intern("m-group")).unwrap();
        sg.remove_subtree(group);
        assert!(sg.get_by_id(NodeId::intern("m-group")).is_none());
        assert!(sg.get_by_id(NodeId::intern("m-rect")).is_none());
        assert_eq!(sg.len(), 3);
    }

    #[test]
    fn node_added_after_removal_is_appended() {
        let mut sg = sample();
        let board = sg.index_of(NodeId::intern("m-board")).unwrap();
        let group = sg.index_of(NodeId::intern("m-group")).unwrap();
        sg.remove_subtree(group);
        sg.add_node(board, SceneNode::new(NodeId::intern("m-late"), "Rectangle"));

        let ids: Vec<&str> = sg.preorder().iter().map(|&i| sg.node(i).id.as_str()).collect();
        assert_eq!(ids, ["m-page", "m-board", "m-text", "m-late"]);
    }

    #[test]
    fn visual_size_fallbacks() {
        let bare = SceneNode::new(NodeId::intern("m-bare"), "Rectangle");
        assert_eq!(bare.visual_size(), (100.0, 50.0));

        let sized = bare.clone().with_size(40.0, 0.0);
        assert_eq!(sized.visual_size(), (40.0, 50.0));

        let bounded = sized.with_bounds(-5.0, -5.0, 60.0, 20.0);
        assert_eq!(bounded.visual_size(), (60.0, 20.0));
        assert_eq!(bounded.size_or((300.0, 300.0)), (60.0, 20.0));
    }

    #[test]
    fn center_uses_bounds_offset() {
        let text = SceneNode::new(NodeId::intern("m-t"), "Text")
            .at(100.0, 200.0)
            .with_bounds(-5.0, -10.0, 50.0, 20.0);
        assert_eq!(text.screen_position(), Point::new(95.0, 190.0));
        assert_eq!(text.center(), Point::new(120.0, 200.0));
    }

    #[test]
    fn set_translation_mirrors_matrix() {
        let mut g = Geometry {
            transform_matrix: Some(serde_json::json!({"0": 1, "4": 0, "5": 0})),
            ..Default::default()
        };
        g.set_translation(Point::new(12.0, 34.5));
        assert_eq!(
            g.transform_matrix,
            Some(serde_json::json!({"0": 1, "4": 12, "5": 34.5}))
        );

        let mut g = Geometry {
            transform_matrix: Some(serde_json::json!([1, 0, 0, 1, 0, 0])),
            ..Default::default()
        };
        g.set_translation(Point::new(7.0, 8.0));
        assert_eq!(g.transform_matrix, Some(serde_json::json!([1, 0, 0, 1, 7, 8])));
    }

    #[test]
    fn color_clamps() {
        let c = Color::clamped(1.5, -0.2, 0.5, None);
        assert_eq!(c, Color::rgba(1.0, 0.0, 0.5, 1.0));
        assert_eq!(Color::clamped(0.0, 0.0, 0.0, Some(f64::NAN)).alpha, 0.0);
        assert_eq!(c.to_rgb8(), (255, 0, 128));
    }
}
