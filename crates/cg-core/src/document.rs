//! JSON document codec.
//!
//! A persisted canvas document holds every node twice: once in the flat
//! `allElements` list and once in the nested `pages → artboards → children`
//! tree. Loading folds both into a single [`SceneGraph`]; emitting generates
//! both views from it, so they can never disagree.
//!
//! Loading rules:
//! - the tree decides structure (who is whose child, sibling order);
//! - for ids present in both, the flat entry's keys win over the tree's;
//! - flat-only entries are attached under their `parentId` when it is known,
//!   else under the first artboard, else under the root;
//! - derived keys (`depth`, `path`, `index`, `hasChildren`, `childCount`,
//!   `pageIndex`, `totalNodes`, `nodeTypes`) are dropped and recomputed.
//!
//! Keys this crate does not interpret are carried verbatim.

use crate::error::DocumentError;
use crate::id::NodeId;
use crate::model::{
    Bounds, Fill, KindClass, NodeKind, PendingImage, Point, SceneGraph, SceneNode, TextContent,
    TextStyles,
};
use petgraph::graph::NodeIndex;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::path::Path;

/// Per-node keys recomputed on every emit.
const DERIVED_NODE_KEYS: &[&str] = &[
    "depth",
    "path",
    "index",
    "hasChildren",
    "childCount",
    "pageIndex",
];

/// Top-level keys owned by the codec.
const OWNED_TOP_KEYS: &[&str] = &[
    "allElements",
    "pages",
    "totalNodes",
    "nodeTypes",
    "deletedElements",
];

/// Audit entry appended when an element is soft-deleted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeletionRecord {
    pub id: String,
    pub reason: String,
    /// RFC 3339 timestamp.
    pub deleted_at: String,
}

/// A loaded canvas document.
#[derive(Debug, Clone, Default)]
pub struct Document {
    pub graph: SceneGraph,
    /// Root-level `deletedElements` audit log.
    pub deleted: Vec<DeletionRecord>,
    /// Other top-level keys (`documentRoot`, timestamps, …), in input order.
    pub extra: Map<String, Value>,
}

impl Document {
    pub fn new(graph: SceneGraph) -> Self {
        Self {
            graph,
            ..Default::default()
        }
    }

    /// Parse a document from JSON text.
    pub fn from_json_str(text: &str) -> Result<Self, DocumentError> {
        let value: Value = serde_json::from_str(text)?;
        Self::from_value(value)
    }

    /// Build a document from an already-parsed JSON value.
    pub fn from_value(value: Value) -> Result<Self, DocumentError> {
        let Value::Object(mut top) = value else {
            return Err(DocumentError::Malformed(
                "document root must be a JSON object".into(),
            ));
        };

        let pages = take_array(&mut top, "pages")?;
        let flat = take_array(&mut top, "allElements")?;
        let deleted = match top.remove("deletedElements") {
            Some(v) => serde_json::from_value(v)?,
            None => Vec::new(),
        };
        for key in OWNED_TOP_KEYS {
            top.remove(*key);
        }

        let mut loader = Loader::new(flat)?;
        for page in pages {
            loader.load_page(page)?;
        }
        loader.attach_flat_only()?;

        log::debug!(
            "loaded document: {} nodes, {} deletion records",
            loader.graph.len(),
            deleted.len()
        );

        Ok(Self {
            graph: loader.graph,
            deleted,
            extra: top,
        })
    }

    /// Read and parse a document file.
    pub fn load(path: &Path) -> Result<Self, DocumentError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }

    /// Emit both views and write the document as pretty JSON.
    pub fn save(&self, path: &Path) -> Result<(), DocumentError> {
        std::fs::write(path, self.to_json_string()?)?;
        log::info!("saved {} nodes to {}", self.graph.len(), path.display());
        Ok(())
    }

    pub fn to_json_string(&self) -> Result<String, DocumentError> {
        Ok(serde_json::to_string_pretty(&self.to_value())?)
    }

    /// Emit the document with freshly generated flat and tree views.
    pub fn to_value(&self) -> Value {
        let mut emitter = Emitter::new(&self.graph);
        emitter.run();

        let mut top = self.extra.clone();
        top.insert("totalNodes".into(), Value::from(self.graph.len()));
        top.insert("nodeTypes".into(), Value::Object(emitter.node_types));
        top.insert("allElements".into(), Value::Array(emitter.flat));
        top.insert("pages".into(), Value::Array(emitter.pages));
        if !self.deleted.is_empty() {
            top.insert(
                "deletedElements".into(),
                serde_json::to_value(&self.deleted).unwrap_or(Value::Null),
            );
        }
        Value::Object(top)
    }
}

fn take_array(map: &mut Map<String, Value>, key: &str) -> Result<Vec<Value>, DocumentError> {
    match map.remove(key) {
        None | Some(Value::Null) => Ok(Vec::new()),
        Some(Value::Array(items)) => Ok(items),
        Some(_) => Err(DocumentError::Malformed(format!("`{key}` must be an array"))),
    }
}

fn into_object(value: Value, what: &str) -> Result<Map<String, Value>, DocumentError> {
    match value {
        Value::Object(map) => Ok(map),
        _ => Err(DocumentError::Malformed(format!("{what} must be an object"))),
    }
}

fn element_id(map: &Map<String, Value>) -> Result<String, DocumentError> {
    map.get("id")
        .and_then(Value::as_str)
        .map(str::to_string)
        .ok_or_else(|| DocumentError::Malformed("element without a string `id`".into()))
}

// ─── Loading ─────────────────────────────────────────────────────────────

struct Loader {
    graph: SceneGraph,
    /// Flat entries keyed by id, consumed as the tree claims them.
    flat_by_id: HashMap<String, Map<String, Value>>,
    /// Flat ids in input order.
    flat_order: Vec<String>,
}

impl Loader {
    fn new(flat: Vec<Value>) -> Result<Self, DocumentError> {
        let mut flat_by_id = HashMap::with_capacity(flat.len());
        let mut flat_order = Vec::with_capacity(flat.len());
        for entry in flat {
            let map = into_object(entry, "allElements entry")?;
            let id = element_id(&map)?;
            if flat_by_id.insert(id.clone(), map).is_none() {
                flat_order.push(id);
            }
        }
        Ok(Self {
            graph: SceneGraph::new(),
            flat_by_id,
            flat_order,
        })
    }

    /// Overlay the flat entry (if any) onto a tree entry.
    fn merged(&mut self, mut map: Map<String, Value>) -> Result<Map<String, Value>, DocumentError> {
        let id = element_id(&map)?;
        if let Some(flat) = self.flat_by_id.remove(&id) {
            for (k, v) in flat {
                map.insert(k, v);
            }
        }
        Ok(map)
    }

    fn load_page(&mut self, page: Value) -> Result<(), DocumentError> {
        let mut map = into_object(page, "page")?;
        let artboards = take_array(&mut map, "artboards")?;
        let map = self.merged(map)?;
        let idx = self.graph.add_node(self.graph.root, decode_node(map)?);
        for artboard in artboards {
            self.load_subtree(idx, artboard)?;
        }
        Ok(())
    }

    fn load_subtree(&mut self, parent: NodeIndex, value: Value) -> Result<(), DocumentError> {
        let mut map = into_object(value, "tree element")?;
        let children = take_array(&mut map, "children")?;
        let map = self.merged(map)?;
        let idx = self.graph.add_node(parent, decode_node(map)?);
        for child in children {
            self.load_subtree(idx, child)?;
        }
        Ok(())
    }

    /// Attach entries that only the flat list knows about.
    fn attach_flat_only(&mut self) -> Result<(), DocumentError> {
        let order = std::mem::take(&mut self.flat_order);
        for id in order {
            let Some(map) = self.flat_by_id.remove(&id) else {
                continue;
            };
            let node = decode_node(map)?;
            let parent = self.flat_parent(&node);
            log::debug!("attaching flat-only element {id}");
            self.graph.add_node(parent, node);
        }
        Ok(())
    }

    fn flat_parent(&self, node: &SceneNode) -> NodeIndex {
        let class = KindClass::of_tag(&node.tag);
        let declared = node
            .parent_hint
            .as_deref()
            .and_then(NodeId::get)
            .and_then(|pid| self.graph.index_of(pid));

        match (class, declared) {
            (KindClass::Page, _) => self.graph.root,
            (KindClass::Artboard, Some(p))
                if matches!(self.graph.node(p).kind, NodeKind::Page) =>
            {
                p
            }
            // Pages only hold artboards.
            (_, Some(p)) if !matches!(self.graph.node(p).kind, NodeKind::Page) => p,
            _ => self.graph.first_artboard().unwrap_or(self.graph.root),
        }
    }
}

/// Remove `key` and decode it as `T`. Values of an unexpected shape are put
/// back untouched so they still round-trip.
fn take_typed<T: DeserializeOwned>(map: &mut Map<String, Value>, key: &str) -> Option<T> {
    let raw = map.remove(key)?;
    if raw.is_null() {
        return None;
    }
    match serde_json::from_value::<T>(raw.clone()) {
        Ok(v) => Some(v),
        Err(e) => {
            log::warn!("keeping `{key}` verbatim: {e}");
            map.insert(key.to_string(), raw);
            None
        }
    }
}

fn decode_node(mut map: Map<String, Value>) -> Result<SceneNode, DocumentError> {
    let id = element_id(&map)?;
    map.remove("id");
    for key in DERIVED_NODE_KEYS {
        map.remove(*key);
    }
    map.remove("children");
    map.remove("artboards");

    let tag: String = take_typed(&mut map, "type").unwrap_or_else(|| "Unknown".to_string());
    let mut node = SceneNode::new(NodeId::intern(&id), &tag);

    node.name = take_typed(&mut map, "name");
    node.geometry.translation = take_typed::<Point>(&mut map, "translation");
    node.geometry.bounds_local = take_typed::<Bounds>(&mut map, "boundsLocal");
    node.geometry.width = take_typed(&mut map, "width");
    node.geometry.height = take_typed(&mut map, "height");
    node.geometry.rotation = take_typed(&mut map, "rotation");
    node.geometry.transform_matrix = take_typed(&mut map, "transformMatrix");
    node.opacity = take_typed(&mut map, "opacity");
    node.fill = take_typed::<Fill>(&mut map, "fill");
    node.locked = take_typed(&mut map, "locked");
    node.parent_hint = take_typed(&mut map, "parentId");

    node.deleted = take_typed(&mut map, "_deleted").unwrap_or(false);
    node.delete_reason = take_typed(&mut map, "_deleteReason");
    node.replaced_by = take_typed::<String>(&mut map, "_replacedBy").map(|s| NodeId::intern(&s));

    match &mut node.kind {
        NodeKind::Text { content, styles } => {
            *content = take_typed::<TextContent>(&mut map, "textContent");
            *styles = take_typed::<TextStyles>(&mut map, "textStyles");
        }
        NodeKind::Media { pending } => {
            if map.get("_newImage") == Some(&Value::Bool(true)) {
                map.remove("_newImage");
                *pending = Some(PendingImage {
                    data_url: take_typed(&mut map, "_imageBase64"),
                    path: take_typed(&mut map, "_imagePath"),
                    prompt: take_typed(&mut map, "_prompt"),
                    is_replacement: take_typed(&mut map, "_isReplacement"),
                    replaced_element_id: take_typed(&mut map, "_replacedElementId"),
                });
            }
        }
        _ => {}
    }

    node.extra = map;
    Ok(node)
}

// ─── Emitting ────────────────────────────────────────────────────────────

struct Emitter<'a> {
    graph: &'a SceneGraph,
    flat: Vec<Value>,
    pages: Vec<Value>,
    node_types: Map<String, Value>,
}

/// Where a node sits, as the flat list reports it.
struct Placement {
    depth: usize,
    path: String,
}

impl<'a> Emitter<'a> {
    fn new(graph: &'a SceneGraph) -> Self {
        Self {
            graph,
            flat: Vec::with_capacity(graph.len()),
            pages: Vec::new(),
            node_types: Map::new(),
        }
    }

    fn run(&mut self) {
        let mut page_idx = 0usize;
        for (k, idx) in self.graph.children(self.graph.root).into_iter().enumerate() {
            if matches!(self.graph.node(idx).kind, NodeKind::Page) {
                let page = self.emit_page(idx, page_idx);
                self.pages.push(page);
                page_idx += 1;
            } else {
                // Loose node outside any page: flat list only.
                let tag = &self.graph.node(idx).tag;
                let place = Placement {
                    depth: 0,
                    path: format!("{tag}[{k}]"),
                };
                self.emit_subtree(idx, place);
            }
        }
    }

    fn count(&mut self, idx: NodeIndex) {
        let tag = self.graph.node(idx).tag.clone();
        let n = self.node_types.get(&tag).and_then(Value::as_u64).unwrap_or(0);
        self.node_types.insert(tag, Value::from(n + 1));
    }

    fn emit_page(&mut self, idx: NodeIndex, page_idx: usize) -> Value {
        let mut props = encode_props(self.graph, idx);
        props.insert("pageIndex".into(), Value::from(page_idx));

        let mut entry = props.clone();
        entry.insert("depth".into(), Value::from(0));
        entry.insert("index".into(), Value::from(self.flat.len()));
        entry.insert("path".into(), Value::from(format!("Page[{page_idx}]")));
        self.flat.push(Value::Object(entry));
        self.count(idx);

        let mut artboards = Vec::new();
        for (j, child) in self.graph.children(idx).into_iter().enumerate() {
            let place = Placement {
                depth: 1,
                path: format!("Page[{page_idx}] > Artboard[{j}]"),
            };
            artboards.push(self.emit_subtree(child, place));
        }
        props.insert("artboards".into(), Value::Array(artboards));
        Value::Object(props)
    }

    /// Emit a node and its descendants; returns the tree form.
    fn emit_subtree(&mut self, idx: NodeIndex, place: Placement) -> Value {
        let mut props = encode_props(self.graph, idx);
        props.insert("depth".into(), Value::from(place.depth));
        props.insert("path".into(), Value::from(place.path.clone()));
        props.insert("index".into(), Value::from(self.flat.len()));
        self.flat.push(Value::Object(props.clone()));
        self.count(idx);

        let mut children = Vec::new();
        for (k, child) in self.graph.children(idx).into_iter().enumerate() {
            let tag = &self.graph.node(child).tag;
            let child_place = Placement {
                depth: place.depth + 1,
                path: format!("{} > {tag}[{k}]", place.path),
            };
            children.push(self.emit_subtree(child, child_place));
        }
        props.insert("children".into(), Value::Array(children));
        Value::Object(props)
    }
}

fn put<T: Serialize>(map: &mut Map<String, Value>, key: &str, value: &Option<T>) {
    if let Some(v) = value
        && let Ok(v) = serde_json::to_value(v)
    {
        map.insert(key.to_string(), v);
    }
}

/// The host-facing attribute map of one node, without position keys.
fn encode_props(graph: &SceneGraph, idx: NodeIndex) -> Map<String, Value> {
    let node = graph.node(idx);
    let g = &node.geometry;
    let mut m = Map::new();

    m.insert("id".into(), Value::from(node.id.as_str()));
    m.insert("type".into(), Value::from(node.tag.as_str()));
    put(&mut m, "name", &node.name);
    put(&mut m, "translation", &g.translation);
    put(&mut m, "boundsLocal", &g.bounds_local);
    put(&mut m, "width", &g.width);
    put(&mut m, "height", &g.height);
    put(&mut m, "rotation", &g.rotation);
    put(&mut m, "transformMatrix", &g.transform_matrix);
    put(&mut m, "opacity", &node.opacity);
    put(&mut m, "fill", &node.fill);
    put(&mut m, "locked", &node.locked);

    match &node.kind {
        NodeKind::Text { content, styles } => {
            put(&mut m, "textContent", content);
            put(&mut m, "textStyles", styles);
        }
        NodeKind::Media {
            pending: Some(p),
        } => {
            m.insert("_newImage".into(), Value::Bool(true));
            put(&mut m, "_imageBase64", &p.data_url);
            put(&mut m, "_imagePath", &p.path);
            put(&mut m, "_prompt", &p.prompt);
            put(&mut m, "_isReplacement", &p.is_replacement);
            put(&mut m, "_replacedElementId", &p.replaced_element_id);
        }
        _ => {}
    }

    if node.deleted {
        m.insert("_deleted".into(), Value::Bool(true));
    }
    put(&mut m, "_deleteReason", &node.delete_reason);
    put(&mut m, "_replacedBy", &node.replaced_by);

    for (k, v) in &node.extra {
        if !m.contains_key(k) {
            m.insert(k.clone(), v.clone());
        }
    }

    if let Some(parent) = graph.host_parent_id(idx) {
        m.insert("parentId".into(), Value::from(parent));
    }
    let child_count = graph.children(idx).len();
    m.insert("hasChildren".into(), Value::Bool(child_count > 0));
    if child_count > 0 || matches!(node.kind, NodeKind::Page | NodeKind::Artboard | NodeKind::Group)
    {
        m.insert("childCount".into(), Value::from(child_count));
    }
    m
}
