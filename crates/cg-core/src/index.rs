//! Element lookup: id → node, grid cell → nodes, point → nearest node.
//!
//! All lookups walk the arena in document order (the order of the flat
//! list), so "first match" is stable across load/save cycles.

use crate::grid::{GridCell, GridSpec};
use crate::id::NodeId;
use crate::model::{Point, Positioned, SceneGraph, SceneNode};
use petgraph::graph::NodeIndex;

/// Find a node by id: exact match first, then the first node (document
/// order) whose id starts with `query`. An empty query matches nothing.
pub fn find_by_id(graph: &SceneGraph, query: &str) -> Option<NodeIndex> {
    if query.is_empty() {
        return None;
    }
    if let Some(idx) = NodeId::get(query).and_then(|id| graph.index_of(id))
        && idx != graph.root
    {
        return Some(idx);
    }
    graph
        .preorder()
        .into_iter()
        .find(|&idx| graph.node(idx).id.starts_with(query))
}

/// Every content node whose visual center falls in the queried cell.
///
/// Pages, artboards and nodes without a translation are skipped. The
/// sub-position of the query, if any, is ignored. A malformed query yields
/// no matches.
pub fn find_by_grid_cell(graph: &SceneGraph, grid_id: &str, canvas: GridSpec) -> Vec<NodeIndex> {
    let Ok(query) = grid_id.parse::<GridCell>() else {
        log::debug!("find_by_grid_cell: ignoring malformed grid id {grid_id:?}");
        return Vec::new();
    };
    let query = query.base();

    graph
        .preorder()
        .into_iter()
        .filter(|&idx| {
            let node = graph.node(idx);
            if node.kind.is_container() || node.geometry.translation.is_none() {
                return false;
            }
            let c = node.center();
            canvas.cell_at(c.x, c.y) == query
        })
        .collect()
}

/// Result of a nearest-node search.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Nearest {
    pub index: NodeIndex,
    /// Absolute visual center of the node.
    pub center: Point,
    pub distance: f64,
}

/// Nearest node to `target` among those accepted by `predicate`.
///
/// Centers are absolute: parent translations are accumulated down the tree,
/// restarting at zero below pages and artboards. Ties go to the node met
/// first in document order.
pub fn find_nearest<F>(graph: &SceneGraph, target: Point, predicate: F) -> Option<Nearest>
where
    F: Fn(&SceneNode) -> bool,
{
    let mut best: Option<Nearest> = None;
    nearest_in(graph, graph.root, Point::default(), target, &predicate, &mut best);
    best
}

fn nearest_in<F>(
    graph: &SceneGraph,
    parent: NodeIndex,
    offset: Point,
    target: Point,
    predicate: &F,
    best: &mut Option<Nearest>,
) where
    F: Fn(&SceneNode) -> bool,
{
    for idx in graph.children(parent) {
        let node = graph.node(idx);

        if predicate(node) {
            let local = node.center();
            let center = Point::new(local.x + offset.x, local.y + offset.y);
            let distance = center.distance(target);
            log::trace!("nearest: {} at {distance:.2}px", node.id);
            if best.is_none_or(|b| distance < b.distance) {
                *best = Some(Nearest {
                    index: idx,
                    center,
                    distance,
                });
            }
        }

        let child_offset = if node.kind.is_container() {
            Point::default()
        } else {
            let t = node.translation();
            Point::new(offset.x + t.x, offset.y + t.y)
        };
        nearest_in(graph, idx, child_offset, target, predicate, best);
    }
}
