pub mod document;
pub mod error;
pub mod grid;
pub mod id;
pub mod index;
pub mod model;

pub use document::{DeletionRecord, Document};
pub use error::{DocumentError, GridError};
pub use grid::{
    Alignment, AxisLock, GridCell, GridSpec, LockAxis, cell_to_pixels, pixels_to_cell,
};
pub use id::NodeId;
pub use index::{Nearest, find_by_grid_cell, find_by_id, find_nearest};
pub use model::*;

// Re-export petgraph types so downstream crates don't need a direct dependency
pub use petgraph::graph::NodeIndex;
