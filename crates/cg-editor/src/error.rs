//! Error types for the editor crate.

use cg_core::{DocumentError, GridError};
use std::io;
use thiserror::Error;

/// Why a single layout operation could not be applied.
///
/// These never escape [`crate::LayoutMutator::apply`]; they become a failed
/// [`crate::MutationResult`] whose message is the display text.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum EditError {
    /// No element has this id (or id prefix).
    #[error("Element with ID {0} not found")]
    NotFound(String),

    /// A text-only operation addressed a non-text element.
    #[error("Element {id} is not a Text element (type: {tag})")]
    TypeMismatch { id: String, tag: String },

    /// A style update carried no fields.
    #[error("No style properties provided for element {0}")]
    NothingToApply(String),

    /// The grid cell id could not be converted.
    #[error("Error converting grid cell: {0}")]
    Grid(#[from] GridError),

    /// The wire name is not in the operation catalog.
    #[error("Unknown function: {0}")]
    UnknownFunction(String),

    /// The arguments do not match the operation's shape.
    #[error("Invalid arguments for {function}: {reason}")]
    InvalidArgs { function: String, reason: String },
}

/// Errors from the snapshot history.
#[derive(Error, Debug)]
pub enum HistoryError {
    #[error("No undo history available")]
    NoUndoHistory,

    #[error("No redo history available")]
    NoRedoHistory,

    #[error("Already at latest state")]
    AlreadyLatest,

    #[error("Snapshot canvas-data-undo-{0}.json not found")]
    MissingSnapshot(u32),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("Document error: {0}")]
    Document(#[from] DocumentError),
}

/// Failures of the external image services.
#[derive(Error, Debug)]
pub enum ServiceError {
    #[error("Image generation failed: {0}")]
    Generation(String),

    #[error("Background removal failed: {0}")]
    BackgroundRemoval(String),

    /// The service returned an image without usable dimensions.
    #[error("Invalid image: {0}")]
    InvalidImage(String),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error(transparent)]
    Edit(#[from] EditError),
}
