//! Error types for the core crate.

use std::io;
use thiserror::Error;

/// Errors produced when decoding a grid cell identifier.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GridError {
    /// The text does not have the `Column-Row[-SubPosition]` shape.
    #[error(
        "Invalid grid ID format: {0}. Expected format like 'A-1', 'C-5-TL', 'C-5-TC', 'T-20-BR'"
    )]
    Format(String),

    /// The column letter decodes outside A–T.
    #[error("Column {0} out of range. Valid: A-T")]
    ColumnOutOfRange(char),

    /// The row number decodes outside 1–20.
    #[error("Row {0} out of range. Valid: 1-20")]
    RowOutOfRange(u64),
}

impl GridError {
    /// True for the range variants (the id parsed but points off the grid).
    pub fn is_range(&self) -> bool {
        matches!(self, Self::ColumnOutOfRange(_) | Self::RowOutOfRange(_))
    }
}

/// Errors produced when loading or emitting a persisted document.
#[derive(Error, Debug)]
pub enum DocumentError {
    /// The JSON text could not be parsed or serialized.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Reading or writing the document file failed.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// The JSON is valid but not shaped like a canvas document.
    #[error("Malformed document: {0}")]
    Malformed(String),
}
