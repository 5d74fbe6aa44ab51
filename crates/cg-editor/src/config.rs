//! Tunable defaults for layout operations.

use serde::{Deserialize, Serialize};

/// Fallbacks used when an operation leaves a value unspecified.
///
/// The numbers match what existing canvas documents were produced with.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LayoutDefaults {
    /// Size of a freshly generated image when none is requested.
    pub image_width: f64,
    pub image_height: f64,
    /// Cell a new image goes to when no cell is given.
    pub image_cell: String,
    /// Smallest replacement size, as a percentage of the replaced element.
    pub min_size_percent: f64,
    /// Size assumed for a replaced element that declares none.
    pub replaced_fallback_size: f64,
    /// Reason recorded for deletions without one.
    pub delete_reason: String,
}

impl Default for LayoutDefaults {
    fn default() -> Self {
        Self {
            image_width: 300.0,
            image_height: 300.0,
            image_cell: "J-10".to_string(),
            min_size_percent: 80.0,
            replaced_fallback_size: 300.0,
            delete_reason: "No reason provided".to_string(),
        }
    }
}
