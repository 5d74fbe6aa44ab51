//! Image replacement: find the image nearest to a grid cell, describe the
//! image to generate, and place the generated image once it exists.
//!
//! Generation itself is asynchronous and external. [`plan_image`] only
//! produces an [`ImageRequest`]; [`place_generated_image`] runs later with
//! the finished image and is the only step that writes to the document.

use crate::config::LayoutDefaults;
use crate::error::EditError;
use crate::ops::GenerateImage;
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64_STANDARD;
use cg_core::grid::round_half_up;
use cg_core::model::{
    Bounds, KindClass, NodeKind, PendingImage, Point, Positioned, SceneNode, provided,
};
use cg_core::{Document, GridCell, NodeId, find_nearest};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// True for nodes that count as images when looking for one to replace.
pub fn is_image_like(node: &SceneNode) -> bool {
    KindClass::of_tag(&node.tag) == KindClass::Media
        || node
            .name
            .as_deref()
            .is_some_and(|n| n.to_lowercase().contains("image"))
        || node.is_pending_image()
}

/// A deferred request for the external image services.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageRequest {
    pub is_async_image_generation: bool,
    pub is_replacement: bool,
    pub prompt: String,
    /// Where the new image is centered.
    pub grid_cell: String,
    pub width: f64,
    pub height: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_width: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_height: Option<f64>,
    pub remove_background: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub replace_existing_grid_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub replaced_element_id: Option<String>,
}

impl ImageRequest {
    /// Size the generated image should fit, honoring the replacement minimum.
    pub fn target_size(&self) -> (f64, f64) {
        let fit = |requested: f64, min: Option<f64>| {
            let v = match min {
                Some(min) if self.is_replacement => requested.max(min),
                _ => requested,
            };
            let v = round_half_up(v);
            if v > 0.0 { v } else { 300.0 }
        };
        (fit(self.width, self.min_width), fit(self.height, self.min_height))
    }

    /// One-line human description, as reported to the caller.
    pub fn describe(&self) -> String {
        let prompt: String = self.prompt.chars().take(50).collect();
        match (&self.replaced_element_id, self.is_replacement) {
            (Some(old), true) => format!(
                "Queued image replacement at grid {} (replacing element {old}): \"{prompt}...\" ({}x{})",
                self.grid_cell, self.width, self.height
            ),
            _ => format!(
                "Queued image generation: \"{prompt}...\" at {} ({}x{})",
                self.grid_cell, self.width, self.height
            ),
        }
    }
}

/// Resolve a generate-and-place call into a deferred request.
///
/// With `replaceExistingGridId`, the image-like node nearest to that cell's
/// center is the one to replace. When no image is found the call falls back
/// to placing a new image at that cell. A malformed or off-grid cell fails
/// the call.
pub fn plan_image(
    doc: &Document,
    args: &GenerateImage,
    defaults: &LayoutDefaults,
) -> Result<ImageRequest, EditError> {
    let remove_background = args.remove_background != Some(false);

    if let Some(replace_id) = &args.replace_existing_grid_id {
        let cell: GridCell = replace_id.parse()?;
        let target = cell.center_pixels(&doc.graph.canvas());
        // Already-retired images are not candidates.
        let nearest = find_nearest(&doc.graph, target, |n| !n.deleted && is_image_like(n));

        match nearest {
            Some(hit) => {
                let old = doc.graph.node(hit.index);
                log::debug!(
                    "replacing {} at {:.2}px from {replace_id}",
                    old.id,
                    hit.distance
                );
                let pct = provided(args.min_size_percent).unwrap_or(defaults.min_size_percent);
                let fallback = defaults.replaced_fallback_size;
                let (orig_w, orig_h) = old.size_or((fallback, fallback));
                let min_w = round_half_up(orig_w * pct / 100.0);
                let min_h = round_half_up(orig_h * pct / 100.0);

                return Ok(ImageRequest {
                    is_async_image_generation: true,
                    is_replacement: true,
                    prompt: args.prompt.clone(),
                    grid_cell: replace_id.clone(),
                    width: provided(args.width).unwrap_or(orig_w.max(min_w)),
                    height: provided(args.height).unwrap_or(orig_h.max(min_h)),
                    min_width: Some(min_w),
                    min_height: Some(min_h),
                    remove_background,
                    replace_existing_grid_id: Some(replace_id.clone()),
                    replaced_element_id: Some(old.id.as_str().to_string()),
                });
            }
            None => log::warn!(
                "no image near {replace_id}; placing a new image there instead"
            ),
        }
    }

    let grid_cell = args
        .grid_cell
        .clone()
        .or_else(|| args.replace_existing_grid_id.clone())
        .unwrap_or_else(|| defaults.image_cell.clone());
    grid_cell.parse::<GridCell>()?;

    Ok(ImageRequest {
        is_async_image_generation: true,
        is_replacement: false,
        prompt: args.prompt.clone(),
        grid_cell,
        width: provided(args.width).unwrap_or(defaults.image_width),
        height: provided(args.height).unwrap_or(defaults.image_height),
        min_width: None,
        min_height: None,
        remove_background,
        replace_existing_grid_id: None,
        replaced_element_id: None,
    })
}

// ─── Placement ───────────────────────────────────────────────────────────

/// A finished image handed back by the external services.
#[derive(Debug, Clone, PartialEq)]
pub struct GeneratedImage {
    /// PNG bytes.
    pub png: Vec<u8>,
    pub width: u32,
    pub height: u32,
}

impl GeneratedImage {
    pub fn data_url(&self) -> String {
        format!("data:image/png;base64,{}", BASE64_STANDARD.encode(&self.png))
    }
}

/// Scale `(w, h)` to fit inside `target`, keeping the aspect ratio.
pub fn fit_inside(w: u32, h: u32, target: (f64, f64)) -> (f64, f64) {
    if w == 0 || h == 0 {
        return target;
    }
    let (w, h) = (f64::from(w), f64::from(h));
    let scale = (target.0 / w).min(target.1 / h);
    (
        round_half_up(w * scale).max(1.0),
        round_half_up(h * scale).max(1.0),
    )
}

/// What placing a generated image did.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Placement {
    pub new_element_id: String,
    pub grid_cell: String,
    pub translation: Point,
    pub width: f64,
    pub height: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub replaced_element_id: Option<String>,
}

/// Insert the generated image centered on the request's cell, and retire the
/// replaced element in replacement mode.
///
/// `size` is the image's final on-canvas size. The new node goes under the
/// first artboard (or the root when there is none).
pub fn place_generated_image(
    doc: &mut Document,
    request: &ImageRequest,
    image: &GeneratedImage,
    size: (f64, f64),
    image_path: Option<String>,
    now: DateTime<Utc>,
) -> Result<Placement, EditError> {
    let cell: GridCell = request.grid_cell.parse()?;
    let target = cell.center_pixels(&doc.graph.canvas());
    let (w, h) = size;
    let translation = Point::new(
        round_half_up(target.x - w / 2.0),
        round_half_up(target.y - h / 2.0),
    );

    let replaced = request
        .replaced_element_id
        .as_deref()
        .filter(|_| request.is_replacement);
    let new_id = unique_id(doc, replaced, now);

    if let Some(old) = replaced {
        match NodeId::get(old).and_then(|id| doc.graph.get_by_id_mut(id)) {
            Some(node) => {
                node.deleted = true;
                node.replaced_by = Some(new_id);
            }
            None => log::warn!("replaced element {old} is gone; placing without retiring it"),
        }
    }

    let prompt_head: String = request.prompt.chars().take(30).collect();
    let mut node = SceneNode::new(new_id, "MediaContainer");
    node.name = Some(format!("AI Generated: {prompt_head}"));
    node.geometry.translation = Some(translation);
    node.geometry.rotation = Some(0.0);
    node.geometry.bounds_local = Some(Bounds {
        x: 0.0,
        y: 0.0,
        width: w,
        height: h,
    });
    node.geometry.width = Some(w);
    node.geometry.height = Some(h);
    node.opacity = Some(1.0);
    node.locked = Some(false);
    node.extra.insert("rotationInScreen".into(), Value::from(0));
    node.extra.insert("blendMode".into(), Value::from(2));
    node.kind = NodeKind::Media {
        pending: Some(PendingImage {
            data_url: Some(image.data_url()),
            path: image_path,
            prompt: Some(request.prompt.clone()),
            is_replacement: Some(request.is_replacement),
            replaced_element_id: replaced.map(str::to_string),
        }),
    };

    let parent = doc.graph.first_artboard().unwrap_or(doc.graph.root);
    doc.graph.add_node(parent, node);
    log::info!(
        "placed {new_id} ({w}x{h}) at {} -> ({}, {})",
        request.grid_cell,
        translation.x,
        translation.y
    );

    Ok(Placement {
        new_element_id: new_id.as_str().to_string(),
        grid_cell: request.grid_cell.clone(),
        translation,
        width: w,
        height: h,
        replaced_element_id: replaced.map(str::to_string),
    })
}

/// `generated-<ms>` or `replaced-<first 8 of old id>-<ms>`, bumped until free.
fn unique_id(doc: &Document, replaced: Option<&str>, now: DateTime<Utc>) -> NodeId {
    let mut ts = now.timestamp_millis();
    loop {
        let candidate = match replaced {
            Some(old) => {
                let head: String = old.chars().take(8).collect();
                format!("replaced-{head}-{ts}")
            }
            None => format!("generated-{ts}"),
        };
        let taken = NodeId::get(&candidate).is_some_and(|id| doc.graph.index_of(id).is_some());
        if !taken {
            return NodeId::intern(&candidate);
        }
        ts += 1;
    }
}
