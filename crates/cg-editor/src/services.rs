//! External image services and the pipeline that fulfils an image request.

use crate::error::{EditError, ServiceError};
use crate::mutator::{Derived, MutationResult};
use crate::replace::{GeneratedImage, ImageRequest, fit_inside, place_generated_image};
use cg_core::{Document, GridCell, NodeId};
use chrono::{DateTime, Utc};
use std::fs;
use std::path::PathBuf;

/// Produces an image from a text prompt.
pub trait ImageGenerator {
    fn generate(&self, prompt: &str) -> Result<GeneratedImage, ServiceError>;
}

/// Removes the background of an image.
pub trait BackgroundRemover {
    fn remove_background(&self, image: &GeneratedImage) -> Result<GeneratedImage, ServiceError>;
}

/// Runs generation, optional background removal and placement for one
/// [`ImageRequest`].
pub struct ImagePipeline<'a> {
    pub generator: &'a dyn ImageGenerator,
    pub remover: Option<&'a dyn BackgroundRemover>,
    /// Where generated PNGs are written. `None` keeps them in memory only.
    pub images_dir: Option<PathBuf>,
}

impl<'a> ImagePipeline<'a> {
    pub fn new(generator: &'a dyn ImageGenerator) -> Self {
        Self {
            generator,
            remover: None,
            images_dir: None,
        }
    }

    pub fn with_remover(mut self, remover: &'a dyn BackgroundRemover) -> Self {
        self.remover = Some(remover);
        self
    }

    pub fn with_images_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.images_dir = Some(dir.into());
        self
    }

    /// Fulfil `request` against `doc`. A generator failure leaves the
    /// document untouched and yields a failed result.
    pub fn fulfil(&self, doc: &mut Document, request: &ImageRequest) -> MutationResult {
        self.fulfil_at(doc, request, Utc::now())
    }

    pub fn fulfil_at(
        &self,
        doc: &mut Document,
        request: &ImageRequest,
        now: DateTime<Utc>,
    ) -> MutationResult {
        match self.run(doc, request, now) {
            Ok(result) => result,
            Err(e) => {
                log::error!("image request for {:?} failed: {e}", request.prompt);
                MutationResult {
                    success: false,
                    message: e.to_string(),
                    element_id: request.replaced_element_id.clone(),
                    touched_ids: Default::default(),
                    derived: None,
                    error: match e {
                        ServiceError::Edit(edit) => Some(edit),
                        _ => None,
                    },
                }
            }
        }
    }

    fn run(
        &self,
        doc: &mut Document,
        request: &ImageRequest,
        now: DateTime<Utc>,
    ) -> Result<MutationResult, ServiceError> {
        // Fail fast on an unusable cell before paying for generation.
        request.grid_cell.parse::<GridCell>().map_err(EditError::from)?;

        let mut image = self.generator.generate(&request.prompt)?;
        if image.png.is_empty() {
            return Err(ServiceError::InvalidImage("empty image".into()));
        }

        if request.remove_background {
            if let Some(remover) = self.remover {
                match remover.remove_background(&image) {
                    Ok(cut) => image = cut,
                    Err(e) => log::warn!("{e}; continuing with the original image"),
                }
            }
        }

        let size = fit_inside(image.width, image.height, request.target_size());
        let path = match &self.images_dir {
            Some(dir) => {
                fs::create_dir_all(dir)?;
                let path = dir.join(image_file_name(&request.prompt, now));
                fs::write(&path, &image.png)?;
                log::info!("wrote {}", path.display());
                Some(path.to_string_lossy().into_owned())
            }
            None => None,
        };

        let placement = place_generated_image(doc, request, &image, size, path, now)?;

        let verb = if placement.replaced_element_id.is_some() {
            "Replaced image with"
        } else {
            "Generated"
        };
        let mut result = MutationResult::ok(format!(
            "{verb} {} at {} ({}x{})",
            placement.new_element_id, placement.grid_cell, placement.width, placement.height
        ));
        result.element_id = Some(placement.new_element_id.clone());
        result.touched_ids.push(NodeId::intern(&placement.new_element_id));
        if let Some(old) = placement.replaced_element_id.as_deref() {
            result.touched_ids.push(NodeId::intern(old));
        }
        result.derived = Some(Derived::Placement(placement));
        Ok(result)
    }
}

/// `generated-<first 20 prompt chars, non-alphanumerics as _>-<ms>.png`
pub fn image_file_name(prompt: &str, now: DateTime<Utc>) -> String {
    let slug: String = prompt
        .chars()
        .take(20)
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
        .collect();
    format!("generated-{slug}-{}.png", now.timestamp_millis())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn file_name_is_sanitized() {
        let now = DateTime::from_timestamp_millis(1_700_000_000_000).unwrap();
        assert_eq!(
            image_file_name("A cat, in a hat! (watercolor)", now),
            "generated-A_cat__in_a_hat___wa-1700000000000.png"
        );
    }
}
