use std::path::Path;

use image::DynamicImage;
use tracing::debug;

use crate::{
    drawing::{Drawable, OverlayConfig},
    Layout, SliceError,
};

/// Saves the image with the slice overlay drawn on it.
///
/// Region outlines from the current partition are drawn first, then every slice
/// line across its resolved span.
///
/// # Errors
/// Returns [`SliceError`] if drawing or saving fails.
pub fn save_image_with_slices(
    image: &DynamicImage,
    layout: &Layout,
    output_path: impl AsRef<Path>,
    config: &OverlayConfig,
) -> Result<(), SliceError> {
    let mut rgba_img = image.to_rgba8();
    let regions = layout.partition();
    for region in &regions {
        region.draw(&mut rgba_img, config)?;
    }
    layout.draw(&mut rgba_img, config)?;

    debug!(
        path = %output_path.as_ref().display(),
        lines = layout.line_count(),
        regions = regions.len(),
        "Saving slice overlay"
    );
    rgba_img.save(output_path)?;
    Ok(())
}
