//! This module provides functionality for drawing slice lines and regions on images.
//! It is feature-gated under the `drawing` feature and requires the `image` and `imageproc` crates.
//!
//! # Examples
//!
//! ```rust
//! use slicer::{drawing::*, ImageFrame, Orientation, SliceStore};
//! use image::{Rgba, RgbaImage};
//!
//! let mut store = SliceStore::new();
//! store.load_frame(ImageFrame::new(40, 40).unwrap());
//! store.add_line(Orientation::Horizontal, 20, 10);
//! let layout = store.snapshot().unwrap();
//!
//! let config = OverlayConfig {
//!     horizontal_color: Rgba([255, 0, 0, 255]), // Red for horizontal cuts
//!     vertical_color: Rgba([0, 0, 255, 255]),   // Blue for vertical cuts
//!     region_color: Rgba([0, 255, 0, 255]),     // Green region outlines
//!     line_color_provider: None,                // Use uniform line colors
//!     line_thickness: 1,
//! };
//!
//! let mut canvas = RgbaImage::new(40, 40);
//! layout.draw(&mut canvas, &config).unwrap();
//! assert_eq!(canvas.get_pixel(5, 20), &Rgba([255, 0, 0, 255]));
//! ```

use std::fmt;

use image::{Rgba, RgbaImage};
use imageproc::{
    drawing::{draw_hollow_rect_mut, draw_line_segment_mut},
    rect::Rect,
};

use crate::{Layout, Orientation, Region, SliceError, SliceLine};

/// Configuration for drawing the slice overlay.
///
/// Users can specify uniform colors per orientation or provide a color provider
/// function that picks a color per line.
pub struct OverlayConfig {
    /// Color of horizontal slice lines.
    pub horizontal_color: Rgba<u8>,
    /// Color of vertical slice lines.
    pub vertical_color: Rgba<u8>,
    /// Outline color of partition regions.
    pub region_color: Rgba<u8>,
    /// Optional function to provide custom colors per line.
    pub line_color_provider: Option<Box<dyn Fn(&SliceLine) -> Rgba<u8>>>,
    /// Thickness of slice lines, in pixels.
    pub line_thickness: u32,
}

// Manually implement Debug for OverlayConfig
impl fmt::Debug for OverlayConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OverlayConfig")
            .field("horizontal_color", &self.horizontal_color)
            .field("vertical_color", &self.vertical_color)
            .field("region_color", &self.region_color)
            .field("line_color_provider", &"<function>")
            .field("line_thickness", &self.line_thickness)
            .finish()
    }
}

impl Default for OverlayConfig {
    fn default() -> Self {
        OverlayConfig {
            horizontal_color: Rgba([255, 0, 0, 255]),  // Red
            vertical_color: Rgba([0, 0, 255, 255]),    // Blue
            region_color: Rgba([255, 200, 0, 255]),    // Amber
            line_color_provider: None,
            line_thickness: 2,
        }
    }
}

impl OverlayConfig {
    fn line_color(&self, line: &SliceLine) -> Rgba<u8> {
        match (&self.line_color_provider, line.orientation) {
            (Some(provider), _) => provider(line),
            (None, Orientation::Horizontal) => self.horizontal_color,
            (None, Orientation::Vertical) => self.vertical_color,
        }
    }
}

/// Trait for types that can be drawn on an image.
pub trait Drawable {
    /// Draws the object on the provided image using the given configuration.
    ///
    /// # Errors
    /// Returns [`SliceError`] if drawing fails.
    fn draw(&self, image: &mut RgbaImage, config: &OverlayConfig) -> Result<(), SliceError>;
}

impl Drawable for Region {
    fn draw(&self, image: &mut RgbaImage, config: &OverlayConfig) -> Result<(), SliceError> {
        if !self.is_empty() {
            draw_hollow_rect_mut(image, Rect::from(self), config.region_color);
        }
        Ok(())
    }
}

impl Drawable for Layout {
    /// Draws every line across its resolved span only, so partial cuts show where
    /// they actually stop.
    fn draw(&self, image: &mut RgbaImage, config: &OverlayConfig) -> Result<(), SliceError> {
        for line in self.all_lines() {
            let span = self.resolved_span(line);
            if span.start > span.end {
                continue;
            }
            let color = config.line_color(line);
            let extent = self.frame().extent(line.orientation);

            for offset in 0..config.line_thickness.max(1) {
                // Thick lines grow away from the far edge
                let at = if line.position + offset < extent {
                    line.position + offset
                } else {
                    line.position.saturating_sub(offset + 1)
                } as f32;
                let (start, end) = (span.start as f32, span.end as f32);
                let (from, to) = match line.orientation {
                    Orientation::Horizontal => ((start, at), (end, at)),
                    Orientation::Vertical => ((at, start), (at, end)),
                };
                draw_line_segment_mut(image, from, to, color);
            }
        }
        Ok(())
    }
}
