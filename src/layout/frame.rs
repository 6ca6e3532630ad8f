use image::{DynamicImage, GenericImageView};
use tracing::error;

use super::Orientation;
use crate::SliceError;

/// Intrinsic pixel dimensions of the loaded image.
///
/// All slicing happens in these natural coordinates; display scaling only enters
/// through [`ImageFrame::natural_from_display`].
///
/// # Example
/// ```
/// use slicer::{ImageFrame, Orientation};
///
/// let frame = ImageFrame::new(200, 100).unwrap();
/// assert_eq!(frame.extent(Orientation::Horizontal), 100);
/// assert_eq!(frame.cross_extent(Orientation::Horizontal), 200);
/// assert!(ImageFrame::new(0, 100).is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct ImageFrame {
    width: u32,
    height: u32,
}

impl ImageFrame {
    pub fn new(width: u32, height: u32) -> Result<Self, SliceError> {
        if width == 0 || height == 0 {
            error!(
                "Invalid image dimensions: width={}, height={}",
                width, height
            );
            return Err(SliceError::InvalidDimensions { width, height });
        }
        Ok(Self { width, height })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn area(&self) -> u64 {
        u64::from(self.width) * u64::from(self.height)
    }

    /// Upper bound of a line's position: the height for horizontal lines, the width
    /// for vertical ones.
    pub fn extent(&self, orientation: Orientation) -> u32 {
        match orientation {
            Orientation::Horizontal => self.height,
            Orientation::Vertical => self.width,
        }
    }

    /// Length of the image along a line's own axis.
    pub fn cross_extent(&self, orientation: Orientation) -> u32 {
        self.extent(orientation.perpendicular())
    }

    /// Maps a display-space coordinate onto the pixel grid.
    ///
    /// `display_extent` is the rendered length of the image along the same axis as
    /// `extent(orientation)`. The result is rounded and clamped to the frame.
    ///
    /// # Example
    /// ```
    /// use slicer::{ImageFrame, Orientation};
    ///
    /// let frame = ImageFrame::new(400, 1000).unwrap();
    /// // Rendered at half size
    /// assert_eq!(frame.natural_from_display(Orientation::Horizontal, 125.0, 500.0), 250);
    /// assert_eq!(frame.natural_from_display(Orientation::Horizontal, 900.0, 500.0), 1000);
    /// ```
    pub fn natural_from_display(
        &self,
        orientation: Orientation,
        display_position: f32,
        display_extent: f32,
    ) -> u32 {
        // Also rejects NaN
        if !(display_extent > 0.0) {
            return 0;
        }
        let extent = self.extent(orientation);
        let scale = extent as f32 / display_extent;
        let natural = (display_position.clamp(0.0, display_extent) * scale).round();
        (natural as u32).min(extent)
    }

    /// Clamps a position into `[0, extent(orientation)]`.
    pub fn clamp_position(&self, orientation: Orientation, position: u32) -> u32 {
        position.min(self.extent(orientation))
    }

    /// Clamps an anchor into `[0, cross_extent(orientation)]`.
    pub fn clamp_anchor(&self, orientation: Orientation, anchor: u32) -> u32 {
        anchor.min(self.cross_extent(orientation))
    }
}

impl TryFrom<&DynamicImage> for ImageFrame {
    type Error = SliceError;

    fn try_from(image: &DynamicImage) -> Result<Self, Self::Error> {
        let (width, height) = image.dimensions();
        ImageFrame::new(width, height)
    }
}
