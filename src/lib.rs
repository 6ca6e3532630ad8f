//! This crate slices an image along user-placed cut lines and packages the pieces as an archive.
//! It uses the `image` crate for cropping and encoding, `imageproc` for the preview overlay
//! and `insta` for snapshot testing.
//!
//! The pieces, leaves first:
//! - [`bounds`]: nearest-neighbor lookup along one axis.
//! - [`layout`]: the image frame, slice lines and the [`SliceStore`] that mutates them.
//! - [`partition`]: turns a [`Layout`] snapshot into [`Region`]s tiling the frame.
//! - [`archive`]: a stored (uncompressed) zip writer.
//! - [`export`]: drives partition, crop/encode and archive building.
//!
//! # Example
//! ```
//! use slicer::{ImageFrame, Orientation, SliceStore};
//!
//! let mut store = SliceStore::new();
//! store.load_frame(ImageFrame::new(100, 100).unwrap());
//! store.add_line(Orientation::Horizontal, 50, 10);
//!
//! let layout = store.snapshot().unwrap();
//! let regions = layout.partition();
//! assert_eq!(regions.len(), 2);
//! ```

pub mod archive;
pub mod bounds;
/// Debug module for saving the image with its slice overlay.
///
/// # Example
/// ```no_run
/// use slicer::{drawing::OverlayConfig, ImageFrame, SliceStore};
///
/// let img = image::open("photo.png").unwrap();
/// let mut store = SliceStore::new();
/// store.load_frame(ImageFrame::new(img.width(), img.height()).unwrap());
/// let layout = store.snapshot().unwrap();
///
/// slicer::debug::save_image_with_slices(&img, &layout, "preview.png", &OverlayConfig::default())
///     .unwrap();
/// ```
#[cfg(feature = "debug")]
pub mod debug;
/// This module provides functionality for drawing slice lines and regions on images.
/// It is feature-gated under the `drawing` feature and requires the `image` and `imageproc` crates.
///
/// The main components of this module are:
/// - [`drawing::OverlayConfig`]: colors and thickness of the overlay.
/// - [`drawing::Drawable`]: implemented by [`Region`] and [`Layout`].
#[cfg(feature = "drawing")]
pub mod drawing;
pub mod export;
pub mod layout;
pub mod partition;

pub use archive::{build_archive, crc32, ArchiveEntry, ArchiveError};
pub use bounds::{nearest_neighbors, Span};
pub use export::{
    archive_file_name, base_name, entry_file_name, CallbackSink, DirectorySink, EncodeError,
    ExportConfig, ExportSummary, Exporter, OutputSink, PngRegionEncoder, RegionEncoder,
};
pub use layout::{ImageFrame, Layout, LineId, Orientation, SliceLine, SliceStore};
pub use partition::{partition, Region};

use smallvec::SmallVec;
use thiserror::Error;

// Most layouts carry a handful of lines per orientation
const DEFAULT_SMALLVEC_SIZE: usize = 32;

#[derive(Error, Debug)]
pub enum SliceError {
    #[error("Invalid image dimensions: width={width}, height={height}")]
    InvalidDimensions { width: u32, height: u32 },

    #[error("Failed to build archive: {0}")]
    Archive(#[from] ArchiveError),

    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// A type alias for SmallVec with an optimized stack-allocated buffer size.
pub type SmallVecLine<T> = SmallVec<[T; DEFAULT_SMALLVEC_SIZE]>;

/// Creates a [`SliceLine`] from a compact tuple-like syntax.
///
/// The first token is `H` or `V`, followed by the id, the position and the anchor.
/// Neighbor ids may be appended as `Option<u64>` values; without them the line is
/// bounded by the image edges.
///
/// # Examples
///
/// ```rust
/// use slicer::*;
///
/// let line = slice_line!(H, 1, 50, 25);
/// assert_eq!(line.orientation, Orientation::Horizontal);
/// assert_eq!(line.position, 50);
/// assert_eq!(line.lower_neighbor, None);
///
/// let bounded = slice_line!(V, 2, 30, 10, Some(1), None);
/// assert_eq!(bounded.lower_neighbor, Some(LineId(1)));
/// assert_eq!(bounded.upper_neighbor, None);
/// ```
#[macro_export]
macro_rules! slice_line {
    (H, $id:expr, $position:expr, $anchor:expr) => {
        $crate::SliceLine::new(
            $crate::LineId($id),
            $crate::Orientation::Horizontal,
            $position,
            $anchor,
        )
    };
    (V, $id:expr, $position:expr, $anchor:expr) => {
        $crate::SliceLine::new(
            $crate::LineId($id),
            $crate::Orientation::Vertical,
            $position,
            $anchor,
        )
    };
    ($kind:ident, $id:expr, $position:expr, $anchor:expr, $lower:expr, $upper:expr) => {
        $crate::slice_line!($kind, $id, $position, $anchor).with_neighbors(
            Option::<u64>::map($lower, $crate::LineId),
            Option::<u64>::map($upper, $crate::LineId),
        )
    };
}
