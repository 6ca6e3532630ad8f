//! Export pipeline: partition the layout, crop and encode every region, package the
//! results as an archive and hand it to an output sink.

use std::{
    fs,
    io::Cursor,
    path::{Path, PathBuf},
};

use image::{DynamicImage, GenericImageView, ImageFormat};
use rayon::prelude::*;
use thiserror::Error;
use tracing::{debug, info, trace, warn};

use crate::{build_archive, ArchiveEntry, Layout, Region, SliceError, SliceStore};

/// Base name used when the source has no usable file name.
pub const DEFAULT_BASE_NAME: &str = "image";
const ARCHIVE_SUFFIX: &str = "-slices.zip";
const ENTRY_EXTENSION: &str = "png";

/// Strips one trailing `.ext` from `file_name`, falling back to `"image"`.
///
/// # Example
/// ```
/// use slicer::base_name;
///
/// assert_eq!(base_name(Some("photo.large.png")), "photo.large");
/// assert_eq!(base_name(Some(".png")), "image");
/// assert_eq!(base_name(None), "image");
/// ```
pub fn base_name(file_name: Option<&str>) -> String {
    base_name_or(file_name, DEFAULT_BASE_NAME)
}

fn base_name_or(file_name: Option<&str>, default: &str) -> String {
    let stem = file_name.map(strip_extension).unwrap_or_default();
    if stem.is_empty() {
        default.to_string()
    } else {
        stem.to_string()
    }
}

/// Removes a final `.ext` suffix where `ext` is non-empty and holds no `.` or `/`.
fn strip_extension(name: &str) -> &str {
    match name.rfind('.') {
        Some(dot) if dot + 1 < name.len() && !name[dot + 1..].contains('/') => &name[..dot],
        _ => name,
    }
}

/// `"<base>-slices.zip"`
pub fn archive_file_name(base: &str) -> String {
    format!("{base}{ARCHIVE_SUFFIX}")
}

/// `"<base>-slice-<index>.png"`, with `index` starting at 1.
pub fn entry_file_name(base: &str, index: usize) -> String {
    format!("{base}-slice-{index}.{ENTRY_EXTENSION}")
}

#[derive(Debug, Error)]
pub enum EncodeError {
    #[error("Crop rectangle has zero width or height")]
    ZeroDimension,

    #[error(
        "Crop rectangle ({},{},{},{}) exceeds image bounds ({}x{})",
        requested.x, requested.y, requested.width, requested.height,
        image_size.0, image_size.1
    )]
    OutOfBounds {
        requested: Region,
        image_size: (u32, u32),
    },

    #[error("PNG encoding failed: {0}")]
    EncodingFailed(String),
}

/// Crops one region out of the source image and encodes it.
///
/// Implementations must be safe to call from several threads at once; see
/// [`ExportConfig::enable_parallel`]. Closures of the right shape implement it too.
pub trait RegionEncoder: Sync {
    fn encode_region(&self, region: &Region) -> Result<Vec<u8>, EncodeError>;
}

impl<F> RegionEncoder for F
where
    F: Fn(&Region) -> Result<Vec<u8>, EncodeError> + Sync,
{
    fn encode_region(&self, region: &Region) -> Result<Vec<u8>, EncodeError> {
        self(region)
    }
}

/// Encodes regions of a decoded image as PNG.
pub struct PngRegionEncoder<'a> {
    image: &'a DynamicImage,
}

impl<'a> PngRegionEncoder<'a> {
    pub fn new(image: &'a DynamicImage) -> Self {
        Self { image }
    }
}

impl RegionEncoder for PngRegionEncoder<'_> {
    fn encode_region(&self, region: &Region) -> Result<Vec<u8>, EncodeError> {
        if region.is_empty() {
            return Err(EncodeError::ZeroDimension);
        }
        let (width, height) = self.image.dimensions();
        if region.right() > width || region.bottom() > height {
            return Err(EncodeError::OutOfBounds {
                requested: *region,
                image_size: (width, height),
            });
        }

        let cropped = self
            .image
            .crop_imm(region.x, region.y, region.width, region.height);
        let mut png_bytes: Vec<u8> = Vec::new();
        cropped
            .write_to(&mut Cursor::new(&mut png_bytes), ImageFormat::Png)
            .map_err(|e| EncodeError::EncodingFailed(e.to_string()))?;

        trace!(?region, bytes = png_bytes.len(), "Encoded region");
        Ok(png_bytes)
    }
}

/// Receives the finished archive.
pub trait OutputSink {
    fn deliver(&mut self, file_name: &str, bytes: &[u8]) -> Result<(), SliceError>;
}

/// Writes delivered files into a directory, creating it if needed.
#[derive(Debug, Clone)]
pub struct DirectorySink {
    dir: PathBuf,
}

impl DirectorySink {
    pub fn new(dir: impl AsRef<Path>) -> Self {
        Self {
            dir: dir.as_ref().to_path_buf(),
        }
    }

    /// Where a delivered file with this name ends up.
    pub fn path_for(&self, file_name: &str) -> PathBuf {
        self.dir.join(file_name)
    }
}

impl OutputSink for DirectorySink {
    fn deliver(&mut self, file_name: &str, bytes: &[u8]) -> Result<(), SliceError> {
        fs::create_dir_all(&self.dir)?;
        let path = self.path_for(file_name);
        fs::write(&path, bytes)?;
        info!(path = %path.display(), bytes = bytes.len(), "Wrote archive");
        Ok(())
    }
}

/// Configuration for the export pipeline.
///
/// # Example
/// ```
/// use slicer::ExportConfig;
///
/// let config = ExportConfig::default();
/// assert_eq!(config.enable_parallel, true);
/// assert_eq!(config.default_base_name, "image");
/// ```
#[derive(Debug, Clone)]
pub struct ExportConfig {
    /// Encode regions on the rayon pool (default: true). Entry order is the same
    /// either way.
    pub enable_parallel: bool,
    /// Base name when the source file name is missing or empty (default: "image")
    pub default_base_name: String,
}

impl ExportConfig {
    pub fn new(enable_parallel: bool, default_base_name: impl Into<String>) -> Self {
        let default_base_name = default_base_name.into();
        Self {
            default_base_name: if default_base_name.is_empty() {
                DEFAULT_BASE_NAME.to_string()
            } else {
                default_base_name
            },
            enable_parallel,
        }
    }
}

impl Default for ExportConfig {
    fn default() -> Self {
        ExportConfig::new(true, DEFAULT_BASE_NAME)
    }
}

/// What a successful export delivered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportSummary {
    pub file_name: String,
    pub entries: usize,
    pub dropped: usize,
    pub bytes: usize,
}

/// Drives partitioning, encoding and archiving.
///
/// # Example
/// ```
/// use slicer::*;
///
/// let mut store = SliceStore::new();
/// store.load_frame(ImageFrame::new(10, 10).unwrap());
/// store.add_line(Orientation::Vertical, 4, 5);
///
/// let encoder = |region: &Region| Ok::<_, EncodeError>(vec![region.width as u8]);
/// let mut delivered = Vec::new();
/// let mut sink = |name: &str, bytes: &[u8]| {
///     delivered.push((name.to_string(), bytes.len()));
/// };
///
/// let summary = Exporter::default()
///     .export_store(&store, Some("tiles.png"), &encoder, &mut CallbackSink(&mut sink))
///     .unwrap()
///     .unwrap();
/// assert_eq!(summary.file_name, "tiles-slices.zip");
/// assert_eq!(summary.entries, 2);
/// assert_eq!(delivered[0].0, "tiles-slices.zip");
/// ```
#[derive(Debug, Clone, Default)]
pub struct Exporter {
    config: ExportConfig,
}

impl Exporter {
    pub fn new(config: ExportConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ExportConfig {
        &self.config
    }

    /// Encodes every region of `layout` and names the successes.
    ///
    /// Entries follow partition order and are named by the region's 1-based index,
    /// so a failed region leaves a gap in the numbering. Returns the entries and the
    /// number of regions dropped.
    pub fn collect_entries<E>(
        &self,
        layout: &Layout,
        base: &str,
        encoder: &E,
    ) -> (Vec<ArchiveEntry>, usize)
    where
        E: RegionEncoder + ?Sized,
    {
        let regions = layout.partition();
        let encoded: Vec<Result<Vec<u8>, EncodeError>> = if self.config.enable_parallel {
            regions
                .par_iter()
                .map(|region| encoder.encode_region(region))
                .collect()
        } else {
            regions
                .iter()
                .map(|region| encoder.encode_region(region))
                .collect()
        };

        let mut dropped = 0;
        let entries = regions
            .iter()
            .zip(encoded)
            .enumerate()
            .filter_map(|(index, (region, result))| match result {
                Ok(bytes) => Some(ArchiveEntry::new(entry_file_name(base, index + 1), bytes)),
                Err(e) => {
                    warn!(?region, error = %e, "Dropping region that failed to encode");
                    dropped += 1;
                    None
                }
            })
            .collect();
        (entries, dropped)
    }

    /// Runs the whole export on one layout snapshot.
    ///
    /// Returns `Ok(None)` without touching the sink when no region could be
    /// encoded.
    ///
    /// # Errors
    /// Fails if the archive cannot be represented or the sink fails.
    pub fn export<E, S>(
        &self,
        layout: &Layout,
        source_name: Option<&str>,
        encoder: &E,
        sink: &mut S,
    ) -> Result<Option<ExportSummary>, SliceError>
    where
        E: RegionEncoder + ?Sized,
        S: OutputSink + ?Sized,
    {
        let base = base_name_or(source_name, &self.config.default_base_name);
        let (entries, dropped) = self.collect_entries(layout, &base, encoder);
        if entries.is_empty() {
            info!(dropped, "No regions encoded, nothing to export");
            return Ok(None);
        }

        let archive = build_archive(&entries)?;
        let file_name = archive_file_name(&base);
        debug!(%file_name, entries = entries.len(), dropped, "Delivering archive");
        sink.deliver(&file_name, &archive)?;

        Ok(Some(ExportSummary {
            file_name,
            entries: entries.len(),
            dropped,
            bytes: archive.len(),
        }))
    }

    /// Exports the store's current layout; `Ok(None)` when no image is loaded.
    pub fn export_store<E, S>(
        &self,
        store: &SliceStore,
        source_name: Option<&str>,
        encoder: &E,
        sink: &mut S,
    ) -> Result<Option<ExportSummary>, SliceError>
    where
        E: RegionEncoder + ?Sized,
        S: OutputSink + ?Sized,
    {
        match store.snapshot() {
            Some(layout) => self.export(&layout, source_name, encoder, sink),
            None => {
                debug!("No image loaded, export skipped");
                Ok(None)
            }
        }
    }
}

/// Adapts a closure into an [`OutputSink`] that cannot fail.
pub struct CallbackSink<'a, F: FnMut(&str, &[u8])>(pub &'a mut F);

impl<F: FnMut(&str, &[u8])> OutputSink for CallbackSink<'_, F> {
    fn deliver(&mut self, file_name: &str, bytes: &[u8]) -> Result<(), SliceError> {
        (self.0)(file_name, bytes);
        Ok(())
    }
}
