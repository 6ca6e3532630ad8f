//! slicer CLI - cut an image along slice lines and write the pieces as a zip archive

use std::{path::PathBuf, str::FromStr};

use anyhow::{bail, Context, Result};
use clap::Parser;
use slicer::{
    DirectorySink, ExportConfig, Exporter, ImageFrame, Orientation, PngRegionEncoder, SliceStore,
};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

/// One `-l` argument: `h:<y>[@<x>]` or `v:<x>[@<y>]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct LineSpec {
    orientation: Orientation,
    position: u32,
    anchor: Option<u32>,
}

impl FromStr for LineSpec {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (kind, rest) = s.split_once(':').ok_or_else(|| {
            format!("expected `h:<pos>[@<anchor>]` or `v:<pos>[@<anchor>]`, got `{s}`")
        })?;
        let orientation = match kind.trim().to_ascii_lowercase().as_str() {
            "h" | "horizontal" => Orientation::Horizontal,
            "v" | "vertical" => Orientation::Vertical,
            other => return Err(format!("unknown line kind `{other}`")),
        };
        let (position, anchor) = match rest.split_once('@') {
            Some((position, anchor)) => (position, Some(anchor)),
            None => (rest, None),
        };
        let number = |text: &str| {
            text.trim()
                .parse::<u32>()
                .map_err(|e| format!("invalid coordinate `{text}`: {e}"))
        };
        Ok(Self {
            orientation,
            position: number(position)?,
            anchor: anchor.map(number).transpose()?,
        })
    }
}

#[derive(Parser)]
#[command(name = "slicer", about = "Slice an image into pieces along cut lines")]
struct Args {
    /// Input image file
    input: PathBuf,
    /// Slice line, `h:<y>[@<x>]` or `v:<x>[@<y>]`; applied in order
    #[arg(short, long = "line", value_name = "SPEC")]
    lines: Vec<LineSpec>,
    /// Directory the archive is written to
    #[arg(short, long, default_value = ".")]
    output: PathBuf,
    /// Also save the image with the slice overlay drawn on it
    #[cfg(feature = "debug")]
    #[arg(long, value_name = "PNG")]
    preview: Option<PathBuf>,
    /// Encode regions one after another instead of in parallel
    #[arg(long)]
    sequential: bool,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();

    let img = image::open(&args.input)
        .with_context(|| format!("Failed to open image {}", args.input.display()))?;
    let frame = ImageFrame::try_from(&img).context("Image has no pixels")?;

    let mut store = SliceStore::new();
    store.load_frame(frame);
    for spec in &args.lines {
        let anchor = spec
            .anchor
            .unwrap_or_else(|| frame.cross_extent(spec.orientation) / 2);
        if store.add_line(spec.orientation, spec.position, anchor).is_none() {
            bail!("Could not place line {spec:?}");
        }
    }
    let Some(layout) = store.snapshot() else {
        bail!("No image loaded");
    };

    #[cfg(feature = "debug")]
    if let Some(preview) = &args.preview {
        slicer::debug::save_image_with_slices(
            &img,
            &layout,
            preview,
            &slicer::drawing::OverlayConfig::default(),
        )
        .context("Failed to save preview")?;
        info!(path = %preview.display(), "Saved preview");
    }

    std::fs::create_dir_all(&args.output)
        .with_context(|| format!("Failed to create {}", args.output.display()))?;
    let exporter = Exporter::new(ExportConfig {
        enable_parallel: !args.sequential,
        ..ExportConfig::default()
    });
    let source_name = args.input.file_name().and_then(|name| name.to_str());
    let encoder = PngRegionEncoder::new(&img);
    let mut sink = DirectorySink::new(&args.output);

    match exporter
        .export(&layout, source_name, &encoder, &mut sink)
        .context("Export failed")?
    {
        Some(summary) => info!(
            path = %sink.path_for(&summary.file_name).display(),
            entries = summary.entries,
            dropped = summary.dropped,
            bytes = summary.bytes,
            "Wrote archive"
        ),
        None => warn!("No region could be encoded, nothing written"),
    }

    Ok(())
}
