//! Turns a [`Layout`] into rectangular regions that tile the image frame.
//!
//! Every distinct line position on each axis (plus the frame edges) defines a grid of
//! elementary cells. Two side-adjacent cells are separated only when a line sits on
//! their shared edge and its resolved span covers that whole edge. The connected
//! groups of cells are then emitted as regions: one region for a group that forms a
//! solid rectangle, one region per cell otherwise.

pub mod components;

use std::collections::BTreeMap;

use imageproc::rect::Rect;
use smallvec::SmallVec;
use tracing::debug;

use crate::{Layout, Orientation, Span};
use components::{connected_components, CellIndex, Component};

/// An axis-aligned rectangle in pixel coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Region {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl Region {
    pub fn new(x: u32, y: u32, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn right(&self) -> u32 {
        self.x + self.width
    }

    pub fn bottom(&self) -> u32 {
        self.y + self.height
    }

    pub fn area(&self) -> u64 {
        u64::from(self.width) * u64::from(self.height)
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// Returns `true` if the two regions share any pixel.
    pub fn overlaps(&self, other: &Region) -> bool {
        self.x < other.right()
            && other.x < self.right()
            && self.y < other.bottom()
            && other.y < self.bottom()
    }
}

impl From<&Region> for Rect {
    fn from(region: &Region) -> Self {
        Rect::at(region.x as i32, region.y as i32).of_size(region.width, region.height)
    }
}

/// Spans of the lines sitting at each boundary position of one axis.
type CutMap = BTreeMap<u32, SmallVec<[Span; 4]>>;

/// Partitions the frame of `layout` into regions.
///
/// The regions tile the frame exactly once and come back sorted top-to-bottom, then
/// left-to-right, so the order is reproducible for identical layouts.
///
/// # Example
/// ```
/// use slicer::*;
///
/// let layout = Layout::with_lines(ImageFrame::new(100, 100).unwrap(), [slice_line!(H, 1, 50, 0)]);
/// assert_eq!(
///     partition(&layout),
///     vec![Region::new(0, 0, 100, 50), Region::new(0, 50, 100, 50)]
/// );
/// ```
pub fn partition(layout: &Layout) -> Vec<Region> {
    let frame = layout.frame();
    let xs = boundaries(frame.width(), layout, Orientation::Vertical);
    let ys = boundaries(frame.height(), layout, Orientation::Horizontal);
    let vertical_cuts = cut_map(layout, Orientation::Vertical);
    let horizontal_cuts = cut_map(layout, Orientation::Horizontal);

    let columns = xs.len().saturating_sub(1);
    let rows = ys.len().saturating_sub(1);

    let blocked = |a: CellIndex, b: CellIndex| {
        if a.row == b.row {
            // Left/right neighbors share a vertical edge at xs[b.col]
            is_cut(&vertical_cuts, xs[b.col], ys[a.row], ys[a.row + 1])
        } else {
            // Top/bottom neighbors share a horizontal edge at ys[b.row]
            is_cut(&horizontal_cuts, ys[b.row], xs[a.col], xs[a.col + 1])
        }
    };
    let components = connected_components(columns, rows, blocked);

    let mut regions: Vec<Region> = components
        .iter()
        .flat_map(|component| component_regions(component, &xs, &ys))
        .filter(|region| !region.is_empty())
        .collect();
    regions.sort_by_key(|region| (region.y, region.x));

    debug!(
        columns,
        rows,
        components = components.len(),
        regions = regions.len(),
        "Partitioned frame"
    );
    regions
}

/// Sorted, deduplicated cut positions on one axis, including both frame edges.
fn boundaries(extent: u32, layout: &Layout, orientation: Orientation) -> Vec<u32> {
    let mut positions: Vec<u32> = std::iter::once(0)
        .chain(layout.lines(orientation).map(|line| line.position.min(extent)))
        .chain(std::iter::once(extent))
        .collect();
    positions.sort_unstable();
    positions.dedup();
    positions
}

fn cut_map(layout: &Layout, orientation: Orientation) -> CutMap {
    let mut cuts = CutMap::new();
    for line in layout.lines(orientation) {
        cuts.entry(line.position)
            .or_default()
            .push(layout.resolved_span(line));
    }
    cuts
}

/// Whether some line at `position` covers the whole edge `[from, to]`.
fn is_cut(cuts: &CutMap, position: u32, from: u32, to: u32) -> bool {
    cuts.get(&position)
        .is_some_and(|spans| spans.iter().any(|span| span.covers(from, to)))
}

fn component_regions(component: &Component, xs: &[u32], ys: &[u32]) -> Vec<Region> {
    let cell_region = |min: CellIndex, max: CellIndex| {
        Region::new(
            xs[min.col],
            ys[min.row],
            xs[max.col + 1] - xs[min.col],
            ys[max.row + 1] - ys[min.row],
        )
    };

    match component.bounding_box() {
        Some((min, max)) if component.is_rectangle() => vec![cell_region(min, max)],
        _ => component
            .cells()
            .iter()
            .map(|&cell| cell_region(cell, cell))
            .collect(),
    }
}
