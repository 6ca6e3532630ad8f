//! Slice-line model: the image frame, the cut lines and the store that mutates them.

mod frame;
mod line;
mod store;

pub use frame::ImageFrame;
pub use line::{LineId, Orientation, SliceLine};
pub use store::SliceStore;

use crate::{bounds::nearest_neighbors, partition::Region, SmallVecLine, Span};
use tracing::trace;

/// An immutable view of every line on one image frame.
///
/// [`SliceStore`] owns the live layout; [`SliceStore::snapshot`] hands out clones so an
/// export always works on one consistent state.
///
/// # Example
/// ```
/// use slicer::*;
///
/// let frame = ImageFrame::new(100, 100).unwrap();
/// let layout = Layout::with_lines(frame, [slice_line!(H, 1, 50, 0)]);
/// assert_eq!(layout.resolved_span(layout.get(LineId(1)).unwrap()), Span::new(0, 100));
/// ```
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Layout {
    frame: ImageFrame,
    horizontal: SmallVecLine<SliceLine>,
    vertical: SmallVecLine<SliceLine>,
}

impl Layout {
    /// Creates a layout with no lines.
    pub fn new(frame: ImageFrame) -> Self {
        Self {
            frame,
            horizontal: SmallVecLine::new(),
            vertical: SmallVecLine::new(),
        }
    }

    /// Creates a layout from prebuilt lines. Positions are clamped to the frame;
    /// neighbor ids are kept as given.
    pub fn with_lines(frame: ImageFrame, lines: impl IntoIterator<Item = SliceLine>) -> Self {
        let mut layout = Self::new(frame);
        for line in lines {
            layout.push(line);
        }
        layout
    }

    pub fn frame(&self) -> ImageFrame {
        self.frame
    }

    /// Lines of one orientation in insertion order.
    pub fn lines(&self, orientation: Orientation) -> impl Iterator<Item = &SliceLine> {
        self.collection(orientation).iter()
    }

    pub fn all_lines(&self) -> impl Iterator<Item = &SliceLine> {
        self.horizontal.iter().chain(self.vertical.iter())
    }

    pub fn line_count(&self) -> usize {
        self.horizontal.len() + self.vertical.len()
    }

    pub fn is_empty(&self) -> bool {
        self.line_count() == 0
    }

    pub fn get(&self, id: LineId) -> Option<&SliceLine> {
        self.all_lines().find(|line| line.id == id)
    }

    /// Resolves one neighbor slot of `line` to a coordinate on the line's own axis.
    ///
    /// This is the only place neighbor ids are turned into positions. A missing or
    /// dangling id falls back to `edge`.
    fn resolve_neighbor(&self, line: &SliceLine, neighbor: Option<LineId>, edge: u32) -> u32 {
        neighbor
            .and_then(|id| {
                self.lines(line.orientation.perpendicular())
                    .find(|candidate| candidate.id == id)
            })
            .map_or(edge, |bound| bound.position)
    }

    /// The stretch of its own axis that `line` actually cuts.
    ///
    /// Bounded by the current positions of its recorded neighbors, or by the image
    /// edges where a neighbor is absent or has been removed.
    pub fn resolved_span(&self, line: &SliceLine) -> Span {
        let extent = self.frame.cross_extent(line.orientation);
        let start = self.resolve_neighbor(line, line.lower_neighbor, 0);
        let end = self.resolve_neighbor(line, line.upper_neighbor, extent);
        Span::new(start, end)
    }

    /// Picks the perpendicular lines that would bound a new line placed at
    /// `(position, anchor)`.
    ///
    /// Only perpendicular lines whose own span crosses `position` are considered;
    /// among those the nearest on each side of `anchor` wins, a line exactly at
    /// `anchor` counting as the upper bound.
    pub fn neighbors_at(
        &self,
        orientation: Orientation,
        position: u32,
        anchor: u32,
    ) -> (Option<LineId>, Option<LineId>) {
        let position = self.frame.clamp_position(orientation, position);
        let anchor = self.frame.clamp_anchor(orientation, anchor);

        let candidates: Vec<&SliceLine> = self
            .lines(orientation.perpendicular())
            .filter(|candidate| self.resolved_span(candidate).contains(position))
            .collect();
        let positions: Vec<u32> = candidates.iter().map(|c| c.position).collect();
        let (lower, upper) = nearest_neighbors(&positions, anchor);

        let id_at = |target: Option<u32>| {
            target.and_then(|target| {
                candidates
                    .iter()
                    .find(|candidate| candidate.position == target)
                    .map(|candidate| candidate.id)
            })
        };
        let neighbors = (id_at(lower), id_at(upper));
        trace!(?orientation, position, anchor, ?neighbors, "Picked neighbors");
        neighbors
    }

    /// The span a line placed at `(position, anchor)` would get, for hover feedback.
    pub fn preview_span(&self, orientation: Orientation, position: u32, anchor: u32) -> Span {
        let (lower, upper) = self.neighbors_at(orientation, position, anchor);
        let probe = SliceLine::new(LineId(u64::MAX), orientation, position, anchor)
            .with_neighbors(lower, upper);
        self.resolved_span(&probe)
    }

    /// Partitions the frame along the current lines. See [`crate::partition`].
    pub fn partition(&self) -> Vec<Region> {
        crate::partition(self)
    }

    fn collection(&self, orientation: Orientation) -> &SmallVecLine<SliceLine> {
        match orientation {
            Orientation::Horizontal => &self.horizontal,
            Orientation::Vertical => &self.vertical,
        }
    }

    fn collection_mut(&mut self, orientation: Orientation) -> &mut SmallVecLine<SliceLine> {
        match orientation {
            Orientation::Horizontal => &mut self.horizontal,
            Orientation::Vertical => &mut self.vertical,
        }
    }

    pub(crate) fn push(&mut self, mut line: SliceLine) {
        line.position = self.frame.clamp_position(line.orientation, line.position);
        self.collection_mut(line.orientation).push(line);
    }

    pub(crate) fn get_mut(&mut self, id: LineId) -> Option<&mut SliceLine> {
        self.horizontal
            .iter_mut()
            .chain(self.vertical.iter_mut())
            .find(|line| line.id == id)
    }

    pub(crate) fn remove(&mut self, id: LineId) -> Option<SliceLine> {
        for orientation in [Orientation::Horizontal, Orientation::Vertical] {
            let lines = self.collection_mut(orientation);
            if let Some(index) = lines.iter().position(|line| line.id == id) {
                return Some(lines.remove(index));
            }
        }
        None
    }

    pub(crate) fn clear(&mut self) {
        self.horizontal.clear();
        self.vertical.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::slice_line;
    use pretty_assertions::assert_eq;

    fn frame() -> ImageFrame {
        ImageFrame::new(100, 100).unwrap()
    }

    #[test]
    fn test_resolved_span_without_neighbors_is_full_width() {
        let layout = Layout::with_lines(frame(), [slice_line!(H, 1, 40, 10)]);
        let line = layout.get(LineId(1)).unwrap();
        assert_eq!(layout.resolved_span(line), Span::new(0, 100));
    }

    #[test]
    fn test_resolved_span_follows_neighbor_positions() {
        let layout = Layout::with_lines(
            frame(),
            [
                slice_line!(V, 1, 20, 50),
                slice_line!(V, 2, 70, 50),
                slice_line!(H, 3, 40, 30, Some(1), Some(2)),
            ],
        );
        let line = layout.get(LineId(3)).unwrap();
        assert_eq!(layout.resolved_span(line), Span::new(20, 70));
    }

    #[test]
    fn test_dangling_neighbor_falls_back_to_edge() {
        let layout = Layout::with_lines(frame(), [slice_line!(H, 3, 40, 30, Some(1), Some(2))]);
        let line = layout.get(LineId(3)).unwrap();
        assert_eq!(layout.resolved_span(line), Span::new(0, 100));
    }

    #[test]
    fn test_neighbor_of_same_orientation_is_ignored() {
        // Neighbor slots only ever refer to perpendicular lines
        let layout = Layout::with_lines(
            frame(),
            [
                slice_line!(H, 1, 20, 50),
                slice_line!(H, 2, 40, 30, Some(1), None),
            ],
        );
        let line = layout.get(LineId(2)).unwrap();
        assert_eq!(layout.resolved_span(line), Span::new(0, 100));
    }

    #[test]
    fn test_neighbors_at_skips_lines_not_crossing_position() {
        // The vertical at x=30 only spans y in [0, 50]
        let layout = Layout::with_lines(
            frame(),
            [
                slice_line!(H, 1, 50, 10),
                slice_line!(V, 2, 30, 10, None, Some(1)),
                slice_line!(V, 3, 60, 80),
            ],
        );
        assert_eq!(
            layout.neighbors_at(Orientation::Horizontal, 20, 45),
            (Some(LineId(2)), Some(LineId(3)))
        );
        assert_eq!(
            layout.neighbors_at(Orientation::Horizontal, 75, 45),
            (None, Some(LineId(3)))
        );
    }

    #[test]
    fn test_neighbors_at_equal_anchor_attaches_upper() {
        let layout = Layout::with_lines(frame(), [slice_line!(V, 1, 50, 0)]);
        assert_eq!(
            layout.neighbors_at(Orientation::Horizontal, 10, 50),
            (None, Some(LineId(1)))
        );
        assert_eq!(
            layout.preview_span(Orientation::Horizontal, 10, 50),
            Span::new(0, 50)
        );
    }

    #[test]
    fn test_preview_span_between_two_lines() {
        let layout = Layout::with_lines(
            frame(),
            [slice_line!(H, 1, 25, 0), slice_line!(H, 2, 75, 0)],
        );
        assert_eq!(
            layout.preview_span(Orientation::Vertical, 10, 50),
            Span::new(25, 75)
        );
    }

    #[test]
    fn test_with_lines_clamps_positions() {
        let layout = Layout::with_lines(frame(), [slice_line!(V, 1, 500, 0)]);
        assert_eq!(layout.get(LineId(1)).unwrap().position, 100);
    }
}
