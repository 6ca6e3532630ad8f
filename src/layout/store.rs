use tracing::{debug, trace};

use super::{ImageFrame, Layout, LineId, Orientation, SliceLine};

/// Owns the slice lines of the currently loaded image.
///
/// Every mutation is a silent no-op while no frame is loaded. Readers get either
/// shared references or an owned [`Layout`] snapshot, never mutable access to the
/// collections.
///
/// # Example
/// ```
/// use slicer::{ImageFrame, Orientation, SliceStore, Span};
///
/// let mut store = SliceStore::new();
/// assert_eq!(store.add_line(Orientation::Vertical, 50, 0), None);
///
/// store.load_frame(ImageFrame::new(100, 100).unwrap());
/// let vertical = store.add_line(Orientation::Vertical, 50, 0).unwrap();
/// let horizontal = store.add_line(Orientation::Horizontal, 30, 20).unwrap();
///
/// let layout = store.snapshot().unwrap();
/// let line = layout.get(horizontal).unwrap();
/// assert_eq!(line.upper_neighbor, Some(vertical));
/// assert_eq!(layout.resolved_span(line), Span::new(0, 50));
/// ```
#[derive(Debug, Default)]
pub struct SliceStore {
    layout: Option<Layout>,
    next_id: u64,
}

impl SliceStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the image frame and discards every existing line.
    pub fn load_frame(&mut self, frame: ImageFrame) {
        debug!(
            width = frame.width(),
            height = frame.height(),
            "Loaded image frame"
        );
        self.layout = Some(Layout::new(frame));
    }

    pub fn frame(&self) -> Option<ImageFrame> {
        self.layout.as_ref().map(Layout::frame)
    }

    /// Adds a line and returns its id, or `None` when no frame is loaded.
    ///
    /// `position` is clamped to the frame. The neighbor bounds are picked from the
    /// current perpendicular lines by [`Layout::neighbors_at`] and stay fixed from
    /// then on.
    pub fn add_line(
        &mut self,
        orientation: Orientation,
        position: u32,
        anchor: u32,
    ) -> Option<LineId> {
        let layout = self.layout.as_mut()?;
        let frame = layout.frame();
        let position = frame.clamp_position(orientation, position);
        let anchor = frame.clamp_anchor(orientation, anchor);
        let (lower, upper) = layout.neighbors_at(orientation, position, anchor);

        self.next_id += 1;
        let id = LineId(self.next_id);
        layout.push(SliceLine::new(id, orientation, position, anchor).with_neighbors(lower, upper));

        debug!(%id, ?orientation, position, anchor, ?lower, ?upper, "Added slice line");
        Some(id)
    }

    /// Moves a line to a new (clamped) position. Neighbor ids are left untouched.
    ///
    /// Returns `false` if there is no frame or no line with this id.
    pub fn move_line(&mut self, id: LineId, position: u32) -> bool {
        let Some(layout) = self.layout.as_mut() else {
            return false;
        };
        let frame = layout.frame();
        let Some(line) = layout.get_mut(id) else {
            trace!(%id, "Move ignored, unknown line");
            return false;
        };
        line.position = frame.clamp_position(line.orientation, position);
        debug!(%id, position = line.position, "Moved slice line");
        true
    }

    /// Removes a line. Other lines that name it as a neighbor keep the stale id and
    /// fall back to the image edge on that side.
    pub fn remove_line(&mut self, id: LineId) -> bool {
        let Some(layout) = self.layout.as_mut() else {
            return false;
        };
        match layout.remove(id) {
            Some(removed) => {
                let dependents = layout.all_lines().filter(|l| l.references(id)).count();
                debug!(%id, orientation = ?removed.orientation, dependents, "Removed slice line");
                true
            }
            None => false,
        }
    }

    /// Removes every line of both orientations, keeping the frame.
    pub fn clear(&mut self) {
        if let Some(layout) = self.layout.as_mut() {
            layout.clear();
            debug!("Cleared slice lines");
        }
    }

    pub fn get(&self, id: LineId) -> Option<&SliceLine> {
        self.layout.as_ref().and_then(|layout| layout.get(id))
    }

    /// Lines of one orientation in insertion order; empty when no frame is loaded.
    pub fn lines(&self, orientation: Orientation) -> impl Iterator<Item = &SliceLine> {
        self.layout
            .iter()
            .flat_map(move |layout| layout.lines(orientation))
    }

    /// An owned copy of the current layout, or `None` when no frame is loaded.
    pub fn snapshot(&self) -> Option<Layout> {
        self.layout.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Region, Span};
    use pretty_assertions::assert_eq;

    fn loaded(width: u32, height: u32) -> SliceStore {
        let mut store = SliceStore::new();
        store.load_frame(ImageFrame::new(width, height).unwrap());
        store
    }

    #[test]
    fn test_operations_without_frame_are_noops() {
        let mut store = SliceStore::new();
        assert_eq!(store.add_line(Orientation::Horizontal, 10, 10), None);
        assert!(!store.move_line(LineId(1), 20));
        assert!(!store.remove_line(LineId(1)));
        store.clear();
        assert!(store.snapshot().is_none());
        assert_eq!(store.lines(Orientation::Horizontal).count(), 0);
    }

    #[test]
    fn test_add_line_clamps_position_and_anchor() {
        let mut store = loaded(100, 50);
        let id = store.add_line(Orientation::Horizontal, 80, 400).unwrap();
        let line = store.get(id).unwrap();
        assert_eq!(line.position, 50);
        assert_eq!(line.anchor, 100);
    }

    #[test]
    fn test_ids_are_unique_across_frames() {
        let mut store = loaded(100, 100);
        let first = store.add_line(Orientation::Horizontal, 10, 0).unwrap();
        store.load_frame(ImageFrame::new(100, 100).unwrap());
        let second = store.add_line(Orientation::Horizontal, 10, 0).unwrap();
        assert_ne!(first, second);
    }

    #[test]
    fn test_load_frame_discards_lines() {
        let mut store = loaded(100, 100);
        store.add_line(Orientation::Vertical, 10, 0);
        store.load_frame(ImageFrame::new(20, 20).unwrap());
        assert_eq!(store.lines(Orientation::Vertical).count(), 0);
        assert_eq!(store.frame(), Some(ImageFrame::new(20, 20).unwrap()));
    }

    #[test]
    fn test_neighbors_are_captured_at_creation() {
        let mut store = loaded(100, 100);
        let left = store.add_line(Orientation::Vertical, 20, 50).unwrap();
        let right = store.add_line(Orientation::Vertical, 80, 50).unwrap();
        let horizontal = store.add_line(Orientation::Horizontal, 50, 50).unwrap();

        let line = store.get(horizontal).unwrap();
        assert_eq!(line.lower_neighbor, Some(left));
        assert_eq!(line.upper_neighbor, Some(right));

        // A closer vertical added later does not rebind the horizontal line
        store.add_line(Orientation::Vertical, 60, 50);
        let line = store.get(horizontal).unwrap();
        assert_eq!(line.upper_neighbor, Some(right));
    }

    #[test]
    fn test_move_line_keeps_neighbors_and_moves_span() {
        let mut store = loaded(100, 100);
        let vertical = store.add_line(Orientation::Vertical, 40, 50).unwrap();
        let horizontal = store.add_line(Orientation::Horizontal, 50, 10).unwrap();

        assert!(store.move_line(vertical, 70));
        assert!(store.move_line(horizontal, 1000));

        let layout = store.snapshot().unwrap();
        let line = layout.get(horizontal).unwrap();
        assert_eq!(line.position, 100);
        assert_eq!(line.upper_neighbor, Some(vertical));
        assert_eq!(layout.resolved_span(line), Span::new(0, 70));
    }

    #[test]
    fn test_remove_neighbor_leaves_dependent_resolvable() {
        let mut store = loaded(100, 100);
        let vertical = store.add_line(Orientation::Vertical, 50, 50).unwrap();
        let horizontal = store.add_line(Orientation::Horizontal, 50, 25).unwrap();

        assert!(store.remove_line(vertical));
        assert!(!store.remove_line(vertical));

        let layout = store.snapshot().unwrap();
        let line = layout.get(horizontal).unwrap();
        assert_eq!(line.upper_neighbor, Some(vertical));
        assert_eq!(layout.resolved_span(line), Span::new(0, 100));
        assert_eq!(
            layout.partition(),
            vec![Region::new(0, 0, 100, 50), Region::new(0, 50, 100, 50)]
        );
    }

    #[test]
    fn test_clear_keeps_frame() {
        let mut store = loaded(100, 100);
        store.add_line(Orientation::Vertical, 50, 50);
        store.add_line(Orientation::Horizontal, 50, 50);
        store.clear();
        let layout = store.snapshot().unwrap();
        assert!(layout.is_empty());
        assert_eq!(layout.partition(), vec![Region::new(0, 0, 100, 100)]);
    }

    #[test]
    fn test_snapshot_is_detached_from_store() {
        let mut store = loaded(100, 100);
        let id = store.add_line(Orientation::Horizontal, 50, 50).unwrap();
        let snapshot = store.snapshot().unwrap();
        store.move_line(id, 10);
        store.add_line(Orientation::Vertical, 30, 30);
        assert_eq!(snapshot.get(id).unwrap().position, 50);
        assert_eq!(snapshot.line_count(), 1);
    }

    #[test]
    fn test_lines_in_insertion_order() {
        let mut store = loaded(100, 100);
        let ids: Vec<LineId> = [70, 10, 40]
            .into_iter()
            .filter_map(|y| store.add_line(Orientation::Horizontal, y, 0))
            .collect();
        let listed: Vec<LineId> = store.lines(Orientation::Horizontal).map(|l| l.id).collect();
        assert_eq!(listed, ids);
    }
}
