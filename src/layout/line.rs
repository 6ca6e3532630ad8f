use std::fmt;

/// Orientation of a slice line.
///
/// A horizontal line cuts along Y (its position is a Y value), a vertical line cuts
/// along X.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub enum Orientation {
    Horizontal,
    Vertical,
}

impl Orientation {
    /// Returns the other orientation.
    ///
    /// # Example
    /// ```
    /// use slicer::Orientation;
    ///
    /// assert_eq!(Orientation::Horizontal.perpendicular(), Orientation::Vertical);
    /// ```
    pub fn perpendicular(self) -> Self {
        match self {
            Orientation::Horizontal => Orientation::Vertical,
            Orientation::Vertical => Orientation::Horizontal,
        }
    }
}

/// Opaque identifier of a slice line, unique within one [`SliceStore`](crate::SliceStore).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct LineId(pub u64);

impl fmt::Display for LineId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A single cut line.
///
/// `lower_neighbor` and `upper_neighbor` name the perpendicular lines that bound the
/// line along its own axis (left/right for a horizontal line, top/bottom for a
/// vertical one). `None` means the image edge. They are captured when the line is
/// added and never recomputed; see [`Layout::resolved_span`](crate::Layout::resolved_span).
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct SliceLine {
    pub id: LineId,
    pub orientation: Orientation,
    /// Coordinate on the perpendicular axis (Y for horizontal, X for vertical).
    pub position: u32,
    /// Coordinate on the line's own axis where it was placed.
    pub anchor: u32,
    pub lower_neighbor: Option<LineId>,
    pub upper_neighbor: Option<LineId>,
}

impl SliceLine {
    /// Creates a line bounded by the image edges.
    pub fn new(id: LineId, orientation: Orientation, position: u32, anchor: u32) -> Self {
        Self {
            id,
            orientation,
            position,
            anchor,
            lower_neighbor: None,
            upper_neighbor: None,
        }
    }

    pub fn with_neighbors(mut self, lower: Option<LineId>, upper: Option<LineId>) -> Self {
        self.lower_neighbor = lower;
        self.upper_neighbor = upper;
        self
    }

    /// Returns `true` if either neighbor slot refers to `id`.
    pub fn references(&self, id: LineId) -> bool {
        self.lower_neighbor == Some(id) || self.upper_neighbor == Some(id)
    }
}
