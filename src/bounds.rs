//! Nearest-neighbor lookup along a single axis.
//!
//! Used when a new line is placed, to find the perpendicular lines that bound it,
//! and by hover feedback to preview the span a line would get.

use tracing::trace;

/// A closed interval `[start, end]` along one axis.
///
/// # Example
/// ```
/// use slicer::Span;
///
/// let span = Span::new(10, 50);
/// assert!(span.covers(10, 50));
/// assert!(!span.covers(5, 20));
/// assert_eq!(span.len(), 40);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Span {
    pub start: u32,
    pub end: u32,
}

impl Span {
    pub fn new(start: u32, end: u32) -> Self {
        Self { start, end }
    }

    /// Returns `true` when `[from, to]` lies entirely inside the span.
    ///
    /// An inverted span (start past end, possible after neighbors were dragged across
    /// each other) covers nothing.
    pub fn covers(&self, from: u32, to: u32) -> bool {
        self.start <= self.end && self.start <= from && to <= self.end
    }

    pub fn contains(&self, value: u32) -> bool {
        self.covers(value, value)
    }

    pub fn len(&self) -> u32 {
        self.end.saturating_sub(self.start)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Finds the nearest positions on each side of `query`.
///
/// Returns the greatest position strictly below `query` and the smallest position
/// greater than or equal to it. A position equal to `query` always counts as the
/// right-hand neighbor.
///
/// # Example
/// ```
/// use slicer::nearest_neighbors;
///
/// assert_eq!(nearest_neighbors(&[30, 10, 20], 20), (Some(10), Some(20)));
/// assert_eq!(nearest_neighbors(&[], 5), (None, None));
/// ```
pub fn nearest_neighbors(positions: &[u32], query: u32) -> (Option<u32>, Option<u32>) {
    let mut sorted = positions.to_vec();
    sorted.sort_unstable();

    let split = sorted.partition_point(|&position| position < query);
    let left = split.checked_sub(1).map(|index| sorted[index]);
    let right = sorted.get(split).copied();

    trace!(query, ?left, ?right, "Resolved nearest neighbors");
    (left, right)
}
