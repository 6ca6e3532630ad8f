use std::collections::VecDeque;

/// Position of an elementary cell in the grid, by column and row index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CellIndex {
    pub col: usize,
    pub row: usize,
}

impl CellIndex {
    pub fn new(col: usize, row: usize) -> Self {
        Self { col, row }
    }
}

/// A set of mutually reachable cells, sorted row-major.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Component {
    cells: Vec<CellIndex>,
}

impl Component {
    pub fn cells(&self) -> &[CellIndex] {
        &self.cells
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Smallest and largest cell index of the component's bounding box.
    pub fn bounding_box(&self) -> Option<(CellIndex, CellIndex)> {
        let first = *self.cells.first()?;
        Some(self.cells.iter().fold((first, first), |(min, max), cell| {
            (
                CellIndex::new(min.col.min(cell.col), min.row.min(cell.row)),
                CellIndex::new(max.col.max(cell.col), max.row.max(cell.row)),
            )
        }))
    }

    /// Returns `true` when the component fills its bounding box with no holes.
    pub fn is_rectangle(&self) -> bool {
        self.bounding_box().is_some_and(|(min, max)| {
            (max.col - min.col + 1) * (max.row - min.row + 1) == self.cells.len()
        })
    }
}

/// Splits a `columns` x `rows` grid of cells into connected components.
///
/// Two side-adjacent cells are connected unless `blocked` returns `true` for them.
/// `blocked` always receives the lower-indexed cell first (left before right, top
/// before bottom). Components are returned in row-major order of their first cell.
///
/// # Example
/// ```
/// use slicer::partition::components::{connected_components, CellIndex};
///
/// // A wall between column 0 and column 1 on every row
/// let components = connected_components(2, 3, |a: CellIndex, b: CellIndex| a.col != b.col);
/// assert_eq!(components.len(), 2);
/// assert!(components.iter().all(|c| c.len() == 3 && c.is_rectangle()));
/// ```
pub fn connected_components(
    columns: usize,
    rows: usize,
    blocked: impl Fn(CellIndex, CellIndex) -> bool,
) -> Vec<Component> {
    let slot = |cell: CellIndex| cell.row * columns + cell.col;
    let mut visited = vec![false; columns * rows];
    let mut components = Vec::new();

    for row in 0..rows {
        for col in 0..columns {
            let start = CellIndex::new(col, row);
            if visited[slot(start)] {
                continue;
            }
            visited[slot(start)] = true;

            let mut cells = Vec::new();
            let mut queue = VecDeque::from([start]);
            while let Some(cell) = queue.pop_front() {
                cells.push(cell);
                for next in side_neighbors(cell, columns, rows) {
                    if visited[slot(next)] {
                        continue;
                    }
                    let (first, second) = if next < cell { (next, cell) } else { (cell, next) };
                    if blocked(first, second) {
                        continue;
                    }
                    visited[slot(next)] = true;
                    queue.push_back(next);
                }
            }

            cells.sort_by_key(|cell| (cell.row, cell.col));
            components.push(Component { cells });
        }
    }

    components
}

fn side_neighbors(cell: CellIndex, columns: usize, rows: usize) -> impl Iterator<Item = CellIndex> {
    let CellIndex { col, row } = cell;
    [
        col.checked_sub(1).map(|c| CellIndex::new(c, row)),
        (col + 1 < columns).then(|| CellIndex::new(col + 1, row)),
        row.checked_sub(1).map(|r| CellIndex::new(col, r)),
        (row + 1 < rows).then(|| CellIndex::new(col, row + 1)),
    ]
    .into_iter()
    .flatten()
}
