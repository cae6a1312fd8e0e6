//! Sparse cell storage.

use std::collections::HashMap;

use super::hash::CoordBuildHasher;
use super::{Coord, State};

/// Inclusive bounding box. `x` is the column axis and `y` the row axis.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Bounds {
    pub lower_x: i64,
    pub upper_x: i64,
    pub lower_y: i64,
    pub upper_y: i64,
}

impl Bounds {
    fn around((row, col): Coord) -> Self {
        Self {
            lower_x: col,
            upper_x: col,
            lower_y: row,
            upper_y: row,
        }
    }

    fn grow(&mut self, (row, col): Coord) {
        self.lower_x = self.lower_x.min(col);
        self.upper_x = self.upper_x.max(col);
        self.lower_y = self.lower_y.min(row);
        self.upper_y = self.upper_y.max(row);
    }

    #[inline]
    pub fn contains(&self, (row, col): Coord) -> bool {
        (self.lower_y..=self.upper_y).contains(&row) && (self.lower_x..=self.upper_x).contains(&col)
    }

    pub fn width(&self) -> i64 {
        self.upper_x - self.lower_x + 1
    }

    pub fn height(&self) -> i64 {
        self.upper_y - self.lower_y + 1
    }
}

/// Map from coordinate to non-zero state.
///
/// State 0 is never stored: `set(c, 0)` removes `c`. The bounding box only
/// ever grows under `set`; it is a display hint and may be larger than the
/// live region. [`SparseGrid::tight_bounds`] recomputes the exact box.
#[derive(Clone, Debug, Default)]
pub struct SparseGrid {
    cells: HashMap<Coord, State, CoordBuildHasher>,
    bounds: Option<Bounds>,
}

impl PartialEq for SparseGrid {
    fn eq(&self, other: &Self) -> bool {
        self.cells == other.cells
    }
}

impl Eq for SparseGrid {}

impl SparseGrid {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(cap: usize) -> Self {
        Self {
            cells: HashMap::with_capacity_and_hasher(cap, CoordBuildHasher::default()),
            bounds: None,
        }
    }

    #[inline]
    pub fn get(&self, coord: Coord) -> State {
        self.cells.get(&coord).copied().unwrap_or(0)
    }

    /// Write `state` at `coord` and return the previous state.
    #[inline]
    pub fn set(&mut self, coord: Coord, state: State) -> State {
        if state == 0 {
            return self.cells.remove(&coord).unwrap_or(0);
        }
        match self.bounds.as_mut() {
            Some(b) => b.grow(coord),
            None => self.bounds = Some(Bounds::around(coord)),
        }
        self.cells.insert(coord, state).unwrap_or(0)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    pub fn clear(&mut self) {
        self.cells.clear();
        self.bounds = None;
    }

    /// Live cells in unspecified order.
    pub fn iter(&self) -> impl Iterator<Item = (Coord, State)> + '_ {
        self.cells.iter().map(|(&c, &s)| (c, s))
    }

    pub fn coords(&self) -> impl Iterator<Item = Coord> + '_ {
        self.cells.keys().copied()
    }

    /// The incrementally maintained, possibly loose, bounding box.
    pub fn bounds(&self) -> Option<Bounds> {
        if self.cells.is_empty() { None } else { self.bounds }
    }

    /// Exact bounding box of the live cells.
    pub fn tight_bounds(&self) -> Option<Bounds> {
        let mut cells = self.cells.keys();
        let mut bounds = Bounds::around(*cells.next()?);
        for &coord in cells {
            bounds.grow(coord);
        }
        Some(bounds)
    }

    /// Shrink the maintained box to the exact one.
    pub fn refresh_bounds(&mut self) {
        self.bounds = self.tight_bounds();
    }

    /// Cells sorted by `(row, col)`.
    pub fn sorted_cells(&self) -> Vec<(Coord, State)> {
        let mut cells: Vec<_> = self.iter().collect();
        cells.sort_unstable_by_key(|&(c, _)| c);
        cells
    }

    /// The cells that fall inside `bounds`.
    pub fn restrict(&self, bounds: &Bounds) -> SparseGrid {
        self.iter().filter(|&(c, _)| bounds.contains(c)).collect()
    }

    /// A copy shifted by `(dy, dx)`.
    pub fn translate(&self, dy: i64, dx: i64) -> SparseGrid {
        self.iter()
            .map(|((row, col), s)| ((row + dy, col + dx), s))
            .collect()
    }

    /// Live-cell count per state, indexed by state.
    pub fn census(&self, n_states: usize) -> Vec<usize> {
        let mut counts = vec![0; n_states.max(1)];
        for &s in self.cells.values() {
            if let Some(slot) = counts.get_mut(s as usize) {
                *slot += 1;
            }
        }
        counts
    }
}

impl FromIterator<(Coord, State)> for SparseGrid {
    fn from_iter<I: IntoIterator<Item = (Coord, State)>>(iter: I) -> Self {
        let mut grid = SparseGrid::new();
        grid.extend(iter);
        grid
    }
}

impl Extend<(Coord, State)> for SparseGrid {
    fn extend<I: IntoIterator<Item = (Coord, State)>>(&mut self, iter: I) {
        for (coord, state) in iter {
            self.set(coord, state);
        }
    }
}
