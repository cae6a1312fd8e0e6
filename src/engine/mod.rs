//! Sparse stepping engine.
//!
//! The grid stores only non-zero cells. Each generation re-evaluates just the
//! cells within one neighbourhood reach of the cells that changed in the
//! previous generation, so cost follows the active perimeter of a pattern
//! rather than its bounding box.

mod coord_set;
mod grid;
mod hash;
mod step;

pub use coord_set::CoordSet;
pub use grid::{Bounds, SparseGrid};
pub use hash::{CoordBuildHasher, CoordHasher};
pub use step::{Stepper, step};

use crate::rule::RuleDefinition;
use crate::topology::BoundaryPolicy;

/// `(row, col)`.
pub type Coord = (i64, i64);
/// `(dy, dx)` relative to the cell being updated.
pub type Offset = (i64, i64);
/// Cell state; 0 is the quiescent background.
pub type State = u8;

/// Coordinates that changed in the last generation or were edited since.
///
/// May contain duplicates; the engine deduplicates while expanding.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ActiveSet {
    coords: Vec<Coord>,
}

impl ActiveSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(cap: usize) -> Self {
        Self {
            coords: Vec::with_capacity(cap),
        }
    }

    /// Every live cell of `grid`, for the first step after loading a pattern.
    pub fn from_grid(grid: &SparseGrid) -> Self {
        grid.coords().collect()
    }

    #[inline]
    pub fn push(&mut self, coord: Coord) {
        self.coords.push(coord);
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.coords.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.coords.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = Coord> + '_ {
        self.coords.iter().copied()
    }

    pub fn as_slice(&self) -> &[Coord] {
        &self.coords
    }
}

impl FromIterator<Coord> for ActiveSet {
    fn from_iter<I: IntoIterator<Item = Coord>>(iter: I) -> Self {
        Self {
            coords: iter.into_iter().collect(),
        }
    }
}

impl Extend<Coord> for ActiveSet {
    fn extend<I: IntoIterator<Item = Coord>>(&mut self, iter: I) {
        self.coords.extend(iter);
    }
}

/// A grid lineage under one rule and topology.
///
/// Owns the grid, the active set, the generation counter and the stepping
/// scratch. Edits through [`Simulation::set_cell`] mark the cell active.
pub struct Simulation<'r> {
    rule: &'r RuleDefinition,
    policy: BoundaryPolicy,
    stepper: Stepper,
    grid: SparseGrid,
    active: ActiveSet,
    generation: u64,
}

impl<'r> Simulation<'r> {
    pub fn new(rule: &'r RuleDefinition, policy: BoundaryPolicy) -> Self {
        Self::with_grid(rule, policy, SparseGrid::new())
    }

    pub fn with_grid(rule: &'r RuleDefinition, policy: BoundaryPolicy, grid: SparseGrid) -> Self {
        let active = ActiveSet::from_grid(&grid);
        Self {
            rule,
            policy,
            stepper: Stepper::new(),
            grid,
            active,
            generation: 0,
        }
    }

    /// Start counting from `generation`, which selects the first phase.
    pub fn starting_at(mut self, generation: u64) -> Self {
        self.generation = generation;
        self
    }

    pub fn rule(&self) -> &'r RuleDefinition {
        self.rule
    }

    pub fn policy(&self) -> BoundaryPolicy {
        self.policy
    }

    pub fn grid(&self) -> &SparseGrid {
        &self.grid
    }

    pub fn active(&self) -> &ActiveSet {
        &self.active
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn population(&self) -> usize {
        self.grid.len()
    }

    pub fn bounds(&self) -> Option<Bounds> {
        self.grid.bounds()
    }

    pub fn get_cell(&self, coord: Coord) -> State {
        self.grid.get(coord)
    }

    pub fn set_cell(&mut self, coord: Coord, state: State) {
        let coord = self.policy.resolve(coord);
        if coord == crate::topology::SENTINEL {
            return;
        }
        if self.grid.set(coord, state) != state {
            self.active.push(coord);
        }
    }

    pub fn step(&mut self) {
        let grid = std::mem::take(&mut self.grid);
        let (grid, active) =
            self.stepper
                .step(self.rule, grid, &self.active, self.generation, self.policy);
        self.grid = grid;
        self.active = active;
        self.generation += 1;
    }

    pub fn step_n(&mut self, n: u64) {
        for _ in 0..n {
            self.step();
        }
    }

    /// Hand the grid back, consuming the lineage.
    pub fn into_grid(self) -> SparseGrid {
        self.grid
    }
}
