//! One-generation update driven by the active set.

use tracing::trace;

use super::coord_set::CoordSet;
use super::grid::SparseGrid;
use super::{ActiveSet, State};
use crate::rule::RuleDefinition;
use crate::topology::{BoundaryPolicy, SENTINEL};

/// Reusable scratch for [`step`]. Holding one across generations avoids
/// reallocating the candidate set and neighbour buffer every call.
#[derive(Clone, Default)]
pub struct Stepper {
    candidates: CoordSet,
    neighbours: Vec<State>,
    updates: Vec<(super::Coord, State)>,
    preimages: Vec<super::Coord>,
}

impl Stepper {
    pub fn new() -> Self {
        Self::default()
    }

    /// Advance `grid` by one generation.
    ///
    /// Only cells within one neighbourhood reach of `active` are examined.
    /// For rules that alternate between phases every live cell is examined
    /// as well, since a cell can change without any neighbour changing.
    pub fn step(
        &mut self,
        rule: &RuleDefinition,
        mut grid: SparseGrid,
        active: &ActiveSet,
        generation: u64,
        policy: BoundaryPolicy,
    ) -> (SparseGrid, ActiveSet) {
        let phase = rule.phase(generation);
        let offsets = rule.offsets(phase);
        let reach = rule.reach();
        let transition = rule.transition();

        self.candidates.clear();
        let seeds = if rule.alternating_period() > 1 {
            active.len() + grid.len()
        } else {
            active.len()
        };
        self.candidates.reserve_for(seeds.saturating_mul(reach.len()));

        // Mirroring seams read a cell through reflected offsets, so the
        // cells affected by a change sit around each of its preimages.
        let mirrors = policy.mirrors();
        let margin = reach
            .iter()
            .map(|&(dy, dx)| dy.abs().max(dx.abs()))
            .max()
            .unwrap_or(0);
        let mut seed = |cell: super::Coord| {
            if mirrors {
                policy.preimages(policy.resolve(cell), margin, &mut self.preimages);
                for &(row, col) in &self.preimages {
                    for &(dy, dx) in reach {
                        let candidate = (row + dy, col + dx);
                        if policy.contains(candidate) {
                            self.candidates.insert(candidate);
                        }
                    }
                }
                return;
            }
            let (row, col) = cell;
            for &(dy, dx) in reach {
                let candidate = policy.resolve((row + dy, col + dx));
                if candidate != SENTINEL {
                    self.candidates.insert(candidate);
                }
            }
        };
        active.iter().for_each(&mut seed);
        if rule.alternating_period() > 1 {
            grid.coords().for_each(&mut seed);
        }

        self.updates.clear();
        for &cell in self.candidates.as_slice() {
            self.neighbours.clear();
            self.neighbours.extend(
                offsets
                    .iter()
                    .map(|&(dy, dx)| grid.get(policy.resolve((cell.0 + dy, cell.1 + dx)))),
            );
            let current = grid.get(cell);
            let next = transition.next_state(phase, &self.neighbours, current);
            if next != current {
                self.updates.push((cell, next));
            }
        }
        trace!(
            generation,
            candidates = self.candidates.len(),
            changed = self.updates.len(),
            "step"
        );

        let mut changed = ActiveSet::with_capacity(self.updates.len());
        for &(cell, state) in &self.updates {
            grid.set(cell, state);
            changed.push(cell);
        }
        (grid, changed)
    }
}

/// Advance one generation with fresh scratch.
///
/// A pure function of its arguments: the same inputs always produce the same
/// grid and active set.
pub fn step(
    rule: &RuleDefinition,
    grid: SparseGrid,
    active: &ActiveSet,
    generation: u64,
    policy: BoundaryPolicy,
) -> (SparseGrid, ActiveSet) {
    Stepper::new().step(rule, grid, active, generation, policy)
}
