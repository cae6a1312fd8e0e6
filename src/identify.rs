//! Period and motion detection.
//!
//! The identifier steps a copy of the pattern and after every generation
//! compares the result with the starting grid. A match stops the search and
//! the elapsed generations become the period.

use std::fmt;
use std::str::FromStr;
use std::sync::atomic::{AtomicBool, Ordering};

use tracing::debug;

use crate::engine::{Bounds, Coord, Simulation, SparseGrid, State};
use crate::rule::RuleDefinition;
use crate::topology::BoundaryPolicy;

/// Generations tried before giving up.
pub const MAX_PERIOD: u32 = 5000;
const PROGRESS_INTERVAL: u32 = 500;

/// Which comparisons to run each generation.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum PatternKind {
    /// Same-size, then double-size, then bounded-region.
    #[default]
    Any,
    StillLifeOscillatorSpaceship,
    Gun,
    Replicator,
}

impl FromStr for PatternKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "any" => Ok(PatternKind::Any),
            "osc" | "oscillator" | "spaceship" | "still-life" | "stilllife" => {
                Ok(PatternKind::StillLifeOscillatorSpaceship)
            }
            "gun" => Ok(PatternKind::Gun),
            "replicator" => Ok(PatternKind::Replicator),
            other => Err(format!("unknown pattern kind `{other}`")),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Orientation {
    Orthogonal,
    Diagonal,
    Oblique,
}

impl Orientation {
    /// `None` for a displacement of zero.
    pub fn classify(dx: i64, dy: i64) -> Option<Self> {
        match (dx.abs(), dy.abs()) {
            (0, 0) => None,
            (0, _) | (_, 0) => Some(Orientation::Orthogonal),
            (x, y) if x == y => Some(Orientation::Diagonal),
            _ => Some(Orientation::Oblique),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum IdentificationResult {
    StillLife,
    Oscillator {
        period: u32,
    },
    /// `dx`/`dy` are absolute speeds in cells per period.
    Spaceship {
        dx: i64,
        dy: i64,
        period: u32,
        orientation: Orientation,
    },
    Gun {
        period: u32,
    },
    Replicator {
        dx: i64,
        dy: i64,
        period: u32,
        orientation: Orientation,
    },
    /// Died out, grew without repeating, or exceeded [`MAX_PERIOD`].
    Failed,
    Cancelled,
}

fn write_speed(
    f: &mut fmt::Formatter<'_>,
    dx: i64,
    dy: i64,
    period: u32,
    orientation: Orientation,
    noun: &str,
) -> fmt::Result {
    match orientation {
        Orientation::Orthogonal => write!(f, "Orthogonal {}c/{period} {noun}", dx.max(dy)),
        Orientation::Diagonal => write!(f, "Diagonal {dx}c/{period} {noun}"),
        Orientation::Oblique => write!(f, "Oblique ({dx}, {dy})c/{period} {noun}"),
    }
}

impl fmt::Display for IdentificationResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            IdentificationResult::StillLife => f.write_str("Still Life"),
            IdentificationResult::Oscillator { period } => write!(f, "Period {period} Oscillator"),
            IdentificationResult::Spaceship {
                dx,
                dy,
                period,
                orientation,
            } => write_speed(f, dx, dy, period, orientation, "Spaceship"),
            IdentificationResult::Gun { period } => write!(f, "Period {period} Gun"),
            IdentificationResult::Replicator {
                dx,
                dy,
                period,
                orientation,
            } => write_speed(f, dx, dy, period, orientation, "Replicator"),
            IdentificationResult::Failed => f.write_str(
                "Identification failed: the period exceeds 5000 or the pattern is not periodic",
            ),
            IdentificationResult::Cancelled => f.write_str("Operation Cancelled!"),
        }
    }
}

/// The starting pattern every later generation is compared against.
struct Reference<'g> {
    grid: &'g SparseGrid,
    cells: Vec<(Coord, State)>,
    bounds: Bounds,
}

impl<'g> Reference<'g> {
    fn new(grid: &'g SparseGrid) -> Option<Self> {
        Some(Self {
            grid,
            cells: grid.sorted_cells(),
            bounds: grid.tight_bounds()?,
        })
    }

    /// `(dy, dx)` such that `initial = current + offset`, cell for cell.
    fn same_size(&self, current: &SparseGrid) -> Option<(i64, i64)> {
        if current.len() != self.cells.len() {
            return None;
        }
        let now = current.sorted_cells();
        let ((r0, c0), _) = self.cells[0];
        let ((r1, c1), _) = now[0];
        let offset = (r0 - r1, c0 - c1);
        let consistent = self
            .cells
            .iter()
            .zip(&now)
            .all(|(&((ra, ca), sa), &((rb, cb), sb))| (ra - rb, ca - cb) == offset && sa == sb);
        consistent.then_some(offset)
    }

    /// Offset under which every current cell is a same-state copy of an
    /// initial cell shifted by `+offset` or `-offset`.
    fn double_size(&self, current: &SparseGrid) -> Option<(i64, i64)> {
        if current.len() != 2 * self.cells.len() {
            return None;
        }
        let now = current.sorted_cells();
        let ((r0, c0), _) = self.cells[0];
        let ((r1, c1), _) = now[0];
        let (dy, dx) = (r0 - r1, c0 - c1);
        if (dy, dx) == (0, 0) {
            return None;
        }
        let paired = now.iter().all(|&((r, c), s)| {
            self.grid.get((r + dy, c + dx)) == s || self.grid.get((r - dy, c - dx)) == s
        });
        paired.then_some((dy, dx))
    }

    /// The starting region reappears in place.
    fn gun(&self, current: &SparseGrid) -> bool {
        current.len() > self.cells.len()
            && current.restrict(&self.bounds).sorted_cells() == self.cells
    }

    fn check(&self, kind: PatternKind, current: &SparseGrid, period: u32) -> Option<IdentificationResult> {
        let any = kind == PatternKind::Any;
        if any || kind == PatternKind::StillLifeOscillatorSpaceship {
            if let Some((dy, dx)) = self.same_size(current) {
                let (dx, dy) = (dx.abs(), dy.abs());
                return Some(match Orientation::classify(dx, dy) {
                    None if period == 1 => IdentificationResult::StillLife,
                    None => IdentificationResult::Oscillator { period },
                    Some(orientation) => IdentificationResult::Spaceship {
                        dx,
                        dy,
                        period,
                        orientation,
                    },
                });
            }
        }
        if any || kind == PatternKind::Replicator {
            if let Some((dy, dx)) = self.double_size(current) {
                let (dx, dy) = (dx.abs(), dy.abs());
                if let Some(orientation) = Orientation::classify(dx, dy) {
                    return Some(IdentificationResult::Replicator {
                        dx,
                        dy,
                        period,
                        orientation,
                    });
                }
            }
        }
        if (any || kind == PatternKind::Gun) && self.gun(current) {
            return Some(IdentificationResult::Gun { period });
        }
        None
    }
}

/// Classify `grid` by stepping it under `rule` starting at `generation`.
pub fn identify(
    rule: &RuleDefinition,
    grid: &SparseGrid,
    kind: PatternKind,
    generation: u64,
    policy: BoundaryPolicy,
) -> IdentificationResult {
    identify_with_cancel(rule, grid, kind, generation, policy, &AtomicBool::new(false))
}

/// As [`identify`], polling `cancel` between generations.
pub fn identify_with_cancel(
    rule: &RuleDefinition,
    grid: &SparseGrid,
    kind: PatternKind,
    generation: u64,
    policy: BoundaryPolicy,
    cancel: &AtomicBool,
) -> IdentificationResult {
    let Some(reference) = Reference::new(grid) else {
        return IdentificationResult::Failed;
    };
    let mut sim = Simulation::with_grid(rule, policy, grid.clone()).starting_at(generation);

    for period in 1..=MAX_PERIOD {
        if cancel.load(Ordering::Relaxed) {
            return IdentificationResult::Cancelled;
        }
        sim.step();
        if sim.grid().is_empty() {
            debug!(period, "pattern died out");
            return IdentificationResult::Failed;
        }
        if let Some(result) = reference.check(kind, sim.grid(), period) {
            debug!(period, %result, "pattern identified");
            return result;
        }
        if period % PROGRESS_INTERVAL == 0 {
            debug!(period, population = sim.population(), "identification in progress");
        }
    }
    IdentificationResult::Failed
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::AtomicBool;

    use super::*;

    #[test]
    fn orientation_classes() {
        assert_eq!(Orientation::classify(0, 0), None);
        assert_eq!(Orientation::classify(0, 2), Some(Orientation::Orthogonal));
        assert_eq!(Orientation::classify(-1, 1), Some(Orientation::Diagonal));
        assert_eq!(Orientation::classify(1, 2), Some(Orientation::Oblique));
    }

    #[test]
    fn display_phrasing() {
        let glider = IdentificationResult::Spaceship {
            dx: 1,
            dy: 1,
            period: 4,
            orientation: Orientation::Diagonal,
        };
        assert_eq!(glider.to_string(), "Diagonal 1c/4 Spaceship");
        let lwss = IdentificationResult::Spaceship {
            dx: 2,
            dy: 0,
            period: 4,
            orientation: Orientation::Orthogonal,
        };
        assert_eq!(lwss.to_string(), "Orthogonal 2c/4 Spaceship");
        let knight = IdentificationResult::Replicator {
            dx: 1,
            dy: 2,
            period: 6,
            orientation: Orientation::Oblique,
        };
        assert_eq!(knight.to_string(), "Oblique (1, 2)c/6 Replicator");
        assert_eq!(
            IdentificationResult::Oscillator { period: 2 }.to_string(),
            "Period 2 Oscillator"
        );
    }

    #[test]
    fn empty_grid_fails_immediately() {
        let rule = RuleDefinition::life();
        let result = identify(
            &rule,
            &SparseGrid::new(),
            PatternKind::Any,
            0,
            BoundaryPolicy::Infinite,
        );
        assert_eq!(result, IdentificationResult::Failed);
    }

    #[test]
    fn preset_cancel_flag_stops_before_stepping() {
        let rule = RuleDefinition::life();
        let grid: SparseGrid = [((0, 0), 1)].into_iter().collect();
        let cancel = AtomicBool::new(true);
        let result = identify_with_cancel(
            &rule,
            &grid,
            PatternKind::Any,
            0,
            BoundaryPolicy::Infinite,
            &cancel,
        );
        assert_eq!(result, IdentificationResult::Cancelled);
    }

    #[test]
    fn dying_pattern_fails() {
        let rule = RuleDefinition::life();
        let grid: SparseGrid = [((0, 0), 1), ((5, 5), 1)].into_iter().collect();
        let result = identify(&rule, &grid, PatternKind::Any, 0, BoundaryPolicy::Infinite);
        assert_eq!(result, IdentificationResult::Failed);
    }

    #[test]
    fn kind_names() {
        assert_eq!("osc".parse::<PatternKind>().unwrap(), PatternKind::StillLifeOscillatorSpaceship);
        assert_eq!("Gun".parse::<PatternKind>().unwrap(), PatternKind::Gun);
        assert!("puffer".parse::<PatternKind>().is_err());
    }
}
