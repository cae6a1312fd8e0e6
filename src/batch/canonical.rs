//! Order-independent fingerprints for periodicity checks.

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

use crate::engine::SparseGrid;

/// Hash of the grid's sorted `(coord, state)` list.
///
/// Two grids holding the same cells hash equal regardless of the order their
/// backing maps iterate in.
pub fn canonical_hash(grid: &SparseGrid) -> u64 {
    let mut hasher = DefaultHasher::new();
    let cells = grid.sorted_cells();
    cells.len().hash(&mut hasher);
    for ((row, col), state) in cells {
        row.hash(&mut hasher);
        col.hash(&mut hasher);
        state.hash(&mut hasher);
    }
    hasher.finish()
}

/// Lexicographically smallest rotation of `seq`.
///
/// A period-`p` cycle observed from any phase yields the same rotation.
pub fn canonical_rotation<T: Ord + Clone>(seq: &[T]) -> Vec<T> {
    let n = seq.len();
    let best = (0..n)
        .min_by(|&a, &b| {
            let ra = seq[a..].iter().chain(&seq[..a]);
            let rb = seq[b..].iter().chain(&seq[..b]);
            ra.cmp(rb)
        })
        .unwrap_or(0);
    seq[best..].iter().chain(&seq[..best]).cloned().collect()
}
