//! Cheap hashing for `(row, col)` keys.
//!
//! Cell maps are keyed by integer pairs that sit densely around the pattern,
//! so a multiply-rotate fold per coordinate is enough and is much faster
//! than SipHash on the step hot path.

use std::hash::{BuildHasherDefault, Hasher};

use super::Coord;

/// 2^64 divided by the golden ratio, odd.
const SEED: u64 = 0x9e37_79b9_7f4a_7c15;

/// Fold one lane into the running state.
#[inline(always)]
fn fold(state: u64, lane: i64) -> u64 {
    (state.rotate_left(26) ^ lane as u64).wrapping_mul(SEED)
}

#[inline(always)]
pub(crate) fn coord_hash((row, col): Coord) -> u64 {
    fold(fold(0, row), col)
}

/// Streaming form of [`coord_hash`] for `HashMap<Coord, _>`.
///
/// A tuple hashes as two `write_i64` calls, row first, each folded in the
/// same way. Any other input falls back to an FNV-style byte fold.
#[derive(Clone, Copy, Default)]
pub struct CoordHasher {
    hash: u64,
}

impl Hasher for CoordHasher {
    #[inline]
    fn finish(&self) -> u64 {
        self.hash
    }

    fn write(&mut self, bytes: &[u8]) {
        for &b in bytes {
            self.hash = (self.hash ^ b as u64).wrapping_mul(0x0000_0100_0000_01b3);
        }
    }

    #[inline]
    fn write_i64(&mut self, v: i64) {
        self.hash = fold(self.hash, v);
    }
}

pub type CoordBuildHasher = BuildHasherDefault<CoordHasher>;

#[cfg(test)]
mod tests {
    use std::hash::BuildHasher;

    use super::{CoordBuildHasher, coord_hash};

    #[test]
    fn streaming_hasher_matches_direct_mix() {
        let build = CoordBuildHasher::default();
        for coord in [(0, 0), (3, -7), (-100, 42), (i64::MAX, i64::MIN)] {
            assert_eq!(build.hash_one(coord), coord_hash(coord));
        }
    }

    #[test]
    fn axes_are_not_symmetric() {
        assert_ne!(coord_hash((1, 2)), coord_hash((2, 1)));
        assert_ne!(coord_hash((0, 1)), coord_hash((1, 0)));
    }

    #[test]
    fn neighbouring_cells_spread_over_low_bits() {
        let buckets: std::collections::HashSet<u64> = (0..16)
            .flat_map(|row| (0..16).map(move |col| coord_hash((row, col)) & 0xff))
            .collect();
        assert!(buckets.len() > 64, "only {} of 256 low-byte buckets hit", buckets.len());
    }
}
