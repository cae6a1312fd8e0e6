//! Boundary policies: pure coordinate remapping for closed and bounded grids.
//!
//! Coordinates are `(row, col)`. A size of 0 on an axis leaves that axis
//! unbounded, so `T0,32` is a cylinder that only wraps rows.

use std::fmt;
use std::str::FromStr;

use crate::engine::Coord;
use crate::error::BoundaryParseError;

/// Where cells outside a [`BoundaryPolicy::BoundedRectangle`] are sent.
/// The engine never evaluates or stores this coordinate.
pub const SENTINEL: Coord = (i64::MAX, i64::MAX);

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum BoundaryPolicy {
    #[default]
    Infinite,
    Toroidal {
        width: i64,
        height: i64,
    },
    Klein {
        width: i64,
        height: i64,
    },
    CrossSurface {
        width: i64,
        height: i64,
    },
    Spherical {
        width: i64,
        height: i64,
    },
    BoundedRectangle {
        width: i64,
        height: i64,
    },
}

/// Remap `coord` according to `policy`. Pure and total.
#[inline]
pub fn resolve(coord: Coord, policy: BoundaryPolicy) -> Coord {
    policy.resolve(coord)
}

#[inline(always)]
fn wrap(c: i64, size: i64) -> i64 {
    if size > 0 { c.rem_euclid(size) } else { c }
}

#[inline(always)]
fn outside(c: i64, size: i64) -> bool {
    size > 0 && (c < 0 || c >= size)
}

/// An odd number of seam crossings along an axis of this size.
#[inline(always)]
fn crosses_odd(c: i64, size: i64) -> bool {
    size > 0 && c.div_euclid(size) & 1 == 1
}

#[inline(always)]
fn mirror(c: i64, size: i64) -> i64 {
    if size > 0 {
        (size - c.rem_euclid(size)).rem_euclid(size)
    } else {
        c
    }
}

#[inline(always)]
fn reflect(c: i64, size: i64) -> i64 {
    if size <= 0 || (0..size).contains(&c) {
        c
    } else if c < 0 {
        (-c - 1).rem_euclid(size)
    } else {
        size - 1 - c.rem_euclid(size)
    }
}

/// Seam-crossing indices `k` whose copy `[k*size, (k+1)*size)` overlaps the
/// window `[-margin, size + margin)`. An unbounded axis has only copy 0.
fn copies(size: i64, margin: i64) -> std::ops::RangeInclusive<i64> {
    if size > 0 {
        (-margin).div_euclid(size)..=(size - 1 + margin).div_euclid(size)
    } else {
        0..=0
    }
}

#[inline(always)]
fn in_window(c: i64, size: i64, margin: i64) -> bool {
    size <= 0 || (-margin..size + margin).contains(&c)
}

/// Raw positions in `[-margin, size + margin)` that [`reflect`] sends to `c`.
fn reflections(c: i64, size: i64, margin: i64, out: &mut Vec<i64>) {
    out.clear();
    out.push(c);
    if size <= 0 {
        return;
    }
    let mut below = -1 - c;
    while below >= -margin {
        out.push(below);
        below -= size;
    }
    let mut above = 2 * size - 1 - c;
    while above < size + margin {
        out.push(above);
        above += size;
    }
}

impl BoundaryPolicy {
    /// True for the policies whose resolution differs from a plain
    /// translation near the seams.
    pub fn mirrors(self) -> bool {
        matches!(
            self,
            BoundaryPolicy::Klein { .. }
                | BoundaryPolicy::CrossSurface { .. }
                | BoundaryPolicy::Spherical { .. }
        )
    }

    /// Every raw coordinate within `margin` of the grid that resolves to
    /// `coord`, written into `out`. `coord` must already be resolved.
    ///
    /// A cell `c` reads `coord` through offset `o` exactly when `c + o` is
    /// one of these positions.
    pub fn preimages(self, (row, col): Coord, margin: i64, out: &mut Vec<Coord>) {
        out.clear();
        match self {
            BoundaryPolicy::Infinite | BoundaryPolicy::BoundedRectangle { .. } => {
                out.push((row, col));
            }
            BoundaryPolicy::Toroidal { width, height } => {
                for kr in copies(height, margin) {
                    for kc in copies(width, margin) {
                        out.push((row + kr * height, col + kc * width));
                    }
                }
            }
            BoundaryPolicy::Klein { width, height }
            | BoundaryPolicy::CrossSurface { width, height } => {
                let cross = matches!(self, BoundaryPolicy::CrossSurface { .. });
                for kr in copies(height, margin) {
                    for kc in copies(width, margin) {
                        let base_row = if kc & 1 == 1 { mirror(row, height) } else { row };
                        let base_col = if cross && kr & 1 == 1 {
                            mirror(col, width)
                        } else {
                            col
                        };
                        out.push((base_row + kr * height, base_col + kc * width));
                    }
                }
            }
            BoundaryPolicy::Spherical { width, height } => {
                let (mut rows, mut cols) = (Vec::new(), Vec::new());
                reflections(row, height, margin, &mut rows);
                reflections(col, width, margin, &mut cols);
                out.extend(rows.iter().flat_map(|&r| cols.iter().map(move |&c| (r, c))));
            }
        }
        if let Some((width, height)) = self.dimensions() {
            out.retain(|&(r, c)| in_window(r, height, margin) && in_window(c, width, margin));
        }
    }

    pub fn resolve(self, (row, col): Coord) -> Coord {
        match self {
            BoundaryPolicy::Infinite => (row, col),
            BoundaryPolicy::Toroidal { width, height } => (wrap(row, height), wrap(col, width)),
            BoundaryPolicy::Klein { width, height } => {
                let row = if crosses_odd(col, width) {
                    mirror(row, height)
                } else {
                    row
                };
                (wrap(row, height), wrap(col, width))
            }
            BoundaryPolicy::CrossSurface { width, height } => {
                let flip_col = crosses_odd(row, height);
                let flip_row = crosses_odd(col, width);
                let row = if flip_row { mirror(row, height) } else { row };
                let col = if flip_col { mirror(col, width) } else { col };
                (wrap(row, height), wrap(col, width))
            }
            BoundaryPolicy::Spherical { width, height } => {
                (reflect(row, height), reflect(col, width))
            }
            BoundaryPolicy::BoundedRectangle { width, height } => {
                let out_row = height > 0 && (row < 0 || row > height);
                let out_col = width > 0 && (col < 0 || col > width);
                if out_row || out_col {
                    SENTINEL
                } else {
                    (row, col)
                }
            }
        }
    }

    /// `(width, height)` for every policy except [`BoundaryPolicy::Infinite`].
    pub fn dimensions(self) -> Option<(i64, i64)> {
        match self {
            BoundaryPolicy::Infinite => None,
            BoundaryPolicy::Toroidal { width, height }
            | BoundaryPolicy::Klein { width, height }
            | BoundaryPolicy::CrossSurface { width, height }
            | BoundaryPolicy::Spherical { width, height }
            | BoundaryPolicy::BoundedRectangle { width, height } => Some((width, height)),
        }
    }

    /// True when both axes are finite, so any soup eventually repeats.
    pub fn is_closed(self) -> bool {
        matches!(self.dimensions(), Some((w, h)) if w > 0 && h > 0)
    }

    /// True when `coord` is a cell the policy can hold.
    pub fn contains(self, coord: Coord) -> bool {
        match self {
            BoundaryPolicy::Infinite => true,
            BoundaryPolicy::BoundedRectangle { .. } => self.resolve(coord) != SENTINEL,
            BoundaryPolicy::Toroidal { width, height }
            | BoundaryPolicy::Klein { width, height }
            | BoundaryPolicy::CrossSurface { width, height }
            | BoundaryPolicy::Spherical { width, height } => {
                !outside(coord.0, height) && !outside(coord.1, width)
            }
        }
    }

    fn prefix(self) -> char {
        match self {
            BoundaryPolicy::Infinite => '#',
            BoundaryPolicy::Toroidal { .. } => 'T',
            BoundaryPolicy::Klein { .. } => 'K',
            BoundaryPolicy::CrossSurface { .. } => 'C',
            BoundaryPolicy::Spherical { .. } => 'S',
            BoundaryPolicy::BoundedRectangle { .. } => 'P',
        }
    }
}

impl fmt::Display for BoundaryPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.dimensions() {
            None => f.write_str("#"),
            Some((w, h)) if w == h => write!(f, "{}{w}", self.prefix()),
            Some((w, h)) => write!(f, "{}{w},{h}", self.prefix()),
        }
    }
}

impl FromStr for BoundaryPolicy {
    type Err = BoundaryParseError;

    /// Parses `#`, `infinite`, or `<T|K|C|S|P><width>[,<height>]`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let err = || BoundaryParseError(s.to_string());
        if s == "#" || s.eq_ignore_ascii_case("infinite") {
            return Ok(BoundaryPolicy::Infinite);
        }
        let mut chars = s.chars();
        let kind = chars.next().ok_or_else(err)?;
        let dims = chars.as_str();
        let (width, height) = match dims.split_once(',') {
            Some((w, h)) => (w.trim().parse::<i64>(), h.trim().parse::<i64>()),
            None => (dims.parse::<i64>(), dims.parse::<i64>()),
        };
        let (width, height) = (width.map_err(|_| err())?, height.map_err(|_| err())?);
        if width < 0 || height < 0 {
            return Err(err());
        }
        match kind.to_ascii_uppercase() {
            'T' => Ok(BoundaryPolicy::Toroidal { width, height }),
            'K' => Ok(BoundaryPolicy::Klein { width, height }),
            'C' => Ok(BoundaryPolicy::CrossSurface { width, height }),
            'S' => Ok(BoundaryPolicy::Spherical { width, height }),
            'P' => Ok(BoundaryPolicy::BoundedRectangle { width, height }),
            _ => Err(err()),
        }
    }
}
