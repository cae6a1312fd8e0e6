//! Isotropic (Hensel-notation) transition sets.
//!
//! A neighbour configuration is a bitmask: bit `i` is set when the `i`-th
//! offset of the family's canonical neighbourhood is on. Each notation letter
//! names one canonical configuration; the transition set for a letter is the
//! orbit of that configuration under four rotations and two reflections.

use std::collections::HashSet;

use crate::engine::Offset;

/// A neighbour-configuration bitmask (8 or 12 significant bits).
pub type Configuration = u16;

/// The isotropic neighbourhood families that have a letter notation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum HenselFamily {
    /// Range-1 Moore, the standard isotropic non-totalistic notation.
    Moore,
    /// Range-2 cross: the four orthogonal cells at distance 1 and 2.
    Cross,
    /// Range-1 Moore with the corners pushed out to `(±2, ±2)`.
    FarCorners,
    /// The eight knight's-move cells.
    Knight,
    /// Range-2 von Neumann: the Moore ring plus the four cells at distance 2.
    VonNeumann,
}

// Offsets are `(dy, dx)`, listed in the order the tables below index them.
const MOORE_OFFSETS: [Offset; 8] = [
    (1, -1),
    (1, 0),
    (1, 1),
    (0, 1),
    (-1, 1),
    (-1, 0),
    (-1, -1),
    (0, -1),
];
const CROSS_OFFSETS: [Offset; 8] = [
    (-1, 0),
    (0, 1),
    (1, 0),
    (0, -1),
    (-2, 0),
    (0, 2),
    (2, 0),
    (0, -2),
];
const FAR_CORNERS_OFFSETS: [Offset; 8] = [
    (2, -2),
    (1, 0),
    (2, 2),
    (0, 1),
    (-2, 2),
    (-1, 0),
    (-2, -2),
    (0, -1),
];
const KNIGHT_OFFSETS: [Offset; 8] = [
    (-1, -2),
    (-2, -1),
    (-2, 1),
    (-1, 2),
    (1, 2),
    (2, 1),
    (2, -1),
    (1, -2),
];
const VON_NEUMANN_OFFSETS: [Offset; 12] = [
    (1, -1),
    (1, 0),
    (1, 1),
    (0, 1),
    (-1, 1),
    (-1, 0),
    (-1, -1),
    (0, -1),
    (2, 0),
    (0, 2),
    (-2, 0),
    (0, -2),
];

/// `rotate`, `reflect_a`, `reflect_b` as source-index permutations:
/// bit `i` of the image is bit `perm[i]` of the input.
struct Symmetry {
    rotate: &'static [u8],
    reflect_a: &'static [u8],
    reflect_b: &'static [u8],
}

const RING_SYMMETRY: Symmetry = Symmetry {
    rotate: &[2, 3, 4, 5, 6, 7, 0, 1],
    reflect_a: &[2, 1, 0, 7, 6, 5, 4, 3],
    reflect_b: &[6, 5, 4, 3, 2, 1, 0, 7],
};
const CROSS_SYMMETRY: Symmetry = Symmetry {
    rotate: &[3, 0, 1, 2, 7, 4, 5, 6],
    reflect_a: &[0, 3, 2, 1, 4, 7, 6, 5],
    reflect_b: &[2, 1, 0, 3, 6, 5, 4, 7],
};
const KNIGHT_SYMMETRY: Symmetry = Symmetry {
    rotate: &[6, 7, 0, 1, 2, 3, 4, 5],
    reflect_a: &[3, 2, 1, 0, 7, 6, 5, 4],
    reflect_b: &[7, 6, 5, 4, 3, 2, 1, 0],
};
const VON_NEUMANN_SYMMETRY: Symmetry = Symmetry {
    rotate: &[2, 3, 4, 5, 6, 7, 0, 1, 9, 10, 11, 8],
    reflect_a: &[2, 1, 0, 7, 6, 5, 4, 3, 8, 11, 10, 9],
    reflect_b: &[6, 5, 4, 3, 2, 1, 0, 7, 10, 9, 8, 11],
};

type LetterTable = &'static [(u8, char, &'static str)];

const MOORE_LETTERS: LetterTable = &[
    (0, 'a', "00000000"),
    (1, 'c', "10000000"),
    (1, 'e', "01000000"),
    (2, 'c', "10100000"),
    (2, 'e', "01000001"),
    (2, 'k', "01001000"),
    (2, 'a', "11000000"),
    (2, 'i', "01000100"),
    (2, 'n', "10001000"),
    (3, 'c', "10101000"),
    (3, 'e', "01010001"),
    (3, 'k', "01001001"),
    (3, 'a', "11000001"),
    (3, 'i', "10000011"),
    (3, 'n', "10100001"),
    (3, 'y', "10100100"),
    (3, 'q', "10001001"),
    (3, 'j', "00110100"),
    (3, 'r', "01100100"),
    (4, 'c', "10101010"),
    (4, 'e', "01010101"),
    (4, 'k', "01101001"),
    (4, 'a', "10000111"),
    (4, 'i', "10110001"),
    (4, 'n', "10001011"),
    (4, 'y', "10100110"),
    (4, 'q', "11001001"),
    (4, 'j', "00110101"),
    (4, 'r', "01110100"),
    (4, 't', "11100100"),
    (4, 'w', "10001101"),
    (4, 'z', "11001100"),
    (5, 'c', "01010111"),
    (5, 'e', "10101110"),
    (5, 'k', "10110110"),
    (5, 'a', "00111110"),
    (5, 'i', "01111100"),
    (5, 'n', "01011110"),
    (5, 'y', "01011011"),
    (5, 'q', "01110110"),
    (5, 'j', "11001011"),
    (5, 'r', "10011011"),
    (6, 'c', "01011111"),
    (6, 'e', "10111110"),
    (6, 'k', "10110111"),
    (6, 'a', "00111111"),
    (6, 'i', "10111011"),
    (6, 'n', "01110111"),
    (7, 'c', "01111111"),
    (7, 'e', "10111111"),
    (8, 'a', "11111111"),
];

const CROSS_LETTERS: LetterTable = &[
    (0, 'a', "00000000"),
    (1, 'a', "00001000"),
    (1, 'c', "10000000"),
    (2, 'a', "00001100"),
    (2, 'c', "00001010"),
    (2, 'e', "10001000"),
    (2, 'h', "01001000"),
    (2, 'i', "00101000"),
    (2, 'j', "11000000"),
    (2, 'n', "10100000"),
    (3, 'a', "00001110"),
    (3, 'c', "10001100"),
    (3, 'e', "00101100"),
    (3, 'h', "00011010"),
    (3, 'i', "10001100"),
    (3, 'j', "00111000"),
    (3, 'n', "01011000"),
    (3, 'o', "10011000"),
    (3, 'p', "11100000"),
    (4, 'a', "00001111"),
    (4, 'c', "00101110"),
    (4, 'e', "00011110"),
    (4, 'h', "10001110"),
    (4, 'i', "00111100"),
    (4, 'j', "01011100"),
    (4, 'n', "10011100"),
    (4, 'o', "11001100"),
    (4, 'p', "01011010"),
    (4, 'q', "10101010"),
    (4, 'r', "10011010"),
    (4, 't', "11011000"),
    (4, 'u', "01111000"),
    (4, 'v', "10111000"),
    (4, 'w', "11110000"),
    (5, 'a', "11110001"),
    (5, 'c', "01110011"),
    (5, 'e', "11010011"),
    (5, 'h', "11100101"),
    (5, 'i', "01110011"),
    (5, 'j', "11000111"),
    (5, 'n', "10100111"),
    (5, 'o', "01100111"),
    (5, 'p', "00011111"),
    (6, 'a', "11110011"),
    (6, 'c', "11110101"),
    (6, 'e', "01110111"),
    (6, 'h', "10110111"),
    (6, 'i', "11010111"),
    (6, 'j', "00111111"),
    (6, 'n', "01011111"),
    (7, 'a', "11110111"),
    (7, 'c', "01111111"),
    (8, 'a', "11111111"),
];

const KNIGHT_LETTERS: LetterTable = &[
    (0, 'a', "00000000"),
    (1, 'a', "10000000"),
    (2, 'a', "11000000"),
    (2, 'c', "10100000"),
    (2, 'e', "10010000"),
    (2, 'h', "10001000"),
    (2, 'i', "10000100"),
    (2, 'j', "10000001"),
    (3, 'a', "11100000"),
    (3, 'c', "11010000"),
    (3, 'e', "11001000"),
    (3, 'h', "10101000"),
    (3, 'i', "10100100"),
    (3, 'j', "10100001"),
    (3, 'n', "10010001"),
    (4, 'a', "11110000"),
    (4, 'c', "11101000"),
    (4, 'e', "11100100"),
    (4, 'h', "11100010"),
    (4, 'i', "11100001"),
    (4, 'j', "11011000"),
    (4, 'n', "11010100"),
    (4, 'o', "11010010"),
    (4, 'p', "11001100"),
    (4, 'q', "10101010"),
    (4, 'r', "10101001"),
    (4, 't', "10100101"),
    (4, 'u', "10110001"),
    (4, 'v', "10011001"),
    (5, 'a', "00011111"),
    (5, 'c', "00101111"),
    (5, 'e', "00110111"),
    (5, 'h', "01010111"),
    (5, 'i', "01011011"),
    (5, 'j', "01011110"),
    (5, 'n', "01101110"),
    (6, 'a', "00111111"),
    (6, 'c', "01011111"),
    (6, 'e', "01101111"),
    (6, 'h', "01110111"),
    (6, 'i', "01111011"),
    (6, 'j', "01111110"),
    (7, 'a', "01111111"),
    (8, 'a', "11111111"),
];

/// The sixteen configurations of the von Neumann outer ring, cells 8..12.
const OUTER_RING_LETTERS: &[(char, &str)] = &[
    ('a', "0000"),
    ('c', "1000"),
    ('d', "0100"),
    ('e', "0010"),
    ('f', "0001"),
    ('g', "1100"),
    ('i', "0110"),
    ('j', "0011"),
    ('k', "1001"),
    ('l', "1010"),
    ('m', "0101"),
    ('n', "1110"),
    ('o', "0111"),
    ('p', "1011"),
    ('q', "1101"),
    ('r', "1111"),
];

fn bits(pattern: &str) -> Configuration {
    pattern
        .bytes()
        .enumerate()
        .filter(|&(_, b)| b == b'1')
        .fold(0, |acc, (i, _)| acc | 1 << i)
}

fn permute(config: Configuration, perm: &[u8]) -> Configuration {
    perm.iter()
        .enumerate()
        .filter(|&(_, &src)| config >> src & 1 == 1)
        .fold(0, |acc, (i, _)| acc | 1 << i)
}

impl HenselFamily {
    /// Canonical ordered offsets; neighbour `i` feeds configuration bit `i`.
    pub fn offsets(self) -> &'static [Offset] {
        match self {
            HenselFamily::Moore => &MOORE_OFFSETS,
            HenselFamily::Cross => &CROSS_OFFSETS,
            HenselFamily::FarCorners => &FAR_CORNERS_OFFSETS,
            HenselFamily::Knight => &KNIGHT_OFFSETS,
            HenselFamily::VonNeumann => &VON_NEUMANN_OFFSETS,
        }
    }

    pub fn cell_count(self) -> usize {
        self.offsets().len()
    }

    fn symmetry(self) -> &'static Symmetry {
        match self {
            HenselFamily::Moore | HenselFamily::FarCorners => &RING_SYMMETRY,
            HenselFamily::Cross => &CROSS_SYMMETRY,
            HenselFamily::Knight => &KNIGHT_SYMMETRY,
            HenselFamily::VonNeumann => &VON_NEUMANN_SYMMETRY,
        }
    }

    fn letters(self) -> LetterTable {
        match self {
            HenselFamily::Moore | HenselFamily::FarCorners | HenselFamily::VonNeumann => {
                MOORE_LETTERS
            }
            HenselFamily::Cross => CROSS_LETTERS,
            HenselFamily::Knight => KNIGHT_LETTERS,
        }
    }

    /// The canonical configuration named by `letter` for `count` on-cells.
    /// For von Neumann this addresses the inner Moore ring only.
    pub fn letter(self, count: u8, letter: char) -> Option<Configuration> {
        self.letters()
            .iter()
            .find(|&&(n, l, _)| n == count && l == letter)
            .map(|&(_, _, pattern)| bits(pattern))
    }

    /// All twelve images of `config` under the family's symmetry group,
    /// before deduplication: identity and both reflections of each rotation.
    pub fn rotate_4_reflect(self, config: Configuration) -> [Configuration; 12] {
        let sym = self.symmetry();
        let mut out = [0; 12];
        let mut rotated = config;
        for turn in 0..4 {
            out[turn * 3] = rotated;
            out[turn * 3 + 1] = permute(rotated, sym.reflect_a);
            out[turn * 3 + 2] = permute(rotated, sym.reflect_b);
            rotated = permute(rotated, sym.rotate);
        }
        out
    }

    /// The deduplicated orbit of `config`.
    pub fn orbit(self, config: Configuration) -> HashSet<Configuration> {
        self.rotate_4_reflect(config).into_iter().collect()
    }

    /// Every configuration of this family with exactly `count` on-cells.
    pub fn with_count(self, count: u32) -> impl Iterator<Item = Configuration> {
        let cells = self.cell_count() as u32;
        (0..(1u32 << cells))
            .filter(move |c| c.count_ones() == count)
            .map(|c| c as Configuration)
    }

    /// Expand a transition specification such as `2n3-q` into the full set
    /// of configurations it names.
    pub fn parse_transitions(self, spec: &str) -> Result<HashSet<Configuration>, String> {
        match self {
            HenselFamily::VonNeumann => parse_von_neumann(spec),
            _ => parse_ring(self, spec),
        }
    }
}

struct Group {
    count: u8,
    negate: bool,
    letters: Vec<char>,
}

fn flush_group(
    family: HenselFamily,
    group: Group,
    out: &mut HashSet<Configuration>,
) -> Result<(), String> {
    if group.letters.is_empty() {
        out.extend(family.with_count(group.count as u32));
        return Ok(());
    }
    let mut named = HashSet::new();
    for &letter in &group.letters {
        let base = family.letter(group.count, letter).ok_or_else(|| {
            format!("no transition `{}{letter}` in this neighbourhood", group.count)
        })?;
        named.extend(family.rotate_4_reflect(base));
    }
    if group.negate {
        out.extend(family.with_count(group.count as u32).filter(|c| !named.contains(c)));
    } else {
        out.extend(named);
    }
    Ok(())
}

fn parse_ring(family: HenselFamily, spec: &str) -> Result<HashSet<Configuration>, String> {
    let mut out = HashSet::new();
    let mut group: Option<Group> = None;
    for ch in spec.chars() {
        match ch {
            ',' => {}
            c if c.is_whitespace() => {}
            '0'..='9' => {
                let count = ch as u8 - b'0';
                if count as usize > family.cell_count() {
                    return Err(format!("count {count} exceeds the neighbourhood size"));
                }
                if let Some(done) = group.replace(Group {
                    count,
                    negate: false,
                    letters: Vec::new(),
                }) {
                    flush_group(family, done, &mut out)?;
                }
            }
            '-' => match group.as_mut() {
                Some(g) if g.letters.is_empty() && !g.negate => g.negate = true,
                _ => return Err("`-` must directly follow a neighbour count".to_string()),
            },
            c if c.is_ascii_lowercase() => match group.as_mut() {
                Some(g) => g.letters.push(c),
                None => return Err(format!("letter `{c}` before any neighbour count")),
            },
            other => return Err(format!("unexpected character `{other}`")),
        }
    }
    if let Some(done) = group {
        flush_group(family, done, &mut out)?;
    }
    Ok(out)
}

fn outer_ring(letter: char) -> Option<Configuration> {
    OUTER_RING_LETTERS
        .iter()
        .find(|&&(l, _)| l == letter)
        .map(|&(_, pattern)| bits(pattern) << 8)
}

fn parse_von_neumann(spec: &str) -> Result<HashSet<Configuration>, String> {
    let family = HenselFamily::VonNeumann;
    let mut out = HashSet::new();
    for group in spec.split(',').map(str::trim).filter(|g| !g.is_empty()) {
        let digits = group.chars().take_while(char::is_ascii_digit).count();
        let total: u32 = group[..digits]
            .parse()
            .map_err(|_| format!("group `{group}` must start with a neighbour count"))?;
        if total > 12 {
            return Err(format!("count {total} exceeds the neighbourhood size"));
        }
        let mut rest = &group[digits..];
        let negate = rest.starts_with('-');
        if negate {
            rest = &rest[1..];
        }
        if rest.is_empty() {
            out.extend(family.with_count(total));
            continue;
        }
        let letters: Vec<char> = rest.chars().collect();
        if letters.len() % 2 != 0 {
            return Err(format!("group `{group}` needs inner/outer letter pairs"));
        }
        let mut named = HashSet::new();
        for pair in letters.chunks(2) {
            let (inner, outer) = (pair[0], pair[1]);
            let outer_bits = outer_ring(outer)
                .ok_or_else(|| format!("unknown outer-ring letter `{outer}`"))?;
            let inner_count = total
                .checked_sub(outer_bits.count_ones())
                .filter(|&n| n <= 8)
                .ok_or_else(|| format!("pair `{inner}{outer}` cannot total {total}"))?;
            if inner == 'x' {
                for inner_bits in HenselFamily::Moore.with_count(inner_count) {
                    named.extend(family.rotate_4_reflect(inner_bits | outer_bits));
                }
            } else {
                let inner_bits = family.letter(inner_count as u8, inner).ok_or_else(|| {
                    format!("no transition `{inner_count}{inner}` in the inner ring")
                })?;
                named.extend(family.rotate_4_reflect(inner_bits | outer_bits));
            }
        }
        if negate {
            out.extend(family.with_count(total).filter(|c| !named.contains(c)));
        } else {
            out.extend(named);
        }
    }
    Ok(out)
}
