//! Reusable candidate deduper for the step frontier.
//!
//! Open-addressed linear-probing set of [`Coord`] keys. Slots are cleared
//! lazily with an epoch stamp, so every generation starts an empty set
//! without touching the backing array. Members are also kept in insertion
//! order so the engine evaluates candidates deterministically.

use super::Coord;
use super::hash::coord_hash;

const LOAD_NUM: usize = 3;
const LOAD_DEN: usize = 4;
const MIN_SLOTS: usize = 16;

#[derive(Clone, Copy)]
struct Slot {
    coord: Coord,
    stamp: u32,
}

impl Slot {
    const EMPTY: Self = Self {
        coord: (0, 0),
        stamp: 0,
    };
}

fn slots_for(keys: usize) -> usize {
    keys.saturating_mul(LOAD_DEN)
        .div_ceil(LOAD_NUM)
        .next_power_of_two()
        .max(MIN_SLOTS)
}

#[derive(Clone)]
pub struct CoordSet {
    slots: Vec<Slot>,
    members: Vec<Coord>,
    mask: usize,
    stamp: u32,
}

impl Default for CoordSet {
    fn default() -> Self {
        Self::new()
    }
}

impl CoordSet {
    pub fn new() -> Self {
        Self::with_capacity(256)
    }

    pub fn with_capacity(cap: usize) -> Self {
        let slots = slots_for(cap);
        Self {
            slots: vec![Slot::EMPTY; slots],
            members: Vec::with_capacity(cap),
            mask: slots - 1,
            stamp: 1,
        }
    }

    /// Forget every member. O(1) except once every 2^32 calls.
    pub fn clear(&mut self) {
        self.members.clear();
        self.stamp = self.stamp.wrapping_add(1);
        if self.stamp == 0 {
            self.stamp = 1;
            for slot in &mut self.slots {
                slot.stamp = 0;
            }
        }
    }

    pub fn reserve_for(&mut self, keys: usize) {
        let needed = slots_for(keys);
        if needed > self.slots.len() {
            self.resize(needed);
        }
        self.members.reserve(keys.saturating_sub(self.members.len()));
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.members.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// Members in first-insertion order.
    #[inline]
    pub fn as_slice(&self) -> &[Coord] {
        &self.members
    }

    #[inline(always)]
    fn needs_grow(&self) -> bool {
        self.members.len() * LOAD_DEN >= self.slots.len() * LOAD_NUM
    }

    fn resize(&mut self, new_slots: usize) {
        debug_assert!(new_slots.is_power_of_two());
        self.slots = vec![Slot::EMPTY; new_slots];
        self.mask = new_slots - 1;
        for i in 0..self.members.len() {
            let coord = self.members[i];
            let pos = self.probe(coord);
            self.slots[pos] = Slot {
                coord,
                stamp: self.stamp,
            };
        }
    }

    /// Slot holding `coord`, or the first free slot on its probe path.
    #[inline(always)]
    fn probe(&self, coord: Coord) -> usize {
        let mut pos = coord_hash(coord) as usize & self.mask;
        loop {
            let slot = &self.slots[pos];
            if slot.stamp != self.stamp || slot.coord == coord {
                return pos;
            }
            pos = (pos + 1) & self.mask;
        }
    }

    #[inline]
    pub fn contains(&self, coord: Coord) -> bool {
        let slot = &self.slots[self.probe(coord)];
        slot.stamp == self.stamp
    }

    /// Returns `true` if `coord` was not yet a member.
    #[inline]
    pub fn insert(&mut self, coord: Coord) -> bool {
        if self.needs_grow() {
            self.resize(self.slots.len() * 2);
        }
        let pos = self.probe(coord);
        if self.slots[pos].stamp == self.stamp {
            return false;
        }
        self.slots[pos] = Slot {
            coord,
            stamp: self.stamp,
        };
        self.members.push(coord);
        true
    }
}
