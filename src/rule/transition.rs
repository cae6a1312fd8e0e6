//! Transition strategies, bound once when a rule is built.

use std::collections::HashSet;
use std::fmt;

use super::hensel::Configuration;
use crate::engine::State;

/// Next-state function for one rule family.
///
/// `neighbours[i]` is the state at the `i`-th offset of the phase's
/// neighbourhood; `current` is the cell's own state.
pub trait Transition: fmt::Debug + Send + Sync {
    fn next_state(&self, phase: usize, neighbours: &[State], current: State) -> State;
}

/// How a neighbourhood is reduced to the value a birth/survival test looks up.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Tally {
    /// `Σ weight[i] * state_weight[state[i]]`.
    Weighted,
    /// Number of neighbours whose state has a non-zero state weight.
    Raw,
}

/// Per-phase weights a tally is computed from.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PhaseWeights {
    pub weights: Vec<i64>,
    pub state_weights: Vec<i64>,
}

impl PhaseWeights {
    #[inline]
    fn state_weight(&self, s: State) -> i64 {
        self.state_weights.get(s as usize).copied().unwrap_or(0)
    }

    #[inline]
    pub fn weighted_sum(&self, neighbours: &[State]) -> i64 {
        neighbours
            .iter()
            .zip(&self.weights)
            .map(|(&s, &w)| w * self.state_weight(s))
            .sum()
    }

    #[inline]
    pub fn raw_count(&self, neighbours: &[State]) -> i64 {
        neighbours
            .iter()
            .filter(|&&s| self.state_weight(s) != 0)
            .count() as i64
    }

    /// Bit `i` set when neighbour `i` carries a non-zero state weight.
    #[inline]
    pub fn configuration(&self, neighbours: &[State]) -> Configuration {
        neighbours
            .iter()
            .enumerate()
            .filter(|&(_, &s)| self.state_weight(s) != 0)
            .fold(0, |acc, (i, _)| acc | 1 << i)
    }
}

/// A birth or survival condition.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Condition {
    Totals { tally: Tally, values: HashSet<i64> },
    /// Isotropic: membership of the exact neighbour configuration.
    Configurations(HashSet<Configuration>),
}

impl Condition {
    #[inline]
    pub fn matches(&self, weights: &PhaseWeights, neighbours: &[State]) -> bool {
        match self {
            Condition::Totals {
                tally: Tally::Weighted,
                values,
            } => values.contains(&weights.weighted_sum(neighbours)),
            Condition::Totals {
                tally: Tally::Raw,
                values,
            } => values.contains(&weights.raw_count(neighbours)),
            Condition::Configurations(set) => set.contains(&weights.configuration(neighbours)),
        }
    }
}

#[derive(Clone, Debug)]
pub struct OuterTotalisticPhase {
    pub weights: PhaseWeights,
    pub birth: Condition,
    pub survival: Condition,
}

/// Two-state birth/survival. States other than 0 and 1 are treated as dead.
#[derive(Clone, Debug)]
pub struct OuterTotalistic {
    pub phases: Vec<OuterTotalisticPhase>,
}

impl Transition for OuterTotalistic {
    fn next_state(&self, phase: usize, neighbours: &[State], current: State) -> State {
        let p = &self.phases[phase % self.phases.len()];
        let alive = if current == 1 {
            p.survival.matches(&p.weights, neighbours)
        } else {
            p.birth.matches(&p.weights, neighbours)
        };
        alive as State
    }
}

#[derive(Clone, Debug)]
pub struct BsfklPhase {
    pub weights: Vec<i64>,
    pub birth: HashSet<i64>,
    pub survival: HashSet<i64>,
    pub forcing: HashSet<i64>,
    pub killing: HashSet<i64>,
    pub living: HashSet<i64>,
}

/// Three states: background, living and destructive.
#[derive(Clone, Debug)]
pub struct Bsfkl {
    pub phases: Vec<BsfklPhase>,
}

impl Transition for Bsfkl {
    fn next_state(&self, phase: usize, neighbours: &[State], current: State) -> State {
        let p = &self.phases[phase % self.phases.len()];
        let (mut living, mut destructive) = (0i64, 0i64);
        for (&s, &w) in neighbours.iter().zip(&p.weights) {
            match s {
                1 => living += w,
                2 => destructive += w,
                _ => {}
            }
        }
        match current {
            1 if p.killing.contains(&destructive) => 0,
            1 if p.survival.contains(&living) => 1,
            1 => 2,
            2 if p.living.contains(&living) => 0,
            2 => 2,
            _ if p.forcing.contains(&destructive) && p.birth.contains(&living) => 1,
            _ => 0,
        }
    }
}

#[derive(Clone, Debug)]
pub struct GenerationsPhase {
    pub weights: PhaseWeights,
    pub birth: Condition,
    pub survival: Condition,
    /// `active[s]` for every state; state 0 is never active.
    pub active: Vec<bool>,
    /// Empty for plain Extended Generations.
    pub regen_birth: Option<Condition>,
    pub regen_survival: Option<Condition>,
}

/// Extended and Regenerating Generations: ageing states with an activity mask.
#[derive(Clone, Debug)]
pub struct Generations {
    pub n_states: usize,
    pub phases: Vec<GenerationsPhase>,
}

impl Generations {
    #[inline]
    fn age(&self, current: State) -> State {
        ((current as usize + 1) % self.n_states) as State
    }
}

impl Transition for Generations {
    fn next_state(&self, phase: usize, neighbours: &[State], current: State) -> State {
        let p = &self.phases[phase % self.phases.len()];
        if current == 0 {
            return p.birth.matches(&p.weights, neighbours) as State;
        }
        if p.active.get(current as usize).copied().unwrap_or(false) {
            return if p.survival.matches(&p.weights, neighbours) {
                current
            } else {
                self.age(current)
            };
        }
        if current >= 2 {
            if let Some(rb) = &p.regen_birth {
                if rb.matches(&p.weights, neighbours) {
                    return current - 1;
                }
            }
            if let Some(rs) = &p.regen_survival {
                if rs.matches(&p.weights, neighbours) {
                    return current;
                }
            }
        }
        self.age(current)
    }
}

/// Adapter for transition functions written in code.
pub struct FnTransition<F>(pub F);

impl<F> fmt::Debug for FnTransition<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("FnTransition")
    }
}

impl<F> Transition for FnTransition<F>
where
    F: Fn(usize, &[State], State) -> State + Send + Sync,
{
    fn next_state(&self, phase: usize, neighbours: &[State], current: State) -> State {
        (self.0)(phase, neighbours, current)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;

    fn set(values: &[i64]) -> HashSet<i64> {
        values.iter().copied().collect()
    }

    fn totals(values: &[i64]) -> Condition {
        Condition::Totals {
            tally: Tally::Weighted,
            values: set(values),
        }
    }

    #[test]
    fn bsfkl_branches() {
        let rule = Bsfkl {
            phases: vec![BsfklPhase {
                weights: vec![1; 4],
                birth: set(&[2]),
                survival: set(&[1]),
                forcing: set(&[0]),
                killing: set(&[2]),
                living: set(&[3]),
            }],
        };
        assert_eq!(rule.next_state(0, &[1, 1, 0, 0], 0), 1);
        assert_eq!(rule.next_state(0, &[1, 1, 2, 0], 0), 0);
        assert_eq!(rule.next_state(0, &[2, 2, 1, 0], 1), 0);
        assert_eq!(rule.next_state(0, &[1, 0, 0, 0], 1), 1);
        assert_eq!(rule.next_state(0, &[1, 1, 0, 0], 1), 2);
        assert_eq!(rule.next_state(0, &[1, 1, 1, 0], 2), 0);
        assert_eq!(rule.next_state(0, &[1, 0, 0, 0], 2), 2);
    }

    #[test]
    fn generations_ages_inactive_states() {
        let rule = Generations {
            n_states: 4,
            phases: vec![GenerationsPhase {
                weights: PhaseWeights {
                    weights: vec![1; 3],
                    state_weights: vec![0, 1, 0, 0],
                },
                birth: totals(&[2]),
                survival: totals(&[1]),
                active: vec![false, true, false, false],
                regen_birth: None,
                regen_survival: None,
            }],
        };
        assert_eq!(rule.next_state(0, &[1, 1, 0], 0), 1);
        assert_eq!(rule.next_state(0, &[1, 0, 0], 1), 1);
        assert_eq!(rule.next_state(0, &[0, 0, 0], 1), 2);
        assert_eq!(rule.next_state(0, &[1, 0, 0], 2), 3);
        assert_eq!(rule.next_state(0, &[1, 0, 0], 3), 0);
    }

    #[test]
    fn regenerating_states_can_grow_younger() {
        let rule = Generations {
            n_states: 4,
            phases: vec![GenerationsPhase {
                weights: PhaseWeights {
                    weights: vec![1; 3],
                    state_weights: vec![0, 1, 0, 0],
                },
                birth: totals(&[3]),
                survival: totals(&[2, 3]),
                active: vec![false, true, false, false],
                regen_birth: Some(totals(&[3])),
                regen_survival: Some(totals(&[2])),
            }],
        };
        assert_eq!(rule.next_state(0, &[1, 1, 1], 3), 2);
        assert_eq!(rule.next_state(0, &[1, 1, 0], 3), 3);
        assert_eq!(rule.next_state(0, &[1, 0, 0], 3), 0);
        assert_eq!(rule.next_state(0, &[1, 1, 1], 2), 1);
    }

    #[test]
    fn raw_tally_ignores_position_weights() {
        let weights = PhaseWeights {
            weights: vec![5, 5, 5],
            state_weights: vec![0, 1, 2],
        };
        assert_eq!(weights.weighted_sum(&[1, 2, 0]), 15);
        assert_eq!(weights.raw_count(&[1, 2, 0]), 2);
        assert_eq!(weights.configuration(&[1, 2, 0]), 0b011);
    }
}
