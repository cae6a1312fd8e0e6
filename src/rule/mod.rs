//! Rule model: neighbourhoods, weights and a bound transition strategy.
//!
//! A [`RuleDefinition`] is immutable once built. Loading a new rule produces a
//! new value; anything still stepping under the old one is unaffected.

pub mod hensel;
pub mod palette;
mod parser;
pub mod rulestring;
pub mod transition;

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use crate::engine::{Offset, State};
use crate::error::RuleParseError;

pub use hensel::HenselFamily;
pub use palette::Rgb;
pub use parser::parse;
pub use transition::{FnTransition, Transition};

/// Parse rule-definition text. Same as [`parse`].
pub fn load_rule(text: &str) -> Result<RuleDefinition, RuleParseError> {
    parse(text)
}

/// Ordered offsets with their totalistic weights.
///
/// Order matters: position `i` is what the transition sees as neighbour `i`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Neighbourhood {
    offsets: Vec<Offset>,
    weights: Vec<i64>,
}

impl Neighbourhood {
    /// Offsets paired with weights; zero-weight entries are dropped.
    pub fn weighted(cells: impl IntoIterator<Item = (Offset, i64)>) -> Self {
        let (offsets, weights) = cells.into_iter().filter(|&(_, w)| w != 0).unzip();
        Self { offsets, weights }
    }

    /// Every offset with weight 1.
    pub fn from_offsets(offsets: &[Offset]) -> Self {
        Self {
            offsets: offsets.to_vec(),
            weights: vec![1; offsets.len()],
        }
    }

    /// A `(2r+1)²` row-major weight block centred on the cell.
    pub fn from_block(range: i64, block: &[i64]) -> Self {
        let side = 2 * range + 1;
        Self::weighted(
            block
                .iter()
                .enumerate()
                .map(|(i, &w)| ((i as i64 / side - range, i as i64 % side - range), w)),
        )
    }

    /// Moore neighbourhood of the given range, centre excluded.
    pub fn moore(range: i64) -> Self {
        let side = (2 * range + 1) as usize;
        let centre = side * side / 2;
        let block: Vec<i64> = (0..side * side).map(|i| (i != centre) as i64).collect();
        Self::from_block(range, &block)
    }

    /// Von Neumann (Manhattan-distance) neighbourhood, centre excluded.
    pub fn von_neumann(range: i64) -> Self {
        let cells = (-range..=range)
            .flat_map(|dy| (-range..=range).map(move |dx| (dy, dx)))
            .filter(|&(dy, dx)| (dy, dx) != (0, 0) && dy.abs() + dx.abs() <= range)
            .map(|o| (o, 1));
        Self::weighted(cells)
    }

    pub fn offsets(&self) -> &[Offset] {
        &self.offsets
    }

    pub fn weights(&self) -> &[i64] {
        &self.weights
    }

    pub fn len(&self) -> usize {
        self.offsets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.offsets.is_empty()
    }

    /// Chebyshev radius.
    pub fn range(&self) -> i64 {
        self.offsets
            .iter()
            .map(|&(dy, dx)| dy.abs().max(dx.abs()))
            .max()
            .unwrap_or(0)
    }
}

/// Transition family a rule was built from.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum RuleSpace {
    OuterTotalistic,
    Bsfkl,
    ExtendedGenerations,
    RegeneratingGenerations,
    Custom,
}

impl fmt::Display for RuleSpace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            RuleSpace::OuterTotalistic => "Outer Totalistic",
            RuleSpace::Bsfkl => "BSFKL",
            RuleSpace::ExtendedGenerations => "Extended Generations",
            RuleSpace::RegeneratingGenerations => "Regenerating Generations",
            RuleSpace::Custom => "Custom",
        })
    }
}

fn normalise(name: &str) -> String {
    name.chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .map(|c| c.to_ascii_lowercase())
        .collect()
}

impl FromStr for RuleSpace {
    type Err = RuleParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match normalise(s).as_str() {
            "outertotalistic" => Ok(RuleSpace::OuterTotalistic),
            "bsfkl" => Ok(RuleSpace::Bsfkl),
            "extendedgenerations" | "generations" => Ok(RuleSpace::ExtendedGenerations),
            "regeneratinggenerations" | "regenerating" => Ok(RuleSpace::RegeneratingGenerations),
            _ => Err(RuleParseError::UnknownRulespace(s.trim().to_string())),
        }
    }
}

/// What a birth/survival test looks up.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum BsConditions {
    /// Weighted neighbour sum.
    #[default]
    Weighted,
    /// Count of neighbours with a non-zero state weight.
    Raw,
    /// Exact isotropic configuration, named in Hensel notation.
    Isotropic(HenselFamily),
}

impl fmt::Display for BsConditions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            BsConditions::Weighted => "Outer Totalistic",
            BsConditions::Raw => "Raw",
            BsConditions::Isotropic(HenselFamily::Moore) => "Isotropic Non-Totalistic",
            BsConditions::Isotropic(HenselFamily::Cross) => "Range 2 Cross",
            BsConditions::Isotropic(HenselFamily::FarCorners) => "Range 2 Far Corners",
            BsConditions::Isotropic(HenselFamily::Knight) => "Range 2 Knight",
            BsConditions::Isotropic(HenselFamily::VonNeumann) => "Range 2 Von Neumann",
        })
    }
}

impl FromStr for BsConditions {
    type Err = RuleParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let family = BsConditions::Isotropic;
        match normalise(s).as_str() {
            "outertotalistic" | "weighted" => Ok(BsConditions::Weighted),
            "raw" | "totalistic" => Ok(BsConditions::Raw),
            "isotropicnontotalistic" | "hensel" => Ok(family(HenselFamily::Moore)),
            "range2cross" => Ok(family(HenselFamily::Cross)),
            "range2farcorners" => Ok(family(HenselFamily::FarCorners)),
            "range2knight" => Ok(family(HenselFamily::Knight)),
            "range2vonneumann" => Ok(family(HenselFamily::VonNeumann)),
            _ => Err(RuleParseError::UnknownConditions(s.trim().to_string())),
        }
    }
}

/// A complete, immutable cellular-automaton rule.
///
/// Per-phase vectors are stored expanded to the alternating period, so phase
/// `p` always reads index `p`.
#[derive(Clone, Debug)]
pub struct RuleDefinition {
    name: String,
    n_states: usize,
    neighbourhoods: Vec<Neighbourhood>,
    state_weights: Vec<Vec<i64>>,
    space: RuleSpace,
    conditions: BsConditions,
    transition: Arc<dyn Transition>,
    palette: Option<Vec<Rgb>>,
    reach: Vec<Offset>,
}

pub(crate) struct RuleParts {
    pub name: String,
    pub n_states: usize,
    pub neighbourhoods: Vec<Neighbourhood>,
    pub state_weights: Vec<Vec<i64>>,
    pub space: RuleSpace,
    pub conditions: BsConditions,
    pub transition: Arc<dyn Transition>,
    pub palette: Option<Vec<Rgb>>,
}

/// Offsets a changed cell can influence: every `o` and `-o` over all phases,
/// plus the cell itself.
fn reach_of(neighbourhoods: &[Neighbourhood]) -> Vec<Offset> {
    let mut reach: Vec<Offset> = neighbourhoods
        .iter()
        .flat_map(|n| n.offsets().iter().flat_map(|&(dy, dx)| [(dy, dx), (-dy, -dx)]))
        .chain(std::iter::once((0, 0)))
        .collect();
    reach.sort_unstable();
    reach.dedup();
    reach
}

impl RuleDefinition {
    pub(crate) fn from_parts(parts: RuleParts) -> Self {
        let reach = reach_of(&parts.neighbourhoods);
        Self {
            name: parts.name,
            n_states: parts.n_states,
            neighbourhoods: parts.neighbourhoods,
            state_weights: parts.state_weights,
            space: parts.space,
            conditions: parts.conditions,
            transition: parts.transition,
            palette: parts.palette,
            reach,
        }
    }

    /// A rule whose transition is written in code. One neighbourhood per
    /// alternating phase.
    pub fn custom(
        name: impl Into<String>,
        n_states: usize,
        neighbourhoods: Vec<Neighbourhood>,
        transition: impl Transition + 'static,
    ) -> Result<Self, RuleParseError> {
        if !(2..=256).contains(&n_states) {
            return Err(RuleParseError::StateCount(n_states));
        }
        if neighbourhoods.is_empty() {
            return Err(RuleParseError::MissingSection("Neighbourhood"));
        }
        let state_weights = neighbourhoods
            .iter()
            .map(|_| (0..n_states as i64).map(|s| (s != 0) as i64).collect())
            .collect();
        Ok(Self::from_parts(RuleParts {
            name: name.into(),
            n_states,
            neighbourhoods,
            state_weights,
            space: RuleSpace::Custom,
            conditions: BsConditions::Weighted,
            transition: Arc::new(transition),
            palette: None,
        }))
    }

    /// Conway's Game of Life, B3/S23 on the range-1 Moore neighbourhood.
    pub fn life() -> Self {
        use transition::{Condition, OuterTotalistic, OuterTotalisticPhase, PhaseWeights, Tally};

        let moore = Neighbourhood::moore(1);
        let phase = OuterTotalisticPhase {
            weights: PhaseWeights {
                weights: moore.weights().to_vec(),
                state_weights: vec![0, 1],
            },
            birth: Condition::Totals {
                tally: Tally::Weighted,
                values: [3].into_iter().collect(),
            },
            survival: Condition::Totals {
                tally: Tally::Weighted,
                values: [2, 3].into_iter().collect(),
            },
        };
        Self::from_parts(RuleParts {
            name: "Conway's Game of Life".to_string(),
            n_states: 2,
            neighbourhoods: vec![moore],
            state_weights: vec![vec![0, 1]],
            space: RuleSpace::OuterTotalistic,
            conditions: BsConditions::Weighted,
            transition: Arc::new(OuterTotalistic {
                phases: vec![phase],
            }),
            palette: None,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn n_states(&self) -> usize {
        self.n_states
    }

    pub fn alternating_period(&self) -> usize {
        self.neighbourhoods.len()
    }

    /// Phase index used at `generation`.
    #[inline]
    pub fn phase(&self, generation: u64) -> usize {
        (generation % self.neighbourhoods.len() as u64) as usize
    }

    pub fn neighbourhood(&self, phase: usize) -> &Neighbourhood {
        &self.neighbourhoods[phase % self.neighbourhoods.len()]
    }

    #[inline]
    pub fn offsets(&self, phase: usize) -> &[Offset] {
        self.neighbourhood(phase).offsets()
    }

    pub fn state_weights(&self, phase: usize) -> &[i64] {
        &self.state_weights[phase % self.state_weights.len()]
    }

    pub fn space(&self) -> RuleSpace {
        self.space
    }

    pub fn conditions(&self) -> BsConditions {
        self.conditions
    }

    #[inline]
    pub fn transition(&self) -> &dyn Transition {
        self.transition.as_ref()
    }

    /// Deduplicated union of `{o, -o}` over all phases, including `(0, 0)`.
    #[inline]
    pub fn reach(&self) -> &[Offset] {
        &self.reach
    }

    /// The explicit palette, if the rule declared one.
    pub fn palette(&self) -> Option<&[Rgb]> {
        self.palette.as_deref()
    }

    /// Explicit palette or the generated default.
    pub fn colours(&self) -> Vec<Rgb> {
        self.palette
            .clone()
            .unwrap_or_else(|| palette::generate(self.n_states))
    }

    /// Evaluate the transition directly.
    pub fn next_state(&self, phase: usize, neighbours: &[State], current: State) -> State {
        self.transition.next_state(phase, neighbours, current)
    }
}

#[cfg(test)]
mod tests {
    use super::{BsConditions, FnTransition, HenselFamily, Neighbourhood, RuleDefinition, RuleSpace};

    #[test]
    fn moore_and_von_neumann_shapes() {
        let moore = Neighbourhood::moore(1);
        assert_eq!(moore.len(), 8);
        assert!(!moore.offsets().contains(&(0, 0)));
        assert_eq!(moore.offsets()[0], (-1, -1));
        assert_eq!(Neighbourhood::moore(2).len(), 24);
        assert_eq!(Neighbourhood::von_neumann(2).len(), 12);
        assert_eq!(Neighbourhood::von_neumann(2).range(), 2);
    }

    #[test]
    fn life_reach_is_the_moore_block() {
        let life = RuleDefinition::life();
        assert_eq!(life.reach().len(), 9);
        assert_eq!(life.alternating_period(), 1);
        assert_eq!(life.phase(17), 0);
    }

    #[test]
    fn asymmetric_neighbourhood_reach_includes_mirror() {
        let rule = RuleDefinition::custom(
            "east",
            2,
            vec![Neighbourhood::from_offsets(&[(0, 1), (0, 2)])],
            FnTransition(|_: usize, n: &[u8], _: u8| n[0]),
        )
        .unwrap();
        assert_eq!(rule.space(), RuleSpace::Custom);
        assert_eq!(rule.reach(), &[(0, -2), (0, -1), (0, 0), (0, 1), (0, 2)]);
        assert_eq!(rule.next_state(0, &[1, 0], 0), 1);
    }

    #[test]
    fn custom_rejects_bad_state_count() {
        let result = RuleDefinition::custom(
            "one",
            1,
            vec![Neighbourhood::moore(1)],
            FnTransition(|_: usize, _: &[u8], s: u8| s),
        );
        assert!(result.is_err());
    }

    #[test]
    fn names_parse_loosely() {
        assert_eq!(
            "Extended Generations".parse::<RuleSpace>().unwrap(),
            RuleSpace::ExtendedGenerations
        );
        assert_eq!("bsfkl".parse::<RuleSpace>().unwrap(), RuleSpace::Bsfkl);
        assert!("Larger than Life".parse::<RuleSpace>().is_err());
        assert_eq!(
            "Range 2 Von Neumann".parse::<BsConditions>().unwrap(),
            BsConditions::Isotropic(HenselFamily::VonNeumann)
        );
        assert_eq!(
            "Isotropic Non-Totalistic".parse::<BsConditions>().unwrap(),
            BsConditions::Isotropic(HenselFamily::Moore)
        );
    }
}
