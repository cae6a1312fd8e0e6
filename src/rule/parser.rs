//! Line-oriented rule-definition text format.
//!
//! ```text
//! Name: Conway's Game of Life
//! Neighbourhood Range: 1
//! Neighbourhood:
//! 1,1,1
//! 1,0,1
//! 1,1,1
//! State Weights: 0,1
//! Rulespace: Outer Totalistic
//! Rulestring: b3s2,3
//! Colour Palette:
//! None
//! ```
//!
//! Alternating rules list several `Neighbourhood` blocks separated by a line
//! of `#` or `-`, and `|`-separated phases in `State Weights` and
//! `Rulestring`. Shorter lists are cycled up to the longest one.

use std::sync::Arc;

use tracing::{debug, info};

use super::palette::{self, Rgb};
use super::rulestring;
use super::transition::{
    Bsfkl, Generations, GenerationsPhase, OuterTotalistic, OuterTotalisticPhase, Transition,
};
use super::{BsConditions, Neighbourhood, RuleDefinition, RuleParts, RuleSpace};
use crate::error::RuleParseError;

#[derive(Clone, Copy, PartialEq, Eq)]
enum Section {
    Header,
    Neighbourhood,
    Palette,
}

struct Block {
    rows: Vec<Vec<i64>>,
}

#[derive(Default)]
struct Sections {
    name: Option<String>,
    range: Option<i64>,
    blocks: Vec<Block>,
    state_weights: Option<Vec<Vec<i64>>>,
    space: Option<RuleSpace>,
    rulestrings: Option<Vec<String>>,
    conditions: Option<BsConditions>,
    palette: Option<Vec<Rgb>>,
    auto_palette: bool,
    tiling: Option<String>,
}

fn is_delimiter(line: &str) -> bool {
    !line.is_empty() && line.chars().all(|c| c == '#' || c == '-')
}

fn int_list(line: usize, text: &str) -> Result<Vec<i64>, RuleParseError> {
    text.split(',')
        .map(str::trim)
        .map(|v| {
            v.parse::<i64>()
                .map_err(|_| RuleParseError::malformed(line, format!("`{v}` is not an integer")))
        })
        .collect()
}

fn label(line: &str) -> Option<(String, &str)> {
    let (key, value) = line.split_once(':')?;
    let key: String = key
        .chars()
        .filter(|c| !c.is_whitespace())
        .map(|c| c.to_ascii_lowercase())
        .collect();
    Some((key, value.trim()))
}

/// Largest accepted `Neighbourhood Range`; a block is `(2r+1)²` weights.
const MAX_RANGE: i64 = 64;

fn scan(text: &str) -> Result<Sections, RuleParseError> {
    let mut out = Sections::default();
    let mut section = Section::Header;

    for (idx, raw) in text.lines().enumerate() {
        let line_no = idx + 1;
        let line = raw.trim();
        if line.is_empty() || (section != Section::Neighbourhood && line.starts_with('#')) {
            continue;
        }

        if let Some((key, value)) = label(line) {
            section = Section::Header;
            match key.as_str() {
                "name" => out.name = Some(value.to_string()),
                "neighbourhoodrange" | "neighborhoodrange" => {
                    let range = value
                        .parse::<i64>()
                        .ok()
                        .filter(|r| (0..=MAX_RANGE).contains(r));
                    out.range = Some(range.ok_or_else(|| {
                        RuleParseError::malformed(
                            line_no,
                            format!("bad range `{value}`, expected 0..={MAX_RANGE}"),
                        )
                    })?);
                }
                "neighbourhood" | "neighborhood" => {
                    out.blocks.push(Block { rows: Vec::new() });
                    section = Section::Neighbourhood;
                }
                "stateweights" => {
                    let phases = value
                        .split('|')
                        .map(|phase| int_list(line_no, phase))
                        .collect::<Result<Vec<_>, _>>()?;
                    out.state_weights = Some(phases);
                }
                "rulespace" => out.space = Some(value.parse()?),
                "rulestring" => {
                    out.rulestrings = Some(value.split('|').map(|s| s.trim().to_string()).collect())
                }
                "b/sconditions" | "bsconditions" => out.conditions = Some(value.parse()?),
                "tiling" => out.tiling = Some(value.to_string()),
                "colourpalette" | "colorpalette" => {
                    section = Section::Palette;
                    out.palette = Some(Vec::new());
                    if !value.is_empty() {
                        out.palette = None;
                        out.auto_palette = value.eq_ignore_ascii_case("none");
                        if !out.auto_palette {
                            return Err(RuleParseError::PaletteValue(value.to_string()));
                        }
                        section = Section::Header;
                    }
                }
                _ => {
                    return Err(RuleParseError::malformed(
                        line_no,
                        format!("unknown section `{}`", line.split(':').next().unwrap_or(line)),
                    ));
                }
            }
            continue;
        }

        match section {
            Section::Neighbourhood if is_delimiter(line) => {
                out.blocks.push(Block { rows: Vec::new() });
            }
            Section::Neighbourhood => {
                let row = int_list(line_no, line)?;
                if let Some(block) = out.blocks.last_mut() {
                    block.rows.push(row);
                }
            }
            Section::Palette if line.eq_ignore_ascii_case("none") => {
                out.palette = None;
                out.auto_palette = true;
                section = Section::Header;
            }
            Section::Palette => {
                let colour = palette::parse_entry(line)?;
                if let Some(entries) = out.palette.as_mut() {
                    entries.push(colour);
                }
            }
            Section::Header => {
                return Err(RuleParseError::malformed(
                    line_no,
                    format!("expected `Label: value`, found `{line}`"),
                ));
            }
        }
    }

    // A trailing delimiter leaves an empty block behind.
    out.blocks.retain(|b| !b.rows.is_empty());
    Ok(out)
}

fn neighbourhoods(range: i64, blocks: &[Block]) -> Result<Vec<Neighbourhood>, RuleParseError> {
    let side = (2 * range + 1) as usize;
    blocks
        .iter()
        .enumerate()
        .map(|(b, block)| {
            if block.rows.len() != side {
                return Err(RuleParseError::NeighbourhoodRows {
                    block: b + 1,
                    found: block.rows.len(),
                    expected: side,
                });
            }
            let mut weights = Vec::with_capacity(side * side);
            for (r, row) in block.rows.iter().enumerate() {
                if row.len() != side {
                    return Err(RuleParseError::NeighbourhoodColumns {
                        block: b + 1,
                        row: r + 1,
                        found: row.len(),
                        expected: side,
                    });
                }
                weights.extend_from_slice(row);
            }
            Ok(Neighbourhood::from_block(range, &weights))
        })
        .collect()
}

/// Reject weights whose largest possible weighted sum does not fit in `i64`.
fn check_weight_bounds(
    neighbourhoods: &[Neighbourhood],
    state_weights: &[Vec<i64>],
) -> Result<(), RuleParseError> {
    for (phase, (n, sw)) in neighbourhoods.iter().zip(state_weights).enumerate() {
        // BSFKL counts with weight 1 per state, hence the floor of 1.
        let largest_state = sw.iter().map(|w| w.unsigned_abs()).max().unwrap_or(0).max(1);
        let bound = n.weights().iter().try_fold(0u64, |acc, w| {
            w.unsigned_abs()
                .checked_mul(largest_state)
                .and_then(|term| acc.checked_add(term))
        });
        if !matches!(bound, Some(b) if b <= i64::MAX as u64) {
            return Err(RuleParseError::WeightOverflow { phase: phase + 1 });
        }
    }
    Ok(())
}

fn cycle<T: Clone>(items: &[T], period: usize) -> Vec<T> {
    (0..period).map(|p| items[p % items.len()].clone()).collect()
}

/// Parse rule-definition text into an immutable [`RuleDefinition`].
pub fn parse(text: &str) -> Result<RuleDefinition, RuleParseError> {
    let sections = scan(text)?;

    if let Some(tiling) = &sections.tiling {
        if !tiling.eq_ignore_ascii_case("square") {
            return Err(RuleParseError::UnsupportedTiling(tiling.clone()));
        }
    }

    let space = sections
        .space
        .ok_or(RuleParseError::MissingSection("Rulespace"))?;
    let state_weights = sections
        .state_weights
        .ok_or(RuleParseError::MissingSection("State Weights"))?;
    let rulestrings = sections
        .rulestrings
        .ok_or(RuleParseError::MissingSection("Rulestring"))?;

    let n_states = state_weights[0].len();
    if !(2..=256).contains(&n_states) {
        return Err(RuleParseError::StateCount(n_states));
    }
    for (phase, weights) in state_weights.iter().enumerate() {
        if weights.len() != n_states {
            return Err(RuleParseError::StateWeightLength {
                phase: phase + 1,
                found: weights.len(),
                expected: n_states,
            });
        }
    }

    let conditions = match (space, sections.conditions) {
        (RuleSpace::Bsfkl, Some(c)) if c != BsConditions::Weighted => {
            return Err(RuleParseError::IncompatibleConditions {
                conditions: c.to_string(),
                rulespace: space.to_string(),
            });
        }
        (_, c) => c.unwrap_or_default(),
    };

    let parsed = match conditions {
        BsConditions::Isotropic(family) => {
            vec![Neighbourhood::from_offsets(family.offsets())]
        }
        _ => {
            let range = sections
                .range
                .ok_or(RuleParseError::MissingSection("Neighbourhood Range"))?;
            if sections.blocks.is_empty() {
                return Err(RuleParseError::MissingSection("Neighbourhood"));
            }
            neighbourhoods(range, &sections.blocks)?
        }
    };

    let period = parsed
        .len()
        .max(sections.blocks.len())
        .max(state_weights.len())
        .max(rulestrings.len());
    let neighbourhoods = cycle(&parsed, period);
    let state_weights = cycle(&state_weights, period);
    let rulestrings = cycle(&rulestrings, period);
    check_weight_bounds(&neighbourhoods, &state_weights)?;

    let transition = build_transition(
        space,
        conditions,
        n_states,
        &neighbourhoods,
        &state_weights,
        &rulestrings,
    )?;

    let palette = match sections.palette {
        Some(colours) if colours.len() != n_states => {
            return Err(RuleParseError::PaletteLength {
                expected: n_states,
                found: colours.len(),
            });
        }
        other => other,
    };
    debug!(auto_palette = sections.auto_palette, "palette resolved");

    let name = sections.name.unwrap_or_else(|| "Untitled".to_string());
    info!(
        name = %name,
        rulespace = %space,
        conditions = %conditions,
        n_states,
        period,
        "rule loaded"
    );

    Ok(RuleDefinition::from_parts(RuleParts {
        name,
        n_states,
        neighbourhoods,
        state_weights,
        space,
        conditions,
        transition,
        palette,
    }))
}

fn wrap(rulestring: &str) -> impl Fn(String) -> RuleParseError + '_ {
    move |message| RuleParseError::rulestring(rulestring, message)
}

fn build_transition(
    space: RuleSpace,
    conditions: BsConditions,
    n_states: usize,
    neighbourhoods: &[Neighbourhood],
    state_weights: &[Vec<i64>],
    rulestrings: &[String],
) -> Result<Arc<dyn Transition>, RuleParseError> {
    let phases = neighbourhoods.iter().zip(state_weights).zip(rulestrings);

    let transition: Arc<dyn Transition> = match space {
        RuleSpace::OuterTotalistic => {
            let phases = phases
                .map(|((n, sw), rs)| {
                    let (birth, survival) =
                        rulestring::outer_totalistic(rs, conditions).map_err(wrap(rs))?;
                    Ok(OuterTotalisticPhase {
                        weights: rulestring::phase_weights(n.weights(), sw),
                        birth,
                        survival,
                    })
                })
                .collect::<Result<_, RuleParseError>>()?;
            Arc::new(OuterTotalistic { phases })
        }
        RuleSpace::Bsfkl => {
            if n_states != 3 {
                return Err(RuleParseError::StateCount(n_states));
            }
            let phases = phases
                .map(|((n, _), rs)| rulestring::bsfkl(rs, n.weights().to_vec()).map_err(wrap(rs)))
                .collect::<Result<_, RuleParseError>>()?;
            Arc::new(Bsfkl { phases })
        }
        RuleSpace::ExtendedGenerations | RuleSpace::RegeneratingGenerations => {
            let regenerating = space == RuleSpace::RegeneratingGenerations;
            let phases = phases
                .map(|((n, sw), rs)| {
                    let f = rulestring::generations(rs, conditions, n_states, regenerating)
                        .map_err(wrap(rs))?;
                    Ok(GenerationsPhase {
                        weights: rulestring::phase_weights(n.weights(), sw),
                        birth: f.birth,
                        survival: f.survival,
                        active: f.active,
                        regen_birth: f.regen_birth,
                        regen_survival: f.regen_survival,
                    })
                })
                .collect::<Result<_, RuleParseError>>()?;
            Arc::new(Generations { n_states, phases })
        }
        RuleSpace::Custom => return Err(RuleParseError::UnknownRulespace(space.to_string())),
    };
    Ok(transition)
}

#[cfg(test)]
mod tests {
    use super::parse;
    use crate::error::RuleParseError;
    use crate::rule::{BsConditions, HenselFamily, Rgb, RuleSpace};

    const LIFE: &str = "\
Name: Life
Neighbourhood Range: 1
Neighbourhood:
1,1,1
1,0,1
1,1,1
State Weights: 0,1
Rulespace: Outer Totalistic
Rulestring: b3s2,3
Colour Palette:
None
";

    #[test]
    fn parses_life() {
        let rule = parse(LIFE).unwrap();
        assert_eq!(rule.name(), "Life");
        assert_eq!(rule.n_states(), 2);
        assert_eq!(rule.alternating_period(), 1);
        assert_eq!(rule.offsets(0).len(), 8);
        assert_eq!(rule.space(), RuleSpace::OuterTotalistic);
        assert!(rule.palette().is_none());
        assert_eq!(rule.colours(), vec![Rgb::BLACK, Rgb::WHITE]);
        // Three live neighbours give birth.
        assert_eq!(rule.next_state(0, &[1, 1, 1, 0, 0, 0, 0, 0], 0), 1);
        assert_eq!(rule.next_state(0, &[1, 0, 0, 0, 0, 0, 0, 0], 1), 0);
    }

    #[test]
    fn alternating_blocks_and_cycled_weights() {
        let text = "\
Name: Alternating
Neighbourhood Range: 1
Neighbourhood:
0,1,0
1,0,1
0,1,0
###
1,0,1
0,0,0
1,0,1
State Weights: 0,1
Rulespace: Outer Totalistic
Rulestring: b1s1|b2s2|b3s3
";
        let rule = parse(text).unwrap();
        assert_eq!(rule.alternating_period(), 3);
        assert_eq!(rule.offsets(0), &[(-1, 0), (0, -1), (0, 1), (1, 0)]);
        assert_eq!(rule.offsets(1), &[(-1, -1), (-1, 1), (1, -1), (1, 1)]);
        assert_eq!(rule.offsets(2), rule.offsets(0));
        assert_eq!(rule.phase(4), 1);
    }

    #[test]
    fn centre_cell_kept_when_weighted() {
        let text = "\
Neighbourhood Range: 1
Neighbourhood:
0,0,0
0,2,0
0,0,0
State Weights: 0,1
Rulespace: Outer Totalistic
Rulestring: b2s2
";
        let rule = parse(text).unwrap();
        assert_eq!(rule.offsets(0), &[(0, 0)]);
        assert_eq!(rule.name(), "Untitled");
    }

    #[test]
    fn bsfkl_with_palette() {
        let text = "\
Name: BSFKL
Neighbourhood Range: 1
Neighbourhood:
1,1,1
1,0,1
1,1,1
State Weights: 0,1,1
Rulespace: BSFKL
Rulestring: 2,3/3/0/2/1
Colour Palette:
0 (0, 0, 0)
1 (255, 255, 255)
2 (255, 0, 0)
";
        let rule = parse(text).unwrap();
        assert_eq!(rule.space(), RuleSpace::Bsfkl);
        assert_eq!(rule.palette().unwrap()[2], Rgb(255, 0, 0));
    }

    #[test]
    fn hensel_conditions_replace_neighbourhood() {
        let text = "\
Name: Hensel Life
Neighbourhood Range: 1
Neighbourhood:
1,1,1
1,0,1
1,1,1
State Weights: 0,1
Rulespace: Outer Totalistic
B/S Conditions: Isotropic Non-Totalistic
Rulestring: b3s23
";
        let rule = parse(text).unwrap();
        assert_eq!(rule.conditions(), BsConditions::Isotropic(HenselFamily::Moore));
        assert_eq!(rule.offsets(0), HenselFamily::Moore.offsets());
        // Ring positions 0, 1, 2 form a straight edge of three.
        assert_eq!(rule.next_state(0, &[1, 1, 1, 0, 0, 0, 0, 0], 0), 1);
    }

    #[test]
    fn errors_are_descriptive() {
        let short = LIFE.replace("1,0,1\n", "");
        assert!(matches!(
            parse(&short),
            Err(RuleParseError::NeighbourhoodRows {
                found: 2,
                expected: 3,
                ..
            })
        ));
        let palette = LIFE.replace("None", "0,0,0");
        assert!(matches!(
            parse(&palette),
            Err(RuleParseError::PaletteLength {
                expected: 2,
                found: 1
            })
        ));
        let space = LIFE.replace("Outer Totalistic", "Larger than Life");
        assert!(matches!(
            parse(&space),
            Err(RuleParseError::UnknownRulespace(_))
        ));
        let hensel_bsfkl = LIFE
            .replace("Outer Totalistic", "BSFKL")
            .replace("State Weights: 0,1", "State Weights: 0,1,1\nB/S Conditions: Hensel");
        assert!(matches!(
            parse(&hensel_bsfkl),
            Err(RuleParseError::IncompatibleConditions { .. })
        ));
        let tiling = format!("{LIFE}Tiling: Hexagonal\n");
        assert!(matches!(
            parse(&tiling),
            Err(RuleParseError::UnsupportedTiling(_))
        ));
        let rulestring = LIFE.replace("b3s2,3", "b3q2");
        assert!(matches!(
            parse(&rulestring),
            Err(RuleParseError::Rulestring { .. })
        ));
    }

    #[test]
    fn oversized_range_is_rejected() {
        for range in ["65", "4611686018427387904"] {
            let huge = LIFE.replace("Range: 1", &format!("Range: {range}"));
            assert!(matches!(
                parse(&huge),
                Err(RuleParseError::Malformed { line: 2, .. })
            ));
        }
    }

    #[test]
    fn weights_that_can_overflow_are_rejected() {
        let heavy_states = LIFE.replace(
            "State Weights: 0,1",
            &format!("State Weights: {max},{max}", max = i64::MAX),
        );
        assert!(matches!(
            parse(&heavy_states),
            Err(RuleParseError::WeightOverflow { phase: 1 })
        ));
        let heavy_block = LIFE.replace("1,0,1\n", &format!("1,0,{}\n", i64::MAX - 3));
        assert!(matches!(
            parse(&heavy_block),
            Err(RuleParseError::WeightOverflow { phase: 1 })
        ));
        // Large but bounded weights still load.
        let wide = LIFE.replace("1,0,1\n", &format!("1,0,{}\n", i64::MAX / 16));
        assert!(parse(&wide).is_ok());
    }
}
