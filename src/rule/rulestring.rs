//! Per-phase rulestring grammars.
//!
//! Every rulespace accepts a letter form (`b3s2,3`) and a slash form
//! (`2,3/3`). The slash forms keep their historical field orders: survival
//! comes first for Outer Totalistic and Generations, birth first for BSFKL.

use std::collections::HashSet;

use super::BsConditions;
use super::transition::{BsfklPhase, Condition, PhaseWeights, Tally};

type FieldResult<T> = Result<T, String>;

/// Split the letter form into the text following each key, in key order.
/// Keys past `required` may be omitted from the end.
fn letter_fields(rulestring: &str, keys: &[&str], required: usize) -> FieldResult<Vec<String>> {
    let lower = rulestring.to_ascii_lowercase();
    let mut rest = lower.as_str();
    let mut fields = Vec::with_capacity(keys.len());
    for (i, key) in keys.iter().enumerate() {
        if rest.is_empty() && i >= required {
            break;
        }
        rest = rest
            .strip_prefix(key)
            .ok_or_else(|| format!("expected `{key}` at `{rest}`"))?;
        let end = keys
            .get(i + 1)
            .and_then(|next| rest.find(next))
            .unwrap_or(rest.len());
        fields.push(rest[..end].to_string());
        rest = &rest[end..];
    }
    if !rest.is_empty() {
        return Err(format!("unexpected trailing `{rest}`"));
    }
    fields.resize(keys.len(), String::new());
    Ok(fields)
}

/// Split the slash form, then reorder it into key order via `order`.
fn slash_fields(rulestring: &str, order: &[usize], required: usize) -> FieldResult<Vec<String>> {
    let parts: Vec<&str> = rulestring.split('/').map(str::trim).collect();
    if parts.len() < required || parts.len() > order.len() {
        return Err(format!(
            "expected {} `/`-separated fields, found {}",
            if required == order.len() {
                required.to_string()
            } else {
                format!("{required} to {}", order.len())
            },
            parts.len()
        ));
    }
    let mut fields = vec![String::new(); order.len()];
    for (slot, part) in order.iter().zip(parts) {
        fields[*slot] = part.to_string();
    }
    Ok(fields)
}

fn fields(
    rulestring: &str,
    keys: &[&str],
    slash_order: &[usize],
    required: usize,
) -> FieldResult<Vec<String>> {
    if rulestring.contains('/') {
        slash_fields(rulestring, slash_order, required)
    } else {
        letter_fields(rulestring, keys, required)
    }
}

/// Comma-separated integers; an empty field is the empty set.
pub fn int_set(field: &str) -> FieldResult<HashSet<i64>> {
    field
        .split(',')
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(|v| v.parse::<i64>().map_err(|_| format!("`{v}` is not an integer")))
        .collect()
}

fn condition(field: &str, conditions: BsConditions) -> FieldResult<Condition> {
    Ok(match conditions {
        BsConditions::Weighted => Condition::Totals {
            tally: Tally::Weighted,
            values: int_set(field)?,
        },
        BsConditions::Raw => Condition::Totals {
            tally: Tally::Raw,
            values: int_set(field)?,
        },
        BsConditions::Isotropic(family) => {
            Condition::Configurations(family.parse_transitions(field)?)
        }
    })
}

/// Totals-only condition for the regeneration sets, tallied like B/S.
fn regen_condition(field: &str, conditions: BsConditions) -> FieldResult<Option<Condition>> {
    let values = int_set(field)?;
    if values.is_empty() {
        return Ok(None);
    }
    let tally = match conditions {
        BsConditions::Raw => Tally::Raw,
        _ => Tally::Weighted,
    };
    Ok(Some(Condition::Totals { tally, values }))
}

/// Birth and survival conditions.
pub fn outer_totalistic(
    rulestring: &str,
    conditions: BsConditions,
) -> FieldResult<(Condition, Condition)> {
    let f = fields(rulestring, &["b", "s"], &[1, 0], 2)?;
    Ok((condition(&f[0], conditions)?, condition(&f[1], conditions)?))
}

pub fn bsfkl(rulestring: &str, weights: Vec<i64>) -> FieldResult<BsfklPhase> {
    let f = fields(rulestring, &["b", "s", "f", "k", "l"], &[0, 1, 2, 3, 4], 5)?;
    Ok(BsfklPhase {
        weights,
        birth: int_set(&f[0])?,
        survival: int_set(&f[1])?,
        forcing: int_set(&f[2])?,
        killing: int_set(&f[3])?,
        living: int_set(&f[4])?,
    })
}

/// Activity mask from dash-separated run lengths, alternating active and
/// inactive starting at state 1.
pub fn activity(spec: &str, n_states: usize) -> FieldResult<Vec<bool>> {
    let mut active = vec![false];
    let mut on = true;
    for run in spec.split('-').map(str::trim) {
        let len: usize = run
            .parse()
            .map_err(|_| format!("`{run}` is not a run length"))?;
        active.extend(std::iter::repeat_n(on, len));
        on = !on;
    }
    if active.len() != n_states {
        return Err(format!(
            "state runs cover {} states, rule has {n_states}",
            active.len()
        ));
    }
    Ok(active)
}

pub struct GenerationsFields {
    pub birth: Condition,
    pub survival: Condition,
    pub active: Vec<bool>,
    pub regen_birth: Option<Condition>,
    pub regen_survival: Option<Condition>,
}

/// Extended Generations, plus the `rb`/`rs` sets when `regenerating`.
pub fn generations(
    rulestring: &str,
    conditions: BsConditions,
    n_states: usize,
    regenerating: bool,
) -> FieldResult<GenerationsFields> {
    let f = if regenerating {
        fields(
            rulestring,
            &["b", "s", "d", "rb", "rs"],
            &[1, 0, 2, 3, 4],
            3,
        )?
    } else {
        fields(rulestring, &["b", "s", "d"], &[1, 0, 2], 3)?
    };
    let (regen_birth, regen_survival) = if regenerating {
        (
            regen_condition(&f[3], conditions)?,
            regen_condition(&f[4], conditions)?,
        )
    } else {
        (None, None)
    };
    Ok(GenerationsFields {
        birth: condition(&f[0], conditions)?,
        survival: condition(&f[1], conditions)?,
        active: activity(&f[2], n_states)?,
        regen_birth,
        regen_survival,
    })
}

/// Weights used by a phase's tallies.
pub fn phase_weights(weights: &[i64], state_weights: &[i64]) -> PhaseWeights {
    PhaseWeights {
        weights: weights.to_vec(),
        state_weights: state_weights.to_vec(),
    }
}
