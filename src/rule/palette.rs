//! Per-state display colours.

use crate::error::RuleParseError;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Rgb(pub u8, pub u8, pub u8);

impl Rgb {
    pub const BLACK: Rgb = Rgb(0, 0, 0);
    pub const WHITE: Rgb = Rgb(255, 255, 255);
}

/// Default colours: black/white for two states, otherwise black followed by
/// a red-to-yellow ramp.
pub fn generate(n_states: usize) -> Vec<Rgb> {
    if n_states <= 2 {
        return vec![Rgb::BLACK, Rgb::WHITE][..n_states.max(1)].to_vec();
    }
    let step = 255 / (n_states - 2);
    std::iter::once(Rgb::BLACK)
        .chain((0..n_states - 1).map(|s| Rgb(255, (step * s).min(255) as u8, 0)))
        .collect()
}

/// Parse one palette line: `R,G,B`, `(R, G, B)` or `<index> (R, G, B)`.
pub fn parse_entry(line: &str) -> Result<Rgb, RuleParseError> {
    let err = || RuleParseError::PaletteValue(line.to_string());
    let body = match line.find('(') {
        Some(open) => {
            let close = line.rfind(')').filter(|&c| c > open).ok_or_else(err)?;
            &line[open + 1..close]
        }
        None => line,
    };
    let channels = body
        .split(',')
        .map(|c| c.trim().parse::<u8>().map_err(|_| err()))
        .collect::<Result<Vec<_>, _>>()?;
    match channels[..] {
        [r, g, b] => Ok(Rgb(r, g, b)),
        _ => Err(err()),
    }
}
