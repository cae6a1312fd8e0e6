//! Run-length encoded pattern text.
//!
//! Background is `.`, state `s` in `1..=25` is the letter `chr(64 + s)`
//! (`A`..`Y`), and `$` ends a row. Any symbol may be preceded by a repeat
//! count. Two-state files using `b`/`o` also decode.

use crate::engine::{Bounds, SparseGrid, State};
use crate::error::RleError;

/// Highest state with a single-letter symbol.
pub const MAX_ENCODABLE_STATE: State = 25;
const LINE_WIDTH: usize = 70;

/// A decoded pattern, placed with its top-left corner at `(0, 0)`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RlePattern {
    pub grid: SparseGrid,
    pub width: i64,
    pub height: i64,
    /// Rule named in the header. Advisory only.
    pub rule: Option<String>,
}

struct RunWriter {
    out: String,
    line_len: usize,
    symbol: Option<char>,
    count: u64,
}

impl RunWriter {
    fn new(header: String) -> Self {
        Self {
            out: header,
            line_len: 0,
            symbol: None,
            count: 0,
        }
    }

    fn push(&mut self, symbol: char) {
        if self.symbol == Some(symbol) {
            self.count += 1;
            return;
        }
        self.flush();
        self.symbol = Some(symbol);
        self.count = 1;
    }

    fn flush(&mut self) {
        let Some(symbol) = self.symbol.take() else {
            return;
        };
        let token = if self.count > 1 {
            format!("{}{symbol}", self.count)
        } else {
            symbol.to_string()
        };
        if self.line_len + token.len() > LINE_WIDTH {
            self.out.push('\n');
            self.line_len = 0;
        }
        self.line_len += token.len();
        self.out.push_str(&token);
        self.count = 0;
    }

    fn finish(mut self) -> String {
        self.flush();
        self.out.push_str("!\n");
        self.out
    }
}

/// Encode the half-open window `[lower_x, upper_x) × [lower_y, upper_y)`.
pub fn encode(
    grid: &SparseGrid,
    lower_x: i64,
    lower_y: i64,
    upper_x: i64,
    upper_y: i64,
    rule_name: &str,
) -> Result<String, RleError> {
    let header = format!(
        "x = {}, y = {}, rule = {rule_name}\n",
        upper_x - lower_x,
        upper_y - lower_y
    );
    let mut writer = RunWriter::new(header);
    let mut line = String::new();
    for row in lower_y..upper_y {
        line.clear();
        for col in lower_x..upper_x {
            line.push(match grid.get((row, col)) {
                0 => '.',
                s if s <= MAX_ENCODABLE_STATE => (b'@' + s) as char,
                s => return Err(RleError::EncodingLimitation { state: s, row, col }),
            });
        }
        // Trailing background on a row carries no information.
        line.trim_end_matches('.').chars().for_each(|c| writer.push(c));
        writer.push('$');
    }
    Ok(writer.finish())
}

/// Encode the exact bounding box of `grid`.
pub fn encode_grid(grid: &SparseGrid, rule_name: &str) -> Result<String, RleError> {
    match grid.tight_bounds() {
        Some(Bounds {
            lower_x,
            upper_x,
            lower_y,
            upper_y,
        }) => encode(grid, lower_x, lower_y, upper_x + 1, upper_y + 1, rule_name),
        None => encode(grid, 0, 0, 0, 0, rule_name),
    }
}

fn header_value<'a>(part: &'a str, key: &str) -> Option<&'a str> {
    let (k, v) = part.split_once('=')?;
    (k.trim().eq_ignore_ascii_case(key)).then(|| v.trim())
}

fn parse_header(line: &str) -> Result<(i64, i64, Option<String>), RleError> {
    let invalid = || RleError::InvalidHeader(line.to_string());
    let mut parts = line.splitn(3, ',');
    let mut dimension = |key| {
        parts
            .next()
            .and_then(|p| header_value(p, key))
            .and_then(|v| v.parse::<i64>().ok())
            .filter(|v| *v >= 0)
            .ok_or_else(invalid)
    };
    let width = dimension("x")?;
    let height = dimension("y")?;
    let rule = match parts.next() {
        Some(rest) => Some(header_value(rest, "rule").ok_or_else(invalid)?.to_string()),
        None => None,
    };
    Ok((width, height, rule))
}

/// Decode RLE text, rejecting states the loaded rule does not have and runs
/// that leave the `x` by `y` box declared in the header.
pub fn decode(text: &str, n_states: usize) -> Result<RlePattern, RleError> {
    let mut lines = text
        .lines()
        .enumerate()
        .map(|(i, l)| (i + 1, l.trim()))
        .filter(|(_, l)| !l.is_empty() && !l.starts_with('#'));

    let (_, header) = lines.next().ok_or(RleError::MissingHeader)?;
    if !header.trim_start().starts_with(['x', 'X']) {
        return Err(RleError::MissingHeader);
    }
    let (width, height, rule) = parse_header(header)?;

    let outside = |line| RleError::OutsideHeader {
        width,
        height,
        line,
    };
    let mut grid = SparseGrid::new();
    let (mut row, mut col) = (0i64, 0i64);
    let mut count: i64 = 0;

    'body: for (line_no, line) in lines {
        for ch in line.chars() {
            let run = count.max(1);
            match ch {
                '0'..='9' => {
                    count = count.saturating_mul(10).saturating_add((ch as u8 - b'0') as i64);
                    continue;
                }
                '.' | 'b' => {
                    col = col.saturating_add(run);
                    if col > width {
                        return Err(outside(line_no));
                    }
                }
                '$' => {
                    row = row.saturating_add(run);
                    col = 0;
                    if row > height {
                        return Err(outside(line_no));
                    }
                }
                '!' => break 'body,
                c if c.is_whitespace() => continue,
                'o' | 'A'..='Y' => {
                    let state = if ch == 'o' { 1 } else { ch as u8 - b'@' };
                    if state as usize >= n_states {
                        return Err(RleError::StateOutOfRange {
                            state: state as usize,
                            n_states,
                            pattern_rule: rule,
                        });
                    }
                    if row >= height || col.saturating_add(run) > width {
                        return Err(outside(line_no));
                    }
                    for _ in 0..run {
                        grid.set((row, col), state);
                        col += 1;
                    }
                }
                other => {
                    return Err(RleError::UnexpectedCharacter {
                        character: other,
                        line: line_no,
                    });
                }
            }
            count = 0;
        }
    }

    Ok(RlePattern {
        grid,
        width,
        height,
        rule,
    })
}

#[cfg(test)]
mod tests {
    use super::{decode, encode, encode_grid};
    use crate::engine::SparseGrid;
    use crate::error::RleError;

    #[test]
    fn encodes_glider_with_runs() {
        let glider: SparseGrid = [((0, 1), 1), ((1, 2), 1), ((2, 0), 1), ((2, 1), 1), ((2, 2), 1)]
            .into_iter()
            .collect();
        let text = encode(&glider, 0, 0, 3, 3, "Life").unwrap();
        assert_eq!(text, "x = 3, y = 3, rule = Life\n.A$2.A$3A$!\n");
    }

    #[test]
    fn blank_rows_collapse() {
        let grid: SparseGrid = [((0, 0), 2), ((3, 0), 1)].into_iter().collect();
        let text = encode_grid(&grid, "Gen").unwrap();
        assert_eq!(text, "x = 1, y = 4, rule = Gen\nB3$A$!\n");
        let back = decode(&text, 3).unwrap();
        assert_eq!(back.grid, grid);
        assert_eq!((back.width, back.height), (1, 4));
        assert_eq!(back.rule.as_deref(), Some("Gen"));
    }

    #[test]
    fn long_rows_wrap_at_seventy_columns() {
        let grid: SparseGrid = (0..200).step_by(2).map(|c| ((0, c), 1)).collect();
        let text = encode_grid(&grid, "Life").unwrap();
        assert!(text.lines().all(|l| l.len() <= 70));
        assert_eq!(decode(&text, 2).unwrap().grid, grid);
    }

    #[test]
    fn high_states_are_rejected_explicitly() {
        let grid: SparseGrid = [((4, 7), 26)].into_iter().collect();
        assert_eq!(
            encode_grid(&grid, "Big"),
            Err(RleError::EncodingLimitation {
                state: 26,
                row: 4,
                col: 7
            })
        );
    }

    #[test]
    fn decodes_two_state_aliases_and_comments() {
        let text = "#N Blinker\n#C comment\nx = 3, y = 1, rule = B3/S23\n3o!";
        let pattern = decode(text, 2).unwrap();
        assert_eq!(pattern.grid.len(), 3);
        assert_eq!(pattern.grid.get((0, 2)), 1);
        assert_eq!(pattern.rule.as_deref(), Some("B3/S23"));

        let spaced = decode("x = 3, y = 2\nb o\n$ 2o !", 2).unwrap();
        assert_eq!(spaced.grid.sorted_cells(), vec![((0, 1), 1), ((1, 0), 1), ((1, 1), 1)]);
        assert!(spaced.rule.is_none());
    }

    #[test]
    fn decode_errors() {
        assert_eq!(decode("", 2), Err(RleError::MissingHeader));
        assert_eq!(decode("3o!", 2), Err(RleError::MissingHeader));
        assert!(matches!(
            decode("x = a, y = 1", 2),
            Err(RleError::InvalidHeader(_))
        ));
        assert_eq!(
            decode("x = 1, y = 1\nA%!", 2),
            Err(RleError::UnexpectedCharacter {
                character: '%',
                line: 2
            })
        );
        assert_eq!(
            decode("x = 1, y = 1, rule = BSFKL\nC!", 2),
            Err(RleError::StateOutOfRange {
                state: 3,
                n_states: 2,
                pattern_rule: Some("BSFKL".to_string())
            })
        );
    }
}
