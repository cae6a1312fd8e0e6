//! Error types returned by the rule parser, the RLE codec and the batch runner.
//!
//! Nothing in the library aborts on bad input: every failure surfaces as one
//! of these values so the caller can re-prompt or load a different file.

use thiserror::Error;

/// Failure to turn rule-definition text into a [`crate::rule::RuleDefinition`].
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RuleParseError {
    #[error("line {line}: {message}")]
    Malformed { line: usize, message: String },

    #[error("missing `{0}` section")]
    MissingSection(&'static str),

    #[error("neighbourhood block {block} has {found} rows, expected {expected}")]
    NeighbourhoodRows {
        block: usize,
        found: usize,
        expected: usize,
    },

    #[error("neighbourhood block {block}, row {row}: found {found} weights, expected {expected}")]
    NeighbourhoodColumns {
        block: usize,
        row: usize,
        found: usize,
        expected: usize,
    },

    #[error("state weights for phase {phase} have {found} entries, expected {expected}")]
    StateWeightLength {
        phase: usize,
        found: usize,
        expected: usize,
    },

    #[error("rule declares {0} states; supported range is 2..=256")]
    StateCount(usize),

    #[error("unknown rulespace `{0}`")]
    UnknownRulespace(String),

    #[error("unknown B/S conditions `{0}`")]
    UnknownConditions(String),

    #[error("B/S conditions `{conditions}` cannot be combined with rulespace `{rulespace}`")]
    IncompatibleConditions {
        conditions: String,
        rulespace: String,
    },

    #[error("weights for phase {phase} can sum past the integer range")]
    WeightOverflow { phase: usize },

    #[error("unsupported tiling `{0}`")]
    UnsupportedTiling(String),

    #[error("rulestring `{rulestring}`: {message}")]
    Rulestring { rulestring: String, message: String },

    #[error("colour palette has {found} entries but the rule has {expected} states")]
    PaletteLength { expected: usize, found: usize },

    #[error("invalid colour palette entry `{0}`")]
    PaletteValue(String),
}

impl RuleParseError {
    pub(crate) fn malformed(line: usize, message: impl Into<String>) -> Self {
        Self::Malformed {
            line,
            message: message.into(),
        }
    }

    pub(crate) fn rulestring(rulestring: &str, message: impl Into<String>) -> Self {
        Self::Rulestring {
            rulestring: rulestring.to_string(),
            message: message.into(),
        }
    }
}

/// Failure to encode or decode RLE text.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RleError {
    #[error("missing `x = .., y = ..` header line")]
    MissingHeader,

    #[error("invalid header `{0}`")]
    InvalidHeader(String),

    #[error("unexpected character `{character}` on line {line}")]
    UnexpectedCharacter { character: char, line: usize },

    #[error(
        "state {state} is outside the {n_states} states of the loaded rule{}",
        rule_hint(.pattern_rule)
    )]
    StateOutOfRange {
        state: usize,
        n_states: usize,
        /// Rule named in the pattern header, so the caller can offer to load it.
        pattern_rule: Option<String>,
    },

    #[error("line {line}: pattern runs past its declared {width}x{height} box")]
    OutsideHeader { width: i64, height: i64, line: usize },

    /// States above 25 have no single-letter RLE symbol.
    #[error("state {state} at ({row}, {col}) has no RLE letter; only states 1..=25 can be encoded")]
    EncodingLimitation { state: u8, row: i64, col: i64 },
}

fn rule_hint(rule: &Option<String>) -> String {
    match rule {
        Some(name) => format!(" (pattern was saved under rule `{name}`)"),
        None => String::new(),
    }
}

/// Failure to parse a boundary specifier such as `T64,32`.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("invalid boundary specifier `{0}`")]
pub struct BoundaryParseError(pub String);

/// Failure to set up or run a batch workload.
#[derive(Debug, Error)]
pub enum BatchError {
    #[error("failed to build worker pool: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),

    #[error("agar search needs a closed topology with both dimensions set")]
    OpenTopology,

    #[error("{0} must be positive")]
    NonPositive(&'static str),

    #[error("{what} exceeds the limit of {max}")]
    TooLarge { what: &'static str, max: i64 },

    #[error(transparent)]
    Rle(#[from] RleError),
}

#[cfg(test)]
mod tests {
    use super::RleError;

    #[test]
    fn state_out_of_range_mentions_pattern_rule() {
        let err = RleError::StateOutOfRange {
            state: 3,
            n_states: 2,
            pattern_rule: Some("BSFKL".to_string()),
        };
        let text = err.to_string();
        assert!(text.contains("state 3"));
        assert!(text.contains("`BSFKL`"));

        let bare = RleError::StateOutOfRange {
            state: 3,
            n_states: 2,
            pattern_rule: None,
        };
        assert!(!bare.to_string().contains("saved under"));
    }
}
