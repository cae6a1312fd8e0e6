//! Sparse multi-state cellular automata.
//!
//! Rules are loaded from a sectioned text format into an immutable
//! [`RuleDefinition`], patterns live in a [`SparseGrid`] that stores only
//! non-zero cells, and the engine re-evaluates just the neighbourhood of
//! cells that changed last generation. On top of the engine sit a period
//! and motion identifier, an RLE codec and a multi-threaded soup runner.

pub mod batch;
pub mod engine;
pub mod error;
pub mod identify;
pub mod rle;
pub mod rule;
pub mod topology;

pub use batch::{BatchConfig, BatchResult, Workload, population_csv, run_batch};
pub use engine::{ActiveSet, Coord, Simulation, SparseGrid, State, step};
pub use error::{BatchError, RleError, RuleParseError};
pub use identify::{IdentificationResult, PatternKind, identify};
pub use rle::{decode as decode_rle, encode as encode_rle};
pub use rule::{RuleDefinition, load_rule};
pub use topology::BoundaryPolicy;
