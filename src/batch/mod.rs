//! Ensemble runs over many random soups.
//!
//! Every soup is an independent lineage seeded from `seed + index`, so the
//! split of soups across workers never changes a result. Workers only share
//! the rule and a progress counter; aggregation happens after the pool's
//! `install` returns.

pub mod agar;
mod canonical;
mod config;
pub mod geneascopy;

use std::fmt;
use std::fmt::Write as _;
use std::sync::atomic::{AtomicUsize, Ordering};

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::info;

pub use agar::{AgarRecord, AgarReport, SoupOutcome};
pub use canonical::{canonical_hash, canonical_rotation};
pub use config::{
    BatchConfig, DEFAULT_DENSITY, DEFAULT_GENERATION_CAP, DEFAULT_GENERATIONS, DEFAULT_SOUP_SIZE,
    DEFAULT_SOUPS, MAX_SOUP_SIZE, THREADS_ENV,
};
pub use geneascopy::GeneascopyReport;

use crate::engine::SparseGrid;
use crate::error::BatchError;
use crate::rule::RuleDefinition;
pub(crate) use config::ResolvedConfig;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Workload {
    /// Mean population per generation up to a fixed horizon.
    Geneascopy,
    /// Periodic backgrounds on a closed surface.
    Agar,
}

#[derive(Clone, Debug, PartialEq)]
pub enum BatchResult {
    Geneascopy(GeneascopyReport),
    Agar(AgarReport),
}

/// Completed-soup counter shared by the workers of one run.
pub(crate) struct Progress {
    done: AtomicUsize,
    total: usize,
    every: usize,
}

impl Progress {
    fn new(total: usize) -> Self {
        Self {
            done: AtomicUsize::new(0),
            total,
            every: (total / 10).max(1),
        }
    }

    pub(crate) fn tick(&self) {
        let done = self.done.fetch_add(1, Ordering::Relaxed) + 1;
        if done % self.every == 0 || done == self.total {
            info!(done, total = self.total, "soups finished");
        }
    }

    fn finished(&self) -> usize {
        self.done.load(Ordering::Relaxed)
    }
}

/// Generator for soup `index` of a run seeded with `seed`.
pub fn soup_rng(seed: u64, index: usize) -> StdRng {
    StdRng::seed_from_u64(seed.wrapping_add(index as u64))
}

/// `width × height` cells at the origin, each in state 1 with probability
/// `density`.
pub fn random_soup<R: Rng>(width: i64, height: i64, density: f64, rng: &mut R) -> SparseGrid {
    if width <= 0 || height <= 0 {
        return SparseGrid::new();
    }
    let density = density.clamp(0.0, 1.0);
    let cells = usize::try_from(width.saturating_mul(height)).unwrap_or(0);
    let mut grid = SparseGrid::with_capacity(cells / 2);
    for row in 0..height {
        for col in 0..width {
            if rng.random_bool(density) {
                grid.set((row, col), 1);
            }
        }
    }
    grid
}

/// `Generations,Population` header, then one `<gen>,<value>` line each.
pub fn population_csv<T: fmt::Display>(populations: &[T]) -> String {
    let mut out = String::from("Generations,Population\n");
    for (generation, population) in populations.iter().enumerate() {
        let _ = writeln!(out, "{generation},{population}");
    }
    out
}

/// Run `workload` over `config.soups` soups on a dedicated worker pool.
pub fn run_batch(
    rule: &RuleDefinition,
    config: &BatchConfig,
    workload: Workload,
) -> Result<BatchResult, BatchError> {
    let resolved = config.resolve()?;
    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(resolved.threads)
        .build()?;
    info!(
        ?workload,
        rule = rule.name(),
        soups = resolved.soups,
        threads = resolved.threads,
        seed = resolved.seed,
        "starting batch"
    );

    let progress = Progress::new(resolved.soups);
    let result = pool.install(|| match workload {
        Workload::Geneascopy => Ok(BatchResult::Geneascopy(geneascopy::run(
            rule, &resolved, &progress,
        ))),
        Workload::Agar => agar::run(rule, &resolved, &progress).map(BatchResult::Agar),
    })?;
    info!(finished = progress.finished(), "batch complete");
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn soups_depend_only_on_seed_and_index() {
        let a = random_soup(16, 16, 0.5, &mut soup_rng(7, 3));
        let b = random_soup(16, 16, 0.5, &mut soup_rng(7, 3));
        let c = random_soup(16, 16, 0.5, &mut soup_rng(7, 4));
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert!(a.coords().all(|(r, c)| (0..16).contains(&r) && (0..16).contains(&c)));
    }

    #[test]
    fn density_extremes() {
        let mut rng = soup_rng(1, 0);
        assert!(random_soup(8, 8, 0.0, &mut rng).is_empty());
        assert_eq!(random_soup(8, 8, 1.0, &mut rng).len(), 64);
    }

    #[test]
    fn degenerate_dimensions_give_empty_soups() {
        let mut rng = soup_rng(2, 0);
        assert!(random_soup(-4, 6, 1.0, &mut rng).is_empty());
        assert!(random_soup(i64::MAX, 0, 1.0, &mut rng).is_empty());
        assert!(random_soup(0, i64::MAX, 1.0, &mut rng).is_empty());
    }

    #[test]
    fn csv_rows_follow_generations() {
        assert_eq!(
            population_csv(&[5usize, 4, 4]),
            "Generations,Population\n0,5\n1,4\n2,4\n"
        );
    }

    #[test]
    fn agar_rejects_infinite_plane() {
        let rule = RuleDefinition::life();
        let config = BatchConfig::default()
            .thread_count(1)
            .soups(1)
            .seed(0)
            .policy(crate::topology::BoundaryPolicy::Infinite);
        assert!(matches!(
            run_batch(&rule, &config, Workload::Agar),
            Err(BatchError::OpenTopology)
        ));
    }
}
