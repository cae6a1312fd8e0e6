//! Mean population curves over an ensemble of random soups.

use rayon::prelude::*;

use super::{Progress, ResolvedConfig, population_csv, random_soup, soup_rng};
use crate::engine::{Simulation, SparseGrid};
use crate::rule::RuleDefinition;
use crate::topology::BoundaryPolicy;

/// Mean population per generation across every soup of a run.
#[derive(Clone, Debug, PartialEq)]
pub struct GeneascopyReport {
    pub soups: usize,
    pub seed: u64,
    /// Index `g` is the mean population at generation `g`.
    pub mean_population: Vec<f64>,
}

impl GeneascopyReport {
    /// `Generations,Population` followed by one line per generation.
    pub fn to_csv(&self) -> String {
        population_csv(&self.mean_population)
    }
}

/// Populations at generations `0..generations` of one soup.
pub(crate) fn soup_populations(
    rule: &RuleDefinition,
    policy: BoundaryPolicy,
    soup: SparseGrid,
    generations: u64,
) -> Vec<u64> {
    let mut sim = Simulation::with_grid(rule, policy, soup);
    let mut populations = Vec::with_capacity(generations as usize);
    for _ in 0..generations {
        populations.push(sim.population() as u64);
        sim.step();
    }
    populations
}

fn add_into(mut total: Vec<u64>, other: Vec<u64>) -> Vec<u64> {
    if total.len() < other.len() {
        total.resize(other.len(), 0);
    }
    for (t, p) in total.iter_mut().zip(other) {
        *t += p;
    }
    total
}

/// Runs inside the caller's pool. Integer totals keep the mean independent
/// of how soups are split between workers.
pub(crate) fn run(
    rule: &RuleDefinition,
    config: &ResolvedConfig,
    progress: &Progress,
) -> GeneascopyReport {
    let policy = config.policy.unwrap_or_default();
    let totals = (0..config.soups)
        .into_par_iter()
        .map(|index| {
            let mut rng = soup_rng(config.seed, index);
            let soup = random_soup(config.soup_size, config.soup_size, config.density, &mut rng);
            let populations = soup_populations(rule, policy, soup, config.generations);
            progress.tick();
            populations
        })
        .reduce(Vec::new, add_into);

    let soups = config.soups as f64;
    GeneascopyReport {
        soups: config.soups,
        seed: config.seed,
        mean_population: totals.into_iter().map(|t| t as f64 / soups).collect(),
    }
}
