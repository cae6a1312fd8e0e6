//! Search for periodic backgrounds on closed surfaces.
//!
//! Each soup fills the whole surface and is stepped until a configuration
//! repeats. Runs that settle into a cycle longer than one generation are
//! agars. Distinct agars are told apart by the rotation-normalised
//! population sequence of one cycle.

use std::collections::hash_map::Entry;
use std::collections::{BTreeMap, HashMap, HashSet};

use rayon::prelude::*;
use tracing::{debug, info};

use super::canonical::{canonical_hash, canonical_rotation};
use super::{Progress, ResolvedConfig, random_soup, soup_rng};
use crate::engine::{Simulation, SparseGrid};
use crate::error::BatchError;
use crate::rle;
use crate::rule::RuleDefinition;
use crate::topology::BoundaryPolicy;

/// How a single soup ended.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SoupOutcome {
    /// The configuration at `pre_period + period` equals the one at
    /// `pre_period`.
    Periodic {
        pre_period: u64,
        period: u64,
        /// Population of each generation in the cycle, starting at
        /// `pre_period`.
        populations: Vec<usize>,
        /// The repeated configuration.
        pattern: SparseGrid,
        /// The generation just before the repeat.
        predecessor: SparseGrid,
    },
    /// Reached the generation cap without repeating.
    Unresolved,
}

/// One distinct agar.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AgarRecord {
    pub soup_index: usize,
    pub pre_period: u64,
    pub period: u64,
    /// Canonical rotation of the cycle's population sequence.
    pub signature: Vec<usize>,
    pub rle: String,
    pub predecessor_rle: String,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct AgarReport {
    pub soups: usize,
    pub seed: u64,
    /// First soup to reach each distinct agar, in soup order.
    pub records: Vec<AgarRecord>,
    /// Soups that ended in a cycle of each period, duplicates included.
    pub counts: BTreeMap<u64, usize>,
    pub unresolved: usize,
}

impl AgarReport {
    /// Every record followed by per-period counts and a total.
    pub fn summary(&self) -> String {
        let mut out = String::new();
        for record in &self.records {
            out.push_str(&format!(
                "Period {} (soup {}, settled after {} generations)\n{}{}{}\n",
                record.period,
                record.soup_index,
                record.pre_period,
                record.rle,
                record.predecessor_rle,
                "=".repeat(20)
            ));
        }
        let mut total = 0;
        for (period, count) in &self.counts {
            let plural = if *count == 1 { "" } else { "s" };
            out.push_str(&format!("{count} period {period} agar{plural}\n"));
            total += count;
        }
        let plural = if total == 1 { "" } else { "s" };
        out.push_str(&format!("{total} agar{plural} found in total\n"));
        out
    }
}

/// Step `soup` until a configuration repeats or `cap` generations pass.
pub fn search_soup(
    rule: &RuleDefinition,
    policy: BoundaryPolicy,
    soup: SparseGrid,
    cap: u64,
) -> SoupOutcome {
    let mut seen: HashMap<u64, u64> = HashMap::new();
    let mut populations = Vec::new();
    let mut sim = Simulation::with_grid(rule, policy, soup);
    let mut predecessor = SparseGrid::new();

    loop {
        let generation = sim.generation();
        match seen.entry(canonical_hash(sim.grid())) {
            Entry::Occupied(first) => {
                let pre_period = *first.get();
                return SoupOutcome::Periodic {
                    pre_period,
                    period: generation - pre_period,
                    populations: populations[pre_period as usize..].to_vec(),
                    pattern: sim.into_grid(),
                    predecessor,
                };
            }
            Entry::Vacant(slot) => {
                slot.insert(generation);
            }
        }
        if generation >= cap {
            return SoupOutcome::Unresolved;
        }
        populations.push(sim.population());
        predecessor = sim.grid().clone();
        sim.step();
    }
}

/// Runs inside the caller's pool.
pub(crate) fn run(
    rule: &RuleDefinition,
    config: &ResolvedConfig,
    progress: &Progress,
) -> Result<AgarReport, BatchError> {
    let policy = config
        .policy
        .unwrap_or(BoundaryPolicy::Toroidal {
            width: config.soup_size,
            height: config.soup_size,
        });
    if !policy.is_closed() {
        return Err(BatchError::OpenTopology);
    }
    let (width, height) = policy.dimensions().ok_or(BatchError::OpenTopology)?;

    let outcomes: Vec<SoupOutcome> = (0..config.soups)
        .into_par_iter()
        .map(|index| {
            let mut rng = soup_rng(config.seed, index);
            let soup = random_soup(width, height, config.density, &mut rng);
            let outcome = search_soup(rule, policy, soup, config.generation_cap);
            progress.tick();
            outcome
        })
        .collect();

    let mut report = AgarReport {
        soups: config.soups,
        seed: config.seed,
        ..AgarReport::default()
    };
    let mut known: HashSet<(u64, Vec<usize>)> = HashSet::new();
    for (soup_index, outcome) in outcomes.into_iter().enumerate() {
        let SoupOutcome::Periodic {
            pre_period,
            period,
            populations,
            pattern,
            predecessor,
        } = outcome
        else {
            report.unresolved += 1;
            continue;
        };
        if period <= 1 {
            continue;
        }
        *report.counts.entry(period).or_default() += 1;
        let signature = canonical_rotation(&populations);
        if !known.insert((period, signature.clone())) {
            debug!(soup_index, period, "agar already known");
            continue;
        }
        info!(soup_index, period, pre_period, "new agar");
        report.records.push(AgarRecord {
            soup_index,
            pre_period,
            period,
            signature,
            rle: rle::encode(&pattern, 0, 0, width, height, rule.name())?,
            predecessor_rle: rle::encode(&predecessor, 0, 0, width, height, rule.name())?,
        });
    }
    Ok(report)
}
