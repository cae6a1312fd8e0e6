use crate::error::BatchError;
use crate::topology::BoundaryPolicy;

/// Environment override for the worker count.
pub const THREADS_ENV: &str = "SPARSE_LIFE_THREADS";

pub const DEFAULT_SOUP_SIZE: i64 = 16;
pub const DEFAULT_DENSITY: f64 = 0.5;
pub const DEFAULT_SOUPS: usize = 100;
pub const DEFAULT_GENERATIONS: u64 = 1000;
/// Agar runs that have not repeated by this generation are abandoned.
pub const DEFAULT_GENERATION_CAP: u64 = 10_000;
/// Largest soup side, and largest closed-topology side, a batch accepts.
pub const MAX_SOUP_SIZE: i64 = 4096;

/// Configuration for a batch run.
///
/// Use `BatchConfig::default()` for defaults, or set individual knobs via
/// the builder methods. Every `None` falls back to a documented default.
#[derive(Clone, Debug, Default)]
pub struct BatchConfig {
    /// Number of worker threads.
    /// `None` means `SPARSE_LIFE_THREADS`, then the physical core count.
    pub thread_count: Option<usize>,
    /// Hard upper bound on threads regardless of auto-detection.
    pub max_threads: Option<usize>,
    /// Base seed; soup `i` is drawn from `seed + i`.
    /// `None` draws a fresh base seed, logged so the run can be repeated.
    pub seed: Option<u64>,
    /// Side of the square soup used by geneascopy.
    pub soup_size: Option<i64>,
    /// Probability that a soup cell starts in state 1.
    pub density: Option<f64>,
    pub soups: Option<usize>,
    /// Geneascopy horizon.
    pub generations: Option<u64>,
    /// Agar step limit.
    pub generation_cap: Option<u64>,
    /// Topology the soups evolve under. Agar search requires a closed one.
    pub policy: Option<BoundaryPolicy>,
}

impl BatchConfig {
    pub fn thread_count(mut self, n: usize) -> Self {
        self.thread_count = Some(n.max(1));
        self
    }

    pub fn max_threads(mut self, n: usize) -> Self {
        self.max_threads = Some(n.max(1));
        self
    }

    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn soup_size(mut self, size: i64) -> Self {
        self.soup_size = Some(size);
        self
    }

    /// Clamped to `[0, 1]`.
    pub fn density(mut self, density: f64) -> Self {
        self.density = Some(density.clamp(0.0, 1.0));
        self
    }

    pub fn soups(mut self, n: usize) -> Self {
        self.soups = Some(n);
        self
    }

    pub fn generations(mut self, n: u64) -> Self {
        self.generations = Some(n);
        self
    }

    pub fn generation_cap(mut self, n: u64) -> Self {
        self.generation_cap = Some(n);
        self
    }

    pub fn policy(mut self, policy: BoundaryPolicy) -> Self {
        self.policy = Some(policy);
        self
    }

    /// Fill in every default and validate the result.
    pub(crate) fn resolve(&self) -> Result<ResolvedConfig, BatchError> {
        let soups = self.soups.unwrap_or(DEFAULT_SOUPS);
        let soup_size = self.soup_size.unwrap_or(DEFAULT_SOUP_SIZE);
        let generations = self.generations.unwrap_or(DEFAULT_GENERATIONS);
        let generation_cap = self.generation_cap.unwrap_or(DEFAULT_GENERATION_CAP);
        if soups == 0 {
            return Err(BatchError::NonPositive("soup count"));
        }
        if soup_size <= 0 {
            return Err(BatchError::NonPositive("soup size"));
        }
        let policy_side = self
            .policy
            .and_then(BoundaryPolicy::dimensions)
            .map_or(0, |(w, h)| w.max(h));
        if soup_size > MAX_SOUP_SIZE || policy_side > MAX_SOUP_SIZE {
            return Err(BatchError::TooLarge {
                what: "soup size",
                max: MAX_SOUP_SIZE,
            });
        }
        if generations == 0 {
            return Err(BatchError::NonPositive("generation count"));
        }
        if generation_cap == 0 {
            return Err(BatchError::NonPositive("generation cap"));
        }
        Ok(ResolvedConfig {
            threads: resolve_thread_count(self),
            seed: self.seed.unwrap_or_else(rand::random),
            soup_size,
            density: self.density.unwrap_or(DEFAULT_DENSITY).clamp(0.0, 1.0),
            soups,
            generations,
            generation_cap,
            policy: self.policy,
        })
    }
}

/// A [`BatchConfig`] with every default applied.
#[derive(Clone, Copy, Debug)]
pub(crate) struct ResolvedConfig {
    pub threads: usize,
    pub seed: u64,
    pub soup_size: i64,
    pub density: f64,
    pub soups: usize,
    pub generations: u64,
    pub generation_cap: u64,
    pub policy: Option<BoundaryPolicy>,
}

fn env_thread_count() -> Option<usize> {
    std::env::var(THREADS_ENV)
        .ok()
        .and_then(|v| v.trim().parse::<usize>().ok())
        .filter(|&n| n > 0)
}

/// Resolve the thread count from a config, falling back to auto-detect.
fn resolve_thread_count(config: &BatchConfig) -> usize {
    let mut threads = config
        .thread_count
        .or_else(env_thread_count)
        .unwrap_or_else(|| num_cpus::get_physical().max(1));
    if let Some(cap) = config.max_threads {
        threads = threads.min(cap);
    }
    threads.max(1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn explicit_threads_respect_cap() {
        let config = BatchConfig::default().thread_count(12).max_threads(4);
        assert_eq!(resolve_thread_count(&config), 4);
        let config = BatchConfig::default().thread_count(0);
        assert_eq!(resolve_thread_count(&config), 1);
    }

    #[test]
    fn defaults_fill_in() {
        let resolved = BatchConfig::default().seed(9).resolve().unwrap();
        assert_eq!(resolved.seed, 9);
        assert_eq!(resolved.soup_size, DEFAULT_SOUP_SIZE);
        assert_eq!(resolved.soups, DEFAULT_SOUPS);
        assert_eq!(resolved.generation_cap, DEFAULT_GENERATION_CAP);
        assert!(resolved.threads >= 1);
        assert!(resolved.policy.is_none());
    }

    #[test]
    fn density_is_clamped() {
        assert_eq!(BatchConfig::default().density(1.7).density, Some(1.0));
        assert_eq!(BatchConfig::default().density(-0.2).density, Some(0.0));
    }

    #[test]
    fn zero_sizes_are_rejected() {
        assert!(matches!(
            BatchConfig::default().soups(0).resolve(),
            Err(BatchError::NonPositive("soup count"))
        ));
        assert!(matches!(
            BatchConfig::default().soup_size(0).resolve(),
            Err(BatchError::NonPositive("soup size"))
        ));
        assert!(matches!(
            BatchConfig::default().generations(0).resolve(),
            Err(BatchError::NonPositive("generation count"))
        ));
    }

    #[test]
    fn oversized_soups_are_rejected() {
        assert!(matches!(
            BatchConfig::default().soup_size(i64::MAX).resolve(),
            Err(BatchError::TooLarge { max: MAX_SOUP_SIZE, .. })
        ));
        let torus = BoundaryPolicy::Toroidal {
            width: MAX_SOUP_SIZE + 1,
            height: 8,
        };
        assert!(matches!(
            BatchConfig::default().policy(torus).resolve(),
            Err(BatchError::TooLarge { .. })
        ));
        assert!(BatchConfig::default().soup_size(MAX_SOUP_SIZE).resolve().is_ok());
    }
}
