//! Random search: independent single mutations of the catalog defaults.

use super::create_rng;
use super::types::{evaluate_isolated, Evaluator, SearchResult};
use crate::cancel::CancelToken;
use crate::error::{Result, TuneError};
use crate::params::Catalog;
use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

/// Parameters of a random search run.
///
/// # Builder Pattern
///
/// ```
/// use flagtune::search::RandomConfig;
///
/// let config = RandomConfig::default().with_iterations(20).with_seed(7);
/// assert_eq!(config.iterations, 20);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RandomConfig {
    /// Number of candidates to measure.
    pub iterations: usize,

    /// Random seed. `None` draws one from the OS.
    pub seed: Option<u64>,
}

impl Default for RandomConfig {
    fn default() -> Self {
        Self {
            iterations: 6,
            seed: None,
        }
    }
}

impl RandomConfig {
    pub fn with_iterations(mut self, n: usize) -> Self {
        self.iterations = n;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn validate(&self) -> std::result::Result<(), String> {
        if self.iterations == 0 {
            return Err("iterations must be at least 1".into());
        }
        Ok(())
    }
}

/// Executes random search.
///
/// Each iteration takes a fresh copy of the catalog defaults, mutates it
/// once and measures it. A candidate becomes the incumbent when its
/// fitness is less than or equal to the current best, so ties favour the
/// latest candidate. The initial incumbent is the default run.
///
/// # Usage
///
/// ```ignore
/// let config = RandomConfig::default().with_iterations(10).with_seed(42);
/// let result = RandomSearch::run(&catalog, &evaluator, baseline, &config, &cancel)?;
/// println!("best: {}", result.best_fitness);
/// ```
pub struct RandomSearch;

impl RandomSearch {
    pub fn run<E: Evaluator + ?Sized>(
        catalog: &Catalog,
        evaluator: &E,
        baseline: f64,
        config: &RandomConfig,
        cancel: &CancelToken,
    ) -> Result<SearchResult> {
        config.validate().map_err(TuneError::InvalidConfig)?;
        let mut rng = create_rng(config.seed);
        Self::run_with_rng(catalog, evaluator, baseline, config.iterations, &mut rng, cancel)
    }

    /// Runs with a caller-supplied RNG.
    ///
    /// Cancellation is checked before and after each measurement; a
    /// measurement interrupted by cancellation is discarded.
    pub fn run_with_rng<E: Evaluator + ?Sized, R: Rng>(
        catalog: &Catalog,
        evaluator: &E,
        baseline: f64,
        iterations: usize,
        rng: &mut R,
        cancel: &CancelToken,
    ) -> Result<SearchResult> {
        let mut result = SearchResult::from_baseline(baseline);
        result.fitness_history.reserve(iterations);

        for iteration in 0..iterations {
            if cancel.is_cancelled() {
                result.cancelled = true;
                break;
            }

            let mut candidate = catalog.fresh();
            candidate.mutate(rng)?;
            candidate.fitness = evaluate_isolated(evaluator, &candidate).fitness();
            result.evaluations += 1;

            if cancel.is_cancelled() {
                result.cancelled = true;
                break;
            }

            debug!(iteration, fitness = candidate.fitness, "candidate measured");
            if candidate.fitness <= result.best_fitness {
                info!(iteration, fitness = candidate.fitness, "new best configuration");
                result.best_fitness = candidate.fitness;
                result.best = Some(candidate);
            }
            result.fitness_history.push(result.best_fitness);
        }

        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::harness::Outcome;
    use crate::params::Configuration;
    use rand::rngs::StdRng;
    use rand::{RngCore, SeedableRng};
    use std::cell::Cell;

    /// Always yields zero bits: every Bernoulli draw with p > 0 succeeds.
    struct ZeroRng;

    impl RngCore for ZeroRng {
        fn next_u32(&mut self) -> u32 {
            0
        }

        fn next_u64(&mut self) -> u64 {
            0
        }

        fn fill_bytes(&mut self, dest: &mut [u8]) {
            dest.fill(0);
        }
    }

    /// 2.0 s with no flags, 0.5 s faster per enabled flag.
    struct FlagCost;

    impl Evaluator for FlagCost {
        fn evaluate(&self, configuration: &Configuration) -> Outcome {
            Outcome::Measured(2.0 - 0.5 * configuration.to_argument_list().len() as f64)
        }
    }

    fn two_flags() -> Catalog {
        Catalog::new(&["a = false (bool)", "b = false (bool)"]).unwrap()
    }

    #[test]
    fn test_both_flags_found() {
        let cancel = CancelToken::new();
        let result =
            RandomSearch::run_with_rng(&two_flags(), &FlagCost, 2.0, 3, &mut ZeroRng, &cancel)
                .unwrap();
        assert_eq!(result.best_fitness, 1.0);
        assert_eq!(result.best_flags().unwrap(), ["--a", "--b"]);
        assert_eq!(result.evaluations, 3);
        assert!(!result.cancelled);
    }

    /// 1.0 s with both `dce` and `inline` enabled, 3.0 s otherwise.
    struct BothOrNothing;

    impl Evaluator for BothOrNothing {
        fn evaluate(&self, configuration: &Configuration) -> Outcome {
            if configuration.to_argument_list() == ["--dce", "--inline"] {
                Outcome::Measured(1.0)
            } else {
                Outcome::Measured(3.0)
            }
        }
    }

    #[test]
    fn test_two_flag_optimum_beats_baseline() {
        let catalog = Catalog::new(&["dce = false (bool)", "inline = false (bool)"]).unwrap();
        let config = RandomConfig::default().with_iterations(10).with_seed(2);
        let result =
            RandomSearch::run(&catalog, &BothOrNothing, 2.0, &config, &CancelToken::new())
                .unwrap();
        assert_eq!(result.best_fitness, 1.0);
        assert_eq!(result.best_flags().unwrap(), ["--dce", "--inline"]);
        assert_eq!(result.evaluations, 10);
        assert_eq!(result.fitness_history.last(), Some(&1.0));
    }

    #[test]
    fn test_seeded_runs_stay_consistent() {
        let cancel = CancelToken::new();
        let mut reached_optimum = 0;
        for seed in 0..32 {
            let config = RandomConfig::default().with_iterations(6).with_seed(seed);
            let result =
                RandomSearch::run(&two_flags(), &FlagCost, 2.0, &config, &cancel).unwrap();
            assert!(result.best_fitness <= 2.0);
            if let Some(flags) = result.best_flags() {
                assert_eq!(result.best_fitness, 2.0 - 0.5 * flags.len() as f64);
            }
            if result.best_fitness == 1.0 {
                reached_optimum += 1;
            }
        }
        assert!(reached_optimum > 0);
    }

    #[test]
    fn test_same_seed_same_result() {
        let cancel = CancelToken::new();
        let config = RandomConfig::default().with_iterations(6).with_seed(11);
        let a = RandomSearch::run(&two_flags(), &FlagCost, 2.0, &config, &cancel).unwrap();
        let b = RandomSearch::run(&two_flags(), &FlagCost, 2.0, &config, &cancel).unwrap();
        assert_eq!(a.fitness_history, b.fitness_history);
        assert_eq!(a.best_flags(), b.best_flags());
    }

    #[test]
    fn test_history_is_non_increasing() {
        let catalog = Catalog::builtin();
        let cancel = CancelToken::new();
        let mut rng = StdRng::seed_from_u64(5);
        let result =
            RandomSearch::run_with_rng(&catalog, &FlagCost, 2.0, 20, &mut rng, &cancel).unwrap();
        assert_eq!(result.fitness_history.len(), 20);
        for window in result.fitness_history.windows(2) {
            assert!(window[1] <= window[0]);
        }
        assert!(result.best_fitness <= 2.0);
    }

    #[test]
    fn test_ties_favour_latest() {
        struct Flat;
        impl Evaluator for Flat {
            fn evaluate(&self, _: &Configuration) -> Outcome {
                Outcome::Measured(2.0)
            }
        }
        let cancel = CancelToken::new();
        let mut rng = StdRng::seed_from_u64(0);
        let result =
            RandomSearch::run_with_rng(&two_flags(), &Flat, 2.0, 3, &mut rng, &cancel).unwrap();
        assert!(result.best.is_some());
        assert_eq!(result.best_fitness, 2.0);
    }

    #[test]
    fn test_failures_never_beat_baseline() {
        struct Broken;
        impl Evaluator for Broken {
            fn evaluate(&self, _: &Configuration) -> Outcome {
                Outcome::TimedOut
            }
        }
        let cancel = CancelToken::new();
        let mut rng = StdRng::seed_from_u64(0);
        let result =
            RandomSearch::run_with_rng(&two_flags(), &Broken, 2.0, 4, &mut rng, &cancel).unwrap();
        assert!(result.best.is_none());
        assert_eq!(result.best_fitness, 2.0);
        assert_eq!(result.evaluations, 4);
    }

    #[test]
    fn test_cancelled_before_start() {
        let cancel = CancelToken::new();
        cancel.cancel();
        let mut rng = StdRng::seed_from_u64(0);
        let result =
            RandomSearch::run_with_rng(&two_flags(), &FlagCost, 2.0, 5, &mut rng, &cancel)
                .unwrap();
        assert!(result.cancelled);
        assert_eq!(result.evaluations, 0);
        assert!(result.best.is_none());
    }

    #[test]
    fn test_cancel_mid_run_discards_interrupted_measurement() {
        struct CancelOnSecond<'a> {
            calls: Cell<usize>,
            cancel: &'a CancelToken,
        }
        impl Evaluator for CancelOnSecond<'_> {
            fn evaluate(&self, _: &Configuration) -> Outcome {
                self.calls.set(self.calls.get() + 1);
                if self.calls.get() == 2 {
                    self.cancel.cancel();
                    return Outcome::Measured(0.0);
                }
                Outcome::Measured(1.5)
            }
        }
        let cancel = CancelToken::new();
        let evaluator = CancelOnSecond {
            calls: Cell::new(0),
            cancel: &cancel,
        };
        let mut rng = StdRng::seed_from_u64(0);
        let result =
            RandomSearch::run_with_rng(&two_flags(), &evaluator, 2.0, 5, &mut rng, &cancel)
                .unwrap();
        assert!(result.cancelled);
        assert_eq!(result.evaluations, 2);
        assert_eq!(result.best_fitness, 1.5);
    }

    #[test]
    fn test_zero_iterations_rejected() {
        let config = RandomConfig::default().with_iterations(0);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_unmutable_catalog_errors() {
        let catalog = Catalog::new(&["w = 1 (float)"]).unwrap();
        let result =
            RandomSearch::run_with_rng(&catalog, &FlagCost, 2.0, 1, &mut ZeroRng, &CancelToken::new());
        assert!(matches!(result, Err(TuneError::UnsupportedType { .. })));
    }
}
