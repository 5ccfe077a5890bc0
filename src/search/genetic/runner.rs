//! GA evolutionary loop execution.
//!
//! [`GaRunner`] drives a [`GaState`] through its cycle:
//! initialization → evaluation → repopulation → evaluation → ... → convergence.

use super::config::GaConfig;
use super::state::GaState;
use crate::cancel::CancelToken;
use crate::error::{Result, TuneError};
use crate::params::Catalog;
use crate::search::create_rng;
use crate::search::types::{Evaluator, SearchResult};
use tracing::info;

/// Executes the genetic search.
///
/// # Usage
///
/// ```ignore
/// let config = GaConfig::default().with_generations(6).with_seed(42);
/// let result = GaRunner::run(&catalog, &evaluator, baseline, &config, &cancel)?;
/// println!("best fitness: {}", result.best_fitness);
/// ```
pub struct GaRunner;

impl GaRunner {
    /// Runs `config.generations` evaluate/repopulate rounds. The final round
    /// skips repopulation since its offspring would never be measured.
    ///
    /// The result reports the best configuration across all generations,
    /// or none if no member was at least as fast as `baseline`.
    ///
    /// # Errors
    /// [`TuneError::InvalidConfig`] if `config` fails validation, and any
    /// error from the genetic operators.
    pub fn run<E: Evaluator + ?Sized>(
        catalog: &Catalog,
        evaluator: &E,
        baseline: f64,
        config: &GaConfig,
        cancel: &CancelToken,
    ) -> Result<SearchResult> {
        config.validate().map_err(TuneError::InvalidConfig)?;

        let mut rng = create_rng(config.seed);
        let mut state = GaState::new(catalog, config.population_size);
        let mut result = SearchResult::from_baseline(baseline);
        result.fitness_history.reserve(config.generations);

        for generation in 0..config.generations {
            if cancel.is_cancelled() {
                break;
            }

            result.evaluations += state.evaluate(evaluator, cancel)?;
            if cancel.is_cancelled() {
                break;
            }

            let best = state.retained().map_or(f64::INFINITY, |(_, f)| f);
            result.fitness_history.push(best.min(baseline));
            info!(generation = generation + 1, best, "finished generation");

            if generation + 1 < config.generations {
                state.repopulate(config, &mut rng)?;
            }
        }

        state.converge();
        result.cancelled = cancel.is_cancelled();
        if let Some((best, fitness)) = state.retained() {
            if fitness <= baseline {
                result.best = Some(best.clone());
                result.best_fitness = fitness;
            }
        }
        Ok(result)
    }
}
