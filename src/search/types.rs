//! Contracts shared by the search strategies.

use crate::harness::Outcome;
use crate::params::Configuration;
use serde::{Deserialize, Serialize};
use std::panic::{self, AssertUnwindSafe};
use tracing::warn;

/// Measures one configuration.
///
/// Implementations never fail: anything that goes wrong while measuring is
/// reported as [`Outcome::Failed`] or [`Outcome::TimedOut`].
pub trait Evaluator {
    fn evaluate(&self, configuration: &Configuration) -> Outcome;
}

/// Evaluates `configuration`, turning a panic into [`Outcome::Failed`].
///
/// A failure inside one evaluation only marks that configuration; the
/// surrounding generation or iteration keeps going.
pub fn evaluate_isolated<E: Evaluator + ?Sized>(
    evaluator: &E,
    configuration: &Configuration,
) -> Outcome {
    match panic::catch_unwind(AssertUnwindSafe(|| evaluator.evaluate(configuration))) {
        Ok(outcome) => outcome,
        Err(_) => {
            warn!("evaluator panicked, recording worst fitness");
            Outcome::Failed
        }
    }
}

/// Search strategy selected by name.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Strategy {
    /// Independent mutations of the catalog defaults.
    #[default]
    Random,
    /// Population-based search with crossover and mutation.
    Genetic,
}

impl Strategy {
    /// Maps `"random"`, `"ga"` and `"genetic"`. Unknown names fall back to
    /// [`Strategy::Random`].
    pub fn from_name(name: &str) -> Self {
        match name.trim().to_ascii_lowercase().as_str() {
            "random" => Strategy::Random,
            "ga" | "genetic" => Strategy::Genetic,
            other => {
                warn!(strategy = other, "unknown strategy, using random search");
                Strategy::Random
            }
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Strategy::Random => "random",
            Strategy::Genetic => "ga",
        }
    }
}

/// Result of one search run.
#[derive(Debug, Clone)]
pub struct SearchResult {
    /// Best configuration found, or `None` if nothing beat the baseline.
    pub best: Option<Configuration>,

    /// Fitness of `best`, or the baseline fitness when `best` is `None`.
    pub best_fitness: f64,

    /// Number of configurations measured.
    pub evaluations: usize,

    /// Whether the run was cut short by cancellation.
    pub cancelled: bool,

    /// Best fitness so far after each iteration or generation.
    pub fitness_history: Vec<f64>,
}

impl SearchResult {
    /// An empty result whose incumbent is the default run.
    pub fn from_baseline(baseline: f64) -> Self {
        Self {
            best: None,
            best_fitness: baseline,
            evaluations: 0,
            cancelled: false,
            fitness_history: Vec::new(),
        }
    }

    /// Flags of the best configuration, `None` when the baseline won.
    pub fn best_flags(&self) -> Option<Vec<String>> {
        self.best.as_ref().map(Configuration::to_argument_list)
    }
}
