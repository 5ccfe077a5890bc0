//! Population state and its phase transitions.

use super::config::GaConfig;
use crate::cancel::CancelToken;
use crate::error::{Result, TuneError};
use crate::params::{Catalog, Configuration};
use crate::search::types::{evaluate_isolated, Evaluator};
use rand::Rng;
use tracing::debug;

/// Where a [`GaState`] is in its generation cycle.
///
/// ```text
/// Initialized -> Evaluating -> Repopulating -> Evaluating -> ... -> Converged
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GaPhase {
    /// Catalog defaults, never measured.
    Initialized,
    /// Every member carries a fitness from the current generation.
    Evaluating,
    /// A new generation was bred and awaits measurement.
    Repopulating,
    /// No further transitions; only [`GaState::retained`] is meaningful.
    Converged,
}

/// A fixed-size population plus the best configuration ever measured.
///
/// Members are owned values: elites and parents are cloned into the next
/// generation, never shared.
#[derive(Debug, Clone)]
pub struct GaState {
    population: Vec<Configuration>,
    phase: GaPhase,
    generation: usize,
    best: Option<Configuration>,
}

impl GaState {
    /// `size` independent copies of the catalog defaults, unmutated.
    pub fn new(catalog: &Catalog, size: usize) -> Self {
        Self {
            population: (0..size).map(|_| catalog.fresh()).collect(),
            phase: GaPhase::Initialized,
            generation: 0,
            best: None,
        }
    }

    pub fn phase(&self) -> GaPhase {
        self.phase
    }

    /// Number of completed evaluation passes.
    pub fn generation(&self) -> usize {
        self.generation
    }

    pub fn population(&self) -> &[Configuration] {
        &self.population
    }

    /// Measures every member, survivors included, overwriting its fitness.
    ///
    /// A failing or panicking evaluation gives that member the sentinel
    /// fitness and the pass continues. Stops early when `cancel` fires and
    /// returns the number of members measured.
    pub fn evaluate<E: Evaluator + ?Sized>(
        &mut self,
        evaluator: &E,
        cancel: &CancelToken,
    ) -> Result<usize> {
        self.expect_phase(&[GaPhase::Initialized, GaPhase::Repopulating], "evaluate")?;

        let mut measured = 0;
        for (index, member) in self.population.iter_mut().enumerate() {
            if cancel.is_cancelled() {
                break;
            }
            member.fitness = evaluate_isolated(evaluator, member).fitness();
            measured += 1;
            if cancel.is_cancelled() {
                // The in-flight run was killed; its timing means nothing.
                break;
            }
            debug!(
                generation = self.generation,
                index,
                fitness = member.fitness,
                "member measured"
            );
            if self.best.as_ref().map_or(true, |b| member.fitness < b.fitness) {
                self.best = Some(member.clone());
            }
        }

        self.generation += 1;
        self.phase = GaPhase::Evaluating;
        Ok(measured)
    }

    /// Breeds a new population of the same size.
    ///
    /// The top `elite_count` members are copied over; the rest are children
    /// of two selected parents, crossed over with probability
    /// `crossover_rate` and mutated with probability `mutation_rate`.
    pub fn repopulate<R: Rng>(&mut self, config: &GaConfig, rng: &mut R) -> Result<()> {
        self.expect_phase(&[GaPhase::Evaluating], "repopulate")?;

        let size = self.population.len();
        let mut ranked = std::mem::take(&mut self.population);
        ranked.sort_by(|a, b| a.fitness.total_cmp(&b.fitness));

        let elite_count = config.elite_count().min(size);
        let mut next: Vec<Configuration> = ranked[..elite_count].to_vec();

        while next.len() < size {
            let p1 = config.selection.select(&ranked, rng);
            let p2 = config.selection.select(&ranked, rng);

            let mut child = if rng.random_range(0.0..1.0) < config.crossover_rate {
                Configuration::crossover(&ranked[p1], &ranked[p2], rng)?
            } else {
                ranked[p1].clone()
            };
            if rng.random_range(0.0..1.0) < config.mutation_rate {
                child.mutate(rng)?;
            }
            next.push(child);
        }

        self.population = next;
        self.phase = GaPhase::Repopulating;
        Ok(())
    }

    /// Ends the cycle. Allowed from any phase.
    pub fn converge(&mut self) {
        self.phase = GaPhase::Converged;
    }

    /// Best configuration across all generations, with its fitness.
    pub fn retained(&self) -> Option<(&Configuration, f64)> {
        self.best.as_ref().map(|b| (b, b.fitness))
    }

    fn expect_phase(&self, allowed: &[GaPhase], operation: &str) -> Result<()> {
        if allowed.contains(&self.phase) {
            Ok(())
        } else {
            Err(TuneError::InvalidConfig(format!(
                "cannot {operation} a population in phase {:?}",
                self.phase
            )))
        }
    }
}
