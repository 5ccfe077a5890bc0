//! Parent selection.
//!
//! All strategies minimise: a lower fitness (fewer seconds) is better.
//! Unmeasured configurations (infinite fitness) rank with the timeout
//! sentinel.

use crate::harness::WORST_FITNESS;
use crate::params::Configuration;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Selection strategy for choosing parents.
///
/// # Examples
///
/// ```
/// use flagtune::search::genetic::Selection;
///
/// let sel = Selection::Tournament(3);
/// assert_eq!(sel, Selection::default());
/// assert_eq!("tournament:5".parse(), Ok(Selection::Tournament(5)));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Selection {
    /// Pick `k` members uniformly with replacement, keep the fastest.
    Tournament(usize),

    /// Fitness-proportionate on inverted cost: `max - fitness + eps`.
    Roulette,

    /// Linear ranking: the fastest of `n` members gets weight `n`, the
    /// slowest weight 1.
    Rank,
}

impl Default for Selection {
    fn default() -> Self {
        Selection::Tournament(3)
    }
}

impl Selection {
    /// Selects a parent index from the population.
    ///
    /// # Panics
    /// Panics if `population` is empty.
    pub fn select<R: Rng>(&self, population: &[Configuration], rng: &mut R) -> usize {
        assert!(
            !population.is_empty(),
            "cannot select from empty population"
        );

        match self {
            Selection::Tournament(k) => tournament(population, *k, rng),
            Selection::Roulette => roulette(population, rng),
            Selection::Rank => rank(population, rng),
        }
    }
}

impl FromStr for Selection {
    type Err = String;

    /// Accepts `tournament`, `tournament:<k>`, `roulette` and `rank`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim().to_ascii_lowercase();
        match s.split_once(':') {
            Some(("tournament", k)) => match k.trim().parse::<usize>() {
                Ok(k) if k >= 1 => Ok(Selection::Tournament(k)),
                _ => Err(format!("invalid tournament size: {k}")),
            },
            Some(_) => Err(format!("unknown selection: {s}")),
            None => match s.as_str() {
                "tournament" => Ok(Selection::default()),
                "roulette" => Ok(Selection::Roulette),
                "rank" => Ok(Selection::Rank),
                _ => Err(format!("unknown selection: {s}")),
            },
        }
    }
}

impl fmt::Display for Selection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Selection::Tournament(k) => write!(f, "tournament:{k}"),
            Selection::Roulette => f.write_str("roulette"),
            Selection::Rank => f.write_str("rank"),
        }
    }
}

fn cost(configuration: &Configuration) -> f64 {
    if configuration.fitness.is_finite() {
        configuration.fitness
    } else {
        WORST_FITNESS
    }
}

fn tournament<R: Rng>(population: &[Configuration], k: usize, rng: &mut R) -> usize {
    let k = k.max(1);
    let n = population.len();

    let mut best_idx = rng.random_range(0..n);
    for _ in 1..k {
        let idx = rng.random_range(0..n);
        if cost(&population[idx]) < cost(&population[best_idx]) {
            best_idx = idx;
        }
    }
    best_idx
}

fn roulette<R: Rng>(population: &[Configuration], rng: &mut R) -> usize {
    let n = population.len();
    if n == 1 {
        return 0;
    }

    let costs: Vec<f64> = population.iter().map(cost).collect();
    let max_cost = costs.iter().cloned().fold(f64::NEG_INFINITY, f64::max);

    let epsilon = 1e-10;
    let weights: Vec<f64> = costs
        .iter()
        .map(|&c| (max_cost - c + epsilon).max(epsilon))
        .collect();

    let total: f64 = weights.iter().sum();
    let threshold = rng.random_range(0.0..total);
    let mut cumulative = 0.0;
    for (i, &w) in weights.iter().enumerate() {
        cumulative += w;
        if cumulative > threshold {
            return i;
        }
    }

    n - 1
}

fn rank<R: Rng>(population: &[Configuration], rng: &mut R) -> usize {
    let n = population.len();
    if n == 1 {
        return 0;
    }

    let mut indexed: Vec<(usize, f64)> = population
        .iter()
        .enumerate()
        .map(|(i, c)| (i, cost(c)))
        .collect();
    indexed.sort_by(|a, b| a.1.total_cmp(&b.1));

    let total = (n * (n + 1)) as f64 / 2.0;
    let threshold = rng.random_range(0.0..total);
    let mut cumulative = 0.0;
    for (rank, &(original_idx, _)) in indexed.iter().enumerate() {
        cumulative += (n - rank) as f64;
        if cumulative > threshold {
            return original_idx;
        }
    }

    indexed[n - 1].0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_selection_names() {
        assert_eq!("tournament".parse(), Ok(Selection::Tournament(3)));
        assert_eq!("Tournament:7".parse(), Ok(Selection::Tournament(7)));
        assert_eq!("roulette".parse(), Ok(Selection::Roulette));
        assert_eq!(" rank ".parse(), Ok(Selection::Rank));
        assert!("tournament:0".parse::<Selection>().is_err());
        assert!("tournament:x".parse::<Selection>().is_err());
        assert!("boltzmann".parse::<Selection>().is_err());
        for sel in [Selection::Tournament(4), Selection::Roulette, Selection::Rank] {
            assert_eq!(sel.to_string().parse(), Ok(sel));
        }
    }
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn make_population(fitnesses: &[f64]) -> Vec<Configuration> {
        fitnesses
            .iter()
            .map(|&f| {
                let mut c = Configuration::new();
                c.fitness = f;
                c
            })
            .collect()
    }

    fn counts(selection: Selection, pop: &[Configuration]) -> [u32; 4] {
        let mut rng = StdRng::seed_from_u64(42);
        let mut counts = [0u32; 4];
        for _ in 0..10_000 {
            counts[selection.select(pop, &mut rng)] += 1;
        }
        counts
    }

    #[test]
    fn test_tournament_favors_fastest() {
        let pop = make_population(&[10.0, 5.0, 1.0, 8.0]);
        let counts = counts(Selection::Tournament(4), &pop);
        assert!(counts[2] > 6000, "got {counts:?}");
    }

    #[test]
    fn test_tournament_size_1_is_uniform() {
        let pop = make_population(&[10.0, 5.0, 1.0, 8.0]);
        for &c in &counts(Selection::Tournament(1), &pop) {
            assert!(c > 1500);
        }
    }

    #[test]
    fn test_roulette_with_sentinel() {
        let pop = make_population(&[WORST_FITNESS, 50.0, 1.0, f64::INFINITY]);
        let counts = counts(Selection::Roulette, &pop);
        assert!(counts[2] > counts[0]);
        assert!(counts[2] > counts[3]);
    }

    #[test]
    fn test_rank_favors_fastest() {
        let pop = make_population(&[100.0, 50.0, 1.0, 80.0]);
        let counts = counts(Selection::Rank, &pop);
        assert!(counts[2] > counts[0]);
    }

    #[test]
    fn test_single_member() {
        let pop = make_population(&[5.0]);
        let mut rng = StdRng::seed_from_u64(42);
        assert_eq!(Selection::Tournament(3).select(&pop, &mut rng), 0);
        assert_eq!(Selection::Roulette.select(&pop, &mut rng), 0);
        assert_eq!(Selection::Rank.select(&pop, &mut rng), 0);
    }

    #[test]
    #[should_panic(expected = "cannot select from empty population")]
    fn test_empty_population_panics() {
        let mut rng = StdRng::seed_from_u64(42);
        Selection::Tournament(3).select(&[], &mut rng);
    }
}
