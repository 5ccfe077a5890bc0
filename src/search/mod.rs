//! Search strategies.
//!
//! Both strategies minimise the wall-clock time reported by an
//! [`Evaluator`] and start from the default run as their incumbent:
//!
//! - [`RandomSearch`]: independent single mutations of the catalog defaults
//! - [`genetic`]: elitist GA with tournament selection, single-point
//!   crossover and mutation
//!
//! The loops are synchronous and evaluate one configuration at a time.
//! Cancellation is polled between evaluations.

mod evaluator;
pub mod genetic;
mod random;
mod types;

pub use evaluator::ToolEvaluator;
pub use random::{RandomConfig, RandomSearch};
pub use types::{evaluate_isolated, Evaluator, SearchResult, Strategy};

use rand::rngs::StdRng;
use rand::SeedableRng;

/// Seeded RNG, or one seeded from the OS when `seed` is `None`.
pub fn create_rng(seed: Option<u64>) -> StdRng {
    match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_os_rng(),
    }
}
