//! Genetic search over flag configurations.
//!
//! # Key Types
//!
//! - [`GaConfig`]: population size, generations, selection and operator rates
//! - [`GaState`]: the population and its [`GaPhase`]
//! - [`GaRunner`]: executes the evaluate/repopulate loop
//! - [`Selection`]: tournament, roulette and rank selection
//!
//! Every member is re-measured in every generation, survivors included:
//! timings are noisy, so a stored fitness is never trusted across
//! generations. The best configuration ever measured is tracked separately
//! and survives even if its lineage dies out.
//!
//! # References
//!
//! - Goldberg (1989), *Genetic Algorithms in Search, Optimization, and Machine Learning*
//! - Blickle & Thiele (1996), "A Comparison of Selection Schemes used in
//!   Evolutionary Algorithms"

mod config;
mod runner;
mod selection;
mod state;

pub use config::GaConfig;
pub use runner::GaRunner;
pub use selection::Selection;
pub use state::{GaPhase, GaState};
