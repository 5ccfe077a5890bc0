//! Autotuning of compiler and solver flags by wall-clock time.
//!
//! `flagtune` searches a space of tool flags for the configuration that
//! makes a target tool (an SMT solver, an optimiser) finish its input
//! fastest. Each candidate is measured by running the tool under a
//! timeout; the fastest configuration found is reported.
//!
//! - [`params`]: typed settings, configurations and their genetic operators
//! - [`harness`]: bounded, timed execution of the target tool
//! - [`search`]: random search and a genetic algorithm
//! - [`orchestrator`]: baseline, worker processes, cancellation, reporting
//!
//! Flags are opaque: their only observable effect is the time the tool
//! takes. There is no guarantee of finding a global optimum.

pub mod cancel;
pub mod error;
pub mod harness;
pub mod orchestrator;
pub mod params;
pub mod search;

pub use cancel::CancelToken;
pub use error::{Result, TuneError};
