//! Measurement harness.
//!
//! Runs the target tool as a child process under a wall-clock budget and an
//! optional address-space ceiling, and reports how long it took.
//!
//! - [`Harness`]: spawn, bound, force-terminate and time one command
//! - [`Measurement`]: raw result of a run
//! - [`Outcome`]: the tagged fitness a search strategy sees
//!
//! A run that outlives its budget receives SIGTERM, then SIGKILL after
//! [`KILL_GRACE`]. Its fitness is [`WORST_FITNESS`].

mod runner;
mod types;

pub use runner::{Harness, KILL_GRACE};
pub use types::{Measurement, Outcome, WORST_FITNESS};
