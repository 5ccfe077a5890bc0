//! Measurement results and the fitness they map to.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Fitness reported for a timed-out or failed run (2^32 - 1 seconds).
///
/// Always worse than any real measurement.
pub const WORST_FITNESS: f64 = 4_294_967_295.0;

/// Raw result of one harness run.
#[derive(Debug, Clone, PartialEq)]
pub struct Measurement {
    /// Wall-clock time from spawn to natural exit or forced termination.
    pub elapsed: Duration,

    /// Whether the harness had to terminate the process.
    pub timed_out: bool,

    /// Exit code, if the process exited normally. Not used for fitness.
    pub exit_code: Option<i32>,

    /// Process id of the child, for diagnostics.
    pub pid: Option<u32>,
}

impl Measurement {
    /// Classifies the run against the budget it was given.
    ///
    /// The elapsed time is re-checked independently of `timed_out`: a run
    /// that exits on its own right at the deadline still counts as a timeout.
    pub fn outcome(&self, timeout: Duration) -> Outcome {
        if self.timed_out || self.elapsed >= timeout {
            Outcome::TimedOut
        } else {
            Outcome::Measured(self.elapsed.as_secs_f64())
        }
    }
}

/// Tagged result of evaluating one configuration.
///
/// Kept tagged until the comparison boundary so failures are never mistaken
/// for real timings; [`fitness`](Outcome::fitness) performs the conversion.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Outcome {
    /// Seconds of wall-clock time.
    Measured(f64),
    TimedOut,
    Failed,
}

impl Outcome {
    pub fn fitness(self) -> f64 {
        match self {
            Outcome::Measured(seconds) => seconds,
            Outcome::TimedOut | Outcome::Failed => WORST_FITNESS,
        }
    }

    pub fn is_measured(self) -> bool {
        matches!(self, Outcome::Measured(_))
    }
}
