//! Orchestration layer.
//!
//! A run goes through these steps:
//!
//! 1. **Baseline**: time the tool with no extra flags. A timeout or
//!    failure aborts the run.
//! 2. **Search**: the configured [`Strategy`](crate::search::Strategy),
//!    either in-process (`workers <= 1`) or once per worker process.
//! 3. **Reduction**: the lowest fitness wins; ties go to the lowest worker
//!    index.
//! 4. **Report**: [`TuneReport`] is written once, only after a completed run.
//!
//! SIGINT, SIGTERM, SIGQUIT and SIGHUP cancel the run (see [`signals`]);
//! every child process is terminated and nothing is written.

mod config;
mod pool;
mod report;
mod runner;
pub mod signals;
mod worker;

pub use config::TuneConfig;
pub use pool::WorkerPool;
pub use report::TuneReport;
pub use runner::Orchestrator;
pub use worker::{reduce_reports, run_worker, WorkerInput, WorkerReport};
