//! Worker protocol: one search per worker process.
//!
//! The pool writes a [`WorkerInput`] as JSON to the worker's stdin; the
//! worker prints a [`WorkerReport`] as JSON to stdout. Logs go to stderr.

use super::config::TuneConfig;
use super::runner::Orchestrator;
use crate::cancel::CancelToken;
use crate::error::Result;
use crate::search::SearchResult;
use serde::{Deserialize, Serialize};

/// What a worker is asked to do.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkerInput {
    /// Position in the pool; offsets the seed and breaks ties.
    pub index: usize,

    /// Fitness of the default run, measured once by the orchestrator.
    pub baseline: f64,

    pub config: TuneConfig,
}

/// A worker's best find.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkerReport {
    pub index: usize,
    pub best_fitness: f64,

    /// `None` when nothing beat the default run.
    pub best_flags: Option<Vec<String>>,

    pub evaluations: usize,
}

impl WorkerReport {
    pub fn from_result(index: usize, result: &SearchResult) -> Self {
        Self {
            index,
            best_fitness: result.best_fitness,
            best_flags: result.best_flags(),
            evaluations: result.evaluations,
        }
    }
}

/// Runs the search described by `input` inside this process.
pub async fn run_worker(input: WorkerInput, cancel: &CancelToken) -> Result<WorkerReport> {
    let result = Orchestrator::search(&input.config, input.index, input.baseline, cancel).await?;
    Ok(WorkerReport::from_result(input.index, &result))
}

/// Picks the report with the lowest fitness; ties go to the lowest index.
pub fn reduce_reports(reports: &[WorkerReport]) -> Option<&WorkerReport> {
    reports.iter().min_by(|a, b| {
        a.best_fitness
            .total_cmp(&b.best_fitness)
            .then(a.index.cmp(&b.index))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn report(index: usize, fitness: f64, flag: &str) -> WorkerReport {
        WorkerReport {
            index,
            best_fitness: fitness,
            best_flags: Some(vec![flag.to_string()]),
            evaluations: 6,
        }
    }

    #[test]
    fn test_reduce_picks_minimum() {
        let reports = [report(0, 1.5, "--a"), report(1, 0.9, "--b"), report(2, 1.2, "--c")];
        let best = reduce_reports(&reports).unwrap();
        assert_eq!(best.best_fitness, 0.9);
        assert_eq!(best.best_flags.as_deref(), Some(&["--b".to_string()][..]));
    }

    #[test]
    fn test_reduce_ties_go_to_lowest_index() {
        let reports = [report(2, 0.9, "--c"), report(0, 1.0, "--a"), report(1, 0.9, "--b")];
        assert_eq!(reduce_reports(&reports).unwrap().index, 1);
    }

    #[test]
    fn test_reduce_empty() {
        assert!(reduce_reports(&[]).is_none());
    }

    #[test]
    fn test_report_json_shape() {
        let json = r#"{"index":3,"best_fitness":0.5,"best_flags":null,"evaluations":4}"#;
        let report: WorkerReport = serde_json::from_str(json).unwrap();
        assert_eq!(report.index, 3);
        assert!(report.best_flags.is_none());
    }

    #[test]
    fn test_from_result() {
        let mut result = SearchResult::from_baseline(2.0);
        result.evaluations = 7;
        let report = WorkerReport::from_result(4, &result);
        assert_eq!(report.index, 4);
        assert_eq!(report.best_fitness, 2.0);
        assert_eq!(report.best_flags, None);
        assert_eq!(report.evaluations, 7);
    }
}
