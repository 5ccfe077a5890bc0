//! Evaluation by running the target tool.

use super::types::Evaluator;
use crate::cancel::CancelToken;
use crate::harness::{Harness, Outcome};
use crate::params::Configuration;
use std::path::PathBuf;
use std::time::Duration;
use tokio::runtime::Handle;
use tracing::debug;

/// Runs `[tool..., flags..., input]` through the [`Harness`] and reports
/// its wall-clock time.
///
/// The search loops are synchronous; this evaluator drives the async
/// harness with [`Handle::block_on`], so it must be called from a blocking
/// thread (e.g. inside `tokio::task::spawn_blocking`), never from an async
/// task.
#[derive(Debug, Clone)]
pub struct ToolEvaluator {
    tool: Vec<String>,
    input: PathBuf,
    timeout: Duration,
    harness: Harness,
    handle: Handle,
    cancel: CancelToken,
}

impl ToolEvaluator {
    pub fn new(
        tool: Vec<String>,
        input: impl Into<PathBuf>,
        timeout: Duration,
        harness: Harness,
        handle: Handle,
        cancel: CancelToken,
    ) -> Self {
        Self {
            tool,
            input: input.into(),
            timeout,
            harness,
            handle,
            cancel,
        }
    }

    /// The full command line for `configuration`.
    pub fn command_line(&self, configuration: &Configuration) -> Vec<String> {
        let mut argv = self.tool.clone();
        argv.extend(configuration.to_argument_list());
        argv.push(self.input.to_string_lossy().into_owned());
        argv
    }
}

impl Evaluator for ToolEvaluator {
    fn evaluate(&self, configuration: &Configuration) -> Outcome {
        let argv = self.command_line(configuration);
        let outcome = self
            .handle
            .block_on(self.harness.measure(&argv, self.timeout, &self.cancel));
        debug!(command = %argv.join(" "), ?outcome, "evaluated");
        outcome
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn evaluator(tool: &[&str], cancel: CancelToken) -> ToolEvaluator {
        ToolEvaluator::new(
            tool.iter().map(|s| s.to_string()).collect(),
            "/tmp/problem.smt2",
            Duration::from_secs(5),
            Harness::default(),
            Handle::current(),
            cancel,
        )
    }

    #[tokio::test]
    async fn test_command_line_order() {
        let e = evaluator(&["z3", "-T:5"], CancelToken::new());
        let c = Configuration::load(&["dce = true (bool)", "gvn = false (bool)", "inline = true (bool)"])
            .unwrap();
        assert_eq!(
            e.command_line(&c),
            ["z3", "-T:5", "--dce", "--inline", "/tmp/problem.smt2"]
        );
        assert_eq!(e.command_line(&Configuration::new()), ["z3", "-T:5", "/tmp/problem.smt2"]);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_evaluate_from_blocking_thread() {
        let e = evaluator(&["true"], CancelToken::new());
        let outcome = tokio::task::spawn_blocking(move || e.evaluate(&Configuration::new()))
            .await
            .unwrap();
        assert!(outcome.is_measured());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_missing_tool_is_failed() {
        let e = evaluator(&["/nonexistent/flagtune-tool"], CancelToken::new());
        let outcome = tokio::task::spawn_blocking(move || e.evaluate(&Configuration::new()))
            .await
            .unwrap();
        assert_eq!(outcome, Outcome::Failed);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_cancelled_evaluation_is_failed() {
        let cancel = CancelToken::new();
        cancel.cancel();
        let e = evaluator(&["sh", "-c", "sleep 5"], cancel);
        let outcome = tokio::task::spawn_blocking(move || e.evaluate(&Configuration::new()))
            .await
            .unwrap();
        assert_eq!(outcome, Outcome::Failed);
    }
}
