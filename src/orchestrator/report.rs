//! The plain-text result file written after a completed run.

use crate::error::Result;
use crate::search::Strategy;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

/// Outcome of a completed tuning run.
#[derive(Debug, Clone, PartialEq)]
pub struct TuneReport {
    pub input: PathBuf,
    pub strategy: Strategy,
    pub iterations: usize,

    /// Seconds taken by the run without extra flags.
    pub default_time: f64,

    /// Best time found; equals `default_time` when nothing beat it.
    pub min_time: f64,

    /// Flags of the best configuration, `None` when the default run won.
    pub min_opt: Option<Vec<String>>,

    /// Configurations measured across all workers.
    pub evaluations: usize,
}

impl TuneReport {
    /// `<input basename>-<strategy>-<iterations>-iterations.txt`
    pub fn file_name(&self) -> String {
        let base = self
            .input
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| "input".to_string());
        format!(
            "{base}-{}-{}-iterations.txt",
            self.strategy.name(),
            self.iterations
        )
    }

    /// Writes the report into `dir` and returns the file's path.
    pub fn write_to(&self, dir: &Path) -> Result<PathBuf> {
        fs::create_dir_all(dir)?;
        let path = dir.join(self.file_name());
        fs::write(&path, self.to_string())?;
        Ok(path)
    }

    fn min_opt_text(&self) -> String {
        match &self.min_opt {
            None => "init".to_string(),
            Some(flags) if flags.is_empty() => "(no flags)".to_string(),
            Some(flags) => flags.join(" "),
        }
    }
}

impl fmt::Display for TuneReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", self.input.display())?;
        writeln!(f, "default time: {}", self.default_time)?;
        writeln!(f, "min time: {}", self.min_time)?;
        writeln!(f, "min opt: {}", self.min_opt_text())
    }
}
