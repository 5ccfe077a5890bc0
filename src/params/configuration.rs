//! Ordered configurations and their genetic operators.

use super::setting::{ParamType, Setting};
use crate::error::{Result, TuneError};
use rand::Rng;
use std::fmt;

/// Probability that [`Configuration::mutate`] redraws a given setting.
pub const MUTATE_PROBABILITY: f64 = 0.5;

/// One candidate flag assignment over the declared catalog.
///
/// Keys are unique and keep their insertion order. The order matters:
/// crossover splits configurations by position, not by key.
///
/// `fitness` holds the last measured cost in seconds (lower is better) and
/// is `f64::INFINITY` until the configuration has been evaluated.
#[derive(Debug, Clone, PartialEq)]
pub struct Configuration {
    settings: Vec<Setting>,
    pub fitness: f64,
}

impl Default for Configuration {
    fn default() -> Self {
        Self {
            settings: Vec::new(),
            fitness: f64::INFINITY,
        }
    }
}

impl Configuration {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a setting, replacing the value of an existing key in place.
    pub fn add(&mut self, setting: Setting) -> &mut Self {
        match self.settings.iter_mut().find(|s| s.key() == setting.key()) {
            Some(existing) => *existing = setting,
            None => self.settings.push(setting),
        }
        self
    }

    /// Parses `key = value (type)` declarations in order.
    ///
    /// # Errors
    /// [`TuneError::Parse`] naming the first malformed line (1-based).
    pub fn load<S: AsRef<str>>(declarations: &[S]) -> Result<Self> {
        let mut configuration = Self::new();
        for (index, line) in declarations.iter().enumerate() {
            configuration.add(Setting::parse(line.as_ref(), index + 1)?);
        }
        Ok(configuration)
    }

    pub fn len(&self) -> usize {
        self.settings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.settings.is_empty()
    }

    pub fn settings(&self) -> &[Setting] {
        &self.settings
    }

    pub fn get(&self, key: &str) -> Option<&Setting> {
        self.settings.iter().find(|s| s.key() == key)
    }

    /// Redraws each setting with probability [`MUTATE_PROBABILITY`].
    ///
    /// # Errors
    /// [`TuneError::UnsupportedType`] if a redrawn setting has a type with no
    /// randomisation rule. Settings visited before the failure keep their
    /// new values.
    pub fn mutate<R: Rng>(&mut self, rng: &mut R) -> Result<&mut Self> {
        for setting in self.settings.iter_mut() {
            if rng.random_bool(MUTATE_PROBABILITY) {
                *setting = setting.randomized(rng)?;
            }
        }
        Ok(self)
    }

    /// Single-point crossover with a random split in `[0, len)`.
    ///
    /// # Errors
    /// [`TuneError::CrossoverShape`] unless both parents come from the same
    /// declaration list (same length, same key order).
    pub fn crossover<R: Rng>(a: &Self, b: &Self, rng: &mut R) -> Result<Self> {
        Self::check_congruent(a, b)?;
        if a.is_empty() {
            return Ok(Self::new());
        }
        let split = rng.random_range(0..a.len());
        Self::crossover_at(a, b, split)
    }

    /// Builds `a[..split] ++ b[split..]`. The child is unmeasured.
    pub fn crossover_at(a: &Self, b: &Self, split: usize) -> Result<Self> {
        Self::check_congruent(a, b)?;
        if split > a.len() {
            return Err(TuneError::CrossoverShape {
                reason: format!("split {split} beyond length {}", a.len()),
            });
        }
        let settings = a.settings[..split]
            .iter()
            .chain(&b.settings[split..])
            .cloned()
            .collect();
        Ok(Self {
            settings,
            fitness: f64::INFINITY,
        })
    }

    fn check_congruent(a: &Self, b: &Self) -> Result<()> {
        if a.len() != b.len() {
            return Err(TuneError::CrossoverShape {
                reason: format!("lengths {} and {}", a.len(), b.len()),
            });
        }
        if let Some((x, y)) = a
            .settings
            .iter()
            .zip(&b.settings)
            .find(|(x, y)| x.key() != y.key() || x.ttype() != y.ttype())
        {
            return Err(TuneError::CrossoverShape {
                reason: format!("key {:?} paired with {:?}", x.key(), y.key()),
            });
        }
        Ok(())
    }

    /// Command-line tokens for the target tool: `--key` per enabled boolean.
    ///
    /// Numeric and string settings are not emitted.
    pub fn to_argument_list(&self) -> Vec<String> {
        self.settings
            .iter()
            .filter(|s| s.is_enabled())
            .map(|s| format!("--{}", s.key()))
            .collect()
    }

    /// Keys whose declared type cannot be mutated.
    pub fn unsupported_types(&self) -> impl Iterator<Item = &Setting> {
        self.settings
            .iter()
            .filter(|s| matches!(s.ttype(), ParamType::Other(_)))
    }
}

impl fmt::Display for Configuration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for setting in &self.settings {
            writeln!(f, "{setting}")?;
        }
        Ok(())
    }
}
