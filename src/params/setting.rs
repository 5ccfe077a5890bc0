//! A single typed flag/value pair.

use crate::error::{Result, TuneError};
use rand::Rng;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::LazyLock;

/// Matches `key = value (type)`. Key and value are trimmed afterwards.
static DECLARATION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(.*)\s=\s(.*)\s(\(.*\))$").expect("declaration pattern is valid")
});

/// Upper bound (exclusive) of randomised `double` values.
pub const DOUBLE_UPPER: f64 = 100.0;

/// Declared type of a setting.
///
/// Unknown type annotations are kept verbatim in [`ParamType::Other`]: they
/// load fine, but cannot be mutated.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ParamType {
    Bool,
    Double,
    UnsignedInt,
    String,
    Other(String),
}

impl ParamType {
    /// Parses the parenthesised annotation, e.g. `(unsigned int)`.
    pub fn from_annotation(annotation: &str) -> Self {
        match annotation.trim() {
            "(bool)" => ParamType::Bool,
            "(double)" => ParamType::Double,
            "(unsigned int)" => ParamType::UnsignedInt,
            "(string)" => ParamType::String,
            other => ParamType::Other(other.to_string()),
        }
    }

    pub fn annotation(&self) -> &str {
        match self {
            ParamType::Bool => "(bool)",
            ParamType::Double => "(double)",
            ParamType::UnsignedInt => "(unsigned int)",
            ParamType::String => "(string)",
            ParamType::Other(text) => text,
        }
    }
}

impl fmt::Display for ParamType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.annotation())
    }
}

/// One flag of a configuration.
///
/// Settings are values: mutation builds a new `Setting` instead of editing
/// one in place.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Setting {
    key: String,
    value: String,
    ttype: ParamType,
}

impl Setting {
    pub fn new(key: impl Into<String>, value: impl Into<String>, ttype: ParamType) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
            ttype,
        }
    }

    /// Parses a `key = value (type)` declaration. `line` is only used for
    /// the error message.
    pub fn parse(declaration: &str, line: usize) -> Result<Self> {
        let captures = DECLARATION
            .captures(declaration.trim())
            .ok_or_else(|| TuneError::Parse {
                line,
                text: declaration.to_string(),
            })?;
        let key = captures[1].trim();
        if key.is_empty() {
            return Err(TuneError::Parse {
                line,
                text: declaration.to_string(),
            });
        }
        Ok(Self::new(
            key,
            captures[2].trim(),
            ParamType::from_annotation(&captures[3]),
        ))
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn value(&self) -> &str {
        &self.value
    }

    pub fn ttype(&self) -> &ParamType {
        &self.ttype
    }

    /// True for a boolean setting whose value is `true`.
    pub fn is_enabled(&self) -> bool {
        self.ttype == ParamType::Bool && self.value == "true"
    }

    /// Returns a copy with a value drawn uniformly from the type's domain.
    ///
    /// Strings have no randomisation domain and come back unchanged.
    pub fn randomized<R: Rng>(&self, rng: &mut R) -> Result<Self> {
        let value = match &self.ttype {
            ParamType::Bool => rng.random_bool(0.5).to_string(),
            ParamType::Double => rng.random_range(0.0..DOUBLE_UPPER).to_string(),
            ParamType::UnsignedInt => rng.random::<u32>().to_string(),
            ParamType::String => return Ok(self.clone()),
            ParamType::Other(ttype) => {
                return Err(TuneError::UnsupportedType {
                    key: self.key.clone(),
                    ttype: ttype.clone(),
                })
            }
        };
        Ok(Self {
            value,
            ..self.clone()
        })
    }
}

impl fmt::Display for Setting {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} = {} {}", self.key, self.value, self.ttype)
    }
}
