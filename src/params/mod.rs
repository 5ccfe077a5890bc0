//! Parameter model.
//!
//! A [`Configuration`] is an ordered list of typed [`Setting`]s loaded from
//! `key = value (type)` declarations. It supports the two genetic operators
//! the search strategies need:
//!
//! - [`Configuration::mutate`]: per-setting redraw with probability 0.5
//! - [`Configuration::crossover`]: single-point positional recombination
//!
//! and serialises to `--flag` tokens for the target tool via
//! [`Configuration::to_argument_list`].
//!
//! # Domains
//!
//! | type           | mutation domain          |
//! |----------------|--------------------------|
//! | `bool`         | `true` / `false`         |
//! | `double`       | `[0, 100)`               |
//! | `unsigned int` | `[0, 2^32 - 1]`          |
//! | `string`       | unchanged                |

mod catalog;
mod configuration;
mod setting;

pub use catalog::{Catalog, BUILTIN_DECLARATIONS};
pub use configuration::{Configuration, MUTATE_PROBABILITY};
pub use setting::{ParamType, Setting, DOUBLE_UPPER};
