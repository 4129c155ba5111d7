//! Core types shared by every stage of the sweep pipeline
//!
//! - [`SweepError`] and [`ErrorContext`] for failures and their CLI rendering
//! - [`Outcome`] for results that keep a partial value next to an error
//! - [`Localized`] for values that may carry per-language variants
//! - [`BuildVars`] for the key/value view of a parsed build-control file

pub mod error;
pub mod localized;
pub mod outcome;

pub use error::{ErrorContext, SweepError, user_friendly_error};
pub use localized::{DEFAULT_LANGUAGE, Localized};
pub use outcome::Outcome;

use std::collections::BTreeMap;

/// Key/value variables of a parsed build-control file (`GETTEXT_PACKAGE`,
/// `DOC_MODULE`, `DOC_LINGUAS`, ...). Parsing the build files themselves is
/// left to the caller.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BuildVars {
    vars: BTreeMap<String, String>,
}

impl BuildVars {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.vars.insert(key.into(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.vars.get(key).map(String::as_str).filter(|v| !v.trim().is_empty())
    }

    /// Whitespace-separated words of a list variable, empty when unset.
    pub fn words(&self, key: &str) -> Vec<String> {
        self.get(key).map(|v| v.split_whitespace().map(str::to_string).collect()).unwrap_or_default()
    }

    /// Parses a `KEY=VALUE` assignment as given on the command line.
    pub fn parse_assignment(text: &str) -> Result<(String, String), SweepError> {
        let (key, value) = text.split_once('=').ok_or_else(|| SweepError::ConfigError {
            message: format!("expected KEY=VALUE, got '{text}'"),
        })?;
        let key = key.trim();
        if key.is_empty() {
            return Err(SweepError::ConfigError {
                message: format!("empty variable name in '{text}'"),
            });
        }
        Ok((key.to_string(), value.trim().to_string()))
    }
}

impl FromIterator<(String, String)> for BuildVars {
    fn from_iter<I: IntoIterator<Item = (String, String)>>(iter: I) -> Self {
        Self {
            vars: iter.into_iter().collect(),
        }
    }
}
