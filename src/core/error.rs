//! Error handling for blip-sweep
//!
//! This module provides the error types used across the sweep pipeline and the
//! user-facing rendering of those errors at the CLI boundary. Two types carry
//! the load:
//! - [`SweepError`] - Enumerated failure kinds for every stage of a sweep
//! - [`ErrorContext`] - Wrapper that adds user-friendly details and suggestions
//!
//! # Error Categories
//!
//! - **Inputs**: [`SweepError::MissingInput`], [`SweepError::ParseFailure`]
//! - **External tools**: [`SweepError::GeneratorFailure`], [`SweepError::ToolNotFound`]
//! - **Run state**: [`SweepError::StaleStateCorruption`], [`SweepError::ConfigError`]
//! - **Module sets**: [`SweepError::CyclicReference`] (reported as a diagnostic, never raised)
//!
//! Failures scoped to one file, page, or catalog are recorded against the owning
//! unit by the pipeline (see [`crate::core::Outcome`]); only errors that prevent
//! the whole command from running reach [`user_friendly_error`].
//!
//! # Examples
//!
//! ```rust,no_run
//! use blip_sweep::core::{ErrorContext, SweepError, user_friendly_error};
//!
//! let error = SweepError::ToolNotFound {
//!     tool: "msgmerge".to_string(),
//! };
//! let ctx = user_friendly_error(anyhow::Error::from(error));
//! ctx.display();
//! ```

use colored::Colorize;
use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// The main error type for sweep operations
///
/// Each variant names one failure mode of the pipeline and carries the file,
/// tool, or identifier it concerns so the message can be attached to the
/// owning documentation unit or translation domain.
///
/// # Propagation
///
/// - [`MissingInput`], [`ParseFailure`] and [`GeneratorFailure`] are caught at
///   file/page/catalog granularity and recorded, never aborting sibling units.
/// - [`StaleStateCorruption`] is logged and the affected state is treated as
///   "changed".
/// - [`CyclicReference`] is only ever produced as a resolver diagnostic.
///
/// [`MissingInput`]: SweepError::MissingInput
/// [`ParseFailure`]: SweepError::ParseFailure
/// [`GeneratorFailure`]: SweepError::GeneratorFailure
/// [`StaleStateCorruption`]: SweepError::StaleStateCorruption
/// [`CyclicReference`]: SweepError::CyclicReference
#[derive(Error, Debug)]
pub enum SweepError {
    /// A file expected to exist does not
    #[error("Missing {what}: {}", path.display())]
    MissingInput {
        /// What kind of input was expected (catalog, LINGUAS file, page, ...)
        what: String,
        /// Path that was looked up
        path: PathBuf,
    },

    /// An external tool exited unsuccessfully or timed out
    #[error("{tool} failed: {message}")]
    GeneratorFailure {
        /// Tool name as configured (intltool-update, xml2po, msgmerge, dot)
        tool: String,
        /// Captured tool output or a description of the failure
        message: String,
    },

    /// An external tool could not be started
    #[error("External tool not found: {tool}")]
    ToolNotFound {
        /// Program that could not be spawned
        tool: String,
    },

    /// A structured document could not be parsed
    #[error("Failed to parse {source_name}: {reason}")]
    ParseFailure {
        /// File name or description of the parsed input
        source_name: String,
        /// Parser message
        reason: String,
    },

    /// An identifier was re-encountered while it was still being expanded
    #[error("Cyclic reference to '{id}' via {}", path.join(" -> "))]
    CyclicReference {
        /// Identifier that closed the cycle
        id: String,
        /// Expansion path at the point the cycle was detected
        path: Vec<String>,
    },

    /// Persisted sweep state could not be read back
    #[error("Sweep state at {} is unreadable: {reason}", path.display())]
    StaleStateCorruption {
        /// State file path
        path: PathBuf,
        /// Why it was rejected
        reason: String,
    },

    /// Configuration file problems
    #[error("Configuration error: {message}")]
    ConfigError {
        /// Description of the problem
        message: String,
    },

    /// IO error
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    /// TOML parsing error
    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),

    /// JSON (de)serialization error
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    /// Other error
    #[error("{message}")]
    Other {
        /// Error message
        message: String,
    },
}

impl SweepError {
    /// Shorthand for a [`SweepError::MissingInput`]
    pub fn missing(what: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        Self::MissingInput {
            what: what.into(),
            path: path.into(),
        }
    }

    /// Shorthand for a [`SweepError::ParseFailure`]
    pub fn parse(source_name: impl Into<String>, reason: impl fmt::Display) -> Self {
        Self::ParseFailure {
            source_name: source_name.into(),
            reason: reason.to_string(),
        }
    }
}

impl Clone for SweepError {
    fn clone(&self) -> Self {
        match self {
            Self::MissingInput {
                what,
                path,
            } => Self::MissingInput {
                what: what.clone(),
                path: path.clone(),
            },
            Self::GeneratorFailure {
                tool,
                message,
            } => Self::GeneratorFailure {
                tool: tool.clone(),
                message: message.clone(),
            },
            Self::ToolNotFound {
                tool,
            } => Self::ToolNotFound {
                tool: tool.clone(),
            },
            Self::ParseFailure {
                source_name,
                reason,
            } => Self::ParseFailure {
                source_name: source_name.clone(),
                reason: reason.clone(),
            },
            Self::CyclicReference {
                id,
                path,
            } => Self::CyclicReference {
                id: id.clone(),
                path: path.clone(),
            },
            Self::StaleStateCorruption {
                path,
                reason,
            } => Self::StaleStateCorruption {
                path: path.clone(),
                reason: reason.clone(),
            },
            Self::ConfigError {
                message,
            } => Self::ConfigError {
                message: message.clone(),
            },
            // Wrapped library errors do not implement Clone
            Self::IoError(e) => Self::Other {
                message: format!("IO error: {e}"),
            },
            Self::TomlError(e) => Self::Other {
                message: format!("TOML parsing error: {e}"),
            },
            Self::JsonError(e) => Self::Other {
                message: format!("JSON error: {e}"),
            },
            Self::Other {
                message,
            } => Self::Other {
                message: message.clone(),
            },
        }
    }
}

/// Error context wrapper that provides user-friendly error information
///
/// When displayed, errors show:
/// 1. **Error**: The main error message in red
/// 2. **Details**: Additional context in yellow (optional)
/// 3. **Suggestion**: Actionable steps in green (optional)
///
/// # Examples
///
/// ```rust,no_run
/// use blip_sweep::core::{ErrorContext, SweepError};
///
/// let context = ErrorContext::new(SweepError::ToolNotFound {
///     tool: "dot".to_string(),
/// })
/// .with_suggestion("Install graphviz or point [tools].dot at a dot binary")
/// .with_details("Link graphs are rendered with dot -Tsvg");
///
/// println!("{}", context);
/// ```
#[derive(Debug)]
pub struct ErrorContext {
    /// The underlying sweep error
    pub error: SweepError,
    /// Optional suggestion for resolving the error
    pub suggestion: Option<String>,
    /// Optional additional details about the error
    pub details: Option<String>,
}

impl ErrorContext {
    /// Create a new error context with no suggestion or details
    #[must_use]
    pub const fn new(error: SweepError) -> Self {
        Self {
            error,
            suggestion: None,
            details: None,
        }
    }

    /// Add a suggestion for resolving the error
    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestion = Some(suggestion.into());
        self
    }

    /// Add additional details explaining the error
    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }

    /// Display the error context to stderr with terminal colors
    pub fn display(&self) {
        eprintln!("{}: {}", "error".red().bold(), self.error);

        if let Some(details) = &self.details {
            eprintln!("{}: {}", "details".yellow(), details);
        }

        if let Some(suggestion) = &self.suggestion {
            eprintln!("{}: {}", "suggestion".green(), suggestion);
        }
    }
}

impl fmt::Display for ErrorContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.error)?;

        if let Some(details) = &self.details {
            write!(f, "\nDetails: {details}")?;
        }

        if let Some(suggestion) = &self.suggestion {
            write!(f, "\nSuggestion: {suggestion}")?;
        }

        Ok(())
    }
}

impl std::error::Error for ErrorContext {}

/// Converts any error into a user-friendly [`ErrorContext`]
///
/// Known error types are downcast and given tailored suggestions. Anything else
/// is wrapped as [`SweepError::Other`] with the full `anyhow` context chain
/// preserved in the message.
pub fn user_friendly_error(error: anyhow::Error) -> ErrorContext {
    if error.downcast_ref::<ErrorContext>().is_some() {
        return match error.downcast::<ErrorContext>() {
            Ok(ctx) => ctx,
            Err(e) => ErrorContext::new(SweepError::Other {
                message: format!("{e:#}"),
            }),
        };
    }

    if let Some(sweep_error) = error.downcast_ref::<SweepError>() {
        return create_error_context(sweep_error.clone());
    }

    if let Some(io_error) = error.downcast_ref::<std::io::Error>() {
        match io_error.kind() {
            std::io::ErrorKind::PermissionDenied => {
                return ErrorContext::new(SweepError::Other {
                    message: format!("{error:#}"),
                })
                .with_suggestion("Check the permissions of the state and output directories");
            }
            std::io::ErrorKind::NotFound => {
                return ErrorContext::new(SweepError::Other {
                    message: format!("{error:#}"),
                })
                .with_suggestion("Check that the path exists and is spelled correctly");
            }
            _ => {}
        }
    }

    if error.downcast_ref::<toml::de::Error>().is_some() {
        return ErrorContext::new(SweepError::Other {
            message: format!("{error:#}"),
        })
        .with_suggestion("Check the TOML syntax of the sweep configuration file");
    }

    ErrorContext::new(SweepError::Other {
        message: format!("{error:#}"),
    })
}

fn create_error_context(error: SweepError) -> ErrorContext {
    match &error {
        SweepError::ToolNotFound {
            tool,
        } => {
            let suggestion = format!(
                "Install {tool} or set its command in the [tools] table of the configuration file"
            );
            ErrorContext::new(error).with_suggestion(suggestion)
        }
        SweepError::GeneratorFailure {
            ..
        } => ErrorContext::new(error)
            .with_details("The previous artifact for this unit is kept until the tool succeeds"),
        SweepError::StaleStateCorruption {
            ..
        } => ErrorContext::new(error)
            .with_suggestion("Run 'blip-sweep state clear' or pass --force to rebuild everything"),
        SweepError::ConfigError {
            ..
        }
        | SweepError::TomlError(_) => ErrorContext::new(error)
            .with_suggestion("Check the sweep configuration file (default ~/.blip/sweep.toml)"),
        SweepError::MissingInput {
            ..
        } => ErrorContext::new(error)
            .with_suggestion("Check that the source tree is checked out completely"),
        _ => ErrorContext::new(error),
    }
}
