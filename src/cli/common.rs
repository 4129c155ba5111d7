//! Common utilities and traits for CLI commands

use anyhow::Result;
use clap::ValueEnum;
use colored::Colorize;
use serde::Serialize;

use crate::config::SweepConfig;
use crate::core::Outcome;
use crate::state::SweepRun;

/// Output format of command results.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable text
    #[default]
    Text,
    /// Pretty-printed JSON
    Json,
}

/// Everything a command needs besides its own arguments.
#[derive(Debug, Clone)]
pub struct CommandContext {
    /// Effective configuration, command-line overrides applied
    pub config: SweepConfig,
    pub format: OutputFormat,
}

impl CommandContext {
    /// Locks the state directory and loads the run state.
    pub async fn open_run(&self) -> Result<SweepRun> {
        SweepRun::open(&self.config).await
    }

    pub const fn is_json(&self) -> bool {
        matches!(self.format, OutputFormat::Json)
    }
}

/// Common trait for CLI command execution pattern
pub trait CommandExecutor: Sized {
    /// Execute the command within `ctx`
    fn execute(self, ctx: &CommandContext) -> impl std::future::Future<Output = Result<()>>;
}

pub fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Prints the error line of an outcome, if it has one.
pub fn print_outcome_error<T>(label: &str, outcome: &Outcome<T>) {
    if let Some(error) = outcome.error() {
        let state = if outcome.value().is_some() {
            "partial"
        } else {
            "failed"
        };
        println!("{} {} ({}): {}", "✗".red(), label.bold(), state, error);
    }
}

/// Success marker for a finished unit.
pub fn print_ok(label: &str) {
    println!("{} {}", "✓".green(), label.bold());
}
