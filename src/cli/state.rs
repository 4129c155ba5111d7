//! `blip-sweep state`: inspect or reset the persisted sweep state.

use anyhow::{Context, Result};
use clap::{Args, Subcommand};
use colored::Colorize;
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::PathBuf;

use super::common::{CommandContext, CommandExecutor, print_json};
use crate::constants::STATE_FILE_NAME;
use crate::state::{StateLock, SweepState};

#[derive(Args, Debug)]
pub struct StateCommand {
    #[command(subcommand)]
    command: StateSubcommand,
}

#[derive(Subcommand, Debug)]
enum StateSubcommand {
    /// Summarize what the state holds and which units last failed
    Show,

    /// Delete the state; the next sweep treats every input as changed
    Clear,
}

#[derive(Serialize)]
struct StateSummary {
    path: PathBuf,
    fingerprints: usize,
    templates: usize,
    merges: usize,
    graphs: usize,
    docbooks: usize,
    errors: BTreeMap<String, String>,
}

impl StateSummary {
    fn new(path: PathBuf, state: SweepState) -> Self {
        Self {
            path,
            fingerprints: state.stamps.len(),
            templates: state.l10n.templates.records().count(),
            merges: state.l10n.merges.records().count(),
            graphs: state.docs.graphs.len(),
            docbooks: state.docs.docbooks.len(),
            errors: state.errors,
        }
    }
}

impl CommandExecutor for StateCommand {
    async fn execute(self, ctx: &CommandContext) -> Result<()> {
        let state_dir = ctx.config.state_dir()?;
        let state_path = state_dir.join(STATE_FILE_NAME);

        match self.command {
            StateSubcommand::Show => {
                let state = SweepState::load(&state_path).await;
                let summary = StateSummary::new(state_path, state);
                if ctx.is_json() {
                    return print_json(&summary);
                }

                println!("{}", summary.path.display().to_string().bold());
                println!("  fingerprints: {}", summary.fingerprints);
                println!("  templates:    {}", summary.templates);
                println!("  merges:       {}", summary.merges);
                println!("  link graphs:  {}", summary.graphs);
                println!("  docbooks:     {}", summary.docbooks);
                if summary.errors.is_empty() {
                    println!("  {}", "no failed units".green());
                }
                for (unit, error) in &summary.errors {
                    println!("  {} {}: {}", "✗".red(), unit, error);
                }
                Ok(())
            }
            StateSubcommand::Clear => {
                let _lock = StateLock::acquire(&state_dir).await?;
                match tokio::fs::remove_file(&state_path).await {
                    Ok(()) => {
                        if !ctx.is_json() {
                            println!("{} Removed {}", "✓".green(), state_path.display());
                        }
                        Ok(())
                    }
                    Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                        if !ctx.is_json() {
                            println!("No sweep state at {}", state_path.display());
                        }
                        Ok(())
                    }
                    Err(e) => Err(e)
                        .with_context(|| format!("Failed to remove {}", state_path.display())),
                }
            }
        }
    }
}
