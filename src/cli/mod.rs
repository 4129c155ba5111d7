//! Command-line interface for blip-sweep.
//!
//! Each subcommand sweeps one kind of unit against the persisted state and
//! prints what it found:
//!
//! - `intltool` - gettext po directory: template, merges, statistics
//! - `help-l10n` - documentation translations driven by xml2po
//! - `mallard` - Mallard pages: metadata, credits, topic link graph
//! - `docbook` - DocBook document metadata
//! - `moduleset resolve|deps` - jhbuild module-set queries
//! - `state show|clear` - the persisted state itself
//!
//! # Global Options
//!
//! - `--verbose` / `--quiet` - log level (`RUST_LOG` wins when set)
//! - `--config` - sweep configuration file (default `~/.blip/sweep.toml`)
//! - `--state-dir`, `--output-dir` - override the configured directories
//! - `--force` - treat every input as changed
//! - `--format json` - machine-readable output
//!
//! # Example
//!
//! ```bash
//! blip-sweep --state-dir /var/lib/blip intltool ~/src/gedit/po --epoch 3.38.0
//! blip-sweep --format json mallard ~/src/gedit/help/C --id gedit
//! ```

pub mod common;
mod docbook;
mod help_l10n;
mod intltool;
mod mallard;
mod moduleset;
mod state;

pub use common::{CommandContext, OutputFormat};

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use crate::config::SweepConfig;
use common::CommandExecutor;

/// Main CLI application structure for blip-sweep
#[derive(Parser)]
#[command(
    name = "blip-sweep",
    about = "Incremental sweeps of translation domains, documentation and module sets",
    version,
    author,
    long_about = "blip-sweep rebuilds translation templates, merges catalogs, renders documentation \
                  link graphs and resolves jhbuild module sets, redoing only the work whose inputs changed."
)]
pub struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable debug logging
    #[arg(short, long, global = true, conflicts_with = "quiet")]
    verbose: bool,

    /// Only log warnings and errors
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Path to the sweep configuration file
    #[arg(long, global = true, env = "BLIP_SWEEP_CONFIG", value_name = "FILE")]
    config: Option<PathBuf>,

    /// Directory holding the sweep state and its lock
    #[arg(long, global = true, value_name = "DIR")]
    state_dir: Option<PathBuf>,

    /// Directory receiving templates and rendered graphs
    #[arg(long, global = true, value_name = "DIR")]
    output_dir: Option<PathBuf>,

    /// Reprocess every input regardless of recorded fingerprints
    #[arg(long, global = true)]
    force: bool,

    /// Output format
    #[arg(long, global = true, value_enum, default_value = "text")]
    format: OutputFormat,
}

#[derive(Subcommand)]
enum Commands {
    /// Sweep a gettext po directory
    Intltool(intltool::IntltoolCommand),

    /// Sweep the translations of a documentation directory
    #[command(name = "help-l10n")]
    HelpL10n(help_l10n::HelpL10nCommand),

    /// Scan a Mallard documentation unit
    Mallard(mallard::MallardCommand),

    /// Read the metadata of a DocBook document
    Docbook(docbook::DocbookCommand),

    /// Query a jhbuild module set
    Moduleset(moduleset::ModulesetCommand),

    /// Inspect or reset the sweep state
    State(state::StateCommand),
}

impl Cli {
    pub async fn execute(self) -> Result<()> {
        self.init_logging();
        let ctx = self.build_context().await?;

        match self.command {
            Commands::Intltool(cmd) => cmd.execute(&ctx).await,
            Commands::HelpL10n(cmd) => cmd.execute(&ctx).await,
            Commands::Mallard(cmd) => cmd.execute(&ctx).await,
            Commands::Docbook(cmd) => cmd.execute(&ctx).await,
            Commands::Moduleset(cmd) => cmd.execute(&ctx).await,
            Commands::State(cmd) => cmd.execute(&ctx).await,
        }
    }

    fn log_level(&self) -> &'static str {
        if self.verbose {
            "debug"
        } else if self.quiet {
            "warn"
        } else {
            "info"
        }
    }

    fn init_logging(&self) {
        let filter = if std::env::var("RUST_LOG").is_ok() {
            EnvFilter::from_default_env()
        } else {
            EnvFilter::new(self.log_level())
        };
        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .with_target(false)
            .try_init();
    }

    /// Loads the configuration file and applies the command-line overrides.
    pub async fn build_context(&self) -> Result<CommandContext> {
        let mut config = SweepConfig::load_with_optional(self.config.clone()).await?;
        if let Some(dir) = &self.state_dir {
            config.state_dir = Some(dir.clone());
        }
        if let Some(dir) = &self.output_dir {
            config.output_dir = Some(dir.clone());
        }
        if self.force {
            config.force_rescan = true;
        }

        Ok(CommandContext {
            config,
            format: self.format,
        })
    }
}
