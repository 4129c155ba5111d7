//! Persisted sweep state and the run that owns it
//!
//! Everything a sweep learns and wants to reuse next time lives in one
//! [`SweepState`]: file fingerprints, template and merge records, link graphs,
//! DocBook metadata, and the last error of every unit. It is stored as pretty
//! JSON in `{state_dir}/sweep-state.json` and written atomically.
//!
//! A [`SweepRun`] ties the state to the tools and output directory of one
//! invocation and holds the [`StateLock`] until [`SweepRun::finish`] saves.
//!
//! A state file that cannot be read back is not fatal: the problem is logged
//! as [`SweepError::StaleStateCorruption`] and the run starts from an empty
//! state, which makes every input look changed.

pub mod lock;

pub use lock::StateLock;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::config::SweepConfig;
use crate::constants::STATE_FILE_NAME;
use crate::core::{Outcome, SweepError};
use crate::doc::{DocBookDocument, DocState, MallardUnit, UnitReport};
use crate::l10n::{DomainReport, HelpDomain, IntltoolDomain, L10nState};
use crate::stamps::StampStore;
use crate::tool::ToolSet;
use crate::utils::{atomic_write, ensure_dir};

/// Everything persisted between runs.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct SweepState {
    #[serde(default)]
    pub stamps: StampStore,

    #[serde(default)]
    pub l10n: L10nState,

    #[serde(default)]
    pub docs: DocState,

    /// Last error per unit (`intltool:gedit`, `mallard:help`, ...)
    #[serde(default)]
    pub errors: BTreeMap<String, String>,
}

impl SweepState {
    /// Loads the state at `path`. A missing file is an empty state; an
    /// unreadable one is logged and replaced by an empty state.
    pub async fn load(path: &Path) -> Self {
        let content = match tokio::fs::read_to_string(path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(target: "state", "No sweep state at {}", path.display());
                return Self::default();
            }
            Err(e) => return Self::corrupt(path, e.to_string()),
        };

        match serde_json::from_str(&content) {
            Ok(state) => state,
            Err(e) => Self::corrupt(path, e.to_string()),
        }
    }

    fn corrupt(path: &Path, reason: String) -> Self {
        let error = SweepError::StaleStateCorruption {
            path: path.to_path_buf(),
            reason,
        };
        tracing::warn!(target: "state", "{error}; starting from an empty state");
        Self::default()
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let content = serde_json::to_string_pretty(self).context("Failed to serialize sweep state")?;
        atomic_write(path, content.as_bytes())
            .with_context(|| format!("Failed to write sweep state to {}", path.display()))
    }

    /// Makes every check report changed and every template rebuild.
    pub const fn set_force_rescan(&mut self, force: bool) {
        self.stamps.set_force_rescan(force);
        self.l10n.templates.set_force_rescan(force);
    }

    /// Records the error of `unit`, or clears it.
    pub fn record_unit<T>(&mut self, unit: &str, outcome: &Outcome<T>) {
        match outcome.error() {
            Some(error) => {
                self.errors.insert(unit.to_string(), error.to_string());
            }
            None => {
                self.errors.remove(unit);
            }
        }
    }
}

/// One sweep invocation: state, tools and output directory under a lock.
pub struct SweepRun {
    pub state: SweepState,
    tools: ToolSet,
    output_dir: PathBuf,
    state_path: PathBuf,
    _lock: StateLock,
}

impl SweepRun {
    /// Locks the configured state directory and loads its state.
    pub async fn open(config: &SweepConfig) -> Result<Self> {
        let state_dir = config.state_dir()?;
        ensure_dir(&state_dir)?;
        let lock = StateLock::acquire(&state_dir).await?;

        let state_path = state_dir.join(STATE_FILE_NAME);
        let mut state = SweepState::load(&state_path).await;
        state.set_force_rescan(config.force_rescan);

        Ok(Self {
            state,
            tools: ToolSet::from_config(config),
            output_dir: config.output_dir()?,
            state_path,
            _lock: lock,
        })
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    pub fn state_path(&self) -> &Path {
        &self.state_path
    }

    pub async fn sweep_intltool(&mut self, domain: &IntltoolDomain) -> Outcome<DomainReport> {
        let SweepState {
            stamps,
            l10n,
            ..
        } = &mut self.state;
        let outcome = l10n.sweep_intltool(stamps, &self.tools, &self.output_dir, domain).await;
        self.state.record_unit(&format!("intltool:{}", domain.name()), &outcome);
        outcome
    }

    pub async fn sweep_help(&mut self, domain: &HelpDomain) -> Outcome<DomainReport> {
        let SweepState {
            stamps,
            l10n,
            ..
        } = &mut self.state;
        let outcome = l10n.sweep_help(stamps, &self.tools, &self.output_dir, domain).await;
        self.state.record_unit(&format!("help:{}", domain.doc_id), &outcome);
        outcome
    }

    pub async fn sweep_mallard(&mut self, unit: &MallardUnit) -> Outcome<UnitReport> {
        let SweepState {
            stamps,
            docs,
            ..
        } = &mut self.state;
        let outcome = docs.sweep_mallard(stamps, &self.tools, &self.output_dir, unit).await;
        self.state.record_unit(&format!("mallard:{}", unit.id), &outcome);
        outcome
    }

    pub async fn sweep_docbook(
        &mut self,
        file: &Path,
        series: Option<&str>,
    ) -> Outcome<DocBookDocument> {
        let SweepState {
            stamps,
            docs,
            ..
        } = &mut self.state;
        let outcome = docs.sweep_docbook(stamps, file, series).await;
        self.state.record_unit(&format!("docbook:{}", file.display()), &outcome);
        outcome
    }

    /// Template generator and merge invocations made in this run.
    pub const fn tool_runs(&self) -> usize {
        self.state.l10n.templates.generator_runs() + self.state.l10n.merges.merge_runs()
    }

    /// Saves the state and releases the lock.
    pub fn finish(self) -> Result<()> {
        self.state.save(&self.state_path)?;
        tracing::debug!(target: "state", "Saved sweep state to {}", self.state_path.display());
        Ok(())
    }
}
