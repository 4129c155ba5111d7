//! Translation template cache
//!
//! One template (POT file) serves a whole source directory. The cache keeps
//! the last artifact built for each directory and decides between three
//! paths:
//!
//! 1. **Memo**: the directory was already handled in this run; return the
//!    memoized artifact or the memoized failure without touching the tool.
//! 2. **Epoch**: the recorded artifact was built at the caller's epoch and its
//!    file still exists; reuse it.
//! 3. **Build**: run the generator, hash the result, record it.
//!
//! The content hash skips everything up to and including the first blank line
//! so header fields the generator rewrites on every run (creation dates) never
//! make an identical template look new to the merge engine.

use anyhow::Context;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};

use super::catalog::Catalog;
use crate::core::SweepError;
use crate::tool::{Tool, ToolSet, into_tool_error};
use crate::utils::{move_file, sha256_digest};

/// A generated template for one source directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TemplateArtifact {
    /// Where the template was written
    pub path: PathBuf,
    /// When the generator last produced it
    pub generated_at: DateTime<Utc>,
    /// `sha256:` digest of the content after the header
    pub content_hash: String,
    /// Epoch of the owning module at generation time
    pub epoch: String,
    /// Number of messages, header excluded
    pub message_count: usize,
    /// Source files `intltool-update -m` reported as not listed for translation
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub missing: Vec<String>,
}

/// How the template of a directory is produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TemplateSource {
    /// `intltool-update -p -g <package>` in a gettext po directory
    Intltool {
        package: String,
    },
    /// `xml2po -e -o <output> <files...>` in a help directory, files relative to it
    Xml2po {
        files: Vec<PathBuf>,
    },
}

impl TemplateSource {
    pub const fn tool(&self) -> Tool {
        match self {
            Self::Intltool {
                ..
            } => Tool::IntltoolUpdate,
            Self::Xml2po {
                ..
            } => Tool::Xml2po,
        }
    }
}

/// One request for a directory's template.
#[derive(Debug, Clone)]
pub struct TemplateJob {
    pub directory: PathBuf,
    pub source: TemplateSource,
    pub output: PathBuf,
    pub epoch: String,
}

/// Directory-keyed template records plus the per-run memo.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct TemplateCache {
    #[serde(default)]
    records: BTreeMap<PathBuf, TemplateArtifact>,

    #[serde(skip)]
    memo: HashMap<PathBuf, Option<TemplateArtifact>>,

    #[serde(skip)]
    force_rescan: bool,

    #[serde(skip)]
    generator_runs: usize,
}

impl TemplateCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Ignore recorded epochs; the per-run memo still applies.
    pub const fn set_force_rescan(&mut self, force: bool) {
        self.force_rescan = force;
    }

    /// Last artifact recorded for `directory`, from this or a previous run.
    pub fn record(&self, directory: &Path) -> Option<&TemplateArtifact> {
        self.records.get(&key(directory))
    }

    pub fn records(&self) -> impl Iterator<Item = (&Path, &TemplateArtifact)> {
        self.records.iter().map(|(dir, artifact)| (dir.as_path(), artifact))
    }

    /// Number of generator invocations made through this cache in this run.
    pub const fn generator_runs(&self) -> usize {
        self.generator_runs
    }

    /// Returns the template for `job.directory`, building it if needed.
    ///
    /// # Errors
    ///
    /// [`SweepError::GeneratorFailure`] (or [`SweepError::ToolNotFound`]) when
    /// the generator fails now or already failed for this directory in this
    /// run; [`SweepError::ParseFailure`] when the output is not a catalog.
    pub async fn get_or_build(
        &mut self,
        tools: &ToolSet,
        job: &TemplateJob,
    ) -> Result<TemplateArtifact, SweepError> {
        let dir = key(&job.directory);

        if let Some(memoized) = self.memo.get(&dir) {
            tracing::debug!(target: "l10n", "Template for {} memoized", dir.display());
            return memoized.clone().ok_or_else(|| SweepError::GeneratorFailure {
                tool: job.source.tool().to_string(),
                message: format!("template for {} already failed in this run", dir.display()),
            });
        }

        if !self.force_rescan {
            if let Some(record) = self.records.get(&dir) {
                if record.epoch == job.epoch && record.path.exists() {
                    tracing::debug!(
                        target: "l10n",
                        "Template {} is current for epoch {}",
                        record.path.display(),
                        job.epoch
                    );
                    let record = record.clone();
                    self.memo.insert(dir, Some(record.clone()));
                    return Ok(record);
                }
            }
        }

        tracing::info!(target: "l10n", "Creating template {}", job.output.display());
        self.generator_runs += 1;
        match build(tools, job).await {
            Ok(artifact) => {
                self.records.insert(dir.clone(), artifact.clone());
                self.memo.insert(dir, Some(artifact.clone()));
                Ok(artifact)
            }
            Err(error) => {
                tracing::warn!(
                    target: "l10n",
                    "Failed to create template {}: {}",
                    job.output.display(),
                    error
                );
                self.memo.insert(dir, None);
                Err(error)
            }
        }
    }
}

fn key(directory: &Path) -> PathBuf {
    std::path::absolute(directory).unwrap_or_else(|_| directory.to_path_buf())
}

async fn build(tools: &ToolSet, job: &TemplateJob) -> Result<TemplateArtifact, SweepError> {
    let tool = job.source.tool();
    let missing = generate(tools, job).await.map_err(|e| into_tool_error(e, tool))?;

    let text = match tokio::fs::read_to_string(&job.output).await {
        Ok(text) => text,
        Err(e) => {
            return Err(SweepError::GeneratorFailure {
                tool: tool.to_string(),
                message: format!("no template at {}: {e}", job.output.display()),
            });
        }
    };

    let catalog = Catalog::parse(&text, &job.output.display().to_string())?;
    Ok(TemplateArtifact {
        path: job.output.clone(),
        generated_at: Utc::now(),
        content_hash: content_hash(&text),
        epoch: job.epoch.clone(),
        message_count: catalog.message_count(),
        missing,
    })
}

/// Runs the generator; returns the files reported missing (intltool only).
async fn generate(tools: &ToolSet, job: &TemplateJob) -> anyhow::Result<Vec<String>> {
    if let Some(parent) = job.output.parent() {
        tokio::fs::create_dir_all(parent)
            .await
            .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
    }
    let context = job.directory.display().to_string();

    match &job.source {
        TemplateSource::Intltool {
            package,
        } => {
            for stale in ["missing", "notexist"] {
                let _ = tokio::fs::remove_file(job.directory.join(stale)).await;
            }
            let missing = match tools
                .command(Tool::IntltoolUpdate)?
                .arg("-m")
                .current_dir(&job.directory)
                .with_context(&context)
                .execute()
                .await
            {
                Ok(_) => read_missing(&job.directory.join("missing")).await,
                Err(e) => {
                    tracing::debug!(target: "l10n", "intltool-update -m failed: {e:#}");
                    Vec::new()
                }
            };

            tools
                .command(Tool::IntltoolUpdate)?
                .args(["-p", "-g", package.as_str()])
                .current_dir(&job.directory)
                .with_context(&context)
                .execute_success()
                .await?;
            move_file(&job.directory.join(format!("{package}.pot")), &job.output).await?;
            Ok(missing)
        }
        TemplateSource::Xml2po {
            files,
        } => {
            tools
                .command(Tool::Xml2po)?
                .args(["-e", "-o"])
                .arg(job.output.display().to_string())
                .args(files.iter().map(|f| f.display().to_string()))
                .current_dir(&job.directory)
                .with_context(&context)
                .execute_success()
                .await?;
            Ok(Vec::new())
        }
    }
}

async fn read_missing(path: &Path) -> Vec<String> {
    match tokio::fs::read_to_string(path).await {
        Ok(text) => {
            text.lines().map(str::trim).filter(|l| !l.is_empty()).map(str::to_string).collect()
        }
        Err(_) => Vec::new(),
    }
}

/// Digest of everything after the first blank line.
pub fn content_hash(text: &str) -> String {
    let mut body = String::with_capacity(text.len());
    let mut past_header = false;
    for line in text.split_inclusive('\n') {
        if past_header {
            body.push_str(line);
        } else if line.trim().is_empty() {
            past_header = true;
        }
    }
    sha256_digest(body.as_bytes())
}
