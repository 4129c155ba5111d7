//! Translation merge engine
//!
//! Merges one language catalog against the current template with
//! `msgmerge <catalog> <template>` (merged catalog on stdout) and counts the
//! result. A merge is skipped only when both the catalog file is unchanged
//! and the template content hash equals the one used for the last successful
//! merge: a catalog can be untouched while its template changed upstream.
//!
//! A failed merge leaves the last good record in place, so callers can keep
//! reporting the previous statistics next to the new error.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use super::catalog::{Catalog, CatalogStats};
use super::template::TemplateArtifact;
use crate::core::SweepError;
use crate::stamps::StampStore;
use crate::tool::{Tool, ToolSet, into_tool_error};

/// Result of the last successful merge of a catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MergeRecord {
    /// Content hash of the template merged against
    pub template_hash: String,
    pub stats: CatalogStats,
    pub merged_at: DateTime<Utc>,
}

/// Catalog-keyed merge records.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct MergeEngine {
    #[serde(default)]
    records: BTreeMap<PathBuf, MergeRecord>,

    #[serde(skip)]
    merge_runs: usize,
}

impl MergeEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// The last good merge of `catalog`, if any.
    pub fn last_good(&self, catalog: &Path) -> Option<&MergeRecord> {
        self.records.get(&key(catalog))
    }

    pub fn records(&self) -> impl Iterator<Item = (&Path, &MergeRecord)> {
        self.records.iter().map(|(catalog, record)| (catalog.as_path(), record))
    }

    /// Number of merge tool invocations in this run.
    pub const fn merge_runs(&self) -> usize {
        self.merge_runs
    }

    /// Merges `catalog` against `template` unless nothing relevant changed.
    ///
    /// # Errors
    ///
    /// - [`SweepError::MissingInput`] if the catalog does not exist
    /// - [`SweepError::GeneratorFailure`] / [`SweepError::ToolNotFound`] if
    ///   `msgmerge` fails
    /// - [`SweepError::ParseFailure`] if its output is not a catalog
    pub async fn merge(
        &mut self,
        stamps: &mut StampStore,
        tools: &ToolSet,
        catalog: &Path,
        template: &TemplateArtifact,
    ) -> Result<CatalogStats, SweepError> {
        let catalog = key(catalog);
        if !tokio::fs::try_exists(&catalog).await.unwrap_or(false) {
            return Err(SweepError::missing("catalog", &catalog));
        }

        let stamp = stamps.check(&catalog).await?;
        if stamp.is_unchanged() {
            if let Some(record) = self.records.get(&catalog) {
                if record.template_hash == template.content_hash {
                    tracing::debug!(target: "l10n", "{} is up to date", catalog.display());
                    return Ok(record.stats);
                }
            }
        }

        let (dir, file_name) = match (catalog.parent(), catalog.file_name()) {
            (Some(dir), Some(name)) => (dir.to_path_buf(), name.to_string_lossy().to_string()),
            _ => return Err(SweepError::missing("catalog", &catalog)),
        };

        tracing::info!(target: "l10n", "Merging {}", catalog.display());
        self.merge_runs += 1;
        let output = tools
            .command(Tool::Msgmerge)?
            .arg(file_name)
            .arg(template.path.display().to_string())
            .current_dir(&dir)
            .with_context(catalog.display().to_string())
            .execute()
            .await
            .map_err(|e| into_tool_error(e, Tool::Msgmerge))?;

        let merged = Catalog::parse(&output.stdout, &catalog.display().to_string())?;
        let stats = merged.stats();

        self.records.insert(
            catalog,
            MergeRecord {
                template_hash: template.content_hash.clone(),
                stats,
                merged_at: Utc::now(),
            },
        );
        stamps.commit(stamp);
        Ok(stats)
    }
}

fn key(path: &Path) -> PathBuf {
    std::path::absolute(path).unwrap_or_else(|_| path.to_path_buf())
}
