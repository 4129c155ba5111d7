//! Documentation scanning: Mallard units and DocBook documents
//!
//! A Mallard unit is a directory of `.page` files. Every page is gated by the
//! [`StampStore`]; unchanged pages keep what they contributed last time. Once
//! all pages are scanned the unit's link graph is flattened and rendered (if
//! the edges changed) and the credits of all pages are merged.
//!
//! A page that fails to parse is reported against the unit; its siblings are
//! still scanned.

pub mod credits;
pub mod docbook;
pub mod graph;
pub mod mallard;

pub use credits::{Contributor, Credit, CreditRoles, aggregate_credits, ghost_identity};
pub use docbook::{DocBookDocument, parse_docbook};
pub use graph::{LinkGraphState, PageRecord, dot_text};
pub use mallard::{MallardPage, Revision, parse_page, status_code};

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use crate::constants::TOPIC_GRAPH_FILE;
use crate::core::{Localized, Outcome, SweepError};
use crate::stamps::StampStore;
use crate::tool::ToolSet;

/// A Mallard documentation unit.
#[derive(Debug, Clone)]
pub struct MallardUnit {
    /// Document id, names the graph output directory
    pub id: String,
    /// Directory holding the pages (the `C` directory)
    pub dir: PathBuf,
    /// Page files relative to `dir`
    pub pages: Vec<PathBuf>,
    /// Package series revisions are matched against
    pub series: Option<String>,
}

impl MallardUnit {
    /// A unit made of every `*.page` file below `dir`, sorted.
    pub fn discover(id: &str, dir: &Path, series: Option<&str>) -> Self {
        let mut pages: Vec<PathBuf> = WalkDir::new(dir)
            .into_iter()
            .filter_map(Result::ok)
            .filter(|e| e.file_type().is_file())
            .filter(|e| e.path().extension().is_some_and(|ext| ext == "page"))
            .filter_map(|e| e.path().strip_prefix(dir).ok().map(Path::to_path_buf))
            .collect();
        pages.sort();

        Self {
            id: id.to_string(),
            dir: dir.to_path_buf(),
            pages,
            series: series.map(str::to_string),
        }
    }

    fn page_files(&self) -> Vec<PathBuf> {
        self.pages
            .iter()
            .map(|p| {
                let joined = self.dir.join(p);
                std::path::absolute(&joined).unwrap_or(joined)
            })
            .collect()
    }
}

/// Result of sweeping one Mallard unit.
#[derive(Debug, Clone, Serialize)]
pub struct UnitReport {
    pub id: String,
    /// From the `index` page
    pub title: Option<Localized<String>>,
    pub desc: Option<Localized<String>>,
    pub status: Option<String>,
    pub pages: usize,
    /// Pages parsed in this run; the rest were unchanged
    pub scanned: usize,
    /// Per-page failures, keyed by file
    pub page_errors: BTreeMap<PathBuf, String>,
    pub contributors: Vec<Contributor>,
    pub edges: Vec<(String, String)>,
    pub graph: PathBuf,
    /// Whether the graph was rendered in this run
    pub rendered: bool,
}

/// Persisted documentation state of a sweep.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct DocState {
    /// Link graphs keyed by unit id
    #[serde(default)]
    pub graphs: BTreeMap<String, LinkGraphState>,

    /// Last good DocBook metadata keyed by main file
    #[serde(default)]
    pub docbooks: BTreeMap<PathBuf, DocBookDocument>,
}

impl DocState {
    /// Scans the pages of `unit`, then renders its link graph.
    pub async fn sweep_mallard(
        &mut self,
        stamps: &mut StampStore,
        tools: &ToolSet,
        output_dir: &Path,
        unit: &MallardUnit,
    ) -> Outcome<UnitReport> {
        let files = unit.page_files();
        let graph = self.graphs.entry(unit.id.clone()).or_default();
        graph.prune(&files.iter().cloned().collect::<BTreeSet<_>>());

        let mut scanned = 0;
        let mut page_errors = BTreeMap::new();
        let mut first_error = None;

        for file in &files {
            match scan_page(stamps, graph, file, unit.series.as_deref()).await {
                Ok(true) => scanned += 1,
                Ok(false) => {}
                Err(error) => {
                    tracing::warn!(target: "doc", "{}: {}", unit.id, error);
                    page_errors.insert(file.clone(), error.to_string());
                    first_error.get_or_insert(error);
                }
            }
        }

        let output = output_dir.join("graphs").join(&unit.id).join(TOPIC_GRAPH_FILE);
        let rendered = match graph.render(tools, &unit.dir, &output).await {
            Ok(rendered) => rendered,
            Err(error) => {
                tracing::warn!(target: "doc", "{}: {}", unit.id, error);
                first_error = Some(error);
                false
            }
        };

        let index = graph.page("index").map(|record| &record.page);
        let report = UnitReport {
            id: unit.id.clone(),
            title: index.and_then(|p| p.title.clone()),
            desc: index.and_then(|p| p.desc.clone()),
            status: index.map(|p| {
                p.revision.as_ref().map_or_else(|| status_code(None), |r| r.status.clone())
            }),
            pages: files.len(),
            scanned,
            page_errors,
            contributors: graph.contributors(),
            edges: graph.edges().into_iter().map(|(a, b)| (a.to_string(), b.to_string())).collect(),
            graph: output,
            rendered,
        };

        match first_error {
            Some(error) => Outcome::partial(report, error),
            None => Outcome::ok(report),
        }
    }

    /// Reads the metadata of a DocBook document, reusing the last good result
    /// when the main file is unchanged.
    pub async fn sweep_docbook(
        &mut self,
        stamps: &mut StampStore,
        file: &Path,
        series: Option<&str>,
    ) -> Outcome<DocBookDocument> {
        let key = std::path::absolute(file).unwrap_or_else(|_| file.to_path_buf());
        match self.scan_docbook(stamps, &key, series).await {
            Ok(document) => Outcome::ok(document),
            Err(error) => {
                tracing::warn!(target: "doc", "{}: {}", key.display(), error);
                match self.docbooks.get(&key) {
                    Some(last) => Outcome::partial(last.clone(), error),
                    None => Outcome::failed(error),
                }
            }
        }
    }

    async fn scan_docbook(
        &mut self,
        stamps: &mut StampStore,
        file: &Path,
        series: Option<&str>,
    ) -> Result<DocBookDocument, SweepError> {
        let stamp = stamps.check(file).await?;
        if stamp.is_unchanged() {
            if let Some(document) = self.docbooks.get(file) {
                return Ok(document.clone());
            }
        }

        tracing::info!(target: "doc", "Processing {}", file.display());
        let text = tokio::fs::read_to_string(file).await?;
        let document = parse_docbook(&text, &file.display().to_string(), series)?;
        self.docbooks.insert(file.to_path_buf(), document.clone());
        stamps.commit(stamp);
        Ok(document)
    }
}

/// Scans one page into `graph`. Returns whether the page was parsed.
async fn scan_page(
    stamps: &mut StampStore,
    graph: &mut LinkGraphState,
    file: &Path,
    series: Option<&str>,
) -> Result<bool, SweepError> {
    let stamp = stamps.check(file).await?;
    if stamp.is_unchanged() && graph.page_for_file(file).is_some() {
        return Ok(false);
    }

    tracing::debug!(target: "doc", "Processing {}", file.display());
    let text = tokio::fs::read_to_string(file).await?;
    match parse_page(&text, &file.display().to_string(), series)? {
        Some(page) => graph.record_page(file.to_path_buf(), page),
        None => tracing::debug!(target: "doc", "{} is not a Mallard page", file.display()),
    }
    stamps.commit(stamp);
    Ok(true)
}
