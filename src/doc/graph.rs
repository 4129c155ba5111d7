//! Topic link graph of a Mallard documentation unit.
//!
//! Topic links are stored as declared (page → target). Guide links are stored
//! inverted: a page declaring `<link type="guide" xref="setup"/>` is recorded
//! as referenced-by on `setup`, and the rendered edge runs `setup` → page.
//! Both are sets, so adding an edge twice is the same as adding it once.
//!
//! The flattened edge list is compared with the text of the last successful
//! render; `dot` only runs when it differs.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};

use super::credits::{Contributor, aggregate_credits};
use super::mallard::MallardPage;
use crate::core::SweepError;
use crate::tool::{Tool, ToolSet, into_tool_error};

/// Graph attributes written before the edges.
const DOT_HEADER: &str = "strict digraph topics {\n\
width=\"3\";\n\
rankdir=\"LR\";\n\
splines=\"ortho\";\n\
node [shape=box,width=2,fontname=sans,fontsize=10];\n";

/// A scanned page and the file it came from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageRecord {
    pub file: PathBuf,
    pub page: MallardPage,
}

/// Link graph, page records, and render cache of one unit.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LinkGraphState {
    #[serde(default)]
    pages: BTreeMap<String, PageRecord>,

    /// page → topic targets
    #[serde(default)]
    topics: BTreeMap<String, BTreeSet<String>>,

    /// guide target → pages declaring it
    #[serde(default)]
    inbound_guides: BTreeMap<String, BTreeSet<String>>,

    /// Edge text of the last successful render
    #[serde(default)]
    rendered_edges: String,
}

impl LinkGraphState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_topic(&mut self, page: &str, target: &str) {
        self.topics.entry(page.to_string()).or_default().insert(target.to_string());
    }

    /// Records that `page` declares `target` as one of its guides.
    pub fn add_guide(&mut self, page: &str, target: &str) {
        self.inbound_guides.entry(target.to_string()).or_default().insert(page.to_string());
    }

    /// Pages declaring `target` as a guide.
    pub fn inbound_guides(&self, target: &str) -> Vec<&str> {
        self.inbound_guides
            .get(target)
            .map(|pages| pages.iter().map(String::as_str).collect())
            .unwrap_or_default()
    }

    /// Topic targets declared by `page`.
    pub fn topics(&self, page: &str) -> Vec<&str> {
        self.topics
            .get(page)
            .map(|targets| targets.iter().map(String::as_str).collect())
            .unwrap_or_default()
    }

    /// Replaces everything `page` contributed before with its new contents.
    pub fn record_page(&mut self, file: PathBuf, page: MallardPage) {
        self.remove_page(&page.id);
        // A file whose page id changed no longer contributes the old id
        let stale: Vec<String> =
            self.pages.iter().filter(|(_, r)| r.file == file).map(|(id, _)| id.clone()).collect();
        for id in stale {
            self.remove_page(&id);
        }

        for target in &page.topic_links {
            self.add_topic(&page.id, target);
        }
        for target in &page.guide_links {
            self.add_guide(&page.id, target);
        }
        self.pages.insert(page.id.clone(), PageRecord {
            file,
            page,
        });
    }

    /// Removes a page and every link it declared.
    pub fn remove_page(&mut self, id: &str) -> Option<PageRecord> {
        self.topics.remove(id);
        self.inbound_guides.retain(|_, pages| {
            pages.remove(id);
            !pages.is_empty()
        });
        self.pages.remove(id)
    }

    /// Drops pages whose file is not in `files`. Returns the removed ids.
    pub fn prune(&mut self, files: &BTreeSet<PathBuf>) -> Vec<String> {
        let gone: Vec<String> = self
            .pages
            .iter()
            .filter(|(_, record)| !files.contains(&record.file))
            .map(|(id, _)| id.clone())
            .collect();
        for id in &gone {
            tracing::debug!(target: "doc", "Pruning page {id}");
            self.remove_page(id);
        }
        gone
    }

    pub fn page(&self, id: &str) -> Option<&PageRecord> {
        self.pages.get(id)
    }

    /// The record scanned from `file`, if any.
    pub fn page_for_file(&self, file: &Path) -> Option<&PageRecord> {
        self.pages.values().find(|record| record.file == file)
    }

    pub fn pages(&self) -> impl Iterator<Item = &PageRecord> {
        self.pages.values()
    }

    /// All edges, sorted by source then target.
    pub fn edges(&self) -> Vec<(&str, &str)> {
        let mut edges = BTreeSet::new();
        for (page, targets) in &self.topics {
            for target in targets {
                edges.insert((page.as_str(), target.as_str()));
            }
        }
        for (target, pages) in &self.inbound_guides {
            for page in pages {
                edges.insert((target.as_str(), page.as_str()));
            }
        }
        edges.into_iter().collect()
    }

    /// One `"source" -> "target";` line per edge.
    pub fn edge_text(&self) -> String {
        self.edges()
            .into_iter()
            .map(|(from, to)| format!("{} -> {};\n", dot_id(from), dot_id(to)))
            .collect()
    }

    /// Contributors of all pages with their roles merged.
    pub fn contributors(&self) -> Vec<Contributor> {
        aggregate_credits(self.pages.values().flat_map(|record| &record.page.credits))
    }

    /// Renders the graph to `output` unless the edges are the ones rendered
    /// last time. Returns whether `dot` ran.
    ///
    /// # Errors
    ///
    /// [`SweepError::GeneratorFailure`] or [`SweepError::ToolNotFound`]; the
    /// render cache is left as it was.
    pub async fn render(
        &mut self,
        tools: &ToolSet,
        working_dir: &Path,
        output: &Path,
    ) -> Result<bool, SweepError> {
        let edges = self.edge_text();
        if edges == self.rendered_edges {
            tracing::debug!(target: "doc", "Link graph {} unchanged", output.display());
            return Ok(false);
        }

        if let Some(parent) = output.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tracing::info!(target: "doc", "Creating link graph {}", output.display());
        tools
            .command(Tool::Dot)?
            .args(["-Tsvg", "-o"])
            .arg(output.display().to_string())
            .stdin(dot_text(&edges))
            .current_dir(working_dir)
            .with_context(output.display().to_string())
            .execute_success()
            .await
            .map_err(|e| into_tool_error(e, Tool::Dot))?;

        self.rendered_edges = edges;
        Ok(true)
    }
}

/// The full graph description for an edge list.
pub fn dot_text(edges: &str) -> String {
    format!("{DOT_HEADER}{edges}}}\n")
}

/// Quoted DOT identifier.
fn dot_id(id: &str) -> String {
    let mut quoted = String::with_capacity(id.len() + 2);
    quoted.push('"');
    for c in id.chars() {
        if matches!(c, '"' | '\\') {
            quoted.push('\\');
        }
        quoted.push(c);
    }
    quoted.push('"');
    quoted
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::Localized;

    fn page(id: &str, topics: &[&str], guides: &[&str]) -> MallardPage {
        MallardPage {
            id: id.to_string(),
            title: Some(Localized::Single(id.to_string())),
            desc: None,
            credits: Vec::new(),
            topic_links: topics.iter().map(|s| s.to_string()).collect(),
            guide_links: guides.iter().map(|s| s.to_string()).collect(),
            revision: None,
        }
    }

    #[test]
    fn test_duplicate_edges_are_idempotent() {
        let mut once = LinkGraphState::new();
        once.add_topic("index", "files");

        let mut twice = LinkGraphState::new();
        twice.add_topic("index", "files");
        twice.add_topic("index", "files");

        assert_eq!(once.edge_text(), twice.edge_text());
        assert_eq!(twice.topics("index"), vec!["files"]);
    }

    #[test]
    fn test_guide_links_are_inverted() {
        let mut graph = LinkGraphState::new();
        graph.record_page(PathBuf::from("C/net-wired.page"), page("net-wired", &[], &["setup"]));

        assert_eq!(graph.inbound_guides("setup"), vec!["net-wired"]);
        assert_eq!(graph.edge_text(), "\"setup\" -> \"net-wired\";\n");
    }

    #[test]
    fn test_edges_sorted() {
        let mut graph = LinkGraphState::new();
        graph.record_page(PathBuf::from("C/index.page"), page("index", &["shell", "files"], &[]));
        graph.record_page(PathBuf::from("C/files.page"), page("files", &["files-copy"], &["index"]));

        assert_eq!(
            graph.edges(),
            vec![("files", "files-copy"), ("index", "files"), ("index", "shell")]
        );
    }

    #[test]
    fn test_record_page_replaces_previous_links() {
        let mut graph = LinkGraphState::new();
        let file = PathBuf::from("C/a.page");
        graph.record_page(file.clone(), page("a", &["b"], &["index"]));
        graph.record_page(file.clone(), page("a", &["c"], &[]));
        assert_eq!(graph.edges(), vec![("a", "c")]);

        // Same file, new id
        graph.record_page(file, page("renamed", &[], &[]));
        assert!(graph.page("a").is_none());
        assert!(graph.edges().is_empty());
    }

    #[test]
    fn test_prune() {
        let mut graph = LinkGraphState::new();
        graph.record_page(PathBuf::from("C/a.page"), page("a", &["b"], &[]));
        graph.record_page(PathBuf::from("C/b.page"), page("b", &[], &["a"]));

        let keep: BTreeSet<PathBuf> = [PathBuf::from("C/a.page")].into_iter().collect();
        assert_eq!(graph.prune(&keep), vec!["b"]);
        assert_eq!(graph.edges(), vec![("a", "b")]);
        assert!(graph.inbound_guides("a").is_empty());
    }

    #[test]
    fn test_page_ids_are_escaped() {
        let mut graph = LinkGraphState::new();
        graph.add_topic("index", r#"say "hi""#);
        graph.add_topic("index", r"back\slash");
        assert_eq!(
            graph.edge_text(),
            "\"index\" -> \"back\\\\slash\";\n\"index\" -> \"say \\\"hi\\\"\";\n"
        );
    }

    #[test]
    fn test_dot_text() {
        let text = dot_text("\"a\" -> \"b\";\n");
        assert!(text.starts_with("strict digraph topics {\nwidth=\"3\";\nrankdir=\"LR\";\n"));
        assert!(text.ends_with("node [shape=box,width=2,fontname=sans,fontsize=10];\n\"a\" -> \"b\";\n}\n"));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_render_only_when_edges_change() {
        use crate::config::ToolsConfig;

        let temp = tempfile::TempDir::new().unwrap();
        let output = temp.path().join("graphs/topiclinks.svg");
        let mut config = ToolsConfig::default();
        config.dot = vec!["sh".to_string(), "-c".to_string(), "cat > \"$3\"".to_string(), "dot".to_string()];
        let tools = ToolSet::new(config, None);

        let mut graph = LinkGraphState::new();
        // Nothing to draw yet
        assert!(!graph.render(&tools, temp.path(), &output).await.unwrap());

        graph.add_topic("index", "files");
        assert!(graph.render(&tools, temp.path(), &output).await.unwrap());
        let svg = std::fs::read_to_string(&output).unwrap();
        assert!(svg.contains("\"index\" -> \"files\";"));

        assert!(!graph.render(&tools, temp.path(), &output).await.unwrap());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_failed_render_keeps_cache() {
        use crate::config::ToolsConfig;

        let temp = tempfile::TempDir::new().unwrap();
        let output = temp.path().join("topiclinks.svg");
        let mut config = ToolsConfig::default();
        config.dot = vec!["sh".to_string(), "-c".to_string(), "exit 3".to_string()];
        let tools = ToolSet::new(config, None);

        let mut graph = LinkGraphState::new();
        graph.add_topic("index", "files");
        let err = graph.render(&tools, temp.path(), &output).await.unwrap_err();
        assert!(matches!(err, SweepError::GeneratorFailure { ref tool, .. } if tool == "dot"));
        assert!(graph.rendered_edges.is_empty());
    }
}
