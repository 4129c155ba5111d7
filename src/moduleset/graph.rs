//! Package dependency graph of a module set.
//!
//! Built from the `dependencies` declared by every package. Edges point from a
//! package to what it depends on. Dependencies on ids that are not packages of
//! the document (metamodules, packages without a source-control location,
//! typos) are not part of the graph.

use petgraph::algo::tarjan_scc;
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::EdgeRef;
use serde::Serialize;
use std::collections::{HashMap, HashSet};

use super::document::ModuleSetDocument;

/// A dependency of a package.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Dependency {
    pub id: String,
    /// Declared by the package itself rather than reached transitively
    pub direct: bool,
}

/// Directed package graph.
pub struct PackageGraph {
    graph: DiGraph<String, ()>,
    node_map: HashMap<String, NodeIndex>,
}

impl PackageGraph {
    pub fn new() -> Self {
        Self {
            graph: DiGraph::new(),
            node_map: HashMap::new(),
        }
    }

    /// Graph of every package in `document`.
    pub fn from_document(document: &ModuleSetDocument) -> Self {
        let mut graph = Self::new();
        for package in document.packages() {
            graph.ensure_node(&package.id);
            for dep in &package.deps {
                if document.has_package(dep) {
                    graph.add_dependency(&package.id, dep);
                }
            }
        }
        graph
    }

    fn ensure_node(&mut self, id: &str) -> NodeIndex {
        if let Some(&index) = self.node_map.get(id) {
            index
        } else {
            let index = self.graph.add_node(id.to_string());
            self.node_map.insert(id.to_string(), index);
            index
        }
    }

    /// `from` depends on `to`.
    pub fn add_dependency(&mut self, from: &str, to: &str) {
        let from_idx = self.ensure_node(from);
        let to_idx = self.ensure_node(to);
        if !self.graph.contains_edge(from_idx, to_idx) {
            self.graph.add_edge(from_idx, to_idx, ());
        }
    }

    /// Direct dependencies in declaration order.
    fn direct(&self, node: NodeIndex) -> Vec<NodeIndex> {
        let mut edges: Vec<_> = self.graph.edges(node).collect();
        edges.sort_by_key(|edge| edge.id());
        edges.into_iter().map(|edge| edge.target()).collect()
    }

    /// Every package `id` depends on, depth-first in declaration order, each
    /// once. `id` itself is never listed, even when a cycle leads back to it.
    pub fn dependency_closure(&self, id: &str) -> Vec<Dependency> {
        let Some(&start) = self.node_map.get(id) else {
            return Vec::new();
        };
        let direct: HashSet<NodeIndex> = self.direct(start).into_iter().collect();

        let mut seen = HashSet::from([start]);
        let mut closure = Vec::new();
        let mut stack = vec![(self.direct(start), 0)];
        while let Some((deps, next)) = stack.last_mut() {
            let Some(&dep) = deps.get(*next) else {
                stack.pop();
                continue;
            };
            *next += 1;
            if seen.insert(dep) {
                closure.push(dep);
                stack.push((self.direct(dep), 0));
            }
        }

        closure
            .into_iter()
            .map(|index| Dependency {
                id: self.graph[index].clone(),
                direct: direct.contains(&index),
            })
            .collect()
    }

    /// Groups of packages that depend on each other, each sorted, largest
    /// first. Packages outside any cycle are not listed.
    pub fn cycles(&self) -> Vec<Vec<String>> {
        let mut cycles: Vec<Vec<String>> = tarjan_scc(&self.graph)
            .into_iter()
            .filter(|component| {
                component.len() > 1
                    || component.first().is_some_and(|&n| self.graph.contains_edge(n, n))
            })
            .map(|component| {
                let mut ids: Vec<String> =
                    component.into_iter().map(|n| self.graph[n].clone()).collect();
                ids.sort();
                ids
            })
            .collect();
        cycles.sort_by(|a, b| b.len().cmp(&a.len()).then_with(|| a.cmp(b)));
        cycles
    }

    /// Human-readable dependency tree of `id`. Packages already shown are
    /// marked instead of expanded again.
    pub fn to_tree_string(&self, id: &str) -> String {
        let mut result = format!("{id}\n");
        let Some(&root) = self.node_map.get(id) else {
            return result;
        };

        let mut visited = HashSet::from([root]);
        let mut frames = vec![(self.direct(root), 0, String::new())];
        while let Some((deps, next, prefix)) = frames.last_mut() {
            let Some(&node) = deps.get(*next) else {
                frames.pop();
                continue;
            };
            *next += 1;
            let is_last = *next == deps.len();
            let connector = if is_last {
                "└── "
            } else {
                "├── "
            };

            if !visited.insert(node) {
                result.push_str(&format!("{prefix}{connector}{} (see above)\n", self.graph[node]));
                continue;
            }
            result.push_str(&format!("{prefix}{connector}{}\n", self.graph[node]));

            let child_prefix = if is_last {
                format!("{prefix}    ")
            } else {
                format!("{prefix}│   ")
            };
            frames.push((self.direct(node), 0, child_prefix));
        }
        result
    }

    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }
}

impl Default for PackageGraph {
    fn default() -> Self {
        Self::new()
    }
}

/// Transitive dependencies of `package` within `document`.
pub fn dependency_closure(document: &ModuleSetDocument, package: &str) -> Vec<Dependency> {
    PackageGraph::from_document(document).dependency_closure(package)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids(deps: &[Dependency]) -> Vec<(&str, bool)> {
        deps.iter().map(|d| (d.id.as_str(), d.direct)).collect()
    }

    #[test]
    fn test_closure_in_declaration_order() {
        let mut graph = PackageGraph::new();
        graph.add_dependency("gtk+", "pango");
        graph.add_dependency("gtk+", "glib");
        graph.add_dependency("pango", "cairo");
        graph.add_dependency("pango", "glib");
        graph.add_dependency("cairo", "pixman");

        assert_eq!(
            ids(&graph.dependency_closure("gtk+")),
            vec![("pango", true), ("cairo", false), ("pixman", false), ("glib", true)]
        );
        assert!(graph.dependency_closure("pixman").is_empty());
        assert!(graph.dependency_closure("unknown").is_empty());
    }

    #[test]
    fn test_closure_survives_cycles() {
        let mut graph = PackageGraph::new();
        graph.add_dependency("a", "b");
        graph.add_dependency("b", "c");
        graph.add_dependency("c", "a");
        graph.add_dependency("c", "d");

        assert_eq!(
            ids(&graph.dependency_closure("a")),
            vec![("b", true), ("c", false), ("d", false)]
        );
        assert_eq!(graph.cycles(), vec![vec!["a", "b", "c"]]);
    }

    #[test]
    fn test_self_dependency_is_a_cycle() {
        let mut graph = PackageGraph::new();
        graph.add_dependency("a", "a");
        graph.add_dependency("a", "b");
        graph.add_dependency("a", "b");
        assert_eq!(graph.edge_count(), 2);
        assert_eq!(graph.cycles(), vec![vec!["a"]]);
        assert_eq!(ids(&graph.dependency_closure("a")), vec![("b", true)]);
    }

    #[test]
    fn test_tree_string() {
        let mut graph = PackageGraph::new();
        graph.add_dependency("app", "lib");
        graph.add_dependency("app", "util");
        graph.add_dependency("lib", "util");

        assert_eq!(
            graph.to_tree_string("app"),
            "app\n├── lib\n│   └── util\n└── util (see above)\n"
        );
    }

    #[test]
    fn test_long_dependency_chain() {
        const DEPTH: usize = 100_000;
        let mut graph = PackageGraph::new();
        for i in 0..DEPTH {
            graph.add_dependency(&format!("p{i}"), &format!("p{}", i + 1));
        }

        let closure = graph.dependency_closure("p0");
        assert_eq!(closure.len(), DEPTH);
        assert_eq!(closure[0], Dependency { id: "p1".to_string(), direct: true });
        assert_eq!(closure[DEPTH - 1].id, format!("p{DEPTH}"));
        assert!(!closure[DEPTH - 1].direct);
    }

    #[test]
    fn test_from_document_skips_unknown_dependencies() {
        let doc = ModuleSetDocument::parse(
            r#"<moduleset>
  <repository type="git" name="g" default="yes" href="git://g/"/>
  <autotools id="app"><branch/><dependencies><dep package="lib"/><dep package="meta"/></dependencies></autotools>
  <autotools id="lib"><branch/></autotools>
  <metamodule id="meta"><dependencies><dep package="lib"/></dependencies></metamodule>
</moduleset>"#,
            std::path::Path::new("x.modules"),
        )
        .unwrap();
        let graph = PackageGraph::from_document(&doc);
        assert_eq!(graph.node_count(), 2);
        assert_eq!(ids(&dependency_closure(&doc, "app")), vec![("lib", true)]);
    }
}
