//! jhbuild module-set documents.
//!
//! A module-set file declares repositories, packages (`autotools` nodes),
//! metamodules (named groups of package or metamodule ids), and includes of
//! other module-set files. Includes are merged into the same namespace.
//!
//! Every file also contributes an implicit metamodule named after its own
//! basename that lists the packages declared in that file, in order.
//!
//! Packages whose source-control type cannot be determined (no `branch`, or a
//! branch pointing at an unknown repository) are left out entirely.

use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};

use crate::core::SweepError;
use crate::xml::{Element, parse_document};

/// A named source-control location.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Repository {
    pub name: Option<String>,
    /// `git`, `svn`, `cvs`, `bzr`, `tarball`, ...
    pub scm_type: String,
    /// `cvsroot` for CVS repositories, `href` for the others
    pub server: String,
    pub default: bool,
}

/// A buildable package.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Package {
    pub id: String,
    pub scm_type: String,
    pub scm_server: String,
    /// Always the package id
    pub scm_module: String,
    /// `module` attribute of the branch, if any
    pub scm_path: Option<String>,
    /// `revision` of the branch, else the default branch of the SCM type
    pub scm_branch: Option<String>,
    pub autogenargs: Option<String>,
    /// Declared dependency ids, in order
    pub deps: Vec<String>,
}

/// Default branch of a source-control type.
pub fn default_branch(scm_type: &str) -> Option<&'static str> {
    match scm_type {
        "git" => Some("master"),
        "svn" | "bzr" => Some("trunk"),
        "cvs" => Some("HEAD"),
        _ => None,
    }
}

/// A parsed module-set file with its includes.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ModuleSetDocument {
    /// The top-level file
    pub path: PathBuf,
    packages: BTreeMap<String, Package>,
    metamodules: BTreeMap<String, Vec<String>>,
    /// Every file read, the top-level file first
    files: Vec<PathBuf>,
}

impl ModuleSetDocument {
    /// Loads `path` and, recursively, its local includes.
    ///
    /// # Errors
    ///
    /// - [`SweepError::MissingInput`] if a file does not exist
    /// - [`SweepError::ParseFailure`] for malformed XML
    pub fn load(path: &Path) -> Result<Self, SweepError> {
        let mut document = Self {
            path: path.to_path_buf(),
            ..Self::default()
        };
        let mut visiting = BTreeSet::new();
        document.read_file(path, &mut visiting)?;
        Ok(document)
    }

    /// Parses a document held in memory. Includes are resolved relative to
    /// `path`.
    pub fn parse(text: &str, path: &Path) -> Result<Self, SweepError> {
        let mut document = Self {
            path: path.to_path_buf(),
            ..Self::default()
        };
        let mut visiting = BTreeSet::from([key(path)]);
        document.parse_text(text, path, &mut visiting)?;
        Ok(document)
    }

    pub fn package(&self, id: &str) -> Option<&Package> {
        self.packages.get(id)
    }

    pub fn has_package(&self, id: &str) -> bool {
        self.packages.contains_key(id)
    }

    pub fn packages(&self) -> impl Iterator<Item = &Package> {
        self.packages.values()
    }

    pub fn metamodule(&self, id: &str) -> Option<&[String]> {
        self.metamodules.get(id).map(Vec::as_slice)
    }

    pub fn has_metamodule(&self, id: &str) -> bool {
        self.metamodules.contains_key(id)
    }

    pub fn metamodules(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.metamodules.iter().map(|(id, members)| (id.as_str(), members.as_slice()))
    }

    pub fn files(&self) -> &[PathBuf] {
        &self.files
    }

    /// Name of the implicit group of the top-level file.
    pub fn default_group(&self) -> String {
        basename(&self.path)
    }

    fn read_file(&mut self, path: &Path, visiting: &mut BTreeSet<PathBuf>) -> Result<(), SweepError> {
        if !visiting.insert(key(path)) {
            tracing::warn!(target: "moduleset", "Include cycle through {}", path.display());
            return Ok(());
        }
        tracing::debug!(target: "moduleset", "Reading {}", path.display());
        let text = match std::fs::read_to_string(path) {
            Ok(text) => text,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(SweepError::missing("module-set file", path));
            }
            Err(e) => return Err(e.into()),
        };
        self.parse_text(&text, path, visiting)
    }

    fn parse_text(
        &mut self,
        text: &str,
        path: &Path,
        visiting: &mut BTreeSet<PathBuf>,
    ) -> Result<(), SweepError> {
        self.files.push(path.to_path_buf());
        let root = parse_document(text, &path.display().to_string())?;
        let group = basename(path);

        // Repositories are scoped to the file declaring them
        let mut repositories: BTreeMap<String, Repository> = BTreeMap::new();
        let mut default_repository: Option<Repository> = None;

        for node in root.elements() {
            match node.name.as_str() {
                "repository" => {
                    let repository = parse_repository(node);
                    if let Some(name) = &repository.name {
                        repositories.insert(name.clone(), repository.clone());
                    }
                    if repository.default {
                        default_repository = Some(repository);
                    }
                }
                "autotools" => {
                    if let Some(package) =
                        parse_package(node, &repositories, default_repository.as_ref())
                    {
                        self.metamodules.entry(group.clone()).or_default().push(package.id.clone());
                        self.packages.insert(package.id.clone(), package);
                    }
                }
                "metamodule" => {
                    let id = node.attr("id").unwrap_or_default().to_string();
                    let members = node.child("dependencies").map(dep_ids).unwrap_or_default();
                    self.metamodules.insert(id, members);
                }
                "include" => {
                    let href = node.attr("href").unwrap_or_default();
                    if href.is_empty() || href.starts_with("http:") {
                        continue;
                    }
                    let dir = path.parent().unwrap_or_else(|| Path::new(""));
                    self.read_file(&dir.join(href), visiting)?;
                }
                _ => {}
            }
        }
        Ok(())
    }
}

fn key(path: &Path) -> PathBuf {
    std::path::absolute(path).unwrap_or_else(|_| path.to_path_buf())
}

fn basename(path: &Path) -> String {
    path.file_name().map(|n| n.to_string_lossy().into_owned()).unwrap_or_default()
}

fn parse_repository(node: &Element) -> Repository {
    let scm_type = node.attr("type").unwrap_or_default().to_string();
    let server_attr = if scm_type == "cvs" { "cvsroot" } else { "href" };
    Repository {
        name: node.attr("name").map(str::to_string),
        server: node.attr(server_attr).unwrap_or_default().to_string(),
        scm_type,
        default: node.attr("default") == Some("yes"),
    }
}

fn parse_package(
    node: &Element,
    repositories: &BTreeMap<String, Repository>,
    default_repository: Option<&Repository>,
) -> Option<Package> {
    let id = node.attr("id").unwrap_or_default().to_string();
    let mut repository = None;
    let mut scm_path = None;
    let mut scm_branch = None;
    let mut deps = Vec::new();

    for child in node.elements() {
        match child.name.as_str() {
            "branch" => {
                repository = match child.attr("repo") {
                    Some(name) => repositories.get(name),
                    None => default_repository,
                };
                scm_path = child.attr("module").map(str::to_string);
                scm_branch = child.attr("revision").map(str::to_string).or_else(|| {
                    repository.and_then(|r| default_branch(&r.scm_type)).map(str::to_string)
                });
            }
            "dependencies" => deps = dep_ids(child),
            _ => {}
        }
    }

    let Some(repository) = repository else {
        tracing::debug!(target: "moduleset", "Skipping {id}: no source-control location");
        return None;
    };
    Some(Package {
        scm_module: id.clone(),
        id,
        scm_type: repository.scm_type.clone(),
        scm_server: repository.server.clone(),
        scm_path,
        scm_branch,
        autogenargs: node.attr("autogenargs").map(str::to_string),
        deps,
    })
}

fn dep_ids(dependencies: &Element) -> Vec<String> {
    dependencies
        .elements()
        .filter(|e| e.name == "dep")
        .map(|e| e.attr("package").unwrap_or_default().to_string())
        .collect()
}
