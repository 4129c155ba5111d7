//! Metamodule expansion.
//!
//! Resolving an id yields the packages it stands for: a package id resolves
//! to itself, a metamodule to the packages of its members, nested
//! metamodules expanded in place. Each package appears once, at its first
//! position. A metamodule met again while it is still being expanded is
//! dropped with a [`SweepError::CyclicReference`] diagnostic, so resolution
//! always terminates.

use serde::{Serialize, Serializer};
use std::collections::HashSet;

use super::document::ModuleSetDocument;
use crate::core::SweepError;

/// Packages of a resolved id plus what was skipped on the way.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Resolution {
    pub packages: Vec<String>,
    #[serde(serialize_with = "serialize_diagnostics")]
    pub diagnostics: Vec<SweepError>,
}

fn serialize_diagnostics<S: Serializer>(diagnostics: &[SweepError], s: S) -> Result<S::Ok, S::Error> {
    s.collect_seq(diagnostics.iter().map(ToString::to_string))
}

#[derive(Default)]
struct Walk {
    /// Metamodules being expanded, outermost first
    in_progress: Vec<String>,
    active: HashSet<String>,
    done: HashSet<String>,
    resolution: Resolution,
}

impl Walk {
    /// Expands `id` with an explicit stack of `(members, next member)` frames,
    /// one per metamodule being expanded.
    fn expand<'d>(&mut self, document: &'d ModuleSetDocument, id: &str) {
        let mut frames: Vec<(&'d [String], usize)> = Vec::new();
        if let Some(members) = self.enter(document, id) {
            frames.push((members, 0));
        }

        while let Some(frame) = frames.last_mut() {
            let (members, next) = *frame;
            if let Some(member) = members.get(next) {
                frame.1 += 1;
                if let Some(nested) = self.enter(document, member) {
                    frames.push((nested, 0));
                }
            } else {
                frames.pop();
                if let Some(finished) = self.in_progress.pop() {
                    self.active.remove(&finished);
                    self.done.insert(finished);
                }
            }
        }
    }

    /// Handles `id` as met during expansion. Returns the members of a
    /// metamodule that has to be expanded now.
    fn enter<'d>(&mut self, document: &'d ModuleSetDocument, id: &str) -> Option<&'d [String]> {
        if document.has_package(id) {
            if self.done.insert(id.to_string()) {
                self.resolution.packages.push(id.to_string());
            }
            return None;
        }

        let Some(members) = document.metamodule(id) else {
            tracing::debug!(target: "moduleset", "Unknown module id '{id}'");
            self.resolution.diagnostics.push(SweepError::Other {
                message: format!("Unknown module id '{id}'"),
            });
            return None;
        };

        if self.done.contains(id) {
            return None;
        }
        if self.active.contains(id) {
            let mut path = self.in_progress.clone();
            path.push(id.to_string());
            let error = SweepError::CyclicReference {
                id: id.to_string(),
                path,
            };
            tracing::warn!(target: "moduleset", "{error}");
            self.resolution.diagnostics.push(error);
            return None;
        }

        self.in_progress.push(id.to_string());
        self.active.insert(id.to_string());
        Some(members)
    }
}

/// Resolves one package or metamodule id.
pub fn resolve(document: &ModuleSetDocument, id: &str) -> Resolution {
    resolve_all(document, [id])
}

/// Resolves several ids into one package list, in order.
pub fn resolve_all<'a>(
    document: &ModuleSetDocument,
    ids: impl IntoIterator<Item = &'a str>,
) -> Resolution {
    let mut walk = Walk::default();
    for id in ids {
        walk.expand(document, id);
    }
    walk.resolution
}

/// Resolves the implicit group of the top-level file.
pub fn resolve_default(document: &ModuleSetDocument) -> Resolution {
    resolve(document, &document.default_group())
}
