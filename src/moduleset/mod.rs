//! jhbuild module sets
//!
//! A module set declares repositories, buildable packages and metamodules
//! (named groups), possibly spread over several files joined by `include`.
//! [`ModuleSetDocument`] holds one parsed set, [`resolve`] expands an id into
//! the packages it stands for, and [`PackageGraph`] answers what a package
//! depends on.

pub mod cache;
pub mod document;
pub mod graph;
pub mod resolve;

pub use cache::ModuleSetCache;
pub use document::{ModuleSetDocument, Package, Repository, default_branch};
pub use graph::{Dependency, PackageGraph, dependency_closure};
pub use resolve::{Resolution, resolve, resolve_all, resolve_default};
