//! blip-sweep - incremental sweeps of a GNOME source tree
//!
//! The crate rebuilds the derived artifacts of a documentation and
//! translation statistics site, doing only the work whose inputs changed:
//!
//! - translation templates are regenerated once per directory and epoch, and
//!   language catalogs are merged against them only when the catalog or the
//!   template content changed;
//! - Mallard pages are scanned into a topic link graph that is rendered with
//!   `dot` only when its edges changed;
//! - jhbuild module sets are parsed once and resolved into package lists.
//!
//! # Architecture Overview
//!
//! Every unit of work is gated by the [`stamps::StampStore`], which compares
//! a file's modification time and size with what was recorded after the last
//! successful processing. Work that fails records nothing, so the next run
//! retries it. Failures stay attached to the unit they belong to
//! ([`core::Outcome`]); a broken page or catalog never stops its siblings.
//!
//! # Core Modules
//!
//! - [`core`] - Error types, [`core::Outcome`], [`core::Localized`], build variables
//! - [`config`] - The `~/.blip/sweep.toml` configuration
//! - [`stamps`] - Per-file staleness oracle
//! - [`tool`] - Invocation of `intltool-update`, `xml2po`, `msgmerge` and `dot`
//! - [`l10n`] - Template cache, merge engine and translation domains
//! - [`xml`] - Namespace-aware element tree used by the document parsers
//! - [`doc`] - Mallard pages, DocBook documents, credits and link graphs
//! - [`moduleset`] - jhbuild module-set parsing, resolution and dependency graphs
//! - [`state`] - Persisted run state, its lock and the per-invocation run
//! - [`cli`] - The `blip-sweep` command line
//!
//! # Example
//!
//! ```rust,no_run
//! use blip_sweep::config::SweepConfig;
//! use blip_sweep::doc::MallardUnit;
//! use blip_sweep::state::SweepRun;
//! use std::path::Path;
//!
//! # async fn example() -> anyhow::Result<()> {
//! let config = SweepConfig::load_with_optional(None).await?;
//! let mut run = SweepRun::open(&config).await?;
//!
//! let unit = MallardUnit::discover("gedit", Path::new("help/C"), Some("3.38"));
//! let outcome = run.sweep_mallard(&unit).await;
//! if let Some(error) = outcome.error() {
//!     eprintln!("gedit help: {error}");
//! }
//!
//! run.finish()?;
//! # Ok(())
//! # }
//! ```

pub mod cli;
pub mod config;
pub mod constants;
pub mod core;
pub mod doc;
pub mod l10n;
pub mod moduleset;
pub mod stamps;
pub mod state;
pub mod tool;
pub mod utils;
pub mod xml;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;
