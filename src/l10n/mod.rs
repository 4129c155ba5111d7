//! Translation pipeline: templates, catalog merges, and domains
//!
//! The pieces run in a fixed order per domain: the template is rebuilt or
//! confirmed fresh by the [`TemplateCache`] before the [`MergeEngine`] merges
//! any catalog against it.

pub mod catalog;
pub mod domain;
pub mod merge;
pub mod template;

pub use catalog::{Catalog, CatalogStats, Message, MessageCounts};
pub use domain::{
    DomainReport, HelpDomain, IntltoolDomain, makefile_gettext_package, parse_linguas,
    resolve_gettext_package,
};
pub use merge::{MergeEngine, MergeRecord};
pub use template::{TemplateArtifact, TemplateCache, TemplateJob, TemplateSource, content_hash};

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;

/// Persisted translation state of a sweep.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct L10nState {
    #[serde(default)]
    pub templates: TemplateCache,

    #[serde(default)]
    pub merges: MergeEngine,

    /// Language lists read from `LINGUAS` files, keyed by file
    #[serde(default)]
    languages: BTreeMap<PathBuf, Vec<String>>,
}
