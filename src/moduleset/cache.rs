//! Parsed module-set cache.
//!
//! Parsing a module set (and every file it includes) is the expensive part of
//! resolution, so documents are kept per top-level path for the lifetime of a
//! run. Entries are immutable once inserted; a reload replaces the entry.

use dashmap::DashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use super::document::ModuleSetDocument;
use crate::core::SweepError;

/// Concurrent map of parsed module-set documents keyed by absolute path.
#[derive(Debug, Default, Clone)]
pub struct ModuleSetCache {
    documents: Arc<DashMap<PathBuf, Arc<ModuleSetDocument>>>,
}

impl ModuleSetCache {
    pub fn new() -> Self {
        Self::default()
    }

    fn key(path: &Path) -> PathBuf {
        std::path::absolute(path).unwrap_or_else(|_| path.to_path_buf())
    }

    /// The cached document for `path`, parsing it on first use.
    ///
    /// # Errors
    ///
    /// Whatever [`ModuleSetDocument::load`] returns; nothing is cached then.
    pub fn get_or_load(&self, path: &Path) -> Result<Arc<ModuleSetDocument>, SweepError> {
        let key = Self::key(path);
        if let Some(document) = self.documents.get(&key) {
            tracing::trace!(target: "moduleset", "Cache hit for {}", key.display());
            return Ok(Arc::clone(&document));
        }
        self.reload(&key)
    }

    /// Parses `path` again and replaces the cached entry.
    pub fn reload(&self, path: &Path) -> Result<Arc<ModuleSetDocument>, SweepError> {
        let key = Self::key(path);
        tracing::debug!(target: "moduleset", "Loading {}", key.display());
        let document = Arc::new(ModuleSetDocument::load(&key)?);
        self.documents.insert(key, Arc::clone(&document));
        Ok(document)
    }

    pub fn invalidate(&self, path: &Path) {
        self.documents.remove(&Self::key(path));
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }
}
