//! Read-through cache of parsed tags, keyed by path and modification time.

use std::{
    collections::{HashMap, HashSet},
    path::{Path, PathBuf},
    sync::{Arc, Mutex, PoisonError},
    time::SystemTime,
};

use log::debug;

use crate::metadata::{RawMetadata, error::MetadataError, extract_from_path};

struct CachedTag {
    modified: SystemTime,
    metadata: Arc<RawMetadata>,
}

/// Avoids re-parsing a file whose modification time has not changed.
/// Failed parses are not cached.
#[derive(Default)]
pub struct TagCache {
    entries: Mutex<HashMap<PathBuf, CachedTag>>,
}

impl TagCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get_or_parse(&self, path: &Path) -> Result<Arc<RawMetadata>, MetadataError> {
        let modified = std::fs::metadata(path)?.modified()?;

        if let Some(hit) = self.lookup(path, modified) {
            debug!("tag cache hit: {}", path.to_string_lossy());
            return Ok(hit);
        }

        // parse outside the lock, concurrent misses on the same file both parse
        let metadata = Arc::new(extract_from_path(path)?);
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(
                path.to_path_buf(),
                CachedTag {
                    modified,
                    metadata: Arc::clone(&metadata),
                },
            );
        Ok(metadata)
    }

    /// Drops entries for paths outside `live`, e.g. deleted or renamed files.
    pub fn retain(&self, live: &HashSet<&Path>) {
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        let before = entries.len();
        entries.retain(|path, _| live.contains(path.as_path()));
        if entries.len() < before {
            debug!("tag cache pruned {} entries", before - entries.len());
        }
    }

    fn lookup(&self, path: &Path, modified: SystemTime) -> Option<Arc<RawMetadata>> {
        let entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        entries
            .get(path)
            .filter(|cached| cached.modified == modified)
            .map(|cached| Arc::clone(&cached.metadata))
    }

    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}
