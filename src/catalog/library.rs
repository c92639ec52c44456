use std::collections::BTreeMap;
use std::path::PathBuf;

use crate::error::CatalogError;

use super::model::{Catalog, SourceLocator, TrackMetadata};

const ROOT_ID: &str = "root";

#[derive(Debug, Clone)]
struct Entry {
    metadata: TrackMetadata,
    path: PathBuf,
}

/// In-memory catalog keyed by media id, usually produced by [`super::scan`].
#[derive(Debug, Clone, Default)]
pub struct LibraryCatalog {
    entries: BTreeMap<String, Entry>,
}

impl LibraryCatalog {
    /// Build a catalog from `(metadata, file)` pairs. Later duplicates of an id win.
    pub fn from_entries(entries: impl IntoIterator<Item = (TrackMetadata, PathBuf)>) -> Self {
        let entries = entries
            .into_iter()
            .map(|(metadata, path)| (metadata.id.clone(), Entry { metadata, path }))
            .collect();
        Self { entries }
    }

    /// Id of the browsable root node.
    pub fn root(&self) -> &'static str {
        ROOT_ID
    }

    /// Every track, ordered by id.
    pub fn items(&self) -> impl Iterator<Item = &TrackMetadata> {
        self.entries.values().map(|e| &e.metadata)
    }

    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Catalog for LibraryCatalog {
    fn metadata(&self, id: &str) -> Result<TrackMetadata, CatalogError> {
        self.entries
            .get(id)
            .map(|e| e.metadata.clone())
            .ok_or_else(|| CatalogError::NotFound(id.to_string()))
    }

    fn source(&self, id: &str) -> Result<SourceLocator, CatalogError> {
        self.entries
            .get(id)
            .map(|e| SourceLocator::new(e.path.clone()))
            .ok_or_else(|| CatalogError::NotFound(id.to_string()))
    }

    fn search(&self, query: &str) -> Option<TrackMetadata> {
        let needle = query.trim().to_lowercase();
        if needle.is_empty() {
            return None;
        }
        let matches = |field: Option<&str>| {
            field
                .map(|v| v.to_lowercase().contains(&needle))
                .unwrap_or(false)
        };
        self.items()
            .find(|m| {
                matches(Some(&m.title)) || matches(m.artist.as_deref()) || matches(m.album.as_deref())
            })
            .cloned()
    }
}
