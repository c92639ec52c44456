use std::path::{Path, PathBuf};

use crate::error::CatalogError;

/// Immutable description of a playable track.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackMetadata {
    /// Unique key within a catalog.
    pub id: String,
    pub title: String,
    pub artist: Option<String>,
    pub album: Option<String>,
    pub genre: Option<String>,
    pub duration_ms: u64,
    /// Location of cover art, if the catalog found any.
    pub artwork: Option<PathBuf>,
}

impl TrackMetadata {
    /// A metadata record with only an id and a title.
    pub fn new(id: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            artist: None,
            album: None,
            genre: None,
            duration_ms: 0,
            artwork: None,
        }
    }

    /// "Artist - Title", or just the title when the artist is unknown.
    pub fn display(&self) -> String {
        match self.artist.as_deref().map(str::trim) {
            Some(a) if !a.is_empty() => format!("{} - {}", a, self.title),
            _ => self.title.clone(),
        }
    }
}

/// Opaque reference to the media a decoder should open.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SourceLocator(PathBuf);

impl SourceLocator {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self(path.into())
    }

    pub fn path(&self) -> &Path {
        &self.0
    }
}

/// Lookup service consumed by the playback engine.
pub trait Catalog: Send + Sync {
    /// Resolve full metadata for `id`.
    fn metadata(&self, id: &str) -> Result<TrackMetadata, CatalogError>;

    /// Resolve the source the decoder should open for `id`.
    fn source(&self, id: &str) -> Result<SourceLocator, CatalogError>;

    /// First track matching a free-text query, if the catalog supports search.
    fn search(&self, _query: &str) -> Option<TrackMetadata> {
        None
    }
}
