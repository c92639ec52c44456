use std::path::{Path, PathBuf};

use lofty::prelude::*;
use walkdir::WalkDir;

use crate::config::LibrarySettings;

use super::library::LibraryCatalog;
use super::model::TrackMetadata;

const COVER_NAMES: [&str; 4] = ["cover.jpg", "cover.png", "folder.jpg", "folder.png"];

fn is_audio_file(path: &Path, settings: &LibrarySettings) -> bool {
    let exts: Vec<String> = settings
        .extensions
        .iter()
        .map(|e| e.trim().trim_start_matches('.').to_ascii_lowercase())
        .filter(|e| !e.is_empty())
        .collect();

    path.extension()
        .and_then(|s| s.to_str())
        .map(|ext| {
            let ext = ext.to_ascii_lowercase();
            exts.iter().any(|e| e == &ext)
        })
        .unwrap_or(false)
}

fn is_hidden(path: &Path) -> bool {
    path.file_name()
        .and_then(|s| s.to_str())
        .map(|name| name.starts_with('.'))
        .unwrap_or(false)
}

/// Media id for `path`: its location relative to the scan root, `/`-separated.
pub(super) fn media_id(root: &Path, path: &Path) -> String {
    let rel = path.strip_prefix(root).unwrap_or(path);
    rel.components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

fn find_artwork(path: &Path) -> Option<PathBuf> {
    let dir = path.parent()?;
    COVER_NAMES
        .iter()
        .map(|name| dir.join(name))
        .find(|candidate| candidate.is_file())
}

fn non_blank(v: Option<std::borrow::Cow<'_, str>>) -> Option<String> {
    v.map(|s| s.trim().to_string()).filter(|s| !s.is_empty())
}

fn read_metadata(root: &Path, path: &Path) -> TrackMetadata {
    let title = path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("UNKNOWN")
        .to_string();
    let mut meta = TrackMetadata::new(media_id(root, path), title);
    meta.artwork = find_artwork(path);

    // Untagged or unreadable files still make it into the catalog with the
    // file stem as title.
    if let Ok(tagged) = lofty::read_from_path(path) {
        meta.duration_ms = tagged.properties().duration().as_millis() as u64;

        if let Some(tag) = tagged.primary_tag().or_else(|| tagged.first_tag()) {
            if let Some(t) = non_blank(tag.title()) {
                meta.title = t;
            }
            meta.artist = non_blank(tag.artist());
            meta.album = non_blank(tag.album());
            meta.genre = non_blank(tag.genre());
        }
    }

    meta
}

/// Walk `dir` and build a catalog of every audio file found.
pub fn scan(dir: &Path, settings: &LibrarySettings) -> LibraryCatalog {
    let mut entries: Vec<(TrackMetadata, PathBuf)> = Vec::new();

    let mut walker = WalkDir::new(dir).follow_links(settings.follow_links);

    // Non-recursive = only the root directory.
    let depth_cap = if settings.recursive {
        settings.max_depth
    } else {
        Some(1)
    };
    if let Some(d) = depth_cap {
        walker = walker.max_depth(d);
    }

    for entry in walker
        .into_iter()
        .filter_entry(|e| settings.include_hidden || e.depth() == 0 || !is_hidden(e.path()))
        .filter_map(Result::ok)
    {
        let path = entry.path();
        if path.is_file() && is_audio_file(path, settings) {
            entries.push((read_metadata(dir, path), path.to_path_buf()));
        }
    }

    tracing::info!(dir = %dir.display(), tracks = entries.len(), "library scanned");
    LibraryCatalog::from_entries(entries)
}
