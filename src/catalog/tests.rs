use std::fs;
use std::path::{Path, PathBuf};

use tempfile::tempdir;

use super::scan::media_id;
use super::*;
use crate::config::LibrarySettings;
use crate::error::CatalogError;

fn meta(id: &str, title: &str, artist: Option<&str>) -> TrackMetadata {
    let mut m = TrackMetadata::new(id, title);
    m.artist = artist.map(str::to_string);
    m
}

fn sample() -> LibraryCatalog {
    LibraryCatalog::from_entries(vec![
        (
            meta("jazz_in_paris", "Jazz in Paris", Some("Media Right Productions")),
            PathBuf::from("/music/jazz_in_paris.mp3"),
        ),
        (
            meta("coldest_shoulder", "The Coldest Shoulder", Some("The 126ers")),
            PathBuf::from("/music/the_coldest_shoulder.mp3"),
        ),
    ])
}

#[test]
fn metadata_and_source_resolve_known_ids() {
    let catalog = sample();
    let m = catalog.metadata("jazz_in_paris").unwrap();
    assert_eq!(m.title, "Jazz in Paris");
    assert_eq!(
        catalog.source("jazz_in_paris").unwrap().path(),
        Path::new("/music/jazz_in_paris.mp3")
    );
}

#[test]
fn unknown_id_is_not_found() {
    let catalog = sample();
    assert_eq!(
        catalog.metadata("nope"),
        Err(CatalogError::NotFound("nope".to_string()))
    );
    assert!(catalog.source("nope").is_err());
}

#[test]
fn items_are_ordered_by_id() {
    let catalog = sample();
    let ids: Vec<&str> = catalog.items().map(|m| m.id.as_str()).collect();
    assert_eq!(ids, vec!["coldest_shoulder", "jazz_in_paris"]);
    assert_eq!(catalog.root(), "root");
}

#[test]
fn search_matches_title_or_artist_case_insensitive() {
    let catalog = sample();
    assert_eq!(catalog.search("PARIS").unwrap().id, "jazz_in_paris");
    assert_eq!(catalog.search("126ers").unwrap().id, "coldest_shoulder");
    assert!(catalog.search("polka").is_none());
    assert!(catalog.search("   ").is_none());
}

#[test]
fn display_prefers_artist_dash_title() {
    assert_eq!(meta("a", "Song", Some("Artist")).display(), "Artist - Song");
    assert_eq!(meta("a", "Song", Some("   ")).display(), "Song");
    assert_eq!(meta("a", "Song", None).display(), "Song");
}

#[test]
fn media_id_is_root_relative_with_forward_slashes() {
    let root = Path::new("/music");
    assert_eq!(media_id(root, &root.join("a").join("b.mp3")), "a/b.mp3");
    assert_eq!(media_id(root, &root.join("c.flac")), "c.flac");
}

#[test]
fn scan_filters_non_audio_and_falls_back_to_file_stem() {
    let dir = tempdir().unwrap();
    fs::create_dir(dir.path().join("album")).unwrap();

    fs::write(dir.path().join("b.MP3"), b"not a real mp3").unwrap();
    fs::write(dir.path().join("album").join("A.ogg"), b"not a real ogg").unwrap();
    fs::write(dir.path().join("album").join("cover.jpg"), b"jpeg").unwrap();
    fs::write(dir.path().join("c.txt"), b"ignore me").unwrap();
    fs::write(dir.path().join(".hidden.mp3"), b"hidden").unwrap();

    let catalog = scan(dir.path(), &LibrarySettings::default());
    assert_eq!(catalog.len(), 2);

    let ids: Vec<&str> = catalog.ids().collect();
    assert_eq!(ids, vec!["album/A.ogg", "b.MP3"]);

    let a = catalog.metadata("album/A.ogg").unwrap();
    assert_eq!(a.title, "A");
    assert_eq!(a.artwork, Some(dir.path().join("album").join("cover.jpg")));
    assert_eq!(catalog.metadata("b.MP3").unwrap().artwork, None);
}

#[test]
fn scan_non_recursive_stays_in_root() {
    let dir = tempdir().unwrap();
    fs::create_dir(dir.path().join("sub")).unwrap();
    fs::write(dir.path().join("top.wav"), b"x").unwrap();
    fs::write(dir.path().join("sub").join("deep.wav"), b"x").unwrap();

    let settings = LibrarySettings {
        recursive: false,
        ..LibrarySettings::default()
    };
    let catalog = scan(dir.path(), &settings);
    let ids: Vec<&str> = catalog.ids().collect();
    assert_eq!(ids, vec!["top.wav"]);
}
