//! Library scanning
//!
//! The music root holds one directory per artist, each artist one directory
//! per album, and each album the track files, named like `03 Song.mp3`.

use crate::backup::BACKUP_DIR_NAME;
use crate::error::{RepairError, Result};
use crate::types::Library;
use std::path::Path;
use tracing::{debug, info, warn};
use walkdir::{DirEntry, WalkDir};

/// Build the cohort for everything under `top_dir`
pub fn scan(top_dir: &Path, extension: &str) -> Result<Library> {
    if !top_dir.is_dir() {
        return Err(RepairError::ConfigError(format!(
            "music directory {} does not exist or is not a directory",
            top_dir.display()
        )));
    }

    let mut library = Library::new();
    for artist_entry in subdirectories(top_dir) {
        let artist = library.add_artist(entry_name(&artist_entry), artist_entry.path());
        for album_entry in subdirectories(artist_entry.path()) {
            if entry_name(&album_entry) == BACKUP_DIR_NAME {
                continue;
            }
            let album = library.add_album(artist, entry_name(&album_entry), album_entry.path());
            for file in children(album_entry.path()).filter(|e| e.file_type().is_file()) {
                let path = file.path();
                if !has_extension(path, extension) {
                    continue;
                }
                match parse_track_file_name(&entry_name(&file), extension) {
                    Some((number, name)) => {
                        debug!("Discovered: {}", path.display());
                        library.add_track(album, number, name, path);
                    }
                    None => warn!(
                        "Skipping {}: file name does not start with a track number",
                        path.display()
                    ),
                }
            }
        }
    }

    info!(
        "Discovered {} tracks in {} albums by {} artists",
        library.tracks.len(),
        library.albums.len(),
        library.artists.len()
    );
    if library.is_empty() {
        warn!("No tracks found in {}", top_dir.display());
    }
    Ok(library)
}

fn children(dir: &Path) -> impl Iterator<Item = DirEntry> {
    WalkDir::new(dir)
        .min_depth(1)
        .max_depth(1)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|e| match e {
            Ok(entry) => Some(entry),
            Err(err) => {
                warn!("Cannot read directory entry: {}", err);
                None
            }
        })
}

fn subdirectories(dir: &Path) -> impl Iterator<Item = DirEntry> {
    children(dir).filter(|e| e.file_type().is_dir())
}

fn entry_name(entry: &DirEntry) -> String {
    entry.file_name().to_string_lossy().into_owned()
}

fn has_extension(path: &Path, extension: &str) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| e.eq_ignore_ascii_case(extension))
        .unwrap_or(false)
}

/// Split `"03 - Song Title.mp3"` into `(3, "Song Title")`
pub fn parse_track_file_name(file_name: &str, extension: &str) -> Option<(u32, String)> {
    let suffix_len = extension.len() + 1;
    let stem = if file_name.len() > suffix_len
        && file_name.is_char_boundary(file_name.len() - suffix_len)
    {
        let (stem, suffix) = file_name.split_at(file_name.len() - suffix_len);
        if suffix.starts_with('.') && suffix[1..].eq_ignore_ascii_case(extension) {
            stem
        } else {
            return None;
        }
    } else {
        return None;
    };

    let digits_end = stem.find(|c: char| !c.is_ascii_digit())?;
    if digits_end == 0 {
        return None;
    }
    let number: u32 = stem[..digits_end].parse().ok()?;
    let rest = &stem[digits_end..];
    let rest = rest.strip_prefix(&[' ', '-', '.'][..])?;
    let name = rest.trim_start_matches(&[' ', '-'][..]);
    if name.is_empty() {
        return None;
    }
    Some((number, name.to_string()))
}
