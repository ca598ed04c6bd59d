//! Core data types for mp3repair
//!
//! The cohort (artists, albums, tracks) is stored as flat tables owned by
//! [`Library`]. Back references are plain ids, so a track never owns its
//! album and an album never owns its artist.

use crate::metadata::TrackMetadata;
use serde::Serialize;
use std::ops::{Index, IndexMut};
use std::path::PathBuf;

// =============================================================================
// Tag sources
// =============================================================================

/// One of the two tag dialects stored in an MP3 file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum Source {
    V1,
    V2,
}

impl Source {
    /// Both sources, in reporting order
    pub const ALL: [Source; 2] = [Source::V1, Source::V2];
}

/// A pair of values, one per tag source
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ByTag<T> {
    pub v1: T,
    pub v2: T,
}

impl<T> ByTag<T> {
    /// Iterate `(source, value)` pairs in reporting order
    pub fn iter(&self) -> impl Iterator<Item = (Source, &T)> {
        [(Source::V1, &self.v1), (Source::V2, &self.v2)].into_iter()
    }
}

impl<T> Index<Source> for ByTag<T> {
    type Output = T;

    fn index(&self, source: Source) -> &T {
        match source {
            Source::V1 => &self.v1,
            Source::V2 => &self.v2,
        }
    }
}

impl<T> IndexMut<Source> for ByTag<T> {
    fn index_mut(&mut self, source: Source) -> &mut T {
        match source {
            Source::V1 => &mut self.v1,
            Source::V2 => &mut self.v2,
        }
    }
}

// =============================================================================
// Cohort
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ArtistId(pub usize);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct AlbumId(pub usize);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TrackId(pub usize);

/// A recording artist: one directory under the music root
#[derive(Debug, Clone)]
pub struct Artist {
    /// Directory name
    pub name: String,
    pub path: PathBuf,
    pub albums: Vec<AlbumId>,
    /// Consensus artist name from the tracks' metadata, when there is one
    pub canonical_name: Option<String>,
}

/// Album-wide values chosen by consensus across the album's tracks
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AlbumCanonicals {
    pub title: Option<String>,
    pub genre: Option<String>,
    pub year: Option<String>,
    pub mcdi: Option<Vec<u8>>,
}

/// An album: one directory under an artist directory
#[derive(Debug, Clone)]
pub struct Album {
    /// Directory name
    pub name: String,
    pub path: PathBuf,
    pub artist: ArtistId,
    pub tracks: Vec<TrackId>,
    pub canonical: AlbumCanonicals,
}

/// One MP3 file inside an album directory
#[derive(Debug, Clone)]
pub struct Track {
    /// Track number parsed from the file name
    pub number: u32,
    /// Track name parsed from the file name
    pub name: String,
    /// File name on disk, including extension
    pub file_name: String,
    pub path: PathBuf,
    pub album: AlbumId,
    /// Populated by the read phase
    pub metadata: Option<TrackMetadata>,
}

/// The full cohort for one command invocation
#[derive(Debug, Clone, Default)]
pub struct Library {
    pub artists: Vec<Artist>,
    pub albums: Vec<Album>,
    pub tracks: Vec<Track>,
}

impl Library {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_artist(&mut self, name: impl Into<String>, path: impl Into<PathBuf>) -> ArtistId {
        let id = ArtistId(self.artists.len());
        self.artists.push(Artist {
            name: name.into(),
            path: path.into(),
            albums: Vec::new(),
            canonical_name: None,
        });
        id
    }

    pub fn add_album(
        &mut self,
        artist: ArtistId,
        name: impl Into<String>,
        path: impl Into<PathBuf>,
    ) -> AlbumId {
        let id = AlbumId(self.albums.len());
        self.albums.push(Album {
            name: name.into(),
            path: path.into(),
            artist,
            tracks: Vec::new(),
            canonical: AlbumCanonicals::default(),
        });
        self.artists[artist.0].albums.push(id);
        id
    }

    pub fn add_track(
        &mut self,
        album: AlbumId,
        number: u32,
        name: impl Into<String>,
        path: impl Into<PathBuf>,
    ) -> TrackId {
        let id = TrackId(self.tracks.len());
        let path = path.into();
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        self.tracks.push(Track {
            number,
            name: name.into(),
            file_name,
            path,
            album,
            metadata: None,
        });
        self.albums[album.0].tracks.push(id);
        id
    }

    pub fn artist(&self, id: ArtistId) -> &Artist {
        &self.artists[id.0]
    }

    pub fn album(&self, id: AlbumId) -> &Album {
        &self.albums[id.0]
    }

    pub fn track(&self, id: TrackId) -> &Track {
        &self.tracks[id.0]
    }

    pub fn track_mut(&mut self, id: TrackId) -> &mut Track {
        &mut self.tracks[id.0]
    }

    /// The album a track belongs to
    pub fn album_of(&self, track: TrackId) -> &Album {
        self.album(self.track(track).album)
    }

    /// The artist an album belongs to
    pub fn artist_of(&self, album: AlbumId) -> &Artist {
        self.artist(self.album(album).artist)
    }

    /// All tracks of an artist, across its albums, in cohort order
    pub fn tracks_of_artist(&self, artist: ArtistId) -> impl Iterator<Item = TrackId> + '_ {
        self.artist(artist)
            .albums
            .iter()
            .flat_map(move |album| self.album(*album).tracks.iter().copied())
    }

    pub fn artist_ids(&self) -> impl Iterator<Item = ArtistId> {
        (0..self.artists.len()).map(ArtistId)
    }

    pub fn album_ids(&self) -> impl Iterator<Item = AlbumId> {
        (0..self.albums.len()).map(AlbumId)
    }

    pub fn track_ids(&self) -> impl Iterator<Item = TrackId> {
        (0..self.tracks.len()).map(TrackId)
    }

    pub fn is_empty(&self) -> bool {
        self.tracks.is_empty()
    }
}
