//! Consensus resolver
//!
//! Picks album- and artist-wide canonical values by plurality vote over the
//! tracks' canonical metadata. A winner needs strictly more votes than every
//! other candidate; anything else is reported as [`NoConsensus`] and the
//! field is left without a canonical value.

use crate::metadata::compare::names_match;
use crate::metadata::{ExternalValues, TrackMetadata};
use crate::types::{AlbumId, ArtistId, Library, Source, TrackId};
use std::collections::BTreeMap;
use std::fmt;
use tracing::{debug, warn};

/// Vote counts for one field
#[derive(Debug, Clone)]
pub struct Tally<T: Ord> {
    counts: BTreeMap<T, usize>,
}

impl<T: Ord> Default for Tally<T> {
    fn default() -> Self {
        Self {
            counts: BTreeMap::new(),
        }
    }
}

impl<T: Ord + Clone> Tally<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, value: T) {
        *self.counts.entry(value).or_insert(0) += 1;
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    /// The value with strictly more votes than any other
    pub fn winner(&self) -> Option<&T> {
        let best = self.counts.values().copied().max()?;
        let mut leaders = self.counts.iter().filter(|(_, &n)| n == best);
        match (leaders.next(), leaders.next()) {
            (Some((value, _)), None) => Some(value),
            _ => None,
        }
    }

    /// Candidates rendered for a warning, in sorted order
    fn candidates(&self, render: impl Fn(&T) -> String) -> Vec<(String, usize)> {
        self.counts.iter().map(|(v, &n)| (render(v), n)).collect()
    }
}

impl<T: Ord + Clone> FromIterator<T> for Tally<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        let mut tally = Tally::new();
        for value in iter {
            tally.add(value);
        }
        tally
    }
}

/// A field for which no value won the vote
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NoConsensus {
    pub field: &'static str,
    /// `"album" by "artist"`, or just `"artist"`
    pub subject: String,
    pub candidates: Vec<(String, usize)>,
}

impl fmt::Display for NoConsensus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "There are multiple {} fields for {}, and there is no unambiguously preferred choice; candidates are {{",
            self.field, self.subject
        )?;
        for (i, (value, count)) in self.candidates.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{:?}: {} instances", value, count)?;
        }
        f.write_str("}.")
    }
}

fn text(value: &String) -> String {
    value.clone()
}

fn lossy(value: &Vec<u8>) -> String {
    String::from_utf8_lossy(value).into_owned()
}

/// Run the vote for one field; `None` when there were no votes or no winner
fn decide<T: Ord + Clone>(
    tally: &Tally<T>,
    field: &'static str,
    subject: &str,
    render: impl Fn(&T) -> String,
    failures: &mut Vec<NoConsensus>,
) -> Option<T> {
    if tally.is_empty() {
        return None;
    }
    match tally.winner() {
        Some(value) => Some(value.clone()),
        None => {
            let failure = NoConsensus {
                field,
                subject: subject.to_string(),
                candidates: tally.candidates(render),
            };
            warn!(field, subject, "{}", failure);
            failures.push(failure);
            None
        }
    }
}

fn valid_metadata<'a>(
    library: &'a Library,
    tracks: impl Iterator<Item = TrackId> + 'a,
) -> impl Iterator<Item = &'a TrackMetadata> + 'a {
    tracks.filter_map(move |id| library.track(id).metadata.as_ref().filter(|m| m.is_valid()))
}

fn non_empty(value: &str) -> Option<String> {
    (!value.is_empty()).then(|| value.to_string())
}

/// Vote on the artist name across every track of the artist
pub fn resolve_artist(library: &mut Library, artist: ArtistId) -> Vec<NoConsensus> {
    let tally: Tally<String> = valid_metadata(library, library.tracks_of_artist(artist))
        .filter_map(|m| m.canonical_artist().and_then(non_empty))
        .collect();
    let subject = format!("{:?}", library.artist(artist).name);
    let mut failures = Vec::new();
    let winner = decide(&tally, "artist name", &subject, text, &mut failures);
    debug!("Artist {} resolves to {:?}", subject, winner);
    library.artists[artist.0].canonical_name = winner;
    failures
}

/// Vote on album title, genre, year, and MCDI across the album's tracks
pub fn resolve_album(library: &mut Library, album: AlbumId) -> Vec<NoConsensus> {
    let mut titles = Tally::new();
    let mut genres = Tally::new();
    let mut years = Tally::new();
    let mut mcdis = Tally::new();
    let track_ids = library.album(album).tracks.clone();
    for metadata in valid_metadata(library, track_ids.into_iter()) {
        if let Some(title) = metadata.canonical_album().and_then(non_empty) {
            titles.add(title);
        }
        if let Some(genre) = metadata.canonical_genre().and_then(non_empty) {
            genres.add(genre);
        }
        if let Some(year) = metadata.canonical_year().and_then(non_empty) {
            years.add(year);
        }
        if let Some(mcdi) = metadata.canonical_mcdi().filter(|b| !b.is_empty()) {
            mcdis.add(mcdi.to_vec());
        }
    }

    let subject = format!(
        "{:?} by {:?}",
        library.album(album).name,
        library.artist_of(album).name
    );
    let mut failures = Vec::new();
    let title = decide(&titles, "album title", &subject, text, &mut failures);
    let genre = decide(&genres, "genre", &subject, text, &mut failures);
    let year = decide(&years, "year", &subject, text, &mut failures);
    let mcdi = decide(&mcdis, "MCDI frame", &subject, lossy, &mut failures);

    let canonical = &mut library.albums[album.0].canonical;
    canonical.title = title;
    canonical.genre = genre;
    canonical.year = year;
    canonical.mcdi = mcdi;
    failures
}

/// Resolve every artist, then every album
pub fn resolve_library(library: &mut Library) -> Vec<NoConsensus> {
    let mut failures = Vec::new();
    for artist in library.artist_ids().collect::<Vec<_>>() {
        failures.extend(resolve_artist(library, artist));
    }
    for album in library.album_ids().collect::<Vec<_>>() {
        failures.extend(resolve_album(library, album));
    }
    failures
}

/// The values a track is checked against.
///
/// A consensus artist or album name is preferred over the directory name
/// only when the two name-match, so a tag value holding a character the
/// file system cannot represent is not "corrected" to its substitute.
pub fn external_values(library: &Library, track: TrackId) -> ExternalValues {
    let entry = library.track(track);
    let album = library.album(entry.album);
    let artist = library.artist(album.artist);

    let prefer = |winner: Option<&String>, directory: &str| match winner {
        Some(name) if names_match(name, directory, Source::V2) => name.clone(),
        _ => directory.to_string(),
    };

    ExternalValues {
        artist: prefer(artist.canonical_name.as_ref(), &artist.name),
        album: prefer(album.canonical.title.as_ref(), &album.name),
        title: entry.name.clone(),
        track: entry.number,
        genre: album.canonical.genre.clone(),
        year: album.canonical.year.clone(),
        mcdi: album.canonical.mcdi.clone(),
    }
}
