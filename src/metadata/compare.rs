//! Difference engine: compare a track's tags against the values implied
//! by its place in the directory tree
//!
//! Each tag dialect has its own notion of "equal". Names are compared
//! case-insensitively, and a character that cannot appear in a file name
//! matches whatever the file name used in its place. v1 names are also cut
//! to what a v1 field can hold.

use super::{Corrections, TrackMetadata};
use crate::tags::id3v1::MAX_NAME_LEN;
use crate::types::Source;

/// Characters that cannot appear in file names on common file systems
const ILLEGAL_FILENAME_CHARS: &[char] = &['\\', '/', ':', '*', '?', '"', '<', '>', '|'];

const V1_CATCH_ALL_GENRE: &str = "other";

/// The canonical values a track is checked against
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExternalValues {
    pub artist: String,
    pub album: String,
    pub title: String,
    pub track: u32,
    /// `None` when the album has no consensus genre
    pub genre: Option<String>,
    pub year: Option<String>,
    pub mcdi: Option<Vec<u8>>,
}

/// Compare a tag-stored name with its file-system counterpart
pub fn names_match(stored: &str, external: &str, source: Source) -> bool {
    let external: String = match source {
        Source::V1 => {
            let truncated: String = external.chars().take(MAX_NAME_LEN).collect();
            truncated.trim_end_matches(' ').to_string()
        }
        Source::V2 => external.to_string(),
    };
    let stored: Vec<char> = stored.trim_end_matches(' ').to_lowercase().chars().collect();
    let external: Vec<char> = external.to_lowercase().chars().collect();
    stored.len() == external.len()
        && stored
            .iter()
            .zip(&external)
            .all(|(s, e)| s == e || ILLEGAL_FILENAME_CHARS.contains(s))
}

pub fn genres_match(stored: &str, external: &str, source: Source) -> bool {
    match source {
        Source::V1 => {
            stored.to_lowercase() == external.to_lowercase()
                || stored.to_lowercase() == V1_CATCH_ALL_GENRE
        }
        Source::V2 => stored == external,
    }
}

/// Lenient year comparison.
///
/// Two empty years match; an empty year never matches a non-empty one.
/// Otherwise, after dropping a trailing `" (...)"` annotation from each
/// side, one must be a prefix of the other, so `"1968"` matches
/// `"1968 (2018)"` and `"1968-11-22"`.
pub fn years_match(stored: &str, external: &str) -> bool {
    match (stored.is_empty(), external.is_empty()) {
        (true, true) => true,
        (true, false) | (false, true) => false,
        (false, false) => {
            let stored = strip_annotation(stored);
            let external = strip_annotation(external);
            stored.starts_with(external) || external.starts_with(stored)
        }
    }
}

fn strip_annotation(year: &str) -> &str {
    let year = year.trim_end();
    if year.ends_with(')') {
        if let Some(open) = year.rfind(" (") {
            return &year[..open];
        }
    }
    year
}

/// Compare every readable tag of a track against `external`, recording
/// corrections and edit flags. Returns true when any tag differs.
pub fn reconcile(metadata: &mut TrackMetadata, external: &ExternalValues) -> bool {
    let mut differs = false;
    for source in Source::ALL {
        if metadata.error_cause(source).is_some() {
            continue;
        }
        let corrections = corrections_for(metadata, source, external);
        if !corrections.is_empty() {
            differs = true;
            metadata.correct(source, corrections);
            metadata.set_edit_required(source);
        }
    }
    differs
}

fn corrections_for(metadata: &TrackMetadata, source: Source, external: &ExternalValues) -> Corrections {
    let stored = metadata.original(source);
    let mut corrections = Corrections::default();

    // v1 cannot hold track numbers outside 1..=255
    let track_comparable = source == Source::V2 || (1..=255).contains(&external.track);
    if track_comparable && stored.track != external.track {
        corrections.track = Some(external.track);
    }
    if !names_match(&stored.title, &external.title, source) {
        corrections.title = Some(external.title.clone());
    }
    if !names_match(&stored.album, &external.album, source) {
        corrections.album = Some(external.album.clone());
    }
    if !names_match(&stored.artist, &external.artist, source) {
        corrections.artist = Some(external.artist.clone());
    }
    if let Some(genre) = &external.genre {
        if !genres_match(&stored.genre, genre, source) {
            corrections.genre = Some(genre.clone());
        }
    }
    if let Some(year) = &external.year {
        if !years_match(&stored.year, year) {
            corrections.year = Some(year.clone());
        }
    }
    if source == Source::V2 {
        if let Some(mcdi) = &external.mcdi {
            if &stored.mcdi != mcdi {
                corrections.mcdi = Some(mcdi.clone());
            }
        }
    }
    corrections
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metadata::TagFields;

    fn fields(artist: &str, album: &str, title: &str, track: u32) -> TagFields {
        TagFields {
            artist: artist.into(),
            album: album.into(),
            title: title.into(),
            genre: "Rock".into(),
            year: "1969".into(),
            track,
            mcdi: b"mcdi".to_vec(),
        }
    }

    fn external(artist: &str, album: &str, title: &str, track: u32) -> ExternalValues {
        ExternalValues {
            artist: artist.into(),
            album: album.into(),
            title: title.into(),
            track,
            genre: Some("Rock".into()),
            year: Some("1969".into()),
            mcdi: Some(b"mcdi".to_vec()),
        }
    }

    #[test]
    fn test_illegal_char_matches_substitute() {
        assert!(names_match("simple:name", "simple_name", Source::V2));
        assert!(names_match("Who? Me?", "Who_ Me_", Source::V2));
        assert!(!names_match("simple_name", "simple:name", Source::V2));
    }

    #[test]
    fn test_names_case_and_trailing_space() {
        assert!(names_match("Abbey Road  ", "abbey road", Source::V2));
        assert!(!names_match("Abbey Road", "Abbey Roads", Source::V2));
        assert!(!names_match("Abbey Road", "abbey road  ", Source::V2));
    }

    #[test]
    fn test_v1_name_truncation() {
        let long = "On Air: Live At The BBC, Volume 2";
        let stored = "On Air: Live At The BBC, Volum";
        assert!(names_match(stored, long, Source::V1));
        assert!(!names_match(stored, long, Source::V2));
    }

    #[test]
    fn test_v1_truncation_at_a_space() {
        // 30th character is a space, which a v1 field cannot keep
        let external = "Twenty-nine characters long.. and more";
        let stored = "Twenty-nine characters long..";
        assert!(names_match(stored, external, Source::V1));
    }

    #[test]
    fn test_genre_rules() {
        assert!(genres_match("rock", "Rock", Source::V1));
        assert!(genres_match("Other", "Progressive Trance", Source::V1));
        assert!(!genres_match("Pop", "Rock", Source::V1));
        assert!(!genres_match("rock", "Rock", Source::V2));
        assert!(!genres_match("Other", "Progressive Trance", Source::V2));
        assert!(genres_match("Rock", "Rock", Source::V2));
    }

    #[test]
    fn test_years_match() {
        assert!(years_match("1968", "1968 (2018)"));
        assert!(years_match("1968 (2018)", "1968"));
        assert!(years_match("1968", "1968-11-22"));
        assert!(!years_match("1968", ""));
        assert!(!years_match("", "1968"));
        assert!(years_match("", ""));
        assert!(!years_match("1968", "1969"));
    }

    #[test]
    fn test_reconcile_clean_track() {
        let mut metadata = TrackMetadata::default();
        metadata.set_fields(Source::V1, fields("Artist", "Album", "Song", 3));
        metadata.set_fields(Source::V2, fields("Artist", "Album", "Song", 3));
        assert!(!reconcile(&mut metadata, &external("Artist", "Album", "Song", 3)));
        assert!(!metadata.requires_edit());
    }

    #[test]
    fn test_reconcile_track_number() {
        let mut metadata = TrackMetadata::default();
        metadata.set_fields(Source::V1, fields("Artist", "Album", "Song", 29));
        metadata.set_fields(Source::V2, fields("Artist", "Album", "Song", 29));
        assert!(reconcile(&mut metadata, &external("Artist", "Album", "Song", 2)));
        for source in Source::ALL {
            assert!(metadata.edit_required(source));
            assert_eq!(metadata.corrections(source).track, Some(2));
            assert_eq!(metadata.corrections(source).title, None);
        }
    }

    #[test]
    fn test_reconcile_skips_errored_source() {
        let mut metadata = TrackMetadata::default();
        metadata.set_error(Source::V1, "no ID3V1 metadata found");
        metadata.set_fields(Source::V2, fields("Artist", "Album", "Song", 1));
        assert!(reconcile(&mut metadata, &external("Other Artist", "Album", "Song", 1)));
        assert!(!metadata.edit_required(Source::V1));
        assert_eq!(
            metadata.corrections(Source::V2).artist.as_deref(),
            Some("Other Artist")
        );
    }

    #[test]
    fn test_reconcile_without_consensus_fields() {
        let mut metadata = TrackMetadata::default();
        let mut stored = fields("Artist", "Album", "Song", 1);
        stored.genre = "Jazz".into();
        stored.year = "1950".into();
        metadata.set_fields(Source::V2, stored);
        metadata.set_error(Source::V1, "no ID3V1 metadata found");
        let mut ext = external("Artist", "Album", "Song", 1);
        ext.genre = None;
        ext.year = None;
        ext.mcdi = None;
        assert!(!reconcile(&mut metadata, &ext));
    }

    #[test]
    fn test_mcdi_only_checked_for_v2() {
        let mut metadata = TrackMetadata::default();
        metadata.set_fields(Source::V1, fields("Artist", "Album", "Song", 1));
        metadata.set_fields(Source::V2, fields("Artist", "Album", "Song", 1));
        let mut ext = external("Artist", "Album", "Song", 1);
        ext.mcdi = Some(b"other".to_vec());
        assert!(reconcile(&mut metadata, &ext));
        assert!(!metadata.edit_required(Source::V1));
        assert_eq!(metadata.corrections(Source::V2).mcdi, Some(b"other".to_vec()));
    }

    #[test]
    fn test_v1_skips_unrepresentable_track() {
        let mut metadata = TrackMetadata::default();
        metadata.set_fields(Source::V1, fields("Artist", "Album", "Song", 0));
        assert!(!reconcile(&mut metadata, &external("Artist", "Album", "Song", 300)));
    }

    #[test]
    fn test_edit_implies_correction_differs() {
        let mut metadata = TrackMetadata::default();
        metadata.set_fields(Source::V1, fields("A", "B", "C", 1));
        metadata.set_fields(Source::V2, fields("A", "B", "C", 1));
        let mut ext = external("X", "Y", "Z", 9);
        ext.genre = Some("Folk".into());
        ext.year = Some("2000".into());
        reconcile(&mut metadata, &ext);
        for source in Source::ALL {
            let stored = metadata.original(source);
            let fixed = metadata.corrections(source);
            assert!(metadata.edit_required(source));
            assert_ne!(fixed.artist.as_deref(), Some(stored.artist.as_str()));
            assert_ne!(fixed.year.as_deref(), Some(stored.year.as_str()));
            assert_ne!(fixed.track, Some(stored.track));
        }
    }
}
