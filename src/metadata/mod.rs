//! Unified metadata model
//!
//! A [`TrackMetadata`] holds both tag views of one file side by side:
//! what each tag says, what each tag should say, why a tag could not be
//! read, and whether a tag needs rewriting.

pub mod compare;

use crate::error::{RepairError, Result};
use crate::tags::genre::normalize_v2_genre;
use crate::tags::id3v2::{
    format_track_number, parse_track_number, FRAME_ALBUM, FRAME_ARTIST, FRAME_GENRE, FRAME_MCDI,
    FRAME_RECORDING_TIME, FRAME_TITLE, FRAME_TRACK, FRAME_YEAR,
};
use crate::tags::{read_tags, FileTags, Id3v1Tag, Id3v2Tag};
use crate::types::{ByTag, Source};
use serde::Serialize;
use std::path::Path;
use tracing::warn;

pub use compare::{reconcile, ExternalValues};

/// Field values as stored in one tag
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TagFields {
    pub artist: String,
    pub album: String,
    pub title: String,
    pub genre: String,
    pub year: String,
    /// 0 when absent
    pub track: u32,
    /// MCDI frame body; always empty for v1
    #[serde(skip)]
    pub mcdi: Vec<u8>,
}

impl TagFields {
    pub fn from_v1(tag: &Id3v1Tag) -> Self {
        Self {
            artist: tag.artist(),
            album: tag.album(),
            title: tag.title(),
            genre: tag.genre().unwrap_or_default().to_string(),
            year: tag.year_text(),
            track: tag.track().map(u32::from).unwrap_or(0),
            mcdi: Vec::new(),
        }
    }

    /// Fails when a frame cannot be decoded or `TRCK` is malformed
    pub fn from_v2(tag: &Id3v2Tag) -> Result<Self> {
        let text = |id: &str| -> Result<String> { Ok(tag.text(id)?.unwrap_or_default()) };
        let track = parse_track_number(&text(FRAME_TRACK)?)?;
        let year = match tag.text(FRAME_YEAR)? {
            Some(year) => year,
            None => text(FRAME_RECORDING_TIME)?,
        };
        Ok(Self {
            artist: text(FRAME_ARTIST)?,
            album: text(FRAME_ALBUM)?,
            title: text(FRAME_TITLE)?,
            genre: normalize_v2_genre(&text(FRAME_GENRE)?),
            year,
            track,
            mcdi: tag.binary(FRAME_MCDI)?.unwrap_or_default(),
        })
    }
}

/// A field that can disagree with the directory layout, in reporting order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Field {
    Track,
    Title,
    Album,
    Artist,
    Genre,
    Year,
    Mcdi,
}

impl Field {
    pub const ALL: [Field; 7] = [
        Field::Track,
        Field::Title,
        Field::Album,
        Field::Artist,
        Field::Genre,
        Field::Year,
        Field::Mcdi,
    ];

    pub fn description(self) -> &'static str {
        match self {
            Field::Track => "track number",
            Field::Title => "track name",
            Field::Album => "album name",
            Field::Artist => "artist name",
            Field::Genre => "album genre",
            Field::Year => "album year",
            Field::Mcdi => "MCDI frame",
        }
    }
}

/// Values a tag should hold; `None` leaves the field alone
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Corrections {
    pub artist: Option<String>,
    pub album: Option<String>,
    pub title: Option<String>,
    pub genre: Option<String>,
    pub year: Option<String>,
    pub track: Option<u32>,
    #[serde(skip)]
    pub mcdi: Option<Vec<u8>>,
}

impl Corrections {
    pub fn is_empty(&self) -> bool {
        *self == Corrections::default()
    }

    pub fn has(&self, field: Field) -> bool {
        match field {
            Field::Track => self.track.is_some(),
            Field::Title => self.title.is_some(),
            Field::Album => self.album.is_some(),
            Field::Artist => self.artist.is_some(),
            Field::Genre => self.genre.is_some(),
            Field::Year => self.year.is_some(),
            Field::Mcdi => self.mcdi.is_some(),
        }
    }

    /// The corrected value rendered for a difference report
    pub fn describe(&self, field: Field) -> Option<String> {
        match field {
            Field::Track => self.track.map(|n| n.to_string()),
            Field::Title => self.title.as_ref().map(|s| format!("{:?}", s)),
            Field::Album => self.album.as_ref().map(|s| format!("{:?}", s)),
            Field::Artist => self.artist.as_ref().map(|s| format!("{:?}", s)),
            Field::Genre => self.genre.as_ref().map(|s| format!("{:?}", s)),
            Field::Year => self.year.as_ref().map(|s| format!("{:?}", s)),
            Field::Mcdi => self
                .mcdi
                .as_ref()
                .map(|b| format!("{:?}", String::from_utf8_lossy(b))),
        }
    }

    /// Patch a v1 tag in place
    pub fn apply_to_v1(&self, tag: &mut Id3v1Tag) {
        if let Some(artist) = &self.artist {
            tag.set_artist(artist);
        }
        if let Some(album) = &self.album {
            tag.set_album(album);
        }
        if let Some(title) = &self.title {
            tag.set_title(title);
        }
        if let Some(genre) = &self.genre {
            tag.set_genre_or_other(genre);
        }
        if let Some(year) = &self.year {
            if year.is_empty() {
                tag.clear_year();
            } else {
                let leading: String = year.chars().take(4).collect();
                let applied = leading
                    .parse::<i32>()
                    .map(|y| tag.set_year(y))
                    .unwrap_or(false);
                if !applied {
                    warn!("Year {:?} cannot be stored in an ID3V1 tag", year);
                }
            }
        }
        if let Some(track) = self.track {
            let applied = i32::try_from(track).map(|n| tag.set_track(n)).unwrap_or(false);
            if !applied {
                warn!("Track number {} cannot be stored in an ID3V1 tag", track);
            }
        }
    }

    /// Replace the corrected frames of a v2 tag; all other frames stay as read
    pub fn apply_to_v2(&self, tag: &mut Id3v2Tag) {
        if let Some(artist) = &self.artist {
            tag.set_text(FRAME_ARTIST, artist);
        }
        if let Some(album) = &self.album {
            tag.set_text(FRAME_ALBUM, album);
        }
        if let Some(title) = &self.title {
            tag.set_text(FRAME_TITLE, title);
        }
        if let Some(genre) = &self.genre {
            tag.set_text(FRAME_GENRE, genre);
        }
        if let Some(year) = &self.year {
            if year.is_empty() {
                tag.remove(FRAME_YEAR);
                tag.remove(FRAME_RECORDING_TIME);
            } else {
                let uses_tyer = tag.frame(FRAME_YEAR).is_some() || tag.major_version() < 4;
                let id = if uses_tyer { FRAME_YEAR } else { FRAME_RECORDING_TIME };
                tag.set_text(id, year);
            }
        }
        if let Some(track) = self.track {
            let existing = tag.text(FRAME_TRACK).ok().flatten();
            tag.set_text(FRAME_TRACK, &format_track_number(existing.as_deref(), track));
        }
        if let Some(mcdi) = &self.mcdi {
            tag.set_binary(FRAME_MCDI, mcdi);
        }
    }
}

/// How a track came out of reconciliation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TrackState {
    /// Neither tag could be read
    NoMetadata,
    /// One tag could not be read and the other needs edits
    PartialError,
    /// Nothing to change
    Clean,
    /// At least one tag needs edits
    NeedsEdit,
}

impl TrackState {
    pub fn needs_repair(self) -> bool {
        matches!(self, TrackState::PartialError | TrackState::NeedsEdit)
    }
}

/// Both tag views of one track
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TrackMetadata {
    original: ByTag<TagFields>,
    corrected: ByTag<Corrections>,
    error_cause: ByTag<Option<String>>,
    edit_required: ByTag<bool>,
    canonical: Option<Source>,
}

impl TrackMetadata {
    /// Build a record from the tags read out of a file
    pub fn from_tags(tags: FileTags) -> Self {
        let mut metadata = Self::default();
        match tags.v1 {
            Ok(tag) => metadata.set_fields(Source::V1, TagFields::from_v1(&tag)),
            Err(e) => metadata.set_error(Source::V1, e.to_string()),
        }
        match tags.v2.and_then(|tag| TagFields::from_v2(&tag)) {
            Ok(fields) => metadata.set_fields(Source::V2, fields),
            Err(e) => metadata.set_error(Source::V2, e.to_string()),
        }
        metadata
    }

    /// A record for a file that could not be read at all
    pub fn from_error(err: &RepairError) -> Self {
        let mut metadata = Self::default();
        for source in Source::ALL {
            metadata.set_error(source, err.to_string());
        }
        metadata
    }

    /// Read a file's tags into a new record; never fails
    pub fn read(path: &Path) -> Self {
        match read_tags(path) {
            Ok(tags) => Self::from_tags(tags),
            Err(e) => Self::from_error(&e),
        }
    }

    pub fn set_fields(&mut self, source: Source, fields: TagFields) {
        self.original[source] = fields;
        self.error_cause[source] = None;
        self.update_canonical();
    }

    pub fn set_error(&mut self, source: Source, cause: impl Into<String>) {
        self.original[source] = TagFields::default();
        self.error_cause[source] = Some(cause.into());
        self.update_canonical();
    }

    pub fn correct(&mut self, source: Source, corrections: Corrections) {
        self.corrected[source] = corrections;
    }

    pub fn set_edit_required(&mut self, source: Source) {
        self.edit_required[source] = true;
    }

    /// Forget all corrections, e.g. before reconciling again
    pub fn clear_corrections(&mut self) {
        self.corrected = ByTag::default();
        self.edit_required = ByTag::default();
    }

    fn update_canonical(&mut self) {
        self.canonical = if self.error_cause.v2.is_none() {
            Some(Source::V2)
        } else if self.error_cause.v1.is_none() {
            Some(Source::V1)
        } else {
            None
        };
    }

    pub fn original(&self, source: Source) -> &TagFields {
        &self.original[source]
    }

    pub fn corrections(&self, source: Source) -> &Corrections {
        &self.corrected[source]
    }

    pub fn error_cause(&self, source: Source) -> Option<&str> {
        self.error_cause[source].as_deref()
    }

    pub fn edit_required(&self, source: Source) -> bool {
        self.edit_required[source]
    }

    pub fn canonical_source(&self) -> Option<Source> {
        self.canonical
    }

    pub fn is_valid(&self) -> bool {
        self.canonical.is_some()
    }

    /// Non-empty error causes, v1 first
    pub fn error_causes(&self) -> Vec<&str> {
        self.error_cause.iter().filter_map(|(_, cause)| cause.as_deref()).collect()
    }

    fn canonical_fields(&self) -> Option<&TagFields> {
        self.canonical.map(|source| &self.original[source])
    }

    pub fn canonical_artist(&self) -> Option<&str> {
        self.canonical_fields().map(|f| f.artist.as_str())
    }

    pub fn canonical_album(&self) -> Option<&str> {
        self.canonical_fields().map(|f| f.album.as_str())
    }

    pub fn canonical_genre(&self) -> Option<&str> {
        self.canonical_fields().map(|f| f.genre.as_str())
    }

    pub fn canonical_year(&self) -> Option<&str> {
        self.canonical_fields().map(|f| f.year.as_str())
    }

    pub fn canonical_track(&self) -> Option<u32> {
        self.canonical_fields().map(|f| f.track)
    }

    pub fn canonical_mcdi(&self) -> Option<&[u8]> {
        self.canonical_fields().map(|f| f.mcdi.as_slice())
    }

    pub fn requires_edit(&self) -> bool {
        self.edit_required.v1 || self.edit_required.v2
    }

    pub fn state(&self) -> TrackState {
        if !self.is_valid() {
            TrackState::NoMetadata
        } else if !self.requires_edit() {
            TrackState::Clean
        } else if self.error_causes().is_empty() {
            TrackState::NeedsEdit
        } else {
            TrackState::PartialError
        }
    }

    /// One line per field that disagrees, in stable field order
    pub fn differences(&self) -> Vec<String> {
        Field::ALL
            .iter()
            .filter_map(|&field| {
                Source::ALL
                    .iter()
                    .find_map(|&source| self.corrected[source].describe(field))
                    .map(|value| {
                        format!("metadata does not agree with {} {}", field.description(), value)
                    })
            })
            .collect()
    }
}
