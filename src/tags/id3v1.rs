//! ID3v1 trailer tag: 128 fixed bytes at the end of the file
//!
//! The tag is kept as its raw bytes; accessors decode fields on demand and
//! setters patch them in place, so an unedited tag serializes back to
//! exactly the bytes it was parsed from.

use super::genre::{genre_index, genre_name, OTHER_GENRE};
use super::text::{decode_latin1, encode_latin1};

/// Size of the tag in bytes
pub const TAG_LEN: usize = 128;

const MARKER: &[u8; 3] = b"TAG";

/// A field's byte range within the tag
#[derive(Debug, Clone, Copy)]
struct Field {
    offset: usize,
    len: usize,
}

const TITLE: Field = Field { offset: 3, len: 30 };
const ARTIST: Field = Field { offset: 33, len: 30 };
const ALBUM: Field = Field { offset: 63, len: 30 };
const YEAR: Field = Field { offset: 93, len: 4 };
const COMMENT: Field = Field { offset: 97, len: 28 };
const ZERO_BYTE: usize = 125;
const TRACK_BYTE: usize = 126;
const GENRE_BYTE: usize = 127;

/// Longest name a v1 text field can hold
pub const MAX_NAME_LEN: usize = 30;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Id3v1Tag {
    bytes: [u8; TAG_LEN],
}

impl Default for Id3v1Tag {
    fn default() -> Self {
        Self::new()
    }
}

impl Id3v1Tag {
    /// An empty tag: marker set, everything else zero
    pub fn new() -> Self {
        let mut bytes = [0u8; TAG_LEN];
        bytes[..3].copy_from_slice(MARKER);
        Self { bytes }
    }

    /// Parse a 128-byte block; `None` if it is not a v1 tag
    pub fn parse(bytes: &[u8]) -> Option<Self> {
        let bytes: [u8; TAG_LEN] = bytes.try_into().ok()?;
        if &bytes[..3] != MARKER {
            return None;
        }
        Some(Self { bytes })
    }

    pub fn to_bytes(&self) -> [u8; TAG_LEN] {
        self.bytes
    }

    pub fn title(&self) -> String {
        self.read_text(TITLE)
    }

    pub fn artist(&self) -> String {
        self.read_text(ARTIST)
    }

    pub fn album(&self) -> String {
        self.read_text(ALBUM)
    }

    pub fn comment(&self) -> String {
        self.read_text(COMMENT)
    }

    /// The year field as stored, blank when unset
    pub fn year_text(&self) -> String {
        self.read_text(YEAR)
    }

    /// The year as a number; `None` when blank or not numeric
    pub fn year(&self) -> Option<u16> {
        let text = self.year_text();
        if text.is_empty() || !text.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        text.parse().ok()
    }

    /// Track number, `None` when the zero byte is set or the track byte is 0
    pub fn track(&self) -> Option<u8> {
        if self.bytes[ZERO_BYTE] != 0 || self.bytes[TRACK_BYTE] == 0 {
            return None;
        }
        Some(self.bytes[TRACK_BYTE])
    }

    pub fn genre_index(&self) -> u8 {
        self.bytes[GENRE_BYTE]
    }

    /// Genre name, `None` when the byte is outside the table
    pub fn genre(&self) -> Option<&'static str> {
        genre_name(self.bytes[GENRE_BYTE])
    }

    pub fn set_title(&mut self, value: &str) {
        self.write_text(TITLE, value);
    }

    pub fn set_artist(&mut self, value: &str) {
        self.write_text(ARTIST, value);
    }

    pub fn set_album(&mut self, value: &str) {
        self.write_text(ALBUM, value);
    }

    /// Accepts 1000..=9999; anything else leaves the tag untouched
    pub fn set_year(&mut self, year: i32) -> bool {
        if !(1000..=9999).contains(&year) {
            return false;
        }
        self.write_text(YEAR, &year.to_string());
        true
    }

    /// Blank the year field
    pub fn clear_year(&mut self) {
        self.write_text(YEAR, "");
    }

    /// Accepts 1..=255; anything else leaves the tag untouched
    pub fn set_track(&mut self, track: i32) -> bool {
        let Ok(track) = u8::try_from(track) else {
            return false;
        };
        if track == 0 {
            return false;
        }
        self.bytes[ZERO_BYTE] = 0;
        self.bytes[TRACK_BYTE] = track;
        true
    }

    /// Case-insensitive table lookup; false (and untouched) when unknown
    pub fn set_genre(&mut self, name: &str) -> bool {
        match genre_index(name) {
            Some(index) => {
                self.bytes[GENRE_BYTE] = index;
                true
            }
            None => false,
        }
    }

    /// Set the genre, falling back to "Other" for names outside the table
    pub fn set_genre_or_other(&mut self, name: &str) {
        if !self.set_genre(name) {
            self.bytes[GENRE_BYTE] = OTHER_GENRE;
        }
    }

    /// Human-readable dump of the six reconciled fields
    pub fn diagnostics(&self) -> Vec<String> {
        let track = match self.track() {
            Some(n) => n.to_string(),
            None => "none".to_string(),
        };
        let genre = match self.genre() {
            Some(g) => format!("{:?}", g),
            None => format!("unknown ({})", self.genre_index()),
        };
        vec![
            format!("Artist: {:?}", self.artist()),
            format!("Album: {:?}", self.album()),
            format!("Title: {:?}", self.title()),
            format!("Track: {}", track),
            format!("Year: {:?}", self.year_text()),
            format!("Genre: {}", genre),
        ]
    }

    fn read_text(&self, field: Field) -> String {
        let raw = &self.bytes[field.offset..field.offset + field.len];
        let end = raw.iter().position(|&b| b == 0).unwrap_or(raw.len());
        let mut text = &raw[..end];
        while let [rest @ .., b' '] = text {
            text = rest;
        }
        decode_latin1(text)
    }

    fn write_text(&mut self, field: Field, value: &str) {
        let encoded = encode_latin1(value);
        let n = encoded.len().min(field.len);
        let slot = &mut self.bytes[field.offset..field.offset + field.len];
        slot[..n].copy_from_slice(&encoded[..n]);
        slot[n..].fill(0);
    }
}
