//! ID3v2.3 / ID3v2.4 header tag
//!
//! Frames are kept as the exact bytes they were read from. Editing a frame
//! replaces only that frame; serializing an unedited tag returns the
//! original tag region untouched, and serializing an edited tag re-emits
//! every other frame verbatim.

use super::text::{decode_text_frame, encode_text_frame, strip_bom};
use crate::error::{RepairError, Result, TagVersion};

/// Size of the tag header (and of the v2.4 footer)
pub const HEADER_LEN: usize = 10;

const FRAME_HEADER_LEN: usize = 10;

const FLAG_UNSYNCHRONISATION: u8 = 0x80;
const FLAG_EXTENDED_HEADER: u8 = 0x40;
const FLAG_FOOTER: u8 = 0x10;

// Frame format flags
const V3_COMPRESSION: u16 = 0x0080;
const V3_ENCRYPTION: u16 = 0x0040;
const V3_GROUPING: u16 = 0x0020;
const V4_GROUPING: u16 = 0x0040;
const V4_COMPRESSION: u16 = 0x0008;
const V4_ENCRYPTION: u16 = 0x0004;
const V4_UNSYNCHRONISATION: u16 = 0x0002;
const V4_DATA_LENGTH: u16 = 0x0001;

/// Largest value a 4-byte syncsafe integer can hold
const SYNCSAFE_MAX: usize = (1 << 28) - 1;

pub const FRAME_ALBUM: &str = "TALB";
pub const FRAME_ARTIST: &str = "TPE1";
pub const FRAME_TITLE: &str = "TIT2";
pub const FRAME_TRACK: &str = "TRCK";
pub const FRAME_GENRE: &str = "TCON";
pub const FRAME_YEAR: &str = "TYER";
pub const FRAME_RECORDING_TIME: &str = "TDRC";
pub const FRAME_MCDI: &str = "MCDI";

pub fn decode_syncsafe(bytes: [u8; 4]) -> Option<u32> {
    if bytes.iter().any(|&b| b > 0x7F) {
        return None;
    }
    Some(bytes.iter().fold(0u32, |acc, &b| (acc << 7) | u32::from(b)))
}

pub fn encode_syncsafe(value: usize) -> Result<[u8; 4]> {
    if value > SYNCSAFE_MAX {
        return Err(RepairError::malformed(format!(
            "size {} does not fit a syncsafe integer",
            value
        )));
    }
    Ok([
        ((value >> 21) & 0x7F) as u8,
        ((value >> 14) & 0x7F) as u8,
        ((value >> 7) & 0x7F) as u8,
        (value & 0x7F) as u8,
    ])
}

/// Length of the tag region at the start of `bytes`, for any `ID3` header.
///
/// Unlike [`TagHeader::parse`] this accepts every version and falls back to
/// the plain 28-bit size when the size bytes are not syncsafe. `None` when
/// there is no `ID3` marker.
pub fn raw_region_len(bytes: &[u8]) -> Option<usize> {
    if bytes.len() < HEADER_LEN || &bytes[..3] != b"ID3" {
        return None;
    }
    let size_bytes = [bytes[6], bytes[7], bytes[8], bytes[9]];
    let size = decode_syncsafe(size_bytes)
        .unwrap_or_else(|| u32::from_be_bytes(size_bytes) & 0x0FFF_FFFF);
    let footer = if bytes[3] == 4 && bytes[5] & FLAG_FOOTER != 0 {
        HEADER_LEN
    } else {
        0
    };
    Some(HEADER_LEN + size as usize + footer)
}

/// The 10-byte tag header
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TagHeader {
    pub major: u8,
    pub revision: u8,
    pub flags: u8,
    /// Tag size excluding header and footer
    pub size: u32,
}

impl TagHeader {
    /// `Ok(None)` when the bytes do not start with `ID3`
    pub fn parse(bytes: &[u8]) -> Result<Option<Self>> {
        if bytes.len() < HEADER_LEN || &bytes[..3] != b"ID3" {
            return Ok(None);
        }
        let major = bytes[3];
        if major != 3 && major != 4 {
            return Err(RepairError::malformed(format!(
                "unsupported ID3v2 version 2.{}",
                major
            )));
        }
        let size = decode_syncsafe([bytes[6], bytes[7], bytes[8], bytes[9]])
            .ok_or_else(|| RepairError::malformed("ID3v2 tag size is not syncsafe"))?;
        Ok(Some(Self {
            major,
            revision: bytes[4],
            flags: bytes[5],
            size,
        }))
    }

    pub fn has_footer(&self) -> bool {
        self.major == 4 && self.flags & FLAG_FOOTER != 0
    }

    /// Length of the whole tag region in the file
    pub fn region_len(&self) -> usize {
        let footer = if self.has_footer() { HEADER_LEN } else { 0 };
        HEADER_LEN + self.size as usize + footer
    }

    fn to_bytes(self, marker: &[u8; 3]) -> Result<[u8; HEADER_LEN]> {
        let size = encode_syncsafe(self.size as usize)?;
        let mut out = [0u8; HEADER_LEN];
        out[..3].copy_from_slice(marker);
        out[3] = self.major;
        out[4] = self.revision;
        out[5] = self.flags;
        out[6..].copy_from_slice(&size);
        Ok(out)
    }
}

/// A single frame
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    id: String,
    flags: u16,
    body: Vec<u8>,
    /// Frame header plus body exactly as read; empty for new or edited frames
    raw: Vec<u8>,
}

impl Frame {
    fn new(id: &str, body: Vec<u8>) -> Self {
        Self {
            id: id.to_string(),
            flags: 0,
            body,
            raw: Vec::new(),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn is_text(&self) -> bool {
        self.id.starts_with('T') && self.id != "TXXX"
    }

    /// Frame body with grouping byte, data length indicator and v2.4
    /// unsynchronisation undone
    pub fn content(&self, major: u8) -> Result<Vec<u8>> {
        let (compressed, encrypted, grouped) = if major >= 4 {
            (V4_COMPRESSION, V4_ENCRYPTION, V4_GROUPING)
        } else {
            (V3_COMPRESSION, V3_ENCRYPTION, V3_GROUPING)
        };
        if self.flags & (compressed | encrypted) != 0 {
            return Err(RepairError::malformed(format!(
                "frame {} is compressed or encrypted",
                self.id
            )));
        }
        let mut body = self.body.as_slice();
        if self.flags & grouped != 0 {
            body = body.get(1..).unwrap_or_default();
        }
        if major >= 4 && self.flags & V4_DATA_LENGTH != 0 {
            body = body.get(4..).unwrap_or_default();
        }
        if major >= 4 && self.flags & V4_UNSYNCHRONISATION != 0 {
            return Ok(remove_unsynchronisation(body));
        }
        Ok(body.to_vec())
    }

    fn encode(&self, major: u8) -> Result<Vec<u8>> {
        if !self.raw.is_empty() {
            return Ok(self.raw.clone());
        }
        let size = if major >= 4 {
            encode_syncsafe(self.body.len())?
        } else {
            u32::try_from(self.body.len())
                .map_err(|_| RepairError::malformed(format!("frame {} is too large", self.id)))?
                .to_be_bytes()
        };
        let mut out = Vec::with_capacity(FRAME_HEADER_LEN + self.body.len());
        out.extend_from_slice(self.id.as_bytes());
        out.extend_from_slice(&size);
        out.extend_from_slice(&self.flags.to_be_bytes());
        out.extend_from_slice(&self.body);
        Ok(out)
    }
}

/// A parsed ID3v2 tag
#[derive(Debug, Clone)]
pub struct Id3v2Tag {
    header: TagHeader,
    extended_header: Vec<u8>,
    frames: Vec<Frame>,
    /// The whole tag region as read
    raw: Vec<u8>,
    edited: bool,
}

impl Id3v2Tag {
    /// Parse a tag region that starts with the 10-byte header.
    ///
    /// Fails with `TagMissing` when there is no `ID3` marker.
    pub fn parse(region: &[u8]) -> Result<Self> {
        let header = TagHeader::parse(region)?
            .ok_or(RepairError::TagMissing(TagVersion::V2))?;
        let region_len = header.region_len();
        if region.len() < region_len {
            return Err(RepairError::malformed(
                "ID3v2 tag extends past the end of the file",
            ));
        }
        let encoded_body = &region[HEADER_LEN..HEADER_LEN + header.size as usize];
        let body = if header.major == 3 && header.flags & FLAG_UNSYNCHRONISATION != 0 {
            remove_unsynchronisation(encoded_body)
        } else {
            encoded_body.to_vec()
        };

        let extended_len = if header.flags & FLAG_EXTENDED_HEADER != 0 {
            extended_header_len(&header, &body)?
        } else {
            0
        };
        let frames = parse_frames(&header, &body[extended_len..])?;

        Ok(Self {
            header,
            extended_header: body[..extended_len].to_vec(),
            frames,
            raw: region[..region_len].to_vec(),
            edited: false,
        })
    }

    pub fn header(&self) -> &TagHeader {
        &self.header
    }

    pub fn major_version(&self) -> u8 {
        self.header.major
    }

    pub fn frames(&self) -> &[Frame] {
        &self.frames
    }

    pub fn is_edited(&self) -> bool {
        self.edited
    }

    pub fn frame(&self, id: &str) -> Option<&Frame> {
        self.frames.iter().find(|f| f.id == id)
    }

    /// Decoded text of the first frame with this id
    pub fn text(&self, id: &str) -> Result<Option<String>> {
        match self.frame(id) {
            Some(frame) => decode_text_frame(&frame.content(self.header.major)?).map(Some),
            None => Ok(None),
        }
    }

    /// Body of the first frame with this id, undecoded
    pub fn binary(&self, id: &str) -> Result<Option<Vec<u8>>> {
        match self.frame(id) {
            Some(frame) => frame.content(self.header.major).map(Some),
            None => Ok(None),
        }
    }

    /// Replace (or append) a text frame, encoded for this tag's version
    pub fn set_text(&mut self, id: &str, value: &str) {
        let body = encode_text_frame(value, self.header.major);
        self.replace_frame(Frame::new(id, body));
    }

    /// Replace (or append) a frame holding opaque bytes
    pub fn set_binary(&mut self, id: &str, body: &[u8]) {
        self.replace_frame(Frame::new(id, body.to_vec()));
    }

    /// Remove every frame with this id
    pub fn remove(&mut self, id: &str) {
        let before = self.frames.len();
        self.frames.retain(|f| f.id != id);
        if self.frames.len() != before {
            self.edited = true;
        }
    }

    fn replace_frame(&mut self, frame: Frame) {
        self.edited = true;
        match self.frames.iter().position(|f| f.id == frame.id) {
            Some(index) => self.frames[index] = frame,
            None => self.frames.push(frame),
        }
    }

    /// Serialize the tag region.
    ///
    /// Unedited tags come back byte-for-byte. Edited tags keep the original
    /// size when the frames still fit, so the audio does not move.
    pub fn serialize(&self) -> Result<Vec<u8>> {
        if !self.edited {
            return Ok(self.raw.clone());
        }

        let mut content = self.extended_header.clone();
        for frame in &self.frames {
            content.extend(frame.encode(self.header.major)?);
        }

        // new frames are written without unsynchronisation; kept v2.4 frames
        // carry their own frame-level flag
        let mut header = self.header;
        header.flags &= !FLAG_UNSYNCHRONISATION;
        let original_size = self.header.size as usize;
        if !header.has_footer() && content.len() < original_size {
            content.resize(original_size, 0);
        }
        header.size = u32::try_from(content.len())
            .map_err(|_| RepairError::malformed("ID3v2 tag is too large"))?;

        let mut out = Vec::with_capacity(header.region_len());
        out.extend_from_slice(&header.to_bytes(b"ID3")?);
        out.extend_from_slice(&content);
        if header.has_footer() {
            out.extend_from_slice(&header.to_bytes(b"3DI")?);
        }
        Ok(out)
    }

    /// Human-readable dump: version line, then one line per frame
    pub fn diagnostics(&self) -> Vec<String> {
        let mut lines = vec![format!(
            "ID3V2 version: 2.{}.{}",
            self.header.major, self.header.revision
        )];
        for frame in &self.frames {
            let value = if frame.is_text() {
                match frame
                    .content(self.header.major)
                    .and_then(|body| decode_text_frame(&body))
                {
                    Ok(text) => format!("{:?}", text),
                    Err(e) => format!("<{}>", e),
                }
            } else {
                format!("<{} bytes>", frame.body.len())
            };
            lines.push(format!("{} = {}", frame.id, value));
        }
        lines
    }
}

/// Parse a `TRCK` body: leading digits, optionally followed by `/total`
pub fn parse_track_number(text: &str) -> Result<u32> {
    let text = strip_bom(text);
    if text.is_empty() {
        return Err(RepairError::TrackNumberMalformed(
            "track number is zero length",
        ));
    }
    let digits: &str = match text.find(|c: char| !c.is_ascii_digit()) {
        Some(0) => {
            return Err(RepairError::TrackNumberMalformed(
                "track number first character is not a digit",
            ))
        }
        Some(end) => &text[..end],
        None => text,
    };
    digits
        .parse()
        .map_err(|_| RepairError::TrackNumberMalformed("track number is out of range"))
}

/// Re-render a `TRCK` body with a new number, keeping any `/total` suffix
pub fn format_track_number(original: Option<&str>, number: u32) -> String {
    let suffix = original
        .map(strip_bom)
        .and_then(|text| text.find('/').map(|i| &text[i..]))
        .unwrap_or("");
    format!("{}{}", number, suffix)
}

fn extended_header_len(header: &TagHeader, body: &[u8]) -> Result<usize> {
    let size_bytes: [u8; 4] = body
        .get(..4)
        .and_then(|b| b.try_into().ok())
        .ok_or_else(|| RepairError::malformed("ID3v2 extended header is truncated"))?;
    let len = if header.major >= 4 {
        decode_syncsafe(size_bytes)
            .ok_or_else(|| RepairError::malformed("ID3v2 extended header size is not syncsafe"))?
            as usize
    } else {
        4 + u32::from_be_bytes(size_bytes) as usize
    };
    if len < 4 || len > body.len() {
        return Err(RepairError::malformed("ID3v2 extended header size is invalid"));
    }
    Ok(len)
}

fn parse_frames(header: &TagHeader, body: &[u8]) -> Result<Vec<Frame>> {
    let mut frames = Vec::new();
    let mut pos = 0;
    while pos + FRAME_HEADER_LEN <= body.len() && body[pos] != 0 {
        let id_bytes = &body[pos..pos + 4];
        if !id_bytes
            .iter()
            .all(|b| b.is_ascii_uppercase() || b.is_ascii_digit())
        {
            return Err(RepairError::malformed(format!(
                "invalid frame id {:?} at offset {}",
                String::from_utf8_lossy(id_bytes),
                pos
            )));
        }
        let id = String::from_utf8_lossy(id_bytes).into_owned();
        let size_bytes = [body[pos + 4], body[pos + 5], body[pos + 6], body[pos + 7]];
        let size = if header.major >= 4 {
            decode_syncsafe(size_bytes).ok_or_else(|| {
                RepairError::malformed(format!("frame {} size is not syncsafe", id))
            })?
        } else {
            u32::from_be_bytes(size_bytes)
        };
        let size = size as usize;
        let flags = u16::from_be_bytes([body[pos + 8], body[pos + 9]]);

        let start = pos + FRAME_HEADER_LEN;
        let end = start
            .checked_add(size)
            .filter(|&end| end <= body.len())
            .ok_or_else(|| RepairError::malformed(format!("frame {} overruns the tag", id)))?;

        frames.push(Frame {
            id,
            flags,
            body: body[start..end].to_vec(),
            raw: body[pos..end].to_vec(),
        });
        pos = end;
    }
    Ok(frames)
}

/// Undo unsynchronisation: every `FF 00` pair becomes `FF`
fn remove_unsynchronisation(bytes: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(bytes.len());
    let mut previous_ff = false;
    for &b in bytes {
        if previous_ff && b == 0 {
            previous_ff = false;
            continue;
        }
        out.push(b);
        previous_ff = b == 0xFF;
    }
    out
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    /// Build a frame as it would appear in a tag of the given version
    pub(crate) fn frame_bytes(major: u8, id: &str, body: &[u8]) -> Vec<u8> {
        let size = if major >= 4 {
            encode_syncsafe(body.len()).unwrap()
        } else {
            (body.len() as u32).to_be_bytes()
        };
        let mut out = id.as_bytes().to_vec();
        out.extend_from_slice(&size);
        out.extend_from_slice(&[0, 0]);
        out.extend_from_slice(body);
        out
    }

    pub(crate) fn text_frame(major: u8, id: &str, text: &str) -> Vec<u8> {
        let mut body = vec![0u8];
        body.extend_from_slice(text.as_bytes());
        frame_bytes(major, id, &body)
    }

    /// Build a whole tag region from frames plus `padding` zero bytes
    pub(crate) fn tag_bytes(major: u8, frames: &[Vec<u8>], padding: usize) -> Vec<u8> {
        let mut body: Vec<u8> = frames.concat();
        body.resize(body.len() + padding, 0);
        let mut out = vec![b'I', b'D', b'3', major, 0, 0];
        out.extend_from_slice(&encode_syncsafe(body.len()).unwrap());
        out.extend_from_slice(&body);
        out
    }

    fn sample_tag(major: u8) -> Vec<u8> {
        tag_bytes(
            major,
            &[
                text_frame(major, "TALB", "Abbey Road"),
                text_frame(major, "TPE1", "The Beatles"),
                text_frame(major, "TIT2", "Something"),
                text_frame(major, "TRCK", "2/17"),
                text_frame(major, "TCON", "(17)Rock"),
                text_frame(major, "TYER", "1969"),
                frame_bytes(major, "MCDI", &[1, 2, 3, 4]),
                frame_bytes(major, "PRIV", b"owner\0data"),
            ],
            32,
        )
    }

    #[test]
    fn test_syncsafe() {
        assert_eq!(decode_syncsafe([0, 0, 2, 1]), Some(257));
        assert_eq!(decode_syncsafe([0, 0, 0x80, 0]), None);
        assert_eq!(encode_syncsafe(257).unwrap(), [0, 0, 2, 1]);
        assert_eq!(
            decode_syncsafe(encode_syncsafe(SYNCSAFE_MAX).unwrap()),
            Some(SYNCSAFE_MAX as u32)
        );
        assert!(encode_syncsafe(SYNCSAFE_MAX + 1).is_err());
    }

    #[test]
    fn test_raw_region_len_accepts_any_version() {
        let mut v22 = vec![b'I', b'D', b'3', 2, 0, 0, 0, 0, 0, 6];
        v22.extend_from_slice(&[0; 6]);
        assert!(TagHeader::parse(&v22).is_err());
        assert_eq!(raw_region_len(&v22), Some(16));

        let not_syncsafe = [b'I', b'D', b'3', 3, 0, 0, 0, 0, 0, 0x80];
        assert_eq!(raw_region_len(&not_syncsafe), Some(HEADER_LEN + 0x80));
        assert_eq!(raw_region_len(b"TAG and more bytes"), None);
    }

    #[test]
    fn test_header_parse() {
        let tag = sample_tag(3);
        let header = TagHeader::parse(&tag).unwrap().unwrap();
        assert_eq!(header.major, 3);
        assert_eq!(header.region_len(), tag.len());
        assert!(TagHeader::parse(b"not a tag at all").unwrap().is_none());
        assert!(TagHeader::parse(b"ID3\x02\x00\x00\x00\x00\x00\x00").is_err());
        assert!(TagHeader::parse(b"ID3\x03\x00\x00\x00\x00\x80\x00").is_err());
    }

    #[test]
    fn test_parse_reads_known_frames() {
        for major in [3, 4] {
            let tag = Id3v2Tag::parse(&sample_tag(major)).unwrap();
            assert_eq!(tag.text("TALB").unwrap().as_deref(), Some("Abbey Road"));
            assert_eq!(tag.text("TPE1").unwrap().as_deref(), Some("The Beatles"));
            assert_eq!(tag.text("TRCK").unwrap().as_deref(), Some("2/17"));
            assert_eq!(tag.binary("MCDI").unwrap(), Some(vec![1, 2, 3, 4]));
            assert_eq!(tag.text("TCOM").unwrap(), None);
            assert_eq!(tag.frames().len(), 8);
        }
    }

    #[test]
    fn test_unedited_round_trip_is_exact() {
        for major in [3, 4] {
            let bytes = sample_tag(major);
            let tag = Id3v2Tag::parse(&bytes).unwrap();
            assert_eq!(tag.serialize().unwrap(), bytes);
        }
    }

    #[test]
    fn test_v23_size_is_not_syncsafe() {
        // 200-byte body: the v2.3 size field holds 0x000000C8, which is not syncsafe
        let body = vec![b'x'; 200];
        let bytes = tag_bytes(3, &[frame_bytes(3, "PRIV", &body)], 0);
        let tag = Id3v2Tag::parse(&bytes).unwrap();
        assert_eq!(tag.binary("PRIV").unwrap().unwrap().len(), 200);
    }

    #[test]
    fn test_edit_preserves_other_frames_and_size() {
        let bytes = sample_tag(4);
        let mut tag = Id3v2Tag::parse(&bytes).unwrap();
        tag.set_text("TRCK", "3/17");
        let out = tag.serialize().unwrap();
        assert_eq!(out.len(), bytes.len());

        let reread = Id3v2Tag::parse(&out).unwrap();
        assert_eq!(reread.text("TRCK").unwrap().as_deref(), Some("3/17"));
        let original = Id3v2Tag::parse(&bytes).unwrap();
        for (before, after) in original.frames().iter().zip(reread.frames()) {
            if before.id() != "TRCK" {
                assert_eq!(before, after);
            }
        }
    }

    #[test]
    fn test_edit_grows_tag_when_needed() {
        let bytes = tag_bytes(3, &[text_frame(3, "TIT2", "A")], 0);
        let mut tag = Id3v2Tag::parse(&bytes).unwrap();
        tag.set_text("TALB", "A much longer album title");
        let out = tag.serialize().unwrap();
        assert!(out.len() > bytes.len());
        let reread = Id3v2Tag::parse(&out).unwrap();
        assert_eq!(
            reread.text("TALB").unwrap().as_deref(),
            Some("A much longer album title")
        );
        assert_eq!(reread.text("TIT2").unwrap().as_deref(), Some("A"));
    }

    #[test]
    fn test_set_text_uses_utf8_for_v24() {
        let mut tag = Id3v2Tag::parse(&sample_tag(4)).unwrap();
        tag.set_text("TPE1", "Björk");
        assert_eq!(tag.frame("TPE1").unwrap().content(4).unwrap()[0], 3);
        assert_eq!(tag.text("TPE1").unwrap().as_deref(), Some("Björk"));
    }

    #[test]
    fn test_remove_frame() {
        let mut tag = Id3v2Tag::parse(&sample_tag(3)).unwrap();
        tag.remove("TYER");
        assert!(tag.is_edited());
        let reread = Id3v2Tag::parse(&tag.serialize().unwrap()).unwrap();
        assert_eq!(reread.text("TYER").unwrap(), None);
    }

    #[test]
    fn test_overrunning_frame_is_malformed() {
        let mut frame = text_frame(3, "TIT2", "abc");
        frame[7] = 200;
        let bytes = tag_bytes(3, &[frame], 0);
        let err = Id3v2Tag::parse(&bytes).unwrap_err();
        assert!(matches!(err, RepairError::TagMalformed(_)));
    }

    #[test]
    fn test_truncated_region_is_malformed() {
        let bytes = sample_tag(3);
        assert!(Id3v2Tag::parse(&bytes[..bytes.len() - 5]).is_err());
    }

    #[test]
    fn test_missing_marker() {
        let err = Id3v2Tag::parse(&[0u8; 20]).unwrap_err();
        assert!(err.is_missing_tag());
    }

    #[test]
    fn test_unsynchronised_v23_tag() {
        let mut frame = frame_bytes(3, "TIT2", &[0, b'a', 0xFF, 0x00, b'b']);
        // declared size counts the decoded body
        frame[7] = 4;
        let mut bytes = tag_bytes(3, &[frame], 0);
        bytes[5] = FLAG_UNSYNCHRONISATION;
        let tag = Id3v2Tag::parse(&bytes).unwrap();
        assert_eq!(tag.frame("TIT2").unwrap().content(3).unwrap(), vec![0, b'a', 0xFF, b'b']);
        assert_eq!(tag.serialize().unwrap(), bytes);
    }

    #[test]
    fn test_edited_v24_tag_drops_unsynchronisation_flag() {
        let mut bytes = tag_bytes(4, &[text_frame(4, "TIT2", "x")], 8);
        bytes[5] = FLAG_UNSYNCHRONISATION;
        let mut tag = Id3v2Tag::parse(&bytes).unwrap();
        assert_eq!(tag.serialize().unwrap(), bytes);

        tag.set_binary("MCDI", &[0xFF, 0x00, 0x01]);
        let out = tag.serialize().unwrap();
        assert_eq!(out[5] & FLAG_UNSYNCHRONISATION, 0);
        let reread = Id3v2Tag::parse(&out).unwrap();
        assert_eq!(reread.binary("MCDI").unwrap(), Some(vec![0xFF, 0x00, 0x01]));
        assert_eq!(reread.text("TIT2").unwrap().as_deref(), Some("x"));
    }

    #[test]
    fn test_extended_header_is_kept() {
        let mut body = vec![0, 0, 0, 6, 0, 0, 0, 0, 0, 0];
        body.extend(text_frame(3, "TIT2", "x"));
        let mut bytes = vec![b'I', b'D', b'3', 3, 0, FLAG_EXTENDED_HEADER];
        bytes.extend_from_slice(&encode_syncsafe(body.len()).unwrap());
        bytes.extend_from_slice(&body);

        let mut tag = Id3v2Tag::parse(&bytes).unwrap();
        assert_eq!(tag.text("TIT2").unwrap().as_deref(), Some("x"));
        tag.set_text("TIT2", "y");
        let out = tag.serialize().unwrap();
        assert_eq!(&out[HEADER_LEN..HEADER_LEN + 10], &body[..10]);
        assert_eq!(Id3v2Tag::parse(&out).unwrap().text("TIT2").unwrap().as_deref(), Some("y"));
    }

    #[test]
    fn test_footer_is_regenerated() {
        let mut bytes = tag_bytes(4, &[text_frame(4, "TIT2", "x")], 0);
        bytes[5] = FLAG_FOOTER;
        let mut footer = bytes[..HEADER_LEN].to_vec();
        footer[..3].copy_from_slice(b"3DI");
        bytes.extend(footer);

        let mut tag = Id3v2Tag::parse(&bytes).unwrap();
        assert_eq!(tag.header().region_len(), bytes.len());
        tag.set_text("TIT2", "longer");
        let out = tag.serialize().unwrap();
        assert_eq!(&out[out.len() - HEADER_LEN..out.len() - 7], b"3DI");
        assert_eq!(Id3v2Tag::parse(&out).unwrap().header().region_len(), out.len());
    }

    #[test]
    fn test_parse_track_number() {
        assert_eq!(parse_track_number("29").unwrap(), 29);
        assert_eq!(parse_track_number("3/12").unwrap(), 3);
        assert_eq!(parse_track_number("\u{FEFF}7").unwrap(), 7);
        assert_eq!(
            parse_track_number("oops").unwrap_err().to_string(),
            "track number first character is not a digit"
        );
        assert_eq!(
            parse_track_number("").unwrap_err().to_string(),
            "track number is zero length"
        );
    }

    #[test]
    fn test_format_track_number() {
        assert_eq!(format_track_number(Some("29/30"), 2), "2/30");
        assert_eq!(format_track_number(Some("29"), 2), "2");
        assert_eq!(format_track_number(None, 5), "5");
    }

    #[test]
    fn test_diagnostics() {
        let tag = Id3v2Tag::parse(&sample_tag(3)).unwrap();
        let lines = tag.diagnostics();
        assert_eq!(lines[0], "ID3V2 version: 2.3.0");
        assert!(lines.contains(&"TALB = \"Abbey Road\"".to_string()));
        assert!(lines.contains(&"MCDI = <4 bytes>".to_string()));
    }
}
