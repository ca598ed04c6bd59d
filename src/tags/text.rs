//! Text encodings used by ID3 tags

use crate::error::{RepairError, Result};

pub const ENCODING_LATIN1: u8 = 0;
pub const ENCODING_UTF16: u8 = 1;
pub const ENCODING_UTF16BE: u8 = 2;
pub const ENCODING_UTF8: u8 = 3;

const BOM: char = '\u{FEFF}';

pub fn decode_latin1(bytes: &[u8]) -> String {
    bytes.iter().map(|&b| b as char).collect()
}

/// Characters outside ISO-8859-1 become `?`
pub fn encode_latin1(text: &str) -> Vec<u8> {
    text.chars()
        .map(|c| u8::try_from(u32::from(c)).unwrap_or(b'?'))
        .collect()
}

pub fn is_latin1(text: &str) -> bool {
    text.chars().all(|c| u32::from(c) <= 0xFF)
}

/// Remove any number of leading byte-order marks
pub fn strip_bom(text: &str) -> &str {
    text.trim_start_matches(BOM)
}

/// Decode a text frame body: encoding byte followed by the text.
///
/// Only the first string is returned when the body holds several
/// NUL-separated values.
pub fn decode_text_frame(body: &[u8]) -> Result<String> {
    let Some((&encoding, text)) = body.split_first() else {
        return Ok(String::new());
    };
    let decoded = match encoding {
        ENCODING_LATIN1 => decode_latin1(until_nul(text)),
        ENCODING_UTF8 => String::from_utf8(until_nul(text).to_vec())
            .map_err(|_| RepairError::malformed("text frame is not valid UTF-8"))?,
        ENCODING_UTF16 => decode_utf16(text, None)?,
        ENCODING_UTF16BE => decode_utf16(text, Some(true))?,
        other => {
            return Err(RepairError::malformed(format!(
                "unknown text encoding {}",
                other
            )))
        }
    };
    Ok(strip_bom(&decoded).to_string())
}

/// Encode `text` as a text frame body for a tag of the given major version
pub fn encode_text_frame(text: &str, major_version: u8) -> Vec<u8> {
    if major_version >= 4 {
        let mut body = Vec::with_capacity(text.len() + 1);
        body.push(ENCODING_UTF8);
        body.extend_from_slice(text.as_bytes());
        return body;
    }
    if is_latin1(text) {
        let mut body = vec![ENCODING_LATIN1];
        body.extend(encode_latin1(text));
        return body;
    }
    let mut body = vec![ENCODING_UTF16, 0xFF, 0xFE];
    for unit in text.encode_utf16() {
        body.extend_from_slice(&unit.to_le_bytes());
    }
    body
}

fn until_nul(bytes: &[u8]) -> &[u8] {
    let end = bytes.iter().position(|&b| b == 0).unwrap_or(bytes.len());
    &bytes[..end]
}

/// `big_endian` of `None` means "read the BOM"; no BOM defaults to big-endian
fn decode_utf16(bytes: &[u8], big_endian: Option<bool>) -> Result<String> {
    let (big_endian, bytes) = match big_endian {
        Some(be) => (be, bytes),
        None => match bytes {
            [0xFF, 0xFE, rest @ ..] => (false, rest),
            [0xFE, 0xFF, rest @ ..] => (true, rest),
            _ => (true, bytes),
        },
    };
    let units: Vec<u16> = bytes
        .chunks_exact(2)
        .map(|pair| {
            if big_endian {
                u16::from_be_bytes([pair[0], pair[1]])
            } else {
                u16::from_le_bytes([pair[0], pair[1]])
            }
        })
        .take_while(|&unit| unit != 0)
        .collect();
    String::from_utf16(&units).map_err(|_| RepairError::malformed("text frame is not valid UTF-16"))
}
