//! Tag I/O: locate the tag regions of an MP3 file and replace them
//!
//! Writes never touch the original in place: the new file is assembled in
//! memory, written to a temporary sibling, synced, and renamed over the
//! original. Any failure before the rename leaves the original intact and
//! the temporary file deleted.

use super::id3v1::{Id3v1Tag, TAG_LEN};
use super::id3v2::{raw_region_len, Id3v2Tag, TagHeader, HEADER_LEN};
use crate::error::{RepairError, Result, TagVersion};
use std::fs::{self, File};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Both tag regions of a file, each either parsed or the reason it is unusable
#[derive(Debug)]
pub struct FileTags {
    pub v1: Result<Id3v1Tag>,
    pub v2: Result<Id3v2Tag>,
}

/// Read both tags from a file.
///
/// Only file-level failures (open, stat, read) are returned as `Err`; a
/// missing or malformed tag is reported in the corresponding field.
pub fn read_tags(path: &Path) -> Result<FileTags> {
    let mut file = File::open(path).map_err(|e| RepairError::file_open(path, e))?;
    let file_len = file
        .metadata()
        .map_err(|e| RepairError::FileStat {
            path: path.to_path_buf(),
            source: e,
        })?
        .len();

    let (v2, v2_end) = read_v2(&mut file, path, file_len)?;
    let v1 = read_v1(&mut file, path, file_len, v2_end)?;
    debug!(
        "Read tags from {}: v1 {}, v2 {}",
        path.display(),
        if v1.is_ok() { "ok" } else { "unusable" },
        if v2.is_ok() { "ok" } else { "unusable" }
    );
    Ok(FileTags { v1, v2 })
}

fn read_v2(file: &mut File, path: &Path, file_len: u64) -> Result<(Result<Id3v2Tag>, u64)> {
    if file_len < HEADER_LEN as u64 {
        return Ok((Err(RepairError::TagMissing(TagVersion::V2)), 0));
    }
    let mut header_bytes = [0u8; HEADER_LEN];
    file.read_exact(&mut header_bytes)
        .map_err(|e| RepairError::file_read(path, e))?;

    let header = match TagHeader::parse(&header_bytes) {
        Ok(Some(header)) => header,
        Ok(None) => return Ok((Err(RepairError::TagMissing(TagVersion::V2)), 0)),
        // an unsupported header still claims its region
        Err(e) => {
            let end = raw_region_len(&header_bytes)
                .map(|n| n as u64)
                .filter(|&n| n <= file_len)
                .unwrap_or(0);
            return Ok((Err(e), end));
        }
    };

    let region_len = header.region_len() as u64;
    if region_len > file_len {
        let err = RepairError::malformed("ID3v2 tag extends past the end of the file");
        return Ok((Err(err), 0));
    }
    let mut region = header_bytes.to_vec();
    region.resize(region_len as usize, 0);
    file.read_exact(&mut region[HEADER_LEN..])
        .map_err(|e| RepairError::file_read(path, e))?;

    Ok((Id3v2Tag::parse(&region), region_len))
}

fn read_v1(file: &mut File, path: &Path, file_len: u64, v2_end: u64) -> Result<Result<Id3v1Tag>> {
    if file_len < v2_end + TAG_LEN as u64 {
        return Ok(Err(RepairError::TagMissing(TagVersion::V1)));
    }
    let mut block = [0u8; TAG_LEN];
    file.seek(SeekFrom::End(-(TAG_LEN as i64)))
        .and_then(|_| file.read_exact(&mut block))
        .map_err(|e| RepairError::file_read(path, e))?;
    Ok(Id3v1Tag::parse(&block).ok_or(RepairError::TagMissing(TagVersion::V1)))
}

/// Byte range of the audio payload: after the v2 tag, before the v1 tag
pub fn audio_bounds(bytes: &[u8]) -> Result<(usize, usize)> {
    let start = raw_region_len(bytes).unwrap_or(0);
    if start > bytes.len() {
        return Err(RepairError::malformed(
            "ID3v2 tag extends past the end of the file",
        ));
    }
    Ok((start, v1_offset(bytes, start)))
}

/// Where the v1 block starts, or the end of the file when there is none
fn v1_offset(bytes: &[u8], start: usize) -> usize {
    if bytes.len() >= start + TAG_LEN && bytes[bytes.len() - TAG_LEN..].starts_with(b"TAG") {
        bytes.len() - TAG_LEN
    } else {
        bytes.len()
    }
}

/// Replace one or both tag regions.
///
/// `None` keeps that region exactly as it is on disk (including a missing
/// or malformed tag). The audio payload is copied byte-for-byte.
pub fn rewrite_tags(path: &Path, v2: Option<&Id3v2Tag>, v1: Option<&Id3v1Tag>) -> Result<()> {
    let mut file = File::open(path).map_err(|e| RepairError::file_open(path, e))?;
    let permissions = file
        .metadata()
        .map_err(|e| RepairError::FileStat {
            path: path.to_path_buf(),
            source: e,
        })?
        .permissions();
    let mut original = Vec::new();
    file.read_to_end(&mut original)
        .map_err(|e| RepairError::file_read(path, e))?;
    drop(file);

    // an unedited v2 region travels with the audio, whatever it holds
    let (audio_start, audio_end) = match v2 {
        Some(_) => audio_bounds(&original)?,
        None => {
            let v2_end = raw_region_len(&original)
                .filter(|&n| n <= original.len())
                .unwrap_or(0);
            (0, v1_offset(&original, v2_end))
        }
    };

    let new_v2 = match v2 {
        Some(tag) => tag.serialize()?,
        None => original[..audio_start].to_vec(),
    };
    let mut out = Vec::with_capacity(original.len() + new_v2.len());
    out.extend_from_slice(&new_v2);
    out.extend_from_slice(&original[audio_start..audio_end]);
    match v1 {
        Some(tag) => out.extend_from_slice(&tag.to_bytes()),
        None => out.extend_from_slice(&original[audio_end..]),
    }

    write_atomically(path, &out, permissions)
}

fn write_atomically(path: &Path, bytes: &[u8], permissions: fs::Permissions) -> Result<()> {
    let dir: PathBuf = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    };

    let mut temp = tempfile::Builder::new()
        .prefix(".mp3repair-")
        .suffix(".tmp")
        .tempfile_in(&dir)
        .map_err(|e| RepairError::file_write(path, e))?;
    temp.write_all(bytes)
        .and_then(|_| temp.as_file().sync_all())
        .map_err(|e| RepairError::file_write(path, e))?;
    if let Err(e) = fs::set_permissions(temp.path(), permissions) {
        warn!("Could not copy permissions onto {}: {}", path.display(), e);
    }

    // a failed persist hands the temp file back; dropping it deletes it
    temp.persist(path).map_err(|e| RepairError::FileRename {
        path: path.to_path_buf(),
        source: e.error,
    })?;
    Ok(())
}
