//! ID3 tag codecs and file I/O
//!
//! - `id3v1`: the 128-byte trailer tag
//! - `id3v2`: the frame-based header tag (v2.3 and v2.4)
//! - `genre`: the shared v1 genre table
//! - `file`: reading both tags from a file and rewriting them atomically

pub mod file;
pub mod genre;
pub mod id3v1;
pub mod id3v2;
pub mod text;

pub use file::{read_tags, rewrite_tags, FileTags};
pub use id3v1::Id3v1Tag;
pub use id3v2::Id3v2Tag;
