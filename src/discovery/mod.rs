//! Library discovery

pub mod scanner;

pub use scanner::{parse_track_file_name, scan};
