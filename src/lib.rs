//! mp3repair - MP3 tag metadata reconciliation
//!
//! A command-line utility that cross-checks the ID3V1 and ID3V2 tags of an
//! MP3 library against its `<artist>/<album>/<NN track>.mp3` layout,
//! reports disagreements, and rewrites the tags on request.
//!
//! # Architecture
//!
//! - `config`: CLI argument parsing and runtime settings
//! - `discovery`: Library scanning into a flat artist/album/track cohort
//! - `tags`: ID3V1 and ID3V2 codecs and crash-safe tag rewrites
//! - `metadata`: Unified two-source view of a track and the difference engine
//! - `consensus`: Album- and artist-wide canonical values by plurality vote
//! - `backup`, `dirty`: Pre-repair backups and the dirty-state marker
//! - `pipeline`: Command orchestration
//! - `export`: JSON report output
//!
//! # Example
//!
//! ```no_run
//! use mp3repair::{config::Settings, pipeline};
//!
//! let settings = Settings::default();
//! let result = pipeline::run(&settings, pipeline::Mode::Check).expect("Check failed");
//! println!("{} of {} tracks need edits", result.needs_edit, result.total_tracks);
//! ```

pub mod backup;
pub mod config;
pub mod consensus;
pub mod dirty;
pub mod discovery;
pub mod error;
pub mod export;
pub mod metadata;
pub mod pipeline;
pub mod tags;
pub mod types;

// Re-export key types at crate root
pub use error::{RepairError, Result};
pub use metadata::{TrackMetadata, TrackState};
pub use types::{ByTag, Library, Source};
