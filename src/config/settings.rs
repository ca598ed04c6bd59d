//! Runtime configuration settings

use directories::{ProjectDirs, UserDirs};
use std::path::PathBuf;

/// Upper bound on files read at once
pub const MAX_WORKERS: usize = 20;

/// Runtime settings shared by every command
#[derive(Debug, Clone)]
pub struct Settings {
    /// Music root: `<top_dir>/<artist>/<album>/<track>`
    pub top_dir: PathBuf,
    /// Track file extension, without the dot
    pub extension: String,
    /// Number of read worker threads
    pub workers: usize,
    /// Show progress bars
    pub show_progress: bool,
    /// Where the dirty marker lives; `None` disables dirty tracking
    pub state_dir: Option<PathBuf>,
    /// Optional JSON report destination
    pub report: Option<PathBuf>,
}

impl Settings {
    /// Create settings from CLI arguments
    pub fn from_cli(cli: &super::cli::Cli) -> Self {
        Self {
            top_dir: cli.top_dir.clone().unwrap_or_else(default_top_dir),
            extension: cli.ext.trim_start_matches('.').to_string(),
            workers: clamp_workers(cli.threads.unwrap_or(MAX_WORKERS)),
            show_progress: !cli.quiet,
            state_dir: cli.state_dir.clone().or_else(default_state_dir),
            report: cli.report.clone(),
        }
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            top_dir: default_top_dir(),
            extension: "mp3".to_string(),
            workers: MAX_WORKERS,
            show_progress: true,
            state_dir: default_state_dir(),
            report: None,
        }
    }
}

pub fn clamp_workers(requested: usize) -> usize {
    requested.clamp(1, MAX_WORKERS)
}

/// The user's music directory, falling back to `~/Music`, then `.`
fn default_top_dir() -> PathBuf {
    UserDirs::new()
        .and_then(|dirs| {
            dirs.audio_dir()
                .map(|p| p.to_path_buf())
                .or_else(|| Some(dirs.home_dir().join("Music")))
        })
        .unwrap_or_else(|| PathBuf::from("."))
}

fn default_state_dir() -> Option<PathBuf> {
    ProjectDirs::from("com", "mp3repair", "mp3repair").map(|dirs| dirs.data_local_dir().to_path_buf())
}
