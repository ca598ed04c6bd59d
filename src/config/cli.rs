//! CLI argument parsing and configuration

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// mp3repair - keep MP3 tags in line with your music directory layout
///
/// Expects a music root laid out as <artist>/<album>/<NN name>.mp3 and
/// compares each file's ID3V1 and ID3V2 tags against that layout.
#[derive(Parser, Debug)]
#[command(name = "mp3repair")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Music root directory (defaults to the user's music directory)
    #[arg(long, global = true, value_name = "DIR", env = "MP3REPAIR_TOP_DIR")]
    pub top_dir: Option<PathBuf>,

    /// Extension of the files to inspect
    #[arg(long, global = true, value_name = "EXT", default_value = "mp3")]
    pub ext: String,

    /// Number of files read in parallel (1-20)
    #[arg(short = 'j', long, global = true, value_name = "N")]
    pub threads: Option<usize>,

    /// Directory holding the dirty marker
    #[arg(long, global = true, value_name = "DIR", env = "MP3REPAIR_STATE_DIR")]
    pub state_dir: Option<PathBuf>,

    /// Write a JSON report of every track's outcome
    #[arg(long, global = true, value_name = "PATH")]
    pub report: Option<PathBuf>,

    /// Verbose output (can be repeated: -v, -vv, -vvv)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Quiet mode (errors only, no progress bar)
    #[arg(short, long, global = true, default_value = "false")]
    pub quiet: bool,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Report tracks whose tags disagree with the directory layout
    Check,

    /// Rewrite disagreeing tags, backing up each file first
    Repair {
        /// Only report what would be changed
        #[arg(long, default_value = "false")]
        dry_run: bool,
    },

    /// Delete the backup directories created by repair
    Postrepair,

    /// Clear the dirty marker left by repair
    Reset,

    /// Print the raw tags of one file
    Inspect {
        #[arg(value_name = "FILE")]
        file: PathBuf,
    },
}

impl Cli {
    /// Get the log level based on verbosity flags
    pub fn log_level(&self) -> tracing::Level {
        if self.quiet {
            return tracing::Level::ERROR;
        }
        match self.verbose {
            0 => tracing::Level::WARN,
            1 => tracing::Level::INFO,
            2 => tracing::Level::DEBUG,
            _ => tracing::Level::TRACE,
        }
    }
}
