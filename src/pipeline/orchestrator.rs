//! Pipeline orchestration
//!
//! Coordinates library discovery, parallel tag reads, consensus, the
//! difference engine, and (in repair mode) backups and tag rewrites.
//! Reads run on a bounded rayon pool; everything after the read barrier
//! runs on the calling thread, one album at a time.

use crate::backup;
use crate::config::Settings;
use crate::consensus::{self, NoConsensus};
use crate::dirty::{self, DirtyMarker};
use crate::discovery;
use crate::error::{RepairError, Result};
use crate::metadata::{reconcile, TrackMetadata, TrackState};
use crate::tags::{read_tags, rewrite_tags};
use crate::types::{Library, Source, TrackId};
use indicatif::{ProgressBar, ProgressStyle};
use rayon::prelude::*;
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{debug, error, info, warn};

/// What to do with the differences found
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// Report differences only
    Check,
    /// Rewrite tags that disagree
    Repair,
}

/// Result of attempting to rewrite one track
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", content = "error", rename_all = "snake_case")]
pub enum RepairOutcome {
    NotAttempted,
    Repaired,
    Failed(String),
}

/// Per-track summary
#[derive(Debug, Clone, Serialize)]
pub struct TrackOutcome {
    pub path: PathBuf,
    pub artist: String,
    pub album: String,
    pub number: u32,
    pub name: String,
    pub state: TrackState,
    pub error_causes: Vec<String>,
    pub differences: Vec<String>,
    pub repair: RepairOutcome,
}

/// Pipeline result summary
#[derive(Debug, Default)]
pub struct PipelineResult {
    pub total_tracks: usize,
    pub clean: usize,
    pub needs_edit: usize,
    pub partial_error: usize,
    pub no_metadata: usize,
    pub repaired: usize,
    pub repair_failed: usize,
    pub no_consensus: Vec<NoConsensus>,
    pub tracks: Vec<TrackOutcome>,
}

impl PipelineResult {
    /// True when any track could not be read or could not be repaired
    pub fn has_failures(&self) -> bool {
        self.no_metadata > 0 || self.repair_failed > 0
    }
}

/// Postrepair summary
#[derive(Debug, Default)]
pub struct CleanupResult {
    pub albums: usize,
    pub removed: usize,
    pub failed: usize,
}

/// Run `check` or `repair` over the whole library
pub fn run(settings: &Settings, mode: Mode) -> Result<PipelineResult> {
    let marker = dirty::open(settings.state_dir.as_deref());
    run_with_marker(settings, mode, marker.as_ref())
}

/// Same as [`run`], with an explicit dirty-state backend
pub fn run_with_marker(
    settings: &Settings,
    mode: Mode,
    marker: &dyn DirtyMarker,
) -> Result<PipelineResult> {
    let pipeline_start = Instant::now();
    if mode == Mode::Check && marker.is_dirty() {
        warn!("Files have been repaired since the last reset; run `mp3repair reset` once you are satisfied");
    }

    info!("Scanning {}...", settings.top_dir.display());
    let mut library = discovery::scan(&settings.top_dir, &settings.extension)?;
    if library.is_empty() {
        return Ok(PipelineResult::default());
    }

    let read_start = Instant::now();
    read_metadata(&mut library, settings)?;
    info!(
        "Read {} tracks in {:.2}s",
        library.tracks.len(),
        read_start.elapsed().as_secs_f64()
    );

    let no_consensus = reconcile_library(&mut library);

    let mut result = summarize(&library);
    result.no_consensus = no_consensus;

    match mode {
        Mode::Check => print_differences(&result.tracks),
        Mode::Repair => repair_library(&library, &mut result, marker),
    }

    info!(
        "Total pipeline time: {:.2}s",
        pipeline_start.elapsed().as_secs_f64()
    );
    Ok(result)
}

/// Read every track's tags on a pool of `settings.workers` threads
pub fn read_metadata(library: &mut Library, settings: &Settings) -> Result<()> {
    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(settings.workers)
        .build()
        .map_err(|e| RepairError::ConfigError(format!("Failed to build thread pool: {}", e)))?;
    debug!("Reading with {} workers", settings.workers);

    let progress_bar = if settings.show_progress {
        let pb = ProgressBar::new(library.tracks.len() as u64);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({percent}%) {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("=>-"),
        );
        Some(pb)
    } else {
        None
    };

    pool.install(|| {
        library.tracks.par_iter_mut().for_each(|track| {
            let metadata = TrackMetadata::read(&track.path);
            if !metadata.is_valid() {
                error!(
                    "Cannot read metadata from {}: {}",
                    track.path.display(),
                    metadata.error_causes().join("; ")
                );
            }
            track.metadata = Some(metadata);
            if let Some(ref pb) = progress_bar {
                pb.inc(1);
                pb.set_message(track.file_name.clone());
            }
        });
    });

    if let Some(pb) = progress_bar {
        pb.finish_with_message("Read complete");
    }
    Ok(())
}

/// Resolve consensus, then compare every track against its canonical values
pub fn reconcile_library(library: &mut Library) -> Vec<NoConsensus> {
    let no_consensus = consensus::resolve_library(library);
    for id in library.track_ids().collect::<Vec<_>>() {
        let external = consensus::external_values(library, id);
        if let Some(metadata) = library.track_mut(id).metadata.as_mut() {
            metadata.clear_corrections();
            reconcile(metadata, &external);
        }
    }
    no_consensus
}

fn summarize(library: &Library) -> PipelineResult {
    let mut result = PipelineResult {
        total_tracks: library.tracks.len(),
        ..Default::default()
    };
    for id in library.track_ids() {
        let outcome = track_outcome(library, id);
        match outcome.state {
            TrackState::Clean => result.clean += 1,
            TrackState::NeedsEdit => result.needs_edit += 1,
            TrackState::PartialError => result.partial_error += 1,
            TrackState::NoMetadata => result.no_metadata += 1,
        }
        result.tracks.push(outcome);
    }
    result
}

fn track_outcome(library: &Library, id: TrackId) -> TrackOutcome {
    let track = library.track(id);
    let album = library.album_of(id);
    let artist = library.artist_of(track.album);
    let (state, error_causes, differences) = match &track.metadata {
        Some(metadata) => (
            metadata.state(),
            metadata.error_causes().into_iter().map(String::from).collect(),
            metadata.differences(),
        ),
        None => (TrackState::NoMetadata, Vec::new(), Vec::new()),
    };
    TrackOutcome {
        path: track.path.clone(),
        artist: artist.name.clone(),
        album: album.name.clone(),
        number: track.number,
        name: track.name.clone(),
        state,
        error_causes,
        differences,
        repair: RepairOutcome::NotAttempted,
    }
}

/// Print one block per track that has conflicts or could not be read
pub fn print_differences(tracks: &[TrackOutcome]) {
    for track in tracks {
        if track.state == TrackState::Clean {
            continue;
        }
        println!("{}", track_heading(track));
        for line in report_lines(track) {
            println!("  * {}", line);
        }
    }
}

/// Error causes first, then differences in the tags that could be read
fn report_lines(track: &TrackOutcome) -> Vec<String> {
    track
        .error_causes
        .iter()
        .chain(&track.differences)
        .cloned()
        .collect()
}

fn track_heading(track: &TrackOutcome) -> String {
    format!(
        "Artist {:?} album {:?} track {} {:?}",
        track.artist, track.album, track.number, track.name
    )
}

fn repair_library(library: &Library, result: &mut PipelineResult, marker: &dyn DirtyMarker) {
    for album in library.album_ids() {
        for &id in &library.album(album).tracks {
            let track = library.track(id);
            let Some(metadata) = track.metadata.as_ref() else {
                continue;
            };
            if !metadata.state().needs_repair() {
                continue;
            }
            let outcome = match backup::backup(&track.path, &library.album(album).path)
                .and_then(|_| repair_track(&track.path, metadata))
            {
                Ok(()) => {
                    info!("Repaired {}", track.path.display());
                    result.repaired += 1;
                    RepairOutcome::Repaired
                }
                Err(e) => {
                    error!("Cannot repair {}: {}", track.path.display(), e);
                    result.repair_failed += 1;
                    RepairOutcome::Failed(e.to_string())
                }
            };
            result.tracks[id.0].repair = outcome;
        }
    }

    if result.repaired > 0 {
        if let Err(e) = marker.mark() {
            warn!("Could not set the dirty marker: {}", e);
        }
    }
}

/// Apply a track's corrections to the tags now on disk and rewrite the file
pub fn repair_track(path: &Path, metadata: &TrackMetadata) -> Result<()> {
    let tags = read_tags(path)?;
    let v1 = if metadata.edit_required(Source::V1) {
        let mut tag = tags.v1?;
        metadata.corrections(Source::V1).apply_to_v1(&mut tag);
        Some(tag)
    } else {
        None
    };
    let v2 = if metadata.edit_required(Source::V2) {
        let mut tag = tags.v2?;
        metadata.corrections(Source::V2).apply_to_v2(&mut tag);
        Some(tag)
    } else {
        None
    };
    if v1.is_none() && v2.is_none() {
        return Ok(());
    }
    rewrite_tags(path, v2.as_ref(), v1.as_ref())
}

/// Delete the backup directory of every album
pub fn postrepair(settings: &Settings) -> Result<CleanupResult> {
    let marker = dirty::open(settings.state_dir.as_deref());
    if marker.is_dirty() {
        warn!("Files have been repaired since the last reset; backups are about to be removed");
    }

    let library = discovery::scan(&settings.top_dir, &settings.extension)?;
    let mut result = CleanupResult {
        albums: library.albums.len(),
        ..Default::default()
    };
    for album in &library.albums {
        match backup::cleanup(&album.path) {
            Ok(true) => result.removed += 1,
            Ok(false) => {}
            Err(e) => {
                error!("Cannot remove backups for {}: {}", album.path.display(), e);
                result.failed += 1;
            }
        }
    }
    Ok(result)
}

/// Clear the dirty marker
pub fn reset(settings: &Settings) -> Result<()> {
    let marker = dirty::open(settings.state_dir.as_deref());
    marker.clear()?;
    info!("Dirty marker cleared ({})", marker.name());
    Ok(())
}
