//! Command pipelines: check, repair, postrepair, reset, inspect

pub mod inspect;
pub mod orchestrator;

pub use inspect::inspect;
pub use orchestrator::{
    postrepair, print_differences, reset, run, run_with_marker, CleanupResult, Mode,
    PipelineResult, RepairOutcome, TrackOutcome,
};
