//! mp3repair CLI entry point

use clap::Parser;
use mp3repair::config::{Cli, Command, Settings};
use mp3repair::export;
use mp3repair::pipeline::{self, Mode, PipelineResult};
use mp3repair::RepairError;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

fn main() -> ExitCode {
    // Parse CLI arguments
    let cli = Cli::parse();

    // Initialize logging
    init_logging(&cli);

    // Build settings from CLI
    let settings = Settings::from_cli(&cli);

    match run_command(&cli.command, &settings) {
        Ok(code) => code,
        Err(e) if !e.is_recoverable() => {
            eprintln!("Fatal error: {}", e);
            ExitCode::from(2)
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::from(1)
        }
    }
}

fn run_command(command: &Command, settings: &Settings) -> Result<ExitCode, RepairError> {
    match command {
        Command::Check => {
            let result = pipeline::run(settings, Mode::Check)?;
            finish(&result, "check", settings)
        }
        Command::Repair { dry_run: true } => {
            let result = pipeline::run(settings, Mode::Check)?;
            println!();
            println!("Dry run: {} tracks would be repaired", result.needs_edit + result.partial_error);
            finish(&result, "repair --dry-run", settings)
        }
        Command::Repair { dry_run: false } => {
            let result = pipeline::run(settings, Mode::Repair)?;
            finish(&result, "repair", settings)
        }
        Command::Postrepair => {
            let result = pipeline::postrepair(settings)?;
            println!(
                "Removed backups from {} of {} albums ({} failed)",
                result.removed, result.albums, result.failed
            );
            Ok(exit_code(result.failed > 0))
        }
        Command::Reset => {
            pipeline::reset(settings)?;
            Ok(ExitCode::SUCCESS)
        }
        Command::Inspect { file } => {
            for line in pipeline::inspect(file)? {
                println!("{}", line);
            }
            Ok(ExitCode::SUCCESS)
        }
    }
}

fn finish(result: &PipelineResult, command: &str, settings: &Settings) -> Result<ExitCode, RepairError> {
    if let Some(path) = &settings.report {
        export::write_report(result, command, path)?;
    }

    println!();
    println!(
        "Summary: {} clean, {} need edits, {} partially unreadable, {} unreadable (of {} total)",
        result.clean, result.needs_edit, result.partial_error, result.no_metadata, result.total_tracks
    );
    if result.repaired > 0 || result.repair_failed > 0 {
        println!(
            "Repaired {} tracks, {} failed",
            result.repaired, result.repair_failed
        );
    }
    Ok(exit_code(result.has_failures()))
}

fn exit_code(failed: bool) -> ExitCode {
    if failed {
        ExitCode::from(1)
    } else {
        ExitCode::SUCCESS
    }
}

fn init_logging(cli: &Cli) {
    let filter = cli.log_level().to_string().to_lowercase();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}
