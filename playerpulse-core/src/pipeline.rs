//! End-to-end runs: normalize, rank, synthesize, clean, write.

use std::path::{Path, PathBuf};

use log::{info, warn};
use serde::Serialize;

use crate::clean::{CleanReport, SessionCleaner};
use crate::config::SimulationConfig;
use crate::error::{ConfigError, PipelineError};
use crate::output::write_sessions;
use crate::ranking::{PopularityTable, rank_popularity};
use crate::sampling::DurationBounds;
use crate::schema::{DirectoryScan, ScanReport};
use crate::session::SessionRecord;
use crate::synth::synthesize_sessions;

/// In-memory result of the generation stages, before anything is written.
#[derive(Debug, Clone)]
pub struct Simulation {
    pub table: PopularityTable,
    pub sessions: Vec<SessionRecord>,
    pub scan: ScanReport,
    pub clean: CleanReport,
    pub generated: usize,
}

/// Counts reported after a completed run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RunSummary {
    pub scan: ScanReport,
    pub games_ranked: usize,
    pub max_rank: u32,
    pub unnamed_rows: usize,
    pub sessions_generated: usize,
    pub clean: CleanReport,
    pub output_path: PathBuf,
    pub seed: u64,
    pub workers: usize,
}

/// Counts reported after re-cleaning an existing session file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CleanSummary {
    pub input_path: PathBuf,
    pub output_path: PathBuf,
    pub clean: CleanReport,
}

/// Run every stage except the final write.
///
/// # Errors
///
/// Returns a [`PipelineError`] if the configuration is invalid, no input
/// file is usable, or no named game survives normalization.
pub fn simulate(config: &SimulationConfig) -> Result<Simulation, PipelineError> {
    config.validate()?;

    let (batches, scan) = DirectoryScan::open(&config.data_dir)?.collect_batches()?;
    let table = rank_popularity(batches.into_iter().flat_map(|batch| batch.records));
    if table.unnamed_rows() > 0 {
        warn!("Ignored {} rows without a game name", table.unnamed_rows());
    }
    if table.is_empty() {
        return Err(ConfigError::EmptyPopularity.into());
    }
    info!(
        "Ranked {} games by average peak players (max rank {})",
        table.len(),
        table.max_rank()
    );

    let raw = synthesize_sessions(&table, &config.plan())?;
    let generated = raw.len();
    let outcome = SessionCleaner::with_bounds(config.duration.bounds).clean(raw);

    Ok(Simulation {
        table,
        sessions: outcome.sessions,
        scan,
        clean: outcome.report,
        generated,
    })
}

/// Run the whole pipeline and write the cleaned dataset.
///
/// # Errors
///
/// Returns a [`PipelineError`] on any fatal condition. Nothing is written
/// when cleaning leaves no sessions.
pub fn run(config: &SimulationConfig) -> Result<RunSummary, PipelineError> {
    let simulation = simulate(config)?;
    if simulation.sessions.is_empty() {
        return Err(PipelineError::EmptyDataset {
            dropped: simulation.clean.rows_dropped(),
        });
    }
    write_sessions(&config.output_path, &simulation.sessions)?;

    Ok(RunSummary {
        games_ranked: simulation.table.len(),
        max_rank: simulation.table.max_rank(),
        unnamed_rows: simulation.table.unnamed_rows(),
        sessions_generated: simulation.generated,
        scan: simulation.scan,
        clean: simulation.clean,
        output_path: config.output_path.clone(),
        seed: config.seed,
        workers: config.workers,
    })
}

/// Re-validate an existing raw session file and write the surviving rows.
///
/// # Errors
///
/// Returns a [`PipelineError`] if the input cannot be read, every row is
/// dropped, or the output cannot be written.
pub fn clean_session_file(
    input: &Path,
    output: &Path,
    bounds: Option<DurationBounds>,
) -> Result<CleanSummary, PipelineError> {
    if let Some(bounds) = bounds {
        bounds.validate()?;
    }
    let cleaner = bounds.map_or_else(SessionCleaner::new, SessionCleaner::with_bounds);
    let outcome = cleaner.clean_file(input)?;
    if outcome.sessions.is_empty() {
        return Err(PipelineError::EmptyDataset {
            dropped: outcome.report.rows_dropped(),
        });
    }
    write_sessions(output, &outcome.sessions)?;
    Ok(CleanSummary {
        input_path: input.to_path_buf(),
        output_path: output.to_path_buf(),
        clean: outcome.report,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn config_for(dir: &Path) -> SimulationConfig {
        SimulationConfig {
            data_dir: dir.join("data"),
            output_path: dir.join("out").join("sessions.csv"),
            num_users: 20,
            target_session_count: 200,
            simulation_days: 7,
            ..SimulationConfig::default()
        }
    }

    #[test]
    fn unnamed_only_input_is_an_empty_ranking() {
        let dir = tempfile::tempdir().unwrap();
        let config = config_for(dir.path());
        fs::create_dir_all(&config.data_dir).unwrap();
        fs::write(config.data_dir.join("a.csv"), "name,peak_players\n,100\n").unwrap();
        let err = simulate(&config).unwrap_err();
        assert!(matches!(
            err,
            PipelineError::Config(ConfigError::EmptyPopularity)
        ));
    }

    #[test]
    fn invalid_config_fails_before_reading_input() {
        let dir = tempfile::tempdir().unwrap();
        let config = SimulationConfig {
            num_users: 0,
            ..config_for(dir.path())
        };
        let err = run(&config).unwrap_err();
        assert!(matches!(
            err,
            PipelineError::Config(ConfigError::MinViolation { field: "num_users", .. })
        ));
        assert!(!config.output_path.exists());
    }

    #[test]
    fn run_summary_counts_every_stage() {
        let dir = tempfile::tempdir().unwrap();
        let config = config_for(dir.path());
        fs::create_dir_all(&config.data_dir).unwrap();
        fs::write(
            config.data_dir.join("day1.csv"),
            "Game,PeakPlayers\nAlpha,300\nBeta,100\n,7\n",
        )
        .unwrap();
        let summary = run(&config).unwrap();
        assert_eq!(summary.games_ranked, 2);
        assert_eq!(summary.max_rank, 2);
        assert_eq!(summary.unnamed_rows, 1);
        assert_eq!(summary.sessions_generated, 200);
        assert_eq!(summary.clean.rows_in, 200);
        assert_eq!(summary.clean.rows_kept, 200);
        assert!(summary.output_path.exists());
    }

    #[test]
    fn clean_file_with_no_valid_rows_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("raw.csv");
        let output = dir.path().join("clean.csv");
        fs::write(
            &input,
            "user_id,game_id,session_start,session_end,session_duration,day_of_week,hour_of_day\n\
USER_0001,Alpha,2024-01-01T10:00:00,2024-01-01T09:00:00,60,Monday,10\n",
        )
        .unwrap();
        let err = clean_session_file(&input, &output, None).unwrap_err();
        assert!(matches!(err, PipelineError::EmptyDataset { dropped: 1 }));
        assert!(!output.exists());
    }
}
