//! PlayerPulse session simulation core
//!
//! Turns heterogeneous daily game-popularity CSV snapshots into a synthetic,
//! cleaned dataset of user play sessions. The pipeline normalizes input
//! headers, ranks games by average peak players, draws sessions weighted by
//! that rank, and validates every row before it is written.

pub mod clean;
pub mod config;
pub mod error;
pub mod numbers;
pub mod output;
pub mod pipeline;
pub mod ranking;
pub mod rng;
pub mod sampling;
pub mod schema;
pub mod session;
pub mod synth;

// Re-export commonly used types
pub use clean::{CleanOutcome, CleanReport, SessionCleaner};
pub use config::SimulationConfig;
pub use error::{
    ConfigError, DropReason, OutputError, PipelineError, RecordError, SourceFileError,
};
pub use output::{write_sessions, write_sessions_to};
pub use pipeline::{CleanSummary, RunSummary, Simulation, clean_session_file, run, simulate};
pub use ranking::{PopularityEntry, PopularityTable, rank_popularity};
pub use rng::{CountingRng, SessionRng, derive_stream_seed};
pub use sampling::{DurationBounds, DurationModel, HourModel};
pub use schema::{
    CanonicalField, DirectoryScan, NormalizedBatch, NormalizedRecord, ScanReport, SkippedFile,
    normalize_file, normalize_header, normalize_reader,
};
pub use session::{RawSession, SESSION_HEADER, SessionRecord, TIMESTAMP_FORMAT};
pub use synth::{SessionSynthesizer, SynthesisPlan, synthesize_sessions};
