//! Run configuration loaded from JSON, with defaults for every field.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::{Days, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::numbers::usize_to_u64;
use crate::sampling::{DurationModel, HourModel};
use crate::synth::SynthesisPlan;

/// Options for one simulation run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SimulationConfig {
    #[serde(default = "SimulationConfig::default_data_dir")]
    pub data_dir: PathBuf,
    #[serde(default = "SimulationConfig::default_output_path")]
    pub output_path: PathBuf,
    #[serde(default = "SimulationConfig::default_num_users")]
    pub num_users: usize,
    #[serde(default = "SimulationConfig::default_target_session_count")]
    pub target_session_count: usize,
    #[serde(default = "SimulationConfig::default_start_date")]
    pub start_date: NaiveDate,
    #[serde(default = "SimulationConfig::default_simulation_days")]
    pub simulation_days: u32,
    #[serde(default = "SimulationConfig::default_seed")]
    pub seed: u64,
    #[serde(default = "SimulationConfig::default_workers")]
    pub workers: usize,
    #[serde(default)]
    pub hours: HourModel,
    #[serde(default)]
    pub duration: DurationModel,
}

impl SimulationConfig {
    fn default_data_dir() -> PathBuf {
        PathBuf::from("data")
    }

    fn default_output_path() -> PathBuf {
        PathBuf::from("output/cleaned_sessions.csv")
    }

    const fn default_num_users() -> usize {
        1_000
    }

    const fn default_target_session_count() -> usize {
        10_000
    }

    fn default_start_date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, 1).unwrap_or_default()
    }

    const fn default_simulation_days() -> u32 {
        30
    }

    const fn default_seed() -> u64 {
        42
    }

    const fn default_workers() -> usize {
        1
    }

    /// Parse a JSON document; absent fields take their defaults.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] if the document is malformed.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        serde_json::from_str(json).map_err(|err| ConfigError::Parse(err.to_string()))
    }

    /// Read and parse a JSON config file. The result is not yet validated.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Read`] or [`ConfigError::Parse`].
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let raw = fs::read_to_string(path).map_err(|err| ConfigError::Read {
            path: path.to_path_buf(),
            message: err.to_string(),
        })?;
        Self::from_json(&raw)
    }

    /// # Errors
    ///
    /// Returns the first [`ConfigError`] found.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (field, value) in [
            ("num_users", usize_to_u64(self.num_users)),
            ("target_session_count", usize_to_u64(self.target_session_count)),
            ("simulation_days", u64::from(self.simulation_days)),
            ("workers", usize_to_u64(self.workers)),
        ] {
            if value < 1 {
                return Err(ConfigError::MinViolation {
                    field,
                    min: 1,
                    value,
                });
            }
        }
        self.hours.validate()?;
        self.duration.validate()?;
        if self
            .start_date
            .checked_add_days(Days::new(u64::from(self.simulation_days)))
            .is_none()
        {
            return Err(ConfigError::DateWindow {
                start: self.start_date.to_string(),
                days: self.simulation_days,
            });
        }
        Ok(())
    }

    /// Synthesis parameters for this configuration.
    #[must_use]
    pub fn plan(&self) -> SynthesisPlan {
        SynthesisPlan {
            num_users: self.num_users,
            target_session_count: self.target_session_count,
            start_date: self.start_date,
            simulation_days: self.simulation_days,
            seed: self.seed,
            workers: self.workers,
            hours: self.hours,
            duration: self.duration,
        }
    }
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            data_dir: Self::default_data_dir(),
            output_path: Self::default_output_path(),
            num_users: Self::default_num_users(),
            target_session_count: Self::default_target_session_count(),
            start_date: Self::default_start_date(),
            simulation_days: Self::default_simulation_days(),
            seed: Self::default_seed(),
            workers: Self::default_workers(),
            hours: HourModel::default(),
            duration: DurationModel::default(),
        }
    }
}
