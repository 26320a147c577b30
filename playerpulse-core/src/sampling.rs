//! Time-of-day and duration models for synthetic sessions.

use chrono::TimeDelta;
use rand::Rng;
use rand_distr::{Distribution, LogNormal, Normal, Triangular};
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::numbers::{clamp_trunc_f64_to_u32, i64_to_f64, trunc_f64_to_i64};

const LAST_HOUR: u32 = 23;

/// Clamp a sampled hour into `0..=23`. Tails saturate instead of resampling.
#[must_use]
pub fn clamp_hour(raw: f64) -> u32 {
    clamp_trunc_f64_to_u32(raw, 0, LAST_HOUR)
}

/// Session start-hour model: normal on weekdays, triangular on weekends.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HourModel {
    #[serde(default = "HourModel::default_weekday_mean")]
    pub weekday_mean: f64,
    #[serde(default = "HourModel::default_weekday_std_dev")]
    pub weekday_std_dev: f64,
    #[serde(default = "HourModel::default_weekend_low")]
    pub weekend_low: f64,
    #[serde(default = "HourModel::default_weekend_mode")]
    pub weekend_mode: f64,
    #[serde(default = "HourModel::default_weekend_high")]
    pub weekend_high: f64,
}

impl HourModel {
    const fn default_weekday_mean() -> f64 {
        19.0
    }

    const fn default_weekday_std_dev() -> f64 {
        2.5
    }

    const fn default_weekend_low() -> f64 {
        12.0
    }

    const fn default_weekend_mode() -> f64 {
        20.0
    }

    const fn default_weekend_high() -> f64 {
        23.0
    }

    /// Check parameter ranges.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] naming the first invalid parameter.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (field, value) in [
            ("hours.weekday_mean", self.weekday_mean),
            ("hours.weekend_low", self.weekend_low),
            ("hours.weekend_mode", self.weekend_mode),
            ("hours.weekend_high", self.weekend_high),
        ] {
            if !(0.0..=f64::from(LAST_HOUR)).contains(&value) {
                return Err(ConfigError::HourRange { field, value });
            }
        }
        if !(self.weekday_std_dev.is_finite() && self.weekday_std_dev > 0.0) {
            return Err(ConfigError::NonPositive {
                field: "hours.weekday_std_dev",
                value: self.weekday_std_dev,
            });
        }
        if !(self.weekend_low <= self.weekend_mode && self.weekend_mode <= self.weekend_high) {
            return Err(self.triangular_error());
        }
        Ok(())
    }

    /// Build the distributions once for repeated sampling.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] if the parameters are invalid.
    pub fn sampler(&self) -> Result<HourSampler, ConfigError> {
        self.validate()?;
        let weekday = Normal::new(self.weekday_mean, self.weekday_std_dev).map_err(|_| {
            ConfigError::NonPositive {
                field: "hours.weekday_std_dev",
                value: self.weekday_std_dev,
            }
        })?;
        let weekend = Triangular::new(self.weekend_low, self.weekend_high, self.weekend_mode)
            .map_err(|_| self.triangular_error())?;
        Ok(HourSampler { weekday, weekend })
    }

    const fn triangular_error(&self) -> ConfigError {
        ConfigError::TriangularOrder {
            low: self.weekend_low,
            mode: self.weekend_mode,
            high: self.weekend_high,
        }
    }
}

impl Default for HourModel {
    fn default() -> Self {
        Self {
            weekday_mean: Self::default_weekday_mean(),
            weekday_std_dev: Self::default_weekday_std_dev(),
            weekend_low: Self::default_weekend_low(),
            weekend_mode: Self::default_weekend_mode(),
            weekend_high: Self::default_weekend_high(),
        }
    }
}

/// Prepared start-hour distributions.
#[derive(Debug, Clone, Copy)]
pub struct HourSampler {
    weekday: Normal<f64>,
    weekend: Triangular<f64>,
}

impl HourSampler {
    /// Draw a start hour in `0..=23`.
    pub fn sample<R: Rng + ?Sized>(&self, weekend: bool, rng: &mut R) -> u32 {
        let raw = if weekend {
            self.weekend.sample(rng)
        } else {
            self.weekday.sample(rng)
        };
        clamp_hour(raw)
    }
}

/// Closed range of allowed session lengths in minutes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DurationBounds {
    #[serde(default = "DurationBounds::default_min_minutes")]
    pub min_minutes: i64,
    #[serde(default = "DurationBounds::default_max_minutes")]
    pub max_minutes: i64,
}

impl DurationBounds {
    const fn default_min_minutes() -> i64 {
        15
    }

    const fn default_max_minutes() -> i64 {
        600
    }

    #[must_use]
    pub const fn contains(&self, minutes: i64) -> bool {
        minutes >= self.min_minutes && minutes <= self.max_minutes
    }

    /// Clamp a raw sample into the bounds and truncate it to whole minutes.
    #[must_use]
    pub fn clamp_minutes(&self, raw: f64) -> i64 {
        if raw.is_nan() {
            return self.min_minutes;
        }
        let clamped = raw
            .max(i64_to_f64(self.min_minutes))
            .min(i64_to_f64(self.max_minutes));
        trunc_f64_to_i64(clamped)
            .max(self.min_minutes)
            .min(self.max_minutes)
    }

    /// # Errors
    ///
    /// Returns [`ConfigError::DurationBounds`] unless `1 <= min <= max` and
    /// `max` minutes is representable as a time span.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.min_minutes < 1
            || self.min_minutes > self.max_minutes
            || TimeDelta::try_minutes(self.max_minutes).is_none()
        {
            return Err(ConfigError::DurationBounds {
                min: self.min_minutes,
                max: self.max_minutes,
            });
        }
        Ok(())
    }
}

impl Default for DurationBounds {
    fn default() -> Self {
        Self {
            min_minutes: Self::default_min_minutes(),
            max_minutes: Self::default_max_minutes(),
        }
    }
}

/// Log-normal session length model, parameterised in log-space.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DurationModel {
    #[serde(default = "DurationModel::default_mu")]
    pub mu: f64,
    #[serde(default = "DurationModel::default_sigma")]
    pub sigma: f64,
    #[serde(default)]
    pub bounds: DurationBounds,
}

impl DurationModel {
    const fn default_mu() -> f64 {
        3.8
    }

    const fn default_sigma() -> f64 {
        1.0
    }

    /// # Errors
    ///
    /// Returns a [`ConfigError`] naming the first invalid parameter.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.mu.is_finite() {
            return Err(ConfigError::NotFinite {
                field: "duration.mu",
                value: self.mu,
            });
        }
        if !(self.sigma.is_finite() && self.sigma > 0.0) {
            return Err(ConfigError::NonPositive {
                field: "duration.sigma",
                value: self.sigma,
            });
        }
        self.bounds.validate()
    }

    /// # Errors
    ///
    /// Returns a [`ConfigError`] if the parameters are invalid.
    pub fn sampler(&self) -> Result<DurationSampler, ConfigError> {
        self.validate()?;
        let dist = LogNormal::new(self.mu, self.sigma).map_err(|_| ConfigError::NonPositive {
            field: "duration.sigma",
            value: self.sigma,
        })?;
        Ok(DurationSampler {
            dist,
            bounds: self.bounds,
        })
    }
}

impl Default for DurationModel {
    fn default() -> Self {
        Self {
            mu: Self::default_mu(),
            sigma: Self::default_sigma(),
            bounds: DurationBounds::default(),
        }
    }
}

/// Prepared duration distribution with its clamp bounds.
#[derive(Debug, Clone, Copy)]
pub struct DurationSampler {
    dist: LogNormal<f64>,
    bounds: DurationBounds,
}

impl DurationSampler {
    /// Draw a session length in whole minutes, always within the bounds.
    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> i64 {
        self.bounds.clamp_minutes(self.dist.sample(rng))
    }

    #[must_use]
    pub const fn bounds(&self) -> DurationBounds {
        self.bounds
    }
}
