//! Detection thresholds and time windows
//!
//! Every detector reads its bounds from [`DetectionConfig`]. The defaults are the
//! production constants; a JSON document may override any subset of them.

use chrono::Duration;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid configuration JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid bounds: {0}")]
    InvalidBounds(String),
}

/// Thresholds for all pattern detectors
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectionConfig {
    pub cycle_min_length: usize,
    pub cycle_max_length: usize,

    pub smurfing_window_hours: i64,
    /// Distinct counterparties needed inside one window
    pub smurfing_min_counterparties: usize,
    /// Flagged accounts needed before a smurfing ring is emitted
    pub smurfing_min_ring_members: usize,
    pub smurfing_ring_risk: f64,

    pub shell_min_length: usize,
    pub shell_max_length: usize,
    /// Interior nodes must have at most this many transactions
    pub shell_max_intermediary_transactions: usize,

    pub velocity_window_minutes: i64,
    pub velocity_min_transactions: usize,

    pub structuring_thresholds: Vec<f64>,
    pub structuring_margin: f64,
    pub structuring_min_hits: usize,

    /// Maximum relative amount difference between a transfer and its return leg
    pub round_trip_tolerance: f64,
    pub round_trip_window_days: i64,

    pub dormant_min_dataset_span_days: i64,
    pub dormant_burst_window_hours: i64,
    pub dormant_min_transactions: usize,
    pub dormant_burst_ratio: f64,
    /// Account span must exceed this many burst windows
    pub dormant_quiet_multiplier: i32,

    /// Accounts scoring below this are dropped from the output
    pub min_suspicion_score: f64,
}

impl Default for DetectionConfig {
    fn default() -> Self {
        Self {
            cycle_min_length: 3,
            cycle_max_length: 5,
            smurfing_window_hours: 72,
            smurfing_min_counterparties: 3,
            smurfing_min_ring_members: 2,
            smurfing_ring_risk: 80.0,
            shell_min_length: 4,
            shell_max_length: 6,
            shell_max_intermediary_transactions: 3,
            velocity_window_minutes: 30,
            velocity_min_transactions: 4,
            structuring_thresholds: vec![10_000.0, 5_000.0, 3_000.0],
            structuring_margin: 500.0,
            structuring_min_hits: 3,
            round_trip_tolerance: 0.15,
            round_trip_window_days: 7,
            dormant_min_dataset_span_days: 7,
            dormant_burst_window_hours: 48,
            dormant_min_transactions: 4,
            dormant_burst_ratio: 0.7,
            dormant_quiet_multiplier: 3,
            min_suspicion_score: 15.0,
        }
    }
}

impl DetectionConfig {
    /// Parse a configuration, filling omitted fields with defaults
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Check that every bound is usable
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.cycle_min_length < 2 || self.cycle_min_length > self.cycle_max_length {
            return Err(ConfigError::InvalidBounds(format!(
                "cycle length range {}..={} is empty or degenerate",
                self.cycle_min_length, self.cycle_max_length
            )));
        }

        if self.shell_min_length < 3 || self.shell_min_length > self.shell_max_length {
            return Err(ConfigError::InvalidBounds(format!(
                "shell chain length range {}..={} is empty or degenerate",
                self.shell_min_length, self.shell_max_length
            )));
        }

        let windows = [
            ("smurfing_window_hours", self.smurfing_window_hours),
            ("velocity_window_minutes", self.velocity_window_minutes),
            ("round_trip_window_days", self.round_trip_window_days),
            ("dormant_burst_window_hours", self.dormant_burst_window_hours),
        ];
        for (name, value) in windows {
            if value <= 0 {
                return Err(ConfigError::InvalidBounds(format!(
                    "{} must be positive, got {}",
                    name, value
                )));
            }
        }

        if !(0.0..1.0).contains(&self.round_trip_tolerance) {
            return Err(ConfigError::InvalidBounds(format!(
                "round_trip_tolerance {} outside [0, 1)",
                self.round_trip_tolerance
            )));
        }

        if !(0.0..=1.0).contains(&self.dormant_burst_ratio) {
            return Err(ConfigError::InvalidBounds(format!(
                "dormant_burst_ratio {} outside [0, 1]",
                self.dormant_burst_ratio
            )));
        }

        Ok(())
    }

    pub fn smurfing_window(&self) -> Duration {
        Duration::hours(self.smurfing_window_hours)
    }

    pub fn velocity_window(&self) -> Duration {
        Duration::minutes(self.velocity_window_minutes)
    }

    pub fn round_trip_window(&self) -> Duration {
        Duration::days(self.round_trip_window_days)
    }

    pub fn dormant_burst_window(&self) -> Duration {
        Duration::hours(self.dormant_burst_window_hours)
    }

    pub fn dormant_min_dataset_span(&self) -> Duration {
        Duration::days(self.dormant_min_dataset_span_days)
    }
}
