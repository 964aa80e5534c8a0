//! Run configuration
//!
//! Everything that shapes a run is passed in explicitly at construction; the
//! engine never reads process-wide state.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracksim_core::{CarIdentity, SimError};

/// Default tick size (s), 20 Hz
pub const DEFAULT_DT: f64 = 0.05;

/// Pace restriction for the opening part of lap 1
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutlapConfig {
    pub speed_kmh: f64,
    /// Distance along lap 1 where the restriction ends
    pub end_m: f64,
}

impl Default for OutlapConfig {
    fn default() -> Self {
        Self {
            speed_kmh: 80.0,
            end_m: 600.0,
        }
    }
}

impl OutlapConfig {
    pub fn speed_mps(&self) -> f64 {
        self.speed_kmh / 3.6
    }
}

/// When the cached per-segment target speeds are recomputed
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum TargetRefresh {
    /// Every tick
    #[default]
    EveryTick,
    /// Each tick with the given probability, drawn from the run's random source
    Stochastic { probability: f64 },
}

/// Parameters of a single simulated session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunConfig {
    /// Fixed tick size (s)
    pub dt: f64,
    /// Simulated session length (s)
    pub sim_time_s: f64,
    /// Emit a snapshot on every tick, not just on gate crossings
    pub high_frequency: bool,
    /// Seed for steering noise; entropy when absent
    pub seed: Option<u64>,
    pub identity: CarIdentity,
    pub outlap: OutlapConfig,
    pub target_refresh: TargetRefresh,
    /// Wall-clock time of race time zero; event timestamps are `epoch + race_time`
    pub epoch: Option<DateTime<Utc>>,
    /// Speed at the start of the run (m/s)
    pub initial_speed_mps: f64,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            dt: DEFAULT_DT,
            sim_time_s: 360.0,
            high_frequency: false,
            seed: None,
            identity: CarIdentity::default(),
            outlap: OutlapConfig::default(),
            target_refresh: TargetRefresh::default(),
            epoch: None,
            initial_speed_mps: 5.0,
        }
    }
}

impl RunConfig {
    /// Number of ticks the run will execute
    pub fn total_ticks(&self) -> u64 {
        (self.sim_time_s / self.dt).floor() as u64
    }

    pub fn validate(&self) -> Result<(), SimError> {
        if !self.dt.is_finite() || self.dt <= 0.0 {
            return Err(SimError::InvalidConfig(format!("tick size must be positive, got {}", self.dt)));
        }
        if !self.sim_time_s.is_finite() || self.sim_time_s < 0.0 {
            return Err(SimError::InvalidConfig(format!(
                "simulated time must be non-negative, got {}",
                self.sim_time_s
            )));
        }
        if self.identity.car_id.trim().is_empty() {
            return Err(SimError::InvalidConfig("car id must not be empty".into()));
        }
        if !self.initial_speed_mps.is_finite() || self.initial_speed_mps < 0.0 {
            return Err(SimError::InvalidConfig(format!(
                "initial speed must be non-negative, got {}",
                self.initial_speed_mps
            )));
        }
        if let TargetRefresh::Stochastic { probability } = self.target_refresh {
            if !(0.0..=1.0).contains(&probability) {
                return Err(SimError::InvalidConfig(format!(
                    "refresh probability must be within [0, 1], got {}",
                    probability
                )));
            }
        }
        Ok(())
    }
}
