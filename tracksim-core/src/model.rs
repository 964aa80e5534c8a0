//! Telemetry event record
//!
//! One flat, immutable snapshot per emitted event. The field order is the
//! column order of tabular sinks, and the serialized names are the keys the
//! downstream collector expects.

use crate::units::*;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Who is driving what
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CarIdentity {
    pub car_id: String,
    pub driver: String,
    pub team: String,
}

impl Default for CarIdentity {
    fn default() -> Self {
        Self {
            car_id: "#34".to_string(),
            driver: "Nick Parke".to_string(),
            team: "Zenith Racing".to_string(),
        }
    }
}

/// A single telemetry sample
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TelemetryEvent {
    #[serde(rename = "carId")]
    pub car_id: String,
    pub driver: String,
    pub team: String,
    /// Vehicle preset the car runs
    pub vehicle_class: String,
    pub lap: u32,
    #[serde(rename = "speed")]
    pub speed_kmh: KilometersPerHour,
    pub rpm: Rpm,
    pub timestamp: DateTime<Utc>,

    /// Gate index; present only on gate-crossing events
    pub gate: Option<u32>,
    /// Time since the previous gate crossing
    pub split_time: Option<Seconds>,

    pub gear: u8,
    pub throttle: Percentage,
    pub brake: Percentage,
    pub steering_deg: Degrees,
    pub fuel_l: Liters,
    pub tyre_wear: TyreWear,

    /// Time since the previous start/finish crossing; only on completed laps
    pub lap_time: Option<Seconds>,
    /// Simulated time since the session started
    pub race_time: Seconds,
    /// Distance along the current lap
    pub position_m: Meters,
}

impl TelemetryEvent {
    /// Whether this event marks a gate crossing
    pub fn is_gate_event(&self) -> bool {
        self.gate.is_some()
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}
