//! Type-safe wrappers for physical units
//!
//! Newtype wrappers around f64 used at the telemetry boundary so that a
//! speed in km/h can never be confused with one in m/s.
//!
//! Each unit serializes with the precision the telemetry feed publishes
//! (3 decimals unless noted otherwise).

use serde::{Deserialize, Serialize};

/// Standard gravity (m/s²)
pub const G: f64 = 9.81;

/// Conversion factor between m/s and km/h
pub const MPS_TO_KMH: f64 = 3.6;

fn round_to(val: f64, decimals: i32) -> f64 {
    let scale = 10f64.powi(decimals);
    (val * scale).round() / scale
}

pub(crate) fn round2<S: serde::Serializer>(val: &f64, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_f64(round_to(*val, 2))
}

pub(crate) fn round3<S: serde::Serializer>(val: &f64, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_f64(round_to(*val, 3))
}

pub(crate) fn round4<S: serde::Serializer>(val: &f64, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_f64(round_to(*val, 4))
}

/// Meters
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
pub struct Meters(#[serde(serialize_with = "round3")] pub f64);

/// Meters per second
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
pub struct MetersPerSecond(#[serde(serialize_with = "round3")] pub f64);

impl MetersPerSecond {
    pub fn to_kmh(self) -> KilometersPerHour {
        KilometersPerHour(self.0 * MPS_TO_KMH)
    }
}

/// Kilometers per hour
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
pub struct KilometersPerHour(#[serde(serialize_with = "round3")] pub f64);

impl KilometersPerHour {
    pub fn to_mps(self) -> MetersPerSecond {
        MetersPerSecond(self.0 / MPS_TO_KMH)
    }
}

/// Revolutions per minute, published as a whole number
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Rpm(pub u32);

impl Rpm {
    pub fn from_f64(rpm: f64) -> Self {
        if rpm.is_finite() && rpm > 0.0 {
            Self(rpm.round() as u32)
        } else {
            Self(0)
        }
    }
}

/// Steering wheel angle in degrees (2 decimals)
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
pub struct Degrees(#[serde(serialize_with = "round2")] pub f64);

/// Liters (fuel)
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
pub struct Liters(#[serde(serialize_with = "round3")] pub f64);

/// Seconds (race time, splits, lap times)
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
pub struct Seconds(#[serde(serialize_with = "round3")] pub f64);

/// Pedal position (0.0 to 1.0)
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
pub struct Percentage(#[serde(serialize_with = "round3")] pub f64);

impl Percentage {
    /// Create a new percentage, clamping to [0.0, 1.0]
    pub fn new(value: f64) -> Self {
        if value.is_nan() {
            return Self(0.0);
        }
        Self(value.clamp(0.0, 1.0))
    }

    /// Get as percentage (0-100)
    pub fn as_percent(&self) -> f64 {
        self.0 * 100.0
    }
}

/// Scalar tyre degradation (0.0 = new, 0.99 = worn out), 4 decimals
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
pub struct TyreWear(#[serde(serialize_with = "round4")] pub f64);
