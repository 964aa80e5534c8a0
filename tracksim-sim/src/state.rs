//! Mutable vehicle state and per-tick diagnostics

use serde::Serialize;

/// Vehicle state owned and advanced by the engine
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VehicleState {
    /// Distance travelled since the start (m); lap position is this modulo lap length
    pub position_m: f64,
    pub speed_mps: f64,
    /// 1-indexed forward gear
    pub gear: u8,
    pub rpm: f64,
    pub throttle: f64,
    pub brake: f64,
    pub steering_deg: f64,
    pub fuel_l: f64,
    pub tyre_wear: f64,
    pub lap: u32,
    /// Simulated time since the start (s)
    pub time_s: f64,
}

impl VehicleState {
    /// State on the grid: full tank, fresh tyres, first gear
    pub fn on_grid(fuel_l: f64, speed_mps: f64) -> Self {
        Self {
            position_m: 0.0,
            speed_mps: speed_mps.max(0.0),
            gear: 1,
            rpm: 1000.0,
            throttle: 0.0,
            brake: 0.0,
            steering_deg: 0.0,
            fuel_l: fuel_l.max(0.0),
            tyre_wear: 0.0,
            lap: 1,
            time_s: 0.0,
        }
    }
}

/// Intermediate values from one tick, for observability and tests
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Diagnostics {
    pub accel_mps2: f64,
    pub available_kw: f64,
    pub mech_power_used_kw: f64,
    pub fuel_lps: f64,
    pub lateral_accel_mps2: f64,
    pub segment_index: usize,
    pub target_speed_mps: f64,
    pub steering_deg: f64,
    /// Gear selection picked a different gear this tick
    pub gear_changed: bool,
    /// Lap position wrapped past the start/finish line this tick
    pub lap_completed: bool,
}
