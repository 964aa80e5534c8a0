//! Vehicle parameter presets
//!
//! A preset is an immutable bundle of physical constants plus the driver
//! profile that steers the car. Presets are looked up by name at startup and
//! read by the engine on every tick; nothing here changes during a run.

use crate::error::SimError;
use serde::{Deserialize, Serialize};

/// Preset used when the requested one does not exist
pub const DEFAULT_PRESET: &str = "gt3";

/// How the simulated driver handles the steering wheel
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DriverProfile {
    /// 0.0 (novice) to 1.0 (perfect); scales tremor and grip penalty
    pub skill: f64,
    /// Time constant of the steering lag (s)
    pub steering_response_time_s: f64,
    /// Hand tremor standard deviation at zero skill (deg)
    pub steering_noise_std_deg: f64,
    /// Standard deviation of the per-lap steering bias (deg)
    pub lap_bias_std_deg: f64,
    /// 0.0 to 1.0; aggressive drivers lose less grip to steering error
    pub aggressiveness: f64,
    /// Relative standard deviation of the perceived steering ratio
    pub steering_ratio_variation: f64,
}

impl Default for DriverProfile {
    fn default() -> Self {
        Self {
            skill: 0.9,
            steering_response_time_s: 0.12,
            steering_noise_std_deg: 1.5,
            lap_bias_std_deg: 3.0,
            aggressiveness: 0.5,
            steering_ratio_variation: 0.02,
        }
    }
}

/// Physical constants for one car
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VehicleParams {
    pub name: String,
    /// Vehicle class shown in telemetry
    pub class: String,

    // Chassis and aero
    pub mass_kg: f64,
    pub cda_m2: f64,
    pub air_density: f64,
    pub rolling_resistance: f64,
    pub wheelbase_m: f64,
    pub steering_ratio: f64,
    pub steering_lock_deg: f64,

    // Tyres and brakes
    pub tyre_mu: f64,
    pub tyre_wear_rate: f64,
    pub brake_max_g: f64,

    // Powertrain
    pub peak_power_kw: f64,
    pub peak_power_rpm: f64,
    pub redline_rpm: f64,
    pub gear_ratios: Vec<f64>,
    pub final_drive: f64,
    pub wheel_radius_m: f64,
    pub drivetrain_efficiency: f64,
    pub gear_shift_duration_s: f64,

    // Fuel
    pub fuel_capacity_l: f64,
    pub fuel_density_kg_per_l: f64,
    pub engine_efficiency: f64,

    pub driver: DriverProfile,
}

impl VehicleParams {
    /// GT3 race car; the default preset
    pub fn gt3() -> Self {
        Self {
            name: "gt3".to_string(),
            class: "GT3".to_string(),
            mass_kg: 1300.0,
            cda_m2: 0.95,
            air_density: 1.225,
            rolling_resistance: 0.012,
            wheelbase_m: 2.75,
            steering_ratio: 13.0,
            steering_lock_deg: 270.0,
            tyre_mu: 1.6,
            tyre_wear_rate: 3.0e-5,
            brake_max_g: 1.5,
            peak_power_kw: 390.0,
            peak_power_rpm: 7000.0,
            redline_rpm: 8500.0,
            gear_ratios: vec![3.10, 2.30, 1.82, 1.48, 1.20, 0.98],
            final_drive: 3.45,
            wheel_radius_m: 0.34,
            drivetrain_efficiency: 0.90,
            gear_shift_duration_s: 0.05,
            fuel_capacity_l: 120.0,
            fuel_density_kg_per_l: 0.745,
            engine_efficiency: 0.32,
            driver: DriverProfile::default(),
        }
    }

    /// Open-wheel single seater with a high-revving hybrid engine
    pub fn f1() -> Self {
        Self {
            name: "f1".to_string(),
            class: "F1".to_string(),
            mass_kg: 800.0,
            cda_m2: 1.10,
            air_density: 1.225,
            rolling_resistance: 0.011,
            wheelbase_m: 3.6,
            steering_ratio: 10.0,
            steering_lock_deg: 180.0,
            tyre_mu: 2.2,
            tyre_wear_rate: 4.5e-5,
            brake_max_g: 2.0,
            peak_power_kw: 750.0,
            peak_power_rpm: 11_000.0,
            redline_rpm: 15_000.0,
            gear_ratios: vec![3.00, 2.35, 1.92, 1.62, 1.40, 1.23, 1.09, 0.98],
            final_drive: 3.9,
            wheel_radius_m: 0.36,
            drivetrain_efficiency: 0.93,
            gear_shift_duration_s: 0.03,
            fuel_capacity_l: 145.0,
            fuel_density_kg_per_l: 0.75,
            engine_efficiency: 0.45,
            driver: DriverProfile {
                skill: 0.97,
                steering_response_time_s: 0.09,
                steering_noise_std_deg: 1.0,
                lap_bias_std_deg: 1.5,
                aggressiveness: 0.7,
                steering_ratio_variation: 0.01,
            },
        }
    }

    /// Le Mans Daytona hybrid prototype
    pub fn lmdh() -> Self {
        Self {
            name: "lmdh".to_string(),
            class: "LMDh".to_string(),
            mass_kg: 1030.0,
            cda_m2: 0.85,
            air_density: 1.225,
            rolling_resistance: 0.011,
            wheelbase_m: 3.15,
            steering_ratio: 11.5,
            steering_lock_deg: 220.0,
            tyre_mu: 1.9,
            tyre_wear_rate: 3.5e-5,
            brake_max_g: 1.8,
            peak_power_kw: 500.0,
            peak_power_rpm: 8000.0,
            redline_rpm: 9500.0,
            gear_ratios: vec![3.05, 2.28, 1.84, 1.52, 1.29, 1.10, 0.95],
            final_drive: 3.6,
            wheel_radius_m: 0.35,
            drivetrain_efficiency: 0.91,
            gear_shift_duration_s: 0.04,
            fuel_capacity_l: 90.0,
            fuel_density_kg_per_l: 0.745,
            engine_efficiency: 0.38,
            driver: DriverProfile {
                skill: 0.93,
                steering_response_time_s: 0.10,
                steering_noise_std_deg: 1.2,
                lap_bias_std_deg: 2.0,
                aggressiveness: 0.6,
                steering_ratio_variation: 0.015,
            },
        }
    }

    /// Entry-level GT4 with a gentle driver
    pub fn gt4() -> Self {
        Self {
            name: "gt4".to_string(),
            class: "GT4".to_string(),
            mass_kg: 1450.0,
            cda_m2: 0.80,
            air_density: 1.225,
            rolling_resistance: 0.013,
            wheelbase_m: 2.6,
            steering_ratio: 14.0,
            steering_lock_deg: 360.0,
            tyre_mu: 1.35,
            tyre_wear_rate: 2.5e-5,
            brake_max_g: 1.3,
            peak_power_kw: 310.0,
            peak_power_rpm: 6500.0,
            redline_rpm: 7600.0,
            gear_ratios: vec![3.00, 2.05, 1.55, 1.23, 1.01, 0.85],
            final_drive: 3.3,
            wheel_radius_m: 0.33,
            drivetrain_efficiency: 0.88,
            gear_shift_duration_s: 0.08,
            fuel_capacity_l: 100.0,
            fuel_density_kg_per_l: 0.745,
            engine_efficiency: 0.30,
            driver: DriverProfile {
                skill: 0.8,
                steering_response_time_s: 0.15,
                steering_noise_std_deg: 2.0,
                lap_bias_std_deg: 4.0,
                aggressiveness: 0.4,
                steering_ratio_variation: 0.03,
            },
        }
    }

    /// Look up a preset by name (case insensitive)
    pub fn preset(name: &str) -> Result<Self, SimError> {
        match name.trim().to_ascii_lowercase().as_str() {
            "gt3" => Ok(Self::gt3()),
            "f1" => Ok(Self::f1()),
            "lmdh" => Ok(Self::lmdh()),
            "gt4" => Ok(Self::gt4()),
            _ => Err(SimError::UnknownPreset(name.to_string())),
        }
    }

    /// Names of all built-in presets
    pub fn preset_names() -> &'static [&'static str] {
        &["gt3", "f1", "lmdh", "gt4"]
    }

    pub fn gear_count(&self) -> usize {
        self.gear_ratios.len()
    }

    /// Ratio for a 1-indexed gear, clamped to the gearbox range
    pub fn gear_ratio(&self, gear: u8) -> f64 {
        let idx = (gear.max(1) as usize - 1).min(self.gear_ratios.len().saturating_sub(1));
        self.gear_ratios.get(idx).copied().unwrap_or(1.0)
    }
}

impl Default for VehicleParams {
    fn default() -> Self {
        Self::gt3()
    }
}
