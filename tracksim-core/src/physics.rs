//! Stateless kinematics and power formulas
//!
//! Every function here is pure and guards its denominators, so degenerate
//! inputs (zero radius, zero efficiency, zero density) yield finite values.

use crate::units::G;
use std::f64::consts::PI;

/// Lower heating value of racing fuel (kJ/kg)
pub const FUEL_HEATING_VALUE_KJ_PER_KG: f64 = 43_000.0;

/// Fuel burned with the throttle closed (L/s)
pub const IDLE_FUEL_LPS: f64 = 0.0008;

const EPSILON: f64 = 1e-9;

/// Top speed at which aerodynamic drag absorbs all of the engine's power (m/s)
pub fn power_limited_speed(power_kw: f64, cda: f64, air_density: f64) -> f64 {
    let drag = (0.5 * air_density * cda).max(EPSILON);
    (power_kw.max(0.0) * 1000.0 / drag).cbrt()
}

/// Maximum steady-state cornering speed on a given radius (m/s)
pub fn corner_target_speed(radius_m: f64, tyre_mu: f64) -> f64 {
    (tyre_mu.max(0.0) * G * radius_m.max(0.0)).sqrt()
}

/// Available engine power (kW) on a Gaussian curve centred on the peak RPM
pub fn engine_power_at_rpm(rpm: f64, peak_kw: f64, rpm_peak: f64, redline: f64) -> f64 {
    if rpm.is_nan() || rpm <= 0.0 {
        return 0.0;
    }

    let width = (rpm_peak * 0.45).max(1.0);
    let rpm = rpm.min(redline);
    let z = (rpm - rpm_peak) / width;
    peak_kw * (-0.5 * z * z).exp()
}

/// Wheel angular speed (rad/s) for a vehicle speed
pub fn wheel_angular_speed(speed_mps: f64, wheel_radius_m: f64) -> f64 {
    speed_mps / wheel_radius_m.max(1e-3)
}

/// Engine RPM for a road speed in the given gear
pub fn rpm_from_speed_and_gear(
    speed_mps: f64,
    gear_ratio: f64,
    final_drive: f64,
    wheel_radius_m: f64,
) -> f64 {
    let engine_rads = wheel_angular_speed(speed_mps, wheel_radius_m) * gear_ratio * final_drive;
    engine_rads * 60.0 / (2.0 * PI)
}

/// Largest braking force the tyres or the brake system allow (N)
pub fn max_braking_force(mass_kg: f64, tyre_mu: f64, brake_g_limit: f64) -> f64 {
    mass_kg * G * tyre_mu.min(brake_g_limit).max(0.0)
}

/// Fuel flow (L/s) needed to produce `power_kw` at the crank
pub fn fuel_consumption_lps(power_kw: f64, engine_efficiency: f64, fuel_density_kg_per_l: f64) -> f64 {
    if power_kw.is_nan() || power_kw <= 0.0 {
        return IDLE_FUEL_LPS;
    }

    let input_kw = power_kw / engine_efficiency.max(0.01);
    // kW == kJ/s
    let kg_per_s = input_kw / FUEL_HEATING_VALUE_KJ_PER_KG;
    kg_per_s / fuel_density_kg_per_l.max(0.01)
}

/// Steering wheel angle (degrees, unsigned) that tracks a given radius
pub fn ideal_wheel_angle_deg(wheelbase_m: f64, radius_m: f64, steering_ratio: f64) -> f64 {
    wheelbase_m.atan2(radius_m.max(EPSILON)).to_degrees() * steering_ratio
}
