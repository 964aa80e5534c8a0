//! Vehicle dynamics engine
//!
//! Advances a single car around the track one fixed tick at a time. Each tick
//! runs the driver model, plans a target speed from geometry and grip, turns
//! the speed error into pedal commands, picks a gear, balances longitudinal
//! forces and integrates speed, position, fuel and tyre wear.
//!
//! All quantities carried between ticks are clamped to their valid ranges
//! every tick, so a single bad input cannot poison the rest of the run.

use crate::config::{OutlapConfig, TargetRefresh};
use crate::driver::DriverModel;
use crate::state::{Diagnostics, VehicleState};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracksim_core::physics::{
    corner_target_speed, engine_power_at_rpm, fuel_consumption_lps, max_braking_force,
    rpm_from_speed_and_gear,
};
use tracksim_core::track::{straight_target_speed, target_speed_for_segment, MIN_CORNER_SPEED_MPS};
use tracksim_core::units::G;
use tracksim_core::{SegmentKind, Track, VehicleParams};

// =============================================================================
// Controller constants
// =============================================================================

/// Proportional gain from speed error (m/s) to acceleration command (m/s²)
const SPEED_GAIN: f64 = 0.8;
const MAX_DECEL_CMD: f64 = -5.0;
const MAX_ACCEL_CMD: f64 = 7.0;
/// Acceleration command that maps to full throttle
const FULL_THROTTLE_ACCEL: f64 = 6.0;
/// Deceleration command that maps to full brake
const FULL_BRAKE_DECEL: f64 = 7.0;

/// Arcs tighter than this get anticipatory braking near their exit
const TIGHT_CORNER_RADIUS_M: f64 = 60.0;
const CORNER_BRAKE_ZONE_M: f64 = 40.0;
const CORNER_BRAKE_MIN: f64 = 0.8;

/// Fraction of peak-power RPM the gearbox logic aims for
const SHIFT_TARGET_FRACTION: f64 = 0.65;
const OVER_REDLINE_PENALTY: f64 = 10_000.0;
const IDLE_RPM: f64 = 700.0;

pub const MAX_TYRE_WEAR: f64 = 0.99;

/// Grip multiplier from tyre wear: fresh tyres 1.0, fully worn 0.5
pub fn wear_grip_factor(tyre_wear: f64) -> f64 {
    1.0 - 0.5 * tyre_wear
}

/// Gear (1-indexed) whose RPM at `speed_mps` sits closest to the shift target
///
/// Gears above the redline are heavily penalised. Ties go to the lower gear.
/// Only the first 255 ratios are addressable.
pub fn select_gear(speed_mps: f64, vehicle: &VehicleParams) -> u8 {
    let rpm_target = SHIFT_TARGET_FRACTION * vehicle.peak_power_rpm;
    let mut best_gear = 1;
    let mut best_score = f64::INFINITY;

    for (gear, ratio) in (1..=u8::MAX).zip(&vehicle.gear_ratios) {
        let rpm = rpm_from_speed_and_gear(speed_mps, *ratio, vehicle.final_drive, vehicle.wheel_radius_m);
        let mut score = (rpm - rpm_target).abs();
        if rpm > vehicle.redline_rpm {
            score += OVER_REDLINE_PENALTY;
        }
        if score < best_score {
            best_score = score;
            best_gear = gear;
        }
    }

    best_gear
}

/// Map a signed acceleration command onto (throttle, brake)
fn pedals_for_command(accel_cmd: f64) -> (f64, f64) {
    if accel_cmd >= 0.0 {
        ((accel_cmd / FULL_THROTTLE_ACCEL).clamp(0.0, 1.0), 0.0)
    } else {
        (0.0, (-accel_cmd / FULL_BRAKE_DECEL).clamp(0.0, 1.0))
    }
}

fn finite_or(value: f64, fallback: f64) -> f64 {
    if value.is_finite() {
        value
    } else {
        fallback
    }
}

// =============================================================================
// VehicleDynamics
// =============================================================================

pub struct VehicleDynamics<R = StdRng> {
    vehicle: VehicleParams,
    track: Track,
    outlap: OutlapConfig,
    state: VehicleState,
    driver: DriverModel,
    rng: R,
    shift_end_time_s: f64,
    segment_targets: Vec<f64>,
    gear_changes: u64,
}

impl VehicleDynamics<StdRng> {
    /// Engine with a seeded generator, or entropy when `seed` is `None`
    pub fn with_seed(vehicle: VehicleParams, track: Track, outlap: OutlapConfig, seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self::new(vehicle, track, outlap, rng)
    }
}

impl<R: Rng> VehicleDynamics<R> {
    pub fn new(vehicle: VehicleParams, track: Track, outlap: OutlapConfig, mut rng: R) -> Self {
        let state = VehicleState::on_grid(vehicle.fuel_capacity_l, 0.0);
        let driver = DriverModel::new(vehicle.driver.clone(), &mut rng, state.lap);
        let mut engine = Self {
            vehicle,
            track,
            outlap,
            state,
            driver,
            rng,
            shift_end_time_s: 0.0,
            segment_targets: Vec::new(),
            gear_changes: 0,
        };
        engine.refresh_segment_targets();
        engine
    }

    pub fn state(&self) -> &VehicleState {
        &self.state
    }

    /// Direct access for scenario setup; values are re-clamped on the next tick
    pub fn state_mut(&mut self) -> &mut VehicleState {
        &mut self.state
    }

    pub fn vehicle(&self) -> &VehicleParams {
        &self.vehicle
    }

    pub fn track(&self) -> &Track {
        &self.track
    }

    pub fn driver(&self) -> &DriverModel {
        &self.driver
    }

    pub fn gear_changes(&self) -> u64 {
        self.gear_changes
    }

    /// Current position reduced onto the lap
    pub fn lap_position(&self) -> f64 {
        self.track.lap_position(self.state.position_m)
    }

    /// Tyre friction after wear, before any steering penalty
    pub fn effective_friction(&self) -> f64 {
        self.vehicle.tyre_mu * wear_grip_factor(self.state.tyre_wear)
    }

    /// Cached target speed per segment, in track order
    ///
    /// Refreshed by the session's refresh policy and exposed for inspection.
    /// `update` does not read it; each tick derives its target from live
    /// friction and the steering penalty.
    pub fn segment_targets(&self) -> &[f64] {
        &self.segment_targets
    }

    /// Recompute every segment's cached target speed for the current tyre state
    pub fn refresh_segment_targets(&mut self) {
        let mu = self.effective_friction();
        self.segment_targets = self
            .track
            .segments()
            .iter()
            .map(|seg| target_speed_for_segment(seg, mu, &self.vehicle))
            .collect();
    }

    /// Apply a refresh policy; returns whether the cache was recomputed
    pub fn maybe_refresh_segment_targets(&mut self, policy: TargetRefresh) -> bool {
        let refresh = match policy {
            TargetRefresh::EveryTick => true,
            TargetRefresh::Stochastic { probability } => self.rng.gen::<f64>() < probability,
        };
        if refresh {
            self.refresh_segment_targets();
        }
        refresh
    }

    /// Advance the simulation by `dt` seconds
    pub fn update(&mut self, dt: f64) -> Diagnostics {
        let dt = if dt.is_finite() && dt > 0.0 { dt } else { 0.0 };
        self.sanitize_state();

        let lap_pos = self.lap_position();
        let segment_index = self.track.segment_index_at(self.state.position_m);
        let segment = &self.track.segments()[segment_index];
        let kind = segment.kind;
        let segment_end_distance = self.track.distance_to_segment_end(segment, lap_pos);
        let base_mu = self.effective_friction();

        // --- Driver model and target speed ---
        let mut target_speed = match kind {
            SegmentKind::Arc { radius_m, direction } if radius_m > 1.0 => {
                let steering = self.driver.steer_corner(
                    &mut self.rng,
                    dt,
                    radius_m,
                    direction,
                    self.state.lap,
                    &self.vehicle,
                );
                self.state.steering_deg = steering.wheel_deg;
                let mu = base_mu * (1.0 - steering.grip_penalty);
                (corner_target_speed(radius_m, mu) * 0.92).max(MIN_CORNER_SPEED_MPS)
            }
            _ => {
                self.state.steering_deg = self.driver.relax(dt, &self.vehicle);
                straight_target_speed(&self.vehicle)
            }
        };

        if self.state.lap == 1 && lap_pos < self.track.lap_position(self.outlap.end_m) {
            target_speed = target_speed.min(self.outlap.speed_mps());
        }

        // --- Pedals ---
        let accel_cmd = (SPEED_GAIN * (target_speed - self.state.speed_mps)).clamp(MAX_DECEL_CMD, MAX_ACCEL_CMD);
        let (mut throttle, mut brake) = pedals_for_command(accel_cmd);

        if let SegmentKind::Arc { radius_m, .. } = kind {
            // Anticipatory braking releases at crawl speed
            if radius_m < TIGHT_CORNER_RADIUS_M
                && segment_end_distance < CORNER_BRAKE_ZONE_M
                && self.state.speed_mps > MIN_CORNER_SPEED_MPS
            {
                brake = brake.max(CORNER_BRAKE_MIN);
                throttle = 0.0;
            }
        }

        // --- Gearbox ---
        let best_gear = select_gear(self.state.speed_mps, &self.vehicle);
        let gear_changed = best_gear != self.state.gear;
        if gear_changed {
            self.state.gear = best_gear;
            self.state.rpm = (self.state.rpm * 1.05 + 200.0).min(self.vehicle.redline_rpm);
            self.shift_end_time_s = self.state.time_s + self.vehicle.gear_shift_duration_s.max(0.0);
            throttle = 0.0;
            self.gear_changes += 1;
        }

        let ratio = self.vehicle.gear_ratio(self.state.gear);
        let rpm = rpm_from_speed_and_gear(
            self.state.speed_mps,
            ratio,
            self.vehicle.final_drive,
            self.vehicle.wheel_radius_m,
        );
        self.state.rpm = finite_or(rpm, IDLE_RPM).clamp(IDLE_RPM, self.vehicle.redline_rpm.max(IDLE_RPM));

        let mut available_kw = engine_power_at_rpm(
            self.state.rpm,
            self.vehicle.peak_power_kw,
            self.vehicle.peak_power_rpm,
            self.vehicle.redline_rpm,
        );
        if self.shift_end_time_s > self.state.time_s {
            available_kw = 0.0;
        } else {
            self.shift_end_time_s = 0.0;
        }

        self.state.throttle = throttle;
        self.state.brake = brake;

        // --- Force balance ---
        let v = self.state.speed_mps;
        let mass = self.vehicle.mass_kg.max(1.0);
        let wheel_force = available_kw * 1000.0 * self.vehicle.drivetrain_efficiency / v.max(1.0);
        let drive_force = wheel_force * throttle;
        let aero_force = 0.5 * self.vehicle.air_density * self.vehicle.cda_m2 * v * v;
        let rolling_force = self.vehicle.rolling_resistance * mass * G;
        let brake_force = max_braking_force(mass, base_mu, self.vehicle.brake_max_g) * brake;

        let net_force = drive_force - aero_force - rolling_force - brake_force;
        let accel = finite_or(net_force / mass, 0.0);

        self.state.speed_mps = finite_or(v + accel * dt, 0.0).max(0.0);

        // --- Consumables ---
        let mech_power_used_kw = available_kw * throttle;
        let fuel_lps = fuel_consumption_lps(
            mech_power_used_kw,
            self.vehicle.engine_efficiency,
            self.vehicle.fuel_density_kg_per_l,
        );
        self.state.fuel_l = finite_or(self.state.fuel_l - fuel_lps * dt, 0.0).max(0.0);

        let lateral_accel = match kind {
            SegmentKind::Arc { radius_m, .. } if radius_m > 1.0 => self.state.speed_mps.powi(2) / radius_m,
            _ => 0.0,
        };
        let wear_rate = self.vehicle.tyre_wear_rate
            * (1.0 + lateral_accel.abs() / (0.5 * G))
            * (1.0 + 0.5 * throttle + 0.5 * brake);
        self.state.tyre_wear = finite_or(self.state.tyre_wear + wear_rate * dt, self.state.tyre_wear)
            .clamp(0.0, MAX_TYRE_WEAR);

        // --- Integrate position ---
        let prev_lap_pos = lap_pos;
        self.state.position_m += self.state.speed_mps * dt;
        self.state.time_s += dt;

        let lap_completed = prev_lap_pos > self.lap_position();
        if lap_completed {
            self.state.lap += 1;
        }

        Diagnostics {
            accel_mps2: accel,
            available_kw,
            mech_power_used_kw,
            fuel_lps,
            lateral_accel_mps2: lateral_accel,
            segment_index,
            target_speed_mps: target_speed,
            steering_deg: self.state.steering_deg,
            gear_changed,
            lap_completed,
        }
    }

    /// Pull externally modified state back into its valid domain
    fn sanitize_state(&mut self) {
        let s = &mut self.state;
        let lock = self.vehicle.steering_lock_deg.abs();
        s.position_m = finite_or(s.position_m, 0.0);
        s.speed_mps = finite_or(s.speed_mps, 0.0).max(0.0);
        s.fuel_l = finite_or(s.fuel_l, 0.0).max(0.0);
        s.tyre_wear = finite_or(s.tyre_wear, 0.0).clamp(0.0, MAX_TYRE_WEAR);
        s.steering_deg = finite_or(s.steering_deg, 0.0).clamp(-lock, lock);
        s.rpm = finite_or(s.rpm, IDLE_RPM);
        let top_gear = u8::try_from(self.vehicle.gear_count()).unwrap_or(u8::MAX).max(1);
        s.gear = s.gear.clamp(1, top_gear);
        s.lap = s.lap.max(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tracksim_core::circuit::reference_circuit;

    #[test]
    fn test_pedals_are_exclusive() {
        assert_eq!(pedals_for_command(3.0), (0.5, 0.0));
        assert_eq!(pedals_for_command(12.0), (1.0, 0.0));
        assert_eq!(pedals_for_command(0.0), (0.0, 0.0));
        let (throttle, brake) = pedals_for_command(-3.5);
        assert_eq!(throttle, 0.0);
        assert!((brake - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_select_gear_low_speed_is_first() {
        assert_eq!(select_gear(0.0, &VehicleParams::gt3()), 1);
    }

    #[test]
    fn test_select_gear_climbs_with_speed() {
        let vehicle = VehicleParams::gt3();
        let mut last = 1;
        for speed in [10.0, 25.0, 40.0, 55.0, 70.0, 85.0] {
            let gear = select_gear(speed, &vehicle);
            assert!(gear >= last, "gear should not drop as speed rises");
            last = gear;
        }
        assert!(last > 3);
    }

    #[test]
    fn test_select_gear_tie_prefers_lower_gear() {
        let vehicle = VehicleParams {
            gear_ratios: vec![2.0, 2.0, 2.0],
            ..VehicleParams::gt3()
        };
        assert_eq!(select_gear(30.0, &vehicle), 1);
    }

    #[test]
    fn test_oversized_gearbox_stays_in_range() {
        let vehicle = VehicleParams {
            gear_ratios: (0..300).map(|i| 3.0 - i as f64 * 0.0099).collect(),
            ..VehicleParams::gt3()
        };
        assert!(select_gear(80.0, &vehicle) >= 1);

        let track = reference_circuit().unwrap();
        let mut engine = VehicleDynamics::with_seed(vehicle, track, OutlapConfig::default(), Some(3));
        engine.state_mut().gear = 0;
        for _ in 0..200 {
            engine.update(0.05);
            assert!(engine.state().gear >= 1, "gear must stay addressable with 300 ratios");
        }
    }

    #[test]
    fn test_select_gear_avoids_redline() {
        let vehicle = VehicleParams::gt3();
        let gear = select_gear(80.0, &vehicle);
        let rpm = rpm_from_speed_and_gear(
            80.0,
            vehicle.gear_ratio(gear),
            vehicle.final_drive,
            vehicle.wheel_radius_m,
        );
        assert!(rpm <= vehicle.redline_rpm);
    }

    #[test]
    fn test_refresh_tracks_tyre_wear() {
        let track = reference_circuit().unwrap();
        let mut engine = VehicleDynamics::with_seed(VehicleParams::gt3(), track, OutlapConfig::default(), Some(1));
        let fresh = engine.segment_targets()[1];
        engine.state_mut().tyre_wear = 0.8;
        engine.refresh_segment_targets();
        assert!(engine.segment_targets()[1] < fresh);
    }

    #[test]
    fn test_sanitize_recovers_from_non_finite_state() {
        let track = reference_circuit().unwrap();
        let mut engine = VehicleDynamics::with_seed(VehicleParams::gt3(), track, OutlapConfig::default(), Some(2));
        engine.state_mut().speed_mps = f64::NAN;
        engine.state_mut().fuel_l = -3.0;
        engine.state_mut().tyre_wear = 4.0;
        engine.update(0.05);
        let s = engine.state();
        assert!(s.speed_mps.is_finite() && s.speed_mps >= 0.0);
        assert!(s.fuel_l >= 0.0);
        assert!(s.tyre_wear <= MAX_TYRE_WEAR);
    }
}
