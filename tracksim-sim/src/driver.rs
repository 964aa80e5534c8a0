//! Steering driver model
//!
//! Two first-order lags stand in for the human in the loop: the driver's
//! intended wheel angle chases the geometric ideal, and the hands chase that
//! intention with some tremor. The gap between where the wheel is and where it
//! should be costs grip in corners.

use rand::Rng;
use rand_distr::{Distribution, StandardNormal};
use tracksim_core::physics::ideal_wheel_angle_deg;
use tracksim_core::{Direction, DriverProfile, VehicleParams};

/// Largest fraction of grip a sloppy steering input can cost
const MAX_GRIP_PENALTY: f64 = 0.7;
const GRIP_PENALTY_GAIN: f64 = 0.6;

/// Zero-mean Gaussian sample; always consumes one draw so the stream stays aligned
pub(crate) fn gauss<R: Rng + ?Sized>(rng: &mut R, std_dev: f64) -> f64 {
    let z: f64 = StandardNormal.sample(rng);
    if std_dev.is_finite() && std_dev > 0.0 {
        z * std_dev
    } else {
        0.0
    }
}

/// Blend factor of a first-order lag, limited to 1 so the filter never overshoots
fn lag_alpha(dt: f64, time_constant: f64) -> f64 {
    (dt / (time_constant + 1e-9)).clamp(0.0, 1.0)
}

/// Result of steering through an arc
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CornerSteering {
    /// Wheel angle after clamping to the steering lock (deg)
    pub wheel_deg: f64,
    /// Geometrically correct wheel angle for the arc (deg, signed)
    pub ideal_deg: f64,
    /// Fraction of grip lost this tick
    pub grip_penalty: f64,
}

#[derive(Debug, Clone)]
pub struct DriverModel {
    profile: DriverProfile,
    target_wheel_deg: f64,
    actual_wheel_deg: f64,
    lap_bias_deg: f64,
    bias_lap: u32,
}

impl DriverModel {
    pub fn new<R: Rng + ?Sized>(profile: DriverProfile, rng: &mut R, lap: u32) -> Self {
        let lap_bias_deg = gauss(rng, profile.lap_bias_std_deg);
        Self {
            profile,
            target_wheel_deg: 0.0,
            actual_wheel_deg: 0.0,
            lap_bias_deg,
            bias_lap: lap,
        }
    }

    pub fn target_wheel_deg(&self) -> f64 {
        self.target_wheel_deg
    }

    pub fn actual_wheel_deg(&self) -> f64 {
        self.actual_wheel_deg
    }

    pub fn lap_bias_deg(&self) -> f64 {
        self.lap_bias_deg
    }

    fn skill(&self) -> f64 {
        self.profile.skill.clamp(0.0, 1.0)
    }

    fn hand_time_constant(&self) -> f64 {
        (self.profile.steering_response_time_s * 0.6).max(0.02)
    }

    /// Steer through an arc of the given radius for one tick
    pub fn steer_corner<R: Rng + ?Sized>(
        &mut self,
        rng: &mut R,
        dt: f64,
        radius_m: f64,
        direction: Direction,
        lap: u32,
        vehicle: &VehicleParams,
    ) -> CornerSteering {
        let lock = vehicle.steering_lock_deg.abs().max(1e-6);
        let magnitude = ideal_wheel_angle_deg(vehicle.wheelbase_m, radius_m, vehicle.steering_ratio).abs();
        let ideal_deg = match direction {
            Direction::Left => -magnitude,
            Direction::Right => magnitude,
        };

        if lap != self.bias_lap {
            self.lap_bias_deg = gauss(rng, self.profile.lap_bias_std_deg);
            self.bias_lap = lap;
        }

        let ratio_noise = 1.0 + gauss(rng, self.profile.steering_ratio_variation);
        let desired_deg = ideal_deg * ratio_noise + self.lap_bias_deg;

        let alpha = lag_alpha(dt, self.profile.steering_response_time_s.max(0.01));
        self.target_wheel_deg += alpha * (desired_deg - self.target_wheel_deg);

        let skill = self.skill();
        let tremor = gauss(rng, self.profile.steering_noise_std_deg.max(0.0) * (1.0 - skill));
        let hand_alpha = lag_alpha(dt, self.hand_time_constant());
        self.actual_wheel_deg += hand_alpha * ((self.target_wheel_deg + tremor) - self.actual_wheel_deg);
        self.actual_wheel_deg = self.actual_wheel_deg.clamp(-lock, lock);

        let error_deg = (self.actual_wheel_deg - ideal_deg).abs();
        let aggressiveness = self.profile.aggressiveness.clamp(0.0, 1.0);
        let grip_penalty = (GRIP_PENALTY_GAIN * (error_deg / lock) * (1.0 - skill) * (1.0 - 0.4 * aggressiveness))
            .clamp(0.0, MAX_GRIP_PENALTY);

        CornerSteering {
            wheel_deg: self.actual_wheel_deg,
            ideal_deg,
            grip_penalty,
        }
    }

    /// Let the wheel return toward centre on a straight; returns the clamped wheel angle
    pub fn relax(&mut self, dt: f64, vehicle: &VehicleParams) -> f64 {
        let lock = vehicle.steering_lock_deg.abs().max(1e-6);

        let alpha = lag_alpha(dt, self.profile.steering_response_time_s.max(0.05));
        self.target_wheel_deg -= alpha * self.target_wheel_deg;

        let hand_alpha = lag_alpha(dt, self.hand_time_constant());
        self.actual_wheel_deg += hand_alpha * (self.target_wheel_deg - self.actual_wheel_deg);
        self.actual_wheel_deg = self.actual_wheel_deg.clamp(-lock, lock);

        self.actual_wheel_deg
    }
}
