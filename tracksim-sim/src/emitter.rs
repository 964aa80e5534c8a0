//! Telemetry event assembly
//!
//! Turns engine state into immutable `TelemetryEvent` records. Timestamps are
//! derived from the session epoch plus simulated race time, so a seeded run
//! with a fixed epoch produces an identical event stream every time.

use crate::state::VehicleState;
use crate::timing::GateCrossing;
use chrono::{DateTime, Duration, Utc};
use tracksim_core::units::{
    Degrees, Liters, Meters, MetersPerSecond, Percentage, Rpm, Seconds, TyreWear,
};
use tracksim_core::{CarIdentity, TelemetryEvent};

#[derive(Debug, Clone)]
pub struct TelemetryEmitter {
    identity: CarIdentity,
    vehicle_class: String,
    epoch: DateTime<Utc>,
    high_frequency: bool,
}

impl TelemetryEmitter {
    pub fn new(identity: CarIdentity, vehicle_class: impl Into<String>, epoch: DateTime<Utc>, high_frequency: bool) -> Self {
        Self {
            identity,
            vehicle_class: vehicle_class.into(),
            epoch,
            high_frequency,
        }
    }

    /// Whether a snapshot is emitted on every tick
    pub fn high_frequency(&self) -> bool {
        self.high_frequency
    }

    pub fn epoch(&self) -> DateTime<Utc> {
        self.epoch
    }

    fn timestamp(&self, race_time_s: f64) -> DateTime<Utc> {
        let micros = (race_time_s.max(0.0) * 1e6).round() as i64;
        self.epoch + Duration::microseconds(micros)
    }

    /// Event for a gate crossing
    pub fn gate_event(&self, state: &VehicleState, lap_pos_m: f64, crossing: &GateCrossing) -> TelemetryEvent {
        let mut event = self.snapshot(state, lap_pos_m);
        event.gate = Some(crossing.gate);
        event.split_time = Some(Seconds(crossing.split_time_s));
        event.lap_time = crossing.lap_time_s.map(Seconds);
        event
    }

    /// Plain per-tick snapshot with no timing fields
    pub fn snapshot(&self, state: &VehicleState, lap_pos_m: f64) -> TelemetryEvent {
        TelemetryEvent {
            car_id: self.identity.car_id.clone(),
            driver: self.identity.driver.clone(),
            team: self.identity.team.clone(),
            vehicle_class: self.vehicle_class.clone(),
            lap: state.lap,
            speed_kmh: MetersPerSecond(state.speed_mps).to_kmh(),
            rpm: Rpm::from_f64(state.rpm),
            timestamp: self.timestamp(state.time_s),
            gate: None,
            split_time: None,
            gear: state.gear,
            throttle: Percentage::new(state.throttle),
            brake: Percentage::new(state.brake),
            steering_deg: Degrees(state.steering_deg),
            fuel_l: Liters(state.fuel_l),
            tyre_wear: TyreWear(state.tyre_wear),
            lap_time: None,
            race_time: Seconds(state.time_s),
            position_m: Meters(lap_pos_m),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn emitter() -> TelemetryEmitter {
        let epoch = Utc.with_ymd_and_hms(2025, 3, 1, 14, 0, 0).unwrap();
        TelemetryEmitter::new(CarIdentity::default(), "gt3", epoch, false)
    }

    fn state() -> VehicleState {
        VehicleState {
            position_m: 6000.0,
            speed_mps: 50.0,
            gear: 4,
            rpm: 6123.4,
            throttle: 0.6,
            brake: 0.0,
            steering_deg: 12.5,
            fuel_l: 100.0,
            tyre_wear: 0.01,
            lap: 2,
            time_s: 90.5,
        }
    }

    #[test]
    fn test_snapshot_has_no_timing_fields() {
        let event = emitter().snapshot(&state(), 48.5);
        assert_eq!(event.gate, None);
        assert_eq!(event.split_time, None);
        assert_eq!(event.lap_time, None);
        assert!((event.speed_kmh.0 - 180.0).abs() < 1e-9);
        assert_eq!(event.rpm, Rpm(6123));
        assert_eq!(event.position_m, Meters(48.5));
        assert_eq!(event.vehicle_class, "gt3");
        assert_eq!(event.car_id, "#34");
    }

    #[test]
    fn test_gate_event_carries_crossing() {
        let crossing = GateCrossing {
            gate: 30,
            split_time_s: 3.2,
            lap_time_s: Some(95.0),
        };
        let event = emitter().gate_event(&state(), 48.5, &crossing);
        assert_eq!(event.gate, Some(30));
        assert_eq!(event.split_time, Some(Seconds(3.2)));
        assert_eq!(event.lap_time, Some(Seconds(95.0)));
    }

    #[test]
    fn test_timestamp_is_epoch_plus_race_time() {
        let e = emitter();
        let event = e.snapshot(&state(), 0.0);
        assert_eq!(event.timestamp, e.epoch() + Duration::milliseconds(90_500));
    }
}
