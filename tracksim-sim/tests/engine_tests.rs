//! Integration tests for the vehicle dynamics engine

use tracksim_core::circuit::reference_circuit;
use tracksim_core::track::MIN_CORNER_SPEED_MPS;
use tracksim_core::{Direction, Track, VehicleParams};
use tracksim_sim::engine::MAX_TYRE_WEAR;
use tracksim_sim::{OutlapConfig, VehicleDynamics, DEFAULT_DT};

fn engine(vehicle: VehicleParams, seed: u64) -> VehicleDynamics {
    let track = reference_circuit().expect("reference circuit should build");
    let mut engine = VehicleDynamics::with_seed(vehicle, track, OutlapConfig::default(), Some(seed));
    engine.state_mut().speed_mps = 5.0;
    engine
}

fn skid_pad() -> Track {
    Track::builder("Skid Pad")
        .straight("Main", 100.0)
        .arc("Loop", 200.0, 50.0, Direction::Left)
        .with_even_gates(2)
        .expect("skid pad should build")
}

#[test]
fn test_state_stays_in_range_over_many_ticks() {
    for name in VehicleParams::preset_names() {
        let vehicle = VehicleParams::preset(name).unwrap();
        let lock = vehicle.steering_lock_deg;
        let redline = vehicle.redline_rpm;
        let gears = vehicle.gear_count() as u8;
        let mut engine = engine(vehicle, 11);

        let mut prev = engine.state().clone();
        for _ in 0..4000 {
            engine.update(DEFAULT_DT);
            let s = engine.state();

            assert!(s.speed_mps >= 0.0 && s.speed_mps.is_finite(), "[{}] speed out of range: {}", name, s.speed_mps);
            assert!(s.fuel_l <= prev.fuel_l, "[{}] fuel must never increase", name);
            assert!(s.fuel_l >= 0.0, "[{}] fuel must stay non-negative", name);
            assert!(s.tyre_wear >= prev.tyre_wear, "[{}] tyre wear must never decrease", name);
            assert!(s.tyre_wear <= MAX_TYRE_WEAR, "[{}] tyre wear above cap", name);
            assert!((0.0..=1.0).contains(&s.throttle), "[{}] throttle out of range", name);
            assert!((0.0..=1.0).contains(&s.brake), "[{}] brake out of range", name);
            assert!(
                s.throttle == 0.0 || s.brake == 0.0,
                "[{}] throttle {} and brake {} both applied",
                name,
                s.throttle,
                s.brake
            );
            assert!(s.gear >= 1 && s.gear <= gears, "[{}] gear {} out of range", name, s.gear);
            assert!(s.rpm <= redline, "[{}] rpm {} above redline", name, s.rpm);
            assert!(s.steering_deg.abs() <= lock, "[{}] steering beyond lock", name);
            assert!(s.lap >= prev.lap, "[{}] lap counter went backwards", name);

            let lap_pos = engine.lap_position();
            assert!(lap_pos >= 0.0 && lap_pos < engine.track().lap_length_m());

            prev = s.clone();
        }
    }
}

#[test]
fn test_same_seed_gives_same_trajectory() {
    let mut a = engine(VehicleParams::gt3(), 99);
    let mut b = engine(VehicleParams::gt3(), 99);
    for _ in 0..3000 {
        a.update(DEFAULT_DT);
        b.update(DEFAULT_DT);
    }
    assert_eq!(a.state(), b.state(), "seeded runs should be identical");
}

#[test]
fn test_different_seeds_steer_differently() {
    let mut a = engine(VehicleParams::gt3(), 1);
    let mut b = engine(VehicleParams::gt3(), 2);
    let mut differs = false;
    for _ in 0..3000 {
        a.update(DEFAULT_DT);
        b.update(DEFAULT_DT);
        differs |= a.state().steering_deg != b.state().steering_deg;
    }
    assert!(differs, "steering noise should depend on the seed");
}

#[test]
fn test_lap_counter_increments_on_wrap() {
    let mut engine = engine(VehicleParams::gt3(), 3);
    let lap_length = engine.track().lap_length_m();
    engine.state_mut().position_m = lap_length - 0.5;
    engine.state_mut().speed_mps = 30.0;

    let diagnostics = engine.update(DEFAULT_DT);

    assert!(diagnostics.lap_completed, "crossing the line should complete the lap");
    assert_eq!(engine.state().lap, 2);
    assert!(engine.lap_position() < 2.0, "lap position should wrap near zero");
}

#[test]
fn test_outlap_caps_target_speed() {
    let mut engine = engine(VehicleParams::gt3(), 4);
    let diagnostics = engine.update(DEFAULT_DT);
    let outlap = OutlapConfig::default();
    assert!(
        (diagnostics.target_speed_mps - outlap.speed_mps()).abs() < 1e-9,
        "outlap should cap target speed at {} m/s, got {}",
        outlap.speed_mps(),
        diagnostics.target_speed_mps
    );
}

#[test]
fn test_near_zero_friction_corner_uses_speed_floor() {
    let vehicle = VehicleParams {
        tyre_mu: 1e-6,
        ..VehicleParams::gt3()
    };
    let mut engine = VehicleDynamics::with_seed(vehicle, skid_pad(), OutlapConfig::default(), Some(5));
    assert_eq!(engine.segment_targets()[1], MIN_CORNER_SPEED_MPS);

    engine.state_mut().position_m = 150.0;
    engine.state_mut().speed_mps = 10.0;
    let diagnostics = engine.update(DEFAULT_DT);

    assert_eq!(diagnostics.segment_index, 1);
    assert_eq!(diagnostics.target_speed_mps, MIN_CORNER_SPEED_MPS);
    assert!(diagnostics.lateral_accel_mps2 > 0.0);
}

#[test]
fn test_corner_exit_braking_above_crawl_speed() {
    let mut engine = VehicleDynamics::with_seed(VehicleParams::gt3(), skid_pad(), OutlapConfig::default(), Some(8));
    engine.state_mut().lap = 2;
    engine.state_mut().position_m = 280.0;
    engine.state_mut().speed_mps = 20.0;
    engine.update(DEFAULT_DT);
    assert!(engine.state().brake >= 0.8, "tight corner exit should force the brake");
    assert_eq!(engine.state().throttle, 0.0);

    let mut engine = VehicleDynamics::with_seed(VehicleParams::gt3(), skid_pad(), OutlapConfig::default(), Some(8));
    engine.state_mut().lap = 2;
    engine.state_mut().position_m = 280.0;
    engine.state_mut().speed_mps = 4.0;
    engine.update(DEFAULT_DT);
    assert_eq!(engine.state().brake, 0.0, "override should release below crawl speed");
}

#[test]
fn test_zero_dt_does_not_move_car() {
    let mut engine = engine(VehicleParams::gt3(), 6);
    let before = engine.state().clone();
    engine.update(0.0);
    assert_eq!(engine.state().position_m, before.position_m);
    assert_eq!(engine.state().time_s, before.time_s);
    assert_eq!(engine.state().fuel_l, before.fuel_l);
}

#[test]
fn test_car_reaches_racing_speed_on_back_straight() {
    let mut engine = engine(VehicleParams::gt3(), 7);
    let mut top = 0.0f64;
    for _ in 0..3600 {
        engine.update(DEFAULT_DT);
        top = top.max(engine.state().speed_mps);
    }
    assert!(top * 3.6 > 200.0, "GT3 should exceed 200 km/h, got {:.1}", top * 3.6);
    assert!(engine.gear_changes() > 0, "gearbox should have shifted");
}

#[test]
fn test_update_uses_live_friction_not_cached_targets() {
    let mut engine = VehicleDynamics::with_seed(VehicleParams::gt3(), skid_pad(), OutlapConfig::default(), Some(9));
    let cached = engine.segment_targets()[1];
    engine.state_mut().lap = 2;
    engine.state_mut().position_m = 150.0;
    engine.state_mut().speed_mps = 10.0;
    engine.state_mut().tyre_wear = 0.8;

    let diagnostics = engine.update(DEFAULT_DT);

    assert_eq!(diagnostics.segment_index, 1);
    assert!(
        diagnostics.target_speed_mps < cached,
        "worn tyres should lower the live target below the stale cache ({} vs {})",
        diagnostics.target_speed_mps,
        cached
    );
    assert_eq!(engine.segment_targets()[1], cached, "update should leave the cache alone");
}
