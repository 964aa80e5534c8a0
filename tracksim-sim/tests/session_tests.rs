//! Integration tests for the session run loop

use anyhow::{bail, Result};
use chrono::{DateTime, Duration, TimeZone, Utc};
use tracksim_core::circuit::reference_circuit;
use tracksim_core::track::target_speed_for_segment;
use tracksim_core::{Direction, MemorySink, TelemetryEvent, TelemetrySink, Track, VehicleParams};
use tracksim_sim::{RunConfig, Session, TargetRefresh};

fn epoch() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 6, 14, 15, 0, 0).unwrap()
}

fn config(sim_time_s: f64, high_frequency: bool, seed: u64) -> RunConfig {
    RunConfig {
        sim_time_s,
        high_frequency,
        seed: Some(seed),
        epoch: Some(epoch()),
        ..Default::default()
    }
}

fn run(config: RunConfig, vehicle: VehicleParams, track: Track) -> (u64, Vec<TelemetryEvent>) {
    let mut session = Session::new(config, vehicle, track, MemorySink::new()).expect("session should build");
    let count = session.run();
    (count, session.into_sink().into_events())
}

fn oval() -> Track {
    Track::builder("Test Oval")
        .straight("Front", 150.0)
        .arc("Turn 1-2", 50.0, 40.0, Direction::Left)
        .straight("Back", 150.0)
        .arc("Turn 3-4", 50.0, 40.0, Direction::Left)
        .with_even_gates(4)
        .expect("oval should build")
}

struct FailingSink {
    attempts: u64,
}

impl TelemetrySink for FailingSink {
    fn name(&self) -> &str {
        "failing"
    }

    fn send(&mut self, _event: &TelemetryEvent) -> Result<()> {
        self.attempts += 1;
        bail!("receiver unavailable")
    }
}

#[test]
fn test_thousand_tick_high_frequency_run() {
    let gt3 = VehicleParams::gt3();
    let capacity = gt3.fuel_capacity_l;
    let (count, events) = run(config(50.0, true, 42), gt3, reference_circuit().unwrap());

    let snapshots = events.iter().filter(|e| !e.is_gate_event()).count();
    assert_eq!(snapshots, 1000, "one snapshot per tick");
    assert_eq!(count as usize, events.len(), "returned count should match delivered events");
    assert!(events.iter().any(|e| e.is_gate_event()), "car should pass at least one gate in 50 s");

    for pair in events.windows(2) {
        assert!(pair[1].race_time >= pair[0].race_time, "events must be in generation order");
        if pair[0].race_time == pair[1].race_time {
            assert!(
                !(pair[1].is_gate_event() && !pair[0].is_gate_event()),
                "gate events must precede the snapshot of the same tick"
            );
        }
        assert!(pair[1].fuel_l.0 <= pair[0].fuel_l.0, "fuel must never increase");
    }

    let first = events.first().unwrap();
    let last = events.last().unwrap();
    assert!(
        last.lap > first.lap || last.position_m.0 > first.position_m.0,
        "car should make forward progress, ended at {} m on lap {}",
        last.position_m.0,
        last.lap
    );
    assert!(events.iter().all(|e| e.fuel_l.0 <= capacity), "fuel above tank capacity");
    assert!(last.tyre_wear.0 > 0.0, "tyres should wear over 50 s");
}

#[test]
fn test_seeded_runs_are_identical() {
    let (_, a) = run(config(90.0, true, 7), VehicleParams::gt3(), reference_circuit().unwrap());
    let (_, b) = run(config(90.0, true, 7), VehicleParams::gt3(), reference_circuit().unwrap());
    assert_eq!(a, b, "same seed and epoch should reproduce the event stream");
}

#[test]
fn test_timestamps_follow_race_time() {
    let (_, events) = run(config(20.0, true, 3), VehicleParams::gt3(), reference_circuit().unwrap());
    for event in &events {
        let expected = epoch() + Duration::microseconds((event.race_time.0 * 1e6).round() as i64);
        assert_eq!(event.timestamp, expected);
    }
}

#[test]
fn test_gate_only_stream_over_full_laps() {
    let mut session = Session::new(
        config(360.0, false, 21),
        VehicleParams::gt3(),
        reference_circuit().unwrap(),
        MemorySink::new(),
    )
    .unwrap();
    session.run();
    let summary = session.summary();
    let events = session.into_sink().into_events();

    assert!(events.iter().all(|e| e.is_gate_event()), "only gate events without high-frequency logging");
    assert!(summary.laps_completed >= 1, "GT3 should finish a lap in 6 minutes");

    // Gates are passed strictly in order, wrapping from the finish line back to gate 1
    for (i, event) in events.iter().enumerate() {
        let expected = (i as u32 % 30) + 1;
        assert_eq!(event.gate, Some(expected), "event {} crossed the wrong gate", i);
        assert!(event.split_time.is_some());
    }

    let lap_events: Vec<&TelemetryEvent> = events.iter().filter(|e| e.lap_time.is_some()).collect();
    assert!(!lap_events.is_empty());
    assert_eq!(
        lap_events.len(),
        summary.laps_completed as usize,
        "one lap time per completed lap"
    );
    for event in &lap_events {
        assert_eq!(event.gate, Some(30), "lap time only on the start/finish gate");
        assert!(event.lap >= 2);
        let lap_time = event.lap_time.unwrap().0;
        assert!(lap_time > 60.0 && lap_time < 360.0, "implausible lap time {}", lap_time);
    }

    assert_eq!(summary.best_lap_s, lap_events.iter().map(|e| e.lap_time.unwrap().0).reduce(f64::min));
    assert!(summary.fuel_used_l > 0.0);
}

#[test]
fn test_splits_sum_to_lap_time() {
    let (_, events) = run(config(120.0, false, 8), VehicleParams::gt3(), oval());
    let finishes: Vec<usize> = events
        .iter()
        .enumerate()
        .filter(|(_, e)| e.gate == Some(4))
        .map(|(i, _)| i)
        .collect();
    assert!(finishes.len() >= 2, "car should cross the line at least twice on the oval");

    let (from, to) = (finishes[0], finishes[1]);
    let splits: f64 = events[from + 1..=to].iter().map(|e| e.split_time.unwrap().0).sum();
    let lap_time = events[to].lap_time.expect("second crossing closes lap 2").0;
    assert!(
        (splits - lap_time).abs() < 1e-6,
        "splits {} should add up to lap time {}",
        splits,
        lap_time
    );
    assert_eq!(events[to].lap, 3);
}

#[test]
fn test_sink_failures_do_not_stop_the_run() {
    let sink = FailingSink { attempts: 0 };
    let mut session = Session::new(config(10.0, true, 1), VehicleParams::gt3(), reference_circuit().unwrap(), sink).unwrap();
    let count = session.run();

    let summary = session.summary();
    assert_eq!(summary.ticks, 200, "every tick should run despite sink errors");
    assert_eq!(summary.sink_failures, count);
    assert_eq!(session.sink().attempts, count);
}

#[test]
fn test_zero_duration_emits_nothing() {
    let (count, events) = run(config(0.0, true, 1), VehicleParams::gt3(), reference_circuit().unwrap());
    assert_eq!(count, 0);
    assert!(events.is_empty());
}

#[test]
fn test_invalid_config_is_rejected() {
    let bad = RunConfig { dt: -1.0, ..Default::default() };
    let result = Session::new(bad, VehicleParams::gt3(), reference_circuit().unwrap(), MemorySink::new());
    assert!(result.is_err());
}

#[test]
fn test_identity_and_class_on_every_event() {
    let mut cfg = config(30.0, true, 2);
    cfg.identity.car_id = "#7".to_string();
    cfg.identity.driver = "Ana Lopes".to_string();
    let (_, events) = run(cfg, VehicleParams::f1(), reference_circuit().unwrap());

    assert!(events.iter().all(|e| e.car_id == "#7" && e.driver == "Ana Lopes" && e.vehicle_class == "f1"));
}

#[test]
fn test_refresh_disabled_keeps_fresh_tyre_targets() {
    let cfg = RunConfig {
        target_refresh: TargetRefresh::Stochastic { probability: 0.0 },
        ..config(120.0, false, 5)
    };
    let vehicle = VehicleParams::gt3();
    let track = reference_circuit().unwrap();
    let fresh: Vec<f64> = track
        .segments()
        .iter()
        .map(|s| target_speed_for_segment(s, vehicle.tyre_mu, &vehicle))
        .collect();

    let mut session = Session::new(cfg, vehicle, track, MemorySink::new()).unwrap();
    session.run();

    assert!(session.engine().state().tyre_wear > 0.0);
    assert_eq!(session.engine().segment_targets(), fresh.as_slice());
}

#[test]
fn test_every_tick_refresh_follows_tyre_wear() {
    let vehicle = VehicleParams::gt3();
    let track = reference_circuit().unwrap();
    let fresh_hairpin = target_speed_for_segment(&track.segments()[1], vehicle.tyre_mu, &vehicle);

    let mut session = Session::new(config(120.0, false, 5), vehicle, track, MemorySink::new()).unwrap();
    session.run();

    assert!(session.engine().segment_targets()[1] < fresh_hairpin);
}
