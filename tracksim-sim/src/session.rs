//! Session run loop
//!
//! Steps the engine for a fixed simulated duration, runs the gate timer after
//! every position update and forwards events to the sink in the order they
//! were generated: a tick's gate events first, then its snapshot.

use crate::config::RunConfig;
use crate::emitter::TelemetryEmitter;
use crate::engine::VehicleDynamics;
use crate::state::Diagnostics;
use crate::timing::GateTimer;
use chrono::Utc;
use rand::rngs::StdRng;
use rand::Rng;
use serde::Serialize;
use tracing::{debug, info, warn};
use tracksim_core::{SimError, TelemetryEvent, TelemetrySink, Track, VehicleParams};

/// What a finished (or running) session has produced so far
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SessionSummary {
    pub ticks: u64,
    pub events_emitted: u64,
    pub sink_failures: u64,
    pub laps_completed: u32,
    pub best_lap_s: Option<f64>,
    pub last_lap_s: Option<f64>,
    pub gear_changes: u64,
    pub fuel_used_l: f64,
}

pub struct Session<S, R = StdRng> {
    config: RunConfig,
    engine: VehicleDynamics<R>,
    timer: GateTimer,
    emitter: TelemetryEmitter,
    sink: S,
    ticks: u64,
    events_emitted: u64,
    sink_failures: u64,
}

impl<S: TelemetrySink> Session<S, StdRng> {
    /// Session seeded from `config.seed`
    pub fn new(config: RunConfig, vehicle: VehicleParams, track: Track, sink: S) -> Result<Self, SimError> {
        config.validate()?;
        let engine = VehicleDynamics::with_seed(vehicle, track, config.outlap.clone(), config.seed);
        Ok(Self::from_engine(config, engine, sink))
    }
}

impl<S: TelemetrySink, R: Rng> Session<S, R> {
    /// Session around an engine built with a caller-supplied random source
    pub fn with_rng(config: RunConfig, vehicle: VehicleParams, track: Track, sink: S, rng: R) -> Result<Self, SimError> {
        config.validate()?;
        let engine = VehicleDynamics::new(vehicle, track, config.outlap.clone(), rng);
        Ok(Self::from_engine(config, engine, sink))
    }

    fn from_engine(config: RunConfig, mut engine: VehicleDynamics<R>, sink: S) -> Self {
        engine.state_mut().speed_mps = config.initial_speed_mps;
        let emitter = TelemetryEmitter::new(
            config.identity.clone(),
            engine.vehicle().name.clone(),
            config.epoch.unwrap_or_else(Utc::now),
            config.high_frequency,
        );
        Self {
            config,
            engine,
            timer: GateTimer::new(),
            emitter,
            sink,
            ticks: 0,
            events_emitted: 0,
            sink_failures: 0,
        }
    }

    pub fn engine(&self) -> &VehicleDynamics<R> {
        &self.engine
    }

    pub fn engine_mut(&mut self) -> &mut VehicleDynamics<R> {
        &mut self.engine
    }

    pub fn timer(&self) -> &GateTimer {
        &self.timer
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn config(&self) -> &RunConfig {
        &self.config
    }

    pub fn into_sink(self) -> S {
        self.sink
    }

    /// Advance one tick and emit whatever it produced
    pub fn step(&mut self) -> Diagnostics {
        let dt = self.config.dt;
        let prev_lap_pos = self.engine.lap_position();
        let diagnostics = self.engine.update(dt);
        let cur_lap_pos = self.engine.lap_position();
        self.ticks += 1;

        let state = self.engine.state();
        let crossings = self.timer.check(
            self.engine.track().gates(),
            self.engine.track().lap_length_m(),
            prev_lap_pos,
            cur_lap_pos,
            state.time_s,
            state.lap,
        );

        let mut events: Vec<TelemetryEvent> = crossings
            .iter()
            .map(|c| self.emitter.gate_event(state, cur_lap_pos, c))
            .collect();
        if self.emitter.high_frequency() {
            events.push(self.emitter.snapshot(state, cur_lap_pos));
        }

        for crossing in crossings.iter().filter(|c| c.completes_lap()) {
            debug!(
                lap = state.lap - 1,
                lap_time_s = crossing.lap_time_s,
                fuel_l = state.fuel_l,
                tyre_wear = state.tyre_wear,
                "Lap completed"
            );
        }

        for event in &events {
            self.deliver(event);
        }

        self.engine.maybe_refresh_segment_targets(self.config.target_refresh);
        diagnostics
    }

    fn deliver(&mut self, event: &TelemetryEvent) {
        self.events_emitted += 1;
        if let Err(e) = self.sink.send(event) {
            self.sink_failures += 1;
            warn!("{} sink error: {:#}", self.sink.name(), e);
        }
    }

    /// Run for the configured duration; returns the number of events emitted
    pub fn run(&mut self) -> u64 {
        let total_ticks = self.config.total_ticks();
        info!(
            vehicle = %self.engine.vehicle().name,
            car_id = %self.config.identity.car_id,
            sim_time_s = self.config.sim_time_s,
            ticks = total_ticks,
            high_frequency = self.config.high_frequency,
            "Starting session"
        );

        for _ in 0..total_ticks {
            self.step();
        }

        if let Err(e) = self.sink.flush() {
            self.sink_failures += 1;
            warn!("{} sink flush error: {:#}", self.sink.name(), e);
        }

        let summary = self.summary();
        info!(
            events = summary.events_emitted,
            laps = summary.laps_completed,
            best_lap_s = summary.best_lap_s,
            sink_failures = summary.sink_failures,
            gear_changes = summary.gear_changes,
            "Session finished"
        );

        self.events_emitted
    }

    pub fn summary(&self) -> SessionSummary {
        let state = self.engine.state();
        SessionSummary {
            ticks: self.ticks,
            events_emitted: self.events_emitted,
            sink_failures: self.sink_failures,
            laps_completed: state.lap.saturating_sub(1),
            best_lap_s: self.timer.best_lap_s(),
            last_lap_s: self.timer.last_lap_s(),
            gear_changes: self.engine.gear_changes(),
            fuel_used_l: (self.engine.vehicle().fuel_capacity_l - state.fuel_l).max(0.0),
        }
    }
}
