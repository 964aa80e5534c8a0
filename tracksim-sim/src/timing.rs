//! Gate crossing detection and lap/split timing
//!
//! Positions are lap-relative. A tick that wraps past the start/finish line
//! is treated as covering `(prev, lap_length] ∪ [0, cur]`.

use tracksim_core::Gates;

/// One gate crossed during a tick
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GateCrossing {
    pub gate: u32,
    /// Race time since the previous gate crossing (s)
    pub split_time_s: f64,
    /// Race time since the previous start/finish crossing; only on the finish gate after lap 1
    pub lap_time_s: Option<f64>,
}

impl GateCrossing {
    pub fn completes_lap(&self) -> bool {
        self.lap_time_s.is_some()
    }
}

/// Whether `gate_m` lies in the stretch covered going from `prev_m` to `cur_m`
pub fn crossed(prev_m: f64, cur_m: f64, gate_m: f64, lap_length_m: f64) -> bool {
    if prev_m <= cur_m {
        prev_m < gate_m && gate_m <= cur_m
    } else {
        (prev_m < gate_m && gate_m <= lap_length_m) || (0.0 <= gate_m && gate_m <= cur_m)
    }
}

/// Tracks split and lap timers across ticks
#[derive(Debug, Clone)]
pub struct GateTimer {
    last_gate_time_s: f64,
    last_gate: Option<u32>,
    last_finish_time_s: Option<f64>,
    best_lap_s: Option<f64>,
    last_lap_s: Option<f64>,
    laps_timed: u32,
}

impl Default for GateTimer {
    fn default() -> Self {
        Self::new()
    }
}

impl GateTimer {
    /// Timer for a car that starts on the start/finish line at race time zero
    pub fn new() -> Self {
        Self {
            last_gate_time_s: 0.0,
            last_gate: None,
            last_finish_time_s: Some(0.0),
            best_lap_s: None,
            last_lap_s: None,
            laps_timed: 0,
        }
    }

    /// Check every gate against the stretch travelled this tick
    ///
    /// `lap` is the lap counter after this tick's position update.
    pub fn check(
        &mut self,
        gates: &Gates,
        lap_length_m: f64,
        prev_lap_pos: f64,
        cur_lap_pos: f64,
        race_time_s: f64,
        lap: u32,
    ) -> Vec<GateCrossing> {
        let finish = gates.finish_index();
        let mut crossings = Vec::new();

        for (gate, distance) in gates.iter() {
            let gate_m = distance.rem_euclid(lap_length_m);
            if !crossed(prev_lap_pos, cur_lap_pos, gate_m, lap_length_m) {
                continue;
            }

            let split_time_s = (race_time_s - self.last_gate_time_s).max(0.0);
            self.last_gate_time_s = race_time_s;
            self.last_gate = Some(gate);

            let lap_time_s = if gate == finish {
                let lap_time = self
                    .last_finish_time_s
                    .map(|start| (race_time_s - start).max(0.0))
                    .filter(|_| lap > 1);
                self.last_finish_time_s = Some(race_time_s);
                lap_time
            } else {
                None
            };

            if let Some(t) = lap_time_s {
                self.laps_timed += 1;
                self.last_lap_s = Some(t);
                self.best_lap_s = Some(self.best_lap_s.map_or(t, |best| best.min(t)));
            }

            crossings.push(GateCrossing {
                gate,
                split_time_s,
                lap_time_s,
            });
        }

        crossings
    }

    pub fn last_gate(&self) -> Option<u32> {
        self.last_gate
    }

    pub fn best_lap_s(&self) -> Option<f64> {
        self.best_lap_s
    }

    pub fn last_lap_s(&self) -> Option<f64> {
        self.last_lap_s
    }

    pub fn laps_timed(&self) -> u32 {
        self.laps_timed
    }
}
