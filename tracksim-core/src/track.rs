//! Closed-loop track geometry and timing gates
//!
//! A track is an ordered list of segments whose cumulative intervals tile
//! `[0, lap_length)` exactly. Positions handed to the lookup functions may be
//! any real number; they are reduced onto the lap first.

use crate::error::SimError;
use crate::physics::{corner_target_speed, power_limited_speed};
use crate::vehicle::VehicleParams;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Arcs tighter than this are treated as straights for target-speed purposes
const MIN_CORNER_RADIUS_M: f64 = 5.0;

/// Slowest target speed the planner will ever ask for (m/s)
pub const MIN_CORNER_SPEED_MPS: f64 = 6.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    Left,
    Right,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SegmentKind {
    Straight,
    Arc { radius_m: f64, direction: Direction },
}

/// A contiguous stretch of track
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Segment {
    pub name: String,
    pub kind: SegmentKind,
    pub length_m: f64,
    pub start_m: f64,
    pub end_m: f64,
}

impl Segment {
    /// Radius for arcs, `None` for straights
    pub fn radius(&self) -> Option<f64> {
        match self.kind {
            SegmentKind::Arc { radius_m, .. } => Some(radius_m),
            SegmentKind::Straight => None,
        }
    }

    pub fn direction(&self) -> Option<Direction> {
        match self.kind {
            SegmentKind::Arc { direction, .. } => Some(direction),
            SegmentKind::Straight => None,
        }
    }

    /// Radius of an arc strictly wider than `min_radius`
    pub fn arc_radius_above(&self, min_radius: f64) -> Option<f64> {
        self.radius().filter(|r| *r > min_radius)
    }

    pub fn contains(&self, lap_pos: f64) -> bool {
        self.start_m <= lap_pos && lap_pos < self.end_m
    }
}

/// Gate index → distance along the lap
///
/// The highest index is the start/finish line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Gates {
    distances: BTreeMap<u32, f64>,
}

impl Gates {
    /// Build from distances listed in gate order (gate 1 first)
    ///
    /// Distances must increase strictly up to the last gate, which is the
    /// start/finish line at 0 m.
    pub fn from_distances(distances: &[f64], lap_length_m: f64) -> Result<Self, SimError> {
        let Some((finish, inner)) = distances.split_last() else {
            return Err(SimError::InvalidTrack("at least one gate is required".into()));
        };
        for (i, d) in distances.iter().enumerate() {
            if !d.is_finite() || *d < 0.0 || *d >= lap_length_m {
                return Err(SimError::InvalidTrack(format!(
                    "gate {} at {} m lies outside the lap [0, {})",
                    i + 1,
                    d,
                    lap_length_m
                )));
            }
        }
        if *finish != 0.0 {
            return Err(SimError::InvalidTrack(format!(
                "start/finish gate {} must sit at 0 m, got {} m",
                distances.len(),
                finish
            )));
        }
        let mut prev = 0.0;
        for (i, d) in inner.iter().enumerate() {
            if *d <= prev {
                return Err(SimError::InvalidTrack(format!(
                    "gate {} at {} m does not lie beyond gate {} at {} m",
                    i + 1,
                    d,
                    i,
                    prev
                )));
            }
            prev = *d;
        }
        let distances = distances
            .iter()
            .enumerate()
            .map(|(i, d)| (i as u32 + 1, *d))
            .collect();
        Ok(Self { distances })
    }

    /// `count` gates spaced evenly, the last one on the start/finish line
    pub fn evenly_spaced(lap_length_m: f64, count: u32) -> Result<Self, SimError> {
        if count == 0 {
            return Err(SimError::InvalidTrack("gate count must be positive".into()));
        }
        let spacing = lap_length_m / count as f64;
        let distances: Vec<f64> = (1..=count)
            .map(|i| if i == count { 0.0 } else { spacing * i as f64 })
            .collect();
        Self::from_distances(&distances, lap_length_m)
    }

    /// Index of the start/finish gate
    pub fn finish_index(&self) -> u32 {
        self.distances.keys().next_back().copied().unwrap_or(0)
    }

    pub fn distance(&self, index: u32) -> Option<f64> {
        self.distances.get(&index).copied()
    }

    /// Gates in ascending index order
    pub fn iter(&self) -> impl Iterator<Item = (u32, f64)> + '_ {
        self.distances.iter().map(|(i, d)| (*i, *d))
    }

    pub fn len(&self) -> usize {
        self.distances.len()
    }

    pub fn is_empty(&self) -> bool {
        self.distances.is_empty()
    }
}

/// Immutable circuit definition
///
/// Deserialized tracks are rebuilt through [`TrackBuilder`], so stored
/// intervals and lap length are recomputed and validated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "TrackDef")]
pub struct Track {
    pub name: String,
    segments: Vec<Segment>,
    gates: Gates,
    lap_length_m: f64,
}

/// Serialized form of a track; derived fields are ignored on input
#[derive(Deserialize)]
struct TrackDef {
    name: String,
    segments: Vec<SegmentDef>,
    gates: Gates,
}

#[derive(Deserialize)]
struct SegmentDef {
    name: String,
    kind: SegmentKind,
    length_m: f64,
}

impl TryFrom<TrackDef> for Track {
    type Error = SimError;

    fn try_from(def: TrackDef) -> Result<Self, Self::Error> {
        let builder = def
            .segments
            .iter()
            .fold(Track::builder(def.name), |b, seg| b.push(&seg.name, seg.kind, seg.length_m));
        let distances: Vec<f64> = def.gates.iter().map(|(_, d)| d).collect();
        builder.with_gate_distances(&distances)
    }
}

impl Track {
    pub fn builder(name: impl Into<String>) -> TrackBuilder {
        TrackBuilder {
            name: name.into(),
            segments: Vec::new(),
            cursor_m: 0.0,
        }
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    pub fn gates(&self) -> &Gates {
        &self.gates
    }

    pub fn lap_length_m(&self) -> f64 {
        self.lap_length_m
    }

    /// Reduce any position onto `[0, lap_length)`
    pub fn lap_position(&self, position_m: f64) -> f64 {
        if !position_m.is_finite() || !self.lap_length_m.is_finite() || self.lap_length_m <= 0.0 {
            return 0.0;
        }
        let p = position_m.rem_euclid(self.lap_length_m);
        // rem_euclid can round up to the modulus for tiny negative inputs
        if p >= self.lap_length_m {
            0.0
        } else {
            p
        }
    }

    /// Index of the segment containing `position_m`
    pub fn segment_index_at(&self, position_m: f64) -> usize {
        let p = self.lap_position(position_m);
        self.segments
            .iter()
            .position(|s| s.contains(p))
            .unwrap_or(self.segments.len().saturating_sub(1))
    }

    pub fn segment_at(&self, position_m: f64) -> &Segment {
        &self.segments[self.segment_index_at(position_m)]
    }

    /// Distance from `lap_pos` to the end of `segment`, going forward around the loop
    pub fn distance_to_segment_end(&self, segment: &Segment, lap_pos: f64) -> f64 {
        if segment.end_m > lap_pos {
            segment.end_m - lap_pos
        } else {
            self.lap_length_m - lap_pos + segment.end_m
        }
    }
}

/// Appends segments in travel order, accumulating their distance intervals
pub struct TrackBuilder {
    name: String,
    segments: Vec<Segment>,
    cursor_m: f64,
}

impl TrackBuilder {
    fn push(mut self, name: &str, kind: SegmentKind, length_m: f64) -> Self {
        self.segments.push(Segment {
            name: name.to_string(),
            kind,
            length_m,
            start_m: self.cursor_m,
            end_m: self.cursor_m + length_m,
        });
        self.cursor_m += length_m;
        self
    }

    pub fn straight(self, name: &str, length_m: f64) -> Self {
        self.push(name, SegmentKind::Straight, length_m)
    }

    pub fn arc(self, name: &str, length_m: f64, radius_m: f64, direction: Direction) -> Self {
        self.push(name, SegmentKind::Arc { radius_m, direction }, length_m)
    }

    /// Finish with explicit gate distances (gate 1 first, start/finish last)
    pub fn with_gate_distances(self, distances: &[f64]) -> Result<Track, SimError> {
        let lap_length_m = self.validated_length()?;
        let gates = Gates::from_distances(distances, lap_length_m)?;
        Ok(self.finish(gates, lap_length_m))
    }

    /// Finish with `count` evenly spaced gates
    pub fn with_even_gates(self, count: u32) -> Result<Track, SimError> {
        let lap_length_m = self.validated_length()?;
        let gates = Gates::evenly_spaced(lap_length_m, count)?;
        Ok(self.finish(gates, lap_length_m))
    }

    fn validated_length(&self) -> Result<f64, SimError> {
        if self.segments.is_empty() {
            return Err(SimError::InvalidTrack(format!("track '{}' has no segments", self.name)));
        }
        for seg in &self.segments {
            if !seg.length_m.is_finite() || seg.length_m <= 0.0 {
                return Err(SimError::InvalidTrack(format!(
                    "segment '{}' has non-positive length {}",
                    seg.name, seg.length_m
                )));
            }
            if let Some(r) = seg.radius() {
                if !r.is_finite() || r <= 0.0 {
                    return Err(SimError::InvalidTrack(format!(
                        "segment '{}' has non-positive radius {}",
                        seg.name, r
                    )));
                }
            }
        }
        Ok(self.cursor_m)
    }

    fn finish(self, gates: Gates, lap_length_m: f64) -> Track {
        Track {
            name: self.name,
            segments: self.segments,
            gates,
            lap_length_m,
        }
    }
}

/// Speed the driver aims for on a segment with the given tyre friction (m/s)
///
/// Arcs wider than 5 m are grip limited; everything else is drag limited.
pub fn target_speed_for_segment(segment: &Segment, friction: f64, vehicle: &VehicleParams) -> f64 {
    match segment.arc_radius_above(MIN_CORNER_RADIUS_M) {
        Some(radius) => (corner_target_speed(radius, friction) * 0.92).max(MIN_CORNER_SPEED_MPS),
        None => straight_target_speed(vehicle),
    }
}

/// Target speed on a straight: just shy of the drag-limited top speed
pub fn straight_target_speed(vehicle: &VehicleParams) -> f64 {
    power_limited_speed(vehicle.peak_power_kw, vehicle.cda_m2, vehicle.air_density) * 0.98
}
