//! Tracksim Core Library
//!
//! Immutable inputs and shared types for the lap simulator: track geometry,
//! vehicle presets, stateless physics formulas, the telemetry event record
//! and the sink trait that receives it.

pub mod circuit;
pub mod error;
pub mod model;
pub mod physics;
pub mod sink;
pub mod track;
pub mod units;
pub mod vehicle;

pub use error::SimError;
pub use model::{CarIdentity, TelemetryEvent};
pub use sink::{MemorySink, TelemetrySink};
pub use track::{Direction, Gates, Segment, SegmentKind, Track};
pub use vehicle::{DriverProfile, VehicleParams};
