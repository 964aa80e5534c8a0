//! Fixed-timestep vehicle dynamics, lap timing and telemetry emission

pub mod config;
pub mod driver;
pub mod emitter;
pub mod engine;
pub mod session;
pub mod state;
pub mod timing;

pub use config::{OutlapConfig, RunConfig, TargetRefresh, DEFAULT_DT};
pub use driver::DriverModel;
pub use emitter::TelemetryEmitter;
pub use engine::{select_gear, VehicleDynamics};
pub use session::{Session, SessionSummary};
pub use state::{Diagnostics, VehicleState};
pub use timing::{GateCrossing, GateTimer};
