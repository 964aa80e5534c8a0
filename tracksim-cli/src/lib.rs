//! Tracksim command-line runner
//!
//! Exposes argument handling and sinks for integration testing.

pub mod args;
pub mod sinks;
