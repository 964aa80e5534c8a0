//! Telemetry sink trait definition

use crate::model::TelemetryEvent;
use anyhow::Result;

/// Destination for telemetry events
///
/// Implementations decide where events go (file, network, memory). Errors
/// returned from `send` are reported by the caller and never stop the
/// simulation, so implementations should not retry internally.
pub trait TelemetrySink: Send {
    /// Short name used in log messages (e.g. "csv", "http")
    fn name(&self) -> &str;

    /// Deliver one event. Events arrive in generation order.
    fn send(&mut self, event: &TelemetryEvent) -> Result<()>;

    /// Push any buffered events to their destination
    fn flush(&mut self) -> Result<()> {
        Ok(())
    }
}

/// Keeps every event in memory, mostly for tests and embedding
#[derive(Debug, Default)]
pub struct MemorySink {
    events: Vec<TelemetryEvent>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> &[TelemetryEvent] {
        &self.events
    }

    pub fn into_events(self) -> Vec<TelemetryEvent> {
        self.events
    }
}

impl TelemetrySink for MemorySink {
    fn name(&self) -> &str {
        "memory"
    }

    fn send(&mut self, event: &TelemetryEvent) -> Result<()> {
        self.events.push(event.clone());
        Ok(())
    }
}

impl<S: TelemetrySink + ?Sized> TelemetrySink for Box<S> {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn send(&mut self, event: &TelemetryEvent) -> Result<()> {
        (**self).send(event)
    }

    fn flush(&mut self) -> Result<()> {
        (**self).flush()
    }
}

impl<S: TelemetrySink + ?Sized> TelemetrySink for &mut S {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn send(&mut self, event: &TelemetryEvent) -> Result<()> {
        (**self).send(event)
    }

    fn flush(&mut self) -> Result<()> {
        (**self).flush()
    }
}
