//! Output sink implementations
//!
//! Sinks forward telemetry events to a destination: a CSV or NDJSON file, or
//! a collector reached over HTTP.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, warn};
use tracksim_core::{TelemetryEvent, TelemetrySink};

/// Per-request timeout for the HTTP sink
pub const HTTP_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SinkType {
    Csv { path: PathBuf },
    Ndjson { path: PathBuf },
    Http { url: String },
}

fn open_append(path: &Path) -> Result<File> {
    OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("failed to open {}", path.display()))
}

/// CSV file sink
///
/// Appends to the file, writing the header row only when the file starts out
/// empty. Columns follow the event's field order.
pub struct CsvSink {
    writer: csv::Writer<File>,
}

impl CsvSink {
    pub fn new(path: impl AsRef<Path>) -> Result<Self> {
        let file = open_append(path.as_ref())?;
        let is_empty = file.metadata()?.len() == 0;
        let writer = csv::WriterBuilder::new().has_headers(is_empty).from_writer(file);
        Ok(Self { writer })
    }
}

impl TelemetrySink for CsvSink {
    fn name(&self) -> &str {
        "csv"
    }

    fn send(&mut self, event: &TelemetryEvent) -> Result<()> {
        self.writer.serialize(event)?;
        Ok(())
    }

    fn flush(&mut self) -> Result<()> {
        self.writer.flush()?;
        Ok(())
    }
}

/// File sink (NDJSON), one event per line
pub struct NdjsonSink {
    writer: BufWriter<File>,
}

impl NdjsonSink {
    pub fn new(path: impl AsRef<Path>) -> Result<Self> {
        let file = open_append(path.as_ref())?;
        Ok(Self {
            writer: BufWriter::new(file),
        })
    }
}

impl TelemetrySink for NdjsonSink {
    fn name(&self) -> &str {
        "ndjson"
    }

    fn send(&mut self, event: &TelemetryEvent) -> Result<()> {
        let json = event.to_json()?;
        writeln!(self.writer, "{}", json)?;
        Ok(())
    }

    fn flush(&mut self) -> Result<()> {
        self.writer.flush()?;
        Ok(())
    }
}

/// Delivery counts reported by the HTTP worker when it drains
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HttpStats {
    pub delivered: u64,
    pub failed: u64,
}

/// HTTP POST sink
///
/// `send` only queues the event; a single worker task posts queued events in
/// order so the collector sees them in generation order. The worker exits
/// once the sink is dropped and the queue is drained.
pub struct HttpSink {
    tx: mpsc::UnboundedSender<TelemetryEvent>,
}

impl HttpSink {
    /// Start the delivery worker on the current tokio runtime
    pub fn spawn(url: impl Into<String>) -> Result<(Self, JoinHandle<HttpStats>)> {
        let url = url.into();
        let client = reqwest::Client::builder()
            .timeout(HTTP_TIMEOUT)
            .build()
            .context("failed to build HTTP client")?;
        let (tx, rx) = mpsc::unbounded_channel();
        let worker = tokio::spawn(deliver(client, url, rx));
        Ok((Self { tx }, worker))
    }
}

async fn deliver(client: reqwest::Client, url: String, mut rx: mpsc::UnboundedReceiver<TelemetryEvent>) -> HttpStats {
    let mut stats = HttpStats::default();
    while let Some(event) = rx.recv().await {
        match client.post(&url).json(&event).send().await {
            Ok(response) if response.status().as_u16() >= 400 => {
                let status = response.status();
                let body = response.text().await.unwrap_or_default();
                warn!("HTTP sink rejected event: {} {}", status, body);
                stats.failed += 1;
            }
            Ok(_) => stats.delivered += 1,
            Err(e) => {
                warn!("HTTP sink error: {}", e);
                stats.failed += 1;
            }
        }
    }
    debug!(delivered = stats.delivered, failed = stats.failed, "HTTP sink drained");
    stats
}

impl TelemetrySink for HttpSink {
    fn name(&self) -> &str {
        "http"
    }

    fn send(&mut self, event: &TelemetryEvent) -> Result<()> {
        self.tx
            .send(event.clone())
            .map_err(|_| anyhow::anyhow!("HTTP delivery worker has stopped"))
    }
}

/// Create a sink from configuration
///
/// HTTP sinks also return the worker handle; await it after the sink is
/// dropped to wait for the queue to drain.
pub fn create_sink(sink_type: &SinkType) -> Result<(Box<dyn TelemetrySink>, Option<JoinHandle<HttpStats>>)> {
    match sink_type {
        SinkType::Csv { path } => Ok((Box::new(CsvSink::new(path)?), None)),
        SinkType::Ndjson { path } => Ok((Box::new(NdjsonSink::new(path)?), None)),
        SinkType::Http { url } => {
            let (sink, worker) = HttpSink::spawn(url.clone())?;
            Ok((Box::new(sink), Some(worker)))
        }
    }
}
