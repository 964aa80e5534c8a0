//! Tracksim
//!
//! Runs one simulated session on the reference circuit and delivers its
//! telemetry to a file or an HTTP collector.

use anyhow::Result;
use clap::Parser;
use tracing::info;
use tracksim_cli::args::{resolve_preset, Cli};
use tracksim_cli::sinks::create_sink;
use tracksim_core::circuit::reference_circuit;
use tracksim_core::VehicleParams;
use tracksim_sim::{Session, SessionSummary};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    if cli.list_presets {
        for name in VehicleParams::preset_names() {
            let params = VehicleParams::preset(name)?;
            println!("{:<6} {:<5} {:>4.0} kW  {:>5.0} kg", name, params.class, params.peak_power_kw, params.mass_kg);
        }
        return Ok(());
    }

    let config = cli.run_config()?;
    let vehicle = resolve_preset(&cli.vehicle_preset);
    let track = reference_circuit()?;
    let sink_type = cli.sink_type();

    info!(
        track = %track.name,
        lap_length_m = track.lap_length_m(),
        sink = ?sink_type,
        "Starting tracksim"
    );

    let (sink, worker) = create_sink(&sink_type)?;

    // The engine is CPU bound; keep it off the async workers so the HTTP sink can drain
    let summary = tokio::task::spawn_blocking(move || -> Result<SessionSummary> {
        let mut session = Session::new(config, vehicle, track, sink)?;
        session.run();
        Ok(session.summary())
    })
    .await??;

    if let Some(worker) = worker {
        let stats = worker.await?;
        info!(delivered = stats.delivered, failed = stats.failed, "HTTP delivery finished");
    }

    println!("Sim produced {} telemetry events.", summary.events_emitted);
    Ok(())
}
