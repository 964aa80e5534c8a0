//! Command-line arguments and run configuration loading
//!
//! Precedence: command-line flags, then the optional JSON config file, then
//! built-in defaults.

use crate::sinks::SinkType;
use clap::{Parser, ValueEnum};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::warn;
use tracksim_core::vehicle::DEFAULT_PRESET;
use tracksim_core::VehicleParams;
use tracksim_sim::RunConfig;

pub const DEFAULT_SERVER_URL: &str = "http://localhost:8000/telemetry";
pub const DEFAULT_OUTPUT: &str = "telemetry.csv";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid config file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Csv,
    Ndjson,
}

#[derive(Debug, Parser)]
#[command(name = "tracksim")]
#[command(about = "Simulate a car lapping a circuit and emit telemetry events")]
#[command(version)]
pub struct Cli {
    /// Simulated session length in seconds
    #[arg(long)]
    pub sim_time_s: Option<f64>,

    #[arg(long)]
    pub car_id: Option<String>,

    #[arg(long)]
    pub driver: Option<String>,

    #[arg(long)]
    pub team: Option<String>,

    /// Vehicle preset, e.g. "gt3", "f1", "lmdh", "gt4"
    #[arg(long, default_value = DEFAULT_PRESET)]
    pub vehicle_preset: String,

    /// Emit every tick (20 Hz at the default dt), not only gate crossings
    #[arg(long = "enable-20hz-logging")]
    pub enable_20hz_logging: bool,

    /// POST events to the collector instead of writing a file
    #[arg(long)]
    pub send_to_server: bool,

    #[arg(long, env = "TRACKSIM_SERVER_URL", default_value = DEFAULT_SERVER_URL)]
    pub server_url: String,

    /// File to append events to
    #[arg(long, default_value = DEFAULT_OUTPUT)]
    pub output: PathBuf,

    #[arg(long, value_enum, default_value_t = OutputFormat::Csv)]
    pub format: OutputFormat,

    /// Seed for the driver's steering noise; random when omitted
    #[arg(long, env = "TRACKSIM_SEED")]
    pub seed: Option<u64>,

    /// Tick size in seconds
    #[arg(long)]
    pub dt: Option<f64>,

    /// JSON run configuration; flags given on the command line take precedence
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Print the available vehicle presets and exit
    #[arg(long)]
    pub list_presets: bool,
}

impl Cli {
    /// Config file (if any) with command-line overrides applied
    pub fn run_config(&self) -> Result<RunConfig, ConfigError> {
        let mut config = match &self.config {
            Some(path) => load_config_file(path)?,
            None => RunConfig::default(),
        };

        if let Some(sim_time_s) = self.sim_time_s {
            config.sim_time_s = sim_time_s;
        }
        if let Some(dt) = self.dt {
            config.dt = dt;
        }
        if let Some(seed) = self.seed {
            config.seed = Some(seed);
        }
        if let Some(car_id) = &self.car_id {
            config.identity.car_id = car_id.clone();
        }
        if let Some(driver) = &self.driver {
            config.identity.driver = driver.clone();
        }
        if let Some(team) = &self.team {
            config.identity.team = team.clone();
        }
        if self.enable_20hz_logging {
            config.high_frequency = true;
        }

        Ok(config)
    }

    pub fn sink_type(&self) -> SinkType {
        if self.send_to_server {
            return SinkType::Http {
                url: self.server_url.clone(),
            };
        }
        match self.format {
            OutputFormat::Csv => SinkType::Csv {
                path: self.output.clone(),
            },
            OutputFormat::Ndjson => SinkType::Ndjson {
                path: self.output.clone(),
            },
        }
    }
}

pub fn load_config_file(path: &Path) -> Result<RunConfig, ConfigError> {
    let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_str(&text).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

/// Look up a preset, falling back to the default one with a warning
pub fn resolve_preset(name: &str) -> VehicleParams {
    match VehicleParams::preset(name) {
        Ok(params) => params,
        Err(e) => {
            warn!("{}, using default ({})", e, DEFAULT_PRESET);
            VehicleParams::default()
        }
    }
}
