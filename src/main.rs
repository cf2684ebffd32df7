mod client;
mod devices;
mod geo;
mod ingest;
mod web;

use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::Duration;

use crate::client::{
    ensure_registered, valid_min_distance, ClientConfig, LastLocationStore, Runner,
    SimulatedSource, TrackerApi, DEFAULT_BASE,
};
use crate::geo::GeoPoint;

#[derive(Parser)]
#[command(name = "bus-tracker")]
#[command(about = "Live bus location tracking server and GPS client")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the tracking server
    Serve {
        /// YAML config file; built-in defaults when omitted
        #[arg(short, long)]
        config: Option<String>,
    },
    /// Sample positions and report them to the server
    Track {
        #[arg(short, long, default_value = "gps_tracker_config.json")]
        config: PathBuf,
        /// File holding the last acknowledged position
        #[arg(long, default_value = "last_location.json")]
        state: PathBuf,
        /// Server URL
        #[arg(long)]
        server: Option<String>,
        /// Update interval, e.g. `30`, `45s` or `2m`
        #[arg(long, value_parser = parse_interval)]
        interval: Option<Duration>,
        /// Minimum distance for updates in meters
        #[arg(long, value_parser = parse_min_distance)]
        min_distance: Option<f64>,
        /// Origin of the simulated position, as `lat,lon`
        #[arg(long)]
        base: Option<String>,
    },
    /// Interactively edit the client config
    Setup {
        #[arg(short, long, default_value = "gps_tracker_config.json")]
        config: PathBuf,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Serve { config } => serve(config.as_deref()).await,
        Commands::Track {
            config,
            state,
            server,
            interval,
            min_distance,
            base,
        } => {
            let overrides = Overrides {
                server,
                interval,
                min_distance,
            };
            track(&config, state, overrides, base.as_deref()).await
        }
        Commands::Setup { config } => setup(&config),
    }
}

fn parse_interval(s: &str) -> Result<Duration, String> {
    let duration = match s.trim().parse::<u64>() {
        Ok(secs) => Duration::from_secs(secs),
        Err(_) => humantime::parse_duration(s.trim()).map_err(|e| e.to_string())?,
    };
    if duration.as_secs() == 0 {
        return Err("interval must be at least one second".to_string());
    }
    Ok(duration)
}

fn parse_min_distance(s: &str) -> Result<f64, String> {
    let meters = s.trim().parse::<f64>().map_err(|e| e.to_string())?;
    if !valid_min_distance(meters) {
        return Err("distance must be a finite number of meters >= 0".to_string());
    }
    Ok(meters)
}

async fn serve(path: Option<&str>) -> ExitCode {
    let config = match path {
        Some(path) => match web::Config::from_file(path) {
            Ok(c) => c,
            Err(e) => {
                eprintln!("Error loading config {}: {}", path, e);
                return ExitCode::FAILURE;
            }
        },
        None => web::Config::default(),
    };

    match web::run_server(config).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log::error!("Server failed: {}", e);
            ExitCode::FAILURE
        }
    }
}

struct Overrides {
    server: Option<String>,
    interval: Option<Duration>,
    min_distance: Option<f64>,
}

impl Overrides {
    fn apply(self, config: &mut ClientConfig) {
        if let Some(server) = self.server {
            config.server_url = server;
        }
        if let Some(interval) = self.interval {
            config.update_interval = interval.as_secs();
        }
        if let Some(min_distance) = self.min_distance {
            config.min_distance = min_distance;
        }
    }
}

async fn track(
    config_path: &Path,
    state_path: PathBuf,
    overrides: Overrides,
    base: Option<&str>,
) -> ExitCode {
    let base = match base {
        Some(raw) => match GeoPoint::from_coordinates(raw) {
            Some(p) => p,
            None => {
                eprintln!("Invalid base coordinates: {}", raw);
                return ExitCode::FAILURE;
            }
        },
        None => DEFAULT_BASE,
    };

    let mut config = ClientConfig::load(config_path);
    overrides.apply(&mut config);
    if let Err(e) = config.save(config_path) {
        log::error!("Error saving config: {}", e);
    }

    let api = match TrackerApi::new(&config.server_url) {
        Ok(api) => api,
        Err(e) => {
            eprintln!("Error creating HTTP client: {}", e);
            return ExitCode::FAILURE;
        }
    };

    if let Err(e) = ensure_registered(&api, &mut config, config_path).await {
        log::error!("Error registering device: {}", e);
        eprintln!("Failed to register device with the tracking server. Exiting.");
        return ExitCode::FAILURE;
    }

    println!(
        "Starting GPS tracker client. Sending updates every {}.",
        humantime::format_duration(config.update_interval())
    );
    println!(
        "Updates will only be sent if device moves at least {} meters.",
        config.min_distance
    );
    println!("Press Ctrl+C to stop.");

    let runner = Runner::new(
        config,
        LastLocationStore::new(state_path),
        SimulatedSource::new(base),
        api,
    );
    runner.run().await;

    println!("GPS tracker client stopped.");
    ExitCode::SUCCESS
}

fn setup(path: &Path) -> ExitCode {
    match client::setup::run_setup(path) {
        Ok(()) => {
            println!("Configuration saved!");
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("Setup failed: {}", e);
            ExitCode::FAILURE
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn interval_accepts_plain_seconds_and_humantime() {
        assert_eq!(parse_interval("30"), Ok(Duration::from_secs(30)));
        assert_eq!(parse_interval("45s"), Ok(Duration::from_secs(45)));
        assert_eq!(parse_interval("2m"), Ok(Duration::from_secs(120)));
    }

    #[test]
    fn interval_rejects_zero_and_garbage() {
        assert!(parse_interval("0").is_err());
        assert!(parse_interval("500ms").is_err());
        assert!(parse_interval("often").is_err());
    }

    #[test]
    fn min_distance_must_be_finite_and_non_negative() {
        assert_eq!(parse_min_distance("12.5"), Ok(12.5));
        assert_eq!(parse_min_distance("0"), Ok(0.0));
        assert!(parse_min_distance("NaN").is_err());
        assert!(parse_min_distance("inf").is_err());
        assert!(parse_min_distance("-1").is_err());
        assert!(Cli::try_parse_from(["bus-tracker", "track", "--min-distance", "NaN"]).is_err());
    }

    #[test]
    fn overrides_only_touch_given_fields() {
        let mut config = ClientConfig::default();
        Overrides {
            server: None,
            interval: Some(Duration::from_secs(90)),
            min_distance: None,
        }
        .apply(&mut config);
        assert_eq!(config.server_url, ClientConfig::default().server_url);
        assert_eq!(config.update_interval, 90);
        assert_eq!(config.min_distance, 10.0);
    }

    #[test]
    fn cli_parses_track_flags() {
        let cli = Cli::try_parse_from([
            "bus-tracker",
            "track",
            "--server",
            "http://bus.example",
            "--interval",
            "1m",
            "--base",
            "40.0,-74.0",
        ])
        .unwrap();
        match cli.command {
            Commands::Track {
                server, interval, ..
            } => {
                assert_eq!(server.as_deref(), Some("http://bus.example"));
                assert_eq!(interval, Some(Duration::from_secs(60)));
            }
            _ => panic!("expected track"),
        }
    }
}
