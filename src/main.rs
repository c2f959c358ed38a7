//! Gage Sample Service - Main Daemon
//!
//! A server-side daemon that:
//! 1. Loads the sensor registry from sensors.toml
//! 2. Validates database connectivity and the gage schema
//! 3. Serves current readings, sample ranges, and local pushes over HTTP
//! 4. Periodically re-evaluates freshness for remote (USGS) sensors,
//!    pulling stale series through the ingestion gate
//!
//! Usage:
//!   cargo run --release                    # Daemon without HTTP endpoint
//!   cargo run --release -- --endpoint 8080 # Daemon + HTTP endpoint on port 8080
//!
//! Environment:
//!   DATABASE_URL - PostgreSQL connection string
//!   RUST_LOG     - log filter (default: info)

use chrono::Duration;
use gagemon_service::config;
use gagemon_service::daemon::Daemon;
use gagemon_service::db;
use gagemon_service::endpoint::{self, EndpointContext};
use gagemon_service::gate::IngestGate;
use gagemon_service::ingest::usgs::UsgsFetcher;
use gagemon_service::readings::ReadingService;
use gagemon_service::store::PgSampleStore;
use log::error;
use std::env;
use std::sync::Arc;

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    // Parse command-line arguments
    let args: Vec<String> = env::args().collect();
    let mut endpoint_port: Option<u16> = None;

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--endpoint" => {
                if i + 1 < args.len() {
                    endpoint_port = args[i + 1].parse().ok();
                    i += 2;
                } else {
                    eprintln!("Error: --endpoint requires a port number");
                    std::process::exit(1);
                }
            }
            _ => {
                eprintln!("Unknown argument: {}", args[i]);
                eprintln!("Usage: {} [--endpoint PORT]", args[0]);
                std::process::exit(1);
            }
        }
    }

    // Load sensor registry and thresholds
    let config = config::load_config();

    // Validate database and build the service stack
    let client = match db::connect_and_verify() {
        Ok(client) => client,
        Err(e) => {
            eprintln!("Initialization failed: {}", e);
            std::process::exit(1);
        }
    };

    let store = Arc::new(PgSampleStore::new(client));
    let gate = Arc::new(IngestGate::new(
        store.clone(),
        Duration::minutes(config.service.dedup_window_minutes),
    ));

    let fetcher = match UsgsFetcher::new(
        std::time::Duration::from_secs(config.service.fetch_timeout_secs),
        &config.service.default_lookback,
    ) {
        Ok(fetcher) => fetcher,
        Err(e) => {
            eprintln!("Failed to build USGS client: {}", e);
            std::process::exit(1);
        }
    };

    let readings = Arc::new(ReadingService::new(
        store.clone(),
        fetcher,
        gate.clone(),
        Duration::minutes(config.service.freshness_threshold_minutes),
    ));

    // Start HTTP endpoint if requested (in background thread)
    if let Some(port) = endpoint_port {
        let ctx = Arc::new(EndpointContext {
            sensors: config.sensor_map(),
            store: store.clone(),
            gate: gate.clone(),
            readings: readings.clone(),
        });

        std::thread::spawn(move || {
            if let Err(e) = endpoint::start_endpoint_server(port, ctx) {
                error!("Endpoint server error: {}", e);
            }
        });
    }

    // Run the main polling loop
    let daemon = Daemon::new(config.service.clone(), config.sensors.clone(), readings);
    daemon.run();
}
