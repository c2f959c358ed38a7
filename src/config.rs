/// Sensor registry and service configuration loader - parses sensors.toml
///
/// Separates sensor metadata and tunable thresholds from code, making it
/// easy to add sensors or adjust the freshness/dedup windows without
/// recompiling the service.

use serde::Deserialize;
use std::collections::HashMap;
use std::fs;

use crate::model::Sensor;

/// Tunable service thresholds, loaded from the `[service]` table.
///
/// Defaults match the original deployment: a remote series is considered
/// stale after 60 minutes, a new sample within 10 minutes of the stored
/// latest is treated as a near-duplicate, and sensors with no history
/// backfill the last 7 days.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    /// Maximum age of the latest stored sample before a remote re-fetch
    /// is triggered.
    pub freshness_threshold_minutes: i64,

    /// Span within which an incoming sample is considered a duplicate of
    /// the stored latest.
    pub dedup_window_minutes: i64,

    /// ISO 8601 period fetched when a remote sensor has no stored samples
    /// at all.
    pub default_lookback: String,

    /// Bound on any single request to the remote service.
    pub fetch_timeout_secs: u64,

    /// How often the daemon re-evaluates freshness for remote sensors.
    pub poll_interval_minutes: u64,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            freshness_threshold_minutes: 60,
            dedup_window_minutes: 10,
            default_lookback: "P7D".to_string(),
            fetch_timeout_secs: 10,
            poll_interval_minutes: 15,
        }
    }
}

/// Root configuration structure for TOML parsing
#[derive(Debug, Deserialize)]
struct SensorRegistry {
    #[serde(default)]
    service: ServiceConfig,
    sensor: Vec<Sensor>,
}

/// Everything sensors.toml defines: thresholds plus the sensor registry.
#[derive(Debug, Clone)]
pub struct Config {
    pub service: ServiceConfig,
    pub sensors: Vec<Sensor>,
}

impl Config {
    /// Parses a sensors.toml document.
    ///
    /// Fails if the document is malformed or if a remote sensor is missing
    /// its `remote_id` — the freshness policy cannot pull for such a sensor.
    pub fn from_toml(contents: &str) -> Result<Self, String> {
        let registry: SensorRegistry =
            toml::from_str(contents).map_err(|e| format!("Failed to parse config: {}", e))?;

        for sensor in &registry.sensor {
            if !sensor.local && sensor.remote_id.is_none() {
                return Err(format!(
                    "Sensor {} ({}) is remote but has no remote_id",
                    sensor.id, sensor.slug
                ));
            }
        }

        Ok(Config {
            service: registry.service,
            sensors: registry.sensor,
        })
    }

    /// Builds a lookup map keyed by sensor id for O(1) lookups during
    /// request handling.
    pub fn sensor_map(&self) -> HashMap<i32, Sensor> {
        self.sensors.iter().map(|s| (s.id, s.clone())).collect()
    }

    /// Sensors whose data is pulled from USGS rather than pushed.
    pub fn remote_sensors(&self) -> Vec<&Sensor> {
        self.sensors.iter().filter(|s| !s.local).collect()
    }
}

/// Loads sensor registry and thresholds from the sensors.toml file.
///
/// # Panics
/// Panics if the configuration file is missing or invalid. This is
/// intentional — the service cannot operate without a sensor registry.
///
/// # File Location
/// Expects `sensors.toml` in the current working directory (project root
/// when running via `cargo run`).
pub fn load_config() -> Config {
    let config_path = "sensors.toml";

    let contents = fs::read_to_string(config_path)
        .unwrap_or_else(|e| panic!("Failed to read {}: {}", config_path, e));

    Config::from_toml(&contents)
        .unwrap_or_else(|e| panic!("Failed to load {}: {}", config_path, e))
}
