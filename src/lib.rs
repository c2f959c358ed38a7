/// gagemon_service: river gage sample ingestion and readings service.
///
/// # Module structure
///
/// ```text
/// gagemon_service
/// ├── model       — shared data types (Sensor, Sample, error taxonomy)
/// ├── config      — sensor registry + threshold configuration (sensors.toml)
/// ├── db          — PostgreSQL connection and schema validation
/// ├── store       — SampleStore trait, PostgreSQL and in-memory stores
/// ├── ingest
/// │   ├── usgs    — USGS NWIS IV API: URL construction + JSON parsing + fetcher
/// │   └── fixtures (test only) — representative API response payloads
/// ├── gate        — ingestion/dedup gate: the single write choke point
/// ├── readings    — freshness policy / current-reading service
/// ├── endpoint    — JSON API (current reading, sample range, local push)
/// └── daemon      — periodic polling loop for remote sensors
/// ```

/// Public modules
pub mod config;
pub mod daemon;
pub mod db;
pub mod endpoint;
pub mod gate;
pub mod ingest;
pub mod model;
pub mod readings;
pub mod store;
