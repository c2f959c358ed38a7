/// Core data types for the gage sample service.
///
/// This module defines the shared domain model imported by all other modules.
/// It contains the sensor/sample types and the error taxonomy — no I/O.

use chrono::{DateTime, Utc};
use serde::Deserialize;

// ---------------------------------------------------------------------------
// Parameter codes
// ---------------------------------------------------------------------------

/// USGS parameter code for gage height (stage), in feet. This is the
/// service default when a sensor carries no `remote_parameter` override.
pub const PARAM_STAGE: &str = "00065";

/// USGS parameter code for discharge (streamflow), in cubic feet per second.
pub const PARAM_DISCHARGE: &str = "00060";

// ---------------------------------------------------------------------------
// Sensor
// ---------------------------------------------------------------------------

/// One measured quantity stream at a gage, loaded from `sensors.toml`.
///
/// A sensor is either *local* (an owned station pushes its readings to the
/// push endpoint) or *remote* (readings are pulled from the USGS NWIS IV
/// service using `remote_id` and, optionally, `remote_parameter`).
#[derive(Debug, Clone, Deserialize)]
pub struct Sensor {
    pub id: i32,
    pub slug: String,
    pub name: String,
    /// Measurement type discriminator, e.g. "level" or "flow".
    pub stype: String,
    /// True if the owning station pushes data directly; false if data
    /// must be pulled from USGS.
    pub local: bool,
    /// USGS site number, required when `local` is false.
    pub remote_id: Option<String>,
    /// USGS parameter code override. `None` selects the service default
    /// (gage height, `00065`).
    pub remote_parameter: Option<String>,
}

// ---------------------------------------------------------------------------
// Sample
// ---------------------------------------------------------------------------

/// A single timestamped reading for a sensor.
///
/// `datetime` is the time of the physical measurement, not ingestion time,
/// and is always UTC by the time a sample exists — remote offsets are
/// normalized at the fetch boundary. Samples are immutable once stored.
#[derive(Debug, Clone, PartialEq)]
pub struct Sample {
    pub id: i64,
    pub sensor_id: i32,
    pub datetime: DateTime<Utc>,
    pub value: f64,
}

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// The sample store cannot read or write. Not recoverable locally;
/// surfaced to the caller of `current_reading`/`ingest`.
#[derive(Debug)]
pub enum StorageError {
    /// The underlying database failed or rejected the operation.
    Backend(String),
}

impl std::fmt::Display for StorageError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StorageError::Backend(msg) => write!(f, "Storage error: {}", msg),
        }
    }
}

impl std::error::Error for StorageError {}

impl From<postgres::Error> for StorageError {
    fn from(e: postgres::Error) -> Self {
        StorageError::Backend(e.to_string())
    }
}

/// Errors that can arise when fetching or parsing USGS NWIS data.
/// Recovered by the freshness policy (fall back to the stored latest),
/// never surfaced as a user-facing failure on their own.
#[derive(Debug, PartialEq)]
pub enum RemoteFetchError {
    /// Non-2xx HTTP response from the remote service.
    HttpStatus(u16),
    /// The request could not be completed (connect, timeout, transport).
    Transport(String),
    /// The response body could not be deserialized.
    Parse(String),
    /// Structurally valid response with no usable data values
    /// (empty series or only sentinel -999999 entries).
    NoData(String),
}

impl std::fmt::Display for RemoteFetchError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RemoteFetchError::HttpStatus(code) => write!(f, "HTTP error: {}", code),
            RemoteFetchError::Transport(msg) => write!(f, "Transport error: {}", msg),
            RemoteFetchError::Parse(msg) => write!(f, "Parse error: {}", msg),
            RemoteFetchError::NoData(msg) => write!(f, "No data available: {}", msg),
        }
    }
}

impl std::error::Error for RemoteFetchError {}

/// Ingest input was malformed and never reached the dedup gate.
#[derive(Debug, PartialEq)]
pub enum ValidationError {
    /// Value is NaN or infinite.
    NonFiniteValue(String),
    /// Timestamp string could not be parsed as RFC 3339.
    InvalidTimestamp(String),
    /// The sensor id is not in the registry.
    UnknownSensor(i32),
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ValidationError::NonFiniteValue(v) => write!(f, "Value is not a finite number: {}", v),
            ValidationError::InvalidTimestamp(s) => write!(f, "Invalid timestamp: {}", s),
            ValidationError::UnknownSensor(id) => write!(f, "Unknown sensor: {}", id),
        }
    }
}

impl std::error::Error for ValidationError {}

/// Error result of `IngestGate::ingest`. A dedup discard is NOT an error —
/// it is a successful no-op reported through `IngestOutcome`.
#[derive(Debug)]
pub enum IngestError {
    Validation(ValidationError),
    Storage(StorageError),
}

impl std::fmt::Display for IngestError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            IngestError::Validation(e) => write!(f, "{}", e),
            IngestError::Storage(e) => write!(f, "{}", e),
        }
    }
}

impl std::error::Error for IngestError {}

impl From<ValidationError> for IngestError {
    fn from(e: ValidationError) -> Self {
        IngestError::Validation(e)
    }
}

impl From<StorageError> for IngestError {
    fn from(e: StorageError) -> Self {
        IngestError::Storage(e)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display_includes_detail() {
        let e = RemoteFetchError::HttpStatus(503);
        assert_eq!(e.to_string(), "HTTP error: 503");

        let e = StorageError::Backend("connection reset".to_string());
        assert!(e.to_string().contains("connection reset"));

        let e = ValidationError::NonFiniteValue("NaN".to_string());
        assert!(e.to_string().contains("NaN"));
    }

    #[test]
    fn test_ingest_error_wraps_both_kinds() {
        let v: IngestError = ValidationError::UnknownSensor(42).into();
        assert!(matches!(v, IngestError::Validation(_)));

        let s: IngestError = StorageError::Backend("down".to_string()).into();
        assert!(matches!(s, IngestError::Storage(_)));
    }
}
