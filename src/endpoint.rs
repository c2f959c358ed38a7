/// HTTP endpoint for sensor readings
///
/// Provides a simple JSON API consumed by the web UI and by local
/// measuring stations pushing their own samples.
///
/// Endpoints:
/// - GET  /health                      - Service health check
/// - GET  /sensor/{id}/current        - Current reading (freshness policy end-to-end)
/// - GET  /sensor/{id}/samples?start=..&end=.. - Inclusive time range, ascending
/// - POST /sensor/{id}/sample         - Local push; body {"datetime": .., "value": ..}

use chrono::{DateTime, Utc};
use log::{error, info};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;

use crate::gate::{DiscardReason, IngestGate, IngestOutcome};
use crate::ingest::RemoteFetcher;
use crate::model::{Sample, Sensor, ValidationError};
use crate::readings::ReadingService;
use crate::store::SampleStore;

// ---------------------------------------------------------------------------
// Request/Response Types
// ---------------------------------------------------------------------------

/// Wire form of a sample.
#[derive(Debug, Serialize, Deserialize)]
pub struct SampleData {
    pub id: i64,
    pub sensor_id: i32,
    pub datetime: String,
    pub value: f64,
}

/// Response for /sensor/{id}/current.
#[derive(Debug, Serialize, Deserialize)]
pub struct CurrentReadingResponse {
    pub sensor_id: i32,
    pub slug: String,
    pub stype: String,
    /// `None` when no data is available for the sensor at all.
    pub sample: Option<SampleData>,
}

/// Body of a local station push.
#[derive(Debug, Deserialize)]
pub struct SamplePush {
    pub datetime: String,
    pub value: f64,
}

/// Response for a push: a dedup discard is a successful no-op, reported
/// through `accepted`, never an error status.
#[derive(Debug, Serialize, Deserialize)]
pub struct PushResponse {
    pub accepted: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

pub fn sample_to_data(sample: &Sample) -> SampleData {
    SampleData {
        id: sample.id,
        sensor_id: sample.sensor_id,
        datetime: sample.datetime.to_rfc3339(),
        value: sample.value,
    }
}

// ---------------------------------------------------------------------------
// Routing
// ---------------------------------------------------------------------------

/// Parsed request path. Kept separate from handling so routing is testable
/// without a live server.
#[derive(Debug, PartialEq)]
pub enum Route {
    Health,
    Current(i32),
    Samples(i32),
    Push(i32),
    NotFound,
}

pub fn route(method: &tiny_http::Method, path: &str) -> Route {
    let segments: Vec<&str> = path.trim_matches('/').split('/').collect();

    match (method, segments.as_slice()) {
        (&tiny_http::Method::Get, ["health"]) => Route::Health,
        (&tiny_http::Method::Get, ["sensor", id, "current"]) => {
            id.parse().map(Route::Current).unwrap_or(Route::NotFound)
        }
        (&tiny_http::Method::Get, ["sensor", id, "samples"]) => {
            id.parse().map(Route::Samples).unwrap_or(Route::NotFound)
        }
        (&tiny_http::Method::Post, ["sensor", id, "sample"]) => {
            id.parse().map(Route::Push).unwrap_or(Route::NotFound)
        }
        _ => Route::NotFound,
    }
}

/// Splits a request URL into path and query map.
pub fn split_query(url: &str) -> (&str, HashMap<String, String>) {
    match url.split_once('?') {
        None => (url, HashMap::new()),
        Some((path, query)) => {
            let params = query
                .split('&')
                .filter_map(|pair| pair.split_once('='))
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect();
            (path, params)
        }
    }
}

// ---------------------------------------------------------------------------
// HTTP Server
// ---------------------------------------------------------------------------

/// Everything the endpoint needs to serve requests.
pub struct EndpointContext<S: SampleStore, F: RemoteFetcher> {
    pub sensors: HashMap<i32, Sensor>,
    pub store: Arc<S>,
    pub gate: Arc<IngestGate<S>>,
    pub readings: Arc<ReadingService<S, F>>,
}

/// Start HTTP endpoint server on the specified port
pub fn start_endpoint_server<S: SampleStore, F: RemoteFetcher>(
    port: u16,
    ctx: Arc<EndpointContext<S, F>>,
) -> Result<(), String> {
    let server = tiny_http::Server::http(format!("0.0.0.0:{}", port))
        .map_err(|e| format!("Failed to start HTTP server: {}", e))?;

    info!("HTTP endpoint listening on http://0.0.0.0:{}", port);

    for mut request in server.incoming_requests() {
        let url = request.url().to_string();
        let (path, query) = split_query(&url);

        let response = match route(request.method(), path) {
            Route::Health => handle_health(),
            Route::Current(id) => handle_current(&ctx, id),
            Route::Samples(id) => handle_samples(&ctx, id, &query),
            Route::Push(id) => {
                let mut body = String::new();
                match request.as_reader().read_to_string(&mut body) {
                    Ok(_) => handle_push(&ctx, id, &body),
                    Err(e) => create_response(
                        400,
                        serde_json::json!({ "error": format!("Failed to read body: {}", e) }),
                    ),
                }
            }
            Route::NotFound => create_response(
                404,
                serde_json::json!({
                    "error": "Not found",
                    "available_endpoints": [
                        "/health",
                        "/sensor/{id}/current",
                        "/sensor/{id}/samples?start=..&end=..",
                        "POST /sensor/{id}/sample"
                    ]
                }),
            ),
        };

        if let Err(e) = request.respond(response) {
            error!("Failed to send response: {}", e);
        }
    }

    Ok(())
}

/// Handle /health endpoint
fn handle_health() -> tiny_http::Response<std::io::Cursor<Vec<u8>>> {
    create_response(
        200,
        serde_json::json!({
            "status": "ok",
            "service": "gagemon_service",
            "version": "0.1.0"
        }),
    )
}

/// Handle GET /sensor/{id}/current
fn handle_current<S: SampleStore, F: RemoteFetcher>(
    ctx: &EndpointContext<S, F>,
    sensor_id: i32,
) -> tiny_http::Response<std::io::Cursor<Vec<u8>>> {
    let sensor = match ctx.sensors.get(&sensor_id) {
        Some(sensor) => sensor,
        None => return sensor_not_found(sensor_id),
    };

    match ctx.readings.current_reading(sensor) {
        Ok(sample) => create_response(
            200,
            serde_json::to_value(CurrentReadingResponse {
                sensor_id: sensor.id,
                slug: sensor.slug.clone(),
                stype: sensor.stype.clone(),
                sample: sample.as_ref().map(sample_to_data),
            })
            .unwrap_or_else(|_| serde_json::json!({})),
        ),
        Err(e) => {
            error!("current reading for sensor {} failed: {}", sensor_id, e);
            create_response(500, serde_json::json!({ "error": e.to_string() }))
        }
    }
}

/// Handle GET /sensor/{id}/samples?start=..&end=..
fn handle_samples<S: SampleStore, F: RemoteFetcher>(
    ctx: &EndpointContext<S, F>,
    sensor_id: i32,
    query: &HashMap<String, String>,
) -> tiny_http::Response<std::io::Cursor<Vec<u8>>> {
    if !ctx.sensors.contains_key(&sensor_id) {
        return sensor_not_found(sensor_id);
    }

    let (start, end) = match (parse_query_time(query, "start"), parse_query_time(query, "end")) {
        (Ok(start), Ok(end)) => (start, end),
        (Err(e), _) | (_, Err(e)) => {
            return create_response(400, serde_json::json!({ "error": e.to_string() }));
        }
    };

    match ctx.store.range(sensor_id, start, end) {
        Ok(samples) => {
            let data: Vec<SampleData> = samples.iter().map(sample_to_data).collect();
            create_response(200, serde_json::json!({ "sensor_id": sensor_id, "samples": data }))
        }
        Err(e) => {
            error!("range query for sensor {} failed: {}", sensor_id, e);
            create_response(500, serde_json::json!({ "error": e.to_string() }))
        }
    }
}

/// Handle POST /sensor/{id}/sample
fn handle_push<S: SampleStore, F: RemoteFetcher>(
    ctx: &EndpointContext<S, F>,
    sensor_id: i32,
    body: &str,
) -> tiny_http::Response<std::io::Cursor<Vec<u8>>> {
    if !ctx.sensors.contains_key(&sensor_id) {
        return sensor_not_found(sensor_id);
    }

    let push: SamplePush = match serde_json::from_str(body) {
        Ok(push) => push,
        Err(e) => {
            return create_response(
                400,
                serde_json::json!({ "error": format!("Invalid sample payload: {}", e) }),
            );
        }
    };

    let datetime = match DateTime::parse_from_rfc3339(&push.datetime) {
        Ok(dt) => dt.with_timezone(&Utc),
        Err(_) => {
            let e = ValidationError::InvalidTimestamp(push.datetime.clone());
            return create_response(400, serde_json::json!({ "error": e.to_string() }));
        }
    };

    match ctx.gate.ingest(sensor_id, datetime, push.value) {
        Ok(IngestOutcome::Accepted(_)) => create_response(
            200,
            serde_json::to_value(PushResponse {
                accepted: true,
                reason: None,
            })
            .unwrap_or_else(|_| serde_json::json!({})),
        ),
        Ok(IngestOutcome::Discarded(reason)) => {
            let reason = match reason {
                DiscardReason::NotNewer { .. } => "not newer than stored latest",
                DiscardReason::WithinDedupWindow { .. } => "within dedup window of stored latest",
            };
            create_response(
                200,
                serde_json::to_value(PushResponse {
                    accepted: false,
                    reason: Some(reason.to_string()),
                })
                .unwrap_or_else(|_| serde_json::json!({})),
            )
        }
        Err(crate::model::IngestError::Validation(e)) => {
            create_response(400, serde_json::json!({ "error": e.to_string() }))
        }
        Err(crate::model::IngestError::Storage(e)) => {
            error!("push for sensor {} failed: {}", sensor_id, e);
            create_response(500, serde_json::json!({ "error": e.to_string() }))
        }
    }
}

fn parse_query_time(
    query: &HashMap<String, String>,
    key: &str,
) -> Result<DateTime<Utc>, ValidationError> {
    let raw = query
        .get(key)
        .ok_or_else(|| ValidationError::InvalidTimestamp(format!("missing '{}'", key)))?;
    let decoded = urlencoding::decode(raw)
        .map_err(|_| ValidationError::InvalidTimestamp(raw.clone()))?;
    DateTime::parse_from_rfc3339(&decoded)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|_| ValidationError::InvalidTimestamp(decoded.into_owned()))
}

fn sensor_not_found(sensor_id: i32) -> tiny_http::Response<std::io::Cursor<Vec<u8>>> {
    create_response(
        404,
        serde_json::json!({
            "error": ValidationError::UnknownSensor(sensor_id).to_string(),
            "sensor_id": sensor_id
        }),
    )
}

/// Create HTTP response with JSON body
fn create_response(
    status_code: u16,
    json: serde_json::Value,
) -> tiny_http::Response<std::io::Cursor<Vec<u8>>> {
    let body = serde_json::to_string_pretty(&json).unwrap_or_else(|_| "{}".to_string());
    let bytes = body.into_bytes();

    tiny_http::Response::from_data(bytes)
        .with_status_code(tiny_http::StatusCode::from(status_code))
        .with_header(
            tiny_http::Header::from_bytes(&b"Content-Type"[..], &b"application/json"[..])
                .expect("static header is valid"),
        )
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_route_health_and_sensor_paths() {
        assert_eq!(route(&tiny_http::Method::Get, "/health"), Route::Health);
        assert_eq!(route(&tiny_http::Method::Get, "/sensor/3/current"), Route::Current(3));
        assert_eq!(route(&tiny_http::Method::Get, "/sensor/3/samples"), Route::Samples(3));
        assert_eq!(route(&tiny_http::Method::Post, "/sensor/3/sample"), Route::Push(3));
    }

    #[test]
    fn test_route_rejects_bad_ids_and_unknown_paths() {
        assert_eq!(route(&tiny_http::Method::Get, "/sensor/abc/current"), Route::NotFound);
        assert_eq!(route(&tiny_http::Method::Get, "/gage/3"), Route::NotFound);
        assert_eq!(
            route(&tiny_http::Method::Post, "/sensor/3/current"),
            Route::NotFound,
            "current is read-only"
        );
    }

    #[test]
    fn test_split_query_separates_path_and_params() {
        let (path, params) = split_query("/sensor/3/samples?start=a&end=b");
        assert_eq!(path, "/sensor/3/samples");
        assert_eq!(params.get("start").map(String::as_str), Some("a"));
        assert_eq!(params.get("end").map(String::as_str), Some("b"));

        let (path, params) = split_query("/health");
        assert_eq!(path, "/health");
        assert!(params.is_empty());
    }

    #[test]
    fn test_parse_query_time_accepts_rfc3339_and_encoded_colons() {
        let mut query = HashMap::new();
        query.insert("start".to_string(), "2024-05-01T12%3A00%3A00Z".to_string());
        let parsed = parse_query_time(&query, "start").expect("encoded timestamp should parse");
        assert_eq!(parsed, Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap());
    }

    #[test]
    fn test_parse_query_time_rejects_missing_and_garbage() {
        let query = HashMap::new();
        assert!(parse_query_time(&query, "start").is_err());

        let mut query = HashMap::new();
        query.insert("start".to_string(), "yesterday".to_string());
        assert!(parse_query_time(&query, "start").is_err());
    }

    #[test]
    fn test_sample_to_data_round_trips_datetime_as_rfc3339() {
        let sample = Sample {
            id: 7,
            sensor_id: 3,
            datetime: Utc.with_ymd_and_hms(2024, 5, 1, 17, 0, 0).unwrap(),
            value: 3.2,
        };
        let data = sample_to_data(&sample);
        assert_eq!(data.id, 7);
        assert_eq!(data.datetime, "2024-05-01T17:00:00+00:00");
        let parsed = DateTime::parse_from_rfc3339(&data.datetime).expect("should parse back");
        assert_eq!(parsed.with_timezone(&Utc), sample.datetime);
    }

    #[test]
    fn test_push_payload_requires_numeric_value() {
        let ok: Result<SamplePush, _> =
            serde_json::from_str(r#"{"datetime": "2024-05-01T12:00:00Z", "value": 3.4}"#);
        assert!(ok.is_ok());

        let bad: Result<SamplePush, _> =
            serde_json::from_str(r#"{"datetime": "2024-05-01T12:00:00Z", "value": "3.4"}"#);
        assert!(bad.is_err(), "string values are malformed input");

        let missing: Result<SamplePush, _> = serde_json::from_str(r#"{"value": 3.4}"#);
        assert!(missing.is_err(), "timestamp is required");
    }
}
