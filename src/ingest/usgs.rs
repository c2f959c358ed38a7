/// USGS NWIS Instantaneous Values (IV) API client.
///
/// Handles URL construction and JSON response parsing for the USGS Water
/// Services IV endpoint:
///   https://waterservices.usgs.gov/nwis/iv/
///
/// The IV service returns WaterML rendered as JSON. See `fixtures.rs` for
/// annotated examples of the response structure.

use chrono::{DateTime, Utc};
use log::warn;
use serde::Deserialize;
use std::time::Duration;

use crate::ingest::{FetchWindow, RemoteFetcher, RemotePoint};
use crate::model::{RemoteFetchError, PARAM_STAGE};

// ---------------------------------------------------------------------------
// Serde structures for WaterML JSON deserialization
// ---------------------------------------------------------------------------

#[derive(Deserialize)]
struct IvResponse {
    value: ValueWrapper,
}

#[derive(Deserialize)]
struct ValueWrapper {
    #[serde(rename = "timeSeries")]
    time_series: Vec<TimeSeries>,
}

#[derive(Deserialize)]
struct TimeSeries {
    variable: Variable,
    values: Vec<Values>,
}

#[derive(Deserialize)]
struct Variable {
    #[serde(rename = "noDataValue")]
    no_data_value: f64,
}

#[derive(Deserialize)]
struct Values {
    value: Vec<ValueEntry>,
}

#[derive(Deserialize)]
struct ValueEntry {
    value: String, // USGS returns as string!
    #[serde(rename = "dateTime")]
    date_time: String,
}

// ---------------------------------------------------------------------------
// URL construction
// ---------------------------------------------------------------------------

const IV_BASE_URL: &str = "https://waterservices.usgs.gov/nwis/iv/";

/// Builds a USGS IV API URL for the given site, parameter code, and window.
///
/// A `parameter` of `None` selects gage height (`00065`), the service
/// default. `FetchWindow::Default` applies `default_period`; explicit
/// windows are serialized as `startDT`/`endDT` in the minute-resolution
/// `%Y-%m-%dT%H:%MZ` shape the IV service accepts, URL-encoded.
///
/// The returned URL always requests JSON format and filters to active
/// sites only.
pub fn build_iv_url(
    site: &str,
    parameter: Option<&str>,
    window: &FetchWindow,
    default_period: &str,
) -> String {
    let parameter = parameter.unwrap_or(PARAM_STAGE);

    let window_param = match window {
        FetchWindow::Default => format!("period={}", default_period),
        FetchWindow::Period(period) => format!("period={}", period),
        FetchWindow::Range { start, end } => format!(
            "startDT={}&endDT={}",
            urlencoding::encode(&start.format("%Y-%m-%dT%H:%MZ").to_string()),
            urlencoding::encode(&end.format("%Y-%m-%dT%H:%MZ").to_string()),
        ),
    };

    format!(
        "{}?sites={}&parameterCd={}&{}&format=json&siteStatus=active",
        IV_BASE_URL, site, parameter, window_param
    )
}

// ---------------------------------------------------------------------------
// Response parsing
// ---------------------------------------------------------------------------

/// Parses a USGS IV API JSON response body into a chronologically ascending
/// list of `RemotePoint`s, covering ALL values of all `timeSeries` entries.
///
/// Timestamps arrive with a UTC offset (e.g. `-05:00` for Central time) and
/// are converted to UTC here; the offset is discarded once converted.
/// Entries whose value cannot be parsed, or that carry the USGS sentinel
/// (`-999999`), are skipped with a warning rather than failing the batch.
///
/// # Errors
/// - `RemoteFetchError::Parse` — malformed or unexpected JSON structure.
/// - `RemoteFetchError::NoData` — no `timeSeries` entries, or every entry
///   was empty or sentinel-valued.
pub fn parse_iv_response(json: &str) -> Result<Vec<RemotePoint>, RemoteFetchError> {
    let response: IvResponse = serde_json::from_str(json)
        .map_err(|e| RemoteFetchError::Parse(format!("JSON deserialization failed: {}", e)))?;

    if response.value.time_series.is_empty() {
        return Err(RemoteFetchError::NoData(
            "No timeSeries entries in response".to_string(),
        ));
    }

    let mut points = Vec::new();

    for series in response.value.time_series {
        let no_data_value = series.variable.no_data_value;

        let values_wrapper = series
            .values
            .first()
            .ok_or_else(|| RemoteFetchError::Parse("Missing values array".to_string()))?;

        for entry in &values_wrapper.value {
            let value: f64 = match entry.value.parse() {
                Ok(v) => v,
                Err(e) => {
                    warn!("Skipping unparseable value '{}': {}", entry.value, e);
                    continue;
                }
            };

            // USGS reports missing data as the sentinel, not by omission.
            if (value - no_data_value).abs() < 0.1 {
                continue;
            }

            let datetime = match DateTime::parse_from_rfc3339(&entry.date_time) {
                Ok(dt) => dt.with_timezone(&Utc),
                Err(e) => {
                    warn!("Skipping unparseable dateTime '{}': {}", entry.date_time, e);
                    continue;
                }
            };

            points.push(RemotePoint { datetime, value });
        }
    }

    if points.is_empty() {
        return Err(RemoteFetchError::NoData(
            "All timeSeries entries were empty or contained sentinel values".to_string(),
        ));
    }

    points.sort_by_key(|p| p.datetime);
    Ok(points)
}

// ---------------------------------------------------------------------------
// Fetcher
// ---------------------------------------------------------------------------

/// `RemoteFetcher` implementation against the live IV service.
///
/// Carries its own HTTP client so the request timeout is bound once, at
/// construction — an unbounded hang on USGS must not be possible.
pub struct UsgsFetcher {
    client: reqwest::blocking::Client,
    default_period: String,
}

impl UsgsFetcher {
    pub fn new(timeout: Duration, default_period: &str) -> Result<Self, RemoteFetchError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| RemoteFetchError::Transport(e.to_string()))?;

        Ok(Self {
            client,
            default_period: default_period.to_string(),
        })
    }
}

impl RemoteFetcher for UsgsFetcher {
    fn fetch(
        &self,
        remote_id: &str,
        parameter: Option<&str>,
        window: &FetchWindow,
    ) -> Result<Vec<RemotePoint>, RemoteFetchError> {
        let url = build_iv_url(remote_id, parameter, window, &self.default_period);

        let response = self
            .client
            .get(&url)
            .header("Accept", "application/json")
            .send()
            .map_err(|e| RemoteFetchError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(RemoteFetchError::HttpStatus(status.as_u16()));
        }

        let body = response
            .text()
            .map_err(|e| RemoteFetchError::Transport(e.to_string()))?;

        parse_iv_response(&body)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
