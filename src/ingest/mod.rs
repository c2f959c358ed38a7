/// Remote data source adapters.
///
/// Each external source gets its own file under ingest/ (currently only
/// USGS). The shared seam is the `RemoteFetcher` trait: an adapter turns a
/// (site id, parameter, time window) request into plain (datetime, value)
/// points and nothing else — all writes go through the ingestion gate,
/// which the caller owns.

use chrono::{DateTime, Utc};

use crate::model::RemoteFetchError;

pub mod usgs;

#[cfg(test)]
pub(crate) mod fixtures;

/// One parsed remote reading, already normalized to UTC.
#[derive(Debug, Clone, PartialEq)]
pub struct RemotePoint {
    pub datetime: DateTime<Utc>,
    pub value: f64,
}

/// The time span of a fetch. Exactly one shape per call.
#[derive(Debug, Clone, PartialEq)]
pub enum FetchWindow {
    /// Apply the adapter's configured lookback period.
    Default,
    /// Relative ISO 8601 period, e.g. "P7D".
    Period(String),
    /// Explicit inclusive window.
    Range {
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    },
}

/// Pulls a time-series window from an external hydrological data service.
pub trait RemoteFetcher: Send + Sync {
    /// Fetches readings for `remote_id` over `window`. `parameter` of
    /// `None` selects the service's default parameter code.
    fn fetch(
        &self,
        remote_id: &str,
        parameter: Option<&str>,
        window: &FetchWindow,
    ) -> Result<Vec<RemotePoint>, RemoteFetchError>;
}

impl<T: RemoteFetcher + ?Sized> RemoteFetcher for &T {
    fn fetch(
        &self,
        remote_id: &str,
        parameter: Option<&str>,
        window: &FetchWindow,
    ) -> Result<Vec<RemotePoint>, RemoteFetchError> {
        (**self).fetch(remote_id, parameter, window)
    }
}

impl<T: RemoteFetcher + ?Sized> RemoteFetcher for std::sync::Arc<T> {
    fn fetch(
        &self,
        remote_id: &str,
        parameter: Option<&str>,
        window: &FetchWindow,
    ) -> Result<Vec<RemotePoint>, RemoteFetchError> {
        (**self).fetch(remote_id, parameter, window)
    }
}
