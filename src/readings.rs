/// Freshness policy: decides, per request, whether the stored latest
/// sample is fresh enough to serve or whether a USGS pull must happen
/// first.
///
/// The decision table, evaluated on every current-reading request:
///
/// | Condition                                   | Action                            |
/// |---------------------------------------------|-----------------------------------|
/// | sensor is local                             | serve stored latest, never fetch  |
/// | remote, no stored sample                    | fetch default lookback, re-read   |
/// | remote, latest older than threshold         | fetch [latest, now], re-read      |
/// | remote, latest within threshold             | serve stored latest               |
///
/// Staleness is strictly greater-than the threshold: a sample exactly at
/// the threshold age is still fresh.
///
/// A failed fetch falls back to whatever the store currently holds —
/// availability is prioritized over freshness — and only storage failures
/// propagate.
///
/// # Clock injection
/// `current_reading_at` accepts `now` so the policy is deterministic in
/// tests; `current_reading` is the wall-clock wrapper.

use chrono::{DateTime, Duration, Utc};
use log::{info, warn};
use std::sync::Arc;

use crate::gate::IngestGate;
use crate::ingest::{FetchWindow, RemoteFetcher};
use crate::model::{Sample, Sensor, StorageError};
use crate::store::SampleStore;

pub struct ReadingService<S: SampleStore, F: RemoteFetcher> {
    store: Arc<S>,
    fetcher: F,
    gate: Arc<IngestGate<S>>,
    freshness_threshold: Duration,
}

impl<S: SampleStore, F: RemoteFetcher> ReadingService<S, F> {
    pub fn new(
        store: Arc<S>,
        fetcher: F,
        gate: Arc<IngestGate<S>>,
        freshness_threshold: Duration,
    ) -> Self {
        Self {
            store,
            fetcher,
            gate,
            freshness_threshold,
        }
    }

    /// The current-reading interface consumed by the listing/plotting/API
    /// layers. `None` means no data is available for the sensor at all.
    pub fn current_reading(&self, sensor: &Sensor) -> Result<Option<Sample>, StorageError> {
        self.current_reading_at(sensor, Utc::now())
    }

    pub fn current_reading_at(
        &self,
        sensor: &Sensor,
        now: DateTime<Utc>,
    ) -> Result<Option<Sample>, StorageError> {
        let latest = self.store.latest(sensor.id)?;

        // Local sensors are always authoritative; their staleness is the
        // station's problem, not ours to paper over with a remote pull.
        if sensor.local {
            return Ok(latest);
        }

        let window = match &latest {
            None => FetchWindow::Default,
            Some(sample) => {
                let age = now - sample.datetime;
                if age <= self.freshness_threshold {
                    return Ok(latest);
                }
                info!(
                    "sensor {}: latest sample {} is {}min old (threshold {}min), pulling",
                    sensor.id,
                    sample.datetime,
                    age.num_minutes(),
                    self.freshness_threshold.num_minutes()
                );
                FetchWindow::Range {
                    start: sample.datetime,
                    end: now,
                }
            }
        };

        self.pull_through_gate(sensor, &window);

        // Re-read rather than trust the fetch result: the gate may have
        // discarded entries, and the store is the single source of truth
        // for what the latest accepted sample is.
        self.store.latest(sensor.id)
    }

    /// Pulls a window from the remote service and feeds every point
    /// through the ingestion gate. Best-effort: fetch failures are logged
    /// and swallowed (the caller falls back to stored data), and points
    /// already ingested before a failure stay — no rollback.
    fn pull_through_gate(&self, sensor: &Sensor, window: &FetchWindow) {
        let remote_id = match sensor.remote_id.as_deref() {
            Some(id) => id,
            None => {
                warn!(
                    "sensor {}: marked remote but has no remote_id, skipping fetch",
                    sensor.id
                );
                return;
            }
        };

        match self
            .fetcher
            .fetch(remote_id, sensor.remote_parameter.as_deref(), window)
        {
            Ok(points) => {
                let total = points.len();
                let mut accepted = 0usize;
                for point in points {
                    match self.gate.ingest(sensor.id, point.datetime, point.value) {
                        Ok(outcome) if outcome.is_accepted() => accepted += 1,
                        Ok(_) => {}
                        Err(e) => {
                            warn!(
                                "sensor {}: failed to ingest fetched point at {}: {}",
                                sensor.id, point.datetime, e
                            );
                        }
                    }
                }
                info!(
                    "sensor {}: remote fetch for site {} accepted {}/{} points",
                    sensor.id, remote_id, accepted, total
                );
            }
            Err(e) => {
                warn!(
                    "sensor {}: remote fetch for site {} failed, serving stored data: {}",
                    sensor.id, remote_id, e
                );
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
