/// Ingestion/dedup gate: the single choke point through which every new
/// (sensor, datetime, value) triple must pass before becoming a durable
/// sample — whether pushed by a local station or pulled from USGS.
///
/// The gate compares the incoming timestamp against the sensor's stored
/// latest sample. A triple is accepted only when it is more than the dedup
/// window *newer* than the latest, which makes re-ingesting an overlapping
/// remote window a no-op and keeps per-sensor timestamps strictly
/// increasing. The sample's value plays no part in the decision — only
/// timing does.
///
/// Every acceptance and every discard is logged with both timestamps, both
/// values, and the branch that fired. Silent data loss from over-aggressive
/// dedup is the main operational risk of this component, so the log is an
/// observability contract, not a debugging aid.
///
/// # Concurrency
/// Steps read-latest/decide/insert run inside a per-sensor critical
/// section. Two concurrent ingests for the same sensor would otherwise
/// both evaluate against a stale "latest" read and both be accepted.

use chrono::{DateTime, Duration, SubsecRound, Utc};
use log::{debug, info};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use crate::model::{IngestError, Sample, ValidationError};
use crate::store::SampleStore;

// ---------------------------------------------------------------------------
// Outcome types
// ---------------------------------------------------------------------------

/// Result of a successful `ingest` call. A discard is a successful no-op,
/// not an error — see `IngestError` for the actual failure modes.
#[derive(Debug, Clone, PartialEq)]
pub enum IngestOutcome {
    Accepted(Sample),
    Discarded(DiscardReason),
}

impl IngestOutcome {
    pub fn is_accepted(&self) -> bool {
        matches!(self, IngestOutcome::Accepted(_))
    }
}

/// Why the gate refused to store an incoming triple.
#[derive(Debug, Clone, PartialEq)]
pub enum DiscardReason {
    /// Incoming timestamp is equal to or older than the stored latest
    /// (identical timestamps keep the first value accepted).
    NotNewer {
        incoming: DateTime<Utc>,
        latest: DateTime<Utc>,
    },
    /// Incoming timestamp leads the stored latest by no more than the
    /// dedup window.
    WithinDedupWindow {
        incoming: DateTime<Utc>,
        latest: DateTime<Utc>,
    },
}

// ---------------------------------------------------------------------------
// Gate
// ---------------------------------------------------------------------------

pub struct IngestGate<S: SampleStore> {
    store: Arc<S>,
    dedup_window: Duration,
    sensor_locks: Mutex<HashMap<i32, Arc<Mutex<()>>>>,
}

impl<S: SampleStore> IngestGate<S> {
    pub fn new(store: Arc<S>, dedup_window: Duration) -> Self {
        Self {
            store,
            dedup_window,
            sensor_locks: Mutex::new(HashMap::new()),
        }
    }

    /// Runs the dedup decision for one incoming triple and inserts it if
    /// accepted.
    ///
    /// # Errors
    /// - `IngestError::Validation` — non-finite value; the gate logic
    ///   never runs.
    /// - `IngestError::Storage` — the store failed to read or write.
    pub fn ingest(
        &self,
        sensor_id: i32,
        datetime: DateTime<Utc>,
        value: f64,
    ) -> Result<IngestOutcome, IngestError> {
        if !value.is_finite() {
            return Err(ValidationError::NonFiniteValue(value.to_string()).into());
        }

        let lock = self.sensor_lock(sensor_id);
        let _guard = lock.lock().unwrap();

        let latest = self.store.latest(sensor_id)?;

        let latest = match latest {
            None => {
                let sample = self.store.insert(sensor_id, datetime, value)?;
                debug!(
                    "sensor {}: accepted {} (value {}) — first sample",
                    sensor_id, datetime, value
                );
                return Ok(IngestOutcome::Accepted(sample));
            }
            Some(latest) => latest,
        };

        // Sub-second precision is a transport artifact (USGS emits ".000"
        // millis); comparisons happen at whole-second resolution.
        let incoming_ts = datetime.trunc_subsecs(0);
        let latest_ts = latest.datetime.trunc_subsecs(0);
        let lead = incoming_ts - latest_ts;

        if lead <= Duration::zero() {
            info!(
                "sensor {}: discarded {} (value {}) — not newer than stored latest {} (value {}, lead {}s)",
                sensor_id,
                datetime,
                value,
                latest.datetime,
                latest.value,
                lead.num_seconds()
            );
            return Ok(IngestOutcome::Discarded(DiscardReason::NotNewer {
                incoming: datetime,
                latest: latest.datetime,
            }));
        }

        if lead <= self.dedup_window {
            info!(
                "sensor {}: discarded {} (value {}) — within {}min dedup window of latest {} (value {}, lead {}s)",
                sensor_id,
                datetime,
                value,
                self.dedup_window.num_minutes(),
                latest.datetime,
                latest.value,
                lead.num_seconds()
            );
            return Ok(IngestOutcome::Discarded(DiscardReason::WithinDedupWindow {
                incoming: datetime,
                latest: latest.datetime,
            }));
        }

        let sample = self.store.insert(sensor_id, datetime, value)?;
        debug!(
            "sensor {}: accepted {} (value {}) — {}s past latest {} (value {})",
            sensor_id,
            datetime,
            value,
            lead.num_seconds(),
            latest.datetime,
            latest.value
        );
        Ok(IngestOutcome::Accepted(sample))
    }

    fn sensor_lock(&self, sensor_id: i32) -> Arc<Mutex<()>> {
        let mut locks = self.sensor_locks.lock().unwrap();
        locks
            .entry(sensor_id)
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
