/// Sample storage: the one shared mutable resource in the service.
///
/// The store is deliberately dumb — it appends and queries, nothing else.
/// Duplicate suppression is owned by the ingestion gate, so `insert`
/// succeeds unconditionally for valid inputs and never overwrites.
///
/// Two implementations:
/// - `PgSampleStore` — the production store, one append-only
///   `gage.samples` table (see sql/001_initial_schema.sql).
/// - `MemorySampleStore` — for tests and for running without a database.

use chrono::{DateTime, Utc};
use postgres::Client;
use std::collections::HashMap;
use std::sync::Mutex;

use crate::model::{Sample, StorageError};

// ---------------------------------------------------------------------------
// Store interface
// ---------------------------------------------------------------------------

/// Durable, queryable collection of samples, indexed by sensor and ordered
/// by measurement time.
pub trait SampleStore: Send + Sync {
    /// Returns the sample with the maximum `datetime` for the sensor, or
    /// `None` if no samples exist. Called on every freshness check.
    fn latest(&self, sensor_id: i32) -> Result<Option<Sample>, StorageError>;

    /// Appends a new immutable sample and returns it with its assigned id.
    fn insert(
        &self,
        sensor_id: i32,
        datetime: DateTime<Utc>,
        value: f64,
    ) -> Result<Sample, StorageError>;

    /// Inclusive time range, ascending by `datetime`. Consumed by the
    /// plotting/export layers.
    fn range(
        &self,
        sensor_id: i32,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<Sample>, StorageError>;
}

// ---------------------------------------------------------------------------
// PostgreSQL store
// ---------------------------------------------------------------------------

/// Store backed by the `gage.samples` table.
///
/// The blocking `postgres` client is not `Sync`, so it sits behind a mutex;
/// writes are serialized here and reads are short indexed queries.
pub struct PgSampleStore {
    client: Mutex<Client>,
}

impl PgSampleStore {
    pub fn new(client: Client) -> Self {
        Self {
            client: Mutex::new(client),
        }
    }
}

impl SampleStore for PgSampleStore {
    fn latest(&self, sensor_id: i32) -> Result<Option<Sample>, StorageError> {
        let mut client = self.client.lock().unwrap();
        let rows = client.query(
            "SELECT id, sensor_id, reading_time, value
             FROM gage.samples
             WHERE sensor_id = $1
             ORDER BY reading_time DESC
             LIMIT 1",
            &[&sensor_id],
        )?;

        Ok(rows.first().map(|row| Sample {
            id: row.get(0),
            sensor_id: row.get(1),
            datetime: row.get(2),
            value: row.get(3),
        }))
    }

    fn insert(
        &self,
        sensor_id: i32,
        datetime: DateTime<Utc>,
        value: f64,
    ) -> Result<Sample, StorageError> {
        let mut client = self.client.lock().unwrap();
        let row = client.query_one(
            "INSERT INTO gage.samples (sensor_id, reading_time, value)
             VALUES ($1, $2, $3)
             RETURNING id",
            &[&sensor_id, &datetime, &value],
        )?;

        Ok(Sample {
            id: row.get(0),
            sensor_id,
            datetime,
            value,
        })
    }

    fn range(
        &self,
        sensor_id: i32,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<Sample>, StorageError> {
        let mut client = self.client.lock().unwrap();
        let rows = client.query(
            "SELECT id, sensor_id, reading_time, value
             FROM gage.samples
             WHERE sensor_id = $1
               AND reading_time BETWEEN $2 AND $3
             ORDER BY reading_time ASC",
            &[&sensor_id, &start, &end],
        )?;

        Ok(rows
            .iter()
            .map(|row| Sample {
                id: row.get(0),
                sensor_id: row.get(1),
                datetime: row.get(2),
                value: row.get(3),
            })
            .collect())
    }
}

// ---------------------------------------------------------------------------
// In-memory store
// ---------------------------------------------------------------------------

/// Store keeping samples in a per-sensor vector, ordered by insertion-time
/// sort. Useful in tests and when developing without a live database.
pub struct MemorySampleStore {
    samples: Mutex<HashMap<i32, Vec<Sample>>>,
    next_id: Mutex<i64>,
}

impl MemorySampleStore {
    pub fn new() -> Self {
        Self {
            samples: Mutex::new(HashMap::new()),
            next_id: Mutex::new(1),
        }
    }

    /// Total sample count across all sensors. Test convenience.
    pub fn len(&self) -> usize {
        self.samples.lock().unwrap().values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for MemorySampleStore {
    fn default() -> Self {
        Self::new()
    }
}

impl SampleStore for MemorySampleStore {
    fn latest(&self, sensor_id: i32) -> Result<Option<Sample>, StorageError> {
        let samples = self.samples.lock().unwrap();
        Ok(samples
            .get(&sensor_id)
            .and_then(|v| v.iter().max_by_key(|s| s.datetime))
            .cloned())
    }

    fn insert(
        &self,
        sensor_id: i32,
        datetime: DateTime<Utc>,
        value: f64,
    ) -> Result<Sample, StorageError> {
        let mut next_id = self.next_id.lock().unwrap();
        let sample = Sample {
            id: *next_id,
            sensor_id,
            datetime,
            value,
        };
        *next_id += 1;

        let mut samples = self.samples.lock().unwrap();
        samples.entry(sensor_id).or_default().push(sample.clone());
        Ok(sample)
    }

    fn range(
        &self,
        sensor_id: i32,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<Sample>, StorageError> {
        let samples = self.samples.lock().unwrap();
        let mut result: Vec<Sample> = samples
            .get(&sensor_id)
            .map(|v| {
                v.iter()
                    .filter(|s| s.datetime >= start && s.datetime <= end)
                    .cloned()
                    .collect()
            })
            .unwrap_or_default();
        result.sort_by_key(|s| s.datetime);
        Ok(result)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn t(minute: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 1, 12, minute, 0).unwrap()
    }

    #[test]
    fn test_latest_of_empty_store_is_none() {
        let store = MemorySampleStore::new();
        let latest = store.latest(1).expect("memory store should not fail");
        assert!(latest.is_none());
    }

    #[test]
    fn test_latest_returns_maximum_datetime_regardless_of_insert_order() {
        let store = MemorySampleStore::new();
        store.insert(1, t(30), 3.4).expect("insert");
        store.insert(1, t(0), 3.2).expect("insert");
        store.insert(1, t(15), 3.3).expect("insert");

        let latest = store.latest(1).expect("query").expect("should have a sample");
        assert_eq!(latest.datetime, t(30));
        assert_eq!(latest.value, 3.4);
    }

    #[test]
    fn test_latest_is_scoped_to_the_sensor() {
        let store = MemorySampleStore::new();
        store.insert(1, t(0), 1.0).expect("insert");
        store.insert(2, t(30), 2.0).expect("insert");

        let latest = store.latest(1).expect("query").expect("sensor 1 has a sample");
        assert_eq!(latest.sensor_id, 1);
        assert_eq!(latest.value, 1.0);
    }

    #[test]
    fn test_insert_assigns_increasing_ids() {
        let store = MemorySampleStore::new();
        let a = store.insert(1, t(0), 1.0).expect("insert");
        let b = store.insert(1, t(15), 2.0).expect("insert");
        assert!(b.id > a.id);
    }

    #[test]
    fn test_range_is_ascending_and_inclusive() {
        let store = MemorySampleStore::new();
        store.insert(1, t(45), 4.0).expect("insert");
        store.insert(1, t(0), 1.0).expect("insert");
        store.insert(1, t(30), 3.0).expect("insert");
        store.insert(1, t(15), 2.0).expect("insert");

        let range = store.range(1, t(0), t(30)).expect("query");
        let times: Vec<_> = range.iter().map(|s| s.datetime).collect();
        assert_eq!(
            times,
            vec![t(0), t(15), t(30)],
            "range must be inclusive on both ends and ascending"
        );
    }

    #[test]
    fn test_range_of_unknown_sensor_is_empty() {
        let store = MemorySampleStore::new();
        let range = store.range(99, t(0), t(45)).expect("query");
        assert!(range.is_empty());
    }
}
