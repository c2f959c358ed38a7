/// Polling daemon for remote sensors
///
/// The request path already pulls stale series on demand; the daemon
/// exists so remote sensors stay warm even when nobody is asking. Every
/// poll interval it evaluates the freshness policy for each remote
/// sensor, which backfills empty series (default lookback) and tops up
/// stale ones ([latest, now]) through the ingestion gate.
///
/// Sensors are polled on a thread pool — one slow USGS response must not
/// hold up the rest — and a failure for one sensor never stops the loop.

use log::{error, info};
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::mpsc;
use threadpool::ThreadPool;

use crate::config::ServiceConfig;
use crate::ingest::RemoteFetcher;
use crate::model::Sensor;
use crate::readings::ReadingService;
use crate::store::SampleStore;

/// Upper bound on concurrent USGS requests.
const MAX_POLL_WORKERS: usize = 4;

pub struct Daemon<S: SampleStore + 'static, F: RemoteFetcher + 'static> {
    config: ServiceConfig,
    sensors: Vec<Sensor>,
    readings: Arc<ReadingService<S, F>>,
}

impl<S: SampleStore + 'static, F: RemoteFetcher + 'static> Daemon<S, F> {
    pub fn new(
        config: ServiceConfig,
        sensors: Vec<Sensor>,
        readings: Arc<ReadingService<S, F>>,
    ) -> Self {
        Self {
            config,
            sensors,
            readings,
        }
    }

    /// Remote sensors in the registry; local sensors push and are never
    /// polled.
    fn remote_sensors(&self) -> Vec<Sensor> {
        self.sensors.iter().filter(|s| !s.local).cloned().collect()
    }

    /// Run one freshness pass over all remote sensors in parallel.
    ///
    /// Returns, per sensor id, whether the pass completed without a
    /// storage failure. Fetch failures are already recovered inside the
    /// freshness policy and count as success here.
    pub fn poll_remote_sensors(&self) -> HashMap<i32, bool> {
        let sensors = self.remote_sensors();
        if sensors.is_empty() {
            return HashMap::new();
        }

        let pool = ThreadPool::new(MAX_POLL_WORKERS.min(sensors.len()));
        let (tx, rx) = mpsc::channel();

        for sensor in sensors {
            let tx = tx.clone();
            let readings = self.readings.clone();
            pool.execute(move || {
                let outcome = match readings.current_reading(&sensor) {
                    Ok(Some(sample)) => {
                        info!(
                            "poll sensor {} ({}): latest {} value {}",
                            sensor.id, sensor.slug, sample.datetime, sample.value
                        );
                        true
                    }
                    Ok(None) => {
                        info!("poll sensor {} ({}): no data available", sensor.id, sensor.slug);
                        true
                    }
                    Err(e) => {
                        error!("poll sensor {} ({}) failed: {}", sensor.id, sensor.slug, e);
                        false
                    }
                };
                // Receiver hangup only happens if the caller gave up.
                let _ = tx.send((sensor.id, outcome));
            });
        }
        drop(tx);

        rx.iter().collect()
    }

    /// Main daemon loop (runs indefinitely)
    pub fn run(&self) {
        info!(
            "Starting daemon loop: poll interval {} minutes, {} remote of {} sensors",
            self.config.poll_interval_minutes,
            self.remote_sensors().len(),
            self.sensors.len()
        );

        loop {
            let start = std::time::Instant::now();

            let results = self.poll_remote_sensors();
            let failures = results.values().filter(|ok| !**ok).count();
            if failures > 0 {
                error!(
                    "Poll complete: {} of {} sensors failed",
                    failures,
                    results.len()
                );
            } else {
                info!("Poll complete: {} sensors", results.len());
            }

            // Sleep until next poll interval
            let interval = std::time::Duration::from_secs(self.config.poll_interval_minutes * 60);
            if let Some(remaining) = interval.checked_sub(start.elapsed()) {
                std::thread::sleep(remaining);
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
