//! StoreUploader against the in-process store.
//!
//! Periods and backoff run in milliseconds via `with_time_unit`, so each
//! test finishes in well under a second.

use std::sync::Arc;
use std::time::Duration;

use chrono::{Local, TimeZone};

use plantsitter::adapters::clock::FixedClock;
use plantsitter::adapters::memory_store::MemoryStore;
use plantsitter::adapters::shared::Guarded;
use plantsitter::adapters::sim::SimulatedSensor;
use plantsitter::app::ports::QuotaType;
use plantsitter::app::stop::StopSignal;
use plantsitter::config::StoreConfig;
use plantsitter::domain::Domain;
use plantsitter::telemetry::store::{StoreUploader, UploadStats};

const BUCKET: &str = "temperature-data";
const TS: i64 = 1_700_000_000;

fn config() -> StoreConfig {
    StoreConfig {
        enabled: true,
        period_secs: 5,
        max_backoff_secs: 8,
        ..StoreConfig::default()
    }
}

/// Run an uploader for `run_for`, stop it, and return its stats.
fn run_uploader(store: MemoryStore, cfg: StoreConfig, run_for: Duration) -> UploadStats {
    let (sensor, _knobs) = SimulatedSensor::new(22.0, 40.0);
    let stop = Arc::new(StopSignal::new());
    let uploader = StoreUploader::new(
        store,
        Guarded::new("sensor", sensor),
        FixedClock(Local.timestamp_opt(TS, 0).unwrap()),
        Domain::Temperature.profile(),
        cfg,
        stop.clone(),
    )
    .with_time_unit(Duration::from_millis(1));

    let handle = std::thread::spawn(move || uploader.run_blocking());
    std::thread::sleep(run_for);
    stop.request();
    handle.join().expect("uploader thread")
}

#[test]
fn writes_floored_fahrenheit_records() {
    let store = MemoryStore::new();
    let stats = run_uploader(store.clone(), config(), Duration::from_millis(100));

    let records = store.records(BUCKET);
    assert!(!records.is_empty());
    assert_eq!(stats.records_written, records.len() as u64);
    for r in &records {
        assert_eq!(r.key, 71);
        assert_eq!(r.payload, b"71");
        assert_eq!(r.timestamp_us, TS * 1_000_000);
    }
    let settings = store.settings(BUCKET).expect("bucket created");
    assert_eq!(settings.quota_type, QuotaType::Fifo);
    assert_eq!(settings.quota_size, 1_000_000_000);
}

#[test]
fn reconnects_after_connect_failures() {
    let store = MemoryStore::new();
    store.fail_next_connects(2);
    let stats = run_uploader(store.clone(), config(), Duration::from_millis(150));

    assert_eq!(stats.store_failures, 2);
    assert_eq!(stats.sessions_opened, 1);
    assert!(!store.records(BUCKET).is_empty());
}

#[test]
fn write_failure_drops_the_session() {
    let store = MemoryStore::new();
    store.fail_next_writes(1);
    let stats = run_uploader(store.clone(), config(), Duration::from_millis(100));

    assert_eq!(stats.sessions_opened, 2);
    assert_eq!(store.connects(), 2);
    assert!(stats.records_written >= 1);
}

#[test]
fn persistent_write_failures_back_off() {
    let store = MemoryStore::new();
    store.fail_next_writes(1000);
    let stats = run_uploader(store.clone(), config(), Duration::from_millis(100));

    // Backoff is 2, 4, 8, 8, ... ms, so ~100 ms allows about a dozen attempts.
    assert_eq!(stats.records_written, 0);
    assert!(store.connects() >= 2, "never retried");
    assert!(store.connects() <= 20, "{} reconnects", store.connects());
    // Stop may land between a reconnect and its write.
    assert!(u64::from(store.connects()) - stats.store_failures <= 1);
}

#[test]
fn unauthorized_store_never_receives_records() {
    let store = MemoryStore::new().with_token("secret");
    let stats = run_uploader(store.clone(), config(), Duration::from_millis(60));

    assert_eq!(stats.records_written, 0);
    assert_eq!(stats.sessions_opened, 0);
    assert!(stats.store_failures >= 1);
    assert!(store.records(BUCKET).is_empty());
}

#[test]
fn stop_interrupts_a_long_period() {
    let store = MemoryStore::new();
    let cfg = StoreConfig {
        period_secs: 60_000,
        ..config()
    };
    let started = std::time::Instant::now();
    let stats = run_uploader(store, cfg, Duration::from_millis(20));
    assert_eq!(stats.records_written, 1);
    assert!(started.elapsed() < Duration::from_secs(5));
}
