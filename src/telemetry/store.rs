//! Periodic time-series uploader.
//!
//! Runs in a dedicated thread using `edge-executor` and `async-io-mini`
//! reactor timers.  Every period it samples the shared sensor, floors the
//! converted temperature, and appends one record:
//!
//! ```text
//!  key = floor(°F)   payload = b"71"   timestamp = now (µs since epoch)
//! ```
//!
//! Connectivity failures never reach the control loops.  A failed connect
//! or a failed write waits out an exponential backoff (2 s → 4 s → … →
//! `max_backoff_secs`) before the next attempt; only a successful write
//! resets it.  Every sleep races the shared stop signal so shutdown is
//! prompt.
//!
//! ```text
//!  ┌─────────────┐ connect+bucket ┌───────────┐  write ok   ┌─────────┐
//!  │ Disconnected│───────────────▶│ Connected │────────────▶│  sleep  │
//!  └─────────────┘                └───────────┘             └────┬────┘
//!        ▲  │ fail: backoff            │ write fail: backoff     │
//!        │  ▼                          ▼                         │
//!        └───────────────────── drop session ◀───────────────────┘
//! ```

use core::fmt::Write;
use core::time::Duration;
use std::sync::Arc;

use log::{debug, info, warn};

use crate::adapters::shared::Guarded;
use crate::app::ports::{
    BucketSettings, Clock, QuotaType, SensorPort, StoreBucket, StoreClient, StoreConnector,
};
use crate::app::stop::StopSignal;
use crate::config::StoreConfig;
use crate::domain::{DomainProfile, Quantity};
use crate::error::{Error, SensorError, StoreError};

/// First reconnect delay.
const INITIAL_BACKOFF_SECS: u32 = 2;

// ── Backoff ──────────────────────────────────────────────────

/// Doubling delay with an upper bound.
#[derive(Debug, Clone, Copy)]
pub struct Backoff {
    current_secs: u32,
    max_secs: u32,
}

impl Backoff {
    pub fn new(max_secs: u32) -> Self {
        Self {
            current_secs: INITIAL_BACKOFF_SECS.min(max_secs.max(1)),
            max_secs: max_secs.max(1),
        }
    }

    /// Delay to wait now; doubles the next one.
    pub fn next_delay(&mut self) -> Duration {
        let d = Duration::from_secs(u64::from(self.current_secs));
        self.current_secs = self.current_secs.saturating_mul(2).min(self.max_secs);
        d
    }

    pub fn reset(&mut self) {
        self.current_secs = INITIAL_BACKOFF_SECS.min(self.max_secs);
    }
}

// ── Stats ────────────────────────────────────────────────────

/// Counters returned when the uploader exits.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UploadStats {
    pub records_written: u64,
    pub sample_failures: u64,
    pub store_failures: u64,
    pub sessions_opened: u64,
}

// ── Uploader ─────────────────────────────────────────────────

pub struct StoreUploader<C, S, K> {
    connector: C,
    sensor: Arc<Guarded<S>>,
    clock: K,
    profile: &'static DomainProfile,
    config: StoreConfig,
    stop: Arc<StopSignal>,
    /// Base unit for the period and backoff; one second outside tests.
    time_unit: Duration,
}

impl<C, S, K> StoreUploader<C, S, K>
where
    C: StoreConnector,
    S: SensorPort,
    K: Clock,
{
    pub fn new(
        connector: C,
        sensor: Arc<Guarded<S>>,
        clock: K,
        profile: &'static DomainProfile,
        config: StoreConfig,
        stop: Arc<StopSignal>,
    ) -> Self {
        Self {
            connector,
            sensor,
            clock,
            profile,
            config,
            stop,
            time_unit: Duration::from_secs(1),
        }
    }

    /// Scale every period and backoff delay (tests run in milliseconds).
    pub fn with_time_unit(mut self, unit: Duration) -> Self {
        self.time_unit = unit;
        self
    }

    /// Upload until the stop signal fires.
    pub async fn run(mut self) -> UploadStats {
        let mut stats = UploadStats::default();
        let mut backoff = Backoff::new(self.config.max_backoff_secs);
        let mut bucket: Option<<C::Client as StoreClient>::Bucket> = None;
        let period = self.time_unit * self.config.period_secs;

        info!(
            "STORE: uploading {} every {}s to {} / {}",
            self.profile.name, self.config.period_secs, self.config.url, self.config.bucket
        );

        while !self.stop.is_requested() {
            let Some(open) = bucket.as_mut() else {
                match self.open_bucket().await {
                    Ok(b) => {
                        stats.sessions_opened += 1;
                        bucket = Some(b);
                    }
                    Err(e) => {
                        stats.store_failures += 1;
                        let delay = backoff.next_delay();
                        warn!("STORE: {} (retry in {:?})", Error::from(e), delay);
                        if self.sleep(self.scale(delay)).await {
                            break;
                        }
                    }
                }
                continue;
            };

            match self.sample() {
                Ok(key) => {
                    let payload = payload_for(key);
                    let ts = self.clock.epoch_micros();
                    match open.write(key, payload.as_bytes(), ts).await {
                        Ok(()) => {
                            stats.records_written += 1;
                            backoff.reset();
                            debug!("STORE: wrote {} @ {}", key, ts);
                        }
                        Err(e) => {
                            stats.store_failures += 1;
                            bucket = None;
                            let delay = backoff.next_delay();
                            warn!(
                                "STORE: {}, dropping session (retry in {:?})",
                                Error::from(e),
                                delay
                            );
                            if self.sleep(self.scale(delay)).await {
                                break;
                            }
                            continue;
                        }
                    }
                }
                Err(e) => {
                    stats.sample_failures += 1;
                    warn!("STORE: sample skipped: {}", e);
                }
            }

            if self.sleep(period).await {
                break;
            }
        }

        info!(
            "STORE: stopped ({} written, {} store failures)",
            stats.records_written, stats.store_failures
        );
        stats
    }

    async fn open_bucket(&mut self) -> Result<<C::Client as StoreClient>::Bucket, StoreError> {
        let mut client = self
            .connector
            .connect(&self.config.url, self.config.api_token.as_deref())
            .await?;
        let settings = BucketSettings {
            quota_type: QuotaType::Fifo,
            quota_size: self.config.quota_size,
        };
        let bucket = client
            .get_or_create_bucket(&self.config.bucket, &settings)
            .await?;
        info!("STORE: bucket '{}' ready", self.config.bucket);
        Ok(bucket)
    }

    /// Fresh reading, converted and floored to the record key.
    fn sample(&self) -> Result<i64, Error> {
        let raw = match self.profile.quantity {
            Quantity::TemperatureC => self.sensor.read_temperature()?,
            Quantity::RelativeHumidity => self.sensor.read_humidity()?,
        };
        let value = self.profile.convert(raw);
        if !value.is_finite() {
            return Err(SensorError::OutOfRange.into());
        }
        Ok(value.floor() as i64)
    }

    fn scale(&self, delay: Duration) -> Duration {
        self.time_unit * delay.as_secs() as u32
    }

    /// Sleep for `d`; `true` if woken by the stop signal.
    async fn sleep(&self, d: Duration) -> bool {
        futures_lite::future::or(
            async {
                async_io_mini::Timer::after(d).await;
                false
            },
            async {
                self.stop.wait().await;
                true
            },
        )
        .await
    }

    /// Drive [`run`](Self::run) to completion on a local executor owned by
    /// the calling thread.
    pub fn run_blocking(self) -> UploadStats {
        let executor: edge_executor::LocalExecutor<'_, 4> = edge_executor::LocalExecutor::new();
        futures_lite::future::block_on(executor.run(self.run()))
    }
}

/// Record payload: the key as decimal text.
fn payload_for(key: i64) -> heapless::String<20> {
    let mut text = heapless::String::new();
    // 20 bytes holds i64::MIN.
    let _ = write!(text, "{key}");
    text
}
