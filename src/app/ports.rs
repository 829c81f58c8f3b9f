//! Port traits: the hexagonal boundary between domain logic and the outside world.
//!
//! ```text
//!   Adapter ──▶ Port trait ──▶ Controller / ControlLoop (domain)
//! ```
//!
//! Driven adapters (sensor, indicators, display, serial, clock, store)
//! implement these traits.  The domain consumes them via generics, so the
//! control logic never touches hardware directly and every collaborator can
//! be swapped for a recording mock in tests.

use chrono::{DateTime, Local};

use crate::error::{ActuatorError, DisplayError, SensorError, StoreError};
use crate::fsm::context::IndicatorMode;

// ───────────────────────────────────────────────────────────────
// Sensor port (driven adapter: hardware → domain)
// ───────────────────────────────────────────────────────────────

/// Read-side port for the combined temperature/humidity sensor.
///
/// One instance is shared by both control loops and the store uploader,
/// so callers reach it through [`Guarded`](crate::adapters::shared::Guarded).
pub trait SensorPort {
    /// Ambient temperature in °C.
    fn read_temperature(&mut self) -> Result<f32, SensorError>;

    /// Relative humidity in %RH.
    fn read_humidity(&mut self) -> Result<f32, SensorError>;
}

// ───────────────────────────────────────────────────────────────
// Indicator port (driven adapter: domain → hardware)
// ───────────────────────────────────────────────────────────────

/// One of the two mutually exclusive outputs of a controller.
pub trait IndicatorPort {
    /// Switch drive mode.  Setting the current mode again must be harmless.
    fn set_mode(&mut self, mode: IndicatorMode) -> Result<(), ActuatorError>;

    /// Advance any animation by one loop tick.  Solid and off outputs ignore it.
    fn refresh(&mut self, _tick: u64) -> Result<(), ActuatorError> {
        Ok(())
    }
}

// ───────────────────────────────────────────────────────────────
// Display port (driven adapter: domain → 16×2 panel)
// ───────────────────────────────────────────────────────────────

/// A two-line character display.
pub trait DisplayPort {
    /// Draw both lines, replacing what was shown.  Lines arrive already
    /// truncated to [`COLUMNS`](crate::display::COLUMNS).
    fn render(&mut self, line1: &str, line2: &str) -> Result<(), DisplayError>;

    /// Blank the panel.
    fn clear(&mut self) -> Result<(), DisplayError>;

    /// Release the panel.  Called exactly once when the loop exits.
    fn teardown(&mut self) -> Result<(), DisplayError>;
}

// ───────────────────────────────────────────────────────────────
// Serial transport port (driven adapter: domain → byte stream)
// ───────────────────────────────────────────────────────────────

/// Byte-oriented, write-only transport channel.
pub trait Transport {
    /// Error type for this transport.
    type Error: core::fmt::Debug;

    /// Write `data` to the transport.
    /// Returns the number of bytes actually written.
    fn write(&mut self, data: &[u8]) -> Result<usize, Self::Error>;

    /// Flush any buffered output.
    fn flush(&mut self) -> Result<(), Self::Error>;
}

// ───────────────────────────────────────────────────────────────
// Clock port
// ───────────────────────────────────────────────────────────────

/// Wall-clock source for the display header and store timestamps.
pub trait Clock {
    fn now(&self) -> DateTime<Local>;

    /// Microseconds since the Unix epoch.
    fn epoch_micros(&self) -> i64 {
        self.now().timestamp_micros()
    }
}

// ───────────────────────────────────────────────────────────────
// Event sink port (driven adapter: domain → logging)
// ───────────────────────────────────────────────────────────────

/// The domain emits structured [`AppEvent`](super::events::AppEvent)s
/// through this port.  Adapters decide where they go.
pub trait EventSink {
    fn emit(&mut self, event: &super::events::AppEvent);
}

// ───────────────────────────────────────────────────────────────
// Telemetry store ports (async, driven by the store uploader)
// ───────────────────────────────────────────────────────────────

/// Quota behaviour applied when a bucket is created.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum QuotaType {
    /// Drop the oldest records once the quota is reached.
    Fifo,
    /// Refuse writes once the quota is reached.
    Hard,
}

/// Settings sent with `get_or_create_bucket`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct BucketSettings {
    pub quota_type: QuotaType,
    /// Quota in bytes.
    pub quota_size: u64,
}

/// Opens sessions against a time-series store.
#[allow(async_fn_in_trait)]
pub trait StoreConnector {
    type Client: StoreClient;

    async fn connect(&mut self, url: &str, api_token: Option<&str>)
    -> Result<Self::Client, StoreError>;
}

/// An open store session.
#[allow(async_fn_in_trait)]
pub trait StoreClient {
    type Bucket: StoreBucket;

    async fn get_or_create_bucket(
        &mut self,
        name: &str,
        settings: &BucketSettings,
    ) -> Result<Self::Bucket, StoreError>;
}

/// A bucket that accepts `(key, payload, timestamp)` records.
#[allow(async_fn_in_trait)]
pub trait StoreBucket {
    async fn write(&mut self, key: i64, payload: &[u8], timestamp_us: i64)
    -> Result<(), StoreError>;
}
