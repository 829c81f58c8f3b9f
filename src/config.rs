//! System configuration parameters
//!
//! All tunable parameters for the PlantSitter controller.
//! Defaults reproduce the bench unit; the host binary may override them
//! from a JSON file.

use serde::{Deserialize, Serialize};

use crate::domain::Domain;
use crate::error::{Error, Result};

/// What an increment (or decrement) does to the indicator of the active
/// state besides moving the setpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum BoostPolicy {
    /// Adjustments only move the setpoint.
    #[default]
    Disabled,
    /// Increment while in the primary state drives the primary indicator solid.
    Increment,
    /// As `Increment`, plus decrement while in the secondary state drives the
    /// secondary indicator solid.
    Symmetric,
}

/// Setpoint bounds and input behaviour for one controlled quantity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DomainConfig {
    /// Setpoint at power-up.
    pub default_setpoint: i32,
    /// Lowest accepted setpoint (inclusive).
    pub min_setpoint: i32,
    /// Highest accepted setpoint (inclusive).
    pub max_setpoint: i32,
    /// Boost side effect of the adjust buttons.
    #[serde(default)]
    pub boost: BoostPolicy,
}

impl DomainConfig {
    /// Temperature defaults (°F).
    pub const fn temperature() -> Self {
        Self {
            default_setpoint: 72,
            min_setpoint: 60,
            max_setpoint: 95,
            boost: BoostPolicy::Disabled,
        }
    }

    /// Humidity defaults (%RH).
    pub const fn humidity() -> Self {
        Self {
            default_setpoint: 40,
            min_setpoint: 10,
            max_setpoint: 100,
            boost: BoostPolicy::Disabled,
        }
    }

    /// Reject bounds the setpoint register cannot honour.
    pub fn validate(&self) -> Result<()> {
        if self.min_setpoint > self.max_setpoint {
            return Err(Error::Config("min_setpoint exceeds max_setpoint"));
        }
        if self.default_setpoint < self.min_setpoint || self.default_setpoint > self.max_setpoint {
            return Err(Error::Config("default_setpoint outside [min, max]"));
        }
        Ok(())
    }
}

/// Where and how often the store uploader pushes samples.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Run the uploader at all.
    pub enabled: bool,
    /// Store endpoint.
    pub url: String,
    /// Bearer token, if the store requires one.
    pub api_token: Option<String>,
    /// Bucket that receives the temperature series.
    pub bucket: String,
    /// Seconds between samples.
    pub period_secs: u32,
    /// FIFO quota applied when the bucket is created (bytes).
    pub quota_size: u64,
    /// Upper bound on the reconnect backoff (seconds).
    pub max_backoff_secs: u32,
}

/// Longest reconnect backoff the store uploader may be configured with (1 h).
pub const MAX_STORE_BACKOFF_SECS: u32 = 3_600;

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            url: "http://192.168.8.176:8383".into(),
            api_token: None,
            bucket: "temperature-data".into(),
            period_secs: 10,
            quota_size: 1_000_000_000,
            max_backoff_secs: 60,
        }
    }
}

/// Core system configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SystemConfig {
    // --- Timing ---
    /// Control loop tick period (milliseconds)
    pub tick_ms: u32,
    /// Ticks between FSM evaluations
    pub eval_period_ticks: u32,
    /// Ticks between serial telemetry frames
    pub report_period_ticks: u32,
    /// Ticks each display view is held before alternating
    pub display_subcycle_ticks: u32,
    /// How long shutdown waits for the loops to finish (milliseconds)
    pub shutdown_grace_ms: u32,

    // --- Diagnostics ---
    /// Per-tick debug tracing
    pub verbose: bool,

    // --- Domains ---
    pub temperature: DomainConfig,
    pub humidity: DomainConfig,

    // --- Telemetry store ---
    pub store: StoreConfig,
}

impl Default for SystemConfig {
    fn default() -> Self {
        Self {
            // Timing
            tick_ms: 1000,          // 1 Hz
            eval_period_ticks: 10,  // every 10 s
            report_period_ticks: 30, // every 30 s
            display_subcycle_ticks: 5,
            shutdown_grace_ms: 1000,

            verbose: false,

            temperature: DomainConfig::temperature(),
            humidity: DomainConfig::humidity(),

            store: StoreConfig::default(),
        }
    }
}

impl SystemConfig {
    /// Check every parameter that would make the controller misbehave.
    /// Any failure here is fatal and must stop startup.
    pub fn validate(&self) -> Result<()> {
        if self.tick_ms == 0 {
            return Err(Error::Config("tick_ms must be non-zero"));
        }
        if self.eval_period_ticks == 0 {
            return Err(Error::Config("eval_period_ticks must be non-zero"));
        }
        if self.report_period_ticks == 0 {
            return Err(Error::Config("report_period_ticks must be non-zero"));
        }
        if self.display_subcycle_ticks == 0 {
            return Err(Error::Config("display_subcycle_ticks must be non-zero"));
        }
        self.temperature.validate()?;
        self.humidity.validate()?;
        if self.store.enabled {
            if self.store.period_secs == 0 {
                return Err(Error::Config("store.period_secs must be non-zero"));
            }
            if self.store.url.is_empty() {
                return Err(Error::Config("store.url is empty"));
            }
            if self.store.bucket.is_empty() {
                return Err(Error::Config("store.bucket is empty"));
            }
            if !(1..=MAX_STORE_BACKOFF_SECS).contains(&self.store.max_backoff_secs) {
                return Err(Error::Config("store.max_backoff_secs outside [1, 3600]"));
            }
        }
        Ok(())
    }

    /// Parse a JSON document and validate it.
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self =
            serde_json::from_str(json).map_err(|_| Error::Config("malformed JSON"))?;
        config.validate()?;
        Ok(config)
    }

    /// Setpoint configuration for one domain.
    pub fn domain(&self, domain: Domain) -> &DomainConfig {
        match domain {
            Domain::Temperature => &self.temperature,
            Domain::Humidity => &self.humidity,
        }
    }

    /// Log level the binary should run at.
    pub fn log_level(&self) -> log::LevelFilter {
        if self.verbose {
            log::LevelFilter::Debug
        } else {
            log::LevelFilter::Info
        }
    }
}
