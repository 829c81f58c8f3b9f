//! PlantSitter host entry point.
//!
//! Runs both controllers against simulated peripherals: the sensor is fed
//! from stdin, indicators and panels render to the log, serial frames go
//! to stdout, and the store uploader writes to an in-process store.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                      Adapters (outer ring)                      │
//! │  SimulatedSensor  LogIndicator  LogDisplay  WriterTransport     │
//! │  WallClock        LogEventSink  MemoryStore ConsoleInput        │
//! │                                                                 │
//! │  ──────────────── Port Trait Boundary ───────────────────       │
//! │                                                                 │
//! │  ┌───────────────────────────┐   ┌───────────────────────────┐  │
//! │  │ temperature ControlLoop   │   │ humidity ControlLoop      │  │
//! │  │ Controller · FSM          │   │ Controller · FSM          │  │
//! │  └───────────────────────────┘   └───────────────────────────┘  │
//! │              StoreUploader · Supervisor (stop / grace)          │
//! └─────────────────────────────────────────────────────────────────┘
//! ```
#![deny(unused_must_use)]

use anyhow::{Context, Result};
use embassy_time::Duration;
use log::{info, warn};

use plantsitter::adapters::clock::WallClock;
use plantsitter::adapters::console::ConsoleInput;
use plantsitter::adapters::log_sink::LogEventSink;
use plantsitter::adapters::memory_store::MemoryStore;
use plantsitter::adapters::serial::WriterTransport;
use plantsitter::adapters::shared::Guarded;
use plantsitter::adapters::signal;
use plantsitter::adapters::sim::{LogDisplay, LogIndicator, SimulatedSensor};
use plantsitter::app::control_loop::FixedRateTicker;
use plantsitter::app::supervisor::{LoopIo, Supervisor};
use plantsitter::config::SystemConfig;
use plantsitter::domain::Domain;
use plantsitter::telemetry::store::StoreUploader;

/// Environment variable naming a JSON config file.
const CONFIG_ENV: &str = "PLANTSITTER_CONFIG";

/// How often the main thread checks for an interrupt.
const MAIN_POLL: Duration = Duration::from_millis(50);

fn load_config() -> Result<Option<SystemConfig>> {
    let Ok(path) = std::env::var(CONFIG_ENV) else {
        return Ok(None);
    };
    let json = std::fs::read_to_string(&path).with_context(|| format!("reading {path}"))?;
    let config = SystemConfig::from_json(&json).with_context(|| format!("parsing {path}"))?;
    Ok(Some(config))
}

fn main() -> Result<()> {
    // ── 1. Config, then logging at the configured verbosity ──
    let loaded = load_config()?;
    let config = loaded.clone().unwrap_or_default();
    env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or(config.log_level().as_str()),
    )
    .init();

    info!("PlantSitter v{}", env!("CARGO_PKG_VERSION"));
    match loaded {
        Some(_) => info!("Config loaded from ${}", CONFIG_ENV),
        None => info!("${} not set, using defaults", CONFIG_ENV),
    }

    signal::install().context("installing signal handler")?;

    // ── 2. Supervisor (validates config; fatal on error) ─────
    let mut supervisor = Supervisor::new(config)?;
    let config = supervisor.config().clone();

    // ── 3. Shared peripherals ────────────────────────────────
    let (sensor, knobs) = SimulatedSensor::new(22.2, 40.0);
    let sensor = Guarded::new("sht31", sensor);
    let serial = Guarded::new("serial", WriterTransport::new(std::io::stdout()));

    // ── 4. Domains ───────────────────────────────────────────
    let temperature = supervisor.domain_handles(Domain::Temperature)?;
    let humidity = supervisor.domain_handles(Domain::Humidity)?;

    let temp_loop = supervisor.control_loop(
        &temperature,
        LoopIo {
            sensor: sensor.clone(),
            primary: LogIndicator::new("red"),
            secondary: LogIndicator::new("blue"),
            display: LogDisplay::new("lcd-temp"),
            serial: serial.clone(),
            clock: WallClock,
            sink: LogEventSink::new(),
        },
    );
    let hum_loop = supervisor.control_loop(
        &humidity,
        LoopIo {
            sensor: sensor.clone(),
            primary: LogIndicator::new("yellow"),
            secondary: LogIndicator::new("green"),
            display: LogDisplay::new("lcd-hum"),
            serial,
            clock: WallClock,
            sink: LogEventSink::new(),
        },
    );
    supervisor.spawn_loop(temp_loop, FixedRateTicker::new(config.tick_ms))?;
    supervisor.spawn_loop(hum_loop, FixedRateTicker::new(config.tick_ms))?;

    // ── 5. Store uploader ────────────────────────────────────
    if config.store.enabled {
        let store = match config.store.api_token.as_deref() {
            Some(token) => MemoryStore::new().with_token(token),
            None => MemoryStore::new(),
        };
        let uploader = StoreUploader::new(
            store,
            sensor,
            WallClock,
            Domain::Temperature.profile(),
            config.store.clone(),
            supervisor.stop_signal(),
        );
        supervisor.spawn_store(uploader)?;
    }

    // ── 6. Console buttons ───────────────────────────────────
    ConsoleInput::new(temperature.input, humidity.input, Some(knobs))
        .spawn_stdin()
        .context("spawning console thread")?;
    info!("Console: t+ t- tc h+ h- hc, t=<°C> h=<%RH>; Ctrl-C to stop");

    // ── 7. Wait for interrupt, then shut down ────────────────
    while !signal::interrupted() && !supervisor.all_finished() {
        embassy_time::block_for(MAIN_POLL);
    }
    if !signal::interrupted() {
        warn!("All tasks exited on their own");
    }

    let report = supervisor.shutdown();
    for task in &report.finished {
        info!("  {} -> {:?}", task.name, task.outcome);
    }
    for name in &report.left_running {
        warn!("  {} did not stop within the grace period", name);
    }
    info!("PlantSitter stopped");
    Ok(())
}
