//! Host simulation adapters.
//!
//! Stand-ins for the sensor, the indicator LEDs, and the LCD panels so the
//! whole controller runs on a workstation.  Readings are injected through
//! lock-free atomics (from a test, the stdin console, or a drift model)
//! the same way an ISR would publish a sample.

use core::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

use log::info;

use crate::app::ports::{DisplayPort, IndicatorPort, SensorPort};
use crate::error::{ActuatorError, DisplayError, SensorError};
use crate::fsm::context::IndicatorMode;

// ── Simulated sensor ─────────────────────────────────────────

/// Shared handle for injecting readings into a [`SimulatedSensor`].
#[derive(Debug, Clone)]
pub struct SimKnobs {
    temperature_c: Arc<AtomicU32>,
    humidity_pct: Arc<AtomicU32>,
}

impl SimKnobs {
    pub fn set_temperature_c(&self, c: f32) {
        self.temperature_c.store(c.to_bits(), Ordering::Release);
    }

    pub fn set_humidity_pct(&self, pct: f32) {
        self.humidity_pct.store(pct.to_bits(), Ordering::Release);
    }

    pub fn temperature_c(&self) -> f32 {
        f32::from_bits(self.temperature_c.load(Ordering::Acquire))
    }

    pub fn humidity_pct(&self) -> f32 {
        f32::from_bits(self.humidity_pct.load(Ordering::Acquire))
    }
}

/// Sensor that reports whatever its knobs hold.
#[derive(Debug)]
pub struct SimulatedSensor {
    knobs: SimKnobs,
}

impl SimulatedSensor {
    /// New sensor at the given starting conditions, plus its knob handle.
    pub fn new(temperature_c: f32, humidity_pct: f32) -> (Self, SimKnobs) {
        let knobs = SimKnobs {
            temperature_c: Arc::new(AtomicU32::new(temperature_c.to_bits())),
            humidity_pct: Arc::new(AtomicU32::new(humidity_pct.to_bits())),
        };
        (
            Self {
                knobs: knobs.clone(),
            },
            knobs,
        )
    }
}

impl SensorPort for SimulatedSensor {
    fn read_temperature(&mut self) -> Result<f32, SensorError> {
        let c = self.knobs.temperature_c();
        if (-40.0..=125.0).contains(&c) {
            Ok(c)
        } else {
            Err(SensorError::OutOfRange)
        }
    }

    fn read_humidity(&mut self) -> Result<f32, SensorError> {
        let rh = self.knobs.humidity_pct();
        if (0.0..=100.0).contains(&rh) {
            Ok(rh)
        } else {
            Err(SensorError::OutOfRange)
        }
    }
}

// ── Log-backed indicator ─────────────────────────────────────

/// Indicator that logs mode changes instead of driving a pin.
#[derive(Debug)]
pub struct LogIndicator {
    name: &'static str,
    mode: IndicatorMode,
}

impl LogIndicator {
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            mode: IndicatorMode::Off,
        }
    }
}

impl IndicatorPort for LogIndicator {
    fn set_mode(&mut self, mode: IndicatorMode) -> Result<(), ActuatorError> {
        if mode != self.mode {
            info!("LED   | {} -> {:?}", self.name, mode);
        }
        self.mode = mode;
        Ok(())
    }
}

// ── Log-backed display ───────────────────────────────────────

/// Display that logs each distinct frame.
#[derive(Debug)]
pub struct LogDisplay {
    name: &'static str,
    last: (String, String),
    torn_down: bool,
}

impl LogDisplay {
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            last: (String::new(), String::new()),
            torn_down: false,
        }
    }
}

impl DisplayPort for LogDisplay {
    fn render(&mut self, line1: &str, line2: &str) -> Result<(), DisplayError> {
        if self.torn_down {
            return Err(DisplayError::TornDown);
        }
        if self.last.0 != line1 || self.last.1 != line2 {
            info!("LCD   | {} [{:<16}] [{:<16}]", self.name, line1, line2);
            self.last = (line1.to_owned(), line2.to_owned());
        }
        Ok(())
    }

    fn clear(&mut self) -> Result<(), DisplayError> {
        if self.torn_down {
            return Err(DisplayError::TornDown);
        }
        self.last = (String::new(), String::new());
        Ok(())
    }

    fn teardown(&mut self) -> Result<(), DisplayError> {
        if self.torn_down {
            return Err(DisplayError::TornDown);
        }
        self.torn_down = true;
        info!("LCD   | {} released", self.name);
        Ok(())
    }
}
