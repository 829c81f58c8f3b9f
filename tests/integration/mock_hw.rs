//! Mock hardware adapters for integration tests.
//!
//! Every mock records into a shared log behind an `Arc`, so a test can keep
//! a handle while the loop owns (or a thread moves) the mock itself.

#![allow(dead_code)]

use std::sync::Arc;

use parking_lot::Mutex;

use plantsitter::app::events::AppEvent;
use plantsitter::app::ports::{DisplayPort, EventSink, IndicatorPort, Transport};
use plantsitter::error::{ActuatorError, DisplayError};
use plantsitter::fsm::context::IndicatorMode;

// ── Indicators ────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndicatorCall {
    pub name: &'static str,
    pub mode: IndicatorMode,
}

pub type IndicatorLog = Arc<Mutex<Vec<IndicatorCall>>>;

pub struct MockIndicator {
    name: &'static str,
    log: IndicatorLog,
}

impl MockIndicator {
    pub fn new(name: &'static str, log: &IndicatorLog) -> Self {
        Self {
            name,
            log: log.clone(),
        }
    }
}

impl IndicatorPort for MockIndicator {
    fn set_mode(&mut self, mode: IndicatorMode) -> Result<(), ActuatorError> {
        self.log.lock().push(IndicatorCall {
            name: self.name,
            mode,
        });
        Ok(())
    }
}

/// Last mode written to `name`, `Off` if never written.
pub fn last_mode(log: &IndicatorLog, name: &str) -> IndicatorMode {
    log.lock()
        .iter()
        .rev()
        .find(|c| c.name == name)
        .map_or(IndicatorMode::Off, |c| c.mode)
}

// ── Display ───────────────────────────────────────────────────

#[derive(Debug, Default)]
pub struct PanelState {
    pub frames: Vec<(String, String)>,
    pub clears: u32,
    pub teardowns: u32,
    /// Calls made after teardown (must stay zero).
    pub after_teardown: u32,
}

#[derive(Clone, Default)]
pub struct MockDisplay {
    pub state: Arc<Mutex<PanelState>>,
}

impl MockDisplay {
    pub fn new() -> Self {
        Self::default()
    }

    fn guard(&self) -> Result<(), DisplayError> {
        let mut s = self.state.lock();
        if s.teardowns > 0 {
            s.after_teardown += 1;
            return Err(DisplayError::TornDown);
        }
        Ok(())
    }
}

impl DisplayPort for MockDisplay {
    fn render(&mut self, line1: &str, line2: &str) -> Result<(), DisplayError> {
        self.guard()?;
        self.state
            .lock()
            .frames
            .push((line1.to_owned(), line2.to_owned()));
        Ok(())
    }

    fn clear(&mut self) -> Result<(), DisplayError> {
        self.guard()?;
        self.state.lock().clears += 1;
        Ok(())
    }

    fn teardown(&mut self) -> Result<(), DisplayError> {
        self.guard()?;
        self.state.lock().teardowns += 1;
        Ok(())
    }
}

// ── Serial ────────────────────────────────────────────────────

#[derive(Clone, Default)]
pub struct MockSerial {
    pub bytes: Arc<Mutex<Vec<u8>>>,
    pub fail: Arc<Mutex<bool>>,
}

impl MockSerial {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.bytes.lock()).into_owned()
    }

    /// Number of complete frames written.
    pub fn frame_count(&self) -> usize {
        self.text().matches("State: ").count()
    }
}

impl Transport for MockSerial {
    type Error = ();

    fn write(&mut self, data: &[u8]) -> Result<usize, ()> {
        if *self.fail.lock() {
            return Err(());
        }
        self.bytes.lock().extend_from_slice(data);
        Ok(data.len())
    }

    fn flush(&mut self) -> Result<(), ()> {
        Ok(())
    }
}

// ── Event sink ────────────────────────────────────────────────

#[derive(Clone, Default)]
pub struct RecordingSink {
    pub events: Arc<Mutex<Vec<AppEvent>>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn count(&self, pred: impl Fn(&AppEvent) -> bool) -> usize {
        self.events.lock().iter().filter(|e| pred(e)).count()
    }
}

impl EventSink for RecordingSink {
    fn emit(&mut self, event: &AppEvent) {
        self.events.lock().push(event.clone());
    }
}
