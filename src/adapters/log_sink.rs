//! Log-based event sink adapter.
//!
//! Implements [`EventSink`] by writing structured application events to
//! the `log` facade (stderr through `env_logger` on the host).

use log::{info, warn};

use crate::app::events::AppEvent;
use crate::app::ports::EventSink;

/// Adapter that logs every [`AppEvent`] as one tagged line.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogEventSink;

impl LogEventSink {
    pub fn new() -> Self {
        Self
    }
}

impl EventSink for LogEventSink {
    fn emit(&mut self, event: &AppEvent) {
        match event {
            AppEvent::Telemetry(t) => {
                info!(
                    "TELEM | {} | state={} | reading={:.2} | setpoint={} | ts={}",
                    t.profile.name,
                    t.state_id(),
                    t.reading,
                    t.setpoint,
                    t.timestamp_us,
                );
            }
            AppEvent::StateChanged { domain, from, to } => {
                info!("STATE | {} | {:?} -> {:?}", domain, from, to);
            }
            AppEvent::SetpointChanged { domain, setpoint } => {
                info!("SETPT | {} | {}", domain, setpoint);
            }
            AppEvent::Fault { domain, error } => {
                warn!("FAULT | {} | {}", domain, error);
            }
            AppEvent::Started { domain, state } => {
                info!("START | {} | initial_state={:?}", domain, state);
            }
            AppEvent::Stopped { domain, ticks } => {
                info!("STOP  | {} | after {} ticks", domain, ticks);
            }
        }
    }
}
