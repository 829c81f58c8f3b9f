//! Outbound application events.
//!
//! The controllers emit these through the
//! [`EventSink`](super::ports::EventSink) port.  Adapters on the other
//! side decide what to do with them: log to the console, forward to a
//! dashboard, etc.

use crate::error::Error;
use crate::fsm::StateId;
use crate::telemetry::TelemetrySnapshot;

/// Structured events emitted by the application core.
#[derive(Debug, Clone)]
pub enum AppEvent {
    /// A control loop has started (carries its domain name and initial state).
    Started {
        domain: &'static str,
        state: StateId,
    },

    /// The FSM transitioned between states.
    StateChanged {
        domain: &'static str,
        from: StateId,
        to: StateId,
    },

    /// The setpoint moved.
    SetpointChanged { domain: &'static str, setpoint: i32 },

    /// A serial telemetry frame was emitted.
    Telemetry(TelemetrySnapshot),

    /// A transient fault was logged and the affected step skipped.
    Fault { domain: &'static str, error: Error },

    /// The loop exited and tore down its outputs.
    Stopped { domain: &'static str, ticks: u64 },
}
