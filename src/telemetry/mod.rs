//! Telemetry: serial status frames and the periodic store uploader.
//!
//! Two independent outputs share one snapshot type:
//!
//! ```text
//!  ControlLoop ──(every REPORT_PERIOD)──▶ TelemetryReporter ──▶ Guarded<serial>
//!  StoreUploader ──(every store period)──▶ StoreBucket::write(key, payload, ts)
//! ```
//!
//! Serial frame (one per report, newline-terminated):
//!
//! ```text
//!  State: heat, \nCurrent Temp: 71.60, \nTarget Temp: 72\n
//! ```

pub mod store;

use core::fmt::Write;
use std::sync::Arc;

use log::debug;

use crate::adapters::shared::Guarded;
use crate::app::ports::Transport;
use crate::domain::DomainProfile;
use crate::error::CommsError;
use crate::fsm::StateId;

/// Capacity of one formatted serial frame.
pub const FRAME_CAPACITY: usize = 128;

/// One formatted serial frame.
pub type SerialFrame = heapless::String<FRAME_CAPACITY>;

/// Point-in-time view of one controller.
#[derive(Debug, Clone, Copy)]
pub struct TelemetrySnapshot {
    pub profile: &'static DomainProfile,
    pub state: StateId,
    /// Latest converted reading (°F or %RH).
    pub reading: f32,
    pub setpoint: i32,
    /// Microseconds since the Unix epoch.
    pub timestamp_us: i64,
}

impl TelemetrySnapshot {
    /// Serial/telemetry id of the state (`heat`, `drying`, ...).
    pub fn state_id(&self) -> &'static str {
        self.profile.state_id(self.state)
    }
}

/// Render `snapshot` in the serial wire format.
pub fn format_serial_frame(snapshot: &TelemetrySnapshot) -> Result<SerialFrame, CommsError> {
    let mut frame = SerialFrame::new();
    write!(
        frame,
        "State: {}, \n{}: {:.2}, \nTarget {}: {}\n",
        snapshot.state_id(),
        snapshot.profile.metric_label,
        snapshot.reading,
        snapshot.profile.target_label,
        snapshot.setpoint,
    )
    .map_err(|_| CommsError::FrameOverflow)?;
    Ok(frame)
}

/// Writes serial frames for one controller over the shared port.
pub struct TelemetryReporter<T> {
    transport: Arc<Guarded<T>>,
    frames_sent: u64,
}

impl<T: Transport> TelemetryReporter<T> {
    pub fn new(transport: Arc<Guarded<T>>) -> Self {
        Self {
            transport,
            frames_sent: 0,
        }
    }

    /// Format and write one frame.  Failure is reported, never fatal.
    pub fn emit_serial(&mut self, snapshot: &TelemetrySnapshot) -> Result<(), CommsError> {
        let frame = format_serial_frame(snapshot)?;
        self.transport.write_frame(frame.as_bytes())?;
        self.frames_sent += 1;
        debug!(
            "{}: serial frame #{} ({} bytes)",
            snapshot.profile.name,
            self.frames_sent,
            frame.len()
        );
        Ok(())
    }

    pub fn frames_sent(&self) -> u64 {
        self.frames_sent
    }
}
