//! Unified error types for the PlantSitter controller.
//!
//! A single `Error` enum that every subsystem converts into, keeping the
//! control loop's error handling uniform.  All variants are `Copy` so they
//! pass through the loop, the FSM, and the event sink without allocation.
//!
//! Only [`Error::Config`] is fatal: it prevents startup.  Everything else is
//! logged, the affected step is skipped, and the loop carries on.

use core::fmt;

// ---------------------------------------------------------------------------
// Top-level controller error
// ---------------------------------------------------------------------------

/// Every fallible operation in the controller funnels into this type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// A sensor could not be read or returned implausible data.
    Sensor(SensorError),
    /// An indicator output command failed.
    Actuator(ActuatorError),
    /// The display rejected a frame.
    Display(DisplayError),
    /// The serial transport failed to accept a frame.
    Comms(CommsError),
    /// The telemetry store was unreachable or rejected a write.
    Store(StoreError),
    /// A tick step ran past its period.
    Overrun(OverrunError),
    /// Configuration is invalid or a collaborator is missing.
    Config(&'static str),
}

impl Error {
    /// `true` for the configuration class, the only one that blocks startup.
    pub const fn is_fatal(&self) -> bool {
        matches!(self, Self::Config(_))
    }

    /// `true` for faults the loop logs and skips past.
    pub const fn is_transient(&self) -> bool {
        !self.is_fatal()
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Sensor(e) => write!(f, "sensor: {e}"),
            Self::Actuator(e) => write!(f, "actuator: {e}"),
            Self::Display(e) => write!(f, "display: {e}"),
            Self::Comms(e) => write!(f, "comms: {e}"),
            Self::Store(e) => write!(f, "store: {e}"),
            Self::Overrun(e) => write!(f, "overrun: {e}"),
            Self::Config(msg) => write!(f, "config: {msg}"),
        }
    }
}

impl std::error::Error for Error {}

// ---------------------------------------------------------------------------
// Sensor errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SensorError {
    /// The bus transaction failed or timed out.
    BusFailed,
    /// The response checksum did not match.
    CrcMismatch,
    /// Reading is outside the physically plausible range.
    OutOfRange,
    /// The device is held by another thread past the allowed wait.
    Busy,
}

impl fmt::Display for SensorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::BusFailed => write!(f, "bus transaction failed"),
            Self::CrcMismatch => write!(f, "CRC mismatch"),
            Self::OutOfRange => write!(f, "reading out of range"),
            Self::Busy => write!(f, "device busy"),
        }
    }
}

impl From<SensorError> for Error {
    fn from(e: SensorError) -> Self {
        Self::Sensor(e)
    }
}

// ---------------------------------------------------------------------------
// Actuator errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActuatorError {
    /// PWM duty-cycle write failed.
    PwmWriteFailed,
    /// GPIO set failed.
    GpioWriteFailed,
}

impl fmt::Display for ActuatorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::PwmWriteFailed => write!(f, "PWM write failed"),
            Self::GpioWriteFailed => write!(f, "GPIO write failed"),
        }
    }
}

impl From<ActuatorError> for Error {
    fn from(e: ActuatorError) -> Self {
        Self::Actuator(e)
    }
}

// ---------------------------------------------------------------------------
// Display errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DisplayError {
    /// A control or data line could not be driven.
    PinWriteFailed,
    /// The panel was already torn down.
    TornDown,
}

impl fmt::Display for DisplayError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::PinWriteFailed => write!(f, "pin write failed"),
            Self::TornDown => write!(f, "display torn down"),
        }
    }
}

impl From<DisplayError> for Error {
    fn from(e: DisplayError) -> Self {
        Self::Display(e)
    }
}

// ---------------------------------------------------------------------------
// Communications errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommsError {
    /// The transport refused or truncated a write.
    WriteFailed,
    /// Flushing buffered output failed.
    FlushFailed,
    /// A formatted frame did not fit the frame buffer.
    FrameOverflow,
    /// The port is held by another writer past the allowed wait.
    Busy,
}

impl fmt::Display for CommsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::WriteFailed => write!(f, "serial write failed"),
            Self::FlushFailed => write!(f, "serial flush failed"),
            Self::FrameOverflow => write!(f, "frame exceeds buffer"),
            Self::Busy => write!(f, "serial port busy"),
        }
    }
}

impl From<CommsError> for Error {
    fn from(e: CommsError) -> Self {
        Self::Comms(e)
    }
}

// ---------------------------------------------------------------------------
// Telemetry store errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreError {
    /// Could not reach the store endpoint.
    ConnectFailed,
    /// The bucket could not be opened or created.
    BucketUnavailable,
    /// A record write was rejected.
    WriteFailed,
    /// The store refused the API token.
    Unauthorized,
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ConnectFailed => write!(f, "connect failed"),
            Self::BucketUnavailable => write!(f, "bucket unavailable"),
            Self::WriteFailed => write!(f, "record write failed"),
            Self::Unauthorized => write!(f, "unauthorized"),
        }
    }
}

impl From<StoreError> for Error {
    fn from(e: StoreError) -> Self {
        Self::Store(e)
    }
}

// ---------------------------------------------------------------------------
// Tick overrun
// ---------------------------------------------------------------------------

/// A tick that took longer than its period.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OverrunError {
    /// Tick number that overran.
    pub tick: u64,
    /// Time spent in the tick (ms).
    pub elapsed_ms: u64,
    /// Configured tick period (ms).
    pub period_ms: u64,
}

impl fmt::Display for OverrunError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "tick {} took {} ms (period {} ms)",
            self.tick, self.elapsed_ms, self.period_ms
        )
    }
}

impl From<OverrunError> for Error {
    fn from(e: OverrunError) -> Self {
        Self::Overrun(e)
    }
}

// ---------------------------------------------------------------------------
// Convenience Result alias
// ---------------------------------------------------------------------------

/// Crate-wide `Result` alias.
pub type Result<T> = core::result::Result<T, Error>;
