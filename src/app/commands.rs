//! Inbound commands to a control loop.
//!
//! Setpoint presses update the shared register directly; anything that
//! touches FSM state or indicators is queued here and applied by the loop
//! at the start of its next tick, so the loop stays the only writer.

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::channel::Channel;

/// Commands that input adapters can send into a control loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlCommand {
    /// Advance Off → Primary → Secondary → Off.
    Cycle,
    /// Drive the primary indicator solid if the loop is in Primary.
    BoostPrimary,
    /// Drive the secondary indicator solid if the loop is in Secondary.
    BoostSecondary,
}

/// Channel depth for queued commands.
pub const COMMAND_DEPTH: usize = 8;

/// Bounded MPMC queue from input handlers to one control loop.
pub type CommandQueue = Channel<CriticalSectionRawMutex, ControlCommand, COMMAND_DEPTH>;
