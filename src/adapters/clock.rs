//! Wall-clock adapter.
//!
//! [`WallClock`] reads the host's local time through `chrono`;
//! [`FixedClock`] returns a pinned instant for deterministic tests and
//! replays.

use chrono::{DateTime, Local};

use crate::app::ports::Clock;

#[derive(Debug, Clone, Copy, Default)]
pub struct WallClock;

impl Clock for WallClock {
    fn now(&self) -> DateTime<Local> {
        Local::now()
    }
}

/// A clock frozen at one instant.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub DateTime<Local>);

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Local> {
        self.0
    }
}
