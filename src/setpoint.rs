//! Clamped, lock-free setpoint register.
//!
//! The register is shared between a control loop (reader) and an input
//! handler (writer) that may run on another thread.  Every adjustment is a
//! single compare-and-swap on one `AtomicI32`, so a press never tears and
//! `min <= value <= max` holds at every instant.

use core::sync::atomic::{AtomicI32, Ordering};

use crate::config::DomainConfig;
use crate::error::{Error, Result};

/// Result of a single adjustment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Adjust {
    /// The value moved to the contained setpoint.
    Changed(i32),
    /// The value was already at the bound; nothing changed.
    AtBound(i32),
}

impl Adjust {
    pub fn changed(self) -> bool {
        matches!(self, Self::Changed(_))
    }

    pub fn value(self) -> i32 {
        match self {
            Self::Changed(v) | Self::AtBound(v) => v,
        }
    }
}

pub struct SetpointRegister {
    value: AtomicI32,
    min: i32,
    max: i32,
}

impl SetpointRegister {
    /// Create a register; fails when `min > max` or `initial` is out of range.
    pub fn new(initial: i32, min: i32, max: i32) -> Result<Self> {
        if min > max {
            return Err(Error::Config("setpoint min exceeds max"));
        }
        if !(min..=max).contains(&initial) {
            return Err(Error::Config("initial setpoint outside bounds"));
        }
        Ok(Self {
            value: AtomicI32::new(initial),
            min,
            max,
        })
    }

    pub fn from_config(config: &DomainConfig) -> Result<Self> {
        Self::new(
            config.default_setpoint,
            config.min_setpoint,
            config.max_setpoint,
        )
    }

    /// Current setpoint.
    pub fn get(&self) -> i32 {
        self.value.load(Ordering::Acquire)
    }

    pub fn bounds(&self) -> (i32, i32) {
        (self.min, self.max)
    }

    /// Raise the setpoint by one unit unless already at `max`.
    pub fn increment(&self) -> Adjust {
        self.step(1)
    }

    /// Lower the setpoint by one unit unless already at `min`.
    pub fn decrement(&self) -> Adjust {
        self.step(-1)
    }

    fn step(&self, delta: i32) -> Adjust {
        let result = self
            .value
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |v| {
                let next = v.saturating_add(delta).clamp(self.min, self.max);
                (next != v).then_some(next)
            });
        match result {
            Ok(prev) => Adjust::Changed(prev + delta),
            Err(current) => Adjust::AtBound(current),
        }
    }
}

impl core::fmt::Debug for SetpointRegister {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("SetpointRegister")
            .field("value", &self.get())
            .field("min", &self.min)
            .field("max", &self.max)
            .finish()
    }
}
