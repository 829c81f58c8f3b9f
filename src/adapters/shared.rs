//! Guarded shared peripherals.
//!
//! The sensor bus and the serial port are each shared by both control
//! loops (and the sensor also by the store uploader).  `Guarded<T>` wraps
//! the device in a `parking_lot::Mutex` and bounds how long a caller waits,
//! so a wedged peer turns into a transient `Busy` error instead of stalling
//! a loop past its tick.
//!
//! ```text
//!  temperature loop ──┐
//!  humidity loop    ──┼──▶ Guarded<Sht31> ──▶ one transaction at a time
//!  store uploader   ──┘
//! ```

use core::time::Duration;
use std::sync::Arc;

use log::warn;
use parking_lot::Mutex;

use crate::app::ports::{SensorPort, Transport};
use crate::error::{CommsError, SensorError};

/// Default upper bound on waiting for a peer to release the device.
pub const DEFAULT_WAIT: Duration = Duration::from_millis(250);

pub struct Guarded<T> {
    name: &'static str,
    wait: Duration,
    inner: Mutex<T>,
}

impl<T> Guarded<T> {
    pub fn new(name: &'static str, inner: T) -> Arc<Self> {
        Self::with_wait(name, inner, DEFAULT_WAIT)
    }

    pub fn with_wait(name: &'static str, inner: T, wait: Duration) -> Arc<Self> {
        Arc::new(Self {
            name,
            wait,
            inner: Mutex::new(inner),
        })
    }

    /// Run `f` with exclusive access; `None` if the lock was not obtained
    /// within the wait bound.
    pub fn with<R>(&self, f: impl FnOnce(&mut T) -> R) -> Option<R> {
        match self.inner.try_lock_for(self.wait) {
            Some(mut guard) => Some(f(&mut guard)),
            None => {
                warn!("{}: still held after {:?}, giving up", self.name, self.wait);
                None
            }
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }
}

impl<S: SensorPort> Guarded<S> {
    /// One temperature transaction.
    pub fn read_temperature(&self) -> Result<f32, SensorError> {
        self.with(SensorPort::read_temperature)
            .unwrap_or(Err(SensorError::Busy))
    }

    /// One humidity transaction.
    pub fn read_humidity(&self) -> Result<f32, SensorError> {
        self.with(SensorPort::read_humidity)
            .unwrap_or(Err(SensorError::Busy))
    }
}

impl<T: Transport> Guarded<T> {
    /// Write a whole frame and flush while holding the port, so frames from
    /// different loops never interleave.
    pub fn write_frame(&self, frame: &[u8]) -> Result<(), CommsError> {
        self.with(|port| {
            let mut rest = frame;
            while !rest.is_empty() {
                match port.write(rest) {
                    Ok(0) | Err(_) => return Err(CommsError::WriteFailed),
                    Ok(n) => rest = &rest[n..],
                }
            }
            port.flush().map_err(|_| CommsError::FlushFailed)
        })
        .unwrap_or(Err(CommsError::Busy))
    }
}
