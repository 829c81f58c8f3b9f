//! Cooperative shutdown signal.
//!
//! Synchronous loops poll [`StopSignal::is_requested`] once per tick; the
//! async store uploader awaits [`StopSignal::wait`] so it wakes at once
//! instead of finishing its sleep.
//!
//! The async side is an `embassy-sync` `Signal`, which keeps a single
//! waker: only one task may `wait()` at a time.

use core::sync::atomic::{AtomicBool, Ordering};

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::signal::Signal;

pub struct StopSignal {
    requested: AtomicBool,
    wake: Signal<CriticalSectionRawMutex, ()>,
}

impl StopSignal {
    pub const fn new() -> Self {
        Self {
            requested: AtomicBool::new(false),
            wake: Signal::new(),
        }
    }

    /// Request shutdown.  Idempotent.
    pub fn request(&self) {
        self.requested.store(true, Ordering::Release);
        self.wake.signal(());
    }

    pub fn is_requested(&self) -> bool {
        self.requested.load(Ordering::Acquire)
    }

    /// Resolve once shutdown has been requested.
    pub async fn wait(&self) {
        while !self.is_requested() {
            self.wake.wait().await;
        }
    }
}

impl Default for StopSignal {
    fn default() -> Self {
        Self::new()
    }
}
