//! Process interrupt → stop request.
//!
//! The SIGINT handler only stores to a static `AtomicBool` (async-signal
//! safe, like an ISR publishing a flag).  The main thread polls
//! [`interrupted`] and turns it into a supervisor shutdown.

use core::sync::atomic::{AtomicBool, Ordering};

use nix::sys::signal::{SaFlags, SigAction, SigHandler, SigSet, Signal, sigaction};

static INTERRUPTED: AtomicBool = AtomicBool::new(false);

extern "C" fn on_interrupt(_signal: nix::libc::c_int) {
    INTERRUPTED.store(true, Ordering::Release);
}

/// Install the SIGINT/SIGTERM handler.
pub fn install() -> nix::Result<()> {
    let action = SigAction::new(
        SigHandler::Handler(on_interrupt),
        SaFlags::SA_RESTART,
        SigSet::empty(),
    );
    // SAFETY: the handler only performs an atomic store.
    unsafe {
        sigaction(Signal::SIGINT, &action)?;
        sigaction(Signal::SIGTERM, &action)?;
    }
    Ok(())
}

/// `true` once an interrupt has arrived.
pub fn interrupted() -> bool {
    INTERRUPTED.load(Ordering::Acquire)
}
