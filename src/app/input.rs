//! Button input → setpoint adjustments and queued loop commands.
//!
//! ```text
//!  press ──▶ InputHandler ──┬──▶ SetpointRegister (immediate, atomic)
//!                           └──▶ CommandQueue ──▶ ControlLoop (next tick)
//! ```
//!
//! Each press is exactly one atomic adjustment; there is no debounce here.
//! A press never triggers an FSM evaluation: the next scheduled
//! evaluation picks up the new setpoint.

use std::sync::Arc;

use log::{debug, warn};

use super::commands::{CommandQueue, ControlCommand};
use crate::config::BoostPolicy;
use crate::setpoint::{Adjust, SetpointRegister};

/// A button press bound to one controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Press {
    Increment,
    Decrement,
    /// Manual state cycle (Off → Primary → Secondary → Off).
    Cycle,
}

#[derive(Clone)]
pub struct InputHandler {
    domain: &'static str,
    setpoint: Arc<SetpointRegister>,
    commands: Arc<CommandQueue>,
    boost: BoostPolicy,
}

impl InputHandler {
    pub fn new(
        domain: &'static str,
        setpoint: Arc<SetpointRegister>,
        commands: Arc<CommandQueue>,
        boost: BoostPolicy,
    ) -> Self {
        Self {
            domain,
            setpoint,
            commands,
            boost,
        }
    }

    /// Apply one press.  Returns the setpoint outcome for adjust presses.
    pub fn handle(&self, press: Press) -> Option<Adjust> {
        match press {
            Press::Increment => {
                let outcome = self.setpoint.increment();
                self.log_adjust("+", outcome);
                if outcome.changed() && self.boost != BoostPolicy::Disabled {
                    self.queue(ControlCommand::BoostPrimary);
                }
                Some(outcome)
            }
            Press::Decrement => {
                let outcome = self.setpoint.decrement();
                self.log_adjust("-", outcome);
                if outcome.changed() && self.boost == BoostPolicy::Symmetric {
                    self.queue(ControlCommand::BoostSecondary);
                }
                Some(outcome)
            }
            Press::Cycle => {
                self.queue(ControlCommand::Cycle);
                None
            }
        }
    }

    pub fn domain(&self) -> &'static str {
        self.domain
    }

    fn log_adjust(&self, dir: &str, outcome: Adjust) {
        match outcome {
            Adjust::Changed(v) => debug!("{}: setpoint {} -> {}", self.domain, dir, v),
            Adjust::AtBound(v) => debug!("{}: setpoint {} ignored at bound {}", self.domain, dir, v),
        }
    }

    fn queue(&self, cmd: ControlCommand) {
        if self.commands.try_send(cmd).is_err() {
            warn!("{}: command queue full, dropping {:?}", self.domain, cmd);
        }
    }
}
