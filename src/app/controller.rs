//! One setpoint controller: FSM + setpoint register + indicator pair.
//!
//! [`Controller`] owns the FSM and its context for a single domain.  It is
//! hardware-agnostic: indicators arrive as [`IndicatorPort`] values and
//! everything observable leaves through an [`EventSink`].
//!
//! ```text
//!  reading ──▶ ┌──────────────────────────┐ ──▶ EventSink
//!              │        Controller         │
//!  setpoint ──▶│  FSM · IndicatorCommands  │ ──▶ primary / secondary
//!              └──────────────────────────┘
//! ```

use std::sync::Arc;

use log::{debug, info};

use crate::domain::DomainProfile;
use crate::error::Error;
use crate::fsm::context::{FsmContext, IndicatorCommands, IndicatorMode};
use crate::fsm::states::build_state_table;
use crate::fsm::{Fsm, StateId, Transition};
use crate::setpoint::SetpointRegister;
use crate::telemetry::TelemetrySnapshot;

use super::commands::ControlCommand;
use super::events::AppEvent;
use super::ports::{EventSink, IndicatorPort};

// ───────────────────────────────────────────────────────────────
// Controller
// ───────────────────────────────────────────────────────────────

pub struct Controller<I> {
    profile: &'static DomainProfile,
    fsm: Fsm,
    ctx: FsmContext,
    setpoint: Arc<SetpointRegister>,
    primary: I,
    secondary: I,
    /// Mode last accepted by each output; `None` until the first write
    /// succeeds, so a failed write is retried on the next apply.
    applied: [Option<IndicatorMode>; 2],
    /// Most recent converted reading that was successfully sampled.
    last_reading: Option<f32>,
    /// Setpoint last reported through `SetpointChanged`.
    reported_setpoint: i32,
}

impl<I: IndicatorPort> Controller<I> {
    /// Build a controller in `Off`.  Does not touch the outputs until
    /// [`start`](Self::start).
    pub fn new(
        profile: &'static DomainProfile,
        setpoint: Arc<SetpointRegister>,
        primary: I,
        secondary: I,
    ) -> Self {
        let reported_setpoint = setpoint.get();
        Self {
            profile,
            fsm: Fsm::new(build_state_table(), StateId::Off),
            ctx: FsmContext::new(),
            setpoint,
            primary,
            secondary,
            applied: [None, None],
            last_reading: None,
            reported_setpoint,
        }
    }

    // ── Lifecycle ─────────────────────────────────────────────

    /// Run the initial state's enter action and drive the outputs to match.
    pub fn start(&mut self, sink: &mut impl EventSink) {
        self.fsm.start(&mut self.ctx);
        self.ctx.setpoint = self.setpoint.get();
        self.apply_indicators(sink);
        sink.emit(&AppEvent::Started {
            domain: self.profile.name,
            state: self.fsm.current_state(),
        });
        info!(
            "{}: controller started in {:?} (setpoint {})",
            self.profile.name,
            self.fsm.current_state(),
            self.ctx.setpoint
        );
    }

    /// Force both outputs off.  The FSM state is left as is.
    pub fn all_off(&mut self, sink: &mut impl EventSink) {
        self.ctx.commands = IndicatorCommands::all_off();
        self.apply_indicators(sink);
    }

    // ── Per-evaluation ────────────────────────────────────────

    /// Record a successfully sampled reading (converted units).
    pub fn note_reading(&mut self, reading: f32) {
        self.last_reading = Some(reading);
    }

    /// Emit `SetpointChanged` if the register moved since the last call.
    pub fn sync_setpoint(&mut self, sink: &mut impl EventSink) -> i32 {
        let current = self.setpoint.get();
        if current != self.reported_setpoint {
            self.reported_setpoint = current;
            sink.emit(&AppEvent::SetpointChanged {
                domain: self.profile.name,
                setpoint: current,
            });
        }
        current
    }

    /// One FSM evaluation against `reading` and the current setpoint.
    ///
    /// The reading is floored to whole units before comparison.  Returns
    /// the transition taken, if any.
    pub fn evaluate(&mut self, reading: f32, sink: &mut impl EventSink) -> Option<Transition> {
        self.note_reading(reading);
        self.ctx.reading = reading.floor() as i32;
        self.ctx.setpoint = self.setpoint.get();

        let transition = self.fsm.evaluate(&mut self.ctx);
        debug!(
            "{}: eval #{} reading={} setpoint={} state={:?}",
            self.profile.name,
            self.ctx.total_evals,
            self.ctx.reading,
            self.ctx.setpoint,
            self.fsm.current_state()
        );

        self.apply_indicators(sink);
        if let Some(t) = transition {
            self.emit_transition(t, sink);
        }
        transition
    }

    // ── Command handling ──────────────────────────────────────

    /// Apply one queued command from the input side.
    pub fn handle_command(&mut self, cmd: ControlCommand, sink: &mut impl EventSink) {
        match cmd {
            ControlCommand::Cycle => {
                let next = self.fsm.current_state().next_in_cycle();
                if let Some(t) = self.fsm.force_transition(next, &mut self.ctx) {
                    self.apply_indicators(sink);
                    self.emit_transition(t, sink);
                }
            }
            ControlCommand::BoostPrimary => self.boost(StateId::Primary, sink),
            ControlCommand::BoostSecondary => self.boost(StateId::Secondary, sink),
        }
    }

    fn boost(&mut self, wanted: StateId, sink: &mut impl EventSink) {
        if self.fsm.current_state() != wanted {
            debug!("{}: boost ignored in {:?}", self.profile.name, self.fsm.current_state());
            return;
        }
        match wanted {
            StateId::Primary => self.ctx.commands.primary = IndicatorMode::Solid,
            StateId::Secondary => self.ctx.commands.secondary = IndicatorMode::Solid,
            StateId::Off => return,
        }
        info!("{}: boost {:?}", self.profile.name, wanted);
        self.apply_indicators(sink);
    }

    // ── Outputs ───────────────────────────────────────────────

    /// Retry any pending output write, then advance pulse animations.
    pub fn refresh_indicators(&mut self, tick: u64, sink: &mut impl EventSink) {
        self.apply_indicators(sink);
        let domain = self.profile.name;
        for result in [self.primary.refresh(tick), self.secondary.refresh(tick)] {
            if let Err(e) = result {
                sink.emit(&AppEvent::Fault {
                    domain,
                    error: Error::from(e),
                });
            }
        }
    }

    /// Drive the outputs to `ctx.commands`.  Outputs being switched off are
    /// written before outputs being switched on, so the pair is never both
    /// active between the two writes.  Unchanged outputs are not rewritten.
    fn apply_indicators(&mut self, sink: &mut impl EventSink) {
        let wanted = [self.ctx.commands.primary, self.ctx.commands.secondary];
        let order: [usize; 2] = if wanted[0] == IndicatorMode::Off {
            [0, 1]
        } else {
            [1, 0]
        };
        let mut off_failed = false;
        for idx in order {
            if self.applied[idx] == Some(wanted[idx]) {
                continue;
            }
            if off_failed && wanted[idx] != IndicatorMode::Off {
                // The other output may still be lit; retry both next time.
                continue;
            }
            let output = if idx == 0 {
                &mut self.primary
            } else {
                &mut self.secondary
            };
            match output.set_mode(wanted[idx]) {
                Ok(()) => self.applied[idx] = Some(wanted[idx]),
                Err(e) => {
                    self.applied[idx] = None;
                    off_failed |= wanted[idx] == IndicatorMode::Off;
                    sink.emit(&AppEvent::Fault {
                        domain: self.profile.name,
                        error: Error::from(e),
                    });
                }
            }
        }
    }

    fn emit_transition(&self, t: Transition, sink: &mut impl EventSink) {
        sink.emit(&AppEvent::StateChanged {
            domain: self.profile.name,
            from: t.from,
            to: t.to,
        });
    }

    // ── Queries ───────────────────────────────────────────────

    pub fn state(&self) -> StateId {
        self.fsm.current_state()
    }

    pub fn setpoint(&self) -> i32 {
        self.setpoint.get()
    }

    pub fn profile(&self) -> &'static DomainProfile {
        self.profile
    }

    pub fn last_reading(&self) -> Option<f32> {
        self.last_reading
    }

    /// Commands the FSM currently wants on the outputs.
    pub fn commands(&self) -> IndicatorCommands {
        self.ctx.commands
    }

    pub fn evaluations(&self) -> u64 {
        self.ctx.total_evals
    }

    /// Telemetry view for a reading taken at `timestamp_us`.
    pub fn snapshot(&self, reading: f32, timestamp_us: i64) -> TelemetrySnapshot {
        TelemetrySnapshot {
            profile: self.profile,
            state: self.fsm.current_state(),
            reading,
            setpoint: self.setpoint.get(),
            timestamp_us,
        }
    }
}
