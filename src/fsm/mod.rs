//! Function-pointer finite state machine engine.
//!
//! Classic embedded FSM pattern ported to Rust:
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │  StateTable                                              │
//! │  ┌───────────┬───────────┬──────────┬─────────────────┐  │
//! │  │ StateId   │ on_enter  │ on_exit  │ on_evaluate     │  │
//! │  ├───────────┼───────────┼──────────┼─────────────────┤  │
//! │  │ Off       │ fn(ctx)   │ fn(ctx)  │ fn(ctx)->Option │  │
//! │  │ Primary   │ fn(ctx)   │ fn(ctx)  │ fn(ctx)->Option │  │
//! │  │ Secondary │ fn(ctx)   │ fn(ctx)  │ fn(ctx)->Option │  │
//! │  └───────────┴───────────┴──────────┴─────────────────┘  │
//! └──────────────────────────────────────────────────────────┘
//! ```
//!
//! Each evaluation the engine calls `on_evaluate` for the **current**
//! state.  If it returns `Some(next_id)`, the engine runs `on_exit` for the
//! current state, then `on_enter` for the next, and updates the current
//! pointer.  All functions receive `&mut FsmContext` which holds the latest
//! reading, the setpoint, and the indicator commands.
//!
//! The engine is shared by both controlled quantities; the domain profile
//! only renames the states (heat/cool, drying/humidifying).

pub mod context;
pub mod states;

use context::FsmContext;
use log::info;

// ---------------------------------------------------------------------------
// State identity
// ---------------------------------------------------------------------------

/// Enumeration of all controller states.
/// Must stay in sync with the state table built in [`states::build_state_table`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum StateId {
    Off = 0,
    /// Heat / drying.
    Primary = 1,
    /// Cool / humidifying.
    Secondary = 2,
}

impl StateId {
    /// Number of states; sizes the table array.
    pub const COUNT: usize = 3;

    /// Convert an index back to `StateId`.  Panics on out-of-range in
    /// debug builds; returns `Off` in release (safe fallback).
    pub fn from_index(idx: usize) -> Self {
        match idx {
            0 => Self::Off,
            1 => Self::Primary,
            2 => Self::Secondary,
            _ => {
                debug_assert!(false, "invalid state index: {idx}");
                Self::Off
            }
        }
    }

    /// Successor under the manual cycle button: Off → Primary → Secondary → Off.
    pub const fn next_in_cycle(self) -> Self {
        match self {
            Self::Off => Self::Primary,
            Self::Primary => Self::Secondary,
            Self::Secondary => Self::Off,
        }
    }
}

// ---------------------------------------------------------------------------
// Function-pointer type aliases
// ---------------------------------------------------------------------------

/// Signature for `on_enter` and `on_exit` actions.
/// These run exactly once on each state transition.
pub type StateActionFn = fn(&mut FsmContext);

/// Signature for the evaluation handler.
/// Returns `Some(next)` to trigger a transition, or `None` to stay.
pub type StateEvaluateFn = fn(&mut FsmContext) -> Option<StateId>;

// ---------------------------------------------------------------------------
// State descriptor (one row in the table)
// ---------------------------------------------------------------------------

/// Static descriptor for a single FSM state.
/// Stored in a fixed-size array without heap or `dyn`.
pub struct StateDescriptor {
    pub id: StateId,
    pub name: &'static str,
    pub on_enter: Option<StateActionFn>,
    pub on_exit: Option<StateActionFn>,
    pub on_evaluate: StateEvaluateFn,
}

/// A transition that actually happened.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transition {
    pub from: StateId,
    pub to: StateId,
}

// ---------------------------------------------------------------------------
// FSM engine
// ---------------------------------------------------------------------------

/// The finite state machine engine.
///
/// Owns the state table (array of [`StateDescriptor`]); the caller owns the
/// [`FsmContext`] that is threaded through every handler call.
pub struct Fsm {
    /// Fixed-size table indexed by `StateId as usize`.
    table: [StateDescriptor; StateId::COUNT],
    /// Index of the currently active state.
    current: usize,
    /// Monotonically increasing evaluation counter.
    eval_count: u64,
    /// Evaluation at which the current state was entered.
    state_entry_eval: u64,
}

impl Fsm {
    /// Construct a new FSM with the given state table, starting in `initial`.
    pub fn new(table: [StateDescriptor; StateId::COUNT], initial: StateId) -> Self {
        Self {
            table,
            current: initial as usize,
            eval_count: 0,
            state_entry_eval: 0,
        }
    }

    /// Run the initial `on_enter` for the starting state.
    /// Call once after construction, before the first `evaluate()`.
    pub fn start(&mut self, ctx: &mut FsmContext) {
        info!("FSM starting in state: {}", self.table[self.current].name);
        if let Some(enter) = self.table[self.current].on_enter {
            enter(ctx);
        }
    }

    /// Evaluate the transition rule once.
    ///
    /// 1. Call `on_evaluate` for the current state.
    /// 2. If it returns `Some(next)` different from the current state,
    ///    execute `on_exit(current)` → update pointer → `on_enter(next)`.
    pub fn evaluate(&mut self, ctx: &mut FsmContext) -> Option<Transition> {
        self.eval_count += 1;
        ctx.evals_in_state = self.eval_count - self.state_entry_eval;
        ctx.total_evals = self.eval_count;

        let next = (self.table[self.current].on_evaluate)(ctx)?;
        self.force_transition(next, ctx)
    }

    /// Force an immediate transition (used by the manual cycle button).
    /// A request for the current state is a no-op.
    pub fn force_transition(&mut self, next: StateId, ctx: &mut FsmContext) -> Option<Transition> {
        if next as usize == self.current {
            return None;
        }
        let from = self.current_state();
        self.transition(next, ctx);
        Some(Transition { from, to: next })
    }

    /// The current state's identity.
    pub fn current_state(&self) -> StateId {
        StateId::from_index(self.current)
    }

    /// How many evaluations the FSM has spent in the current state.
    pub fn evals_in_current_state(&self) -> u64 {
        self.eval_count - self.state_entry_eval
    }

    // -----------------------------------------------------------------------
    // Internal
    // -----------------------------------------------------------------------

    fn transition(&mut self, next_id: StateId, ctx: &mut FsmContext) {
        let next_idx = next_id as usize;

        info!(
            "FSM transition: {} -> {}",
            self.table[self.current].name, self.table[next_idx].name
        );

        // Exit current state
        if let Some(exit) = self.table[self.current].on_exit {
            exit(ctx);
        }

        // Update pointer and timing
        self.current = next_idx;
        self.state_entry_eval = self.eval_count;
        ctx.evals_in_state = 0;

        // Enter new state
        if let Some(enter) = self.table[self.current].on_enter {
            enter(ctx);
        }
    }
}
