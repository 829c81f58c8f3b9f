//! Shared mutable context threaded through every FSM handler.
//!
//! `FsmContext` is the single struct that state handlers read from and
//! write to: the latest reading, the setpoint captured for this
//! evaluation, the indicator commands, and evaluation counters.

// ---------------------------------------------------------------------------
// Indicator commands (written by state handlers; applied by the controller)
// ---------------------------------------------------------------------------

/// Drive mode of a single indicator output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum IndicatorMode {
    #[default]
    Off,
    /// Breathing brightness wave; the normal "working" signal.
    Pulsing,
    /// Fully on; used by the boost behaviour.
    Solid,
}

/// Commands that state handlers write to request indicator changes.
/// The controller applies these to the actual outputs after each step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct IndicatorCommands {
    /// Heat / drying indicator.
    pub primary: IndicatorMode,
    /// Cool / humidifying indicator.
    pub secondary: IndicatorMode,
}

impl IndicatorCommands {
    /// Both indicators off.
    pub fn all_off() -> Self {
        Self::default()
    }
}

// ---------------------------------------------------------------------------
// FsmContext
// ---------------------------------------------------------------------------

/// The shared context passed to every state handler function.
#[derive(Debug, Default)]
pub struct FsmContext {
    // -- Timing --
    /// Evaluations since the current state was entered.
    pub evals_in_state: u64,
    /// Total evaluations.
    pub total_evals: u64,

    // -- Inputs --
    /// Latest reading, floored to whole units.
    pub reading: i32,
    /// Setpoint snapshot for this evaluation.
    pub setpoint: i32,

    // -- Outputs --
    /// Commands to be applied to the indicators after the step.
    pub commands: IndicatorCommands,
}

impl FsmContext {
    pub fn new() -> Self {
        Self::default()
    }
}
