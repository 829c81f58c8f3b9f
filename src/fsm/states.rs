//! Concrete state handler functions and table builder.
//!
//! Each state is defined by three plain `fn` pointers (no closures, no
//! dynamic dispatch, no heap).
//!
//! ```text
//!  OFF ──[sp > r]──▶ PRIMARY ──[sp < r]──▶ SECONDARY
//!   │                   ▲                      │  ▲
//!   │                   └───────[sp > r]───────┘  │
//!   └─────────────────────[sp < r]────────────────┘
//!
//!  No reading-driven edge leads back to OFF; only the cycle button does.
//! ```
//!
//! The comparison is strict with no dead-band: a reading that straddles the
//! setpoint flips the state on every evaluation.

use super::context::{FsmContext, IndicatorMode};
use super::{StateDescriptor, StateId};
use log::{debug, info};

// ═══════════════════════════════════════════════════════════════════════════
//  Table builder
// ═══════════════════════════════════════════════════════════════════════════

/// Build the static state table.  Called once per controller.
pub fn build_state_table() -> [StateDescriptor; StateId::COUNT] {
    [
        // Index 0: Off
        StateDescriptor {
            id: StateId::Off,
            name: "Off",
            on_enter: Some(off_enter),
            on_exit: None,
            on_evaluate: off_evaluate,
        },
        // Index 1: Primary
        StateDescriptor {
            id: StateId::Primary,
            name: "Primary",
            on_enter: Some(primary_enter),
            on_exit: Some(primary_exit),
            on_evaluate: primary_evaluate,
        },
        // Index 2: Secondary
        StateDescriptor {
            id: StateId::Secondary,
            name: "Secondary",
            on_enter: Some(secondary_enter),
            on_exit: Some(secondary_exit),
            on_evaluate: secondary_evaluate,
        },
    ]
}

// ═══════════════════════════════════════════════════════════════════════════
//  OFF state
// ═══════════════════════════════════════════════════════════════════════════

fn off_enter(ctx: &mut FsmContext) {
    ctx.commands.primary = IndicatorMode::Off;
    ctx.commands.secondary = IndicatorMode::Off;
    info!("OFF: indicators dark");
}

fn off_evaluate(ctx: &mut FsmContext) -> Option<StateId> {
    if ctx.setpoint > ctx.reading {
        return Some(StateId::Primary);
    }
    if ctx.setpoint < ctx.reading {
        return Some(StateId::Secondary);
    }
    None
}

// ═══════════════════════════════════════════════════════════════════════════
//  PRIMARY state (heat / drying)
// ═══════════════════════════════════════════════════════════════════════════

fn primary_enter(ctx: &mut FsmContext) {
    ctx.commands.primary = IndicatorMode::Pulsing;
    ctx.commands.secondary = IndicatorMode::Off;
    info!(
        "PRIMARY: entered at reading {} / setpoint {}, primary output pulsing",
        ctx.reading, ctx.setpoint
    );
}

fn primary_exit(ctx: &mut FsmContext) {
    ctx.commands.primary = IndicatorMode::Off;
    debug!("PRIMARY: output off on exit");
}

fn primary_evaluate(ctx: &mut FsmContext) -> Option<StateId> {
    (ctx.setpoint < ctx.reading).then_some(StateId::Secondary)
}

// ═══════════════════════════════════════════════════════════════════════════
//  SECONDARY state (cool / humidifying)
// ═══════════════════════════════════════════════════════════════════════════

fn secondary_enter(ctx: &mut FsmContext) {
    ctx.commands.secondary = IndicatorMode::Pulsing;
    ctx.commands.primary = IndicatorMode::Off;
    info!(
        "SECONDARY: entered at reading {} / setpoint {}, secondary output pulsing",
        ctx.reading, ctx.setpoint
    );
}

fn secondary_exit(ctx: &mut FsmContext) {
    ctx.commands.secondary = IndicatorMode::Off;
    debug!("SECONDARY: output off on exit");
}

fn secondary_evaluate(ctx: &mut FsmContext) -> Option<StateId> {
    (ctx.setpoint > ctx.reading).then_some(StateId::Primary)
}
