//! Property tests for the core invariants.
//!
//! Runs on host only; proptest is not available for embedded targets.

#![cfg(not(target_os = "espidf"))]

use std::sync::Arc;

use chrono::{Local, TimeZone};
use proptest::prelude::*;

use plantsitter::app::commands::ControlCommand;
use plantsitter::app::controller::Controller;
use plantsitter::app::events::AppEvent;
use plantsitter::app::ports::{EventSink, IndicatorPort};
use plantsitter::display::{COLUMNS, DisplayFrame, FrameInputs, View};
use plantsitter::domain::Domain;
use plantsitter::error::ActuatorError;
use plantsitter::fsm::StateId;
use plantsitter::fsm::context::IndicatorMode;
use plantsitter::setpoint::SetpointRegister;
use plantsitter::telemetry::{TelemetrySnapshot, format_serial_frame};

// ── Helpers ───────────────────────────────────────────────────

/// Indicator that mirrors its mode into a shared slot.
struct Mirror(Arc<parking_lot::Mutex<IndicatorMode>>);

impl IndicatorPort for Mirror {
    fn set_mode(&mut self, mode: IndicatorMode) -> Result<(), ActuatorError> {
        *self.0.lock() = mode;
        Ok(())
    }
}

struct Discard;

impl EventSink for Discard {
    fn emit(&mut self, _event: &AppEvent) {}
}

#[derive(Debug, Clone, Copy)]
enum Step {
    Evaluate(f32),
    Increment,
    Decrement,
    Command(ControlCommand),
}

fn arb_step() -> impl Strategy<Value = Step> {
    prop_oneof![
        4 => (40.0f32..110.0).prop_map(Step::Evaluate),
        1 => Just(Step::Increment),
        1 => Just(Step::Decrement),
        1 => Just(Step::Command(ControlCommand::Cycle)),
        1 => Just(Step::Command(ControlCommand::BoostPrimary)),
        1 => Just(Step::Command(ControlCommand::BoostSecondary)),
    ]
}

fn arb_state() -> impl Strategy<Value = StateId> {
    prop_oneof![
        Just(StateId::Off),
        Just(StateId::Primary),
        Just(StateId::Secondary),
    ]
}

// ── Setpoint register ────────────────────────────────────────

proptest! {
    /// Any sequence of adjustments keeps min <= value <= max.
    #[test]
    fn setpoint_stays_in_bounds(
        min in -50i32..50,
        span in 0i32..60,
        presses in proptest::collection::vec(any::<bool>(), 0..300),
    ) {
        let max = min + span;
        let reg = SetpointRegister::new(min + span / 2, min, max).unwrap();
        for up in presses {
            let outcome = if up { reg.increment() } else { reg.decrement() };
            prop_assert!((min..=max).contains(&outcome.value()));
            prop_assert!((min..=max).contains(&reg.get()));
        }
    }

    /// Inverted bounds are always rejected.
    #[test]
    fn inverted_bounds_rejected(min in -100i32..100, gap in 1i32..50) {
        prop_assert!(SetpointRegister::new(min, min, min - gap).is_err());
    }
}

// ── Controller ───────────────────────────────────────────────

proptest! {
    /// Whatever the input sequence, at most one indicator is ever lit.
    #[test]
    fn at_most_one_indicator_lit(
        steps in proptest::collection::vec(arb_step(), 1..200),
    ) {
        let primary = Arc::new(parking_lot::Mutex::new(IndicatorMode::Off));
        let secondary = Arc::new(parking_lot::Mutex::new(IndicatorMode::Off));
        let reg = Arc::new(SetpointRegister::new(72, 60, 95).unwrap());
        let mut c = Controller::new(
            Domain::Temperature.profile(),
            reg.clone(),
            Mirror(primary.clone()),
            Mirror(secondary.clone()),
        );
        let mut sink = Discard;
        c.start(&mut sink);

        for step in steps {
            match step {
                Step::Evaluate(r) => { c.evaluate(r, &mut sink); }
                Step::Increment => { reg.increment(); }
                Step::Decrement => { reg.decrement(); }
                Step::Command(cmd) => c.handle_command(cmd, &mut sink),
            }
            let lit = [*primary.lock(), *secondary.lock()]
                .iter()
                .filter(|m| **m != IndicatorMode::Off)
                .count();
            prop_assert!(lit <= 1);
        }
    }

    /// A second evaluation with identical inputs never transitions.
    #[test]
    fn evaluation_is_idempotent(reading in 40.0f32..110.0, sp in 60i32..95) {
        let reg = Arc::new(SetpointRegister::new(sp, 60, 95).unwrap());
        let slot = || Mirror(Arc::new(parking_lot::Mutex::new(IndicatorMode::Off)));
        let mut c = Controller::new(Domain::Humidity.profile(), reg, slot(), slot());
        let mut sink = Discard;
        c.start(&mut sink);
        c.evaluate(reading, &mut sink);
        prop_assert!(c.evaluate(reading, &mut sink).is_none());
    }
}

// ── Rendering ────────────────────────────────────────────────

proptest! {
    /// Composed lines never exceed the panel width.
    #[test]
    fn display_lines_fit_panel(
        tick in 1u64..10_000,
        reading in proptest::option::of(-1.0e6f32..1.0e6),
        setpoint in i32::MIN..i32::MAX,
        state in arb_state(),
        secs in 0i64..4_000_000_000,
        humidity in any::<bool>(),
    ) {
        let domain = if humidity { Domain::Humidity } else { Domain::Temperature };
        let inputs = FrameInputs {
            view: View::for_tick(tick, 5),
            state,
            reading,
            setpoint,
            now: Local.timestamp_opt(secs, 0).unwrap(),
        };
        let frame = DisplayFrame::compose(domain.profile(), &inputs);
        prop_assert!(frame.line1.chars().count() <= COLUMNS);
        prop_assert!(frame.line2.chars().count() <= COLUMNS);
    }

    /// Views alternate in blocks of `subcycle` ticks.
    #[test]
    fn views_alternate_in_blocks(tick in 1u64..100_000, subcycle in 1u32..20) {
        let block = (tick - 1) / u64::from(subcycle);
        let expected = if block % 2 == 0 { View::Live } else { View::Status };
        prop_assert_eq!(View::for_tick(tick, subcycle), expected);
    }

    /// Serial frames always carry the three fields and end in a newline.
    #[test]
    fn serial_frame_shape(
        reading in -1000.0f32..1000.0,
        setpoint in -1000i32..1000,
        state in arb_state(),
    ) {
        let profile = Domain::Temperature.profile();
        let snap = TelemetrySnapshot {
            profile,
            state,
            reading,
            setpoint,
            timestamp_us: 0,
        };
        let frame = format_serial_frame(&snap).unwrap();
        let expected_state = format!("State: {}, \n", profile.state_id(state));
        let expected_target = format!("Target Temp: {}\n", setpoint);
        prop_assert!(frame.starts_with(&expected_state));
        prop_assert!(frame.contains("Current Temp: "));
        prop_assert!(frame.ends_with(&expected_target));
    }
}
