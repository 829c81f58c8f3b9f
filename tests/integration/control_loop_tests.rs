//! Integration tests for the ControlLoop → Controller → outputs pipeline.
//!
//! Loops are driven tick by tick on the test thread, with the simulated
//! sensor and recording mocks from [`mock_hw`](crate::mock_hw).

use std::sync::Arc;

use chrono::{Local, TimeZone};

use plantsitter::adapters::clock::FixedClock;
use plantsitter::adapters::shared::Guarded;
use plantsitter::adapters::sim::{SimKnobs, SimulatedSensor};
use plantsitter::app::control_loop::{ControlLoop, ImmediateTicker, TickOutcome};
use plantsitter::app::events::AppEvent;
use plantsitter::app::input::Press;
use plantsitter::app::stop::StopSignal;
use plantsitter::app::supervisor::{DomainHandles, LoopIo, Supervisor};
use plantsitter::config::{BoostPolicy, SystemConfig};
use plantsitter::domain::Domain;
use plantsitter::fsm::StateId;
use plantsitter::fsm::context::IndicatorMode;

use crate::mock_hw::{
    IndicatorLog, MockDisplay, MockIndicator, MockSerial, RecordingSink, last_mode,
};

type Loop =
    ControlLoop<SimulatedSensor, MockIndicator, MockDisplay, MockSerial, FixedClock, RecordingSink>;

struct Rig {
    lp: Loop,
    knobs: SimKnobs,
    leds: IndicatorLog,
    display: MockDisplay,
    serial: MockSerial,
    sink: RecordingSink,
    stop: Arc<StopSignal>,
    handles: DomainHandles,
}

fn rig_with(domain: Domain, config: SystemConfig) -> Rig {
    let sup = Supervisor::new(config).expect("valid config");
    let handles = sup.domain_handles(domain).expect("valid bounds");
    let (sensor, knobs) = SimulatedSensor::new(22.0, 45.0);
    let leds = IndicatorLog::default();
    let display = MockDisplay::new();
    let serial = MockSerial::new();
    let sink = RecordingSink::new();
    let lp = sup.control_loop(
        &handles,
        LoopIo {
            sensor: Guarded::new("sensor", sensor),
            primary: MockIndicator::new("primary", &leds),
            secondary: MockIndicator::new("secondary", &leds),
            display: display.clone(),
            serial: Guarded::new("serial", serial.clone()),
            clock: FixedClock(Local.timestamp_opt(1_700_000_000, 0).unwrap()),
            sink: sink.clone(),
        },
    );
    Rig {
        lp,
        knobs,
        leds,
        display,
        serial,
        sink,
        stop: sup.stop_signal(),
        handles,
    }
}

fn rig(domain: Domain) -> Rig {
    rig_with(domain, SystemConfig::default())
}

fn run_ticks(r: &mut Rig, n: u64) {
    for _ in 0..n {
        assert_eq!(r.lp.tick(), TickOutcome::Continue);
    }
}

// ── Cadence ──────────────────────────────────────────────────

#[test]
fn serial_frames_exactly_at_report_multiples() {
    let mut r = rig(Domain::Temperature);
    let mut emitted_at = Vec::new();
    for tick in 1..=90 {
        let before = r.serial.frame_count();
        r.lp.tick();
        if r.serial.frame_count() > before {
            emitted_at.push(tick);
        }
    }
    assert_eq!(emitted_at, vec![30, 60, 90]);
    assert_eq!(r.lp.report().evaluations, 9);
}

#[test]
fn serial_frame_format() {
    let mut r = rig(Domain::Temperature);
    run_ticks(&mut r, 30);
    // 22.0 °C = 71.6 °F, floored 71 < 72 → heat at tick 10.
    assert_eq!(
        r.serial.text(),
        "State: heat, \nCurrent Temp: 71.60, \nTarget Temp: 72\n"
    );
    assert_eq!(
        r.sink.count(|e| matches!(e, AppEvent::Telemetry(_))),
        1,
        "one Telemetry event per frame"
    );
}

#[test]
fn humidity_frame_uses_humidity_labels() {
    let mut r = rig(Domain::Humidity);
    run_ticks(&mut r, 30);
    assert_eq!(
        r.serial.text(),
        "State: humidifying, \nHumidity: 45.00, \nTarget Hum: 40\n"
    );
}

#[test]
fn display_alternates_every_five_ticks() {
    let mut r = rig(Domain::Temperature);
    run_ticks(&mut r, 10);
    let frames = r.display.state.lock().frames.clone();
    assert_eq!(frames.len(), 10);
    for (line1, _) in &frames {
        assert!(line1.chars().count() <= 16);
    }
    for f in &frames[0..5] {
        assert_eq!(f.1, " Current: 71.60");
    }
    for f in &frames[5..9] {
        assert_eq!(f.1, " Off | Set: 72");
    }
    // Evaluation runs before the render on tick 10.
    assert_eq!(frames[9].1, " Heat | Set: 72");
}

#[test]
fn humidity_display_layout() {
    let mut r = rig(Domain::Humidity);
    run_ticks(&mut r, 6);
    let frames = r.display.state.lock().frames.clone();
    assert_eq!(frames[0], (" Humidity: ".into(), "45.00".into()));
    assert_eq!(frames[5], (" Off ".into(), " Set to: 40".into()));
}

// ── Control behaviour ────────────────────────────────────────

#[test]
fn follows_reading_across_setpoint() {
    let mut r = rig(Domain::Temperature);
    run_ticks(&mut r, 10);
    assert_eq!(r.lp.controller().state(), StateId::Primary);
    assert_eq!(last_mode(&r.leds, "primary"), IndicatorMode::Pulsing);

    r.knobs.set_temperature_c(25.0); // 77 °F
    run_ticks(&mut r, 10);
    assert_eq!(r.lp.controller().state(), StateId::Secondary);
    assert_eq!(last_mode(&r.leds, "primary"), IndicatorMode::Off);
    assert_eq!(last_mode(&r.leds, "secondary"), IndicatorMode::Pulsing);
}

#[test]
fn setpoint_press_waits_for_next_evaluation() {
    let mut r = rig(Domain::Temperature);
    run_ticks(&mut r, 10);
    assert_eq!(r.lp.controller().state(), StateId::Primary);

    // 71 °F reading; drop the setpoint to 70 → cool, but only at tick 20.
    r.handles.input.handle(Press::Decrement);
    r.handles.input.handle(Press::Decrement);
    run_ticks(&mut r, 9);
    assert_eq!(r.lp.controller().state(), StateId::Primary);
    run_ticks(&mut r, 1);
    assert_eq!(r.lp.controller().state(), StateId::Secondary);
    assert_eq!(
        r.sink
            .count(|e| matches!(e, AppEvent::SetpointChanged { setpoint: 70, .. })),
        1
    );
}

#[test]
fn cycle_press_applies_on_next_tick() {
    let mut r = rig(Domain::Temperature);
    run_ticks(&mut r, 10);
    r.handles.input.handle(Press::Cycle);
    assert_eq!(r.lp.controller().state(), StateId::Primary);
    run_ticks(&mut r, 1);
    assert_eq!(r.lp.controller().state(), StateId::Secondary);
    r.handles.input.handle(Press::Cycle);
    run_ticks(&mut r, 1);
    assert_eq!(r.lp.controller().state(), StateId::Off);
    assert_eq!(last_mode(&r.leds, "primary"), IndicatorMode::Off);
    assert_eq!(last_mode(&r.leds, "secondary"), IndicatorMode::Off);
}

#[test]
fn boost_drives_primary_solid() {
    let mut config = SystemConfig::default();
    config.temperature.boost = BoostPolicy::Increment;
    let mut r = rig_with(Domain::Temperature, config);
    run_ticks(&mut r, 10);

    r.handles.input.handle(Press::Increment);
    run_ticks(&mut r, 1);
    assert_eq!(last_mode(&r.leds, "primary"), IndicatorMode::Solid);
    assert_eq!(r.lp.controller().setpoint(), 73);
}

#[test]
fn sensor_fault_skips_evaluation_and_report() {
    let mut r = rig(Domain::Temperature);
    r.knobs.set_temperature_c(f32::NAN);
    run_ticks(&mut r, 30);
    assert_eq!(r.lp.controller().state(), StateId::Off);
    assert_eq!(r.serial.frame_count(), 0);
    assert_eq!(r.sink.count(|e| matches!(e, AppEvent::Fault { .. })), 30);
    // Display keeps rendering with the placeholder.
    let frames = r.display.state.lock().frames.clone();
    assert_eq!(frames[0].1, " Current: --.--");
}

#[test]
fn serial_failure_is_not_fatal() {
    let mut r = rig(Domain::Temperature);
    *r.serial.fail.lock() = true;
    run_ticks(&mut r, 30);
    assert_eq!(r.sink.count(|e| matches!(e, AppEvent::Telemetry(_))), 0);
    *r.serial.fail.lock() = false;
    run_ticks(&mut r, 30);
    assert_eq!(r.serial.frame_count(), 1);
}

// ── Stop & teardown ──────────────────────────────────────────

#[test]
fn nothing_happens_after_stop() {
    let mut r = rig(Domain::Temperature);
    run_ticks(&mut r, 15);
    r.stop.request();
    assert_eq!(r.lp.tick(), TickOutcome::Stopped);
    let report = r.lp.run(&mut ImmediateTicker);

    assert_eq!(report.ticks, 15);
    assert_eq!(report.evaluations, 1);
    assert_eq!(r.display.state.lock().frames.len(), 15);
    assert_eq!(r.serial.frame_count(), 0);
}

#[test]
fn teardown_runs_exactly_once() {
    let mut r = rig(Domain::Temperature);
    run_ticks(&mut r, 12);
    r.stop.request();
    r.lp.run(&mut ImmediateTicker);
    r.lp.teardown();
    drop(r.lp);

    let panel = r.display.state.lock();
    assert_eq!(panel.teardowns, 1);
    assert_eq!(panel.after_teardown, 0);
    assert_eq!(r.sink.count(|e| matches!(e, AppEvent::Stopped { .. })), 1);
    assert_eq!(last_mode(&r.leds, "primary"), IndicatorMode::Off);
    assert_eq!(last_mode(&r.leds, "secondary"), IndicatorMode::Off);
}

#[test]
fn dropping_a_running_loop_tears_down() {
    let mut r = rig(Domain::Humidity);
    run_ticks(&mut r, 3);
    drop(r.lp);
    assert_eq!(r.display.state.lock().teardowns, 1);
}
