//! Controller and setpoint behaviour through the public API.

use std::sync::Arc;

use plantsitter::app::controller::Controller;
use plantsitter::app::events::AppEvent;
use plantsitter::domain::Domain;
use plantsitter::fsm::StateId;
use plantsitter::fsm::context::IndicatorMode;
use plantsitter::setpoint::SetpointRegister;

use crate::mock_hw::{IndicatorLog, MockIndicator, RecordingSink, last_mode};

fn make(setpoint: i32, min: i32, max: i32) -> (Controller<MockIndicator>, IndicatorLog, RecordingSink) {
    let leds = IndicatorLog::default();
    let reg = Arc::new(SetpointRegister::new(setpoint, min, max).unwrap());
    let mut c = Controller::new(
        Domain::Temperature.profile(),
        reg,
        MockIndicator::new("primary", &leds),
        MockIndicator::new("secondary", &leds),
    );
    let mut sink = RecordingSink::new();
    c.start(&mut sink);
    (c, leds, sink)
}

#[test]
fn warm_room_starts_cooling() {
    let (mut c, leds, mut sink) = make(72, 60, 95);
    c.evaluate(75.0, &mut sink);
    assert_eq!(c.state(), StateId::Secondary);
    assert_eq!(last_mode(&leds, "secondary"), IndicatorMode::Pulsing);
    assert_eq!(last_mode(&leds, "primary"), IndicatorMode::Off);
}

#[test]
fn alternating_readings_flip_every_evaluation() {
    let (mut c, _, mut sink) = make(72, 60, 95);
    c.evaluate(75.0, &mut sink);
    let mut states = Vec::new();
    for reading in [71.0, 73.0, 71.0, 73.0] {
        c.evaluate(reading, &mut sink);
        states.push(c.state());
    }
    assert_eq!(
        states,
        [
            StateId::Primary,
            StateId::Secondary,
            StateId::Primary,
            StateId::Secondary
        ]
    );
    assert_eq!(
        sink.count(|e| matches!(e, AppEvent::StateChanged { .. })),
        5
    );
}

#[test]
fn decrements_stop_at_minimum() {
    let reg = SetpointRegister::new(60, 60, 95).unwrap();
    for _ in 0..50 {
        reg.decrement();
    }
    assert_eq!(reg.get(), 60);
}

#[test]
fn unchanged_inputs_do_not_repeat_actions() {
    let (mut c, leds, mut sink) = make(72, 60, 95);
    c.evaluate(68.0, &mut sink);
    let writes = leds.lock().len();
    let events = sink.events.lock().len();
    for _ in 0..5 {
        assert!(c.evaluate(68.0, &mut sink).is_none());
    }
    assert_eq!(leds.lock().len(), writes);
    assert_eq!(sink.events.lock().len(), events);
}

#[test]
fn readings_never_return_to_off() {
    let (mut c, _, mut sink) = make(72, 60, 95);
    for reading in [80.0, 72.0, 60.0, 72.5, 90.0, 72.0] {
        c.evaluate(reading, &mut sink);
        if c.evaluations() > 0 {
            assert_ne!(c.state(), StateId::Off);
        }
    }
}
