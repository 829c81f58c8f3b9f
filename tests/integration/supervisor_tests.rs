//! Supervisor lifecycle: threads start, stop together, and report.

use std::time::Duration;

use chrono::{Local, TimeZone};

use plantsitter::adapters::clock::FixedClock;
use plantsitter::adapters::memory_store::MemoryStore;
use plantsitter::adapters::shared::Guarded;
use plantsitter::adapters::sim::SimulatedSensor;
use plantsitter::app::control_loop::FixedRateTicker;
use plantsitter::app::events::AppEvent;
use plantsitter::app::supervisor::{LoopIo, Supervisor, TaskOutcome};
use plantsitter::config::SystemConfig;
use plantsitter::domain::Domain;
use plantsitter::telemetry::store::StoreUploader;

use crate::mock_hw::{IndicatorLog, MockDisplay, MockIndicator, MockSerial, RecordingSink};

fn clock() -> FixedClock {
    FixedClock(Local.timestamp_opt(1_700_000_000, 0).unwrap())
}

#[test]
fn shutdown_stops_every_task_within_grace() {
    let config = SystemConfig {
        tick_ms: 2,
        ..SystemConfig::default()
    };
    let mut sup = Supervisor::new(config).unwrap();
    let (sensor, _knobs) = SimulatedSensor::new(22.0, 45.0);
    let sensor = Guarded::new("sensor", sensor);
    let serial = MockSerial::new();
    let serial_port = Guarded::new("serial", serial.clone());
    let leds = IndicatorLog::default();
    let sink = RecordingSink::new();
    let displays = [MockDisplay::new(), MockDisplay::new()];

    for (i, domain) in [Domain::Temperature, Domain::Humidity].into_iter().enumerate() {
        let handles = sup.domain_handles(domain).unwrap();
        let lp = sup.control_loop(
            &handles,
            LoopIo {
                sensor: sensor.clone(),
                primary: MockIndicator::new("primary", &leds),
                secondary: MockIndicator::new("secondary", &leds),
                display: displays[i].clone(),
                serial: serial_port.clone(),
                clock: clock(),
                sink: sink.clone(),
            },
        );
        sup.spawn_loop(lp, FixedRateTicker::new(2)).unwrap();
    }

    let store = MemoryStore::new();
    let uploader = StoreUploader::new(
        store.clone(),
        sensor.clone(),
        clock(),
        Domain::Temperature.profile(),
        sup.config().store.clone(),
        sup.stop_signal(),
    )
    .with_time_unit(Duration::from_millis(1));
    sup.spawn_store(uploader).unwrap();

    assert_eq!(
        sup.task_names(),
        vec!["temperature-loop", "humidity-loop", "store-upload"]
    );

    std::thread::sleep(Duration::from_millis(200));
    let report = sup.shutdown();

    assert!(report.is_clean(), "{report:?}");
    for name in ["temperature-loop", "humidity-loop"] {
        match report.outcome(name) {
            Some(TaskOutcome::Loop(r)) => assert!(r.ticks > 0, "{name} never ticked"),
            other => panic!("{name}: unexpected outcome {other:?}"),
        }
    }
    assert!(matches!(
        report.outcome("store-upload"),
        Some(TaskOutcome::Store(_))
    ));

    for d in &displays {
        assert_eq!(d.state.lock().teardowns, 1);
    }
    assert_eq!(sink.count(|e| matches!(e, AppEvent::Stopped { .. })), 2);
    assert!(!store.records("temperature-data").is_empty());
}

#[test]
fn invalid_config_prevents_startup() {
    let mut config = SystemConfig::default();
    config.humidity.default_setpoint = 150;
    assert!(Supervisor::new(config).is_err());
}
