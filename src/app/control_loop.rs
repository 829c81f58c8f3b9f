//! Fixed-period control loop for one domain.
//!
//! ```text
//!  tick N ─┬─ drain CommandQueue (cycle / boost)
//!          ├─ stop? ──────────────────────────────▶ teardown
//!          ├─ sample sensor (Guarded, converted)
//!          ├─ N % eval_period == 0   ─▶ Controller::evaluate
//!          ├─ refresh indicators (pulse step, retries)
//!          ├─ render DisplayFrame (view alternates every subcycle)
//!          ├─ N % report_period == 0 ─▶ serial frame + Telemetry event
//!          └─ overrun check
//! ```
//!
//! Stop is re-checked before every side-effecting step, so once it is
//! observed no evaluation, render or telemetry happens.  Teardown runs
//! exactly once, from [`ControlLoop::run`] or from `Drop` if the loop is
//! unwound.

use std::sync::Arc;

use embassy_time::{Duration, Instant};
use log::{debug, info};

use crate::adapters::shared::Guarded;
use crate::config::SystemConfig;
use crate::display::{DisplayFrame, FrameInputs, View};
use crate::domain::Quantity;
use crate::error::{Error, OverrunError, SensorError};
use crate::telemetry::TelemetryReporter;

use super::commands::CommandQueue;
use super::controller::Controller;
use super::events::AppEvent;
use super::ports::{Clock, DisplayPort, EventSink, IndicatorPort, SensorPort, Transport};
use super::stop::StopSignal;

// ───────────────────────────────────────────────────────────────
// Tick pacing
// ───────────────────────────────────────────────────────────────

/// Paces the loop between ticks.
pub trait Ticker {
    /// Block until the next tick boundary, or return early once `stop`
    /// is requested.
    fn wait_next(&mut self, stop: &StopSignal);
}

/// Absolute-deadline ticker on the `embassy-time` clock.  A late tick
/// resynchronises instead of bursting to catch up.
pub struct FixedRateTicker {
    period: Duration,
    next: Instant,
}

/// Longest single sleep; bounds how late a stop request is noticed.
const STOP_POLL: Duration = Duration::from_millis(20);

impl FixedRateTicker {
    pub fn new(period_ms: u32) -> Self {
        let period = Duration::from_millis(u64::from(period_ms));
        Self {
            period,
            next: Instant::now() + period,
        }
    }
}

impl Ticker for FixedRateTicker {
    fn wait_next(&mut self, stop: &StopSignal) {
        loop {
            if stop.is_requested() {
                return;
            }
            let now = Instant::now();
            if now >= self.next {
                break;
            }
            embassy_time::block_for((self.next - now).min(STOP_POLL));
        }
        self.next += self.period;
        let now = Instant::now();
        if self.next < now {
            self.next = now + self.period;
        }
    }
}

/// Ticker that never waits.  Drives the loop as fast as it can run.
#[derive(Debug, Default, Clone, Copy)]
pub struct ImmediateTicker;

impl Ticker for ImmediateTicker {
    fn wait_next(&mut self, _stop: &StopSignal) {}
}

// ───────────────────────────────────────────────────────────────
// Loop cadence
// ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cadence {
    pub tick_ms: u32,
    pub eval_period: u64,
    pub report_period: u64,
    pub display_subcycle: u32,
}

impl Cadence {
    pub fn from_config(config: &SystemConfig) -> Self {
        Self {
            tick_ms: config.tick_ms,
            eval_period: u64::from(config.eval_period_ticks),
            report_period: u64::from(config.report_period_ticks),
            display_subcycle: config.display_subcycle_ticks,
        }
    }
}

/// Whether the loop should keep ticking.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    Continue,
    Stopped,
}

/// Counters returned when a loop exits.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoopReport {
    pub ticks: u64,
    pub evaluations: u64,
    pub frames_sent: u64,
    pub faults: u64,
}

// ───────────────────────────────────────────────────────────────
// ControlLoop
// ───────────────────────────────────────────────────────────────

pub struct ControlLoop<S, I, D, T, K, E>
where
    S: SensorPort,
    I: IndicatorPort,
    D: DisplayPort,
    T: Transport,
    K: Clock,
    E: EventSink,
{
    sensor: Arc<Guarded<S>>,
    controller: Controller<I>,
    commands: Arc<CommandQueue>,
    display: D,
    reporter: TelemetryReporter<T>,
    clock: K,
    sink: E,
    stop: Arc<StopSignal>,
    cadence: Cadence,
    verbose: bool,
    tick: u64,
    faults: u64,
    started: bool,
    torn_down: bool,
}

impl<S, I, D, T, K, E> ControlLoop<S, I, D, T, K, E>
where
    S: SensorPort,
    I: IndicatorPort,
    D: DisplayPort,
    T: Transport,
    K: Clock,
    E: EventSink,
{
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        sensor: Arc<Guarded<S>>,
        controller: Controller<I>,
        commands: Arc<CommandQueue>,
        display: D,
        reporter: TelemetryReporter<T>,
        clock: K,
        sink: E,
        stop: Arc<StopSignal>,
        cadence: Cadence,
    ) -> Self {
        Self {
            sensor,
            controller,
            commands,
            display,
            reporter,
            clock,
            sink,
            stop,
            cadence,
            verbose: false,
            tick: 0,
            faults: 0,
            started: false,
            torn_down: false,
        }
    }

    /// Per-tick debug tracing.
    pub fn verbose(mut self, on: bool) -> Self {
        self.verbose = on;
        self
    }

    /// Start the controller.  Called by [`run`](Self::run); tests that
    /// drive [`tick`](Self::tick) by hand call it directly.
    pub fn start(&mut self) {
        if !self.started {
            self.started = true;
            self.controller.start(&mut self.sink);
        }
    }

    /// Tick until stop is requested, then tear down.
    pub fn run(&mut self, ticker: &mut impl Ticker) -> LoopReport {
        self.start();
        info!(
            "{}: loop running ({} ms tick)",
            self.controller.profile().name,
            self.cadence.tick_ms
        );
        while self.tick() == TickOutcome::Continue {
            ticker.wait_next(&self.stop);
        }
        self.teardown();
        self.report()
    }

    /// Execute one tick.
    pub fn tick(&mut self) -> TickOutcome {
        if self.torn_down || self.stop.is_requested() {
            return TickOutcome::Stopped;
        }
        self.start();
        self.tick += 1;
        let tick = self.tick;
        let began = Instant::now();

        while let Ok(cmd) = self.commands.try_receive() {
            self.controller.handle_command(cmd, &mut self.sink);
        }
        let setpoint = self.controller.sync_setpoint(&mut self.sink);

        if self.stop.is_requested() {
            return TickOutcome::Stopped;
        }

        let reading = match self.sample() {
            Ok(r) => {
                self.controller.note_reading(r);
                Some(r)
            }
            Err(e) => {
                self.fault(e);
                None
            }
        };

        if self.verbose {
            debug!(
                "{}: tick {} reading={:?} setpoint={} state={:?}",
                self.controller.profile().name,
                tick,
                reading,
                setpoint,
                self.controller.state()
            );
        }

        if tick % self.cadence.eval_period == 0 {
            if self.stop.is_requested() {
                return TickOutcome::Stopped;
            }
            if let Some(r) = reading {
                self.controller.evaluate(r, &mut self.sink);
            }
        }

        self.controller.refresh_indicators(tick, &mut self.sink);

        if self.stop.is_requested() {
            return TickOutcome::Stopped;
        }
        self.render(tick);

        if tick % self.cadence.report_period == 0 {
            if self.stop.is_requested() {
                return TickOutcome::Stopped;
            }
            if let Some(r) = reading {
                self.report_serial(r);
            }
        }

        let elapsed = began.elapsed().as_millis();
        if elapsed > u64::from(self.cadence.tick_ms) {
            self.fault(Error::Overrun(OverrunError {
                tick,
                elapsed_ms: elapsed,
                period_ms: u64::from(self.cadence.tick_ms),
            }));
        }

        TickOutcome::Continue
    }

    /// Outputs off, panel cleared and released, `Stopped` emitted.
    /// Only the first call has any effect.
    pub fn teardown(&mut self) {
        if self.torn_down {
            return;
        }
        self.torn_down = true;
        let domain = self.controller.profile().name;

        self.controller.all_off(&mut self.sink);
        if let Err(e) = self.display.clear() {
            self.fault(e.into());
        }
        if let Err(e) = self.display.teardown() {
            self.fault(e.into());
        }
        self.sink.emit(&AppEvent::Stopped {
            domain,
            ticks: self.tick,
        });
        info!("{}: loop stopped after {} ticks", domain, self.tick);
    }

    // ── Steps ─────────────────────────────────────────────────

    fn sample(&self) -> Result<f32, Error> {
        let profile = self.controller.profile();
        let raw = match profile.quantity {
            Quantity::TemperatureC => self.sensor.read_temperature()?,
            Quantity::RelativeHumidity => self.sensor.read_humidity()?,
        };
        let value = profile.convert(raw);
        if value.is_finite() {
            Ok(value)
        } else {
            Err(SensorError::OutOfRange.into())
        }
    }

    fn render(&mut self, tick: u64) {
        let inputs = FrameInputs {
            view: View::for_tick(tick, self.cadence.display_subcycle),
            state: self.controller.state(),
            reading: self.controller.last_reading(),
            setpoint: self.controller.setpoint(),
            now: self.clock.now(),
        };
        let frame = DisplayFrame::compose(self.controller.profile(), &inputs);
        if let Err(e) = self.display.render(&frame.line1, &frame.line2) {
            self.fault(e.into());
        }
    }

    fn report_serial(&mut self, reading: f32) {
        let snapshot = self.controller.snapshot(reading, self.clock.epoch_micros());
        match self.reporter.emit_serial(&snapshot) {
            Ok(()) => self.sink.emit(&AppEvent::Telemetry(snapshot)),
            Err(e) => self.fault(e.into()),
        }
    }

    fn fault(&mut self, error: Error) {
        self.faults += 1;
        self.sink.emit(&AppEvent::Fault {
            domain: self.controller.profile().name,
            error,
        });
    }

    // ── Queries ───────────────────────────────────────────────

    pub fn tick_count(&self) -> u64 {
        self.tick
    }

    pub fn controller(&self) -> &Controller<I> {
        &self.controller
    }

    pub fn display(&self) -> &D {
        &self.display
    }

    pub fn sink(&self) -> &E {
        &self.sink
    }

    pub fn is_torn_down(&self) -> bool {
        self.torn_down
    }

    pub fn report(&self) -> LoopReport {
        LoopReport {
            ticks: self.tick,
            evaluations: self.controller.evaluations(),
            frames_sent: self.reporter.frames_sent(),
            faults: self.faults,
        }
    }
}

impl<S, I, D, T, K, E> Drop for ControlLoop<S, I, D, T, K, E>
where
    S: SensorPort,
    I: IndicatorPort,
    D: DisplayPort,
    T: Transport,
    K: Clock,
    E: EventSink,
{
    fn drop(&mut self) {
        self.teardown();
    }
}
