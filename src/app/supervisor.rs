//! Supervisor: owns the domain loops and the store uploader.
//!
//! ```text
//!                ┌──────────── Supervisor ────────────┐
//!                │  stop: Arc<StopSignal>              │
//!   spawn_loop ──┼─▶ "temperature-loop"  ControlLoop   │
//!   spawn_loop ──┼─▶ "humidity-loop"     ControlLoop   │
//!  spawn_store ──┼─▶ "store-upload"      StoreUploader │
//!                └─────────────────────────────────────┘
//!   shutdown(): request stop → wait ≤ grace → join finished, detach rest
//! ```
//!
//! Failed tasks are reported, never restarted.

use std::sync::Arc;
use std::thread::JoinHandle;

use embassy_time::{Duration, Instant};
use log::{info, warn};

use crate::adapters::shared::Guarded;
use crate::config::SystemConfig;
use crate::domain::Domain;
use crate::error::{Error, Result};
use crate::setpoint::SetpointRegister;
use crate::telemetry::TelemetryReporter;
use crate::telemetry::store::{StoreUploader, UploadStats};

use super::commands::CommandQueue;
use super::control_loop::{Cadence, ControlLoop, LoopReport, Ticker};
use super::controller::Controller;
use super::input::InputHandler;
use super::ports::{
    Clock, DisplayPort, EventSink, IndicatorPort, SensorPort, StoreConnector, Transport,
};
use super::stop::StopSignal;

/// How often `shutdown` polls for finished threads.
const JOIN_POLL: Duration = Duration::from_millis(10);

// ───────────────────────────────────────────────────────────────
// Wiring helpers
// ───────────────────────────────────────────────────────────────

/// The shared state of one domain: its setpoint and its command queue.
/// Input adapters hold [`input`](Self::input); the loop holds the rest.
pub struct DomainHandles {
    pub domain: Domain,
    pub setpoint: Arc<SetpointRegister>,
    pub commands: Arc<CommandQueue>,
    pub input: InputHandler,
}

/// The collaborators a control loop drives.
pub struct LoopIo<S, I, D, T, K, E> {
    pub sensor: Arc<Guarded<S>>,
    pub primary: I,
    pub secondary: I,
    pub display: D,
    pub serial: Arc<Guarded<T>>,
    pub clock: K,
    pub sink: E,
}

// ───────────────────────────────────────────────────────────────
// Shutdown report
// ───────────────────────────────────────────────────────────────

/// How a supervised task ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskOutcome {
    Loop(LoopReport),
    Store(UploadStats),
    Panicked,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FinishedTask {
    pub name: String,
    pub outcome: TaskOutcome,
}

/// Result of [`Supervisor::shutdown`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ShutdownReport {
    /// Tasks that exited within the grace period.
    pub finished: Vec<FinishedTask>,
    /// Tasks still running at the deadline; their threads are detached.
    pub left_running: Vec<String>,
}

impl ShutdownReport {
    pub fn is_clean(&self) -> bool {
        self.left_running.is_empty()
            && self
                .finished
                .iter()
                .all(|t| t.outcome != TaskOutcome::Panicked)
    }

    pub fn outcome(&self, name: &str) -> Option<TaskOutcome> {
        self.finished
            .iter()
            .find(|t| t.name == name)
            .map(|t| t.outcome)
    }
}

// ───────────────────────────────────────────────────────────────
// Supervisor
// ───────────────────────────────────────────────────────────────

struct Task {
    name: String,
    handle: JoinHandle<TaskOutcome>,
}

pub struct Supervisor {
    config: SystemConfig,
    stop: Arc<StopSignal>,
    tasks: Vec<Task>,
}

impl Supervisor {
    /// Validate `config` and create an idle supervisor.  Configuration
    /// errors are fatal here and nowhere else.
    pub fn new(config: SystemConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            stop: Arc::new(StopSignal::new()),
            tasks: Vec::new(),
        })
    }

    pub fn config(&self) -> &SystemConfig {
        &self.config
    }

    /// The stop signal every supervised task observes.
    pub fn stop_signal(&self) -> Arc<StopSignal> {
        self.stop.clone()
    }

    /// Setpoint register, command queue and input handler for `domain`.
    pub fn domain_handles(&self, domain: Domain) -> Result<DomainHandles> {
        let dc = self.config.domain(domain);
        let setpoint = Arc::new(SetpointRegister::from_config(dc)?);
        let commands = Arc::new(CommandQueue::new());
        let input = InputHandler::new(
            domain.profile().name,
            setpoint.clone(),
            commands.clone(),
            dc.boost,
        );
        Ok(DomainHandles {
            domain,
            setpoint,
            commands,
            input,
        })
    }

    /// Assemble the control loop for `handles` over `io`.
    pub fn control_loop<S, I, D, T, K, E>(
        &self,
        handles: &DomainHandles,
        io: LoopIo<S, I, D, T, K, E>,
    ) -> ControlLoop<S, I, D, T, K, E>
    where
        S: SensorPort,
        I: IndicatorPort,
        D: DisplayPort,
        T: Transport,
        K: Clock,
        E: EventSink,
    {
        let controller = Controller::new(
            handles.domain.profile(),
            handles.setpoint.clone(),
            io.primary,
            io.secondary,
        );
        ControlLoop::new(
            io.sensor,
            controller,
            handles.commands.clone(),
            io.display,
            TelemetryReporter::new(io.serial),
            io.clock,
            io.sink,
            self.stop.clone(),
            Cadence::from_config(&self.config),
        )
        .verbose(self.config.verbose)
    }

    /// Run `control_loop` on its own named thread.
    pub fn spawn_loop<S, I, D, T, K, E, R>(
        &mut self,
        mut control_loop: ControlLoop<S, I, D, T, K, E>,
        mut ticker: R,
    ) -> Result<()>
    where
        S: SensorPort + Send + 'static,
        I: IndicatorPort + Send + 'static,
        D: DisplayPort + Send + 'static,
        T: Transport + Send + 'static,
        K: Clock + Send + 'static,
        E: EventSink + Send + 'static,
        R: Ticker + Send + 'static,
    {
        let name = format!("{}-loop", control_loop.controller().profile().name);
        let handle = std::thread::Builder::new()
            .name(name.clone())
            .spawn(move || TaskOutcome::Loop(control_loop.run(&mut ticker)))
            .map_err(|_| Error::Config("failed to spawn control loop thread"))?;
        info!("SUPERVISOR: started {}", name);
        self.tasks.push(Task { name, handle });
        Ok(())
    }

    /// Run the store uploader on its own thread.
    pub fn spawn_store<C, S, K>(&mut self, uploader: StoreUploader<C, S, K>) -> Result<()>
    where
        C: StoreConnector + Send + 'static,
        S: SensorPort + Send + 'static,
        K: Clock + Send + 'static,
    {
        let name = String::from("store-upload");
        let handle = std::thread::Builder::new()
            .name(name.clone())
            .spawn(move || TaskOutcome::Store(uploader.run_blocking()))
            .map_err(|_| Error::Config("failed to spawn store thread"))?;
        info!("SUPERVISOR: started {}", name);
        self.tasks.push(Task { name, handle });
        Ok(())
    }

    /// Names of the tasks currently supervised.
    pub fn task_names(&self) -> Vec<&str> {
        self.tasks.iter().map(|t| t.name.as_str()).collect()
    }

    /// `true` once every task has exited on its own.
    pub fn all_finished(&self) -> bool {
        self.tasks.iter().all(|t| t.handle.is_finished())
    }

    /// Request stop, wait up to the configured grace period, and report.
    pub fn shutdown(self) -> ShutdownReport {
        let grace = Duration::from_millis(u64::from(self.config.shutdown_grace_ms));
        self.shutdown_within(grace)
    }

    /// As [`shutdown`](Self::shutdown) with an explicit grace period.
    pub fn shutdown_within(self, grace: Duration) -> ShutdownReport {
        info!("SUPERVISOR: stop requested, waiting up to {} ms", grace.as_millis());
        self.stop.request();

        let deadline = Instant::now() + grace;
        while !self.all_finished() && Instant::now() < deadline {
            embassy_time::block_for(JOIN_POLL);
        }

        let mut report = ShutdownReport::default();
        for task in self.tasks {
            if task.handle.is_finished() {
                let outcome = task.handle.join().unwrap_or(TaskOutcome::Panicked);
                if outcome == TaskOutcome::Panicked {
                    warn!("SUPERVISOR: {} panicked", task.name);
                }
                report.finished.push(FinishedTask {
                    name: task.name,
                    outcome,
                });
            } else {
                warn!("SUPERVISOR: {} still running after grace period", task.name);
                report.left_running.push(task.name);
            }
        }
        info!(
            "SUPERVISOR: {} finished, {} left running",
            report.finished.len(),
            report.left_running.len()
        );
        report
    }
}
