//! Lifecycle supervision
//!
//! Owns the manual-control period: flips both PWM channels to manual before
//! any loop starts, runs the CPU channel on the main task and the GPU
//! channel on a background task, and restores automatic control exactly
//! once on every exit path - normal stop, fatal channel error, SIGINT, or
//! SIGTERM. A Drop backstop covers panic unwinding.

use std::sync::atomic::{AtomicBool, Ordering};

use tokio::signal::unix::{signal, SignalKind};
use tracing::{error, info, warn};

use crate::actuator::{PwmActuator, PwmMode};
use crate::channel::ControlChannel;
use crate::error::Result;
use crate::source::{PolledSensor, TelemetryStream};

/// Scoped ownership of the fans' manual-mode period.
///
/// `engage` flips every actuator to manual, rolling back on partial
/// failure. `release` flips them back to automatic at most once, and keeps
/// going past individual failures so one stuck channel cannot block the
/// restoration of the others.
pub struct ModeGuard {
    actuators: Vec<PwmActuator>,
    released: AtomicBool,
}

impl ModeGuard {
    pub fn new(actuators: Vec<PwmActuator>) -> Self {
        Self {
            actuators,
            // Nothing to release until engage() succeeds
            released: AtomicBool::new(true),
        }
    }

    /// Take manual control of every channel, or none of them.
    pub fn engage(&self) -> Result<()> {
        for (i, actuator) in self.actuators.iter().enumerate() {
            if let Err(e) = actuator.set_mode(PwmMode::Manual) {
                for engaged in &self.actuators[..i] {
                    if let Err(re) = engaged.set_mode(PwmMode::Automatic) {
                        error!(channel = engaged.label(), error = %re,
                               "rollback to automatic control failed");
                    }
                }
                return Err(e);
            }
        }
        self.released.store(false, Ordering::SeqCst);
        info!(
            channels = self.actuators.len(),
            "took manual fan control (enable=1)"
        );
        Ok(())
    }

    /// Restore automatic control, exactly once, best-effort per actuator
    pub fn release(&self) {
        if self.released.swap(true, Ordering::SeqCst) {
            return;
        }
        for actuator in &self.actuators {
            match actuator.set_mode(PwmMode::Automatic) {
                Ok(()) => info!(
                    channel = actuator.label(),
                    "restored automatic fan control (enable=2)"
                ),
                Err(e) => error!(channel = actuator.label(), error = %e,
                                 "failed to restore automatic fan control"),
            }
        }
    }
}

impl Drop for ModeGuard {
    fn drop(&mut self) {
        self.release();
    }
}

/// Orchestrates both control channels for the lifetime of the process
pub struct Supervisor {
    cpu: ControlChannel<PolledSensor>,
    gpu: ControlChannel<TelemetryStream>,
    guard: ModeGuard,
}

impl Supervisor {
    pub fn new(
        cpu: ControlChannel<PolledSensor>,
        gpu: ControlChannel<TelemetryStream>,
        guard: ModeGuard,
    ) -> Self {
        Self { cpu, gpu, guard }
    }

    /// Run until the CPU loop fails or a termination signal arrives.
    ///
    /// The GPU channel runs concurrently; its errors and its stream ending
    /// are isolated to that channel. Automatic control is restored before
    /// this returns, whichever path ended the run.
    pub async fn run(self) -> Result<()> {
        let Self {
            mut cpu,
            gpu,
            guard,
        } = self;

        guard.engage()?;

        let gpu_task = tokio::spawn(run_gpu(gpu));

        let outcome = tokio::select! {
            result = cpu.run() => result,
            _ = termination_signal() => {
                info!("termination signal received, shutting down");
                Ok(())
            }
        };

        // Daemon-like background unit: a reporter that refuses to die must
        // not hold up process exit.
        gpu_task.abort();
        guard.release();
        outcome
    }
}

async fn run_gpu(mut channel: ControlChannel<TelemetryStream>) {
    // Stream exhaustion stops this channel only; errors are likewise
    // contained here and never propagate to the CPU loop.
    let name = channel.name();
    if let Err(e) = channel.run().await {
        error!(channel = name, error = %e, "gpu channel terminated with error");
    }
}

/// Completes when SIGINT or SIGTERM is delivered
async fn termination_signal() {
    match (
        signal(SignalKind::interrupt()),
        signal(SignalKind::terminate()),
    ) {
        (Ok(mut interrupt), Ok(mut terminate)) => {
            tokio::select! {
                _ = interrupt.recv() => {}
                _ = terminate.recv() => {}
            }
        }
        _ => {
            warn!("could not install signal handlers; cleanup relies on error paths only");
            std::future::pending::<()>().await;
        }
    }
}
