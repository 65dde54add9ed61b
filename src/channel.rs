//! Control channel
//!
//! Binds one temperature source, one curve, and one actuator into a
//! repeating sample → map → write loop. Duty-write failures are reported
//! and the loop keeps going; sampling failures propagate to the caller,
//! which decides whether they are process-fatal.

use std::time::Duration;

use tracing::{debug, info, warn};

use crate::actuator::PwmActuator;
use crate::curve::FanCurve;
use crate::error::Result;
use crate::source::TemperatureSource;

/// Channel lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelState {
    Idle,
    Running,
    Stopped,
}

/// One hardware control channel. Constructed once at startup and never
/// reconfigured afterwards.
pub struct ControlChannel<S> {
    name: &'static str,
    source: S,
    curve: FanCurve,
    actuator: PwmActuator,
    /// Sleep between iterations; `None` when the source paces the loop
    /// itself (streamed telemetry).
    interval: Option<Duration>,
    state: ChannelState,
}

impl<S: TemperatureSource> ControlChannel<S> {
    pub fn new(
        name: &'static str,
        source: S,
        curve: FanCurve,
        actuator: PwmActuator,
        interval: Option<Duration>,
    ) -> Self {
        Self {
            name,
            source,
            curve,
            actuator,
            interval,
            state: ChannelState::Idle,
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn state(&self) -> ChannelState {
        self.state
    }

    /// Run the control loop until the source is exhausted or a sampling
    /// error occurs. The channel ends in `Stopped` on every exit path.
    pub async fn run(&mut self) -> Result<()> {
        self.state = ChannelState::Running;
        info!(channel = self.name, "control channel running");
        let result = self.drive().await;
        self.state = ChannelState::Stopped;
        match &result {
            Ok(()) => info!(channel = self.name, "control channel stopped"),
            Err(e) => warn!(channel = self.name, error = %e, "control channel failed"),
        }
        result
    }

    async fn drive(&mut self) -> Result<()> {
        loop {
            let temp = match self.source.next_reading().await? {
                Some(t) => t,
                None => {
                    info!(channel = self.name, "temperature stream exhausted");
                    return Ok(());
                }
            };

            let duty = self.curve.duty_for(temp);
            debug!(channel = self.name, temp_c = temp, duty, "sampled");

            // A failed duty write must not take down the loop: the next
            // iteration may succeed, and the other channel keeps running.
            if let Err(e) = self.actuator.write_duty(duty) {
                warn!(channel = self.name, error = %e, "duty write failed, continuing");
            }

            if let Some(interval) = self.interval {
                tokio::time::sleep(interval).await;
            }
        }
    }
}
