//! PWM actuator
//!
//! Writes duty cycles to a hwmon `pwmN` file and flips the matching
//! `pwmN_enable` file between manual and automatic control.

use std::fs;
use std::path::PathBuf;

use tracing::debug;

use crate::error::{ControlError, Result};

/// Who drives the fan: this daemon (Manual) or the platform firmware
/// (Automatic)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PwmMode {
    Manual,
    Automatic,
}

impl PwmMode {
    /// Sentinel value the hwmon enable file expects
    fn sysfs_value(self) -> &'static str {
        match self {
            PwmMode::Manual => "1",
            PwmMode::Automatic => "2",
        }
    }
}

/// One PWM channel's control files
#[derive(Debug, Clone)]
pub struct PwmActuator {
    label: &'static str,
    pwm_path: PathBuf,
    enable_path: PathBuf,
}

impl PwmActuator {
    pub fn new(label: &'static str, pwm_path: PathBuf, enable_path: PathBuf) -> Self {
        Self {
            label,
            pwm_path,
            enable_path,
        }
    }

    pub fn label(&self) -> &'static str {
        self.label
    }

    /// Scoped open-write-close of the duty cycle as decimal text.
    ///
    /// Failures are reported to the caller but never alter mode state; the
    /// owning channel decides whether to keep looping.
    pub fn write_duty(&self, duty: u8) -> Result<()> {
        fs::write(&self.pwm_path, duty.to_string()).map_err(|source| ControlError::Write {
            path: self.pwm_path.clone(),
            source,
        })?;
        debug!(channel = self.label, duty, "wrote pwm duty");
        Ok(())
    }

    /// Write the mode sentinel to the enable file. Idempotent: the hwmon
    /// interface accepts repeated writes of the same mode.
    pub fn set_mode(&self, mode: PwmMode) -> Result<()> {
        fs::write(&self.enable_path, mode.sysfs_value()).map_err(|source| ControlError::Write {
            path: self.enable_path.clone(),
            source,
        })?;
        debug!(channel = self.label, ?mode, "switched pwm mode");
        Ok(())
    }
}
