//! Daemon configuration
//!
//! Hardware paths, curve thresholds, and cadences are configuration rather
//! than code. Defaults target the System76 hwmon layout with an NVIDIA
//! telemetry reporter; a JSON file passed via `--config` overrides them.
//! Validation runs before any hardware write so a bad config can never
//! leave a channel stuck in manual mode.

use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::curve::FanCurve;
use crate::error::{ControlError, Result};

/// Top-level daemon configuration
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub cpu: CpuChannelConfig,
    pub gpu: GpuChannelConfig,
}

/// CPU channel: polled sysfs sensor
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CpuChannelConfig {
    /// Millidegree temperature input file
    pub temp_input: PathBuf,
    pub pwm: PathBuf,
    pub pwm_enable: PathBuf,
    /// Seconds between samples
    pub poll_interval_secs: u64,
    pub curve: CurveConfig,
}

/// GPU channel: streamed external telemetry reporter
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GpuChannelConfig {
    /// Reporter argv. The default runs nvidia-smi in loop mode, emitting one
    /// integer °C line every 5 seconds. Too short an interval can keep the
    /// GPU from fully powering down between samples.
    pub reporter: Vec<String>,
    pub pwm: PathBuf,
    pub pwm_enable: PathBuf,
    pub curve: CurveConfig,
}

/// Raw curve bounds as found in the config file
#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CurveConfig {
    pub min_temp_c: f64,
    pub max_temp_c: f64,
    pub min_duty: u8,
    pub max_duty: u8,
}

impl CurveConfig {
    /// Validate the bounds and build the runtime curve
    pub fn build(&self) -> Result<FanCurve> {
        FanCurve::new(self.min_temp_c, self.max_temp_c, self.min_duty, self.max_duty)
    }
}

impl Default for CpuChannelConfig {
    fn default() -> Self {
        Self {
            temp_input: "/sys/devices/platform/system76/hwmon/hwmon1/temp1_input".into(),
            pwm: "/sys/devices/platform/system76/hwmon/hwmon1/pwm1".into(),
            pwm_enable: "/sys/devices/platform/system76/hwmon/hwmon1/pwm1_enable".into(),
            poll_interval_secs: 5,
            curve: CurveConfig {
                min_temp_c: 45.0,
                max_temp_c: 75.0,
                min_duty: 0,
                max_duty: 255,
            },
        }
    }
}

impl Default for GpuChannelConfig {
    fn default() -> Self {
        Self {
            reporter: vec![
                "nvidia-smi".to_string(),
                "--query-gpu=temperature.gpu".to_string(),
                "--format=csv,noheader,nounits".to_string(),
                "-l".to_string(),
                "5".to_string(),
            ],
            pwm: "/sys/devices/platform/system76/hwmon/hwmon1/pwm2".into(),
            pwm_enable: "/sys/devices/platform/system76/hwmon/hwmon1/pwm2_enable".into(),
            curve: CurveConfig {
                min_temp_c: 40.0,
                max_temp_c: 75.0,
                min_duty: 0,
                max_duty: 255,
            },
        }
    }
}

impl Config {
    /// Load configuration from a JSON file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|source| ControlError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&content)
            .map_err(|e| ControlError::config(format!("invalid config {}: {e}", path.display())))
    }

    /// Check curve sanity, the reporter command, and hardware path existence.
    ///
    /// Must succeed before any mode change is made.
    pub fn validate(&self) -> Result<()> {
        self.cpu.curve.build()?;
        self.gpu.curve.build()?;

        if self.cpu.poll_interval_secs == 0 {
            return Err(ControlError::config("cpu poll interval must be at least 1s"));
        }
        if self.gpu.reporter.is_empty() {
            return Err(ControlError::config("gpu reporter command is empty"));
        }

        for (name, path) in [
            ("cpu temp_input", &self.cpu.temp_input),
            ("cpu pwm", &self.cpu.pwm),
            ("cpu pwm_enable", &self.cpu.pwm_enable),
            ("gpu pwm", &self.gpu.pwm),
            ("gpu pwm_enable", &self.gpu.pwm_enable),
        ] {
            if !path.exists() {
                return Err(ControlError::config(format!(
                    "missing hardware path for {name}: {}",
                    path.display()
                )));
            }
        }

        Ok(())
    }
}
