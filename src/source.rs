//! Temperature sources
//!
//! Two sampling strategies behind one trait: `PolledSensor` re-reads a
//! sysfs millidegree file on every call, and `TelemetryStream` consumes the
//! continuous line output of a long-lived external reporter process. Both
//! are fail-fast on unreadable or non-numeric content; only the stream can
//! become exhausted.

use std::io;
use std::path::PathBuf;
use std::process::Stdio;

use tokio::io::{AsyncBufReadExt, BufReader, Lines};
use tokio::process::{Child, ChildStdout, Command};
use tracing::{debug, info};

use crate::error::{ControlError, Result};

/// A lazy sequence of temperature readings in °C.
///
/// `Ok(None)` means the source is exhausted and the owning channel should
/// stop; errors are fail-fast and never retried at this layer.
#[allow(async_fn_in_trait)]
pub trait TemperatureSource {
    async fn next_reading(&mut self) -> Result<Option<f64>>;
}

/// Polled sysfs sensor reporting integer millidegrees
#[derive(Debug, Clone)]
pub struct PolledSensor {
    path: PathBuf,
}

impl PolledSensor {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }
}

impl TemperatureSource for PolledSensor {
    async fn next_reading(&mut self) -> Result<Option<f64>> {
        // Sysfs reads are blocking file I/O; keep them off the async executor
        let path = self.path.clone();
        let content = tokio::task::spawn_blocking(move || {
            std::fs::read_to_string(&path).map_err(|source| ControlError::Read { path, source })
        })
        .await
        .map_err(|e| ControlError::Read {
            path: self.path.clone(),
            source: io::Error::new(io::ErrorKind::Other, format!("sensor read task failed: {e}")),
        })??;
        let text = content.trim();
        let millidegrees: i64 = text.parse().map_err(|source| ControlError::Parse {
            origin: self.path.display().to_string(),
            text: text.to_string(),
            source,
        })?;
        Ok(Some(millidegrees as f64 / 1000.0))
    }
}

/// Streaming reporter process emitting one integer °C line per interval.
///
/// The stream is non-restartable: once the reporter exits or closes its
/// stdout, the source is exhausted for good.
pub struct TelemetryStream {
    command: String,
    lines: Lines<BufReader<ChildStdout>>,
    child: Child,
}

impl TelemetryStream {
    /// Spawn the reporter and attach to its stdout. The child is killed when
    /// the stream is dropped, so a reporter that ignores EOF cannot outlive
    /// the daemon.
    pub fn spawn(argv: &[String]) -> Result<Self> {
        let (program, args) = argv
            .split_first()
            .ok_or_else(|| ControlError::config("gpu reporter command is empty"))?;

        let mut child = Command::new(program)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|source| ControlError::Spawn {
                command: program.clone(),
                source,
            })?;

        let stdout = child.stdout.take().ok_or_else(|| {
            ControlError::config(format!("reporter `{program}` stdout was not captured"))
        })?;

        info!(command = %program, "spawned telemetry reporter");
        Ok(Self {
            command: program.clone(),
            lines: BufReader::new(stdout).lines(),
            child,
        })
    }
}

impl TemperatureSource for TelemetryStream {
    async fn next_reading(&mut self) -> Result<Option<f64>> {
        let line = self
            .lines
            .next_line()
            .await
            .map_err(|source| ControlError::StreamRead {
                command: self.command.clone(),
                source,
            })?;

        match line {
            Some(line) => {
                let text = line.trim();
                let degrees: i64 = text.parse().map_err(|source| ControlError::Parse {
                    origin: self.command.clone(),
                    text: text.to_string(),
                    source,
                })?;
                Ok(Some(degrees as f64))
            }
            None => {
                let status = self.child.wait().await.ok();
                debug!(command = %self.command, ?status, "telemetry stream ended");
                Ok(None)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn argv(script: &str) -> Vec<String> {
        vec!["sh".to_string(), "-c".to_string(), script.to_string()]
    }

    #[tokio::test]
    async fn polled_sensor_scales_millidegrees() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("temp1_input");
        fs::write(&path, "54500\n").unwrap();
        let mut sensor = PolledSensor::new(path.clone());
        assert_eq!(sensor.next_reading().await.unwrap(), Some(54.5));

        // Every call re-reads the file
        fs::write(&path, "61000\n").unwrap();
        assert_eq!(sensor.next_reading().await.unwrap(), Some(61.0));
    }

    #[tokio::test]
    async fn polled_sensor_distinguishes_io_and_parse_errors() {
        let dir = TempDir::new().unwrap();
        let mut missing = PolledSensor::new(dir.path().join("gone"));
        assert!(matches!(
            missing.next_reading().await,
            Err(ControlError::Read { .. })
        ));

        let garbled = dir.path().join("temp1_input");
        fs::write(&garbled, "not-a-number\n").unwrap();
        let mut sensor = PolledSensor::new(garbled);
        assert!(matches!(
            sensor.next_reading().await,
            Err(ControlError::Parse { .. })
        ));
    }

    #[tokio::test]
    async fn stream_yields_lines_then_exhausts() {
        let mut stream = TelemetryStream::spawn(&argv("printf '60\\n70\\n'")).unwrap();
        assert_eq!(stream.next_reading().await.unwrap(), Some(60.0));
        assert_eq!(stream.next_reading().await.unwrap(), Some(70.0));
        assert_eq!(stream.next_reading().await.unwrap(), None);
    }

    #[tokio::test]
    async fn stream_tolerates_stray_whitespace() {
        let mut stream = TelemetryStream::spawn(&argv("printf '  65 \\n'")).unwrap();
        assert_eq!(stream.next_reading().await.unwrap(), Some(65.0));
    }

    #[tokio::test]
    async fn malformed_line_is_a_parse_error() {
        let mut stream = TelemetryStream::spawn(&argv("printf 'sixty\\n'")).unwrap();
        assert!(matches!(
            stream.next_reading().await,
            Err(ControlError::Parse { .. })
        ));
    }

    #[tokio::test]
    async fn missing_reporter_is_a_spawn_error() {
        let argv = vec!["fancurved-no-such-reporter".to_string()];
        assert!(matches!(
            TelemetryStream::spawn(&argv),
            Err(ControlError::Spawn { .. })
        ));
    }
}
