//! fancurved - fan curve daemon
//!
//! Takes manual ownership of the CPU and GPU PWM channels, drives each from
//! its configured temperature curve, and hands control back to the platform
//! firmware on exit. Runs until terminated or until the CPU sensor becomes
//! unreadable.

use std::path::{Path, PathBuf};
use std::time::Duration;

use tracing::{error, info, warn};

use fancurved::actuator::PwmActuator;
use fancurved::channel::ControlChannel;
use fancurved::config::Config;
use fancurved::source::{PolledSensor, TelemetryStream};
use fancurved::supervisor::{ModeGuard, Supervisor};

const VERSION: &str = env!("CARGO_PKG_VERSION");

fn print_help() {
    eprintln!("fancurved {} - fan curve daemon", VERSION);
    eprintln!();
    eprintln!("USAGE:");
    eprintln!("    fancurved [OPTIONS]");
    eprintln!();
    eprintln!("OPTIONS:");
    eprintln!("    -c, --config PATH   Configuration file (JSON)");
    eprintln!("    -v, --version       Print version");
    eprintln!("    -h, --help          Print this help");
    eprintln!();
    eprintln!("ENVIRONMENT:");
    eprintln!("    FANCURVED_LOG       Log level (trace, debug, info, warn, error)");
}

fn print_version() {
    println!("fancurved {}", VERSION);
}

/// Log to the systemd journal when available, stdout otherwise
fn init_logging() {
    let log_level = std::env::var("FANCURVED_LOG").unwrap_or_else(|_| "info".to_string());

    if Path::new("/run/systemd/journal/socket").exists() {
        match tracing_journald::layer() {
            Ok(journald_layer) => {
                use tracing_subscriber::prelude::*;
                tracing_subscriber::registry()
                    .with(journald_layer)
                    .with(tracing_subscriber::EnvFilter::new(&log_level))
                    .init();
                return;
            }
            Err(e) => {
                eprintln!("Failed to create journald layer: {}, falling back to stdout", e);
            }
        }
    }

    tracing_subscriber::fmt()
        .with_target(false)
        .with_level(true)
        .with_env_filter(&log_level)
        .init();
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    let args: Vec<String> = std::env::args().collect();
    let mut config_path: Option<PathBuf> = None;

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "-h" | "--help" => {
                print_help();
                return Ok(());
            }
            "-v" | "--version" => {
                print_version();
                return Ok(());
            }
            "-c" | "--config" => {
                i += 1;
                if i >= args.len() {
                    eprintln!("Error: --config requires a path argument");
                    std::process::exit(1);
                }
                config_path = Some(PathBuf::from(&args[i]));
            }
            arg => {
                eprintln!("Unknown argument: {}", arg);
                print_help();
                std::process::exit(1);
            }
        }
        i += 1;
    }

    init_logging();
    info!("STARTUP: fancurved {} starting", VERSION);

    let config = match &config_path {
        Some(path) => {
            info!("STARTUP: loading config from {}", path.display());
            Config::load(path)?
        }
        None => Config::default(),
    };

    // Everything must check out before the first enable-file write: a bad
    // config must not leave a channel in manual mode without a control loop.
    config.validate()?;

    // SAFETY: geteuid is always safe - it just returns the effective UID.
    if unsafe { libc::geteuid() } != 0 {
        warn!("not running as root - pwm writes will likely be denied");
    }

    let cpu_actuator = PwmActuator::new("cpu", config.cpu.pwm.clone(), config.cpu.pwm_enable.clone());
    let gpu_actuator = PwmActuator::new("gpu", config.gpu.pwm.clone(), config.gpu.pwm_enable.clone());

    let cpu = ControlChannel::new(
        "cpu",
        PolledSensor::new(config.cpu.temp_input.clone()),
        config.cpu.curve.build()?,
        cpu_actuator.clone(),
        Some(Duration::from_secs(config.cpu.poll_interval_secs)),
    );

    // The reporter paces the GPU loop; the channel itself never sleeps
    let gpu = ControlChannel::new(
        "gpu",
        TelemetryStream::spawn(&config.gpu.reporter)?,
        config.gpu.curve.build()?,
        gpu_actuator.clone(),
        None,
    );

    let guard = ModeGuard::new(vec![cpu_actuator, gpu_actuator]);

    info!("STARTUP: pid {}", std::process::id());

    if let Err(e) = Supervisor::new(cpu, gpu, guard).run().await {
        // Automatic control was already restored inside the supervisor
        error!(error = %e, "fatal control error");
        std::process::exit(1);
    }

    info!("SHUTDOWN: fancurved terminated cleanly");
    Ok(())
}
