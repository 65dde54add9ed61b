//! fancurved - userspace fan curve control for Linux hwmon PWM channels
//!
//! Drives two independent control channels: a CPU channel that polls a
//! sysfs temperature file, and a GPU channel fed by the line output of a
//! long-lived telemetry reporter. Each channel maps its readings through a
//! clamped linear curve and writes the resulting duty cycle to a PWM
//! control file. Manual fan control is taken for the lifetime of the
//! process and handed back to the platform firmware on any exit path.

pub mod actuator;
pub mod channel;
pub mod config;
pub mod curve;
pub mod error;
pub mod source;
pub mod supervisor;
