//! Clamped linear fan curve
//!
//! Pure temperature-to-duty mapping. Readings below the configured floor pin
//! to `min_duty`, readings above the ceiling pin to `max_duty`, and anything
//! in between interpolates linearly. No hysteresis, no smoothing: the duty
//! cycle is an instantaneous function of the current temperature.

use crate::error::{ControlError, Result};

/// Full PWM duty range for standard Linux hwmon (0-255)
const PWM_MAX: f64 = 255.0;

/// An immutable fan curve for one control channel
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FanCurve {
    min_temp: f64,
    max_temp: f64,
    min_duty: u8,
    max_duty: u8,
}

impl FanCurve {
    /// Build a curve, rejecting degenerate temperature bounds up front so
    /// evaluation never divides by zero.
    pub fn new(min_temp: f64, max_temp: f64, min_duty: u8, max_duty: u8) -> Result<Self> {
        if !min_temp.is_finite() || !max_temp.is_finite() {
            return Err(ControlError::config(format!(
                "curve bounds must be finite (got {min_temp}..{max_temp})"
            )));
        }
        if min_temp >= max_temp {
            return Err(ControlError::config(format!(
                "curve min temperature {min_temp}\u{b0}C must be below max temperature {max_temp}\u{b0}C"
            )));
        }
        Ok(Self {
            min_temp,
            max_temp,
            min_duty,
            max_duty,
        })
    }

    /// Map a temperature in °C to a PWM duty cycle.
    ///
    /// The out-of-range branches use strict comparisons, so a reading equal
    /// to either bound takes the interpolation branch. The interpolation
    /// branch scales over the full 0-255 PWM range, truncating toward zero;
    /// the configured duty bounds only apply to the clamp branches.
    pub fn duty_for(&self, temp: f64) -> u8 {
        if temp < self.min_temp {
            self.min_duty
        } else if temp > self.max_temp {
            self.max_duty
        } else {
            let p = (temp - self.min_temp) / (self.max_temp - self.min_temp);
            (p * PWM_MAX) as u8
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn curve() -> FanCurve {
        FanCurve::new(45.0, 75.0, 0, 255).unwrap()
    }

    #[test]
    fn below_min_temp_pins_to_min_duty() {
        let c = FanCurve::new(45.0, 75.0, 40, 255).unwrap();
        assert_eq!(c.duty_for(44.0), 40);
        assert_eq!(c.duty_for(-10.0), 40);
    }

    #[test]
    fn above_max_temp_pins_to_max_duty() {
        let c = FanCurve::new(45.0, 75.0, 0, 200).unwrap();
        assert_eq!(c.duty_for(76.0), 200);
        assert_eq!(c.duty_for(500.0), 200);
    }

    #[test]
    fn midpoint_interpolates_with_truncation() {
        // p = 0.5 -> floor(0.5 * 255) = 127
        assert_eq!(curve().duty_for(60.0), 127);
    }

    #[test]
    fn bounds_take_the_interpolation_branch() {
        assert_eq!(curve().duty_for(45.0), 0);
        assert_eq!(curve().duty_for(75.0), 255);
    }

    #[test]
    fn interpolation_ignores_configured_duty_bounds() {
        // Mid-range duty scales over the full PWM range even when the clamp
        // duties are narrower.
        let c = FanCurve::new(40.0, 80.0, 100, 200).unwrap();
        assert_eq!(c.duty_for(60.0), 127);
        assert_eq!(c.duty_for(39.0), 100);
        assert_eq!(c.duty_for(81.0), 200);
    }

    #[test]
    fn output_stays_in_pwm_range() {
        let c = curve();
        let mut t = -40.0;
        while t < 120.0 {
            let duty = c.duty_for(t);
            assert!(u32::from(duty) <= 255, "duty {duty} out of range at {t}");
            t += 0.37;
        }
    }

    #[test]
    fn degenerate_bounds_are_rejected() {
        assert!(FanCurve::new(75.0, 75.0, 0, 255).is_err());
        assert!(FanCurve::new(80.0, 45.0, 0, 255).is_err());
        assert!(FanCurve::new(f64::NAN, 75.0, 0, 255).is_err());
    }
}
