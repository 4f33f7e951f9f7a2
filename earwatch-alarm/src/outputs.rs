//! Actuator capabilities
//!
//! The alarm drives two on/off outputs (LED and vibration motor) and one
//! addressable RGB indicator. All of them are write-only from the node's
//! point of view.

use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::{debug, trace};

/// 8-bit RGB colour, `[r, g, b]` in config files
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rgb(pub u8, pub u8, pub u8);

impl Rgb {
    pub const RED: Rgb = Rgb(255, 0, 0);
    pub const GREEN: Rgb = Rgb(0, 255, 0);
}

impl fmt::Display for Rgb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:02x}{:02x}{:02x}", self.0, self.1, self.2)
    }
}

/// Binary output pin
pub trait DigitalOutput {
    fn set(&mut self, on: bool);
}

/// Single addressable RGB pixel
pub trait RgbIndicator {
    fn set_brightness(&mut self, level: u8);

    /// Stage a colour; takes effect on `show`
    fn set_color(&mut self, color: Rgb);

    fn show(&mut self);
}

/// Every actuator the alarm drives
pub struct AlarmOutputs {
    pub led: Box<dyn DigitalOutput>,
    pub motor: Box<dyn DigitalOutput>,
    pub indicator: Box<dyn RgbIndicator>,
}

impl AlarmOutputs {
    pub fn new(
        led: Box<dyn DigitalOutput>,
        motor: Box<dyn DigitalOutput>,
        indicator: Box<dyn RgbIndicator>,
    ) -> Self {
        Self {
            led,
            motor,
            indicator,
        }
    }

    /// Outputs that only report their changes through `tracing`
    pub fn traced() -> Self {
        Self::new(
            Box::new(TracedOutput::new("alarm-led")),
            Box::new(TracedOutput::new("alarm-motor")),
            Box::new(TracedIndicator::default()),
        )
    }

    /// Drive LED and motor together
    pub fn set_actuators(&mut self, on: bool) {
        self.led.set(on);
        self.motor.set(on);
    }

    /// Stage and latch an indicator colour
    pub fn show_color(&mut self, color: Rgb) {
        self.indicator.set_color(color);
        self.indicator.show();
    }
}

/// Host stand-in for a GPIO pin
#[derive(Debug)]
pub struct TracedOutput {
    name: String,
    level: Option<bool>,
}

impl TracedOutput {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            level: None,
        }
    }

    pub fn level(&self) -> Option<bool> {
        self.level
    }
}

impl DigitalOutput for TracedOutput {
    fn set(&mut self, on: bool) {
        if self.level != Some(on) {
            trace!("{} -> {}", self.name, if on { "on" } else { "off" });
            self.level = Some(on);
        }
    }
}

/// Host stand-in for the RGB pixel
#[derive(Debug, Default)]
pub struct TracedIndicator {
    staged: Option<Rgb>,
    shown: Option<Rgb>,
    brightness: u8,
}

impl TracedIndicator {
    pub fn shown(&self) -> Option<Rgb> {
        self.shown
    }

    pub fn brightness(&self) -> u8 {
        self.brightness
    }
}

impl RgbIndicator for TracedIndicator {
    fn set_brightness(&mut self, level: u8) {
        self.brightness = level;
        debug!("Indicator brightness {}", level);
    }

    fn set_color(&mut self, color: Rgb) {
        self.staged = Some(color);
    }

    fn show(&mut self) {
        if self.staged != self.shown {
            if let Some(color) = self.staged {
                debug!("Indicator {}", color);
            }
            self.shown = self.staged;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_traced_output_tracks_level() {
        let mut out = TracedOutput::new("pin");
        assert_eq!(out.level(), None);
        out.set(true);
        out.set(true);
        assert_eq!(out.level(), Some(true));
        out.set(false);
        assert_eq!(out.level(), Some(false));
    }

    #[test]
    fn test_indicator_latches_on_show() {
        let mut indicator = TracedIndicator::default();
        indicator.set_color(Rgb::RED);
        assert_eq!(indicator.shown(), None);
        indicator.show();
        assert_eq!(indicator.shown(), Some(Rgb::RED));
    }

    #[test]
    fn test_rgb_display() {
        assert_eq!(Rgb::GREEN.to_string(), "#00ff00");
    }
}
