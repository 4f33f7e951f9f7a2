//! Alarm configuration

use crate::outputs::Rgb;
use serde::{Deserialize, Serialize};

/// Alert timing and indicator configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AlarmConfig {
    /// How long an alert pulses the actuators, in milliseconds
    pub alert_duration_ms: u64,

    /// Pulse period in milliseconds
    pub pulse_period_ms: u64,

    /// On-time at the start of each pulse period, in milliseconds
    pub pulse_on_ms: u64,

    /// Indicator brightness set at bring-up (0-255)
    pub brightness: u8,

    /// Indicator colour while an alert is active
    pub alert_color: Rgb,

    /// Indicator colour otherwise
    pub normal_color: Rgb,
}

impl Default for AlarmConfig {
    fn default() -> Self {
        Self {
            alert_duration_ms: 5000,
            pulse_period_ms: 200,
            pulse_on_ms: 100,
            brightness: 50,
            alert_color: Rgb::RED,
            normal_color: Rgb::GREEN,
        }
    }
}

impl AlarmConfig {
    /// Validate alarm configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.alert_duration_ms == 0 {
            return Err("Alert duration must be greater than 0".to_string());
        }

        if self.alert_duration_ms > 600_000 {
            return Err("Alert duration too large (max 600000 ms)".to_string());
        }

        if self.pulse_period_ms == 0 {
            return Err("Pulse period must be greater than 0".to_string());
        }

        if self.pulse_on_ms == 0 || self.pulse_on_ms > self.pulse_period_ms {
            return Err(format!(
                "Pulse on-time must be between 1 and the pulse period ({} ms)",
                self.pulse_period_ms
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_alarm_config_default() {
        let config = AlarmConfig::default();
        assert_eq!(config.alert_duration_ms, 5000);
        assert_eq!(config.pulse_period_ms, 200);
        assert_eq!(config.pulse_on_ms, 100);
        assert_eq!(config.brightness, 50);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_alarm_config_validation() {
        let mut config = AlarmConfig::default();

        config.alert_duration_ms = 0;
        assert!(config.validate().is_err());

        config.alert_duration_ms = 5000;
        config.pulse_on_ms = 300;
        assert!(config.validate().is_err());

        config.pulse_on_ms = 200;
        assert!(config.validate().is_ok());

        config.pulse_period_ms = 0;
        assert!(config.validate().is_err());
    }
}
