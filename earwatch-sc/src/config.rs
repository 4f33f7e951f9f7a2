//! Configuration for audio capture

use serde::{Deserialize, Serialize};

/// Capture cycle configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CaptureConfig {
    /// RMS energy a segment must reach to be transmitted (raw 16-bit units)
    pub energy_threshold: f64,

    /// Upper bound on draining stale samples before a read, in milliseconds
    pub flush_timeout_ms: u64,

    /// Upper bound on filling one block, in milliseconds
    pub read_timeout_ms: u64,

    /// Input device name for live capture (None = default device)
    pub device_name: Option<String>,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            energy_threshold: 50.0,
            flush_timeout_ms: 100,
            read_timeout_ms: 5000,
            device_name: None,
        }
    }
}

impl CaptureConfig {
    /// Validate capture configuration
    pub fn validate(&self) -> Result<(), String> {
        if !self.energy_threshold.is_finite() || self.energy_threshold < 0.0 {
            return Err("Energy threshold must be a finite, non-negative number".to_string());
        }

        if self.energy_threshold > i16::MAX as f64 {
            return Err("Energy threshold above full scale (max 32767)".to_string());
        }

        if self.flush_timeout_ms > 1000 {
            return Err("Flush timeout too large (max 1000 ms)".to_string());
        }

        if self.read_timeout_ms == 0 {
            return Err("Read timeout must be greater than 0".to_string());
        }

        if self.read_timeout_ms > 60_000 {
            return Err("Read timeout too large (max 60000 ms)".to_string());
        }

        if let Some(ref name) = self.device_name {
            if name.is_empty() || name.len() > 256 {
                return Err("Device name must be 1 to 256 characters".to_string());
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_capture_config_default() {
        let config = CaptureConfig::default();
        assert_eq!(config.energy_threshold, 50.0);
        assert_eq!(config.flush_timeout_ms, 100);
        assert_eq!(config.read_timeout_ms, 5000);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_capture_config_validation() {
        let mut config = CaptureConfig::default();

        config.energy_threshold = f64::NAN;
        assert!(config.validate().is_err());

        config.energy_threshold = -1.0;
        assert!(config.validate().is_err());

        config.energy_threshold = 0.0;
        assert!(config.validate().is_ok());

        config.read_timeout_ms = 0;
        assert!(config.validate().is_err());

        config.read_timeout_ms = 5000;
        config.flush_timeout_ms = 5000;
        assert!(config.validate().is_err());

        config.flush_timeout_ms = 0;
        config.device_name = Some(String::new());
        assert!(config.validate().is_err());
    }
}
