//! Channel configuration

use serde::{Deserialize, Serialize};

/// Serial channel configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChannelConfig {
    /// Serial device path (None = stdin/stdout)
    pub serial_port: Option<String>,

    /// Serial baud rate
    pub baud_rate: u32,

    /// Read timeout of the inbound worker in milliseconds
    pub read_timeout_ms: u64,
}

impl Default for ChannelConfig {
    fn default() -> Self {
        Self {
            serial_port: None,
            baud_rate: 115_200,
            read_timeout_ms: 100,
        }
    }
}

impl ChannelConfig {
    /// Validate channel configuration
    pub fn validate(&self) -> Result<(), String> {
        if let Some(ref port) = self.serial_port {
            if port.is_empty() {
                return Err("Serial port path cannot be empty".to_string());
            }
            if port.contains('\0') {
                return Err("Serial port path contains null byte".to_string());
            }
        }

        if self.baud_rate == 0 {
            return Err("Baud rate must be greater than 0".to_string());
        }

        if self.read_timeout_ms == 0 {
            return Err("Read timeout must be greater than 0".to_string());
        }

        if self.read_timeout_ms > 10_000 {
            return Err("Read timeout too large (max 10000 ms)".to_string());
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_channel_config_default() {
        let config = ChannelConfig::default();
        assert_eq!(config.serial_port, None);
        assert_eq!(config.baud_rate, 115_200);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_channel_config_validation() {
        let mut config = ChannelConfig::default();

        config.serial_port = Some(String::new());
        assert!(config.validate().is_err());

        config.serial_port = Some("/dev/ttyUSB0".to_string());
        assert!(config.validate().is_ok());

        config.baud_rate = 0;
        assert!(config.validate().is_err());

        config.baud_rate = 9600;
        config.read_timeout_ms = 0;
        assert!(config.validate().is_err());
    }
}
