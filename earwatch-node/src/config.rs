//! Node configuration
//!
//! One TOML file with an optional section per subsystem. Missing sections
//! and missing keys fall back to the defaults the node was designed around.

use crate::error::NodeError;
use earwatch_alarm::AlarmConfig;
use earwatch_sc::CaptureConfig;
use earwatch_wire::ChannelConfig;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Super-loop timing
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SchedulerConfig {
    /// Pause after every tick, in milliseconds
    pub tick_delay_ms: u64,

    /// Minimum time between capture cycles, in milliseconds
    pub capture_interval_ms: u64,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            tick_delay_ms: 100,
            capture_interval_ms: 4000,
        }
    }
}

impl SchedulerConfig {
    pub fn validate(&self) -> Result<(), String> {
        if self.tick_delay_ms == 0 || self.tick_delay_ms > 10_000 {
            return Err("Tick delay must be between 1 and 10000 ms".to_string());
        }

        if self.capture_interval_ms == 0 {
            return Err("Capture interval must be greater than 0".to_string());
        }

        if self.capture_interval_ms > 3_600_000 {
            return Err("Capture interval too large (max 1 hour)".to_string());
        }

        Ok(())
    }
}

/// Complete node configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NodeConfig {
    pub audio: CaptureConfig,
    pub alarm: AlarmConfig,
    pub scheduler: SchedulerConfig,
    pub channel: ChannelConfig,
}

impl NodeConfig {
    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, NodeError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| {
            NodeError::Config(format!("Failed to read {}: {}", path.display(), e))
        })?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self, NodeError> {
        toml::from_str(content).map_err(|e| NodeError::Config(e.to_string()))
    }

    pub fn to_toml_string(&self) -> Result<String, NodeError> {
        toml::to_string_pretty(self).map_err(|e| NodeError::Config(e.to_string()))
    }

    /// Validate every section
    pub fn validate(&self) -> Result<(), String> {
        self.audio.validate().map_err(|e| format!("[audio] {}", e))?;
        self.alarm.validate().map_err(|e| format!("[alarm] {}", e))?;
        self.scheduler
            .validate()
            .map_err(|e| format!("[scheduler] {}", e))?;
        self.channel.validate().map_err(|e| format!("[channel] {}", e))?;
        Ok(())
    }
}
