//! Error types for earwatch-node

use earwatch_alarm::AlarmError;
use earwatch_wire::WireError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum NodeError {
    /// A peripheral could not be brought up; the node cannot run
    #[error("Peripheral initialization failed: {0}")]
    PeripheralInit(String),

    #[error("Channel error: {0}")]
    Channel(#[from] WireError),

    #[error("Alarm error: {0}")]
    Alarm(#[from] AlarmError),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
