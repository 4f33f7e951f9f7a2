//! Error types for earwatch-alarm

use thiserror::Error;

#[derive(Error, Debug)]
pub enum AlarmError {
    #[error("Configuration error: {0}")]
    Config(String),
}
