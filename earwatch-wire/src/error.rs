//! Error types for earwatch-wire

use thiserror::Error;

/// Framing and channel errors
#[derive(Error, Debug)]
pub enum WireError {
    #[error("Frame buffer allocation failed ({0} bytes)")]
    AllocationFailed(usize),

    #[error("Payload too large for one frame: {0} bytes")]
    PayloadTooLarge(usize),

    #[error("Invalid WAV header: {0}")]
    InvalidHeader(String),

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
