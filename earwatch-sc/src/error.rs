//! Error types for earwatch-sc

use thiserror::Error;

/// Microphone and capture errors
#[derive(Error, Debug)]
pub enum AudioError {
    #[error("Audio device error: {0}")]
    Device(String),

    #[error("Audio format error: {0}")]
    Format(String),

    #[error("Audio read timed out after {0} ms")]
    Timeout(u64),

    #[error("Partial read: got {read_bytes} of {expected_bytes} bytes")]
    PartialRead {
        read_bytes: usize,
        expected_bytes: usize,
    },

    #[error("WAV error: {0}")]
    Wav(#[from] hound::Error),
}
