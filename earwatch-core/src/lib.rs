//! earwatch-core: shared types for the EarWatch acoustic node
//!
//! Provides:
//! - Audio format constants and the fixed-size `SampleBlock`
//! - Verdict tokens returned by the external classifier
//! - Monotonic millisecond clocks (real and manually driven)

pub mod audio;
pub mod clock;
pub mod error;
pub mod verdict;

pub use audio::{
    AudioFormat, SampleBlock, BITS_PER_SAMPLE, BLOCK_BYTES, BYTES_PER_SAMPLE, CHANNELS,
    RECORD_SECONDS, SAMPLES_PER_BLOCK, SAMPLE_RATE,
};
pub use clock::{Clock, ManualClock, MonotonicClock};
pub use error::{Error, Result};
pub use verdict::Verdict;
