//! earwatch-wire: the node's single serial channel
//!
//! Provides:
//! - `FrameCodec`: `WAV_START` + length + WAV header + PCM + `WAV_END` frames
//! - Verdict line decoding for the inbound direction
//! - `FrameDecoder`: receiving-side frame extraction with resynchronisation
//! - Channel plumbing: a shared writer that keeps frames and log records
//!   from interleaving, and a worker that hands inbound lines to the loop

pub mod channel;
pub mod codec;
pub mod config;
pub mod decoder;
pub mod error;
pub mod verdict;

pub use channel::{open_channel, ChannelWriter, FrameSink, LineReceiver, LineSource};
pub use codec::{
    frame_len, FrameCodec, WavHeader, WireFrame, LENGTH_FIELD_LEN, MAGIC_PREFIX, MAGIC_SUFFIX,
    WAV_HEADER_LEN,
};
pub use config::ChannelConfig;
pub use decoder::{DecodedEvent, FrameDecoder, ReceivedFrame, DEFAULT_MAX_FRAME_LEN};
pub use error::WireError;
pub use verdict::{decode_line, encode_verdict};
