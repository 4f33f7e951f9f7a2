//! Frame codec for the outbound audio direction
//!
//! A frame is self-delimited:
//!
//! ```text
//! "WAV_START" | u32 LE length | 44-byte WAV header | PCM payload | "WAV_END"
//! ```
//!
//! The length field counts the WAV header plus the payload. There is no
//! checksum; receivers validate frames with `FrameDecoder`.

use crate::error::WireError;
use bytes::Bytes;
use earwatch_core::AudioFormat;

/// Magic bytes opening every frame
pub const MAGIC_PREFIX: &[u8; 9] = b"WAV_START";

/// Magic bytes closing every frame
pub const MAGIC_SUFFIX: &[u8; 7] = b"WAV_END";

/// Size of the little-endian length field after the prefix
pub const LENGTH_FIELD_LEN: usize = 4;

/// Size of the canonical RIFF/WAVE header
pub const WAV_HEADER_LEN: usize = 44;

const PCM_FORMAT_TAG: u16 = 1;
const FMT_CHUNK_LEN: u32 = 16;

/// Largest payload whose WAV length still fits the u32 length field
const MAX_PAYLOAD_LEN: usize = u32::MAX as usize - WAV_HEADER_LEN;

/// Total on-wire size of a frame carrying `payload_len` PCM bytes
pub const fn frame_len(payload_len: usize) -> usize {
    MAGIC_PREFIX.len() + LENGTH_FIELD_LEN + WAV_HEADER_LEN + payload_len + MAGIC_SUFFIX.len()
}

/// Fields of a canonical 44-byte PCM WAV header
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WavHeader {
    /// RIFF chunk size (payload + 36)
    pub riff_len: u32,
    /// `fmt ` sub-chunk size (16 for PCM)
    pub fmt_len: u32,
    /// Format tag (1 = PCM)
    pub audio_format: u16,
    pub channels: u16,
    pub sample_rate: u32,
    pub byte_rate: u32,
    pub block_align: u16,
    pub bits_per_sample: u16,
    /// `data` sub-chunk size in bytes
    pub data_len: u32,
}

impl WavHeader {
    /// Header describing `payload_len` bytes of `format` PCM
    pub fn for_payload(format: AudioFormat, payload_len: u32) -> Self {
        Self {
            riff_len: payload_len.saturating_add(36),
            fmt_len: FMT_CHUNK_LEN,
            audio_format: PCM_FORMAT_TAG,
            channels: format.channels,
            sample_rate: format.sample_rate,
            byte_rate: format.byte_rate(),
            block_align: format.block_align(),
            bits_per_sample: format.bits_per_sample,
            data_len: payload_len,
        }
    }

    /// Serialize with every numeric field little-endian
    pub fn to_bytes(&self) -> [u8; WAV_HEADER_LEN] {
        let mut h = [0u8; WAV_HEADER_LEN];
        h[0..4].copy_from_slice(b"RIFF");
        h[4..8].copy_from_slice(&self.riff_len.to_le_bytes());
        h[8..12].copy_from_slice(b"WAVE");
        h[12..16].copy_from_slice(b"fmt ");
        h[16..20].copy_from_slice(&self.fmt_len.to_le_bytes());
        h[20..22].copy_from_slice(&self.audio_format.to_le_bytes());
        h[22..24].copy_from_slice(&self.channels.to_le_bytes());
        h[24..28].copy_from_slice(&self.sample_rate.to_le_bytes());
        h[28..32].copy_from_slice(&self.byte_rate.to_le_bytes());
        h[32..34].copy_from_slice(&self.block_align.to_le_bytes());
        h[34..36].copy_from_slice(&self.bits_per_sample.to_le_bytes());
        h[36..40].copy_from_slice(b"data");
        h[40..44].copy_from_slice(&self.data_len.to_le_bytes());
        h
    }

    /// Reinterpret the first 44 bytes of `bytes` as a PCM WAV header
    pub fn parse(bytes: &[u8]) -> Result<Self, WireError> {
        if bytes.len() < WAV_HEADER_LEN {
            return Err(WireError::InvalidHeader(format!(
                "need {} bytes, got {}",
                WAV_HEADER_LEN,
                bytes.len()
            )));
        }

        for (offset, tag) in [(0, b"RIFF"), (8, b"WAVE"), (12, b"fmt "), (36, b"data")] {
            if &bytes[offset..offset + 4] != tag {
                return Err(WireError::InvalidHeader(format!(
                    "expected {:?} at offset {}",
                    String::from_utf8_lossy(tag),
                    offset
                )));
            }
        }

        let header = Self {
            riff_len: u32_at(bytes, 4),
            fmt_len: u32_at(bytes, 16),
            audio_format: u16_at(bytes, 20),
            channels: u16_at(bytes, 22),
            sample_rate: u32_at(bytes, 24),
            byte_rate: u32_at(bytes, 28),
            block_align: u16_at(bytes, 32),
            bits_per_sample: u16_at(bytes, 34),
            data_len: u32_at(bytes, 40),
        };

        if header.fmt_len != FMT_CHUNK_LEN || header.audio_format != PCM_FORMAT_TAG {
            return Err(WireError::InvalidHeader(format!(
                "not a plain PCM header (fmt size {}, format tag {})",
                header.fmt_len, header.audio_format
            )));
        }

        Ok(header)
    }

    /// Stream format described by the header
    pub fn format(&self) -> AudioFormat {
        AudioFormat {
            sample_rate: self.sample_rate,
            bits_per_sample: self.bits_per_sample,
            channels: self.channels,
        }
    }

    /// Number of interleaved sample frames in the data chunk
    pub fn sample_frames(&self) -> u32 {
        if self.block_align == 0 {
            return 0;
        }
        self.data_len / self.block_align as u32
    }
}

fn u16_at(bytes: &[u8], offset: usize) -> u16 {
    u16::from_le_bytes([bytes[offset], bytes[offset + 1]])
}

fn u32_at(bytes: &[u8], offset: usize) -> u32 {
    u32::from_le_bytes([
        bytes[offset],
        bytes[offset + 1],
        bytes[offset + 2],
        bytes[offset + 3],
    ])
}

/// One encoded frame, ready to be written to the channel
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WireFrame {
    bytes: Bytes,
}

impl WireFrame {
    /// Complete on-wire bytes, prefix to suffix
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Value of the length field (WAV header + payload)
    pub fn declared_len(&self) -> u32 {
        u32_at(&self.bytes, MAGIC_PREFIX.len())
    }

    /// The embedded WAV file (header followed by payload)
    pub fn wav_bytes(&self) -> &[u8] {
        let start = MAGIC_PREFIX.len() + LENGTH_FIELD_LEN;
        &self.bytes[start..self.bytes.len() - MAGIC_SUFFIX.len()]
    }

    /// Parsed WAV header
    pub fn header(&self) -> Result<WavHeader, WireError> {
        WavHeader::parse(self.wav_bytes())
    }

}

/// Stateless frame builder for one audio format
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameCodec {
    format: AudioFormat,
    max_payload: usize,
}

impl FrameCodec {
    pub fn new(format: AudioFormat) -> Self {
        Self {
            format,
            max_payload: MAX_PAYLOAD_LEN,
        }
    }

    /// Refuse payloads longer than `max_payload` bytes
    pub fn with_max_payload(mut self, max_payload: usize) -> Self {
        self.max_payload = max_payload.min(MAX_PAYLOAD_LEN);
        self
    }

    pub fn format(&self) -> AudioFormat {
        self.format
    }

    /// Frame raw PCM bytes
    pub fn encode(&self, payload: &[u8]) -> Result<WireFrame, WireError> {
        self.encode_with(payload.len(), |out| out.extend_from_slice(payload))
    }

    /// Frame 16-bit samples, serialized little-endian straight into the
    /// output buffer
    pub fn encode_samples(&self, samples: &[i16]) -> Result<WireFrame, WireError> {
        let payload_len = samples
            .len()
            .checked_mul(2)
            .ok_or(WireError::PayloadTooLarge(usize::MAX))?;
        self.encode_with(payload_len, |out| {
            for sample in samples {
                out.extend_from_slice(&sample.to_le_bytes());
            }
        })
    }

    fn encode_with<F>(&self, payload_len: usize, write_payload: F) -> Result<WireFrame, WireError>
    where
        F: FnOnce(&mut Vec<u8>),
    {
        if payload_len > self.max_payload {
            return Err(WireError::PayloadTooLarge(payload_len));
        }

        let total = frame_len(payload_len);
        let mut out = Vec::new();
        out.try_reserve_exact(total)
            .map_err(|_| WireError::AllocationFailed(total))?;

        let wav_len = (WAV_HEADER_LEN + payload_len) as u32;
        out.extend_from_slice(MAGIC_PREFIX);
        out.extend_from_slice(&wav_len.to_le_bytes());
        out.extend_from_slice(&WavHeader::for_payload(self.format, payload_len as u32).to_bytes());
        write_payload(&mut out);
        out.extend_from_slice(MAGIC_SUFFIX);
        debug_assert_eq!(out.len(), total);

        Ok(WireFrame {
            bytes: Bytes::from(out),
        })
    }
}

impl Default for FrameCodec {
    fn default() -> Self {
        Self::new(AudioFormat::NODE)
    }
}
