//! Receiving-side frame extraction
//!
//! The node's outbound stream interleaves diagnostic text with binary
//! frames and has no checksum. `FrameDecoder` scans for `WAV_START`, checks
//! the declared length against the embedded WAV header and the `WAV_END`
//! suffix, and when any of those checks fail drops the candidate and scans
//! forward to the next prefix. Log lines written after a truncated frame
//! survive the drop and are still reported as text.

use crate::codec::{WavHeader, LENGTH_FIELD_LEN, MAGIC_PREFIX, MAGIC_SUFFIX, WAV_HEADER_LEN};
use bytes::{Bytes, BytesMut};
use tracing::debug;

/// Upper bound on a declared frame length (WAV header + payload)
pub const DEFAULT_MAX_FRAME_LEN: usize = 4 * 1024 * 1024;

/// Text without a newline is flushed once it grows past this size
const MAX_TEXT_LINE: usize = 4096;

const BODY_OFFSET: usize = MAGIC_PREFIX.len() + LENGTH_FIELD_LEN;

/// A frame recovered from the stream
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReceivedFrame {
    pub header: WavHeader,
    wav: Bytes,
}

impl ReceivedFrame {
    /// Header and payload, i.e. a complete `.wav` file
    pub fn wav_bytes(&self) -> &[u8] {
        &self.wav
    }

    /// PCM payload
    pub fn payload(&self) -> &[u8] {
        &self.wav[WAV_HEADER_LEN..]
    }

    /// Payload decoded as little-endian 16-bit samples
    pub fn samples(&self) -> Vec<i16> {
        self.payload()
            .chunks_exact(2)
            .map(|pair| i16::from_le_bytes([pair[0], pair[1]]))
            .collect()
    }
}

/// Something recognised in the stream
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DecodedEvent {
    /// A complete, validated frame
    Frame(ReceivedFrame),
    /// A diagnostic line outside any frame (terminator stripped)
    Text(String),
    /// A candidate frame was rejected and `skipped` bytes were dropped
    Resync { skipped: usize, reason: String },
}

enum FrameScan {
    Incomplete,
    Frame(ReceivedFrame),
    Corrupt(String),
}

/// Incremental decoder; feed bytes with `push`, drain with `next_event`
pub struct FrameDecoder {
    buf: BytesMut,
    max_frame_len: usize,
}

impl FrameDecoder {
    pub fn new() -> Self {
        Self::with_max_frame_len(DEFAULT_MAX_FRAME_LEN)
    }

    pub fn with_max_frame_len(max_frame_len: usize) -> Self {
        Self {
            buf: BytesMut::new(),
            max_frame_len: max_frame_len.max(WAV_HEADER_LEN),
        }
    }

    /// Append bytes read from the channel
    pub fn push(&mut self, bytes: &[u8]) {
        self.buf.extend_from_slice(bytes);
    }

    /// Bytes buffered but not yet turned into an event
    pub fn pending_bytes(&self) -> usize {
        self.buf.len()
    }

    /// Next complete event, or `None` if more input is needed
    pub fn next_event(&mut self) -> Option<DecodedEvent> {
        loop {
            let prefix_at = find(&self.buf, MAGIC_PREFIX);
            let text_end = prefix_at.unwrap_or(self.buf.len());

            if let Some(newline) = self.buf[..text_end].iter().position(|&b| b == b'\n') {
                let line = self.buf.split_to(newline + 1);
                let text = lossy_line(&line[..newline]);
                if text.is_empty() {
                    continue;
                }
                return Some(DecodedEvent::Text(text));
            }

            match prefix_at {
                None => {
                    if self.buf.len() <= MAX_TEXT_LINE {
                        return None;
                    }
                    // Keep a tail that could still grow into a prefix
                    let cut = self.buf.len() - (MAGIC_PREFIX.len() - 1);
                    let chunk = self.buf.split_to(cut);
                    return Some(DecodedEvent::Text(lossy_line(&chunk)));
                }
                Some(at) if at > 0 => {
                    let fragment = self.buf.split_to(at);
                    let text = lossy_line(&fragment);
                    if text.trim().is_empty() {
                        continue;
                    }
                    return Some(DecodedEvent::Text(text));
                }
                Some(_) => match self.scan_frame() {
                    FrameScan::Incomplete => return None,
                    FrameScan::Frame(frame) => return Some(DecodedEvent::Frame(frame)),
                    FrameScan::Corrupt(reason) => return Some(self.resync(reason)),
                },
            }
        }
    }

    /// Drain every event currently decodable
    pub fn drain_events(&mut self) -> Vec<DecodedEvent> {
        std::iter::from_fn(|| self.next_event()).collect()
    }

    /// Buffer starts with a prefix; try to cut one frame off it
    fn scan_frame(&mut self) -> FrameScan {
        if self.buf.len() < BODY_OFFSET {
            return FrameScan::Incomplete;
        }

        let mut length = [0u8; LENGTH_FIELD_LEN];
        length.copy_from_slice(&self.buf[MAGIC_PREFIX.len()..BODY_OFFSET]);
        let declared = u32::from_le_bytes(length) as usize;
        if declared < WAV_HEADER_LEN || declared > self.max_frame_len {
            return FrameScan::Corrupt(format!("declared length {} out of range", declared));
        }

        if self.buf.len() < BODY_OFFSET + WAV_HEADER_LEN {
            return FrameScan::Incomplete;
        }
        let header = match WavHeader::parse(&self.buf[BODY_OFFSET..BODY_OFFSET + WAV_HEADER_LEN]) {
            Ok(header) => header,
            Err(e) => return FrameScan::Corrupt(e.to_string()),
        };
        if header.data_len as usize + WAV_HEADER_LEN != declared {
            return FrameScan::Corrupt(format!(
                "length field {} disagrees with data chunk {}",
                declared, header.data_len
            ));
        }

        let total = BODY_OFFSET + declared + MAGIC_SUFFIX.len();
        if self.buf.len() < total {
            return FrameScan::Incomplete;
        }
        if &self.buf[total - MAGIC_SUFFIX.len()..total] != MAGIC_SUFFIX {
            return FrameScan::Corrupt("frame suffix missing".to_string());
        }

        let mut frame = self.buf.split_to(total);
        let _ = frame.split_to(BODY_OFFSET);
        frame.truncate(declared);
        FrameScan::Frame(ReceivedFrame {
            header,
            wav: frame.freeze(),
        })
    }

    /// Drop the rejected candidate up to the next prefix, keeping any text
    /// that trails the last binary byte so it still comes out as lines
    fn resync(&mut self, reason: String) -> DecodedEvent {
        let region = match find(&self.buf[1..], MAGIC_PREFIX) {
            Some(offset) => offset + 1,
            None => MAGIC_PREFIX.len().min(self.buf.len()),
        };
        let skipped = trailing_text_start(&self.buf[..region])
            .clamp(MAGIC_PREFIX.len().min(region), region);
        let _ = self.buf.split_to(skipped);
        debug!("Frame decoder resync: dropped {} bytes ({})", skipped, reason);
        DecodedEvent::Resync { skipped, reason }
    }
}

impl Default for FrameDecoder {
    fn default() -> Self {
        Self::new()
    }
}

fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    if haystack.len() < needle.len() {
        return None;
    }
    haystack.windows(needle.len()).position(|window| window == needle)
}

fn is_text_byte(byte: u8) -> bool {
    matches!(byte, b'\t' | b'\n' | b'\r' | 0x20..=0x7e)
}

/// Offset where the run of printable bytes at the end of `region` begins,
/// past a suffix left over from the rejected frame
fn trailing_text_start(region: &[u8]) -> usize {
    let start = region
        .iter()
        .rposition(|&b| !is_text_byte(b))
        .map_or(0, |at| at + 1);
    if region[start..].starts_with(MAGIC_SUFFIX) {
        start + MAGIC_SUFFIX.len()
    } else {
        start
    }
}

fn lossy_line(bytes: &[u8]) -> String {
    String::from_utf8_lossy(bytes)
        .trim_end_matches('\r')
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::FrameCodec;

    #[test]
    fn test_text_lines_pass_through() {
        let mut decoder = FrameDecoder::new();
        decoder.push(b"recording 4 s\r\nenergy 12.5\n");
        assert_eq!(
            decoder.drain_events(),
            vec![
                DecodedEvent::Text("recording 4 s".to_string()),
                DecodedEvent::Text("energy 12.5".to_string()),
            ]
        );
    }

    #[test]
    fn test_partial_line_waits_for_newline() {
        let mut decoder = FrameDecoder::new();
        decoder.push(b"half a li");
        assert_eq!(decoder.next_event(), None);
        decoder.push(b"ne\n");
        assert_eq!(decoder.next_event(), Some(DecodedEvent::Text("half a line".to_string())));
    }

    #[test]
    fn test_frame_split_across_pushes() {
        let frame = FrameCodec::default().encode_samples(&[1, -1, 2, -2]).unwrap();
        let mut decoder = FrameDecoder::new();
        for byte in frame.as_bytes() {
            assert_eq!(decoder.next_event(), None);
            decoder.push(std::slice::from_ref(byte));
        }
        match decoder.next_event() {
            Some(DecodedEvent::Frame(received)) => {
                assert_eq!(received.samples(), vec![1, -1, 2, -2]);
                assert_eq!(received.wav_bytes(), frame.wav_bytes());
            }
            other => panic!("expected frame, got {:?}", other),
        }
        assert_eq!(decoder.pending_bytes(), 0);
    }

    #[test]
    fn test_out_of_range_length_resyncs() {
        let mut decoder = FrameDecoder::with_max_frame_len(1024);
        let mut bytes = MAGIC_PREFIX.to_vec();
        bytes.extend_from_slice(&(1_000_000u32).to_le_bytes());
        decoder.push(&bytes);
        match decoder.next_event() {
            Some(DecodedEvent::Resync { skipped, .. }) => assert_eq!(skipped, MAGIC_PREFIX.len()),
            other => panic!("expected resync, got {:?}", other),
        }
    }
}
