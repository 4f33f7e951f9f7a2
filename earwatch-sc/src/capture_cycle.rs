//! One flush / read / gate / transmit cycle

use crate::config::CaptureConfig;
use crate::energy_gate::{EnergyGate, GateDecision};
use crate::error::AudioError;
use crate::microphone::Microphone;
use earwatch_core::{SampleBlock, BLOCK_BYTES, BYTES_PER_SAMPLE, RECORD_SECONDS};
use earwatch_wire::{FrameCodec, FrameSink};
use std::time::Duration;
use tracing::{debug, info, warn};

/// How a cycle ended. None of these are fatal.
#[derive(Debug, Clone, PartialEq)]
pub enum CycleOutcome {
    /// One frame of `frame_len` bytes went out on the channel
    Transmitted { energy: f64, frame_len: usize },
    /// Captured fine, but below the energy threshold
    Discarded { energy: f64 },
    /// Timeout, short read or driver error
    CaptureFailed(String),
    /// Frame buffer could not be built
    EncodeFailed(String),
    /// Channel write failed
    TransmitFailed(String),
}

impl CycleOutcome {
    pub fn is_transmitted(&self) -> bool {
        matches!(self, CycleOutcome::Transmitted { .. })
    }
}

/// Capture statistics
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CaptureStats {
    pub cycles: u64,
    pub transmitted: u64,
    pub discarded: u64,
    pub capture_failures: u64,
    pub encode_failures: u64,
    pub transmit_failures: u64,
    pub flushed_bytes: u64,
}

/// Owns the sample block and runs capture cycles against a microphone
pub struct CaptureCycle {
    block: SampleBlock,
    gate: EnergyGate,
    codec: FrameCodec,
    flush_timeout: Duration,
    read_timeout: Duration,
    stats: CaptureStats,
}

impl CaptureCycle {
    pub fn new(config: &CaptureConfig) -> Self {
        Self {
            block: SampleBlock::new(),
            gate: EnergyGate::new(config.energy_threshold),
            codec: FrameCodec::default(),
            flush_timeout: Duration::from_millis(config.flush_timeout_ms),
            read_timeout: Duration::from_millis(config.read_timeout_ms),
            stats: CaptureStats::default(),
        }
    }

    /// Encode frames with `codec` instead of the default one
    pub fn with_codec(mut self, codec: FrameCodec) -> Self {
        self.codec = codec;
        self
    }

    /// The block as left by the last cycle
    pub fn block(&self) -> &SampleBlock {
        &self.block
    }

    pub fn stats(&self) -> &CaptureStats {
        &self.stats
    }

    /// Run one complete cycle; blocks for at most flush + read timeout
    pub fn run(&mut self, mic: &mut dyn Microphone, sink: &dyn FrameSink) -> CycleOutcome {
        self.stats.cycles += 1;

        self.flush(mic);

        info!("Recording {} s of audio", RECORD_SECONDS);
        if let Err(e) = self.capture(mic) {
            warn!("Audio capture failed: {}", e);
            self.stats.capture_failures += 1;
            return CycleOutcome::CaptureFailed(e.to_string());
        }

        let GateDecision {
            energy,
            threshold,
            transmit,
        } = self.gate.evaluate(self.block.samples());
        if !transmit {
            info!(
                "Audio energy {:.1} below threshold {:.1}, segment discarded",
                energy, threshold
            );
            self.stats.discarded += 1;
            return CycleOutcome::Discarded { energy };
        }
        info!("Audio energy {:.1}, sending segment", energy);

        let frame = match self.codec.encode_samples(self.block.samples()) {
            Ok(frame) => frame,
            Err(e) => {
                warn!("Frame encoding failed: {}", e);
                self.stats.encode_failures += 1;
                return CycleOutcome::EncodeFailed(e.to_string());
            }
        };

        match sink.send_frame(&frame) {
            Ok(()) => {
                debug!("Sent frame of {} bytes", frame.len());
                self.stats.transmitted += 1;
                CycleOutcome::Transmitted {
                    energy,
                    frame_len: frame.len(),
                }
            }
            Err(e) => {
                warn!("Frame transmission failed: {}", e);
                self.stats.transmit_failures += 1;
                CycleOutcome::TransmitFailed(e.to_string())
            }
        }
    }

    fn flush(&mut self, mic: &mut dyn Microphone) {
        match mic.flush(self.flush_timeout) {
            Ok(0) => {}
            Ok(bytes) => {
                debug!("Flushed {} stale bytes from {}", bytes, mic.name());
                self.stats.flushed_bytes += bytes as u64;
            }
            Err(e) => warn!("Flush of {} failed: {}", mic.name(), e),
        }
    }

    fn capture(&mut self, mic: &mut dyn Microphone) -> Result<(), AudioError> {
        let timeout = self.read_timeout;
        let samples = self.block.fill_with(|buf| mic.read(buf, timeout))?;
        let read_bytes = samples * BYTES_PER_SAMPLE;
        if read_bytes != BLOCK_BYTES {
            return Err(AudioError::PartialRead {
                read_bytes,
                expected_bytes: BLOCK_BYTES,
            });
        }
        Ok(())
    }
}
