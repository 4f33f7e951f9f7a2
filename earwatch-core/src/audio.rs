//! Audio format constants and the capture buffer

/// Microphone sample rate (Hz)
pub const SAMPLE_RATE: u32 = 16_000;

/// PCM bit depth
pub const BITS_PER_SAMPLE: u16 = 16;

/// Bytes per PCM sample
pub const BYTES_PER_SAMPLE: usize = (BITS_PER_SAMPLE / 8) as usize;

/// Mono capture
pub const CHANNELS: u16 = 1;

/// Length of one captured segment in seconds
pub const RECORD_SECONDS: u32 = 4;

/// Samples in one `SampleBlock`
pub const SAMPLES_PER_BLOCK: usize = (SAMPLE_RATE * RECORD_SECONDS) as usize;

/// Bytes in one `SampleBlock` once serialized as 16-bit PCM
pub const BLOCK_BYTES: usize = SAMPLES_PER_BLOCK * BYTES_PER_SAMPLE;

/// PCM stream format
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AudioFormat {
    /// Sample rate (Hz)
    pub sample_rate: u32,

    /// Bits per sample
    pub bits_per_sample: u16,

    /// Number of interleaved channels
    pub channels: u16,
}

impl AudioFormat {
    /// The format the node captures and transmits
    pub const NODE: AudioFormat = AudioFormat {
        sample_rate: SAMPLE_RATE,
        bits_per_sample: BITS_PER_SAMPLE,
        channels: CHANNELS,
    };

    /// Bytes per interleaved frame (all channels)
    pub const fn block_align(&self) -> u16 {
        self.channels * (self.bits_per_sample / 8)
    }

    /// Bytes per second of audio
    pub const fn byte_rate(&self) -> u32 {
        self.sample_rate * self.block_align() as u32
    }
}

impl Default for AudioFormat {
    fn default() -> Self {
        Self::NODE
    }
}

/// Fixed-capacity capture buffer.
///
/// Allocated once and overwritten in place by every capture cycle. The
/// number of samples written by the last fill is tracked explicitly, so a
/// short read can never be mistaken for a full segment.
#[derive(Debug, Clone)]
pub struct SampleBlock {
    samples: Box<[i16]>,
    valid: usize,
}

impl SampleBlock {
    /// Capacity of every block, in samples
    pub const CAPACITY: usize = SAMPLES_PER_BLOCK;

    /// Allocate an empty block
    pub fn new() -> Self {
        Self {
            samples: vec![0i16; Self::CAPACITY].into_boxed_slice(),
            valid: 0,
        }
    }

    /// Overwrite the block through `fill`, which receives the whole buffer
    /// and returns how many samples it wrote.
    ///
    /// On error the block is left empty.
    pub fn fill_with<E, F>(&mut self, fill: F) -> Result<usize, E>
    where
        F: FnOnce(&mut [i16]) -> Result<usize, E>,
    {
        self.valid = 0;
        let written = fill(&mut self.samples)?;
        self.valid = written.min(Self::CAPACITY);
        Ok(self.valid)
    }

    /// Samples written by the last fill
    pub fn samples(&self) -> &[i16] {
        &self.samples[..self.valid]
    }

    /// Number of valid samples
    pub fn valid_len(&self) -> usize {
        self.valid
    }

    /// Valid length in PCM bytes
    pub fn byte_len(&self) -> usize {
        self.valid * BYTES_PER_SAMPLE
    }

    /// True only when the last fill produced a full segment
    pub fn is_complete(&self) -> bool {
        self.valid == Self::CAPACITY
    }
}

impl Default for SampleBlock {
    fn default() -> Self {
        Self::new()
    }
}
