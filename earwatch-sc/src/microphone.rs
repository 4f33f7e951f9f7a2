//! Microphone capability and the file-replay backend

use crate::error::AudioError;
use earwatch_core::AudioFormat;
use std::path::Path;
use std::time::Duration;
use tracing::{debug, info};

/// What the capture cycle needs from an input peripheral.
///
/// `configure` and `start` failures are bring-up failures and are fatal to
/// the node. `read` and `flush` failures only abort the current cycle.
pub trait Microphone {
    /// Human-readable device name for logs
    fn name(&self) -> &str;

    /// Set sample rate, bit depth and channel count
    fn configure(&mut self, format: AudioFormat) -> Result<(), AudioError>;

    fn start(&mut self) -> Result<(), AudioError>;

    fn stop(&mut self) -> Result<(), AudioError>;

    /// Read up to `buf.len()` samples, waiting at most `timeout`.
    ///
    /// Returns the number of samples written to the front of `buf`.
    fn read(&mut self, buf: &mut [i16], timeout: Duration) -> Result<usize, AudioError>;

    /// Discard samples buffered since the last read.
    ///
    /// Returns the number of bytes discarded.
    fn flush(&mut self, timeout: Duration) -> Result<usize, AudioError>;
}

/// Plays back a fixed recording as if it were a live microphone.
///
/// Without looping the recording is consumed once, after which reads come
/// back short and the capture cycle treats them as failures.
#[derive(Debug, Clone)]
pub struct ReplayMicrophone {
    name: String,
    source_format: AudioFormat,
    samples: Vec<i16>,
    position: usize,
    looping: bool,
    configured: bool,
    running: bool,
}

impl ReplayMicrophone {
    /// Replay in-memory samples recorded in the node's format
    pub fn from_samples(name: impl Into<String>, samples: Vec<i16>) -> Self {
        Self::with_format(name, AudioFormat::NODE, samples)
    }

    pub fn with_format(name: impl Into<String>, format: AudioFormat, samples: Vec<i16>) -> Self {
        Self {
            name: name.into(),
            source_format: format,
            samples,
            position: 0,
            looping: false,
            configured: false,
            running: false,
        }
    }

    /// Load a 16-bit integer PCM WAV file
    pub fn from_wav_file<P: AsRef<Path>>(path: P) -> Result<Self, AudioError> {
        let path = path.as_ref();
        let mut reader = hound::WavReader::open(path)?;
        let spec = reader.spec();

        if spec.sample_format != hound::SampleFormat::Int || spec.bits_per_sample != 16 {
            return Err(AudioError::Format(format!(
                "{} is not 16-bit integer PCM ({:?}, {} bits)",
                path.display(),
                spec.sample_format,
                spec.bits_per_sample
            )));
        }

        let samples = reader.samples::<i16>().collect::<Result<Vec<_>, _>>()?;
        let format = AudioFormat {
            sample_rate: spec.sample_rate,
            bits_per_sample: spec.bits_per_sample,
            channels: spec.channels,
        };
        debug!(
            "Loaded {} samples from {} ({} Hz, {} ch)",
            samples.len(),
            path.display(),
            format.sample_rate,
            format.channels
        );

        Ok(Self::with_format(path.display().to_string(), format, samples))
    }

    /// Restart from the beginning when the recording runs out
    pub fn with_looping(mut self, looping: bool) -> Self {
        self.looping = looping;
        self
    }
}

impl Microphone for ReplayMicrophone {
    fn name(&self) -> &str {
        &self.name
    }

    fn configure(&mut self, format: AudioFormat) -> Result<(), AudioError> {
        if format != self.source_format {
            return Err(AudioError::Format(format!(
                "{} is {} Hz/{} bit/{} ch, node needs {} Hz/{} bit/{} ch",
                self.name,
                self.source_format.sample_rate,
                self.source_format.bits_per_sample,
                self.source_format.channels,
                format.sample_rate,
                format.bits_per_sample,
                format.channels
            )));
        }
        self.configured = true;
        Ok(())
    }

    fn start(&mut self) -> Result<(), AudioError> {
        if !self.configured {
            return Err(AudioError::Device(format!("{} started before configure", self.name)));
        }
        if self.looping && self.samples.is_empty() {
            return Err(AudioError::Device(format!("{} has nothing to loop", self.name)));
        }
        self.running = true;
        info!("Replaying {} ({} samples)", self.name, self.samples.len());
        Ok(())
    }

    fn stop(&mut self) -> Result<(), AudioError> {
        self.running = false;
        Ok(())
    }

    fn read(&mut self, buf: &mut [i16], _timeout: Duration) -> Result<usize, AudioError> {
        if !self.running {
            return Err(AudioError::Device(format!("{} is not running", self.name)));
        }

        let mut written = 0;
        while written < buf.len() {
            if self.position == self.samples.len() {
                if !self.looping {
                    break;
                }
                self.position = 0;
            }
            let n = (buf.len() - written).min(self.samples.len() - self.position);
            buf[written..written + n].copy_from_slice(&self.samples[self.position..self.position + n]);
            written += n;
            self.position += n;
        }
        Ok(written)
    }

    fn flush(&mut self, _timeout: Duration) -> Result<usize, AudioError> {
        // A recording has no backlog; nothing accumulates between reads
        Ok(0)
    }
}
