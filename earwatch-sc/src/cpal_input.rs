//! Live capture from the system microphone

use crate::error::AudioError;
use crate::microphone::Microphone;
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{Device, Host, SampleFormat, SampleRate, Stream, StreamConfig};
use earwatch_core::{AudioFormat, BYTES_PER_SAMPLE, SAMPLES_PER_BLOCK};
use ringbuf::traits::{Consumer, Observer, Producer, Split};
use ringbuf::{HeapCons, HeapRb};
use std::thread;
use std::time::{Duration, Instant};
use tracing::{debug, error, info, warn};

/// Room for two full blocks between the audio callback and the loop
const RING_CAPACITY: usize = 2 * SAMPLES_PER_BLOCK;

const POLL_INTERVAL: Duration = Duration::from_millis(5);

/// Microphone backed by a cpal input stream.
///
/// The audio callback pushes samples into a ring buffer; `read` and `flush`
/// drain it from the super-loop. Samples that arrive while the ring is full
/// are dropped, which is exactly the backlog `flush` would discard anyway.
pub struct CpalMicrophone {
    name: String,
    device: Device,
    sample_format: SampleFormat,
    format: Option<AudioFormat>,
    stream: Option<Stream>,
    consumer: Option<HeapCons<i16>>,
}

impl CpalMicrophone {
    /// Open `device_name`, or the default input device
    pub fn new(device_name: Option<&str>) -> Result<Self, AudioError> {
        let host = cpal::default_host();
        let device = match device_name {
            Some(name) => Self::find_device_by_name(&host, name)?,
            None => host.default_input_device(),
        }
        .ok_or_else(|| AudioError::Device("No input device available".to_string()))?;

        let name = device.name().unwrap_or_else(|_| "unknown input".to_string());
        let sample_format = Self::get_supported_format(&device)?;

        Ok(Self {
            name,
            device,
            sample_format,
            format: None,
            stream: None,
            consumer: None,
        })
    }

    fn find_device_by_name(host: &Host, name: &str) -> Result<Option<Device>, AudioError> {
        const MAX_DEVICES_TO_CHECK: usize = 100;
        let devices = host
            .input_devices()
            .map_err(|e| AudioError::Device(format!("Failed to enumerate devices: {}", e)))?;

        for device in devices.take(MAX_DEVICES_TO_CHECK) {
            if let Ok(device_name) = device.name() {
                if device_name == name || device_name.contains(name) {
                    return Ok(Some(device));
                }
            }
        }

        Ok(None)
    }

    /// Prefer native 16-bit input, fall back to F32
    fn get_supported_format(device: &Device) -> Result<SampleFormat, AudioError> {
        let configs = device
            .supported_input_configs()
            .map_err(|e| AudioError::Device(format!("Failed to get supported configs: {}", e)))?;

        let mut formats: Vec<SampleFormat> = configs.map(|c| c.sample_format()).collect();
        formats.dedup();
        if formats.contains(&SampleFormat::I16) {
            Ok(SampleFormat::I16)
        } else if formats.contains(&SampleFormat::F32) {
            Ok(SampleFormat::F32)
        } else {
            Err(AudioError::Format(format!(
                "Device offers no I16 or F32 input: {:?}",
                formats
            )))
        }
    }

    /// Names of the available input devices
    pub fn list_devices() -> Result<Vec<String>, AudioError> {
        let host = cpal::default_host();
        let devices = host
            .input_devices()
            .map_err(|e| AudioError::Device(format!("Failed to enumerate devices: {}", e)))?;
        Ok(devices.filter_map(|d| d.name().ok()).collect())
    }

    fn build_stream(&self, format: AudioFormat) -> Result<(Stream, HeapCons<i16>), AudioError> {
        let config = StreamConfig {
            channels: format.channels,
            sample_rate: SampleRate(format.sample_rate),
            buffer_size: cpal::BufferSize::Default,
        };
        let (mut producer, consumer) = HeapRb::<i16>::new(RING_CAPACITY).split();
        let on_error = |err: cpal::StreamError| error!("Audio stream error: {}", err);

        let stream = match self.sample_format {
            SampleFormat::I16 => self.device.build_input_stream(
                &config,
                move |data: &[i16], _: &cpal::InputCallbackInfo| {
                    producer.push_slice(data);
                },
                on_error,
                None,
            ),
            SampleFormat::F32 => self.device.build_input_stream(
                &config,
                move |data: &[f32], _: &cpal::InputCallbackInfo| {
                    for &sample in data {
                        if producer.try_push(f32_to_i16(sample)).is_err() {
                            break;
                        }
                    }
                },
                on_error,
                None,
            ),
            other => {
                return Err(AudioError::Format(format!(
                    "Unsupported sample format {:?}",
                    other
                )))
            }
        }
        .map_err(|e| AudioError::Device(format!("Failed to build stream: {}", e)))?;

        Ok((stream, consumer))
    }
}

impl Microphone for CpalMicrophone {
    fn name(&self) -> &str {
        &self.name
    }

    fn configure(&mut self, format: AudioFormat) -> Result<(), AudioError> {
        if format.bits_per_sample != 16 {
            return Err(AudioError::Format(format!(
                "Only 16-bit capture is supported, asked for {}",
                format.bits_per_sample
            )));
        }
        self.format = Some(format);
        Ok(())
    }

    fn start(&mut self) -> Result<(), AudioError> {
        if self.stream.is_some() {
            return Ok(());
        }
        let format = self
            .format
            .ok_or_else(|| AudioError::Device(format!("{} started before configure", self.name)))?;

        let (stream, consumer) = self.build_stream(format)?;
        stream
            .play()
            .map_err(|e| AudioError::Device(format!("Failed to start stream: {}", e)))?;

        self.stream = Some(stream);
        self.consumer = Some(consumer);
        info!(
            "Audio capture started on {} ({} Hz, {:?})",
            self.name, format.sample_rate, self.sample_format
        );
        Ok(())
    }

    fn stop(&mut self) -> Result<(), AudioError> {
        if let Some(stream) = self.stream.take() {
            if let Err(e) = stream.pause() {
                warn!("Failed to pause stream on {}: {}", self.name, e);
            }
            info!("Audio capture stopped");
        }
        self.consumer = None;
        Ok(())
    }

    fn read(&mut self, buf: &mut [i16], timeout: Duration) -> Result<usize, AudioError> {
        let consumer = self
            .consumer
            .as_mut()
            .ok_or_else(|| AudioError::Device("Audio capture not running".to_string()))?;
        drain_ring(consumer, buf, timeout)
    }

    fn flush(&mut self, _timeout: Duration) -> Result<usize, AudioError> {
        let consumer = self
            .consumer
            .as_mut()
            .ok_or_else(|| AudioError::Device("Audio capture not running".to_string()))?;

        let dropped = skip_backlog(consumer);
        debug!("Dropped {} stale samples", dropped);
        Ok(dropped * BYTES_PER_SAMPLE)
    }
}

impl Drop for CpalMicrophone {
    fn drop(&mut self) {
        let _ = self.stop();
    }
}

/// Map a float sample in [-1, 1] to 16-bit; NaN and infinities become silence
fn f32_to_i16(sample: f32) -> i16 {
    let sample = if sample.is_finite() {
        sample.clamp(-1.0, 1.0)
    } else {
        0.0
    };
    (sample * i16::MAX as f32) as i16
}

/// Pop samples into `buf` until it is full or `timeout` passes.
///
/// Running out of time with nothing read is a timeout; with some samples
/// read it is a short count the caller has to judge.
fn drain_ring(
    consumer: &mut HeapCons<i16>,
    buf: &mut [i16],
    timeout: Duration,
) -> Result<usize, AudioError> {
    let deadline = Instant::now() + timeout;
    let mut filled = 0;
    while filled < buf.len() {
        filled += consumer.pop_slice(&mut buf[filled..]);
        if filled == buf.len() {
            break;
        }
        if Instant::now() >= deadline {
            if filled == 0 {
                return Err(AudioError::Timeout(timeout.as_millis() as u64));
            }
            break;
        }
        thread::sleep(POLL_INTERVAL);
    }
    Ok(filled)
}

fn skip_backlog(consumer: &mut HeapCons<i16>) -> usize {
    let stale = consumer.occupied_len();
    consumer.skip(stale)
}
