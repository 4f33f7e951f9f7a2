//! Capture cycle against file-backed and misbehaving microphones

use earwatch_core::{AudioFormat, SAMPLES_PER_BLOCK};
use earwatch_sc::*;
use earwatch_wire::{FrameSink, WireError, WireFrame};
use std::cell::RefCell;
use std::time::Duration;

#[derive(Default)]
struct RecordingSink {
    frames: RefCell<Vec<WireFrame>>,
}

impl FrameSink for RecordingSink {
    fn send_frame(&self, frame: &WireFrame) -> Result<(), WireError> {
        self.frames.borrow_mut().push(frame.clone());
        Ok(())
    }
}

/// Reports a backlog on flush and fails every read
struct StalledMicrophone {
    flushes: usize,
}

impl Microphone for StalledMicrophone {
    fn name(&self) -> &str {
        "stalled"
    }

    fn configure(&mut self, _format: AudioFormat) -> Result<(), AudioError> {
        Ok(())
    }

    fn start(&mut self) -> Result<(), AudioError> {
        Ok(())
    }

    fn stop(&mut self) -> Result<(), AudioError> {
        Ok(())
    }

    fn read(&mut self, _buf: &mut [i16], timeout: Duration) -> Result<usize, AudioError> {
        Err(AudioError::Timeout(timeout.as_millis() as u64))
    }

    fn flush(&mut self, _timeout: Duration) -> Result<usize, AudioError> {
        self.flushes += 1;
        Ok(512)
    }
}

fn write_wav(path: &std::path::Path, spec: hound::WavSpec, samples: &[i16]) {
    let mut writer = hound::WavWriter::create(path, spec).unwrap();
    for &s in samples {
        writer.write_sample(s).unwrap();
    }
    writer.finalize().unwrap();
}

fn node_spec() -> hound::WavSpec {
    hound::WavSpec {
        channels: 1,
        sample_rate: 16_000,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    }
}

#[test]
fn test_wav_file_replay_transmits_loud_segment() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("knock.wav");
    let samples: Vec<i16> = (0..SAMPLES_PER_BLOCK)
        .map(|i| if (i / 40) % 2 == 0 { 4000 } else { -4000 })
        .collect();
    write_wav(&path, node_spec(), &samples);

    let mut mic = ReplayMicrophone::from_wav_file(&path).unwrap();
    mic.configure(AudioFormat::NODE).unwrap();
    mic.start().unwrap();

    let mut cycle = CaptureCycle::new(&CaptureConfig::default());
    let sink = RecordingSink::default();
    let outcome = cycle.run(&mut mic, &sink);

    match outcome {
        CycleOutcome::Transmitted { energy, frame_len } => {
            assert!((energy - 4000.0).abs() < 1e-6);
            assert_eq!(frame_len, 9 + 4 + 44 + 128_000 + 7);
        }
        other => panic!("expected transmission, got {:?}", other),
    }
    assert_eq!(sink.frames.borrow()[0].header().unwrap().data_len, 128_000);

    // The one-shot recording is exhausted, so the next cycle comes up empty
    assert!(matches!(cycle.run(&mut mic, &sink), CycleOutcome::CaptureFailed(_)));
    assert_eq!(sink.frames.borrow().len(), 1);
}

#[test]
fn test_wav_file_with_wrong_rate_fails_configure() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("cd.wav");
    let spec = hound::WavSpec {
        sample_rate: 44_100,
        ..node_spec()
    };
    write_wav(&path, spec, &[0; 100]);

    let mut mic = ReplayMicrophone::from_wav_file(&path).unwrap();
    assert!(mic.configure(AudioFormat::NODE).is_err());
}

#[test]
fn test_float_wav_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("float.wav");
    let spec = hound::WavSpec {
        channels: 1,
        sample_rate: 16_000,
        bits_per_sample: 32,
        sample_format: hound::SampleFormat::Float,
    };
    let mut writer = hound::WavWriter::create(&path, spec).unwrap();
    writer.write_sample(0.5f32).unwrap();
    writer.finalize().unwrap();

    assert!(matches!(
        ReplayMicrophone::from_wav_file(&path),
        Err(AudioError::Format(_))
    ));
}

#[test]
fn test_missing_wav_file() {
    assert!(ReplayMicrophone::from_wav_file("/nonexistent/earwatch.wav").is_err());
}

#[test]
fn test_read_timeout_aborts_cycle_after_flush() {
    let mut mic = StalledMicrophone { flushes: 0 };
    let mut cycle = CaptureCycle::new(&CaptureConfig::default());
    let sink = RecordingSink::default();

    for _ in 0..3 {
        assert!(matches!(cycle.run(&mut mic, &sink), CycleOutcome::CaptureFailed(_)));
    }
    assert_eq!(mic.flushes, 3);
    assert!(sink.frames.borrow().is_empty());
    assert_eq!(cycle.stats().capture_failures, 3);
    assert_eq!(cycle.stats().flushed_bytes, 3 * 512);
    assert_eq!(cycle.block().valid_len(), 0);
}

#[test]
fn test_looping_replay_keeps_transmitting() {
    let mut mic = ReplayMicrophone::from_samples("loop", vec![300, -300, 300, -300]).with_looping(true);
    mic.configure(AudioFormat::NODE).unwrap();
    mic.start().unwrap();

    let mut cycle = CaptureCycle::new(&CaptureConfig::default());
    let sink = RecordingSink::default();
    for _ in 0..3 {
        assert!(cycle.run(&mut mic, &sink).is_transmitted());
    }
    assert_eq!(sink.frames.borrow().len(), 3);
}
