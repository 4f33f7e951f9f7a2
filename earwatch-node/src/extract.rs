//! Pull frames back out of a recorded channel dump

use crate::error::NodeError;
use earwatch_sc::EnergyGate;
use earwatch_wire::{DecodedEvent, FrameDecoder, ReceivedFrame};
use serde::Serialize;
use std::fs::{self, File};
use std::io::{self, BufWriter, Read};
use std::path::Path;
use tracing::{debug, info, warn};

const READ_CHUNK: usize = 64 * 1024;

/// One frame written to disk
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExtractedFrame {
    pub index: usize,
    pub file: String,
    pub sample_rate: u32,
    pub samples: u32,
    pub duration_ms: u64,
    pub energy: f64,
}

/// Written next to the frames as `index.json`
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ExtractSummary {
    pub frames: Vec<ExtractedFrame>,
    pub text_lines: usize,
    pub resyncs: usize,
    pub skipped_bytes: usize,
    pub trailing_bytes: usize,
}

/// Decode `input`, saving each frame as `frame-NNNN.wav` in `out_dir`
pub fn extract_frames(input: &Path, out_dir: &Path) -> Result<ExtractSummary, NodeError> {
    fs::create_dir_all(out_dir)?;
    let mut source = File::open(input)?;
    let mut decoder = FrameDecoder::new();
    let mut summary = ExtractSummary::default();
    let mut chunk = vec![0u8; READ_CHUNK];

    loop {
        let n = match source.read(&mut chunk) {
            Ok(0) => break,
            Ok(n) => n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e.into()),
        };
        decoder.push(&chunk[..n]);

        while let Some(event) = decoder.next_event() {
            match event {
                DecodedEvent::Frame(frame) => {
                    let entry = save_frame(&frame, summary.frames.len(), out_dir)?;
                    summary.frames.push(entry);
                }
                DecodedEvent::Text(line) => {
                    info!("device: {}", line);
                    summary.text_lines += 1;
                }
                DecodedEvent::Resync { skipped, reason } => {
                    warn!("Dropped {} bytes: {}", skipped, reason);
                    summary.resyncs += 1;
                    summary.skipped_bytes += skipped;
                }
            }
        }
    }

    summary.trailing_bytes = decoder.pending_bytes();
    if summary.trailing_bytes > 0 {
        debug!("{} undecoded bytes at end of input", summary.trailing_bytes);
    }

    let index = BufWriter::new(File::create(out_dir.join("index.json"))?);
    serde_json::to_writer_pretty(index, &summary).map_err(io::Error::from)?;

    info!(
        "Extracted {} frames from {} into {}",
        summary.frames.len(),
        input.display(),
        out_dir.display()
    );
    Ok(summary)
}

fn save_frame(frame: &ReceivedFrame, index: usize, out_dir: &Path) -> Result<ExtractedFrame, NodeError> {
    let file = format!("frame-{:04}.wav", index);
    fs::write(out_dir.join(&file), frame.wav_bytes())?;

    let samples = frame.header.sample_frames();
    let sample_rate = frame.header.sample_rate;
    let duration_ms = if sample_rate == 0 {
        0
    } else {
        samples as u64 * 1000 / sample_rate as u64
    };
    let energy = EnergyGate::measure(&frame.samples());
    info!("Saved {} ({} ms, energy {:.1})", file, duration_ms, energy);

    Ok(ExtractedFrame {
        index,
        file,
        sample_rate,
        samples,
        duration_ms,
        energy,
    })
}
