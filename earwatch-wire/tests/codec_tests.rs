//! Frame codec checked against an independent WAV reader

use earwatch_core::{BLOCK_BYTES, SAMPLES_PER_BLOCK};
use earwatch_wire::*;
use proptest::prelude::*;
use std::io::Cursor;

#[test]
fn test_full_block_frame_reads_back_with_hound() {
    let samples: Vec<i16> = (0..SAMPLES_PER_BLOCK)
        .map(|i| ((i % 200) as i16 - 100) * 300)
        .collect();
    let frame = FrameCodec::default().encode_samples(&samples).unwrap();

    assert_eq!(frame.declared_len() as usize, WAV_HEADER_LEN + BLOCK_BYTES);
    assert_eq!(frame.declared_len(), 128_044);
    assert_eq!(frame.header().unwrap().data_len, 128_000);

    let mut reader = hound::WavReader::new(Cursor::new(frame.wav_bytes())).unwrap();
    let spec = reader.spec();
    assert_eq!(spec.sample_rate, 16_000);
    assert_eq!(spec.bits_per_sample, 16);
    assert_eq!(spec.channels, 1);
    assert_eq!(spec.sample_format, hound::SampleFormat::Int);
    assert_eq!(reader.len() as usize, SAMPLES_PER_BLOCK);

    let decoded: Vec<i16> = reader.samples::<i16>().map(|s| s.unwrap()).collect();
    assert_eq!(decoded, samples);
}

#[test]
fn test_frame_is_prefixed_and_suffixed() {
    let frame = FrameCodec::default().encode(&[0u8; 16]).unwrap();
    let bytes = frame.as_bytes();
    assert!(bytes.starts_with(b"WAV_START"));
    assert!(bytes.ends_with(b"WAV_END"));
    assert_eq!(bytes.len(), 9 + 4 + 44 + 16 + 7);
}

#[test]
fn test_parse_rejects_foreign_header() {
    let mut header = WavHeader::for_payload(Default::default(), 8).to_bytes();
    header[0..4].copy_from_slice(b"RIFX");
    assert!(matches!(
        WavHeader::parse(&header),
        Err(WireError::InvalidHeader(_))
    ));
    assert!(WavHeader::parse(&header[..20]).is_err());
}

proptest! {
    #[test]
    fn test_header_reports_payload(payload in prop::collection::vec(any::<u8>(), 0..2048)) {
        let frame = FrameCodec::default().encode(&payload).unwrap();
        let header = frame.header().unwrap();

        prop_assert_eq!(header.data_len as usize, payload.len());
        prop_assert_eq!(header.riff_len as usize, payload.len() + 36);
        prop_assert_eq!(header.sample_rate, 16_000);
        prop_assert_eq!(header.bits_per_sample, 16);
        prop_assert_eq!(header.channels, 1);
        prop_assert_eq!(frame.declared_len() as usize, WAV_HEADER_LEN + payload.len());
        prop_assert_eq!(&frame.wav_bytes()[WAV_HEADER_LEN..], payload.as_slice());
        prop_assert_eq!(frame.len(), frame_len(payload.len()));
    }

    #[test]
    fn test_non_token_lines_are_ignored(line in "[a-z0-9 .:]{0,40}") {
        prop_assert_eq!(decode_line(&line), None);
    }
}
