// Copyright (c) 2026 Christoph Gaffga
// SPDX-License-Identifier: GPL-3.0-only
// https://github.com/cgaffga/phasmcore

//! Rejection of malformed, unsupported and over-limit inputs.

use jpegl_core::jpegl::frame::{FrameComponent, FrameHeader};
use jpegl_core::jpegl::huffman::{HuffmanTable, HISTOGRAM_LEN};
use jpegl_core::jpegl::jfif::ResolutionHeader;
use jpegl_core::jpegl::marker::{StreamWriter, APP0, DHT, EOI, SOF3, SOI, SOS};
use jpegl_core::jpegl::tables::{dht_body, HuffmanSpec};
use jpegl_core::{decode, encode, EncodeOptions, ErrorKind, JpeglError, OutputLimit, RawImage};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha20Rng;

fn gray_stream(width: usize, height: usize) -> (Vec<u8>, Vec<u8>) {
    let mut rng = ChaCha20Rng::seed_from_u64(42);
    let pixels: Vec<u8> = (0..width * height).map(|_| rng.gen_range(90..110)).collect();
    let bytes = encode(&RawImage::gray(&pixels, width, height, 500), &EncodeOptions::default())
        .unwrap();
    (pixels, bytes)
}

fn find_marker(bytes: &[u8], marker: u8) -> usize {
    bytes.windows(2).position(|w| w == [0xFF, marker]).unwrap()
}

fn segment_end(bytes: &[u8], pos: usize) -> usize {
    pos + 2 + u16::from_be_bytes([bytes[pos + 2], bytes[pos + 3]]) as usize
}

#[test]
fn interleaved_scan_is_unsupported() {
    let mut freq = [0u32; HISTOGRAM_LEN];
    freq[0] = 10;
    freq[1] = 3;
    let table = HuffmanTable::from_frequencies(0, &freq).unwrap();
    let mut spec = HuffmanSpec::from(&table);

    let frame = FrameHeader {
        precision: 8,
        height: 2,
        width: 2,
        components: (0..2)
            .map(|id| FrameComponent { id, h_sampling: 1, v_sampling: 1, tq: 0 })
            .collect(),
    };

    let mut w = StreamWriter::new(None);
    w.marker(SOI).unwrap();
    w.segment(APP0, &ResolutionHeader::from_ppi(500).unwrap().to_body()).unwrap();
    w.segment(SOF3, &frame.to_body()).unwrap();
    w.segment(DHT, &dht_body(&spec)).unwrap();
    spec.id = 1;
    w.segment(DHT, &dht_body(&spec)).unwrap();
    w.segment(SOS, &[2, 0, 0x00, 1, 0x10, 1, 0, 0]).unwrap();
    w.raw(&[0x00, 0x00]).unwrap();
    w.marker(EOI).unwrap();

    let err = decode(&w.finish()).unwrap_err();
    assert_eq!(err, JpeglError::InterleavedScan { components: 2 });
    assert_eq!(err.kind(), ErrorKind::Unsupported);
}

#[test]
fn marker_inside_scan_data_is_corrupt() {
    let (_, mut bytes) = gray_stream(8, 8);
    let sos = find_marker(&bytes, SOS);
    let start = segment_end(&bytes, sos);
    bytes[start] = 0xFF;
    bytes[start + 1] = 0x01;

    let err = decode(&bytes).unwrap_err();
    assert_eq!(err, JpeglError::NoStuffedZero { offset: start + 1, found: 0x01 });
    assert_eq!(err.kind(), ErrorKind::Corrupt);
    assert!(err.to_string().contains("no stuffed zero"));
}

#[test]
fn truncated_stream() {
    let (_, bytes) = gray_stream(8, 8);
    let err = decode(&bytes[..bytes.len() - 4]).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Corrupt);
}

#[test]
fn missing_soi() {
    let (_, bytes) = gray_stream(4, 4);
    assert!(matches!(
        decode(&bytes[2..]),
        Err(JpeglError::MarkerMismatch { expected: "SOI", .. })
    ));
}

#[test]
fn scan_without_table() {
    let (_, bytes) = gray_stream(4, 4);
    let dht = find_marker(&bytes, DHT);
    let mut patched = bytes[..dht].to_vec();
    patched.extend_from_slice(&bytes[segment_end(&bytes, dht)..]);
    assert_eq!(decode(&patched).unwrap_err(), JpeglError::UndefinedHuffmanTable(0));
}

#[test]
fn component_without_scan() {
    let pixels = vec![60u8; 3 * 16];
    let raw = RawImage::color(&pixels, 4, 4, -1, [(1, 1); 3]);
    let bytes = encode(&raw, &EncodeOptions::default()).unwrap();
    let last_dht = bytes.windows(2).rposition(|w| w == [0xFF, DHT]).unwrap();
    let mut patched = bytes[..last_dht].to_vec();
    patched.extend_from_slice(&[0xFF, EOI]);
    assert_eq!(decode(&patched).unwrap_err(), JpeglError::MissingComponentScan(2));
}

#[test]
fn unknown_scan_component() {
    let (_, mut bytes) = gray_stream(4, 4);
    let sos = find_marker(&bytes, SOS);
    bytes[sos + 5] = 9;
    assert_eq!(decode(&bytes).unwrap_err(), JpeglError::UnknownComponentId(9));
}

#[test]
fn illegal_density_unit() {
    let (_, mut bytes) = gray_stream(4, 4);
    let app0 = find_marker(&bytes, APP0);
    // marker(2) + length(2) + "JFIF\0"(5) + version(2)
    bytes[app0 + 11] = 3;
    assert_eq!(decode(&bytes).unwrap_err(), JpeglError::InvalidDensityUnit(3));
}

#[test]
fn invalid_predictor_in_scan_header() {
    let (_, mut bytes) = gray_stream(4, 4);
    let sos = find_marker(&bytes, SOS);
    // marker(2) + length(2) + Ns(1) + Cs/Td(2)
    bytes[sos + 7] = 0;
    assert_eq!(decode(&bytes).unwrap_err(), JpeglError::InvalidPredictor(0));
}

#[test]
fn noise_overflows_uncompressed_limit() {
    let mut rng = ChaCha20Rng::seed_from_u64(3);
    let pixels: Vec<u8> = (0..256).map(|_| rng.gen()).collect();
    let raw = RawImage::gray(&pixels, 16, 16, -1);
    let options = EncodeOptions::default().with_output_limit(OutputLimit::Uncompressed);
    let err = encode(&raw, &options).unwrap_err();
    assert!(matches!(err, JpeglError::OutputOverflow { limit: 256, .. }));
    assert_eq!(err.kind(), ErrorKind::ResourceExhausted);

    let options = EncodeOptions::default().with_output_limit(OutputLimit::Bytes(10));
    assert!(matches!(
        encode(&raw, &options),
        Err(JpeglError::OutputOverflow { limit: 10, .. })
    ));
}

#[test]
fn invalid_encode_parameters() {
    let pixels = vec![0u8; 16];
    let raw = RawImage::gray(&pixels, 4, 4, -1);

    let err = encode(&raw, &EncodeOptions::default().with_point_transform(8)).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Precondition);

    let raw = RawImage::color(&pixels, 4, 4, -1, [(1, 1), (0, 1), (1, 1)]);
    assert!(matches!(
        encode(&raw, &EncodeOptions::default()),
        Err(JpeglError::InvalidSamplingFactor { h: 0, v: 1 })
    ));

    let raw = RawImage::gray(&pixels, 4, 4, 100_000);
    assert_eq!(
        encode(&raw, &EncodeOptions::default()).unwrap_err(),
        JpeglError::InvalidResolution(100_000)
    );
}
