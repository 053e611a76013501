// Copyright (c) 2026 Christoph Gaffga
// SPDX-License-Identifier: GPL-3.0-only
// https://github.com/cgaffga/phasmcore

//! Error types for lossless JPEG encoding and decoding.

use std::fmt;

/// Broad classification of a [`JpeglError`].
///
/// Callers use this to decide policy (retry with other input, report as
/// corrupt, raise a buffer limit) without matching every variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// A caller-supplied parameter is out of range.
    Precondition,
    /// The byte stream violates the container or entropy-coding grammar.
    Corrupt,
    /// The output exceeded its configured size limit.
    ResourceExhausted,
    /// The stream is well-formed but uses a feature this codec does not handle.
    Unsupported,
}

/// Errors that can occur during JPEGL encoding or decoding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JpeglError {
    /// Predictor selector outside 1..=7.
    InvalidPredictor(u8),
    /// Difference category above the largest codable category.
    InvalidCategory(u32),
    /// Point transform must be smaller than the sample precision.
    InvalidPointTransform { value: u8, precision: u8 },
    /// Sampling factor outside 1..=4.
    InvalidSamplingFactor { h: u8, v: u8 },
    /// Pixel depth is not 8 or 24, or does not match the component count.
    InvalidDepth { depth: u8, components: usize },
    /// Width or height is zero or does not fit a 16-bit header field.
    InvalidDimensions { width: usize, height: usize },
    /// Component count outside 1..=4.
    InvalidComponentCount(usize),
    /// Pixel buffer length does not match the component plane sizes.
    BufferSizeMismatch { expected: usize, actual: usize },
    /// Comment payload does not fit a single marker segment.
    CommentTooLong(usize),
    /// Scan resolution does not fit the 16-bit JFIF density field.
    InvalidResolution(i32),
    /// Input ended before the current item was complete.
    UnexpectedEof { offset: usize },
    /// A 0xFF byte in entropy-coded data was not followed by a stuffed zero.
    NoStuffedZero { offset: usize, found: u8 },
    /// The marker at `offset` is not one the decoder accepts in its current state.
    MarkerMismatch { expected: &'static str, found: u16, offset: usize },
    /// A segment's length field runs past the end of the input.
    SegmentOverrun { marker: u8, length: usize, remaining: usize },
    /// A marker segment has invalid or inconsistent content.
    InvalidMarkerData(&'static str),
    /// No code in the table matches the bits read from the scan.
    HuffmanDecode { offset: usize },
    /// A scan references a Huffman table that was never defined.
    UndefinedHuffmanTable(u8),
    /// Scan component selector not present in the frame header.
    UnknownComponentId(u8),
    /// JFIF density unit other than 0, 1 or 2.
    InvalidDensityUnit(u8),
    /// Encountered a JPEG process this codec does not implement.
    UnsupportedMarker(u8),
    /// Only 8-bit samples are supported.
    UnsupportedPrecision(u8),
    /// Scan header lists more than one component.
    InterleavedScan { components: u8 },
    /// EOI reached while a frame component was never decoded.
    MissingComponentScan(usize),
    /// Encoded output would exceed the configured limit.
    OutputOverflow { limit: usize, requested: usize },
}

impl JpeglError {
    /// Classify this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidPredictor(_)
            | Self::InvalidCategory(_)
            | Self::InvalidPointTransform { .. }
            | Self::InvalidSamplingFactor { .. }
            | Self::InvalidDepth { .. }
            | Self::InvalidDimensions { .. }
            | Self::InvalidComponentCount(_)
            | Self::BufferSizeMismatch { .. }
            | Self::CommentTooLong(_)
            | Self::InvalidResolution(_) => ErrorKind::Precondition,
            Self::UnexpectedEof { .. }
            | Self::NoStuffedZero { .. }
            | Self::MarkerMismatch { .. }
            | Self::SegmentOverrun { .. }
            | Self::InvalidMarkerData(_)
            | Self::HuffmanDecode { .. }
            | Self::UndefinedHuffmanTable(_)
            | Self::UnknownComponentId(_)
            | Self::InvalidDensityUnit(_)
            | Self::MissingComponentScan(_) => ErrorKind::Corrupt,
            Self::OutputOverflow { .. } => ErrorKind::ResourceExhausted,
            Self::UnsupportedMarker(_)
            | Self::UnsupportedPrecision(_)
            | Self::InterleavedScan { .. } => ErrorKind::Unsupported,
        }
    }
}

impl fmt::Display for JpeglError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidPredictor(p) => write!(f, "invalid predictor {p} not in range [1..7]"),
            Self::InvalidCategory(c) => write!(f, "invalid difference category: {c}"),
            Self::InvalidPointTransform { value, precision } => {
                write!(f, "point transform {value} not below sample precision {precision}")
            }
            Self::InvalidSamplingFactor { h, v } => {
                write!(f, "invalid sampling factors: H={h}, V={v}")
            }
            Self::InvalidDepth { depth, components } => {
                write!(f, "pixel depth {depth} incompatible with {components} component(s)")
            }
            Self::InvalidDimensions { width, height } => {
                write!(f, "invalid image dimensions: {width}x{height}")
            }
            Self::InvalidComponentCount(n) => write!(f, "invalid component count: {n}"),
            Self::BufferSizeMismatch { expected, actual } => {
                write!(f, "pixel buffer size mismatch: expected {expected}, got {actual}")
            }
            Self::CommentTooLong(len) => write!(f, "comment of {len} bytes exceeds one segment"),
            Self::InvalidResolution(ppi) => write!(f, "resolution {ppi} ppi out of range"),
            Self::UnexpectedEof { offset } => {
                write!(f, "unexpected end of JPEGL data at offset {offset}")
            }
            Self::NoStuffedZero { offset, found } => {
                write!(f, "no stuffed zero after 0xFF at offset {offset} (found 0x{found:02X})")
            }
            Self::MarkerMismatch { expected, found, offset } => {
                write!(f, "expected {expected} marker, found 0x{found:04X} at offset {offset}")
            }
            Self::SegmentOverrun { marker, length, remaining } => write!(
                f,
                "segment 0xFF{marker:02X} length {length} exceeds remaining {remaining} bytes"
            ),
            Self::InvalidMarkerData(msg) => write!(f, "invalid marker data: {msg}"),
            Self::HuffmanDecode { offset } => {
                write!(f, "Huffman decode error near offset {offset}")
            }
            Self::UndefinedHuffmanTable(id) => write!(f, "Huffman table {id} not defined"),
            Self::UnknownComponentId(id) => write!(f, "unknown component ID in SOS: {id}"),
            Self::InvalidDensityUnit(u) => write!(f, "illegal density unit: {u}"),
            Self::UnsupportedMarker(m) => write!(f, "unsupported JPEG marker: 0xFF{m:02X}"),
            Self::UnsupportedPrecision(p) => write!(f, "unsupported sample precision: {p}-bit"),
            Self::InterleavedScan { components } => write!(
                f,
                "interleaved scan with {components} components is not supported by this decoder"
            ),
            Self::MissingComponentScan(c) => write!(f, "no scan data for component {c}"),
            Self::OutputOverflow { limit, requested } => {
                write!(f, "output buffer overflow: limit {limit}, requested {requested}")
            }
        }
    }
}

impl std::error::Error for JpeglError {}

pub type Result<T> = std::result::Result<T, JpeglError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kinds_follow_taxonomy() {
        assert_eq!(JpeglError::InvalidPredictor(9).kind(), ErrorKind::Precondition);
        assert_eq!(
            JpeglError::NoStuffedZero { offset: 3, found: 0x12 }.kind(),
            ErrorKind::Corrupt
        );
        assert_eq!(
            JpeglError::OutputOverflow { limit: 1, requested: 2 }.kind(),
            ErrorKind::ResourceExhausted
        );
        assert_eq!(
            JpeglError::InterleavedScan { components: 2 }.kind(),
            ErrorKind::Unsupported
        );
    }

    #[test]
    fn display_mentions_stuffed_zero() {
        let msg = JpeglError::NoStuffedZero { offset: 10, found: 0x7F }.to_string();
        assert!(msg.contains("no stuffed zero"));
        assert!(msg.contains("0x7F"));
    }
}
