// Copyright (c) 2026 Christoph Gaffga
// SPDX-License-Identifier: GPL-3.0-only
// https://github.com/cgaffga/phasmcore

//! JPEG marker reading and writing.
//!
//! [`MarkerReader`] walks a byte stream with an explicit cursor; the decoder
//! hands that cursor to a [`BitReader`](super::bitio::BitReader) for scan data
//! and takes it back afterwards. [`StreamWriter`] assembles marker segments
//! under an optional size limit.

use super::error::{JpeglError, Result};

/// JPEG marker constants (second byte, without the 0xFF prefix).
pub const SOI: u8 = 0xD8;
pub const EOI: u8 = 0xD9;
pub const SOF0: u8 = 0xC0;
pub const SOF3: u8 = 0xC3;
pub const DHT: u8 = 0xC4;
pub const SOS: u8 = 0xDA;
pub const APP0: u8 = 0xE0;
pub const COM: u8 = 0xFE;

/// Kind of JPEG stream, determined from its frame marker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JpegKind {
    /// Lossless process (SOF3).
    Lossless,
    /// Baseline DCT process (SOF0).
    Baseline,
}

/// Markers that carry no length field.
pub fn is_standalone(marker: u8) -> bool {
    matches!(marker, SOI | EOI | 0x01 | 0xD0..=0xD7)
}

/// Frame markers other than SOF3: processes this codec does not decode.
pub fn is_other_frame(marker: u8) -> bool {
    matches!(
        marker,
        0xC0..=0xC2 // baseline, extended, progressive
        | 0xC5..=0xC7 // differential
        | 0xC9..=0xCB // arithmetic
        | 0xCD..=0xCF // differential arithmetic
    )
}

/// Cursor over the marker structure of a byte stream.
pub struct MarkerReader<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> MarkerReader<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    pub fn data(&self) -> &'a [u8] {
        self.data
    }

    pub fn position(&self) -> usize {
        self.pos
    }

    /// Move the cursor, e.g. past entropy-coded data.
    pub fn set_position(&mut self, pos: usize) {
        self.pos = pos.min(self.data.len());
    }

    /// Read the next marker, skipping 0xFF fill bytes.
    ///
    /// Returns the marker byte and the offset of its 0xFF prefix.
    pub fn read_marker(&mut self) -> Result<(u8, usize)> {
        let start = self.pos;
        if self.pos + 1 >= self.data.len() {
            return Err(JpeglError::UnexpectedEof { offset: self.data.len() });
        }
        if self.data[self.pos] != 0xFF {
            return Err(JpeglError::MarkerMismatch {
                expected: "a marker",
                found: u16::from_be_bytes([self.data[self.pos], self.data[self.pos + 1]]),
                offset: start,
            });
        }
        while self.pos + 1 < self.data.len() && self.data[self.pos + 1] == 0xFF {
            self.pos += 1;
        }
        if self.pos + 1 >= self.data.len() {
            return Err(JpeglError::UnexpectedEof { offset: self.data.len() });
        }
        let offset = self.pos;
        let marker = self.data[self.pos + 1];
        self.pos += 2;
        if marker == 0x00 {
            return Err(JpeglError::MarkerMismatch {
                expected: "a marker",
                found: 0xFF00,
                offset,
            });
        }
        Ok((marker, offset))
    }

    /// Read a marker and require it to be `marker`.
    pub fn expect_marker(&mut self, marker: u8, name: &'static str) -> Result<usize> {
        let (found, offset) = self.read_marker()?;
        if found != marker {
            return Err(JpeglError::MarkerMismatch {
                expected: name,
                found: 0xFF00 | found as u16,
                offset,
            });
        }
        Ok(offset)
    }

    /// Read the length-prefixed body of the segment whose marker was just read.
    pub fn read_segment(&mut self, marker: u8) -> Result<&'a [u8]> {
        if self.pos + 2 > self.data.len() {
            return Err(JpeglError::UnexpectedEof { offset: self.data.len() });
        }
        let length = u16::from_be_bytes([self.data[self.pos], self.data[self.pos + 1]]) as usize;
        if length < 2 {
            return Err(JpeglError::InvalidMarkerData("segment length below 2"));
        }
        let remaining = self.data.len() - self.pos;
        if length > remaining {
            return Err(JpeglError::SegmentOverrun {
                marker,
                length,
                remaining,
            });
        }
        let body = &self.data[self.pos + 2..self.pos + length];
        self.pos += length;
        Ok(body)
    }

    /// Skip the body of a segment the caller has no use for.
    pub fn skip_segment(&mut self, marker: u8) -> Result<()> {
        if !is_standalone(marker) {
            self.read_segment(marker)?;
        }
        Ok(())
    }
}

/// Byte sink for an encoded stream with an optional size limit.
pub struct StreamWriter {
    bytes: Vec<u8>,
    limit: Option<usize>,
}

impl StreamWriter {
    pub fn new(limit: Option<usize>) -> Self {
        let capacity = limit.unwrap_or(0).min(1 << 20);
        Self {
            bytes: Vec::with_capacity(capacity),
            limit,
        }
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    fn reserve(&self, additional: usize) -> Result<()> {
        let requested = self.bytes.len() + additional;
        match self.limit {
            Some(limit) if requested > limit => Err(JpeglError::OutputOverflow { limit, requested }),
            _ => Ok(()),
        }
    }

    /// Write a standalone marker.
    pub fn marker(&mut self, marker: u8) -> Result<()> {
        self.reserve(2)?;
        self.bytes.extend_from_slice(&[0xFF, marker]);
        Ok(())
    }

    /// Write a marker segment: marker, 2-byte length, body.
    pub fn segment(&mut self, marker: u8, body: &[u8]) -> Result<()> {
        let length = body.len() + 2;
        if length > u16::MAX as usize {
            return Err(JpeglError::InvalidMarkerData("segment body too long"));
        }
        self.reserve(2 + length)?;
        self.bytes.extend_from_slice(&[0xFF, marker]);
        self.bytes.extend_from_slice(&(length as u16).to_be_bytes());
        self.bytes.extend_from_slice(body);
        Ok(())
    }

    /// Append entropy-coded bytes verbatim.
    pub fn raw(&mut self, data: &[u8]) -> Result<()> {
        self.reserve(data.len())?;
        self.bytes.extend_from_slice(data);
        Ok(())
    }

    pub fn finish(self) -> Vec<u8> {
        self.bytes
    }
}

/// Determine whether `data` is a lossless or baseline JPEG stream.
///
/// Walks the header segments up to the first frame marker.
pub fn probe(data: &[u8]) -> Result<JpegKind> {
    let mut reader = MarkerReader::new(data);
    reader.expect_marker(SOI, "SOI")?;
    loop {
        let (marker, offset) = reader.read_marker()?;
        match marker {
            SOF3 => return Ok(JpegKind::Lossless),
            SOF0 => return Ok(JpegKind::Baseline),
            SOS | EOI => {
                return Err(JpeglError::MarkerMismatch {
                    expected: "SOF0 or SOF3",
                    found: 0xFF00 | marker as u16,
                    offset,
                })
            }
            m if is_other_frame(m) => return Err(JpeglError::UnsupportedMarker(m)),
            m => reader.skip_segment(m)?,
        }
    }
}

/// Collect the payloads of all COM segments before the first scan.
pub fn read_comments(data: &[u8]) -> Result<Vec<Vec<u8>>> {
    let mut reader = MarkerReader::new(data);
    reader.expect_marker(SOI, "SOI")?;
    let mut comments = Vec::new();
    loop {
        match reader.read_marker()? {
            (SOS | EOI, _) => return Ok(comments),
            (COM, _) => comments.push(reader.read_segment(COM)?.to_vec()),
            (m, _) => reader.skip_segment(m)?,
        }
    }
}
