// Copyright (c) 2026 Christoph Gaffga
// SPDX-License-Identifier: GPL-3.0-only
// https://github.com/cgaffga/phasmcore

//! Scan header (SOS) and the per-component entropy-coded scan.
//!
//! Encoding is two-pass: [`compute_differences`] predicts every sample and
//! gathers the category histogram the Huffman table is built from, then
//! [`encode_scan`] emits the codes. [`decode_scan`] inverts both in a single
//! pass over the plane.

use std::borrow::Cow;

use super::bitio::{BitReader, BitWriter};
use super::error::{JpeglError, Result};
use super::huffman::{
    additional_bits, categorize, encode_magnitude, extend, HuffmanTable, HISTOGRAM_LEN,
    MAX_CATEGORY,
};
use super::predict::Predictor;

/// One component entry of a scan header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScanComponent {
    /// Component identifier from the frame header.
    pub selector: u8,
    /// Huffman table identifier (upper nibble of Td/Ta).
    pub table_id: u8,
}

/// Parsed SOS header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanHeader {
    pub components: Vec<ScanComponent>,
    /// Predictor selector (Ss).
    pub predictor: u8,
    /// Always 0 for lossless (Se).
    pub se: u8,
    /// Successive approximation high bit, always 0 (Ah).
    pub ah: u8,
    /// Point transform (Al).
    pub point_transform: u8,
}

impl ScanHeader {
    /// Header for a non-interleaved scan of one component.
    pub fn single(selector: u8, table_id: u8, predictor: Predictor, point_transform: u8) -> Self {
        Self {
            components: vec![ScanComponent { selector, table_id }],
            predictor: predictor.selector(),
            se: 0,
            ah: 0,
            point_transform,
        }
    }

    pub fn is_interleaved(&self) -> bool {
        self.components.len() > 1
    }

    /// Serialize into an SOS segment body.
    pub fn to_body(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(4 + 2 * self.components.len());
        out.push(self.components.len() as u8);
        for c in &self.components {
            out.push(c.selector);
            out.push(c.table_id << 4);
        }
        out.push(self.predictor);
        out.push(self.se);
        out.push((self.ah << 4) | (self.point_transform & 0x0F));
        out
    }
}

/// Parse an SOS marker segment body (after the 2-byte length).
pub fn parse_sos(data: &[u8]) -> Result<ScanHeader> {
    if data.is_empty() {
        return Err(JpeglError::InvalidMarkerData("empty SOS"));
    }
    let num_components = data[0] as usize;
    if num_components == 0 || num_components > 4 {
        return Err(JpeglError::InvalidMarkerData("SOS component count out of range"));
    }
    let params = 1 + num_components * 2;
    if data.len() != params + 3 {
        return Err(JpeglError::InvalidMarkerData("SOS length does not match component count"));
    }

    let components = (0..num_components)
        .map(|i| ScanComponent {
            selector: data[1 + i * 2],
            table_id: data[2 + i * 2] >> 4,
        })
        .collect();

    Ok(ScanHeader {
        components,
        predictor: data[params],
        se: data[params + 1],
        ah: data[params + 2] >> 4,
        point_transform: data[params + 2] & 0x0F,
    })
}

/// Geometry and coding parameters shared by both scan directions.
#[derive(Debug, Clone, Copy)]
pub struct ScanParams {
    pub width: usize,
    pub height: usize,
    pub precision: u8,
    pub predictor: Predictor,
    pub point_transform: u8,
}

impl ScanParams {
    pub fn num_samples(&self) -> usize {
        self.width * self.height
    }

    /// Point transform must leave at least one bit of every sample.
    pub fn check(&self) -> Result<()> {
        if self.point_transform >= self.precision {
            return Err(JpeglError::InvalidPointTransform {
                value: self.point_transform,
                precision: self.precision,
            });
        }
        Ok(())
    }
}

/// First encoder pass over a plane.
///
/// Predicts from the samples right-shifted by the point transform, stores
/// each sample's prediction difference in `diffs`, and returns the category
/// histogram with the reserved slot left at zero. `plane` is not modified.
pub fn compute_differences(
    plane: &[u8],
    params: &ScanParams,
    diffs: &mut Vec<i32>,
) -> Result<[u32; HISTOGRAM_LEN]> {
    params.check()?;
    let n = params.num_samples();
    if plane.len() != n {
        return Err(JpeglError::BufferSizeMismatch {
            expected: n,
            actual: plane.len(),
        });
    }

    let shifted: Cow<'_, [u8]> = if params.point_transform > 0 {
        Cow::Owned(plane.iter().map(|&s| s >> params.point_transform).collect())
    } else {
        Cow::Borrowed(plane)
    };

    diffs.clear();
    diffs.reserve(n);
    let mut freq = [0u32; HISTOGRAM_LEN];
    for (i, &sample) in shifted.iter().enumerate() {
        let pred = params.predictor.predict(
            &shifted,
            params.width,
            i,
            params.precision,
            params.point_transform,
        );
        let diff = sample as i32 - pred;
        let category = categorize(diff);
        if category > MAX_CATEGORY {
            return Err(JpeglError::InvalidCategory(category as u32));
        }
        freq[category as usize] += 1;
        diffs.push(diff);
    }
    Ok(freq)
}

/// Second encoder pass: Huffman code plus magnitude bits for each difference.
pub fn encode_scan(diffs: &[i32], table: &HuffmanTable) -> Result<Vec<u8>> {
    let mut writer = BitWriter::with_capacity(diffs.len() / 2);
    for &diff in diffs {
        let (bits, category) = encode_magnitude(diff);
        let (code, len) = table.encode(category)?;
        writer.write_bits(code, len);
        writer.write_bits(bits, additional_bits(category));
    }
    Ok(writer.flush())
}

/// Decode one component's entropy-coded data starting at `data[start]`.
///
/// Fills `plane` with reconstructed samples (still right-shifted by the
/// point transform) and returns the offset just past the scan's last byte.
pub fn decode_scan(
    data: &[u8],
    start: usize,
    plane: &mut [u8],
    params: &ScanParams,
    table: &HuffmanTable,
) -> Result<usize> {
    params.check()?;
    let n = params.num_samples();
    if plane.len() != n {
        return Err(JpeglError::BufferSizeMismatch {
            expected: n,
            actual: plane.len(),
        });
    }

    let mut reader = BitReader::new(data, start, data.len());
    for i in 0..n {
        let category = table.decode(&mut reader)?;
        let bits = reader.read_bits(additional_bits(category))?;
        let diff = extend(bits, category);
        let pred = params.predictor.predict(
            plane,
            params.width,
            i,
            params.precision,
            params.point_transform,
        );
        // Reconstruction wraps modulo 2^8.
        plane[i] = (pred + diff) as u8;
    }
    Ok(reader.position())
}

/// Undo the encoder's right shift once a scan is complete.
pub fn restore_point_transform(plane: &mut [u8], point_transform: u8) {
    if point_transform > 0 {
        for s in plane.iter_mut() {
            *s <<= point_transform;
        }
    }
}
