// Copyright (c) 2026 Christoph Gaffga
// SPDX-License-Identifier: GPL-3.0-only
// https://github.com/cgaffga/phasmcore

//! Huffman table (DHT) parsing and serialization.
//!
//! Lossless JPEG only uses class-0 tables; a single DHT segment may carry
//! several of them back to back.

use super::error::{JpeglError, Result};
use super::huffman::{HuffmanTable, MAX_CODE_LEN};

/// Parsed Huffman table specification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HuffmanSpec {
    /// Table ID (0–3).
    pub id: u8,
    /// Number of codes of each length (1–16).
    pub bits: [u8; MAX_CODE_LEN],
    /// Category values in order of increasing code length.
    pub huffval: Vec<u8>,
}

impl HuffmanSpec {
    /// Build the decode table this specification describes.
    pub fn to_table(&self) -> Result<HuffmanTable> {
        HuffmanTable::from_spec(self.id, &self.bits, &self.huffval)
    }
}

impl From<&HuffmanTable> for HuffmanSpec {
    fn from(table: &HuffmanTable) -> Self {
        Self {
            id: table.id,
            bits: *table.bits(),
            huffval: table.values().to_vec(),
        }
    }
}

/// Parse a DHT marker segment body (after the 2-byte length).
pub fn parse_dht(data: &[u8]) -> Result<Vec<HuffmanSpec>> {
    let mut specs = Vec::new();
    let mut pos = 0;

    while pos < data.len() {
        let tc_th = data[pos];
        pos += 1;
        let class = tc_th >> 4;
        let id = tc_th & 0x0F;

        if class != 0 {
            return Err(JpeglError::InvalidMarkerData("lossless Huffman table class must be 0"));
        }
        if id > 3 {
            return Err(JpeglError::InvalidMarkerData("Huffman table ID out of range"));
        }

        if pos + MAX_CODE_LEN > data.len() {
            return Err(JpeglError::InvalidMarkerData("truncated DHT counts"));
        }
        let mut bits = [0u8; MAX_CODE_LEN];
        bits.copy_from_slice(&data[pos..pos + MAX_CODE_LEN]);
        pos += MAX_CODE_LEN;

        let total: usize = bits.iter().map(|&b| b as usize).sum();
        if pos + total > data.len() {
            return Err(JpeglError::InvalidMarkerData("truncated DHT values"));
        }
        let huffval = data[pos..pos + total].to_vec();
        pos += total;

        specs.push(HuffmanSpec { id, bits, huffval });
    }

    Ok(specs)
}

/// Serialize one table into a DHT segment body (no marker, no length).
pub fn dht_body(spec: &HuffmanSpec) -> Vec<u8> {
    let mut out = Vec::with_capacity(1 + MAX_CODE_LEN + spec.huffval.len());
    out.push(spec.id & 0x0F);
    out.extend_from_slice(&spec.bits);
    out.extend_from_slice(&spec.huffval);
    out
}
