// Copyright (c) 2026 Christoph Gaffga
// SPDX-License-Identifier: GPL-3.0-only
// https://github.com/cgaffga/phasmcore

//! Huffman coding of difference categories.
//!
//! A [`HuffmanTable`] is built either from a category histogram (encoder,
//! ITU-T T.81 Annex K) or from a DHT segment (decoder). Both paths end in the
//! same canonical code assignment (Annex C) and the same decode-acceleration
//! arrays `mincode`/`maxcode`/`valptr` (Annex F.2.2.3).

use super::bitio::BitReader;
use super::error::{JpeglError, Result};

/// Largest difference category (SSSS) in lossless JPEG.
pub const MAX_CATEGORY: u8 = 16;

/// Histogram length: one slot per category plus the reserved symbol.
pub const HISTOGRAM_LEN: usize = MAX_CATEGORY as usize + 2;

/// Index of the reserved symbol whose count is pinned to 1.
const RESERVED_SYMBOL: usize = HISTOGRAM_LEN - 1;

/// Longest code length a DHT segment can describe.
pub const MAX_CODE_LEN: usize = 16;

/// Code-size working range before length limiting (Annex K.2).
const MAX_CODE_SIZE_UNLIMITED: usize = 32;

/// Number of bits needed to represent `|diff|`; 0 for a zero difference.
///
/// Category 1 covers {−1, 1}, category 2 covers {−3..−2, 2..3}, and so on.
pub fn categorize(diff: i32) -> u8 {
    if diff == 0 {
        return 0;
    }
    (32 - diff.unsigned_abs().leading_zeros()) as u8
}

/// Number of raw magnitude bits that follow a category's Huffman code.
///
/// Category 16 carries none: its only member is the difference 32768.
pub fn additional_bits(category: u8) -> u8 {
    if category == MAX_CATEGORY {
        0
    } else {
        category
    }
}

/// Encode a difference into its magnitude bits.
/// Returns (magnitude_bits, category).
pub fn encode_magnitude(diff: i32) -> (u16, u8) {
    let category = categorize(diff);
    let size = additional_bits(category);
    if size == 0 {
        return (0, category);
    }
    // Negative values use one's complement of the magnitude
    let bits = if diff > 0 { diff } else { diff - 1 };
    ((bits as u32 & ((1u32 << size) - 1)) as u16, category)
}

/// Extend magnitude bits back to a signed difference.
///
/// Bit patterns below 2^(category−1) represent negative values.
pub fn extend(bits: u16, category: u8) -> i32 {
    match category {
        0 => 0,
        MAX_CATEGORY => 1 << 15,
        _ => {
            let half = 1i32 << (category - 1);
            let value = bits as i32;
            if value < half {
                value - (1i32 << category) + 1
            } else {
                value
            }
        }
    }
}

/// Per-component Huffman table for difference categories.
#[derive(Debug, Clone)]
pub struct HuffmanTable {
    /// Table identifier written in DHT and referenced by the scan.
    pub id: u8,
    /// Category histogram (encoder only; zeros when read from a stream).
    freq: [u32; HISTOGRAM_LEN],
    /// bits[i] = number of codes of length i+1.
    bits: [u8; MAX_CODE_LEN],
    /// Categories in order of increasing code length.
    values: Vec<u8>,
    /// (code, length) for each category; length 0 = no code.
    codes: [(u16, u8); MAX_CATEGORY as usize + 1],
    /// Indexed by code length 1..=16.
    mincode: [i32; MAX_CODE_LEN + 1],
    maxcode: [i32; MAX_CODE_LEN + 1],
    valptr: [usize; MAX_CODE_LEN + 1],
    defined: bool,
}

impl HuffmanTable {
    /// Build an optimal length-limited table from a category histogram.
    ///
    /// `freq` has one entry per category 0..=16; the reserved slot is set
    /// to 1 here regardless of its input value, so no real category ever
    /// receives the all-ones code word.
    pub fn from_frequencies(id: u8, freq: &[u32; HISTOGRAM_LEN]) -> Result<Self> {
        check_table_id(id)?;
        let mut freq = *freq;
        freq[RESERVED_SYMBOL] = 1;
        if freq[..RESERVED_SYMBOL].iter().all(|&f| f == 0) {
            // Degenerate: give category 0 a 1-bit code.
            freq[0] = 1;
        }

        let code_sizes = code_sizes(&freq);
        let bits = limit_code_lengths(&code_sizes);
        let values = sort_by_code_size(&code_sizes);

        let mut table = Self::from_spec(id, &bits, &values)?;
        table.freq = freq;
        Ok(table)
    }

    /// Build a table from DHT counts and symbol values.
    pub fn from_spec(id: u8, bits: &[u8; MAX_CODE_LEN], values: &[u8]) -> Result<Self> {
        check_table_id(id)?;
        let total: usize = bits.iter().map(|&b| b as usize).sum();
        if total != values.len() {
            return Err(JpeglError::InvalidMarkerData("DHT symbol count mismatch"));
        }
        if total == 0 {
            return Err(JpeglError::InvalidMarkerData("empty Huffman table"));
        }
        if let Some(&bad) = values.iter().find(|&&v| v > MAX_CATEGORY) {
            return Err(JpeglError::InvalidCategory(bad as u32));
        }

        let mut codes = [(0u16, 0u8); MAX_CATEGORY as usize + 1];
        let mut mincode = [0i32; MAX_CODE_LEN + 1];
        let mut maxcode = [-1i32; MAX_CODE_LEN + 1];
        let mut valptr = [0usize; MAX_CODE_LEN + 1];

        // Canonical code assignment per ITU-T T.81 Annex C
        let mut code: u32 = 0;
        let mut k = 0usize;
        for length in 1..=MAX_CODE_LEN {
            let count = bits[length - 1] as usize;
            if count > 0 {
                valptr[length] = k;
                mincode[length] = code as i32;
                for _ in 0..count {
                    if code >= (1u32 << length) {
                        return Err(JpeglError::InvalidMarkerData("Huffman code space overflow"));
                    }
                    let category = values[k] as usize;
                    if codes[category].1 != 0 {
                        return Err(JpeglError::InvalidMarkerData("duplicate Huffman symbol"));
                    }
                    codes[category] = (code as u16, length as u8);
                    code += 1;
                    k += 1;
                }
                maxcode[length] = code as i32 - 1;
            }
            code <<= 1;
        }

        Ok(Self {
            id,
            freq: [0; HISTOGRAM_LEN],
            bits: *bits,
            values: values.to_vec(),
            codes,
            mincode,
            maxcode,
            valptr,
            defined: true,
        })
    }

    /// Encode a category: returns (code_bits, code_length).
    pub fn encode(&self, category: u8) -> Result<(u16, u8)> {
        if category > MAX_CATEGORY {
            return Err(JpeglError::InvalidCategory(category as u32));
        }
        let (code, len) = self.codes[category as usize];
        if len == 0 {
            Err(JpeglError::InvalidCategory(category as u32))
        } else {
            Ok((code, len))
        }
    }

    /// Decode one category from the bit stream, one bit at a time.
    pub fn decode(&self, reader: &mut BitReader) -> Result<u8> {
        let mut code = reader.read_bit()? as i32;
        let mut length = 1usize;
        while code > self.maxcode[length] {
            length += 1;
            if length > MAX_CODE_LEN {
                return Err(JpeglError::HuffmanDecode {
                    offset: reader.position(),
                });
            }
            code = (code << 1) | reader.read_bit()? as i32;
        }
        let index = self.valptr[length] + (code - self.mincode[length]) as usize;
        self.values
            .get(index)
            .copied()
            .ok_or(JpeglError::HuffmanDecode {
                offset: reader.position(),
            })
    }

    /// Counts of codes per length (index 0 = length 1).
    pub fn bits(&self) -> &[u8; MAX_CODE_LEN] {
        &self.bits
    }

    /// Categories in code order.
    pub fn values(&self) -> &[u8] {
        &self.values
    }

    /// Category histogram the table was built from, reserved slot included.
    pub fn frequencies(&self) -> &[u32; HISTOGRAM_LEN] {
        &self.freq
    }

    /// (code, length) for a category, `None` if it has no code.
    pub fn code(&self, category: u8) -> Option<(u16, u8)> {
        self.codes
            .get(category as usize)
            .copied()
            .filter(|&(_, len)| len > 0)
    }

    pub fn mincode(&self, length: usize) -> i32 {
        self.mincode[length]
    }

    pub fn maxcode(&self, length: usize) -> i32 {
        self.maxcode[length]
    }

    pub fn valptr(&self, length: usize) -> usize {
        self.valptr[length]
    }

    pub fn is_defined(&self) -> bool {
        self.defined
    }
}

fn check_table_id(id: u8) -> Result<()> {
    if id > 3 {
        return Err(JpeglError::InvalidMarkerData("Huffman table ID out of range"));
    }
    Ok(())
}

/// Figure K.1: find the code size of every symbol.
///
/// Repeatedly merges the two least frequent symbols (ties go to the higher
/// symbol value) and lengthens every code in both merged branches.
fn code_sizes(freq: &[u32; HISTOGRAM_LEN]) -> [usize; HISTOGRAM_LEN] {
    let mut freq: [u64; HISTOGRAM_LEN] = freq.map(u64::from);
    let mut code_size = [0usize; HISTOGRAM_LEN];
    let mut others: [Option<usize>; HISTOGRAM_LEN] = [None; HISTOGRAM_LEN];

    loop {
        let mut v1: Option<usize> = None;
        for (i, &f) in freq.iter().enumerate() {
            if f > 0 && v1.map_or(true, |v| f <= freq[v]) {
                v1 = Some(i);
            }
        }
        let mut v2: Option<usize> = None;
        for (i, &f) in freq.iter().enumerate() {
            if f > 0 && Some(i) != v1 && v2.map_or(true, |v| f <= freq[v]) {
                v2 = Some(i);
            }
        }
        let (mut v1, mut v2) = match (v1, v2) {
            (Some(a), Some(b)) => (a, b),
            _ => break,
        };

        freq[v1] += freq[v2];
        freq[v2] = 0;

        code_size[v1] += 1;
        while let Some(next) = others[v1] {
            v1 = next;
            code_size[v1] += 1;
        }
        others[v1] = Some(v2);

        code_size[v2] += 1;
        while let Some(next) = others[v2] {
            v2 = next;
            code_size[v2] += 1;
        }
    }

    code_size
}

/// Figures K.2 and K.3: count codes per size, cap lengths at 16 bits and
/// drop the reserved code point.
fn limit_code_lengths(code_sizes: &[usize; HISTOGRAM_LEN]) -> [u8; MAX_CODE_LEN] {
    let mut counts = [0u32; MAX_CODE_SIZE_UNLIMITED + 1];
    for &size in code_sizes {
        if size > 0 {
            counts[size] += 1;
        }
    }

    let mut i = MAX_CODE_SIZE_UNLIMITED;
    while i > MAX_CODE_LEN {
        if counts[i] > 0 {
            // Borrow a prefix from the next shorter non-empty length.
            let mut j = i - 2;
            while counts[j] == 0 {
                j -= 1;
            }
            counts[i] -= 2;
            counts[i - 1] += 1;
            counts[j + 1] += 2;
            counts[j] -= 1;
        } else {
            i -= 1;
        }
    }

    while i > 0 && counts[i] == 0 {
        i -= 1;
    }
    if i > 0 {
        counts[i] -= 1;
    }

    let mut bits = [0u8; MAX_CODE_LEN];
    for len in 1..=MAX_CODE_LEN {
        bits[len - 1] = counts[len] as u8;
    }
    bits
}

/// Figure K.4: list real symbols by increasing code size, then value.
fn sort_by_code_size(code_sizes: &[usize; HISTOGRAM_LEN]) -> Vec<u8> {
    let mut values = Vec::with_capacity(RESERVED_SYMBOL);
    for size in 1..=MAX_CODE_SIZE_UNLIMITED {
        for (symbol, &s) in code_sizes.iter().enumerate().take(RESERVED_SYMBOL) {
            if s == size {
                values.push(symbol as u8);
            }
        }
    }
    values
}
