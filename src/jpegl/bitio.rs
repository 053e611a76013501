// Copyright (c) 2026 Christoph Gaffga
// SPDX-License-Identifier: GPL-3.0-only
// https://github.com/cgaffga/phasmcore

//! Bit-level I/O for JPEGL entropy-coded data.
//!
//! Provides [`BitReader`] for decoding and [`BitWriter`] for encoding the
//! entropy-coded scan data. Both handle JPEG byte-stuffing (0xFF -> 0xFF 0x00)
//! and operate in MSB-first bit order. Each reader carries its own cursor, so
//! any number of scans can be read concurrently.

use super::error::{JpeglError, Result};

/// Bit-level reader for JPEGL entropy-coded data.
///
/// Unlike a baseline reader, a marker inside scan data is never legal here:
/// every 0xFF must be followed by a stuffed 0x00.
pub struct BitReader<'a> {
    data: &'a [u8],
    pos: usize,
    end: usize,
    /// Most recently read byte. Valid bits are the low `bits_left` bits.
    byte: u8,
    bits_left: u8,
}

impl<'a> BitReader<'a> {
    /// Create a reader over `data[pos..end]`.
    pub fn new(data: &'a [u8], pos: usize, end: usize) -> Self {
        Self {
            data,
            pos,
            end: end.min(data.len()),
            byte: 0,
            bits_left: 0,
        }
    }

    /// Read `count` bits (0–16) and return them right-aligned.
    pub fn read_bits(&mut self, count: u8) -> Result<u16> {
        debug_assert!(count <= 16);
        let mut value = 0u32;
        let mut needed = count;
        while needed > 0 {
            if self.bits_left == 0 {
                self.fill_byte()?;
            }
            let take = needed.min(self.bits_left);
            let shift = self.bits_left - take;
            let chunk = (self.byte >> shift) & (((1u16 << take) - 1) as u8);
            value = (value << take) | chunk as u32;
            self.bits_left -= take;
            needed -= take;
        }
        Ok(value as u16)
    }

    /// Read a single bit.
    pub fn read_bit(&mut self) -> Result<u16> {
        self.read_bits(1)
    }

    /// Byte position of the next unread byte. Bits still buffered from the
    /// current byte are padding once a scan has been fully decoded.
    pub fn position(&self) -> usize {
        self.pos
    }

    fn fill_byte(&mut self) -> Result<()> {
        if self.pos >= self.end {
            return Err(JpeglError::UnexpectedEof { offset: self.pos });
        }
        let byte = self.data[self.pos];
        self.pos += 1;

        if byte == 0xFF {
            if self.pos >= self.end {
                return Err(JpeglError::UnexpectedEof { offset: self.pos });
            }
            let next = self.data[self.pos];
            if next != 0x00 {
                return Err(JpeglError::NoStuffedZero {
                    offset: self.pos,
                    found: next,
                });
            }
            self.pos += 1;
        }

        self.byte = byte;
        self.bits_left = 8;
        Ok(())
    }
}

/// Bit-level writer for JPEGL entropy-coded data.
///
/// Handles byte-stuffing (0xFF → 0xFF 0x00). MSB-first bit order.
pub struct BitWriter {
    output: Vec<u8>,
    buf: u8,
    bits_used: u8,
}

impl BitWriter {
    pub fn new() -> Self {
        Self::with_capacity(0)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            output: Vec::with_capacity(capacity),
            buf: 0,
            bits_used: 0,
        }
    }

    /// Write `count` bits (0–16) from the low bits of `value`.
    pub fn write_bits(&mut self, value: u16, count: u8) {
        debug_assert!(count <= 16);
        for i in (0..count).rev() {
            let bit = (value >> i) & 1;
            self.buf = (self.buf << 1) | (bit as u8);
            self.bits_used += 1;
            if self.bits_used == 8 {
                self.emit_byte(self.buf);
                self.buf = 0;
                self.bits_used = 0;
            }
        }
    }

    /// Number of bytes emitted so far, stuffing included.
    pub fn len(&self) -> usize {
        self.output.len()
    }

    pub fn is_empty(&self) -> bool {
        self.output.is_empty() && self.bits_used == 0
    }

    /// Pad remaining bits with 1s and flush.
    pub fn flush(mut self) -> Vec<u8> {
        if self.bits_used > 0 {
            let remaining = 8 - self.bits_used;
            self.buf = (self.buf << remaining) | ((1u8 << remaining) - 1);
            self.emit_byte(self.buf);
        }
        self.output
    }

    fn emit_byte(&mut self, byte: u8) {
        self.output.push(byte);
        if byte == 0xFF {
            self.output.push(0x00);
        }
    }
}

impl Default for BitWriter {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn read_basic_bits() {
        // 0xA5 = 1010_0101
        let data = [0xA5];
        let mut r = BitReader::new(&data, 0, data.len());
        assert_eq!(r.read_bits(4).unwrap(), 0b1010);
        assert_eq!(r.read_bits(4).unwrap(), 0b0101);
    }

    #[test]
    fn read_cross_byte() {
        let data = [0xFF, 0x00, 0x80];
        let mut r = BitReader::new(&data, 0, data.len());
        assert_eq!(r.read_bits(12).unwrap(), 0xFF8);
    }

    #[test]
    fn read_sixteen_bits_spanning_three_bytes() {
        let data = [0x0F, 0xAB, 0xC0];
        let mut r = BitReader::new(&data, 0, data.len());
        assert_eq!(r.read_bits(4).unwrap(), 0x0);
        assert_eq!(r.read_bits(16).unwrap(), 0xFABC);
        assert_eq!(r.position(), 3);
    }

    #[test]
    fn zero_bit_read_consumes_nothing() {
        let data = [0x80];
        let mut r = BitReader::new(&data, 0, data.len());
        assert_eq!(r.read_bits(0).unwrap(), 0);
        assert_eq!(r.position(), 0);
        assert_eq!(r.read_bit().unwrap(), 1);
    }

    #[test]
    fn byte_stuffing_decode() {
        let data = [0xFF, 0x00];
        let mut r = BitReader::new(&data, 0, data.len());
        assert_eq!(r.read_bits(8).unwrap(), 0xFF);
        assert_eq!(r.position(), 2);
    }

    #[test]
    fn missing_stuffed_zero_is_corrupt() {
        let data = [0xAB, 0xFF, 0xD9];
        let mut r = BitReader::new(&data, 0, data.len());
        assert_eq!(r.read_bits(8).unwrap(), 0xAB);
        assert_eq!(
            r.read_bits(8),
            Err(JpeglError::NoStuffedZero { offset: 2, found: 0xD9 })
        );
    }

    #[test]
    fn read_past_end() {
        let data = [0x12, 0x34];
        let mut r = BitReader::new(&data, 0, 1);
        assert_eq!(r.read_bits(8).unwrap(), 0x12);
        assert_eq!(r.read_bit(), Err(JpeglError::UnexpectedEof { offset: 1 }));
    }

    #[test]
    fn write_basic() {
        let mut w = BitWriter::new();
        w.write_bits(0b1010, 4);
        w.write_bits(0b0101, 4);
        assert_eq!(w.flush(), vec![0xA5]);
    }

    #[test]
    fn write_byte_stuffing() {
        let mut w = BitWriter::new();
        w.write_bits(0xFF, 8);
        assert_eq!(w.flush(), vec![0xFF, 0x00]);
    }

    #[test]
    fn write_padding_uses_ones() {
        let mut w = BitWriter::new();
        w.write_bits(0b110, 3);
        // 110_11111
        assert_eq!(w.flush(), vec![0xDF]);
    }

    #[test]
    fn padding_to_ff_is_stuffed() {
        let mut w = BitWriter::new();
        w.write_bits(0b1111, 4);
        assert_eq!(w.flush(), vec![0xFF, 0x00]);
    }

    #[test]
    fn write_cross_byte() {
        let mut w = BitWriter::new();
        w.write_bits(0b1111_1111_1000, 12);
        assert_eq!(w.flush(), vec![0xFF, 0x00, 0x8F]);
    }

    #[test]
    fn destuffing_recovers_written_bits() {
        let fields: [(u16, u8); 6] = [
            (0x1FF, 9),
            (0xFF, 8),
            (0, 0),
            (0b1, 1),
            (0xFFFF, 16),
            (0b10, 2),
        ];
        let mut w = BitWriter::new();
        for &(v, n) in &fields {
            w.write_bits(v, n);
        }
        let out = w.flush();
        for pair in out.windows(2) {
            if pair[0] == 0xFF {
                assert_eq!(pair[1], 0x00);
            }
        }
        let mut r = BitReader::new(&out, 0, out.len());
        for &(v, n) in &fields {
            assert_eq!(r.read_bits(n).unwrap(), v);
        }
        assert_eq!(r.position(), out.len());
    }
}
