// Copyright (c) 2026 Christoph Gaffga
// SPDX-License-Identifier: GPL-3.0-only
// https://github.com/cgaffga/phasmcore

//! Lossless frame header (SOF3) parsing and serialization.
//!
//! Extracts image dimensions and per-component sampling factors, and derives
//! each component plane's size from them.

use super::error::{JpeglError, Result};

/// Only 8-bit samples are supported.
pub const SAMPLE_PRECISION: u8 = 8;
/// Largest number of components in one frame.
pub const MAX_COMPONENTS: usize = 4;
/// Largest sampling factor in either direction.
pub const MAX_SAMPLING: u8 = 4;

/// Information about one image component from SOF3.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrameComponent {
    /// Component identifier referenced by scan headers.
    pub id: u8,
    /// Horizontal sampling factor (1–4).
    pub h_sampling: u8,
    /// Vertical sampling factor (1–4).
    pub v_sampling: u8,
    /// Quantization table selector. Unused by the lossless process, always 0 on write.
    pub tq: u8,
}

/// Frame information parsed from an SOF3 marker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrameHeader {
    /// Sample precision in bits (must be 8).
    pub precision: u8,
    /// Image height in pixels.
    pub height: u16,
    /// Image width in pixels.
    pub width: u16,
    /// Components in the frame.
    pub components: Vec<FrameComponent>,
}

impl FrameHeader {
    pub fn max_h_sampling(&self) -> u8 {
        self.components.iter().map(|c| c.h_sampling).max().unwrap_or(1)
    }

    pub fn max_v_sampling(&self) -> u8 {
        self.components.iter().map(|c| c.v_sampling).max().unwrap_or(1)
    }

    /// Width and height of component `comp_idx`'s plane.
    pub fn plane_dimensions(&self, comp_idx: usize) -> (usize, usize) {
        let comp = &self.components[comp_idx];
        (
            plane_extent(self.width as usize, comp.h_sampling, self.max_h_sampling()),
            plane_extent(self.height as usize, comp.v_sampling, self.max_v_sampling()),
        )
    }

    /// Index of the component with identifier `id`.
    pub fn component_index(&self, id: u8) -> Result<usize> {
        self.components
            .iter()
            .position(|c| c.id == id)
            .ok_or(JpeglError::UnknownComponentId(id))
    }

    /// Serialize into an SOF3 segment body.
    pub fn to_body(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(6 + 3 * self.components.len());
        out.push(self.precision);
        out.extend_from_slice(&self.height.to_be_bytes());
        out.extend_from_slice(&self.width.to_be_bytes());
        out.push(self.components.len() as u8);
        for c in &self.components {
            out.push(c.id);
            out.push((c.h_sampling << 4) | c.v_sampling);
            out.push(c.tq);
        }
        out
    }
}

/// Size of a subsampled plane along one axis: `ceil(full * factor / max)`.
pub fn plane_extent(full: usize, factor: u8, max: u8) -> usize {
    let (factor, max) = (factor as usize, max as usize);
    (full * factor + max - 1) / max
}

/// Parse an SOF3 marker segment body (after the 2-byte length).
pub fn parse_sof(data: &[u8]) -> Result<FrameHeader> {
    if data.len() < 6 {
        return Err(JpeglError::InvalidMarkerData("truncated SOF3 header"));
    }

    let precision = data[0];
    if precision != SAMPLE_PRECISION {
        return Err(JpeglError::UnsupportedPrecision(precision));
    }

    let height = u16::from_be_bytes([data[1], data[2]]);
    let width = u16::from_be_bytes([data[3], data[4]]);
    if width == 0 || height == 0 {
        return Err(JpeglError::InvalidDimensions {
            width: width as usize,
            height: height as usize,
        });
    }

    let num_components = data[5] as usize;
    if num_components == 0 || num_components > MAX_COMPONENTS {
        return Err(JpeglError::InvalidComponentCount(num_components));
    }
    if data.len() < 6 + num_components * 3 {
        return Err(JpeglError::InvalidMarkerData("truncated SOF3 component list"));
    }

    let mut components = Vec::with_capacity(num_components);
    for i in 0..num_components {
        let offset = 6 + i * 3;
        let id = data[offset];
        let h = data[offset + 1] >> 4;
        let v = data[offset + 1] & 0x0F;
        check_sampling(h, v)?;
        if components.iter().any(|c: &FrameComponent| c.id == id) {
            return Err(JpeglError::InvalidMarkerData("duplicate component ID in SOF3"));
        }
        components.push(FrameComponent {
            id,
            h_sampling: h,
            v_sampling: v,
            tq: data[offset + 2],
        });
    }

    Ok(FrameHeader {
        precision,
        height,
        width,
        components,
    })
}

/// Sampling factors must both lie in 1..=4.
pub fn check_sampling(h: u8, v: u8) -> Result<()> {
    if (1..=MAX_SAMPLING).contains(&h) && (1..=MAX_SAMPLING).contains(&v) {
        Ok(())
    } else {
        Err(JpeglError::InvalidSamplingFactor { h, v })
    }
}
