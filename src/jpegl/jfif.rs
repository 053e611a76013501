// Copyright (c) 2026 Christoph Gaffga
// SPDX-License-Identifier: GPL-3.0-only
// https://github.com/cgaffga/phasmcore

//! JFIF APP0 resolution header.
//!
//! Carries the scan resolution. Thumbnail fields are always written empty and
//! ignored when read.

use super::error::{JpeglError, Result};

const IDENTIFIER: &[u8; 5] = b"JFIF\0";
const CM_PER_INCH: f64 = 2.54;

/// Header body length without thumbnail data.
const BODY_LEN: usize = 14;

/// Density unit of a resolution header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DensityUnit {
    Unknown = 0,
    PixelsPerInch = 1,
    PixelsPerCm = 2,
}

impl DensityUnit {
    fn from_byte(unit: u8) -> Result<Self> {
        match unit {
            0 => Ok(Self::Unknown),
            1 => Ok(Self::PixelsPerInch),
            2 => Ok(Self::PixelsPerCm),
            other => Err(JpeglError::InvalidDensityUnit(other)),
        }
    }
}

/// Parsed JFIF APP0 header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolutionHeader {
    pub version: (u8, u8),
    pub units: DensityUnit,
    pub x_density: u16,
    pub y_density: u16,
    pub thumbnail: (u8, u8),
}

impl ResolutionHeader {
    /// Header for a scan resolution in pixels per inch; non-positive
    /// values mean the resolution is unknown.
    pub fn from_ppi(ppi: i32) -> Result<Self> {
        let (units, density) = if ppi <= 0 {
            (DensityUnit::Unknown, 1)
        } else {
            let density = u16::try_from(ppi).map_err(|_| JpeglError::InvalidResolution(ppi))?;
            (DensityUnit::PixelsPerInch, density)
        };
        Ok(Self {
            version: (1, 2),
            units,
            x_density: density,
            y_density: density,
            thumbnail: (0, 0),
        })
    }

    /// Scan resolution in pixels per inch, −1 when unknown.
    ///
    /// Only the horizontal density is used, even if the vertical differs.
    pub fn ppi(&self) -> i32 {
        match self.units {
            DensityUnit::Unknown => -1,
            DensityUnit::PixelsPerInch => self.x_density as i32,
            DensityUnit::PixelsPerCm => (self.x_density as f64 * CM_PER_INCH + 0.5) as i32,
        }
    }

    /// Parse an APP0 segment body (after the 2-byte length).
    pub fn parse(data: &[u8]) -> Result<Self> {
        if data.len() < BODY_LEN {
            return Err(JpeglError::InvalidMarkerData("truncated JFIF header"));
        }
        if &data[..5] != IDENTIFIER {
            return Err(JpeglError::InvalidMarkerData("APP0 is not a JFIF header"));
        }
        Ok(Self {
            version: (data[5], data[6]),
            units: DensityUnit::from_byte(data[7])?,
            x_density: u16::from_be_bytes([data[8], data[9]]),
            y_density: u16::from_be_bytes([data[10], data[11]]),
            thumbnail: (data[12], data[13]),
        })
    }

    /// Serialize into an APP0 segment body.
    pub fn to_body(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(BODY_LEN);
        out.extend_from_slice(IDENTIFIER);
        out.push(self.version.0);
        out.push(self.version.1);
        out.push(self.units as u8);
        out.extend_from_slice(&self.x_density.to_be_bytes());
        out.extend_from_slice(&self.y_density.to_be_bytes());
        out.push(0);
        out.push(0);
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ppi_roundtrip() {
        let header = ResolutionHeader::from_ppi(500).unwrap();
        let parsed = ResolutionHeader::parse(&header.to_body()).unwrap();
        assert_eq!(parsed.units, DensityUnit::PixelsPerInch);
        assert_eq!(parsed.ppi(), 500);
    }

    #[test]
    fn unknown_resolution() {
        let header = ResolutionHeader::from_ppi(-1).unwrap();
        assert_eq!(header.units, DensityUnit::Unknown);
        assert_eq!(header.x_density, 1);
        assert_eq!(ResolutionHeader::parse(&header.to_body()).unwrap().ppi(), -1);
    }

    #[test]
    fn pixels_per_cm_converted() {
        let mut body = ResolutionHeader::from_ppi(1).unwrap().to_body();
        body[7] = 2;
        body[8..10].copy_from_slice(&197u16.to_be_bytes());
        // 197 * 2.54 = 500.38
        assert_eq!(ResolutionHeader::parse(&body).unwrap().ppi(), 500);
    }

    #[test]
    fn illegal_unit() {
        let mut body = ResolutionHeader::from_ppi(300).unwrap().to_body();
        body[7] = 5;
        assert_eq!(
            ResolutionHeader::parse(&body),
            Err(JpeglError::InvalidDensityUnit(5))
        );
    }

    #[test]
    fn ppi_too_large() {
        assert_eq!(
            ResolutionHeader::from_ppi(70_000),
            Err(JpeglError::InvalidResolution(70_000))
        );
    }

    #[test]
    fn reject_non_jfif() {
        let body = [b'E', b'x', b'i', b'f', 0, 0, 0, 0, 0, 0, 0, 0, 0, 0];
        assert!(matches!(
            ResolutionHeader::parse(&body),
            Err(JpeglError::InvalidMarkerData(_))
        ));
    }
}
