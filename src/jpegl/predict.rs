// Copyright (c) 2026 Christoph Gaffga
// SPDX-License-Identifier: GPL-3.0-only
// https://github.com/cgaffga/phasmcore

//! Spatial prediction over causal neighbours (ITU-T T.81 Table H.1).
//!
//! Samples are visited in row-major order; a prediction only reads samples
//! at lower indices of the same plane, so the decoder can form the identical
//! prediction from samples it has already reconstructed.

use super::error::{JpeglError, Result};

/// Lossless predictor selection.
///
/// With `a` = left, `b` = above and `c` = above-left neighbour:
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Predictor {
    /// a
    Left = 1,
    /// b
    Above = 2,
    /// c
    AboveLeft = 3,
    /// a + b − c
    Planar = 4,
    /// a + ((b − c) >> 1)
    LeftGradient = 5,
    /// b + ((a − c) >> 1)
    AboveGradient = 6,
    /// (a + b) / 2
    Average = 7,
}

impl Predictor {
    pub const ALL: [Predictor; 7] = [
        Predictor::Left,
        Predictor::Above,
        Predictor::AboveLeft,
        Predictor::Planar,
        Predictor::LeftGradient,
        Predictor::AboveGradient,
        Predictor::Average,
    ];

    /// Map a scan-header selector (Ss) to a predictor.
    pub fn from_selector(selector: u8) -> Result<Self> {
        match selector {
            1 => Ok(Self::Left),
            2 => Ok(Self::Above),
            3 => Ok(Self::AboveLeft),
            4 => Ok(Self::Planar),
            5 => Ok(Self::LeftGradient),
            6 => Ok(Self::AboveGradient),
            7 => Ok(Self::Average),
            other => Err(JpeglError::InvalidPredictor(other)),
        }
    }

    /// Selector value written to the scan header.
    pub fn selector(self) -> u8 {
        self as u8
    }

    /// Predict the sample at `index` of a plane `width` samples wide.
    ///
    /// `precision` is the stored sample depth and `point_transform` the
    /// right-shift already applied to the plane's samples; it must be below
    /// `precision`.
    pub fn predict(self, plane: &[u8], width: usize, index: usize, precision: u8, point_transform: u8) -> i32 {
        if index == 0 {
            return 1 << (precision - point_transform - 1);
        }
        if index < width {
            return plane[index - 1] as i32;
        }
        if index % width == 0 {
            return plane[index - width] as i32;
        }

        let a = plane[index - 1] as i32;
        let b = plane[index - width] as i32;
        let c = plane[index - width - 1] as i32;
        match self {
            Self::Left => a,
            Self::Above => b,
            Self::AboveLeft => c,
            Self::Planar => a + b - c,
            Self::LeftGradient => a + ((b - c) >> 1),
            Self::AboveGradient => b + ((a - c) >> 1),
            Self::Average => (a + b) / 2,
        }
    }
}

impl Default for Predictor {
    fn default() -> Self {
        Self::Planar
    }
}

impl TryFrom<u8> for Predictor {
    type Error = JpeglError;

    fn try_from(selector: u8) -> Result<Self> {
        Self::from_selector(selector)
    }
}

/// Predict a sample from a raw mode selector (1..=7).
pub fn predict(
    plane: &[u8],
    width: usize,
    index: usize,
    precision: u8,
    mode: u8,
    point_transform: u8,
) -> Result<i32> {
    let predictor = Predictor::from_selector(mode)?;
    if point_transform >= precision {
        return Err(JpeglError::InvalidPointTransform {
            value: point_transform,
            precision,
        });
    }
    Ok(predictor.predict(plane, width, index, precision, point_transform))
}
