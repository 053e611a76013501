// Copyright (c) 2026 Christoph Gaffga
// SPDX-License-Identifier: GPL-3.0-only
// https://github.com/cgaffga/phasmcore

//! Image descriptor: component planes plus the metadata shared by the encoder
//! and decoder.

use super::error::{JpeglError, Result};
use super::frame::{check_sampling, plane_extent, FrameComponent, FrameHeader, SAMPLE_PRECISION};
use super::predict::Predictor;
use super::scan::ScanParams;

/// Caller-supplied raw pixels to encode.
///
/// `pixels` holds the component planes back to back, each plane row-major
/// and sized by its sampling factors.
#[derive(Debug, Clone)]
pub struct RawImage<'a> {
    pub pixels: &'a [u8],
    pub width: usize,
    pub height: usize,
    /// Bits per pixel: 8 (one component) or 24 (three components).
    pub depth: u8,
    /// Scan resolution in pixels per inch, −1 when unknown.
    pub ppi: i32,
    /// (H, V) sampling factors per component; empty means all 1×1.
    pub sampling: Vec<(u8, u8)>,
}

impl<'a> RawImage<'a> {
    pub fn gray(pixels: &'a [u8], width: usize, height: usize, ppi: i32) -> Self {
        Self {
            pixels,
            width,
            height,
            depth: 8,
            ppi,
            sampling: Vec::new(),
        }
    }

    pub fn color(
        pixels: &'a [u8],
        width: usize,
        height: usize,
        ppi: i32,
        sampling: [(u8, u8); 3],
    ) -> Self {
        Self {
            pixels,
            width,
            height,
            depth: 24,
            ppi,
            sampling: sampling.to_vec(),
        }
    }

    pub fn num_components(&self) -> usize {
        self.depth as usize / 8
    }
}

/// Owned raw pixels flattened from a decoded image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawPixmap {
    pub pixels: Vec<u8>,
    pub width: usize,
    pub height: usize,
    pub depth: u8,
    pub ppi: i32,
    pub sampling: Vec<(u8, u8)>,
}

impl RawPixmap {
    pub fn as_raw_image(&self) -> RawImage<'_> {
        RawImage {
            pixels: &self.pixels,
            width: self.width,
            height: self.height,
            depth: self.depth,
            ppi: self.ppi,
            sampling: self.sampling.clone(),
        }
    }
}

/// One component plane of an [`ImageData`].
#[derive(Debug, Clone)]
pub struct ComponentPlane {
    pub id: u8,
    pub h_sampling: u8,
    pub v_sampling: u8,
    pub width: usize,
    pub height: usize,
    pub predictor: Predictor,
    pub point_transform: u8,
    pixels: Option<Vec<u8>>,
    diffs: Option<Vec<i32>>,
}

impl ComponentPlane {
    /// Plane samples, `None` until the plane is filled.
    pub fn pixels(&self) -> Option<&[u8]> {
        self.pixels.as_deref()
    }

    /// Prediction differences from the last encode.
    pub fn differences(&self) -> Option<&[i32]> {
        self.diffs.as_deref()
    }

    pub fn num_samples(&self) -> usize {
        self.width * self.height
    }

    pub fn scan_params(&self) -> ScanParams {
        ScanParams {
            width: self.width,
            height: self.height,
            precision: SAMPLE_PRECISION,
            predictor: self.predictor,
            point_transform: self.point_transform,
        }
    }

    /// Pixel plane and difference buffer, allocating the latter on first use.
    pub(crate) fn encode_buffers(&mut self) -> Option<(&[u8], &mut Vec<i32>)> {
        let pixels = self.pixels.as_deref()?;
        let diffs = self.diffs.get_or_insert_with(Vec::new);
        Some((pixels, diffs))
    }
}

/// Component planes and shared metadata of one image.
#[derive(Debug, Clone)]
pub struct ImageData {
    width: usize,
    height: usize,
    depth: u8,
    ppi: i32,
    components: Vec<ComponentPlane>,
    comments: Vec<Vec<u8>>,
}

impl ImageData {
    /// Split raw pixels into component planes ready for non-interleaved encoding.
    pub fn setup_encode(raw: &RawImage, predictor: Predictor, point_transform: u8) -> Result<Self> {
        let num_components = match raw.depth {
            8 => 1,
            24 => 3,
            depth => {
                return Err(JpeglError::InvalidDepth {
                    depth,
                    components: raw.sampling.len(),
                })
            }
        };
        let sampling = if raw.sampling.is_empty() {
            vec![(1, 1); num_components]
        } else {
            raw.sampling.clone()
        };
        if sampling.len() != num_components {
            return Err(JpeglError::InvalidDepth {
                depth: raw.depth,
                components: sampling.len(),
            });
        }
        if raw.width == 0
            || raw.height == 0
            || raw.width > u16::MAX as usize
            || raw.height > u16::MAX as usize
        {
            return Err(JpeglError::InvalidDimensions {
                width: raw.width,
                height: raw.height,
            });
        }
        if point_transform >= SAMPLE_PRECISION {
            return Err(JpeglError::InvalidPointTransform {
                value: point_transform,
                precision: SAMPLE_PRECISION,
            });
        }
        for &(h, v) in &sampling {
            check_sampling(h, v)?;
        }

        let max_h = sampling.iter().map(|s| s.0).max().unwrap_or(1);
        let max_v = sampling.iter().map(|s| s.1).max().unwrap_or(1);
        let dims: Vec<(usize, usize)> = sampling
            .iter()
            .map(|&(h, v)| (plane_extent(raw.width, h, max_h), plane_extent(raw.height, v, max_v)))
            .collect();
        let expected: usize = dims.iter().map(|&(w, h)| w * h).sum();
        if raw.pixels.len() != expected {
            return Err(JpeglError::BufferSizeMismatch {
                expected,
                actual: raw.pixels.len(),
            });
        }

        let mut offset = 0;
        let components = sampling
            .iter()
            .zip(&dims)
            .enumerate()
            .map(|(i, (&(h, v), &(w, ht)))| {
                let plane = raw.pixels[offset..offset + w * ht].to_vec();
                offset += w * ht;
                ComponentPlane {
                    id: i as u8,
                    h_sampling: h,
                    v_sampling: v,
                    width: w,
                    height: ht,
                    predictor,
                    point_transform,
                    pixels: Some(plane),
                    diffs: None,
                }
            })
            .collect();

        Ok(Self {
            width: raw.width,
            height: raw.height,
            depth: raw.depth,
            ppi: raw.ppi,
            components,
            comments: Vec::new(),
        })
    }

    /// Descriptor for a decoded frame; planes stay empty until their scan arrives.
    pub fn setup_decode(ppi: i32, frame: &FrameHeader) -> Result<Self> {
        let components = frame
            .components
            .iter()
            .enumerate()
            .map(|(i, c)| {
                let (width, height) = frame.plane_dimensions(i);
                ComponentPlane {
                    id: c.id,
                    h_sampling: c.h_sampling,
                    v_sampling: c.v_sampling,
                    width,
                    height,
                    predictor: Predictor::default(),
                    point_transform: 0,
                    pixels: None,
                    diffs: None,
                }
            })
            .collect();
        let depth = u8::try_from(frame.components.len() * frame.precision as usize)
            .map_err(|_| JpeglError::InvalidComponentCount(frame.components.len()))?;
        Ok(Self {
            width: frame.width as usize,
            height: frame.height as usize,
            depth,
            ppi,
            components,
            comments: Vec::new(),
        })
    }

    /// Record a scan's coding parameters and give its component a zeroed plane.
    pub fn update_decode(
        &mut self,
        comp_idx: usize,
        predictor: Predictor,
        point_transform: u8,
    ) -> Result<ScanParams> {
        if point_transform >= SAMPLE_PRECISION {
            return Err(JpeglError::InvalidPointTransform {
                value: point_transform,
                precision: SAMPLE_PRECISION,
            });
        }
        let comp = self
            .components
            .get_mut(comp_idx)
            .ok_or(JpeglError::MissingComponentScan(comp_idx))?;
        comp.predictor = predictor;
        comp.point_transform = point_transform;
        let n = comp.num_samples();
        comp.pixels = Some(vec![0; n]);
        Ok(comp.scan_params())
    }

    /// Choose the predictor and point transform one component is encoded with.
    pub fn set_coding(
        &mut self,
        comp_idx: usize,
        predictor: Predictor,
        point_transform: u8,
    ) -> Result<()> {
        if point_transform >= SAMPLE_PRECISION {
            return Err(JpeglError::InvalidPointTransform {
                value: point_transform,
                precision: SAMPLE_PRECISION,
            });
        }
        let comp = self
            .components
            .get_mut(comp_idx)
            .ok_or(JpeglError::MissingComponentScan(comp_idx))?;
        comp.predictor = predictor;
        comp.point_transform = point_transform;
        Ok(())
    }

    /// Mutable plane samples of a component.
    pub fn plane_mut(&mut self, comp_idx: usize) -> Option<&mut [u8]> {
        self.components.get_mut(comp_idx)?.pixels.as_deref_mut()
    }

    /// Frame header describing this image.
    pub fn frame_header(&self) -> FrameHeader {
        FrameHeader {
            precision: SAMPLE_PRECISION,
            height: self.height as u16,
            width: self.width as u16,
            components: self
                .components
                .iter()
                .map(|c| FrameComponent {
                    id: c.id,
                    h_sampling: c.h_sampling,
                    v_sampling: c.v_sampling,
                    tq: 0,
                })
                .collect(),
        }
    }

    /// Flatten all planes into one buffer, in component order.
    pub fn to_raw(&self) -> Result<RawPixmap> {
        let mut pixels = Vec::with_capacity(self.uncompressed_len());
        for (i, c) in self.components.iter().enumerate() {
            pixels.extend_from_slice(c.pixels().ok_or(JpeglError::MissingComponentScan(i))?);
        }
        Ok(RawPixmap {
            pixels,
            width: self.width,
            height: self.height,
            depth: self.depth,
            ppi: self.ppi,
            sampling: self
                .components
                .iter()
                .map(|c| (c.h_sampling, c.v_sampling))
                .collect(),
        })
    }

    /// Drop the encoder's difference buffers.
    pub fn release_scratch(&mut self) {
        for c in &mut self.components {
            c.diffs = None;
        }
    }

    /// Consume the descriptor, keeping only the planes.
    pub fn into_planes(self) -> Vec<Option<Vec<u8>>> {
        self.components.into_iter().map(|c| c.pixels).collect()
    }

    /// Total samples over all planes.
    pub fn uncompressed_len(&self) -> usize {
        self.components.iter().map(ComponentPlane::num_samples).sum()
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn depth(&self) -> u8 {
        self.depth
    }

    pub fn ppi(&self) -> i32 {
        self.ppi
    }

    pub fn num_components(&self) -> usize {
        self.components.len()
    }

    pub fn component(&self, idx: usize) -> Option<&ComponentPlane> {
        self.components.get(idx)
    }

    pub fn components(&self) -> &[ComponentPlane] {
        &self.components
    }

    pub(crate) fn components_mut(&mut self) -> &mut [ComponentPlane] {
        &mut self.components
    }

    /// COM payloads read during decode.
    pub fn comments(&self) -> &[Vec<u8>] {
        &self.comments
    }

    pub(crate) fn set_comments(&mut self, comments: Vec<Vec<u8>>) {
        self.comments = comments;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gray_setup() {
        let pixels: Vec<u8> = (0..12).collect();
        let raw = RawImage::gray(&pixels, 4, 3, 500);
        let img = ImageData::setup_encode(&raw, Predictor::Left, 0).unwrap();
        assert_eq!(img.num_components(), 1);
        assert_eq!(img.depth(), 8);
        let c = img.component(0).unwrap();
        assert_eq!((c.width, c.height), (4, 3));
        assert_eq!(c.pixels().unwrap(), &pixels[..]);
        assert!(c.differences().is_none());
    }

    #[test]
    fn subsampled_color_setup() {
        // 5x5 luma, 3x3 chroma
        let pixels = vec![1u8; 25 + 9 + 9];
        let raw = RawImage::color(&pixels, 5, 5, -1, [(2, 2), (1, 1), (1, 1)]);
        let img = ImageData::setup_encode(&raw, Predictor::Planar, 0).unwrap();
        let dims: Vec<_> = img.components().iter().map(|c| (c.width, c.height)).collect();
        assert_eq!(dims, vec![(5, 5), (3, 3), (3, 3)]);
        assert_eq!(img.uncompressed_len(), 43);
    }

    #[test]
    fn reject_bad_depth() {
        let pixels = vec![0u8; 4];
        let mut raw = RawImage::gray(&pixels, 2, 2, -1);
        raw.depth = 16;
        assert!(matches!(
            ImageData::setup_encode(&raw, Predictor::Left, 0),
            Err(JpeglError::InvalidDepth { depth: 16, .. })
        ));
    }

    #[test]
    fn reject_sampling_count_mismatch() {
        let pixels = vec![0u8; 4];
        let mut raw = RawImage::gray(&pixels, 2, 2, -1);
        raw.sampling = vec![(1, 1), (1, 1)];
        assert!(matches!(
            ImageData::setup_encode(&raw, Predictor::Left, 0),
            Err(JpeglError::InvalidDepth { depth: 8, components: 2 })
        ));
    }

    #[test]
    fn reject_buffer_mismatch() {
        let pixels = vec![0u8; 5];
        let raw = RawImage::gray(&pixels, 2, 2, -1);
        assert_eq!(
            ImageData::setup_encode(&raw, Predictor::Left, 0).unwrap_err(),
            JpeglError::BufferSizeMismatch { expected: 4, actual: 5 }
        );
    }

    #[test]
    fn reject_zero_and_oversized_dimensions() {
        let pixels: Vec<u8> = Vec::new();
        let raw = RawImage::gray(&pixels, 0, 3, -1);
        assert!(matches!(
            ImageData::setup_encode(&raw, Predictor::Left, 0),
            Err(JpeglError::InvalidDimensions { .. })
        ));
        let raw = RawImage::gray(&pixels, 70_000, 1, -1);
        assert!(matches!(
            ImageData::setup_encode(&raw, Predictor::Left, 0),
            Err(JpeglError::InvalidDimensions { .. })
        ));
    }

    #[test]
    fn reject_point_transform() {
        let pixels = vec![0u8; 4];
        let raw = RawImage::gray(&pixels, 2, 2, -1);
        assert_eq!(
            ImageData::setup_encode(&raw, Predictor::Left, 8).unwrap_err(),
            JpeglError::InvalidPointTransform { value: 8, precision: 8 }
        );
    }

    #[test]
    fn missing_plane_blocks_flatten() {
        let pixels = vec![7u8; 6];
        let raw = RawImage::color(&pixels, 1, 2, 300, [(1, 1); 3]);
        let img = ImageData::setup_encode(&raw, Predictor::Left, 0).unwrap();
        let mut decoded = ImageData::setup_decode(300, &img.frame_header()).unwrap();
        assert_eq!(decoded.depth(), 24);
        decoded.update_decode(0, Predictor::Above, 0).unwrap();
        assert_eq!(decoded.to_raw(), Err(JpeglError::MissingComponentScan(1)));
        decoded.update_decode(1, Predictor::Above, 0).unwrap();
        decoded.update_decode(2, Predictor::Above, 0).unwrap();
        let raw = decoded.to_raw().unwrap();
        assert_eq!(raw.pixels, vec![0u8; 6]);
        assert_eq!(raw.ppi, 300);
        assert_eq!(raw.sampling, vec![(1, 1); 3]);
    }

    #[test]
    fn per_component_coding() {
        let pixels = vec![5u8; 12];
        let raw = RawImage::color(&pixels, 2, 2, -1, [(1, 1); 3]);
        let mut img = ImageData::setup_encode(&raw, Predictor::Left, 0).unwrap();
        img.set_coding(1, Predictor::Average, 2).unwrap();
        let c = img.component(1).unwrap();
        assert_eq!((c.predictor, c.point_transform), (Predictor::Average, 2));
        assert_eq!(img.component(2).unwrap().predictor, Predictor::Left);
        assert_eq!(
            img.set_coding(0, Predictor::Left, 8),
            Err(JpeglError::InvalidPointTransform { value: 8, precision: 8 })
        );
        assert_eq!(img.set_coding(3, Predictor::Left, 0), Err(JpeglError::MissingComponentScan(3)));
    }

    #[test]
    fn release_and_into_planes() {
        let pixels = vec![3u8; 4];
        let raw = RawImage::gray(&pixels, 2, 2, -1);
        let mut img = ImageData::setup_encode(&raw, Predictor::Left, 0).unwrap();
        if let Some((_, diffs)) = img.components_mut()[0].encode_buffers() {
            diffs.push(1);
        }
        assert!(img.component(0).unwrap().differences().is_some());
        img.release_scratch();
        assert!(img.component(0).unwrap().differences().is_none());
        assert_eq!(img.into_planes(), vec![Some(vec![3u8; 4])]);
    }
}
