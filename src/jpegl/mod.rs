// Copyright (c) 2026 Christoph Gaffga
// SPDX-License-Identifier: GPL-3.0-only
// https://github.com/cgaffga/phasmcore

//! Lossless JPEG (SOF3) codec for 8-bit image planes.
//!
//! Encodes one non-interleaved scan per component with a Huffman table
//! optimized for that component's prediction differences. Decodes streams
//! written that way, or by any encoder producing the same structure.
//!
//! Supports:
//! - Gray (8 bpp) and three-component (24 bpp) images
//! - Per-component sampling factors 1–4
//! - Predictors 1–7 and point transforms 0–7
//! - JFIF resolution header and COM comments
//!
//! Does NOT support:
//! - Interleaved scans -- rejected at decode time
//! - Precisions other than 8 bits
//! - Restart intervals

pub mod error;
pub mod bitio;
pub mod huffman;
pub mod predict;
pub mod marker;
pub mod tables;
pub mod jfif;
pub mod frame;
pub mod scan;
pub mod image;

use log::{debug, trace, warn};

use error::{JpeglError, Result};
use frame::parse_sof;
use huffman::HuffmanTable;
use image::{ImageData, RawImage};
use jfif::ResolutionHeader;
use marker::{MarkerReader, StreamWriter, APP0, COM, DHT, EOI, SOF3, SOI, SOS};
use predict::Predictor;
use scan::{ScanHeader, parse_sos};
use tables::{HuffmanSpec, dht_body, parse_dht};

pub use marker::{probe, read_comments, JpegKind};

/// Bound on the size of an encoded stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputLimit {
    /// No bound.
    #[default]
    Unbounded,
    /// The total size of the uncompressed planes.
    Uncompressed,
    /// An explicit byte count.
    Bytes(usize),
}

impl OutputLimit {
    fn resolve(self, uncompressed: usize) -> Option<usize> {
        match self {
            Self::Unbounded => None,
            Self::Uncompressed => Some(uncompressed),
            Self::Bytes(n) => Some(n),
        }
    }
}

/// Encoder settings.
#[derive(Debug, Clone, Default)]
pub struct EncodeOptions {
    /// Predictor used for every component.
    pub predictor: Predictor,
    /// Low-order bits dropped from every sample (0–7).
    pub point_transform: u8,
    /// Payload of a COM segment written after the JFIF header.
    pub comment: Option<Vec<u8>>,
    pub output_limit: OutputLimit,
}

impl EncodeOptions {
    pub fn with_predictor(mut self, predictor: Predictor) -> Self {
        self.predictor = predictor;
        self
    }

    pub fn with_point_transform(mut self, point_transform: u8) -> Self {
        self.point_transform = point_transform;
        self
    }

    pub fn with_comment(mut self, comment: impl Into<Vec<u8>>) -> Self {
        self.comment = Some(comment.into());
        self
    }

    pub fn with_output_limit(mut self, limit: OutputLimit) -> Self {
        self.output_limit = limit;
        self
    }
}

/// Encode raw pixels into a lossless JPEG stream.
pub fn encode(raw: &RawImage, options: &EncodeOptions) -> Result<Vec<u8>> {
    let mut image = ImageData::setup_encode(raw, options.predictor, options.point_transform)?;
    let out = encode_image(&mut image, options);
    image.release_scratch();
    out
}

/// Encode an already prepared image descriptor.
///
/// Each component is coded with its own predictor and point transform, as
/// set by [`ImageData::setup_encode`] or [`ImageData::set_coding`]; only the
/// comment and output limit are taken from `options`. The
/// descriptor keeps the prediction differences until
/// [`ImageData::release_scratch`] is called.
pub fn encode_image(image: &mut ImageData, options: &EncodeOptions) -> Result<Vec<u8>> {
    if let Some(comment) = &options.comment {
        if comment.len() + 2 > u16::MAX as usize {
            return Err(JpeglError::CommentTooLong(comment.len()));
        }
    }

    let limit = options.output_limit.resolve(image.uncompressed_len());
    debug!(
        "encoding {}x{} depth {} ppi {} ({} components), limit {:?}",
        image.width(),
        image.height(),
        image.depth(),
        image.ppi(),
        image.num_components(),
        limit
    );

    let mut out = StreamWriter::new(limit);
    out.marker(SOI)?;
    out.segment(APP0, &ResolutionHeader::from_ppi(image.ppi())?.to_body())?;
    if let Some(comment) = &options.comment {
        out.segment(COM, comment)?;
    }
    out.segment(SOF3, &image.frame_header().to_body())?;

    for (i, comp) in image.components_mut().iter_mut().enumerate() {
        let params = comp.scan_params();
        let id = comp.id;
        let comp_sampling = (comp.h_sampling, comp.v_sampling);
        let (pixels, diffs) = comp
            .encode_buffers()
            .ok_or(JpeglError::MissingComponentScan(i))?;
        let freq = scan::compute_differences(pixels, &params, diffs)?;
        let table = HuffmanTable::from_frequencies(i as u8, &freq)?;
        trace!("component {i}: category histogram {freq:?}");
        trace!("component {i}: code length counts {:?}", table.bits());

        out.segment(DHT, &dht_body(&HuffmanSpec::from(&table)))?;
        let header = ScanHeader::single(id, table.id, params.predictor, params.point_transform);
        out.segment(SOS, &header.to_body())?;
        let data = scan::encode_scan(diffs.as_slice(), &table)?;
        debug!(
            "component {i}: {}x{} sampling {}x{} predictor {} pt {} -> {} scan bytes",
            params.width,
            params.height,
            comp_sampling.0,
            comp_sampling.1,
            params.predictor.selector(),
            params.point_transform,
            data.len()
        );
        out.raw(&data)?;
    }

    out.marker(EOI)?;
    debug!("encoded {} bytes", out.len());
    Ok(out.finish())
}

/// Decode a lossless JPEG stream into an image descriptor.
///
/// Expects SOI and a JFIF APP0 header, then tables and comments up to the
/// SOF3 frame, then one DHT/SOS/scan group per component up to EOI.
pub fn decode(data: &[u8]) -> Result<ImageData> {
    let mut reader = MarkerReader::new(data);
    reader.expect_marker(SOI, "SOI")?;
    reader.expect_marker(APP0, "APP0")?;
    let resolution = ResolutionHeader::parse(reader.read_segment(APP0)?)?;
    let ppi = resolution.ppi();

    let mut tables: [Option<HuffmanTable>; 4] = Default::default();
    let mut comments = Vec::new();

    // Tables and comments until the frame header.
    let frame = loop {
        let (m, offset) = reader.read_marker()?;
        match m {
            SOF3 => break parse_sof(reader.read_segment(m)?)?,
            DHT => load_tables(reader.read_segment(m)?, &mut tables)?,
            COM => comments.push(reader.read_segment(m)?.to_vec()),
            m if marker::is_other_frame(m) => return Err(JpeglError::UnsupportedMarker(m)),
            SOI | EOI | SOS => {
                return Err(JpeglError::MarkerMismatch {
                    expected: "DHT, COM or SOF3",
                    found: 0xFF00 | m as u16,
                    offset,
                })
            }
            m => {
                warn!("skipping marker 0xFF{m:02X} at offset {offset}");
                reader.skip_segment(m)?;
            }
        }
    };
    debug!(
        "frame {}x{} with {} components, {} ppi",
        frame.width,
        frame.height,
        frame.components.len(),
        ppi
    );

    let mut image = ImageData::setup_decode(ppi, &frame)?;

    // Tables and scans until EOI.
    loop {
        let (m, offset) = reader.read_marker()?;
        match m {
            EOI => break,
            SOS => {
                let header = parse_sos(reader.read_segment(m)?)?;
                if header.is_interleaved() {
                    return Err(JpeglError::InterleavedScan {
                        components: header.components.len() as u8,
                    });
                }
                let comp_idx = frame.component_index(header.components[0].selector)?;
                // Table slot follows the component index; the Td nibble names
                // it for streams that number their tables differently.
                let defined = |id: usize| tables.get(id)?.as_ref().filter(|t| t.is_defined());
                let table = defined(comp_idx)
                    .or_else(|| defined(header.components[0].table_id as usize))
                    .ok_or(JpeglError::UndefinedHuffmanTable(comp_idx as u8))?;
                let predictor = Predictor::from_selector(header.predictor)?;
                let params = image.update_decode(comp_idx, predictor, header.point_transform)?;
                let plane = image
                    .plane_mut(comp_idx)
                    .ok_or(JpeglError::MissingComponentScan(comp_idx))?;
                let end = scan::decode_scan(data, reader.position(), plane, &params, table)?;
                scan::restore_point_transform(plane, params.point_transform);
                debug!(
                    "component {comp_idx}: predictor {} pt {}, scan bytes {}..{end}",
                    predictor.selector(),
                    params.point_transform,
                    reader.position()
                );
                reader.set_position(end);
            }
            DHT => load_tables(reader.read_segment(m)?, &mut tables)?,
            COM => comments.push(reader.read_segment(m)?.to_vec()),
            SOI | SOF3 => {
                return Err(JpeglError::MarkerMismatch {
                    expected: "DHT, COM, SOS or EOI",
                    found: 0xFF00 | m as u16,
                    offset,
                })
            }
            m if marker::is_other_frame(m) => return Err(JpeglError::UnsupportedMarker(m)),
            m => {
                warn!("skipping marker 0xFF{m:02X} at offset {offset}");
                reader.skip_segment(m)?;
            }
        }
    }

    if let Some(missing) = image.components().iter().position(|c| c.pixels().is_none()) {
        return Err(JpeglError::MissingComponentScan(missing));
    }
    image.set_comments(comments);
    Ok(image)
}

fn load_tables(body: &[u8], tables: &mut [Option<HuffmanTable>; 4]) -> Result<()> {
    for spec in parse_dht(body)? {
        trace!("Huffman table {}: counts {:?}", spec.id, spec.bits);
        tables[spec.id as usize] = Some(spec.to_table()?);
    }
    Ok(())
}
