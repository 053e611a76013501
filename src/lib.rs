// Copyright (c) 2026 Christoph Gaffga
// SPDX-License-Identifier: GPL-3.0-only
// https://github.com/cgaffga/phasmcore

//! # jpegl-core
//!
//! Pure-Rust lossless JPEG (JPEGL) codec for 8-bit gray and three-component
//! image planes, as used for fingerprint images.
//!
//! Each component is predicted from its causal neighbours, the prediction
//! differences are grouped into magnitude categories, and the categories are
//! Huffman coded with a table optimized for that component. Decoding is
//! exact: `decode(encode(x)) == x` whenever the point transform is 0.
//!
//! # Quick start
//!
//! ```rust,ignore
//! use jpegl_core::{decode, encode, EncodeOptions, RawImage};
//!
//! let pixels = std::fs::read("finger.raw").unwrap();
//! let raw = RawImage::gray(&pixels, 500, 500, 500);
//! let jpl = encode(&raw, &EncodeOptions::default()).unwrap();
//! let image = decode(&jpl).unwrap();
//! assert_eq!(image.to_raw().unwrap().pixels, pixels);
//! ```

pub mod batch;
pub mod jpegl;

pub use jpegl::error::{ErrorKind, JpeglError, Result as JpeglResult};
pub use jpegl::image::{ComponentPlane, ImageData, RawImage, RawPixmap};
pub use jpegl::predict::Predictor;
pub use jpegl::{decode, encode, encode_image, probe, read_comments, EncodeOptions, JpegKind, OutputLimit};
