// Copyright (c) 2026 Christoph Gaffga
// SPDX-License-Identifier: GPL-3.0-only
// https://github.com/cgaffga/phasmcore

//! Encode or decode many independent images in one call.
//!
//! Each image gets its own descriptor and tables, so with the `parallel`
//! feature the calls run on the rayon pool. Results come back in input order.

#[cfg(feature = "parallel")]
use rayon::prelude::*;

use crate::jpegl::error::Result;
use crate::jpegl::image::{ImageData, RawImage};
use crate::jpegl::{decode, encode, EncodeOptions};

/// Encode every image with the same options.
pub fn encode_all(images: &[RawImage<'_>], options: &EncodeOptions) -> Vec<Result<Vec<u8>>> {
    #[cfg(feature = "parallel")]
    let results = images.par_iter().map(|raw| encode(raw, options)).collect();
    #[cfg(not(feature = "parallel"))]
    let results = images.iter().map(|raw| encode(raw, options)).collect();
    results
}

/// Decode every stream.
pub fn decode_all<T: AsRef<[u8]> + Sync>(streams: &[T]) -> Vec<Result<ImageData>> {
    #[cfg(feature = "parallel")]
    let results = streams.par_iter().map(|s| decode(s.as_ref())).collect();
    #[cfg(not(feature = "parallel"))]
    let results = streams.iter().map(|s| decode(s.as_ref())).collect();
    results
}
