//! Encode, decode and inspect WebP bitstreams across a memory-domain boundary.
//!
//! Every operation is synchronous, keeps no state between calls, and releases
//! everything it acquired before returning, on success and failure alike.
//! Calls from several threads are independent of each other; this relies on
//! libwebp's simple encode/decode entry points being reentrant, which the
//! bridge assumes and does not enforce.

mod decode;
mod encode;
mod features;
mod layout;

pub use decode::{decode_rgb_into, decode_rgba_into};
pub use encode::{
    EncodeMode, encode, encode_lossless_rgb, encode_lossless_rgba, encode_rgb, encode_rgba,
};
pub use features::{BitstreamFormat, Features, get_features, get_features_into, get_info};
pub use layout::{PixelFormat, PixelLayout};

use crate::ffi::webp;

/// Versions of the linked libwebp, as `(major, minor, revision)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CodecVersion {
    pub encoder: (u32, u32, u32),
    pub decoder: (u32, u32, u32),
}

pub fn codec_version() -> CodecVersion {
    CodecVersion {
        encoder: webp::encoder_version(),
        decoder: webp::decoder_version(),
    }
}
