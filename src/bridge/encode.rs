// Lossy and lossless encoders, all forwarded through one marshaling routine.

use std::ptr;

use tracing::debug;

use super::layout::{CodecDims, PixelFormat, PixelLayout};
use crate::error::{BridgeError, Result};
use crate::ffi::webp::CodecBuffer;
use crate::ffi::webp_sys::{
    WebPEncodeLosslessRGB, WebPEncodeLosslessRGBA, WebPEncodeRGB, WebPEncodeRGBA,
};
use crate::marshal::{CallerArray, copy_to_caller, to_owned_buffer};

/// Encoding mode for [`encode`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum EncodeMode {
    /// Lossy VP8 at the given quality (0.0 = smallest, 100.0 = best).
    Lossy { quality: f32 },
    /// Lossless VP8L.
    Lossless,
}

/// Encode a pixel buffer in `format` with the given mode.
pub fn encode<A: CallerArray + ?Sized>(
    pixels: &A,
    layout: PixelLayout,
    format: PixelFormat,
    mode: EncodeMode,
) -> Result<Vec<u8>> {
    match (format, mode) {
        (PixelFormat::Rgb, EncodeMode::Lossy { quality }) => encode_rgb(pixels, layout, quality),
        (PixelFormat::Rgba, EncodeMode::Lossy { quality }) => encode_rgba(pixels, layout, quality),
        (PixelFormat::Rgb, EncodeMode::Lossless) => encode_lossless_rgb(pixels, layout),
        (PixelFormat::Rgba, EncodeMode::Lossless) => encode_lossless_rgba(pixels, layout),
    }
}

/// Lossy-encode interleaved RGB samples.
pub fn encode_rgb<A: CallerArray + ?Sized>(
    pixels: &A,
    layout: PixelLayout,
    quality: f32,
) -> Result<Vec<u8>> {
    check_quality("encode_rgb", quality)?;
    encode_with("encode_rgb", pixels, layout, PixelFormat::Rgb, |input, dims, output| unsafe {
        WebPEncodeRGB(input, dims.width, dims.height, dims.stride, quality, output)
    })
}

/// Lossy-encode interleaved RGBA samples.
pub fn encode_rgba<A: CallerArray + ?Sized>(
    pixels: &A,
    layout: PixelLayout,
    quality: f32,
) -> Result<Vec<u8>> {
    check_quality("encode_rgba", quality)?;
    encode_with("encode_rgba", pixels, layout, PixelFormat::Rgba, |input, dims, output| unsafe {
        WebPEncodeRGBA(input, dims.width, dims.height, dims.stride, quality, output)
    })
}

/// Losslessly encode interleaved RGB samples.
pub fn encode_lossless_rgb<A: CallerArray + ?Sized>(
    pixels: &A,
    layout: PixelLayout,
) -> Result<Vec<u8>> {
    encode_with(
        "encode_lossless_rgb",
        pixels,
        layout,
        PixelFormat::Rgb,
        |input, dims, output| unsafe {
            WebPEncodeLosslessRGB(input, dims.width, dims.height, dims.stride, output)
        },
    )
}

/// Losslessly encode interleaved RGBA samples.
///
/// Colour under fully transparent pixels is not guaranteed to survive.
pub fn encode_lossless_rgba<A: CallerArray + ?Sized>(
    pixels: &A,
    layout: PixelLayout,
) -> Result<Vec<u8>> {
    encode_with(
        "encode_lossless_rgba",
        pixels,
        layout,
        PixelFormat::Rgba,
        |input, dims, output| unsafe {
            WebPEncodeLosslessRGBA(input, dims.width, dims.height, dims.stride, output)
        },
    )
}

fn check_quality(operation: &'static str, quality: f32) -> Result<()> {
    if quality.is_finite() && (0.0..=100.0).contains(&quality) {
        return Ok(());
    }
    debug!(operation, quality, "rejected quality factor");
    Err(BridgeError::invalid_input(format!(
        "quality must be within 0-100, got {quality}"
    )))
}

/// Shared encode path.
///
/// Order of ownership handoffs: input copy allocated, codec called, input
/// copy released, codec output taken over (or rejected), caller buffer
/// allocated, codec output freed. Each release is a `Drop`, so the same order
/// holds on every error return.
fn encode_with<A, F>(
    operation: &'static str,
    pixels: &A,
    layout: PixelLayout,
    format: PixelFormat,
    encoder: F,
) -> Result<Vec<u8>>
where
    A: CallerArray + ?Sized,
    F: FnOnce(*const u8, CodecDims, *mut *mut u8) -> usize,
{
    layout
        .validate(format, pixels.len())
        .inspect_err(|e| debug!(operation, error = %e, "rejected pixel layout"))?;

    let mut input =
        to_owned_buffer(pixels).inspect_err(|e| debug!(operation, error = %e, "input copy failed"))?;
    // The caller may resize its array between the length query and the pin.
    layout
        .validate(format, input.len())
        .inspect_err(|e| debug!(operation, error = %e, "input changed while copying"))?;

    let mut output: *mut u8 = ptr::null_mut();
    let written = encoder(input.as_slice().as_ptr(), layout.codec_dims(), &mut output);
    input.release();

    let encoded = unsafe { CodecBuffer::from_codec_output(output, written) }
        .inspect_err(|e| debug!(operation, error = %e, "codec produced no output"))?;

    copy_to_caller(encoded.as_slice())
        .inspect_err(|e| debug!(operation, error = %e, "result copy failed"))
}
