// Decode into caller-preallocated destinations.

use libc::c_int;
use tracing::debug;

use super::layout::PixelFormat;
use crate::error::{BridgeError, Result};
use crate::ffi::webp;
use crate::marshal::{CallerArray, PinnedView, PinnedViewMut};

/// Decode a bitstream into `destination` as RGB rows of `stride` bytes.
pub fn decode_rgb_into<B, D>(bitstream: &B, destination: &mut D, stride: u32) -> Result<()>
where
    B: CallerArray + ?Sized,
    D: CallerArray + ?Sized,
{
    decode_into("decode_rgb_into", PixelFormat::Rgb, bitstream, destination, stride)
}

/// Decode a bitstream into `destination` as RGBA rows of `stride` bytes.
pub fn decode_rgba_into<B, D>(bitstream: &B, destination: &mut D, stride: u32) -> Result<()>
where
    B: CallerArray + ?Sized,
    D: CallerArray + ?Sized,
{
    decode_into("decode_rgba_into", PixelFormat::Rgba, bitstream, destination, stride)
}

/// Shared decode path.
///
/// The destination is committed only after the codec reports success; every
/// other return drops the writable view, which releases it without commit.
fn decode_into<B, D>(
    operation: &'static str,
    format: PixelFormat,
    bitstream: &B,
    destination: &mut D,
    stride: u32,
) -> Result<()>
where
    B: CallerArray + ?Sized,
    D: CallerArray + ?Sized,
{
    let codec_stride = c_int::try_from(stride).map_err(|_| {
        BridgeError::invalid_input(format!("stride {stride} exceeds i32::MAX"))
    })?;

    let data = PinnedView::pin(bitstream)?;
    let mut dest = PinnedViewMut::pin(destination)?;

    let Some((width, height)) = webp::get_info(data.as_slice()) else {
        debug!(operation, len = data.len(), "bitstream header could not be parsed");
        return Err(BridgeError::codec_rejected(
            "bitstream header could not be parsed",
        ));
    };
    check_capacity(format, width, height, stride, dest.len())
        .inspect_err(|e| debug!(operation, error = %e, "destination too small"))?;

    if !webp::decode_into(format, data.as_slice(), dest.as_mut_slice(), codec_stride) {
        debug!(operation, width, height, "decoder rejected the bitstream");
        return Err(BridgeError::codec_rejected(format!(
            "decoder failed on a {width}x{height} bitstream"
        )));
    }

    dest.commit();
    Ok(())
}

/// A destination must hold `stride * height` bytes with rows of at least
/// `width * channels` bytes.
fn check_capacity(
    format: PixelFormat,
    width: u32,
    height: u32,
    stride: u32,
    capacity: usize,
) -> Result<()> {
    let min_stride = u64::from(width) * u64::from(format.channels());
    if u64::from(stride) < min_stride {
        return Err(BridgeError::insufficient_capacity(format!(
            "stride {stride} is smaller than a {width}-pixel {} row ({min_stride} bytes)",
            format.as_str()
        )));
    }

    let needed = u64::from(stride) * u64::from(height);
    if (capacity as u64) < needed {
        return Err(BridgeError::insufficient_capacity(format!(
            "destination holds {capacity} bytes but the {width}x{height} image needs {needed}"
        )));
    }

    Ok(())
}
