//! C ABI for callers outside Rust (managed runtimes, C/C++ hosts).
//!
//! Failures never unwind across the boundary. Each function returns a
//! sentinel instead: a null [`BridgeBytes`], `false`, or a VP8 status code.
//! Results returned as [`BridgeBytes`] belong to the caller and must be given
//! back through [`webp_bridge_bytes_free`].

use std::ptr::{self, NonNull};

use libc::{c_float, c_int};

use crate::bridge::{self, Features, PixelLayout};
use crate::error::{BridgeError, Result};
use crate::ffi::webp::Vp8Status;
use crate::marshal::{CallerArray, ReleaseMode};

/// A byte buffer handed to the caller. `data` is null on failure.
#[repr(C)]
#[derive(Debug)]
pub struct BridgeBytes {
    pub data: *mut u8,
    pub len: usize,
}

impl BridgeBytes {
    fn null() -> Self {
        BridgeBytes {
            data: ptr::null_mut(),
            len: 0,
        }
    }

    fn from_vec(bytes: Vec<u8>) -> Self {
        let boxed = bytes.into_boxed_slice();
        let len = boxed.len();
        BridgeBytes {
            data: Box::into_raw(boxed).cast::<u8>(),
            len,
        }
    }

    fn from_result(result: Result<Vec<u8>>) -> Self {
        result.map_or_else(|_| BridgeBytes::null(), BridgeBytes::from_vec)
    }
}

/// Feature record filled by [`webp_bridge_get_features`].
#[repr(C)]
#[derive(Debug, Clone, Copy, Default)]
pub struct FeatureRecord {
    pub width: c_int,
    pub height: c_int,
    pub has_alpha: c_int,
    pub has_animation: c_int,
    /// 0 = undefined/mixed, 1 = lossy, 2 = lossless.
    pub format: c_int,
}

impl From<Features> for FeatureRecord {
    fn from(features: Features) -> Self {
        FeatureRecord {
            width: features.width as c_int,
            height: features.height as c_int,
            has_alpha: c_int::from(features.has_alpha),
            has_animation: c_int::from(features.has_animation),
            format: features.format.code(),
        }
    }
}

/// A caller array described by a raw pointer and length.
///
/// A null pointer fails to pin. Writes go straight to the caller's memory, so
/// unpinning has nothing to publish or discard.
struct RawArray {
    ptr: *mut u8,
    len: usize,
}

unsafe impl CallerArray for RawArray {
    fn len(&self) -> usize {
        self.len
    }

    fn pin(&self) -> Option<NonNull<u8>> {
        NonNull::new(self.ptr)
    }

    fn pin_mut(&mut self) -> Option<NonNull<u8>> {
        NonNull::new(self.ptr)
    }

    fn unpin(&self, _ptr: NonNull<u8>, _mode: ReleaseMode) {}
}

fn to_u32(value: c_int, what: &str) -> Result<u32> {
    u32::try_from(value)
        .map_err(|_| BridgeError::invalid_input(format!("{what} must not be negative, got {value}")))
}

fn layout_from(width: c_int, height: c_int, stride: c_int) -> Result<PixelLayout> {
    Ok(PixelLayout::new(
        to_u32(width, "width")?,
        to_u32(height, "height")?,
        to_u32(stride, "stride")?,
    ))
}

/// Lossy-encode RGB pixels.
///
/// # Safety
/// `pixels` must be null or valid for reads of `len` bytes for the duration
/// of the call.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn webp_bridge_encode_rgb(
    pixels: *const u8,
    len: usize,
    width: c_int,
    height: c_int,
    stride: c_int,
    quality: c_float,
) -> BridgeBytes {
    let input = RawArray {
        ptr: pixels.cast_mut(),
        len,
    };
    BridgeBytes::from_result(
        layout_from(width, height, stride)
            .and_then(|layout| bridge::encode_rgb(&input, layout, quality)),
    )
}

/// Lossy-encode RGBA pixels.
///
/// # Safety
/// Same contract as [`webp_bridge_encode_rgb`].
#[unsafe(no_mangle)]
pub unsafe extern "C" fn webp_bridge_encode_rgba(
    pixels: *const u8,
    len: usize,
    width: c_int,
    height: c_int,
    stride: c_int,
    quality: c_float,
) -> BridgeBytes {
    let input = RawArray {
        ptr: pixels.cast_mut(),
        len,
    };
    BridgeBytes::from_result(
        layout_from(width, height, stride)
            .and_then(|layout| bridge::encode_rgba(&input, layout, quality)),
    )
}

/// Losslessly encode RGB pixels.
///
/// # Safety
/// Same contract as [`webp_bridge_encode_rgb`].
#[unsafe(no_mangle)]
pub unsafe extern "C" fn webp_bridge_encode_lossless_rgb(
    pixels: *const u8,
    len: usize,
    width: c_int,
    height: c_int,
    stride: c_int,
) -> BridgeBytes {
    let input = RawArray {
        ptr: pixels.cast_mut(),
        len,
    };
    BridgeBytes::from_result(
        layout_from(width, height, stride)
            .and_then(|layout| bridge::encode_lossless_rgb(&input, layout)),
    )
}

/// Losslessly encode RGBA pixels.
///
/// # Safety
/// Same contract as [`webp_bridge_encode_rgb`].
#[unsafe(no_mangle)]
pub unsafe extern "C" fn webp_bridge_encode_lossless_rgba(
    pixels: *const u8,
    len: usize,
    width: c_int,
    height: c_int,
    stride: c_int,
) -> BridgeBytes {
    let input = RawArray {
        ptr: pixels.cast_mut(),
        len,
    };
    BridgeBytes::from_result(
        layout_from(width, height, stride)
            .and_then(|layout| bridge::encode_lossless_rgba(&input, layout)),
    )
}

/// Decode into a caller-allocated RGB buffer of `dest_len` bytes.
///
/// # Safety
/// `data` must be null or valid for reads of `len` bytes, and `dest` null or
/// valid for writes of `dest_len` bytes, for the duration of the call.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn webp_bridge_decode_rgb_into(
    data: *const u8,
    len: usize,
    dest: *mut u8,
    dest_len: usize,
    stride: c_int,
) -> bool {
    let bitstream = RawArray {
        ptr: data.cast_mut(),
        len,
    };
    let mut destination = RawArray {
        ptr: dest,
        len: dest_len,
    };
    to_u32(stride, "stride")
        .and_then(|stride| bridge::decode_rgb_into(&bitstream, &mut destination, stride))
        .is_ok()
}

/// Decode into a caller-allocated RGBA buffer of `dest_len` bytes.
///
/// # Safety
/// Same contract as [`webp_bridge_decode_rgb_into`].
#[unsafe(no_mangle)]
pub unsafe extern "C" fn webp_bridge_decode_rgba_into(
    data: *const u8,
    len: usize,
    dest: *mut u8,
    dest_len: usize,
    stride: c_int,
) -> bool {
    let bitstream = RawArray {
        ptr: data.cast_mut(),
        len,
    };
    let mut destination = RawArray {
        ptr: dest,
        len: dest_len,
    };
    to_u32(stride, "stride")
        .and_then(|stride| bridge::decode_rgba_into(&bitstream, &mut destination, stride))
        .is_ok()
}

/// Read width and height from a bitstream header.
///
/// # Safety
/// `data` must be null or valid for reads of `len` bytes; `width` and
/// `height` must be null or valid for writes. Outputs are written only on
/// success.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn webp_bridge_get_info(
    data: *const u8,
    len: usize,
    width: *mut c_int,
    height: *mut c_int,
) -> bool {
    if width.is_null() || height.is_null() {
        return false;
    }
    let bitstream = RawArray {
        ptr: data.cast_mut(),
        len,
    };
    match bridge::get_info(&bitstream) {
        Ok((w, h)) => {
            unsafe {
                *width = w as c_int;
                *height = h as c_int;
            }
            true
        }
        Err(_) => false,
    }
}

/// Parse the features of the first `declared_size` bytes of a bitstream.
///
/// Returns the VP8 status code; `record` is written only when it is 0 (OK).
///
/// # Safety
/// `data` must be null or valid for reads of `len` bytes; `record` must be
/// null or valid for writes.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn webp_bridge_get_features(
    data: *const u8,
    len: usize,
    declared_size: usize,
    record: *mut FeatureRecord,
) -> c_int {
    if record.is_null() {
        return Vp8Status::InvalidParam.code();
    }
    let bitstream = RawArray {
        ptr: data.cast_mut(),
        len,
    };
    match bridge::get_features(&bitstream, declared_size) {
        Ok(features) => {
            unsafe { *record = FeatureRecord::from(features) };
            Vp8Status::Ok.code()
        }
        Err(e) => e.status().code(),
    }
}

/// Release a buffer returned by one of the encode functions. A null buffer is
/// ignored.
///
/// # Safety
/// `bytes` must come from this library and must not have been freed already.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn webp_bridge_bytes_free(bytes: BridgeBytes) {
    if bytes.data.is_null() {
        return;
    }
    let slice = ptr::slice_from_raw_parts_mut(bytes.data, bytes.len);
    drop(unsafe { Box::from_raw(slice) });
}
