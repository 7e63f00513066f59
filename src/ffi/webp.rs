// 安全ラッパー（CodecBuffer、RAII Drop → WebPFree）

use std::fmt;
use std::ptr::NonNull;
use std::slice;

use libc::c_int;

use super::webp_sys::{
    WebPBitstreamFeatures, WebPDecodeRGBAInto, WebPDecodeRGBInto, WebPFree, WebPGetDecoderVersion,
    WebPGetEncoderVersion, WebPGetFeatures, WebPGetInfo,
};
use crate::bridge::PixelFormat;
use crate::error::{BridgeError, Result};
use crate::marshal::tracking;

/// Status codes reported by libwebp's bitstream parser (`VP8StatusCode`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Vp8Status {
    Ok,
    OutOfMemory,
    InvalidParam,
    BitstreamError,
    UnsupportedFeature,
    Suspended,
    UserAbort,
    NotEnoughData,
}

impl Vp8Status {
    /// Map a raw libwebp status code. Codes outside the documented range are
    /// reported as bitstream errors.
    pub fn from_code(code: c_int) -> Self {
        match code {
            0 => Vp8Status::Ok,
            1 => Vp8Status::OutOfMemory,
            2 => Vp8Status::InvalidParam,
            3 => Vp8Status::BitstreamError,
            4 => Vp8Status::UnsupportedFeature,
            5 => Vp8Status::Suspended,
            6 => Vp8Status::UserAbort,
            7 => Vp8Status::NotEnoughData,
            _ => Vp8Status::BitstreamError,
        }
    }

    /// The raw libwebp status code.
    pub fn code(self) -> c_int {
        match self {
            Vp8Status::Ok => 0,
            Vp8Status::OutOfMemory => 1,
            Vp8Status::InvalidParam => 2,
            Vp8Status::BitstreamError => 3,
            Vp8Status::UnsupportedFeature => 4,
            Vp8Status::Suspended => 5,
            Vp8Status::UserAbort => 6,
            Vp8Status::NotEnoughData => 7,
        }
    }

    pub fn is_ok(self) -> bool {
        self == Vp8Status::Ok
    }
}

impl fmt::Display for Vp8Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Vp8Status::Ok => "ok",
            Vp8Status::OutOfMemory => "out of memory",
            Vp8Status::InvalidParam => "invalid parameter",
            Vp8Status::BitstreamError => "bitstream error",
            Vp8Status::UnsupportedFeature => "unsupported feature",
            Vp8Status::Suspended => "suspended",
            Vp8Status::UserAbort => "user abort",
            Vp8Status::NotEnoughData => "not enough data",
        };
        write!(f, "{} ({})", name, self.code())
    }
}

/// An output buffer allocated by a libwebp encoder.
///
/// The memory belongs to libwebp's allocator and is released with `WebPFree`
/// when the wrapper is dropped, never by Rust's allocator.
pub struct CodecBuffer {
    ptr: NonNull<u8>,
    len: usize,
}

impl CodecBuffer {
    /// Take ownership of an encoder's output pointer and reported size.
    ///
    /// A null pointer or a zero size is a codec rejection. A non-null pointer
    /// is always taken over (and therefore freed), even when the size is zero.
    ///
    /// # Safety
    /// `ptr` must be null or point to a libwebp allocation of at least `len`
    /// bytes that nothing else will free.
    pub unsafe fn from_codec_output(ptr: *mut u8, len: usize) -> Result<Self> {
        let Some(ptr) = NonNull::new(ptr) else {
            return Err(BridgeError::codec_rejected(
                "encoder returned a null output buffer",
            ));
        };
        tracking::codec_buffer_acquired();
        let buffer = CodecBuffer { ptr, len };

        if buffer.len == 0 {
            return Err(BridgeError::codec_rejected("encoder produced zero bytes"));
        }
        Ok(buffer)
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn as_slice(&self) -> &[u8] {
        unsafe { slice::from_raw_parts(self.ptr.as_ptr(), self.len) }
    }
}

impl Drop for CodecBuffer {
    fn drop(&mut self) {
        unsafe { WebPFree(self.ptr.as_ptr().cast()) };
        tracking::codec_buffer_released();
    }
}

/// Decode `data` into `output` using the codec's "decode into" routine.
///
/// The codec receives `output.len()` as the buffer capacity and refuses to
/// write when the image does not fit. Returns `false` on any codec failure.
pub(crate) fn decode_into(
    format: PixelFormat,
    data: &[u8],
    output: &mut [u8],
    stride: c_int,
) -> bool {
    let written = unsafe {
        match format {
            PixelFormat::Rgb => WebPDecodeRGBInto(
                data.as_ptr(),
                data.len(),
                output.as_mut_ptr(),
                output.len(),
                stride,
            ),
            PixelFormat::Rgba => WebPDecodeRGBAInto(
                data.as_ptr(),
                data.len(),
                output.as_mut_ptr(),
                output.len(),
                stride,
            ),
        }
    };
    !written.is_null()
}

/// Parse width and height from a bitstream header.
pub(crate) fn get_info(data: &[u8]) -> Option<(u32, u32)> {
    let mut width: c_int = 0;
    let mut height: c_int = 0;
    let ok = unsafe { WebPGetInfo(data.as_ptr(), data.len(), &mut width, &mut height) };
    if ok == 0 {
        return None;
    }
    Some((u32::try_from(width).ok()?, u32::try_from(height).ok()?))
}

/// Parse the bitstream features, returning the codec's status on failure.
pub(crate) fn get_features(data: &[u8]) -> std::result::Result<WebPBitstreamFeatures, Vp8Status> {
    // Plain C struct of integers; all-zero is a valid value.
    let mut features: WebPBitstreamFeatures = unsafe { std::mem::zeroed() };
    let status = unsafe { WebPGetFeatures(data.as_ptr(), data.len(), &mut features) };
    match Vp8Status::from_code(status as c_int) {
        Vp8Status::Ok => Ok(features),
        status => Err(status),
    }
}

/// Version of the linked libwebp decoder as `(major, minor, revision)`.
pub fn decoder_version() -> (u32, u32, u32) {
    split_version(unsafe { WebPGetDecoderVersion() })
}

/// Version of the linked libwebp encoder as `(major, minor, revision)`.
pub fn encoder_version() -> (u32, u32, u32) {
    split_version(unsafe { WebPGetEncoderVersion() })
}

fn split_version(packed: c_int) -> (u32, u32, u32) {
    let v = packed as u32;
    ((v >> 16) & 0xff, (v >> 8) & 0xff, v & 0xff)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_code_roundtrip() {
        for code in 0..=7 {
            assert_eq!(Vp8Status::from_code(code).code(), code);
        }
    }

    #[test]
    fn test_unknown_status_code_is_bitstream_error() {
        assert_eq!(Vp8Status::from_code(42), Vp8Status::BitstreamError);
        assert_eq!(Vp8Status::from_code(-1), Vp8Status::BitstreamError);
    }

    #[test]
    fn test_split_version() {
        assert_eq!(split_version(0x010400), (1, 4, 0));
        assert_eq!(split_version(0x000602), (0, 6, 2));
    }

    #[test]
    fn test_null_codec_output_is_rejected_without_tracking() {
        let before = tracking::live_allocations();
        let result = unsafe { CodecBuffer::from_codec_output(std::ptr::null_mut(), 10) };
        assert!(matches!(result, Err(BridgeError::CodecRejectedError(_))));
        assert_eq!(tracking::live_allocations(), before);
    }

    #[test]
    fn test_get_info_rejects_garbage() {
        assert!(get_info(b"definitely not a webp file").is_none());
        assert!(get_info(&[]).is_none());
    }
}
