use libc::c_int;
use serde::{Deserialize, Serialize};

use crate::error::{BridgeError, Result};

/// Interleaved 8-bit pixel formats the bridge passes to the codec.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PixelFormat {
    Rgb,
    Rgba,
}

impl PixelFormat {
    /// Bytes per pixel.
    pub fn channels(self) -> u32 {
        match self {
            PixelFormat::Rgb => 3,
            PixelFormat::Rgba => 4,
        }
    }

    pub fn has_alpha(self) -> bool {
        self == PixelFormat::Rgba
    }

    pub fn from_alpha(has_alpha: bool) -> Self {
        if has_alpha {
            PixelFormat::Rgba
        } else {
            PixelFormat::Rgb
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            PixelFormat::Rgb => "rgb",
            PixelFormat::Rgba => "rgba",
        }
    }
}

/// Geometry of a raw pixel buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PixelLayout {
    pub width: u32,
    pub height: u32,
    /// Bytes per row, possibly including padding past `width * channels`.
    pub stride: u32,
}

/// Layout values narrowed to the codec's integer type.
#[derive(Debug, Clone, Copy)]
pub(crate) struct CodecDims {
    pub width: c_int,
    pub height: c_int,
    pub stride: c_int,
}

impl PixelLayout {
    pub fn new(width: u32, height: u32, stride: u32) -> Self {
        PixelLayout {
            width,
            height,
            stride,
        }
    }

    /// Layout with no row padding.
    pub fn packed(width: u32, height: u32, format: PixelFormat) -> Self {
        PixelLayout {
            width,
            height,
            stride: width.saturating_mul(format.channels()),
        }
    }

    /// `stride * height`, the number of bytes a buffer with this layout must hold.
    pub fn required_len(&self) -> Option<usize> {
        (self.stride as usize).checked_mul(self.height as usize)
    }

    /// Check that a buffer of `available` bytes can be handed to the codec
    /// with this layout without the codec reading out of bounds.
    pub fn validate(&self, format: PixelFormat, available: usize) -> Result<()> {
        if self.width == 0 || self.height == 0 {
            return Err(BridgeError::invalid_input(format!(
                "image dimensions must be positive, got {}x{}",
                self.width, self.height
            )));
        }

        let limit = c_int::MAX as u32;
        if self.width > limit || self.height > limit || self.stride > limit {
            return Err(BridgeError::invalid_input(format!(
                "layout exceeds i32::MAX (width={}, height={}, stride={})",
                self.width, self.height, self.stride
            )));
        }

        let min_stride = u64::from(self.width) * u64::from(format.channels());
        if u64::from(self.stride) < min_stride {
            return Err(BridgeError::invalid_input(format!(
                "stride {} is smaller than width x channels ({})",
                self.stride, min_stride
            )));
        }

        let required = self.required_len().ok_or_else(|| {
            BridgeError::invalid_input(format!(
                "overflow computing buffer size for stride {} x height {}",
                self.stride, self.height
            ))
        })?;
        if available < required {
            return Err(BridgeError::invalid_input(format!(
                "pixel buffer holds {} bytes but {} rows of stride {} need {}",
                available, self.height, self.stride, required
            )));
        }

        Ok(())
    }

    /// Only meaningful after [`validate`](PixelLayout::validate) succeeded.
    pub(crate) fn codec_dims(&self) -> CodecDims {
        CodecDims {
            width: self.width as c_int,
            height: self.height as c_int,
            stride: self.stride as c_int,
        }
    }
}
