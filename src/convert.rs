// Conversions between `image` buffers and the raw interleaved layouts the
// bridge encodes from and decodes into.

use image::{DynamicImage, RgbImage, RgbaImage};
use serde::{Deserialize, Serialize};

use crate::bridge::{self, EncodeMode, PixelFormat, PixelLayout};
use crate::error::{BridgeError, Result};

/// Which channel layout to extract from a source image.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PixelFormatChoice {
    /// RGBA when the source colour type carries alpha, RGB otherwise.
    #[default]
    Auto,
    Rgb,
    Rgba,
}

impl PixelFormatChoice {
    pub fn resolve(self, has_alpha: bool) -> PixelFormat {
        match self {
            PixelFormatChoice::Auto => PixelFormat::from_alpha(has_alpha),
            PixelFormatChoice::Rgb => PixelFormat::Rgb,
            PixelFormatChoice::Rgba => PixelFormat::Rgba,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            PixelFormatChoice::Auto => "auto",
            PixelFormatChoice::Rgb => "rgb",
            PixelFormatChoice::Rgba => "rgba",
        }
    }
}

/// Interleaved 8-bit pixels with their geometry.
#[derive(Debug, Clone)]
pub struct RawImage {
    pub pixels: Vec<u8>,
    pub layout: PixelLayout,
    pub format: PixelFormat,
}

impl RawImage {
    /// Extract tightly packed RGB or RGBA samples from any `image` colour type.
    pub fn from_image(image: &DynamicImage, choice: PixelFormatChoice) -> Self {
        let format = choice.resolve(image.color().has_alpha());
        let pixels = match format {
            PixelFormat::Rgb => image.to_rgb8().into_raw(),
            PixelFormat::Rgba => image.to_rgba8().into_raw(),
        };
        RawImage {
            pixels,
            layout: PixelLayout::packed(image.width(), image.height(), format),
            format,
        }
    }

    /// Build an `image` buffer, dropping any row padding.
    pub fn to_image(&self) -> Result<DynamicImage> {
        self.layout.validate(self.format, self.pixels.len())?;

        let row_len = (self.layout.width * self.format.channels()) as usize;
        let packed = if self.layout.stride as usize == row_len {
            self.pixels[..row_len * self.layout.height as usize].to_vec()
        } else {
            self.pixels
                .chunks(self.layout.stride as usize)
                .take(self.layout.height as usize)
                .flat_map(|row| &row[..row_len])
                .copied()
                .collect()
        };

        image_from_packed(self.layout.width, self.layout.height, self.format, packed)
    }
}

/// Build an image from tightly packed samples, inferring RGB or RGBA from the
/// buffer length (`w*h*3` or `w*h*4`).
pub fn image_from_raw(width: u32, height: u32, pixels: Vec<u8>) -> Result<DynamicImage> {
    if width == 0 || height == 0 {
        return Err(BridgeError::image(format!(
            "image dimensions must be positive, got {width}x{height}"
        )));
    }
    let pixel_count = (width as usize)
        .checked_mul(height as usize)
        .ok_or_else(|| {
            BridgeError::image(format!("overflow computing pixel count for {width}x{height}"))
        })?;

    let format = if pixel_count.checked_mul(4) == Some(pixels.len()) {
        PixelFormat::Rgba
    } else if pixel_count.checked_mul(3) == Some(pixels.len()) {
        PixelFormat::Rgb
    } else {
        return Err(BridgeError::image(format!(
            "{} bytes is neither RGB nor RGBA for a {width}x{height} image",
            pixels.len()
        )));
    };

    image_from_packed(width, height, format, pixels)
}

fn image_from_packed(
    width: u32,
    height: u32,
    format: PixelFormat,
    pixels: Vec<u8>,
) -> Result<DynamicImage> {
    let image = match format {
        PixelFormat::Rgb => RgbImage::from_raw(width, height, pixels).map(DynamicImage::ImageRgb8),
        PixelFormat::Rgba => {
            RgbaImage::from_raw(width, height, pixels).map(DynamicImage::ImageRgba8)
        }
    };
    image.ok_or_else(|| {
        BridgeError::image(format!(
            "failed to create {width}x{height} {} image from raw data",
            format.as_str()
        ))
    })
}

/// Options for [`encode_image`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EncodeOptions {
    pub mode: EncodeMode,
    pub pixel_format: PixelFormatChoice,
}

impl Default for EncodeOptions {
    fn default() -> Self {
        EncodeOptions {
            mode: EncodeMode::Lossy { quality: 75.0 },
            pixel_format: PixelFormatChoice::Auto,
        }
    }
}

/// Encode an `image` buffer to WebP.
pub fn encode_image(image: &DynamicImage, options: &EncodeOptions) -> Result<Vec<u8>> {
    let raw = RawImage::from_image(image, options.pixel_format);
    bridge::encode(&raw.pixels, raw.layout, raw.format, options.mode)
}

/// Decode a still WebP image, RGBA when the bitstream has alpha, RGB otherwise.
pub fn decode_image(bitstream: &[u8]) -> Result<DynamicImage> {
    let features = bridge::get_features(bitstream, bitstream.len())?;
    if features.has_animation {
        return Err(BridgeError::codec_rejected(
            "animated bitstreams cannot be decoded into a single buffer",
        ));
    }

    let format = PixelFormat::from_alpha(features.has_alpha);
    let layout = PixelLayout::packed(features.width, features.height, format);
    let len = layout.required_len().ok_or_else(|| {
        BridgeError::allocation(format!(
            "overflow computing buffer size for a {}x{} image",
            features.width, features.height
        ))
    })?;

    let mut pixels = Vec::new();
    pixels.try_reserve_exact(len).map_err(|e| {
        BridgeError::allocation(format!("failed to allocate {len} bytes for decoding: {e}"))
    })?;
    pixels.resize(len, 0);

    match format {
        PixelFormat::Rgb => bridge::decode_rgb_into(bitstream, &mut pixels, layout.stride)?,
        PixelFormat::Rgba => bridge::decode_rgba_into(bitstream, &mut pixels, layout.stride)?,
    }

    RawImage {
        pixels,
        layout,
        format,
    }
    .to_image()
}
