// Header inspection without a full decode.

use libc::c_int;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{BridgeError, Result};
use crate::ffi::webp::{self, Vp8Status};
use crate::ffi::webp_sys::WebPBitstreamFeatures;
use crate::marshal::{CallerArray, PinnedView};

/// Compression used by a bitstream.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BitstreamFormat {
    /// Undefined or mixed (animations may combine both).
    #[default]
    Undefined,
    Lossy,
    Lossless,
}

impl BitstreamFormat {
    pub fn from_code(code: c_int) -> Self {
        match code {
            1 => BitstreamFormat::Lossy,
            2 => BitstreamFormat::Lossless,
            _ => BitstreamFormat::Undefined,
        }
    }

    pub fn code(self) -> c_int {
        match self {
            BitstreamFormat::Undefined => 0,
            BitstreamFormat::Lossy => 1,
            BitstreamFormat::Lossless => 2,
        }
    }
}

/// Metadata parsed from a bitstream header.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Features {
    pub width: u32,
    pub height: u32,
    pub has_alpha: bool,
    pub has_animation: bool,
    pub format: BitstreamFormat,
}

impl Features {
    fn from_raw(raw: &WebPBitstreamFeatures) -> Self {
        Features {
            width: raw.width.max(0) as u32,
            height: raw.height.max(0) as u32,
            has_alpha: raw.has_alpha != 0,
            has_animation: raw.has_animation != 0,
            format: BitstreamFormat::from_code(raw.format),
        }
    }
}

/// Parse the features of the first `declared_size` bytes of `bitstream`.
///
/// A `declared_size` larger than the array is refused with
/// [`Vp8Status::InvalidParam`]; codec failures carry the codec's status.
pub fn get_features<A: CallerArray + ?Sized>(
    bitstream: &A,
    declared_size: usize,
) -> Result<Features> {
    let view = PinnedView::pin(bitstream)?;

    if declared_size > view.len() {
        debug!(
            declared_size,
            len = view.len(),
            "declared size exceeds the bitstream"
        );
        return Err(BridgeError::CodecStatusError(Vp8Status::InvalidParam));
    }

    match webp::get_features(&view.as_slice()[..declared_size]) {
        Ok(raw) => Ok(Features::from_raw(&raw)),
        Err(status) => {
            debug!(%status, "feature inspection failed");
            Err(BridgeError::CodecStatusError(status))
        }
    }
}

/// Status-code form of [`get_features`]: `record` is written only when the
/// returned status is [`Vp8Status::Ok`].
pub fn get_features_into<A: CallerArray + ?Sized>(
    bitstream: &A,
    declared_size: usize,
    record: &mut Features,
) -> Vp8Status {
    match get_features(bitstream, declared_size) {
        Ok(features) => {
            *record = features;
            Vp8Status::Ok
        }
        Err(e) => e.status(),
    }
}

/// Width and height of a bitstream.
pub fn get_info<A: CallerArray + ?Sized>(bitstream: &A) -> Result<(u32, u32)> {
    let view = PinnedView::pin(bitstream)?;
    webp::get_info(view.as_slice()).ok_or_else(|| {
        debug!(len = view.len(), "bitstream header could not be parsed");
        BridgeError::codec_rejected("bitstream header could not be parsed")
    })
}
