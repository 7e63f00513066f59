// Raw libwebp entry points.
//
// libwebp-sys builds and links libwebp itself. Only the handful of functions
// the bridge forwards to are re-exported here, so nothing outside `ffi` names
// the -sys crate directly.

pub use libwebp_sys::{
    WebPBitstreamFeatures, WebPDecodeRGBAInto, WebPDecodeRGBInto, WebPEncodeLosslessRGB,
    WebPEncodeLosslessRGBA, WebPEncodeRGB, WebPEncodeRGBA, WebPFree, WebPGetDecoderVersion,
    WebPGetEncoderVersion, WebPGetFeatures, WebPGetInfo,
};
