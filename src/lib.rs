//! Safe bridge between callers and libwebp's simple encode/decode API.
//!
//! - [`bridge`]: encode (lossy/lossless, RGB/RGBA), decode into caller
//!   buffers, and header inspection.
//! - [`marshal`]: the pinning, copying and release discipline every bridge
//!   call follows.
//! - [`capi`]: the same operations behind an unmangled C ABI.
//! - [`convert`], [`config`], [`cache`], [`pipeline`]: image-file jobs driven
//!   by YAML job files, used by the `webp_bridge` binary.

pub mod bridge;
pub mod cache;
pub mod capi;
pub mod config;
pub mod convert;
pub mod error;
pub mod ffi;
pub mod marshal;
pub mod pipeline;

pub use error::{BridgeError, Result};
