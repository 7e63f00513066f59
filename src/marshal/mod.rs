//! Buffer marshaling between the caller's memory domain and the codec.
//!
//! Three kinds of memory cross the boundary on every call:
//!
//! - caller arrays, reached only through [`PinnedView`] / [`PinnedViewMut`]
//!   guards that unpin on drop;
//! - bridge-owned input copies ([`OwnedBuffer`]), released right after the
//!   codec call;
//! - codec-owned outputs ([`crate::ffi::webp::CodecBuffer`]), released through
//!   `WebPFree` only.

pub mod owned;
pub mod tracking;
pub mod view;

pub use owned::{OwnedBuffer, copy_to_caller, release_owned_buffer, to_owned_buffer};
pub use tracking::{LiveAllocations, live_allocations};
pub use view::{CallerArray, PinnedView, PinnedViewMut, ReleaseMode};
