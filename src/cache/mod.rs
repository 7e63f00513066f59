//! Content-addressed cache of encode results, keyed by the source bytes and
//! the settings that affect the output.

pub mod hash;
pub mod store;
