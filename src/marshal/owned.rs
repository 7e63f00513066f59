// Bridge-owned copies of caller input, and copies handed back to the caller.

use super::tracking;
use super::view::{CallerArray, PinnedView};
use crate::error::{BridgeError, Result};

/// A bridge-allocated copy of a caller array, exactly as long as the input.
///
/// Released explicitly with [`release`](OwnedBuffer::release) right after the
/// codec call, or by `Drop` on any early return.
#[derive(Debug)]
pub struct OwnedBuffer {
    bytes: Vec<u8>,
    released: bool,
}

impl OwnedBuffer {
    fn new(bytes: Vec<u8>) -> Self {
        tracking::owned_buffer_acquired();
        OwnedBuffer {
            bytes,
            released: false,
        }
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.bytes
    }

    pub fn is_released(&self) -> bool {
        self.released
    }

    /// Free the copy. Calling this more than once is a no-op.
    pub fn release(&mut self) {
        if self.released {
            return;
        }
        self.released = true;
        self.bytes = Vec::new();
        tracking::owned_buffer_released();
    }
}

impl Drop for OwnedBuffer {
    fn drop(&mut self) {
        self.release();
    }
}

/// Copy a caller array into a new owned buffer of identical length.
///
/// The array is pinned only for the duration of the copy and is unpinned on
/// every path, including allocation failure.
pub fn to_owned_buffer<A: CallerArray + ?Sized>(array: &A) -> Result<OwnedBuffer> {
    let view = PinnedView::pin(array)?;

    let mut bytes = Vec::new();
    bytes.try_reserve_exact(view.len()).map_err(|e| {
        BridgeError::allocation(format!(
            "failed to allocate {} bytes for the input copy: {e}",
            view.len()
        ))
    })?;
    bytes.extend_from_slice(view.as_slice());

    Ok(OwnedBuffer::new(bytes))
}

/// Release the buffer in `slot`, if any. Safe to call on an empty slot or
/// repeatedly.
pub fn release_owned_buffer(slot: &mut Option<OwnedBuffer>) {
    if let Some(mut buffer) = slot.take() {
        buffer.release();
    }
}

/// Allocate a caller-visible buffer of exactly `bytes.len()` and copy into it.
pub fn copy_to_caller(bytes: &[u8]) -> Result<Vec<u8>> {
    let mut out = Vec::new();
    out.try_reserve_exact(bytes.len()).map_err(|e| {
        BridgeError::allocation(format!(
            "failed to allocate {} bytes for the result: {e}",
            bytes.len()
        ))
    })?;
    out.extend_from_slice(bytes);
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_release_is_idempotent() {
        let before = tracking::live_allocations();
        let mut buffer = to_owned_buffer(&[1u8, 2, 3][..]).expect("copy");
        assert_eq!(tracking::live_allocations().owned_buffers, before.owned_buffers + 1);

        buffer.release();
        buffer.release();
        assert!(buffer.is_released());
        assert!(buffer.is_empty());
        drop(buffer);

        assert_eq!(tracking::live_allocations(), before);
    }

    #[test]
    fn test_release_owned_buffer_on_empty_slot() {
        let mut slot: Option<OwnedBuffer> = None;
        release_owned_buffer(&mut slot);
        assert!(slot.is_none());
    }
}
