// Pinned views over caller-owned arrays.

use std::ptr::NonNull;
use std::slice;

use super::tracking;
use crate::error::{BridgeError, Result};

/// How a pinned caller array is handed back.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReleaseMode {
    /// Publish bytes written through the view back to the caller.
    Commit,
    /// Discard any writes; the caller's contents are then undefined.
    Abort,
}

/// A byte array owned by the caller's memory domain.
///
/// The bridge never touches the storage directly: it pins the array, works on
/// the returned pointer, and unpins it before the operation returns.
///
/// # Safety
/// A pointer returned by [`pin`](CallerArray::pin) or
/// [`pin_mut`](CallerArray::pin_mut) must stay valid for `len()` bytes (of
/// writes as well, for `pin_mut`) until the matching
/// [`unpin`](CallerArray::unpin), and the storage must not move or shrink in
/// between.
pub unsafe trait CallerArray {
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Pin for reading. `None` signals a boundary-access failure.
    fn pin(&self) -> Option<NonNull<u8>>;

    /// Pin for writing. `None` signals a boundary-access failure.
    fn pin_mut(&mut self) -> Option<NonNull<u8>>;

    /// Release a pointer obtained from `pin` or `pin_mut`.
    fn unpin(&self, ptr: NonNull<u8>, mode: ReleaseMode);
}

unsafe impl CallerArray for [u8] {
    fn len(&self) -> usize {
        <[u8]>::len(self)
    }

    fn pin(&self) -> Option<NonNull<u8>> {
        Some(NonNull::from(self).cast())
    }

    fn pin_mut(&mut self) -> Option<NonNull<u8>> {
        Some(NonNull::from(self).cast())
    }

    fn unpin(&self, _ptr: NonNull<u8>, _mode: ReleaseMode) {}
}

unsafe impl CallerArray for Vec<u8> {
    fn len(&self) -> usize {
        Vec::len(self)
    }

    fn pin(&self) -> Option<NonNull<u8>> {
        CallerArray::pin(self.as_slice())
    }

    fn pin_mut(&mut self) -> Option<NonNull<u8>> {
        CallerArray::pin_mut(self.as_mut_slice())
    }

    fn unpin(&self, _ptr: NonNull<u8>, _mode: ReleaseMode) {}
}

/// Read-only pinned view. Dropping it unpins the array.
pub struct PinnedView<'a, A: CallerArray + ?Sized> {
    array: &'a A,
    ptr: NonNull<u8>,
    len: usize,
}

impl<'a, A: CallerArray + ?Sized> PinnedView<'a, A> {
    pub fn pin(array: &'a A) -> Result<Self> {
        let len = array.len();
        let ptr = array
            .pin()
            .ok_or_else(|| BridgeError::boundary_access("caller array could not be pinned"))?;
        tracking::view_pinned();
        Ok(PinnedView { array, ptr, len })
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

impl<A: CallerArray + ?Sized> Drop for PinnedView<'_, A> {
    fn drop(&mut self) {
        // Nothing was written, so there is nothing to publish.
        self.array.unpin(self.ptr, ReleaseMode::Abort);
        tracking::view_unpinned();
    }
}

/// Writable pinned view.
///
/// Dropping it unpins with [`ReleaseMode::Abort`]; only
/// [`commit`](PinnedViewMut::commit) publishes the written bytes.
pub struct PinnedViewMut<'a, A: CallerArray + ?Sized> {
    array: &'a mut A,
    ptr: NonNull<u8>,
    len: usize,
    mode: ReleaseMode,
}

impl<'a, A: CallerArray + ?Sized> PinnedViewMut<'a, A> {
    pub fn pin(array: &'a mut A) -> Result<Self> {
        let len = array.len();
        let ptr = array
            .pin_mut()
            .ok_or_else(|| BridgeError::boundary_access("caller array could not be pinned"))?;
        tracking::view_pinned();
        Ok(PinnedViewMut {
            array,
            ptr,
            len,
            mode: ReleaseMode::Abort,
        })
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn as_mut_slice(&mut self) -> &mut [u8] {
        unsafe { slice::from_raw_parts_mut(self.ptr.as_ptr(), self.len) }
    }

    /// Unpin and publish the written bytes to the caller.
    pub fn commit(mut self) {
        self.mode = ReleaseMode::Commit;
    }
}

impl<A: CallerArray + ?Sized> Drop for PinnedViewMut<'_, A> {
    fn drop(&mut self) {
        self.array.unpin(self.ptr, self.mode);
        tracking::view_unpinned();
    }
}
