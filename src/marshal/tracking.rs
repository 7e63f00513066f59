// Per-thread accounting of bridge-held resources.
//
// Every bridge operation runs to completion on the calling thread, so after a
// call returns all three counters must be back where they were before it.

use std::cell::Cell;

thread_local! {
    static OWNED_BUFFERS: Cell<usize> = const { Cell::new(0) };
    static CODEC_BUFFERS: Cell<usize> = const { Cell::new(0) };
    static PINNED_VIEWS: Cell<usize> = const { Cell::new(0) };
}

/// Snapshot of the resources currently held by the bridge on this thread.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LiveAllocations {
    /// Bridge-allocated input copies not yet released.
    pub owned_buffers: usize,
    /// libwebp-allocated outputs not yet passed to `WebPFree`.
    pub codec_buffers: usize,
    /// Caller arrays currently pinned.
    pub pinned_views: usize,
}

impl LiveAllocations {
    pub fn is_empty(&self) -> bool {
        self.owned_buffers == 0 && self.codec_buffers == 0 && self.pinned_views == 0
    }
}

pub fn live_allocations() -> LiveAllocations {
    LiveAllocations {
        owned_buffers: OWNED_BUFFERS.with(Cell::get),
        codec_buffers: CODEC_BUFFERS.with(Cell::get),
        pinned_views: PINNED_VIEWS.with(Cell::get),
    }
}

fn increment(counter: &'static std::thread::LocalKey<Cell<usize>>) {
    counter.with(|c| c.set(c.get() + 1));
}

fn decrement(counter: &'static std::thread::LocalKey<Cell<usize>>) {
    counter.with(|c| c.set(c.get().saturating_sub(1)));
}

pub(crate) fn owned_buffer_acquired() {
    increment(&OWNED_BUFFERS);
}

pub(crate) fn owned_buffer_released() {
    decrement(&OWNED_BUFFERS);
}

pub(crate) fn codec_buffer_acquired() {
    increment(&CODEC_BUFFERS);
}

pub(crate) fn codec_buffer_released() {
    decrement(&CODEC_BUFFERS);
}

pub(crate) fn view_pinned() {
    increment(&PINNED_VIEWS);
}

pub(crate) fn view_unpinned() {
    decrement(&PINNED_VIEWS);
}
