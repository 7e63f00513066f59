// Marshaling discipline tests: pinning, commit/abort, owned copies, codec calls

use std::cell::{Cell, RefCell};
use std::ptr::NonNull;

use webp_bridge::BridgeError;
use webp_bridge::bridge::{
    PixelFormat, PixelLayout, decode_rgb_into, encode_lossless_rgb, get_features,
};
use webp_bridge::marshal::{
    CallerArray, OwnedBuffer, PinnedView, PinnedViewMut, ReleaseMode, copy_to_caller,
    live_allocations, release_owned_buffer, to_owned_buffer,
};

/// A caller array that records every pin and unpin, and can refuse to pin.
struct RecordingArray {
    bytes: RefCell<Vec<u8>>,
    refuse_pin: bool,
    pins: Cell<usize>,
    unpins: RefCell<Vec<ReleaseMode>>,
}

impl RecordingArray {
    fn new(bytes: Vec<u8>) -> Self {
        RecordingArray {
            bytes: RefCell::new(bytes),
            refuse_pin: false,
            pins: Cell::new(0),
            unpins: RefCell::new(Vec::new()),
        }
    }

    fn refusing() -> Self {
        RecordingArray {
            refuse_pin: true,
            ..RecordingArray::new(vec![0; 16])
        }
    }

    fn unpins(&self) -> Vec<ReleaseMode> {
        self.unpins.borrow().clone()
    }
}

unsafe impl CallerArray for RecordingArray {
    fn len(&self) -> usize {
        self.bytes.borrow().len()
    }

    fn pin(&self) -> Option<NonNull<u8>> {
        if self.refuse_pin {
            return None;
        }
        self.pins.set(self.pins.get() + 1);
        NonNull::new(self.bytes.borrow_mut().as_mut_ptr())
    }

    fn pin_mut(&mut self) -> Option<NonNull<u8>> {
        CallerArray::pin(&*self)
    }

    fn unpin(&self, _ptr: NonNull<u8>, mode: ReleaseMode) {
        self.unpins.borrow_mut().push(mode);
    }
}

// ============================================================
// 1. Read views
// ============================================================

#[test]
fn test_read_view_unpins_on_drop() {
    let array = RecordingArray::new(vec![1, 2, 3]);
    {
        let view = PinnedView::pin(&array).expect("pin should succeed");
        assert_eq!(view.as_slice(), &[1, 2, 3]);
        assert_eq!(live_allocations().pinned_views, 1);
    }
    assert_eq!(array.pins.get(), 1);
    assert_eq!(array.unpins(), vec![ReleaseMode::Abort]);
    assert!(live_allocations().is_empty());
}

#[test]
fn test_pin_failure_is_boundary_access_error() {
    let array = RecordingArray::refusing();
    let result = PinnedView::pin(&array);
    assert!(matches!(result, Err(BridgeError::BoundaryAccessError(_))));
    assert!(array.unpins().is_empty(), "nothing was pinned, nothing to unpin");
    assert!(live_allocations().is_empty());
}

// ============================================================
// 2. Writable views: commit vs abort
// ============================================================

#[test]
fn test_write_view_commit_publishes() {
    let mut array = RecordingArray::new(vec![0; 4]);
    {
        let mut view = PinnedViewMut::pin(&mut array).expect("pin should succeed");
        view.as_mut_slice().copy_from_slice(&[9, 8, 7, 6]);
        view.commit();
    }
    assert_eq!(array.unpins(), vec![ReleaseMode::Commit]);
    assert_eq!(*array.bytes.borrow(), vec![9, 8, 7, 6]);
    assert!(live_allocations().is_empty());
}

#[test]
fn test_write_view_dropped_without_commit_aborts() {
    let mut array = RecordingArray::new(vec![0; 4]);
    {
        let mut view = PinnedViewMut::pin(&mut array).expect("pin should succeed");
        view.as_mut_slice()[0] = 1;
    }
    assert_eq!(array.unpins(), vec![ReleaseMode::Abort]);
    assert!(live_allocations().is_empty());
}

#[test]
fn test_write_view_pin_failure() {
    let mut array = RecordingArray::refusing();
    let result = PinnedViewMut::pin(&mut array);
    assert!(matches!(result, Err(BridgeError::BoundaryAccessError(_))));
    drop(result);
    assert!(array.unpins().is_empty());
}

// ============================================================
// 3. Owned copies
// ============================================================

#[test]
fn test_owned_buffer_copies_exact_length() {
    let array = RecordingArray::new((0..=255).collect());
    let buffer = to_owned_buffer(&array).expect("copy should succeed");

    assert_eq!(buffer.len(), 256);
    assert_eq!(buffer.as_slice(), array.bytes.borrow().as_slice());
    // The array is pinned only for the copy.
    assert_eq!(array.unpins(), vec![ReleaseMode::Abort]);
    assert_eq!(live_allocations().owned_buffers, 1);
    assert_eq!(live_allocations().pinned_views, 0);

    drop(buffer);
    assert!(live_allocations().is_empty());
}

#[test]
fn test_owned_buffer_copy_of_empty_array() {
    let buffer = to_owned_buffer(&Vec::<u8>::new()).expect("empty copy should succeed");
    assert!(buffer.is_empty());
}

#[test]
fn test_owned_buffer_from_refusing_array() {
    let array = RecordingArray::refusing();
    let result = to_owned_buffer(&array);
    assert!(matches!(result, Err(BridgeError::BoundaryAccessError(_))));
    assert!(live_allocations().is_empty());
}

#[test]
fn test_release_twice_is_noop() {
    let mut buffer = to_owned_buffer(&[1u8, 2, 3][..]).expect("copy should succeed");
    buffer.release();
    assert!(buffer.is_released());
    assert!(live_allocations().is_empty());

    buffer.release();
    drop(buffer);
    assert!(live_allocations().is_empty());
}

#[test]
fn test_release_owned_buffer_slot() {
    let mut slot: Option<OwnedBuffer> = Some(to_owned_buffer(&[5u8; 8][..]).expect("copy"));
    release_owned_buffer(&mut slot);
    assert!(slot.is_none());
    release_owned_buffer(&mut slot);
    assert!(live_allocations().is_empty());
}

#[test]
fn test_copy_to_caller_is_exact() {
    let bytes = [0xAAu8; 37];
    let out = copy_to_caller(&bytes).expect("copy should succeed");
    assert_eq!(out.len(), 37);
    assert_eq!(out, bytes);
}

// ============================================================
// 4. Release modes through the codec calls
// ============================================================

fn lossless_fixture(width: u32, height: u32) -> (Vec<u8>, Vec<u8>) {
    let pixels: Vec<u8> = (0..width * height)
        .flat_map(|i| [(i * 7) as u8, (i * 13) as u8, 200 - (i % 100) as u8])
        .collect();
    let layout = PixelLayout::packed(width, height, PixelFormat::Rgb);
    let webp = encode_lossless_rgb(&pixels, layout).expect("fixture encode");
    (pixels, webp)
}

#[test]
fn test_decode_commits_destination_on_success() {
    let (pixels, webp) = lossless_fixture(6, 4);
    let bitstream = RecordingArray::new(webp);
    let mut destination = RecordingArray::new(vec![0; pixels.len()]);

    decode_rgb_into(&bitstream, &mut destination, 6 * 3).expect("decode should succeed");

    assert_eq!(*destination.bytes.borrow(), pixels);
    assert_eq!(destination.unpins(), vec![ReleaseMode::Commit]);
    assert_eq!(bitstream.pins.get(), 1);
    assert_eq!(bitstream.unpins(), vec![ReleaseMode::Abort]);
    assert!(live_allocations().is_empty());
}

#[test]
fn test_decode_aborts_undersized_destination() {
    let (pixels, webp) = lossless_fixture(6, 4);
    let bitstream = RecordingArray::new(webp);
    let mut destination = RecordingArray::new(vec![0xCD; pixels.len() - 1]);

    let result = decode_rgb_into(&bitstream, &mut destination, 6 * 3);

    assert!(matches!(result, Err(BridgeError::InsufficientCapacityError(_))));
    assert_eq!(destination.unpins(), vec![ReleaseMode::Abort]);
    assert_eq!(bitstream.unpins(), vec![ReleaseMode::Abort]);
    assert!(destination.bytes.borrow().iter().all(|&b| b == 0xCD));
    assert!(live_allocations().is_empty());
}

#[test]
fn test_decode_aborts_destination_on_corrupt_bitstream() {
    let bitstream = RecordingArray::new(b"RIFF\x10\0\0\0WEBPVP8 garbage!".to_vec());
    let mut destination = RecordingArray::new(vec![0; 64]);

    let result = decode_rgb_into(&bitstream, &mut destination, 12);

    assert!(result.is_err());
    assert_eq!(destination.unpins(), vec![ReleaseMode::Abort]);
    assert_eq!(bitstream.unpins(), vec![ReleaseMode::Abort]);
    assert!(live_allocations().is_empty());
}

#[test]
fn test_decode_unpins_bitstream_when_destination_refuses() {
    let (_, webp) = lossless_fixture(6, 4);
    let bitstream = RecordingArray::new(webp);
    let mut destination = RecordingArray::refusing();

    let result = decode_rgb_into(&bitstream, &mut destination, 6 * 3);

    assert!(matches!(result, Err(BridgeError::BoundaryAccessError(_))));
    assert_eq!(bitstream.pins.get(), 1);
    assert_eq!(bitstream.unpins(), vec![ReleaseMode::Abort]);
    assert!(destination.unpins().is_empty());
    assert!(live_allocations().is_empty());
}

#[test]
fn test_encode_and_inspect_release_input_once() {
    let (pixels, webp) = lossless_fixture(6, 4);

    let input = RecordingArray::new(pixels);
    encode_lossless_rgb(&input, PixelLayout::packed(6, 4, PixelFormat::Rgb)).expect("encode");
    assert_eq!(input.pins.get(), 1);
    assert_eq!(input.unpins(), vec![ReleaseMode::Abort]);

    let bitstream = RecordingArray::new(webp);
    let len = bitstream.len();
    let features = get_features(&bitstream, len).expect("features");
    assert_eq!((features.width, features.height), (6, 4));
    assert_eq!(bitstream.pins.get(), 1);
    assert_eq!(bitstream.unpins(), vec![ReleaseMode::Abort]);
    assert!(live_allocations().is_empty());
}
