//! Frame container and the single-slot latest-frame buffer.
//!
//! `Frame` is an owned H×W×3 8-bit BGR image. A frame handed to a caller is
//! always a fully formed, independent copy: mutating it never touches the
//! source's internal buffer.
//!
//! `FrameSlot` is the mailbox between a background producer and its
//! consumers. It is explicitly not a queue: it holds exactly one frame,
//! each store overwrites the previous one, and only the latest frame
//! matters. The pixel buffer is allocated once at construction (maximum
//! resolution) and overwritten in place on every store, so the steady-state
//! allocation cost is the one copy handed to the consumer.

use std::fmt;
use std::sync::Mutex;

use crate::error::SourceError;

/// Color channels per pixel (BGR).
pub const CHANNELS: usize = 3;

/// One decoded image, `height * width * 3` bytes in row-major BGR order.
#[derive(Clone, PartialEq, Eq)]
pub struct Frame {
    width: u32,
    height: u32,
    pixels: Vec<u8>,
}

impl Frame {
    /// Build a frame from raw pixel data. The buffer length must match the
    /// dimensions exactly.
    pub fn from_pixels(width: u32, height: u32, pixels: Vec<u8>) -> Result<Self, SourceError> {
        let expected = width as usize * height as usize * CHANNELS;
        if pixels.len() != expected {
            return Err(SourceError::transient(format!(
                "frame buffer is {} bytes, expected {} for {}x{}",
                pixels.len(),
                expected,
                width,
                height
            )));
        }
        Ok(Self {
            width,
            height,
            pixels,
        })
    }

    /// Solid-color frame, used by the synthetic sources and in tests.
    pub fn solid(width: u32, height: u32, bgr: [u8; 3]) -> Self {
        let mut pixels = Vec::with_capacity(width as usize * height as usize * CHANNELS);
        for _ in 0..(width as usize * height as usize) {
            pixels.extend_from_slice(&bgr);
        }
        Self {
            width,
            height,
            pixels,
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Raw pixel bytes, row-major BGR.
    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }

    /// Mutable pixel access for callers that draw overlays on their copy.
    pub fn pixels_mut(&mut self) -> &mut [u8] {
        &mut self.pixels
    }
}

impl fmt::Debug for Frame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Frame")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("bytes", &self.pixels.len())
            .finish()
    }
}

// ----------------------------------------------------------------------------
// FrameSlot: mutex-guarded single-slot mailbox
// ----------------------------------------------------------------------------

struct SlotState {
    /// Fixed-capacity pixel storage, overwritten in place.
    pixels: Vec<u8>,
    width: u32,
    height: u32,
    /// Set once the first frame lands; never cleared.
    has_frame: bool,
}

/// Shared latest-frame buffer.
///
/// The lock is held only for the duration of the in-place overwrite on
/// `store` or the copy-out on `snapshot`, never across a network read or a
/// decode. If the consumer polls slower than the producer decodes, frames
/// are silently overwritten; if it polls faster, it observes repeats.
pub struct FrameSlot {
    state: Mutex<SlotState>,
    capacity: usize,
}

impl FrameSlot {
    /// Allocate a slot sized for `max_width` x `max_height` frames.
    pub fn new(max_width: u32, max_height: u32) -> Self {
        let capacity = max_width as usize * max_height as usize * CHANNELS;
        Self {
            state: Mutex::new(SlotState {
                pixels: vec![0u8; capacity],
                width: 0,
                height: 0,
                has_frame: false,
            }),
            capacity,
        }
    }

    /// Overwrite the slot with `frame`. Frames larger than the slot's fixed
    /// capacity are rejected as transient failures and dropped.
    pub fn store(&self, frame: &Frame) -> Result<(), SourceError> {
        let bytes = frame.pixels();
        if bytes.len() > self.capacity {
            return Err(SourceError::transient(format!(
                "{}x{} frame exceeds slot capacity of {} bytes",
                frame.width(),
                frame.height(),
                self.capacity
            )));
        }
        let mut state = self
            .state
            .lock()
            .map_err(|_| SourceError::transient("frame slot lock poisoned"))?;
        state.pixels[..bytes.len()].copy_from_slice(bytes);
        state.width = frame.width();
        state.height = frame.height();
        state.has_frame = true;
        Ok(())
    }

    /// Copy out the most recently stored frame, or `None` if nothing has
    /// been stored yet. Never blocks waiting for a new frame.
    pub fn snapshot(&self) -> Option<Frame> {
        let state = self.state.lock().ok()?;
        if !state.has_frame {
            return None;
        }
        let len = state.width as usize * state.height as usize * CHANNELS;
        Some(Frame {
            width: state.width,
            height: state.height,
            pixels: state.pixels[..len].to_vec(),
        })
    }

    /// True once at least one frame has been stored.
    pub fn available(&self) -> bool {
        self.state
            .lock()
            .map(|state| state.has_frame)
            .unwrap_or(false)
    }
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn frame_rejects_mismatched_buffer() {
        let err = Frame::from_pixels(4, 4, vec![0u8; 10]).unwrap_err();
        assert!(matches!(err, SourceError::Transient(_)));
    }

    #[test]
    fn empty_slot_reports_nothing() {
        let slot = FrameSlot::new(8, 8);
        assert!(!slot.available());
        assert!(slot.snapshot().is_none());
    }

    #[test]
    fn snapshot_equals_last_store() {
        let slot = FrameSlot::new(8, 8);
        let red = Frame::solid(8, 8, [0, 0, 255]);
        slot.store(&red).unwrap();

        assert!(slot.available());
        let copy = slot.snapshot().unwrap();
        assert_eq!(copy, red);

        // Repeated polls return the same frame until the next store.
        assert_eq!(slot.snapshot().unwrap(), red);

        let green = Frame::solid(8, 8, [0, 255, 0]);
        slot.store(&green).unwrap();
        assert_eq!(slot.snapshot().unwrap(), green);
    }

    #[test]
    fn snapshot_is_an_independent_copy() {
        let slot = FrameSlot::new(4, 4);
        slot.store(&Frame::solid(4, 4, [1, 2, 3])).unwrap();

        let mut copy = slot.snapshot().unwrap();
        copy.pixels_mut()[0] = 99;

        assert_eq!(slot.snapshot().unwrap().pixels()[0], 1);
    }

    #[test]
    fn smaller_frame_after_larger_one_snapshots_cleanly() {
        let slot = FrameSlot::new(8, 8);
        slot.store(&Frame::solid(8, 8, [7, 7, 7])).unwrap();
        slot.store(&Frame::solid(2, 2, [9, 9, 9])).unwrap();

        let copy = slot.snapshot().unwrap();
        assert_eq!(copy.width(), 2);
        assert_eq!(copy.pixels(), Frame::solid(2, 2, [9, 9, 9]).pixels());
    }

    #[test]
    fn oversized_frame_is_rejected() {
        let slot = FrameSlot::new(2, 2);
        let err = slot.store(&Frame::solid(4, 4, [0, 0, 0])).unwrap_err();
        assert!(matches!(err, SourceError::Transient(_)));
        assert!(!slot.available());
    }

    #[test]
    fn concurrent_readers_never_observe_torn_frames() {
        let slot = Arc::new(FrameSlot::new(16, 16));

        let writer = {
            let slot = Arc::clone(&slot);
            std::thread::spawn(move || {
                let red = Frame::solid(16, 16, [0, 0, 255]);
                let blue = Frame::solid(16, 16, [255, 0, 0]);
                for i in 0..2_000 {
                    let frame = if i % 2 == 0 { &red } else { &blue };
                    slot.store(frame).unwrap();
                }
            })
        };

        let readers: Vec<_> = (0..4)
            .map(|_| {
                let slot = Arc::clone(&slot);
                std::thread::spawn(move || {
                    for _ in 0..2_000 {
                        if let Some(frame) = slot.snapshot() {
                            let first = frame.pixels()[0];
                            // A torn frame would mix red and blue bytes.
                            assert!(
                                frame
                                    .pixels()
                                    .chunks_exact(CHANNELS)
                                    .all(|px| px[0] == first),
                                "observed a partially written frame"
                            );
                        }
                    }
                })
            })
            .collect();

        writer.join().unwrap();
        for reader in readers {
            reader.join().unwrap();
        }
    }
}
