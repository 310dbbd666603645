//! Background frame decoder.
//!
//! One dedicated thread per decoder instance runs an unbounded loop pulling
//! decoded frames from a [`FrameTransport`] and overwriting the shared
//! [`FrameSlot`]. The consumer polls the slot at its own cadence; there is
//! no queue and no backpressure, only the latest frame matters.
//!
//! Failure policy is stale-but-available: a transient read failure is
//! logged and skipped, a stream end stops the producer quietly, and in both
//! cases the last successfully decoded frame stays pollable until `stop()`.
//! A live display or robot loop should never halt on a dropped frame.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;

use crate::error::SourceError;
use crate::frame::{Frame, FrameSlot};

use super::transport::FrameTransport;
use super::FrameSource;

/// Frame source backed by a dedicated decode thread.
pub struct BackgroundDecoder {
    slot: Arc<FrameSlot>,
    running: Arc<AtomicBool>,
    handle: Option<JoinHandle<()>>,
}

impl BackgroundDecoder {
    /// Spawn the decode thread and return immediately.
    ///
    /// The shared buffer is sized for `max_width` x `max_height` once, here;
    /// transport configuration has already been validated by the caller.
    pub fn start(
        transport: Box<dyn FrameTransport>,
        max_width: u32,
        max_height: u32,
    ) -> Result<Self, SourceError> {
        let slot = Arc::new(FrameSlot::new(max_width, max_height));
        let running = Arc::new(AtomicBool::new(true));

        let handle = {
            let slot = Arc::clone(&slot);
            let running = Arc::clone(&running);
            std::thread::Builder::new()
                .name("frame-decoder".to_string())
                .spawn(move || decode_loop(transport, &slot, &running))
                .map_err(|err| {
                    SourceError::config(format!("spawn frame decoder thread: {}", err))
                })?
        };

        Ok(Self {
            slot,
            running: Arc::clone(&running),
            handle: Some(handle),
        })
    }
}

impl FrameSource for BackgroundDecoder {
    fn poll_frame(&mut self) -> Option<Frame> {
        self.slot.snapshot()
    }

    fn frame_available(&self) -> bool {
        self.slot.available()
    }

    /// Signal the decode thread and detach it. No drain: the thread exits
    /// at its next read boundary and never stores past the stop signal, so
    /// the last observable frame is whatever was last written.
    fn stop(&mut self) {
        self.running.store(false, Ordering::SeqCst);
        if let Some(handle) = self.handle.take() {
            drop(handle);
            log::debug!("frame decoder stopped");
        }
    }
}

impl Drop for BackgroundDecoder {
    fn drop(&mut self) {
        self.stop();
    }
}

fn decode_loop(mut transport: Box<dyn FrameTransport>, slot: &FrameSlot, running: &AtomicBool) {
    loop {
        if !running.load(Ordering::SeqCst) {
            break;
        }
        match transport.next_frame() {
            Ok(frame) => {
                // Re-check after the blocking read so a frame decoded while
                // stop() ran is dropped, not stored.
                if !running.load(Ordering::SeqCst) {
                    break;
                }
                if let Err(err) = slot.store(&frame) {
                    log::warn!("dropping frame: {}", err);
                }
            }
            Err(SourceError::Transient(msg)) => {
                log::warn!("no frame this cycle: {}", msg);
            }
            Err(err) => {
                // Stream ended or misbehaved; keep the last frame available.
                log::info!("frame decoder exiting: {}", err);
                break;
            }
        }
    }
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------
