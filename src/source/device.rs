//! Direct camera capture.
//!
//! `DirectCapture` wraps a local camera device. Each poll performs one
//! blocking device read; a failed read is this cycle's "no frame" and the
//! caller's loop simply polls again. There is no background context and no
//! shared state.
//!
//! Real devices go through V4L2 behind the `capture-v4l2` feature. A
//! `stub://` device path selects a synthetic camera for demos and tests.

use crate::error::SourceError;
use crate::frame::Frame;

use super::{FrameSource, SourceOptions};

/// Default local camera node (device index 0).
pub const DEFAULT_DEVICE: &str = "/dev/video0";

/// Frame source backed by synchronous local device reads.
pub struct DirectCapture {
    backend: CaptureBackend,
    has_frame: bool,
    stopped: bool,
}

enum CaptureBackend {
    Synthetic(SyntheticCapture),
    #[cfg(feature = "capture-v4l2")]
    V4l2(v4l2::V4l2Capture),
}

impl DirectCapture {
    /// Open the device eagerly; a bad path or an unopenable device is a
    /// configuration error at selection time, not on first poll.
    pub fn open(options: &SourceOptions) -> Result<Self, SourceError> {
        let backend = if options.device.starts_with("stub://") {
            log::info!("device: synthetic camera ({})", options.device);
            CaptureBackend::Synthetic(SyntheticCapture::new(options.width, options.height))
        } else {
            #[cfg(feature = "capture-v4l2")]
            {
                CaptureBackend::V4l2(v4l2::V4l2Capture::open(options)?)
            }
            #[cfg(not(feature = "capture-v4l2"))]
            {
                return Err(SourceError::config(
                    "camera devices require the capture-v4l2 feature (or a stub:// path)",
                ));
            }
        };
        Ok(Self {
            backend,
            has_frame: false,
            stopped: false,
        })
    }
}

impl FrameSource for DirectCapture {
    fn poll_frame(&mut self) -> Option<Frame> {
        if self.stopped {
            return None;
        }
        let frame = match &mut self.backend {
            CaptureBackend::Synthetic(camera) => camera.read(),
            #[cfg(feature = "capture-v4l2")]
            CaptureBackend::V4l2(camera) => camera.read(),
        };
        if frame.is_some() {
            self.has_frame = true;
        }
        frame
    }

    fn frame_available(&self) -> bool {
        self.has_frame
    }

    fn stop(&mut self) {
        self.stopped = true;
    }
}

// ----------------------------------------------------------------------------
// Synthetic camera (stub://) for demos and tests
// ----------------------------------------------------------------------------

struct SyntheticCapture {
    width: u32,
    height: u32,
    frame_count: u64,
}

impl SyntheticCapture {
    fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            frame_count: 0,
        }
    }

    /// Deterministic drifting pattern so successive frames differ.
    fn read(&mut self) -> Option<Frame> {
        self.frame_count += 1;
        let pixel_count = self.width as usize * self.height as usize * crate::frame::CHANNELS;
        let mut pixels = vec![0u8; pixel_count];
        for (i, pixel) in pixels.iter_mut().enumerate() {
            *pixel = ((i as u64 + self.frame_count) % 256) as u8;
        }
        Frame::from_pixels(self.width, self.height, pixels).ok()
    }
}

// ----------------------------------------------------------------------------
// V4L2 camera
// ----------------------------------------------------------------------------

#[cfg(feature = "capture-v4l2")]
mod v4l2 {
    use ouroboros::self_referencing;

    use crate::error::SourceError;
    use crate::frame::Frame;
    use crate::source::SourceOptions;

    pub struct V4l2Capture {
        state: CaptureState,
        width: u32,
        height: u32,
    }

    #[self_referencing]
    struct CaptureState {
        device: v4l::Device,
        #[borrows(mut device)]
        #[covariant]
        stream: v4l::prelude::MmapStream<'this, v4l::Device>,
    }

    impl V4l2Capture {
        pub fn open(options: &SourceOptions) -> Result<Self, SourceError> {
            use v4l::buffer::Type;
            use v4l::video::Capture;

            let mut device = v4l::Device::with_path(&options.device).map_err(|err| {
                SourceError::config(format!("open v4l2 device {}: {}", options.device, err))
            })?;

            let mut format = device
                .format()
                .map_err(|err| SourceError::config(format!("read v4l2 format: {}", err)))?;
            format.width = options.width;
            format.height = options.height;
            format.fourcc = v4l::FourCC::new(b"BGR3");

            // Devices that refuse the requested format keep their own; the
            // frames are sized from whatever the driver reports.
            let format = match device.set_format(&format) {
                Ok(format) => format,
                Err(err) => {
                    log::warn!("failed to set format on {}: {}", options.device, err);
                    device.format().map_err(|err| {
                        SourceError::config(format!("read v4l2 format after set failure: {}", err))
                    })?
                }
            };

            let width = format.width;
            let height = format.height;

            let state = CaptureStateBuilder {
                device,
                stream_builder: |device| {
                    v4l::prelude::MmapStream::with_buffers(device, Type::VideoCapture, 4).map_err(
                        |err| SourceError::config(format!("create v4l2 buffer stream: {}", err)),
                    )
                },
            }
            .try_build()?;

            log::info!("device: opened {} ({}x{})", options.device, width, height);
            Ok(Self {
                state,
                width,
                height,
            })
        }

        /// One blocking device read. Failures are transient by contract:
        /// warn and report no frame, the caller polls again.
        pub fn read(&mut self) -> Option<Frame> {
            use v4l::io::traits::CaptureStream;

            let width = self.width;
            let height = self.height;
            let frame = self.state.with_stream_mut(|stream| match stream.next() {
                Ok((buf, _meta)) => Frame::from_pixels(width, height, buf.to_vec()).ok(),
                Err(err) => {
                    log::warn!("v4l2 read failed: {}", err);
                    None
                }
            });
            frame
        }
    }
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn stub_options() -> SourceOptions {
        SourceOptions {
            device: "stub://camera".to_string(),
            width: 8,
            height: 8,
            ..SourceOptions::default()
        }
    }

    #[test]
    fn synthetic_capture_produces_frames_per_poll() {
        let mut capture = DirectCapture::open(&stub_options()).unwrap();
        assert!(!capture.frame_available());

        let first = capture.poll_frame().unwrap();
        assert!(capture.frame_available());
        assert_eq!(first.width(), 8);

        let second = capture.poll_frame().unwrap();
        assert_ne!(first, second, "each poll reads a fresh frame");
    }

    #[test]
    fn poll_after_stop_yields_nothing() {
        let mut capture = DirectCapture::open(&stub_options()).unwrap();
        capture.poll_frame().unwrap();

        capture.stop();
        assert!(capture.poll_frame().is_none());
        // stop() twice is a no-op.
        capture.stop();
        assert!(capture.poll_frame().is_none());
    }

    #[cfg(not(feature = "capture-v4l2"))]
    #[test]
    fn real_device_requires_feature() {
        let options = SourceOptions {
            device: "/dev/video0".to_string(),
            ..SourceOptions::default()
        };
        let err = DirectCapture::open(&options)
            .err()
            .expect("real device must require the capture feature");
        assert!(matches!(err, SourceError::Configuration(_)));
    }
}
