//! Frame transports for the background decoder.
//!
//! A transport is the blocking side of a stream: it owns the network or
//! pipeline handle and yields one decoded frame per call. The background
//! decoder runs it on a dedicated thread, so implementations are free to
//! block in `next_frame`.
//!
//! Real streaming uses GStreamer behind the `stream-gstreamer` feature.
//! A `stub://` URL selects a synthetic transport emitting solid-color
//! frames, which keeps the demos and the test suite runnable without
//! GStreamer installed.

use std::net::Ipv4Addr;
use std::time::Duration;

use crate::error::SourceError;
use crate::frame::Frame;

use super::SourceOptions;

/// Port the arena video streamer sends RTP/JPEG to.
pub const DEFAULT_STREAM_PORT: u16 = 5200;
/// Native resolution of the overhead arena camera.
pub const DEFAULT_FRAME_WIDTH: u32 = 1232;
pub const DEFAULT_FRAME_HEIGHT: u32 = 1232;
/// Default multicast group of the streamer.
pub const DEFAULT_STREAM_URL: &str = "rtp://224.1.1.1:5200";

/// RTP caps + depacketize + JPEG decode stages of the stream pipeline.
const STREAM_CODEC: &str =
    "! application/x-rtp,encoding-name=JPEG,payload=26 ! rtpjpegdepay ! jpegdec";
/// Decode + BGR colorspace-convert stages.
const STREAM_DECODE: &str =
    "! decodebin ! videoconvert ! video/x-raw,format=(string)BGR ! videoconvert";
/// Application sink: never sync to clock, keep only the newest buffer.
const STREAM_SINK: &str = "! appsink name=appsink sync=false max-buffers=1 drop=true";

/// Producer of decoded frames, owned by one decode thread.
pub trait FrameTransport: Send {
    /// Blocking read of the next decoded frame.
    ///
    /// `Transient` means "nothing this cycle, call again"; `StreamEnded`
    /// means the transport is exhausted and the loop should exit.
    fn next_frame(&mut self) -> Result<Frame, SourceError>;
}

// ----------------------------------------------------------------------------
// Transport configuration
// ----------------------------------------------------------------------------

/// Parsed `rtp://HOST:PORT` stream address.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct StreamAddress {
    pub host: Ipv4Addr,
    pub port: u16,
}

impl StreamAddress {
    /// Parse a stream URL. Anything other than `rtp://ipv4:port` is a
    /// configuration error, surfaced before any pipeline starts.
    pub fn parse(url: &str) -> Result<Self, SourceError> {
        let rest = url
            .strip_prefix("rtp://")
            .ok_or_else(|| SourceError::config(format!("stream url '{}' must be rtp://", url)))?;
        let rest = rest.trim_end_matches('/');
        let (host, port) = rest
            .split_once(':')
            .ok_or_else(|| SourceError::config(format!("stream url '{}' is missing a port", url)))?;
        let host: Ipv4Addr = host
            .parse()
            .map_err(|_| SourceError::config(format!("'{}' is not an IPv4 address", host)))?;
        let port: u16 = port
            .parse()
            .map_err(|_| SourceError::config(format!("'{}' is not a valid port", port)))?;
        Ok(Self { host, port })
    }

    pub fn is_multicast(&self) -> bool {
        self.host.is_multicast()
    }
}

/// Pipeline description for a multicast RTP/JPEG stream.
pub fn multicast_pipeline(addr: &StreamAddress) -> String {
    let source = if addr.is_multicast() {
        format!(
            "udpsrc multicast-group={} auto-multicast=true port={}",
            addr.host, addr.port
        )
    } else {
        // Direct streaming to one address needs only the port.
        format!("udpsrc port={}", addr.port)
    };
    [source.as_str(), STREAM_CODEC, STREAM_DECODE, STREAM_SINK].join(" ")
}

/// Pipeline description for direct streaming to this host.
pub fn direct_stream_pipeline(port: u16) -> String {
    let source = format!("udpsrc port={}", port);
    [source.as_str(), STREAM_CODEC, STREAM_DECODE, STREAM_SINK].join(" ")
}

fn validate_pipeline(description: &str) -> Result<(), SourceError> {
    if description.trim().is_empty() {
        return Err(SourceError::config("pipeline description is empty"));
    }
    if !description.contains("appsink") {
        return Err(SourceError::config(
            "pipeline description must terminate in an appsink named 'appsink'",
        ));
    }
    Ok(())
}

/// Build the transport for a `multicast-stream` source.
pub fn multicast_transport(
    options: &SourceOptions,
) -> Result<Box<dyn FrameTransport>, SourceError> {
    if options.stream_url.starts_with("stub://") {
        log::info!("multicast-stream: synthetic transport ({})", options.stream_url);
        return Ok(Box::new(SyntheticTransport::looping(
            options.width,
            options.height,
        )));
    }
    let addr = StreamAddress::parse(&options.stream_url)?;
    let description = multicast_pipeline(&addr);
    open_gst_transport(&description)
}

/// Build the transport for a `pipeline-stream` source.
pub fn pipeline_transport(options: &SourceOptions) -> Result<Box<dyn FrameTransport>, SourceError> {
    if options.stream_url.starts_with("stub://") && options.pipeline.is_none() {
        log::info!("pipeline-stream: synthetic transport ({})", options.stream_url);
        return Ok(Box::new(SyntheticTransport::looping(
            options.width,
            options.height,
        )));
    }
    let description = match &options.pipeline {
        Some(custom) => custom.clone(),
        None => direct_stream_pipeline(DEFAULT_STREAM_PORT),
    };
    validate_pipeline(&description)?;
    open_gst_transport(&description)
}

#[cfg(feature = "stream-gstreamer")]
fn open_gst_transport(description: &str) -> Result<Box<dyn FrameTransport>, SourceError> {
    Ok(Box::new(GstTransport::open(description)?))
}

#[cfg(not(feature = "stream-gstreamer"))]
fn open_gst_transport(description: &str) -> Result<Box<dyn FrameTransport>, SourceError> {
    validate_pipeline(description)?;
    Err(SourceError::config(
        "streaming sources require the stream-gstreamer feature (or a stub:// url)",
    ))
}

// ----------------------------------------------------------------------------
// Synthetic transport (stub://) for demos and tests
// ----------------------------------------------------------------------------

/// Transport emitting solid-color frames.
///
/// Two modes: `looping` cycles a palette forever (demo stand-in for a live
/// stream), `script` plays a fixed color sequence once and then reports
/// `StreamEnded`, which is how the decoder's shutdown path is exercised.
pub struct SyntheticTransport {
    width: u32,
    height: u32,
    colors: Vec<[u8; 3]>,
    cursor: usize,
    cycle: bool,
    interval: Option<Duration>,
}

impl SyntheticTransport {
    /// Endless blue/green/red cycle at roughly 30 fps.
    pub fn looping(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            colors: vec![[255, 0, 0], [0, 255, 0], [0, 0, 255]],
            cursor: 0,
            cycle: true,
            interval: Some(Duration::from_millis(33)),
        }
    }

    /// Play `colors` once, then end the stream.
    pub fn script(width: u32, height: u32, colors: Vec<[u8; 3]>) -> Self {
        Self {
            width,
            height,
            colors,
            cursor: 0,
            cycle: false,
            interval: None,
        }
    }

    /// Pace the transport, one frame per `interval`.
    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = Some(interval);
        self
    }
}

impl FrameTransport for SyntheticTransport {
    fn next_frame(&mut self) -> Result<Frame, SourceError> {
        if let Some(interval) = self.interval {
            std::thread::sleep(interval);
        }
        if self.cursor >= self.colors.len() {
            if self.cycle {
                self.cursor = 0;
            } else {
                return Err(SourceError::StreamEnded(
                    "synthetic color script exhausted".to_string(),
                ));
            }
        }
        let color = self.colors[self.cursor];
        self.cursor += 1;
        Ok(Frame::solid(self.width, self.height, color))
    }
}

// ----------------------------------------------------------------------------
// GStreamer transport
// ----------------------------------------------------------------------------

#[cfg(feature = "stream-gstreamer")]
pub use gst::GstTransport;

#[cfg(feature = "stream-gstreamer")]
mod gst {
    use gstreamer::prelude::*;

    use super::*;

    const PULL_TIMEOUT_MS: u64 = 500;

    /// Streaming pipeline terminating in an appsink, pulled one sample at
    /// a time by the decode thread.
    pub struct GstTransport {
        pipeline: gstreamer::Pipeline,
        appsink: gstreamer_app::AppSink,
        ended: bool,
    }

    impl GstTransport {
        pub fn open(description: &str) -> Result<Self, SourceError> {
            gstreamer::init()
                .map_err(|err| SourceError::config(format!("initialize gstreamer: {}", err)))?;

            log::info!("starting pipeline: {}", description);
            let pipeline = gstreamer::parse::launch(description)
                .map_err(|err| {
                    SourceError::config(format!("pipeline '{}' failed to parse: {}", description, err))
                })?
                .downcast::<gstreamer::Pipeline>()
                .map_err(|_| SourceError::config("pipeline description is not a pipeline"))?;

            let appsink = pipeline
                .by_name("appsink")
                .ok_or_else(|| SourceError::config("appsink element missing from pipeline"))?
                .downcast::<gstreamer_app::AppSink>()
                .map_err(|_| SourceError::config("appsink element has unexpected type"))?;

            let caps = gstreamer::Caps::builder("video/x-raw")
                .field("format", "BGR")
                .build();
            appsink.set_caps(Some(&caps));
            appsink.set_max_buffers(1);
            appsink.set_drop(true);
            appsink.set_sync(false);

            pipeline
                .set_state(gstreamer::State::Playing)
                .map_err(|err| SourceError::config(format!("start pipeline: {}", err)))?;

            Ok(Self {
                pipeline,
                appsink,
                ended: false,
            })
        }

        /// Drain pending bus messages; a pipeline error or EOS ends the
        /// stream permanently.
        fn poll_bus(&mut self) -> Option<String> {
            let bus = self.pipeline.bus()?;
            while let Some(message) = bus.timed_pop(gstreamer::ClockTime::ZERO) {
                use gstreamer::MessageView;
                match message.view() {
                    MessageView::Error(err) => {
                        return Some(format!(
                            "pipeline error from {:?}: {}",
                            err.src().map(|s| s.path_string()),
                            err.error()
                        ));
                    }
                    MessageView::Eos(..) => {
                        return Some("pipeline reached end of stream".to_string());
                    }
                    _ => {}
                }
            }
            None
        }
    }

    impl FrameTransport for GstTransport {
        fn next_frame(&mut self) -> Result<Frame, SourceError> {
            if self.ended {
                return Err(SourceError::StreamEnded("pipeline stopped".to_string()));
            }
            if let Some(reason) = self.poll_bus() {
                self.ended = true;
                return Err(SourceError::StreamEnded(reason));
            }

            let sample = match self
                .appsink
                .try_pull_sample(gstreamer::ClockTime::from_mseconds(PULL_TIMEOUT_MS))
            {
                Some(sample) => sample,
                None if self.appsink.is_eos() => {
                    self.ended = true;
                    return Err(SourceError::StreamEnded(
                        "appsink reached end of stream".to_string(),
                    ));
                }
                None => return Err(SourceError::transient("stream stalled, no sample")),
            };

            sample_to_frame(&sample)
        }
    }

    impl Drop for GstTransport {
        fn drop(&mut self) {
            let _ = self.pipeline.set_state(gstreamer::State::Null);
        }
    }

    fn sample_to_frame(sample: &gstreamer::Sample) -> Result<Frame, SourceError> {
        let buffer = sample
            .buffer()
            .ok_or_else(|| SourceError::transient("sample missing buffer"))?;
        let caps = sample
            .caps()
            .ok_or_else(|| SourceError::transient("sample missing caps"))?;
        let info = gstreamer_video::VideoInfo::from_caps(caps)
            .map_err(|err| SourceError::transient(format!("parse caps as video info: {}", err)))?;

        let width = info.width();
        let height = info.height();
        let row_bytes = width as usize * crate::frame::CHANNELS;
        let stride = info.stride()[0] as usize;

        let map = buffer
            .map_readable()
            .map_err(|_| SourceError::transient("map sample buffer"))?;
        let data = map.as_slice();

        if stride == row_bytes {
            return Frame::from_pixels(width, height, data.to_vec());
        }

        // Strided buffer: copy row by row, dropping the padding.
        let mut pixels = Vec::with_capacity(row_bytes * height as usize);
        for row in 0..height as usize {
            let start = row * stride;
            let end = start + row_bytes;
            pixels.extend_from_slice(
                data.get(start..end)
                    .ok_or_else(|| SourceError::transient("sample buffer row out of bounds"))?,
            );
        }
        Frame::from_pixels(width, height, pixels)
    }
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_multicast_url() {
        let addr = StreamAddress::parse("rtp://224.1.1.1:5200").unwrap();
        assert_eq!(addr.host, Ipv4Addr::new(224, 1, 1, 1));
        assert_eq!(addr.port, 5200);
        assert!(addr.is_multicast());
    }

    #[test]
    fn parses_unicast_url_with_trailing_slash() {
        let addr = StreamAddress::parse("rtp://192.168.1.10:5200/").unwrap();
        assert!(!addr.is_multicast());
    }

    #[test]
    fn rejects_malformed_urls() {
        for url in [
            "udp://224.1.1.1:5200",
            "rtp://224.1.1.1",
            "rtp://not-an-ip:5200",
            "rtp://224.1.1.1:notaport",
        ] {
            let err = StreamAddress::parse(url).unwrap_err();
            assert!(matches!(err, SourceError::Configuration(_)), "{}", url);
        }
    }

    #[test]
    fn multicast_pipeline_names_the_group() {
        let addr = StreamAddress::parse("rtp://224.1.1.1:5200").unwrap();
        let description = multicast_pipeline(&addr);
        assert!(description.contains("multicast-group=224.1.1.1"));
        assert!(description.contains("auto-multicast=true"));
        assert!(description.contains("rtpjpegdepay"));
        assert!(description.contains("format=(string)BGR"));
        assert!(description.contains("appsink name=appsink"));
    }

    #[test]
    fn unicast_pipeline_skips_the_group() {
        let addr = StreamAddress::parse("rtp://192.168.1.10:5200").unwrap();
        let description = multicast_pipeline(&addr);
        assert!(!description.contains("multicast-group"));
        assert!(description.starts_with("udpsrc port=5200"));
    }

    #[test]
    fn custom_pipeline_without_appsink_is_rejected() {
        let options = SourceOptions {
            pipeline: Some("videotestsrc ! fakesink".to_string()),
            ..SourceOptions::default()
        };
        let err = pipeline_transport(&options)
            .err()
            .expect("fakesink pipeline must be rejected");
        assert!(matches!(err, SourceError::Configuration(_)));
    }

    #[test]
    fn synthetic_script_plays_once_then_ends() {
        let mut transport =
            SyntheticTransport::script(4, 4, vec![[0, 0, 255], [0, 255, 0], [255, 0, 0]]);

        assert_eq!(transport.next_frame().unwrap(), Frame::solid(4, 4, [0, 0, 255]));
        assert_eq!(transport.next_frame().unwrap(), Frame::solid(4, 4, [0, 255, 0]));
        assert_eq!(transport.next_frame().unwrap(), Frame::solid(4, 4, [255, 0, 0]));
        assert!(matches!(
            transport.next_frame().unwrap_err(),
            SourceError::StreamEnded(_)
        ));
    }

    #[test]
    fn synthetic_loop_wraps_around() {
        let mut transport = SyntheticTransport::looping(2, 2).with_interval(Duration::ZERO);
        for _ in 0..7 {
            transport.next_frame().unwrap();
        }
    }

    #[test]
    fn stub_url_selects_synthetic_transport() {
        let options = SourceOptions {
            stream_url: "stub://arena".to_string(),
            width: 4,
            height: 4,
            ..SourceOptions::default()
        };
        let mut transport = multicast_transport(&options).unwrap();
        let frame = transport.next_frame().unwrap();
        assert_eq!(frame.width(), 4);
    }
}
