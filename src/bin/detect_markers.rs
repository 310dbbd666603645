//! detect_markers - print arena transforms of detected fiducial markers
//!
//! Polls frames from the configured video source, runs marker detection,
//! and pretty-prints each marker's id, pixel position and heading. Runs
//! until interrupted with Ctrl-C.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use clap::Parser;

use arena_vision::{
    marker_poses_to_transforms, select_source, CameraCalibration, DemoConfig, MarkerTransform,
    MarkerVision, StubMarkerVision,
};

#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    /// Video source kind (device, multicast-stream, pipeline-stream).
    #[arg(long, env = "ARENA_SOURCE")]
    source: Option<String>,
    /// Camera calibration JSON (keys: mtx, dist).
    #[arg(long, env = "ARENA_CALIBRATION")]
    calibration: Option<std::path::PathBuf>,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    let mut cfg = DemoConfig::load()?;
    if let Some(source) = &args.source {
        cfg.source = source.parse()?;
    }
    if let Some(path) = args.calibration {
        cfg.calibration = Some(path);
    }

    let calibration = match &cfg.calibration {
        Some(path) => CameraCalibration::load(path)?,
        None => {
            log::warn!("no calibration file configured, using approximate intrinsics");
            CameraCalibration::approximate(cfg.width, cfg.height)
        }
    };

    let running = Arc::new(AtomicBool::new(true));
    {
        let running = Arc::clone(&running);
        ctrlc::set_handler(move || running.store(false, Ordering::SeqCst))?;
    }

    let mut source = select_source(cfg.source, &cfg.source_options())?;
    let mut vision = StubMarkerVision::new();
    log::info!("marker detection running ({} backend)", vision.name());

    while running.load(Ordering::SeqCst) {
        let Some(frame) = source.poll_frame() else {
            std::thread::sleep(Duration::from_millis(10));
            continue;
        };

        let detections = match vision.detect_markers(&frame, &calibration, cfg.marker_size_m) {
            Ok(detections) => detections,
            Err(err) => {
                log::warn!("marker detection failed: {}", err);
                continue;
            }
        };

        print_transforms(&marker_poses_to_transforms(&detections));
    }

    source.stop();
    log::info!("exiting");
    Ok(())
}

/// Pretty-print marker id, position and heading of every robot found.
fn print_transforms(transforms: &BTreeMap<u32, MarkerTransform>) {
    for (id, transform) in transforms {
        println!(
            "=== Marker {}\nPosition: X: {:.2}, Y: {:.2}\nRotation: {:.2} Degrees\n",
            id,
            transform.position[0],
            transform.position[1],
            transform.z_rotation_deg()
        );
    }
}
