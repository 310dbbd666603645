//! detect_cores - print positions of detected energy cores
//!
//! Polls frames from the configured video source, runs color-range
//! detection for positive and negative energy cores, and prints the
//! centroid coordinates. Runs until interrupted with Ctrl-C.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use clap::Parser;

use arena_vision::{
    select_source, CorePoint, CoreVision, DemoConfig, StubCoreVision, MIN_CORE_AREA,
    NEG_CORE_RANGE, POS_CORE_RANGE,
};

#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    /// Video source kind (device, multicast-stream, pipeline-stream).
    #[arg(long, env = "ARENA_SOURCE")]
    source: Option<String>,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    let mut cfg = DemoConfig::load()?;
    if let Some(source) = &args.source {
        cfg.source = source.parse()?;
    }

    let running = Arc::new(AtomicBool::new(true));
    {
        let running = Arc::clone(&running);
        ctrlc::set_handler(move || running.store(false, Ordering::SeqCst))?;
    }

    let mut source = select_source(cfg.source, &cfg.source_options())?;
    let mut vision = StubCoreVision::new();
    log::info!("energy core detection running ({} backend)", vision.name());

    while running.load(Ordering::SeqCst) {
        let Some(frame) = source.poll_frame() else {
            std::thread::sleep(Duration::from_millis(10));
            continue;
        };

        let positive = vision.detect_cores(&frame, &POS_CORE_RANGE, MIN_CORE_AREA);
        let negative = vision.detect_cores(&frame, &NEG_CORE_RANGE, MIN_CORE_AREA);
        match (positive, negative) {
            (Ok(positive), Ok(negative)) => print_core_positions(&positive, &negative),
            (Err(err), _) | (_, Err(err)) => {
                log::warn!("core detection failed: {}", err);
            }
        }
    }

    source.stop();
    log::info!("exiting");
    Ok(())
}

/// Pretty-print the X and Y coordinates of every energy core found.
fn print_core_positions(positive: &[CorePoint], negative: &[CorePoint]) {
    for (i, core) in positive.iter().enumerate() {
        println!("Positive Core {}: X: {:.2}, Y: {:.2}", i, core.x, core.y);
    }
    for (i, core) in negative.iter().enumerate() {
        println!("Negative Core {}: X: {:.2}, Y: {:.2}", i, core.x, core.y);
    }
    if positive.is_empty() && negative.is_empty() {
        println!("No Energy Cores detected");
    }
    println!("=== Done\n");
}
