//! move_robot - send one track-speed command to the robot
//!
//! Fires a single UDP datagram (`left;right`) and exits. Useful for
//! checking the robot link before running the full detection loops.

use anyhow::Result;
use clap::Parser;

use arena_vision::{RobotLink, TrackCommand, DEFAULT_ROBOT_ADDR};

#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    /// Left track speed, -100..100.
    #[arg(long, default_value_t = -100)]
    left: i32,
    /// Right track speed, -100..100.
    #[arg(long, default_value_t = 100)]
    right: i32,
    /// Robot address.
    #[arg(long, env = "ARENA_ROBOT_ADDR", default_value = DEFAULT_ROBOT_ADDR)]
    addr: String,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    let command = TrackCommand::new(args.left, args.right);

    let link = RobotLink::open(&args.addr)?;
    link.send(command)?;
    log::info!("sent {} to {}", command, link.target());

    Ok(())
}
