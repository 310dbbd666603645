//! UDP robot control.
//!
//! The robot listens for datagrams of two ASCII integers separated by a
//! semicolon, left-track speed then right-track speed (`-100;100`). One
//! datagram per command, fire-and-forget: no acknowledgment, no retry, no
//! sequencing.

use std::fmt;
use std::net::{SocketAddr, UdpSocket};

use anyhow::{Context, Result};

/// Default robot address used by the demos.
pub const DEFAULT_ROBOT_ADDR: &str = "127.0.0.1:3001";

/// Track speed command. Speeds are percentages, -100..100.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TrackCommand {
    pub left: i32,
    pub right: i32,
}

impl TrackCommand {
    pub fn new(left: i32, right: i32) -> Self {
        Self { left, right }
    }

    /// Spin in place: tracks at opposite speeds.
    pub fn spin(speed: i32) -> Self {
        Self {
            left: -speed,
            right: speed,
        }
    }

    pub fn halt() -> Self {
        Self { left: 0, right: 0 }
    }

    /// Wire encoding, two ASCII integers joined by a semicolon.
    pub fn encode(&self) -> String {
        format!("{};{}", self.left, self.right)
    }
}

impl fmt::Display for TrackCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "left={} right={}", self.left, self.right)
    }
}

/// Fire-and-forget UDP link to one robot.
pub struct RobotLink {
    socket: UdpSocket,
    target: SocketAddr,
}

impl RobotLink {
    /// Bind an ephemeral local socket aimed at `target`.
    pub fn open(target: &str) -> Result<Self> {
        let target: SocketAddr = target
            .parse()
            .with_context(|| format!("'{}' is not a valid robot address", target))?;
        let socket = UdpSocket::bind(("0.0.0.0", 0)).context("bind udp socket")?;
        Ok(Self { socket, target })
    }

    pub fn target(&self) -> SocketAddr {
        self.target
    }

    /// Send one command datagram.
    pub fn send(&self, command: TrackCommand) -> Result<()> {
        self.socket
            .send_to(command.encode().as_bytes(), self.target)
            .with_context(|| format!("send track command to {}", self.target))?;
        log::debug!("sent {} to {}", command, self.target);
        Ok(())
    }
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------
