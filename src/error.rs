//! Error taxonomy for the frame-source layer.
//!
//! Only configuration-time failures are fatal. Everything that can go wrong
//! on the per-frame path (a failed read, a closed stream) degrades to
//! "no frame this cycle" so a live display or control loop keeps running.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum SourceError {
    /// Malformed transport URL/pipeline, bad device path, missing or invalid
    /// calibration. Fatal at startup, never retried.
    #[error("invalid source configuration: {0}")]
    Configuration(String),

    /// Selection-time rejection of an unknown source kind.
    #[error("unknown video source kind '{kind}', expected one of: {valid}")]
    UnsupportedSource { kind: String, valid: String },

    /// A single decode/read failure. The producer loop logs and continues.
    #[error("frame read failed: {0}")]
    Transient(String),

    /// The transport closed or exhausted. The producer loop exits; the last
    /// decoded frame stays available until `stop()`.
    #[error("stream ended: {0}")]
    StreamEnded(String),
}

impl SourceError {
    pub(crate) fn config(msg: impl Into<String>) -> Self {
        SourceError::Configuration(msg.into())
    }

    pub(crate) fn transient(msg: impl Into<String>) -> Self {
        SourceError::Transient(msg.into())
    }
}
