//! # Cluster Error Types
//!
//! All errors that can occur in the cluster layer, classed by behavior:
//! startup errors abort before any task is installed, protocol errors and
//! peer closures demote the offending display to muted, read timeouts
//! skip a single frame for a single display.

use crate::protocol::MessageType;
use std::io;
use thiserror::Error;

/// Errors that can occur in the cluster layer.
#[derive(Error, Debug)]
pub enum ClusterError {
    /// TCP connect to a configured display failed or timed out.
    ///
    /// Fatal at startup: the master refuses to run with an incomplete wall.
    #[error("connect to display '{role}' at {host}:{port} failed: {source}")]
    Connect {
        /// Role tag of the unreachable display.
        role: String,
        /// Configured hostname.
        host: String,
        /// Configured TCP port.
        port: u16,
        /// The underlying socket error.
        source: io::Error,
    },

    /// The configuration was rejected before any connection was attempted.
    #[error("invalid cluster configuration: {0}")]
    Config(String),

    /// An incoming frame advertised a length over the cap.
    ///
    /// The transport is closed without reading further.
    #[error("frame length {length} exceeds the {max} byte cap")]
    FrameTooLarge {
        /// The advertised length.
        length: usize,
        /// The cap it exceeded.
        max: usize,
    },

    /// An incoming frame advertised a length too small to carry a type code.
    #[error("frame length {length} cannot carry a type code")]
    TruncatedFrame {
        /// The advertised length.
        length: usize,
    },

    /// The peer closed the connection, cleanly or mid-frame.
    #[error("peer closed the connection")]
    PeerClosed,

    /// A read deadline expired before a full frame arrived.
    ///
    /// Not fatal: the display merely misses this frame's barrier.
    #[error("read timed out")]
    ReadTimeout,

    /// A frame carried a type code the protocol does not define.
    #[error("unknown message type code {code:#06x}")]
    UnknownMessageType {
        /// The offending code.
        code: u16,
    },

    /// A well-formed message arrived where a different kind was required.
    #[error("unexpected {got:?} while waiting for {expected:?}")]
    UnexpectedMessage {
        /// The kind the protocol state machine required.
        expected: MessageType,
        /// The kind that actually arrived.
        got: MessageType,
    },

    /// Payload bytes did not match the message kind.
    #[error("malformed {kind:?} payload: expected {expected} bytes, got {got}")]
    MalformedPayload {
        /// The message kind being decoded.
        kind: MessageType,
        /// The payload size that kind requires.
        expected: usize,
        /// The payload size that arrived.
        got: usize,
    },

    /// Socket I/O failed outside the cases above.
    #[error("socket i/o failed: {0}")]
    Io(#[from] io::Error),
}

impl ClusterError {
    /// Returns true if this error permanently demotes a display to muted.
    ///
    /// Everything does except a read timeout, which only skips the current
    /// frame for that display.
    #[must_use]
    pub const fn demotes_display(&self) -> bool {
        !matches!(self, Self::ReadTimeout)
    }
}

/// Result type for cluster operations.
pub type ClusterResult<T> = Result<T, ClusterError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timeout_does_not_demote() {
        assert!(!ClusterError::ReadTimeout.demotes_display());
        assert!(ClusterError::PeerClosed.demotes_display());
        assert!(ClusterError::UnknownMessageType { code: 0x00FF }.demotes_display());
        assert!(ClusterError::FrameTooLarge {
            length: 100_000,
            max: crate::MAX_FRAME_SIZE,
        }
        .demotes_display());
    }

    #[test]
    fn test_connect_error_names_the_display() {
        let error = ClusterError::Connect {
            role: "left".to_string(),
            host: "10.0.0.7".to_string(),
            port: 5150,
            source: io::Error::new(io::ErrorKind::TimedOut, "connection timed out"),
        };
        let text = error.to_string();
        assert!(text.contains("left"));
        assert!(text.contains("10.0.0.7"));
        assert!(text.contains("5150"));
    }
}
