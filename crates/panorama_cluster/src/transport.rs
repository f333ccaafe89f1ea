//! # Framed Byte Transport
//!
//! Whole-datagram delivery over one TCP connection.
//!
//! ## Design
//!
//! - Callers never see partial framing: [`FramedTransport::recv_frame`]
//!   returns exactly one length-delimited body or an error
//! - NODELAY is set on every stream; barrier messages are a handful of
//!   bytes and must not sit in Nagle's buffer
//! - A non-blocking poll variant feeds the display-server message pump,
//!   buffering partial frames internally between ticks

use crate::error::{ClusterError, ClusterResult};
use crate::protocol::{LENGTH_PREFIX_SIZE, TYPE_CODE_SIZE};
use crate::MAX_FRAME_SIZE;
use std::io::{self, Read, Write};
use std::net::{TcpStream, ToSocketAddrs};
use std::time::Duration;

/// Read chunk size for the receive path.
const READ_CHUNK: usize = 4096;

/// A reliable ordered datagram link over TCP.
///
/// Single-owner: one master↔display link per transport, all calls from
/// the scheduler thread.
#[derive(Debug)]
pub struct FramedTransport {
    /// The underlying stream, NODELAY enabled.
    stream: TcpStream,
    /// Received bytes not yet assembled into a frame.
    pending: Vec<u8>,
}

impl FramedTransport {
    /// Opens a TCP stream to `host:port` within `timeout`.
    ///
    /// Tries every resolved address before giving up. The caller wraps the
    /// error with the display's identity.
    pub fn connect(host: &str, port: u16, timeout: Duration) -> io::Result<Self> {
        let mut last_error = None;
        for addr in (host, port).to_socket_addrs()? {
            match TcpStream::connect_timeout(&addr, timeout) {
                Ok(stream) => return Self::from_stream(stream),
                Err(error) => last_error = Some(error),
            }
        }
        Err(last_error.unwrap_or_else(|| {
            io::Error::new(io::ErrorKind::AddrNotAvailable, "hostname resolved to no addresses")
        }))
    }

    /// Wraps an already-accepted stream (display-server side).
    pub fn from_stream(stream: TcpStream) -> io::Result<Self> {
        stream.set_nodelay(true)?;
        Ok(Self {
            stream,
            pending: Vec::new(),
        })
    }

    /// Bounds how long a blocking read may wait. `None` waits forever.
    pub fn set_read_timeout(&self, timeout: Option<Duration>) -> ClusterResult<()> {
        self.stream.set_read_timeout(timeout)?;
        Ok(())
    }

    /// Writes one complete framed datagram.
    ///
    /// Blocks only while the kernel socket buffer is full. Frames are
    /// written back to back, never interleaved: there is one thread.
    pub fn send_frame(&mut self, frame: &[u8]) -> ClusterResult<()> {
        self.stream.write_all(frame).map_err(map_write_error)
    }

    /// Reads exactly one frame body, blocking until it is complete.
    ///
    /// The returned body starts at the type code; the length prefix has
    /// been consumed and validated against [`MAX_FRAME_SIZE`].
    pub fn recv_frame(&mut self) -> ClusterResult<Vec<u8>> {
        loop {
            if let Some(frame) = self.take_buffered_frame()? {
                return Ok(frame);
            }
            let mut buf = [0_u8; READ_CHUNK];
            match self.stream.read(&mut buf) {
                Ok(0) => return Err(ClusterError::PeerClosed),
                Ok(n) => self.pending.extend_from_slice(&buf[..n]),
                Err(error) if error.kind() == io::ErrorKind::Interrupted => {}
                Err(error) => return Err(map_read_error(error)),
            }
        }
    }

    /// Reads one frame body if one can be had without blocking.
    ///
    /// Drains whatever the kernel has buffered; partial frames stay in the
    /// internal buffer until a later call completes them.
    pub fn poll_frame(&mut self) -> ClusterResult<Option<Vec<u8>>> {
        if let Some(frame) = self.take_buffered_frame()? {
            return Ok(Some(frame));
        }
        self.stream.set_nonblocking(true)?;
        let outcome = self.poll_frame_nonblocking();
        let restore = self.stream.set_nonblocking(false);
        let polled = outcome?;
        restore?;
        Ok(polled)
    }

    /// Receive loop for [`Self::poll_frame`]; the stream is non-blocking.
    fn poll_frame_nonblocking(&mut self) -> ClusterResult<Option<Vec<u8>>> {
        loop {
            let mut buf = [0_u8; READ_CHUNK];
            match self.stream.read(&mut buf) {
                Ok(0) => return Err(ClusterError::PeerClosed),
                Ok(n) => {
                    self.pending.extend_from_slice(&buf[..n]);
                    if let Some(frame) = self.take_buffered_frame()? {
                        return Ok(Some(frame));
                    }
                }
                Err(error) if error.kind() == io::ErrorKind::WouldBlock => return Ok(None),
                Err(error) if error.kind() == io::ErrorKind::Interrupted => {}
                Err(error) => return Err(map_read_error(error)),
            }
        }
    }

    /// Assembles a frame from the internal buffer, if complete.
    ///
    /// Validates the advertised length before waiting for the body, so an
    /// oversize frame is rejected without reading its payload.
    fn take_buffered_frame(&mut self) -> ClusterResult<Option<Vec<u8>>> {
        if self.pending.len() < LENGTH_PREFIX_SIZE {
            return Ok(None);
        }
        let length =
            u32::from_be_bytes([self.pending[0], self.pending[1], self.pending[2], self.pending[3]])
                as usize;
        if length < TYPE_CODE_SIZE {
            return Err(ClusterError::TruncatedFrame { length });
        }
        if length > MAX_FRAME_SIZE {
            return Err(ClusterError::FrameTooLarge {
                length,
                max: MAX_FRAME_SIZE,
            });
        }
        if self.pending.len() < LENGTH_PREFIX_SIZE + length {
            return Ok(None);
        }
        self.pending.drain(..LENGTH_PREFIX_SIZE);
        Ok(Some(self.pending.drain(..length).collect()))
    }
}

/// Maps write-side socket errors onto cluster errors.
fn map_write_error(error: io::Error) -> ClusterError {
    match error.kind() {
        io::ErrorKind::BrokenPipe
        | io::ErrorKind::ConnectionReset
        | io::ErrorKind::ConnectionAborted => ClusterError::PeerClosed,
        _ => ClusterError::Io(error),
    }
}

/// Maps read-side socket errors onto cluster errors.
///
/// `WouldBlock` shows up here when a configured read timeout expires on a
/// blocking socket; both it and `TimedOut` mean the deadline passed.
fn map_read_error(error: io::Error) -> ClusterError {
    match error.kind() {
        io::ErrorKind::WouldBlock | io::ErrorKind::TimedOut => ClusterError::ReadTimeout,
        io::ErrorKind::BrokenPipe
        | io::ErrorKind::ConnectionReset
        | io::ErrorKind::ConnectionAborted
        | io::ErrorKind::UnexpectedEof => ClusterError::PeerClosed,
        _ => ClusterError::Io(error),
    }
}
