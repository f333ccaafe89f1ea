//! # Display Connection
//!
//! One master-side connection to one display server: the transport, the
//! display's configured offset, and the four verbs the coordinator speaks.
//!
//! ## Lifecycle
//!
//! Created during coordinator construction (a failed connect aborts
//! startup), fixed in the coordinator's ordered list for the whole run.
//! A display that fails mid-run is demoted to muted: it keeps its slot so
//! the barrier order never changes, but its sends are skipped. A mute
//! with a dead transport also stops reads. Muted is forever - there is no
//! readmission handshake in the protocol.

use crate::config::DisplayConfig;
use crate::error::{ClusterError, ClusterResult};
use crate::protocol::{MessageCodec, MessageType};
use crate::transport::FramedTransport;
use panorama_core::CameraPose;
use std::cell::RefCell;
use std::rc::Rc;
use std::time::Duration;

/// A live link to one configured display server.
///
/// Single-owner; never shared across threads. The codec is shared among
/// the coordinator's connections so the packet counter forms one sequence.
#[derive(Debug)]
pub struct DisplayConnection {
    /// The entry this connection was built from.
    config: DisplayConfig,
    /// Shared outbound codec.
    codec: Rc<RefCell<MessageCodec>>,
    /// The TCP link; `None` once closed by a demotion.
    transport: Option<FramedTransport>,
    /// Sends are skipped once set; the slot itself is permanent.
    muted: bool,
    /// SWAP_READYs owed by this display: one per MOVE_CAM that reached
    /// the wire, paid down one per barrier. The camera stream is
    /// pipelined one frame deep, so this sits at 1 between barriers.
    swap_ready_owed: u32,
    /// This display's SWAP_READY for the current barrier has been
    /// consumed; cleared when a barrier opens.
    barrier_ready: bool,
}

impl DisplayConnection {
    /// Connects to the configured display.
    ///
    /// Failure carries the (role, host, port) triple so startup can name
    /// the offending display.
    pub fn new(
        config: DisplayConfig,
        codec: Rc<RefCell<MessageCodec>>,
        connect_timeout: Duration,
        read_timeout: Option<Duration>,
    ) -> ClusterResult<Self> {
        let transport = FramedTransport::connect(&config.host, config.port, connect_timeout)
            .map_err(|source| ClusterError::Connect {
                role: config.role.clone(),
                host: config.host.clone(),
                port: config.port,
                source,
            })?;
        transport.set_read_timeout(read_timeout)?;
        tracing::info!(
            "connected display '{}' at {}:{}",
            config.role,
            config.host,
            config.port
        );
        Ok(Self {
            config,
            codec,
            transport: Some(transport),
            muted: false,
            swap_ready_owed: 0,
            barrier_ready: false,
        })
    }

    /// The display's role tag.
    #[inline]
    #[must_use]
    pub fn role(&self) -> &str {
        &self.config.role
    }

    /// The configuration entry this connection serves.
    #[inline]
    #[must_use]
    pub const fn config(&self) -> &DisplayConfig {
        &self.config
    }

    /// Returns true once the display has been demoted.
    #[inline]
    #[must_use]
    pub const fn is_muted(&self) -> bool {
        self.muted
    }

    /// Returns true while the transport is open.
    #[inline]
    #[must_use]
    pub const fn is_connected(&self) -> bool {
        self.transport.is_some()
    }

    /// SWAP_READYs this display still owes the barrier.
    #[inline]
    #[must_use]
    pub const fn swap_ready_owed(&self) -> u32 {
        self.swap_ready_owed
    }

    /// True once this display's SWAP_READY for the current barrier has
    /// been consumed.
    #[inline]
    #[must_use]
    pub const fn barrier_ready(&self) -> bool {
        self.barrier_ready
    }

    /// Opens a new barrier round: forgets the previous round's READY.
    pub fn open_barrier(&mut self) {
        self.barrier_ready = false;
    }

    /// Fires exactly one CAM_OFFSET carrying the configured offset.
    pub fn send_cam_offset(&mut self) -> ClusterResult<()> {
        let frame = self
            .codec
            .borrow_mut()
            .encode_cam_offset(&self.config.offset_pose());
        self.send(&frame).map(|_| ())
    }

    /// Fires exactly one MOVE_CAM; a write that reaches the wire makes
    /// this display owe one SWAP_READY.
    pub fn send_move_cam(&mut self, pose: &CameraPose) -> ClusterResult<()> {
        let frame = self.codec.borrow_mut().encode_move_cam(pose);
        if self.send(&frame)? {
            self.swap_ready_owed += 1;
        }
        Ok(())
    }

    /// Fires exactly one SWAP_NOW.
    pub fn send_swap_now(&mut self) -> ClusterResult<()> {
        let frame = self.codec.borrow_mut().encode_swap_now();
        self.send(&frame).map(|_| ())
    }

    /// Blocking read of the next datagram, which must be SWAP_READY.
    ///
    /// Success pays down one owed SWAP_READY. Any other message kind -
    /// known or unknown - is a protocol violation the coordinator turns
    /// into a demotion; a timeout leaves the debt standing.
    pub fn await_swap_ready(&mut self) -> ClusterResult<()> {
        let Some(transport) = self.transport.as_mut() else {
            return Ok(());
        };
        let frame = transport.recv_frame()?;
        let (code, payload) = MessageCodec::decode_header(&frame)?;
        match MessageType::from_code(code) {
            Some(MessageType::SwapReady) => {
                MessageCodec::decode_swap_ready(payload)?;
                self.swap_ready_owed = self.swap_ready_owed.saturating_sub(1);
                self.barrier_ready = true;
                Ok(())
            }
            Some(got) => Err(ClusterError::UnexpectedMessage {
                expected: MessageType::SwapReady,
                got,
            }),
            None => Err(ClusterError::UnknownMessageType { code }),
        }
    }

    /// Demotes this display: its sends are skipped for the rest of the run.
    ///
    /// The transport stays open so a SWAP_READY already in flight can
    /// still be drained; use [`Self::close`] when the link itself is dead.
    pub fn mute(&mut self) {
        if !self.muted {
            tracing::warn!("display '{}' muted for the remainder of the run", self.role());
            self.muted = true;
        }
    }

    /// Releases the transport and forgives any outstanding SWAP_READY.
    pub fn close(&mut self) {
        self.transport = None;
        self.swap_ready_owed = 0;
        self.barrier_ready = false;
    }

    /// Writes a frame, skipping silently when muted or closed.
    ///
    /// Returns whether the frame actually reached the wire.
    fn send(&mut self, frame: &[u8]) -> ClusterResult<bool> {
        if self.muted {
            return Ok(false);
        }
        match self.transport.as_mut() {
            Some(transport) => transport.send_frame(frame).map(|()| true),
            None => Ok(false),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::Message;
    use panorama_core::Vec3;
    use std::net::TcpListener;
    use std::thread;

    fn test_config(port: u16) -> DisplayConfig {
        DisplayConfig {
            role: "left".to_string(),
            host: "127.0.0.1".to_string(),
            port,
            offset_pos: [-5.0, 0.0, 0.0],
            offset_hpr: [0.0, 0.0, 0.0],
        }
    }

    fn connect_pair() -> (DisplayConnection, FramedTransport) {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();
        let join = thread::spawn(move || {
            let (stream, _) = listener.accept().unwrap();
            FramedTransport::from_stream(stream).unwrap()
        });
        let connection = DisplayConnection::new(
            test_config(port),
            Rc::new(RefCell::new(MessageCodec::new())),
            Duration::from_secs(5),
            None,
        )
        .unwrap();
        (connection, join.join().unwrap())
    }

    #[test]
    fn test_connect_failure_names_the_display() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();
        drop(listener);

        let result = DisplayConnection::new(
            test_config(port),
            Rc::new(RefCell::new(MessageCodec::new())),
            Duration::from_millis(500),
            None,
        );
        match result {
            Err(ClusterError::Connect { role, host, port: p, .. }) => {
                assert_eq!(role, "left");
                assert_eq!(host, "127.0.0.1");
                assert_eq!(p, port);
            }
            other => panic!("expected Connect error, got {other:?}"),
        }
    }

    #[test]
    fn test_cam_offset_carries_configured_offset() {
        let (mut connection, mut display) = connect_pair();
        connection.send_cam_offset().unwrap();

        let frame = display.recv_frame().unwrap();
        match MessageCodec::decode_message(&frame).unwrap() {
            Message::CamOffset(pose) => {
                assert_eq!(pose.pos, Vec3::new(-5.0, 0.0, 0.0));
                assert_eq!(pose.hpr, Vec3::ZERO);
            }
            other => panic!("expected CamOffset, got {other:?}"),
        }
    }

    #[test]
    fn test_move_cam_and_swap_ready_settle_the_debt() {
        let (mut connection, mut display) = connect_pair();
        let pose = CameraPose::new(Vec3::new(1.0, 2.0, 3.0), Vec3::ZERO);

        assert_eq!(connection.swap_ready_owed(), 0);
        connection.send_move_cam(&pose).unwrap();
        assert_eq!(connection.swap_ready_owed(), 1);

        // The display answers the barrier.
        let frame = display.recv_frame().unwrap();
        assert_eq!(
            MessageCodec::decode_message(&frame).unwrap(),
            Message::MoveCam(pose)
        );
        let mut display_codec = MessageCodec::new();
        display.send_frame(&display_codec.encode_swap_ready()).unwrap();

        connection.await_swap_ready().unwrap();
        assert_eq!(connection.swap_ready_owed(), 0);
    }

    #[test]
    fn test_unexpected_message_during_barrier() {
        let (mut connection, mut display) = connect_pair();
        connection
            .send_move_cam(&CameraPose::IDENTITY)
            .unwrap();

        // The display sends a camera message where SWAP_READY belongs.
        let mut display_codec = MessageCodec::new();
        display
            .send_frame(&display_codec.encode_move_cam(&CameraPose::IDENTITY))
            .unwrap();

        match connection.await_swap_ready() {
            Err(ClusterError::UnexpectedMessage { expected, got }) => {
                assert_eq!(expected, MessageType::SwapReady);
                assert_eq!(got, MessageType::MoveCam);
            }
            other => panic!("expected UnexpectedMessage, got {other:?}"),
        }
    }

    #[test]
    fn test_unknown_type_during_barrier() {
        let (mut connection, mut display) = connect_pair();
        connection.send_move_cam(&CameraPose::IDENTITY).unwrap();

        // type code 0x00FF, empty payload
        display
            .send_frame(&[0x00, 0x00, 0x00, 0x02, 0x00, 0xFF])
            .unwrap();

        match connection.await_swap_ready() {
            Err(ClusterError::UnknownMessageType { code }) => assert_eq!(code, 0x00FF),
            other => panic!("expected UnknownMessageType, got {other:?}"),
        }
    }

    #[test]
    fn test_muted_connection_skips_sends() {
        let (mut connection, mut display) = connect_pair();
        connection.mute();
        assert!(connection.is_muted());

        connection.send_move_cam(&CameraPose::IDENTITY).unwrap();
        connection.send_swap_now().unwrap();
        assert_eq!(connection.swap_ready_owed(), 0);

        // Nothing reached the wire.
        display
            .set_read_timeout(Some(Duration::from_millis(50)))
            .unwrap();
        assert!(matches!(
            display.recv_frame(),
            Err(ClusterError::ReadTimeout)
        ));
    }

    #[test]
    fn test_close_forgives_outstanding_debt() {
        let (mut connection, _display) = connect_pair();
        connection.send_move_cam(&CameraPose::IDENTITY).unwrap();
        assert_eq!(connection.swap_ready_owed(), 1);

        connection.close();
        assert!(!connection.is_connected());
        assert_eq!(connection.swap_ready_owed(), 0);

        // Verbs are no-ops on a closed connection.
        connection.send_swap_now().unwrap();
        connection.await_swap_ready().unwrap();
    }
}
