//! # Display Server
//!
//! The slave side of the wall: one process per screen, each running the
//! same rendering pipeline with its view shifted by the fixed offset the
//! master hands it at startup.
//!
//! ## Tick Order (display)
//!
//! ```text
//! 1. receive callback:  drain the socket; compose pose ⊕ offset and
//!                       hand it to the host, latch pose-received
//! 2. (host renders the frame)
//! 3. swap callback:     SWAP_READY to the master, block for SWAP_NOW,
//!                       local swap, clear the latch
//! ```
//!
//! Mirrors the master's composition: [`DisplayServer`] is the free-running
//! flavor, [`SyncedDisplayServer`] wraps it with the barrier handshake.

use crate::error::{ClusterError, ClusterResult};
use crate::protocol::{Message, MessageCodec};
use crate::transport::FramedTransport;
use panorama_core::{CameraPose, HostEngine, TaskStatus};
use std::net::TcpListener;

/// The free-running display server: applies camera updates as they
/// arrive and lets the host swap on its own clock.
pub struct DisplayServer<H: HostEngine> {
    /// The link to the master.
    transport: FramedTransport,
    /// Outbound codec (SWAP_READY only; diagnostics counter).
    codec: MessageCodec,
    /// The injected host environment.
    host: H,
    /// Fixed view offset, delivered by CAM_OFFSET at startup.
    offset: CameraPose,
    /// A camera update has arrived since the last presented frame.
    pose_received: bool,
    /// The master link is gone; every task should withdraw.
    link_closed: bool,
}

impl<H: HostEngine> DisplayServer<H> {
    /// Binds the listening socket for the master to reach.
    pub fn listen(port: u16) -> ClusterResult<TcpListener> {
        let listener = TcpListener::bind(("0.0.0.0", port))?;
        tracing::info!("display server listening on port {port}");
        Ok(listener)
    }

    /// Accepts the master connection. Blocks until the master dials in.
    pub fn accept(listener: &TcpListener, host: H) -> ClusterResult<Self> {
        let (stream, peer) = listener.accept()?;
        let transport = FramedTransport::from_stream(stream)?;
        tracing::info!("master connected from {peer}");
        Ok(Self {
            transport,
            codec: MessageCodec::new(),
            host,
            offset: CameraPose::IDENTITY,
            pose_received: false,
            link_closed: false,
        })
    }

    /// Per-tick receive callback: drain whatever the master has sent.
    ///
    /// Never blocks; partial frames wait in the transport until a later
    /// tick completes them. Withdraws once the master is gone or the
    /// stream is poisoned.
    pub fn on_receive_tick(&mut self) -> TaskStatus {
        if self.link_closed {
            return TaskStatus::Done;
        }
        loop {
            match self.transport.poll_frame() {
                Ok(Some(frame)) => self.dispatch(&frame),
                Ok(None) => return TaskStatus::Continue,
                Err(ClusterError::PeerClosed) => {
                    tracing::info!("master closed the link; display server withdrawing");
                    self.link_closed = true;
                    return TaskStatus::Done;
                }
                Err(error) => {
                    tracing::warn!("closing master link: {error}");
                    self.link_closed = true;
                    return TaskStatus::Done;
                }
            }
        }
    }

    /// The fixed view offset delivered at startup.
    #[inline]
    #[must_use]
    pub const fn camera_offset(&self) -> &CameraPose {
        &self.offset
    }

    /// True while a received camera update awaits presentation.
    #[inline]
    #[must_use]
    pub const fn pose_received(&self) -> bool {
        self.pose_received
    }

    /// The injected host environment.
    #[must_use]
    pub const fn host(&self) -> &H {
        &self.host
    }

    /// Routes one decoded frame.
    ///
    /// Unknown type codes and malformed payloads are logged and dropped;
    /// the link survives (the master decides demotions, not us).
    fn dispatch(&mut self, frame: &[u8]) {
        match MessageCodec::decode_message(frame) {
            Ok(Message::CamOffset(offset)) => {
                tracing::info!(
                    "view offset set: pos=({}, {}, {}) hpr=({}, {}, {})",
                    offset.pos.x,
                    offset.pos.y,
                    offset.pos.z,
                    offset.hpr.x,
                    offset.hpr.y,
                    offset.hpr.z
                );
                self.offset = offset;
            }
            Ok(Message::MoveCam(pose)) => {
                self.host.apply_camera_pose(pose.offset_by(&self.offset));
                self.pose_received = true;
            }
            Ok(other) => {
                tracing::warn!(
                    "discarding {:?}: not valid on the master→display path here",
                    other.message_type()
                );
            }
            Err(error) => tracing::warn!("discarding frame: {error}"),
        }
    }
}

/// The synchronized display server: [`DisplayServer`] plus the barrier
/// handshake.
pub struct SyncedDisplayServer<H: HostEngine> {
    /// The free-running half.
    inner: DisplayServer<H>,
}

impl<H: HostEngine> SyncedDisplayServer<H> {
    /// Accepts the master connection; see [`DisplayServer::accept`].
    pub fn accept(listener: &TcpListener, host: H) -> ClusterResult<Self> {
        Ok(Self {
            inner: DisplayServer::accept(listener, host)?,
        })
    }

    /// Per-tick receive callback; see [`DisplayServer::on_receive_tick`].
    pub fn on_receive_tick(&mut self) -> TaskStatus {
        self.inner.on_receive_tick()
    }

    /// Per-tick swap callback: the display's half of the barrier.
    ///
    /// With a frame pending: declare SWAP_READY, block until the master
    /// releases with SWAP_NOW, present, clear the latch. Blocking here is
    /// the point - the master is aligning the whole wall on this handshake.
    pub fn on_swap_tick(&mut self) -> TaskStatus {
        if self.inner.link_closed {
            return TaskStatus::Done;
        }
        if !self.inner.pose_received {
            return TaskStatus::Continue;
        }

        let ready = self.inner.codec.encode_swap_ready();
        if let Err(error) = self.inner.transport.send_frame(&ready) {
            tracing::warn!("barrier declaration failed: {error}");
            self.inner.link_closed = true;
            return TaskStatus::Done;
        }

        match self.wait_for_swap_now() {
            Ok(()) => {
                self.inner.host.swap_buffers();
                self.inner.pose_received = false;
                TaskStatus::Continue
            }
            Err(ClusterError::PeerClosed) => {
                tracing::info!("master closed the link during the barrier; withdrawing");
                self.inner.link_closed = true;
                TaskStatus::Done
            }
            Err(error) => {
                tracing::warn!("barrier wait failed: {error}");
                self.inner.link_closed = true;
                TaskStatus::Done
            }
        }
    }

    /// The fixed view offset delivered at startup.
    #[must_use]
    pub const fn camera_offset(&self) -> &CameraPose {
        self.inner.camera_offset()
    }

    /// The injected host environment.
    #[must_use]
    pub const fn host(&self) -> &H {
        self.inner.host()
    }

    /// Blocks until SWAP_NOW arrives, discarding anything else.
    fn wait_for_swap_now(&mut self) -> ClusterResult<()> {
        loop {
            let frame = self.inner.transport.recv_frame()?;
            match MessageCodec::decode_message(&frame) {
                Ok(Message::SwapNow) => return Ok(()),
                Ok(other) => tracing::warn!(
                    "discarding {:?} while waiting for the swap release",
                    other.message_type()
                ),
                Err(error) => {
                    tracing::warn!("discarding frame while waiting for the swap release: {error}");
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use panorama_core::Vec3;
    use std::cell::RefCell;
    use std::rc::Rc;
    use std::thread;
    use std::time::Duration;

    /// Host stub shared with the test body via Rc.
    #[derive(Default)]
    struct RecordingHost {
        applied: Rc<RefCell<Vec<CameraPose>>>,
        swaps: Rc<RefCell<u32>>,
    }

    impl HostEngine for RecordingHost {
        fn world_camera_pose(&self) -> CameraPose {
            CameraPose::IDENTITY
        }

        fn apply_camera_pose(&mut self, pose: CameraPose) {
            self.applied.borrow_mut().push(pose);
        }

        fn swap_buffers(&mut self) {
            *self.swaps.borrow_mut() += 1;
        }
    }

    /// Spawns a scripted master side and returns its transport.
    fn accept_with_master(
        host: RecordingHost,
    ) -> (SyncedDisplayServer<RecordingHost>, FramedTransport) {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();
        let join = thread::spawn(move || {
            FramedTransport::connect("127.0.0.1", port, Duration::from_secs(5)).unwrap()
        });
        let server = SyncedDisplayServer::accept(&listener, host).unwrap();
        (server, join.join().unwrap())
    }

    #[test]
    fn test_offset_then_move_cam_applies_composed_pose() {
        let applied = Rc::new(RefCell::new(Vec::new()));
        let host = RecordingHost {
            applied: Rc::clone(&applied),
            ..RecordingHost::default()
        };
        let (mut server, mut master) = accept_with_master(host);
        let mut codec = MessageCodec::new();

        let offset = CameraPose::new(Vec3::new(5.0, 0.0, 0.0), Vec3::new(-30.0, 0.0, 0.0));
        master.send_frame(&codec.encode_cam_offset(&offset)).unwrap();
        let pose = CameraPose::new(Vec3::new(1.0, 2.0, 3.0), Vec3::new(90.0, 0.0, 0.0));
        master.send_frame(&codec.encode_move_cam(&pose)).unwrap();

        // Give loopback a moment, then pump.
        thread::sleep(Duration::from_millis(50));
        assert_eq!(server.on_receive_tick(), TaskStatus::Continue);

        assert_eq!(*server.camera_offset(), offset);
        assert_eq!(
            *applied.borrow(),
            vec![CameraPose::new(
                Vec3::new(6.0, 2.0, 3.0),
                Vec3::new(60.0, 0.0, 0.0)
            )]
        );
    }

    #[test]
    fn test_swap_tick_is_idle_without_a_pose() {
        let (mut server, _master) = accept_with_master(RecordingHost::default());
        // No MOVE_CAM yet: the swap tick must not write or block.
        assert_eq!(server.on_swap_tick(), TaskStatus::Continue);
    }

    #[test]
    fn test_barrier_handshake() {
        let swaps = Rc::new(RefCell::new(0));
        let host = RecordingHost {
            swaps: Rc::clone(&swaps),
            ..RecordingHost::default()
        };
        let (mut server, mut master) = accept_with_master(host);
        let mut codec = MessageCodec::new();

        master
            .send_frame(&codec.encode_move_cam(&CameraPose::IDENTITY))
            .unwrap();
        thread::sleep(Duration::from_millis(50));
        server.on_receive_tick();

        // The master side of the handshake, scripted from another thread
        // so the server's blocking wait has a partner.
        let master_script = thread::spawn(move || {
            let ready = master.recv_frame().unwrap();
            assert_eq!(
                MessageCodec::decode_message(&ready).unwrap(),
                Message::SwapReady
            );
            let mut codec = MessageCodec::new();
            master.send_frame(&codec.encode_swap_now()).unwrap();
            master
        });

        assert_eq!(server.on_swap_tick(), TaskStatus::Continue);
        assert_eq!(*swaps.borrow(), 1);
        master_script.join().unwrap();
    }

    #[test]
    fn test_unknown_frame_is_discarded_and_link_survives() {
        let applied = Rc::new(RefCell::new(Vec::new()));
        let host = RecordingHost {
            applied: Rc::clone(&applied),
            ..RecordingHost::default()
        };
        let (mut server, mut master) = accept_with_master(host);

        // Unknown type code, then a valid camera update.
        master
            .send_frame(&[0x00, 0x00, 0x00, 0x02, 0x00, 0xFF])
            .unwrap();
        let mut codec = MessageCodec::new();
        master
            .send_frame(&codec.encode_move_cam(&CameraPose::IDENTITY))
            .unwrap();

        thread::sleep(Duration::from_millis(50));
        assert_eq!(server.on_receive_tick(), TaskStatus::Continue);
        assert_eq!(applied.borrow().len(), 1);
    }

    #[test]
    fn test_master_disconnect_withdraws_the_task() {
        let (mut server, master) = accept_with_master(RecordingHost::default());
        drop(master);
        thread::sleep(Duration::from_millis(50));
        assert_eq!(server.on_receive_tick(), TaskStatus::Done);
    }
}
