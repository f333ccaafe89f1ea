//! # Cluster Coordinators
//!
//! The master side of the wall. Two flavors share the per-tick camera
//! fan-out:
//!
//! - [`ClusterCoordinator`]: fire-and-forget camera updates. Displays
//!   swap on their own clock; tearing across bezels is possible.
//! - [`SyncedCoordinator`]: composes a per-frame barrier around the
//!   fan-out so every display presents the same frame at the same moment.
//!
//! ## Tick Order (master)
//!
//! ```text
//! 1. move-camera callback:     sample pose, MOVE_CAM to every display,
//!                              arm the pending-swap latch
//! 2. (host renders the frame)
//! 3. swap-coordinator callback: await SWAP_READY from every display,
//!                              send SWAP_NOW to every display,
//!                              local swap, clear the latch
//! ```
//!
//! The display list is fixed at construction: no adds, no removes, no
//! reorders. Its order IS the barrier order.

use crate::config::ClusterConfig;
use crate::connection::DisplayConnection;
use crate::error::{ClusterError, ClusterResult};
use crate::protocol::MessageCodec;
use panorama_core::{CameraPose, HostEngine, TaskStatus};
use std::cell::RefCell;
use std::rc::Rc;

/// Sends one MOVE_CAM to every display in registration order.
///
/// The shared fan-out of both coordinator flavors. Never waits; a send
/// failure demotes that display and the sweep continues.
pub fn fan_out_move_cam(displays: &mut [DisplayConnection], pose: &CameraPose) {
    for connection in displays.iter_mut() {
        if let Err(error) = connection.send_move_cam(pose) {
            tracing::warn!(
                "camera update to display '{}' failed: {error}",
                connection.role()
            );
            connection.mute();
        }
    }
}

/// The asynchronous coordinator: camera fan-out, no barrier.
pub struct ClusterCoordinator<H: HostEngine> {
    /// Ordered display connections; order fixed for the run.
    displays: Vec<DisplayConnection>,
    /// Shared outbound codec (packet counter diagnostics).
    codec: Rc<RefCell<MessageCodec>>,
    /// The injected host environment.
    host: H,
}

impl<H: HostEngine> ClusterCoordinator<H> {
    /// Connects the whole wall and sends each display its view offset.
    ///
    /// Connections are opened in configuration order; the first failure
    /// aborts startup, named at error severity. No tasks are installed on
    /// failure.
    pub fn new(config: &ClusterConfig, host: H) -> ClusterResult<Self> {
        config.validate()?;

        let codec = Rc::new(RefCell::new(MessageCodec::new()));
        let mut displays = Vec::with_capacity(config.displays.len());
        for entry in &config.displays {
            let connection = DisplayConnection::new(
                entry.clone(),
                Rc::clone(&codec),
                config.connect_timeout(),
                config.read_timeout(),
            )
            .map_err(|error| {
                tracing::error!("cluster startup aborted: {error}");
                error
            })?;
            displays.push(connection);
        }

        for connection in &mut displays {
            if let Err(error) = connection.send_cam_offset() {
                tracing::error!(
                    "cluster startup aborted: offset to display '{}' failed: {error}",
                    connection.role()
                );
                return Err(error);
            }
        }

        tracing::info!("cluster up: {} display(s)", displays.len());
        Ok(Self {
            displays,
            codec,
            host,
        })
    }

    /// Writes one MOVE_CAM to each display in registration order.
    ///
    /// Does not wait. Per-display ordering across ticks is strict: TCP
    /// keeps the stream ordered and there is only one sending thread.
    pub fn move_camera(&mut self, pose: &CameraPose) {
        fan_out_move_cam(&mut self.displays, pose);
    }

    /// Per-tick callback: sample the host camera and fan out.
    ///
    /// Withdraws from the schedule once every display is muted.
    pub fn on_move_camera_tick(&mut self) -> TaskStatus {
        let pose = self.host.world_camera_pose();
        self.move_camera(&pose);
        self.task_status()
    }

    /// Returns true once every display has been demoted.
    #[must_use]
    pub fn all_muted(&self) -> bool {
        self.displays.iter().all(DisplayConnection::is_muted)
    }

    /// The ordered display connections.
    #[must_use]
    pub fn displays(&self) -> &[DisplayConnection] {
        &self.displays
    }

    /// Total frames encoded so far (diagnostic).
    #[must_use]
    pub fn packets_sent(&self) -> u64 {
        self.codec.borrow().packet_count()
    }

    /// The injected host environment.
    #[must_use]
    pub const fn host(&self) -> &H {
        &self.host
    }

    /// Continue while any display is alive; withdraw when the wall is gone.
    fn task_status(&self) -> TaskStatus {
        if self.all_muted() {
            tracing::error!("every display is muted; withdrawing cluster tasks");
            TaskStatus::Done
        } else {
            TaskStatus::Continue
        }
    }
}

/// The synchronized coordinator: the fan-out plus a per-frame barrier.
///
/// Contains the asynchronous coordinator and composes the barrier around
/// it. Two latches drive the per-tick state machine:
///
/// - `ready`: at least one swap-coordinator tick has run, so the first
///   MOVE_CAM round is guaranteed to precede the first barrier (no
///   barrier on frame 0).
/// - `pending_swap`: a camera round went out this tick and a barrier is
///   owed. Set only in the camera callback, cleared only in the swap
///   callback.
pub struct SyncedCoordinator<H: HostEngine> {
    /// The fan-out half.
    inner: ClusterCoordinator<H>,
    /// First swap tick has run; barriers may now be armed.
    ready: bool,
    /// A camera round is awaiting its barrier.
    pending_swap: bool,
}

impl<H: HostEngine> SyncedCoordinator<H> {
    /// Connects the wall; see [`ClusterCoordinator::new`].
    pub fn new(config: &ClusterConfig, host: H) -> ClusterResult<Self> {
        Ok(Self {
            inner: ClusterCoordinator::new(config, host)?,
            ready: false,
            pending_swap: false,
        })
    }

    /// Per-tick camera callback: fan out, then arm the barrier latch.
    pub fn on_move_camera_tick(&mut self) -> TaskStatus {
        let pose = self.inner.host.world_camera_pose();
        self.inner.move_camera(&pose);
        if self.ready {
            self.pending_swap = true;
        }
        self.inner.task_status()
    }

    /// Per-tick barrier callback.
    ///
    /// When the latch is armed: collect a SWAP_READY from every display
    /// that owes one, release every caught-up display with SWAP_NOW, then
    /// perform the blocking local swap. The scheduler thread stalls on the
    /// slowest display; that stall is the synchronization.
    pub fn on_swap_coordinator_tick(&mut self) -> TaskStatus {
        if self.pending_swap {
            self.collect_swap_ready();
            self.release_swaps();
            self.inner.host.swap_buffers();
            self.pending_swap = false;
        }
        self.ready = true;
        self.inner.task_status()
    }

    /// Returns true once every display has been demoted.
    #[must_use]
    pub fn all_muted(&self) -> bool {
        self.inner.all_muted()
    }

    /// The ordered display connections.
    #[must_use]
    pub fn displays(&self) -> &[DisplayConnection] {
        self.inner.displays()
    }

    /// Total frames encoded so far (diagnostic).
    #[must_use]
    pub fn packets_sent(&self) -> u64 {
        self.inner.packets_sent()
    }

    /// The injected host environment.
    #[must_use]
    pub const fn host(&self) -> &H {
        self.inner.host()
    }

    /// Await half of the barrier: one SWAP_READY per display, in
    /// registration order.
    ///
    /// The camera stream is pipelined one frame deep, so exactly one
    /// READY is consumed per display per barrier; a display that owes
    /// none (its MOVE_CAM never reached the wire) is not waited on. A
    /// timeout skips that display for this frame only; any other failure
    /// demotes it and closes the link.
    fn collect_swap_ready(&mut self) {
        for connection in &mut self.inner.displays {
            connection.open_barrier();
            if !connection.is_connected() || connection.swap_ready_owed() == 0 {
                continue;
            }
            match connection.await_swap_ready() {
                Ok(()) => {}
                Err(ClusterError::ReadTimeout) => {
                    tracing::warn!(
                        "display '{}' missed this frame's barrier (read timeout)",
                        connection.role()
                    );
                }
                Err(error) => {
                    tracing::warn!(
                        "barrier read from display '{}' failed: {error}",
                        connection.role()
                    );
                    connection.mute();
                    connection.close();
                }
            }
        }
    }

    /// Release half of the barrier: SWAP_NOW in registration order.
    ///
    /// Only displays whose READY was consumed this barrier are released;
    /// a display that timed out or fell off keeps its frame.
    fn release_swaps(&mut self) {
        for connection in &mut self.inner.displays {
            if !connection.barrier_ready() {
                continue;
            }
            if let Err(error) = connection.send_swap_now() {
                tracing::warn!(
                    "swap release to display '{}' failed: {error}",
                    connection.role()
                );
                connection.mute();
            }
        }
    }
}
