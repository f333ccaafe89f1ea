//! # PANORAMA Cluster - The Lockstep Protocol
//!
//! Synchronized multi-display rendering: one master drives N display
//! servers so that every screen of the wall swaps front and back buffers
//! on the same frame.
//!
//! ## Architecture
//!
//! ```text
//! ┌────────────────────────────┐        ┌───────────────────────────┐
//! │        MASTER              │  TCP   │     DISPLAY SERVER (xN)   │
//! ├────────────────────────────┤        ├───────────────────────────┤
//! │ move-camera tick           │        │ receive tick              │
//! │   sample pose ──────────── │──────► │   pose ⊕ offset → view    │
//! │   MOVE_CAM to every slave  │        │                           │
//! │ swap-coordinator tick      │        │ swap tick                 │
//! │   await SWAP_READY (all) ◄ │─────── │   SWAP_READY              │
//! │   send SWAP_NOW (all) ──── │──────► │   block for SWAP_NOW      │
//! │   local swap               │        │   local swap              │
//! └────────────────────────────┘        └───────────────────────────┘
//! ```
//!
//! ## Concurrency Model
//!
//! Single-threaded cooperative, driven by the host engine's tick scheduler.
//! Both master callbacks run on the scheduler thread and every socket
//! blocks on it. The barrier pauses the whole tick until the slowest
//! display reports in - that pause IS the synchronization mechanism.
//!
//! ## Wire Format (frozen)
//!
//! Every datagram is `u32 length (BE) | u16 type code (BE) | payload`,
//! where `length` counts the type code plus the payload. Camera payloads
//! are six big-endian IEEE-754 f64 in x, y, z, h, p, r order; the barrier
//! messages carry no payload. Byte order is identical on every host.

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![deny(clippy::perf)]

pub mod config;
pub mod connection;
pub mod coordinator;
pub mod error;
pub mod integration;
pub mod protocol;
pub mod server;
pub mod transport;

// Re-exports for convenience
pub use config::{ClusterConfig, DisplayConfig};
pub use connection::DisplayConnection;
pub use coordinator::{fan_out_move_cam, ClusterCoordinator, SyncedCoordinator};
pub use error::{ClusterError, ClusterResult};
pub use integration::{
    install_async, install_display_server, install_synced, install_synced_display_server,
    MOVE_CAMERA_TASK_PRIORITY, SWAP_COORDINATOR_TASK_PRIORITY,
};
pub use protocol::{Message, MessageCodec, MessageType};
pub use server::{DisplayServer, SyncedDisplayServer};
pub use transport::FramedTransport;

/// Hard cap on the `length` field of an incoming frame, in bytes.
///
/// The largest legitimate frame is a camera payload (2 + 48 bytes); any
/// peer advertising more than this is corrupt or hostile and its
/// transport is closed.
pub const MAX_FRAME_SIZE: usize = 64 * 1024;

/// Default TCP connect timeout for reaching a display server, in
/// milliseconds. Config key: `game-server-timeout-ms`.
pub const DEFAULT_GAME_SERVER_TIMEOUT_MS: u64 = 20_000;
