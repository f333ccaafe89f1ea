//! # PANORAMA Core - The Host Engine Surface
//!
//! The slice of the host 3D engine that the cluster layer is allowed to see.
//!
//! ## Architecture
//!
//! The cluster coordinator never touches the scene graph, the window system,
//! or the render device. Everything it needs from the engine flows through
//! three seams defined here:
//!
//! - [`math`]: the shared world-frame camera pose (position + heading/pitch/roll)
//! - [`task`]: the cooperative single-threaded tick scheduler
//! - [`host`]: the [`HostEngine`] trait (sample pose, apply pose, swap buffers)
//!
//! ## Threading Model
//!
//! There is exactly one thread: the scheduler thread. Every callback runs on
//! it, every socket blocks on it. Nothing in this crate is `Send`-dependent
//! and nothing spawns.

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![deny(clippy::perf)]

pub mod host;
pub mod math;
pub mod task;

// Re-exports for convenience
pub use host::HostEngine;
pub use math::{CameraPose, Vec3};
pub use task::{CooperativeScheduler, TaskScheduler, TaskStatus};
