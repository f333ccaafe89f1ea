//! # Host Engine Interface
//!
//! The three hooks the cluster layer needs from the engine it rides on.
//!
//! ## Architecture (Glass Walls Policy)
//!
//! The cluster layer DOES NOT reach into the engine's scene graph, window
//! system, or clock. The engine implements this trait; the cluster layer
//! calls it and nothing else.

use crate::math::CameraPose;

/// What the cluster layer consumes from the host engine.
///
/// A master implementation samples its driving camera and owns the local
/// swap chain; a display-server implementation additionally accepts the
/// offset pose computed from the master's broadcast.
pub trait HostEngine {
    /// Returns the current camera pose in the shared world frame.
    ///
    /// Sampled once per tick by the camera-move callback on the master.
    fn world_camera_pose(&self) -> CameraPose;

    /// Applies a camera pose to the local view.
    ///
    /// Called on a display server when a camera update arrives, after the
    /// per-display offset has been composed in.
    fn apply_camera_pose(&mut self, pose: CameraPose);

    /// Makes the previously rendered frame visible.
    ///
    /// Blocks until the swap completes. Swap failures are the host's to
    /// surface; the cluster layer never attempts recovery.
    fn swap_buffers(&mut self);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::Vec3;

    /// Minimal host: a settable pose and a swap counter.
    struct FixedHost {
        pose: CameraPose,
        applied: Option<CameraPose>,
        swaps: u32,
    }

    impl HostEngine for FixedHost {
        fn world_camera_pose(&self) -> CameraPose {
            self.pose
        }

        fn apply_camera_pose(&mut self, pose: CameraPose) {
            self.applied = Some(pose);
        }

        fn swap_buffers(&mut self) {
            self.swaps += 1;
        }
    }

    #[test]
    fn test_host_round_trip() {
        let mut host = FixedHost {
            pose: CameraPose::new(Vec3::new(1.0, 2.0, 3.0), Vec3::ZERO),
            applied: None,
            swaps: 0,
        };

        let sampled = host.world_camera_pose();
        host.apply_camera_pose(sampled);
        host.swap_buffers();

        assert_eq!(host.applied, Some(sampled));
        assert_eq!(host.swaps, 1);
    }
}
