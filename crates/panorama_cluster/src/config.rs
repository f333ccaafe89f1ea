//! # Cluster Configuration
//!
//! The master's view of the wall: an ordered list of display entries plus
//! the socket timeouts. Loaded once at startup from TOML and immutable
//! afterwards; the entry order fixes the barrier order for the whole run.
//!
//! ```toml
//! game-server-timeout-ms = 20000
//!
//! [[display]]
//! role = "left"
//! host = "10.0.0.7"
//! port = 5150
//! offset-pos = [-5.0, 0.0, 0.0]
//! offset-hpr = [0.0, 0.0, 0.0]
//! ```

use crate::error::{ClusterError, ClusterResult};
use crate::DEFAULT_GAME_SERVER_TIMEOUT_MS;
use panorama_core::CameraPose;
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

/// One display server of the wall.
///
/// Immutable once constructed. Duplicate host:port pairs are legal - the
/// same machine may serve several logical roles, each over its own
/// connection.
#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct DisplayConfig {
    /// Free-form tag naming the display's function ("left", "floor", ...).
    pub role: String,
    /// Hostname or address of the display server.
    pub host: String,
    /// TCP port the display server listens on.
    pub port: u16,
    /// Fixed view-position offset (x, y, z) in world units.
    #[serde(default)]
    pub offset_pos: [f64; 3],
    /// Fixed view-orientation offset (h, p, r) in degrees.
    #[serde(default)]
    pub offset_hpr: [f64; 3],
}

impl DisplayConfig {
    /// Returns the offset as a pose, ready to compose with camera updates.
    #[must_use]
    pub fn offset_pose(&self) -> CameraPose {
        CameraPose::new(self.offset_pos.into(), self.offset_hpr.into())
    }
}

/// The full master-side cluster configuration.
#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct ClusterConfig {
    /// Ordered display entries; this order is the barrier order.
    #[serde(rename = "display", default)]
    pub displays: Vec<DisplayConfig>,
    /// TCP connect timeout per display, in milliseconds.
    #[serde(default = "default_game_server_timeout_ms")]
    pub game_server_timeout_ms: u64,
    /// Barrier read timeout in milliseconds; absent (or zero) waits
    /// forever, which is the faithful lockstep behavior.
    #[serde(default)]
    pub read_timeout_ms: Option<u64>,
}

impl Default for ClusterConfig {
    fn default() -> Self {
        Self {
            displays: Vec::new(),
            game_server_timeout_ms: DEFAULT_GAME_SERVER_TIMEOUT_MS,
            read_timeout_ms: None,
        }
    }
}

fn default_game_server_timeout_ms() -> u64 {
    DEFAULT_GAME_SERVER_TIMEOUT_MS
}

impl ClusterConfig {
    /// Parses a configuration from TOML text.
    pub fn from_toml_str(text: &str) -> ClusterResult<Self> {
        let config: Self =
            toml::from_str(text).map_err(|error| ClusterError::Config(error.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Loads a configuration file.
    pub fn from_path(path: &Path) -> ClusterResult<Self> {
        let text = std::fs::read_to_string(path).map_err(|error| {
            ClusterError::Config(format!("cannot read {}: {error}", path.display()))
        })?;
        Self::from_toml_str(&text)
    }

    /// Rejects configurations the coordinator cannot start with.
    pub fn validate(&self) -> ClusterResult<()> {
        if self.displays.is_empty() {
            return Err(ClusterError::Config(
                "no displays configured".to_string(),
            ));
        }
        for display in &self.displays {
            if display.host.is_empty() {
                return Err(ClusterError::Config(format!(
                    "display '{}' has an empty host",
                    display.role
                )));
            }
        }
        Ok(())
    }

    /// The connect timeout as a [`Duration`].
    #[must_use]
    pub const fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.game_server_timeout_ms)
    }

    /// The barrier read timeout, if one is configured.
    ///
    /// Zero is treated as "no timeout": the kernel rejects zero-length
    /// socket deadlines, and an instant barrier deadline is meaningless.
    #[must_use]
    pub fn read_timeout(&self) -> Option<Duration> {
        self.read_timeout_ms
            .filter(|&ms| ms > 0)
            .map(Duration::from_millis)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use panorama_core::Vec3;

    const TWO_WALL: &str = r#"
        game-server-timeout-ms = 5000
        read-timeout-ms = 250

        [[display]]
        role = "left"
        host = "127.0.0.1"
        port = 5150
        offset-pos = [-5.0, 0.0, 0.0]

        [[display]]
        role = "right"
        host = "127.0.0.1"
        port = 5151
        offset-pos = [5.0, 0.0, 0.0]
        offset-hpr = [15.0, 0.0, 0.0]
    "#;

    #[test]
    fn test_parse_two_display_wall() {
        let config = ClusterConfig::from_toml_str(TWO_WALL).unwrap();

        assert_eq!(config.displays.len(), 2);
        assert_eq!(config.game_server_timeout_ms, 5000);
        assert_eq!(config.connect_timeout(), Duration::from_millis(5000));
        assert_eq!(config.read_timeout(), Some(Duration::from_millis(250)));

        let left = &config.displays[0];
        assert_eq!(left.role, "left");
        assert_eq!(left.port, 5150);
        assert_eq!(
            left.offset_pose(),
            CameraPose::new(Vec3::new(-5.0, 0.0, 0.0), Vec3::ZERO)
        );

        let right = &config.displays[1];
        assert_eq!(right.offset_pose().hpr, Vec3::new(15.0, 0.0, 0.0));
    }

    #[test]
    fn test_defaults() {
        let config = ClusterConfig::from_toml_str(
            r#"
            [[display]]
            role = "solo"
            host = "localhost"
            port = 5150
            "#,
        )
        .unwrap();

        assert_eq!(config.game_server_timeout_ms, 20_000);
        assert_eq!(config.read_timeout(), None);
        assert_eq!(config.displays[0].offset_pose(), CameraPose::IDENTITY);
    }

    #[test]
    fn test_empty_wall_is_rejected() {
        match ClusterConfig::from_toml_str("") {
            Err(ClusterError::Config(reason)) => assert!(reason.contains("no displays")),
            other => panic!("expected Config error, got {other:?}"),
        }
    }

    #[test]
    fn test_duplicate_endpoints_are_allowed() {
        let config = ClusterConfig::from_toml_str(
            r#"
            [[display]]
            role = "upper"
            host = "127.0.0.1"
            port = 5150

            [[display]]
            role = "lower"
            host = "127.0.0.1"
            port = 5150
            "#,
        )
        .unwrap();
        assert_eq!(config.displays.len(), 2);
    }

    #[test]
    fn test_zero_read_timeout_means_unbounded() {
        let config = ClusterConfig::from_toml_str(
            r#"
            read-timeout-ms = 0

            [[display]]
            role = "solo"
            host = "localhost"
            port = 5150
            "#,
        )
        .unwrap();
        assert_eq!(config.read_timeout(), None);
    }

    #[test]
    fn test_unknown_keys_are_rejected() {
        let result = ClusterConfig::from_toml_str(
            r#"
            game-sever-timeout-ms = 1000

            [[display]]
            role = "solo"
            host = "localhost"
            port = 5150
            "#,
        );
        assert!(matches!(result, Err(ClusterError::Config(_))));
    }
}
