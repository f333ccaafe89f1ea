//! # Message Definitions
//!
//! The four message kinds of the Lockstep Protocol. Two carry a camera
//! pose, two are bare barrier signals.

use panorama_core::CameraPose;

/// Wire type codes for the protocol messages.
///
/// The numeric values are frozen; they are what travels in the two-byte
/// type field of every frame.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[repr(u16)]
pub enum MessageType {
    /// Master → display, once at startup: the fixed per-display view offset.
    CamOffset = 0x0001,
    /// Master → display, every tick: the shared world camera pose.
    MoveCam = 0x0002,
    /// Display → master: "I finished rendering the frame you told me about."
    SwapReady = 0x0003,
    /// Master → display: "present it."
    SwapNow = 0x0004,
}

impl MessageType {
    /// Returns the on-wire type code.
    #[inline]
    #[must_use]
    pub const fn code(self) -> u16 {
        self as u16
    }

    /// Looks up a message type from its on-wire code.
    ///
    /// Returns `None` for codes the protocol does not define; callers
    /// treat that as a protocol violation, never as a default.
    #[must_use]
    pub const fn from_code(code: u16) -> Option<Self> {
        match code {
            0x0001 => Some(Self::CamOffset),
            0x0002 => Some(Self::MoveCam),
            0x0003 => Some(Self::SwapReady),
            0x0004 => Some(Self::SwapNow),
            _ => None,
        }
    }
}

/// A decoded protocol message.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Message {
    /// Fixed per-display view offset.
    CamOffset(CameraPose),
    /// Per-tick camera pose in the shared world frame.
    MoveCam(CameraPose),
    /// Barrier signal from a display.
    SwapReady,
    /// Barrier release from the master.
    SwapNow,
}

impl Message {
    /// Returns the message's wire type.
    #[must_use]
    pub const fn message_type(&self) -> MessageType {
        match self {
            Self::CamOffset(_) => MessageType::CamOffset,
            Self::MoveCam(_) => MessageType::MoveCam,
            Self::SwapReady => MessageType::SwapReady,
            Self::SwapNow => MessageType::SwapNow,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use panorama_core::Vec3;

    #[test]
    fn test_type_codes_are_frozen() {
        assert_eq!(MessageType::CamOffset.code(), 0x0001);
        assert_eq!(MessageType::MoveCam.code(), 0x0002);
        assert_eq!(MessageType::SwapReady.code(), 0x0003);
        assert_eq!(MessageType::SwapNow.code(), 0x0004);
    }

    #[test]
    fn test_code_round_trip() {
        for kind in [
            MessageType::CamOffset,
            MessageType::MoveCam,
            MessageType::SwapReady,
            MessageType::SwapNow,
        ] {
            assert_eq!(MessageType::from_code(kind.code()), Some(kind));
        }
    }

    #[test]
    fn test_unknown_codes_are_rejected() {
        assert_eq!(MessageType::from_code(0x0000), None);
        assert_eq!(MessageType::from_code(0x0005), None);
        assert_eq!(MessageType::from_code(0x00FF), None);
        assert_eq!(MessageType::from_code(0xFFFF), None);
    }

    #[test]
    fn test_message_reports_its_type() {
        let pose = CameraPose::new(Vec3::new(1.0, 2.0, 3.0), Vec3::ZERO);
        assert_eq!(
            Message::CamOffset(pose).message_type(),
            MessageType::CamOffset
        );
        assert_eq!(Message::MoveCam(pose).message_type(), MessageType::MoveCam);
        assert_eq!(Message::SwapReady.message_type(), MessageType::SwapReady);
        assert_eq!(Message::SwapNow.message_type(), MessageType::SwapNow);
    }
}
