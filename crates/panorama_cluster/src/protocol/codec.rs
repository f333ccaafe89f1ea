//! # Message Codec
//!
//! Turns [`Message`] values into framed byte blobs and back.
//!
//! Encoding is stateless except for an outbound packet counter that only
//! feeds debug log lines; it wraps harmlessly. Decoding is pure.

use super::messages::{Message, MessageType};
use super::{LENGTH_PREFIX_SIZE, POSE_PAYLOAD_SIZE, TYPE_CODE_SIZE};
use crate::error::{ClusterError, ClusterResult};
use panorama_core::{CameraPose, Vec3};

/// Encoder/decoder for Lockstep Protocol frames.
///
/// One codec is shared by every connection of a coordinator so the packet
/// counter in the diagnostics is a single sequence. It is owned by the
/// scheduler thread and never crosses threads.
#[derive(Debug, Default)]
pub struct MessageCodec {
    /// Outbound packets encoded so far. Diagnostic only; wraps.
    packet_count: u64,
}

impl MessageCodec {
    /// Creates a codec with the packet counter at zero.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of packets encoded so far.
    #[inline]
    #[must_use]
    pub const fn packet_count(&self) -> u64 {
        self.packet_count
    }

    /// Encodes a CAM_OFFSET frame carrying the fixed per-display offset.
    #[must_use]
    pub fn encode_cam_offset(&mut self, pose: &CameraPose) -> Vec<u8> {
        self.encode_pose_frame(MessageType::CamOffset, pose)
    }

    /// Encodes a MOVE_CAM frame carrying the shared world camera pose.
    #[must_use]
    pub fn encode_move_cam(&mut self, pose: &CameraPose) -> Vec<u8> {
        self.encode_pose_frame(MessageType::MoveCam, pose)
    }

    /// Encodes an empty SWAP_READY frame.
    #[must_use]
    pub fn encode_swap_ready(&mut self) -> Vec<u8> {
        self.encode_empty_frame(MessageType::SwapReady)
    }

    /// Encodes an empty SWAP_NOW frame.
    #[must_use]
    pub fn encode_swap_now(&mut self) -> Vec<u8> {
        self.encode_empty_frame(MessageType::SwapNow)
    }

    /// Splits a received frame body into its type code and payload.
    ///
    /// The body is what follows the length prefix: two bytes of type code,
    /// then the payload. The code is returned raw so the caller decides
    /// how to treat values the protocol does not define.
    pub fn decode_header(frame: &[u8]) -> ClusterResult<(u16, &[u8])> {
        if frame.len() < TYPE_CODE_SIZE {
            return Err(ClusterError::TruncatedFrame { length: frame.len() });
        }
        let code = u16::from_be_bytes([frame[0], frame[1]]);
        Ok((code, &frame[TYPE_CODE_SIZE..]))
    }

    /// Decodes a camera payload: six big-endian f64 in x, y, z, h, p, r order.
    pub fn decode_pose(kind: MessageType, payload: &[u8]) -> ClusterResult<CameraPose> {
        if payload.len() != POSE_PAYLOAD_SIZE {
            return Err(ClusterError::MalformedPayload {
                kind,
                expected: POSE_PAYLOAD_SIZE,
                got: payload.len(),
            });
        }
        let mut components = [0.0_f64; 6];
        for (slot, chunk) in components.iter_mut().zip(payload.chunks_exact(8)) {
            let mut raw = [0_u8; 8];
            raw.copy_from_slice(chunk);
            *slot = f64::from_be_bytes(raw);
        }
        Ok(CameraPose::new(
            Vec3::new(components[0], components[1], components[2]),
            Vec3::new(components[3], components[4], components[5]),
        ))
    }

    /// Validates a SWAP_READY payload: succeeds iff it is empty.
    pub fn decode_swap_ready(payload: &[u8]) -> ClusterResult<()> {
        Self::decode_empty(MessageType::SwapReady, payload)
    }

    /// Decodes a complete frame body into a [`Message`].
    pub fn decode_message(frame: &[u8]) -> ClusterResult<Message> {
        let (code, payload) = Self::decode_header(frame)?;
        let Some(kind) = MessageType::from_code(code) else {
            return Err(ClusterError::UnknownMessageType { code });
        };
        match kind {
            MessageType::CamOffset => Ok(Message::CamOffset(Self::decode_pose(kind, payload)?)),
            MessageType::MoveCam => Ok(Message::MoveCam(Self::decode_pose(kind, payload)?)),
            MessageType::SwapReady => {
                Self::decode_empty(kind, payload)?;
                Ok(Message::SwapReady)
            }
            MessageType::SwapNow => {
                Self::decode_empty(kind, payload)?;
                Ok(Message::SwapNow)
            }
        }
    }

    /// Validates that a barrier message carries no payload.
    fn decode_empty(kind: MessageType, payload: &[u8]) -> ClusterResult<()> {
        if payload.is_empty() {
            Ok(())
        } else {
            Err(ClusterError::MalformedPayload {
                kind,
                expected: 0,
                got: payload.len(),
            })
        }
    }

    /// Assembles a frame with a 48-byte camera payload.
    fn encode_pose_frame(&mut self, kind: MessageType, pose: &CameraPose) -> Vec<u8> {
        let mut payload = Vec::with_capacity(POSE_PAYLOAD_SIZE);
        for component in [
            pose.pos.x, pose.pos.y, pose.pos.z, pose.hpr.x, pose.hpr.y, pose.hpr.z,
        ] {
            payload.extend_from_slice(&component.to_be_bytes());
        }
        self.frame(kind, &payload)
    }

    /// Assembles a payload-free frame.
    fn encode_empty_frame(&mut self, kind: MessageType) -> Vec<u8> {
        self.frame(kind, &[])
    }

    /// Prepends the length and type code to a payload.
    ///
    /// The length field counts the type code plus the payload, not itself.
    fn frame(&mut self, kind: MessageType, payload: &[u8]) -> Vec<u8> {
        self.packet_count = self.packet_count.wrapping_add(1);
        tracing::debug!(
            "encoding {:?} ({} payload bytes, packet {})",
            kind,
            payload.len(),
            self.packet_count
        );

        let body_len = TYPE_CODE_SIZE + payload.len();
        let mut frame = Vec::with_capacity(LENGTH_PREFIX_SIZE + body_len);
        #[allow(clippy::cast_possible_truncation)]
        frame.extend_from_slice(&(body_len as u32).to_be_bytes());
        frame.extend_from_slice(&kind.code().to_be_bytes());
        frame.extend_from_slice(payload);
        frame
    }
}
