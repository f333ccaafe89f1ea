//! # Lockstep Wire Protocol
//!
//! Message definitions and codec for the master ↔ display-server link.
//!
//! ## Frame Structure
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │ Length (4, BE u32) = 2 + payload size                        │
//! ├──────────────────────────────────────────────────────────────┤
//! │ Type code (2, BE u16)                                        │
//! ├──────────────────────────────────────────────────────────────┤
//! │ Payload (0 or 48 bytes)                                      │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Design Philosophy
//!
//! - The receiver dispatches on the type code without parsing the payload
//! - Floats are eight-byte big-endian IEEE-754 on every host, so a little-
//!   endian master and a big-endian display agree bit for bit
//! - Unknown type codes are a distinct error path, never silently coerced

mod codec;
mod messages;

pub use codec::MessageCodec;
pub use messages::{Message, MessageType};

/// Size of the length prefix on the wire, in bytes.
pub const LENGTH_PREFIX_SIZE: usize = 4;

/// Size of the type code on the wire, in bytes.
pub const TYPE_CODE_SIZE: usize = 2;

/// Size of a camera payload: six f64 components.
pub const POSE_PAYLOAD_SIZE: usize = 48;
