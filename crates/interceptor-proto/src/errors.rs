//! Error types for wire framing and codec operations.

use thiserror::Error;

/// Result alias used throughout this crate.
pub type Result<T> = std::result::Result<T, ProtocolError>;

/// Errors raised while decoding or encoding a [`crate::Frame`].
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProtocolError {
    /// Buffer shorter than the fixed 4-byte header.
    #[error("frame too short: need at least {expected} bytes, got {actual}")]
    FrameTooShort {
        /// Minimum required length.
        expected: usize,
        /// Actual buffer length.
        actual: usize,
    },

    /// Header claims more payload than the buffer actually holds.
    #[error("frame truncated: header claims {expected} total bytes, only {actual} available")]
    FrameTruncated {
        /// Bytes claimed by the length prefix.
        expected: usize,
        /// Bytes actually available.
        actual: usize,
    },

    /// Declared frame length exceeds the protocol maximum.
    #[error("frame too large: {size} bytes exceeds max {max}")]
    FrameTooLarge {
        /// Declared size.
        size: usize,
        /// Maximum allowed size.
        max: usize,
    },
}

/// Errors raised by a [`crate::codec::CodecRegistry`] implementation.
#[derive(Error, Debug, Clone)]
pub enum CodecError {
    /// No schema registered for this message name at this definition version.
    #[error("no schema for {name:?} at definition version {def_version}")]
    UnknownSchema {
        /// Message name.
        name: String,
        /// Requested definition version.
        def_version: u32,
    },

    /// Opcode does not resolve to a known message name under the active
    /// protocol version.
    #[error("opcode {opcode:#06x} is not mapped under protocol version {proto_version}")]
    UnmappedOpcode {
        /// Offending opcode.
        opcode: u16,
        /// Active protocol version.
        proto_version: u32,
    },

    /// Message name does not resolve to a known opcode under the active
    /// protocol version.
    #[error("message {name:?} is not mapped under protocol version {proto_version}")]
    UnmappedName {
        /// Offending message name.
        name: String,
        /// Active protocol version.
        proto_version: u32,
    },

    /// Parsing the payload bytes into a structured value failed.
    #[error("decode failed for {name:?}: {reason}")]
    Decode {
        /// Message name being decoded.
        name: String,
        /// Human-readable cause.
        reason: String,
    },

    /// Serializing a structured value back to bytes failed.
    #[error("encode failed for {name:?}: {reason}")]
    Encode {
        /// Message name being encoded.
        name: String,
        /// Human-readable cause.
        reason: String,
    },
}
