//! Wire frame: a 4-byte header (length, opcode) followed by the payload.
//!
//! Layout on the wire, all integers little-endian:
//! `[total_length: u16][opcode: u16][payload: variable]`
//!
//! `total_length` includes the 4-byte header itself, so an empty-payload
//! frame has `total_length == 4`. The Dispatch Core (see `interceptor-core`)
//! never frames or de-frames a byte stream; it receives and returns complete
//! frames exactly like this one.

use bytes::{BufMut, Bytes};

use crate::{
    errors::{ProtocolError, Result},
    opcode::Opcode,
};

/// Fixed header length in bytes.
pub const HEADER_LEN: usize = 4;

/// Largest frame this protocol will construct or accept (16 MiB), matching
/// the payload ceiling games of this vintage use to bound allocation from
/// untrusted input.
pub const MAX_FRAME_LEN: usize = 16 * 1024 * 1024;

/// A complete wire frame: header plus payload, held as a single contiguous
/// buffer.
///
/// # Invariants
///
/// - `bytes.len() >= HEADER_LEN`.
/// - The little-endian `u16` at offset 0 equals `bytes.len()`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    bytes: Bytes,
}

impl Frame {
    /// Build a frame from an opcode and payload, computing the length prefix.
    ///
    /// # Errors
    ///
    /// Returns [`ProtocolError::FrameTooLarge`] if `HEADER_LEN + payload.len()`
    /// exceeds [`MAX_FRAME_LEN`] or doesn't fit in a `u16`.
    pub fn new(opcode: Opcode, payload: impl Into<Bytes>) -> Result<Self> {
        let payload = payload.into();
        let total_len = HEADER_LEN + payload.len();

        if total_len > MAX_FRAME_LEN || total_len > u16::MAX as usize {
            return Err(ProtocolError::FrameTooLarge { size: total_len, max: MAX_FRAME_LEN });
        }

        let mut buf = Vec::with_capacity(total_len);
        #[allow(clippy::cast_possible_truncation)]
        buf.put_u16_le(total_len as u16);
        buf.put_u16_le(opcode);
        buf.put_slice(&payload);

        Ok(Self { bytes: buf.into() })
    }

    /// Parse a frame from wire bytes.
    ///
    /// Trailing bytes beyond the declared length are rejected rather than
    /// silently ignored, since the Dispatch Core always receives exactly one
    /// complete frame per call.
    ///
    /// # Errors
    ///
    /// - [`ProtocolError::FrameTooShort`] if fewer than [`HEADER_LEN`] bytes
    ///   are available.
    /// - [`ProtocolError::FrameTruncated`] if the declared length exceeds
    ///   `bytes.len()`.
    pub fn decode(bytes: &[u8]) -> Result<Self> {
        if bytes.len() < HEADER_LEN {
            return Err(ProtocolError::FrameTooShort { expected: HEADER_LEN, actual: bytes.len() });
        }

        let total_len = read_length(bytes)? as usize;

        if bytes.len() < total_len {
            return Err(ProtocolError::FrameTruncated { expected: total_len, actual: bytes.len() });
        }

        if bytes.len() > total_len {
            return Err(ProtocolError::FrameTruncated { expected: total_len, actual: bytes.len() });
        }

        Ok(Self { bytes: Bytes::copy_from_slice(bytes) })
    }

    /// The complete wire representation (header + payload).
    #[must_use]
    pub fn as_bytes(&self) -> &Bytes {
        &self.bytes
    }

    /// Consume the frame, returning its wire bytes.
    #[must_use]
    pub fn into_bytes(self) -> Bytes {
        self.bytes
    }

    /// The opcode at offset 2.
    #[must_use]
    pub fn opcode(&self) -> Opcode {
        // `decode`/`new` guarantee at least HEADER_LEN bytes.
        #[allow(clippy::expect_used)]
        read_opcode(&self.bytes).expect("invariant: frame always has a valid header")
    }

    /// The payload, excluding the 4-byte header.
    #[must_use]
    pub fn payload(&self) -> Bytes {
        self.bytes.slice(HEADER_LEN..)
    }
}

/// Read the little-endian total-length prefix at offset 0.
///
/// # Errors
///
/// [`ProtocolError::FrameTooShort`] if `bytes` is shorter than [`HEADER_LEN`].
pub fn read_length(bytes: &[u8]) -> Result<u16> {
    let prefix: [u8; 2] = bytes
        .get(0..2)
        .and_then(|s| s.try_into().ok())
        .ok_or(ProtocolError::FrameTooShort { expected: HEADER_LEN, actual: bytes.len() })?;
    Ok(u16::from_le_bytes(prefix))
}

/// Read the little-endian opcode at offset 2 (spec §3).
///
/// # Errors
///
/// [`ProtocolError::FrameTooShort`] if `bytes` is shorter than [`HEADER_LEN`].
pub fn read_opcode(bytes: &[u8]) -> Result<Opcode> {
    let field: [u8; 2] = bytes
        .get(2..4)
        .and_then(|s| s.try_into().ok())
        .ok_or(ProtocolError::FrameTooShort { expected: HEADER_LEN, actual: bytes.len() })?;
    Ok(u16::from_le_bytes(field))
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;

    #[test]
    fn round_trip_empty_payload() {
        let frame = Frame::new(0x1234, Bytes::new()).unwrap();
        assert_eq!(frame.as_bytes().len(), HEADER_LEN);
        assert_eq!(frame.opcode(), 0x1234);
        assert!(frame.payload().is_empty());

        let decoded = Frame::decode(frame.as_bytes()).unwrap();
        assert_eq!(decoded, frame);
    }

    #[test]
    fn s1_scenario_bytes() {
        // spec §8 S1: 06 00 34 12 AA BB -> opcode 0x1234, payload [AA, BB]
        let bytes = [0x06, 0x00, 0x34, 0x12, 0xAA, 0xBB];
        let frame = Frame::decode(&bytes).unwrap();
        assert_eq!(frame.opcode(), 0x1234);
        assert_eq!(&frame.payload()[..], &[0xAA, 0xBB]);
        assert_eq!(frame.as_bytes().as_ref(), &bytes);
    }

    #[test]
    fn reject_short_buffer() {
        let result = Frame::decode(&[0x01, 0x00]);
        assert_eq!(result, Err(ProtocolError::FrameTooShort { expected: 4, actual: 2 }));
    }

    #[test]
    fn reject_truncated_frame() {
        // Declares 10 bytes total but only 4 are present.
        let bytes = [0x0A, 0x00, 0x00, 0x00];
        let result = Frame::decode(&bytes);
        assert_eq!(result, Err(ProtocolError::FrameTruncated { expected: 10, actual: 4 }));
    }

    #[test]
    fn reject_trailing_garbage() {
        // Declares 4 bytes (header only) but 6 are present.
        let bytes = [0x04, 0x00, 0x00, 0x00, 0xFF, 0xFF];
        let result = Frame::decode(&bytes);
        assert_eq!(result, Err(ProtocolError::FrameTruncated { expected: 4, actual: 6 }));
    }

    proptest! {
        #[test]
        fn frame_round_trip(opcode: u16, payload in prop::collection::vec(any::<u8>(), 0..4096)) {
            let frame = Frame::new(opcode, payload.clone()).unwrap();
            let decoded = Frame::decode(frame.as_bytes()).unwrap();
            prop_assert_eq!(&decoded, &frame);
            prop_assert_eq!(decoded.opcode(), opcode);
            prop_assert_eq!(&decoded.payload()[..], &payload[..]);
        }
    }
}
