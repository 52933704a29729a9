//! Wire frame, value model, and codec contracts for the interceptor dispatch
//! core.
//!
//! This crate has no knowledge of hooks, modules, or dispatch ordering; it
//! only defines the shapes that flow through those layers: [`Frame`] for raw
//! bytes on the wire, [`Value`] for parsed message content, and the
//! [`CodecRegistry`] / [`SystemMessageTable`] traits a hosting application
//! implements to teach a [`Dispatch`](../interceptor_core/struct.Dispatch.html)
//! instance about its particular message set.

#![forbid(unsafe_code)]
#![deny(missing_docs)]

mod codec;
mod errors;
mod flags;
mod frame;
mod opcode;
mod value;

pub use codec::{CodecRegistry, SystemMessageTable};
pub use errors::{CodecError, ProtocolError, Result};
pub use flags::{Filter, FrameFlags, Tri};
pub use frame::{Frame, HEADER_LEN, MAX_FRAME_LEN, read_length, read_opcode};
pub use opcode::{C_CHECK_VERSION, DefVersion, DefVersionParseError, HookTarget, Opcode};
pub use value::{CustomValue, Value};

/// Is `opcode` the built-in version probe the Handler Pipeline special-cases
/// before any protocol version has been negotiated (spec §4.2 step 1)?
#[must_use]
pub fn is_version_probe(opcode: Opcode) -> bool {
    opcode == C_CHECK_VERSION
}
