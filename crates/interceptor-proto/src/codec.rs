//! External interfaces the Dispatch Core depends on but never implements
//! itself: the message schema/opcode table and the system message name
//! table. A hosting application supplies both (spec §6); this crate only
//! defines the contract.

use bytes::Bytes;

use crate::{errors::CodecError, opcode::Opcode, value::Value};

/// Maps opcodes to message names and parses/serializes their payloads for a
/// given protocol version and definition version.
///
/// A single `CodecRegistry` instance may know about several protocol
/// versions at once (spec §4.2 step 1's version probe needs to answer
/// "have I ever heard of this version" before a version is chosen), but all
/// other lookups are scoped to one active protocol version, passed
/// explicitly since the trait itself is not stateful with respect to which
/// version is "current" — that's the Dispatch Facade's job (spec §4.3).
pub trait CodecRegistry: Send + Sync {
    /// Has this registry ever seen `proto_version` (regardless of whether it
    /// is fully supported)?
    fn has_protocol_version(&self, proto_version: u32) -> bool;

    /// The oldest protocol version this registry knows about, used to seed
    /// the pre-handshake client assumption (spec §4.2 step 1).
    fn first_known_version(&self) -> u32;

    /// Resolve an opcode to a message name under `proto_version`.
    ///
    /// # Errors
    ///
    /// [`CodecError::UnmappedOpcode`] if no mapping exists.
    fn resolve_opcode(&self, proto_version: u32, opcode: Opcode) -> Result<String, CodecError>;

    /// Resolve a message name to an opcode under `proto_version`.
    ///
    /// # Errors
    ///
    /// [`CodecError::UnmappedName`] if no mapping exists.
    fn resolve_name(&self, proto_version: u32, name: &str) -> Result<Opcode, CodecError>;

    /// The newest definition version known for `name` under `proto_version`.
    ///
    /// # Errors
    ///
    /// [`CodecError::UnknownSchema`] if the name is unknown.
    fn latest_def_version(&self, proto_version: u32, name: &str) -> Result<u32, CodecError>;

    /// Does a schema exist for `name` at exactly `def_version`?
    fn has_schema(&self, proto_version: u32, name: &str, def_version: u32) -> bool;

    /// Parse a payload into a structured [`Value`] under a specific schema
    /// revision.
    ///
    /// # Errors
    ///
    /// [`CodecError::UnknownSchema`] if no schema matches, or
    /// [`CodecError::Decode`] if the bytes don't conform to it.
    fn parse(
        &self,
        proto_version: u32,
        name: &str,
        def_version: u32,
        payload: &[u8],
    ) -> Result<Value, CodecError>;

    /// Serialize a structured [`Value`] back to wire bytes under a specific
    /// schema revision.
    ///
    /// # Errors
    ///
    /// [`CodecError::UnknownSchema`] if no schema matches, or
    /// [`CodecError::Encode`] if the value doesn't conform to it.
    fn write(
        &self,
        proto_version: u32,
        name: &str,
        def_version: u32,
        value: &Value,
    ) -> Result<Bytes, CodecError>;
}

/// Maps system message names to their single-byte identifier codes, for the
/// `@id\vkey\vvalue` text protocol (spec §4.3).
pub trait SystemMessageTable: Send + Sync {
    /// The identifier code for a system message name, if registered.
    fn code_for_name(&self, name: &str) -> Option<u8>;

    /// The system message name for an identifier code, if registered.
    fn name_for_code(&self, code: u8) -> Option<&str>;
}
