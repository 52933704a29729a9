//! In-memory [`CodecRegistry`] and [`SystemMessageTable`] fakes for testing
//! the dispatch core without a real protocol definition.

use std::collections::HashMap;

use bytes::Bytes;
use interceptor_proto::{CodecError, CodecRegistry, SystemMessageTable, Value};

/// A single known protocol version's name↔opcode map and per-name schema
/// table.
#[derive(Debug, Clone, Default)]
struct ProtoMap {
    opcode_to_name: HashMap<u16, String>,
    name_to_opcode: HashMap<String, u16>,
    /// name → (set of known def versions, latest).
    schemas: HashMap<String, (Vec<u32>, u32)>,
}

/// An in-memory codec standing in for a real generated protocol definition.
///
/// Parses payloads into a single `len` field carrying the byte count, and
/// writes a value back out as that many zero bytes — enough structure for
/// dispatch-core invariants (cache uniqueness, clone isolation, commit
/// re-serialization) without needing a real wire schema.
#[derive(Debug, Clone, Default)]
pub struct FakeCodecRegistry {
    versions: HashMap<u32, ProtoMap>,
    first_known: Option<u32>,
}

impl FakeCodecRegistry {
    /// An empty registry with no known protocol versions.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register protocol version `proto_version` as known, with no messages
    /// yet mapped.
    #[must_use]
    pub fn with_version(mut self, proto_version: u32) -> Self {
        self.versions.entry(proto_version).or_default();
        self.first_known.get_or_insert(proto_version);
        self
    }

    /// Map `name` to `opcode` under `proto_version`, with known definition
    /// versions `def_versions` (the last entry is the latest).
    #[must_use]
    pub fn with_message(
        mut self,
        proto_version: u32,
        name: &str,
        opcode: u16,
        def_versions: Vec<u32>,
    ) -> Self {
        let latest = *def_versions.last().unwrap_or(&1);
        let map = self.versions.entry(proto_version).or_default();
        map.opcode_to_name.insert(opcode, name.to_string());
        map.name_to_opcode.insert(name.to_string(), opcode);
        map.schemas.insert(name.to_string(), (def_versions, latest));
        self.first_known.get_or_insert(proto_version);
        self
    }
}

impl CodecRegistry for FakeCodecRegistry {
    fn has_protocol_version(&self, proto_version: u32) -> bool {
        self.versions.contains_key(&proto_version)
    }

    fn first_known_version(&self) -> u32 {
        self.first_known.unwrap_or(1)
    }

    fn resolve_opcode(&self, proto_version: u32, opcode: u16) -> Result<String, CodecError> {
        self.versions
            .get(&proto_version)
            .and_then(|m| m.opcode_to_name.get(&opcode))
            .cloned()
            .ok_or(CodecError::UnmappedOpcode { opcode, proto_version })
    }

    fn resolve_name(&self, proto_version: u32, name: &str) -> Result<u16, CodecError> {
        self.versions
            .get(&proto_version)
            .and_then(|m| m.name_to_opcode.get(name))
            .copied()
            .ok_or_else(|| CodecError::UnmappedName { name: name.to_string(), proto_version })
    }

    fn latest_def_version(&self, proto_version: u32, name: &str) -> Result<u32, CodecError> {
        self.versions
            .get(&proto_version)
            .and_then(|m| m.schemas.get(name))
            .map(|(_, latest)| *latest)
            .ok_or_else(|| CodecError::UnmappedName { name: name.to_string(), proto_version })
    }

    fn has_schema(&self, proto_version: u32, name: &str, def_version: u32) -> bool {
        self.versions
            .get(&proto_version)
            .and_then(|m| m.schemas.get(name))
            .is_some_and(|(versions, _)| versions.contains(&def_version))
    }

    fn parse(
        &self,
        proto_version: u32,
        name: &str,
        def_version: u32,
        payload: &[u8],
    ) -> Result<Value, CodecError> {
        if !self.has_schema(proto_version, name, def_version) {
            return Err(CodecError::UnmappedName { name: name.to_string(), proto_version });
        }
        Ok(Value::Map(vec![("len".into(), Value::from(i64::from(payload.len() as u32)))]))
    }

    fn write(
        &self,
        proto_version: u32,
        name: &str,
        def_version: u32,
        value: &Value,
    ) -> Result<Bytes, CodecError> {
        if !self.has_schema(proto_version, name, def_version) {
            return Err(CodecError::UnmappedName { name: name.to_string(), proto_version });
        }
        let len = match value.get("len") {
            Some(Value::Int(n)) => u32::try_from(*n).unwrap_or(0),
            _ => 0,
        };
        Ok(Bytes::from(vec![0u8; len as usize]))
    }
}

/// An in-memory [`SystemMessageTable`] over a fixed name↔code map.
#[derive(Debug, Clone, Default)]
pub struct FakeSystemMessageTable {
    code_for_name: HashMap<String, u8>,
    name_for_code: HashMap<u8, String>,
}

impl FakeSystemMessageTable {
    /// An empty table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Map `name` to `code` and back.
    #[must_use]
    pub fn with_entry(mut self, name: &str, code: u8) -> Self {
        self.code_for_name.insert(name.to_string(), code);
        self.name_for_code.insert(code, name.to_string());
        self
    }
}

impl SystemMessageTable for FakeSystemMessageTable {
    fn code_for_name(&self, name: &str) -> Option<u8> {
        self.code_for_name.get(name).copied()
    }

    fn name_for_code(&self, code: u8) -> Option<&str> {
        self.name_for_code.get(&code).map(String::as_str)
    }
}
