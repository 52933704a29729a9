//! A toy protocol definition standing in for a real generated codec.
//!
//! Real deployments plug in a codec generated from the actual protocol
//! message tables (spec §6); this demo binary ships one message, `echo`, so
//! the read loop has something concrete to parse and re-serialize.

use bytes::Bytes;
use interceptor_proto::{CodecError, CodecRegistry, SystemMessageTable, Value};

/// `echo`, opcode `0x0001`, carries a single UTF-8 `text` field at
/// definition version 1.
pub const ECHO_OPCODE: u16 = 0x0001;
const ECHO_NAME: &str = "echo";
const ECHO_DEF_VERSION: u32 = 1;

/// The only protocol version this demo knows.
pub const DEMO_PROTO_VERSION: u32 = 1;

/// Maps `echo` to opcode `0x0001` under [`DEMO_PROTO_VERSION`] and nothing
/// else.
#[derive(Debug, Clone, Copy, Default)]
pub struct DemoCodecRegistry;

impl CodecRegistry for DemoCodecRegistry {
    fn has_protocol_version(&self, proto_version: u32) -> bool {
        proto_version == DEMO_PROTO_VERSION
    }

    fn first_known_version(&self) -> u32 {
        DEMO_PROTO_VERSION
    }

    fn resolve_opcode(&self, proto_version: u32, opcode: u16) -> Result<String, CodecError> {
        if proto_version == DEMO_PROTO_VERSION && opcode == ECHO_OPCODE {
            Ok(ECHO_NAME.to_string())
        } else {
            Err(CodecError::UnmappedOpcode { opcode, proto_version })
        }
    }

    fn resolve_name(&self, proto_version: u32, name: &str) -> Result<u16, CodecError> {
        if proto_version == DEMO_PROTO_VERSION && name == ECHO_NAME {
            Ok(ECHO_OPCODE)
        } else {
            Err(CodecError::UnmappedName { name: name.to_string(), proto_version })
        }
    }

    fn latest_def_version(&self, _proto_version: u32, _name: &str) -> Result<u32, CodecError> {
        Ok(ECHO_DEF_VERSION)
    }

    fn has_schema(&self, proto_version: u32, name: &str, def_version: u32) -> bool {
        proto_version == DEMO_PROTO_VERSION && name == ECHO_NAME && def_version == ECHO_DEF_VERSION
    }

    fn parse(
        &self,
        _proto_version: u32,
        _name: &str,
        _def_version: u32,
        payload: &[u8],
    ) -> Result<Value, CodecError> {
        let text = String::from_utf8_lossy(payload).into_owned();
        Ok(Value::Map(vec![("text".into(), Value::from(text))]))
    }

    fn write(
        &self,
        _proto_version: u32,
        _name: &str,
        _def_version: u32,
        value: &Value,
    ) -> Result<Bytes, CodecError> {
        let text = value.get("text").and_then(Value::as_str).unwrap_or_default();
        Ok(Bytes::copy_from_slice(text.as_bytes()))
    }
}

/// One system message, `hello`, at code `1`.
#[derive(Debug, Clone, Copy, Default)]
pub struct DemoSystemMessageTable;

impl SystemMessageTable for DemoSystemMessageTable {
    fn code_for_name(&self, name: &str) -> Option<u8> {
        (name == "hello").then_some(1)
    }

    fn name_for_code(&self, code: u8) -> Option<&str> {
        (code == 1).then_some("hello")
    }
}
