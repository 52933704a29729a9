//! Opcodes, the wildcard sentinel, and definition versions.

use std::{fmt, str::FromStr};

/// A 16-bit wire opcode.
pub type Opcode = u16;

/// Numeric opcode of the built-in protocol version probe (spec §4.2 step 1).
///
/// Seeing this opcode before any protocol version has been negotiated is the
/// one special case the Handler Pipeline hard-codes; see
/// [`crate::is_version_probe`].
pub const C_CHECK_VERSION: Opcode = 19_900;

/// The hook target for a single registration: a specific opcode or the
/// wildcard sentinel that matches every opcode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HookTarget {
    /// Matches frames with exactly this opcode.
    Opcode(Opcode),
    /// Matches every frame.
    Wildcard,
}

impl fmt::Display for HookTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HookTarget::Opcode(op) => write!(f, "{op:#06x}"),
            HookTarget::Wildcard => write!(f, "*"),
        }
    }
}

/// The schema revision a hook wants to parse/emit a message under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DefVersion {
    /// A specific, positive schema revision.
    Exact(u32),
    /// Match any version; the codec still parses to a structured [`crate::Value`].
    Any,
    /// No parsing occurs; the callback receives the raw frame bytes.
    Raw,
}

impl DefVersion {
    /// `true` for [`DefVersion::Raw`].
    #[must_use]
    pub fn is_raw(self) -> bool {
        matches!(self, DefVersion::Raw)
    }
}

impl fmt::Display for DefVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DefVersion::Exact(v) => write!(f, "{v}"),
            DefVersion::Any => write!(f, "*"),
            DefVersion::Raw => write!(f, "raw"),
        }
    }
}

/// Error returned by [`DefVersion::from_str`] for malformed input.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid definition version: {0:?}")]
pub struct DefVersionParseError(pub String);

impl FromStr for DefVersion {
    type Err = DefVersionParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "*" => Ok(DefVersion::Any),
            "raw" => Ok(DefVersion::Raw),
            other => other
                .parse::<u32>()
                .map(DefVersion::Exact)
                .map_err(|_| DefVersionParseError(other.to_string())),
        }
    }
}
