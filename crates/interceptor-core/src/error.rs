//! Error types for the dispatch core.

use interceptor_proto::{CodecError, ProtocolError};
use thiserror::Error;

/// Errors raised by the Hook Registry, Handler Pipeline, Dispatch Facade, or
/// Module Host.
#[derive(Error, Debug, Clone)]
pub enum DispatchError {
    /// A module's constructor failed, or failed to register any hooks.
    #[error("module {namespace:?} failed to load: {reason}")]
    ModuleLoad {
        /// Namespace the module was loading under.
        namespace: String,
        /// Human-readable cause.
        reason: String,
    },

    /// `unload` was called for a namespace with no loaded module.
    #[error("no module loaded under namespace {namespace:?}")]
    ModuleNotFound {
        /// Offending namespace.
        namespace: String,
    },

    /// `load` was called for a namespace that already has a module loaded.
    #[error("module already loaded under namespace {namespace:?}")]
    ModuleAlreadyLoaded {
        /// Offending namespace.
        namespace: String,
    },

    /// An operation requires a negotiated protocol version but none has been
    /// set yet (spec §4.2 step 1).
    #[error("no protocol version has been negotiated yet")]
    ProtocolVersionNotNegotiated,

    /// The hosting application's codec registry has never heard of this
    /// protocol version (spec §4.2 step 1).
    #[error("unknown protocol version {0}")]
    UnknownProtocolVersion(u32),

    /// A system message frame didn't match the `@id\\vkey\\vvalue` shape
    /// (spec §4.3).
    #[error("malformed system message: {0}")]
    MalformedSystemMessage(String),

    /// A system message name has no registered identifier code.
    #[error("unknown system message name {0:?}")]
    UnknownSystemMessageName(String),

    /// A wildcard-targeted registration requested a specific numeric
    /// definition version; only `*`/`raw` are meaningful against every
    /// opcode at once (spec §4.1).
    #[error("wildcard hooks cannot request a specific definition version")]
    WildcardForbidsExactVersion,

    /// The requested definition version is older than the latest one the
    /// codec knows for this message (spec §4.1).
    #[error("definition version {requested} for {name:?} is obsolete; latest known is {latest}")]
    ObsoleteDefinition {
        /// Message name being registered against.
        name: String,
        /// The version the caller requested.
        requested: u32,
        /// The newest version the codec actually has a schema for.
        latest: u32,
    },

    /// The requested definition version is newer than, or otherwise unknown
    /// to, the codec (spec §4.1).
    #[error("definition version {requested} for {name:?} is unknown to the codec")]
    UnknownDefinition {
        /// Message name being registered against.
        name: String,
        /// The version the caller requested.
        requested: u32,
    },

    /// Wire framing failed.
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// Codec parse/write failed.
    #[error(transparent)]
    Codec(#[from] CodecError),
}
