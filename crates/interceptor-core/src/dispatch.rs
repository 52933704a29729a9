//! The Dispatch Facade: the single entry point a host application drives.
//!
//! Mirrors the action-returning shape of a sans-IO driver: `write` never
//! performs I/O itself, it decides what the host should do next and hands
//! back a list of [`DispatchAction`]s. A hook callback that synchronously
//! injects a frame (`write` with `fake = true`) gets its own action list
//! back immediately, independent of whatever invocation is already in
//! progress — this is what makes reentrancy safe (spec §5).

use std::cell::Cell;

use bytes::Bytes;
use interceptor_proto::{CodecRegistry, Frame, HookTarget, SystemMessageTable, is_version_probe};
use tracing::{info, warn};

use crate::{
    error::DispatchError,
    hook::HookOptions,
    pipeline::{self, HandleOutcome},
    registry::{HookCallback, HookRegistry},
    system_message::{self, SystemMessage},
};

/// What the host should do as a result of a [`Dispatch::write`] call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DispatchAction {
    /// Forward this complete wire frame onward.
    ///
    /// `incoming = true` means server → client; `false` means client →
    /// server. A `write` call whose final outcome was silenced produces no
    /// action at all rather than a variant carrying an empty frame.
    Forward {
        /// The frame to forward, with any hook-applied rewrites baked in.
        frame: Frame,
        /// Direction this frame travels.
        incoming: bool,
    },
}

/// Ties the Hook Registry and Handler Pipeline to a specific codec and
/// system message table, and tracks the negotiated protocol version for one
/// connection.
pub struct Dispatch<'a> {
    registry: HookRegistry,
    codec: &'a dyn CodecRegistry,
    system_messages: &'a dyn SystemMessageTable,
    proto_version: Cell<Option<u32>>,
}

impl<'a> Dispatch<'a> {
    /// Build a dispatch facade bound to a codec and system message table.
    /// No protocol version is negotiated yet.
    #[must_use]
    pub fn new(codec: &'a dyn CodecRegistry, system_messages: &'a dyn SystemMessageTable) -> Self {
        Self {
            registry: HookRegistry::new(),
            codec,
            system_messages,
            proto_version: Cell::new(None),
        }
    }

    /// Access the underlying hook registry, for module loading.
    #[must_use]
    pub fn registry(&self) -> &HookRegistry {
        &self.registry
    }

    /// The negotiated protocol version, if any.
    #[must_use]
    pub fn protocol_version(&self) -> Option<u32> {
        self.proto_version.get()
    }

    /// Explicitly set the negotiated protocol version.
    ///
    /// # Errors
    ///
    /// [`DispatchError::UnknownProtocolVersion`] if the codec has never
    /// heard of `version`.
    pub fn set_protocol_version(&self, version: u32) -> Result<(), DispatchError> {
        if !self.codec.has_protocol_version(version) {
            return Err(DispatchError::UnknownProtocolVersion(version));
        }
        info!(version, "protocol version negotiated");
        self.proto_version.set(Some(version));
        Ok(())
    }

    /// Drop the negotiated protocol version, returning the facade to its
    /// pre-handshake state. Registered hooks are untouched — modules stay
    /// loaded across reconnects (spec §4.4).
    pub fn reset(&self) {
        self.proto_version.set(None);
    }

    /// Register a raw or structured hook directly (bypassing module
    /// bookkeeping). Modules normally go through
    /// [`crate::module::ModuleHost`] instead, which tracks hooks by
    /// namespace for bulk unload.
    ///
    /// `now_millis` is the host's current tick; only consulted when
    /// `options.timeout` is set, to compute an absolute expiry (spec §4.1).
    pub fn register_hook(
        &self,
        namespace: impl Into<String>,
        target: HookTarget,
        options: HookOptions,
        now_millis: u64,
        callback: HookCallback,
    ) -> crate::hook::HookId {
        self.registry.register(namespace, target, options, now_millis, callback)
    }

    /// Register a hook by message name (or the wildcard), resolving it
    /// against the active codec and validating `options.def_version`
    /// before the hook ever reaches the registry (spec §4.1).
    ///
    /// `name` of `None` registers a wildcard hook; wildcard registrations
    /// forbid [`interceptor_proto::DefVersion::Exact`]. A named
    /// registration resolves against the negotiated protocol version, or
    /// the codec's first known version if none has been negotiated yet.
    ///
    /// # Errors
    ///
    /// - [`DispatchError::WildcardForbidsExactVersion`] for a wildcard
    ///   registration requesting an exact version.
    /// - [`DispatchError::Codec`] (wrapping [`interceptor_proto::CodecError::UnmappedName`])
    ///   if `name` doesn't resolve under the active protocol version.
    /// - [`DispatchError::ObsoleteDefinition`] if the requested version is
    ///   older than the codec's latest known schema for this message.
    /// - [`DispatchError::UnknownDefinition`] if the requested version is
    ///   newer than, or otherwise unknown to, the codec.
    pub fn register_named_hook(
        &self,
        namespace: impl Into<String>,
        name: Option<&str>,
        options: HookOptions,
        now_millis: u64,
        callback: HookCallback,
    ) -> Result<crate::hook::HookId, DispatchError> {
        let Some(name) = name else {
            if matches!(options.def_version, interceptor_proto::DefVersion::Exact(_)) {
                return Err(DispatchError::WildcardForbidsExactVersion);
            }
            return Ok(self.registry.register(namespace, HookTarget::Wildcard, options, now_millis, callback));
        };

        let proto_version =
            self.proto_version.get().unwrap_or_else(|| self.codec.first_known_version());
        let opcode = self.codec.resolve_name(proto_version, name)?;

        if let interceptor_proto::DefVersion::Exact(requested) = options.def_version {
            let latest = self.codec.latest_def_version(proto_version, name)?;
            if requested < latest {
                return Err(DispatchError::ObsoleteDefinition {
                    name: name.to_string(),
                    requested,
                    latest,
                });
            }
            if !self.codec.has_schema(proto_version, name, requested) {
                return Err(DispatchError::UnknownDefinition { name: name.to_string(), requested });
            }
        }

        Ok(self.registry.register(namespace, HookTarget::Opcode(opcode), options, now_millis, callback))
    }

    /// Fire every hook whose timer has expired at or before `now_millis`,
    /// invoking each with [`crate::hook::HookInvocation::Timeout`] exactly
    /// once and then discarding it (spec §4.1, §8 property 7). Intended to
    /// be driven from the host's periodic tick, the same way the ordered
    /// hook snapshot is driven from frame arrival.
    pub fn expire_timeouts(&self, now_millis: u64) {
        for expired in self.registry.expire_before(now_millis) {
            let mut callback = expired.callback.borrow_mut();
            let _ = (callback)(crate::hook::HookInvocation::Timeout);
            drop(callback);
            info!(namespace = %expired.namespace, "hook timed out");
        }
    }

    /// Process one complete wire frame traveling in direction `incoming`,
    /// running every matching hook and returning what the host should do
    /// next.
    ///
    /// `fake` marks a frame synthesized by a hook (via reentrant `write`)
    /// rather than one actually received from the wire; fake frames are
    /// invisible to hooks with the default filter (spec §3).
    ///
    /// Before a protocol version is negotiated, only the version-probe
    /// opcode is meaningful: its payload is a little-endian `u32` carrying
    /// the version the peer is announcing, which this call adopts via
    /// [`Self::set_protocol_version`] before running the pipeline against
    /// it (spec §4.2 step 1).
    pub fn write(
        &self,
        frame: &Frame,
        incoming: bool,
        fake: bool,
    ) -> Result<Vec<DispatchAction>, DispatchError> {
        let opcode = frame.opcode();

        if self.proto_version.get().is_none() {
            if is_version_probe(opcode) {
                self.adopt_probed_version(frame.payload())?;
            } else {
                warn!(opcode, "frame received before protocol version negotiated");
                return Err(DispatchError::ProtocolVersionNotNegotiated);
            }
        }

        let proto_version = match self.proto_version.get() {
            Some(version) => version,
            None => return Err(DispatchError::ProtocolVersionNotNegotiated),
        };

        let name = match self.codec.resolve_opcode(proto_version, opcode) {
            Ok(name) => Some(name),
            Err(_) => None,
        };

        let outcome: HandleOutcome = pipeline::handle(
            &self.registry,
            self.codec,
            proto_version,
            opcode,
            name.as_deref(),
            frame.payload(),
            incoming,
            fake,
        )?;

        if outcome.silenced {
            return Ok(Vec::new());
        }

        let out_frame = Frame::new(opcode, outcome.bytes)?;
        Ok(vec![DispatchAction::Forward { frame: out_frame, incoming }])
    }

    /// Parse a system message payload.
    ///
    /// # Errors
    ///
    /// See [`system_message::parse`].
    pub fn parse_system_message(&self, payload: &[u8]) -> Result<SystemMessage, DispatchError> {
        system_message::parse(self.system_messages, payload)
    }

    /// Build a system message payload.
    ///
    /// # Errors
    ///
    /// See [`system_message::build`].
    pub fn build_system_message(&self, name: &str, fields: &[&str]) -> Result<Bytes, DispatchError> {
        system_message::build(self.system_messages, name, fields).map(Bytes::from)
    }

    fn adopt_probed_version(&self, payload: Bytes) -> Result<(), DispatchError> {
        let bytes: [u8; 4] = payload
            .get(0..4)
            .and_then(|s| s.try_into().ok())
            .ok_or_else(|| DispatchError::MalformedSystemMessage("version probe too short".into()))?;
        let version = u32::from_le_bytes(bytes);

        if self.codec.has_protocol_version(version) {
            self.set_protocol_version(version)
        } else {
            // Fall back to the oldest known version rather than failing the
            // handshake outright, matching a permissive peer that probes
            // with an unrecognized version string.
            warn!(probed = version, "unrecognized probed version, falling back");
            self.set_protocol_version(self.codec.first_known_version())
        }
    }
}
