//! Hook registration records and the unified callback invocation shape.

use std::time::Duration;

use bytes::Bytes;
use interceptor_proto::{DefVersion, Filter, FrameFlags, Value};

/// Opaque handle returned by registration, used to `unregister` a hook.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct HookId(pub(crate) u64);

/// What a hook callback is being invoked with.
///
/// The source passes a hook callback one of three differently-shaped
/// argument sets depending on whether the hook asked for raw bytes, a parsed
/// event, or registered a one-shot timeout. Modeling that as one enum keeps
/// every hook callback the same Rust type regardless of which shape its
/// registration requested.
#[derive(Debug, Clone)]
pub enum HookInvocation {
    /// The hook's `def_version` was [`DefVersion::Raw`]: no parsing occurred.
    Raw {
        /// The frame's opcode.
        opcode: u16,
        /// The frame's payload bytes.
        bytes: Bytes,
        /// Flag snapshot at the moment of invocation.
        flags: FrameFlags,
    },
    /// The hook's `def_version` was [`DefVersion::Exact`] or
    /// [`DefVersion::Any`]: the payload was parsed before invocation.
    Event {
        /// The parsed message.
        event: Value,
        /// Flag snapshot at the moment of invocation.
        flags: FrameFlags,
    },
    /// A one-shot hook's timer expired before a matching frame arrived
    /// (spec §4.1).
    Timeout,
}

/// What a hook callback may hand back to the pipeline.
///
/// Mutation and suppression are independent outcomes a single callback may
/// return only one of per invocation: a callback edits the payload
/// ([`HookResult::Rewrite`] or [`HookResult::Mutate`]) or asks the pipeline
/// to flip suppression ([`HookResult::Suppress`]), never both from one
/// return value. A callback that needs both schedules the second as a
/// reentrant `write` instead.
#[derive(Debug, Clone, PartialEq)]
pub enum HookResult {
    /// No action; the frame passes through unchanged and suppression is
    /// untouched.
    Pass,
    /// Replace the frame's raw payload bytes outright. Only meaningful for
    /// raw hooks (`def_version == Raw`); invalidates the parse cache since
    /// the underlying bytes changed (spec §4.2(d)).
    Rewrite(Bytes),
    /// Replace the parsed event. The pipeline re-serializes it via the
    /// codec, invalidates the parse cache for this invocation so later
    /// hooks reparse fresh data, and marks the frame modified (spec
    /// §4.2(d), §8 property 4). Only meaningful for event hooks.
    Mutate(Value),
    /// Force the `silenced` flag to this value for every subsequent hook in
    /// this invocation and for the final emitted outcome. May flip either
    /// direction: a later hook's `Suppress(false)` un-silences a frame an
    /// earlier hook silenced (spec §8 property 5).
    Suppress(bool),
}

/// Registration-time options controlling ordering, filtering, schema
/// version, and one-shot expiry.
#[derive(Debug, Clone)]
pub struct HookOptions {
    /// Sort key among hooks sharing a target; lower runs first. Ties are
    /// broken by registration order, with wildcard hooks winning ties
    /// against opcode-specific hooks (spec §4.1, §8 property 1).
    pub order: i32,
    /// Frame-state predicate gating whether this hook sees a given
    /// invocation.
    pub filter: Filter,
    /// Which schema revision (or raw/any) this hook wants its payload
    /// presented as.
    pub def_version: DefVersion,
    /// If set, the hook fires at most once: either on its first matching
    /// frame, or when this duration elapses first, whichever happens
    /// first (spec §4.1).
    pub timeout: Option<Duration>,
    /// If true, the hook is removed immediately after its first invocation
    /// regardless of outcome.
    pub once: bool,
}

impl Default for HookOptions {
    fn default() -> Self {
        Self {
            order: 0,
            filter: Filter::default(),
            def_version: DefVersion::Raw,
            timeout: None,
            once: false,
        }
    }
}

