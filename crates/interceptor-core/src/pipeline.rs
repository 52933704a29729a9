//! The Handler Pipeline: `handle()` runs every hook matching one frame's
//! opcode, in dispatch order, against a single per-invocation parse cache.

use std::collections::HashMap;

use bytes::Bytes;
use interceptor_proto::{CodecRegistry, DefVersion, FrameFlags};
use tracing::{debug, error, trace};

use crate::{
    error::DispatchError,
    hook::{HookInvocation, HookResult},
    registry::{HookRegistry, OrderedHook},
};

/// The result of running the pipeline against one frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HandleOutcome {
    /// Final payload bytes after every hook has run, re-serialized as
    /// needed.
    pub bytes: Bytes,
    /// Final suppression state. The caller drops the frame entirely when
    /// `true` (spec §4.2 step 6).
    pub silenced: bool,
    /// Whether any hook mutated the payload this invocation.
    pub modified: bool,
}

/// Run the ordered hook list for one frame through to completion.
///
/// `name` is the message name `opcode` resolves to under `proto_version`, or
/// `None` if the codec has no mapping for it — in which case only raw hooks
/// (`def_version == Raw`) are ever invoked; event hooks targeting an
/// unmapped opcode are silently skipped rather than treated as an error,
/// since there is nothing to parse their payload into.
#[allow(clippy::too_many_arguments)]
pub fn handle(
    registry: &HookRegistry,
    codec: &dyn CodecRegistry,
    proto_version: u32,
    opcode: u16,
    name: Option<&str>,
    payload: Bytes,
    incoming: bool,
    fake: bool,
) -> Result<HandleOutcome, DispatchError> {
    let ordered = registry.ordered_for(opcode);

    if ordered.is_empty() {
        return Ok(HandleOutcome { bytes: payload, silenced: false, modified: false });
    }

    let resolved_versions = resolve_versions(codec, proto_version, name, &ordered);
    let last_consumer = last_consumer_indices(&resolved_versions);

    let original = payload.clone();
    let mut bytes = payload;
    let mut modified = false;
    let mut silenced = false;
    let mut cache = HashMap::new();

    for (index, hook) in ordered.iter().enumerate() {
        let snapshot = FrameFlags { fake, incoming, modified, silenced };
        if !hook.options.filter.matches(snapshot) {
            continue;
        }

        let Some(invocation) = build_invocation(
            codec,
            proto_version,
            opcode,
            name,
            &bytes,
            &mut cache,
            snapshot,
            hook.options.def_version,
            resolved_versions[index],
            last_consumer[index],
            &hook.namespace,
        ) else {
            continue;
        };

        let result = {
            let mut callback = hook.callback.borrow_mut();
            (callback)(invocation)
        };

        match result {
            HookResult::Pass => {},
            HookResult::Rewrite(new_bytes) => {
                if new_bytes != bytes {
                    trace!(namespace = %hook.namespace, opcode, "hook rewrote raw bytes");
                    bytes = new_bytes;
                    cache.clear();
                }
            },
            HookResult::Mutate(value) => {
                let (Some(version), Some(name)) = (resolved_versions[index], name) else { continue };
                match codec.write(proto_version, name, version, &value) {
                    Ok(new_bytes) => {
                        bytes = new_bytes;
                        cache.clear();
                        debug!(namespace = %hook.namespace, opcode, "hook mutated event, re-serialized");
                    },
                    Err(err) => {
                        error!(
                            namespace = %hook.namespace,
                            opcode,
                            name,
                            version,
                            error = %err,
                            bytes = %hex_dump(&bytes),
                            "hook mutation failed to re-serialize, leaving prior bytes in play"
                        );
                    },
                }
            },
            HookResult::Suppress(new_silenced) => {
                if new_silenced != silenced {
                    debug!(
                        namespace = %hook.namespace,
                        opcode,
                        silenced = new_silenced,
                        "suppression flipped"
                    );
                }
                silenced = new_silenced;
            },
        }

        modified = modified || (bytes != original);

        if hook.options.once {
            registry.unregister(hook.id);
        }
    }

    Ok(HandleOutcome { bytes, silenced, modified })
}

/// A short, bounded hex dump of `bytes` for error-path diagnostics (spec
/// §4.6): full payloads are never worth logging, just enough to recognize
/// the frame by eye.
fn hex_dump(bytes: &[u8]) -> String {
    const MAX: usize = 32;
    let (shown, truncated) = if bytes.len() > MAX { (&bytes[..MAX], true) } else { (bytes, false) };
    let mut out = shown.iter().fold(String::with_capacity(shown.len() * 2), |mut acc, byte| {
        use std::fmt::Write;
        let _ = write!(acc, "{byte:02x}");
        acc
    });
    if truncated {
        out.push_str("...");
    }
    out
}

/// Build the argument a single hook's callback is invoked with, parsing
/// (and caching) the payload if this is an event hook. Returns `None` when
/// the hook should be skipped entirely (event hook, unmapped opcode, or a
/// parse failure — logged here rather than propagated, so one hook's bad
/// schema never stops the rest of the pipeline, spec §4.2(e), §7).
#[allow(clippy::too_many_arguments)]
fn build_invocation(
    codec: &dyn CodecRegistry,
    proto_version: u32,
    opcode: u16,
    name: Option<&str>,
    bytes: &Bytes,
    cache: &mut HashMap<u32, interceptor_proto::Value>,
    flags: FrameFlags,
    def_version: DefVersion,
    resolved_version: Option<u32>,
    is_last_consumer: bool,
    namespace: &str,
) -> Option<HookInvocation> {
    if def_version.is_raw() {
        return Some(HookInvocation::Raw { opcode, bytes: bytes.clone(), flags });
    }

    let version = resolved_version?;
    let name = name?;

    if !cache.contains_key(&version) {
        match codec.parse(proto_version, name, version, bytes) {
            Ok(value) => {
                cache.insert(version, value);
            },
            Err(err) => {
                error!(
                    namespace,
                    opcode,
                    name,
                    version,
                    error = %err,
                    bytes = %hex_dump(bytes),
                    "hook parse failed, skipping this hook"
                );
                return None;
            },
        }
    }

    // Invariant: the branch above guarantees an entry exists for `version`
    // before either arm below runs.
    #[allow(clippy::expect_used)]
    let event = if is_last_consumer {
        cache.remove(&version).expect("parse cache populated for version above")
    } else {
        cache.get(&version).expect("parse cache populated for version above").clone()
    };

    Some(HookInvocation::Event { event, flags })
}

/// Resolve each hook's `def_version` to a concrete schema revision, or
/// `None` for raw hooks, event hooks whose opcode has no codec mapping, or
/// an event hook whose `Any` lookup failed (logged, then treated as
/// unmapped for this invocation). Done up front so [`last_consumer_indices`]
/// can see the whole ordered list at once (spec §4.2(d)).
fn resolve_versions(
    codec: &dyn CodecRegistry,
    proto_version: u32,
    name: Option<&str>,
    ordered: &[OrderedHook],
) -> Vec<Option<u32>> {
    ordered
        .iter()
        .map(|hook| match hook.options.def_version {
            DefVersion::Raw => None,
            DefVersion::Exact(version) => name.map(|_| version),
            DefVersion::Any => name.and_then(|name| match codec.latest_def_version(proto_version, name) {
                Ok(version) => Some(version),
                Err(err) => {
                    error!(namespace = %hook.namespace, name, error = %err, "could not resolve latest definition version, skipping hook");
                    None
                },
            }),
        })
        .collect()
}

/// For each index, is it the last hook in the statically ordered list that
/// targets the same resolved definition version? Raw hooks (`None`) never
/// count, since they never touch the cache (spec §4.2(d), §8 property 3).
fn last_consumer_indices(resolved_versions: &[Option<u32>]) -> Vec<bool> {
    let mut last_seen: HashMap<u32, usize> = HashMap::new();
    for (index, version) in resolved_versions.iter().enumerate() {
        if let Some(v) = version {
            last_seen.insert(*v, index);
        }
    }

    resolved_versions
        .iter()
        .enumerate()
        .map(|(index, version)| match version {
            Some(v) => last_seen.get(v) == Some(&index),
            None => false,
        })
        .collect()
}
