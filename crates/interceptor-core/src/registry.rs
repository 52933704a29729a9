//! The Hook Registry: ordered storage and lookup for registered hooks.
//!
//! A hook's callback is wrapped in its own `Rc<RefCell<_>>` rather than
//! living directly inside the registry's backing `Vec`. That lets the
//! pipeline release its borrow of the `Vec` before invoking any callback, so
//! a callback that reenters the dispatch facade (spec §5: a hook's callback
//! calling `write(fake=true)` synchronously) only ever contends with its own
//! per-hook cell, never with the registry's bookkeeping borrow. Concretely:
//! [`HookRegistry::ordered_for`] takes a short immutable borrow to clone out
//! an ordered snapshot of metadata and callback handles, then releases it;
//! the caller invokes callbacks against the cloned handles afterward.
use std::{
    cell::{Cell, RefCell},
    rc::Rc,
};

use interceptor_proto::HookTarget;

use crate::hook::{HookId, HookInvocation, HookOptions, HookResult};

/// A hook callback: given an invocation, produce a result.
///
/// Boxed rather than generic because the registry stores a heterogeneous
/// collection of hooks registered by different modules.
pub type HookCallback = Box<dyn FnMut(HookInvocation) -> HookResult>;

/// Metadata plus a shared handle to a hook's callback, as handed out by
/// [`HookRegistry::ordered_for`].
pub struct OrderedHook {
    /// Registration handle, for `unregister`.
    pub id: HookId,
    /// Namespace this hook was registered under.
    pub namespace: String,
    /// The target this hook matched on (opcode or wildcard).
    pub target: HookTarget,
    /// Registration options (filter, def_version, order, timeout).
    pub options: HookOptions,
    /// Shared, independently-borrowable callback cell.
    pub callback: Rc<RefCell<HookCallback>>,
}

/// Storage and ordered lookup for registered hooks.
///
/// Not `Sync`: a registry is owned by exactly one [`crate::dispatch::Dispatch`]
/// instance and driven from a single logical thread of control, matching the
/// source's single-threaded event loop (spec §5).
#[derive(Default)]
pub struct HookRegistry {
    hooks: RefCell<Vec<HookSlot>>,
    next_id: Cell<u64>,
    next_sequence: Cell<u64>,
}

struct HookSlot {
    id: HookId,
    namespace: String,
    target: HookTarget,
    options: HookOptions,
    sequence: u64,
    /// Absolute expiry, in the host's millisecond tick, if this hook was
    /// registered with `options.timeout` set (spec §4.1).
    deadline: Option<u64>,
    callback: Rc<RefCell<HookCallback>>,
}

/// A hook whose timer expired, as handed out by [`HookRegistry::expire_before`].
pub struct ExpiredHook {
    /// Registration handle of the expired hook.
    pub id: HookId,
    /// Namespace it was registered under.
    pub namespace: String,
    /// Its callback, ready for a single [`HookInvocation::Timeout`] call.
    pub callback: Rc<RefCell<HookCallback>>,
}

impl HookRegistry {
    /// Build an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a hook, returning its handle.
    ///
    /// `now_millis` is the host's current tick, used only to compute an
    /// absolute deadline when `options.timeout` is set; it is ignored
    /// otherwise, so passing `0` is harmless for non-expiring hooks.
    pub fn register(
        &self,
        namespace: impl Into<String>,
        target: HookTarget,
        options: HookOptions,
        now_millis: u64,
        callback: HookCallback,
    ) -> HookId {
        let id = HookId(self.next_id.get());
        self.next_id.set(id.0 + 1);

        let sequence = self.next_sequence.get();
        self.next_sequence.set(sequence + 1);

        let deadline = options.timeout.map(|timeout| {
            let millis = u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX);
            now_millis.saturating_add(millis)
        });

        self.hooks.borrow_mut().push(HookSlot {
            id,
            namespace: namespace.into(),
            target,
            options,
            sequence,
            deadline,
            callback: Rc::new(RefCell::new(callback)),
        });

        id
    }

    /// Remove and return every hook whose deadline is at or before
    /// `now_millis`, in no particular order. The caller invokes each one's
    /// callback with [`crate::hook::HookInvocation::Timeout`] exactly once
    /// (spec §4.1, §8 property 7); removing them here first guarantees a
    /// frame arriving in the same tick can no longer also fire them.
    #[must_use]
    pub fn expire_before(&self, now_millis: u64) -> Vec<ExpiredHook> {
        let mut hooks = self.hooks.borrow_mut();
        let mut expired = Vec::new();
        hooks.retain(|slot| match slot.deadline {
            Some(deadline) if deadline <= now_millis => {
                expired.push(ExpiredHook {
                    id: slot.id,
                    namespace: slot.namespace.clone(),
                    callback: Rc::clone(&slot.callback),
                });
                false
            },
            _ => true,
        });
        expired
    }

    /// Remove a single hook by handle. Returns `true` if it was present.
    ///
    /// Safe to call for a hook currently executing: removing it from the
    /// backing `Vec` does not affect a snapshot already taken by
    /// [`Self::ordered_for`] (spec §5).
    pub fn unregister(&self, id: HookId) -> bool {
        let mut hooks = self.hooks.borrow_mut();
        let before = hooks.len();
        hooks.retain(|slot| slot.id != id);
        hooks.len() != before
    }

    /// Remove every hook registered under `namespace`, returning their
    /// handles (used by module unload, spec §4.4).
    pub fn unregister_namespace(&self, namespace: &str) -> Vec<HookId> {
        let mut hooks = self.hooks.borrow_mut();
        let mut removed = Vec::new();
        hooks.retain(|slot| {
            if slot.namespace == namespace {
                removed.push(slot.id);
                false
            } else {
                true
            }
        });
        removed
    }

    /// Snapshot every hook matching `opcode`, in dispatch order: ascending
    /// `order`, wildcard winning ties against an opcode-specific hook at the
    /// same `order`, and registration order breaking any remaining tie
    /// (spec §4.1, §8 property 1).
    #[must_use]
    pub fn ordered_for(&self, opcode: u16) -> Vec<OrderedHook> {
        let hooks = self.hooks.borrow();

        let mut matches: Vec<&HookSlot> = hooks
            .iter()
            .filter(|slot| match slot.target {
                HookTarget::Opcode(op) => op == opcode,
                HookTarget::Wildcard => true,
            })
            .collect();

        matches.sort_by(|a, b| {
            a.options
                .order
                .cmp(&b.options.order)
                .then_with(|| wildcard_rank(a.target).cmp(&wildcard_rank(b.target)))
                .then_with(|| a.sequence.cmp(&b.sequence))
        });

        matches
            .into_iter()
            .map(|slot| OrderedHook {
                id: slot.id,
                namespace: slot.namespace.clone(),
                target: slot.target,
                options: slot.options.clone(),
                callback: Rc::clone(&slot.callback),
            })
            .collect()
    }

    /// Number of currently registered hooks, across all namespaces.
    #[must_use]
    pub fn len(&self) -> usize {
        self.hooks.borrow().len()
    }

    /// Whether the registry currently holds no hooks.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.hooks.borrow().is_empty()
    }
}

/// Wildcard hooks sort before opcode-specific hooks at equal `order`.
fn wildcard_rank(target: HookTarget) -> u8 {
    match target {
        HookTarget::Wildcard => 0,
        HookTarget::Opcode(_) => 1,
    }
}

#[cfg(test)]
mod tests {
    use interceptor_proto::Filter;

    use super::*;

    fn noop_options(order: i32) -> HookOptions {
        HookOptions { order, filter: Filter::default(), ..HookOptions::default() }
    }

    #[test]
    fn orders_by_ascending_order_field() {
        let registry = HookRegistry::new();
        registry.register("a", HookTarget::Opcode(1), noop_options(5), 0, Box::new(|_| HookResult::Pass));
        registry.register("a", HookTarget::Opcode(1), noop_options(1), 0, Box::new(|_| HookResult::Pass));
        registry.register("a", HookTarget::Opcode(1), noop_options(3), 0, Box::new(|_| HookResult::Pass));

        let ordered = registry.ordered_for(1);
        let orders: Vec<i32> = ordered.iter().map(|h| h.options.order).collect();
        assert_eq!(orders, vec![1, 3, 5]);
    }

    #[test]
    fn wildcard_wins_ties_against_opcode_specific() {
        let registry = HookRegistry::new();
        registry.register("a", HookTarget::Opcode(7), noop_options(0), 0, Box::new(|_| HookResult::Pass));
        registry.register("a", HookTarget::Wildcard, noop_options(0), 0, Box::new(|_| HookResult::Pass));

        let ordered = registry.ordered_for(7);
        assert_eq!(ordered.len(), 2);
        assert_eq!(ordered[0].target, HookTarget::Wildcard);
        assert_eq!(ordered[1].target, HookTarget::Opcode(7));
    }

    #[test]
    fn registration_order_breaks_remaining_ties() {
        let registry = HookRegistry::new();
        let first = registry.register(
            "a",
            HookTarget::Opcode(1),
            noop_options(0),
            0,
            Box::new(|_| HookResult::Pass),
        );
        let second = registry.register(
            "a",
            HookTarget::Opcode(1),
            noop_options(0),
            0,
            Box::new(|_| HookResult::Pass),
        );

        let ordered = registry.ordered_for(1);
        assert_eq!(ordered[0].id, first);
        assert_eq!(ordered[1].id, second);
    }

    #[test]
    fn unregister_removes_exactly_one_hook() {
        let registry = HookRegistry::new();
        let id = registry.register(
            "a",
            HookTarget::Opcode(1),
            noop_options(0),
            0,
            Box::new(|_| HookResult::Pass),
        );
        assert_eq!(registry.len(), 1);
        assert!(registry.unregister(id));
        assert!(registry.is_empty());
        assert!(!registry.unregister(id));
    }

    #[test]
    fn unregister_namespace_removes_all_matching_hooks() {
        let registry = HookRegistry::new();
        registry.register("mod-a", HookTarget::Opcode(1), noop_options(0), 0, Box::new(|_| HookResult::Pass));
        registry.register("mod-a", HookTarget::Opcode(2), noop_options(0), 0, Box::new(|_| HookResult::Pass));
        registry.register("mod-b", HookTarget::Opcode(3), noop_options(0), 0, Box::new(|_| HookResult::Pass));

        let removed = registry.unregister_namespace("mod-a");
        assert_eq!(removed.len(), 2);
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn ordered_for_ignores_non_matching_opcodes() {
        let registry = HookRegistry::new();
        registry.register("a", HookTarget::Opcode(1), noop_options(0), 0, Box::new(|_| HookResult::Pass));

        assert!(registry.ordered_for(2).is_empty());
    }

    #[test]
    fn snapshot_is_independent_of_later_unregister() {
        let registry = HookRegistry::new();
        let id = registry.register(
            "a",
            HookTarget::Opcode(1),
            noop_options(0),
            0,
            Box::new(|_| HookResult::Pass),
        );

        let snapshot = registry.ordered_for(1);
        registry.unregister(id);

        // The snapshot already taken still references the callback cell.
        assert_eq!(snapshot.len(), 1);
        assert!(registry.is_empty());
    }
}
