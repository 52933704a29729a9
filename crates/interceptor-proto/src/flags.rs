//! Frame flags and hook filters.
//!
//! The source implementation attaches a live, mutable flag view to the bytes
//! or event a callback sees, so a callback that reads `frame.modified` mid
//! pipeline observes whatever earlier hooks have done so far. We pass the
//! same information as an immutable snapshot instead: the pipeline builds a
//! [`FrameFlags`] value right before invoking a hook and hands it in
//! alongside the bytes or event. Reading "the current value, not a stale
//! snapshot" (spec §4.2 step 5) falls out naturally because a fresh snapshot
//! is built for every hook invocation.

/// Per-invocation state visible to a hook callback.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FrameFlags {
    /// Frame was synthesized via `write`, not received from the wire.
    pub fake: bool,
    /// Frame travels server → client.
    pub incoming: bool,
    /// A prior hook in this invocation has mutated the payload.
    pub modified: bool,
    /// A prior hook in this invocation has requested suppression.
    pub silenced: bool,
}

/// A tri-state predicate: match any value, or require a specific one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tri {
    /// Matches regardless of the flag's value.
    Any,
    /// Matches only when the flag equals this value.
    Required(bool),
}

impl Tri {
    /// Does `value` satisfy this predicate?
    #[must_use]
    pub fn matches(self, value: bool) -> bool {
        match self {
            Tri::Any => true,
            Tri::Required(expected) => expected == value,
        }
    }
}

impl Default for Tri {
    fn default() -> Self {
        Tri::Any
    }
}

impl From<bool> for Tri {
    fn from(value: bool) -> Self {
        Tri::Required(value)
    }
}

/// The four tri-state predicates a hook can register with.
///
/// Defaults match spec §3: a hook does not see frames it or its peers
/// injected (`fake = false`) and does not see already-suppressed frames
/// (`silenced = false`) unless it opts in explicitly.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Filter {
    /// Whether the frame must be (or must not be) fake.
    pub fake: Tri,
    /// Whether the frame must be (or must not be) inbound.
    pub incoming: Tri,
    /// Whether the frame must already be (or must not be) modified.
    pub modified: Tri,
    /// Whether the frame must already be (or must not be) silenced.
    pub silenced: Tri,
}

impl Default for Filter {
    fn default() -> Self {
        Self {
            fake: Tri::Required(false),
            incoming: Tri::Any,
            modified: Tri::Any,
            silenced: Tri::Required(false),
        }
    }
}

impl Filter {
    /// Does this filter admit a frame currently in the state `flags`?
    #[must_use]
    pub fn matches(self, flags: FrameFlags) -> bool {
        self.fake.matches(flags.fake)
            && self.incoming.matches(flags.incoming)
            && self.modified.matches(flags.modified)
            && self.silenced.matches(flags.silenced)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_filter_excludes_fake_and_silenced() {
        let filter = Filter::default();
        let fake_flags = FrameFlags { fake: true, ..Default::default() };
        assert!(!filter.matches(fake_flags));

        let silenced_flags = FrameFlags { silenced: true, ..Default::default() };
        assert!(!filter.matches(silenced_flags));

        assert!(filter.matches(FrameFlags::default()));
    }

    #[test]
    fn incoming_required_rejects_outgoing() {
        let filter = Filter { incoming: Tri::Required(true), ..Filter::default() };
        assert!(!filter.matches(FrameFlags { incoming: false, ..Default::default() }));
        assert!(filter.matches(FrameFlags { incoming: true, ..Default::default() }));
    }

    #[test]
    fn modified_required_rejects_unmodified() {
        let filter = Filter { modified: Tri::Required(true), ..Filter::default() };
        assert!(!filter.matches(FrameFlags::default()));
        assert!(filter.matches(FrameFlags { modified: true, ..Default::default() }));
    }
}
