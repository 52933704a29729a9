//! The Module Host: load/unload lifecycle for namespaced bundles of hooks
//! (spec §4.4).

use interceptor_proto::Frame;
use tracing::{error, info};

use crate::{
    dispatch::{Dispatch, DispatchAction},
    error::DispatchError,
    hook::HookId,
};

/// A loadable unit of hooks. Implementors register whatever hooks they need
/// against the [`Wrapper`] they're handed, and may tear down any non-hook
/// resources in [`Module::unload`].
pub trait Module {
    /// Register this module's hooks against `wrapper`.
    ///
    /// # Errors
    ///
    /// Any error aborts the load: every hook this call already registered
    /// is rolled back before the error reaches the caller (spec §4.4).
    fn load(&mut self, wrapper: &Wrapper<'_>) -> Result<(), DispatchError>;

    /// Release non-hook resources. Hooks are removed by the host
    /// automatically; this is for anything else (timers the module armed
    /// itself, open handles, etc.). Errors here are logged, not propagated —
    /// unload always completes (spec §4.4).
    fn unload(&mut self) {}
}

/// A namespaced façade over [`Dispatch`], handed to a [`Module`] during
/// [`ModuleHost::load`]. Forwards hook registration, manual unhook, and
/// frame synthesis to the underlying facade, tagging every hook it
/// registers with this module's namespace (spec §4.4, §6).
pub struct Wrapper<'a> {
    dispatch: &'a Dispatch<'a>,
    namespace: &'a str,
    now_millis: u64,
    registered: std::cell::RefCell<Vec<HookId>>,
}

impl<'a> Wrapper<'a> {
    fn new(dispatch: &'a Dispatch<'a>, namespace: &'a str, now_millis: u64) -> Self {
        Self { dispatch, namespace, now_millis, registered: std::cell::RefCell::new(Vec::new()) }
    }

    /// Register a hook under this module's namespace. Any `options.timeout`
    /// is measured from the `now_millis` the host passed to
    /// [`ModuleHost::load`], not from the moment of this call.
    pub fn register_hook(
        &self,
        target: interceptor_proto::HookTarget,
        options: crate::hook::HookOptions,
        callback: crate::registry::HookCallback,
    ) -> HookId {
        let id = self.dispatch.register_hook(self.namespace, target, options, self.now_millis, callback);
        self.registered.borrow_mut().push(id);
        id
    }

    /// Register a hook by message name (or `None` for wildcard), resolving
    /// and validating against the active codec before the hook reaches the
    /// registry. The entry point most modules should prefer over
    /// [`Self::register_hook`], which requires the opcode already resolved
    /// (spec §4.1, §4.4).
    ///
    /// # Errors
    ///
    /// See [`Dispatch::register_named_hook`].
    pub fn register_named_hook(
        &self,
        name: Option<&str>,
        options: crate::hook::HookOptions,
        callback: crate::registry::HookCallback,
    ) -> Result<HookId, DispatchError> {
        let id = self.dispatch.register_named_hook(
            self.namespace,
            name,
            options,
            self.now_millis,
            callback,
        )?;
        self.registered.borrow_mut().push(id);
        Ok(id)
    }

    /// Remove one of this module's own hooks before unload.
    ///
    /// Returns `false` if `id` was already removed or never belonged to
    /// this wrapper's namespace.
    pub fn unhook(&self, id: HookId) -> bool {
        let mut registered = self.registered.borrow_mut();
        let Some(position) = registered.iter().position(|existing| *existing == id) else {
            return false;
        };
        registered.remove(position);
        self.dispatch.registry().unregister(id)
    }

    /// Synthesize a frame as if it originated from this module, re-entering
    /// the handler pipeline (`fake = true`) so other hooks still observe it
    /// (spec §4.4, §6).
    ///
    /// # Errors
    ///
    /// See [`Dispatch::write`].
    pub fn write(&self, frame: &Frame, incoming: bool) -> Result<Vec<DispatchAction>, DispatchError> {
        self.dispatch.write(frame, incoming, true)
    }

    fn registered_ids(&self) -> Vec<HookId> {
        self.registered.borrow().clone()
    }
}

/// Tracks which module is currently loaded under which namespace and drives
/// the load/unload lifecycle.
#[derive(Default)]
pub struct ModuleHost {
    loaded: std::cell::RefCell<std::collections::HashSet<String>>,
}

impl ModuleHost {
    /// Build an empty module host.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Load `module` under `namespace`.
    ///
    /// # Errors
    ///
    /// [`DispatchError::ModuleAlreadyLoaded`] if `namespace` already has a
    /// module loaded. If the module's own `load` fails, every hook it
    /// registered before failing is unregistered and the error is
    /// propagated (spec §4.4).
    ///
    /// `now_millis` is the host's current tick, used as the reference point
    /// for any timed hooks this module registers during this call.
    pub fn load(
        &self,
        dispatch: &Dispatch<'_>,
        namespace: &str,
        now_millis: u64,
        module: &mut dyn Module,
    ) -> Result<(), DispatchError> {
        if self.loaded.borrow().contains(namespace) {
            return Err(DispatchError::ModuleAlreadyLoaded { namespace: namespace.to_string() });
        }

        let wrapper = Wrapper::new(dispatch, namespace, now_millis);

        match module.load(&wrapper) {
            Ok(()) => {
                self.loaded.borrow_mut().insert(namespace.to_string());
                info!(namespace, hooks = wrapper.registered_ids().len(), "module loaded");
                Ok(())
            },
            Err(err) => {
                for id in wrapper.registered_ids() {
                    dispatch.registry().unregister(id);
                }
                error!(namespace, error = %err, "module load failed, rolled back hooks");
                Err(DispatchError::ModuleLoad { namespace: namespace.to_string(), reason: err.to_string() })
            },
        }
    }

    /// Unload the module loaded under `namespace`: remove every hook it
    /// registered, then invoke its `unload` for any other cleanup.
    ///
    /// # Errors
    ///
    /// [`DispatchError::ModuleNotFound`] if no module is loaded under
    /// `namespace`.
    pub fn unload(
        &self,
        dispatch: &Dispatch<'_>,
        namespace: &str,
        module: &mut dyn Module,
    ) -> Result<(), DispatchError> {
        if !self.loaded.borrow_mut().remove(namespace) {
            return Err(DispatchError::ModuleNotFound { namespace: namespace.to_string() });
        }

        let removed = dispatch.registry().unregister_namespace(namespace);
        module.unload();
        info!(namespace, hooks = removed.len(), "module unloaded");
        Ok(())
    }

    /// Is a module currently loaded under `namespace`?
    #[must_use]
    pub fn is_loaded(&self, namespace: &str) -> bool {
        self.loaded.borrow().contains(namespace)
    }
}
