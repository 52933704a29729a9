//! Hook registry, handler pipeline, dispatch facade, and module host for a
//! transparent, pluggable interception layer over a bidirectional,
//! length-prefixed binary message stream.
//!
//! A hosting application supplies a [`interceptor_proto::CodecRegistry`]
//! and [`interceptor_proto::SystemMessageTable`] describing its particular
//! message set, builds one [`Dispatch`] per connection, and feeds every
//! frame it sees in either direction through [`Dispatch::write`]. Modules —
//! independently loadable bundles of hooks — register through
//! [`ModuleHost`] rather than touching the hook registry directly, so their
//! hooks can be torn down as a unit on unload.

#![forbid(unsafe_code)]
#![deny(missing_docs)]

pub mod dispatch;
pub mod env;
pub mod error;
pub mod hook;
pub mod module;
pub mod pipeline;
pub mod registry;
pub mod system_message;

pub use dispatch::{Dispatch, DispatchAction};
pub use env::Environment;
pub use error::DispatchError;
pub use hook::{HookId, HookInvocation, HookOptions, HookResult};
pub use module::{Module, ModuleHost, Wrapper};
pub use pipeline::HandleOutcome;
pub use registry::{ExpiredHook, HookCallback, HookRegistry, OrderedHook};
pub use system_message::SystemMessage;
