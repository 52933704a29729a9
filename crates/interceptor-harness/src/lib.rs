//! Test doubles for the interceptor dispatch core: an in-memory codec and
//! system-message table standing in for a generated protocol definition, and
//! a virtual clock for deterministic one-shot hook timeout tests.
//!
//! Integration tests (scenario S1–S7 and invariant property tests) live
//! under `tests/`.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod env;
pub mod fakes;

pub use env::VirtualClock;
pub use fakes::{FakeCodecRegistry, FakeSystemMessageTable};
