//! Fuzz target for `Frame::decode`.
//!
//! Arbitrary byte sequences must never panic, only return an error for
//! malformed headers, truncated payloads, or a declared length that doesn't
//! match the buffer.

#![no_main]

use interceptor_proto::Frame;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let _ = Frame::decode(data);
});
