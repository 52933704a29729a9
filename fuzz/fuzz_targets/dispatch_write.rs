//! Fuzz target for `Dispatch::write` end to end: arbitrary frames run through
//! version negotiation, opcode resolution, and a registered hook must never
//! panic, regardless of how malformed the payload or how the hook decides
//! to respond.

#![no_main]

use arbitrary::Arbitrary;
use interceptor_core::{Dispatch, HookOptions, HookResult};
use interceptor_harness::fakes::{FakeCodecRegistry, FakeSystemMessageTable};
use interceptor_proto::{Frame, HookTarget};
use libfuzzer_sys::fuzz_target;

#[derive(Debug, Arbitrary)]
struct Input {
    probe_version: u32,
    opcode: u16,
    payload: Vec<u8>,
    incoming: bool,
    hook_rewrite: Vec<u8>,
    hook_suppress: bool,
}

fuzz_target!(|input: Input| {
    let codec = FakeCodecRegistry::new()
        .with_version(1)
        .with_message(1, "chat", 0x0100, vec![1, 2])
        .with_message(1, "ping", 0x0200, vec![1]);
    let table = FakeSystemMessageTable::new().with_entry("hello", 1);
    let dispatch = Dispatch::new(&codec, &table);

    let Ok(probe) = Frame::new(interceptor_proto::C_CHECK_VERSION, input.probe_version.to_le_bytes().to_vec()) else {
        return;
    };
    if dispatch.write(&probe, true, false).is_err() {
        return;
    }

    let suppress = input.hook_suppress;
    let rewrite = input.hook_rewrite.clone();
    dispatch.register_hook(
        "fuzz",
        HookTarget::Wildcard,
        HookOptions::default(),
        0,
        Box::new(move |_invocation| {
            if suppress {
                HookResult::Suppress(true)
            } else if !rewrite.is_empty() {
                HookResult::Rewrite(bytes::Bytes::from(rewrite.clone()))
            } else {
                HookResult::Pass
            }
        }),
    );

    let Ok(frame) = Frame::new(input.opcode, input.payload) else {
        return;
    };
    let _ = dispatch.write(&frame, input.incoming, false);
});
