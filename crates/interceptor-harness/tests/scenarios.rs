//! Literal end-to-end scenarios S1-S7.

use std::{cell::RefCell, rc::Rc, time::Duration};

use bytes::Bytes;
use interceptor_core::{
    Dispatch, DispatchAction, HookInvocation, HookOptions, HookResult, Module, ModuleHost, Wrapper,
};
use interceptor_harness::{FakeCodecRegistry, FakeSystemMessageTable, VirtualClock};
use interceptor_proto::{DefVersion, Frame, HookTarget, Value};

fn negotiated_dispatch(codec: &FakeCodecRegistry, table: &FakeSystemMessageTable) -> Dispatch<'_> {
    let dispatch = Dispatch::new(codec, table);
    dispatch.set_protocol_version(1).unwrap();
    dispatch
}

/// S1: a raw hook on an unmapped opcode observes the literal scenario bytes
/// unchanged, and the invocation leaves `modified`/`silenced` both false.
#[test]
fn s1_raw_hook_sees_wire_bytes_unchanged() {
    let codec = FakeCodecRegistry::new().with_version(1);
    let table = FakeSystemMessageTable::new();
    let dispatch = negotiated_dispatch(&codec, &table);

    let seen = Rc::new(RefCell::new(None));
    let seen_clone = Rc::clone(&seen);
    dispatch.register_hook(
        "s1",
        HookTarget::Opcode(0x1234),
        HookOptions::default(),
        0,
        Box::new(move |invocation| {
            if let HookInvocation::Raw { opcode, bytes, flags } = invocation {
                *seen_clone.borrow_mut() = Some((opcode, bytes, flags.incoming, flags.fake));
            }
            HookResult::Pass
        }),
    );

    let frame = Frame::decode(Bytes::from_static(&[0x06, 0x00, 0x34, 0x12, 0xAA, 0xBB])).unwrap();
    let actions = dispatch.write(&frame, true, false).unwrap();

    let (opcode, bytes, incoming, fake) = seen.borrow_mut().take().expect("hook ran");
    assert_eq!(opcode, 0x1234);
    assert_eq!(bytes, Bytes::from_static(&[0xAA, 0xBB]));
    assert!(incoming);
    assert!(!fake);

    let DispatchAction::Forward { frame: out, .. } = &actions[0];
    assert_eq!(out.payload(), Bytes::from_static(&[0xAA, 0xBB]));
}

/// S2: a non-committing hook's locally-built event never reaches a later
/// hook — it only ever sees the clone the pipeline handed it.
#[test]
fn s2_non_committing_mutation_is_invisible_to_later_hook() {
    let codec = FakeCodecRegistry::new().with_version(1).with_message(1, "demo", 0x10, vec![1]);
    let table = FakeSystemMessageTable::new();
    let dispatch = negotiated_dispatch(&codec, &table);

    dispatch.register_hook(
        "h1",
        HookTarget::Opcode(0x10),
        HookOptions { order: 10, def_version: DefVersion::Exact(1), ..HookOptions::default() },
        0,
        Box::new(|invocation| {
            let HookInvocation::Event { event, .. } = invocation else { panic!("expected event") };
            // Build a locally-mutated copy but never commit it.
            let _locally_mutated = Value::Map(vec![("len".into(), Value::from(999i64))]);
            let _ = event;
            HookResult::Pass
        }),
    );

    let seen = Rc::new(RefCell::new(None));
    let seen_clone = Rc::clone(&seen);
    dispatch.register_hook(
        "h2",
        HookTarget::Opcode(0x10),
        HookOptions { order: 20, def_version: DefVersion::Exact(1), ..HookOptions::default() },
        0,
        Box::new(move |invocation| {
            let HookInvocation::Event { event, .. } = invocation else { panic!("expected event") };
            *seen_clone.borrow_mut() = Some(event);
            HookResult::Pass
        }),
    );

    let frame = Frame::new(0x10, Bytes::from_static(b"xx")).unwrap();
    dispatch.write(&frame, true, false).unwrap();

    let event = seen.borrow_mut().take().expect("h2 ran");
    assert_eq!(event.get("len"), Some(&Value::from(2i64)));
}

/// S3: a committing hook's re-serialized bytes are what the next hook
/// freshly parses.
#[test]
fn s3_commit_forces_later_hook_to_reparse() {
    let codec = FakeCodecRegistry::new().with_version(1).with_message(1, "demo", 0x10, vec![1]);
    let table = FakeSystemMessageTable::new();
    let dispatch = negotiated_dispatch(&codec, &table);

    dispatch.register_hook(
        "h1",
        HookTarget::Opcode(0x10),
        HookOptions { order: 10, def_version: DefVersion::Exact(1), ..HookOptions::default() },
        0,
        Box::new(|invocation| {
            let HookInvocation::Event { .. } = invocation else { panic!("expected event") };
            HookResult::Mutate(Value::Map(vec![("len".into(), Value::from(7i64))]))
        }),
    );

    let seen = Rc::new(RefCell::new(None));
    let seen_clone = Rc::clone(&seen);
    dispatch.register_hook(
        "h2",
        HookTarget::Opcode(0x10),
        HookOptions { order: 20, def_version: DefVersion::Exact(1), ..HookOptions::default() },
        0,
        Box::new(move |invocation| {
            let HookInvocation::Event { event, .. } = invocation else { panic!("expected event") };
            *seen_clone.borrow_mut() = Some(event);
            HookResult::Pass
        }),
    );

    let frame = Frame::new(0x10, Bytes::from_static(b"xx")).unwrap();
    let actions = dispatch.write(&frame, true, false).unwrap();

    let event = seen.borrow_mut().take().expect("h2 ran");
    assert_eq!(event.get("len"), Some(&Value::from(7i64)));

    let DispatchAction::Forward { frame: out, .. } = &actions[0];
    assert_eq!(out.payload().len(), 7);
}

/// S4: a hook suppressing a frame makes `write` produce no action.
#[test]
fn s4_suppression_drops_the_frame() {
    let codec = FakeCodecRegistry::new().with_version(1);
    let table = FakeSystemMessageTable::new();
    let dispatch = negotiated_dispatch(&codec, &table);

    dispatch.register_hook(
        "s4",
        HookTarget::Opcode(0x20),
        HookOptions::default(),
        0,
        Box::new(|_| HookResult::Suppress(true)),
    );

    let frame = Frame::new(0x20, Bytes::from_static(b"z")).unwrap();
    let actions = dispatch.write(&frame, true, false).unwrap();
    assert!(actions.is_empty());
}

/// S5: a wildcard hook wins a tied `order` against an opcode-specific hook.
#[test]
fn s5_wildcard_wins_order_tie() {
    let codec = FakeCodecRegistry::new().with_version(1);
    let table = FakeSystemMessageTable::new();
    let dispatch = negotiated_dispatch(&codec, &table);

    let order_seen = Rc::new(RefCell::new(Vec::new()));

    let specific = Rc::clone(&order_seen);
    dispatch.register_hook(
        "specific",
        HookTarget::Opcode(0x30),
        HookOptions { order: 5, ..HookOptions::default() },
        0,
        Box::new(move |_| {
            specific.borrow_mut().push("specific");
            HookResult::Pass
        }),
    );

    let wildcard = Rc::clone(&order_seen);
    dispatch.register_hook(
        "wildcard",
        HookTarget::Wildcard,
        HookOptions { order: 5, ..HookOptions::default() },
        0,
        Box::new(move |_| {
            wildcard.borrow_mut().push("wildcard");
            HookResult::Pass
        }),
    );

    let frame = Frame::new(0x30, Bytes::new()).unwrap();
    dispatch.write(&frame, true, false).unwrap();

    assert_eq!(*order_seen.borrow(), vec!["wildcard", "specific"]);
}

/// S6: a version-probe frame negotiates the protocol version before any
/// other frame can be processed.
#[test]
fn s6_version_probe_negotiates() {
    let codec = FakeCodecRegistry::new().with_version(1).with_version(2);
    let table = FakeSystemMessageTable::new();
    let dispatch = Dispatch::new(&codec, &table);

    assert_eq!(dispatch.protocol_version(), None);

    let probe =
        Frame::new(interceptor_proto::C_CHECK_VERSION, Bytes::copy_from_slice(&2u32.to_le_bytes()))
            .unwrap();
    dispatch.write(&probe, true, false).unwrap();

    assert_eq!(dispatch.protocol_version(), Some(2));
}

/// S7: unloading a module removes every hook it registered; a subsequent
/// matching frame invokes none of them.
#[test]
fn s7_unload_removes_module_hooks() {
    struct TwoHookModule;
    impl Module for TwoHookModule {
        fn load(&mut self, wrapper: &Wrapper<'_>) -> Result<(), interceptor_core::DispatchError> {
            wrapper.register_hook(
                HookTarget::Opcode(0x40),
                HookOptions::default(),
                Box::new(|_| panic!("should never run after unload")),
            );
            wrapper.register_hook(
                HookTarget::Opcode(0x40),
                HookOptions { order: 1, ..HookOptions::default() },
                Box::new(|_| panic!("should never run after unload")),
            );
            Ok(())
        }
    }

    let codec = FakeCodecRegistry::new().with_version(1);
    let table = FakeSystemMessageTable::new();
    let dispatch = negotiated_dispatch(&codec, &table);
    let host = ModuleHost::new();
    let mut module = TwoHookModule;

    host.load(&dispatch, "two-hook", 0, &mut module).unwrap();
    assert_eq!(dispatch.registry().len(), 2);

    host.unload(&dispatch, "two-hook", &mut module).unwrap();
    assert!(dispatch.registry().is_empty());

    let frame = Frame::new(0x40, Bytes::new()).unwrap();
    let actions = dispatch.write(&frame, true, false).unwrap();
    let DispatchAction::Forward { frame: out, .. } = &actions[0];
    assert_eq!(out.payload(), Bytes::new());
}

/// S8: a one-shot hook whose timer expires before any matching frame
/// arrives fires exactly once with `HookInvocation::Timeout`, driven by a
/// virtual clock advanced past its deadline, and is gone from the registry
/// afterward.
#[test]
fn s8_timeout_fires_once_and_removes_the_hook() {
    let clock = VirtualClock::new();
    let codec = FakeCodecRegistry::new().with_version(1);
    let table = FakeSystemMessageTable::new();
    let dispatch = negotiated_dispatch(&codec, &table);

    let fired = Rc::new(RefCell::new(0u32));
    let fired_clone = Rc::clone(&fired);
    dispatch.register_hook(
        "s8",
        HookTarget::Opcode(0x50),
        HookOptions { timeout: Some(Duration::from_millis(100)), ..HookOptions::default() },
        clock.now_millis(),
        Box::new(move |invocation| {
            assert!(matches!(invocation, HookInvocation::Timeout));
            *fired_clone.borrow_mut() += 1;
            HookResult::Pass
        }),
    );
    assert_eq!(dispatch.registry().len(), 1);

    // Not yet due: no callback runs.
    clock.advance(Duration::from_millis(50));
    dispatch.expire_timeouts(clock.now_millis());
    assert_eq!(*fired.borrow(), 0);
    assert_eq!(dispatch.registry().len(), 1);

    // Past the deadline: fires exactly once and is removed.
    clock.advance(Duration::from_millis(60));
    dispatch.expire_timeouts(clock.now_millis());
    assert_eq!(*fired.borrow(), 1);
    assert!(dispatch.registry().is_empty());

    // A later tick does not fire it again.
    clock.advance(Duration::from_millis(1000));
    dispatch.expire_timeouts(clock.now_millis());
    assert_eq!(*fired.borrow(), 1);
}
