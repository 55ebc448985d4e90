//! Fuzz harness for the presence payload decoders.
//!
//! Arbitrary bytes are parsed as JSON and fed to the engine as a full state,
//! then as a diff. Decoding must never panic, and a rejected payload must
//! leave membership untouched.

#![no_main]
use libfuzzer_sys::fuzz_target;
use roster_core::{PresenceEngine, PresenceEvent, decode};

fuzz_target!(|data: &[u8]| {
    let Ok(payload) = serde_json::from_slice::<serde_json::Value>(data) else {
        return;
    };

    let _ = decode::decode_presences(&payload);
    let _ = decode::decode_diff(&payload);
    let _ = decode::decode_device(&payload);
    let _ = decode::decode_chat_message(&payload);

    let mut engine = PresenceEngine::default();
    let before = engine.current_membership();
    if engine.handle(PresenceEvent::FullState(payload.clone())).is_err() {
        assert_eq!(engine.current_membership(), before);
        return;
    }

    let synced = engine.current_membership();
    if engine.handle(PresenceEvent::Diff(payload)).is_err() {
        assert_eq!(engine.current_membership(), synced);
    }

    let table = engine.current_membership();
    assert!(table.iter().all(|(_, devices)| !devices.is_empty()));
});
