//! End-to-end room flows.
//!
//! Drives a [`Room`] over a [`SimChannel`] the way a channel library would:
//! full state on join, diffs afterwards, custom events for chat messages,
//! and acknowledgments for pushed messages.

use roster_app::{Room, RoomConfig, RoomError, RoomEvent, RoomNotification};
use roster_core::{DispatchError, PresenceError};
use roster_harness::{
    Recorder, SimChannel,
    fixtures::{chat_message, device_record, fingerprint, presence_diff, presence_state},
};

fn setup() -> (Room<SimChannel>, Recorder) {
    let mut room = Room::new(SimChannel::new(), RoomConfig::default());
    let recorder = Recorder::new();
    room.subscribe(recorder.clone());
    room.handle(RoomEvent::Connected).unwrap();
    (room, recorder)
}

#[test]
fn alice_and_bob_come_and_go() {
    let (mut room, recorder) = setup();

    room.handle(RoomEvent::PresenceState(presence_state(&[(
        "alice",
        vec![device_record(1, "r1", 100)],
    )])))
    .unwrap();
    assert_eq!(room.membership().fingerprints("alice"), vec![fingerprint(1)]);
    assert_eq!(recorder.last_count(), Some(1));

    room.handle(RoomEvent::PresenceDiff(presence_diff(
        &[("bob", vec![device_record(2, "r2", 200)])],
        &[],
    )))
    .unwrap();
    assert_eq!(recorder.last_count(), Some(2));

    room.handle(RoomEvent::PresenceDiff(presence_diff(
        &[],
        &[("alice", vec![device_record(1, "r1", 100)])],
    )))
    .unwrap();

    let membership = room.membership();
    assert_eq!(membership.identities().collect::<Vec<_>>(), vec!["bob"]);
    assert_eq!(membership.fingerprints("bob"), vec![fingerprint(2)]);
    assert_eq!(recorder.last_count(), Some(1));
}

#[test]
fn join_and_leave_in_one_diff() {
    let (mut room, _recorder) = setup();
    room.handle(RoomEvent::PresenceState(presence_state(&[(
        "u1",
        vec![device_record(1, "r1", 1)],
    )])))
    .unwrap();

    room.handle(RoomEvent::PresenceDiff(presence_diff(
        &[("u1", vec![device_record(2, "r2", 2)])],
        &[("u1", vec![device_record(1, "r1", 1)])],
    )))
    .unwrap();

    assert_eq!(room.membership().fingerprints("u1"), vec![fingerprint(2)]);
}

#[test]
fn same_device_on_two_sessions_counts_once() {
    let (mut room, _recorder) = setup();
    room.handle(RoomEvent::PresenceState(presence_state(&[(
        "u1",
        vec![device_record(1, "tab-a", 1), device_record(1, "tab-b", 2)],
    )])))
    .unwrap();

    room.handle(RoomEvent::PresenceDiff(presence_diff(
        &[("u1", vec![device_record(1, "tab-c", 3)])],
        &[],
    )))
    .unwrap();

    let membership = room.membership();
    assert_eq!(membership.device_count(), 1);
    assert_eq!(membership.present_identity_count(), 1);
}

#[test]
fn diff_before_state_is_discarded() {
    let (mut room, recorder) = setup();

    let result = room.handle(RoomEvent::PresenceDiff(presence_diff(
        &[("u1", vec![device_record(1, "r1", 1)])],
        &[],
    )));

    assert_eq!(result, Err(RoomError::Presence(PresenceError::OutOfOrderDiff)));
    assert!(room.membership().is_empty());
    assert!(recorder.is_empty());
}

#[test]
fn reconnect_requires_fresh_state() {
    let (mut room, recorder) = setup();
    room.handle(RoomEvent::PresenceState(presence_state(&[(
        "u1",
        vec![device_record(1, "r1", 1)],
    )])))
    .unwrap();

    room.handle(RoomEvent::Disconnected).unwrap();
    assert_eq!(recorder.last_count(), Some(0));

    room.handle(RoomEvent::Connected).unwrap();
    let diff = presence_diff(&[("u2", vec![device_record(2, "r2", 2)])], &[]);
    assert!(room.handle(RoomEvent::PresenceDiff(diff.clone())).is_err());

    room.handle(RoomEvent::PresenceState(presence_state(&[]))).unwrap();
    room.handle(RoomEvent::PresenceDiff(diff)).unwrap();
    assert_eq!(room.present_identity_count(), 1);
}

#[test]
fn empty_identity_does_not_count() {
    let (mut room, recorder) = setup();
    room.handle(RoomEvent::PresenceState(presence_state(&[
        ("u1", vec![device_record(1, "r1", 1)]),
        ("u2", vec![]),
    ])))
    .unwrap();

    assert_eq!(recorder.last_count(), Some(1));
}

#[test]
fn chat_messages_are_logged_in_order() {
    let (mut room, recorder) = setup();

    for (sender, body) in [("alice", "hi"), ("bob", "hello"), ("alice", "bye")] {
        room.handle(RoomEvent::Message {
            event: "new:msg".into(),
            payload: chat_message(sender, body),
        })
        .unwrap();
    }
    room.handle(RoomEvent::Message {
        event: "new:msg".into(),
        payload: serde_json::json!({ "body": "no sender" }),
    })
    .unwrap();

    let bodies: Vec<&str> = room.messages().iter().map(|m| m.body.as_str()).collect();
    assert_eq!(bodies, vec!["hi", "hello", "bye"]);
    assert_eq!(
        recorder
            .notifications()
            .iter()
            .filter(|n| matches!(n, RoomNotification::RecordAppended(_)))
            .count(),
        3
    );
}

#[test]
fn single_flight_send() {
    let (mut room, recorder) = setup();

    room.compose("hi");
    let first = room.send().unwrap();

    let second = room.send_text("there");
    assert_eq!(
        second,
        Err(RoomError::Dispatch(DispatchError::SendInFlight { in_flight: first }))
    );
    assert_eq!(room.channel().pushed_count(), 1);

    room.handle(RoomEvent::SendAcked { send_ref: first, outcome: Err("timeout".into()) })
        .unwrap();

    assert!(room.can_send());
    assert_eq!(room.text(), "hi");
    assert!(recorder.notifications().contains(&RoomNotification::SendFailed {
        send_ref: first,
        reason: "timeout".into(),
    }));
}

#[test]
fn failed_send_keeps_original_text() {
    let (mut room, _recorder) = setup();

    room.handle(RoomEvent::TextChanged("hi".into())).unwrap();
    room.handle(RoomEvent::SendRequested).unwrap();
    let pending = room.channel_mut().take_pending();
    assert_eq!(pending.len(), 1);

    assert_eq!(room.channel().pushed_count(), 1);

    room.handle(RoomEvent::SendAcked { send_ref: pending[0].send_ref, outcome: Err("nack".into()) })
        .unwrap();

    assert!(room.can_send());
    assert_eq!(room.text(), "hi");

    room.handle(RoomEvent::SendRequested).unwrap();
    let retry = room.channel_mut().take_pending();
    room.handle(RoomEvent::SendAcked { send_ref: retry[0].send_ref, outcome: Ok(()) }).unwrap();

    assert_eq!(room.text(), "");
    assert!(!room.can_send());
}

#[test]
fn refused_push_reenables_send() {
    let (mut room, recorder) = setup();
    room.channel_mut().refuse_pushes("socket closed");
    room.compose("hi");

    let result = room.send();

    assert!(matches!(result, Err(RoomError::Dispatch(DispatchError::SendFailed { .. }))));
    assert!(room.can_send());
    assert_eq!(
        recorder.notifications().last(),
        Some(&RoomNotification::SendStateChanged { can_send: true })
    );
    assert!(room.channel().pending().is_empty());

    room.channel_mut().accept_pushes();
    let retry = room.send().unwrap();

    assert_eq!(room.channel().pending().len(), 1);
    assert_eq!(room.channel().pending()[0].send_ref, retry);
    assert_eq!(room.channel().pending()[0].payload, serde_json::json!({ "body": "hi" }));
}
