//! Fuzz harness comparing the room against the reference presence model.
//!
//! Operation sequences come from `arbitrary`; after every operation the
//! room's result and membership must match the model's.

#![no_main]
use libfuzzer_sys::fuzz_target;
use roster_app::{Room, RoomConfig, RoomError};
use roster_core::PresenceError;
use roster_harness::{
    ModelPresence, Operation, OperationError, OperationResult, SimChannel, membership_view,
};

fuzz_target!(|ops: Vec<Operation>| {
    let mut model = ModelPresence::new();
    let mut room = Room::new(SimChannel::new(), RoomConfig::default());

    for op in &ops {
        let expected = model.apply(op);
        let actual = match room.handle(op.to_event()) {
            Ok(()) => OperationResult::Ok,
            Err(RoomError::Presence(PresenceError::OutOfOrderDiff)) => {
                OperationResult::Error(OperationError::OutOfOrderDiff)
            },
            Err(RoomError::Presence(PresenceError::MalformedBatch { .. })) => {
                OperationResult::Error(OperationError::MalformedBatch)
            },
            Err(other) => panic!("unexpected error: {other}"),
        };

        assert_eq!(expected, actual, "divergence on {op:?}");
        assert_eq!(&membership_view(&room.membership()), model.members());
        assert_eq!(room.present_identity_count(), model.present_identity_count());
    }
});
