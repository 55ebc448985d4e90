//! Property tests for membership table transitions.
//!
//! Devices are drawn from a small fingerprint space so that generated
//! sequences revisit the same devices often.

use std::{collections::BTreeSet, time::SystemTime};

use proptest::prelude::*;
use roster_core::{
    DeviceFingerprint, DeviceIdentity, DeviceSet, MembershipTable, RawDiff,
    diff::{apply_diff, apply_join, apply_leave},
};
use serde_json::{Value, json};
use uuid::Uuid;

const IDENTITIES: [&str; 3] = ["u1", "u2", "u3"];

fn fingerprint(n: u8) -> DeviceFingerprint {
    DeviceFingerprint::from_uuid(Uuid::from_u128(u128::from(n) + 1))
}

fn device(n: u8, session: u16) -> DeviceIdentity {
    DeviceIdentity::new(fingerprint(n), format!("ref-{session}"), SystemTime::UNIX_EPOCH)
}

fn record(n: u8, session: u16) -> Value {
    json!({
        "phx_ref": format!("ref-{session}"),
        "online_at": 1_469_653_860,
        "device_token": Uuid::from_u128(u128::from(n) + 1).to_string(),
    })
}

/// (identity index, device number, session number)
fn join_strategy() -> impl Strategy<Value = (usize, u8, u16)> {
    (0..IDENTITIES.len(), 0..6u8, any::<u16>())
}

proptest! {
    /// Repeated joins of one fingerprint leave exactly one record.
    #[test]
    fn prop_joins_dedup_by_fingerprint(joins in prop::collection::vec(join_strategy(), 1..40)) {
        let mut table = MembershipTable::new();
        for (identity, n, session) in &joins {
            table = apply_join(&table, IDENTITIES[*identity], &DeviceSet::from([device(*n, *session)]));
        }

        for identity in IDENTITIES {
            let expected: BTreeSet<DeviceFingerprint> = joins
                .iter()
                .filter(|(i, _, _)| IDENTITIES[*i] == identity)
                .map(|(_, n, _)| fingerprint(*n))
                .collect();
            let actual: BTreeSet<DeviceFingerprint> = table.fingerprints(identity).into_iter().collect();

            prop_assert_eq!(actual.len(), table.fingerprints(identity).len());
            prop_assert_eq!(actual, expected);
        }
    }

    /// Leaving a device that is not present changes nothing.
    #[test]
    fn prop_leave_of_absent_device_is_noop(
        joins in prop::collection::vec(join_strategy(), 0..20),
        identity in 0..IDENTITIES.len(),
        n in 6..12u8,
    ) {
        let mut table = MembershipTable::new();
        for (i, d, session) in &joins {
            table = apply_join(&table, IDENTITIES[*i], &DeviceSet::from([device(*d, *session)]));
        }

        let after = apply_leave(&table, IDENTITIES[identity], &DeviceSet::from([device(n, 0)]));
        prop_assert_eq!(after, table);
    }

    /// The count only includes identities that still hold a device.
    #[test]
    fn prop_count_matches_non_empty_identities(
        joins in prop::collection::vec(join_strategy(), 0..30),
        leaves in prop::collection::vec(join_strategy(), 0..30),
    ) {
        let mut diff = RawDiff::default();
        for (i, n, session) in &joins {
            diff.joins.entry(IDENTITIES[*i].to_string()).or_default().push(record(*n, *session));
        }
        for (i, n, session) in &leaves {
            diff.leaves.entry(IDENTITIES[*i].to_string()).or_default().push(record(*n, *session));
        }

        let table = apply_diff(&MembershipTable::new(), &diff);

        let non_empty = table.iter().filter(|(_, devices)| !devices.is_empty()).count();
        prop_assert_eq!(table.present_identity_count(), non_empty);
        prop_assert_eq!(table.identities().count(), non_empty);
    }

    /// A snapshot taken before an update is never affected by it.
    #[test]
    fn prop_snapshots_are_stable(
        joins in prop::collection::vec(join_strategy(), 1..20),
        leaves in prop::collection::vec(join_strategy(), 1..20),
    ) {
        let mut table = MembershipTable::new();
        for (i, n, session) in &joins {
            table = apply_join(&table, IDENTITIES[*i], &DeviceSet::from([device(*n, *session)]));
        }
        let snapshot = table.clone();
        let frozen = table.to_entries();

        for (i, n, session) in &leaves {
            table = apply_leave(&table, IDENTITIES[*i], &DeviceSet::from([device(*n, *session)]));
        }

        prop_assert_eq!(snapshot.to_entries(), frozen);
    }
}

#[test]
fn count_ignores_emptied_identity() {
    let table = apply_join(&MembershipTable::new(), "u1", &DeviceSet::from([device(1, 1)]));
    let table = apply_join(&table, "u2", &DeviceSet::from([device(2, 2)]));
    let table = apply_leave(&table, "u2", &DeviceSet::from([device(2, 9)]));

    assert_eq!(table.present_identity_count(), 1);
}
