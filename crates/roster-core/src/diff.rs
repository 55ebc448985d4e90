//! Diff applier: pure transitions of the membership table.
//!
//! Every function takes the current table by reference and returns the next
//! one. The input table is never touched, so a reader holding it keeps a
//! consistent view while the next table is being built.
//!
//! Device records are decoded here, one at a time. A record that fails to
//! decode is logged and skipped; the rest of the batch still applies.

use std::collections::BTreeMap;

use serde_json::Value;
use tracing::warn;

use crate::{
    decode::{RawDiff, RawPresences, decode_all, decode_device},
    table::{DeviceSet, IdentityKey, MembershipTable},
};

/// Build a table from a full-state snapshot.
///
/// The result replaces whatever was there before; nothing is merged.
pub fn apply_snapshot(snapshot: &RawPresences) -> MembershipTable {
    let mut entries = BTreeMap::new();

    for (identity, records) in snapshot {
        let devices = decode_devices(identity, records);
        if !devices.is_empty() {
            entries.insert(identity.clone(), devices);
        }
    }

    MembershipTable::from_entries(entries)
}

/// Add `incoming` to the devices of `identity`.
///
/// Union by fingerprint. A device that is already present keeps its
/// existing record.
pub fn apply_join(table: &MembershipTable, identity: &str, incoming: &DeviceSet) -> MembershipTable {
    let mut entries = table.to_entries();
    join_into(&mut entries, identity, incoming);
    MembershipTable::from_entries(entries)
}

/// Remove `leaving` from the devices of `identity`.
///
/// An unknown identity or device is ignored. Removing the last device of an
/// identity removes the identity.
pub fn apply_leave(table: &MembershipTable, identity: &str, leaving: &DeviceSet) -> MembershipTable {
    if table.devices(identity).is_none() {
        return table.clone();
    }

    let mut entries = table.to_entries();
    leave_from(&mut entries, identity, leaving);
    MembershipTable::from_entries(entries)
}

/// Apply an incremental update: every join first, then every leave against
/// the joined result.
pub fn apply_diff(table: &MembershipTable, diff: &RawDiff) -> MembershipTable {
    let mut entries = table.to_entries();

    for (identity, records) in &diff.joins {
        let devices = decode_devices(identity, records);
        join_into(&mut entries, identity, &devices);
    }

    for (identity, records) in &diff.leaves {
        let devices = decode_devices(identity, records);
        leave_from(&mut entries, identity, &devices);
    }

    MembershipTable::from_entries(entries)
}

fn join_into(entries: &mut BTreeMap<IdentityKey, DeviceSet>, identity: &str, incoming: &DeviceSet) {
    if incoming.is_empty() {
        return;
    }

    let devices = entries.entry(identity.to_string()).or_default();
    for device in incoming {
        // BTreeSet::insert keeps the existing element on a fingerprint match
        devices.insert(device.clone());
    }
}

fn leave_from(entries: &mut BTreeMap<IdentityKey, DeviceSet>, identity: &str, leaving: &DeviceSet) {
    let Some(devices) = entries.get_mut(identity) else {
        return;
    };

    devices.retain(|device| !leaving.contains(device));

    if devices.is_empty() {
        entries.remove(identity);
    }
}

fn decode_devices(identity: &str, records: &[Value]) -> DeviceSet {
    let decoded = decode_all(records, decode_device);

    for (index, error) in &decoded.failures {
        warn!(identity = %identity, index, error = %error, "dropping malformed device record");
    }

    decoded.items.into_iter().collect()
}
