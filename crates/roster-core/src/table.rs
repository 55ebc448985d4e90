//! Membership table.
//!
//! Maps identity keys to the set of devices currently present under that
//! identity. A published table is never mutated: every change builds a new
//! map and wraps it in a fresh [`Arc`], so a clone handed to a reader stays
//! valid no matter what the engine does afterwards.
//!
//! # Invariants
//!
//! - A key is present only with a non-empty device set. Removing the last
//!   device of an identity removes the identity.
//! - Devices within a set are unique by fingerprint.

use std::{
    collections::{BTreeMap, BTreeSet},
    sync::Arc,
};

use crate::device::{DeviceFingerprint, DeviceIdentity};

/// Logical user name under which devices are grouped.
pub type IdentityKey = String;

/// Devices present under one identity, unique by fingerprint.
pub type DeviceSet = BTreeSet<DeviceIdentity>;

/// Immutable snapshot of room membership.
///
/// Cloning is cheap and shares the underlying map.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MembershipTable {
    entries: Arc<BTreeMap<IdentityKey, DeviceSet>>,
}

impl MembershipTable {
    /// Empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a table from raw entries, dropping identities with no devices.
    pub fn from_entries(mut entries: BTreeMap<IdentityKey, DeviceSet>) -> Self {
        entries.retain(|_, devices| !devices.is_empty());
        Self { entries: Arc::new(entries) }
    }

    /// Number of identities with at least one present device.
    pub fn present_identity_count(&self) -> usize {
        self.entries.values().filter(|devices| !devices.is_empty()).count()
    }

    /// Total number of devices across all identities.
    pub fn device_count(&self) -> usize {
        self.entries.values().map(BTreeSet::len).sum()
    }

    /// True if nobody is present.
    pub fn is_empty(&self) -> bool {
        self.present_identity_count() == 0
    }

    /// Devices present under `identity`, if any.
    pub fn devices(&self, identity: &str) -> Option<&DeviceSet> {
        self.entries.get(identity)
    }

    /// Fingerprints present under `identity`, in order.
    pub fn fingerprints(&self, identity: &str) -> Vec<DeviceFingerprint> {
        self.devices(identity)
            .map(|devices| devices.iter().map(DeviceIdentity::fingerprint).collect())
            .unwrap_or_default()
    }

    /// True if `fingerprint` is present under `identity`.
    pub fn contains(&self, identity: &str, fingerprint: DeviceFingerprint) -> bool {
        self.devices(identity)
            .is_some_and(|devices| devices.iter().any(|d| d.fingerprint() == fingerprint))
    }

    /// Present identities in key order.
    pub fn identities(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    /// Identity and device set pairs in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &DeviceSet)> {
        self.entries.iter().map(|(identity, devices)| (identity.as_str(), devices))
    }

    /// Copy of the underlying map, for callers that need to edit it.
    pub fn to_entries(&self) -> BTreeMap<IdentityKey, DeviceSet> {
        (*self.entries).clone()
    }
}

#[cfg(test)]
mod tests {
    use std::time::SystemTime;

    use uuid::Uuid;

    use super::*;

    fn device(n: u128) -> DeviceIdentity {
        DeviceIdentity::new(
            DeviceFingerprint::from_uuid(Uuid::from_u128(n)),
            format!("ref-{n}"),
            SystemTime::UNIX_EPOCH,
        )
    }

    #[test]
    fn empty_sets_do_not_count() {
        let mut entries = BTreeMap::new();
        entries.insert("u1".to_string(), BTreeSet::from([device(1)]));
        entries.insert("u2".to_string(), BTreeSet::new());

        let table = MembershipTable::from_entries(entries);

        assert_eq!(table.present_identity_count(), 1);
        assert!(table.devices("u2").is_none());
        assert_eq!(table.identities().collect::<Vec<_>>(), vec!["u1"]);
    }

    #[test]
    fn clones_share_storage() {
        let mut entries = BTreeMap::new();
        entries.insert("u1".to_string(), BTreeSet::from([device(1), device(2)]));
        let table = MembershipTable::from_entries(entries);
        let snapshot = table.clone();

        assert!(Arc::ptr_eq(&table.entries, &snapshot.entries));
        assert_eq!(snapshot.device_count(), 2);
    }

    #[test]
    fn contains_matches_by_fingerprint() {
        let mut entries = BTreeMap::new();
        entries.insert("u1".to_string(), BTreeSet::from([device(7)]));
        let table = MembershipTable::from_entries(entries);

        assert!(table.contains("u1", device(7).fingerprint()));
        assert!(!table.contains("u1", device(8).fingerprint()));
        assert!(!table.contains("u2", device(7).fingerprint()));
    }
}
