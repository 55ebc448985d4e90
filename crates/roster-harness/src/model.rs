//! Reference model of room presence.
//!
//! Deliberately naive: plain maps of identity to device numbers, rebuilt
//! step by step from the same operations the real room receives. Model-based
//! tests compare its observable state with the real implementation.

use std::collections::{BTreeMap, BTreeSet};

use roster_core::{DeviceFingerprint, MembershipTable};

use crate::operation::{
    ModelRecord, Operation, body_text, identity_key, model_fingerprint, normalize,
};

/// Errors the model predicts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperationError {
    /// Diff before any full state.
    OutOfOrderDiff,
    /// Payload not structurally valid.
    MalformedBatch,
}

/// Result of applying an operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperationResult {
    /// Applied.
    Ok,
    /// Rejected, state unchanged.
    Error(OperationError),
}

impl OperationResult {
    /// True if the operation was applied.
    pub fn is_ok(self) -> bool {
        matches!(self, Self::Ok)
    }
}

/// Reference presence model.
#[derive(Debug, Clone, Default)]
pub struct ModelPresence {
    synced: bool,
    members: BTreeMap<String, BTreeSet<DeviceFingerprint>>,
    messages: Vec<(String, String)>,
}

impl ModelPresence {
    /// Empty, unsynced model.
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply one operation.
    pub fn apply(&mut self, op: &Operation) -> OperationResult {
        match op {
            Operation::FullState { entries } => {
                self.members.clear();
                for (identity, records) in normalize(entries) {
                    let devices = valid_devices(&records);
                    if !devices.is_empty() {
                        self.members.insert(identity, devices);
                    }
                }
                self.synced = true;
                OperationResult::Ok
            },
            Operation::Diff { joins, leaves } => {
                if !self.synced {
                    return OperationResult::Error(OperationError::OutOfOrderDiff);
                }
                for (identity, records) in normalize(joins) {
                    let devices = valid_devices(&records);
                    if !devices.is_empty() {
                        self.members.entry(identity).or_default().extend(devices);
                    }
                }
                for (identity, records) in normalize(leaves) {
                    let leaving = valid_devices(&records);
                    if let Some(devices) = self.members.get_mut(&identity) {
                        devices.retain(|d| !leaving.contains(d));
                        if devices.is_empty() {
                            self.members.remove(&identity);
                        }
                    }
                }
                OperationResult::Ok
            },
            Operation::MalformedBatch => OperationResult::Error(OperationError::MalformedBatch),
            Operation::ConnectionLost => {
                self.synced = false;
                self.members.clear();
                OperationResult::Ok
            },
            Operation::ChatMessage { sender, body } => {
                self.messages.push((identity_key(*sender), body_text(*body)));
                OperationResult::Ok
            },
        }
    }

    /// Identity to fingerprints.
    pub fn members(&self) -> &BTreeMap<String, BTreeSet<DeviceFingerprint>> {
        &self.members
    }

    /// Identities with at least one device.
    pub fn present_identity_count(&self) -> usize {
        self.members.len()
    }

    /// Received messages as (sender, body).
    pub fn messages(&self) -> &[(String, String)] {
        &self.messages
    }
}

/// Project a real membership table onto the model's observable shape.
pub fn membership_view(table: &MembershipTable) -> BTreeMap<String, BTreeSet<DeviceFingerprint>> {
    table
        .iter()
        .map(|(identity, devices)| {
            (identity.to_string(), devices.iter().map(|d| d.fingerprint()).collect())
        })
        .collect()
}

fn valid_devices(records: &[ModelRecord]) -> BTreeSet<DeviceFingerprint> {
    records
        .iter()
        .filter_map(|record| match record {
            ModelRecord::Valid { device, .. } => Some(model_fingerprint(*device)),
            ModelRecord::Malformed => None,
        })
        .collect()
}
