//! Decoding of raw channel payloads.
//!
//! Channel payloads arrive as untyped JSON. Decoding happens in two layers:
//!
//! - **Batch structure** ([`decode_presences`], [`decode_diff`]): the outer
//!   shape of a full-state or diff payload. A structural failure rejects the
//!   whole call with [`PresenceError::MalformedBatch`].
//! - **Records** ([`decode_device`], [`decode_chat_message`]): one device or
//!   message. A record failure is reported per item and never aborts the
//!   surrounding batch.
//!
//! # Wire Shapes
//!
//! ```text
//! device record : {"phx_ref": "r1", "online_at": 1469653860.5, "device_token": "<uuid>"}
//! full state    : {"alice": {"metas": [record, ...]}, ...}
//! diff          : {"joins": <full state>, "leaves": <full state>}
//! chat message  : {"user_id": "alice", "body": "hi"}
//! ```

use std::{
    collections::BTreeMap,
    time::{Duration, SystemTime},
};

use serde::Deserialize;
use serde_json::Value;

use crate::{
    device::{DeviceFingerprint, DeviceIdentity},
    error::{DecodeError, PresenceError},
    message::ChatMessage,
    table::IdentityKey,
};

/// Identity key to undecoded device records.
pub type RawPresences = BTreeMap<IdentityKey, Vec<Value>>;

/// Undecoded incremental presence update.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawDiff {
    /// Devices that joined, by identity.
    pub joins: RawPresences,
    /// Devices that left, by identity.
    pub leaves: RawPresences,
}

/// Result of decoding a collection item by item.
#[derive(Debug, Default)]
pub struct Decoded<T> {
    /// Successfully decoded items, in input order.
    pub items: Vec<T>,
    /// Index and error of every item that failed.
    pub failures: Vec<(usize, DecodeError)>,
}

#[derive(Deserialize)]
struct WireDevice {
    phx_ref: String,
    online_at: f64,
    device_token: String,
}

/// Decode one device record.
pub fn decode_device(record: &Value) -> Result<DeviceIdentity, DecodeError> {
    let wire = WireDevice::deserialize(record)?;
    let fingerprint = DeviceFingerprint::parse(&wire.device_token)?;
    let joined_at = time_from_secs(wire.online_at).ok_or(DecodeError::Timestamp(wire.online_at))?;

    Ok(DeviceIdentity::new(fingerprint, wire.phx_ref, joined_at))
}

/// Decode one chat message.
pub fn decode_chat_message(payload: &Value) -> Result<ChatMessage, DecodeError> {
    Ok(ChatMessage::deserialize(payload)?)
}

/// Apply `decode` to every record, separating successes from failures.
pub fn decode_all<T, F>(records: &[Value], decode: F) -> Decoded<T>
where
    F: Fn(&Value) -> Result<T, DecodeError>,
{
    let mut decoded = Decoded { items: Vec::with_capacity(records.len()), failures: Vec::new() };

    for (index, record) in records.iter().enumerate() {
        match decode(record) {
            Ok(item) => decoded.items.push(item),
            Err(e) => decoded.failures.push((index, e)),
        }
    }

    decoded
}

/// Decode the outer structure of a full-state payload.
///
/// Device records are left undecoded.
pub fn decode_presences(payload: &Value) -> Result<RawPresences, PresenceError> {
    let Value::Object(entries) = payload else {
        return Err(malformed(format!("expected an object of presences, got {}", kind(payload))));
    };

    let mut presences = RawPresences::new();
    for (identity, entry) in entries {
        let metas = entry.get("metas").and_then(Value::as_array).ok_or_else(|| {
            malformed(format!("presence {identity:?} has no \"metas\" list"))
        })?;
        presences.insert(identity.clone(), metas.clone());
    }

    Ok(presences)
}

/// Decode the outer structure of a diff payload.
///
/// A missing or null `joins`/`leaves` side is treated as empty.
pub fn decode_diff(payload: &Value) -> Result<RawDiff, PresenceError> {
    let Value::Object(fields) = payload else {
        return Err(malformed(format!("expected a diff object, got {}", kind(payload))));
    };

    let side = |name: &str| match fields.get(name) {
        None | Some(Value::Null) => Ok(RawPresences::new()),
        Some(value) => decode_presences(value),
    };

    Ok(RawDiff { joins: side("joins")?, leaves: side("leaves")? })
}

fn time_from_secs(secs: f64) -> Option<SystemTime> {
    let offset = Duration::try_from_secs_f64(secs).ok()?;
    SystemTime::UNIX_EPOCH.checked_add(offset)
}

fn malformed(reason: String) -> PresenceError {
    PresenceError::MalformedBatch { reason }
}

fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
