//! Payload fixtures in channel wire shape.

use roster_core::DeviceFingerprint;
use serde_json::{Map, Value, json};
use uuid::Uuid;

/// Fingerprint for test device `n`.
pub fn fingerprint(n: u128) -> DeviceFingerprint {
    DeviceFingerprint::from_uuid(Uuid::from_u128(n))
}

/// Device record for test device `n`.
pub fn device_record(n: u128, session_ref: &str, online_at: u64) -> Value {
    json!({
        "phx_ref": session_ref,
        "online_at": online_at,
        "device_token": Uuid::from_u128(n).to_string(),
    })
}

/// Full-state payload from `(identity, records)` pairs.
pub fn presence_state(entries: &[(&str, Vec<Value>)]) -> Value {
    let mut presences = Map::new();
    for (identity, records) in entries {
        presences.insert((*identity).to_string(), json!({ "metas": records }));
    }
    Value::Object(presences)
}

/// Diff payload from join and leave pairs.
pub fn presence_diff(joins: &[(&str, Vec<Value>)], leaves: &[(&str, Vec<Value>)]) -> Value {
    json!({ "joins": presence_state(joins), "leaves": presence_state(leaves) })
}

/// Chat message payload.
pub fn chat_message(sender: &str, body: &str) -> Value {
    json!({ "user_id": sender, "body": body })
}
