//! Device identity records.
//!
//! A [`DeviceIdentity`] is one physical endpoint's participation in a room.
//! Two records describe the same device exactly when their fingerprints
//! match. The session reference and join time are informational: a device
//! that rejoins under a new session is still the same device.

use std::{
    cmp::Ordering,
    fmt,
    hash::{Hash, Hasher},
    str::FromStr,
    time::SystemTime,
};

use uuid::Uuid;

use crate::error::FingerprintError;

/// Stable identifier of a physical device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct DeviceFingerprint(Uuid);

impl DeviceFingerprint {
    /// Wrap an already validated UUID.
    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Parse a fingerprint from external input.
    ///
    /// # Errors
    ///
    /// Returns [`FingerprintError::Invalid`] if `input` is not a UUID.
    pub fn parse(input: &str) -> Result<Self, FingerprintError> {
        Uuid::try_parse(input)
            .map(Self)
            .map_err(|source| FingerprintError::Invalid { input: input.to_string(), source })
    }

    /// The underlying UUID.
    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl FromStr for DeviceFingerprint {
    type Err = FingerprintError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for DeviceFingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.hyphenated())
    }
}

/// One device's participation in the room.
///
/// Equality, ordering and hashing consider only the fingerprint.
#[derive(Debug, Clone)]
pub struct DeviceIdentity {
    fingerprint: DeviceFingerprint,
    session_ref: String,
    joined_at: SystemTime,
}

impl DeviceIdentity {
    /// Create a device record.
    pub fn new(
        fingerprint: DeviceFingerprint,
        session_ref: impl Into<String>,
        joined_at: SystemTime,
    ) -> Self {
        Self { fingerprint, session_ref: session_ref.into(), joined_at }
    }

    /// Deduplication key.
    pub fn fingerprint(&self) -> DeviceFingerprint {
        self.fingerprint
    }

    /// Join event that produced this record.
    pub fn session_ref(&self) -> &str {
        &self.session_ref
    }

    /// When the device joined.
    pub fn joined_at(&self) -> SystemTime {
        self.joined_at
    }
}

impl PartialEq for DeviceIdentity {
    fn eq(&self, other: &Self) -> bool {
        self.fingerprint == other.fingerprint
    }
}

impl Eq for DeviceIdentity {}

impl Hash for DeviceIdentity {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.fingerprint.hash(state);
    }
}

impl PartialOrd for DeviceIdentity {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for DeviceIdentity {
    fn cmp(&self, other: &Self) -> Ordering {
        self.fingerprint.cmp(&other.fingerprint)
    }
}

#[cfg(test)]
mod tests {
    use std::{collections::HashSet, time::Duration};

    use super::*;

    fn fingerprint(n: u128) -> DeviceFingerprint {
        DeviceFingerprint::from_uuid(Uuid::from_u128(n))
    }

    #[test]
    fn equality_ignores_session_and_time() {
        let t0 = SystemTime::UNIX_EPOCH;
        let a = DeviceIdentity::new(fingerprint(1), "r1", t0);
        let b = DeviceIdentity::new(fingerprint(1), "r2", t0 + Duration::from_secs(60));

        assert_eq!(a, b);
        assert_eq!(a.cmp(&b), Ordering::Equal);

        let set: HashSet<_> = [a, b].into_iter().collect();
        assert_eq!(set.len(), 1);
    }

    #[test]
    fn different_fingerprints_are_distinct() {
        let t0 = SystemTime::UNIX_EPOCH;
        let a = DeviceIdentity::new(fingerprint(1), "r1", t0);
        let b = DeviceIdentity::new(fingerprint(2), "r1", t0);

        assert_ne!(a, b);
    }

    #[test]
    fn parse_rejects_garbage() {
        let result = DeviceFingerprint::parse("not-a-uuid");
        assert!(matches!(result, Err(FingerprintError::Invalid { ref input, .. }) if input == "not-a-uuid"));
    }

    #[test]
    fn parse_round_trips_display() {
        let text = "6f1c2a9e-3b4d-4e5f-8a7b-9c0d1e2f3a4b";
        let parsed: DeviceFingerprint = text.parse().unwrap();
        assert_eq!(parsed.to_string(), text);
    }
}
