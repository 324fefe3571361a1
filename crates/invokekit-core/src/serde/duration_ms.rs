//! (De)serialize a [`Duration`] as an integer number of milliseconds.
//!
//! Use with `#[serde(with = "invokekit_core::serde::duration_ms")]`.

use ::serde::{Deserialize, Deserializer, Serializer};
use std::time::Duration;

/// Serialize `duration` as whole milliseconds.
pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    let millis = u64::try_from(duration.as_millis()).unwrap_or(u64::MAX);
    serializer.serialize_u64(millis)
}

/// Deserialize whole milliseconds into a `Duration`.
pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
where
    D: Deserializer<'de>,
{
    u64::deserialize(deserializer).map(Duration::from_millis)
}
