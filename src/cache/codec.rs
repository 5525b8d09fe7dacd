//! Value Codec Module
//!
//! Flat byte encoding shared by every provider. Values go through serde_json,
//! so any `Serialize + DeserializeOwned` type round-trips field for field.

use chrono::{DateTime, SubsecRound, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::error::{CacheError, Result};

/// Serializes `value` for storage under `key`.
pub fn encode<T: Serialize + ?Sized>(key: &str, value: &T) -> Result<Vec<u8>> {
    serde_json::to_vec(value).map_err(|source| CacheError::Encode {
        key: key.to_string(),
        source,
    })
}

/// Deserializes bytes stored under `key`.
pub fn decode<T: DeserializeOwned>(key: &str, bytes: &[u8]) -> Result<T> {
    serde_json::from_slice(bytes).map_err(|source| CacheError::Decode {
        key: key.to_string(),
        source,
    })
}

// == Unix Time ==
/// Timestamp with second precision, stored as integer Unix seconds.
///
/// Use `DateTime<Utc>` directly when sub-second precision must survive the
/// round trip.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct UnixTime(#[serde(with = "chrono::serde::ts_seconds")] DateTime<Utc>);

impl UnixTime {
    /// Wraps `time`, dropping any sub-second part.
    pub fn new(time: DateTime<Utc>) -> Self {
        Self(time.trunc_subsecs(0))
    }

    /// Current time, truncated to the second.
    pub fn now() -> Self {
        Self::new(Utc::now())
    }

    /// The wrapped timestamp.
    pub fn as_datetime(&self) -> DateTime<Utc> {
        self.0
    }

    /// Whole seconds since the Unix epoch.
    pub fn timestamp(&self) -> i64 {
        self.0.timestamp()
    }
}

impl From<DateTime<Utc>> for UnixTime {
    fn from(time: DateTime<Utc>) -> Self {
        Self::new(time)
    }
}

impl From<UnixTime> for DateTime<Utc> {
    fn from(time: UnixTime) -> Self {
        time.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use std::collections::BTreeMap;

    #[derive(Debug, Default, PartialEq, Serialize, Deserialize)]
    struct Person {
        name: String,
        age: u32,
    }

    #[derive(Debug, Default, PartialEq, Serialize, Deserialize)]
    struct Data {
        flag: bool,
        i8: i8,
        i16: i16,
        i32: i32,
        i64: i64,
        u8: u8,
        u16: u16,
        u32: u32,
        u64: u64,
        usize: usize,
        f32: f32,
        f64: f64,
        array: [i32; 2],
        map: BTreeMap<String, i32>,
        list: Vec<i32>,
        text: String,
        person: Person,
        time: DateTime<Utc>,
        unix_time: UnixTime,
    }

    fn sample() -> Data {
        Data {
            flag: true,
            i8: -2,
            i16: 3,
            i32: -4,
            i64: i64::MIN,
            u8: 7,
            u16: 8,
            u32: 9,
            u64: u64::MAX,
            usize: 11,
            f32: 12.12,
            f64: 13.13,
            array: [16, 16],
            map: BTreeMap::from([("A".to_string(), 17), ("B".to_string(), 18)]),
            list: vec![19, 20],
            text: "21".to_string(),
            person: Person {
                name: "Jerry".to_string(),
                age: 22,
            },
            time: Utc::now(),
            unix_time: UnixTime::now(),
        }
    }

    #[test]
    fn test_encode_decode_preserves_every_field() {
        let data = sample();
        let bytes = encode("k", &data).unwrap();
        let back: Data = decode("k", &bytes).unwrap();
        assert_eq!(back, data);
    }

    #[test]
    fn test_decode_shape_mismatch_is_error() {
        let bytes = encode("k", &"just a string").unwrap();
        let result = decode::<Data>("k", &bytes);
        assert!(matches!(result, Err(CacheError::Decode { ref key, .. }) if key == "k"));
    }

    #[test]
    fn test_unix_time_truncates_to_seconds() {
        let time = Utc.with_ymd_and_hms(2022, 3, 27, 18, 55, 0).unwrap()
            + chrono::Duration::milliseconds(750);
        let unix = UnixTime::new(time);
        assert_eq!(unix.timestamp(), time.timestamp());
        assert_eq!(encode("k", &unix).unwrap(), time.timestamp().to_string().into_bytes());
    }

    #[test]
    fn test_datetime_round_trips_to_same_instant() {
        let time = Utc::now();
        let back: DateTime<Utc> = decode("k", &encode("k", &time).unwrap()).unwrap();
        assert_eq!(back, time);
    }
}
