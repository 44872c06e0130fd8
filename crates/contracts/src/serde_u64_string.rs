//! Seed round-tripping: always serialized as a string so downstream stores
//! never lose precision, but accepted as either a string or a bare integer
//! because batch events carry seeds as plain JSON numbers.

use std::fmt;

use serde::de::{Error, Visitor};
use serde::{Deserializer, Serializer};

pub fn serialize<S>(value: &u64, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    serializer.serialize_str(&value.to_string())
}

struct U64OrString;

impl Visitor<'_> for U64OrString {
    type Value = u64;

    fn expecting(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str("a u64 or a string holding a u64")
    }

    fn visit_u64<E: Error>(self, value: u64) -> Result<u64, E> {
        Ok(value)
    }

    fn visit_i64<E: Error>(self, value: i64) -> Result<u64, E> {
        u64::try_from(value).map_err(|_| E::custom(format!("negative seed: {value}")))
    }

    fn visit_str<E: Error>(self, raw: &str) -> Result<u64, E> {
        raw.parse::<u64>().map_err(E::custom)
    }
}

pub fn deserialize<'de, D>(deserializer: D) -> Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    deserializer.deserialize_any(U64OrString)
}

#[cfg(test)]
mod tests {
    use serde::{Deserialize, Serialize};

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct Holder {
        #[serde(with = "super")]
        seed: u64,
    }

    #[test]
    fn serializes_as_string() {
        let raw = serde_json::to_string(&Holder { seed: 1337 }).expect("serialize");
        assert_eq!(raw, r#"{"seed":"1337"}"#);
    }

    #[test]
    fn accepts_string_and_number() {
        let from_string: Holder = serde_json::from_str(r#"{"seed":"42"}"#).expect("string seed");
        let from_number: Holder = serde_json::from_str(r#"{"seed":42}"#).expect("number seed");
        assert_eq!(from_string, from_number);
    }

    #[test]
    fn rejects_negative_seed() {
        assert!(serde_json::from_str::<Holder>(r#"{"seed":-1}"#).is_err());
    }
}
