//! Custom serde helpers for venue wire formats.

/// Deserializes an ISO-8601 timestamp into `DateTime<Utc>`.
///
/// The venue emits naive datetimes (`"2024-01-15T10:30:00.123456"`, no offset)
/// for database columns, which are UTC. RFC 3339 strings with an offset are
/// accepted as well.
pub mod timestamp {
    use chrono::{DateTime, NaiveDateTime, Utc};
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn parse(raw: &str) -> Option<DateTime<Utc>> {
        if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
            return Some(dt.with_timezone(&Utc));
        }
        NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
            .or_else(|_| NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S%.f"))
            .ok()
            .map(|naive| naive.and_utc())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        parse(&raw).ok_or_else(|| serde::de::Error::custom(format!("Invalid timestamp: {}", raw)))
    }

    pub fn serialize<S>(value: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&value.to_rfc3339())
    }
}

/// Same as [`timestamp`], for optional fields. Pair with `#[serde(default)]`.
pub mod timestamp_opt {
    use chrono::{DateTime, Utc};
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
    where
        D: Deserializer<'de>,
    {
        match Option::<String>::deserialize(deserializer)? {
            None => Ok(None),
            Some(raw) => super::timestamp::parse(&raw)
                .map(Some)
                .ok_or_else(|| serde::de::Error::custom(format!("Invalid timestamp: {}", raw))),
        }
    }

    pub fn serialize<S>(value: &Option<DateTime<Utc>>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match value {
            Some(dt) => serializer.serialize_some(&dt.to_rfc3339()),
            None => serializer.serialize_none(),
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};
    use serde::Deserialize;

    #[derive(Deserialize)]
    struct Stamped {
        #[serde(with = "super::timestamp")]
        at: chrono::DateTime<Utc>,
        #[serde(default, with = "super::timestamp_opt")]
        maybe: Option<chrono::DateTime<Utc>>,
    }

    #[test]
    fn test_naive_timestamp_is_utc() {
        let s: Stamped = serde_json::from_str(r#"{"at": "2024-01-15T10:30:00"}"#).unwrap();
        assert_eq!(s.at, Utc.with_ymd_and_hms(2024, 1, 15, 10, 30, 0).unwrap());
        assert!(s.maybe.is_none());
    }

    #[test]
    fn test_offset_timestamp_is_normalized() {
        let s: Stamped = serde_json::from_str(
            r#"{"at": "2024-01-15T12:30:00+02:00", "maybe": "2024-01-15T10:30:00.250000"}"#,
        )
        .unwrap();
        assert_eq!(s.at, Utc.with_ymd_and_hms(2024, 1, 15, 10, 30, 0).unwrap());
        assert!(s.maybe.is_some());
    }

    #[test]
    fn test_garbage_timestamp_fails() {
        assert!(serde_json::from_str::<Stamped>(r#"{"at": "yesterday"}"#).is_err());
    }
}
