//! Serde helpers for backend timestamps.
//!
//! The table API returns `timestamptz` columns as RFC 3339 strings, but
//! tables created with plain `timestamp` columns come back without an
//! offset. Both are accepted; naive values are taken as UTC. A null
//! column decodes as the Unix epoch so the row sorts as the oldest one.

use chrono::{DateTime, NaiveDateTime, SecondsFormat, Utc};
use serde::{Deserialize, Deserializer, Serializer};

pub(crate) fn parse(value: &str) -> Option<DateTime<Utc>> {
    if let Ok(parsed) = DateTime::parse_from_rfc3339(value) {
        return Some(parsed.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S%.f")
        .or_else(|_| NaiveDateTime::parse_from_str(value, "%Y-%m-%d %H:%M:%S%.f"))
        .ok()
        .map(|naive| naive.and_utc())
}

pub(crate) fn serialize<S>(value: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    serializer.serialize_str(&value.to_rfc3339_opts(SecondsFormat::Micros, true))
}

pub(crate) fn deserialize<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
where
    D: Deserializer<'de>,
{
    let Some(raw) = Option::<String>::deserialize(deserializer)? else {
        return Ok(DateTime::<Utc>::UNIX_EPOCH);
    };
    parse(&raw).ok_or_else(|| serde::de::Error::custom(format!("invalid timestamp: {raw}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_parse_offset_and_naive() {
        let expected = Utc.with_ymd_and_hms(2024, 5, 1, 12, 30, 0).unwrap();
        assert_eq!(parse("2024-05-01T12:30:00+00:00"), Some(expected));
        assert_eq!(parse("2024-05-01T14:30:00+02:00"), Some(expected));
        assert_eq!(parse("2024-05-01T12:30:00"), Some(expected));
        assert_eq!(parse("2024-05-01 12:30:00.000"), Some(expected));
        assert_eq!(parse("yesterday"), None);
    }

    #[derive(Debug, Deserialize)]
    struct Row {
        #[serde(with = "super")]
        created_at: DateTime<Utc>,
    }

    #[test]
    fn test_null_decodes_as_epoch() {
        let row: Row = serde_json::from_str(r#"{"created_at": null}"#).unwrap();
        assert_eq!(row.created_at, DateTime::<Utc>::UNIX_EPOCH);

        let err = serde_json::from_str::<Row>(r#"{"created_at": "soon"}"#).unwrap_err();
        assert!(err.to_string().contains("invalid timestamp: soon"));
    }
}
