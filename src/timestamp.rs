//! UTC timestamp wire format.
//!
//! Every instant leaving the API is rendered as ISO-8601 in UTC with a literal
//! `Z` suffix, e.g. `2025-12-25T10:30:00Z`. Sub-second parts are kept, in as
//! few of 3, 6 or 9 digits as the value needs (`2025-12-25T10:30:00.300Z`).
//! Offset forms such as `+00:00` are never produced.

use chrono::{DateTime, SecondsFormat, Utc};

/// Formats an instant in the API wire format.
pub fn format_utc(instant: &DateTime<Utc>) -> String {
    instant.to_rfc3339_opts(SecondsFormat::AutoSi, true)
}

/// Parses an RFC 3339 timestamp (any offset) into UTC.
pub fn parse_utc(value: &str) -> Result<DateTime<Utc>, chrono::ParseError> {
    DateTime::parse_from_rfc3339(value).map(|dt| dt.with_timezone(&Utc))
}

/// Serde adapter for `DateTime<Utc>` fields, used as
/// `#[serde(with = "crate::timestamp::utc_z")]`.
pub mod utc_z {
    use chrono::{DateTime, Utc};
    use serde::{de, Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(instant: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&super::format_utc(instant))
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        super::parse_utc(&raw).map_err(de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_format_uses_z_suffix_and_keeps_fractions() {
        let whole = Utc.with_ymd_and_hms(2025, 12, 25, 10, 30, 0).unwrap();
        assert_eq!(format_utc(&whole), "2025-12-25T10:30:00Z");

        let millis = whole + chrono::Duration::milliseconds(750);
        assert_eq!(format_utc(&millis), "2025-12-25T10:30:00.750Z");

        let micros = whole + chrono::Duration::microseconds(123_456);
        assert_eq!(format_utc(&micros), "2025-12-25T10:30:00.123456Z");
        assert_eq!(parse_utc(&format_utc(&micros)).unwrap(), micros);
    }

    #[test]
    fn test_parse_normalizes_offsets_to_utc() {
        let parsed = parse_utc("2025-12-25T12:30:00+02:00").unwrap();
        assert_eq!(format_utc(&parsed), "2025-12-25T10:30:00Z");
        assert!(parse_utc("25/12/2025").is_err());
    }

    #[test]
    fn test_serde_adapter() {
        #[derive(serde::Serialize, serde::Deserialize)]
        struct Stamp {
            #[serde(with = "utc_z")]
            at: DateTime<Utc>,
        }

        let stamp = Stamp {
            at: Utc.with_ymd_and_hms(2026, 1, 2, 3, 4, 5).unwrap(),
        };
        let json = serde_json::to_string(&stamp).unwrap();
        assert_eq!(json, r#"{"at":"2026-01-02T03:04:05Z"}"#);

        let back: Stamp = serde_json::from_str(&json).unwrap();
        assert_eq!(back.at, stamp.at);
    }
}
