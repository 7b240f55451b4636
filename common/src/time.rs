//! Time utilities for the ledger.

use chrono::{DateTime, SecondsFormat, Utc};

/// A timestamp with timezone (always UTC).
pub type Timestamp = DateTime<Utc>;

/// Get the current timestamp.
pub fn now() -> Timestamp {
    Utc::now()
}

/// Format a timestamp as `YYYY-MM-DDTHH:MM:SS.ffffffZ`.
pub fn format_micros(ts: &Timestamp) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Micros, true)
}

/// Serde adapter serializing timestamps with microsecond precision.
///
/// Use with `#[serde(with = "minibank_common::time::micros")]`.
pub mod micros {
    use super::{format_micros, Timestamp};
    use chrono::{DateTime, Utc};
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(ts: &Timestamp, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&format_micros(ts))
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Timestamp, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        DateTime::parse_from_rfc3339(&raw)
            .map(|ts| ts.with_timezone(&Utc))
            .map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_format_micros() {
        let ts = Utc.with_ymd_and_hms(2024, 2, 1, 12, 30, 5).unwrap()
            + chrono::Duration::microseconds(42);
        assert_eq!(format_micros(&ts), "2024-02-01T12:30:05.000042Z");
    }

    #[test]
    fn test_micros_serde() {
        #[derive(serde::Serialize, serde::Deserialize)]
        struct Wrapper {
            #[serde(with = "micros")]
            at: Timestamp,
        }

        let ts = Utc.with_ymd_and_hms(2024, 2, 1, 0, 0, 0).unwrap();
        let json = serde_json::to_string(&Wrapper { at: ts }).unwrap();
        assert_eq!(json, r#"{"at":"2024-02-01T00:00:00.000000Z"}"#);

        let back: Wrapper = serde_json::from_str(&json).unwrap();
        assert_eq!(back.at, ts);
    }
}
