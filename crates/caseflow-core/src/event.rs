//! Event-log records.
//!
//! One [`EventRecord`] is one row of the tabular event log. The column
//! names follow the upstream export format (`case`, `event`, `state`,
//! `completeTime`, `isCancelled`), mapped to Rust field names via serde.
//!
//! Ordering is an external invariant: events must arrive in non-decreasing
//! `complete_time` within and across windows. The engine relies on the
//! upstream splitter for this and does not re-sort.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// Timestamp format used throughout the log files: `YYYY-MM-DD HH:MM:SS`.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// A single event-log row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventRecord {
    /// Case identifier; stable across the case's whole lifetime.
    #[serde(rename = "case")]
    pub case_id: String,
    /// Event name, e.g. `BILLED` or `FIN`.
    #[serde(rename = "event")]
    pub event_name: String,
    /// Process status string carried by the event, e.g. "Billed".
    pub state: String,
    /// Completion timestamp of the event. Required; a missing or
    /// malformed value fails ingestion rather than defaulting.
    #[serde(rename = "completeTime", with = "timestamp_format")]
    pub complete_time: NaiveDateTime,
    /// Whether this event cancels the case. Absent or empty means false.
    #[serde(
        rename = "isCancelled",
        default,
        deserialize_with = "de_cancelled_flag"
    )]
    pub is_cancelled: bool,
}

/// Serde adapter for the `YYYY-MM-DD HH:MM:SS` timestamp columns.
pub mod timestamp_format {
    use super::TIMESTAMP_FORMAT;
    use chrono::NaiveDateTime;
    use serde::{self, Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(time: &NaiveDateTime, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&time.format(TIMESTAMP_FORMAT).to_string())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<NaiveDateTime, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        NaiveDateTime::parse_from_str(raw.trim(), TIMESTAMP_FORMAT).map_err(|e| {
            serde::de::Error::custom(format!("invalid timestamp '{raw}': {e}"))
        })
    }
}

/// Accepts the boolean spellings that show up in exported logs:
/// empty (→ false), `true`/`false` in any case, and `0`/`1`.
fn de_cancelled_flag<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let raw = Option::<String>::deserialize(deserializer)?;
    match raw.as_deref().map(str::trim) {
        None | Some("") => Ok(false),
        Some(s) if s.eq_ignore_ascii_case("true") || s == "1" => Ok(true),
        Some(s) if s.eq_ignore_ascii_case("false") || s == "0" => Ok(false),
        Some(s) => Err(serde::de::Error::custom(format!(
            "invalid boolean '{s}' in isCancelled column"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn read_one(csv_text: &str) -> Result<EventRecord, csv::Error> {
        let mut reader = csv::Reader::from_reader(csv_text.as_bytes());
        reader.deserialize().next().unwrap()
    }

    #[test]
    fn parses_full_row() {
        let record = read_one(
            "case,event,state,completeTime,isCancelled\n\
             A100,BILLED,Billed,2024-01-15 10:30:00,false\n",
        )
        .unwrap();
        assert_eq!(record.case_id, "A100");
        assert_eq!(record.event_name, "BILLED");
        assert_eq!(record.state, "Billed");
        assert_eq!(
            record.complete_time,
            NaiveDate::from_ymd_opt(2024, 1, 15)
                .unwrap()
                .and_hms_opt(10, 30, 0)
                .unwrap()
        );
        assert!(!record.is_cancelled);
    }

    #[test]
    fn missing_cancelled_column_defaults_false() {
        let record = read_one(
            "case,event,state,completeTime\n\
             A100,NEW,InProgress,2024-01-15 10:30:00\n",
        )
        .unwrap();
        assert!(!record.is_cancelled);
    }

    #[test]
    fn python_style_booleans_accepted() {
        let record = read_one(
            "case,event,state,completeTime,isCancelled\n\
             A100,STORNO,Cancelled,2024-01-15 10:30:00,True\n",
        )
        .unwrap();
        assert!(record.is_cancelled);
    }

    #[test]
    fn malformed_timestamp_is_an_error() {
        let result = read_one(
            "case,event,state,completeTime,isCancelled\n\
             A100,NEW,InProgress,15/01/2024,false\n",
        );
        assert!(result.is_err());
    }

    #[test]
    fn empty_timestamp_is_an_error() {
        let result = read_one(
            "case,event,state,completeTime,isCancelled\n\
             A100,NEW,InProgress,,false\n",
        );
        assert!(result.is_err());
    }

    #[test]
    fn round_trips_through_csv() {
        let original = read_one(
            "case,event,state,completeTime,isCancelled\n\
             B7,FIN,Billed,2024-03-01 00:00:01,true\n",
        )
        .unwrap();
        let mut writer = csv::Writer::from_writer(vec![]);
        writer.serialize(&original).unwrap();
        let bytes = writer.into_inner().unwrap();
        let again = read_one(std::str::from_utf8(&bytes).unwrap()).unwrap();
        assert_eq!(original, again);
    }
}
