//! Stored dates come in several shapes: RFC 3339 strings written by this
//! service, plain ISO dates, epoch milliseconds and `{seconds, nanoseconds}`
//! wrappers exported from the hosted document store. Everything that compares
//! dates goes through [`normalize`].

use serde::{Deserialize, Serialize};
use time::{
    Date, OffsetDateTime, Time, format_description::well_known::Iso8601,
    format_description::well_known::Rfc3339, macros::format_description,
};

/// A date value as it was found in a document.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(untagged)]
pub enum RawTimestamp {
    At(#[serde(with = "time::serde::rfc3339")] OffsetDateTime),
    Wrapper {
        #[serde(alias = "_seconds")]
        seconds: i64,
        #[serde(default, alias = "_nanoseconds")]
        nanoseconds: i64,
    },
    EpochMillis(i64),
    EpochFloat(f64),
    Text(String),
    Other(serde_json::Value),
}

impl From<OffsetDateTime> for RawTimestamp {
    fn from(value: OffsetDateTime) -> Self {
        Self::At(value)
    }
}

/// Canonical form of a [`RawTimestamp`].
///
/// `Invalid` is never an error: callers decide what it means for the record it
/// guards. Across this workspace an invalid date always makes that record
/// inactive.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Timestamp {
    Valid(OffsetDateTime),
    Invalid,
}

impl Timestamp {
    pub fn valid(self) -> Option<OffsetDateTime> {
        match self {
            Timestamp::Valid(at) => Some(at),
            Timestamp::Invalid => None,
        }
    }

    /// Strictly later than `now`. An instant equal to `now` has already lapsed.
    pub fn is_after(self, now: OffsetDateTime) -> bool {
        matches!(self, Timestamp::Valid(at) if at > now)
    }
}

pub fn normalize(raw: &RawTimestamp) -> Timestamp {
    let instant = match raw {
        RawTimestamp::At(at) => Some(*at),
        RawTimestamp::Wrapper {
            seconds,
            nanoseconds,
        } => from_nanos(i128::from(*seconds) * 1_000_000_000 + i128::from(*nanoseconds)),
        RawTimestamp::EpochMillis(ms) => from_nanos(i128::from(*ms) * 1_000_000),
        RawTimestamp::EpochFloat(ms) if ms.is_finite() => {
            from_nanos((ms.trunc() as i128).saturating_mul(1_000_000))
        }
        RawTimestamp::EpochFloat(_) => None,
        RawTimestamp::Text(text) => parse_text(text.trim()),
        RawTimestamp::Other(_) => None,
    };

    match instant {
        Some(at) => Timestamp::Valid(at),
        None => Timestamp::Invalid,
    }
}

fn from_nanos(nanos: i128) -> Option<OffsetDateTime> {
    OffsetDateTime::from_unix_timestamp_nanos(nanos).ok()
}

fn parse_text(text: &str) -> Option<OffsetDateTime> {
    if text.is_empty() {
        return None;
    }

    if let Ok(at) = OffsetDateTime::parse(text, &Rfc3339) {
        return Some(at);
    }

    if let Ok(at) = OffsetDateTime::parse(text, &Iso8601::DEFAULT) {
        return Some(at);
    }

    // Date-only strings are read as UTC midnight.
    Date::parse(text, format_description!("[year]-[month]-[day]"))
        .ok()
        .map(|date| date.with_time(Time::MIDNIGHT).assume_utc())
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::datetime;

    fn parse(json: &str) -> RawTimestamp {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn rfc3339_string_is_native_instant() {
        let raw = parse(r#""2025-03-01T10:00:00Z""#);
        assert!(matches!(raw, RawTimestamp::At(_)));
        assert_eq!(
            normalize(&raw),
            Timestamp::Valid(datetime!(2025-03-01 10:00:00 UTC))
        );
    }

    #[test]
    fn wrapper_with_underscored_fields() {
        let raw = parse(r#"{"_seconds": 1740823200, "_nanoseconds": 500000000}"#);
        assert_eq!(
            normalize(&raw),
            Timestamp::Valid(datetime!(2025-03-01 10:00:00.5 UTC))
        );
    }

    #[test]
    fn epoch_numbers_are_milliseconds() {
        assert_eq!(
            normalize(&parse("1740823200000")),
            Timestamp::Valid(datetime!(2025-03-01 10:00:00 UTC))
        );
        assert_eq!(
            normalize(&parse("1740823200000.9")),
            Timestamp::Valid(datetime!(2025-03-01 10:00:00 UTC))
        );
    }

    #[test]
    fn date_only_string_is_utc_midnight() {
        assert_eq!(
            normalize(&RawTimestamp::Text("2025-03-01".to_owned())),
            Timestamp::Valid(datetime!(2025-03-01 00:00:00 UTC))
        );
    }

    #[test]
    fn garbage_is_invalid_not_epoch_zero() {
        assert_eq!(normalize(&parse(r#""Invalid Date""#)), Timestamp::Invalid);
        assert_eq!(normalize(&parse("true")), Timestamp::Invalid);
        assert_eq!(normalize(&parse("[1, 2]")), Timestamp::Invalid);
        assert_eq!(
            normalize(&RawTimestamp::EpochFloat(f64::NAN)),
            Timestamp::Invalid
        );
        assert_eq!(
            normalize(&RawTimestamp::EpochMillis(i64::MAX)),
            Timestamp::Invalid
        );
    }

    #[test]
    fn equal_instant_is_not_after() {
        let now = datetime!(2025-03-01 10:00:00 UTC);
        assert!(!Timestamp::Valid(now).is_after(now));
        assert!(Timestamp::Valid(now + time::Duration::milliseconds(1)).is_after(now));
        assert!(!Timestamp::Invalid.is_after(now));
    }

    #[test]
    fn native_instant_serializes_as_rfc3339() {
        let raw = RawTimestamp::from(datetime!(2025-03-01 10:00:00 UTC));
        assert_eq!(
            serde_json::to_string(&raw).unwrap(),
            r#""2025-03-01T10:00:00Z""#
        );
    }
}
