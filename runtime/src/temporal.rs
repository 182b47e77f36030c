//! Literals of the date and time family, read as and written from instants in UTC.

use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime, NaiveTime, SecondsFormat, Utc};

use crate::{meta::Error, Timestamp};

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub(crate) enum Temporal {
    DateTime,
    Date,
    Time,
    GDay,
    GMonth,
    GMonthDay,
    GYear,
    GYearMonth,
}

impl Temporal {
    fn type_name(self) -> &'static str {
        match self {
            Self::DateTime => "dateTime",
            Self::Date => "date",
            Self::Time => "time",
            Self::GDay => "gDay",
            Self::GMonth => "gMonth",
            Self::GMonthDay => "gMonthDay",
            Self::GYear => "gYear",
            Self::GYearMonth => "gYearMonth",
        }
    }

    pub(crate) fn format(self, value: Timestamp) -> String {
        let value = DateTime::<Utc>::from(value);
        let pattern = match self {
            Self::DateTime => return value.to_rfc3339_opts(SecondsFormat::AutoSi, true),
            Self::Date => "%Y-%m-%dZ",
            Self::Time => "%H:%M:%S%.fZ",
            Self::GDay => "---%dZ",
            Self::GMonth => "--%mZ",
            Self::GMonthDay => "--%m-%dZ",
            Self::GYear => "%YZ",
            Self::GYearMonth => "%Y-%mZ",
        };
        value.format(pattern).to_string()
    }

    /// Fields the type lacks default to the start of 1970; a missing timezone means UTC.
    pub(crate) fn parse(self, literal: &str) -> Result<Timestamp, Error> {
        let invalid = || Error::InvalidLiteral {
            type_name: self.type_name(),
            literal: literal.into(),
        };
        let (local, offset) = split_timezone(literal.trim()).ok_or_else(invalid)?;
        let day = |year: i32, month: u32, day: u32| {
            NaiveDate::from_ymd_opt(year, month, day)?.and_hms_opt(0, 0, 0)
        };
        let naive: Option<NaiveDateTime> = match self {
            Self::DateTime => NaiveDateTime::parse_from_str(local, "%Y-%m-%dT%H:%M:%S%.f").ok(),
            Self::Date => NaiveDate::parse_from_str(local, "%Y-%m-%d")
                .ok()
                .and_then(|date| date.and_hms_opt(0, 0, 0)),
            Self::Time => NaiveTime::parse_from_str(local, "%H:%M:%S%.f")
                .ok()
                .and_then(|time| Some(NaiveDate::from_ymd_opt(1970, 1, 1)?.and_time(time))),
            Self::GYear => local.parse().ok().and_then(|year| day(year, 1, 1)),
            Self::GYearMonth => local
                .rsplit_once('-')
                .and_then(|(year, month)| day(year.parse().ok()?, month.parse().ok()?, 1)),
            Self::GMonth => local
                .strip_prefix("--")
                .and_then(|month| day(1970, month.parse().ok()?, 1)),
            Self::GMonthDay => local
                .strip_prefix("--")
                .and_then(|rest| rest.split_once('-'))
                .and_then(|(month, d)| day(1970, month.parse().ok()?, d.parse().ok()?)),
            Self::GDay => local
                .strip_prefix("---")
                .and_then(|d| day(1970, 1, d.parse().ok()?)),
        };
        let utc = naive.ok_or_else(invalid)? - Duration::minutes(offset);
        Ok(DateTime::<Utc>::from_naive_utc_and_offset(utc, Utc).into())
    }
}

/// Splits a trailing `Z` or `±hh:mm` off `literal`, with the offset in minutes.
fn split_timezone(literal: &str) -> Option<(&str, i64)> {
    if let Some(local) = literal.strip_suffix('Z') {
        return Some((local, 0));
    }
    let bytes = literal.as_bytes();
    let n = bytes.len();
    if n > 6 && matches!(bytes[n - 6], b'+' | b'-') && bytes[n - 3] == b':' {
        let (local, zone) = literal.split_at(n - 6);
        let hours: i64 = zone.get(1..3)?.parse().ok()?;
        let minutes: i64 = zone.get(4..6)?.parse().ok()?;
        let sign = if zone.starts_with('-') { -1 } else { 1 };
        return Some((local, sign * (hours * 60 + minutes)));
    }
    Some((literal, 0))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::{Duration as StdDuration, UNIX_EPOCH};

    fn at(seconds: u64) -> Timestamp {
        UNIX_EPOCH + StdDuration::from_secs(seconds)
    }

    #[test]
    fn timezones_shift_to_utc() {
        let noon = Temporal::DateTime.parse("1970-01-02T12:00:00Z").unwrap();
        assert_eq!(noon, at(86_400 + 12 * 3600));
        assert_eq!(
            Temporal::DateTime.parse("1970-01-02T14:30:00+02:30").unwrap(),
            noon
        );
        assert_eq!(Temporal::DateTime.parse("1970-01-02T12:00:00").unwrap(), noon);
        assert_eq!(Temporal::DateTime.format(noon), "1970-01-02T12:00:00Z");
    }

    #[test]
    fn partial_dates_start_in_1970() {
        assert_eq!(Temporal::Date.parse("1970-01-03").unwrap(), at(2 * 86_400));
        assert_eq!(Temporal::Time.parse("00:01:00").unwrap(), at(60));
        assert_eq!(Temporal::GDay.parse("---02").unwrap(), at(86_400));
        assert_eq!(Temporal::GMonthDay.parse("--01-02Z").unwrap(), at(86_400));
        assert_eq!(Temporal::GYear.parse("1970").unwrap(), at(0));
        assert_eq!(Temporal::GYearMonth.parse("1970-01").unwrap(), at(0));
        assert_eq!(Temporal::GMonth.format(at(40 * 86_400)), "--02Z");
        assert_eq!(Temporal::Date.format(at(2 * 86_400)), "1970-01-03Z");
    }

    #[test]
    fn malformed_literals_are_rejected() {
        assert!(matches!(
            Temporal::Date.parse("1970-13-01"),
            Err(Error::InvalidLiteral { type_name: "date", .. })
        ));
        assert!(Temporal::GDay.parse("--02").is_err());
        assert!(Temporal::DateTime.parse("1970-01-02T12:00:00+2:00").is_err());
    }
}
