use thiserror::Error;
use time::format_description::well_known::Rfc3339;
use time::format_description::BorrowedFormatItem;
use time::macros::format_description;
use time::{Date, OffsetDateTime};

const DATE_FORMAT: &[BorrowedFormatItem<'static>] = format_description!("[year]-[month]-[day]");

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid date '{0}', expected YYYY-MM-DD")]
pub struct InvalidDate(String);

/// Parses a client supplied calendar day.
///
/// Accepts `YYYY-MM-DD` or a full RFC 3339 timestamp. A timestamp contributes
/// its literal date part and is never shifted to another offset, so a date
/// means the same thing whatever timezone the client was in.
pub fn parse_calendar_date(raw: &str) -> Result<Date, InvalidDate> {
    let trimmed = raw.trim();
    let parsed = if trimmed.len() == 10 {
        Date::parse(trimmed, DATE_FORMAT).ok()
    } else {
        OffsetDateTime::parse(trimmed, &Rfc3339)
            .ok()
            .map(|at| at.date())
    };
    parsed.ok_or_else(|| InvalidDate(raw.to_string()))
}

pub fn format_calendar_date(date: Date) -> String {
    date.format(DATE_FORMAT)
        .unwrap_or_else(|_| date.to_string())
}

/// Serde adapter keeping calendar days as `YYYY-MM-DD` strings.
pub mod serde_date {
    use serde::{Deserialize, Deserializer, Serializer};
    use time::Date;

    pub fn serialize<S: Serializer>(date: &Date, serializer: S) -> Result<S::Ok, S::Error> {
        let text = date
            .format(super::DATE_FORMAT)
            .map_err(serde::ser::Error::custom)?;
        serializer.serialize_str(&text)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Date, D::Error> {
        let raw = String::deserialize(deserializer)?;
        super::parse_calendar_date(&raw).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::date;

    #[test]
    fn parses_plain_days() {
        assert_eq!(parse_calendar_date("2025-01-15").unwrap(), date!(2025 - 01 - 15));
        assert_eq!(parse_calendar_date(" 2024-02-29 ").unwrap(), date!(2024 - 02 - 29));
    }

    #[test]
    fn timestamp_suffix_never_moves_the_day() {
        assert_eq!(
            parse_calendar_date("2025-01-15T23:30:00-08:00").unwrap(),
            date!(2025 - 01 - 15)
        );
        assert_eq!(
            parse_calendar_date("2025-01-15T00:00:00.000Z").unwrap(),
            date!(2025 - 01 - 15)
        );
    }

    #[test]
    fn rejects_bad_days() {
        for raw in [
            "",
            "2025-1-15",
            "2025-02-30",
            "15-01-2025",
            "2025-01-15x",
            "2025/01/15",
            "2025-01-15Tgarbage",
            "2025-01-15 whatever",
            "2025-01-15T10:00:00",
        ] {
            assert!(parse_calendar_date(raw).is_err(), "{raw} should not parse");
        }
    }

    #[test]
    fn formats_back_to_the_wire_form() {
        assert_eq!(format_calendar_date(date!(2025 - 03 - 07)), "2025-03-07");
    }
}
