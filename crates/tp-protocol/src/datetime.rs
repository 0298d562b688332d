//! Wire format for task due dates and reminders.
//!
//! Due dates are naive local date-times rendered as `YYYY-MM-DD HH:MM`.
//! Parsing is lenient about the shape (LLMs and browsers both produce a
//! handful of variants) but never guesses at garbage.

use chrono::{DateTime, NaiveDate, NaiveDateTime};

/// Canonical rendering used in API responses and LLM prompts.
pub const WIRE_FORMAT: &str = "%Y-%m-%d %H:%M";

const ACCEPTED_FORMATS: &[&str] = &[
    WIRE_FORMAT,
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M:%S%.f",
];

/// Render a date-time in the wire format.
pub fn format(value: &NaiveDateTime) -> String {
    value.format(WIRE_FORMAT).to_string()
}

/// Parse any accepted date-time shape. Returns `None` for empty input,
/// placeholders like `"null"`, or anything unrecognised.
pub fn parse_lenient(input: &str) -> Option<NaiveDateTime> {
    let trimmed = input.trim();
    if trimmed.is_empty() || trimmed.eq_ignore_ascii_case("null") {
        return None;
    }

    for fmt in ACCEPTED_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(trimmed, fmt) {
            return Some(dt);
        }
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(trimmed) {
        return Some(dt.naive_local());
    }

    NaiveDate::parse_from_str(trimmed, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
}

/// Serde adapter for `Option<NaiveDateTime>` fields.
///
/// Serializes to the wire format (or `null`). Deserializes `null`, the
/// empty string, and `"null"` as `None`; any other unparseable string is
/// rejected.
pub mod optional {
    use chrono::NaiveDateTime;
    use serde::{Deserialize, Deserializer, Serializer, de};

    pub fn serialize<S>(value: &Option<NaiveDateTime>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match value {
            Some(dt) => serializer.serialize_str(&super::format(dt)),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<NaiveDateTime>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw: Option<String> = Option::deserialize(deserializer)?;
        match raw {
            None => Ok(None),
            Some(s) if s.trim().is_empty() || s.trim().eq_ignore_ascii_case("null") => Ok(None),
            Some(s) => super::parse_lenient(&s)
                .map(Some)
                .ok_or_else(|| de::Error::custom(format!("invalid date-time: {s}"))),
        }
    }
}

/// Serde adapter for patch fields of type `Option<Option<NaiveDateTime>>`.
///
/// Pair it with `#[serde(default)]`: an absent field stays `None` (leave
/// unchanged), an explicit `null` becomes `Some(None)` (clear), and a date
/// becomes `Some(Some(_))`.
pub mod patch {
    use chrono::NaiveDateTime;
    use serde::{Deserializer, Serializer};

    pub fn serialize<S>(
        value: &Option<Option<NaiveDateTime>>,
        serializer: S,
    ) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match value {
            Some(inner) => super::optional::serialize(inner, serializer),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<Option<NaiveDateTime>>, D::Error>
    where
        D: Deserializer<'de>,
    {
        super::optional::deserialize(deserializer).map(Some)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, Timelike};

    fn at(y: i32, m: u32, d: u32, h: u32, min: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_hms_opt(h, min, 0)
            .unwrap()
    }

    #[test]
    fn parses_wire_format() {
        assert_eq!(parse_lenient("2025-03-14 15:30"), Some(at(2025, 3, 14, 15, 30)));
    }

    #[test]
    fn parses_iso_variants() {
        assert_eq!(parse_lenient("2025-03-14T15:30"), Some(at(2025, 3, 14, 15, 30)));
        assert_eq!(parse_lenient("2025-03-14T15:30:00"), Some(at(2025, 3, 14, 15, 30)));
        let rfc = parse_lenient("2025-03-14T15:30:00+08:00").unwrap();
        assert_eq!(rfc.hour(), 15);
    }

    #[test]
    fn date_only_is_midnight() {
        assert_eq!(parse_lenient("2025-03-14"), Some(at(2025, 3, 14, 0, 0)));
    }

    #[test]
    fn placeholders_and_garbage_are_none() {
        assert_eq!(parse_lenient(""), None);
        assert_eq!(parse_lenient("null"), None);
        assert_eq!(parse_lenient("tomorrow afternoon"), None);
        assert_eq!(parse_lenient("YYYY-MM-DD HH:mm"), None);
    }

    #[test]
    fn format_drops_seconds() {
        let dt = at(2025, 1, 2, 3, 4).with_second(59).unwrap();
        assert_eq!(format(&dt), "2025-01-02 03:04");
    }
}
