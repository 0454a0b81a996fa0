//! Due-date normalization.
//!
//! Local and remote due values arrive in different shapes (date-only,
//! UTC, floating, TZID-qualified, or untyped text). They are collapsed into
//! a single comparable [`Instant`] before the reconciler looks at them.

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

use crate::task::Due;

/// A comparable point in time.
///
/// A floating instant is a wall-clock time with no zone attached and is
/// never equal to an absolute one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Instant {
    Floating(NaiveDateTime),
    Absolute(DateTime<Utc>),
}

impl From<Instant> for Due {
    fn from(instant: Instant) -> Self {
        match instant {
            Instant::Floating(dt) => Due::DateTimeFloating(dt),
            Instant::Absolute(dt) => Due::DateTimeUtc(dt),
        }
    }
}

/// Normalize a due value. Absent or uninterpretable input yields `None`.
pub fn normalize(due: Option<&Due>) -> Option<Instant> {
    match due? {
        Due::Date(date) => Some(midnight(*date)),
        Due::DateTimeUtc(dt) => Some(Instant::Absolute(*dt)),
        Due::DateTimeFloating(dt) => Some(Instant::Floating(*dt)),
        Due::DateTimeZoned { datetime, tzid } => Some(zoned(*datetime, tzid)),
        Due::Raw(text) => unwrap_raw(text),
    }
}

fn midnight(date: NaiveDate) -> Instant {
    Instant::Floating(date.and_time(NaiveTime::MIN))
}

fn zoned(datetime: NaiveDateTime, tzid: &str) -> Instant {
    tzid.parse::<Tz>()
        .ok()
        .and_then(|tz| tz.from_local_datetime(&datetime).earliest())
        .map(|dt| Instant::Absolute(dt.with_timezone(&Utc)))
        .unwrap_or(Instant::Floating(datetime))
}

/// Unwrap one level of untyped DUE text.
fn unwrap_raw(text: &str) -> Option<Instant> {
    let text = text.trim();

    if let Some(utc) = text.strip_suffix('Z') {
        if let Ok(dt) = NaiveDateTime::parse_from_str(utc, "%Y%m%dT%H%M%S") {
            return Some(Instant::Absolute(dt.and_utc()));
        }
    }
    if let Ok(dt) = NaiveDateTime::parse_from_str(text, "%Y%m%dT%H%M%S") {
        return Some(Instant::Floating(dt));
    }
    if let Ok(date) = NaiveDate::parse_from_str(text, "%Y%m%d") {
        return Some(midnight(date));
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
        return Some(Instant::Absolute(dt.with_timezone(&Utc)));
    }
    if let Ok(date) = NaiveDate::parse_from_str(text, "%Y-%m-%d") {
        return Some(midnight(date));
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn absent_is_absent() {
        assert_eq!(normalize(None), None);
        assert_eq!(normalize(None), normalize(None));
    }

    #[test]
    fn date_becomes_floating_midnight() {
        let due = Due::Date(date(2024, 3, 1));
        let floating = Due::DateTimeFloating(date(2024, 3, 1).and_hms_opt(0, 0, 0).unwrap());

        assert_eq!(normalize(Some(&due)), normalize(Some(&floating)));
    }

    #[test]
    fn floating_never_equals_utc() {
        let wall = date(2024, 3, 1).and_hms_opt(0, 0, 0).unwrap();
        let floating = Due::DateTimeFloating(wall);
        let utc = Due::DateTimeUtc(wall.and_utc());

        assert_ne!(normalize(Some(&floating)), normalize(Some(&utc)));
    }

    #[test]
    fn known_tzid_resolves_to_absolute() {
        let due = Due::DateTimeZoned {
            datetime: date(2024, 3, 1).and_hms_opt(23, 59, 0).unwrap(),
            tzid: "America/Los_Angeles".into(),
        };
        let expected = Utc.with_ymd_and_hms(2024, 3, 2, 7, 59, 0).unwrap();

        assert_eq!(normalize(Some(&due)), Some(Instant::Absolute(expected)));
    }

    #[test]
    fn unknown_tzid_keeps_wall_clock() {
        let wall = date(2024, 3, 1).and_hms_opt(9, 0, 0).unwrap();
        let due = Due::DateTimeZoned {
            datetime: wall,
            tzid: "Mars/Olympus_Mons".into(),
        };

        assert_eq!(normalize(Some(&due)), Some(Instant::Floating(wall)));
    }

    #[test]
    fn raw_text_is_unwrapped_once() {
        let expected = Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap();

        assert_eq!(
            normalize(Some(&Due::Raw("20240301T120000Z".into()))),
            Some(Instant::Absolute(expected))
        );
        assert_eq!(
            normalize(Some(&Due::Raw("2024-03-01T04:00:00-08:00".into()))),
            Some(Instant::Absolute(expected))
        );
        assert_eq!(
            normalize(Some(&Due::Raw("20240301".into()))),
            normalize(Some(&Due::Date(date(2024, 3, 1))))
        );
    }

    #[test]
    fn unparseable_raw_text_is_absent() {
        assert_eq!(normalize(Some(&Due::Raw("next tuesday".into()))), None);
        assert_eq!(normalize(Some(&Due::Raw(String::new()))), None);
    }

    #[test]
    fn reinjecting_a_normalized_value_is_idempotent() {
        let inputs = [
            Due::Date(date(2024, 3, 8)),
            Due::DateTimeUtc(Utc.with_ymd_and_hms(2024, 3, 8, 7, 59, 0).unwrap()),
            Due::DateTimeFloating(date(2024, 3, 8).and_hms_opt(17, 30, 0).unwrap()),
            Due::DateTimeZoned {
                datetime: date(2024, 3, 8).and_hms_opt(23, 59, 0).unwrap(),
                tzid: "Europe/Berlin".into(),
            },
            Due::Raw("20240308T120000".into()),
        ];

        for due in inputs {
            let first = normalize(Some(&due)).unwrap();
            let again = normalize(Some(&Due::from(first)));
            assert_eq!(again, Some(first), "not idempotent for {:?}", due);
        }
    }
}
