//! VTODO parsing using the icalendar crate's parser.

use icalendar::{
    CalendarDateTime, DatePerhapsTime,
    parser::{Component, Property, read_calendar, unfold},
};

use super::split_text_list;
use crate::error::ParseFailure;
use crate::task::{Annotations, Due, TaskRecord, TaskStatus};

/// Parse the first VTODO of an ICS resource into a TaskRecord.
///
/// Parsing is permissive: only the calendar structure itself has to be
/// valid. A DUE that cannot be typed is kept as [`Due::Raw`], an unknown
/// STATUS is dropped, a missing SUMMARY becomes the empty title.
///
/// TEXT values come back from `read_calendar` already unescaped and are used
/// as they are.
pub fn parse_todo(content: &str) -> Result<TaskRecord, ParseFailure> {
    let unfolded = unfold(content);
    let calendar = read_calendar(&unfolded).map_err(|e| ParseFailure::Malformed(e.to_string()))?;
    let vtodo = calendar
        .components
        .iter()
        .find(|c| c.name == "VTODO")
        .ok_or(ParseFailure::NoTodo)?;

    let id = vtodo
        .find_prop("UID")
        .map(|p| p.val.as_ref().trim().to_string());
    let title = vtodo
        .find_prop("SUMMARY")
        .map(|p| p.val.to_string())
        .unwrap_or_default();
    let due = vtodo.find_prop("DUE").map(parse_due);
    let status = vtodo
        .find_prop("STATUS")
        .and_then(|p| TaskStatus::from_ics_str(p.val.as_ref()));

    Ok(TaskRecord {
        id,
        title,
        due,
        status,
        annotations: parse_annotations(vtodo, &unfolded),
    })
}

fn parse_due(prop: &Property) -> Due {
    match DatePerhapsTime::try_from(prop) {
        Ok(DatePerhapsTime::Date(date)) => Due::Date(date),
        Ok(DatePerhapsTime::DateTime(CalendarDateTime::Utc(dt))) => Due::DateTimeUtc(dt),
        Ok(DatePerhapsTime::DateTime(CalendarDateTime::Floating(dt))) => Due::DateTimeFloating(dt),
        Ok(DatePerhapsTime::DateTime(CalendarDateTime::WithTimezone { date_time, tzid })) => {
            Due::DateTimeZoned {
                datetime: date_time,
                tzid,
            }
        }
        Err(_) => Due::Raw(prop.val.to_string()),
    }
}

fn parse_annotations(vtodo: &Component, unfolded: &str) -> Annotations {
    let description = vtodo.find_prop("DESCRIPTION").map(|p| p.val.to_string());
    let url = vtodo.find_prop("URL").map(|p| p.val.to_string());
    // The parser turns `\,` into `,`, which loses the list separators
    let categories = raw_todo_values(unfolded, "CATEGORIES")
        .into_iter()
        .flat_map(split_text_list)
        .collect();

    Annotations {
        description,
        url,
        categories,
    }
}

/// Still-escaped values of a property of the first VTODO, read from
/// unfolded content. Properties of nested components are ignored.
fn raw_todo_values<'a>(unfolded: &'a str, name: &str) -> Vec<&'a str> {
    let mut values = Vec::new();
    let mut depth = 0usize;

    for line in unfolded.lines() {
        let upper = line.to_ascii_uppercase();

        if upper.starts_with("BEGIN:") {
            if depth > 0 || upper == "BEGIN:VTODO" {
                depth += 1;
            }
            continue;
        }
        if upper.starts_with("END:") {
            if depth == 1 {
                break;
            }
            depth = depth.saturating_sub(1);
            continue;
        }
        if depth != 1 {
            continue;
        }

        let Some(value_start) = value_start(line) else {
            continue;
        };
        let key = line[..value_start - 1]
            .split(';')
            .next()
            .unwrap_or_default();
        if key.eq_ignore_ascii_case(name) {
            values.push(&line[value_start..]);
        }
    }

    values
}

/// Byte offset just past the `:` separating name and parameters from the
/// value. Colons inside quoted parameter values do not count.
fn value_start(line: &str) -> Option<usize> {
    let mut quoted = false;
    for (i, c) in line.char_indices() {
        match c {
            '"' => quoted = !quoted,
            ':' if !quoted => return Some(i + 1),
            _ => {}
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, TimeZone, Utc};
    use pretty_assertions::assert_eq;

    #[test]
    fn parses_gradescope_style_todo() {
        let ics = "BEGIN:VCALENDAR\r\n\
VERSION:2.0\r\n\
PRODID:-//gradesync//EN\r\n\
BEGIN:VTODO\r\n\
UID:gradescope-4242\r\n\
DTSTAMP:20240101T000000Z\r\n\
SUMMARY:Homework 3\\, part 2\r\n\
DUE:20240302T075900Z\r\n\
STATUS:COMPLETED\r\n\
DESCRIPTION:https://www.gradescope.com/courses/1/assignments/4242\r\n\
CATEGORIES:Gradescope\r\n\
CATEGORIES:CS 61A\r\n\
END:VTODO\r\n\
END:VCALENDAR\r\n";

        let record = parse_todo(ics).expect("Should parse");

        assert_eq!(record.id(), Some("gradescope-4242"));
        assert_eq!(record.title, "Homework 3, part 2");
        assert_eq!(
            record.due,
            Some(Due::DateTimeUtc(Utc.with_ymd_and_hms(2024, 3, 2, 7, 59, 0).unwrap()))
        );
        assert_eq!(record.status, Some(TaskStatus::Completed));
        assert_eq!(record.annotations.categories, vec!["Gradescope", "CS 61A"]);
        assert_eq!(
            record.annotations.description.as_deref(),
            Some("https://www.gradescope.com/courses/1/assignments/4242")
        );
    }

    #[test]
    fn parses_date_only_and_zoned_due() {
        let date_only = "BEGIN:VCALENDAR\nVERSION:2.0\nBEGIN:VTODO\nUID:a\nSUMMARY:HW1\nDUE;VALUE=DATE:20240301\nEND:VTODO\nEND:VCALENDAR\n";
        let zoned = "BEGIN:VCALENDAR\nVERSION:2.0\nBEGIN:VTODO\nUID:b\nSUMMARY:HW2\nDUE;TZID=Europe/Berlin:20240301T120000\nEND:VTODO\nEND:VCALENDAR\n";

        assert_eq!(
            parse_todo(date_only).unwrap().due,
            Some(Due::Date(NaiveDate::from_ymd_opt(2024, 3, 1).unwrap()))
        );
        assert_eq!(
            parse_todo(zoned).unwrap().due,
            Some(Due::DateTimeZoned {
                datetime: NaiveDate::from_ymd_opt(2024, 3, 1)
                    .unwrap()
                    .and_hms_opt(12, 0, 0)
                    .unwrap(),
                tzid: "Europe/Berlin".into(),
            })
        );
    }

    #[test]
    fn missing_summary_and_status_are_tolerated() {
        let ics = "BEGIN:VCALENDAR\nVERSION:2.0\nBEGIN:VTODO\nUID:c\nEND:VTODO\nEND:VCALENDAR\n";

        let record = parse_todo(ics).unwrap();

        assert_eq!(record.title, "");
        assert_eq!(record.status, None);
        assert_eq!(record.due, None);
    }

    #[test]
    fn untyped_due_is_kept_raw() {
        let ics = "BEGIN:VCALENDAR\nVERSION:2.0\nBEGIN:VTODO\nUID:d\nSUMMARY:X\nDUE:soon\nEND:VTODO\nEND:VCALENDAR\n";

        assert_eq!(parse_todo(ics).unwrap().due, Some(Due::Raw("soon".into())));
    }

    #[test]
    fn text_values_are_unescaped_once() {
        let ics = "BEGIN:VCALENDAR\r\n\
VERSION:2.0\r\n\
BEGIN:VTODO\r\n\
UID:f\r\n\
SUMMARY:Proj\\\\new\r\n\
DESCRIPTION:see \\\\\\\\share\\nnext\r\n\
CATEGORIES:CS 61A\\, Fall,Math\r\n\
BEGIN:VALARM\r\n\
CATEGORIES:Alarm\r\n\
END:VALARM\r\n\
END:VTODO\r\n\
END:VCALENDAR\r\n";

        let record = parse_todo(ics).unwrap();

        assert_eq!(record.title, "Proj\\new");
        assert_eq!(record.annotations.description.as_deref(), Some("see \\\\share\nnext"));
        assert_eq!(record.annotations.categories, vec!["CS 61A, Fall", "Math"]);
    }

    #[test]
    fn event_only_resource_has_no_todo() {
        let ics = "BEGIN:VCALENDAR\nVERSION:2.0\nBEGIN:VEVENT\nUID:e\nSUMMARY:Lecture\nDTSTART:20240301T100000Z\nEND:VEVENT\nEND:VCALENDAR\n";

        assert_eq!(parse_todo(ics), Err(ParseFailure::NoTodo));
    }
}
