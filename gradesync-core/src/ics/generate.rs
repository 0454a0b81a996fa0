//! VTODO generation.

use chrono::Utc;
use icalendar::{Calendar, Component, Property, ValueType};

use crate::error::{GradesyncError, GradesyncResult};
use crate::task::{Due, TaskRecord};

const PRODID: &str = "-//gradesync//EN";

/// Generate .ics content holding a single VTODO for a record.
pub fn generate_todo(record: &TaskRecord) -> GradesyncResult<String> {
    let id = record
        .id()
        .ok_or_else(|| GradesyncError::IcsGenerate("task has no UID".into()))?;

    let mut todo = icalendar::Todo::new();
    todo.uid(id);
    todo.summary(&record.title);
    todo.add_property("DTSTAMP", Utc::now().format("%Y%m%dT%H%M%SZ").to_string());

    if let Some(ref due) = record.due {
        add_due_property(&mut todo, due);
    }

    if let Some(status) = record.status {
        todo.add_property("STATUS", status.as_ics_str());
    }

    let annotations = &record.annotations;
    if let Some(ref description) = annotations.description {
        todo.description(description);
    }
    if let Some(ref url) = annotations.url {
        todo.add_property("URL", url);
    }
    for category in &annotations.categories {
        todo.append_multi_property(Property::new("CATEGORIES", category));
    }

    let mut cal = Calendar::new();
    cal.push(todo.done());
    let cal = cal.done();

    Ok(strip_ics_bloat(&cal.to_string()))
}

/// Normalize the icalendar crate's output: our PRODID, no CALSCALE
/// (GREGORIAN is the default), CRLF line endings.
fn strip_ics_bloat(ics: &str) -> String {
    let mut result = String::with_capacity(ics.len());

    for line in ics.lines() {
        if line.starts_with("PRODID:") {
            result.push_str("PRODID:");
            result.push_str(PRODID);
            result.push_str("\r\n");
            continue;
        }

        if line == "CALSCALE:GREGORIAN" {
            continue;
        }

        result.push_str(line);
        result.push_str("\r\n");
    }

    result
}

fn add_due_property(todo: &mut icalendar::Todo, due: &Due) {
    match due {
        Due::Date(d) => {
            let mut prop = Property::new("DUE", d.format("%Y%m%d").to_string());
            prop.append_parameter(ValueType::Date);
            todo.append_property(prop);
        }
        Due::DateTimeUtc(dt) => {
            todo.add_property("DUE", dt.format("%Y%m%dT%H%M%SZ").to_string());
        }
        Due::DateTimeFloating(dt) => {
            todo.add_property("DUE", dt.format("%Y%m%dT%H%M%S").to_string());
        }
        Due::DateTimeZoned { datetime, tzid } => {
            let mut prop = Property::new("DUE", datetime.format("%Y%m%dT%H%M%S").to_string());
            prop.add_parameter("TZID", tzid);
            todo.append_property(prop);
        }
        Due::Raw(value) => {
            todo.add_property("DUE", value);
        }
    }
}
