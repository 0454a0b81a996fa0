//! In-place STATUS rewriting for existing VTODO resources.

use crate::task::TaskStatus;

/// Rewrite the STATUS of the first VTODO in `raw`, inserting it where
/// absent. Later VTODOs are left alone, matching what `parse_todo` reads.
///
/// Every other line of the resource is kept byte-for-byte, so properties
/// this tool does not model (alarms, X- properties, COMPLETED) survive.
pub fn set_todo_status(raw: &str, status: TaskStatus) -> String {
    let newline = if raw.contains("\r\n") { "\r\n" } else { "\n" };
    let status_line = format!("STATUS:{}", status.as_ics_str());

    let mut out = String::with_capacity(raw.len() + status_line.len() + 2);
    // Nesting depth inside the current VTODO; 1 means directly in it.
    let mut todo_depth = 0usize;
    let mut wrote_status = false;
    let mut patched = false;
    let mut skipping_continuation = false;

    for line in raw.split_inclusive('\n') {
        let content = line.trim_end_matches(['\r', '\n']);

        if skipping_continuation {
            if content.starts_with([' ', '\t']) {
                continue;
            }
            skipping_continuation = false;
        }

        let upper = content.to_ascii_uppercase();

        if todo_depth == 0 {
            if !patched && upper == "BEGIN:VTODO" {
                todo_depth = 1;
                wrote_status = false;
            }
            out.push_str(line);
            continue;
        }

        if upper.starts_with("BEGIN:") {
            todo_depth += 1;
        } else if upper.starts_with("END:") {
            if todo_depth == 1 && upper == "END:VTODO" && !wrote_status {
                out.push_str(&status_line);
                out.push_str(newline);
            }
            todo_depth -= 1;
            patched |= todo_depth == 0;
        } else if todo_depth == 1 && (upper.starts_with("STATUS:") || upper.starts_with("STATUS;")) {
            out.push_str(&status_line);
            out.push_str(if line.ends_with('\n') { newline } else { "" });
            wrote_status = true;
            skipping_continuation = true;
            continue;
        }

        out.push_str(line);
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ics::parse_todo;
    use pretty_assertions::assert_eq;

    const COMPLETED: &str = "BEGIN:VCALENDAR\r\n\
VERSION:2.0\r\n\
PRODID:-//Apple Inc.//iOS 17//EN\r\n\
BEGIN:VTODO\r\n\
UID:gradescope-1\r\n\
SUMMARY:HW1\r\n\
DUE:20240302T075900Z\r\n\
STATUS:COMPLETED\r\n\
COMPLETED:20240301T180000Z\r\n\
X-APPLE-SORT-ORDER:12\r\n\
BEGIN:VALARM\r\n\
ACTION:DISPLAY\r\n\
TRIGGER:-PT1H\r\n\
STATUS:IGNORED-BY-US\r\n\
END:VALARM\r\n\
END:VTODO\r\n\
END:VCALENDAR\r\n";

    #[test]
    fn replaces_only_the_todo_status_line() {
        let updated = set_todo_status(COMPLETED, TaskStatus::NeedsAction);

        assert_eq!(
            updated,
            COMPLETED.replace("STATUS:COMPLETED\r\n", "STATUS:NEEDS-ACTION\r\n")
        );
        assert_eq!(
            parse_todo(&updated).unwrap().status,
            Some(TaskStatus::NeedsAction)
        );
    }

    #[test]
    fn inserts_status_when_missing() {
        let raw = "BEGIN:VCALENDAR\nVERSION:2.0\nBEGIN:VTODO\nUID:a\nSUMMARY:HW1\nEND:VTODO\nEND:VCALENDAR\n";

        let updated = set_todo_status(raw, TaskStatus::NeedsAction);

        assert_eq!(
            updated,
            "BEGIN:VCALENDAR\nVERSION:2.0\nBEGIN:VTODO\nUID:a\nSUMMARY:HW1\nSTATUS:NEEDS-ACTION\nEND:VTODO\nEND:VCALENDAR\n"
        );
    }

    #[test]
    fn drops_folded_continuation_of_old_status() {
        let raw = "BEGIN:VTODO\r\nUID:a\r\nSTATUS:COMP\r\n LETED\r\nSUMMARY:x\r\nEND:VTODO\r\n";

        let updated = set_todo_status(raw, TaskStatus::NeedsAction);

        assert_eq!(
            updated,
            "BEGIN:VTODO\r\nUID:a\r\nSTATUS:NEEDS-ACTION\r\nSUMMARY:x\r\nEND:VTODO\r\n"
        );
    }

    #[test]
    fn only_the_first_todo_is_patched() {
        let raw = "BEGIN:VCALENDAR\nBEGIN:VTODO\nUID:a\nSTATUS:COMPLETED\nEND:VTODO\nBEGIN:VTODO\nUID:b\nSTATUS:CANCELLED\nEND:VTODO\nBEGIN:VTODO\nUID:c\nEND:VTODO\nEND:VCALENDAR\n";

        let updated = set_todo_status(raw, TaskStatus::NeedsAction);

        assert_eq!(updated, raw.replacen("STATUS:COMPLETED", "STATUS:NEEDS-ACTION", 1));
        assert_eq!(parse_todo(&updated).unwrap().status, Some(TaskStatus::NeedsAction));
    }

    #[test]
    fn leaves_events_alone() {
        let raw = "BEGIN:VCALENDAR\nBEGIN:VEVENT\nUID:e\nSTATUS:CONFIRMED\nEND:VEVENT\nEND:VCALENDAR\n";

        assert_eq!(set_todo_status(raw, TaskStatus::NeedsAction), raw);
    }
}
