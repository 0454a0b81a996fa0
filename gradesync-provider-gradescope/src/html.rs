//! Page scraping for the Gradescope web UI.
//!
//! Every function here works on an HTML string so the parsing can be
//! exercised without a network connection.

use anyhow::{Result, anyhow};
use chrono::{DateTime, FixedOffset};
use scraper::{ElementRef, Html, Selector};
use tracing::debug;

use gradesync_core::coursework::{Assignment, Course, Term};

/// Format of the `datetime` attribute on due-date elements.
const DUE_DATE_FORMAT: &str = "%Y-%m-%d %H:%M:%S %z";

/// Submission status used for assignments whose cell shows a score.
pub const GRADED: &str = "Graded";

fn selector(css: &str) -> Result<Selector> {
    Selector::parse(css).map_err(|e| anyhow!("Invalid selector {css:?}: {e}"))
}

fn text_of(element: ElementRef<'_>) -> String {
    element
        .text()
        .collect::<Vec<_>>()
        .join(" ")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// The CSRF token from the `csrf-token` meta tag.
pub fn csrf_token(page: &str) -> Result<Option<String>> {
    let document = Html::parse_document(page);
    let meta = selector(r#"meta[name="csrf-token"]"#)?;

    Ok(document
        .select(&meta)
        .next()
        .and_then(|m| m.value().attr("content"))
        .map(str::to_string))
}

/// Courses listed under "Student Courses" on the account page.
///
/// Accounts without instructor courses have no section headings at all; the
/// first course list is then the student list.
pub fn student_courses(page: &str) -> Result<Vec<Course>> {
    let document = Html::parse_document(page);
    let heading = selector("h1.pageHeading")?;
    let course_list = selector("div.courseList")?;

    let student_heading = document
        .select(&heading)
        .find(|h| text_of(*h).eq_ignore_ascii_case("Student Courses"));

    let list = match student_heading {
        Some(heading) => heading
            .next_siblings()
            .filter_map(ElementRef::wrap)
            .find(|e| e.value().classes().any(|c| c == "courseList")),
        None if document.select(&heading).next().is_none() => document.select(&course_list).next(),
        None => None,
    };

    let Some(list) = list else {
        return Ok(Vec::new());
    };

    let course_box = selector("a.courseBox")?;
    let short_name = selector(".courseBox--shortname")?;
    let full_name = selector(".courseBox--name")?;

    let mut courses = Vec::new();
    let mut term = None;

    for child in list.children().filter_map(ElementRef::wrap) {
        let is = |class: &str| child.value().classes().any(|c| c == class);

        if is("courseList--term") {
            term = Term::parse(&text_of(child));
            continue;
        }
        if !is("courseList--coursesForTerm") {
            continue;
        }

        for course in child.select(&course_box) {
            let Some(id) = course
                .value()
                .attr("href")
                .and_then(|href| path_segment_after(href, "courses"))
            else {
                continue;
            };

            let short = course.select(&short_name).next().map(text_of).unwrap_or_default();
            let name = course
                .select(&full_name)
                .next()
                .map(text_of)
                .filter(|n| !n.is_empty())
                .unwrap_or_else(|| short.clone());

            courses.push(Course {
                id,
                name,
                short_name: short,
                term: term.clone(),
            });
        }
    }

    Ok(courses)
}

/// Assignments from the student assignment table of a course page.
pub fn student_assignments(page: &str) -> Result<Vec<Assignment>> {
    let document = Html::parse_document(page);
    let row = selector("#assignments-student-table tbody tr")?;
    let primary = selector("th")?;
    let link = selector("a")?;
    let button = selector("button[data-assignment-id]")?;
    let status = selector(".submissionStatus--text")?;
    let score = selector(".submissionStatus--score")?;
    let due = selector("time.submissionTimeChart--dueDate")?;

    let mut assignments = Vec::new();

    for row in document.select(&row) {
        let Some(cell) = row.select(&primary).next() else {
            continue;
        };

        let anchor = cell.select(&link).next();
        let submit_button = cell.select(&button).next();

        let id = anchor
            .and_then(|a| a.value().attr("href"))
            .and_then(|href| path_segment_after(href, "assignments"))
            .or_else(|| {
                submit_button
                    .and_then(|b| b.value().attr("data-assignment-id"))
                    .map(str::to_string)
            });

        let Some(id) = id else {
            debug!(row = %text_of(row), "Skipping assignment row without an id");
            continue;
        };

        let name = match (anchor, submit_button) {
            (Some(a), _) => text_of(a),
            (None, Some(b)) => b
                .value()
                .attr("data-assignment-title")
                .map(str::to_string)
                .unwrap_or_else(|| text_of(b)),
            (None, None) => text_of(cell),
        };

        let submission_status = if row.select(&score).next().is_some() {
            GRADED.to_string()
        } else {
            row.select(&status)
                .next()
                .map(text_of)
                .unwrap_or_default()
        };

        let due_date = row
            .select(&due)
            .next()
            .and_then(|t| t.value().attr("datetime"))
            .and_then(parse_due_date);

        assignments.push(Assignment {
            id,
            name,
            due_date,
            submission_status,
        });
    }

    Ok(assignments)
}

fn parse_due_date(value: &str) -> Option<DateTime<FixedOffset>> {
    DateTime::parse_from_str(value.trim(), DUE_DATE_FORMAT).ok()
}

/// `("/courses/12/assignments/34/submissions/5", "assignments")` -> `"34"`
fn path_segment_after(href: &str, marker: &str) -> Option<String> {
    let mut segments = href.split(['/', '?', '#']).filter(|s| !s.is_empty());
    segments.find(|s| *s == marker)?;
    segments.next().map(str::to_string)
}
