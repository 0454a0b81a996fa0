//! Coursework service boundary: where local task records come from.

use std::fmt;

use async_trait::async_trait;
use chrono::{DateTime, FixedOffset, Utc};
use tracing::{info, warn};

use crate::error::GradesyncResult;
use crate::task::{Annotations, Due, TaskRecord, TaskStatus};

/// Submission status text that marks an assignment as done.
pub const SUBMITTED: &str = "Submitted";

/// An academic term, e.g. "Spring 2024".
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Term {
    pub season: String,
    pub year: i32,
}

impl Term {
    /// Parse a term heading such as `"Fall 2024"`.
    pub fn parse(text: &str) -> Option<Self> {
        let mut words = text.split_whitespace();
        let season = words.next()?.to_string();
        let year = words.next()?.parse().ok()?;
        if words.next().is_some() {
            return None;
        }
        Some(Term { season, year })
    }
}

impl fmt::Display for Term {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.season, self.year)
    }
}

/// Which courses count as active.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TermFilter {
    pub season: String,
    pub year: i32,
}

impl TermFilter {
    pub fn matches(&self, term: &Term) -> bool {
        term.year == self.year && term.season.eq_ignore_ascii_case(&self.season)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Course {
    pub id: String,
    pub name: String,
    pub short_name: String,
    pub term: Option<Term>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Assignment {
    pub id: String,
    pub name: String,
    pub due_date: Option<DateTime<FixedOffset>>,
    pub submission_status: String,
}

/// A service that lists a student's courses and assignments.
#[async_trait]
pub trait CourseworkService: Send + Sync {
    /// Short lowercase service name, used as the task id prefix.
    fn name(&self) -> &str;

    async fn authenticate(&mut self) -> GradesyncResult<()>;

    async fn list_active_courses(&self, filter: &TermFilter) -> GradesyncResult<Vec<Course>>;

    async fn list_assignments(&self, course_id: &str) -> GradesyncResult<Vec<Assignment>>;

    /// Link back to the assignment's page, if the service has one.
    fn assignment_url(&self, course: &Course, assignment: &Assignment) -> Option<String>;
}

/// Map one assignment to a local task record.
///
/// The due date is carried over as-is; coursework services treat it as the
/// last valid moment while VTODO DUE is exclusive, which errs on the early side.
pub fn assignment_to_task(
    service: &str,
    course: &Course,
    assignment: &Assignment,
    source_url: Option<String>,
) -> TaskRecord {
    let status = if assignment.submission_status == SUBMITTED {
        TaskStatus::Completed
    } else {
        TaskStatus::NeedsAction
    };

    TaskRecord {
        id: Some(format!("{}-{}", service, assignment.id)),
        title: assignment.name.clone(),
        due: assignment
            .due_date
            .map(|dt| Due::DateTimeUtc(dt.with_timezone(&Utc))),
        status: Some(status),
        annotations: Annotations {
            description: source_url.clone(),
            url: source_url,
            categories: vec![display_name(service), course.name.clone()],
        },
    }
}

/// "gradescope" -> "Gradescope"
fn display_name(service: &str) -> String {
    let mut chars = service.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Authenticate and turn every assignment of every active course into a
/// local task record, in course then assignment order.
///
/// A course whose assignments cannot be listed contributes nothing; the
/// remaining courses are still collected.
pub async fn collect_local_tasks<S: CourseworkService + ?Sized>(
    service: &mut S,
    filter: &TermFilter,
) -> GradesyncResult<Vec<TaskRecord>> {
    service.authenticate().await?;

    let courses = service.list_active_courses(filter).await?;
    info!(service = service.name(), count = courses.len(), "Found active courses");

    let mut tasks = Vec::new();
    for course in &courses {
        let assignments = match service.list_assignments(&course.id).await {
            Ok(assignments) => assignments,
            Err(e) => {
                warn!(course = %course.name, error = %e, "Skipping course");
                continue;
            }
        };

        for assignment in &assignments {
            let url = service.assignment_url(course, assignment);
            tasks.push(assignment_to_task(service.name(), course, assignment, url));
        }
    }

    Ok(tasks)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::GradesyncError;
    use chrono::TimeZone;
    use pretty_assertions::assert_eq;
    use std::collections::HashMap;

    fn course(id: &str, name: &str) -> Course {
        Course {
            id: id.into(),
            name: name.into(),
            short_name: name.into(),
            term: Term::parse("Spring 2024"),
        }
    }

    fn assignment(id: &str, name: &str, status: &str) -> Assignment {
        Assignment {
            id: id.into(),
            name: name.into(),
            due_date: Some(
                FixedOffset::west_opt(8 * 3600)
                    .unwrap()
                    .with_ymd_and_hms(2024, 3, 1, 23, 59, 0)
                    .unwrap(),
            ),
            submission_status: status.into(),
        }
    }

    #[test]
    fn term_parsing_and_filtering() {
        let term = Term::parse("Fall 2024").unwrap();
        let filter = TermFilter {
            season: "fall".into(),
            year: 2024,
        };

        assert!(filter.matches(&term));
        assert!(!filter.matches(&Term::parse("Fall 2023").unwrap()));
        assert_eq!(Term::parse("Fall"), None);
        assert_eq!(Term::parse("Fall twenty"), None);
    }

    #[test]
    fn submitted_assignment_maps_to_completed_task() {
        let record = assignment_to_task(
            "gradescope",
            &course("1", "CS 61A"),
            &assignment("42", "HW 1", "Submitted"),
            Some("https://example.test/42".into()),
        );

        assert_eq!(record.id(), Some("gradescope-42"));
        assert_eq!(record.title, "HW 1");
        assert_eq!(record.status, Some(TaskStatus::Completed));
        assert_eq!(
            record.due,
            Some(Due::DateTimeUtc(Utc.with_ymd_and_hms(2024, 3, 2, 7, 59, 0).unwrap()))
        );
        assert_eq!(record.annotations.categories, vec!["Gradescope", "CS 61A"]);
        assert_eq!(record.annotations.url.as_deref(), Some("https://example.test/42"));
    }

    #[test]
    fn anything_but_submitted_needs_action() {
        for status in ["No Submission", "Graded", "submitted", ""] {
            let record = assignment_to_task(
                "gradescope",
                &course("1", "CS 61A"),
                &assignment("42", "HW 1", status),
                None,
            );
            assert_eq!(record.status, Some(TaskStatus::NeedsAction), "{:?}", status);
        }
    }

    struct FakeService {
        courses: Vec<Course>,
        assignments: HashMap<String, Vec<Assignment>>,
        authenticated: bool,
    }

    #[async_trait]
    impl CourseworkService for FakeService {
        fn name(&self) -> &str {
            "fake"
        }

        async fn authenticate(&mut self) -> GradesyncResult<()> {
            self.authenticated = true;
            Ok(())
        }

        async fn list_active_courses(&self, _filter: &TermFilter) -> GradesyncResult<Vec<Course>> {
            assert!(self.authenticated);
            Ok(self.courses.clone())
        }

        async fn list_assignments(&self, course_id: &str) -> GradesyncResult<Vec<Assignment>> {
            self.assignments
                .get(course_id)
                .cloned()
                .ok_or_else(|| GradesyncError::Coursework(format!("course {} is gone", course_id)))
        }

        fn assignment_url(&self, _course: &Course, _assignment: &Assignment) -> Option<String> {
            None
        }
    }

    #[tokio::test]
    async fn failing_course_does_not_stop_collection() {
        let mut service = FakeService {
            courses: vec![course("1", "CS 61A"), course("2", "Gone"), course("3", "Math 54")],
            assignments: HashMap::from([
                ("1".to_string(), vec![assignment("a", "HW 1", "Submitted")]),
                (
                    "3".to_string(),
                    vec![
                        assignment("b", "Quiz 1", "No Submission"),
                        assignment("c", "Quiz 2", "No Submission"),
                    ],
                ),
            ]),
            authenticated: false,
        };
        let filter = TermFilter {
            season: "Spring".into(),
            year: 2024,
        };

        let tasks = collect_local_tasks(&mut service, &filter).await.unwrap();

        let ids: Vec<_> = tasks.iter().filter_map(|t| t.id()).collect();
        assert_eq!(ids, vec!["fake-a", "fake-b", "fake-c"]);
    }
}
