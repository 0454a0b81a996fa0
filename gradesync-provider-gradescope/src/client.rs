//! Logged-in Gradescope session.

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use tracing::{debug, info};

use gradesync_core::coursework::{Assignment, Course, CourseworkService, TermFilter};
use gradesync_core::error::{GradesyncError, GradesyncResult};

use crate::html;

const BASE_URL: &str = "https://www.gradescope.com";

pub struct GradescopeClient {
    http: Client,
    base_url: String,
    email: String,
    password: String,
}

impl GradescopeClient {
    pub fn new(email: &str, password: &str) -> GradesyncResult<Self> {
        Self::with_base_url(BASE_URL, email, password)
    }

    pub fn with_base_url(base_url: &str, email: &str, password: &str) -> GradesyncResult<Self> {
        let http = Client::builder()
            .cookie_store(true)
            .user_agent(concat!("gradesync/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| GradesyncError::Coursework(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            email: email.to_string(),
            password: password.to_string(),
        })
    }

    async fn get_page(&self, path: &str) -> Result<String> {
        let url = format!("{}{}", self.base_url, path);
        let response = self
            .http
            .get(&url)
            .send()
            .await
            .with_context(|| format!("Failed to fetch {}", url))?;

        if !response.status().is_success() {
            anyhow::bail!("Failed to fetch {} (status {})", url, response.status());
        }

        response.text().await.context("Failed to read response body")
    }

    async fn login(&self) -> GradesyncResult<()> {
        let landing = self.get_page("/").await.map_err(coursework_error)?;
        let token = html::csrf_token(&landing)
            .map_err(coursework_error)?
            .ok_or_else(|| GradesyncError::Authentication("No CSRF token on login page".into()))?;

        let form = [
            ("utf8", "✓"),
            ("authenticity_token", token.as_str()),
            ("session[email]", self.email.as_str()),
            ("session[password]", self.password.as_str()),
            ("session[remember_me]", "0"),
            ("commit", "Log In"),
            ("session[remember_me_sso]", "0"),
        ];

        let response = self
            .http
            .post(format!("{}/login", self.base_url))
            .form(&form)
            .send()
            .await
            .map_err(|e| GradesyncError::Authentication(format!("Login request failed: {e}")))?;

        // A rejected login renders the form again instead of redirecting
        if !response.status().is_success() || response.url().path().starts_with("/login") {
            return Err(GradesyncError::Authentication(
                "Gradescope rejected the email or password".into(),
            ));
        }

        debug!(landed = response.url().path(), "Logged in to Gradescope");
        Ok(())
    }
}

#[async_trait]
impl CourseworkService for GradescopeClient {
    fn name(&self) -> &str {
        "gradescope"
    }

    async fn authenticate(&mut self) -> GradesyncResult<()> {
        self.login().await
    }

    async fn list_active_courses(&self, filter: &TermFilter) -> GradesyncResult<Vec<Course>> {
        let page = self.get_page("/account").await.map_err(coursework_error)?;
        let courses = html::student_courses(&page).map_err(coursework_error)?;
        let total = courses.len();

        let active: Vec<Course> = courses
            .into_iter()
            .filter(|c| c.term.as_ref().is_some_and(|t| filter.matches(t)))
            .collect();

        info!(total, active = active.len(), season = %filter.season, year = filter.year, "Filtered courses by term");
        Ok(active)
    }

    async fn list_assignments(&self, course_id: &str) -> GradesyncResult<Vec<Assignment>> {
        let page = self
            .get_page(&format!("/courses/{}", course_id))
            .await
            .map_err(coursework_error)?;

        html::student_assignments(&page).map_err(coursework_error)
    }

    fn assignment_url(&self, course: &Course, assignment: &Assignment) -> Option<String> {
        Some(format!(
            "{}/courses/{}/assignments/{}",
            self.base_url, course.id, assignment.id
        ))
    }
}

fn coursework_error(e: anyhow::Error) -> GradesyncError {
    GradesyncError::Coursework(format!("{e:#}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn assignment_url_points_at_the_assignment_page() {
        let client = GradescopeClient::new("me@example.edu", "pw").unwrap();
        let course = Course {
            id: "111".into(),
            name: "CS 61A".into(),
            short_name: "CS 61A".into(),
            term: None,
        };
        let assignment = Assignment {
            id: "5001".into(),
            name: "Homework 1".into(),
            due_date: None,
            submission_status: "Submitted".into(),
        };

        assert_eq!(
            client.assignment_url(&course, &assignment).as_deref(),
            Some("https://www.gradescope.com/courses/111/assignments/5001")
        );
        assert_eq!(client.name(), "gradescope");
    }

    #[test]
    fn base_url_trailing_slash_is_dropped() {
        let client = GradescopeClient::with_base_url("http://localhost:3000/", "a", "b").unwrap();
        assert_eq!(client.base_url, "http://localhost:3000");
    }
}
