//! Gradescope implementation of the gradesync coursework service.
//!
//! Gradescope has no public API for students, so this logs in through the
//! web form and scrapes the account and course pages.

mod client;
pub mod html;

pub use client::GradescopeClient;
