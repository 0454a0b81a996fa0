//! Core of gradesync.
//!
//! Shared by the CLI and the provider crates:
//! - `task` / `normalize`: the provider-neutral task model
//! - `reconcile`: per-record decisions between local and remote tasks
//! - `ics`: VTODO encoding and decoding
//! - `coursework` / `store`: the two provider seams
//! - `sync`: drives a reconciliation run against a store

pub mod config;
pub mod coursework;
pub mod error;
pub mod ics;
pub mod normalize;
pub mod reconcile;
pub mod store;
pub mod sync;
pub mod task;

pub use error::{GradesyncError, GradesyncResult, ParseFailure};
pub use task::{Annotations, Due, TaskRecord, TaskStatus};
