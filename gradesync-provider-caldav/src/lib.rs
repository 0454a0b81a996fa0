//! CalDAV implementation of the gradesync calendar store.

pub mod caldav;
mod store;

pub use store::{CalDavStore, CalDavTask};
