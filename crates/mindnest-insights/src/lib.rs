//! Keyword-based text analytics over journal entries. Everything here is
//! pure and synchronous; callers load the entries and pass them in.

pub mod analytics;
pub mod concerns;
pub mod profile;
pub mod sentiment;
pub mod topics;

mod words;

use chrono::{DateTime, Utc};

/// The parts of a journal entry the analyzers look at.
#[derive(Debug, Clone, Copy)]
pub struct EntrySample<'a> {
    pub mood: &'a str,
    pub text: &'a str,
    pub created_at: DateTime<Utc>,
}
