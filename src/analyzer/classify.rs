//! Line classification.

use chrono::{DateTime, NaiveDateTime, Utc};
use once_cell::sync::Lazy;
use regex::Regex;

use crate::observability::channel::TIMESTAMP_FORMAT;

/// A line containing any of these (case-insensitive) is an error.
pub const ERROR_KEYWORDS: &[&str] = &["error", "exception", "failed"];

/// A line containing any of these (case-insensitive) concerns registration.
pub const REGISTRATION_KEYWORDS: &[&str] = &["/register", "registration"];

static LEADING_TIMESTAMP: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\[(\d{4}-\d{2}-\d{2} \d{2}:\d{2}:\d{2})\]").expect("static regex")
});

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Classification {
    pub is_error: bool,
    pub is_registration: bool,
}

pub fn classify(line: &str) -> Classification {
    let lower = line.to_lowercase();
    let any = |keywords: &[&str]| keywords.iter().any(|k| lower.contains(k));
    Classification {
        is_error: any(ERROR_KEYWORDS),
        is_registration: any(REGISTRATION_KEYWORDS),
    }
}

pub fn contains_ignore_case(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(&needle.to_lowercase())
}

/// Timestamp in the leading `[YYYY-MM-DD HH:MM:SS]` of a line, read as UTC.
pub fn parse_timestamp(line: &str) -> Option<DateTime<Utc>> {
    let captures = LEADING_TIMESTAMP.captures(line)?;
    NaiveDateTime::parse_from_str(&captures[1], TIMESTAMP_FORMAT)
        .ok()
        .map(|naive| naive.and_utc())
}
