//! Permissive date parsing across the common formats retrieved sources use
//! (spec.md §4.6: "Apr 3, 2025, ISO 8601, RFC 2822, etc."). Unparseable or
//! empty values become `None` rather than a validation error.

use chrono::{DateTime, NaiveDate, TimeZone, Utc};

const NAIVE_FORMATS: &[&str] = &["%b %-d, %Y", "%B %-d, %Y", "%Y-%m-%d", "%d %b %Y", "%m/%d/%Y"];

pub fn parse_permissive(raw: &str) -> Option<DateTime<Utc>> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(trimmed) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(dt) = DateTime::parse_from_rfc2822(trimmed) {
        return Some(dt.with_timezone(&Utc));
    }
    for fmt in NAIVE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(trimmed, fmt) {
            if let Some(dt) = date.and_hms_opt(0, 0, 0) {
                return Utc.from_local_datetime(&dt).single();
            }
        }
    }
    None
}
