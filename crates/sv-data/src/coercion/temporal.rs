//! Date-time parsing against an ordered list of layouts

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime};

/// Layouts tried, in order, after the caller's own formats
pub const DEFAULT_LAYOUTS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%d",
    "%Y/%m/%d",
    "%m/%d/%Y %H:%M:%S",
    "%m/%d/%Y",
    "%d-%b-%Y",
    "%b %d, %Y",
];

/// Parser for temporal columns
#[derive(Debug, Clone, Default)]
pub struct TemporalParser {
    /// Caller-declared layouts, tried first
    formats: Vec<String>,
}

impl TemporalParser {
    pub fn new(formats: Vec<String>) -> Self {
        Self { formats }
    }

    /// Parse a value, converting offsets to UTC and date-only values to midnight
    pub fn parse(&self, raw: &str) -> Option<NaiveDateTime> {
        let s = raw.trim();
        if s.is_empty() {
            return None;
        }

        for format in &self.formats {
            if let Some(ts) = parse_with(s, format) {
                return Some(ts);
            }
        }

        if let Ok(ts) = DateTime::parse_from_rfc3339(s) {
            return Some(ts.naive_utc());
        }

        DEFAULT_LAYOUTS.iter().find_map(|layout| parse_with(s, layout))
    }
}

fn parse_with(s: &str, layout: &str) -> Option<NaiveDateTime> {
    NaiveDateTime::parse_from_str(s, layout)
        .ok()
        .or_else(|| {
            NaiveDate::parse_from_str(s, layout)
                .ok()
                .map(|d| d.and_time(NaiveTime::MIN))
        })
}
