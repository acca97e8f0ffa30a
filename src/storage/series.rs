//! Free-space history parsing.
//!
//! A volume log mixes two line layouts:
//!
//! ```text
//! 2024-01-01T12:00:00.123456 102176960512 (95 GB 201 MB)   current
//! 102176960512 (95 GB 201 MB)                              legacy
//! 102176960512                                             legacy
//! ```
//!
//! Legacy lines carry no time. Parsing runs in two passes: every line is
//! first classified on its own, then the legacy lines get synthetic
//! timestamps one hour apart, ending one hour before `now`, in file order.

use chrono::{DateTime, Duration, Local, NaiveDate, NaiveDateTime, NaiveTime};

/// Timestamp layout written to volume logs.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.6f";

/// One free-space sample.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LogEntry {
    pub timestamp: NaiveDateTime,
    pub free_bytes: u64,
}

/// Result of classifying a single line, before any backfill.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Line {
    Stamped(LogEntry),
    Legacy(u64),
}

/// Parse a whole log into entries, in file order.
///
/// Blank and malformed lines are skipped. The result is not sorted; callers
/// that need chronological order sort by timestamp.
pub fn parse_series(content: &str, now: NaiveDateTime) -> Vec<LogEntry> {
    let lines: Vec<Line> = content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .filter_map(classify)
        .collect();

    let legacy_total = lines
        .iter()
        .filter(|line| matches!(line, Line::Legacy(_)))
        .count() as i64;

    let mut legacy_seen = 0i64;
    lines
        .into_iter()
        .map(|line| match line {
            Line::Stamped(entry) => entry,
            Line::Legacy(free_bytes) => {
                let hours_ago = legacy_total - legacy_seen;
                legacy_seen += 1;
                LogEntry {
                    timestamp: now - Duration::hours(hours_ago),
                    free_bytes,
                }
            }
        })
        .collect()
}

/// Sort entries oldest first.
pub fn sort_chronologically(entries: &mut [LogEntry]) {
    entries.sort_by_key(|entry| entry.timestamp);
}

fn classify(line: &str) -> Option<Line> {
    let mut fields = line.split_whitespace();
    let first = fields.next()?;
    let second = fields.next();

    // A timestamp-looking first field never falls back to the legacy layout.
    if looks_like_timestamp(first) {
        let timestamp = parse_timestamp(first)?;
        let free_bytes = second?.parse().ok()?;
        return Some(Line::Stamped(LogEntry {
            timestamp,
            free_bytes,
        }));
    }

    first.parse().ok().map(Line::Legacy)
}

/// `true` for anything containing `T`, or starting with a `YYYY-MM-DD` shape.
fn looks_like_timestamp(field: &str) -> bool {
    let bytes = field.as_bytes();
    field.contains('T') || (bytes.len() >= 10 && bytes[4] == b'-' && bytes[7] == b'-')
}

/// Parse an ISO-8601 timestamp into local naive time.
fn parse_timestamp(text: &str) -> Option<NaiveDateTime> {
    if let Ok(with_offset) = DateTime::parse_from_rfc3339(text) {
        return Some(with_offset.with_timezone(&Local).naive_local());
    }
    for layout in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%dT%H:%M"] {
        if let Ok(timestamp) = NaiveDateTime::parse_from_str(text, layout) {
            return Some(timestamp);
        }
    }
    NaiveDate::parse_from_str(text, "%Y-%m-%d")
        .ok()
        .map(|date| date.and_time(NaiveTime::MIN))
}
