//! Daily notification counter.
//!
//! The count only ever describes the tracker's own date. Reading or
//! recording on any other day starts again from zero, so a cap never carries
//! over midnight.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::clock::Clock;

/// Tracker file name inside the data folder.
pub const TRACKING_FILE: &str = ".notification_tracking.json";

#[derive(Debug, Error)]
pub enum TrackerError {
    #[error("failed to encode notification tracking data")]
    Encode(#[from] serde_json::Error),

    #[error("failed to write notification tracking file {}", .path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Persisted `{"date": "YYYY-MM-DD", "count": N}` record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationTracker {
    pub date: NaiveDate,
    #[serde(default)]
    pub count: u32,
}

/// Enforces the daily cap on successful pushes.
pub struct NotificationLimiter {
    path: PathBuf,
    clock: Arc<dyn Clock>,
}

impl NotificationLimiter {
    pub fn new(data_dir: &Path, clock: Arc<dyn Clock>) -> Self {
        Self {
            path: data_dir.join(TRACKING_FILE),
            clock,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Successful sends recorded for today. Absent, unreadable or corrupt
    /// tracker files count as zero, as does a tracker from another day.
    pub fn count_today(&self) -> u32 {
        let today = self.clock.today();
        self.load()
            .filter(|tracker| tracker.date == today)
            .map_or(0, |tracker| tracker.count)
    }

    /// Record one successful send and return today's new count.
    pub fn record_send(&self) -> Result<u32, TrackerError> {
        let today = self.clock.today();
        let mut tracker = self
            .load()
            .filter(|tracker| tracker.date == today)
            .unwrap_or(NotificationTracker {
                date: today,
                count: 0,
            });
        tracker.count = tracker.count.saturating_add(1);

        let json = serde_json::to_string(&tracker)?;
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(|source| TrackerError::Write {
                path: self.path.clone(),
                source,
            })?;
        }
        fs::write(&self.path, json).map_err(|source| TrackerError::Write {
            path: self.path.clone(),
            source,
        })?;

        debug!(date = %tracker.date, count = tracker.count, "recorded notification");
        Ok(tracker.count)
    }

    /// Whether another send fits under `max_per_day`. No cap always allows.
    pub fn allow(&self, max_per_day: Option<u32>) -> bool {
        match max_per_day {
            None => true,
            Some(max) => self.count_today() < max,
        }
    }

    fn load(&self) -> Option<NotificationTracker> {
        let text = fs::read_to_string(&self.path).ok()?;
        match serde_json::from_str(&text) {
            Ok(tracker) => Some(tracker),
            Err(e) => {
                debug!(path = %self.path.display(), error = %e, "ignoring corrupt tracking file");
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::FixedClock;

    fn day(text: &str) -> NaiveDate {
        NaiveDate::parse_from_str(text, "%Y-%m-%d").unwrap()
    }

    fn limiter_on(dir: &Path, date: &str) -> NotificationLimiter {
        NotificationLimiter::new(dir, Arc::new(FixedClock::on(day(date))))
    }

    #[test]
    fn test_absent_file_is_zero() {
        let dir = tempfile::TempDir::new().unwrap();
        let limiter = limiter_on(dir.path(), "2024-01-01");
        assert_eq!(limiter.count_today(), 0);
        assert!(!limiter.path().exists());
    }

    #[test]
    fn test_record_same_day_accumulates() {
        let dir = tempfile::TempDir::new().unwrap();
        let limiter = limiter_on(dir.path(), "2024-01-01");
        for expected in 1..=4 {
            assert_eq!(limiter.record_send().unwrap(), expected);
        }
        assert_eq!(limiter.count_today(), 4);
    }

    #[test]
    fn test_day_rollover_resets() {
        let dir = tempfile::TempDir::new().unwrap();
        let monday = limiter_on(dir.path(), "2024-01-01");
        monday.record_send().unwrap();
        monday.record_send().unwrap();
        monday.record_send().unwrap();

        let tuesday = limiter_on(dir.path(), "2024-01-02");
        assert_eq!(tuesday.count_today(), 0);
        assert_eq!(tuesday.record_send().unwrap(), 1);
        assert_eq!(tuesday.count_today(), 1);

        // The old day is discarded, not resumed.
        assert_eq!(monday.count_today(), 0);
    }

    #[test]
    fn test_stale_date_reads_zero_regardless_of_count() {
        let dir = tempfile::TempDir::new().unwrap();
        fs::write(
            dir.path().join(TRACKING_FILE),
            r#"{"date": "2023-12-31", "count": 999}"#,
        )
        .unwrap();
        let limiter = limiter_on(dir.path(), "2024-01-01");
        assert_eq!(limiter.count_today(), 0);
        assert!(limiter.allow(Some(1)));
    }

    #[test]
    fn test_reads_existing_record() {
        let dir = tempfile::TempDir::new().unwrap();
        fs::write(dir.path().join(TRACKING_FILE), r#"{"date": "2024-01-01", "count": 2}"#).unwrap();
        let limiter = limiter_on(dir.path(), "2024-01-01");
        assert_eq!(limiter.count_today(), 2);
        assert_eq!(limiter.record_send().unwrap(), 3);
    }

    #[test]
    fn test_missing_count_is_zero() {
        let dir = tempfile::TempDir::new().unwrap();
        fs::write(dir.path().join(TRACKING_FILE), r#"{"date": "2024-01-01"}"#).unwrap();
        let limiter = limiter_on(dir.path(), "2024-01-01");
        assert_eq!(limiter.count_today(), 0);
    }

    #[test]
    fn test_corrupt_file_is_zero_and_overwritten() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join(TRACKING_FILE);
        for corrupt in [
            "{not json",
            r#"{"date": "yesterday", "count": 1}"#,
            r#"{"date": "2024-01-01", "count": -3}"#,
        ] {
            fs::write(&path, corrupt).unwrap();
            let limiter = limiter_on(dir.path(), "2024-01-01");
            assert_eq!(limiter.count_today(), 0, "{}", corrupt);
        }

        let limiter = limiter_on(dir.path(), "2024-01-01");
        assert_eq!(limiter.record_send().unwrap(), 1);
        let stored: NotificationTracker =
            serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(
            stored,
            NotificationTracker {
                date: day("2024-01-01"),
                count: 1
            }
        );
    }

    #[test]
    fn test_unreadable_file_is_zero() {
        let dir = tempfile::TempDir::new().unwrap();
        fs::create_dir(dir.path().join(TRACKING_FILE)).unwrap();

        let limiter = limiter_on(dir.path(), "2024-01-01");
        assert_eq!(limiter.count_today(), 0);
        assert!(limiter.allow(Some(1)));
    }

    #[test]
    fn test_allow_respects_cap() {
        let dir = tempfile::TempDir::new().unwrap();
        let limiter = limiter_on(dir.path(), "2024-01-01");
        for _ in 0..3 {
            assert!(limiter.allow(Some(3)));
            limiter.record_send().unwrap();
        }
        assert!(!limiter.allow(Some(3)));
        limiter.record_send().unwrap();
        assert!(!limiter.allow(Some(3)));
        assert!(limiter.allow(None));
    }

    #[test]
    fn test_zero_cap_never_allows() {
        let dir = tempfile::TempDir::new().unwrap();
        let limiter = limiter_on(dir.path(), "2024-01-01");
        assert!(!limiter.allow(Some(0)));
        assert!(limiter.allow(None));
    }

    #[test]
    fn test_file_layout() {
        let dir = tempfile::TempDir::new().unwrap();
        let limiter = limiter_on(dir.path(), "2024-06-30");
        limiter.record_send().unwrap();
        let text = fs::read_to_string(limiter.path()).unwrap();
        assert_eq!(text, r#"{"date":"2024-06-30","count":1}"#);
    }
}
