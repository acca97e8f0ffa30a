//! On-disk state: per-volume free-space logs and the notification tracker.
//!
//! Everything lives under the configured data folder:
//!
//! ```text
//! data/
//!   root.log                       free-space history for "/"
//!   root.svg                       chart rendered from root.log
//!   _mnt_backup.log                history for "/mnt/backup"
//!   .notification_tracking.json    {"date": "2024-01-01", "count": 2}
//! ```

pub mod series;
pub mod tracker;

pub use self::series::{parse_series, sort_chronologically, LogEntry, TIMESTAMP_FORMAT};
pub use self::tracker::{NotificationLimiter, NotificationTracker, TrackerError};

use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use chrono::NaiveDateTime;
use tracing::{debug, warn};

use crate::units::format_bytes_multi;

/// Append-only free-space logs, one file per volume.
#[derive(Debug, Clone)]
pub struct LogStore {
    data_dir: PathBuf,
}

impl LogStore {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
        }
    }

    /// Log file for a volume path.
    pub fn log_path(&self, volume: &str) -> PathBuf {
        self.data_dir.join(format!("{}.log", safe_log_name(volume)))
    }

    /// Chart image rendered from a volume's log.
    pub fn chart_path(&self, volume: &str) -> PathBuf {
        self.log_path(volume).with_extension("svg")
    }

    /// Append one sample. Failures are logged, never returned: losing a
    /// history line must not abort the check.
    pub fn append(&self, volume: &str, free_bytes: u64, timestamp: NaiveDateTime) {
        let path = self.log_path(volume);
        match write_line(&path, free_bytes, timestamp) {
            Ok(()) => debug!(volume, path = %path.display(), free_bytes, "appended sample"),
            Err(e) => warn!(
                volume,
                path = %path.display(),
                error = %e,
                "could not write to log file"
            ),
        }
    }

    /// Read a volume's history in file order. A missing log is an empty
    /// history; an unreadable one is logged and treated as empty.
    pub fn read_series(&self, volume: &str, now: NaiveDateTime) -> Vec<LogEntry> {
        let path = self.log_path(volume);
        match fs::read_to_string(&path) {
            Ok(content) => parse_series(&content, now),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Vec::new(),
            Err(e) => {
                warn!(
                    volume,
                    path = %path.display(),
                    error = %e,
                    "could not read log file"
                );
                Vec::new()
            }
        }
    }
}

fn write_line(path: &Path, free_bytes: u64, timestamp: NaiveDateTime) -> io::Result<()> {
    let mut file = OpenOptions::new().create(true).append(true).open(path)?;
    writeln!(
        file,
        "{} {} ({})",
        timestamp.format(TIMESTAMP_FORMAT),
        free_bytes,
        format_bytes_multi(free_bytes)
    )
}

/// Filesystem-safe log name for a volume path.
///
/// Trailing separators are dropped, inner separators become `_`, drive
/// colons vanish, and the filesystem root maps to `root`.
pub fn safe_log_name(volume: &str) -> String {
    let name: String = volume
        .trim_end_matches(['/', '\\'])
        .chars()
        .filter(|&c| c != ':')
        .map(|c| if c == '/' || c == '\\' { '_' } else { c })
        .collect();

    if name.is_empty() || name == "_" {
        "root".to_string()
    } else {
        name
    }
}
