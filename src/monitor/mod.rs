//! One check pass over every configured volume.
//!
//! Volumes are handled strictly one after another. A volume that cannot be
//! queried is skipped; nothing that happens to one volume stops the others.

use std::sync::Arc;

use tracing::{error, info, warn};

use crate::chart;
use crate::clock::Clock;
use crate::config::VolumeConfig;
use crate::notify::{Notifier, Priority};
use crate::storage::{sort_chronologically, LogStore};
use crate::system::disk::{DiskSample, SpaceProbe};
use crate::units::format_bytes;

/// Measured state of a volume against its threshold.
#[derive(Debug, Clone, PartialEq)]
pub struct VolumeStatus {
    pub sample: DiskSample,
    pub minimum_bytes: u64,
}

impl VolumeStatus {
    pub fn path(&self) -> &str {
        &self.sample.path
    }

    pub fn free_percent(&self) -> f64 {
        self.sample.free_percent()
    }

    pub fn below_threshold(&self) -> bool {
        self.sample.free < self.minimum_bytes
    }

    /// `Drive /: 5.00 GB free (5.00%) of 100.00 GB [threshold: 10.00 GB]`
    pub fn status_line(&self) -> String {
        format!(
            "Drive {}: {} free ({:.2}%) of {} [threshold: {}]",
            self.path(),
            format_bytes(self.sample.free),
            self.free_percent(),
            format_bytes(self.sample.total),
            format_bytes(self.minimum_bytes)
        )
    }

    pub fn alert_title(&self) -> String {
        format!("Low Disk Space Alert: {}", self.path())
    }

    pub fn alert_message(&self) -> String {
        format!(
            "Drive {} is running low on disk space!\n\n\
             Free space: {}\n\
             Used space: {}\n\
             Total space: {}\n\
             Free: {:.2}%\n\n\
             Minimum threshold: {}",
            self.path(),
            format_bytes(self.sample.free),
            format_bytes(self.sample.used),
            format_bytes(self.sample.total),
            self.free_percent(),
            format_bytes(self.minimum_bytes)
        )
    }
}

/// What happened to one volume during a pass.
#[derive(Debug, Clone, PartialEq)]
pub enum VolumeOutcome {
    Checked {
        status: VolumeStatus,
        /// Free space was under the threshold.
        alerted: bool,
        /// The push service accepted the alert.
        notified: bool,
    },
    Skipped {
        path: String,
        reason: String,
    },
}

/// Outcomes of one pass, in configuration order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CheckSummary {
    pub outcomes: Vec<VolumeOutcome>,
}

impl CheckSummary {
    pub fn checked(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|o| matches!(o, VolumeOutcome::Checked { .. }))
            .count()
    }

    pub fn skipped(&self) -> usize {
        self.outcomes.len() - self.checked()
    }

    pub fn alerts(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|o| matches!(o, VolumeOutcome::Checked { alerted: true, .. }))
            .count()
    }

    pub fn notifications(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|o| matches!(o, VolumeOutcome::Checked { notified: true, .. }))
            .count()
    }
}

/// Measures, records and alerts on each configured volume.
pub struct VolumeChecker {
    volumes: Vec<VolumeConfig>,
    probe: Box<dyn SpaceProbe>,
    store: LogStore,
    notifier: Notifier,
    clock: Arc<dyn Clock>,
    charts: bool,
}

impl VolumeChecker {
    pub fn new(
        volumes: Vec<VolumeConfig>,
        probe: Box<dyn SpaceProbe>,
        store: LogStore,
        notifier: Notifier,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            volumes,
            probe,
            store,
            notifier,
            clock,
            charts: true,
        }
    }

    /// Enable or disable chart rendering. Enabled by default.
    pub fn with_charts(mut self, enabled: bool) -> Self {
        self.charts = enabled;
        self
    }

    pub async fn run(&self) -> CheckSummary {
        println!("Checking disk space...");
        let listing: Vec<String> = self
            .volumes
            .iter()
            .map(|v| format!("{} (threshold: {})", v.path, format_bytes(v.minimum_bytes)))
            .collect();
        println!("Monitoring drives: {}\n", listing.join(", "));

        let mut summary = CheckSummary::default();
        for volume in &self.volumes {
            summary.outcomes.push(self.check_volume(volume).await);
        }

        println!("\nCheck complete.");
        info!(
            checked = summary.checked(),
            skipped = summary.skipped(),
            alerts = summary.alerts(),
            notified = summary.notifications(),
            "check pass finished"
        );
        summary
    }

    async fn check_volume(&self, volume: &VolumeConfig) -> VolumeOutcome {
        let sample = match self.probe.query(&volume.path) {
            Ok(sample) => sample,
            Err(e) => {
                error!(volume = %volume.path, error = %e, "Error checking disk space");
                return VolumeOutcome::Skipped {
                    path: volume.path.clone(),
                    reason: e.to_string(),
                };
            }
        };

        let status = VolumeStatus {
            sample,
            minimum_bytes: volume.minimum_bytes,
        };
        println!("{}", status.status_line());

        self.store.append(&volume.path, status.sample.free, self.clock.now());

        if self.charts {
            self.update_chart(&volume.path);
        }

        let alerted = status.below_threshold();
        let mut notified = false;
        if alerted {
            println!("ALERT: {} below threshold!", volume.path);
            warn!(
                volume = %volume.path,
                free = status.sample.free,
                minimum = status.minimum_bytes,
                "free space below threshold"
            );
            notified = self
                .notifier
                .send(&status.alert_title(), &status.alert_message(), Priority::High)
                .await;
        }

        VolumeOutcome::Checked {
            status,
            alerted,
            notified,
        }
    }

    fn update_chart(&self, volume: &str) {
        let mut entries = self.store.read_series(volume, self.clock.now());
        if entries.len() < 2 {
            return;
        }
        sort_chronologically(&mut entries);

        let path = self.store.chart_path(volume);
        match chart::write_chart(&path, volume, &entries) {
            Ok(()) => {
                let name = path.file_name().map(|n| n.to_string_lossy().into_owned());
                println!("  Chart saved: {}", name.unwrap_or_default());
            }
            Err(e) => warn!(volume, path = %path.display(), error = %e, "could not save chart"),
        }
    }
}
