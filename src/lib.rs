//! diskwatch -- free-space monitoring with rate-limited push alerts.
//!
//! One invocation checks every configured volume once, appends the reading to
//! a per-volume history log, redraws the history chart and pushes a Pushover
//! alert for any volume below its threshold.

pub mod chart;
pub mod clock;
pub mod config;
pub mod monitor;
pub mod notify;
pub mod storage;
pub mod system;
pub mod units;

use std::sync::Arc;

use anyhow::{Context, Result};

use crate::clock::{Clock, SystemClock};
use crate::config::Settings;
use crate::monitor::{CheckSummary, VolumeChecker};
use crate::notify::{Notifier, PushoverClient};
use crate::storage::{LogStore, NotificationLimiter};
use crate::system::disk::StatvfsProbe;

/// Per-run switches that do not belong in the settings file.
#[derive(Debug, Clone, Copy)]
pub struct RunOptions {
    pub charts: bool,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self { charts: true }
    }
}

/// Run one check pass against the real filesystem and Pushover.
pub async fn run(settings: Settings, options: RunOptions) -> Result<CheckSummary> {
    let clock: Arc<dyn Clock> = Arc::new(SystemClock);

    let api = PushoverClient::new(settings.pushover).context("failed to set up Pushover client")?;
    let limiter = NotificationLimiter::new(&settings.data_dir, clock.clone());
    let notifier = Notifier::new(
        Box::new(api),
        limiter,
        settings.max_push_notifications_per_day,
    );

    let checker = VolumeChecker::new(
        settings.volumes,
        Box::new(StatvfsProbe),
        LogStore::new(settings.data_dir),
        notifier,
        clock,
    )
    .with_charts(options.charts);

    Ok(checker.run().await)
}
