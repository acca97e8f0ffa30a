//! Push notifications for low-space alerts.
//!
//! [`Notifier`] gates every push on the daily cap, sends through a
//! [`PushApi`] and records the send only once the API has accepted it.
//! Failures are logged and reported as `false`; they never abort a check.

pub mod pushover;

pub use self::pushover::PushoverClient;

use std::fmt;

use thiserror::Error;
use tracing::{error, info, warn};

use crate::storage::NotificationLimiter;

#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("failed to build HTTP client")]
    Client(#[source] reqwest::Error),

    #[error("push request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("push endpoint returned HTTP {status}: {detail}")]
    Rejected { status: u16, detail: String },
}

/// Pushover message priority.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Priority {
    Normal,
    High,
    Emergency,
}

impl Priority {
    /// Numeric value sent on the wire.
    pub fn code(self) -> i8 {
        match self {
            Priority::Normal => 0,
            Priority::High => 1,
            Priority::Emergency => 2,
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Priority::Normal => write!(f, "normal"),
            Priority::High => write!(f, "high"),
            Priority::Emergency => write!(f, "emergency"),
        }
    }
}

/// A single alert ready to push.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PushMessage {
    pub title: String,
    pub message: String,
    pub priority: Priority,
}

/// Delivery endpoint for push messages.
#[async_trait::async_trait]
pub trait PushApi: Send + Sync {
    /// Deliver one message. `Ok` means the service accepted it.
    async fn push(&self, message: &PushMessage) -> Result<(), NotifyError>;
}

/// Sends alerts through a [`PushApi`], capped per day.
pub struct Notifier {
    api: Box<dyn PushApi>,
    limiter: NotificationLimiter,
    max_per_day: Option<u32>,
}

impl Notifier {
    pub fn new(
        api: Box<dyn PushApi>,
        limiter: NotificationLimiter,
        max_per_day: Option<u32>,
    ) -> Self {
        Self {
            api,
            limiter,
            max_per_day,
        }
    }

    pub fn limiter(&self) -> &NotificationLimiter {
        &self.limiter
    }

    /// Push an alert. Returns `true` only when the service accepted it.
    pub async fn send(&self, title: &str, message: &str, priority: Priority) -> bool {
        if !self.limiter.allow(self.max_per_day) {
            warn!(
                "{}",
                limit_reached(self.limiter.count_today(), self.max_per_day.unwrap_or_default())
            );
            return false;
        }

        let push = PushMessage {
            title: title.to_string(),
            message: message.to_string(),
            priority,
        };

        match self.api.push(&push).await {
            Ok(()) => {
                match self.limiter.record_send() {
                    Ok(count) => {
                        info!(title, %priority, sent_today = count, "push notification sent")
                    }
                    Err(e) => warn!(title, error = %e, "push sent but tracking file not updated"),
                }
                true
            }
            Err(e) => {
                error!(title, %priority, error = %e, "failed to send push notification");
                false
            }
        }
    }
}

fn limit_reached(sent_today: u32, max_per_day: u32) -> String {
    format!("Notification limit reached ({}/{} today)", sent_today, max_per_day)
}
