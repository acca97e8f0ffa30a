//! Settings for a diskwatch run.
//!
//! The settings file is JSON by default (`settings.json`) and TOML when its
//! extension is `.toml`. It is parsed into a raw document, then validated into
//! [`Settings`]; nothing downstream ever sees the raw form. Relative
//! `data_folder` values resolve against the settings file's directory.

use std::fmt;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;
use tracing::{debug, info};

use crate::units::parse_size;

/// Settings file used when none is given on the command line.
pub const DEFAULT_SETTINGS_FILE: &str = "settings.json";

/// Data folder used when the settings file does not name one.
pub const DEFAULT_DATA_FOLDER: &str = "data";

/// Pushover message API.
pub const PUSHOVER_ENDPOINT: &str = "https://api.pushover.net/1/messages.json";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("settings file not found: {}", .path.display())]
    NotFound { path: PathBuf },

    #[error("failed to read settings file {}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse settings file {}: {message}", .path.display())]
    Parse { path: PathBuf, message: String },

    #[error("pushover_token and pushover_user are required")]
    MissingCredentials,

    #[error("at least one drive must be specified")]
    NoDrives,

    #[error("drive #{index} must include a non-empty 'path' field")]
    MissingDrivePath { index: usize },

    #[error("drive '{path}' must specify a 'minimum_disk_space' threshold")]
    MissingThreshold { path: String },

    #[error("invalid size '{input}': {reason}")]
    InvalidSize { input: String, reason: String },

    #[error("failed to create data folder {}", .path.display())]
    DataDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

// ---------------------------------------------------------------------------
// Validated settings
// ---------------------------------------------------------------------------

/// One monitored volume and its alert threshold.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VolumeConfig {
    pub path: String,
    pub minimum_bytes: u64,
}

/// Pushover application token, user key and API endpoint.
#[derive(Clone)]
pub struct PushoverCredentials {
    pub token: String,
    pub user: String,
    pub endpoint: String,
}

impl fmt::Debug for PushoverCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PushoverCredentials")
            .field("token", &"<redacted>")
            .field("user", &"<redacted>")
            .field("endpoint", &self.endpoint)
            .finish()
    }
}

/// Fully validated settings for one run.
#[derive(Debug, Clone)]
pub struct Settings {
    pub pushover: PushoverCredentials,
    /// Daily cap on successful pushes. `None` means unlimited.
    pub max_push_notifications_per_day: Option<u32>,
    /// Folder holding the per-volume logs, charts and the tracking file.
    pub data_dir: PathBuf,
    pub volumes: Vec<VolumeConfig>,
}

/// On-disk encoding of a settings file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SettingsFormat {
    Json,
    Toml,
}

impl SettingsFormat {
    /// TOML for `.toml` files, JSON for everything else.
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("toml") => Self::Toml,
            _ => Self::Json,
        }
    }
}

impl Settings {
    /// Load, validate and prepare settings from `path`.
    ///
    /// The data folder is created if it does not exist yet.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Err(ConfigError::NotFound {
                path: path.to_path_buf(),
            });
        }

        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;

        let raw = RawSettings::parse(&content, SettingsFormat::from_path(path)).map_err(|message| {
            ConfigError::Parse {
                path: path.to_path_buf(),
                message,
            }
        })?;

        let base_dir = path.parent().unwrap_or_else(|| Path::new(""));
        let settings = Self::from_raw(raw, base_dir)?;
        settings.ensure_data_dir()?;

        info!(
            path = %path.display(),
            volumes = settings.volumes.len(),
            data_dir = %settings.data_dir.display(),
            "loaded settings"
        );
        Ok(settings)
    }

    fn from_raw(raw: RawSettings, base_dir: &Path) -> Result<Self, ConfigError> {
        let token = raw.pushover_token.filter(|t| !t.trim().is_empty());
        let user = raw.pushover_user.filter(|u| !u.trim().is_empty());
        let (token, user) = match (token, user) {
            (Some(token), Some(user)) => (token, user),
            _ => return Err(ConfigError::MissingCredentials),
        };

        let volumes = raw
            .drives
            .into_iter()
            .enumerate()
            .map(|(index, drive)| drive.validate(index))
            .collect::<Result<Vec<_>, _>>()?;
        if volumes.is_empty() {
            return Err(ConfigError::NoDrives);
        }

        let data_folder = raw
            .data_folder
            .unwrap_or_else(|| PathBuf::from(DEFAULT_DATA_FOLDER));
        let data_dir = if data_folder.is_absolute() {
            data_folder
        } else {
            base_dir.join(data_folder)
        };

        Ok(Self {
            pushover: PushoverCredentials {
                token,
                user,
                endpoint: raw
                    .pushover_endpoint
                    .unwrap_or_else(|| PUSHOVER_ENDPOINT.to_string()),
            },
            max_push_notifications_per_day: raw.max_push_notifications_per_day,
            data_dir,
            volumes,
        })
    }

    fn ensure_data_dir(&self) -> Result<(), ConfigError> {
        debug!(data_dir = %self.data_dir.display(), "ensuring data folder exists");
        std::fs::create_dir_all(&self.data_dir).map_err(|source| ConfigError::DataDir {
            path: self.data_dir.clone(),
            source,
        })
    }
}

// ---------------------------------------------------------------------------
// Raw document
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct RawSettings {
    pushover_token: Option<String>,
    pushover_user: Option<String>,
    max_push_notifications_per_day: Option<u32>,
    data_folder: Option<PathBuf>,
    #[serde(default)]
    drives: Vec<RawDrive>,
    pushover_endpoint: Option<String>,
}

impl RawSettings {
    fn parse(content: &str, format: SettingsFormat) -> Result<Self, String> {
        match format {
            SettingsFormat::Json => serde_json::from_str(content).map_err(|e| e.to_string()),
            SettingsFormat::Toml => toml::from_str(content).map_err(|e| e.to_string()),
        }
    }
}

#[derive(Debug, Deserialize)]
struct RawDrive {
    path: Option<String>,
    minimum_disk_space: Option<RawSize>,
}

/// Thresholds are normally strings ("10GB"); a bare integer means bytes.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawSize {
    Text(String),
    Bytes(u64),
}

impl RawDrive {
    fn validate(self, index: usize) -> Result<VolumeConfig, ConfigError> {
        let path = self
            .path
            .filter(|p| !p.is_empty())
            .ok_or(ConfigError::MissingDrivePath { index })?;

        let minimum_bytes = match self.minimum_disk_space {
            Some(RawSize::Bytes(bytes)) => bytes,
            Some(RawSize::Text(text)) if !text.trim().is_empty() => parse_size(&text)?,
            _ => return Err(ConfigError::MissingThreshold { path }),
        };

        Ok(VolumeConfig {
            path,
            minimum_bytes,
        })
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
