//! Free-space queries for monitored volumes.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ProbeError {
    #[error("failed to query disk space for {path}")]
    Query {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("disk space queries are not supported on this platform")]
    Unsupported,
}

/// Capacity snapshot of one volume, in bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiskSample {
    pub path: String,
    pub total: u64,
    pub used: u64,
    /// Space available to unprivileged users.
    pub free: u64,
}

impl DiskSample {
    pub fn free_percent(&self) -> f64 {
        if self.total == 0 {
            return 0.0;
        }
        self.free as f64 / self.total as f64 * 100.0
    }
}

/// Source of per-volume capacity numbers.
pub trait SpaceProbe: Send + Sync {
    fn query(&self, path: &str) -> Result<DiskSample, ProbeError>;
}

/// Reads capacity with `statvfs(2)`.
#[derive(Debug, Clone, Copy, Default)]
pub struct StatvfsProbe;

#[cfg(unix)]
impl SpaceProbe for StatvfsProbe {
    fn query(&self, path: &str) -> Result<DiskSample, ProbeError> {
        use nix::sys::statvfs::statvfs;

        let stat = statvfs(path).map_err(|errno| ProbeError::Query {
            path: path.to_string(),
            source: std::io::Error::from(errno),
        })?;

        let frsize = stat.fragment_size() as u64;
        let total = (stat.blocks() as u64).saturating_mul(frsize);
        let free_all = (stat.blocks_free() as u64).saturating_mul(frsize);
        let free = (stat.blocks_available() as u64).saturating_mul(frsize);

        Ok(DiskSample {
            path: path.to_string(),
            total,
            used: total.saturating_sub(free_all),
            free,
        })
    }
}

#[cfg(not(unix))]
impl SpaceProbe for StatvfsProbe {
    fn query(&self, _path: &str) -> Result<DiskSample, ProbeError> {
        Err(ProbeError::Unsupported)
    }
}
