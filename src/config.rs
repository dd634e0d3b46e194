//! Ambient configuration, read once at process start.
//!
//! Grounded on `DeltaConfig.from_env` in the original Python service: a
//! single environment variable picks the data root, everything else is a
//! sane default an embedder can override by constructing `Config` directly.

use std::path::PathBuf;
use std::time::Duration;

const DATA_ROOT_ENV: &str = "DELTA_DATA_ROOT";
const DEFAULT_DATA_ROOT: &str = "/data/delta";

#[derive(Debug, Clone)]
pub struct Config {
    /// Root of the on-disk dataset tree (`projects/<p>/datasets/<d>/...`).
    pub data_root: PathBuf,
    /// Live-edit session time-to-live (spec §4.5, default 24h).
    pub session_ttl: Duration,
    /// Pending-upload time-to-live (spec §4.8, default 24h).
    pub pending_upload_ttl: Duration,
    /// When true, staging tables are moved under `audit/history/` instead of
    /// deleted on merge cleanup (spec §4.7 step 7).
    pub archive_staging_on_cleanup: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_root: PathBuf::from(DEFAULT_DATA_ROOT),
            session_ttl: Duration::from_secs(24 * 60 * 60),
            pending_upload_ttl: Duration::from_secs(24 * 60 * 60),
            archive_staging_on_cleanup: false,
        }
    }
}

impl Config {
    /// Reads `DELTA_DATA_ROOT`, falling back to `/data/delta`; all other
    /// fields take their defaults. Embedders that need non-default TTLs
    /// should construct `Config` directly instead.
    pub fn from_env() -> Self {
        let data_root = std::env::var(DATA_ROOT_ENV)
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from(DEFAULT_DATA_ROOT));
        Self {
            data_root,
            ..Self::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_spec() {
        let cfg = Config::default();
        assert_eq!(cfg.data_root, PathBuf::from("/data/delta"));
        assert_eq!(cfg.session_ttl, Duration::from_secs(86_400));
        assert!(!cfg.archive_staging_on_cleanup);
    }

    #[test]
    fn from_env_falls_back_when_unset() {
        std::env::remove_var(DATA_ROOT_ENV);
        let cfg = Config::from_env();
        assert_eq!(cfg.data_root, PathBuf::from("/data/delta"));
    }
}
