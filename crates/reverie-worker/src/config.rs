//! Worker configuration.

use std::time::Duration;

/// Worker configuration. All values are operational parameters and come
/// from the environment; none of them is business logic.
#[derive(Debug, Clone)]
pub struct WorkerConfig {
    /// Maximum concurrent jobs per worker instance.
    pub max_concurrent_jobs: usize,
    /// Maximum accepted size per input asset, in bytes.
    pub max_asset_bytes: u64,
    /// Per-request timeout for asset fetches.
    pub fetch_timeout: Duration,
    /// Hard wall-clock timeout for one encoder invocation.
    pub encode_timeout: Duration,
    /// Validity window of minted access URLs.
    pub result_url_ttl: Duration,
    /// Root directory for job workspaces.
    pub work_dir: String,
    /// Queue polling interval.
    pub poll_interval: Duration,
    /// Attempts per job (initial try plus retries of transient failures).
    pub max_attempts: u32,
    /// Graceful shutdown drain timeout.
    pub shutdown_timeout: Duration,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            max_concurrent_jobs: 2,
            max_asset_bytes: 50 * 1024 * 1024, // 50 MB
            fetch_timeout: Duration::from_secs(60),
            encode_timeout: Duration::from_secs(180),
            result_url_ttl: Duration::from_secs(7 * 24 * 60 * 60), // 7 days
            work_dir: "/tmp/reverie-export".to_string(),
            poll_interval: Duration::from_secs(2),
            max_attempts: 3,
            shutdown_timeout: Duration::from_secs(30),
        }
    }
}

impl WorkerConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            max_concurrent_jobs: env_parse("WORKER_MAX_JOBS", defaults.max_concurrent_jobs),
            max_asset_bytes: env_parse("WORKER_MAX_ASSET_BYTES", defaults.max_asset_bytes),
            fetch_timeout: Duration::from_secs(env_parse(
                "WORKER_FETCH_TIMEOUT_SECS",
                defaults.fetch_timeout.as_secs(),
            )),
            encode_timeout: Duration::from_secs(env_parse(
                "WORKER_ENCODE_TIMEOUT_SECS",
                defaults.encode_timeout.as_secs(),
            )),
            result_url_ttl: Duration::from_secs(env_parse(
                "WORKER_RESULT_URL_TTL_SECS",
                defaults.result_url_ttl.as_secs(),
            )),
            work_dir: std::env::var("WORKER_WORK_DIR").unwrap_or(defaults.work_dir),
            poll_interval: Duration::from_secs(env_parse(
                "WORKER_POLL_INTERVAL_SECS",
                defaults.poll_interval.as_secs(),
            )),
            max_attempts: env_parse("WORKER_MAX_ATTEMPTS", defaults.max_attempts),
            shutdown_timeout: Duration::from_secs(env_parse(
                "WORKER_SHUTDOWN_TIMEOUT_SECS",
                defaults.shutdown_timeout.as_secs(),
            )),
        }
    }
}

fn env_parse<T: std::str::FromStr>(var: &str, default: T) -> T {
    std::env::var(var)
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = WorkerConfig::default();
        assert_eq!(config.max_asset_bytes, 50 * 1024 * 1024);
        assert_eq!(config.encode_timeout, Duration::from_secs(180));
        assert_eq!(config.result_url_ttl, Duration::from_secs(604_800));
        assert_eq!(config.max_attempts, 3);
    }
}
