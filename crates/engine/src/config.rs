use std::time::Duration;

use competency_core::level::{LevelScale, DEFAULT_LEVEL_MAX, DEFAULT_LEVEL_MIN};

/// Default per-call timeout for backing store operations.
const DEFAULT_STORE_TIMEOUT_SECS: u64 = 10;

/// Engine configuration: the proficiency scale and store call timeout.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Inclusive scale every required level is validated against.
    pub level_scale: LevelScale,
    /// Upper bound on a single store call before it fails as retryable.
    pub store_timeout: Duration,
}

impl EngineConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var              | Default |
    /// |----------------------|---------|
    /// | `LEVEL_MIN`          | `1`     |
    /// | `LEVEL_MAX`          | `5`     |
    /// | `STORE_TIMEOUT_SECS` | `10`    |
    ///
    /// # Panics
    ///
    /// Panics on unparsable values or when `LEVEL_MIN > LEVEL_MAX`, so a
    /// misconfigured deployment fails at startup.
    pub fn from_env() -> Self {
        let min: i16 = std::env::var("LEVEL_MIN")
            .unwrap_or_else(|_| DEFAULT_LEVEL_MIN.to_string())
            .parse()
            .expect("LEVEL_MIN must be a valid i16");

        let max: i16 = std::env::var("LEVEL_MAX")
            .unwrap_or_else(|_| DEFAULT_LEVEL_MAX.to_string())
            .parse()
            .expect("LEVEL_MAX must be a valid i16");

        let timeout_secs: u64 = std::env::var("STORE_TIMEOUT_SECS")
            .unwrap_or_else(|_| DEFAULT_STORE_TIMEOUT_SECS.to_string())
            .parse()
            .expect("STORE_TIMEOUT_SECS must be a valid u64");

        let level_scale = LevelScale::new(min, max)
            .unwrap_or_else(|e| panic!("Invalid LEVEL_MIN/LEVEL_MAX: {e}"));

        Self {
            level_scale,
            store_timeout: Duration::from_secs(timeout_secs),
        }
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            level_scale: LevelScale::default(),
            store_timeout: Duration::from_secs(DEFAULT_STORE_TIMEOUT_SECS),
        }
    }
}
