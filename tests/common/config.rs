//! Test configuration builders

use savant_dl::{BatchOptions, Config, RetryConfig};
use std::path::Path;
use std::time::Duration;

/// Retry policy with short delays
pub fn fast_retry(max_attempts: u32) -> RetryConfig {
    RetryConfig {
        max_attempts,
        backoff_delay: Duration::from_millis(10),
        max_delay: Duration::from_millis(50),
        backoff_multiplier: 1.0,
        jitter: false,
    }
}

/// Config pointed at a mock site, writing into `dir`
pub fn test_config(base_url: &str, dir: &Path) -> Config {
    let mut config = Config::default();
    config.savant.base_url = base_url.to_string();
    config.download.download_dir = dir.join("clips");
    config.download.max_workers = 3;
    config.page_retry = fast_retry(2);
    config.download_retry = fast_retry(3);
    config
}

/// Batch options matching `config`
pub fn options(config: &Config) -> BatchOptions {
    BatchOptions::from_config(config)
}
