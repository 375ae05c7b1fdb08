//! Configuration for the relay client.

use std::env;
use std::time::Duration;

/// Default relay WebSocket URL.
pub const DEFAULT_RELAY_URL: &str = "ws://localhost:5000";

/// Configuration for [`crate::RelayClient`].
#[derive(Debug, Clone)]
pub struct RelayConfig {
    /// Relay WebSocket URL.
    pub url: String,

    /// Reconnection behavior.
    pub reconnect: ReconnectConfig,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            url: DEFAULT_RELAY_URL.to_string(),
            reconnect: ReconnectConfig::default(),
        }
    }
}

impl RelayConfig {
    /// Create a config pointing at the given URL.
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            reconnect: ReconnectConfig::default(),
        }
    }

    /// Create configuration from environment variables.
    ///
    /// Optional environment variables:
    /// - `RELAY_URL` - relay WebSocket URL (default: ws://localhost:5000)
    pub fn from_env() -> Self {
        let url = env::var("RELAY_URL").unwrap_or_else(|_| DEFAULT_RELAY_URL.to_string());
        Self::new(url)
    }

    /// Set the reconnection behavior.
    pub fn with_reconnect(mut self, reconnect: ReconnectConfig) -> Self {
        self.reconnect = reconnect;
        self
    }
}

/// Configuration for automatic reconnection.
#[derive(Debug, Clone)]
pub struct ReconnectConfig {
    /// Maximum number of consecutive failed attempts (None = infinite).
    pub max_retries: Option<u32>,
    /// Initial delay before first retry.
    pub initial_delay: Duration,
    /// Maximum delay between retries.
    pub max_delay: Duration,
    /// Backoff multiplier for each retry.
    pub backoff_multiplier: f64,
}

impl Default for ReconnectConfig {
    fn default() -> Self {
        Self {
            max_retries: None,
            initial_delay: Duration::from_millis(500),
            max_delay: Duration::from_secs(30),
            backoff_multiplier: 2.0,
        }
    }
}

impl ReconnectConfig {
    /// Calculate delay for a given attempt number.
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        let delay_ms =
            self.initial_delay.as_millis() as f64 * self.backoff_multiplier.powi(attempt as i32);
        let delay = Duration::from_millis(delay_ms as u64);
        delay.min(self.max_delay)
    }

    /// Check if we should retry after the given number of attempts.
    pub fn should_retry(&self, attempts: u32) -> bool {
        self.max_retries.map_or(true, |max| attempts < max)
    }
}
