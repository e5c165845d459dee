//! Timeout configuration for catalog requests.

use std::time::Duration;

use edge_core::ApiConfig;

/// Transport timeouts applied by the HTTP client.
///
/// These bound the socket, not the search engine: engine-side timeouts come
/// back as telemetry on a successful response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeoutConfig {
    /// Connection timeout.
    pub connect: Duration,
    /// Total operation timeout.
    pub total: Duration,
}

impl TimeoutConfig {
    /// Create a new timeout configuration.
    pub fn new(connect: Duration, total: Duration) -> Self {
        Self { connect, total }
    }

    /// Create from a single total timeout.
    pub fn from_total(total: Duration) -> Self {
        Self {
            connect: total / 4,
            total,
        }
    }
}

impl From<&ApiConfig> for TimeoutConfig {
    fn from(config: &ApiConfig) -> Self {
        Self {
            connect: config.connect_timeout(),
            total: config.request_timeout(),
        }
    }
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self::from(&ApiConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_api_config() {
        let api = ApiConfig {
            request_timeout_ms: 3_000,
            connect_timeout_ms: 500,
            ..ApiConfig::default()
        };
        let timeouts = TimeoutConfig::from(&api);
        assert_eq!(timeouts.connect, Duration::from_millis(500));
        assert_eq!(timeouts.total, Duration::from_secs(3));
    }

    #[test]
    fn test_from_total() {
        let timeouts = TimeoutConfig::from_total(Duration::from_secs(2));
        assert_eq!(timeouts.connect, Duration::from_millis(500));
    }
}
