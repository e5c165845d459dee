//! Search surface configuration.

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Environment variable overriding `api.base_url`.
pub const ENV_API_URL: &str = "TURBO_SEARCH_API_URL";

/// Errors raised while loading or validating configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config file {path}: {message}")]
    Parse { path: String, message: String },

    #[error("Failed to serialize config: {0}")]
    Serialize(String),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Top-level configuration for a search surface.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SearchConfig {
    /// Backend API settings.
    #[serde(default)]
    pub api: ApiConfig,

    /// Input coalescing settings.
    #[serde(default)]
    pub debounce: DebounceConfig,

    /// Autocomplete settings.
    #[serde(default)]
    pub suggestions: SuggestionConfig,

    /// Page size settings.
    #[serde(default)]
    pub pagination: PaginationConfig,

    /// Log output settings.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl SearchConfig {
    /// Load config from a file. `.json` files are parsed as JSON, everything else as TOML.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let display = path.display().to_string();
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: display.clone(),
            source,
        })?;

        let config: SearchConfig = if is_json(path) {
            serde_json::from_str(&content).map_err(|e| ConfigError::Parse {
                path: display.clone(),
                message: e.to_string(),
            })?
        } else {
            toml::from_str(&content).map_err(|e| ConfigError::Parse {
                path: display.clone(),
                message: e.to_string(),
            })?
        };

        config.validate()?;
        Ok(config)
    }

    /// Save config to a file, in the format implied by its extension.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let path = path.as_ref();
        let content = if is_json(path) {
            serde_json::to_string_pretty(self).map_err(|e| ConfigError::Serialize(e.to_string()))?
        } else {
            toml::to_string_pretty(self).map_err(|e| ConfigError::Serialize(e.to_string()))?
        };

        std::fs::write(path, content).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })
    }

    /// Apply environment variable overrides.
    pub fn with_env_overrides(mut self) -> Self {
        if let Ok(url) = std::env::var(ENV_API_URL) {
            if !url.trim().is_empty() {
                self.api.base_url = url.trim().to_string();
            }
        }
        self
    }

    /// Reject settings the search layer cannot honor.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.api.base_url.trim().is_empty() {
            return Err(ConfigError::Invalid("api.base_url must not be empty".into()));
        }
        if self.debounce.search_wait_ms == 0 {
            return Err(ConfigError::Invalid(
                "debounce.search_wait_ms must be greater than zero".into(),
            ));
        }
        if let Some(max_wait) = self.debounce.search_max_wait_ms {
            if max_wait < self.debounce.search_wait_ms {
                return Err(ConfigError::Invalid(format!(
                    "debounce.search_max_wait_ms ({}) is shorter than search_wait_ms ({})",
                    max_wait, self.debounce.search_wait_ms
                )));
            }
        }
        if self.suggestions.min_query_chars == 0 {
            return Err(ConfigError::Invalid(
                "suggestions.min_query_chars must be at least 1".into(),
            ));
        }
        if self.pagination.page_sizes.is_empty() || self.pagination.page_sizes.contains(&0) {
            return Err(ConfigError::Invalid(
                "pagination.page_sizes must be non-empty and positive".into(),
            ));
        }
        if !self
            .pagination
            .page_sizes
            .contains(&self.pagination.default_page_size)
        {
            return Err(ConfigError::Invalid(format!(
                "pagination.default_page_size {} is not one of {:?}",
                self.pagination.default_page_size, self.pagination.page_sizes
            )));
        }
        Ok(())
    }
}

fn is_json(path: &Path) -> bool {
    path.extension().and_then(|e| e.to_str()) == Some("json")
}

/// Backend API settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Base URL of the catalog API (e.g. `http://localhost:5000/api`).
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Total per-request timeout.
    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,

    /// Connection establishment timeout.
    #[serde(default = "default_connect_timeout_ms")]
    pub connect_timeout_ms: u64,
}

fn default_base_url() -> String {
    "http://localhost:5000/api".to_string()
}

fn default_request_timeout_ms() -> u64 {
    10_000
}

fn default_connect_timeout_ms() -> u64 {
    2_000
}

impl ApiConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_ms)
    }
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            request_timeout_ms: default_request_timeout_ms(),
            connect_timeout_ms: default_connect_timeout_ms(),
        }
    }
}

/// Input coalescing settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DebounceConfig {
    /// Quiet period before a filter/query change is dispatched.
    #[serde(default = "default_search_wait_ms")]
    pub search_wait_ms: u64,

    /// Upper bound on how long continuous input may postpone a dispatch.
    #[serde(default = "default_search_max_wait_ms")]
    pub search_max_wait_ms: Option<u64>,

    /// Quiet period before an autocomplete lookup.
    #[serde(default = "default_suggest_wait_ms")]
    pub suggest_wait_ms: u64,

    /// Minimum spacing of "load next batch" requests.
    #[serde(default = "default_load_more_throttle_ms")]
    pub load_more_throttle_ms: u64,
}

fn default_search_wait_ms() -> u64 {
    400
}

fn default_search_max_wait_ms() -> Option<u64> {
    Some(1_500)
}

fn default_suggest_wait_ms() -> u64 {
    250
}

fn default_load_more_throttle_ms() -> u64 {
    500
}

impl DebounceConfig {
    pub fn search_wait(&self) -> Duration {
        Duration::from_millis(self.search_wait_ms)
    }

    pub fn search_max_wait(&self) -> Option<Duration> {
        self.search_max_wait_ms.map(Duration::from_millis)
    }

    pub fn suggest_wait(&self) -> Duration {
        Duration::from_millis(self.suggest_wait_ms)
    }

    pub fn load_more_throttle(&self) -> Duration {
        Duration::from_millis(self.load_more_throttle_ms)
    }
}

impl Default for DebounceConfig {
    fn default() -> Self {
        Self {
            search_wait_ms: default_search_wait_ms(),
            search_max_wait_ms: default_search_max_wait_ms(),
            suggest_wait_ms: default_suggest_wait_ms(),
            load_more_throttle_ms: default_load_more_throttle_ms(),
        }
    }
}

/// Autocomplete settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SuggestionConfig {
    /// How long a cached suggestion list stays valid.
    #[serde(default = "default_suggestion_ttl_ms")]
    pub ttl_ms: u64,

    /// Trimmed queries shorter than this never reach the network.
    #[serde(default = "default_min_query_chars")]
    pub min_query_chars: usize,
}

fn default_suggestion_ttl_ms() -> u64 {
    120_000
}

fn default_min_query_chars() -> usize {
    2
}

impl SuggestionConfig {
    pub fn ttl(&self) -> Duration {
        Duration::from_millis(self.ttl_ms)
    }
}

impl Default for SuggestionConfig {
    fn default() -> Self {
        Self {
            ttl_ms: default_suggestion_ttl_ms(),
            min_query_chars: default_min_query_chars(),
        }
    }
}

/// Page size settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaginationConfig {
    /// Allowed page sizes.
    #[serde(default = "default_page_sizes")]
    pub page_sizes: Vec<u32>,

    /// Page size used when none is requested.
    #[serde(default = "default_page_size")]
    pub default_page_size: u32,
}

fn default_page_sizes() -> Vec<u32> {
    vec![6, 12, 18, 24, 30, 36]
}

fn default_page_size() -> u32 {
    12
}

impl Default for PaginationConfig {
    fn default() -> Self {
        Self {
            page_sizes: default_page_sizes(),
            default_page_size: default_page_size(),
        }
    }
}

/// Log output settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Default filter directive when `RUST_LOG` is unset.
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Emit JSON lines instead of human-readable output.
    #[serde(default)]
    pub json: bool,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}

/// Generate a default `turbo-search.toml`.
pub fn generate_default_config(base_url: &str) -> String {
    format!(
        r#"# TurboCommerce search configuration

[api]
base_url = "{base_url}"
request_timeout_ms = 10000
connect_timeout_ms = 2000

[debounce]
search_wait_ms = 400
search_max_wait_ms = 1500
suggest_wait_ms = 250
load_more_throttle_ms = 500

[suggestions]
ttl_ms = 120000
min_query_chars = 2

[pagination]
page_sizes = [6, 12, 18, 24, 30, 36]
default_page_size = 12

[logging]
level = "info"
json = false
"#,
        base_url = base_url
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_generated_config_matches_defaults() {
        let parsed: SearchConfig =
            toml::from_str(&generate_default_config("http://localhost:5000/api")).unwrap();
        assert_eq!(parsed, SearchConfig::default());
        assert!(parsed.validate().is_ok());
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let parsed: SearchConfig = toml::from_str(
            r#"
[api]
base_url = "https://shop.example.com/api"

[debounce]
search_wait_ms = 250
"#,
        )
        .unwrap();

        assert_eq!(parsed.api.base_url, "https://shop.example.com/api");
        assert_eq!(parsed.debounce.search_wait(), Duration::from_millis(250));
        assert_eq!(parsed.debounce.search_max_wait(), Some(Duration::from_millis(1_500)));
        assert_eq!(parsed.suggestions.ttl(), Duration::from_secs(120));
        assert_eq!(parsed.pagination.default_page_size, 12);
    }

    #[test]
    fn test_validate_rejects_unknown_default_page_size() {
        let mut config = SearchConfig::default();
        config.pagination.default_page_size = 7;
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_validate_rejects_short_max_wait() {
        let mut config = SearchConfig::default();
        config.debounce.search_max_wait_ms = Some(100);
        assert!(config.validate().is_err());

        config.debounce.search_max_wait_ms = None;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_json_round_trip_through_file() {
        let dir = std::env::temp_dir().join(format!("edge-core-config-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("turbo-search.json");

        let mut config = SearchConfig::default();
        config.logging.json = true;
        config.save(&path).unwrap();

        let loaded = SearchConfig::load(&path).unwrap();
        assert_eq!(loaded, config);
        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let err = SearchConfig::load("/definitely/not/here.toml").unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }
}
