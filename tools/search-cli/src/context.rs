//! CLI execution context.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context as _, Result};
use edge_core::SearchConfig;
use edge_data::{CatalogBackend, HttpBackend, StaticToken};

use crate::config::load_config;
use crate::output::Output;

/// Environment variable holding a bearer token for the catalog API.
pub const ENV_TOKEN: &str = "TURBO_SEARCH_TOKEN";

/// Execution context for CLI commands.
pub struct Context {
    /// Effective configuration, environment overrides applied.
    pub config: SearchConfig,
    /// File the configuration came from, if any.
    pub config_path: Option<PathBuf>,
    /// Output handler.
    pub output: Output,
    /// Working directory.
    pub cwd: PathBuf,
}

impl Context {
    /// Load context from an explicit config file or the nearest discovered one.
    pub fn load(config_path: Option<&str>, output: Output) -> Result<Self> {
        let cwd = std::env::current_dir().context("Failed to get current directory")?;
        let (config, config_path) = load_config(config_path, &cwd)?;

        Ok(Self {
            config,
            config_path,
            output,
            cwd,
        })
    }

    /// Install the tracing subscriber. `--verbose` raises the level to debug.
    pub fn init_logging(&self) {
        let mut logging = self.config.logging.clone();
        if self.output.is_verbose() {
            logging.level = "debug".to_string();
        }
        match edge_observability::init_logging(&logging) {
            Ok(format) => self.output.debug(&format!("Logging as {} at {}", format, logging.level)),
            Err(e) => self.output.warn(&format!("Logging disabled: {}", e)),
        }
    }

    /// HTTP backend for the configured API, authenticated when a token is set.
    pub fn backend(&self) -> Result<Arc<dyn CatalogBackend>> {
        let mut backend = HttpBackend::new(&self.config.api)
            .with_context(|| format!("Failed to create client for {}", self.config.api.base_url))?;

        if let Some(token) = std::env::var(ENV_TOKEN).ok().filter(|t| !t.trim().is_empty()) {
            self.output.debug(&format!("Using bearer token from {}", ENV_TOKEN));
            backend = backend.with_credentials(Arc::new(StaticToken::new(token.trim())));
        }

        self.output.debug(&format!("API: {}", backend.base_url()));
        Ok(Arc::new(backend))
    }

    /// Resolve a path relative to the working directory.
    pub fn resolve_path(&self, path: &str) -> PathBuf {
        if PathBuf::from(path).is_absolute() {
            PathBuf::from(path)
        } else {
            self.cwd.join(path)
        }
    }
}
