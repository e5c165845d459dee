//! Configuration management commands.

use std::fs;

use anyhow::{bail, Context as _, Result};
use edge_core::{generate_default_config, SearchConfig, ENV_API_URL};

use super::{ConfigArgs, ConfigCommand};
use crate::config::DEFAULT_BASE_URL;
use crate::context::{Context, ENV_TOKEN};

/// Run the config command.
pub async fn run(args: ConfigArgs, ctx: &Context) -> Result<()> {
    match args.command {
        ConfigCommand::Show => show_config(ctx).await,
        ConfigCommand::Init {
            base_url,
            path,
            force,
        } => init_config(base_url.as_deref(), &path, force, ctx).await,
        ConfigCommand::Validate => validate_config(ctx).await,
    }
}

async fn show_config(ctx: &Context) -> Result<()> {
    if ctx.output.is_json() {
        ctx.output.json(&ctx.config);
        return Ok(());
    }

    ctx.output.header("Current Configuration");
    match &ctx.config_path {
        Some(path) => ctx.output.kv("file", &path.display().to_string()),
        None => ctx.output.kv("file", "(defaults)"),
    }
    if std::env::var(ENV_API_URL).is_ok() {
        ctx.output.kv("override", ENV_API_URL);
    }
    if std::env::var(ENV_TOKEN).is_ok() {
        ctx.output.kv("token", &format!("from {}", ENV_TOKEN));
    }

    let config = &ctx.config;

    ctx.output.info("");
    ctx.output.info("[api]");
    ctx.output.kv("base_url", &config.api.base_url);
    ctx.output.kv("request_timeout_ms", &config.api.request_timeout_ms.to_string());
    ctx.output.kv("connect_timeout_ms", &config.api.connect_timeout_ms.to_string());

    ctx.output.info("");
    ctx.output.info("[debounce]");
    ctx.output.kv("search_wait_ms", &config.debounce.search_wait_ms.to_string());
    if let Some(max_wait) = config.debounce.search_max_wait_ms {
        ctx.output.kv("search_max_wait_ms", &max_wait.to_string());
    }
    ctx.output.kv("suggest_wait_ms", &config.debounce.suggest_wait_ms.to_string());
    ctx.output.kv(
        "load_more_throttle_ms",
        &config.debounce.load_more_throttle_ms.to_string(),
    );

    ctx.output.info("");
    ctx.output.info("[suggestions]");
    ctx.output.kv("ttl_ms", &config.suggestions.ttl_ms.to_string());
    ctx.output.kv("min_query_chars", &config.suggestions.min_query_chars.to_string());

    ctx.output.info("");
    ctx.output.info("[pagination]");
    let sizes: Vec<String> = config.pagination.page_sizes.iter().map(u32::to_string).collect();
    ctx.output.kv("page_sizes", &sizes.join(", "));
    ctx.output.kv("default_page_size", &config.pagination.default_page_size.to_string());

    ctx.output.info("");
    ctx.output.info("[logging]");
    ctx.output.kv("level", &config.logging.level);
    ctx.output.kv("json", &config.logging.json.to_string());

    Ok(())
}

async fn init_config(base_url: Option<&str>, path: &str, force: bool, ctx: &Context) -> Result<()> {
    let config_path = ctx.resolve_path(path);

    if config_path.exists() && !force {
        bail!(
            "Config file already exists: {}. Use --force to overwrite.",
            config_path.display()
        );
    }

    let base_url = base_url.unwrap_or(DEFAULT_BASE_URL);
    let content = if config_path.extension().and_then(|e| e.to_str()) == Some("json") {
        let mut config = SearchConfig::default();
        config.api.base_url = base_url.to_string();
        serde_json::to_string_pretty(&config)?
    } else {
        generate_default_config(base_url)
    };

    fs::write(&config_path, content)
        .with_context(|| format!("Failed to write config file: {}", config_path.display()))?;

    ctx.output
        .success(&format!("Created {}", config_path.display()));
    Ok(())
}

async fn validate_config(ctx: &Context) -> Result<()> {
    let Some(path) = &ctx.config_path else {
        ctx.output.warn("No config file found; defaults are in effect");
        ctx.config.validate()?;
        return Ok(());
    };

    // loading validated the file; env overrides may have changed it since
    ctx.config
        .validate()
        .with_context(|| format!("Invalid configuration in {}", path.display()))?;

    if ctx.output.is_json() {
        ctx.output.json(&serde_json::json!({
            "valid": true,
            "path": path.display().to_string(),
        }));
    } else {
        ctx.output.success(&format!("{} is valid", path.display()));
    }
    Ok(())
}
