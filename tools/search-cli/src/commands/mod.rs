//! CLI command implementations.

pub mod config;
pub mod search;
pub mod specs;
pub mod suggest;

use clap::{Args, Subcommand};

/// Arguments for the search command.
#[derive(Args)]
pub struct SearchArgs {
    /// Free-text query. Without it (and without facets) the plain listing is shown.
    pub query: Option<String>,

    /// Start from a storefront query string, e.g. `search=tv&page=2`.
    #[arg(long)]
    pub url: Option<String>,

    /// Category filter.
    #[arg(long)]
    pub category: Option<String>,

    /// Brand filter.
    #[arg(long)]
    pub brand: Option<String>,

    /// Minimum price.
    #[arg(long)]
    pub min_price: Option<String>,

    /// Maximum price.
    #[arg(long)]
    pub max_price: Option<String>,

    /// Minimum rating.
    #[arg(long)]
    pub min_rating: Option<String>,

    /// Stock filter.
    #[arg(long)]
    pub in_stock: Option<bool>,

    /// Specification filter as `name=value` (repeatable).
    #[arg(short, long = "spec")]
    pub specs: Vec<String>,

    /// Page number (1-based).
    #[arg(short, long)]
    pub page: Option<u32>,

    /// Page size; must be one of the configured sizes.
    #[arg(long)]
    pub page_size: Option<u32>,

    /// Load this many follow-up batches after the first page.
    #[arg(long, default_value = "0")]
    pub load_more: usize,

    /// Show facet counts.
    #[arg(long)]
    pub facets: bool,
}

/// Arguments for the suggest command.
#[derive(Args)]
pub struct SuggestArgs {
    /// Partial query.
    pub query: String,

    /// Scope suggestions to a category.
    #[arg(long)]
    pub category: Option<String>,
}

/// Arguments for the specs command.
#[derive(Args)]
pub struct SpecsArgs {
    /// Show a single category.
    pub category: Option<String>,
}

/// Arguments for the config command.
#[derive(Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Subcommand)]
pub enum ConfigCommand {
    /// Show current configuration.
    Show,
    /// Initialize a new config file.
    Init {
        /// Backend base URL to write.
        #[arg(long)]
        base_url: Option<String>,

        /// Output path.
        #[arg(short, long, default_value = "turbo-search.toml")]
        path: String,

        /// Force overwrite existing config.
        #[arg(short, long)]
        force: bool,
    },
    /// Validate the config file.
    Validate,
}
