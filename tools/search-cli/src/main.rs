//! TurboCommerce search CLI.
//!
//! Commands:
//! - `turbo-search search` - Run one search through a mounted search surface
//! - `turbo-search suggest` - Look up autocomplete suggestions
//! - `turbo-search specs` - Show category specifications
//! - `turbo-search config` - Manage configuration

mod commands;
mod config;
mod context;
mod output;

use anyhow::Result;
use clap::{Parser, Subcommand};

use commands::{ConfigArgs, SearchArgs, SpecsArgs, SuggestArgs};

/// TurboCommerce search CLI - query a catalog the way the storefront does
#[derive(Parser)]
#[command(name = "turbo-search")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Use JSON output format
    #[arg(long, global = true)]
    json: bool,

    /// Config file path
    #[arg(short, long, global = true)]
    config: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Search or list products
    Search(SearchArgs),

    /// Look up autocomplete suggestions
    Suggest(SuggestArgs),

    /// Show category specifications
    Specs(SpecsArgs),

    /// Manage configuration
    Config(ConfigArgs),
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let output = output::Output::new(cli.verbose, cli.json);

    let config_path = cli.config.as_deref();
    let ctx = context::Context::load(config_path, output)?;
    ctx.init_logging();

    let result = match cli.command {
        Commands::Search(args) => commands::search::run(args, &ctx).await,
        Commands::Suggest(args) => commands::suggest::run(args, &ctx).await,
        Commands::Specs(args) => commands::specs::run(args, &ctx).await,
        Commands::Config(args) => commands::config::run(args, &ctx).await,
    };

    if let Err(e) = result {
        ctx.output.error(&format!("{:#}", e));
        std::process::exit(1);
    }

    Ok(())
}
