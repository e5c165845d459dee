//! Run one search through a mounted search surface.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Context as _, Result};
use indicatif::ProgressBar;
use turbo_commerce::search::{
    normalize_filters, PageSizes, PaginationState, RawFilters, SearchMode, SpecValue,
};
use turbo_search::{
    decode_query, encode_query, MemoryHistory, SearchPhase, SearchSurface, Settlement,
    SurfaceOptions, SurfaceSnapshot,
};

use super::SearchArgs;
use crate::context::Context;
use crate::output::{format_price, phase_badge, truncate, Output};

/// Run the search command.
pub async fn run(args: SearchArgs, ctx: &Context) -> Result<()> {
    let options = SurfaceOptions::from_config(&ctx.config);
    let query = build_query(&args, &options.page_sizes, &ctx.output)?;
    ctx.output.debug(&format!("Starting from query string {:?}", query));

    let history = Arc::new(MemoryHistory::with_query(query));
    let surface = SearchSurface::mount(&ctx.config, ctx.backend()?, history);
    let limit = ctx.config.api.request_timeout() + Duration::from_secs(1);

    let spinner = ctx.output.spinner("Searching...");
    let snapshot = collect(&surface, args.load_more, limit, &spinner).await;
    spinner.finish_and_clear();

    let final_state = surface.unmount().await;
    ctx.output.debug(&format!(
        "Surface unmounted ({} dispatched, {} deduplicated, {} superseded)",
        final_state.metrics.dispatched,
        final_state.metrics.deduplicated,
        final_state.metrics.superseded
    ));

    let snapshot = snapshot?;
    if snapshot.phase == SearchPhase::Settled(Settlement::Failed) {
        let mode = SearchMode::infer(&snapshot.filters);
        let message = snapshot
            .store
            .error(mode)
            .unwrap_or("unknown error")
            .to_string();
        bail!("Search failed: {}", message);
    }

    if ctx.output.is_json() {
        ctx.output.json(&snapshot);
        return Ok(());
    }

    print_results(&snapshot, args.facets, &ctx.output);
    Ok(())
}

/// Wait for the first page, then load up to `batches` follow-up batches.
async fn collect(
    surface: &SearchSurface,
    batches: usize,
    limit: Duration,
    spinner: &ProgressBar,
) -> Result<SurfaceSnapshot> {
    let mut snapshot = wait_for(surface, limit, |s| matches!(s.phase, SearchPhase::Settled(_))).await?;

    for batch in 1..=batches {
        if snapshot.phase != SearchPhase::Settled(Settlement::Success) || !snapshot.store.has_more() {
            break;
        }
        spinner.set_message(format!("Loading batch {}...", batch + 1));
        let seen = snapshot.settlements;
        surface.load_more();
        snapshot = wait_for(surface, limit, |s| s.settlements > seen).await?;
    }

    Ok(snapshot)
}

async fn wait_for<F>(surface: &SearchSurface, limit: Duration, predicate: F) -> Result<SurfaceSnapshot>
where
    F: FnMut(&SurfaceSnapshot) -> bool,
{
    tokio::time::timeout(limit, surface.wait_until(predicate))
        .await
        .context("Timed out waiting for the catalog")?
        .context("Search surface stopped unexpectedly")
}

/// Combine `--url` with the individual flags into the query string the
/// surface hydrates from.
fn build_query(args: &SearchArgs, page_sizes: &PageSizes, output: &Output) -> Result<String> {
    let base = decode_query(args.url.as_deref().unwrap_or(""), page_sizes);
    let mut filters: RawFilters = base.filters;

    if let Some(query) = &args.query {
        filters.search = query.clone();
    }
    if let Some(category) = &args.category {
        filters.category = category.clone();
    }
    if let Some(brand) = &args.brand {
        filters.brand = brand.clone();
    }
    if let Some(min) = &args.min_price {
        filters.min_price = min.clone();
    }
    if let Some(max) = &args.max_price {
        filters.max_price = max.clone();
    }
    if let Some(rating) = &args.min_rating {
        filters.min_rating = rating.clone();
    }
    if args.in_stock.is_some() {
        filters.in_stock = args.in_stock;
    }
    for spec in &args.specs {
        let Some((name, value)) = spec.split_once('=') else {
            bail!("Invalid --spec {:?}, expected name=value", spec);
        };
        filters = filters.with_spec(name.trim(), SpecValue::text(value.trim()));
    }

    let page_size = match args.page_size {
        Some(size) if page_sizes.contains(size) => size,
        Some(size) => {
            output.warn(&format!(
                "Page size {} is not one of {:?}, using {}",
                size,
                page_sizes.allowed(),
                base.pagination.page_size()
            ));
            base.pagination.page_size()
        }
        None => base.pagination.page_size(),
    };
    let page = args.page.unwrap_or(base.pagination.page());
    let pagination = PaginationState::at(page, page_size);

    Ok(encode_query(&normalize_filters(&filters), &pagination, page_sizes))
}

fn print_results(snapshot: &SurfaceSnapshot, facets: bool, output: &Output) {
    let store = &snapshot.store;

    output.header("Results");
    if let Some(mode) = store.result_mode() {
        output.kv("mode", mode.as_str());
    }
    output.kv("status", &phase_badge(snapshot.phase));
    output.kv("total", &store.total().to_string());
    output.kv(
        "page",
        &format!("{} of {}", snapshot.pagination.page(), store.total_pages().max(1)),
    );
    output.kv("showing", &store.items().len().to_string());
    if !snapshot.query_string.is_empty() {
        output.kv("url", &format!("?{}", snapshot.query_string));
    }

    if let Some(telemetry) = store.telemetry() {
        let engine = if telemetry.use_elastic { "search engine" } else { "database" };
        let took = telemetry
            .took_ms
            .map(|ms| format!(" in {}ms", ms))
            .unwrap_or_default();
        output.kv("engine", &format!("{}{}", engine, took));
        if telemetry.is_degraded() {
            output.warn("Results are degraded (engine timeout or fallback); they may be incomplete");
        }
    }

    if store.items().is_empty() {
        output.info("No products match");
    } else {
        println!();
        let widths = [24, 36, 14, 10, 6, 6];
        output.table_row(&["ID", "NAME", "BRAND", "PRICE", "RATING", "STOCK"], &widths);
        for item in store.items() {
            let rating = item.rating.map(|r| format!("{:.1}", r)).unwrap_or_default();
            let stock = if item.is_in_stock() { "yes" } else { "no" };
            output.table_row(
                &[
                    &truncate(&item.id, widths[0]),
                    &truncate(&item.name, widths[1]),
                    &truncate(item.brand.as_deref().unwrap_or(""), widths[2]),
                    &format_price(item.price),
                    &rating,
                    stock,
                ],
                &widths,
            );
        }
    }

    if store.has_more() {
        output.info("More results available (use --load-more or --page)");
    }

    if facets {
        if let Some(aggregations) = store.aggregations() {
            for (name, buckets) in aggregations {
                output.header(name);
                for bucket in buckets {
                    output.list_item(&format!("{} ({})", bucket.key, bucket.count));
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[derive(Parser)]
    struct Harness {
        #[command(flatten)]
        args: SearchArgs,
    }

    fn query(argv: &[&str]) -> String {
        let mut full = vec!["search"];
        full.extend_from_slice(argv);
        let harness = Harness::try_parse_from(full).unwrap();
        build_query(&harness.args, &PageSizes::listing(), &Output::new(false, true)).unwrap()
    }

    #[test]
    fn test_flags_become_query_string() {
        assert_eq!(query(&[]), "");
        assert_eq!(query(&["laptop", "--page", "2"]), "search=laptop&page=2");
        assert_eq!(
            query(&["--category", "phones", "--page-size", "24"]),
            "category=phones&pageSize=24"
        );
    }

    #[test]
    fn test_flags_override_url() {
        assert_eq!(
            query(&["--url", "search=tv&brand=Acme&page=3", "--brand", "Zed"]),
            "search=tv&brand=Zed&page=3"
        );
    }

    #[test]
    fn test_invalid_page_size_falls_back() {
        assert_eq!(query(&["--page-size", "7"]), "");
    }

    #[test]
    fn test_malformed_spec_is_rejected() {
        let harness = Harness::try_parse_from(["search", "--spec", "ram"]).unwrap();
        assert!(build_query(&harness.args, &PageSizes::listing(), &Output::new(false, true)).is_err());
    }
}
