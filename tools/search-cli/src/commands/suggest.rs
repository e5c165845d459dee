//! Autocomplete lookups.

use std::sync::Arc;

use anyhow::Result;
use edge_executor::CancellationManager;
use edge_observability::SearchMetrics;
use serde_json::json;
use turbo_search::SuggestionService;

use super::SuggestArgs;
use crate::context::Context;

/// Run the suggest command.
pub async fn run(args: SuggestArgs, ctx: &Context) -> Result<()> {
    let service = SuggestionService::new(
        ctx.backend()?,
        Arc::new(CancellationManager::new()),
        &ctx.config.suggestions,
        Arc::new(SearchMetrics::new()),
    );

    let query = args.query.trim();
    if query.chars().count() < ctx.config.suggestions.min_query_chars {
        ctx.output.debug(&format!(
            "Queries shorter than {} characters are not sent",
            ctx.config.suggestions.min_query_chars
        ));
    }

    let suggestions = service
        .get_suggestions(query, args.category.as_deref())
        .await?
        .unwrap_or_default();

    if ctx.output.is_json() {
        ctx.output.json(&json!({
            "query": query,
            "category": args.category,
            "suggestions": suggestions,
        }));
        return Ok(());
    }

    if suggestions.is_empty() {
        ctx.output.info("No suggestions");
        return Ok(());
    }

    ctx.output.header(&format!("Suggestions for {:?}", query));
    for suggestion in &suggestions {
        let mut line = suggestion.name.clone();
        let context: Vec<&str> = [suggestion.brand.as_deref(), suggestion.category.as_deref()]
            .into_iter()
            .flatten()
            .collect();
        if !context.is_empty() {
            line.push_str(&format!(" ({})", context.join(", ")));
        }
        ctx.output.list_item(&line);
    }

    Ok(())
}
