//! Search results, aggregations and engine telemetry.

use std::collections::BTreeMap;

use serde::{Deserialize, Deserializer, Serialize};

use crate::search::filter::SearchFilters;

/// A product as listed in search results.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProductSummary {
    /// Product identifier.
    #[serde(alias = "_id", default, deserialize_with = "string_or_number")]
    pub id: String,
    /// Display name.
    #[serde(default)]
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub brand: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    /// Unit price.
    #[serde(default)]
    pub price: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rating: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stock: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
}

impl ProductSummary {
    /// Whether the product can be ordered right now. Unknown stock counts as available.
    pub fn is_in_stock(&self) -> bool {
        self.stock.map_or(true, |s| s > 0)
    }
}

/// A single facet value with its document count.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AggregationBucket {
    /// The facet value.
    #[serde(deserialize_with = "string_or_number")]
    pub key: String,
    /// Number of matching products.
    #[serde(alias = "doc_count", default)]
    pub count: u64,
}

impl AggregationBucket {
    pub fn new(key: impl Into<String>, count: u64) -> Self {
        Self {
            key: key.into(),
            count,
        }
    }
}

/// Facet name to bucket list.
pub type Aggregations = BTreeMap<String, Vec<AggregationBucket>>;

/// Aggregation payloads arrive either as bare bucket lists or wrapped in `{ buckets: [...] }`.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
enum WireAggregation {
    Buckets(Vec<AggregationBucket>),
    Wrapped {
        #[serde(default)]
        buckets: Vec<AggregationBucket>,
    },
}

impl WireAggregation {
    fn into_buckets(self) -> Vec<AggregationBucket> {
        match self {
            WireAggregation::Buckets(buckets) | WireAggregation::Wrapped { buckets } => buckets,
        }
    }
}

/// Which engine served a response and how well it went.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineTelemetry {
    /// The advanced engine handled the request.
    #[serde(rename = "useElastic")]
    pub use_elastic: bool,
    /// Engine-reported processing time in milliseconds.
    #[serde(rename = "es_took", skip_serializing_if = "Option::is_none")]
    pub took_ms: Option<u64>,
    /// The engine hit its internal timeout and returned partial results.
    #[serde(rename = "es_timed_out")]
    pub timed_out: bool,
    /// The backend fell back to its baseline engine.
    #[serde(rename = "fallbackUsed")]
    pub fallback_used: bool,
}

impl EngineTelemetry {
    /// Successful but degraded: partial results or baseline engine.
    pub fn is_degraded(&self) -> bool {
        self.timed_out || self.fallback_used
    }
}

/// Normalized result of one search request.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchResult {
    pub items: Vec<ProductSummary>,
    pub total: u64,
    pub offset: u32,
    pub limit: u32,
    pub has_more: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cursor: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_cursor: Option<String>,
    pub aggregations: Aggregations,
    pub telemetry: EngineTelemetry,
}

impl SearchResult {
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Append a follow-up batch. Items accumulate; paging metadata and
    /// telemetry follow the newest batch; facets are kept unless the batch
    /// carries its own.
    pub fn append(&mut self, next: SearchResult) {
        self.items.extend(next.items);
        self.total = next.total;
        self.has_more = next.has_more;
        self.cursor = next.cursor;
        self.next_cursor = next.next_cursor;
        self.telemetry = next.telemetry;
        if !next.aggregations.is_empty() {
            self.aggregations = next.aggregations;
        }
    }
}

/// Response body of the listing and advanced search endpoints.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProductsResponse {
    #[serde(default)]
    pub products: Vec<ProductSummary>,
    #[serde(default)]
    pub total: Option<u64>,
    #[serde(default)]
    pub offset: Option<u32>,
    #[serde(default)]
    pub limit: Option<u32>,
    #[serde(rename = "hasMore", default)]
    pub has_more: Option<bool>,
    #[serde(default)]
    pub cursor: Option<String>,
    #[serde(rename = "nextCursor", default)]
    pub next_cursor: Option<String>,
    #[serde(default, deserialize_with = "wire_aggregations")]
    pub aggregations: Aggregations,
    #[serde(rename = "useElastic", default)]
    pub use_elastic: Option<bool>,
    #[serde(default)]
    pub es_took: Option<u64>,
    #[serde(default)]
    pub es_timed_out: Option<bool>,
    #[serde(alias = "fallbackUsed", default)]
    pub fallback: Option<bool>,
}

impl ProductsResponse {
    /// Normalize into a [`SearchResult`], filling gaps from the request that produced it.
    pub fn into_result(self, request: &SearchFilters) -> SearchResult {
        let offset = self.offset.unwrap_or(request.offset);
        let limit = self.limit.unwrap_or(request.limit);
        let total = self
            .total
            .unwrap_or(u64::from(offset) + self.products.len() as u64);
        let has_more = self.has_more.unwrap_or_else(|| {
            self.next_cursor.is_some() || u64::from(offset) + (self.products.len() as u64) < total
        });

        SearchResult {
            items: self.products,
            total,
            offset,
            limit,
            has_more,
            cursor: self.cursor,
            next_cursor: self.next_cursor,
            aggregations: self.aggregations,
            telemetry: EngineTelemetry {
                use_elastic: self.use_elastic.unwrap_or(false),
                took_ms: self.es_took,
                timed_out: self.es_timed_out.unwrap_or(false),
                fallback_used: self.fallback.unwrap_or(false),
            },
        }
    }
}

fn wire_aggregations<'de, D>(deserializer: D) -> Result<Aggregations, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<BTreeMap<String, WireAggregation>> = Option::deserialize(deserializer)?;
    Ok(raw
        .unwrap_or_default()
        .into_iter()
        .map(|(name, agg)| (name, agg.into_buckets()))
        .collect())
}

fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    match serde_json::Value::deserialize(deserializer)? {
        serde_json::Value::String(s) => Ok(s),
        serde_json::Value::Null => Ok(String::new()),
        other => Ok(other.to_string()),
    }
}
