//! Search filter types.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::CommerceError;

/// A specification filter value (scalar or list of scalars).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum SpecValue {
    Bool(bool),
    Number(f64),
    Text(String),
    List(Vec<SpecValue>),
}

/// Specification filters keyed by spec name. Ordered so serialization is stable.
pub type SpecMap = BTreeMap<String, SpecValue>;

impl SpecValue {
    /// Create a text value.
    pub fn text(value: impl Into<String>) -> Self {
        SpecValue::Text(value.into())
    }

    /// Create a list of text values.
    pub fn list<I, S>(values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        SpecValue::List(values.into_iter().map(|v| SpecValue::Text(v.into())).collect())
    }

    /// Drop empty strings, empty lists and non-finite numbers.
    ///
    /// Returns `None` when nothing meaningful is left.
    pub fn normalized(&self) -> Option<SpecValue> {
        match self {
            SpecValue::Bool(b) => Some(SpecValue::Bool(*b)),
            SpecValue::Number(n) if n.is_finite() => Some(SpecValue::Number(*n)),
            SpecValue::Number(_) => None,
            SpecValue::Text(s) => {
                let trimmed = s.trim();
                if trimmed.is_empty() {
                    None
                } else {
                    Some(SpecValue::Text(trimmed.to_string()))
                }
            }
            SpecValue::List(items) => {
                let items: Vec<SpecValue> = items.iter().filter_map(SpecValue::normalized).collect();
                if items.is_empty() {
                    None
                } else {
                    Some(SpecValue::List(items))
                }
            }
        }
    }

    /// Query-string form: scalars as plain text, lists as JSON text.
    pub fn to_query_value(&self) -> Result<String, CommerceError> {
        Ok(match self {
            SpecValue::Bool(b) => b.to_string(),
            SpecValue::Number(n) => n.to_string(),
            SpecValue::Text(s) => s.clone(),
            SpecValue::List(_) => serde_json::to_string(self)?,
        })
    }
}

/// Normalize every value of a spec map, dropping keys that end up empty.
pub fn normalize_spec_map(map: &SpecMap) -> SpecMap {
    map.iter()
        .filter(|(key, _)| !key.trim().is_empty())
        .filter_map(|(key, value)| value.normalized().map(|v| (key.trim().to_string(), v)))
        .collect()
}

/// Filter state exactly as the UI holds it: text inputs are kept verbatim.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawFilters {
    /// Free-text query.
    #[serde(default)]
    pub search: String,
    /// Selected category.
    #[serde(default)]
    pub category: String,
    /// Selected brand.
    #[serde(default)]
    pub brand: String,
    /// Minimum price input.
    #[serde(default)]
    pub min_price: String,
    /// Maximum price input.
    #[serde(default)]
    pub max_price: String,
    /// Minimum rating input.
    #[serde(default)]
    pub min_rating: String,
    /// Stock filter: unset, in stock only, or out of stock only.
    #[serde(default)]
    pub in_stock: Option<bool>,
    /// Generic specification filters.
    #[serde(default)]
    pub specifications: SpecMap,
    /// Filters that only exist for the selected category.
    #[serde(default)]
    pub category_specific: SpecMap,
}

impl RawFilters {
    /// Set the text query.
    pub fn with_search(mut self, search: impl Into<String>) -> Self {
        self.search = search.into();
        self
    }

    /// Set the category.
    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = category.into();
        self
    }

    /// Set the brand.
    pub fn with_brand(mut self, brand: impl Into<String>) -> Self {
        self.brand = brand.into();
        self
    }

    /// Set the minimum price input.
    pub fn with_min_price(mut self, min: impl Into<String>) -> Self {
        self.min_price = min.into();
        self
    }

    /// Set the maximum price input.
    pub fn with_max_price(mut self, max: impl Into<String>) -> Self {
        self.max_price = max.into();
        self
    }

    /// Set the minimum rating input.
    pub fn with_min_rating(mut self, rating: impl Into<String>) -> Self {
        self.min_rating = rating.into();
        self
    }

    /// Set the stock filter.
    pub fn with_in_stock(mut self, in_stock: Option<bool>) -> Self {
        self.in_stock = in_stock;
        self
    }

    /// Add a specification filter.
    pub fn with_spec(mut self, name: impl Into<String>, value: SpecValue) -> Self {
        self.specifications.insert(name.into(), value);
        self
    }

    /// Add a category-specific filter.
    pub fn with_category_spec(mut self, name: impl Into<String>, value: SpecValue) -> Self {
        self.category_specific.insert(name.into(), value);
        self
    }
}

/// The canonical request shape sent to the catalog API.
///
/// Absent values are `None`/empty and never serialized, so two filter sets
/// that differ only in empty inputs compare and serialize identically.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SearchFilters {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub search: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub brand: Option<String>,
    #[serde(rename = "minPrice", default, skip_serializing_if = "Option::is_none")]
    pub min_price: Option<f64>,
    #[serde(rename = "maxPrice", default, skip_serializing_if = "Option::is_none")]
    pub max_price: Option<f64>,
    #[serde(rename = "minRating", default, skip_serializing_if = "Option::is_none")]
    pub min_rating: Option<f64>,
    #[serde(rename = "inStock", default, skip_serializing_if = "Option::is_none")]
    pub in_stock: Option<bool>,
    #[serde(default, skip_serializing_if = "SpecMap::is_empty")]
    pub specifications: SpecMap,
    #[serde(default, skip_serializing_if = "SpecMap::is_empty")]
    pub category_specific: SpecMap,
    #[serde(default)]
    pub offset: u32,
    #[serde(default)]
    pub limit: u32,
    #[serde(rename = "includeAggregations", default)]
    pub include_aggregations: bool,
    /// Opaque continuation token for "load next batch" requests.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cursor: Option<String>,
}

impl SearchFilters {
    /// Whether free-text search is active.
    pub fn has_search_text(&self) -> bool {
        self.search.is_some()
    }

    /// Whether any facet beyond page/size is active.
    pub fn has_facets(&self) -> bool {
        self.category.is_some()
            || self.brand.is_some()
            || self.min_price.is_some()
            || self.max_price.is_some()
            || self.min_rating.is_some()
            || self.in_stock.is_some()
            || !self.specifications.is_empty()
            || !self.category_specific.is_empty()
    }

    /// Serialize as query parameters: scalars as strings, maps as JSON text.
    pub fn to_query_pairs(&self) -> Result<Vec<(String, String)>, CommerceError> {
        let mut pairs = Vec::new();

        let mut push = |key: &str, value: String| pairs.push((key.to_string(), value));

        if let Some(search) = &self.search {
            push("search", search.clone());
        }
        if let Some(category) = &self.category {
            push("category", category.clone());
        }
        if let Some(brand) = &self.brand {
            push("brand", brand.clone());
        }
        if let Some(min) = self.min_price {
            push("minPrice", min.to_string());
        }
        if let Some(max) = self.max_price {
            push("maxPrice", max.to_string());
        }
        if let Some(rating) = self.min_rating {
            push("minRating", rating.to_string());
        }
        if let Some(in_stock) = self.in_stock {
            push("inStock", in_stock.to_string());
        }
        if !self.specifications.is_empty() {
            push("specifications", serde_json::to_string(&self.specifications)?);
        }
        if !self.category_specific.is_empty() {
            push("category_specific", serde_json::to_string(&self.category_specific)?);
        }
        push("offset", self.offset.to_string());
        push("limit", self.limit.to_string());
        push("includeAggregations", self.include_aggregations.to_string());
        if let Some(cursor) = &self.cursor {
            push("cursor", cursor.clone());
        }

        Ok(pairs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_spec_value_normalization() {
        assert_eq!(SpecValue::text("  16GB ").normalized(), Some(SpecValue::text("16GB")));
        assert_eq!(SpecValue::text("   ").normalized(), None);
        assert_eq!(SpecValue::Number(f64::NAN).normalized(), None);
        assert_eq!(
            SpecValue::list(["", "red", " "]).normalized(),
            Some(SpecValue::list(["red"]))
        );
        assert_eq!(SpecValue::list(["", " "]).normalized(), None);
    }

    #[test]
    fn test_spec_map_drops_empty_keys_and_values() {
        let mut map = SpecMap::new();
        map.insert("ram".into(), SpecValue::text("16GB"));
        map.insert("color".into(), SpecValue::list(Vec::<String>::new()));
        map.insert(" ".into(), SpecValue::text("x"));

        let normalized = normalize_spec_map(&map);
        assert_eq!(normalized.len(), 1);
        assert_eq!(normalized.get("ram"), Some(&SpecValue::text("16GB")));
    }

    #[test]
    fn test_untagged_spec_values_deserialize() {
        let map: SpecMap =
            serde_json::from_str(r#"{"ssd":true,"cores":8,"ram":"16GB","color":["red","blue"]}"#)
                .unwrap();
        assert_eq!(map.get("ssd"), Some(&SpecValue::Bool(true)));
        assert_eq!(map.get("cores"), Some(&SpecValue::Number(8.0)));
        assert_eq!(map.get("ram"), Some(&SpecValue::text("16GB")));
        assert_eq!(map.get("color"), Some(&SpecValue::list(["red", "blue"])));
    }

    #[test]
    fn test_query_pairs_omit_absent_fields() {
        let filters = SearchFilters {
            search: Some("laptop".into()),
            min_price: Some(499.5),
            in_stock: Some(false),
            limit: 12,
            include_aggregations: true,
            ..Default::default()
        };

        let pairs = filters.to_query_pairs().unwrap();
        let keys: Vec<&str> = pairs.iter().map(|(k, _)| k.as_str()).collect();
        assert_eq!(
            keys,
            vec!["search", "minPrice", "inStock", "offset", "limit", "includeAggregations"]
        );
        assert_eq!(pairs[1].1, "499.5");
        assert_eq!(pairs[2].1, "false");
    }

    #[test]
    fn test_query_pairs_encode_maps_as_json() {
        let mut filters = SearchFilters::default();
        filters.specifications.insert("ram".into(), SpecValue::list(["8GB", "16GB"]));

        let pairs = filters.to_query_pairs().unwrap();
        let specs = pairs.iter().find(|(k, _)| k == "specifications").unwrap();
        assert_eq!(specs.1, r#"{"ram":["8GB","16GB"]}"#);
    }

    #[test]
    fn test_whole_number_prices_have_no_fraction() {
        let filters = SearchFilters {
            max_price: Some(1000.0),
            ..Default::default()
        };
        let pairs = filters.to_query_pairs().unwrap();
        assert_eq!(pairs[0], ("maxPrice".to_string(), "1000".to_string()));
    }

    #[test]
    fn test_has_facets() {
        let mut filters = SearchFilters {
            search: Some("phone".into()),
            ..Default::default()
        };
        assert!(filters.has_search_text());
        assert!(!filters.has_facets());

        filters.in_stock = Some(true);
        assert!(filters.has_facets());
    }
}
