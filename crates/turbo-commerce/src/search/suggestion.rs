//! Autocomplete suggestions.

use serde::{Deserialize, Serialize};

/// One autocomplete entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Suggestion {
    /// Product name to complete to.
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub brand: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
}

impl Suggestion {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            brand: None,
            category: None,
        }
    }

    pub fn with_brand(mut self, brand: impl Into<String>) -> Self {
        self.brand = Some(brand.into());
        self
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }
}

/// Response body of the suggestions endpoint.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SuggestionsResponse {
    #[serde(default)]
    pub suggestions: Vec<Suggestion>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_partial_entries() {
        let body = r#"{"suggestions":[{"name":"Laptop Pro","brand":"Acme","category":"laptops"},{"name":"Lap desk"}]}"#;
        let response: SuggestionsResponse = serde_json::from_str(body).unwrap();
        assert_eq!(
            response.suggestions,
            vec![
                Suggestion::new("Laptop Pro").with_brand("Acme").with_category("laptops"),
                Suggestion::new("Lap desk"),
            ]
        );
    }

    #[test]
    fn test_missing_list_is_empty() {
        let response: SuggestionsResponse = serde_json::from_str("{}").unwrap();
        assert!(response.suggestions.is_empty());
    }
}
