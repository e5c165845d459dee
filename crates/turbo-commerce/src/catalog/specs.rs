//! Category spec schema.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::search::SpecValue;

/// Value type of a spec field.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SpecFieldKind {
    #[default]
    #[serde(alias = "text")]
    String,
    Number,
    #[serde(alias = "bool")]
    Boolean,
    #[serde(alias = "array")]
    List,
}

/// A spec field a category defines.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "WireSpecField")]
pub struct SpecField {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: SpecFieldKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unit: Option<String>,
}

impl SpecField {
    pub fn new(name: impl Into<String>, kind: SpecFieldKind) -> Self {
        Self {
            name: name.into(),
            kind,
            unit: None,
        }
    }

    pub fn with_unit(mut self, unit: impl Into<String>) -> Self {
        self.unit = Some(unit.into());
        self
    }
}

/// Fields arrive either as bare names or as `{ name, type, unit }` objects.
#[derive(Deserialize)]
#[serde(untagged)]
enum WireSpecField {
    Name(String),
    Full {
        name: String,
        #[serde(rename = "type", default)]
        kind: SpecFieldKind,
        #[serde(default)]
        unit: Option<String>,
    },
}

impl From<WireSpecField> for SpecField {
    fn from(wire: WireSpecField) -> Self {
        match wire {
            WireSpecField::Name(name) => SpecField::new(name, SpecFieldKind::default()),
            WireSpecField::Full { name, kind, unit } => SpecField { name, kind, unit },
        }
    }
}

/// Facet schema for one category.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategorySpec {
    /// Category name; filled from the map key when served as part of [`CategorySpecs`].
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub required: Vec<SpecField>,
    #[serde(default)]
    pub optional: Vec<SpecField>,
    /// Enumerated filter options per spec name.
    #[serde(default)]
    pub filters: BTreeMap<String, Vec<String>>,
}

impl CategorySpec {
    /// Required fields followed by optional ones.
    pub fn fields(&self) -> impl Iterator<Item = &SpecField> {
        self.required.iter().chain(self.optional.iter())
    }

    pub fn field(&self, name: &str) -> Option<&SpecField> {
        self.fields().find(|f| f.name == name)
    }

    /// Enumerated options for a filter, if the schema lists any.
    pub fn options(&self, name: &str) -> Option<&[String]> {
        self.filters.get(name).map(Vec::as_slice)
    }

    /// Whether `value` is acceptable for `name`. Filters without enumerated
    /// options accept anything; lists must be fully contained.
    pub fn allows(&self, name: &str, value: &SpecValue) -> bool {
        let Some(options) = self.options(name) else {
            return true;
        };
        match value {
            SpecValue::Text(s) => options.iter().any(|o| o == s),
            SpecValue::List(items) => items.iter().all(|item| self.allows(name, item)),
            SpecValue::Number(n) => options.iter().any(|o| o.parse::<f64>().ok() == Some(*n)),
            SpecValue::Bool(b) => options.iter().any(|o| o == &b.to_string()),
        }
    }
}

/// Facet schemas for every category, keyed by category name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct CategorySpecs {
    categories: BTreeMap<String, CategorySpec>,
}

impl CategorySpecs {
    pub fn get(&self, category: &str) -> Option<&CategorySpec> {
        self.categories.get(category)
    }

    pub fn categories(&self) -> impl Iterator<Item = &str> {
        self.categories.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.categories.len()
    }

    pub fn is_empty(&self) -> bool {
        self.categories.is_empty()
    }

    pub fn insert(&mut self, mut spec: CategorySpec) {
        let key = spec.category.clone();
        if spec.category.is_empty() {
            spec.category = key.clone();
        }
        self.categories.insert(key, spec);
    }
}

impl FromIterator<CategorySpec> for CategorySpecs {
    fn from_iter<I: IntoIterator<Item = CategorySpec>>(iter: I) -> Self {
        let mut specs = CategorySpecs::default();
        for spec in iter {
            specs.insert(spec);
        }
        specs
    }
}

impl<'de> Deserialize<'de> for CategorySpecs {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Wire {
            List(Vec<CategorySpec>),
            Map(BTreeMap<String, CategorySpec>),
        }

        Ok(match Wire::deserialize(deserializer)? {
            Wire::List(list) => list.into_iter().collect(),
            Wire::Map(map) => {
                let categories = map
                    .into_iter()
                    .map(|(name, mut spec)| {
                        if spec.category.is_empty() {
                            spec.category = name.clone();
                        }
                        (name, spec)
                    })
                    .collect();
                CategorySpecs { categories }
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const LAPTOPS: &str = r#"{
        "required": [{"name": "ram", "type": "string", "unit": "GB"}, "processor"],
        "optional": [{"name": "weight", "type": "number", "unit": "kg"}],
        "filters": {"ram": ["8GB", "16GB", "32GB"]}
    }"#;

    #[test]
    fn test_single_category_schema() {
        let spec: CategorySpec = serde_json::from_str(LAPTOPS).unwrap();
        assert_eq!(spec.required.len(), 2);
        assert_eq!(
            spec.field("ram"),
            Some(&SpecField::new("ram", SpecFieldKind::String).with_unit("GB"))
        );
        assert_eq!(spec.field("processor").unwrap().kind, SpecFieldKind::String);
        assert_eq!(spec.field("weight").unwrap().kind, SpecFieldKind::Number);
        assert_eq!(spec.fields().count(), 3);
        assert_eq!(spec.options("ram").unwrap().len(), 3);
    }

    #[test]
    fn test_map_keys_fill_category_names() {
        let body = format!(r#"{{"laptops": {LAPTOPS}, "phones": {{}}}}"#);
        let specs: CategorySpecs = serde_json::from_str(&body).unwrap();
        assert_eq!(specs.categories().collect::<Vec<_>>(), vec!["laptops", "phones"]);
        assert_eq!(specs.get("laptops").unwrap().category, "laptops");
        assert!(specs.get("phones").unwrap().filters.is_empty());
    }

    #[test]
    fn test_list_form() {
        let specs: CategorySpecs =
            serde_json::from_str(r#"[{"category": "tvs", "required": ["size"]}]"#).unwrap();
        assert_eq!(specs.len(), 1);
        assert_eq!(specs.get("tvs").unwrap().required[0].name, "size");
    }

    #[test]
    fn test_allows_enumerated_values() {
        let spec: CategorySpec = serde_json::from_str(LAPTOPS).unwrap();
        assert!(spec.allows("ram", &SpecValue::text("16GB")));
        assert!(!spec.allows("ram", &SpecValue::text("12GB")));
        assert!(spec.allows("ram", &SpecValue::list(["8GB", "32GB"])));
        assert!(!spec.allows("ram", &SpecValue::list(["8GB", "64GB"])));
        assert!(spec.allows("color", &SpecValue::text("anything")));
    }
}
