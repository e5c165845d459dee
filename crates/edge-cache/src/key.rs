//! Cache key composition.

use serde::{Deserialize, Serialize};

/// Separator between scope and term.
pub const SCOPE_SEPARATOR: &str = "::";

/// A cache key uniquely identifying a cached value.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CacheKey {
    key: String,
}

impl CacheKey {
    /// Create a cache key from a string.
    pub fn new(key: impl Into<String>) -> Self {
        Self { key: key.into() }
    }

    /// `scope::term`. An absent scope is the empty string, so `None` and
    /// `Some("")` share entries.
    pub fn scoped(scope: Option<&str>, term: &str) -> Self {
        Self {
            key: format!("{}{}{}", scope.unwrap_or(""), SCOPE_SEPARATOR, term),
        }
    }

    /// Get the key string.
    pub fn as_str(&self) -> &str {
        &self.key
    }

    /// Split a scoped key back into `(scope, term)`.
    pub fn parts(&self) -> Option<(&str, &str)> {
        self.key.split_once(SCOPE_SEPARATOR)
    }
}

impl std::fmt::Display for CacheKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scoped_keys() {
        assert_eq!(CacheKey::scoped(Some("phones"), "pix").as_str(), "phones::pix");
        assert_eq!(CacheKey::scoped(None, "pix").as_str(), "::pix");
        assert_eq!(CacheKey::scoped(None, "pix"), CacheKey::scoped(Some(""), "pix"));
        assert_ne!(
            CacheKey::scoped(Some("phones"), "pix"),
            CacheKey::scoped(Some("tablets"), "pix")
        );
    }

    #[test]
    fn test_parts() {
        let key = CacheKey::scoped(Some("tvs"), "oled");
        assert_eq!(key.parts(), Some(("tvs", "oled")));
        assert_eq!(CacheKey::new("plain").parts(), None);
    }
}
