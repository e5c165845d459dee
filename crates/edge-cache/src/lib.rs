//! Time-boxed in-memory caching with scoped keys.
//!
//! This crate provides:
//! - `TtlCache` - Map whose entries are only visible while younger than a TTL
//! - `CacheStatus` - Outcome of a lookup
//! - `CacheKey` - `scope::term` keys
//!
//! Expiry is lazy: nothing runs in the background, an expired entry simply
//! reads as absent until it is overwritten or purged.
//!
//! # Example
//!
//! ```
//! use std::time::Duration;
//! use edge_cache::{CacheKey, TtlCache};
//! use tokio::time::Instant;
//!
//! let mut cache = TtlCache::new(Duration::from_secs(120));
//! let key = CacheKey::scoped(Some("laptops"), "lap");
//! let now = Instant::now();
//!
//! cache.insert(key.clone(), vec!["Laptop Pro"], now);
//! assert_eq!(key.as_str(), "laptops::lap");
//! assert!(cache.get(&key, now + Duration::from_secs(60)).is_some());
//! assert!(cache.get(&key, now + Duration::from_secs(120)).is_none());
//! ```

mod key;
mod ttl;

pub use key::*;
pub use ttl::*;
