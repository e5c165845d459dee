//! Catalog API access with endpoint categories, credentials and timeouts.
//!
//! This crate provides:
//! - `EndpointCategory` - Logical endpoints, one in-flight request each
//! - `CatalogBackend` - The seam between the search layer and the API
//! - `HttpBackend` - reqwest implementation of `CatalogBackend`
//! - `CredentialProvider` - Bearer token source and 401 handler
//! - `TimeoutConfig` - Transport timeouts

mod backend;
mod client;
mod credentials;
mod endpoint;
mod timeout;

pub use backend::*;
pub use client::*;
pub use credentials::*;
pub use endpoint::*;
pub use timeout::*;
