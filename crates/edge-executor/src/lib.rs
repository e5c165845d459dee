//! Input coalescing and request supersession on tokio.
//!
//! This crate keeps bursts of user input from turning into bursts of requests:
//! - `Debouncer` - Coalesce calls until input settles, with optional max wait
//! - `Throttler` - At most one call per window
//! - `CancellationManager` - One live request per endpoint category

mod cancel;
mod debounce;
mod throttle;

pub use cancel::*;
pub use debounce::*;
pub use throttle::*;
