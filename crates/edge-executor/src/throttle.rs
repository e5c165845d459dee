//! Throttled invocation.

use std::time::Duration;

use crate::debounce::{DebounceOptions, Debouncer};

/// Invokes at most once per `wait` window, trailing edge only.
///
/// Built on [`Debouncer`] with `max_wait == wait`, so continuous calls run
/// once per window and a lone call runs `wait` after it was made.
pub struct Throttler<A: Send + 'static> {
    debouncer: Debouncer<A>,
}

impl<A: Send + 'static> Throttler<A> {
    /// Create a new throttler.
    pub fn new<F>(wait: Duration, callback: F) -> Self
    where
        F: Fn(A) + Send + Sync + 'static,
    {
        let options = DebounceOptions::new(wait).with_max_wait(wait);
        Self {
            debouncer: Debouncer::new(options, callback),
        }
    }

    /// Record a call. The latest arguments in a window win.
    pub fn call(&self, args: A) {
        self.debouncer.call(args);
    }

    /// Discard the pending invocation.
    pub fn cancel(&self) {
        self.debouncer.cancel();
    }

    pub fn is_pending(&self) -> bool {
        self.debouncer.is_pending()
    }
}

impl<A: Send + 'static> std::fmt::Debug for Throttler<A> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Throttler")
            .field("wait", &self.debouncer.options().wait)
            .finish()
    }
}
