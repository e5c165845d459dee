//! Per-category request supersession.

use std::collections::HashMap;
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};

use edge_data::EndpointCategory;
use parking_lot::Mutex;
use tokio_util::sync::CancellationToken;

/// A request was superseded or torn down. Not a failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("request cancelled")]
pub struct Cancelled;

/// Handle attached to one outgoing request.
#[derive(Debug, Clone)]
pub struct RequestToken {
    category: EndpointCategory,
    seq: u64,
    token: CancellationToken,
}

impl RequestToken {
    /// Get the endpoint category.
    pub fn category(&self) -> EndpointCategory {
        self.category
    }

    /// Sequence number, increasing across all categories of one manager.
    pub fn seq(&self) -> u64 {
        self.seq
    }

    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }

    /// Resolves once the request is cancelled.
    pub async fn cancelled(&self) {
        self.token.cancelled().await
    }

    /// Race `future` against cancellation. A cancelled request never yields
    /// its output, even if it was already complete.
    pub async fn run<F: Future>(&self, future: F) -> Result<F::Output, Cancelled> {
        if self.is_cancelled() {
            return Err(Cancelled);
        }
        tokio::select! {
            biased;
            _ = self.token.cancelled() => Err(Cancelled),
            output = future => {
                if self.is_cancelled() {
                    Err(Cancelled)
                } else {
                    Ok(output)
                }
            }
        }
    }
}

/// Keeps one live request per endpoint category.
#[derive(Debug, Default)]
pub struct CancellationManager {
    slots: Mutex<HashMap<EndpointCategory, RequestToken>>,
    next_seq: AtomicU64,
}

impl CancellationManager {
    /// Create a new manager.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a new request, cancelling the previous one in `category`.
    pub fn begin_request(&self, category: EndpointCategory) -> RequestToken {
        let token = RequestToken {
            category,
            seq: self.next_seq.fetch_add(1, Ordering::Relaxed) + 1,
            token: CancellationToken::new(),
        };

        if let Some(previous) = self.slots.lock().insert(category, token.clone()) {
            previous.token.cancel();
            tracing::debug!(
                category = %category,
                superseded = previous.seq,
                seq = token.seq,
                "request superseded"
            );
        }

        token
    }

    /// Whether a request is live in `category`.
    pub fn in_flight(&self, category: EndpointCategory) -> bool {
        self.slots.lock().contains_key(&category)
    }

    /// Whether `token` is still the live request of its category.
    pub fn is_current(&self, token: &RequestToken) -> bool {
        !token.is_cancelled()
            && self
                .slots
                .lock()
                .get(&token.category)
                .is_some_and(|live| live.seq == token.seq)
    }

    /// Release the slot held by `token`. Returns false if it was superseded.
    pub fn finish(&self, token: &RequestToken) -> bool {
        let mut slots = self.slots.lock();
        match slots.get(&token.category) {
            Some(live) if live.seq == token.seq => {
                slots.remove(&token.category);
                true
            }
            _ => false,
        }
    }

    /// Cancel the live request in `category`. Returns whether there was one.
    pub fn cancel(&self, category: EndpointCategory) -> bool {
        match self.slots.lock().remove(&category) {
            Some(live) => {
                live.token.cancel();
                true
            }
            None => false,
        }
    }

    /// Cancel every live request. Returns how many were cancelled.
    pub fn cancel_all(&self) -> usize {
        let drained: Vec<RequestToken> = self.slots.lock().drain().map(|(_, t)| t).collect();
        for live in &drained {
            live.token.cancel();
        }
        if !drained.is_empty() {
            tracing::debug!(count = drained.len(), "cancelled all in-flight requests");
        }
        drained.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_new_request_supersedes_previous() {
        let manager = CancellationManager::new();
        let first = manager.begin_request(EndpointCategory::AdvancedSearch);
        let second = manager.begin_request(EndpointCategory::AdvancedSearch);

        assert!(first.is_cancelled());
        assert!(!manager.is_current(&first));
        assert!(manager.is_current(&second));
        assert!(second.seq() > first.seq());
    }

    #[test]
    fn test_categories_are_independent() {
        let manager = CancellationManager::new();
        let listing = manager.begin_request(EndpointCategory::Listing);
        let suggest = manager.begin_request(EndpointCategory::Suggestions);

        assert!(manager.is_current(&listing));
        assert!(manager.is_current(&suggest));

        assert!(manager.cancel(EndpointCategory::Listing));
        assert!(listing.is_cancelled());
        assert!(!suggest.is_cancelled());
        assert!(!manager.cancel(EndpointCategory::Listing));
    }

    #[test]
    fn test_finish_only_releases_own_slot() {
        let manager = CancellationManager::new();
        let first = manager.begin_request(EndpointCategory::Listing);
        let second = manager.begin_request(EndpointCategory::Listing);

        assert!(!manager.finish(&first));
        assert!(manager.in_flight(EndpointCategory::Listing));
        assert!(manager.finish(&second));
        assert!(!manager.in_flight(EndpointCategory::Listing));
    }

    #[test]
    fn test_cancel_all() {
        let manager = CancellationManager::new();
        let tokens: Vec<_> = EndpointCategory::ALL
            .iter()
            .map(|c| manager.begin_request(*c))
            .collect();

        assert_eq!(manager.cancel_all(), 4);
        assert!(tokens.iter().all(RequestToken::is_cancelled));
        assert_eq!(manager.cancel_all(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_run_discards_superseded_output() {
        let manager = CancellationManager::new();
        let stale = manager.begin_request(EndpointCategory::AdvancedSearch);

        let slow = {
            let stale = stale.clone();
            tokio::spawn(async move {
                stale
                    .run(async {
                        tokio::time::sleep(Duration::from_millis(200)).await;
                        "stale"
                    })
                    .await
            })
        };

        tokio::time::sleep(Duration::from_millis(50)).await;
        let fresh = manager.begin_request(EndpointCategory::AdvancedSearch);

        assert_eq!(slow.await.unwrap(), Err(Cancelled));
        assert_eq!(fresh.run(async { "fresh" }).await, Ok("fresh"));
    }
}
