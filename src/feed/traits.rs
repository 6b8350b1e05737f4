//! Feed client trait definition
//!
//! The scheduler only talks to the funding feed through `FeedClient`, so the
//! HTTP client can be swapped for a scripted one in tests.

use async_trait::async_trait;

use crate::feed::errors::FeedResult;
use crate::feed::types::FeedSnapshot;

/// Source of live funding snapshots
///
/// # Contract
/// - One call performs at most one outbound request.
/// - No retries inside the client; retry policy belongs to the scheduler.
/// - A successful snapshot has `origin = Live`.
#[async_trait]
pub trait FeedClient: Send + Sync {
    /// Fetch and normalize one snapshot
    async fn fetch_snapshot(&self) -> FeedResult<FeedSnapshot>;

    /// Human-readable source name for logs (usually the endpoint)
    fn source_name(&self) -> &str;
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};

    use tokio::sync::Semaphore;

    use crate::feed::errors::FeedError;

    /// Scripted feed client for scheduler tests.
    ///
    /// Replays queued responses (the last one repeats forever) and counts
    /// calls. An optional gate holds each call until a permit is released.
    pub struct MockFeedClient {
        responses: Mutex<VecDeque<FeedResult<FeedSnapshot>>>,
        last: Mutex<Option<FeedResult<FeedSnapshot>>>,
        calls: Arc<AtomicUsize>,
        gate: Option<Arc<Semaphore>>,
    }

    impl MockFeedClient {
        pub fn new(responses: Vec<FeedResult<FeedSnapshot>>) -> Self {
            Self {
                responses: Mutex::new(responses.into()),
                last: Mutex::new(None),
                calls: Arc::new(AtomicUsize::new(0)),
                gate: None,
            }
        }

        pub fn failing(err: FeedError) -> Self {
            Self::new(vec![Err(err)])
        }

        /// Hold every call until a permit is added to `gate`
        pub fn with_gate(mut self, gate: Arc<Semaphore>) -> Self {
            self.gate = Some(gate);
            self
        }

        pub fn call_counter(&self) -> Arc<AtomicUsize> {
            self.calls.clone()
        }

        pub fn call_count(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl FeedClient for MockFeedClient {
        async fn fetch_snapshot(&self) -> FeedResult<FeedSnapshot> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if let Some(gate) = &self.gate {
                if let Ok(permit) = gate.acquire().await {
                    permit.forget();
                }
            }

            let next = self.responses.lock().unwrap().pop_front();
            let mut last = self.last.lock().unwrap();
            match next {
                Some(response) => {
                    *last = Some(response.clone());
                    response
                }
                None => last
                    .clone()
                    .unwrap_or_else(|| Err(FeedError::Network("mock exhausted".into()))),
            }
        }

        fn source_name(&self) -> &str {
            "mock"
        }
    }

    #[tokio::test]
    async fn test_mock_replays_then_repeats_last() {
        let mock = MockFeedClient::new(vec![
            Err(FeedError::BadStatus(500)),
            Err(FeedError::Network("down".into())),
        ]);
        assert_eq!(mock.fetch_snapshot().await.unwrap_err(), FeedError::BadStatus(500));
        assert_eq!(mock.fetch_snapshot().await.unwrap_err().kind(), "network");
        assert_eq!(mock.fetch_snapshot().await.unwrap_err().kind(), "network");
        assert_eq!(mock.call_count(), 3);
    }
}
