use crate::error::tracing_err;
use crate::{retry, telemetry, PlayCount, PlayCountStore, Result, StoreError, StoreResult};
use retry_policies::policies::ExponentialBackoff;
use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};
use teloxide::types::ChatId;
use tracing::{debug, instrument, trace, warn};

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);

/// Counts track starts per chat and ranks chats by their count.
///
/// Cloning is cheap, all clones share the same store.
#[derive(Clone)]
pub struct PlayCounter {
    store: Arc<dyn PlayCountStore>,
    timeout: Duration,
    retry_policy: ExponentialBackoff,
}

impl PlayCounter {
    pub fn new(store: Arc<dyn PlayCountStore>) -> Self {
        Self {
            store,
            timeout: DEFAULT_TIMEOUT,
            retry_policy: retry::default_retry_policy(),
        }
    }

    /// Max duration of a single storage round-trip. Exceeding it counts as
    /// the storage being unavailable.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Policy for retrying reads that failed with a transient error
    pub fn with_retry_policy(mut self, policy: ExponentialBackoff) -> Self {
        self.retry_policy = policy;
        self
    }

    pub fn backend(&self) -> &'static str {
        self.store.backend()
    }

    /// Adds one play to the chat. Counting plays is best-effort: a storage
    /// failure is logged and reported as `false`, but never propagated.
    ///
    /// Every call adds one, there is no deduplication. The call is never
    /// retried, because a lost response doesn't mean the increment didn't
    /// happen.
    #[instrument(skip(self))]
    pub async fn increment(&self, chat_id: ChatId) -> bool {
        match self.timed("increment", self.store.increment(chat_id)).await {
            Ok(play_count) => {
                trace!(play_count, "Incremented play count");
                telemetry::record_increment("ok");
                true
            }
            Err(err) => {
                warn!(err = tracing_err(&err), "Failed to increment play count");
                telemetry::record_increment("err");
                false
            }
        }
    }

    /// Records the start of a new track in the chat
    pub async fn track_started(&self, chat_id: ChatId) -> bool {
        debug!(%chat_id, "Track started");
        self.increment(chat_id).await
    }

    /// Returns the number of plays in the chat, or `0` if none were recorded.
    #[instrument(skip(self))]
    pub async fn get_count(&self, chat_id: ChatId) -> Result<u64> {
        let count = retry::retry_transient("get_count", &self.retry_policy, || {
            self.timed("get_count", self.store.get_count(chat_id))
        })
        .await?;

        Ok(count.unwrap_or(0))
    }

    /// Returns at most `limit` chats with the highest play counts, ordered
    /// by the play count descending. The order of chats with equal counts
    /// depends on the store.
    #[instrument(skip(self))]
    pub async fn get_top(&self, limit: u32) -> Result<Vec<PlayCount>> {
        if limit == 0 {
            return Ok(vec![]);
        }

        let mut top = retry::retry_transient("get_top", &self.retry_policy, || {
            self.timed("get_top", self.store.get_top(limit))
        })
        .await?;

        top.truncate(limit as usize);

        Ok(top)
    }

    async fn timed<T>(
        &self,
        op: &'static str,
        fut: impl Future<Output = StoreResult<T>>,
    ) -> StoreResult<T> {
        let start = Instant::now();

        let result = tokio::time::timeout(self.timeout, fut)
            .await
            .unwrap_or_else(|_| {
                Err(StoreError::Timeout {
                    op,
                    timeout: self.timeout,
                })
            });

        let label = if result.is_ok() { "ok" } else { "err" };
        telemetry::record_store_query(op, label, start.elapsed().as_secs_f64());

        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Error, MemoryPlayCountStore, DEFAULT_TOP_LIMIT};
    use assert_matches::assert_matches;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn memory_counter() -> PlayCounter {
        PlayCounter::new(Arc::new(MemoryPlayCountStore::new()))
    }

    fn fast_retries() -> ExponentialBackoff {
        ExponentialBackoff::builder()
            .retry_bounds(Duration::from_millis(1), Duration::from_millis(5))
            .build_with_max_retries(2)
    }

    fn top_pairs(top: &[PlayCount]) -> Vec<(i64, u64)> {
        top.iter()
            .map(|entry| (entry.chat_id.0, entry.play_count))
            .collect()
    }

    /// Simulates a backend outage, counting how many times it was hit
    #[derive(Default)]
    struct OutageStore {
        calls: AtomicU32,
    }

    impl OutageStore {
        fn fail<T>(&self) -> StoreResult<T> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Err(StoreError::Unavailable {
                message: "connection refused".to_owned(),
            })
        }
    }

    #[async_trait]
    impl PlayCountStore for OutageStore {
        fn backend(&self) -> &'static str {
            "outage"
        }

        async fn increment(&self, _: ChatId) -> StoreResult<u64> {
            self.fail()
        }

        async fn get_count(&self, _: ChatId) -> StoreResult<Option<u64>> {
            self.fail()
        }

        async fn get_top(&self, _: u32) -> StoreResult<Vec<PlayCount>> {
            self.fail()
        }
    }

    /// Never answers within any reasonable timeout
    struct HangingStore;

    #[async_trait]
    impl PlayCountStore for HangingStore {
        fn backend(&self) -> &'static str {
            "hanging"
        }

        async fn increment(&self, _: ChatId) -> StoreResult<u64> {
            std::future::pending().await
        }

        async fn get_count(&self, _: ChatId) -> StoreResult<Option<u64>> {
            std::future::pending().await
        }

        async fn get_top(&self, _: u32) -> StoreResult<Vec<PlayCount>> {
            std::future::pending().await
        }
    }

    #[test_log::test(tokio::test)]
    async fn counts_and_ranks_chats() {
        let counter = memory_counter();

        for _ in 0..3 {
            assert!(counter.increment(ChatId(100)).await);
        }
        assert!(counter.increment(ChatId(200)).await);

        assert_eq!(counter.get_count(ChatId(100)).await.unwrap(), 3);
        assert_eq!(counter.get_count(ChatId(200)).await.unwrap(), 1);

        let top = counter.get_top(2).await.unwrap();
        assert_eq!(top_pairs(&top), [(100, 3), (200, 1)]);
    }

    #[test_log::test(tokio::test)]
    async fn unknown_chat_has_zero_plays() {
        let counter = memory_counter();
        counter.increment(ChatId(1)).await;

        assert_eq!(counter.get_count(ChatId(2)).await.unwrap(), 0);
    }

    #[test_log::test(tokio::test)]
    async fn increment_is_not_idempotent() {
        let counter = memory_counter();

        counter.increment(ChatId(7)).await;
        counter.increment(ChatId(7)).await;

        assert_eq!(counter.get_count(ChatId(7)).await.unwrap(), 2);
    }

    #[test_log::test(tokio::test)]
    async fn track_started_counts_a_play() {
        let counter = memory_counter();

        assert!(counter.track_started(ChatId(-1001)).await);
        assert_eq!(counter.get_count(ChatId(-1001)).await.unwrap(), 1);
    }

    #[test_log::test(tokio::test(flavor = "multi_thread", worker_threads = 4))]
    async fn concurrent_increments_are_not_lost() {
        const N: u64 = 500;
        let counter = memory_counter();

        let tasks = (0..N).map(|_| {
            let counter = counter.clone();
            tokio::spawn(async move { counter.increment(ChatId(42)).await })
        });

        let results = futures::future::join_all(tasks).await;
        assert!(results.into_iter().all(|result| result.unwrap()));

        assert_eq!(counter.get_count(ChatId(42)).await.unwrap(), N);
    }

    #[test_log::test(tokio::test)]
    async fn top_is_bounded_and_sorted() {
        let counter = memory_counter();

        let plays = [(1, 5), (2, 9), (3, 1), (4, 9), (5, 3), (6, 7)];
        for (chat, count) in plays {
            for _ in 0..count {
                counter.increment(ChatId(chat)).await;
            }
        }

        for limit in [1, 3, 6, 100] {
            let top = counter.get_top(limit).await.unwrap();

            assert_eq!(top.len(), plays.len().min(limit as usize));
            assert!(top
                .windows(2)
                .all(|pair| pair[0].play_count >= pair[1].play_count));
        }

        let top = counter.get_top(DEFAULT_TOP_LIMIT).await.unwrap();
        assert_eq!(
            top_pairs(&top),
            [(2, 9), (4, 9), (6, 7), (1, 5), (5, 3), (3, 1)]
        );
    }

    #[test_log::test(tokio::test)]
    async fn zero_limit_and_empty_store_give_empty_top() {
        let counter = memory_counter();
        assert!(counter.get_top(DEFAULT_TOP_LIMIT).await.unwrap().is_empty());

        counter.increment(ChatId(1)).await;
        assert!(counter.get_top(0).await.unwrap().is_empty());
    }

    #[test_log::test(tokio::test)]
    async fn zero_limit_doesnt_hit_the_store() {
        let store = Arc::new(OutageStore::default());
        let counter = PlayCounter::new(store.clone());

        assert!(counter.get_top(0).await.unwrap().is_empty());
        assert_eq!(store.calls.load(Ordering::SeqCst), 0);
    }

    #[test_log::test(tokio::test)]
    async fn increment_swallows_outage() {
        let store = Arc::new(OutageStore::default());
        let counter = PlayCounter::new(store.clone()).with_retry_policy(fast_retries());

        assert!(!counter.increment(ChatId(100)).await);

        // Increments must never be retried
        assert_eq!(store.calls.load(Ordering::SeqCst), 1);
    }

    #[test_log::test(tokio::test)]
    async fn reads_surface_outage_after_retries() {
        let store = Arc::new(OutageStore::default());
        let counter = PlayCounter::new(store.clone()).with_retry_policy(fast_retries());

        let err = counter.get_count(ChatId(100)).await.unwrap_err();
        assert_matches!(
            err,
            Error::StorageUnavailable {
                source: StoreError::Unavailable { .. }
            }
        );
        assert_eq!(store.calls.load(Ordering::SeqCst), 3);

        let err = counter.get_top(10).await.unwrap_err();
        assert_matches!(err, Error::StorageUnavailable { .. });
    }

    #[test_log::test(tokio::test(start_paused = true))]
    async fn slow_store_times_out() {
        let counter = PlayCounter::new(Arc::new(HangingStore))
            .with_timeout(Duration::from_millis(200))
            .with_retry_policy(fast_retries());

        assert!(!counter.increment(ChatId(1)).await);

        let err = counter.get_count(ChatId(1)).await.unwrap_err();
        assert_matches!(
            err,
            Error::StorageUnavailable {
                source: StoreError::Timeout {
                    op: "get_count",
                    ..
                }
            }
        );
    }
}
