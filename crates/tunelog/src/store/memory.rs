use super::PlayCountStore;
use crate::{PlayCount, StoreResult};
use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::HashMap;
use teloxide::types::ChatId;

/// Process-local store. The counts don't survive a restart, so this is
/// meant for tests and for running the bot without a database at hand.
#[derive(Debug, Default)]
pub struct MemoryPlayCountStore {
    counts: Mutex<HashMap<ChatId, u64>>,
}

impl MemoryPlayCountStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl PlayCountStore for MemoryPlayCountStore {
    fn backend(&self) -> &'static str {
        "memory"
    }

    async fn increment(&self, chat_id: ChatId) -> StoreResult<u64> {
        // The lookup and the write happen under the same lock
        let mut counts = self.counts.lock();
        let count = counts.entry(chat_id).or_default();
        *count += 1;
        Ok(*count)
    }

    async fn get_count(&self, chat_id: ChatId) -> StoreResult<Option<u64>> {
        Ok(self.counts.lock().get(&chat_id).copied())
    }

    async fn get_top(&self, limit: u32) -> StoreResult<Vec<PlayCount>> {
        let mut top: Vec<_> = self
            .counts
            .lock()
            .iter()
            .map(|(&chat_id, &play_count)| PlayCount {
                chat_id,
                play_count,
            })
            .collect();

        // Ties are ordered by chat id only to keep the output deterministic
        top.sort_unstable_by(|a, b| {
            b.play_count
                .cmp(&a.play_count)
                .then_with(|| a.chat_id.0.cmp(&b.chat_id.0))
        });
        top.truncate(limit as usize);

        Ok(top)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn increment_returns_updated_count() {
        let store = MemoryPlayCountStore::new();

        assert_eq!(store.increment(ChatId(1)).await.unwrap(), 1);
        assert_eq!(store.increment(ChatId(1)).await.unwrap(), 2);
        assert_eq!(store.increment(ChatId(2)).await.unwrap(), 1);

        assert_eq!(store.get_count(ChatId(1)).await.unwrap(), Some(2));
        assert_eq!(store.get_count(ChatId(3)).await.unwrap(), None);
    }

    #[tokio::test]
    async fn ties_are_ordered_by_chat_id() {
        let store = MemoryPlayCountStore::new();

        for chat in [30, 10, 20] {
            store.increment(ChatId(chat)).await.unwrap();
        }

        let top: Vec<_> = store
            .get_top(10)
            .await
            .unwrap()
            .into_iter()
            .map(|entry| entry.chat_id.0)
            .collect();

        assert_eq!(top, [10, 20, 30]);
    }
}
