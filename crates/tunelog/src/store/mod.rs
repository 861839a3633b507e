mod memory;
mod pg;

use crate::{PlayCount, StoreResult};
use async_trait::async_trait;
use teloxide::types::ChatId;

pub use memory::MemoryPlayCountStore;
pub use pg::{PgPlayCountStore, PgStoreConfig};

/// Storage primitives the play counter is built on.
///
/// Implementations must make [`PlayCountStore::increment`] atomic with
/// respect to concurrent callers that increment the same chat: N concurrent
/// calls must result in the count growing by exactly N.
#[async_trait]
pub trait PlayCountStore: Send + Sync + 'static {
    /// Short name of the backend used in logs and metrics
    fn backend(&self) -> &'static str;

    /// Creates the record with the count of 1 if it doesn't exist, otherwise
    /// adds 1 to the existing count. Returns the count after the increment.
    async fn increment(&self, chat_id: ChatId) -> StoreResult<u64>;

    async fn get_count(&self, chat_id: ChatId) -> StoreResult<Option<u64>>;

    /// Returns at most `limit` records ordered by play count descending.
    async fn get_top(&self, limit: u32) -> StoreResult<Vec<PlayCount>>;
}
