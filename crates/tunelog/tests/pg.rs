//! Tests against a real Postgres instance. They are skipped unless
//! `TUNELOG_TEST_DATABASE_URL` points to a database the tests may write to.

use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use teloxide::types::ChatId;
use tunelog::{PgPlayCountStore, PgStoreConfig, PlayCountStore, PlayCounter};

async fn connect() -> Option<PgPlayCountStore> {
    let Ok(url) = std::env::var("TUNELOG_TEST_DATABASE_URL") else {
        eprintln!("TUNELOG_TEST_DATABASE_URL is not set, skipping the test");
        return None;
    };

    let cfg = PgStoreConfig {
        url,
        pool_size: 8,
        acquire_timeout: Duration::from_secs(10),
    };

    Some(PgPlayCountStore::connect(cfg).await.unwrap())
}

/// Chat ids that no other test run could have used yet. Real chat ids never
/// go below -10^13, so these don't collide with anything meaningful either.
fn fresh_chat_ids<const N: usize>() -> [ChatId; N] {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .as_nanos() as i64;

    let base = -(nanos % 1_000_000_000_000) - 100_000_000_000_000;
    std::array::from_fn(|i| ChatId(base - i as i64))
}

#[test_log::test(tokio::test(flavor = "multi_thread", worker_threads = 4))]
async fn upsert_counts_every_increment() {
    let Some(store) = connect().await else { return };
    let counter = PlayCounter::new(Arc::new(store));

    let [chat] = fresh_chat_ids();

    assert_eq!(counter.get_count(chat).await.unwrap(), 0);

    let tasks = (0..50).map(|_| {
        let counter = counter.clone();
        tokio::spawn(async move { counter.increment(chat).await })
    });

    for result in futures::future::join_all(tasks).await {
        assert!(result.unwrap());
    }

    assert_eq!(counter.get_count(chat).await.unwrap(), 50);
}

#[test_log::test(tokio::test)]
async fn increment_returns_the_new_count() {
    let Some(store) = connect().await else { return };

    let [chat] = fresh_chat_ids();

    assert_eq!(store.increment(chat).await.unwrap(), 1);
    assert_eq!(store.increment(chat).await.unwrap(), 2);
    assert_eq!(store.get_count(chat).await.unwrap(), Some(2));
}

#[test_log::test(tokio::test)]
async fn top_is_sorted_descending() {
    let Some(store) = connect().await else { return };

    let [more, less] = fresh_chat_ids();

    for _ in 0..3 {
        store.increment(more).await.unwrap();
    }
    store.increment(less).await.unwrap();

    assert_eq!(store.get_count(more).await.unwrap(), Some(3));
    assert_eq!(store.get_count(less).await.unwrap(), Some(1));

    let top = store.get_top(10_000).await.unwrap();

    assert!(top.len() <= 10_000);
    assert!(top
        .windows(2)
        .all(|pair| pair[0].play_count >= pair[1].play_count));

    // A shared database may rank other chats above both of ours
    let position = |chat| top.iter().position(|entry| entry.chat_id == chat);
    if let (Some(more), Some(less)) = (position(more), position(less)) {
        assert!(more < less);
    }
}
