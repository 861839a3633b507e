use serde::Deserialize;
use serde_with::serde_as;
use std::time::Duration;

#[serde_as]
#[derive(Deserialize)]
pub(crate) struct Config {
    /// When absent, play counts are kept in memory only
    pub(crate) url: Option<url::Url>,

    #[serde(default = "default_database_pool_size")]
    pub(crate) pool_size: u32,

    /// Max time a single storage round-trip may take
    #[serde_as(as = "serde_with::DurationSeconds<u64>")]
    #[serde(default = "default_query_timeout", rename = "query_timeout_secs")]
    pub(crate) query_timeout: Duration,
}

fn default_database_pool_size() -> u32 {
    // Every command makes at most one query, so this leaves plenty of room
    // for the dispatcher's concurrency without hogging the server
    16
}

fn default_query_timeout() -> Duration {
    Duration::from_secs(5)
}
