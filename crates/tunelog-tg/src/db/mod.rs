mod cfg;

use crate::prelude::*;
use crate::{err_ctx, ErrorKind, Result};
use std::sync::Arc;
use tunelog::{MemoryPlayCountStore, PgPlayCountStore, PgStoreConfig, PlayCountStore, PlayCounter};

pub(crate) use cfg::*;

pub(crate) async fn init(cfg: Config) -> Result<PlayCounter> {
    let store: Arc<dyn PlayCountStore> = match cfg.url {
        Some(url) => {
            let store_cfg = PgStoreConfig {
                url: url.into(),
                pool_size: cfg.pool_size,
                acquire_timeout: cfg.query_timeout,
            };
            let store = PgPlayCountStore::connect(store_cfg)
                .with_duration_log("Connecting to the database")
                .await
                .map_err(err_ctx!(ErrorKind::Db))?;

            Arc::new(store)
        }
        None => {
            warn!(
                "DATABASE_URL is not set, play counts will be kept in memory \
                and lost on restart"
            );
            Arc::new(MemoryPlayCountStore::new())
        }
    };

    let counter = PlayCounter::new(store).with_timeout(cfg.query_timeout);

    info!(backend = counter.backend(), "Play counter is ready");

    Ok(counter)
}
