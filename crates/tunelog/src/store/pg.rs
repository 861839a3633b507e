use super::PlayCountStore;
use crate::{PlayCount, StoreError, StoreResult};
use async_trait::async_trait;
use sea_query::{Expr, OnConflict, Order, PostgresQueryBuilder, Query, SimpleExpr};
use sea_query_binder::SqlxBinder;
use sqlx::postgres::PgPoolOptions;
use std::any::type_name;
use std::time::Duration;
use teloxide::types::ChatId;
use tracing::info;

pub struct PgStoreConfig {
    pub url: String,
    pub pool_size: u32,

    /// Max time to wait for a free connection from the pool
    pub acquire_timeout: Duration,
}

#[derive(Debug, sqlx::FromRow)]
#[sea_query::enum_def]
struct TgChatPlayCount {
    chat_id: i64,
    play_count: i64,
}

/// Postgres-backed store. Increments rely on `INSERT .. ON CONFLICT DO UPDATE`,
/// which Postgres executes atomically for a single row.
#[derive(Clone)]
pub struct PgPlayCountStore {
    pool: sqlx::PgPool,
}

impl PgPlayCountStore {
    /// Connects to the database and applies the pending migrations.
    pub async fn connect(cfg: PgStoreConfig) -> StoreResult<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(cfg.pool_size)
            .acquire_timeout(cfg.acquire_timeout)
            // Verify that the connection is working early.
            // The connection created here can also be reused by the migrations down the road.
            .connect(&cfg.url)
            .await
            .map_err(|source| StoreError::Connect { source })?;

        sqlx::migrate!()
            .run(&pool)
            .await
            .map_err(|source| StoreError::Migrate { source })?;

        info!(pool_size = cfg.pool_size, "Connected to the database");

        Ok(Self::from_pool(pool))
    }

    /// Wraps an existing pool. The caller is responsible for the migrations.
    pub fn from_pool(pool: sqlx::PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl PlayCountStore for PgPlayCountStore {
    fn backend(&self) -> &'static str {
        "postgres"
    }

    async fn increment(&self, chat_id: ChatId) -> StoreResult<u64> {
        let on_conflict = OnConflict::column(TgChatPlayCountIden::ChatId)
            .value(
                TgChatPlayCountIden::PlayCount,
                Expr::col((TgChatPlayCountIden::Table, TgChatPlayCountIden::PlayCount)).add(1_i64),
            )
            .to_owned();

        let (sql, values) = Query::insert()
            .into_table(TgChatPlayCountIden::Table)
            .columns([TgChatPlayCountIden::ChatId, TgChatPlayCountIden::PlayCount])
            .values_panic([SimpleExpr::from(chat_id.0), SimpleExpr::from(1_i64)])
            .on_conflict(on_conflict)
            .returning_col(TgChatPlayCountIden::PlayCount)
            .build_sqlx(PostgresQueryBuilder);

        let count: i64 = sqlx::query_scalar_with(&sql, values)
            .fetch_one(&self.pool)
            .await?;

        count_from_db(count)
    }

    async fn get_count(&self, chat_id: ChatId) -> StoreResult<Option<u64>> {
        let (sql, values) = Query::select()
            .column(TgChatPlayCountIden::PlayCount)
            .from(TgChatPlayCountIden::Table)
            .and_where(Expr::col(TgChatPlayCountIden::ChatId).eq(chat_id.0))
            .build_sqlx(PostgresQueryBuilder);

        let count: Option<i64> = sqlx::query_scalar_with(&sql, values)
            .fetch_optional(&self.pool)
            .await?;

        count.map(count_from_db).transpose()
    }

    async fn get_top(&self, limit: u32) -> StoreResult<Vec<PlayCount>> {
        let (sql, values) = Query::select()
            .columns([TgChatPlayCountIden::ChatId, TgChatPlayCountIden::PlayCount])
            .from(TgChatPlayCountIden::Table)
            .order_by(TgChatPlayCountIden::PlayCount, Order::Desc)
            .order_by(TgChatPlayCountIden::ChatId, Order::Asc)
            .limit(u64::from(limit))
            .build_sqlx(PostgresQueryBuilder);

        let records: Vec<TgChatPlayCount> = sqlx::query_as_with(&sql, values)
            .fetch_all(&self.pool)
            .await?;

        records
            .into_iter()
            .map(|record| {
                Ok(PlayCount {
                    chat_id: ChatId(record.chat_id),
                    play_count: count_from_db(record.play_count)?,
                })
            })
            .collect()
    }
}

/// The table has a check constraint against negative values, so a failure
/// here means the schema drifted from what the code expects.
fn count_from_db(db_val: i64) -> StoreResult<u64> {
    u64::try_from(db_val).map_err(|source| StoreError::Deserialize {
        source: Box::new(source),
        app_ty: type_name::<u64>(),
        db_ty: type_name::<i64>(),
        db_val: db_val.to_string(),
    })
}
