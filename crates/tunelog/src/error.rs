use std::num::ParseIntError;
use std::time::Duration;

pub(crate) type DynError = dyn std::error::Error + Send + Sync + 'static;

pub type Result<T = (), E = Error> = std::result::Result<T, E>;

pub type StoreResult<T, E = StoreError> = std::result::Result<T, E>;

/// Errors visible to the callers of [`crate::PlayCounter`].
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The backing store could not answer. Reads surface this instead of
    /// pretending the chat has zero plays.
    #[error("Play count storage is unavailable")]
    StorageUnavailable {
        #[from]
        source: StoreError,
    },

    #[error("Invalid chat id `{input}`, expected an integer")]
    InvalidInput {
        input: String,
        source: ParseIntError,
    },
}

/// Failures of the storage layer itself
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Failed to connect to the database")]
    Connect { source: sqlx::Error },

    #[error("Failed to migrate the database")]
    Migrate {
        source: sqlx::migrate::MigrateError,
    },

    #[error("Database query failed")]
    Query {
        #[from]
        source: sqlx::Error,
    },

    #[error("Storage operation `{op}` timed out after {timeout:.2?}")]
    Timeout { op: &'static str, timeout: Duration },

    #[error(
        "Failed to deserialize db value into app repr.\n\
        App type: {app_ty}\n\
        Db type: {db_ty}\n\
        Db value: {db_val}"
    )]
    Deserialize {
        source: Box<DynError>,
        app_ty: &'static str,
        db_ty: &'static str,
        db_val: String,
    },

    #[error("Storage backend is unavailable: {message}")]
    Unavailable { message: String },
}

impl StoreError {
    /// Whether repeating the same operation later has a chance to succeed.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Timeout { .. } | Self::Unavailable { .. } => true,
            Self::Connect { source } | Self::Query { source } => matches!(
                source,
                sqlx::Error::Io(_) | sqlx::Error::PoolTimedOut | sqlx::Error::WorkerCrashed
            ),
            Self::Migrate { .. } | Self::Deserialize { .. } => false,
        }
    }
}

#[must_use]
pub(crate) fn tracing_err<'a, E: std::error::Error + 'static>(err: &'a E) -> impl tracing::Value + 'a {
    err as &dyn std::error::Error
}
