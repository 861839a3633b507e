mod ext;
mod macros;

use crate::prelude::*;
use crate::util::DynError;
use std::fmt;
use std::sync::Arc;
use thiserror::Error;
use tracing_error::SpanTrace;

pub(crate) use macros::*;

pub(crate) mod prelude {
    pub(crate) use super::ext::OptionExt as _;
}

pub type Result<T = (), E = Error> = std::result::Result<T, E>;

/// Describes any possible error that may happen in the application lifetime.
#[derive(Clone)]
pub struct Error {
    imp: Arc<ErrorImp>,
}

struct ErrorImp {
    /// Small identifier used for debugging purposes.
    /// It is mentioned in the chat when the error happens.
    /// This way we as developers can copy it and lookup the logs using this id.
    id: String,
    kind: ErrorKind,

    // Participates only in debug impl
    spantrace: SpanTrace,
}

#[derive(Error, Debug)]
pub(crate) enum ErrorKind {
    #[error(transparent)]
    User {
        #[from]
        source: UserError,
    },

    #[error(transparent)]
    PlayCount {
        #[from]
        source: tunelog::Error,
    },

    #[error("Failed to initialize the play count storage")]
    Db { source: tunelog::StoreError },

    #[error(transparent)]
    Tg {
        #[from]
        source: teloxide::RequestError,
    },

    /// Unrecoverable kind of error, that is not supposed to happen, but when
    /// it happens we can't do anything reasonable about it, so no structural
    /// error handling is possible, this error is just propagated to the top.
    #[error("FATAL: {message}")]
    Fatal {
        message: String,
        source: Option<Box<DynError>>,
    },
}

/// Errors caused by the wrong usage of the bot's commands
#[derive(Debug, Error)]
pub(crate) enum UserError {
    #[error("Usage: /check <chat_id>")]
    CheckUsage,

    #[error("This command can be used only in groups")]
    GroupOnlyCommand,

    #[error("Usage: /track_started <chat_id>")]
    TrackStartedUsage,
}

impl Error {
    pub(crate) fn id(&self) -> &str {
        &self.imp.id
    }

    /// Errors caused by interaction with the user.
    /// These are most likely caused by humanz sending wrong input.
    pub(crate) fn is_user_error(&self) -> bool {
        match self.kind() {
            ErrorKind::User { .. } => true,
            ErrorKind::PlayCount { source } => {
                matches!(source, tunelog::Error::InvalidInput { .. })
            }
            ErrorKind::Db { .. } | ErrorKind::Tg { .. } | ErrorKind::Fatal { .. } => false,
        }
    }

    pub(crate) fn kind(&self) -> &ErrorKind {
        &self.imp.kind
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Error (id: {}): {}", self.imp.id, self.imp.kind)
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.imp.kind.source()
    }
}

impl fmt::Debug for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self, f)?;
        fmt::Display::fmt(&self.imp.spantrace, f)
    }
}

impl<T: Into<ErrorKind>> From<T> for Error {
    #[track_caller]
    fn from(kind: T) -> Self {
        let imp = ErrorImp {
            kind: kind.into(),
            id: nanoid::nanoid!(6),
            spantrace: SpanTrace::capture(),
        };

        let err = Self { imp: Arc::new(imp) };

        trace!(err = tracing_err(&err), "Created an error");

        err
    }
}
