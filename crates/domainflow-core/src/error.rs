use thiserror::Error;

/// The error taxonomy shared across every DomainFlow crate.
///
/// Handlers and services map lower-level errors into one of these kinds
/// before returning; callers branch on [`Error::kind`] rather than on the
/// concrete variant so the taxonomy stays the single source of truth for
/// retry and HTTP-status decisions.
#[derive(Debug, Error)]
pub enum Error {
    #[error("validation error: {message}")]
    Validation { message: String },

    #[error("not found: {message}")]
    NotFound { message: String },

    #[error("conflict: {message}")]
    Conflict { message: String },

    #[error("permission denied: {message}")]
    PermissionDenied { message: String },

    #[error("transient error: {message}")]
    Transient { message: String },

    #[error("resource exhausted: {message}")]
    ResourceExhausted { message: String },

    #[error("deadline exceeded: {message}")]
    DeadlineExceeded { message: String },

    #[error("cancelled: {message}")]
    Cancelled { message: String },

    #[error("internal error: {message}")]
    Internal { message: String },

    #[error(transparent)]
    Database(#[from] sqlx::Error),

    #[error(transparent)]
    Migrate(#[from] sqlx::migrate::MigrateError),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Http(#[from] reqwest::Error),

    #[error(transparent)]
    Url(#[from] url::ParseError),

    #[error(transparent)]
    Dns(#[from] hickory_resolver::ResolveError),

    #[error(transparent)]
    DeadlineElapsed(#[from] tokio::time::error::Elapsed),
}

/// The taxonomy tag from `Error`, used for retry decisions and the
/// orchestrator's HTTP-status translation — kept separate from `Error`
/// itself so callers don't need to match every transparent variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Validation,
    NotFound,
    Conflict,
    PermissionDenied,
    Transient,
    ResourceExhausted,
    DeadlineExceeded,
    Cancelled,
    Internal,
}

impl Error {
    pub fn validation(message: impl Into<String>) -> Self {
        Error::Validation { message: message.into() }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Error::NotFound { message: message.into() }
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        Error::Conflict { message: message.into() }
    }

    pub fn permission_denied(message: impl Into<String>) -> Self {
        Error::PermissionDenied { message: message.into() }
    }

    pub fn transient(message: impl Into<String>) -> Self {
        Error::Transient { message: message.into() }
    }

    pub fn resource_exhausted(message: impl Into<String>) -> Self {
        Error::ResourceExhausted { message: message.into() }
    }

    pub fn deadline_exceeded(message: impl Into<String>) -> Self {
        Error::DeadlineExceeded { message: message.into() }
    }

    pub fn cancelled(message: impl Into<String>) -> Self {
        Error::Cancelled { message: message.into() }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Error::Internal { message: message.into() }
    }

    /// Classify this error into the taxonomy kind, unwrapping transparent
    /// wrapper variants by inspecting the underlying library error where it
    /// carries useful information (e.g. a unique-constraint violation is a
    /// conflict, not a bare internal error).
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::Validation { .. } => ErrorKind::Validation,
            Error::NotFound { .. } => ErrorKind::NotFound,
            Error::Conflict { .. } => ErrorKind::Conflict,
            Error::PermissionDenied { .. } => ErrorKind::PermissionDenied,
            Error::Transient { .. } => ErrorKind::Transient,
            Error::ResourceExhausted { .. } => ErrorKind::ResourceExhausted,
            Error::DeadlineExceeded { .. } => ErrorKind::DeadlineExceeded,
            Error::Cancelled { .. } => ErrorKind::Cancelled,
            Error::Internal { .. } => ErrorKind::Internal,
            Error::Database(sqlx::Error::RowNotFound) => ErrorKind::NotFound,
            Error::Database(sqlx::Error::Database(db_err)) if db_err.is_unique_violation() => {
                ErrorKind::Conflict
            }
            Error::Database(sqlx::Error::PoolTimedOut) => ErrorKind::DeadlineExceeded,
            Error::Database(_) => ErrorKind::Internal,
            Error::Migrate(_) => ErrorKind::Internal,
            Error::Json(_) => ErrorKind::Internal,
            Error::Http(e) if e.is_timeout() => ErrorKind::DeadlineExceeded,
            Error::Http(_) => ErrorKind::Transient,
            Error::Url(_) => ErrorKind::Validation,
            Error::Dns(_) => ErrorKind::Transient,
            Error::DeadlineElapsed(_) => ErrorKind::DeadlineExceeded,
        }
    }

    /// Whether a job handler that produced this error should retry
    /// (`fail(retryable=true)`) rather than fail terminally.
    pub fn is_retryable(&self) -> bool {
        matches!(self.kind(), ErrorKind::Transient | ErrorKind::DeadlineExceeded)
    }
}

/// The `Result` alias used workspace-wide.
pub type Result<T> = std::result::Result<T, Error>;
