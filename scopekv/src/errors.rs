use std::borrow::Cow;

use thiserror::Error;

use crate::tenancy::TenancyContext;

/// Top-level error type returned by scopekv stores.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Validation failed for one or more fields. Never reaches the backend.
    #[error("validation failed: {0}")]
    Validation(#[from] ValidationError),

    /// Stored bytes could not be encoded or decoded.
    #[error("failed to (de)serialize entry at '{key}': {source}")]
    Serialization {
        key: String,
        #[source]
        source: serde_json::Error,
    },

    /// The owning scope of a resource did not exist when the write was evaluated.
    #[error("could not write {kind} '{name}' in {scope}: parent scope does not exist")]
    PreconditionFailed {
        kind: &'static str,
        name: String,
        scope: TenancyContext,
    },

    /// A create targeted a key that is already populated.
    #[error("resource already exists at '{key}'")]
    AlreadyExists { key: String },

    /// The backend could not be reached or is temporarily unable to serve.
    #[error("backend unavailable: {0}")]
    Transport(redis::RedisError),

    /// The backend answered, but with an error another attempt will not fix.
    #[error("backend error: {0}")]
    Backend(redis::RedisError),

    /// The retry policy gave up.
    #[error("maximal number of retry attempts reached ({attempts})")]
    MaxRetryAttempts { attempts: u32 },

    /// A retry loop was interrupted by its cancellation signal.
    #[error("operation cancelled")]
    Cancelled,

    #[error("{message}")]
    Other { message: Cow<'static, str> },
}

impl StoreError {
    /// Only backend availability failures are worth another attempt.
    pub fn is_retryable(&self) -> bool {
        matches!(self, StoreError::Transport(_))
    }

    pub fn is_precondition_failed(&self) -> bool {
        matches!(self, StoreError::PreconditionFailed { .. })
    }
}

impl From<redis::RedisError> for StoreError {
    fn from(err: redis::RedisError) -> Self {
        if is_unavailable(&err) {
            StoreError::Transport(err)
        } else {
            StoreError::Backend(err)
        }
    }
}

fn is_unavailable(err: &redis::RedisError) -> bool {
    err.is_io_error()
        || err.is_connection_dropped()
        || err.is_connection_refusal()
        || err.is_timeout()
        || matches!(
            err.kind(),
            redis::ErrorKind::TryAgain
                | redis::ErrorKind::BusyLoadingError
                | redis::ErrorKind::ClusterDown
                | redis::ErrorKind::MasterDown
        )
}

/// Failure modes of a [`crate::retry::Backoff`] loop.
#[derive(Debug, Error)]
pub enum RetryError<E> {
    /// The wrapped function returned an error; it is passed through untouched.
    #[error(transparent)]
    Aborted(E),

    #[error("maximal number of retry attempts reached ({attempts})")]
    MaxRetryAttempts { attempts: u32 },

    #[error("retry cancelled")]
    Cancelled,
}

impl From<RetryError<StoreError>> for StoreError {
    fn from(err: RetryError<StoreError>) -> Self {
        match err {
            RetryError::Aborted(inner) => inner,
            RetryError::MaxRetryAttempts { attempts } => StoreError::MaxRetryAttempts { attempts },
            RetryError::Cancelled => StoreError::Cancelled,
        }
    }
}

/// Failures of a message [`crate::transport::Transport`].
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("transport is closed")]
    Closed,

    #[error("transport i/o failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("could not connect: {message}")]
    Connect { message: String },

    #[error("gave up reconnecting after {attempts} attempts")]
    MaxRetryAttempts { attempts: u32 },

    #[error("reconnect cancelled")]
    Cancelled,
}

/// Problems loading a [`crate::config::StoreConfig`].
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: toml::de::Error,
    },

    #[error("environment variable {var} not set")]
    MissingEnv { var: String },
}

/// Collection of validation issues encountered while preparing a mutation.
#[derive(Debug, Error)]
#[error("validation errors: {issues:?}")]
pub struct ValidationError {
    pub issues: Vec<ValidationIssue>,
}

impl ValidationError {
    pub fn new<I>(issues: I) -> Self
    where
        I: IntoIterator<Item = ValidationIssue>,
    {
        Self {
            issues: issues.into_iter().collect(),
        }
    }

    /// Convenience helper for constructing a single-field validation error.
    pub fn single(field: impl Into<String>, code: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new([ValidationIssue::new(field, code, message)])
    }

    pub fn is_empty(&self) -> bool {
        self.issues.is_empty()
    }

    /// True when any issue concerns `field`.
    pub fn has_field(&self, field: &str) -> bool {
        self.issues.iter().any(|issue| issue.field == field)
    }
}

/// Detailed validation failure for a single field or logical path.
#[derive(Debug, Clone)]
pub struct ValidationIssue {
    pub field: String,
    pub code: String,
    pub message: String,
}

impl ValidationIssue {
    pub fn new(field: impl Into<String>, code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            code: code.into(),
            message: message.into(),
        }
    }
}

pub type ValidationResult<T> = Result<T, ValidationError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn retry_error_unwraps_into_store_error() {
        let err: StoreError = RetryError::Aborted(StoreError::AlreadyExists { key: "k".into() }).into();
        assert!(matches!(err, StoreError::AlreadyExists { .. }));

        let err: StoreError = RetryError::<StoreError>::MaxRetryAttempts { attempts: 3 }.into();
        assert!(matches!(err, StoreError::MaxRetryAttempts { attempts: 3 }));
    }

    #[test]
    fn only_transport_errors_are_retryable() {
        let transport = StoreError::Transport(redis::RedisError::from((redis::ErrorKind::IoError, "refused")));
        assert!(transport.is_retryable());
        assert!(!StoreError::Validation(ValidationError::single("name", "required", "missing")).is_retryable());
    }

    #[test]
    fn redis_errors_split_by_availability() {
        let refused: StoreError = redis::RedisError::from((redis::ErrorKind::IoError, "refused")).into();
        assert!(matches!(refused, StoreError::Transport(_)));
        assert!(refused.is_retryable());

        let loading: StoreError = redis::RedisError::from((redis::ErrorKind::BusyLoadingError, "loading")).into();
        assert!(loading.is_retryable());

        for kind in [
            redis::ErrorKind::TypeError,
            redis::ErrorKind::ResponseError,
            redis::ErrorKind::InvalidClientConfig,
        ] {
            let err: StoreError = redis::RedisError::from((kind, "bad")).into();
            assert!(matches!(err, StoreError::Backend(_)), "{kind:?} classified as {err:?}");
            assert!(!err.is_retryable());
        }
    }

    #[test]
    fn malformed_url_is_not_retryable() {
        let err: StoreError = redis::Client::open("not a url").unwrap_err().into();
        assert!(!err.is_retryable(), "{err:?}");
    }

    #[test]
    fn precondition_message_names_the_scope() {
        let err = StoreError::PreconditionFailed {
            kind: "checks",
            name: "disk-check".into(),
            scope: TenancyContext::new("acme", "prod"),
        };
        assert_eq!(
            err.to_string(),
            "could not write checks 'disk-check' in environment acme/prod: parent scope does not exist"
        );
    }
}
