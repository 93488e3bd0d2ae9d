use thiserror::Error;

use crate::document::validate::ValidationError;

/// Every failure a service can report.
///
/// Store adapters translate their native errors into this enum, so nothing
/// above the adapter boundary matches on sqlx or io error shapes.
#[derive(Debug, Error)]
pub enum Error {
    #[error("authentication required")]
    Unauthenticated,

    #[error("unauthorized: {0}")]
    Unauthorized(String),

    #[error("forbidden: {0}")]
    Forbidden(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("conflict: {0}")]
    Conflict(String),

    #[error("store unavailable: {0}")]
    StoreUnavailable(String),

    #[error("internal error: {0}")]
    Internal(String),
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Stable machine-readable kind, used in API error bodies.
    pub fn kind(&self) -> &'static str {
        match self {
            Error::Unauthenticated => "unauthenticated",
            Error::Unauthorized(_) => "unauthorized",
            Error::Forbidden(_) => "forbidden",
            Error::NotFound(_) => "notFound",
            Error::Validation(_) => "validationError",
            Error::Conflict(_) => "conflict",
            Error::StoreUnavailable(_) => "storeUnavailable",
            Error::Internal(_) => "internalError",
        }
    }

    /// Append a note to the message while keeping the kind.
    ///
    /// Used to surface a failed compensating action alongside the error that
    /// triggered it.
    pub fn annotate(self, note: impl std::fmt::Display) -> Self {
        match self {
            Error::Unauthorized(msg) => Error::Unauthorized(format!("{msg}; {note}")),
            Error::Forbidden(msg) => Error::Forbidden(format!("{msg}; {note}")),
            Error::NotFound(msg) => Error::NotFound(format!("{msg}; {note}")),
            Error::Conflict(msg) => Error::Conflict(format!("{msg}; {note}")),
            Error::StoreUnavailable(msg) => Error::StoreUnavailable(format!("{msg}; {note}")),
            Error::Internal(msg) => Error::Internal(format!("{msg}; {note}")),
            Error::Validation(err) => {
                Error::Validation(ValidationError::Malformed(format!("{err}; {note}")))
            }
            Error::Unauthenticated => Error::Unauthenticated,
        }
    }

    pub(crate) fn not_found(what: &str, id: impl std::fmt::Display) -> Self {
        Error::NotFound(format!("{what} {id} not found"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn annotate_keeps_kind() {
        let err = Error::StoreUnavailable("insert failed".into())
            .annotate("cleanup of blob a/b.pdf also failed: disk gone");
        assert_eq!(err.kind(), "storeUnavailable");
        assert_eq!(
            err.to_string(),
            "store unavailable: insert failed; cleanup of blob a/b.pdf also failed: disk gone"
        );
    }

    #[test]
    fn validation_errors_convert() {
        let err: Error = ValidationError::EmptyContent.into();
        assert_eq!(err.kind(), "validationError");
        assert_eq!(err.to_string(), "comment content cannot be empty");
    }
}
