//! Application-wide error types.
//!
//! Every failure that leaves the request pipeline is one of six kinds with a
//! fixed HTTP status. The API layer renders them as problem+json.

use thiserror::Error;

/// Result type alias using `AppError`.
pub type AppResult<T> = Result<T, AppError>;

/// Application error types.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AppError {
    /// Client input violates a stated precondition.
    #[error("{0}")]
    BadRequest(String),

    /// Missing or invalid identity.
    #[error("{0}")]
    Unauthorized(String),

    /// Valid identity, insufficient authority.
    #[error("{0}")]
    Forbidden(String),

    /// Target resource does not exist under the active tenant.
    #[error("{0}")]
    NotFound(String),

    /// Unique-constraint or state-machine collision.
    #[error("{0}")]
    Conflict(String),

    /// Any other failure.
    #[error("{0}")]
    Internal(String),
}

impl AppError {
    /// Shorthand for [`AppError::BadRequest`].
    pub fn bad_request(msg: impl Into<String>) -> Self {
        Self::BadRequest(msg.into())
    }

    /// Shorthand for [`AppError::Unauthorized`].
    pub fn unauthorized(msg: impl Into<String>) -> Self {
        Self::Unauthorized(msg.into())
    }

    /// Shorthand for [`AppError::Forbidden`].
    pub fn forbidden(msg: impl Into<String>) -> Self {
        Self::Forbidden(msg.into())
    }

    /// Shorthand for [`AppError::NotFound`].
    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    /// Shorthand for [`AppError::Conflict`].
    pub fn conflict(msg: impl Into<String>) -> Self {
        Self::Conflict(msg.into())
    }

    /// Shorthand for [`AppError::Internal`].
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    /// Returns the HTTP status code for this error.
    #[must_use]
    pub const fn status_code(&self) -> u16 {
        match self {
            Self::BadRequest(_) => 400,
            Self::Unauthorized(_) => 401,
            Self::Forbidden(_) => 403,
            Self::NotFound(_) => 404,
            Self::Conflict(_) => 409,
            Self::Internal(_) => 500,
        }
    }

    /// Returns the stable kind identifier.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::BadRequest(_) => "bad_request",
            Self::Unauthorized(_) => "unauthorized",
            Self::Forbidden(_) => "forbidden",
            Self::NotFound(_) => "not_found",
            Self::Conflict(_) => "conflict",
            Self::Internal(_) => "internal",
        }
    }

    /// Returns the human-readable title used in problem responses.
    #[must_use]
    pub const fn title(&self) -> &'static str {
        match self {
            Self::BadRequest(_) => "Bad Request",
            Self::Unauthorized(_) => "Unauthorized",
            Self::Forbidden(_) => "Forbidden",
            Self::NotFound(_) => "Not Found",
            Self::Conflict(_) => "Conflict",
            Self::Internal(_) => "Internal Server Error",
        }
    }

    /// Returns the message carried by the error.
    #[must_use]
    pub fn message(&self) -> &str {
        match self {
            Self::BadRequest(m)
            | Self::Unauthorized(m)
            | Self::Forbidden(m)
            | Self::NotFound(m)
            | Self::Conflict(m)
            | Self::Internal(m) => m,
        }
    }

    /// Returns true for the `internal` kind.
    #[must_use]
    pub const fn is_internal(&self) -> bool {
        matches!(self, Self::Internal(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_status_codes() {
        assert_eq!(AppError::bad_request("").status_code(), 400);
        assert_eq!(AppError::unauthorized("").status_code(), 401);
        assert_eq!(AppError::forbidden("").status_code(), 403);
        assert_eq!(AppError::not_found("").status_code(), 404);
        assert_eq!(AppError::conflict("").status_code(), 409);
        assert_eq!(AppError::internal("").status_code(), 500);
    }

    #[test]
    fn test_error_kinds() {
        assert_eq!(AppError::bad_request("").kind(), "bad_request");
        assert_eq!(AppError::unauthorized("").kind(), "unauthorized");
        assert_eq!(AppError::forbidden("").kind(), "forbidden");
        assert_eq!(AppError::not_found("").kind(), "not_found");
        assert_eq!(AppError::conflict("").kind(), "conflict");
        assert_eq!(AppError::internal("").kind(), "internal");
    }

    #[test]
    fn test_error_display_is_message() {
        let err = AppError::forbidden("access denied to this company");
        assert_eq!(err.to_string(), "access denied to this company");
        assert_eq!(err.message(), "access denied to this company");
        assert_eq!(err.title(), "Forbidden");
    }

    #[test]
    fn test_only_internal_is_internal() {
        assert!(AppError::internal("boom").is_internal());
        assert!(!AppError::conflict("dup").is_internal());
    }
}
