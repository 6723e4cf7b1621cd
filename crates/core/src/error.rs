// Error taxonomy for SpiceScape
//
// Every failure a handler can signal is one of these variants. The server
// translates them to HTTP responses in a single place.

use thiserror::Error;
use uuid::Uuid;

/// Result type alias for domain operations
pub type Result<T> = std::result::Result<T, AppError>;

/// Message returned to clients for internal failures
pub const INTERNAL_ERROR_MESSAGE: &str = "Something went wrong, please try again later";

/// Errors that can occur while serving a request
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum AppError {
    /// Malformed input or a duplicate action
    #[error("{0}")]
    BadRequest(String),

    /// One or more input fields failed validation
    #[error("{}", .0.join(","))]
    Validation(Vec<String>),

    /// Unique constraint violated in the store
    #[error("Duplicate value entered for {field} field, please choose another value.")]
    Duplicate { field: String },

    /// Request body exceeds the accepted size
    #[error("{0}")]
    PayloadTooLarge(String),

    /// Referenced user, recipe or comment is absent
    #[error("{0}")]
    NotFound(String),

    /// Id could not be parsed, so nothing can match it
    #[error("No item found with id: {0}")]
    InvalidId(String),

    /// Missing, invalid or expired credentials
    #[error("{0}")]
    Unauthenticated(String),

    /// Authenticated but not permitted (not owner, or self-action)
    #[error("{0}")]
    Unauthorized(String),

    /// Unexpected failure; the detail is logged, never returned
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Coarse error classes, each with a fixed HTTP status
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    BadRequest,
    PayloadTooLarge,
    NotFound,
    Unauthenticated,
    Unauthorized,
    Internal,
}

impl ErrorKind {
    pub fn status_code(&self) -> u16 {
        match self {
            ErrorKind::BadRequest => 400,
            ErrorKind::Unauthenticated => 401,
            ErrorKind::Unauthorized => 403,
            ErrorKind::NotFound => 404,
            ErrorKind::PayloadTooLarge => 413,
            ErrorKind::Internal => 500,
        }
    }
}

impl AppError {
    pub fn bad_request(msg: impl Into<String>) -> Self {
        AppError::BadRequest(msg.into())
    }

    pub fn payload_too_large(msg: impl Into<String>) -> Self {
        AppError::PayloadTooLarge(msg.into())
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        AppError::NotFound(msg.into())
    }

    pub fn unauthenticated(msg: impl Into<String>) -> Self {
        AppError::Unauthenticated(msg.into())
    }

    pub fn unauthorized(msg: impl Into<String>) -> Self {
        AppError::Unauthorized(msg.into())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        AppError::Internal(msg.into())
    }

    pub fn duplicate(field: impl Into<String>) -> Self {
        AppError::Duplicate {
            field: field.into(),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            AppError::BadRequest(_) | AppError::Validation(_) | AppError::Duplicate { .. } => {
                ErrorKind::BadRequest
            }
            AppError::PayloadTooLarge(_) => ErrorKind::PayloadTooLarge,
            AppError::NotFound(_) | AppError::InvalidId(_) => ErrorKind::NotFound,
            AppError::Unauthenticated(_) => ErrorKind::Unauthenticated,
            AppError::Unauthorized(_) => ErrorKind::Unauthorized,
            AppError::Internal(_) => ErrorKind::Internal,
        }
    }

    pub fn status_code(&self) -> u16 {
        self.kind().status_code()
    }

    /// Message safe to show to clients
    pub fn public_message(&self) -> String {
        match self {
            AppError::Internal(_) => INTERNAL_ERROR_MESSAGE.to_string(),
            other => other.to_string(),
        }
    }
}

/// Storage code reports typed failures (e.g. duplicate keys) by wrapping an
/// `AppError` in `anyhow`; anything else is an internal error.
impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        match err.downcast::<AppError>() {
            Ok(app_err) => app_err,
            Err(other) => AppError::Internal(format!("{:#}", other)),
        }
    }
}

/// Parse an id taken from a path or body. Unparseable ids cannot reference
/// anything, so they are reported as not found.
pub fn parse_id(raw: &str) -> Result<Uuid> {
    Uuid::parse_str(raw.trim()).map_err(|_| AppError::InvalidId(raw.to_string()))
}
