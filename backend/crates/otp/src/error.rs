//! OTP Error Types
//!
//! Every failure carries a stable machine-readable code and converts into
//! the unified `kernel::error::AppError`, rendered as `{ "error", "code" }`.

use axum::response::{IntoResponse, Response};
use kernel::error::{app_error::AppError, kind::ErrorKind};
use thiserror::Error;

/// OTP-specific result type alias
pub type OtpResult<T> = Result<T, OtpError>;

#[derive(Debug, Error)]
pub enum OtpError {
    /// `phone` absent or not a string on the request route
    #[error("Phone number is required and must be a string")]
    InvalidPhone,

    /// `phone` absent or not a string on the verify route
    #[error("Phone number is required")]
    MissingPhone,

    #[error("OTP code is required")]
    MissingCode,

    #[error("Invalid phone number format")]
    InvalidPhoneFormat,

    /// No unconsumed, unexpired code exists for the phone
    #[error("No valid OTP found for this phone number")]
    NoValidCode,

    #[error("Maximum attempts exceeded. Please request a new OTP.")]
    MaxAttemptsExceeded,

    #[error("Invalid OTP code")]
    InvalidCode,

    #[error("Missing or invalid authorization header")]
    MissingOrMalformedHeader,

    #[error("Invalid or expired token")]
    InvalidOrExpiredToken,

    /// Session is valid but its profile is gone
    #[error("User profile not found")]
    ProfileNotFound,

    #[error("Invalid request body: {0}")]
    MalformedBody(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl OtpError {
    /// Stable machine-readable code for clients to branch on
    pub fn code(&self) -> &'static str {
        match self {
            OtpError::InvalidPhone => "INVALID_PHONE",
            OtpError::MissingPhone => "MISSING_PHONE",
            OtpError::MissingCode => "MISSING_CODE",
            OtpError::InvalidPhoneFormat => "INVALID_PHONE_FORMAT",
            OtpError::NoValidCode => "NO_VALID_OTP",
            OtpError::MaxAttemptsExceeded => "MAX_ATTEMPTS_EXCEEDED",
            OtpError::InvalidCode => "INVALID_CODE",
            OtpError::MissingOrMalformedHeader => "INVALID_AUTH_HEADER",
            OtpError::InvalidOrExpiredToken => "INVALID_TOKEN",
            OtpError::ProfileNotFound => "PROFILE_NOT_FOUND",
            OtpError::MalformedBody(_) => "INVALID_REQUEST_BODY",
            OtpError::Database(_) | OtpError::Internal(_) => "INTERNAL_ERROR",
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            OtpError::InvalidPhone
            | OtpError::MissingPhone
            | OtpError::MissingCode
            | OtpError::InvalidPhoneFormat
            | OtpError::NoValidCode
            | OtpError::MaxAttemptsExceeded
            | OtpError::InvalidCode
            | OtpError::MalformedBody(_) => ErrorKind::BadRequest,
            OtpError::MissingOrMalformedHeader | OtpError::InvalidOrExpiredToken => {
                ErrorKind::Unauthorized
            }
            OtpError::ProfileNotFound => ErrorKind::NotFound,
            OtpError::Database(_) | OtpError::Internal(_) => ErrorKind::InternalServerError,
        }
    }

    /// Log the error with appropriate level
    fn log(&self) {
        match self {
            OtpError::Database(e) => {
                tracing::error!(error = %e, "OTP database error");
            }
            OtpError::Internal(msg) => {
                tracing::error!(message = %msg, "OTP internal error");
            }
            OtpError::InvalidCode | OtpError::MaxAttemptsExceeded => {
                tracing::warn!(code = self.code(), "OTP verification rejected");
            }
            OtpError::ProfileNotFound => {
                tracing::warn!("Session resolved to a missing profile");
            }
            _ => {
                tracing::debug!(
                    error = %self,
                    kind = %self.kind(),
                    code = self.code(),
                    "OTP request rejected"
                );
            }
        }
    }
}

impl IntoResponse for OtpError {
    fn into_response(self) -> Response {
        self.log();
        AppError::from(self).into_response()
    }
}

impl From<OtpError> for AppError {
    fn from(err: OtpError) -> Self {
        let app_err = AppError::new(err.kind(), err.to_string()).with_code(err.code());
        match err {
            // Keep the driver error reachable for logging; the body hides it
            OtpError::Database(source) => app_err.with_source(source),
            _ => app_err,
        }
    }
}

impl From<serde_json::Error> for OtpError {
    fn from(err: serde_json::Error) -> Self {
        OtpError::MalformedBody(err.to_string())
    }
}
