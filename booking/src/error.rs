//! API errors and their normalization into user-facing messages.
//!
//! Every failure the client can show goes through [`normalize`], so the
//! message table below is the single place user-visible error texts live.

use crate::types::ApiErrorBody;
use thiserror::Error;

/// Shown for `PAYMENT_FAILED`
pub const PAYMENT_FAILED_MESSAGE: &str = "Your payment could not be completed.";
/// Shown for a 400 without a backend message
pub const INVALID_REQUEST_MESSAGE: &str = "Invalid booking request";
/// Shown for 422
pub const INSUFFICIENT_TICKETS_MESSAGE: &str = "Not enough tickets available.";
/// Shown for 5xx
pub const SERVER_ERROR_MESSAGE: &str = "Server error. Please try again later.";
/// Shown when no structured payload is available
pub const GENERIC_ERROR_MESSAGE: &str = "Something went wrong. Please try again.";

const PAYMENT_FAILED_CODE: &str = "PAYMENT_FAILED";

/// Errors produced by the API client
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ApiError {
    /// The request never got a response (connection refused, DNS, timeout)
    #[error("Request failed: {0}")]
    Transport(String),

    /// The backend answered with a non-2xx status or a `success: false` envelope
    #[error("Backend error (status {http_status})")]
    Backend {
        /// HTTP status of the response
        http_status: u16,
        /// Structured error payload, if the body contained one
        payload: Option<ApiErrorBody>,
    },

    /// A 2xx response whose body did not match the contract
    #[error("Response parsing failed: {0}")]
    Decode(String),
}

impl ApiError {
    /// The structured backend payload, if any
    #[must_use]
    pub const fn payload(&self) -> Option<&ApiErrorBody> {
        match self {
            Self::Backend { payload, .. } => payload.as_ref(),
            Self::Transport(_) | Self::Decode(_) => None,
        }
    }
}

/// An error message ready to show to the user
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct UserFacingError {
    /// The message
    pub message: String,
}

impl UserFacingError {
    /// Create a user-facing error
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Map an API error to the message shown to the user
///
/// | Payload | Message |
/// |---|---|
/// | `code == "PAYMENT_FAILED"` | "Your payment could not be completed." |
/// | status 400 | backend message, or "Invalid booking request" |
/// | status 422 | "Not enough tickets available." |
/// | status ≥ 500 | "Server error. Please try again later." |
/// | any other status | backend message |
/// | none | "Something went wrong. Please try again." |
///
/// The payload status wins over the HTTP status when both are present.
#[must_use]
pub fn normalize(error: &ApiError) -> UserFacingError {
    let Some(payload) = error.payload() else {
        tracing::error!(%error, "API error without structured payload");
        return UserFacingError::new(GENERIC_ERROR_MESSAGE);
    };

    tracing::error!(
        code = payload.code.as_deref(),
        status = payload.status,
        message = payload.message.as_deref(),
        "Parsed API error"
    );

    let status = payload.status.or(match error {
        ApiError::Backend { http_status, .. } => Some(*http_status),
        ApiError::Transport(_) | ApiError::Decode(_) => None,
    });

    let message = if payload.code.as_deref() == Some(PAYMENT_FAILED_CODE) {
        PAYMENT_FAILED_MESSAGE
    } else {
        match status {
            Some(400) => payload.message.as_deref().unwrap_or(INVALID_REQUEST_MESSAGE),
            Some(422) => INSUFFICIENT_TICKETS_MESSAGE,
            Some(status) if status >= 500 => SERVER_ERROR_MESSAGE,
            _ => payload.message.as_deref().unwrap_or(GENERIC_ERROR_MESSAGE),
        }
    };

    UserFacingError::new(message)
}
