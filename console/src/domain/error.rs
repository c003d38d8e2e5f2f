//! Caller-facing error type and its normalized `{code, message}` rendering.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::request::UnsupportedMethodError;

/// Message carried by [`ApiError::Unauthorized`].
pub const LOGIN_REQUIRED_MESSAGE: &str = "Unauthorized! Please login.";

/// Failures surfaced by the request pipeline.
///
/// Every variant maps onto a [`NormalizedError`]; use [`ApiError::normalized`]
/// when a flat `{code, message}` pair is needed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ApiError {
    /// No valid credential was stored before an authenticated call. Nothing
    /// was sent and nothing was cleared.
    #[error("Unauthorized! Please login.")]
    Unauthorized,
    /// The verb is not offered for the chosen profile.
    #[error("Unsupported HTTP method: {method}")]
    UnsupportedMethod {
        /// Upper-cased verb.
        method: String,
    },
    /// No response was received.
    #[error("{message}")]
    NetworkFailure {
        /// Transport error text.
        message: String,
    },
    /// HTTP 2xx whose envelope status was not `1`.
    #[error("{message}")]
    ApplicationError {
        /// Envelope message or the generic fallback.
        message: String,
    },
    /// Non-2xx response other than 401.
    #[error("{message}")]
    HttpError {
        /// HTTP status code.
        status: u16,
        /// Body message or the generic fallback.
        message: String,
    },
    /// HTTP 401: the credential was discarded and a redirect requested.
    #[error("Unauthorized")]
    AuthExpired,
    /// A bare string was thrown as an error.
    #[error("{message}")]
    Message {
        /// The text.
        message: String,
    },
    /// Nothing usable described the failure.
    #[error("Unknown error")]
    Unknown,
    /// The envelope succeeded but `data` did not match the expected shape.
    #[error("{message}")]
    UnexpectedPayload {
        /// Decoder error text.
        message: String,
    },
}

impl ApiError {
    /// Numeric code of the normalized form.
    ///
    /// Only [`ApiError::AuthExpired`] reports `401`, so the code alone tells
    /// callers whether the credential was discarded. A missing credential is
    /// a local failure and reports `500`.
    ///
    /// [`ApiError::Message`] keeps the historical `200` sentinel even though it
    /// reports a failure.
    pub fn code(&self) -> u16 {
        match self {
            Self::AuthExpired => 401,
            Self::HttpError { status, .. } => *status,
            Self::Message { .. } => 200,
            Self::Unauthorized
            | Self::UnsupportedMethod { .. }
            | Self::NetworkFailure { .. }
            | Self::ApplicationError { .. }
            | Self::Unknown
            | Self::UnexpectedPayload { .. } => 500,
        }
    }

    /// Human-readable message of the normalized form.
    pub fn message(&self) -> String {
        self.to_string()
    }

    /// Flatten into the `{code, message}` shape.
    ///
    /// # Examples
    /// ```
    /// use chatbot_console::domain::ApiError;
    ///
    /// let normalized = ApiError::AuthExpired.normalized();
    /// assert_eq!(normalized.code, 401);
    /// assert_eq!(normalized.message, "Unauthorized");
    /// ```
    pub fn normalized(&self) -> NormalizedError {
        NormalizedError {
            code: self.code(),
            message: self.message(),
        }
    }
}

/// Uniform error shape handed to callers and printed by the CLI.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NormalizedError {
    /// HTTP-like status code.
    pub code: u16,
    /// Human-readable message.
    pub message: String,
}

impl fmt::Display for NormalizedError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.code, self.message)
    }
}

impl From<ApiError> for NormalizedError {
    fn from(error: ApiError) -> Self {
        error.normalized()
    }
}

impl From<UnsupportedMethodError> for ApiError {
    fn from(error: UnsupportedMethodError) -> Self {
        Self::UnsupportedMethod {
            method: error.method,
        }
    }
}

impl From<&ApiError> for NormalizedError {
    fn from(error: &ApiError) -> Self {
        error.normalized()
    }
}
