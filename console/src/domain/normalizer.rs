//! Failure classification and the 401 side effects.
//!
//! Every way a call can go wrong is first captured as a [`Failure`], then
//! turned into an [`ApiError`] by the [`ErrorNormalizer`]. Only an HTTP 401
//! triggers side effects: the credential is cleared and one redirect event is
//! broadcast.

use std::sync::Arc;

use serde_json::Value;
use tracing::{debug, warn};

use crate::domain::envelope::render_message;
use crate::domain::error::ApiError;
use crate::domain::ports::TransportError;
use crate::domain::session::{RedirectReason, SessionContext};
use crate::domain::token_store::TokenStore;

/// Message used when a non-2xx body carries no usable `message`.
pub const HTTP_FALLBACK_MESSAGE: &str = "Error occurred";

/// Raw description of what went wrong during a call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Failure {
    /// Nothing describes the failure.
    Unknown,
    /// A bare string was raised.
    Text(String),
    /// The transport produced no response.
    Transport(TransportError),
    /// The backend answered outside the 2xx range.
    Status {
        /// HTTP status code.
        status: u16,
        /// Unparsed response body.
        body: Vec<u8>,
    },
    /// The envelope status was not `1`.
    Envelope {
        /// Rendered envelope message.
        message: String,
    },
    /// An authenticated call found no credential.
    MissingCredential,
    /// The verb is not offered for the chosen profile.
    UnsupportedMethod {
        /// Upper-cased verb.
        method: String,
    },
    /// `data` did not decode into the requested type.
    Payload {
        /// Decoder error text.
        message: String,
    },
}

impl Failure {
    /// Whether this failure means the server rejected the credential.
    pub fn is_auth_expired(&self) -> bool {
        matches!(self, Self::Status { status: 401, .. })
    }

    /// Classify without side effects.
    ///
    /// # Examples
    /// ```
    /// use chatbot_console::domain::{ApiError, Failure};
    ///
    /// let error = Failure::Status { status: 404, body: br#"{"message":"Not found"}"#.to_vec() }
    ///     .into_error();
    /// assert_eq!(error, ApiError::HttpError { status: 404, message: "Not found".into() });
    /// ```
    pub fn into_error(self) -> ApiError {
        match self {
            Self::Unknown => ApiError::Unknown,
            Self::Text(message) => ApiError::Message { message },
            Self::Transport(error) => ApiError::NetworkFailure {
                message: error.to_string(),
            },
            Self::Status { status: 401, .. } => ApiError::AuthExpired,
            Self::Status { status, body } => ApiError::HttpError {
                status,
                message: body_message(&body),
            },
            Self::Envelope { message } => ApiError::ApplicationError { message },
            Self::MissingCredential => ApiError::Unauthorized,
            Self::UnsupportedMethod { method } => ApiError::UnsupportedMethod { method },
            Self::Payload { message } => ApiError::UnexpectedPayload { message },
        }
    }
}

impl From<TransportError> for Failure {
    fn from(error: TransportError) -> Self {
        Self::Transport(error)
    }
}

fn body_message(body: &[u8]) -> String {
    let message = serde_json::from_slice::<Value>(body)
        .ok()
        .and_then(|value| value.get("message").cloned())
        .unwrap_or(Value::Null);
    render_message(&message, HTTP_FALLBACK_MESSAGE)
}

/// Converts failures into [`ApiError`]s, applying the 401 side effects.
#[derive(Clone)]
pub struct ErrorNormalizer {
    tokens: TokenStore,
    session: Arc<SessionContext>,
    redirect_target: String,
}

impl ErrorNormalizer {
    /// Normalizer that redirects to `redirect_target` when the credential expires.
    pub fn new(
        tokens: TokenStore,
        session: Arc<SessionContext>,
        redirect_target: impl Into<String>,
    ) -> Self {
        Self {
            tokens,
            session,
            redirect_target: redirect_target.into(),
        }
    }

    /// Path announced in redirect events.
    pub fn redirect_target(&self) -> &str {
        &self.redirect_target
    }

    /// Classify a failure, clearing the credential and requesting a redirect
    /// when the backend answered 401.
    pub fn normalize(&self, failure: Failure) -> ApiError {
        if failure.is_auth_expired() {
            self.expire_session();
        }
        let error = failure.into_error();
        debug!(code = error.code(), error = %error, "request failed");
        error
    }

    fn expire_session(&self) {
        if let Err(error) = self.tokens.clear() {
            warn!(error = %error, "failed to clear credential after 401");
        }
        self.session
            .request_redirect(self.redirect_target.clone(), RedirectReason::AuthExpired);
    }
}
