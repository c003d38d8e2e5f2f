//! Driven port for performing one HTTP exchange with the backend.
//!
//! The dispatcher owns header selection and response interpretation; adapters
//! only move bytes. A transport makes exactly one attempt per call.

use async_trait::async_trait;

use super::define_port_error;
use crate::domain::request::{HttpMethod, RequestBody};

/// Fully resolved request handed to the transport.
#[derive(Debug, Clone, PartialEq)]
pub struct TransportRequest {
    /// Verb.
    pub method: HttpMethod,
    /// Absolute URL (base URL joined with the request path).
    pub url: String,
    /// Headers in send order. Names are unique case-insensitively.
    pub headers: Vec<(String, String)>,
    /// Payload, if any.
    pub body: Option<RequestBody>,
}

impl TransportRequest {
    /// Look up a header value case-insensitively.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(candidate, _)| candidate.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }
}

/// Raw response: status code plus the unparsed body.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TransportResponse {
    /// HTTP status code.
    pub status: u16,
    /// Response body bytes.
    pub body: Vec<u8>,
}

impl TransportResponse {
    /// Response carrying a JSON document.
    pub fn json(status: u16, body: &serde_json::Value) -> Self {
        Self {
            status,
            body: body.to_string().into_bytes(),
        }
    }

    /// Whether the status is in the 2xx range.
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

define_port_error! {
    /// Errors raised when no response was received.
    pub enum TransportError {
        /// The backend could not be reached or the exchange broke off.
        Network { message: String } => "{message}",
        /// The request could not be built (bad URL, header or form part).
        InvalidRequest { message: String } => "{message}",
    }
}

/// Port for sending requests to the backend.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait HttpTransport: Send + Sync {
    /// Perform one exchange.
    async fn send(&self, request: TransportRequest) -> Result<TransportResponse, TransportError>;
}
