//! Request dispatcher: the single entry point for backend calls.
//!
//! The dispatcher selects headers for the requested [`RequestProfile`], makes
//! exactly one transport attempt, interprets the response envelope and routes
//! every failure through the [`ErrorNormalizer`]. Successful authenticated
//! calls feed the envelope `header` into the shared [`SessionContext`].

use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, warn};

use crate::domain::envelope::Envelope;
use crate::domain::error::ApiError;
use crate::domain::normalizer::{ErrorNormalizer, Failure};
use crate::domain::ports::{HttpTransport, KeyValueStore, TransportRequest, TransportResponse};
use crate::domain::request::{ApiRequest, RequestBody, RequestProfile};
use crate::domain::session::SessionContext;
use crate::domain::token_store::TokenStore;

const JSON_MEDIA_TYPE: &str = "application/json";

/// Where requests are sent and where the host is sent after a 401.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DispatcherConfig {
    /// Backend origin, e.g. `https://api.example.com`.
    pub base_url: String,
    /// Application base path announced in redirect events after a 401.
    pub base_path: String,
}

impl DispatcherConfig {
    /// Configuration with the default base path `/`.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            base_path: "/".to_owned(),
        }
    }

    /// Override the redirect target used after a 401.
    #[must_use]
    pub fn with_base_path(mut self, base_path: impl Into<String>) -> Self {
        self.base_path = base_path.into();
        self
    }
}

/// Successful outcome of [`RequestDispatcher::dispatch`].
#[derive(Debug, Clone, PartialEq)]
pub enum ApiResponse {
    /// Validated envelope (authenticated and public profiles).
    Envelope(Envelope),
    /// Raw bytes (binary profile).
    Binary(Vec<u8>),
}

/// Issues requests against the backend.
///
/// Cheap to clone; clones share the transport, credential slot and session.
#[derive(Clone)]
pub struct RequestDispatcher {
    transport: Arc<dyn HttpTransport>,
    tokens: TokenStore,
    session: Arc<SessionContext>,
    normalizer: ErrorNormalizer,
    base_url: String,
}

impl RequestDispatcher {
    /// Build a dispatcher with a fresh [`SessionContext`].
    pub fn new(
        transport: Arc<dyn HttpTransport>,
        storage: Arc<dyn KeyValueStore>,
        config: DispatcherConfig,
    ) -> Self {
        Self::with_session(transport, storage, Arc::new(SessionContext::new()), config)
    }

    /// Build a dispatcher that publishes into an existing session context.
    pub fn with_session(
        transport: Arc<dyn HttpTransport>,
        storage: Arc<dyn KeyValueStore>,
        session: Arc<SessionContext>,
        config: DispatcherConfig,
    ) -> Self {
        let tokens = TokenStore::new(storage);
        let normalizer = ErrorNormalizer::new(tokens.clone(), Arc::clone(&session), config.base_path);
        Self {
            transport,
            tokens,
            session,
            normalizer,
            base_url: config.base_url.trim_end_matches('/').to_owned(),
        }
    }

    /// Credential store shared with the normalizer.
    pub fn tokens(&self) -> &TokenStore {
        &self.tokens
    }

    /// Session state updated by authenticated calls.
    pub fn session(&self) -> &Arc<SessionContext> {
        &self.session
    }

    /// Normalizer applying the 401 side effects.
    pub fn normalizer(&self) -> &ErrorNormalizer {
        &self.normalizer
    }

    /// Send `request` with the given profile.
    ///
    /// # Errors
    ///
    /// Returns the normalized [`ApiError`] for any failure.
    pub async fn dispatch(
        &self,
        request: ApiRequest,
        profile: RequestProfile,
    ) -> Result<ApiResponse, ApiError> {
        let outcome = match profile {
            RequestProfile::Binary => self.binary(request).await.map(ApiResponse::Binary),
            RequestProfile::Authenticated | RequestProfile::Public => self
                .envelope(request, profile)
                .await
                .map(ApiResponse::Envelope),
        };
        outcome.map_err(|failure| self.normalizer.normalize(failure))
    }

    /// Authenticated call returning the envelope `data`.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Unauthorized`] without touching the network when no
    /// credential is stored, or any other normalized failure.
    pub async fn call(&self, request: ApiRequest) -> Result<Value, ApiError> {
        self.envelope(request, RequestProfile::Authenticated)
            .await
            .map(Envelope::into_data)
            .map_err(|failure| self.normalizer.normalize(failure))
    }

    /// Public call returning the envelope `data`.
    ///
    /// A non-empty `data.token` is persisted before the status is checked.
    ///
    /// # Errors
    ///
    /// Returns the normalized failure.
    pub async fn call_without_auth(&self, request: ApiRequest) -> Result<Value, ApiError> {
        self.envelope(request, RequestProfile::Public)
            .await
            .map(Envelope::into_data)
            .map_err(|failure| self.normalizer.normalize(failure))
    }

    /// Authenticated call returning the raw response bytes.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::UnsupportedMethod`] for verbs other than `GET` and
    /// `POST`, or any other normalized failure.
    pub async fn call_binary(&self, request: ApiRequest) -> Result<Vec<u8>, ApiError> {
        self.binary(request)
            .await
            .map_err(|failure| self.normalizer.normalize(failure))
    }

    /// Public call returning the parsed body without envelope interpretation.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::UnexpectedPayload`] when the body is not JSON, or
    /// any other normalized failure.
    pub async fn call_public_raw(&self, request: ApiRequest) -> Result<Value, ApiError> {
        let outcome = async {
            let response = self.exchange(request, RequestProfile::Public).await?;
            serde_json::from_slice(&response.body).map_err(|error| Failure::Payload {
                message: error.to_string(),
            })
        };
        outcome
            .await
            .map_err(|failure| self.normalizer.normalize(failure))
    }

    /// Authenticated call decoding `data` into `T`.
    ///
    /// A `null` or absent `data` decodes as an empty object so types with
    /// serde defaults still succeed.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::UnexpectedPayload`] when `data` does not match `T`,
    /// or any other normalized failure.
    pub async fn fetch_data<T>(&self, request: ApiRequest) -> Result<T, ApiError>
    where
        T: DeserializeOwned,
    {
        let data = match self.call(request).await? {
            Value::Null => Value::Object(serde_json::Map::new()),
            other => other,
        };
        serde_json::from_value(data).map_err(|error| {
            self.normalizer.normalize(Failure::Payload {
                message: error.to_string(),
            })
        })
    }

    async fn envelope(
        &self,
        request: ApiRequest,
        profile: RequestProfile,
    ) -> Result<Envelope, Failure> {
        let response = self.exchange(request, profile).await?;
        let envelope = Envelope::from_slice(&response.body);

        if profile == RequestProfile::Public {
            self.capture_token(&envelope);
        }
        if !envelope.is_success() {
            return Err(Failure::Envelope {
                message: envelope.failure_message(),
            });
        }
        if profile == RequestProfile::Authenticated {
            self.sync_session(&envelope);
        }
        Ok(envelope)
    }

    async fn binary(&self, request: ApiRequest) -> Result<Vec<u8>, Failure> {
        if !request.method().supports_binary() {
            return Err(Failure::UnsupportedMethod {
                method: request.method().as_str().to_owned(),
            });
        }
        let response = self.exchange(request, RequestProfile::Binary).await?;
        Ok(response.body)
    }

    async fn exchange(
        &self,
        request: ApiRequest,
        profile: RequestProfile,
    ) -> Result<TransportResponse, Failure> {
        let (method, path, body, extra_headers) = request.into_parts();
        let token = if profile.attaches_credential() {
            Some(
                self.tokens
                    .get(true)
                    .map_err(|_| Failure::MissingCredential)?,
            )
        } else {
            None
        };

        let headers = build_headers(body.as_ref(), token.as_deref(), extra_headers);
        let url = self.url_for(&path);
        debug!(%method, %url, ?profile, "dispatching request");

        let response = self
            .transport
            .send(TransportRequest {
                method,
                url,
                headers,
                body,
            })
            .await?;

        debug!(status = response.status, "response received");
        if response.is_success() {
            Ok(response)
        } else {
            Err(Failure::Status {
                status: response.status,
                body: response.body,
            })
        }
    }

    fn url_for(&self, path: &str) -> String {
        if path.is_empty() || path.starts_with('/') {
            format!("{}{path}", self.base_url)
        } else {
            format!("{}/{path}", self.base_url)
        }
    }

    fn capture_token(&self, envelope: &Envelope) {
        let Some(token) = envelope.token() else {
            return;
        };
        if let Err(error) = self.tokens.set(token) {
            warn!(error = %error, "failed to persist credential from response");
        }
    }

    fn sync_session(&self, envelope: &Envelope) {
        if let Some(header) = envelope.session_header() {
            self.session.publish_header(header);
        }
    }
}

fn build_headers(
    body: Option<&RequestBody>,
    token: Option<&str>,
    extra: Vec<(String, String)>,
) -> Vec<(String, String)> {
    let mut headers = vec![("Accept".to_owned(), JSON_MEDIA_TYPE.to_owned())];
    if !matches!(body, Some(RequestBody::Multipart(_))) {
        headers.push(("Content-Type".to_owned(), JSON_MEDIA_TYPE.to_owned()));
    }
    if let Some(token) = token {
        headers.push(("Authorization".to_owned(), format!("Bearer {token}")));
    }
    for (name, value) in extra {
        headers.retain(|(existing, _)| !existing.eq_ignore_ascii_case(&name));
        headers.push((name, value));
    }
    headers
}
