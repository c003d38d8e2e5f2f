//! Login, signup and logout flows plus the authentication guard.

use serde_json::Value;
use tracing::info;

use crate::domain::auth::{LoginCredentials, SignupRequest};
use crate::domain::credential::Credential;
use crate::domain::dispatcher::RequestDispatcher;
use crate::domain::error::ApiError;
use crate::domain::request::ApiRequest;
use crate::domain::session::RedirectReason;

const LOGIN_PATH: &str = "/api/v1/auth/login";
const SIGNUP_PATH: &str = "/api/v1/auth/signup";

/// Drives the credential lifecycle on top of a [`RequestDispatcher`].
#[derive(Clone)]
pub struct AuthSession {
    dispatcher: RequestDispatcher,
    login_path: String,
}

impl AuthSession {
    /// Session whose logout redirects to `login_path`.
    pub fn new(dispatcher: RequestDispatcher, login_path: impl Into<String>) -> Self {
        Self {
            dispatcher,
            login_path: login_path.into(),
        }
    }

    /// Underlying dispatcher.
    pub fn dispatcher(&self) -> &RequestDispatcher {
        &self.dispatcher
    }

    /// Exchange credentials for a bearer token and persist it.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::ApplicationError`] when the backend accepted the
    /// call but sent no token, or any normalized call failure.
    pub async fn login(&self, credentials: &LoginCredentials) -> Result<String, ApiError> {
        let request = ApiRequest::post(LOGIN_PATH).with_json(credentials.to_json());
        let data = self.dispatcher.call_without_auth(request).await?;
        let token = self.adopt_token(&data, "Login failed: no token received")?;
        info!(email = credentials.email(), "logged in");
        Ok(token)
    }

    /// Register an account and persist the token it is issued.
    ///
    /// # Errors
    ///
    /// Same as [`AuthSession::login`].
    pub async fn signup(&self, request: &SignupRequest) -> Result<String, ApiError> {
        let call = ApiRequest::post(SIGNUP_PATH).with_json(request.to_json());
        let data = self.dispatcher.call_without_auth(call).await?;
        let token = self.adopt_token(&data, "Signup failed: no token received")?;
        info!(
            email = request.credentials().email(),
            user_type = request.user_type().as_str(),
            "account created"
        );
        Ok(token)
    }

    /// Discard the credential and cached header, then ask the host to show
    /// the login page.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::ApplicationError`] when the credential slot cannot
    /// be cleared.
    pub fn logout(&self) -> Result<(), ApiError> {
        self.dispatcher.tokens().clear()?;
        let session = self.dispatcher.session();
        session.clear();
        session.request_redirect(self.login_path.clone(), RedirectReason::LoggedOut);
        Ok(())
    }

    /// Whether a structurally valid credential is stored.
    pub fn is_authenticated(&self) -> bool {
        self.dispatcher.tokens().credential().is_some()
    }

    /// Guard for protected operations.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Unauthorized`] when no valid credential is stored.
    pub fn require_authenticated(&self) -> Result<Credential, ApiError> {
        self.dispatcher
            .tokens()
            .credential()
            .ok_or(ApiError::Unauthorized)
    }

    fn adopt_token(&self, data: &Value, missing: &str) -> Result<String, ApiError> {
        let token = data
            .get("token")
            .and_then(Value::as_str)
            .filter(|token| !token.is_empty())
            .ok_or_else(|| ApiError::ApplicationError {
                message: missing.to_owned(),
            })?;
        self.dispatcher.tokens().set(token)?;
        Ok(token.to_owned())
    }
}
