//! Request pipeline domain.
//!
//! Purpose: turn caller intent ([`ApiRequest`]) into exactly one backend
//! exchange, interpret the response envelope, and collapse every failure into
//! an [`ApiError`]. Driven adapters plug in through [`ports`].
//!
//! Public surface:
//! - [`RequestDispatcher`]: entry points `call`, `call_without_auth`,
//!   `call_binary`, `call_public_raw` and `fetch_data`.
//! - [`TokenStore`]: the persisted bearer credential.
//! - [`SessionContext`]: side-channel header state and session events.
//! - [`AuthSession`]: login, signup, logout and the authentication guard.
//! - [`endpoints::ConsoleApi`]: typed backend operations.

pub mod endpoints;
pub mod ports;

mod auth;
mod auth_session;
mod credential;
mod dispatcher;
mod envelope;
mod error;
mod normalizer;
mod request;
mod session;
mod token_store;

pub use self::auth::{AuthValidationError, LoginCredentials, SignupRequest, UserRole};
pub use self::auth_session::AuthSession;
pub use self::credential::{Credential, CredentialError, Segment};
pub use self::dispatcher::{ApiResponse, DispatcherConfig, RequestDispatcher};
pub use self::envelope::{ENVELOPE_FALLBACK_MESSAGE, Envelope};
pub use self::error::{ApiError, LOGIN_REQUIRED_MESSAGE, NormalizedError};
pub use self::normalizer::{ErrorNormalizer, Failure, HTTP_FALLBACK_MESSAGE};
pub use self::request::{
    ApiRequest, FormPart, HttpMethod, MultipartForm, RequestBody, RequestProfile,
    UnsupportedMethodError,
};
pub use self::session::{RedirectReason, SessionContext, SessionEvent, SessionHeader};
pub use self::token_store::{TOKEN_KEY, TokenStore, TokenStoreError};
