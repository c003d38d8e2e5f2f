//! Authentication primitives: login credentials and signup requests.
//!
//! Constructors validate raw string inputs before the auth session talks to
//! the backend, so blank fields never leave the process.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use thiserror::Error;
use zeroize::Zeroizing;

/// Validation failures for login and signup inputs.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuthValidationError {
    /// Email was missing or blank once trimmed.
    #[error("email must not be empty")]
    EmptyEmail,
    /// Password was blank.
    #[error("password must not be empty")]
    EmptyPassword,
    /// Role name is not one the backend accepts at signup.
    #[error("unknown user type: {0}")]
    UnknownRole(String),
    /// Editors must name the admin account they belong to.
    #[error("editor accounts require a parent admin id")]
    MissingParent,
}

/// Validated login credentials.
///
/// ## Invariants
/// - `email` is trimmed and non-empty.
/// - `password` is non-empty and keeps caller-provided whitespace.
///
/// # Examples
/// ```
/// use chatbot_console::domain::LoginCredentials;
///
/// let creds = LoginCredentials::try_from_parts(" ops@example.com ", "hunter2").unwrap();
/// assert_eq!(creds.email(), "ops@example.com");
/// assert_eq!(creds.password(), "hunter2");
/// ```
#[derive(Clone, PartialEq, Eq)]
pub struct LoginCredentials {
    email: String,
    password: Zeroizing<String>,
}

impl LoginCredentials {
    /// Construct credentials from raw inputs.
    ///
    /// # Errors
    ///
    /// Returns [`AuthValidationError::EmptyEmail`] or
    /// [`AuthValidationError::EmptyPassword`] for blank fields.
    pub fn try_from_parts(email: &str, password: &str) -> Result<Self, AuthValidationError> {
        let normalized = email.trim();
        if normalized.is_empty() {
            return Err(AuthValidationError::EmptyEmail);
        }
        if password.is_empty() {
            return Err(AuthValidationError::EmptyPassword);
        }
        Ok(Self {
            email: normalized.to_owned(),
            password: Zeroizing::new(password.to_owned()),
        })
    }

    /// Account email.
    pub fn email(&self) -> &str {
        self.email.as_str()
    }

    /// Password provided by the caller.
    pub fn password(&self) -> &str {
        self.password.as_str()
    }

    /// Login request body.
    pub fn to_json(&self) -> Value {
        json!({ "email": self.email, "password": self.password() })
    }
}

impl fmt::Debug for LoginCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoginCredentials")
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Roles selectable at signup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    /// Owns chatbots and editor accounts.
    Admin,
    /// Works under an admin account.
    Editor,
}

impl UserRole {
    /// Wire name.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Admin => "admin",
            Self::Editor => "editor",
        }
    }
}

impl FromStr for UserRole {
    type Err = AuthValidationError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "admin" => Ok(Self::Admin),
            "editor" => Ok(Self::Editor),
            other => Err(AuthValidationError::UnknownRole(other.to_owned())),
        }
    }
}

/// Validated account registration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignupRequest {
    credentials: LoginCredentials,
    company_name: Option<String>,
    user_type: UserRole,
    parent_id: Option<u64>,
}

impl SignupRequest {
    /// Build a registration.
    ///
    /// A blank `company_name` is dropped.
    ///
    /// # Errors
    ///
    /// Returns [`AuthValidationError::MissingParent`] when an editor is
    /// registered without `parent_id`.
    pub fn new(
        credentials: LoginCredentials,
        company_name: Option<String>,
        user_type: UserRole,
        parent_id: Option<u64>,
    ) -> Result<Self, AuthValidationError> {
        if user_type == UserRole::Editor && parent_id.is_none() {
            return Err(AuthValidationError::MissingParent);
        }
        let company_name = company_name
            .map(|name| name.trim().to_owned())
            .filter(|name| !name.is_empty());
        Ok(Self {
            credentials,
            company_name,
            user_type,
            parent_id,
        })
    }

    /// Credentials used for the new account.
    pub fn credentials(&self) -> &LoginCredentials {
        &self.credentials
    }

    /// Requested role.
    pub fn user_type(&self) -> UserRole {
        self.user_type
    }

    /// Signup request body. Optional fields are omitted when unset.
    pub fn to_json(&self) -> Value {
        let mut body = self.credentials.to_json();
        body["user_type"] = Value::from(self.user_type.as_str());
        if let Some(company_name) = &self.company_name {
            body["company_name"] = Value::from(company_name.as_str());
        }
        if let Some(parent_id) = self.parent_id {
            body["parent_id"] = Value::from(parent_id);
        }
        body
    }
}

#[cfg(test)]
mod tests {
    //! Regression coverage for this module.
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("", "pw", AuthValidationError::EmptyEmail)]
    #[case("   ", "pw", AuthValidationError::EmptyEmail)]
    #[case("ops@example.com", "", AuthValidationError::EmptyPassword)]
    fn invalid_credentials(
        #[case] email: &str,
        #[case] password: &str,
        #[case] expected: AuthValidationError,
    ) {
        let err = LoginCredentials::try_from_parts(email, password)
            .expect_err("invalid inputs must fail");
        assert_eq!(err, expected);
    }

    #[test]
    fn debug_output_hides_password() {
        let creds = LoginCredentials::try_from_parts("a@b.c", "s3cret").expect("valid");
        assert!(!format!("{creds:?}").contains("s3cret"));
    }

    #[rstest]
    #[case("Admin", UserRole::Admin)]
    #[case(" editor ", UserRole::Editor)]
    fn parses_roles(#[case] raw: &str, #[case] expected: UserRole) {
        assert_eq!(raw.parse::<UserRole>(), Ok(expected));
    }

    #[test]
    fn superadmin_cannot_self_register() {
        assert_eq!(
            "superadmin".parse::<UserRole>(),
            Err(AuthValidationError::UnknownRole("superadmin".into()))
        );
    }

    #[test]
    fn editor_requires_parent() {
        let creds = LoginCredentials::try_from_parts("e@x.io", "pw").expect("valid");
        assert_eq!(
            SignupRequest::new(creds, None, UserRole::Editor, None),
            Err(AuthValidationError::MissingParent)
        );
    }

    #[test]
    fn signup_body_omits_unset_fields() {
        let creds = LoginCredentials::try_from_parts("a@x.io", "pw").expect("valid");
        let request = SignupRequest::new(creds, Some("  ".into()), UserRole::Admin, None)
            .expect("admin needs no parent");
        assert_eq!(
            request.to_json(),
            json!({ "email": "a@x.io", "password": "pw", "user_type": "admin" })
        );
    }

    #[test]
    fn editor_body_carries_parent() {
        let creds = LoginCredentials::try_from_parts("e@x.io", "pw").expect("valid");
        let request = SignupRequest::new(creds, Some("Acme".into()), UserRole::Editor, Some(4))
            .expect("valid editor");
        assert_eq!(request.to_json()["parent_id"], 4);
        assert_eq!(request.to_json()["company_name"], "Acme");
    }
}
