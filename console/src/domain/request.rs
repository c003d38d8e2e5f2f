//! Request model handed to the dispatcher.
//!
//! An [`ApiRequest`] names the verb, the backend path, an optional body and any
//! extra headers. The [`RequestProfile`] chosen at dispatch time decides which
//! header set is attached and how the response is interpreted.

use std::fmt;
use std::str::FromStr;

use serde_json::Value;

/// HTTP verbs the backend exposes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HttpMethod {
    /// `GET`
    Get,
    /// `POST`
    Post,
    /// `PUT`
    Put,
    /// `DELETE`
    Delete,
}

impl HttpMethod {
    /// Upper-case wire name of the verb.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
            Self::Put => "PUT",
            Self::Delete => "DELETE",
        }
    }

    /// Binary downloads are only offered for `GET` and `POST`.
    pub const fn supports_binary(self) -> bool {
        matches!(self, Self::Get | Self::Post)
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Returned when a verb name is outside `GET`, `POST`, `PUT` and `DELETE`.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unsupported HTTP method: {method}")]
pub struct UnsupportedMethodError {
    /// The verb as supplied by the caller.
    pub method: String,
}

impl FromStr for HttpMethod {
    type Err = UnsupportedMethodError;

    /// Parse a verb case-insensitively.
    ///
    /// # Examples
    /// ```
    /// use chatbot_console::domain::HttpMethod;
    ///
    /// assert_eq!("delete".parse::<HttpMethod>().unwrap(), HttpMethod::Delete);
    /// assert!("patch".parse::<HttpMethod>().is_err());
    /// ```
    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "get" => Ok(Self::Get),
            "post" => Ok(Self::Post),
            "put" => Ok(Self::Put),
            "delete" => Ok(Self::Delete),
            _ => Err(UnsupportedMethodError {
                method: raw.trim().to_ascii_uppercase(),
            }),
        }
    }
}

/// Header set and response mode applied to a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RequestProfile {
    /// Bearer credential attached; JSON envelope expected.
    Authenticated,
    /// No credential; JSON envelope expected.
    Public,
    /// Bearer credential attached; raw bytes expected.
    Binary,
}

impl RequestProfile {
    /// Whether this profile sends `Authorization: Bearer <token>`.
    pub const fn attaches_credential(self) -> bool {
        matches!(self, Self::Authenticated | Self::Binary)
    }
}

/// One field of a multipart form upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormPart {
    /// Plain text field.
    Text {
        /// Field name.
        name: String,
        /// Field value.
        value: String,
    },
    /// File field.
    File {
        /// Field name.
        name: String,
        /// File name reported to the backend.
        file_name: String,
        /// MIME type of the payload, when known.
        content_type: Option<String>,
        /// Raw file content.
        bytes: Vec<u8>,
    },
}

/// Multipart form body, built field by field.
///
/// # Examples
/// ```
/// use chatbot_console::domain::MultipartForm;
///
/// let form = MultipartForm::new()
///     .text("chatbot_name", "Support")
///     .text("default_message", "Hi!");
/// assert_eq!(form.parts().len(), 2);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MultipartForm {
    parts: Vec<FormPart>,
}

impl MultipartForm {
    /// Start an empty form.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a text field.
    #[must_use]
    pub fn text(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.parts.push(FormPart::Text {
            name: name.into(),
            value: value.into(),
        });
        self
    }

    /// Append a file field.
    #[must_use]
    pub fn file(
        mut self,
        name: impl Into<String>,
        file_name: impl Into<String>,
        content_type: Option<String>,
        bytes: Vec<u8>,
    ) -> Self {
        self.parts.push(FormPart::File {
            name: name.into(),
            file_name: file_name.into(),
            content_type,
            bytes,
        });
        self
    }

    /// Fields in insertion order.
    pub fn parts(&self) -> &[FormPart] {
        &self.parts
    }

    /// Consume the form, yielding its fields.
    pub fn into_parts(self) -> Vec<FormPart> {
        self.parts
    }
}

/// Request payload.
#[derive(Debug, Clone, PartialEq)]
pub enum RequestBody {
    /// Serialised as JSON.
    Json(Value),
    /// Sent as `multipart/form-data`.
    Multipart(MultipartForm),
}

/// Verb, path, body and extra headers for one backend call.
///
/// # Examples
/// ```
/// use chatbot_console::domain::{ApiRequest, HttpMethod};
/// use serde_json::json;
///
/// let request = ApiRequest::post("/api/v1/subscription").with_json(json!({ "plan_id": 3 }));
/// assert_eq!(request.method(), HttpMethod::Post);
/// assert_eq!(request.path(), "/api/v1/subscription");
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct ApiRequest {
    method: HttpMethod,
    path: String,
    body: Option<RequestBody>,
    headers: Vec<(String, String)>,
}

impl ApiRequest {
    /// Request with the given verb and path and no body.
    pub fn new(method: HttpMethod, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            body: None,
            headers: Vec::new(),
        }
    }

    /// Build a request from a textual verb.
    ///
    /// # Errors
    ///
    /// Returns [`UnsupportedMethodError`] for verbs other than `GET`, `POST`,
    /// `PUT` and `DELETE`.
    pub fn from_method_name(
        method: &str,
        path: impl Into<String>,
    ) -> Result<Self, UnsupportedMethodError> {
        Ok(Self::new(method.parse()?, path))
    }

    /// `GET` request.
    pub fn get(path: impl Into<String>) -> Self {
        Self::new(HttpMethod::Get, path)
    }

    /// `POST` request.
    pub fn post(path: impl Into<String>) -> Self {
        Self::new(HttpMethod::Post, path)
    }

    /// `PUT` request.
    pub fn put(path: impl Into<String>) -> Self {
        Self::new(HttpMethod::Put, path)
    }

    /// `DELETE` request.
    pub fn delete(path: impl Into<String>) -> Self {
        Self::new(HttpMethod::Delete, path)
    }

    /// Attach a JSON body.
    #[must_use]
    pub fn with_json(mut self, body: Value) -> Self {
        self.body = Some(RequestBody::Json(body));
        self
    }

    /// Attach a multipart form body.
    #[must_use]
    pub fn with_form(mut self, form: MultipartForm) -> Self {
        self.body = Some(RequestBody::Multipart(form));
        self
    }

    /// Add a header that overrides any default of the same name.
    #[must_use]
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// Verb.
    pub fn method(&self) -> HttpMethod {
        self.method
    }

    /// Backend path appended to the base URL.
    pub fn path(&self) -> &str {
        self.path.as_str()
    }

    /// Body, if any.
    pub fn body(&self) -> Option<&RequestBody> {
        self.body.as_ref()
    }

    /// Caller-supplied headers.
    pub fn headers(&self) -> &[(String, String)] {
        &self.headers
    }

    pub(crate) fn into_parts(self) -> (HttpMethod, String, Option<RequestBody>, Vec<(String, String)>) {
        (self.method, self.path, self.body, self.headers)
    }
}
