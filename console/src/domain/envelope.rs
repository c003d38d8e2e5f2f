//! Backend response envelope and its success convention.
//!
//! Every JSON response is wrapped as `{ status, message?, data?, header? }`.
//! A call succeeds only when `status`, coerced to a number, equals exactly `1`;
//! an HTTP 200 carrying `status: 0` is an application failure.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::domain::session::SessionHeader;

/// Message used when a failed envelope carries no usable `message`.
pub const ENVELOPE_FALLBACK_MESSAGE: &str = "Something went wrong";

/// Wire-level wrapper around every JSON response.
///
/// Fields stay as raw JSON so loosely typed backends (string statuses, numeric
/// user ids) are interpreted the same way a dynamic client would.
///
/// # Examples
/// ```
/// use chatbot_console::domain::Envelope;
///
/// let envelope = Envelope::from_slice(br#"{"status":"1","data":{"id":5}}"#);
/// assert!(envelope.is_success());
/// assert_eq!(envelope.data["id"], 5);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Envelope {
    /// Success flag; success is exactly `1` after numeric coercion.
    #[serde(default)]
    pub status: Value,
    /// Human-readable text, used only on failure.
    #[serde(default)]
    pub message: Value,
    /// Endpoint-specific payload.
    #[serde(default)]
    pub data: Value,
    /// Optional side-channel carrying the current user's role and id.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub header: Option<Value>,
}

impl Envelope {
    /// Parse a response body.
    ///
    /// Bodies that are not a JSON object yield an empty envelope, which then
    /// fails the status check.
    pub fn from_slice(body: &[u8]) -> Self {
        match serde_json::from_slice::<Value>(body) {
            Ok(value @ Value::Object(_)) => serde_json::from_value(value).unwrap_or_default(),
            _ => Self::default(),
        }
    }

    /// `status` after numeric coercion; `None` when it is not a number.
    pub fn coerced_status(&self) -> Option<f64> {
        coerce_number(&self.status)
    }

    /// Whether the backend reported success.
    pub fn is_success(&self) -> bool {
        matches!(self.coerced_status(), Some(status) if status == 1.0)
    }

    /// Failure text: `message` when truthy, otherwise the fallback.
    pub fn failure_message(&self) -> String {
        render_message(&self.message, ENVELOPE_FALLBACK_MESSAGE)
    }

    /// `data.token` when it is a non-empty string.
    pub fn token(&self) -> Option<&str> {
        self.data
            .get("token")
            .and_then(Value::as_str)
            .filter(|token| !token.is_empty())
    }

    /// Session header when `header.user_type` is present and truthy.
    pub fn session_header(&self) -> Option<SessionHeader> {
        let header = self.header.as_ref()?;
        let user_type = header.get("user_type").filter(|value| is_truthy(value))?;
        Some(SessionHeader {
            user_type: stringify(user_type),
            user_id: header.get("user_id").map(stringify).unwrap_or_default(),
        })
    }

    /// Payload, consuming the envelope.
    pub fn into_data(self) -> Value {
        self.data
    }
}

/// Numeric coercion of a JSON scalar.
pub(crate) fn coerce_number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(number) => number.as_f64(),
        Value::Bool(flag) => Some(if *flag { 1.0 } else { 0.0 }),
        Value::String(text) => {
            let trimmed = text.trim();
            if trimmed.is_empty() {
                Some(0.0)
            } else {
                trimmed.parse::<f64>().ok()
            }
        }
        Value::Null => Some(0.0),
        // Arrays coerce through their joined text: `[]` is 0, `[x]` is `x`.
        Value::Array(items) => match items.as_slice() {
            [] => Some(0.0),
            [Value::Null] => Some(0.0),
            [item @ (Value::Number(_) | Value::String(_) | Value::Array(_))] => coerce_number(item),
            _ => None,
        },
        Value::Object(_) => None,
    }
}

/// Truthiness of a JSON value as a dynamic client would judge it.
pub(crate) fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(flag) => *flag,
        Value::Number(number) => number.as_f64().is_some_and(|n| n != 0.0 && !n.is_nan()),
        Value::String(text) => !text.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

/// Render a backend `message` field, falling back when it is falsy.
pub(crate) fn render_message(value: &Value, fallback: &str) -> String {
    if is_truthy(value) {
        stringify(value)
    } else {
        fallback.to_owned()
    }
}

fn stringify(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        Value::Number(number) => match (number.as_i64(), number.as_f64()) {
            (Some(integer), _) => integer.to_string(),
            (None, Some(float)) if float.fract() == 0.0 && float.is_finite() => {
                format!("{float:.0}")
            }
            _ => number.to_string(),
        },
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    //! Regression coverage for this module.
    use super::*;
    use rstest::rstest;
    use serde_json::json;

    fn envelope(value: Value) -> Envelope {
        Envelope::from_slice(value.to_string().as_bytes())
    }

    #[rstest]
    #[case(json!({ "status": 1 }), true)]
    #[case(json!({ "status": 1.0 }), true)]
    #[case(json!({ "status": "1" }), true)]
    #[case(json!({ "status": " 1 " }), true)]
    #[case(json!({ "status": true }), true)]
    #[case(json!({ "status": 0 }), false)]
    #[case(json!({ "status": 2 }), false)]
    #[case(json!({ "status": "ok" }), false)]
    #[case(json!({ "status": null }), false)]
    #[case(json!({ "status": [1] }), true)]
    #[case(json!({ "status": ["1"] }), true)]
    #[case(json!({ "status": [[1]] }), true)]
    #[case(json!({ "status": [1, 1] }), false)]
    #[case(json!({ "status": [true] }), false)]
    #[case(json!({ "status": [] }), false)]
    #[case(json!({ "status": {} }), false)]
    #[case(json!({ "data": { "id": 1 } }), false)]
    fn status_must_coerce_to_exactly_one(#[case] body: Value, #[case] success: bool) {
        assert_eq!(envelope(body).is_success(), success);
    }

    #[rstest]
    #[case(b"not json".as_slice())]
    #[case(b"[1, \"ok\"]".as_slice())]
    #[case(b"".as_slice())]
    fn non_object_bodies_fail(#[case] body: &[u8]) {
        let parsed = Envelope::from_slice(body);
        assert_eq!(parsed, Envelope::default());
        assert!(!parsed.is_success());
    }

    #[rstest]
    #[case(json!({ "status": 0, "message": "Invalid plan" }), "Invalid plan")]
    #[case(json!({ "status": 0, "message": "" }), ENVELOPE_FALLBACK_MESSAGE)]
    #[case(json!({ "status": 0 }), ENVELOPE_FALLBACK_MESSAGE)]
    #[case(json!({ "status": 0, "message": 42 }), "42")]
    fn failure_message_falls_back_when_falsy(#[case] body: Value, #[case] expected: &str) {
        assert_eq!(envelope(body).failure_message(), expected);
    }

    #[test]
    fn token_requires_non_empty_string() {
        assert_eq!(envelope(json!({ "data": { "token": "abc" } })).token(), Some("abc"));
        assert_eq!(envelope(json!({ "data": { "token": "" } })).token(), None);
        assert_eq!(envelope(json!({ "data": { "token": 12 } })).token(), None);
        assert_eq!(envelope(json!({ "data": null })).token(), None);
    }

    #[test]
    fn session_header_stringifies_fields() {
        let parsed = envelope(json!({
            "status": 1,
            "header": { "user_type": "admin", "user_id": 17 }
        }));
        assert_eq!(
            parsed.session_header(),
            Some(SessionHeader {
                user_type: "admin".to_owned(),
                user_id: "17".to_owned(),
            })
        );
    }

    #[rstest]
    #[case(json!({ "status": 1 }))]
    #[case(json!({ "status": 1, "header": {} }))]
    #[case(json!({ "status": 1, "header": { "user_type": "" } }))]
    #[case(json!({ "status": 1, "header": { "user_id": 4 } }))]
    fn session_header_requires_user_type(#[case] body: Value) {
        assert_eq!(envelope(body).session_header(), None);
    }

    #[test]
    fn missing_user_id_becomes_blank() {
        let parsed = envelope(json!({ "status": 1, "header": { "user_type": "editor" } }));
        let header = parsed.session_header().expect("user_type present");
        assert_eq!(header.user_id, "");
    }
}
