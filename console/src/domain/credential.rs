//! Bearer credential with structural validation.
//!
//! The backend issues JSON Web Tokens. The client only checks that a stored
//! value *looks* like one: three dot-separated base64url segments whose header
//! decodes to a JSON object. Signatures and expiry are left to the backend, so
//! an expired but well-formed token is still sent until the server rejects it.

use std::fmt;

use base64::Engine as _;
use base64::alphabet;
use base64::engine::{DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig};
use serde_json::{Map, Value};
use thiserror::Error;
use zeroize::Zeroizing;

const SEGMENT_ENGINE: GeneralPurpose = GeneralPurpose::new(
    &alphabet::URL_SAFE,
    GeneralPurposeConfig::new()
        .with_encode_padding(false)
        .with_decode_padding_mode(DecodePaddingMode::Indifferent)
        .with_decode_allow_trailing_bits(true),
);

/// Token segment named in validation errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Segment {
    /// First segment (JOSE header).
    Header,
    /// Second segment (claims).
    Payload,
    /// Third segment (signature, may be empty).
    Signature,
}

impl fmt::Display for Segment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Header => "header",
            Self::Payload => "payload",
            Self::Signature => "signature",
        })
    }
}

/// Reasons a stored value is not a usable credential.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CredentialError {
    /// Nothing was stored.
    #[error("credential is empty")]
    Empty,
    /// The value does not split into exactly three segments.
    #[error("credential must have 3 segments, found {found}")]
    SegmentCount {
        /// Number of dot-separated segments present.
        found: usize,
    },
    /// A segment is blank or contains characters outside the base64url alphabet.
    #[error("credential {segment} segment is not base64url")]
    Encoding {
        /// Offending segment.
        segment: Segment,
    },
    /// The header segment does not decode to a JSON object.
    #[error("credential header is not a JSON object")]
    Header,
}

/// A structurally valid bearer credential.
///
/// ## Invariants
/// - `raw` splits into header, payload and signature segments.
/// - `header` is the decoded JSON object of the first segment.
///
/// # Examples
/// ```
/// use chatbot_console::domain::Credential;
///
/// // {"alg":"HS256","typ":"JWT"} . {"sub":"42"} . signature
/// let raw = "eyJhbGciOiJIUzI1NiIsInR5cCI6IkpXVCJ9.eyJzdWIiOiI0MiJ9.c2ln";
/// let credential = Credential::parse(raw).expect("well-formed token");
/// assert_eq!(credential.algorithm(), Some("HS256"));
/// assert_eq!(credential.as_str(), raw);
/// ```
#[derive(Clone, PartialEq)]
pub struct Credential {
    raw: Zeroizing<String>,
    header: Map<String, Value>,
    payload: Vec<u8>,
}

impl Credential {
    /// Decode a raw token string.
    ///
    /// # Errors
    ///
    /// Returns a [`CredentialError`] describing the first structural defect.
    pub fn parse(raw: &str) -> Result<Self, CredentialError> {
        if raw.is_empty() {
            return Err(CredentialError::Empty);
        }
        let segments: Vec<&str> = raw.split('.').collect();
        let [header, payload, signature] = segments.as_slice() else {
            return Err(CredentialError::SegmentCount {
                found: segments.len(),
            });
        };

        let header_bytes = decode_segment(header, Segment::Header, false)?;
        let payload = decode_segment(payload, Segment::Payload, false)?;
        decode_segment(signature, Segment::Signature, true)?;

        let Ok(Value::Object(header)) = serde_json::from_slice::<Value>(&header_bytes) else {
            return Err(CredentialError::Header);
        };

        Ok(Self {
            raw: Zeroizing::new(raw.to_owned()),
            header,
            payload,
        })
    }

    /// Raw token as sent in the `Authorization` header.
    pub fn as_str(&self) -> &str {
        self.raw.as_str()
    }

    /// Decoded JOSE header.
    pub fn header(&self) -> &Map<String, Value> {
        &self.header
    }

    /// Signing algorithm named by the header, if any.
    pub fn algorithm(&self) -> Option<&str> {
        self.header.get("alg").and_then(Value::as_str)
    }

    /// Claims, when the payload is a JSON object.
    pub fn claims(&self) -> Option<Map<String, Value>> {
        match serde_json::from_slice::<Value>(&self.payload) {
            Ok(Value::Object(claims)) => Some(claims),
            _ => None,
        }
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credential")
            .field("raw", &"<redacted>")
            .field("header", &self.header)
            .finish_non_exhaustive()
    }
}

fn decode_segment(
    segment: &str,
    which: Segment,
    allow_empty: bool,
) -> Result<Vec<u8>, CredentialError> {
    if segment.is_empty() {
        return if allow_empty {
            Ok(Vec::new())
        } else {
            Err(CredentialError::Encoding { segment: which })
        };
    }
    let is_base64url = segment
        .bytes()
        .all(|byte| byte.is_ascii_alphanumeric() || byte == b'-' || byte == b'_');
    if !is_base64url {
        return Err(CredentialError::Encoding { segment: which });
    }
    SEGMENT_ENGINE
        .decode(segment)
        .map_err(|_| CredentialError::Encoding { segment: which })
}
