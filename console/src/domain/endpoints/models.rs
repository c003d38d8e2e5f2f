//! Payload types for the console endpoints.
//!
//! Response types decode leniently: missing or `null` lists become empty and
//! unknown fields are kept in `extra` so nothing the backend adds is lost when
//! the CLI echoes a record back. Request types validate their inputs when
//! constructed.

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value, json};
use thiserror::Error;

use crate::domain::request::MultipartForm;

/// Client-side validation failures for endpoint inputs.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InputError {
    /// A required text field was blank once trimmed.
    #[error("{field} must not be empty")]
    Blank {
        /// Field name as sent to the backend.
        field: &'static str,
    },
    /// A price was negative or not finite.
    #[error("price must be a non-negative number")]
    InvalidPrice,
}

fn required(field: &'static str, raw: &str) -> Result<String, InputError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        Err(InputError::Blank { field })
    } else {
        Ok(trimmed.to_owned())
    }
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

fn scalar_as_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::String(text) => text,
        Value::Null => String::new(),
        other => other.to_string(),
    })
}

fn features_list<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    let items = match value {
        Value::Null => return Ok(Vec::new()),
        Value::String(text) if text.trim().is_empty() => return Ok(Vec::new()),
        Value::String(text) => match serde_json::from_str::<Value>(&text) {
            Ok(Value::Array(items)) => items,
            _ => return Err(serde::de::Error::custom("features must encode a JSON array")),
        },
        Value::Array(items) => items,
        _ => return Err(serde::de::Error::custom("features must be a list")),
    };
    Ok(items
        .into_iter()
        .map(|item| match item {
            Value::String(text) => text,
            other => other.to_string(),
        })
        .collect())
}

/// File attached to a multipart upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Upload {
    /// File name reported to the backend.
    pub file_name: String,
    /// MIME type, when known.
    pub content_type: Option<String>,
    /// Contents.
    pub bytes: Vec<u8>,
}

/// Signed-in account.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Profile {
    /// Account email.
    #[serde(default)]
    pub email: String,
    /// Company name.
    #[serde(default, alias = "company_name", deserialize_with = "null_as_default")]
    pub company: String,
    /// Role name.
    #[serde(default)]
    pub user_type: String,
    /// Chatbots owned by the account.
    #[serde(default, deserialize_with = "null_as_default")]
    pub chatbots: Vec<Chatbot>,
    /// Fields not modelled above.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct ProfileEnvelope {
    #[serde(default)]
    pub(crate) user: Profile,
}

/// A configured chatbot.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Chatbot {
    /// Backend identifier.
    pub id: u64,
    /// Display name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chatbot_name: Option<String>,
    /// Legacy display name used by older records.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Uploaded logo, relative to the backend's upload directory.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub logo_path: Option<String>,
    /// Greeting shown when the widget opens.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_message: Option<String>,
    /// Fields not modelled above.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Chatbot {
    /// Best available display name.
    pub fn display_name(&self) -> &str {
        self.chatbot_name
            .as_deref()
            .or(self.name.as_deref())
            .unwrap_or_default()
    }
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct ChatbotList {
    #[serde(default, deserialize_with = "null_as_default")]
    pub(crate) chatbots: Vec<Chatbot>,
}

/// Name and greeting sent when creating a chatbot or updating its settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatbotDraft {
    chatbot_name: String,
    default_message: String,
    logo: Option<Upload>,
}

impl ChatbotDraft {
    /// Validate the name; the greeting may be empty.
    ///
    /// # Errors
    ///
    /// Returns [`InputError::Blank`] when `chatbot_name` is blank.
    pub fn new(chatbot_name: &str, default_message: &str) -> Result<Self, InputError> {
        Ok(Self {
            chatbot_name: required("chatbot_name", chatbot_name)?,
            default_message: default_message.to_owned(),
            logo: None,
        })
    }

    /// Attach a logo (settings updates only).
    #[must_use]
    pub fn with_logo(mut self, logo: Upload) -> Self {
        self.logo = Some(logo);
        self
    }

    pub(crate) fn into_form(self) -> MultipartForm {
        let form = MultipartForm::new()
            .text("chatbot_name", self.chatbot_name)
            .text("default_message", self.default_message);
        match self.logo {
            Some(logo) => form.file("logo", logo.file_name, logo.content_type, logo.bytes),
            None => form,
        }
    }
}

/// Widget settings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChatbotSettings {
    /// Display name.
    #[serde(default, deserialize_with = "null_as_default")]
    pub chatbot_name: String,
    /// Greeting shown when the widget opens.
    #[serde(default, deserialize_with = "null_as_default")]
    pub default_message: String,
    /// Uploaded logo path, if any.
    #[serde(default)]
    pub logo_path: Option<String>,
}

/// Script tag that installs the widget on a site.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmbedScript {
    /// HTML snippet.
    #[serde(default, deserialize_with = "null_as_default")]
    pub embed_script: String,
}

/// Origin allowed to load a chatbot widget.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AllowedDomain {
    /// Backend identifier.
    #[serde(default)]
    pub id: u64,
    /// Host name.
    #[serde(default)]
    pub domain: String,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct DomainList {
    #[serde(default, deserialize_with = "null_as_default")]
    pub(crate) domains: Vec<AllowedDomain>,
}

/// Trimmed, non-blank domain name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DomainName(String);

impl DomainName {
    /// Validate a domain typed by the user.
    ///
    /// # Errors
    ///
    /// Returns [`InputError::Blank`] when the input is blank.
    ///
    /// # Examples
    /// ```
    /// use chatbot_console::domain::endpoints::DomainName;
    ///
    /// assert_eq!(DomainName::parse("  example.com ").unwrap().as_str(), "example.com");
    /// assert!(DomainName::parse("   ").is_err());
    /// ```
    pub fn parse(raw: &str) -> Result<Self, InputError> {
        required("domain", raw).map(Self)
    }

    /// Validated text.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Usage counters for one chatbot.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AnalyticsSummary {
    /// Widget loads.
    #[serde(default)]
    pub total_visits: u64,
    /// Conversations started.
    #[serde(default)]
    pub total_chats: u64,
    /// Messages exchanged.
    #[serde(default)]
    pub messages_sent: u64,
    /// When the chatbot was created.
    #[serde(default)]
    pub created_at: String,
}

/// One answered visitor query.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LogEntry {
    /// Backend identifier.
    #[serde(default)]
    pub id: u64,
    /// Origin the query came from.
    #[serde(default)]
    pub domain: String,
    /// What the visitor asked.
    #[serde(default)]
    pub input_query: String,
    /// Which knowledge source produced the answer.
    #[serde(default)]
    pub response_source: String,
    /// Matched category, if any.
    #[serde(default)]
    pub category_id: Option<u64>,
    /// Matched question, if any.
    #[serde(default)]
    pub question_id: Option<u64>,
    /// Timestamp.
    #[serde(default)]
    pub created_at: String,
}

/// Counters plus the recent query log.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChatbotAnalytics {
    /// Counters.
    #[serde(default, deserialize_with = "null_as_default")]
    pub analytics: AnalyticsSummary,
    /// Recent queries.
    #[serde(default, deserialize_with = "null_as_default")]
    pub logs: Vec<LogEntry>,
}

/// Node in a chatbot's category tree.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    /// Backend identifier.
    pub id: u64,
    /// Label.
    #[serde(default)]
    pub name: String,
    /// Parent node, `None` at the root.
    #[serde(default)]
    pub parent_id: Option<u64>,
    /// Uploaded image path, if any.
    #[serde(default)]
    pub image_path: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct CategoryList {
    #[serde(default, deserialize_with = "null_as_default")]
    pub(crate) categories: Vec<Category>,
}

/// Category to create.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewCategory {
    name: String,
    parent_id: Option<u64>,
}

impl NewCategory {
    /// Validate the label.
    ///
    /// # Errors
    ///
    /// Returns [`InputError::Blank`] when `name` is blank.
    pub fn new(name: &str, parent_id: Option<u64>) -> Result<Self, InputError> {
        Ok(Self {
            name: required("name", name)?,
            parent_id,
        })
    }

    pub(crate) fn to_json(&self) -> Value {
        json!({ "name": self.name, "parent_id": self.parent_id })
    }
}

/// Question/answer pair filed under a category.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Question {
    /// Backend identifier.
    pub id: u64,
    /// Prompt matched against visitor queries.
    #[serde(default)]
    pub question_text: String,
    /// Reply.
    #[serde(default, deserialize_with = "null_as_default")]
    pub answer_text: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(bound(deserialize = "T: Deserialize<'de>"))]
pub(crate) struct QuestionList<T> {
    #[serde(default, deserialize_with = "null_as_default")]
    pub(crate) questions: Vec<T>,
}

/// Question/answer pair to create.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuestionDraft {
    question_text: String,
    answer_text: String,
}

impl QuestionDraft {
    /// Validate both texts.
    ///
    /// # Errors
    ///
    /// Returns [`InputError::Blank`] naming the first blank field.
    pub fn new(question_text: &str, answer_text: &str) -> Result<Self, InputError> {
        Ok(Self {
            question_text: required("question_text", question_text)?,
            answer_text: required("answer_text", answer_text)?,
        })
    }

    pub(crate) fn to_json(&self, category_id: Option<u64>) -> Value {
        let mut body = json!({
            "question_text": self.question_text,
            "answer_text": self.answer_text,
        });
        if let Some(category_id) = category_id {
            body["category_id"] = Value::from(category_id);
        }
        body
    }
}

/// Question answered regardless of category. Identifiers are search-index
/// document ids, hence strings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeneralQuestion {
    /// Document identifier.
    #[serde(deserialize_with = "scalar_as_string")]
    pub id: String,
    /// Prompt.
    #[serde(default)]
    pub question_text: String,
    /// Reply, possibly unset.
    #[serde(default)]
    pub answer_text: Option<String>,
}

/// Knowledge file attached to a chatbot.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatbotFile {
    /// Backend identifier.
    pub id: u64,
    /// Title shown in listings.
    #[serde(default)]
    pub title: String,
    /// MIME type.
    #[serde(default)]
    pub file_type: String,
    /// Upload timestamp.
    #[serde(default)]
    pub created_at: String,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct FileList {
    #[serde(default, deserialize_with = "null_as_default")]
    pub(crate) files: Vec<ChatbotFile>,
}

/// Knowledge file to upload; sent as base64 inside JSON.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileUpload {
    title: String,
    file_type: String,
    bytes: Vec<u8>,
}

impl FileUpload {
    /// Validate the title and MIME type.
    ///
    /// # Errors
    ///
    /// Returns [`InputError::Blank`] when `title` or `file_type` is blank.
    pub fn new(title: &str, file_type: &str, bytes: Vec<u8>) -> Result<Self, InputError> {
        Ok(Self {
            title: required("title", title)?,
            file_type: required("file_type", file_type)?,
            bytes,
        })
    }

    pub(crate) fn to_json(&self) -> Value {
        json!({
            "title": self.title,
            "file_data": STANDARD.encode(&self.bytes),
            "file_type": self.file_type,
        })
    }
}

/// Downloaded knowledge file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileContent {
    /// MIME type.
    pub file_type: String,
    /// Decoded contents.
    pub bytes: Vec<u8>,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct FileDownload {
    #[serde(default)]
    pub(crate) file: Option<EncodedFile>,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct EncodedFile {
    #[serde(default)]
    pub(crate) file_data: Option<String>,
    #[serde(default)]
    pub(crate) file_type: Option<String>,
}

impl EncodedFile {
    /// Decode the base64 payload; `None` when either field is missing or the
    /// data is not base64.
    pub(crate) fn decode(self) -> Option<FileContent> {
        let file_data = self.file_data.filter(|data| !data.is_empty())?;
        let file_type = self.file_type.filter(|kind| !kind.is_empty())?;
        let bytes = STANDARD.decode(file_data.trim()).ok()?;
        Some(FileContent { file_type, bytes })
    }
}

/// Subscription plan.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Plan {
    /// Backend identifier.
    #[serde(default)]
    pub id: u64,
    /// Plan name.
    #[serde(default)]
    pub name: String,
    /// Marketing copy.
    #[serde(default, deserialize_with = "null_as_default")]
    pub description: String,
    /// Price per billing period.
    #[serde(default)]
    pub price: f64,
    /// Feature bullet points; accepted as an array or a JSON-encoded string.
    #[serde(default, deserialize_with = "features_list")]
    pub features: Vec<String>,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct PlanList {
    #[serde(default, deserialize_with = "null_as_default")]
    pub(crate) plans: Vec<Plan>,
}

/// Plan to create (superadmin only, enforced by the backend).
#[derive(Debug, Clone, PartialEq)]
pub struct NewPlan {
    name: String,
    description: String,
    price: f64,
    features: Vec<String>,
}

impl NewPlan {
    /// Validate name and price; blank feature entries are dropped.
    ///
    /// # Errors
    ///
    /// Returns [`InputError::Blank`] for a blank name or
    /// [`InputError::InvalidPrice`] for a negative or non-finite price.
    pub fn new(
        name: &str,
        description: &str,
        price: f64,
        features: impl IntoIterator<Item = String>,
    ) -> Result<Self, InputError> {
        if !price.is_finite() || price < 0.0 {
            return Err(InputError::InvalidPrice);
        }
        Ok(Self {
            name: required("name", name)?,
            description: description.trim().to_owned(),
            price,
            features: features
                .into_iter()
                .map(|feature| feature.trim().to_owned())
                .filter(|feature| !feature.is_empty())
                .collect(),
        })
    }

    /// Request body; `features` travels as a JSON-encoded string.
    pub(crate) fn to_json(&self) -> Value {
        json!({
            "name": self.name,
            "description": self.description,
            "price": self.price,
            "features": Value::from(self.features.clone()).to_string(),
        })
    }
}

/// Active subscription of the signed-in account.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Subscription {
    /// Subscribed plan.
    #[serde(default)]
    pub plan: Plan,
    /// Start of the current period.
    #[serde(default)]
    pub start_date: String,
    /// End of the current period.
    #[serde(default)]
    pub end_date: String,
    /// Backend status label.
    #[serde(default)]
    pub status: String,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct SubscriptionEnvelope {
    #[serde(default)]
    pub(crate) subscription: Option<Subscription>,
}

/// Image generation prompt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ImagePrompt {
    prompt: String,
    width: u32,
    height: u32,
}

impl ImagePrompt {
    /// Default edge length in pixels.
    pub const DEFAULT_SIZE: u32 = 600;

    /// Square prompt at the default size.
    ///
    /// # Errors
    ///
    /// Returns [`InputError::Blank`] when `prompt` is blank.
    pub fn new(prompt: &str) -> Result<Self, InputError> {
        Ok(Self {
            prompt: required("prompt", prompt)?,
            width: Self::DEFAULT_SIZE,
            height: Self::DEFAULT_SIZE,
        })
    }

    /// Override the output dimensions.
    #[must_use]
    pub fn with_size(mut self, width: u32, height: u32) -> Self {
        self.width = width;
        self.height = height;
        self
    }

    pub(crate) fn to_json(&self) -> Value {
        json!({ "prompt": self.prompt, "width": self.width, "height": self.height })
    }
}
