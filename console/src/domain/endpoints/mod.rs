//! Typed wrappers over the backend's console endpoints.
//!
//! Every method issues an authenticated, envelope-checked call through the
//! [`RequestDispatcher`] and decodes `data` into the matching model. Methods
//! are grouped by area in the submodules; they all hang off [`ConsoleApi`].

mod billing;
mod chatbots;
mod knowledge;
mod models;

pub use models::{
    AllowedDomain, AnalyticsSummary, Category, Chatbot, ChatbotAnalytics, ChatbotDraft,
    ChatbotFile, ChatbotSettings, DomainName, EmbedScript, FileContent, FileUpload,
    GeneralQuestion, ImagePrompt, InputError, LogEntry, NewCategory, NewPlan, Plan, Profile,
    Question, QuestionDraft, Subscription, Upload,
};

use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::domain::dispatcher::RequestDispatcher;
use crate::domain::error::ApiError;
use crate::domain::request::ApiRequest;

const API_ROOT: &str = "/api/v1";

/// Backend operations available to a signed-in user.
///
/// # Examples
/// ```no_run
/// # async fn demo(api: chatbot_console::domain::endpoints::ConsoleApi) {
/// let bots = api.list_chatbots().await.unwrap_or_default();
/// for bot in bots {
///     println!("{} {}", bot.id, bot.display_name());
/// }
/// # }
/// ```
#[derive(Clone)]
pub struct ConsoleApi {
    dispatcher: RequestDispatcher,
}

impl ConsoleApi {
    /// Wrap a dispatcher.
    pub fn new(dispatcher: RequestDispatcher) -> Self {
        Self { dispatcher }
    }

    /// Underlying dispatcher.
    pub fn dispatcher(&self) -> &RequestDispatcher {
        &self.dispatcher
    }

    async fn fetch<T: DeserializeOwned>(&self, request: ApiRequest) -> Result<T, ApiError> {
        self.dispatcher.fetch_data(request).await
    }

    async fn send(&self, request: ApiRequest) -> Result<Value, ApiError> {
        self.dispatcher.call(request).await
    }
}

fn api_path(suffix: impl AsRef<str>) -> String {
    format!("{API_ROOT}{}", suffix.as_ref())
}

fn chatbot_path(chatbot_id: u64, suffix: &str) -> String {
    api_path(format!("/chatbots/{chatbot_id}{suffix}"))
}
