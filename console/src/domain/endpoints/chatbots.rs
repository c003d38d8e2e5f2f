//! Profile, chatbot, settings, embed, domain and analytics endpoints.

use serde_json::json;

use super::models::{
    AllowedDomain, Chatbot, ChatbotAnalytics, ChatbotDraft, ChatbotList, ChatbotSettings,
    DomainList, DomainName, EmbedScript, Profile, ProfileEnvelope,
};
use super::{ConsoleApi, api_path, chatbot_path};
use crate::domain::error::ApiError;
use crate::domain::request::ApiRequest;

impl ConsoleApi {
    /// Account details, including owned chatbots.
    ///
    /// # Errors
    ///
    /// Returns the normalized call failure.
    pub async fn profile(&self) -> Result<Profile, ApiError> {
        let envelope: ProfileEnvelope = self.fetch(ApiRequest::get(api_path("/profile"))).await?;
        Ok(envelope.user)
    }

    /// Minimal account summary used for role checks.
    ///
    /// # Errors
    ///
    /// Returns the normalized call failure.
    pub async fn me(&self) -> Result<Profile, ApiError> {
        let envelope: ProfileEnvelope =
            self.fetch(ApiRequest::get(api_path("/profile/me"))).await?;
        Ok(envelope.user)
    }

    /// Rename the account's company.
    ///
    /// # Errors
    ///
    /// Returns the normalized call failure.
    pub async fn update_company(&self, company_name: &str) -> Result<(), ApiError> {
        let request =
            ApiRequest::put(api_path("/profile")).with_json(json!({ "company_name": company_name }));
        self.send(request).await.map(drop)
    }

    /// Chatbots visible to the account.
    ///
    /// # Errors
    ///
    /// Returns the normalized call failure.
    pub async fn list_chatbots(&self) -> Result<Vec<Chatbot>, ApiError> {
        let list: ChatbotList = self.fetch(ApiRequest::get(api_path("/chatbots"))).await?;
        Ok(list.chatbots)
    }

    /// Create a chatbot.
    ///
    /// # Errors
    ///
    /// Returns the normalized call failure.
    pub async fn create_chatbot(&self, draft: ChatbotDraft) -> Result<(), ApiError> {
        let request = ApiRequest::post(api_path("/chatbots")).with_form(draft.into_form());
        self.send(request).await.map(drop)
    }

    /// Delete a chatbot.
    ///
    /// # Errors
    ///
    /// Returns the normalized call failure.
    pub async fn delete_chatbot(&self, chatbot_id: u64) -> Result<(), ApiError> {
        self.send(ApiRequest::delete(chatbot_path(chatbot_id, "")))
            .await
            .map(drop)
    }

    /// Widget settings.
    ///
    /// # Errors
    ///
    /// Returns the normalized call failure.
    pub async fn settings(&self, chatbot_id: u64) -> Result<ChatbotSettings, ApiError> {
        self.fetch(ApiRequest::get(chatbot_path(chatbot_id, "/settings")))
            .await
    }

    /// Replace the widget settings, optionally uploading a new logo.
    ///
    /// # Errors
    ///
    /// Returns the normalized call failure.
    pub async fn update_settings(
        &self,
        chatbot_id: u64,
        draft: ChatbotDraft,
    ) -> Result<(), ApiError> {
        let request =
            ApiRequest::post(chatbot_path(chatbot_id, "/settings")).with_form(draft.into_form());
        self.send(request).await.map(drop)
    }

    /// Generate the widget embed script.
    ///
    /// # Errors
    ///
    /// Returns the normalized call failure.
    pub async fn embed_script(&self, chatbot_id: u64) -> Result<EmbedScript, ApiError> {
        self.fetch(ApiRequest::post(chatbot_path(chatbot_id, "/embed")))
            .await
    }

    /// Origins allowed to load the widget.
    ///
    /// # Errors
    ///
    /// Returns the normalized call failure.
    pub async fn allowed_domains(&self, chatbot_id: u64) -> Result<Vec<AllowedDomain>, ApiError> {
        let list: DomainList = self
            .fetch(ApiRequest::get(chatbot_path(chatbot_id, "/allowed-domains")))
            .await?;
        Ok(list.domains)
    }

    /// Allow another origin.
    ///
    /// # Errors
    ///
    /// Returns the normalized call failure.
    pub async fn add_allowed_domain(
        &self,
        chatbot_id: u64,
        domain: &DomainName,
    ) -> Result<(), ApiError> {
        let request = ApiRequest::post(chatbot_path(chatbot_id, "/allowed-domains"))
            .with_json(json!({ "domain": domain.as_str() }));
        self.send(request).await.map(drop)
    }

    /// Usage counters and recent visitor queries.
    ///
    /// # Errors
    ///
    /// Returns the normalized call failure.
    pub async fn analytics(&self, chatbot_id: u64) -> Result<ChatbotAnalytics, ApiError> {
        self.fetch(ApiRequest::get(chatbot_path(chatbot_id, "/analytics")))
            .await
    }
}
