//! Plans, subscription and image generation endpoints.

use serde_json::json;

use super::models::{ImagePrompt, NewPlan, Plan, PlanList, Subscription, SubscriptionEnvelope};
use super::{ConsoleApi, api_path};
use crate::domain::error::ApiError;
use crate::domain::request::ApiRequest;

impl ConsoleApi {
    /// Plans on offer.
    ///
    /// # Errors
    ///
    /// Returns the normalized call failure.
    pub async fn plans(&self) -> Result<Vec<Plan>, ApiError> {
        let list: PlanList = self.fetch(ApiRequest::get(api_path("/plans"))).await?;
        Ok(list.plans)
    }

    /// Publish a new plan.
    ///
    /// # Errors
    ///
    /// Returns the normalized call failure; the backend rejects callers that
    /// are not superadmins.
    pub async fn create_plan(&self, plan: &NewPlan) -> Result<(), ApiError> {
        let request = ApiRequest::post(api_path("/plans")).with_json(plan.to_json());
        self.send(request).await.map(drop)
    }

    /// Current subscription, `None` when the account has none.
    ///
    /// # Errors
    ///
    /// Returns the normalized call failure.
    pub async fn subscription(&self) -> Result<Option<Subscription>, ApiError> {
        let envelope: SubscriptionEnvelope =
            self.fetch(ApiRequest::get(api_path("/subscription"))).await?;
        Ok(envelope.subscription)
    }

    /// Subscribe to a plan.
    ///
    /// # Errors
    ///
    /// Returns the normalized call failure, e.g. `ApplicationError` when the
    /// backend refuses the plan.
    pub async fn subscribe(&self, plan_id: u64) -> Result<(), ApiError> {
        let request =
            ApiRequest::post(api_path("/subscription")).with_json(json!({ "plan_id": plan_id }));
        self.send(request).await.map(drop)
    }

    /// Render an image from a text prompt; returns the encoded image bytes.
    ///
    /// # Errors
    ///
    /// Returns the normalized call failure.
    pub async fn generate_image(&self, prompt: &ImagePrompt) -> Result<Vec<u8>, ApiError> {
        let request = ApiRequest::post(api_path("/generate-image")).with_json(prompt.to_json());
        self.dispatcher().call_binary(request).await
    }
}

#[cfg(test)]
mod tests {
    //! Regression coverage for this module.
    use serde_json::json;

    use super::super::test_support::api_replying;
    use super::*;
    use crate::domain::error::NormalizedError;

    #[tokio::test]
    async fn refused_subscription_surfaces_envelope_message() {
        let (api, recorder) = api_replying(json!({ "status": 0, "message": "Invalid plan" }));

        let error = api.subscribe(99).await.expect_err("plan refused");

        assert_eq!(
            NormalizedError::from(error),
            NormalizedError {
                code: 500,
                message: "Invalid plan".to_owned(),
            }
        );
        assert_eq!(recorder.last().url, "http://backend.test/api/v1/subscription");
    }

    #[tokio::test]
    async fn missing_subscription_is_none() {
        let (api, _) = api_replying(json!({ "status": 1, "data": { "subscription": null } }));
        assert_eq!(api.subscription().await.expect("call succeeds"), None);
    }

    #[tokio::test]
    async fn subscription_plan_features_decode_from_string() {
        let (api, _) = api_replying(json!({
            "status": 1,
            "data": { "subscription": {
                "plan": { "id": 1, "name": "Pro", "price": 10, "features": "[\"SSO\"]" },
                "start_date": "2026-01-01",
                "end_date": "2026-02-01",
                "status": "active"
            } }
        }));
        let subscription = api
            .subscription()
            .await
            .expect("call succeeds")
            .expect("subscription present");
        assert_eq!(subscription.plan.features, vec!["SSO"]);
        assert_eq!(subscription.status, "active");
    }

    #[tokio::test]
    async fn generate_image_returns_bytes() {
        let (api, recorder) = api_replying(json!({ "not": "an envelope" }));
        let prompt = ImagePrompt::new("harbour at dusk").expect("valid prompt");

        let bytes = api.generate_image(&prompt).await.expect("binary call succeeds");

        assert_eq!(bytes, br#"{"not":"an envelope"}"#.to_vec());
        assert!(recorder.last().header("authorization").is_some());
    }
}
