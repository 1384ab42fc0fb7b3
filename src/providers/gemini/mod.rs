//! Google Gemini backend.
//!
//! Every `generate` call lists the upstream models, resolves the requested
//! id against them (see [`resolver`]), then calls `generateContent`.

pub mod client;
pub mod resolver;
pub mod types;

use async_trait::async_trait;

use super::Provider;
use crate::config::Settings;
use crate::error::{GatewayError, Result};
use client::GeminiClient;
use resolver::{available_model_names, candidate_list, resolve_model};

pub const PROVIDER_NAME: &str = "gemini";

pub struct GeminiProvider {
    client: GeminiClient,
    candidates: Vec<String>,
}

impl GeminiProvider {
    pub fn new(client: GeminiClient, default_model: &str) -> Self {
        Self {
            client,
            candidates: candidate_list(default_model),
        }
    }

    pub fn from_settings(settings: &Settings) -> Result<Self> {
        let api_key = settings
            .gemini_api_key()
            .ok_or_else(|| GatewayError::Config("GEMINI_API_KEY is required".into()))?;
        let client = GeminiClient::new(&settings.provider.gemini_base_url, api_key);
        Ok(Self::new(client, &settings.provider.default_model))
    }

    // 每次调用都重新拉取可用模型，不做缓存
    pub async fn resolve(&self, requested: &str) -> Result<String> {
        let models = self.client.list_models().await?;
        let available = available_model_names(&models);
        let resolved = resolve_model(requested, &available, &self.candidates)?;
        tracing::debug!(requested, resolved = %resolved, "resolved gemini model");
        Ok(resolved)
    }
}

#[async_trait]
impl Provider for GeminiProvider {
    async fn generate(&self, model: &str, prompt: &str) -> Result<String> {
        let use_model = self.resolve(model).await?;
        let response = self.client.generate_content(&use_model, prompt).await?;
        Ok(response.text().unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_partial_json, header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    async fn mount_models(server: &MockServer, names: &[&str]) {
        let models: Vec<serde_json::Value> = names
            .iter()
            .map(|n| serde_json::json!({"name": n, "supportedGenerationMethods": ["generateContent"]}))
            .collect();
        Mock::given(method("GET"))
            .and(path("/models"))
            .and(header("x-goog-api-key", "test-key"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "models": models
            })))
            .mount(server)
            .await;
    }

    fn provider_for(server: &MockServer, default_model: &str) -> GeminiProvider {
        GeminiProvider::new(GeminiClient::new(&server.uri(), "test-key"), default_model)
    }

    #[tokio::test]
    async fn generate_uses_requested_model_when_available() {
        let server = MockServer::start().await;
        mount_models(&server, &["models/gemini-2.5-flash", "models/gemini-2.5-flash-lite"]).await;

        Mock::given(method("POST"))
            .and(path("/models/gemini-2.5-flash:generateContent"))
            .and(header("x-goog-api-key", "test-key"))
            .and(body_partial_json(serde_json::json!({
                "contents": [{"parts": [{"text": "Say hi"}]}]
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "candidates": [{"content": {"role": "model", "parts": [{"text": "hi!"}]}}]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let provider = provider_for(&server, "gemini-2.5-flash-lite");
        let out = provider.generate("gemini-2.5-flash", "Say hi").await.unwrap();
        assert_eq!(out, "hi!");
    }

    #[tokio::test]
    async fn generate_falls_back_to_default_model() {
        let server = MockServer::start().await;
        mount_models(&server, &["models/gemini-2.5-flash-lite"]).await;

        Mock::given(method("POST"))
            .and(path("/models/gemini-2.5-flash-lite:generateContent"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "candidates": [{"content": {"parts": [{"text": "fallback"}]}}]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let provider = provider_for(&server, "gemini-2.5-flash-lite");
        let out = provider.generate("gpt-4o", "p").await.unwrap();
        assert_eq!(out, "fallback");
    }

    #[tokio::test]
    async fn missing_text_becomes_empty_output() {
        let server = MockServer::start().await;
        mount_models(&server, &["models/gemini-2.5-flash-lite"]).await;

        Mock::given(method("POST"))
            .and(path("/models/gemini-2.5-flash-lite:generateContent"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "candidates": [{"finishReason": "SAFETY"}]
            })))
            .mount(&server)
            .await;

        let provider = provider_for(&server, "");
        assert_eq!(provider.generate("", "p").await.unwrap(), "");
    }

    #[tokio::test]
    async fn list_models_follows_page_tokens() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/models"))
            .and(query_param("pageToken", "page-2"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "models": [{"name": "models/second", "supportedGenerationMethods": ["generateContent"]}]
            })))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/models"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "models": [{"name": "models/first", "supportedGenerationMethods": ["generateContent"]}],
                "nextPageToken": "page-2"
            })))
            .mount(&server)
            .await;

        let client = GeminiClient::new(&server.uri(), "test-key");
        let names: Vec<String> = client
            .list_models()
            .await
            .unwrap()
            .into_iter()
            .map(|m| m.name)
            .collect();
        assert_eq!(names, vec!["models/first", "models/second"]);
    }

    #[tokio::test]
    async fn upstream_rejection_surfaces_status_and_message() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/models"))
            .respond_with(ResponseTemplate::new(403).set_body_json(serde_json::json!({
                "error": {"code": 403, "message": "API key not valid", "status": "PERMISSION_DENIED"}
            })))
            .mount(&server)
            .await;

        let provider = provider_for(&server, "gemini-2.5-flash-lite");
        let err = provider.generate("", "p").await.unwrap_err();
        match err {
            GatewayError::Upstream { status, message } => {
                assert_eq!(status, 403);
                assert_eq!(message, "API key not valid");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn unresolvable_model_never_calls_generate() {
        let server = MockServer::start().await;
        mount_models(&server, &["models/some-other-model"]).await;

        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let provider = provider_for(&server, "gemini-2.5-flash-lite");
        let err = provider.generate("nope", "p").await.unwrap_err();
        assert!(err.to_string().contains("No supported model found"));
        assert!(err.to_string().contains("some-other-model"));
    }
}
