use reqwest::Response;

use super::resolver::model_resource_name;
use super::types::{
    ErrorEnvelope, GeminiModel, GenerateContentRequest, GenerateContentResponse,
    ListModelsResponse,
};
use crate::error::{GatewayError, Result};

const API_KEY_HEADER: &str = "x-goog-api-key";
const LIST_PAGE_SIZE: &str = "1000";

#[derive(Clone)]
pub struct GeminiClient {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl GeminiClient {
    pub fn new(base_url: &str, api_key: &str) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
        }
    }

    /// Every model the key can see, following `nextPageToken` to the end.
    pub async fn list_models(&self) -> Result<Vec<GeminiModel>> {
        let url = format!("{}/models", self.base_url);
        let mut models = Vec::new();
        let mut page_token: Option<String> = None;

        loop {
            let mut query = vec![("pageSize", LIST_PAGE_SIZE.to_string())];
            if let Some(token) = &page_token {
                query.push(("pageToken", token.clone()));
            }

            let response = self
                .http
                .get(&url)
                .header(API_KEY_HEADER, &self.api_key)
                .query(&query)
                .send()
                .await?;
            let page: ListModelsResponse = check_status(response).await?.json().await?;
            models.extend(page.models);

            match page.next_page_token.filter(|t| !t.is_empty()) {
                Some(next) if page_token.as_deref() != Some(next.as_str()) => {
                    page_token = Some(next)
                }
                _ => break,
            }
        }

        Ok(models)
    }

    pub async fn generate_content(
        &self,
        model: &str,
        prompt: &str,
    ) -> Result<GenerateContentResponse> {
        let url = format!(
            "{}/{}:generateContent",
            self.base_url,
            model_resource_name(model)
        );

        let response = self
            .http
            .post(&url)
            .header(API_KEY_HEADER, &self.api_key)
            .header("Content-Type", "application/json")
            .json(&GenerateContentRequest::from_prompt(prompt))
            .send()
            .await?;

        Ok(check_status(response).await?.json().await?)
    }
}

// 非 2xx：尽量取上游 error.message，否则保留原始响应体
async fn check_status(response: Response) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    let message = serde_json::from_str::<ErrorEnvelope>(&body)
        .ok()
        .map(|e| e.error.message)
        .filter(|m| !m.is_empty())
        .unwrap_or(body);

    Err(GatewayError::Upstream {
        status: status.as_u16(),
        message,
    })
}
