use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use tracing::debug;

use super::types::{GenerateContentRequest, GenerateContentResponse};
use super::TextGenerator;
use crate::shared::error::{AppError, AppResult};
use crate::shared::settings::ApiSettings;

/// Longest slice of an error body kept in the error message
const MAX_ERROR_BODY: usize = 200;

/// Text-generation capability backed by the Gemini REST API
pub struct GeminiClient {
    http: Client,
    base_url: String,
    api_key: Option<String>,
}

impl GeminiClient {
    pub fn new(settings: &ApiSettings) -> AppResult<Self> {
        let http = Client::builder()
            .user_agent("thai-flow/translator")
            .timeout(Duration::from_secs(settings.timeout_secs))
            .build()
            .map_err(|e| AppError::Network(e.to_string()))?;

        Ok(Self {
            http,
            base_url: settings.base_url.trim_end_matches('/').to_string(),
            api_key: settings.gemini_api_key.clone(),
        })
    }

    fn endpoint(&self, model: &str) -> String {
        format!(
            "{}/v1beta/models/{}:generateContent",
            self.base_url,
            urlencoding::encode(model)
        )
    }
}

#[async_trait]
impl TextGenerator for GeminiClient {
    async fn generate(&self, model: &str, prompt: &str) -> AppResult<Option<String>> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or_else(|| AppError::Config("Missing Gemini API key".to_string()))?;

        let url = self.endpoint(model);
        debug!(%url, "Sending generateContent request");

        let res = self
            .http
            .post(&url)
            .header("x-goog-api-key", api_key)
            .json(&GenerateContentRequest::from_prompt(prompt))
            .send()
            .await
            .map_err(|e| AppError::Network(format!("Gemini request failed: {}", e)))?;

        let status = res.status();
        if !status.is_success() {
            let body = res.text().await.unwrap_or_default();
            let body: String = body.chars().take(MAX_ERROR_BODY).collect();
            return Err(AppError::Network(format!("Gemini API error {}: {}", status, body)));
        }

        let body: GenerateContentResponse = res
            .json()
            .await
            .map_err(|e| AppError::Validation(format!("Failed to parse Gemini response: {}", e)))?;

        Ok(body.text())
    }
}
