//! HTTP client for the Gemini REST API.
//!
//! Request bodies and response parsing live in `codeprompt_core::gemini`; this
//! module only moves them over the wire and classifies failures.

use crate::config::Settings;
use crate::prelude::*;
use codeprompt_core::error::classify_model_status;
use codeprompt_core::gemini::{
    GenerateContentRequest, GenerateContentResponse, Operation, PredictRequest, PredictResponse,
};
use codeprompt_core::Error as CoreError;
use serde::de::DeserializeOwned;
use serde::Serialize;

const API_KEY_HEADER: &str = "x-goog-api-key";

#[derive(Debug, Clone)]
pub struct GeminiClient {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl GeminiClient {
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
        }
    }

    /// Client for the configured endpoint. Fails before any request when no key is set.
    pub fn from_settings(settings: &Settings) -> Result<Self> {
        Ok(Self::new(
            &settings.config.endpoints.gemini,
            settings.api_key()?,
        ))
    }

    pub fn api_key(&self) -> &str {
        &self.api_key
    }

    /// `POST models/{model}:generateContent`
    pub async fn generate_content(
        &self,
        model: &str,
        request: &GenerateContentRequest,
    ) -> Result<GenerateContentResponse> {
        let url = format!("{}/models/{model}:generateContent", self.base_url);
        let response: GenerateContentResponse = self.post(&url, request).await?;
        if let Some(reason) = response.blocked_reason() {
            return Err(CoreError::ProviderError(reason).into());
        }
        Ok(response)
    }

    /// `POST models/{model}:predict` (Imagen)
    pub async fn predict(&self, model: &str, request: &PredictRequest) -> Result<PredictResponse> {
        let url = format!("{}/models/{model}:predict", self.base_url);
        self.post(&url, request).await
    }

    /// `POST models/{model}:predictLongRunning` (Veo)
    pub async fn predict_long_running(
        &self,
        model: &str,
        request: &PredictRequest,
    ) -> Result<Operation> {
        let url = format!("{}/models/{model}:predictLongRunning", self.base_url);
        self.post(&url, request).await
    }

    /// `GET {operation name}`
    pub async fn get_operation(&self, name: &str) -> Result<Operation> {
        let url = format!("{}/{}", self.base_url, name.trim_start_matches('/'));
        log::debug!("GET {url}");

        let response = self
            .client
            .get(&url)
            .header(API_KEY_HEADER, &self.api_key)
            .send()
            .await
            .map_err(|e| CoreError::ProviderError(format!("request failed: {e}")))?;

        Self::parse(response).await
    }

    async fn post<B, R>(&self, url: &str, body: &B) -> Result<R>
    where
        B: Serialize + ?Sized,
        R: DeserializeOwned,
    {
        log::debug!("POST {url}");

        let response = self
            .client
            .post(url)
            .header(API_KEY_HEADER, &self.api_key)
            .json(body)
            .send()
            .await
            .map_err(|e| CoreError::ProviderError(format!("request failed: {e}")))?;

        Self::parse(response).await
    }

    async fn parse<R: DeserializeOwned>(response: reqwest::Response) -> Result<R> {
        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| CoreError::ProviderError(format!("failed to read response: {e}")))?;

        if !status.is_success() {
            log::debug!("Gemini error [{status}]: {body}");
            return Err(classify_model_status(status.as_u16(), &body).into());
        }

        serde_json::from_str(&body)
            .map_err(|e| CoreError::ProviderError(format!("unexpected response: {e}")).into())
    }
}
