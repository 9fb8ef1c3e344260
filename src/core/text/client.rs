//! Gemini `generateContent` REST client.

use std::time::Duration;

use super::messages::{
    Content, GenerateContentRequest, GenerateContentResponse, TextGenerationConfig,
};
use super::{TextError, TextResult};
use crate::config::ServerConfig;

/// Request timeout for text generation calls.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

/// Default sampling temperature, matching the voice side of the agent.
const DEFAULT_TEMPERATURE: f32 = 0.7;

/// Client for the Gemini text generation REST API.
///
/// Cheap to share: holds one pooled `reqwest::Client`.
#[derive(Debug, Clone)]
pub struct TextClient {
    http: reqwest::Client,
    api_base: String,
    api_key: Option<String>,
    model: String,
}

impl TextClient {
    /// Build the client from the server configuration.
    pub fn new(config: &ServerConfig) -> Self {
        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .unwrap_or_default();

        Self {
            http,
            api_base: config.api_base.trim_end_matches('/').to_string(),
            api_key: config.gemini_api_key.clone(),
            model: config.text_model.clone(),
        }
    }

    /// The model this client generates with.
    pub fn model(&self) -> &str {
        &self.model
    }

    fn request_url(&self) -> String {
        format!("{}/models/{}:generateContent", self.api_base, self.model)
    }

    /// Generate a reply for `message`, with optional prior turns and system
    /// instruction. Returns the first candidate's text.
    pub async fn generate(
        &self,
        message: &str,
        history: Vec<Content>,
        system_instruction: Option<&str>,
    ) -> TextResult<String> {
        let api_key = self.api_key.as_deref().ok_or(TextError::MissingApiKey)?;

        let mut contents = history;
        contents.push(Content::user_text(message));

        let request = GenerateContentRequest {
            contents,
            system_instruction: system_instruction.map(Content::system_text),
            generation_config: Some(TextGenerationConfig {
                temperature: Some(DEFAULT_TEMPERATURE),
            }),
        };

        let response = self
            .http
            .post(self.request_url())
            .query(&[("key", api_key)])
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            tracing::warn!(status = %status, "generateContent failed");
            return Err(TextError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let body: GenerateContentResponse = response.json().await?;
        body.first_candidate_text().ok_or(TextError::EmptyResponse)
    }
}
