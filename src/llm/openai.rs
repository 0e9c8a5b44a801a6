//! OpenAI-compatible chat completion client.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::traits::{ChatMessage, CompletionError, CompletionRequest, CompletionService, ModelTier};
use crate::config::LlmConfig;

#[derive(Debug, Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    temperature: f64,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    #[serde(default)]
    content: Option<String>,
}

/// Chat completion client for `/v1/chat/completions`.
pub struct OpenAiClient {
    base_url: String,
    api_key: Option<String>,
    fast_model: String,
    quality_model: String,
    client: reqwest::Client,
}

impl OpenAiClient {
    pub fn from_config(config: &LlmConfig) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout_secs))
            .connect_timeout(std::time::Duration::from_secs(10))
            .build()?;

        Ok(Self {
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
            fast_model: config.fast_model.clone(),
            quality_model: config.quality_model.clone(),
            client,
        })
    }

    /// Model name serving a tier.
    pub fn model_for(&self, tier: ModelTier) -> &str {
        match tier {
            ModelTier::Fast => &self.fast_model,
            ModelTier::Quality => &self.quality_model,
        }
    }

    fn completions_url(&self) -> String {
        format!("{}/chat/completions", self.base_url)
    }
}

#[async_trait]
impl CompletionService for OpenAiClient {
    fn name(&self) -> &str {
        "openai"
    }

    async fn complete(&self, request: CompletionRequest) -> Result<String, CompletionError> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or_else(|| CompletionError::NotConfigured("OPENAI_API_KEY is not set".into()))?;

        let model = self.model_for(request.tier);
        let body = ChatCompletionRequest {
            model,
            messages: &request.messages,
            temperature: request.temperature,
        };

        let resp = self
            .client
            .post(self.completions_url())
            .bearer_auth(api_key)
            .json(&body)
            .send()
            .await?;

        if !resp.status().is_success() {
            let status = resp.status().as_u16();
            let body = resp.text().await.unwrap_or_default();
            return Err(CompletionError::Status { status, body });
        }

        let parsed: ChatCompletionResponse = resp
            .json()
            .await
            .map_err(|e| CompletionError::Malformed(e.to_string()))?;

        let content = parsed
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .map(|c| c.trim().to_string())
            .unwrap_or_default();

        if content.is_empty() {
            return Err(CompletionError::EmptyReply);
        }

        tracing::debug!(model, tier = request.tier.label(), "Completion received");
        Ok(content)
    }
}
