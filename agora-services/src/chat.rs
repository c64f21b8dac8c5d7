//! Chat completion client

use agora_core::OpenAiSettings;
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use serde::{Deserialize, Serialize};

use crate::error::{Result, ServiceError};
use crate::http::HttpClient;

pub const SYSTEM_ROLE: &str = "You are a helpful and friendly assistant.";

/// One message in a chat exchange
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

impl ChatMessage {
    pub fn new(role: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            role: role.into(),
            content: content.into(),
        }
    }
}

#[async_trait]
pub trait ChatCompletionService: Send + Sync {
    /// Send `prompt` and return the assistant's reply.
    async fn complete(&self, prompt: &str, max_tokens: Option<u32>) -> Result<ChatMessage>;
}

#[derive(Debug, Serialize)]
struct CompletionRequest<'a> {
    model: &'a str,
    messages: [ChatMessage; 2],
    temperature: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
}

#[derive(Debug, Deserialize)]
struct CompletionResponse {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChatMessage,
}

pub struct ChatCompletion {
    http: HttpClient,
    base_url: String,
    api_key: String,
    model: String,
    temperature: f32,
}

impl ChatCompletion {
    pub fn new(http: HttpClient, settings: &OpenAiSettings) -> Result<Self> {
        let api_key = settings
            .api_key
            .clone()
            .filter(|k| !k.trim().is_empty())
            .ok_or(ServiceError::NotConfigured("OPENAI_API_KEY"))?;

        Ok(Self {
            http,
            base_url: settings.base_url.trim_end_matches('/').to_owned(),
            api_key,
            model: settings.model.clone(),
            temperature: 0.0,
        })
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    fn request<'a>(&'a self, prompt: &str, max_tokens: Option<u32>) -> CompletionRequest<'a> {
        CompletionRequest {
            model: &self.model,
            messages: [
                ChatMessage::new("system", SYSTEM_ROLE),
                ChatMessage::new("user", prompt),
            ],
            temperature: self.temperature,
            max_tokens,
        }
    }

    fn headers(&self) -> Result<HeaderMap> {
        let mut headers = HeaderMap::new();
        let bearer = HeaderValue::from_str(&format!("Bearer {}", self.api_key))
            .map_err(|e| ServiceError::InvalidResponse(format!("invalid api key header: {}", e)))?;
        headers.insert(AUTHORIZATION, bearer);
        Ok(headers)
    }
}

#[async_trait]
impl ChatCompletionService for ChatCompletion {
    async fn complete(&self, prompt: &str, max_tokens: Option<u32>) -> Result<ChatMessage> {
        let url = format!("{}/chat/completions", self.base_url);
        tracing::debug!(model = %self.model, prompt_len = prompt.len(), "requesting chat completion");

        let response: CompletionResponse = self
            .http
            .post_json(&url, &self.request(prompt, max_tokens), self.headers()?)
            .await?;

        response
            .choices
            .into_iter()
            .next()
            .map(|choice| choice.message)
            .ok_or_else(|| ServiceError::InvalidResponse("completion has no choices".into()))
    }
}
