//! Thin client for the OpenAI REST API.
//!
//! One HTTP client serves embeddings, chat completions and image
//! generation; each call carries its own request timeout.

use crate::{
    config::Config,
    error::{ApiError, Result},
    services::{Embedder, ImageGenerator, TextGenerator},
};
use async_trait::async_trait;
use log::{debug, info};
use reqwest::{Client, RequestBuilder};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::time::Duration;

const DEFAULT_CONNECTION_TIMEOUT_SECONDS: u64 = 10;

#[derive(Debug, Clone)]
pub struct OpenAiClient {
    client: Client,
    api_key: String,
    base_url: String,
    embedding_model: String,
    chat_model: String,
    image_model: String,
    embedding_timeout: Duration,
    chat_timeout: Duration,
    image_timeout: Duration,
}

#[derive(Debug, Serialize)]
struct EmbeddingRequest<'a> {
    model: &'a str,
    input: &'a [String],
}

#[derive(Debug, Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingData>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingData {
    index: usize,
    embedding: Vec<f32>,
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    temperature: f32,
    messages: Vec<ChatMessage<'a>>,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChatChoiceMessage {
    content: Option<String>,
}

#[derive(Debug, Serialize)]
struct ImageRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    size: &'a str,
}

#[derive(Debug, Deserialize)]
struct ImageResponse {
    #[serde(default)]
    data: Vec<ImageData>,
}

#[derive(Debug, Deserialize)]
struct ImageData {
    b64_json: Option<String>,
}

impl OpenAiClient {
    pub fn new(config: &Config) -> Result<Self> {
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(DEFAULT_CONNECTION_TIMEOUT_SECONDS))
            .pool_max_idle_per_host(10)
            .build()
            .map_err(|e| ApiError::InternalError(format!("Failed to create HTTP client: {}", e)))?;

        info!(
            "OpenAI client ready (chat: {}, embeddings: {}, images: {})",
            config.chat_model, config.embedding_model, config.image_model
        );

        Ok(Self {
            client,
            api_key: config.openai_api_key.clone(),
            base_url: config.openai_base_url.trim_end_matches('/').to_string(),
            embedding_model: config.embedding_model.clone(),
            chat_model: config.chat_model.clone(),
            image_model: config.image_model.clone(),
            embedding_timeout: config.search_timeout(),
            chat_timeout: config.generation_timeout(),
            image_timeout: config.image_timeout(),
        })
    }

    fn post(&self, path: &str, timeout: Duration) -> RequestBuilder {
        self.client
            .post(format!("{}/{}", self.base_url, path))
            .bearer_auth(&self.api_key)
            .timeout(timeout)
    }

    async fn send<T: DeserializeOwned>(&self, request: RequestBuilder, what: &str) -> Result<T> {
        let response = request.send().await?;
        let status = response.status();

        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(ApiError::ExternalServiceError(format!(
                "OpenAI {} request failed with status {}: {}",
                what, status, error_text
            )));
        }

        response.json::<T>().await.map_err(|e| {
            ApiError::SerializationError(format!("Failed to parse OpenAI {} response: {}", what, e))
        })
    }
}

#[async_trait]
impl Embedder for OpenAiClient {
    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let request = EmbeddingRequest {
            model: &self.embedding_model,
            input: texts,
        };
        let mut response: EmbeddingResponse = self
            .send(
                self.post("embeddings", self.embedding_timeout).json(&request),
                "embeddings",
            )
            .await?;

        if response.data.len() != texts.len() {
            return Err(ApiError::ExternalServiceError(format!(
                "Expected {} embeddings, got {}",
                texts.len(),
                response.data.len()
            )));
        }

        response.data.sort_by_key(|item| item.index);
        debug!("Embedded {} texts", texts.len());
        Ok(response.data.into_iter().map(|item| item.embedding).collect())
    }
}

#[async_trait]
impl TextGenerator for OpenAiClient {
    async fn complete(
        &self,
        system_prompt: &str,
        user_prompt: &str,
        temperature: f32,
    ) -> Result<String> {
        let request = ChatRequest {
            model: &self.chat_model,
            temperature,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: system_prompt,
                },
                ChatMessage {
                    role: "user",
                    content: user_prompt,
                },
            ],
        };

        let response: ChatResponse = self
            .send(
                self.post("chat/completions", self.chat_timeout).json(&request),
                "chat",
            )
            .await?;

        response
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .map(|content| content.trim().to_string())
            .ok_or_else(|| ApiError::ExternalServiceError("No choices in chat response".into()))
    }
}

#[async_trait]
impl ImageGenerator for OpenAiClient {
    async fn generate(&self, prompt: &str, size: &str) -> Result<String> {
        let request = ImageRequest {
            model: &self.image_model,
            prompt,
            size,
        };

        let response: ImageResponse = self
            .send(
                self.post("images/generations", self.image_timeout).json(&request),
                "image",
            )
            .await?;

        let first = response.data.into_iter().next().ok_or_else(|| {
            ApiError::ExternalServiceError("No image data returned by the model.".into())
        })?;

        first
            .b64_json
            .filter(|b64| !b64.is_empty())
            .ok_or_else(|| ApiError::ExternalServiceError("No image bytes (b64_json) returned.".into()))
    }
}
