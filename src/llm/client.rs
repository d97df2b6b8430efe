//! Ollama text generation client
//!
//! Sends single-shot (non-streaming) prompts to `POST /api/generate`.
//! Accepts both the native Ollama body (`response`) and an OpenAI-style
//! body (`choices[0].message.content`) for compatible gateways.

use anyhow::{anyhow, Context};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::errors::{RagError, Result};
use crate::rag::collaborators::LanguageModel;

/// Default Ollama API endpoint
pub const DEFAULT_OLLAMA_URL: &str = "http://127.0.0.1:11434";

/// Default model
pub const DEFAULT_MODEL: &str = "gemma3:4b";

/// Default sampling temperature
pub const DEFAULT_TEMPERATURE: f32 = 0.7;

/// Request timeout (2 minutes, generation on CPU is slow)
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(120);

/// Ollama generation client
#[derive(Debug, Clone)]
pub struct OllamaClient {
    client: Client,
    base_url: String,
    model: String,
    temperature: f32,
}

impl OllamaClient {
    /// Create new Ollama client with default settings
    pub fn new() -> Result<Self> {
        Self::with_config(DEFAULT_OLLAMA_URL, DEFAULT_MODEL, DEFAULT_TEMPERATURE, REQUEST_TIMEOUT)
    }

    /// Create Ollama client with custom configuration
    pub fn with_config(
        base_url: &str,
        model: &str,
        temperature: f32,
        timeout: Duration,
    ) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(RagError::Http)?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            model: model.to_string(),
            temperature,
        })
    }

    /// Check if Ollama is available
    pub async fn health_check(&self) -> bool {
        let url = format!("{}/api/version", self.base_url);

        match self.client.get(&url).send().await {
            Ok(response) => response.status().is_success(),
            Err(_) => false,
        }
    }

    /// Get current model name
    pub fn model(&self) -> &str {
        &self.model
    }

    /// Get base URL
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn request(&self, prompt: &str) -> GenerateRequest {
        GenerateRequest {
            model: self.model.clone(),
            prompt: prompt.to_string(),
            stream: false,
            options: GenerateOptions {
                temperature: self.temperature,
            },
        }
    }
}

#[async_trait]
impl LanguageModel for OllamaClient {
    async fn generate(&self, prompt: &str) -> anyhow::Result<String> {
        let url = format!("{}/api/generate", self.base_url);
        tracing::debug!(
            model = %self.model,
            prompt_chars = prompt.len(),
            "sending generate request"
        );

        let response = self
            .client
            .post(&url)
            .json(&self.request(prompt))
            .send()
            .await
            .with_context(|| format!("Failed to send request to {}", url))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(anyhow!("Ollama returned HTTP {}: {}", status, error_text));
        }

        let body: GenerateResponse = response
            .json()
            .await
            .context("Failed to parse generate response")?;

        body.into_text()
    }
}

/// Ollama generate request
#[derive(Debug, Clone, Serialize)]
struct GenerateRequest {
    model: String,
    prompt: String,
    stream: bool,
    options: GenerateOptions,
}

#[derive(Debug, Clone, Serialize)]
struct GenerateOptions {
    temperature: f32,
}

/// Generate response body, native or OpenAI-compatible
#[derive(Debug, Default, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    response: Option<String>,
    #[serde(default)]
    choices: Vec<Choice>,
    #[serde(default)]
    error: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    #[serde(default)]
    content: String,
}

impl GenerateResponse {
    fn into_text(self) -> anyhow::Result<String> {
        if let Some(error) = self.error {
            return Err(anyhow!("Ollama error: {}", error));
        }
        if let Some(text) = self.response {
            return Ok(text);
        }
        self.choices
            .into_iter()
            .next()
            .map(|choice| choice.message.content)
            .ok_or_else(|| anyhow!("generate response contained no text"))
    }
}
