//! Ollama HTTP client.

use crate::error::{OllamaError, OllamaResult};
use crate::types::*;
use reqwest::{Client, Response};
use sift_config::OllamaConfig;
use std::time::Duration;
use tracing::{debug, info};

/// Client for interacting with Ollama's API.
#[derive(Clone)]
pub struct OllamaClient {
    client: Client,
    host: String,
    timeout: Duration,
}

impl OllamaClient {
    /// Create a new client from configuration.
    pub fn from_config(config: &OllamaConfig) -> OllamaResult<Self> {
        Self::with_timeout(&config.host, Duration::from_secs(config.timeout_seconds))
    }

    /// Create a new client with the default two minute timeout.
    pub fn new(host: impl Into<String>) -> OllamaResult<Self> {
        Self::with_timeout(&host.into(), Duration::from_secs(120))
    }

    fn with_timeout(host: &str, timeout: Duration) -> OllamaResult<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(OllamaError::Http)?;

        Ok(Self {
            client,
            host: host.trim_end_matches('/').to_string(),
            timeout,
        })
    }

    /// Base URL of the server.
    pub fn host(&self) -> &str {
        &self.host
    }

    /// Check if Ollama server is available.
    pub async fn is_available(&self) -> bool {
        let url = format!("{}/api/tags", self.host);
        match self.client.get(&url).send().await {
            Ok(resp) => resp.status().is_success(),
            Err(_) => false,
        }
    }

    /// List all available models.
    pub async fn list_models(&self) -> OllamaResult<Vec<ModelInfo>> {
        let url = format!("{}/api/tags", self.host);
        debug!("Listing models from {}", url);

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| self.request_error(e))?;
        let response = Self::check_status(response, None).await?;

        let list: ListModelsResponse = response.json().await?;
        Ok(list.models)
    }

    /// Check if a specific model is available.
    pub async fn has_model(&self, model: &str) -> OllamaResult<bool> {
        let models = self.list_models().await?;
        Ok(models.iter().any(|m| model_matches(&m.name, model)))
    }

    /// Generate an embedding for a single text.
    pub async fn embed(&self, model: &str, text: &str) -> OllamaResult<Vec<f32>> {
        let mut embeddings = self.embed_batch(model, &[text.to_string()]).await?;
        embeddings.pop().ok_or(OllamaError::EmbeddingCount {
            expected: 1,
            actual: 0,
        })
    }

    /// Generate embeddings for many texts in one request.
    ///
    /// The result holds one vector per input, in input order.
    pub async fn embed_batch(&self, model: &str, texts: &[String]) -> OllamaResult<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let url = format!("{}/api/embed", self.host);
        debug!("Embedding {} texts with model {}", texts.len(), model);

        let request = EmbedRequest {
            model: model.to_string(),
            input: texts.to_vec(),
        };

        let response = self
            .client
            .post(&url)
            .json(&request)
            .send()
            .await
            .map_err(|e| self.request_error(e))?;
        let response = Self::check_status(response, Some(model)).await?;

        let body: EmbedResponse = response.json().await?;
        if body.embeddings.len() != texts.len() {
            return Err(OllamaError::EmbeddingCount {
                expected: texts.len(),
                actual: body.embeddings.len(),
            });
        }

        Ok(body.embeddings)
    }

    /// Generate a completion (non-streaming).
    pub async fn generate(&self, request: GenerateRequest) -> OllamaResult<GenerateResponse> {
        let url = format!("{}/api/generate", self.host);
        debug!(
            "Generating with model {} for prompt length {}",
            request.model,
            request.prompt.len()
        );

        let model = request.model.clone();
        let response = self
            .client
            .post(&url)
            .json(&request)
            .send()
            .await
            .map_err(|e| self.request_error(e))?;
        let response = Self::check_status(response, Some(&model)).await?;

        let result: GenerateResponse = response.json().await?;
        info!(
            "Generated {} tokens with {}",
            result.eval_count.unwrap_or(0),
            result.model
        );

        Ok(result)
    }

    fn request_error(&self, err: reqwest::Error) -> OllamaError {
        if err.is_connect() {
            OllamaError::ServerNotRunning {
                host: self.host.clone(),
            }
        } else if err.is_timeout() {
            OllamaError::Timeout {
                seconds: self.timeout.as_secs(),
            }
        } else {
            OllamaError::Http(err)
        }
    }

    async fn check_status(response: Response, model: Option<&str>) -> OllamaResult<Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let text = response.text().await.unwrap_or_default();
        if let Some(model) = model {
            if status.as_u16() == 404 || text.contains("not found") {
                return Err(OllamaError::ModelNotFound {
                    model: model.to_string(),
                });
            }
        }

        Err(OllamaError::ApiError {
            status: status.as_u16(),
            message: text,
        })
    }
}

/// A bare model name matches any tag of that model.
fn model_matches(installed: &str, wanted: &str) -> bool {
    installed == wanted
        || installed
            .strip_prefix(wanted)
            .is_some_and(|tag| tag.starts_with(':'))
}
