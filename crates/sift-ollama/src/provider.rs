//! Ollama-backed implementations of the embedding and generation interfaces.

use crate::client::OllamaClient;
use crate::error::{OllamaError, OllamaResult};
use crate::types::{GenerateOptions, GenerateRequest};
use async_trait::async_trait;
use sift_config::OllamaConfig;
use sift_core::{Embedder, Error, GenerationOptions, LanguageModel, Result};

/// Embeds text with an Ollama embedding model.
#[derive(Clone)]
pub struct OllamaEmbedder {
    client: OllamaClient,
    model: String,
}

impl OllamaEmbedder {
    pub fn new(client: OllamaClient, model: impl Into<String>) -> Self {
        Self {
            client,
            model: model.into(),
        }
    }

    /// Build an embedder for `embedding_model` from configuration.
    pub fn from_config(config: &OllamaConfig) -> OllamaResult<Self> {
        Ok(Self::new(
            OllamaClient::from_config(config)?,
            config.embedding_model.clone(),
        ))
    }

    pub fn model(&self) -> &str {
        &self.model
    }
}

#[async_trait]
impl Embedder for OllamaEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        self.client
            .embed(&self.model, text)
            .await
            .map_err(embedding_error)
    }

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        self.client
            .embed_batch(&self.model, texts)
            .await
            .map_err(embedding_error)
    }
}

/// Generates answers with an Ollama chat model.
#[derive(Clone)]
pub struct OllamaGenerator {
    client: OllamaClient,
    model: String,
}

impl OllamaGenerator {
    pub fn new(client: OllamaClient, model: impl Into<String>) -> Self {
        Self {
            client,
            model: model.into(),
        }
    }

    /// Build a generator for `model` from configuration.
    pub fn from_config(config: &OllamaConfig) -> OllamaResult<Self> {
        Ok(Self::new(
            OllamaClient::from_config(config)?,
            config.model.clone(),
        ))
    }

    fn request(
        &self,
        system_prompt: &str,
        user_prompt: &str,
        options: &GenerationOptions,
    ) -> GenerateRequest {
        let num_predict = i32::try_from(options.max_tokens).unwrap_or(i32::MAX);
        GenerateRequest::new(&self.model, user_prompt)
            .with_system(system_prompt)
            .with_options(
                GenerateOptions::new()
                    .with_temperature(options.temperature)
                    .with_num_predict(num_predict),
            )
    }
}

#[async_trait]
impl LanguageModel for OllamaGenerator {
    fn model_id(&self) -> &str {
        &self.model
    }

    async fn generate(
        &self,
        system_prompt: &str,
        user_prompt: &str,
        options: &GenerationOptions,
    ) -> Result<String> {
        let request = self.request(system_prompt, user_prompt, options);
        let response = self
            .client
            .generate(request)
            .await
            .map_err(|e| Error::Generation(e.to_string()))?;
        Ok(response.response)
    }
}

fn embedding_error(err: OllamaError) -> Error {
    Error::Embedding(err.to_string())
}
