//! The retrieval and answer engine.

use crate::error::{RagError, RagResult};
use crate::guardrails::{InputGuard, OutputGuard};
use crate::prompt::{build_user_prompt, SYSTEM_PROMPT};
use serde::{Deserialize, Serialize};
use sift_config::RagConfig;
use sift_core::{
    Embedder, GenerationOptions, LanguageModel, SearchFilter, SearchResult, VectorStore,
};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info};

/// Answer returned when nothing relevant is indexed.
pub const NO_INFORMATION_ANSWER: &str =
    "I couldn't find any information about that in your files.";

/// A question with optional per-query overrides.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RagQuery {
    pub text: String,
    pub top_k: Option<usize>,
    pub temperature: Option<f32>,
    pub max_tokens: Option<u32>,
    /// OR-combined path prefixes; empty searches everything.
    pub file_filters: Vec<String>,
    pub conversation_id: Option<String>,
}

impl RagQuery {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Default::default()
        }
    }

    pub fn with_top_k(mut self, top_k: usize) -> Self {
        self.top_k = Some(top_k);
        self
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }

    pub fn with_file_filters(mut self, filters: Vec<String>) -> Self {
        self.file_filters = filters;
        self
    }

    pub fn with_conversation_id(mut self, id: impl Into<String>) -> Self {
        self.conversation_id = Some(id.into());
        self
    }
}

/// A chunk that contributed to an answer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceReference {
    pub file_path: String,
    pub file_name: String,
    pub chunk_index: usize,
    pub page_number: Option<u32>,
    pub score: f32,
    pub content: String,
}

impl From<SearchResult> for SourceReference {
    fn from(result: SearchResult) -> Self {
        Self {
            file_path: result.metadata.file_path,
            file_name: result.metadata.file_name,
            chunk_index: result.metadata.chunk_index,
            page_number: result.metadata.page_number,
            score: result.score,
            content: result.content,
        }
    }
}

/// Bookkeeping attached to every answer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResponseMeta {
    pub model: String,
    pub latency_ms: u64,
    pub guardrails_applied: bool,
    pub conversation_id: Option<String>,
}

/// An answer with the sources it was grounded on.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RagResponse {
    pub answer: String,
    /// Same order as the filtered search results.
    pub sources: Vec<SourceReference>,
    pub meta: ResponseMeta,
}

/// Answers questions from the vector index.
///
/// Holds no mutable state, so one engine can serve concurrent queries.
pub struct RagEngine {
    embedder: Arc<dyn Embedder>,
    store: Arc<dyn VectorStore>,
    llm: Arc<dyn LanguageModel>,
    input_guard: InputGuard,
    output_guard: OutputGuard,
    top_k: usize,
    temperature: f32,
    max_tokens: u32,
    min_relevance_score: f32,
}

impl RagEngine {
    /// Create an engine, compiling the guardrails from `config`.
    pub fn new(
        embedder: Arc<dyn Embedder>,
        store: Arc<dyn VectorStore>,
        llm: Arc<dyn LanguageModel>,
        config: &RagConfig,
    ) -> RagResult<Self> {
        Ok(Self {
            embedder,
            store,
            llm,
            input_guard: InputGuard::new(config.max_query_length, &config.injection_phrases)?,
            output_guard: OutputGuard::new(&config.output_scrub_patterns)?,
            top_k: config.top_k,
            temperature: config.temperature,
            max_tokens: config.max_tokens,
            min_relevance_score: config.min_relevance_score,
        })
    }

    /// Answer a question from the indexed chunks.
    pub async fn query(&self, query: RagQuery) -> RagResult<RagResponse> {
        let started = Instant::now();

        if query.text.trim().is_empty() {
            return Err(RagError::EmptyQuery);
        }

        let (question, input_guarded) = self.input_guard.sanitize(&query.text);
        if question.is_empty() {
            return Err(RagError::EmptyQuery);
        }
        if input_guarded {
            debug!("Input guardrail modified query");
        }

        let top_k = query.top_k.unwrap_or(self.top_k);
        let options = GenerationOptions {
            temperature: query.temperature.unwrap_or(self.temperature),
            max_tokens: query.max_tokens.unwrap_or(self.max_tokens),
        };

        let vector = self.embedder.embed(&question).await?;
        let filter = SearchFilter::active().with_path_prefixes(query.file_filters.clone());
        let results = self.store.search(&vector, top_k, &filter).await?;
        let found = results.len();

        let results: Vec<SearchResult> = if self.min_relevance_score > 0.0 {
            results
                .into_iter()
                .filter(|r| r.score >= self.min_relevance_score)
                .collect()
        } else {
            results
        };
        debug!(
            "Retrieved {} chunks, {} above relevance threshold",
            found,
            results.len()
        );

        if results.is_empty() {
            info!("No relevant chunks found, skipping generation");
            return Ok(RagResponse {
                answer: NO_INFORMATION_ANSWER.to_string(),
                sources: Vec::new(),
                meta: self.meta(started, input_guarded, query.conversation_id),
            });
        }

        let user_prompt = build_user_prompt(&question, &results);
        let raw = self
            .llm
            .generate(SYSTEM_PROMPT, &user_prompt, &options)
            .await?;
        let (answer, output_guarded) = self.output_guard.scrub(&raw);
        if output_guarded {
            debug!("Output guardrail scrubbed answer");
        }

        let response = RagResponse {
            answer,
            sources: results.into_iter().map(SourceReference::from).collect(),
            meta: self.meta(
                started,
                input_guarded || output_guarded,
                query.conversation_id,
            ),
        };

        info!(
            "Answered query with {} sources in {}ms",
            response.sources.len(),
            response.meta.latency_ms
        );

        Ok(response)
    }

    fn meta(
        &self,
        started: Instant,
        guardrails_applied: bool,
        conversation_id: Option<String>,
    ) -> ResponseMeta {
        ResponseMeta {
            model: self.llm.model_id().to_string(),
            latency_ms: u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX),
            guardrails_applied,
            conversation_id,
        }
    }
}
