//! Task-level entry point: template, validate, submit once.

use std::sync::Arc;

use tracing::{info, warn};

use crate::config::{ConfigResult, GeminiConfig};

use super::backend::{self, BackendKind, Backends, ModelCatalog, TextGenerator};
use super::error::{GenerationError, GenerationResult};
use super::key_check;
use super::task::{GenerationRequest, Lifestyle, SamplingParams};

/// Produces health text from the three fixed templates.
///
/// Each call is fire-once: no retries, no timeout beyond the HTTP client's,
/// no caching.
#[derive(Clone, Debug)]
pub struct GenerationClient {
    backends: Backends,
    max_output_tokens: u32,
}

impl GenerationClient {
    /// Wrap already-selected backends.
    #[must_use]
    pub const fn new(backends: Backends, max_output_tokens: u32) -> Self {
        Self {
            backends,
            max_output_tokens,
        }
    }

    /// Build from explicit generator and catalog implementations.
    #[must_use]
    pub fn with_parts(
        generator: Arc<dyn TextGenerator>,
        catalog: Arc<dyn ModelCatalog>,
        max_output_tokens: u32,
    ) -> Self {
        Self::new(Backends { generator, catalog }, max_output_tokens)
    }

    /// Select backends for `config` and build a client.
    ///
    /// # Errors
    /// Returns an error if no backend can be constructed.
    pub fn from_config(config: &GeminiConfig) -> ConfigResult<Self> {
        let backends = backend::select_backends(config)?;
        Ok(Self::new(backends, config.max_output_tokens))
    }

    /// Adapter in use.
    #[must_use]
    pub fn backend_kind(&self) -> BackendKind {
        self.backends.generator.kind()
    }

    /// Model in use.
    #[must_use]
    pub fn model(&self) -> &str {
        self.backends.generator.model()
    }

    /// Plain-language summary of a health article.
    ///
    /// # Errors
    /// Returns an error on blank input, a missing key or a remote failure.
    pub async fn summarize(&self, article_text: &str, api_key: &str) -> GenerationResult<String> {
        self.generate(&GenerationRequest::summarize(article_text, api_key))
            .await
    }

    /// Answer a health question, optionally grounded on prior context.
    ///
    /// # Errors
    /// Returns an error on blank input, a missing key or a remote failure.
    pub async fn answer(
        &self,
        question: &str,
        context: Option<&str>,
        api_key: &str,
    ) -> GenerationResult<String> {
        self.generate(&GenerationRequest::answer(question, context, api_key))
            .await
    }

    /// Personalized wellness tips.
    ///
    /// # Errors
    /// Returns an error on blank input, a missing key or a remote failure.
    pub async fn tips(
        &self,
        goal: &str,
        lifestyle: Lifestyle,
        conditions: Option<&str>,
        api_key: &str,
    ) -> GenerationResult<String> {
        self.generate(&GenerationRequest::tips(goal, lifestyle, conditions, api_key))
            .await
    }

    /// Validate, render and submit a request.
    ///
    /// # Errors
    /// Returns an error on blank input, a missing key or a remote failure.
    pub async fn generate(&self, request: &GenerationRequest) -> GenerationResult<String> {
        if request.is_blank() {
            return Err(GenerationError::EmptyInput {
                field: request.task.input_label(),
            });
        }
        if request.api_key.trim().is_empty() {
            return Err(GenerationError::MissingKey);
        }

        let generator = &self.backends.generator;
        let params = SamplingParams::for_task(request.task, self.max_output_tokens);
        let prompt = request.prompt();

        info!(
            "Generating {} via {} backend ({})",
            request.task,
            generator.kind(),
            generator.model()
        );

        generator
            .generate(&request.api_key, &prompt, params)
            .await
            .and_then(backend::require_text)
            .inspect_err(|e| warn!("Generation of {} failed: {e}", request.task))
    }

    /// Advisory key check; see [`key_check::is_valid_key`].
    pub async fn is_valid_key(&self, api_key: &str) -> bool {
        key_check::is_valid_key(self.backends.catalog.as_ref(), api_key).await
    }
}
