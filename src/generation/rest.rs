//! Raw REST adapter for the Gemini API.
//!
//! Used when the wrapped client is not compiled in (or is forced off), and
//! always used for model listing.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use crate::config::{ConfigResult, GeminiConfig};

use super::backend::{BackendKind, ModelCatalog, ModelDescriptor, TextGenerator, require_text};
use super::error::{GenerationError, GenerationResult};
use super::task::SamplingParams;

/// Header carrying the API key.
const API_KEY_HEADER: &str = "x-goog-api-key";

/// Upper bound on followed listing pages.
const MAX_LIST_PAGES: usize = 20;

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest<'a> {
    contents: Vec<RequestContent<'a>>,
    generation_config: GenerationConfig,
}

#[derive(Serialize)]
struct RequestContent<'a> {
    role: &'a str,
    parts: Vec<RequestPart<'a>>,
}

#[derive(Serialize)]
struct RequestPart<'a> {
    text: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    temperature: f64,
    max_output_tokens: u32,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ListModelsResponse {
    #[serde(default)]
    models: Vec<ModelDescriptor>,
    #[serde(default)]
    next_page_token: Option<String>,
}

/// Shape of a generation response, resolved by an explicit extraction rule.
///
/// Output-style fields win over text-style fields. A Gemini reply that carries
/// neither (blocked prompt, candidate without parts) is `Empty`; any other
/// payload is kept and stringified.
#[derive(Clone, Debug, PartialEq)]
pub enum RawResponse {
    /// An `output` field (legacy text endpoints).
    Output(String),
    /// A `text` field, or the concatenated text parts of the first candidate.
    Text(String),
    /// A Gemini reply without text, with the finish or block reason.
    Empty(String),
    /// Neither field was present.
    Opaque(Value),
}

impl RawResponse {
    /// Classify a decoded response body.
    #[must_use]
    pub fn from_value(value: Value) -> Self {
        let candidate = value.get("candidates").and_then(|c| c.get(0));

        let output = value
            .get("output")
            .or_else(|| candidate.and_then(|c| c.get("output")))
            .and_then(Value::as_str);
        if let Some(output) = output {
            return Self::Output(output.to_string());
        }

        if let Some(text) = value.get("text").and_then(Value::as_str) {
            return Self::Text(text.to_string());
        }

        let parts = candidate
            .and_then(|c| c.get("content"))
            .and_then(|c| c.get("parts"))
            .and_then(Value::as_array);
        if let Some(parts) = parts {
            let texts: Vec<&str> = parts
                .iter()
                .filter_map(|p| p.get("text").and_then(Value::as_str))
                .collect();
            if !texts.is_empty() {
                return Self::Text(texts.concat());
            }
        }

        let block_reason = value
            .get("promptFeedback")
            .and_then(|f| f.get("blockReason"))
            .and_then(Value::as_str);
        if let Some(reason) = block_reason {
            return Self::Empty(format!("prompt blocked ({reason})"));
        }
        if let Some(candidate) = candidate {
            let reason = candidate
                .get("finishReason")
                .and_then(Value::as_str)
                .unwrap_or("unspecified");
            return Self::Empty(format!("finish reason {reason}"));
        }
        if value.get("candidates").and_then(Value::as_array).is_some() {
            return Self::Empty("no candidates".to_string());
        }

        Self::Opaque(value)
    }

    /// The text to hand back to callers.
    ///
    /// # Errors
    /// Returns [`GenerationError::Unknown`] for replies without text.
    pub fn into_result(self) -> GenerationResult<String> {
        match self {
            Self::Output(text) | Self::Text(text) => require_text(text),
            Self::Empty(reason) => Err(GenerationError::empty_response(reason)),
            Self::Opaque(value) => Ok(value.to_string()),
        }
    }
}

/// Gemini client speaking the REST API directly.
#[derive(Clone, Debug)]
pub struct GeminiRestClient {
    client: Client,
    config: GeminiConfig,
}

impl GeminiRestClient {
    /// Create a client for the configured endpoint.
    ///
    /// # Errors
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(config: GeminiConfig) -> ConfigResult<Self> {
        let client = Client::builder()
            .connect_timeout(config.connect_timeout)
            .gzip(true)
            .brotli(true)
            .deflate(true)
            .build()?;
        Ok(Self { client, config })
    }

    fn generate_url(&self) -> String {
        format!(
            "{}/v1beta/models/{}:generateContent",
            self.config.endpoint(),
            self.config.model.trim_start_matches("models/")
        )
    }

    fn models_url(&self) -> String {
        format!("{}/v1beta/models", self.config.endpoint())
    }

    async fn post_generate(
        &self,
        api_key: &str,
        prompt: &str,
        params: SamplingParams,
    ) -> GenerationResult<Value> {
        let request = GenerateContentRequest {
            contents: vec![RequestContent {
                role: "user",
                parts: vec![RequestPart { text: prompt }],
            }],
            generation_config: GenerationConfig {
                temperature: params.temperature,
                max_output_tokens: params.max_output_tokens,
            },
        };

        let response = self
            .client
            .post(self.generate_url())
            .header(API_KEY_HEADER, api_key)
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(GenerationError::from_status(status, &body));
        }

        Ok(response.json::<Value>().await?)
    }
}

#[async_trait]
impl TextGenerator for GeminiRestClient {
    fn kind(&self) -> BackendKind {
        BackendKind::Raw
    }

    fn model(&self) -> &str {
        &self.config.model
    }

    async fn generate(
        &self,
        api_key: &str,
        prompt: &str,
        params: SamplingParams,
    ) -> GenerationResult<String> {
        debug!(
            "REST generateContent: {} prompt chars, temperature {}",
            prompt.chars().count(),
            params.temperature
        );
        let body = self.post_generate(api_key, prompt, params).await?;
        RawResponse::from_value(body).into_result()
    }
}

#[async_trait]
impl ModelCatalog for GeminiRestClient {
    async fn list_models(&self, api_key: &str) -> GenerationResult<Vec<ModelDescriptor>> {
        let mut models = Vec::new();
        let mut page_token: Option<String> = None;

        for _ in 0..MAX_LIST_PAGES {
            let mut request = self
                .client
                .get(self.models_url())
                .header(API_KEY_HEADER, api_key);
            if let Some(token) = &page_token {
                request = request.query(&[("pageToken", token.as_str())]);
            }

            let response = request.send().await?;
            let status = response.status();
            if !status.is_success() {
                let body = response.text().await.unwrap_or_default();
                return Err(GenerationError::from_status(status, &body));
            }

            let page: ListModelsResponse = response.json().await?;
            models.extend(page.models);

            let Some(token) = page.next_page_token.filter(|t| !t.is_empty()) else {
                break;
            };
            page_token = Some(token);
        }

        debug!("Listed {} models", models.len());
        Ok(models)
    }
}
