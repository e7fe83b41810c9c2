//! Wrapped adapter: Gemini through the rig-core chat client.

use async_trait::async_trait;
use reqwest::Client as ReqwestClient;
use rig::client::CompletionClient;
use rig::completion::{CompletionError, CompletionModel};
use rig::message::AssistantContent;
use rig::providers::gemini;
use tracing::debug;

use crate::config::{ConfigError, ConfigResult, GeminiConfig};

use super::backend::{BackendKind, TextGenerator};
use super::error::{GenerationError, GenerationResult};
use super::task::SamplingParams;

/// Placeholder key used only to check that a client can be built.
const PROBE_KEY: &str = "capability-probe";

/// Gemini generator backed by rig's provider client.
///
/// A client is built per call because the key belongs to the caller.
#[derive(Clone, Debug)]
pub struct RigGeminiGenerator {
    config: GeminiConfig,
}

impl RigGeminiGenerator {
    /// Check that the wrapped client can be constructed for `config`.
    ///
    /// # Errors
    /// Returns an error if the provider client cannot be built.
    pub fn probe(config: GeminiConfig) -> ConfigResult<Self> {
        build_client(&config, PROBE_KEY)
            .map_err(|e| ConfigError::Invalid(format!("gemini client: {e}")))?;
        Ok(Self { config })
    }
}

fn build_client(
    config: &GeminiConfig,
    api_key: &str,
) -> Result<gemini::Client<ReqwestClient>, rig::http_client::Error> {
    gemini::Client::<ReqwestClient>::builder()
        .api_key(api_key)
        .base_url(config.endpoint())
        .build()
}

#[async_trait]
impl TextGenerator for RigGeminiGenerator {
    fn kind(&self) -> BackendKind {
        BackendKind::Wrapped
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
        let client = build_client(&self.config, api_key)
            .map_err(|e| GenerationError::from_message(e.to_string()))?;
        let model = client.completion_model(self.config.model.clone());

        debug!(
            "rig completion: {} prompt chars, temperature {}",
            prompt.chars().count(),
            params.temperature
        );

        let request = model
            .completion_request(prompt.to_string())
            .temperature(params.temperature)
            .max_tokens(u64::from(params.max_output_tokens))
            .build();

        let response = model.completion(request).await.map_err(map_completion_error)?;

        Ok(extract_text(&response.choice))
    }
}

/// A reply rig cannot decode into text (no candidates, no parts) is an empty
/// response, the same outcome the REST adapter reports for that body.
fn map_completion_error(err: CompletionError) -> GenerationError {
    match err {
        CompletionError::ResponseError(message) => GenerationError::empty_response(message),
        CompletionError::JsonError(e) => GenerationError::empty_response(e),
        other => GenerationError::from_message(other.to_string()),
    }
}

fn extract_text(choice: &rig::OneOrMany<AssistantContent>) -> String {
    let mut out = String::new();
    for content in choice.iter() {
        if let AssistantContent::Text(text) = content {
            out.push_str(&text.text);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generation::error::ErrorKind;

    #[test]
    fn test_probe_builds_client() {
        let generator = RigGeminiGenerator::probe(GeminiConfig::default());
        assert!(generator.is_ok());
        if let Ok(generator) = generator {
            assert_eq!(generator.kind(), BackendKind::Wrapped);
            assert_eq!(generator.model(), "gemini-2.5-flash");
        }
    }

    #[test]
    fn test_undecodable_reply_is_empty_response() {
        let err = map_completion_error(CompletionError::ResponseError(
            "Response contained no message or tool call (empty)".to_string(),
        ));
        assert_eq!(err.kind(), ErrorKind::Unknown);
        assert!(err.to_string().starts_with("empty response:"));

        let err = map_completion_error(CompletionError::ProviderError(
            "429 RESOURCE_EXHAUSTED".to_string(),
        ));
        assert_eq!(err.kind(), ErrorKind::QuotaOrAuth);
    }
}
