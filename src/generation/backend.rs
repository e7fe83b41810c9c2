//! Backend seam: one interface, two adapters, chosen once at startup.

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::config::{BackendPreference, ConfigError, ConfigResult, GeminiConfig};

use super::error::{GenerationError, GenerationResult};
use super::rest::GeminiRestClient;
use super::task::SamplingParams;

/// Which adapter produced a piece of text.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BackendKind {
    /// rig-core Gemini provider.
    Wrapped,
    /// Direct REST calls.
    Raw,
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Wrapped => write!(f, "wrapped"),
            Self::Raw => write!(f, "raw"),
        }
    }
}

/// Turns a filled prompt into generated text.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    /// Adapter identity, for logs and status output.
    fn kind(&self) -> BackendKind;

    /// Model identifier requests are sent to.
    fn model(&self) -> &str;

    /// Submit `prompt` once and return the generated text verbatim.
    async fn generate(
        &self,
        api_key: &str,
        prompt: &str,
        params: SamplingParams,
    ) -> GenerationResult<String>;
}

/// Reject generated text that is empty or whitespace-only.
///
/// Every generation passes through here so a reply without content is never
/// mistaken for a successful one.
///
/// # Errors
/// Returns [`GenerationError::Unknown`] when `text` has no visible content.
pub fn require_text(text: String) -> GenerationResult<String> {
    if text.trim().is_empty() {
        return Err(GenerationError::empty_response("no text in reply"));
    }
    Ok(text)
}

/// One entry of a model listing.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelDescriptor {
    /// Model identifier, e.g. `models/gemini-pro`.
    pub name: String,
}

impl ModelDescriptor {
    /// Descriptor with the given name.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

/// Lists the models visible to a key.
#[async_trait]
pub trait ModelCatalog: Send + Sync {
    /// List models available for `api_key`.
    async fn list_models(&self, api_key: &str) -> GenerationResult<Vec<ModelDescriptor>>;
}

/// The selected generator plus the catalog used for key checks.
#[derive(Clone)]
pub struct Backends {
    /// Generator used for every task.
    pub generator: Arc<dyn TextGenerator>,
    /// Catalog used by the advisory key check.
    pub catalog: Arc<dyn ModelCatalog>,
}

impl fmt::Debug for Backends {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Backends")
            .field("generator", &self.generator.kind())
            .field("model", &self.generator.model())
            .finish_non_exhaustive()
    }
}

/// Whether the wrapped adapter was compiled into this build.
#[must_use]
pub const fn wrapped_available() -> bool {
    cfg!(feature = "rig")
}

/// Pick the generator according to `config.backend`.
///
/// `Auto` probes the wrapped adapter and falls back to raw REST calls when it
/// is missing from the build or cannot be constructed.
///
/// # Errors
/// Returns an error if the REST client cannot be built, or if the wrapped
/// adapter is forced but unavailable.
pub fn select_backends(config: &GeminiConfig) -> ConfigResult<Backends> {
    let rest = Arc::new(GeminiRestClient::new(config.clone())?);
    let catalog: Arc<dyn ModelCatalog> = rest.clone();
    let raw: Arc<dyn TextGenerator> = rest;

    let generator: Arc<dyn TextGenerator> = match config.backend {
        BackendPreference::Raw => raw,
        BackendPreference::Wrapped => probe_wrapped(config)?.ok_or_else(|| {
            ConfigError::Invalid(
                "wrapped backend requested but the `rig` feature is disabled".to_string(),
            )
        })?,
        BackendPreference::Auto => match probe_wrapped(config) {
            Ok(Some(wrapped)) => wrapped,
            Ok(None) => {
                tracing::info!("Wrapped Gemini client not compiled in, using raw REST calls");
                raw
            }
            Err(e) => {
                tracing::warn!("Wrapped Gemini client unavailable ({e}), using raw REST calls");
                raw
            }
        },
    };

    tracing::info!(
        "Generation backend: {} (model {})",
        generator.kind(),
        generator.model()
    );

    Ok(Backends { generator, catalog })
}

#[cfg(feature = "rig")]
fn probe_wrapped(config: &GeminiConfig) -> ConfigResult<Option<Arc<dyn TextGenerator>>> {
    let wrapped = super::rig_adapter::RigGeminiGenerator::probe(config.clone())?;
    Ok(Some(Arc::new(wrapped)))
}

#[cfg(not(feature = "rig"))]
#[allow(clippy::unnecessary_wraps)]
fn probe_wrapped(_config: &GeminiConfig) -> ConfigResult<Option<Arc<dyn TextGenerator>>> {
    Ok(None)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generation::client::GenerationClient;
    use crate::generation::error::ErrorKind;
    use crate::generation::mock_server::{self, MockReply};
    use serde_json::json;

    #[test]
    fn test_raw_preference_always_raw() {
        let config = GeminiConfig {
            backend: BackendPreference::Raw,
            ..GeminiConfig::default()
        };
        let backends = select_backends(&config);
        assert!(backends.is_ok());
        if let Ok(backends) = backends {
            assert_eq!(backends.generator.kind(), BackendKind::Raw);
            assert_eq!(backends.generator.model(), config.model);
        }
    }

    #[test]
    fn test_auto_matches_build_capabilities() {
        let backends = select_backends(&GeminiConfig::default());
        assert!(backends.is_ok());
        if let Ok(backends) = backends {
            let expected = if wrapped_available() {
                BackendKind::Wrapped
            } else {
                BackendKind::Raw
            };
            assert_eq!(backends.generator.kind(), expected);
        }
    }

    #[test]
    fn test_forced_wrapped_follows_feature() {
        let config = GeminiConfig {
            backend: BackendPreference::Wrapped,
            ..GeminiConfig::default()
        };
        assert_eq!(select_backends(&config).is_ok(), wrapped_available());
    }

    fn available_preferences() -> Vec<BackendPreference> {
        let mut preferences = vec![BackendPreference::Raw];
        if wrapped_available() {
            preferences.push(BackendPreference::Wrapped);
        }
        preferences
    }

    async fn summarize_with_each(reply: MockReply) -> Vec<Result<String, (ErrorKind, String)>> {
        let mock = mock_server::spawn(reply, vec!["models/gemini-pro"]).await;

        let mut outputs = Vec::new();
        for backend in available_preferences() {
            let config = GeminiConfig {
                base_url: mock.base_url.clone(),
                backend,
                ..GeminiConfig::default()
            };
            let Ok(client) = GenerationClient::from_config(&config) else {
                panic!("backend {backend:?} should build");
            };
            let result = client
                .summarize("Fiber helps digestion.", "test-key")
                .await
                .map_err(|e| (e.kind(), e.to_string()));
            outputs.push(result);
        }
        assert_eq!(mock.requests().len(), outputs.len());
        outputs
    }

    #[tokio::test]
    async fn test_adapters_return_identical_text() {
        let reply = MockReply::Text("Eat more fiber and stay hydrated.");
        let outputs = summarize_with_each(reply).await;
        for output in &outputs {
            assert_eq!(output.as_deref(), Ok("Eat more fiber and stay hydrated."));
        }
    }

    #[tokio::test]
    async fn test_adapters_agree_on_replies_without_text() {
        let bodies = [
            json!({
                "candidates": [{
                    "content": {"role": "model"},
                    "finishReason": "MAX_TOKENS",
                    "index": 0
                }],
                "usageMetadata": {"promptTokenCount": 12, "totalTokenCount": 2060},
                "modelVersion": "gemini-2.5-flash",
                "responseId": "r"
            }),
            json!({
                "promptFeedback": {"blockReason": "SAFETY"},
                "usageMetadata": {"promptTokenCount": 12, "totalTokenCount": 12},
                "modelVersion": "gemini-2.5-flash"
            }),
            json!({
                "candidates": [{
                    "content": {"role": "model", "parts": [{"text": ""}]},
                    "finishReason": "STOP",
                    "index": 0
                }],
                "modelVersion": "gemini-2.5-flash"
            }),
        ];

        for body in bodies {
            let outputs = summarize_with_each(MockReply::Body(body.clone())).await;
            for output in outputs {
                let Err((kind, message)) = output else {
                    panic!("reply without text must fail: {body}");
                };
                assert_eq!(kind, ErrorKind::Unknown);
                assert!(message.starts_with("empty response:"), "{message}");
            }
        }
    }
}
