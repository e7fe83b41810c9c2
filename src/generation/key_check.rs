//! Best-effort API key liveness check.
//!
//! A key passing this check can still fail later on quota or scope, and a
//! transient listing failure reports a good key as bad.

use tracing::debug;

use super::backend::{ModelCatalog, ModelDescriptor};

/// Whether any listed model is a Gemini model (case-insensitive).
#[must_use]
pub fn has_gemini_model(models: &[ModelDescriptor]) -> bool {
    models
        .iter()
        .any(|m| m.name.to_lowercase().contains("gemini"))
}

/// List models with `api_key` and report whether a Gemini model is visible.
///
/// Every failure yields `false`.
pub async fn is_valid_key(catalog: &dyn ModelCatalog, api_key: &str) -> bool {
    if api_key.trim().is_empty() {
        return false;
    }

    match catalog.list_models(api_key).await {
        Ok(models) => has_gemini_model(&models),
        Err(e) => {
            debug!("Key check failed: {e}");
            false
        }
    }
}
