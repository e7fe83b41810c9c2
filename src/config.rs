//! Configuration for the health assistant server and Gemini backends.

use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use url::Url;

use crate::generation::task::DEFAULT_MAX_OUTPUT_TOKENS;

/// Environment variable for the HTTP port.
pub const PORT_ENV: &str = "HEALTH_ASSISTANT_PORT";
/// Environment variable for the static UI directory.
pub const STATIC_DIR_ENV: &str = "HEALTH_ASSISTANT_STATIC_DIR";
/// Environment variable for the Gemini model name.
pub const MODEL_ENV: &str = "HEALTH_ASSISTANT_MODEL";
/// Environment variable for a custom Gemini endpoint (e.g. a proxy).
pub const GEMINI_URL_ENV: &str = "HEALTH_ASSISTANT_GEMINI_URL";
/// Environment variable selecting the backend (`auto`, `wrapped`, `raw`).
pub const BACKEND_ENV: &str = "HEALTH_ASSISTANT_BACKEND";
/// Environment variable for the output token budget.
pub const MAX_OUTPUT_TOKENS_ENV: &str = "HEALTH_ASSISTANT_MAX_OUTPUT_TOKENS";
/// Environment variable for session idle expiry in seconds.
pub const SESSION_TTL_ENV: &str = "HEALTH_ASSISTANT_SESSION_TTL_SECS";
/// Environment variable seeding the API key of new sessions.
pub const API_KEY_ENV: &str = "GEMINI_API_KEY";

/// Default server port.
pub const DEFAULT_PORT: u16 = 3000;
/// Default Gemini REST endpoint.
pub const DEFAULT_GEMINI_URL: &str = "https://generativelanguage.googleapis.com";
/// Default Gemini model.
pub const DEFAULT_MODEL: &str = "gemini-2.5-flash";

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A value is out of range or malformed.
    #[error("invalid configuration: {0}")]
    Invalid(String),
    /// URL parse error.
    #[error("url parse error: {0}")]
    Url(#[from] url::ParseError),
    /// HTTP client could not be built.
    #[error("http client error: {0}")]
    HttpClient(#[from] reqwest::Error),
}

/// Convenience result alias for configuration.
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Top-level configuration.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct AssistantConfig {
    /// HTTP server settings.
    pub server: ServerConfig,
    /// Gemini backend settings.
    pub gemini: GeminiConfig,
    /// Session store settings.
    pub session: SessionConfig,
}

impl AssistantConfig {
    /// Create a config with default settings.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a config from defaults overridden by environment variables.
    ///
    /// # Errors
    /// Returns an error if a variable is set to an unparsable value.
    pub fn from_env() -> ConfigResult<Self> {
        let mut config = Self::default();

        if let Some(port) = env_parse::<u16>(PORT_ENV)? {
            config.server.port = port;
        }
        if let Ok(dir) = std::env::var(STATIC_DIR_ENV) {
            config.server.static_dir = PathBuf::from(dir);
        }
        if let Ok(model) = std::env::var(MODEL_ENV) {
            config.gemini.model = model;
        }
        if let Ok(base_url) = std::env::var(GEMINI_URL_ENV) {
            config.gemini.base_url = base_url;
        }
        if let Some(backend) = env_parse::<BackendPreference>(BACKEND_ENV)? {
            config.gemini.backend = backend;
        }
        if let Some(tokens) = env_parse::<u32>(MAX_OUTPUT_TOKENS_ENV)? {
            config.gemini.max_output_tokens = tokens;
        }
        if let Some(ttl) = env_parse::<u64>(SESSION_TTL_ENV)? {
            config.session.idle_ttl_seconds = ttl;
        }
        config.session.default_api_key = std::env::var(API_KEY_ENV)
            .ok()
            .filter(|key| !key.trim().is_empty());

        config.validate()?;
        Ok(config)
    }

    /// Set the server port.
    #[must_use]
    pub const fn with_port(mut self, port: u16) -> Self {
        self.server.port = port;
        self
    }

    /// Set the Gemini endpoint.
    #[must_use]
    pub fn with_gemini_url(mut self, base_url: impl Into<String>) -> Self {
        self.gemini.base_url = base_url.into();
        self
    }

    /// Force a backend.
    #[must_use]
    pub const fn with_backend(mut self, backend: BackendPreference) -> Self {
        self.gemini.backend = backend;
        self
    }

    /// Validate configuration invariants.
    ///
    /// # Errors
    /// Returns an error if any values are out of range or invalid.
    pub fn validate(&self) -> ConfigResult<()> {
        self.gemini.validate()?;

        if self.session.idle_ttl_seconds == 0 {
            return Err(ConfigError::Invalid(
                "session.idle_ttl_seconds must be > 0".to_string(),
            ));
        }

        Ok(())
    }
}

/// HTTP server settings.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Listening port.
    pub port: u16,
    /// Directory holding the static UI.
    pub static_dir: PathBuf,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            static_dir: PathBuf::from("static"),
        }
    }
}

/// Which client adapter talks to Gemini.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BackendPreference {
    /// Wrapped client when available, raw REST otherwise.
    #[default]
    Auto,
    /// Always the wrapped chat client.
    Wrapped,
    /// Always raw REST calls.
    Raw,
}

impl FromStr for BackendPreference {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "auto" => Ok(Self::Auto),
            "wrapped" | "rig" => Ok(Self::Wrapped),
            "raw" | "rest" => Ok(Self::Raw),
            other => Err(ConfigError::Invalid(format!("unknown backend: {other}"))),
        }
    }
}

/// Gemini backend settings.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct GeminiConfig {
    /// REST endpoint, without the `/v1beta` suffix.
    pub base_url: String,
    /// Model used for every task.
    pub model: String,
    /// Output token budget per call.
    pub max_output_tokens: u32,
    /// Adapter selection.
    pub backend: BackendPreference,
    /// Connection timeout.
    #[serde(with = "duration_serde")]
    pub connect_timeout: Duration,
}

impl Default for GeminiConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_GEMINI_URL.to_string(),
            model: DEFAULT_MODEL.to_string(),
            max_output_tokens: DEFAULT_MAX_OUTPUT_TOKENS,
            backend: BackendPreference::Auto,
            connect_timeout: Duration::from_secs(10),
        }
    }
}

impl GeminiConfig {
    /// Validate the Gemini settings.
    ///
    /// # Errors
    /// Returns an error on a malformed URL, an empty model or a zero budget.
    pub fn validate(&self) -> ConfigResult<()> {
        Url::parse(&self.base_url)?;

        if self.model.trim().is_empty() {
            return Err(ConfigError::Invalid("gemini.model must not be empty".to_string()));
        }

        if self.max_output_tokens == 0 {
            return Err(ConfigError::Invalid(
                "gemini.max_output_tokens must be > 0".to_string(),
            ));
        }

        Ok(())
    }

    /// Base URL without a trailing slash.
    #[must_use]
    pub fn endpoint(&self) -> &str {
        self.base_url.trim_end_matches('/')
    }
}

/// Session store settings.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Sessions idle for longer than this are discarded.
    pub idle_ttl_seconds: u64,
    /// API key pre-filled into new sessions.
    #[serde(skip_serializing)]
    pub default_api_key: Option<String>,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            idle_ttl_seconds: 3600,
            default_api_key: None,
        }
    }
}

fn env_parse<T>(name: &str) -> ConfigResult<Option<T>>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    let Ok(raw) = std::env::var(name) else {
        return Ok(None);
    };
    raw.trim()
        .parse::<T>()
        .map(Some)
        .map_err(|e| ConfigError::Invalid(format!("{name}: {e}")))
}

/// Serde module for Duration serialization.
mod duration_serde {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        duration.as_secs().serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let secs = u64::deserialize(deserializer)?;
        Ok(Duration::from_secs(secs))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AssistantConfig::default();
        assert_eq!(config.server.port, DEFAULT_PORT);
        assert_eq!(config.gemini.model, DEFAULT_MODEL);
        assert_eq!(config.gemini.backend, BackendPreference::Auto);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_builder() {
        let config = AssistantConfig::new()
            .with_port(8080)
            .with_gemini_url("http://127.0.0.1:9999/")
            .with_backend(BackendPreference::Raw);

        assert_eq!(config.server.port, 8080);
        assert_eq!(config.gemini.endpoint(), "http://127.0.0.1:9999");
        assert_eq!(config.gemini.backend, BackendPreference::Raw);
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let config = AssistantConfig::new().with_gemini_url("not a url");
        assert!(matches!(config.validate(), Err(ConfigError::Url(_))));

        let mut config = AssistantConfig::new();
        config.gemini.max_output_tokens = 0;
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));

        let mut config = AssistantConfig::new();
        config.session.idle_ttl_seconds = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_backend_preference_parse() {
        assert_eq!("AUTO".parse::<BackendPreference>().ok(), Some(BackendPreference::Auto));
        assert_eq!("rig".parse::<BackendPreference>().ok(), Some(BackendPreference::Wrapped));
        assert_eq!("rest".parse::<BackendPreference>().ok(), Some(BackendPreference::Raw));
        assert!("grpc".parse::<BackendPreference>().is_err());
    }
}
