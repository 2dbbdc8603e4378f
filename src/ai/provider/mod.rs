//! Model Provider Abstraction
//!
//! Defines the `ExtractionProvider` capability: one model call that turns a
//! `ModelPayload` into raw text. Validation and post-processing never see
//! which vendor produced the text.
//!
//! A provider performs exactly one attempt per `generate` call. Retries,
//! backoff and per-attempt timeouts live in `ai::retry`.

mod gemini;
mod mock;
mod openai;

pub use gemini::GeminiProvider;
pub use mock::{MockOutcome, MockProvider};
pub use openai::OpenAiProvider;

pub use crate::types::{ErrorCategory, ErrorClassifier, LlmError};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;

use super::prompt::ModelPayload;
use crate::constants::network as net_constants;
use crate::types::{Result, ScribeError};

// =============================================================================
// Raw Model Output with Usage Metrics
// =============================================================================

/// Unvalidated model output plus call metrics
#[derive(Debug, Clone)]
pub struct RawModelOutput {
    /// Text exactly as returned by the model
    pub text: String,
    pub usage: TokenUsage,
    pub timing: ResponseTiming,
    pub metadata: ResponseMetadata,
}

impl RawModelOutput {
    /// Create output with text only (usage unknown)
    pub fn text_only(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            usage: TokenUsage::default(),
            timing: ResponseTiming::default(),
            metadata: ResponseMetadata::default(),
        }
    }
}

/// Token usage metrics
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TokenUsage {
    pub input_tokens: u32,
    pub output_tokens: u32,
}

impl TokenUsage {
    pub fn total(&self) -> u32 {
        self.input_tokens + self.output_tokens
    }
}

/// Response timing metrics
#[derive(Debug, Clone, Default)]
pub struct ResponseTiming {
    /// Total response time in milliseconds (wall clock)
    pub total_ms: u64,
}

impl ResponseTiming {
    pub fn from_duration(duration: Duration) -> Self {
        Self {
            total_ms: duration.as_millis() as u64,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct ResponseMetadata {
    pub model: String,
    pub provider: String,
}

/// Shared provider handle, constructed once at start-up and injected.
pub type SharedProvider = Arc<dyn ExtractionProvider>;

// =============================================================================
// Provider Configuration
// =============================================================================

/// Configuration for model providers
///
/// API keys are never serialized and are redacted in debug output.
#[derive(Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    /// Provider type: "gemini", "openai", "mock"
    pub provider: String,
    /// Model name (provider-specific)
    pub model: Option<String>,
    /// Per-attempt timeout in seconds
    pub timeout_secs: u64,
    /// Temperature for generation (low keeps extraction deterministic)
    pub temperature: f32,
    #[serde(default, skip_serializing)]
    pub api_key: Option<String>,
    /// API base URL (for custom endpoints)
    #[serde(default)]
    pub api_base: Option<String>,
    #[serde(default = "default_max_tokens")]
    pub max_tokens: usize,
}

impl std::fmt::Debug for ProviderConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderConfig")
            .field("provider", &self.provider)
            .field("model", &self.model)
            .field("timeout_secs", &self.timeout_secs)
            .field("temperature", &self.temperature)
            .field("api_key", &self.api_key.as_ref().map(|_| "[REDACTED]"))
            .field("api_base", &self.api_base)
            .field("max_tokens", &self.max_tokens)
            .finish()
    }
}

fn default_max_tokens() -> usize {
    1024
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            provider: "gemini".to_string(),
            model: None,
            timeout_secs: net_constants::DEFAULT_TIMEOUT_SECS,
            temperature: 0.1,
            api_key: None,
            api_base: None,
            max_tokens: default_max_tokens(),
        }
    }
}

// =============================================================================
// Provider Trait
// =============================================================================

/// One model call: payload in, raw text out
#[async_trait]
pub trait ExtractionProvider: Send + Sync {
    /// Run a single attempt. Failures carry an `ErrorCategory` so the retry
    /// loop can tell transient from permanent errors.
    async fn generate(&self, payload: &ModelPayload) -> Result<RawModelOutput>;

    /// Provider name for logging
    fn name(&self) -> &str;

    /// Model name currently in use
    fn model(&self) -> &str;

    /// Check if the provider is reachable with the configured credentials
    async fn health_check(&self) -> Result<bool>;
}

/// Create a shared provider from configuration
pub fn create_provider(config: &ProviderConfig) -> Result<SharedProvider> {
    match config.provider.as_str() {
        "gemini" => Ok(Arc::new(GeminiProvider::new(config.clone())?)),
        "openai" => Ok(Arc::new(OpenAiProvider::new(config.clone())?)),
        "mock" => Ok(Arc::new(MockProvider::echo_text())),
        _ => Err(ScribeError::Config(format!(
            "Unknown provider: {}. Supported: gemini, openai, mock",
            config.provider
        ))),
    }
}

/// Build the shared HTTP client used by the remote providers
pub(crate) fn http_client(config: &ProviderConfig) -> Result<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(Duration::from_secs(config.timeout_secs))
        .connect_timeout(Duration::from_secs(net_constants::CONNECTION_TIMEOUT_SECS))
        .build()
        .map_err(|e| ScribeError::Config(format!("Failed to create HTTP client: {}", e)))
}

/// Parse a Retry-After header given in seconds
pub(crate) fn retry_after_header(headers: &reqwest::header::HeaderMap) -> Option<Duration> {
    headers
        .get(reqwest::header::RETRY_AFTER)?
        .to_str()
        .ok()?
        .trim()
        .parse::<u64>()
        .ok()
        .map(|secs| Duration::from_secs(secs.min(300)))
}

/// Validate an API base URL and strip the trailing slash
pub(crate) fn normalize_endpoint(endpoint: &str, provider: &str) -> Result<String> {
    let url = url::Url::parse(endpoint).map_err(|e| {
        ScribeError::Config(format!(
            "Invalid {} endpoint URL '{}': {}",
            provider, endpoint, e
        ))
    })?;

    if !matches!(url.scheme(), "http" | "https") {
        return Err(ScribeError::Config(format!(
            "{} endpoint must use http or https scheme, got: {}",
            provider,
            url.scheme()
        )));
    }

    let mut result = url.to_string();
    if result.ends_with('/') {
        result.pop();
    }
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_provider_config_debug_redacts_key() {
        let config = ProviderConfig {
            api_key: Some("sk-very-secret".to_string()),
            ..Default::default()
        };
        let shown = format!("{:?}", config);
        assert!(shown.contains("[REDACTED]"));
        assert!(!shown.contains("sk-very-secret"));
    }

    #[test]
    fn test_provider_config_never_serializes_key() {
        let config = ProviderConfig {
            api_key: Some("sk-very-secret".to_string()),
            ..Default::default()
        };
        let json = serde_json::to_string(&config).unwrap();
        assert!(!json.contains("sk-very-secret"));
    }

    #[test]
    fn test_create_unknown_provider() {
        let config = ProviderConfig {
            provider: "carrier-pigeon".to_string(),
            ..Default::default()
        };
        assert!(matches!(
            create_provider(&config),
            Err(ScribeError::Config(_))
        ));
    }

    #[test]
    fn test_create_mock_provider() {
        let config = ProviderConfig {
            provider: "mock".to_string(),
            ..Default::default()
        };
        let provider = create_provider(&config).unwrap();
        assert_eq!(provider.name(), "mock");
    }

    #[test]
    fn test_normalize_endpoint() {
        assert_eq!(
            normalize_endpoint("https://example.com/v1/", "openai").unwrap(),
            "https://example.com/v1"
        );
        assert!(normalize_endpoint("ftp://example.com", "openai").is_err());
        assert!(normalize_endpoint("not a url", "openai").is_err());
    }

    #[test]
    fn test_retry_after_header() {
        let mut headers = reqwest::header::HeaderMap::new();
        headers.insert(reqwest::header::RETRY_AFTER, "7".parse().unwrap());
        assert_eq!(retry_after_header(&headers), Some(Duration::from_secs(7)));

        headers.insert(reqwest::header::RETRY_AFTER, "soon".parse().unwrap());
        assert_eq!(retry_after_header(&headers), None);
    }

    #[test]
    fn test_token_usage_total() {
        let usage = TokenUsage {
            input_tokens: 100,
            output_tokens: 20,
        };
        assert_eq!(usage.total(), 120);
    }
}
