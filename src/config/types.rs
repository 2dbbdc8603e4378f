//! Configuration Types
//!
//! All configuration structures with sensible defaults.
//! Supports global and project (.expense-scribe/) level configuration.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

use crate::ai::{ProviderConfig, RetryPolicy};
use crate::constants::{
    input as input_constants, ledger as ledger_constants, network as net_constants,
    retry as retry_constants,
};
use crate::types::{RecordDefaults, Result, ScribeError};

/// Root configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Configuration version
    pub version: String,

    /// Model provider settings
    pub llm: LlmConfig,

    /// Retry policy for model calls
    pub retry: RetryConfig,

    /// Values for fields the model leaves out
    pub defaults: RecordDefaults,

    /// Ledger location and summary size
    pub ledger: LedgerConfig,

    /// Attachment limits
    pub input: InputConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            version: "1.0".to_string(),
            llm: LlmConfig::default(),
            retry: RetryConfig::default(),
            defaults: RecordDefaults::default(),
            ledger: LedgerConfig::default(),
            input: InputConfig::default(),
        }
    }
}

impl Config {
    /// Validate configuration values are within acceptable ranges.
    /// Returns `ScribeError::Config` on validation failure.
    pub fn validate(&self) -> Result<()> {
        if !(0.0..=2.0).contains(&self.llm.temperature) {
            return Err(ScribeError::Config(format!(
                "LLM temperature must be between 0.0 and 2.0, got {}",
                self.llm.temperature
            )));
        }

        if self.llm.timeout_secs == 0 {
            return Err(ScribeError::Config(
                "LLM timeout_secs must be greater than 0".to_string(),
            ));
        }

        if self.llm.max_tokens == 0 {
            return Err(ScribeError::Config(
                "LLM max_tokens must be greater than 0".to_string(),
            ));
        }

        if self.retry.max_attempts == 0 {
            return Err(ScribeError::Config(
                "Retry max_attempts must be at least 1".to_string(),
            ));
        }

        if self.retry.base_delay_ms > self.retry.max_delay_ms {
            return Err(ScribeError::Config(format!(
                "Retry base_delay_ms ({}) exceeds max_delay_ms ({})",
                self.retry.base_delay_ms, self.retry.max_delay_ms
            )));
        }

        if self.defaults.currency.trim().is_empty() || self.defaults.paid_by.trim().is_empty() {
            return Err(ScribeError::Config(
                "Default currency and paid_by must not be empty".to_string(),
            ));
        }

        if self.ledger.summary_limit == 0 {
            return Err(ScribeError::Config(
                "Ledger summary_limit must be greater than 0".to_string(),
            ));
        }

        if self.input.max_file_size_mb == 0 {
            return Err(ScribeError::Config(
                "Input max_file_size_mb must be greater than 0".to_string(),
            ));
        }

        if self.input.max_file_size_mb > input_constants::MAX_FILE_SIZE_MB_LIMIT {
            return Err(ScribeError::Config(format!(
                "Input max_file_size_mb must be at most {}",
                input_constants::MAX_FILE_SIZE_MB_LIMIT
            )));
        }

        Ok(())
    }

    /// Provider settings for `create_provider`
    pub fn provider_config(&self) -> ProviderConfig {
        ProviderConfig {
            provider: self.llm.provider.clone(),
            model: self.llm.model.clone(),
            timeout_secs: self.llm.timeout_secs,
            temperature: self.llm.temperature,
            api_key: self.llm.api_key.clone(),
            api_base: self.llm.api_base.clone(),
            max_tokens: self.llm.max_tokens,
        }
    }

    /// Retry policy, with the per-attempt timeout taken from `[llm]`
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_attempts: self.retry.max_attempts,
            base_delay: Duration::from_millis(self.retry.base_delay_ms),
            max_delay: Duration::from_millis(self.retry.max_delay_ms),
            jitter: self.retry.jitter,
            attempt_timeout: Duration::from_secs(self.llm.timeout_secs),
            ..RetryPolicy::default()
        }
    }

    pub fn max_input_bytes(&self) -> u64 {
        self.input.max_file_size_mb.saturating_mul(1024 * 1024)
    }
}

// =============================================================================
// LLM Configuration
// =============================================================================

#[derive(Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    /// Provider name: gemini, openai or mock
    pub provider: String,

    /// Model name (provider default when unset)
    pub model: Option<String>,

    /// API key; falls back to the provider's environment variable
    #[serde(skip_serializing)]
    pub api_key: Option<String>,

    /// Custom endpoint
    pub api_base: Option<String>,

    /// Temperature for generation (low keeps extraction deterministic)
    pub temperature: f32,

    /// Per-attempt timeout in seconds
    pub timeout_secs: u64,

    /// Output token limit
    pub max_tokens: usize,
}

impl std::fmt::Debug for LlmConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LlmConfig")
            .field("provider", &self.provider)
            .field("model", &self.model)
            .field("api_key", &self.api_key.as_ref().map(|_| "[REDACTED]"))
            .field("api_base", &self.api_base)
            .field("temperature", &self.temperature)
            .field("timeout_secs", &self.timeout_secs)
            .field("max_tokens", &self.max_tokens)
            .finish()
    }
}

impl Default for LlmConfig {
    fn default() -> Self {
        let provider = ProviderConfig::default();
        Self {
            provider: provider.provider,
            model: None,
            api_key: None,
            api_base: None,
            temperature: provider.temperature,
            timeout_secs: net_constants::DEFAULT_TIMEOUT_SECS,
            max_tokens: provider.max_tokens,
        }
    }
}

// =============================================================================
// Retry Configuration
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    /// Total attempts including the first
    pub max_attempts: u32,

    /// Delay before the second attempt (milliseconds)
    pub base_delay_ms: u64,

    /// Cap for any single delay (milliseconds)
    pub max_delay_ms: u64,

    /// Randomize delays slightly
    pub jitter: bool,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: retry_constants::MAX_ATTEMPTS,
            base_delay_ms: retry_constants::BASE_DELAY_MS,
            max_delay_ms: retry_constants::MAX_DELAY_MS,
            jitter: true,
        }
    }
}

// =============================================================================
// Ledger Configuration
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LedgerConfig {
    /// SQLite file holding the ledger
    pub path: PathBuf,

    /// Rows shown by `summary` when no limit is given
    pub summary_limit: usize,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from(".expense-scribe").join(ledger_constants::DEFAULT_LEDGER_FILE),
            summary_limit: ledger_constants::SUMMARY_LIMIT,
        }
    }
}

// =============================================================================
// Input Configuration
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct InputConfig {
    /// Largest accepted attachment (megabytes)
    pub max_file_size_mb: u64,
}

impl Default for InputConfig {
    fn default() -> Self {
        Self {
            max_file_size_mb: input_constants::MAX_FILE_SIZE_MB,
        }
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.version, "1.0");
        assert_eq!(config.llm.provider, "gemini");
        assert_eq!(config.defaults.currency, "USD");
        assert_eq!(config.defaults.paid_by, "Me");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_rejects_out_of_range_values() {
        let mut config = Config::default();
        config.llm.temperature = 3.0;
        assert!(matches!(config.validate(), Err(ScribeError::Config(_))));

        let mut config = Config::default();
        config.retry.max_attempts = 0;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.retry.base_delay_ms = 60_000;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.defaults.paid_by = "  ".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_retry_policy_uses_llm_timeout() {
        let mut config = Config::default();
        config.llm.timeout_secs = 12;
        config.retry.max_attempts = 5;
        config.retry.jitter = false;

        let policy = config.retry_policy();
        assert_eq!(policy.max_attempts, 5);
        assert_eq!(policy.attempt_timeout, Duration::from_secs(12));
        assert!(!policy.jitter);
    }

    #[test]
    fn test_api_key_is_redacted_and_not_serialized() {
        let mut config = Config::default();
        config.llm.api_key = Some("sk-secret".to_string());

        assert!(!format!("{:?}", config).contains("sk-secret"));
        let toml = toml::to_string(&config).unwrap();
        assert!(!toml.contains("sk-secret"));
        assert_eq!(
            config.provider_config().api_key.as_deref(),
            Some("sk-secret")
        );
    }

    #[test]
    fn test_max_input_bytes() {
        let config = Config::default();
        assert_eq!(config.max_input_bytes(), 20 * 1024 * 1024);
    }

    #[test]
    fn test_oversized_file_limit_is_rejected() {
        let mut config = Config::default();
        config.input.max_file_size_mb = u64::MAX;
        assert_eq!(config.max_input_bytes(), u64::MAX);
        assert!(matches!(config.validate(), Err(ScribeError::Config(_))));

        config.input.max_file_size_mb = 1024;
        assert!(config.validate().is_ok());
        assert_eq!(config.max_input_bytes(), 1024 * 1024 * 1024);
    }
}
