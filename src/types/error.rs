//! Unified Error Type System
//!
//! Centralized error types for the whole extraction pipeline.
//! Provides error classification for retry decisions and a single
//! user-facing error type at the pipeline boundary.
//!
//! ## Error Categories
//!
//! - **RateLimit**: Provider throttling (wait and retry)
//! - **Network**: Connectivity issues (retry with backoff)
//! - **Transient**: Temporary server issues, 5xx (retry with backoff)
//! - **Auth**: Authentication or quota failures (fail fast)
//! - **BadRequest**: Malformed request or unsupported input (fail fast)
//! - **Unavailable**: Model or endpoint missing (fail fast)

use std::time::Duration;
use thiserror::Error;

use crate::constants::messages;

// =============================================================================
// Error Categories
// =============================================================================

/// Error categories used for retry decisions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// Rate limited - wait then retry
    RateLimit,
    /// Authentication failed or quota exhausted - don't retry
    Auth,
    /// Network/connectivity issues - retry with backoff
    Network,
    /// Model or endpoint not available - don't retry
    Unavailable,
    /// Invalid request - don't retry, fix request
    BadRequest,
    /// Temporary server issues - retry with backoff
    Transient,
    /// Unknown error - not retried
    Unknown,
}

impl std::fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::RateLimit => write!(f, "RATE_LIMIT"),
            Self::Auth => write!(f, "AUTH"),
            Self::Network => write!(f, "NETWORK"),
            Self::Unavailable => write!(f, "UNAVAILABLE"),
            Self::BadRequest => write!(f, "BAD_REQUEST"),
            Self::Transient => write!(f, "TRANSIENT"),
            Self::Unknown => write!(f, "UNKNOWN"),
        }
    }
}

impl ErrorCategory {
    /// Check if this category is expected to resolve on retry
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::RateLimit | Self::Network | Self::Transient)
    }
}

// =============================================================================
// LLM Error
// =============================================================================

/// Provider error with category, context, and retry hint
#[derive(Debug, Clone)]
pub struct LlmError {
    /// Error category for retry decisions
    pub category: ErrorCategory,
    /// Detailed error message (provider internals, never shown to users)
    pub message: String,
    /// Provider that produced the error
    pub provider: Option<String>,
    /// Wait time requested by the provider (Retry-After)
    pub retry_after: Option<Duration>,
}

impl std::fmt::Display for LlmError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if let Some(provider) = &self.provider {
            write!(f, "[{}:{}] {}", provider, self.category, self.message)
        } else {
            write!(f, "[{}] {}", self.category, self.message)
        }
    }
}

impl std::error::Error for LlmError {}

impl LlmError {
    pub fn new(category: ErrorCategory, message: impl Into<String>) -> Self {
        Self {
            category,
            message: message.into(),
            provider: None,
            retry_after: None,
        }
    }

    pub fn with_provider(
        category: ErrorCategory,
        message: impl Into<String>,
        provider: impl Into<String>,
    ) -> Self {
        Self {
            category,
            message: message.into(),
            provider: Some(provider.into()),
            retry_after: None,
        }
    }

    /// Add suggested retry delay
    pub fn retry_after(mut self, duration: Duration) -> Self {
        self.retry_after = Some(duration);
        self
    }

    pub fn is_retryable(&self) -> bool {
        self.category.is_retryable()
    }
}

// =============================================================================
// Error Classifier
// =============================================================================

/// Maps provider failures to categories
pub struct ErrorClassifier;

impl ErrorClassifier {
    /// Classify a free-form error message from any provider
    pub fn classify(message: &str, provider: &str) -> LlmError {
        let lower = message.to_lowercase();

        // Gemini reports quota and rate limits alike as 429 RESOURCE_EXHAUSTED
        if Self::is_quota_exhausted(&lower) {
            return LlmError::with_provider(ErrorCategory::Auth, message, provider);
        }

        if lower.contains("rate limit")
            || lower.contains("429")
            || lower.contains("too many requests")
            || lower.contains("resource_exhausted")
        {
            return LlmError::with_provider(ErrorCategory::RateLimit, message, provider);
        }

        if lower.contains("api key")
            || lower.contains("401")
            || lower.contains("403")
            || lower.contains("unauthorized")
            || lower.contains("permission denied")
        {
            return LlmError::with_provider(ErrorCategory::Auth, message, provider);
        }

        if lower.contains("network")
            || lower.contains("connection")
            || lower.contains("dns")
            || lower.contains("timeout")
            || lower.contains("timed out")
            || lower.contains("unreachable")
        {
            return LlmError::with_provider(ErrorCategory::Network, message, provider);
        }

        if lower.contains("503")
            || lower.contains("502")
            || lower.contains("500")
            || lower.contains("service unavailable")
            || lower.contains("overloaded")
            || lower.contains("internal error")
            || lower.contains("temporary")
        {
            return LlmError::with_provider(ErrorCategory::Transient, message, provider);
        }

        if lower.contains("404") || lower.contains("not found") {
            return LlmError::with_provider(ErrorCategory::Unavailable, message, provider);
        }

        if lower.contains("400")
            || lower.contains("bad request")
            || lower.contains("invalid")
            || lower.contains("malformed")
            || lower.contains("unsupported")
        {
            return LlmError::with_provider(ErrorCategory::BadRequest, message, provider);
        }

        LlmError::with_provider(ErrorCategory::Unknown, message, provider)
    }

    /// Classify HTTP status code directly (more accurate than string matching)
    pub fn classify_http_status(status: u16, message: &str, provider: &str) -> LlmError {
        match status {
            429 if Self::is_quota_exhausted(&message.to_lowercase()) => {
                LlmError::with_provider(ErrorCategory::Auth, message, provider)
            }
            429 => LlmError::with_provider(ErrorCategory::RateLimit, message, provider),
            401 | 403 => LlmError::with_provider(ErrorCategory::Auth, message, provider),
            400 | 413 | 415 | 422 => {
                LlmError::with_provider(ErrorCategory::BadRequest, message, provider)
            }
            408 | 500 | 502 | 503 | 504 => {
                LlmError::with_provider(ErrorCategory::Transient, message, provider)
            }
            404 => LlmError::with_provider(ErrorCategory::Unavailable, message, provider),
            _ => LlmError::with_provider(ErrorCategory::Unknown, message, provider),
        }
    }

    /// Quota or billing exhaustion, which waiting will not clear
    fn is_quota_exhausted(lower: &str) -> bool {
        lower.contains("quota") || lower.contains("billing")
    }

    /// Classify a transport-level failure from the HTTP client
    pub fn classify_transport(err: &reqwest::Error, provider: &str) -> LlmError {
        let message = err.to_string();
        if err.is_timeout() || err.is_connect() || err.is_request() {
            return LlmError::with_provider(ErrorCategory::Network, message, provider);
        }
        if let Some(status) = err.status() {
            return Self::classify_http_status(status.as_u16(), &message, provider);
        }
        Self::classify(&message, provider)
    }
}

// =============================================================================
// Application Error
// =============================================================================

#[derive(Debug, Error)]
pub enum ScribeError {
    // -------------------------------------------------------------------------
    // System Errors (auto From impl)
    // -------------------------------------------------------------------------
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    // -------------------------------------------------------------------------
    // Extraction Errors
    // -------------------------------------------------------------------------
    /// Structured provider error with category and retry hints
    #[error("LLM error: {0}")]
    Llm(LlmError),

    /// Single attempt exceeded its deadline
    #[error("Timeout after {duration:?}: {operation}")]
    Timeout {
        operation: String,
        duration: Duration,
    },

    /// Caller abandoned the request
    #[error("Request cancelled")]
    Cancelled,

    // -------------------------------------------------------------------------
    // Validation Errors
    // -------------------------------------------------------------------------
    /// Model output could not be coerced into a candidate
    #[error("Schema error: {details}")]
    Schema { details: String },

    /// Required fields absent after repair and defaulting
    #[error("Missing required field(s): {}", fields.join(", "))]
    MissingRequiredField { fields: Vec<&'static str> },

    // -------------------------------------------------------------------------
    // Domain Errors
    // -------------------------------------------------------------------------
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Config error: {0}")]
    Config(String),

    #[error("Storage error: {0}")]
    Storage(String),
}

impl From<LlmError> for ScribeError {
    fn from(err: LlmError) -> Self {
        ScribeError::Llm(err)
    }
}

pub type Result<T> = std::result::Result<T, ScribeError>;

impl ScribeError {
    pub fn timeout(operation: impl Into<String>, duration: Duration) -> Self {
        Self::Timeout {
            operation: operation.into(),
            duration,
        }
    }

    pub fn schema(details: impl Into<String>) -> Self {
        Self::Schema {
            details: details.into(),
        }
    }

    /// Whether a failed model call is expected to succeed on retry
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Llm(e) => e.is_retryable(),
            Self::Timeout { .. } => true,
            _ => false,
        }
    }

    /// Provider-requested wait, if any
    pub fn retry_after(&self) -> Option<Duration> {
        match self {
            Self::Llm(e) => e.retry_after,
            _ => None,
        }
    }
}

/// Context extension trait for adding context to errors
pub trait ResultExt<T> {
    fn with_context<C: Into<String>>(self, context: C) -> Result<T>;

    /// Add context using a closure (lazy evaluation)
    fn with_context_fn<F, C>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> C,
        C: Into<String>;
}

impl<T, E: std::error::Error + Send + Sync + 'static> ResultExt<T> for std::result::Result<T, E> {
    fn with_context<C: Into<String>>(self, context: C) -> Result<T> {
        self.map_err(|e| ScribeError::Storage(format!("{}: {}", context.into(), e)))
    }

    fn with_context_fn<F, C>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> C,
        C: Into<String>,
    {
        self.map_err(|e| ScribeError::Storage(format!("{}: {}", f().into(), e)))
    }
}

// =============================================================================
// Pipeline Boundary Error
// =============================================================================

/// Error kinds surfaced to the transport layer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineErrorKind {
    /// AI call failed irrecoverably or retries were exhausted
    Extraction,
    /// Model output unusable after one repair attempt
    Schema,
    /// Required field absent after defaulting
    MissingRequiredField,
    /// Attachment rejected before any AI call
    InvalidInput,
    /// Ledger append/read failed
    Storage,
    /// Caller cancelled the request
    Cancelled,
}

impl std::fmt::Display for PipelineErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Extraction => write!(f, "extraction"),
            Self::Schema => write!(f, "schema"),
            Self::MissingRequiredField => write!(f, "missing_required_field"),
            Self::InvalidInput => write!(f, "invalid_input"),
            Self::Storage => write!(f, "storage"),
            Self::Cancelled => write!(f, "cancelled"),
        }
    }
}

/// The only error type that crosses into the transport layer.
///
/// `user_message` is safe to show; `cause` is for logs only.
#[derive(Debug, Error)]
#[error("{kind} failure: {user_message}")]
pub struct PipelineError {
    pub kind: PipelineErrorKind,
    pub user_message: String,
    #[source]
    pub cause: ScribeError,
}

impl PipelineError {
    pub fn new(kind: PipelineErrorKind, cause: ScribeError) -> Self {
        let user_message = match kind {
            PipelineErrorKind::Extraction => messages::ERROR_GENERIC,
            PipelineErrorKind::Schema | PipelineErrorKind::MissingRequiredField => {
                messages::ERROR_UNREADABLE
            }
            PipelineErrorKind::InvalidInput => messages::ERROR_INVALID_FILE,
            PipelineErrorKind::Storage => messages::ERROR_LEDGER_ACCESS,
            PipelineErrorKind::Cancelled => messages::ERROR_CANCELLED,
        };
        Self {
            kind,
            user_message: user_message.to_string(),
            cause,
        }
    }
}

impl From<ScribeError> for PipelineError {
    fn from(err: ScribeError) -> Self {
        let kind = match &err {
            ScribeError::Llm(_) | ScribeError::Timeout { .. } => PipelineErrorKind::Extraction,
            ScribeError::Cancelled => PipelineErrorKind::Cancelled,
            ScribeError::Schema { .. } | ScribeError::Json(_) => PipelineErrorKind::Schema,
            ScribeError::MissingRequiredField { .. } => PipelineErrorKind::MissingRequiredField,
            ScribeError::InvalidInput(_) => PipelineErrorKind::InvalidInput,
            ScribeError::Storage(_) | ScribeError::Database(_) => PipelineErrorKind::Storage,
            ScribeError::Io(_) | ScribeError::Yaml(_) | ScribeError::Config(_) => {
                PipelineErrorKind::Extraction
            }
        };
        Self::new(kind, err)
    }
}

// =============================================================================
// Tests
// =============================================================================
